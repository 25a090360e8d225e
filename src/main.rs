//! Exhibit host: main entry point.
//!
//! Hexagonal wiring of one exhibit process.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SerialLink     StdinQuit      ThreadClock     JsonConfigFile  │
//! │  (DeviceLink)   (QuitSignal)   (Clock)         (ConfigPort)    │
//! │  ConsoleOutputs (Display+Audio)  LogEventSink (EventSink)      │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │   Runner ──▶ AppService (parse · FSM · reversion)      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use exhibit::adapters::config_file::JsonConfigFile;
use exhibit::adapters::log_sink::{ConsoleOutputs, LogEventSink};
use exhibit::adapters::serial::{self, SerialLink};
use exhibit::adapters::stdin_quit::StdinQuit;
use exhibit::adapters::thread_clock::ThreadClock;
use exhibit::app::ports::ConfigPort;
use exhibit::app::runner::Runner;
use exhibit::app::service::AppService;
use exhibit::config::ExhibitMode;

#[derive(Parser, Debug)]
#[command(
    name = "exhibit",
    version,
    about = "Drive an interactive exhibit from its serial controller"
)]
struct Cli {
    /// Exhibit to drive; overrides the config file
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// JSON config file (defaults are used if it does not exist)
    #[arg(long, value_name = "PATH", default_value = "exhibit.json")]
    config: PathBuf,

    /// Serial port; skips discovery
    #[arg(long, value_name = "PORT")]
    port: Option<String>,

    /// Baud rate; defaults to the exhibit's firmware rate
    #[arg(long, value_name = "BAUD")]
    baud: Option<u32>,

    /// Milliseconds with both switches released before showing the neutral image
    #[arg(long = "grace-ms", value_name = "MS")]
    grace_ms: Option<u64>,

    /// Log filter when RUST_LOG is unset
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    log_level: String,

    /// Print the serial ports discovery would consider, then exit
    #[arg(long = "list-ports")]
    list_ports: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Image,
    Audio,
}

impl From<ModeArg> for ExhibitMode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Image => ExhibitMode::Image,
            ModeArg::Audio => ExhibitMode::Audio,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();
    info!("exhibit v{}", env!("CARGO_PKG_VERSION"));

    if cli.list_ports {
        for c in serial::list_ports()? {
            println!("{}\t{}", c.name, c.description);
        }
        return Ok(());
    }

    // ── 2. Config: file, then CLI overrides ───────────────────
    let mut config = JsonConfigFile::new(&cli.config)
        .load()
        .with_context(|| format!("loading {}", cli.config.display()))?;
    if let Some(mode) = cli.mode {
        config.mode = mode.into();
    }
    if cli.port.is_some() {
        config.port = cli.port;
    }
    if cli.baud.is_some() {
        config.baud_rate = cli.baud;
    }
    if let Some(ms) = cli.grace_ms {
        config.grace_delay_ms = ms;
    }
    config.validate().context("command line overrides")?;

    // ── 3. Device link ────────────────────────────────────────
    let port = match &config.port {
        Some(p) => p.clone(),
        None => serial::discover_port(&config.port_hints)
            .context("exhibit controller not found; check the USB cable or pass --port")?,
    };
    let link = SerialLink::open(&port, config.effective_baud(), config.max_line_len)
        .with_context(|| format!("opening {}", port))?;

    // ── 4. Remaining adapters ─────────────────────────────────
    let quit = StdinQuit::spawn()?;
    let mut out = ConsoleOutputs::new(&config);
    let mut sink = LogEventSink::new();

    // ── 5. Service + loop ─────────────────────────────────────
    let mut app = AppService::new(&config, ThreadClock::new());
    app.start(&mut out, &mut sink);

    let mut runner = Runner::new(link, quit, &config);
    info!("Ready. Type q + Enter to quit.");
    runner
        .run(&mut app, &mut out, &mut sink)
        .context("exhibit controller did not come back")?;

    Ok(())
}
