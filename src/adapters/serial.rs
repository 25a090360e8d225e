//! Serial device link adapter.
//!
//! - [`discover_port`] enumerates serial ports and picks the exhibit's
//!   microcontroller by matching USB descriptors and port names against
//!   configured hints (Arduino clones report as "CH340", "USB Serial",
//!   `ttyACM0`, ...).
//! - [`SerialLink`] implements [`DeviceLink`]: a non-blocking poll that
//!   reads whatever bytes are waiting, frames them with [`LineBuffer`],
//!   and hands out one line at a time.

use std::io::{self, Read};
use std::time::Duration;

use log::{debug, info, warn};
use serialport::{SerialPort, SerialPortType};

use crate::app::ports::DeviceLink;
use crate::error::{Error, Result, TransportError};
use crate::protocol::{Framed, LineBuffer};

/// Read chunk size per poll.
const READ_CHUNK: usize = 256;

/// Framing capacity; the configured line limit is capped to this.
const FRAME_CAPACITY: usize = 4096;

// ───────────────────────────────────────────────────────────────
// Discovery
// ───────────────────────────────────────────────────────────────

/// One enumerated port, flattened for matching and display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortCandidate {
    pub name: String,
    /// Manufacturer and product strings (USB ports), or the port type.
    pub description: String,
}

/// Enumerate every serial port the OS reports.
pub fn list_ports() -> Result<Vec<PortCandidate>> {
    let ports = serialport::available_ports().map_err(|e| {
        warn!("serial port enumeration failed: {}", e);
        Error::DeviceNotFound
    })?;

    Ok(ports
        .into_iter()
        .map(|p| {
            let description = match &p.port_type {
                SerialPortType::UsbPort(usb) => {
                    let parts: Vec<&str> = [usb.manufacturer.as_deref(), usb.product.as_deref()]
                        .into_iter()
                        .flatten()
                        .collect();
                    format!("USB {:04x}:{:04x} {}", usb.vid, usb.pid, parts.join(" "))
                }
                SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                SerialPortType::PciPort => "PCI".to_string(),
                SerialPortType::Unknown => "unknown".to_string(),
            };
            PortCandidate {
                name: p.port_name,
                description,
            }
        })
        .collect())
}

/// First candidate whose name or description contains a hint
/// (case-insensitive).  Candidates are tried in enumeration order.
pub fn pick_port<'a>(candidates: &'a [PortCandidate], hints: &[String]) -> Option<&'a PortCandidate> {
    let hints: Vec<String> = hints
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .collect();

    candidates.iter().find(|c| {
        let name = c.name.to_ascii_lowercase();
        let description = c.description.to_ascii_lowercase();
        hints
            .iter()
            .any(|h| name.contains(h.as_str()) || description.contains(h.as_str()))
    })
}

/// Find the exhibit's microcontroller.
pub fn discover_port(hints: &[String]) -> Result<String> {
    let candidates = list_ports()?;
    for c in &candidates {
        info!("serial port: {} ({})", c.name, c.description);
    }
    match pick_port(&candidates, hints) {
        Some(c) => {
            info!("using {} as the exhibit controller", c.name);
            Ok(c.name.clone())
        }
        None => Err(Error::DeviceNotFound),
    }
}

// ───────────────────────────────────────────────────────────────
// Link
// ───────────────────────────────────────────────────────────────

/// Non-blocking line reader over a serial port.
pub struct SerialLink {
    port: Option<Box<dyn SerialPort>>,
    lines: LineBuffer<FRAME_CAPACITY>,
}

impl SerialLink {
    /// Open `path` at `baud`; lines longer than `max_line_len` bytes are
    /// dropped.
    pub fn open(path: &str, baud: u32, max_line_len: usize) -> Result<Self> {
        let port = serialport::new(path, baud)
            .timeout(Duration::from_millis(10))
            .open()
            .map_err(|e| {
                warn!("opening {} at {} baud failed: {}", path, baud, e);
                match e.kind() {
                    serialport::ErrorKind::NoDevice => Error::DeviceNotFound,
                    _ => Error::Transport(TransportError::ReadFailed),
                }
            })?;
        info!("opened {} at {} baud", path, baud);
        Ok(Self {
            port: Some(port),
            lines: LineBuffer::with_limit(max_line_len),
        })
    }

    fn fill(&mut self) -> core::result::Result<(), TransportError> {
        let Some(port) = self.port.as_mut() else {
            return Err(TransportError::Closed);
        };

        let waiting = match port.bytes_to_read() {
            Ok(n) => n as usize,
            Err(e) => return Err(self.fail(&e.to_string(), TransportError::Disconnected)),
        };
        if waiting == 0 {
            return Ok(());
        }

        let mut chunk = [0u8; READ_CHUNK];
        let want = waiting.min(READ_CHUNK);
        match port.read(&mut chunk[..want]) {
            Ok(0) => Err(self.fail("read returned EOF", TransportError::Disconnected)),
            Ok(n) => {
                self.lines.feed(&chunk[..n]);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut || e.kind() == io::ErrorKind::WouldBlock => {
                Ok(())
            }
            Err(e) => Err(self.fail(&e.to_string(), TransportError::ReadFailed)),
        }
    }

    fn take_framed(&mut self) -> Option<Framed> {
        let framed = self.lines.next_line()?;
        if framed == Framed::Overflow {
            debug!("serial line overflow");
        }
        Some(framed)
    }

    fn fail(&mut self, detail: &str, err: TransportError) -> TransportError {
        warn!("serial link failed: {}", detail);
        self.port = None;
        self.lines.reset();
        err
    }
}

impl DeviceLink for SerialLink {
    fn poll(&mut self) -> core::result::Result<Option<Framed>, TransportError> {
        if let Some(framed) = self.take_framed() {
            return Ok(Some(framed));
        }
        self.fill()?;
        Ok(self.take_framed())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            info!("serial port closed");
        }
        self.lines.reset();
    }
}
