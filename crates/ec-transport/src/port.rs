//! Two-port EC transport over raw port I/O
//!
//! The EC is reached through a command port (default 0x6C) and a data port
//! (default 0x68). Reading the command port yields a status byte with two
//! flags of interest:
//!
//! ```text
//! bit 0 (0x01)  OBF  output buffer full - the EC produced a byte
//! bit 1 (0x02)  IBF  input buffer full  - the EC is busy accepting input
//! ```
//!
//! Both flags are polled in bounded loops with a fixed poll interval; the
//! wait primitives report "became ready" as a bool and never fail on
//! timeout themselves.
//!
//! The raw `inb`/`outb` primitive is behind the [`PortIo`] trait so the
//! transport can sit on `/dev/port`, a vendor driver, or a test double.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::error::TransportError;
use crate::EcTransport;

/// Default EC command/status port
pub const DEFAULT_CMD_PORT: u16 = 0x6C;
/// Default EC data port
pub const DEFAULT_DATA_PORT: u16 = 0x68;

/// Output buffer full: the EC has a byte ready on the data port
pub const STATUS_OBF: u8 = 0x01;
/// Input buffer full: the EC has not yet consumed the last write
pub const STATUS_IBF: u8 = 0x02;

/// Default interval between status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(20);
/// Default wait for a response byte
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Raw byte-wide port I/O
///
/// The one primitive the port transport needs from the platform. On real
/// hardware this is an x86 port read/write; in tests it is a scripted
/// double.
pub trait PortIo {
    /// Write one byte to an I/O port
    fn outb(&mut self, port: u16, value: u8) -> std::io::Result<()>;

    /// Read one byte from an I/O port
    fn inb(&mut self, port: u16) -> std::io::Result<u8>;
}

/// Port I/O through the Linux `/dev/port` device
///
/// Requires root (or `CAP_SYS_RAWIO`); open failure surfaces as
/// [`TransportError::Io`] and is fatal for the process.
#[cfg(unix)]
#[derive(Debug)]
pub struct DevPort {
    file: std::fs::File,
}

#[cfg(unix)]
impl DevPort {
    /// Open `/dev/port` for read/write access
    pub fn open() -> Result<Self, TransportError> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/port")?;
        Ok(Self { file })
    }
}

#[cfg(unix)]
impl PortIo for DevPort {
    fn outb(&mut self, port: u16, value: u8) -> std::io::Result<()> {
        use std::os::unix::fs::FileExt;
        self.file.write_all_at(&[value], u64::from(port))
    }

    fn inb(&mut self, port: u16) -> std::io::Result<u8> {
        use std::os::unix::fs::FileExt;
        let mut buf = [0u8; 1];
        self.file.read_exact_at(&mut buf, u64::from(port))?;
        Ok(buf[0])
    }
}

/// Configuration for the port transport
#[derive(Debug, Clone)]
pub struct PortTransportConfig {
    /// Command/status port address
    pub cmd_port: u16,
    /// Data port address
    pub data_port: u16,
    /// Interval between status polls
    pub poll_interval: Duration,
    /// Default wait used by the IBF handshake
    pub handshake_timeout: Duration,
    /// Wait for IBF to clear before every write.
    ///
    /// Known firmware tolerates skipping this handshake, so it stays off
    /// unless a stricter device demands it.
    pub enforce_ibf_wait: bool,
}

impl Default for PortTransportConfig {
    fn default() -> Self {
        Self {
            cmd_port: DEFAULT_CMD_PORT,
            data_port: DEFAULT_DATA_PORT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            handshake_timeout: DEFAULT_READ_TIMEOUT,
            enforce_ibf_wait: false,
        }
    }
}

/// The hardware EC transport: two ports plus status polling
#[derive(Debug)]
pub struct PortTransport<P: PortIo> {
    io: P,
    config: PortTransportConfig,
}

impl<P: PortIo> PortTransport<P> {
    /// Create a transport over the given port I/O backend
    pub fn new(io: P, config: PortTransportConfig) -> Self {
        Self { io, config }
    }

    /// The configured command port address
    pub fn cmd_port(&self) -> u16 {
        self.config.cmd_port
    }

    /// The configured data port address
    pub fn data_port(&self) -> u16 {
        self.config.data_port
    }

    /// Poll until IBF clears; `Ok(false)` means the timeout elapsed
    pub fn wait_ibf_clear(&mut self, timeout: Duration) -> Result<bool, TransportError> {
        let start = Instant::now();
        let mut polls = 0u32;
        while start.elapsed() < timeout {
            if self.io.inb(self.config.cmd_port)? & STATUS_IBF == 0 {
                trace!(elapsed_ms = start.elapsed().as_millis() as u64, polls, "IBF clear");
                return Ok(true);
            }
            polls += 1;
            std::thread::sleep(self.config.poll_interval);
        }
        debug!(timeout_ms = timeout.as_millis() as u64, polls, "IBF wait timed out");
        Ok(false)
    }

    /// Poll until OBF is set; `Ok(false)` means the timeout elapsed
    pub fn wait_obf_set(&mut self, timeout: Duration) -> Result<bool, TransportError> {
        let start = Instant::now();
        let mut polls = 0u32;
        while start.elapsed() < timeout {
            if self.io.inb(self.config.cmd_port)? & STATUS_OBF != 0 {
                trace!(elapsed_ms = start.elapsed().as_millis() as u64, polls, "OBF set");
                return Ok(true);
            }
            polls += 1;
            std::thread::sleep(self.config.poll_interval);
        }
        debug!(timeout_ms = timeout.as_millis() as u64, polls, "OBF wait timed out");
        Ok(false)
    }

    fn ensure_input_ready(&mut self, what: &'static str) -> Result<(), TransportError> {
        if !self.config.enforce_ibf_wait {
            return Ok(());
        }
        if self.wait_ibf_clear(self.config.handshake_timeout)? {
            Ok(())
        } else {
            Err(TransportError::InputBufferBusy(what))
        }
    }
}

impl<P: PortIo> EcTransport for PortTransport<P> {
    fn write_command(&mut self, cmd: u8) -> Result<(), TransportError> {
        self.ensure_input_ready("command")?;
        trace!("WRITE CMD 0x{cmd:02X} -> port 0x{:04X}", self.config.cmd_port);
        self.io.outb(self.config.cmd_port, cmd)?;
        Ok(())
    }

    fn write_data(&mut self, byte: u8) -> Result<(), TransportError> {
        self.ensure_input_ready("data")?;
        trace!("WRITE DATA 0x{byte:02X} -> port 0x{:04X}", self.config.data_port);
        self.io.outb(self.config.data_port, byte)?;
        Ok(())
    }

    fn read_byte(&mut self, timeout: Duration) -> Result<u8, TransportError> {
        if !self.wait_obf_set(timeout)? {
            return Err(TransportError::ReadTimeout(timeout));
        }
        let byte = self.io.inb(self.config.data_port)?;
        trace!("READ DATA 0x{byte:02X}");
        Ok(byte)
    }

    fn status(&mut self) -> Result<u8, TransportError> {
        Ok(self.io.inb(self.config.cmd_port)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Scripted port backend: a status byte sequence plus a data byte queue
    struct FakePorts {
        status: VecDeque<u8>,
        last_status: u8,
        data: VecDeque<u8>,
        writes: Vec<(u16, u8)>,
    }

    impl FakePorts {
        fn new(status: &[u8], data: &[u8]) -> Self {
            Self {
                status: status.iter().copied().collect(),
                last_status: status.last().copied().unwrap_or(0),
                data: data.iter().copied().collect(),
                writes: Vec::new(),
            }
        }
    }

    impl PortIo for FakePorts {
        fn outb(&mut self, port: u16, value: u8) -> std::io::Result<()> {
            self.writes.push((port, value));
            Ok(())
        }

        fn inb(&mut self, port: u16) -> std::io::Result<u8> {
            if port == DEFAULT_CMD_PORT {
                Ok(self.status.pop_front().unwrap_or(self.last_status))
            } else {
                Ok(self.data.pop_front().unwrap_or(0))
            }
        }
    }

    fn fast_config() -> PortTransportConfig {
        PortTransportConfig {
            poll_interval: Duration::from_millis(1),
            handshake_timeout: Duration::from_millis(20),
            ..PortTransportConfig::default()
        }
    }

    #[test]
    fn read_byte_waits_for_obf_then_reads_data_port() {
        let io = FakePorts::new(&[0x00, 0x00, STATUS_OBF], &[0x42]);
        let mut ec = PortTransport::new(io, fast_config());
        let byte = ec.read_byte(Duration::from_millis(100)).unwrap();
        assert_eq!(byte, 0x42);
    }

    #[test]
    fn read_byte_times_out_when_obf_never_sets() {
        let io = FakePorts::new(&[0x00], &[]);
        let mut ec = PortTransport::new(io, fast_config());
        let err = ec.read_byte(Duration::from_millis(10)).unwrap_err();
        assert!(err.is_read_timeout());
    }

    #[test]
    fn writes_go_to_the_right_ports() {
        let io = FakePorts::new(&[0x00], &[]);
        let mut ec = PortTransport::new(io, fast_config());
        ec.write_command(0x48).unwrap();
        ec.write_data(0x01).unwrap();
        assert_eq!(
            ec.io.writes,
            vec![(DEFAULT_CMD_PORT, 0x48), (DEFAULT_DATA_PORT, 0x01)]
        );
    }

    #[test]
    fn writes_skip_ibf_handshake_by_default() {
        // Status forever reports IBF busy; writes must still go through
        let io = FakePorts::new(&[STATUS_IBF], &[]);
        let mut ec = PortTransport::new(io, fast_config());
        ec.write_command(0x10).unwrap();
        assert_eq!(ec.io.writes.len(), 1);
    }

    #[test]
    fn strict_handshake_rejects_busy_input_buffer() {
        let io = FakePorts::new(&[STATUS_IBF], &[]);
        let config = PortTransportConfig {
            enforce_ibf_wait: true,
            handshake_timeout: Duration::from_millis(5),
            poll_interval: Duration::from_millis(1),
            ..PortTransportConfig::default()
        };
        let mut ec = PortTransport::new(io, config);
        let err = ec.write_command(0x10).unwrap_err();
        assert!(matches!(err, TransportError::InputBufferBusy("command")));
        assert!(ec.io.writes.is_empty());
    }

    #[test]
    fn strict_handshake_waits_for_ibf_to_clear() {
        let io = FakePorts::new(&[STATUS_IBF, STATUS_IBF, 0x00], &[]);
        let config = PortTransportConfig {
            enforce_ibf_wait: true,
            handshake_timeout: Duration::from_millis(50),
            poll_interval: Duration::from_millis(1),
            ..PortTransportConfig::default()
        };
        let mut ec = PortTransport::new(io, config);
        ec.write_data(0x55).unwrap();
        assert_eq!(ec.io.writes, vec![(DEFAULT_DATA_PORT, 0x55)]);
    }

    #[test]
    fn status_returns_command_port_byte() {
        let io = FakePorts::new(&[0xA5], &[]);
        let mut ec = PortTransport::new(io, fast_config());
        assert_eq!(ec.status().unwrap(), 0xA5);
    }
}
