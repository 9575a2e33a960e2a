//! EC Transport Library
//!
//! This crate moves bytes between the host and an embedded controller
//! (EC) reachable through two I/O ports: a command port and a data port.
//! It has three pieces:
//!
//! - [`EcTransport`]: the write-command / write-data / read-byte contract
//!   shared by the real port transport and the in-process simulator in
//!   `ec-sim`. The transaction engine only ever depends on this trait.
//! - [`port`]: the hardware implementation, polling the IBF/OBF status
//!   bits of the command port over a raw [`port::PortIo`] backend.
//! - [`txrx`]: the transaction engine driving one full command/response
//!   cycle, with timeout-based framing and a drain-until-quiet rule so no
//!   stray bytes are left queued for a later transaction.
//!
//! Everything is synchronous and blocking; a process owns its transport
//! for its whole lifetime and has at most one transaction in flight.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use ec_transport::port::{DevPort, PortTransport, PortTransportConfig};
//! use ec_transport::txrx;
//!
//! # fn main() -> Result<(), ec_transport::TransportError> {
//! let io = DevPort::open()?;
//! let mut ec = PortTransport::new(io, PortTransportConfig::default());
//!
//! // Read the EC firmware version (command 0x48, subcommand 0x01)
//! let resp = txrx(
//!     &mut ec,
//!     0x48,
//!     &[0x01],
//!     None,
//!     Duration::from_millis(500),
//!     Duration::from_secs(5),
//! )?;
//! println!("{} version bytes", resp.len());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod port;
mod transaction;

pub use error::{ShortReason, TransportError};
pub use transaction::txrx;

use std::time::Duration;

/// The byte-level transaction contract implemented by every EC backend
///
/// Two implementations exist: [`port::PortTransport`] for real hardware
/// and `ec_sim::EcSimulator` for tests. Writes are fire-and-forget (the
/// protocol has no write acknowledgment); only reads can time out.
pub trait EcTransport {
    /// Write a command byte to the command port, starting a transaction
    fn write_command(&mut self, cmd: u8) -> Result<(), TransportError>;

    /// Write one payload byte to the data port
    fn write_data(&mut self, byte: u8) -> Result<(), TransportError>;

    /// Read one response byte, waiting up to `timeout` for it to appear
    fn read_byte(&mut self, timeout: Duration) -> Result<u8, TransportError>;

    /// Read the low byte of the command (status) port
    fn status(&mut self) -> Result<u8, TransportError>;
}
