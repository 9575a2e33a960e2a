//! EC Simulation Library
//!
//! An in-process embedded controller that satisfies the same
//! `EcTransport` contract as the hardware port transport, for exercising
//! the transaction engine and the feature layer without a mainboard. It
//! keeps in-memory state for LEDs, fan, battery, temperatures, keyboard
//! backlight and the configuration-field store, and synthesizes one
//! response buffer per received command.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use ec_sim::EcSimulator;
//! use ec_transport::txrx;
//!
//! let mut sim = EcSimulator::new();
//! let resp = txrx(
//!     &mut sim,
//!     0x48,                       // EC version
//!     &[0x01],
//!     None,
//!     Duration::from_millis(20),
//!     Duration::from_secs(2),
//! ).unwrap();
//! assert!(resp.starts_with(b"SimEC v1.0"));
//! ```

pub mod device;
pub mod state;

pub use device::EcSimulator;
pub use state::{
    BacklightState, BatteryState, ControlMode, FanState, KeyboardTypeState, LedState,
    SimulatorConfig,
};
