//! EC Protocol Library
//!
//! This crate describes the command/response protocol spoken by the
//! embedded controller (EC) and the typed configuration fields stored
//! behind it:
//!
//! - **Command space**: [`CommandId`] plus per-command subcommand constants
//! - **Field catalog**: static [`FieldDef`] table for the configuration
//!   fields behind the 0x60/0x61 command pair
//! - **Field codecs**: bidirectional transforms between display text and
//!   fixed-width byte buffers (ASCII, UUID with segment swap, MAC, BCD
//!   date, raw hex)
//! - **Battery/temperature catalogs**: item tables for the numeric readout
//!   commands
//!
//! The crate is transport-agnostic: it produces and consumes byte buffers,
//! and the transaction engine in `ec-transport` moves them.
//!
//! # Example
//!
//! ```rust
//! use ec_protocol::{codec, fields};
//!
//! let field = fields::by_name("mac_address").unwrap();
//! let bytes = codec::encode_field(field, "aa:bb:cc:dd:ee:ff").unwrap();
//! assert_eq!(bytes.len(), field.length);
//! assert_eq!(codec::decode_field(field, &bytes).unwrap(), "AA:BB:CC:DD:EE:FF");
//! ```

pub mod codec;
pub mod command;
pub mod error;
pub mod fields;

pub use command::CommandId;
pub use error::{CodecError, FieldError};
pub use fields::{BatteryItem, BatteryKind, Encoding, FieldDef, FIELDS};
