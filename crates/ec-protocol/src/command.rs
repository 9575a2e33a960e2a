//! EC command byte space
//!
//! Every EC transaction starts with a single command byte written to the
//! command port. The first payload byte is usually a subcommand selecting
//! the specific operation or field under that command.
//!
//! # Command layout
//! ```text
//! 0x10  LED control               0x40  Keyboard backlight
//! 0x20  Fan control               0x48  EC firmware version
//! 0x28  Temperature sensors       0x50  Keyboard type
//! 0x30  Battery control           0x60  Configuration-field write
//! 0x31  Battery information       0x61  Configuration-field read
//!                                 0x62  Commit to persistent storage
//! ```
//!
//! Numeric responses (temperatures, battery items, fan RPM) are
//! little-endian 16-bit values; string responses are fixed-width ASCII.

use crate::error::FieldError;

/// EC command bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum CommandId {
    /// Power/charge LED control
    Led = 0x10,
    /// Fan mode, duty and RPM control plus readback
    Fan = 0x20,
    /// Temperature sensor readout
    Temperature = 0x28,
    /// Battery mode / charge / discharge control
    BatteryControl = 0x30,
    /// Battery information items (SBS-like)
    BatteryInfo = 0x31,
    /// Keyboard backlight on/off/level
    KeyboardBacklight = 0x40,
    /// EC firmware version string
    EcVersion = 0x48,
    /// Keyboard type selection
    KeyboardType = 0x50,
    /// Configuration-field write
    FieldWrite = 0x60,
    /// Configuration-field read
    FieldRead = 0x61,
    /// Commit pending field writes to persistent storage
    Commit = 0x62,
}

impl CommandId {
    /// The raw command byte written to the EC command port
    pub const fn byte(self) -> u8 {
        self as u8
    }

    /// Returns a human-readable name for the command
    pub fn name(&self) -> &'static str {
        match self {
            CommandId::Led => "LED",
            CommandId::Fan => "FAN",
            CommandId::Temperature => "TEMP",
            CommandId::BatteryControl => "BATTERY_CTRL",
            CommandId::BatteryInfo => "BATTERY_INFO",
            CommandId::KeyboardBacklight => "KB_BACKLIGHT",
            CommandId::EcVersion => "EC_VERSION",
            CommandId::KeyboardType => "KB_TYPE",
            CommandId::FieldWrite => "FIELD_WRITE",
            CommandId::FieldRead => "FIELD_READ",
            CommandId::Commit => "COMMIT",
        }
    }
}

impl TryFrom<u8> for CommandId {
    type Error = FieldError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x10 => Ok(Self::Led),
            0x20 => Ok(Self::Fan),
            0x28 => Ok(Self::Temperature),
            0x30 => Ok(Self::BatteryControl),
            0x31 => Ok(Self::BatteryInfo),
            0x40 => Ok(Self::KeyboardBacklight),
            0x48 => Ok(Self::EcVersion),
            0x50 => Ok(Self::KeyboardType),
            0x60 => Ok(Self::FieldWrite),
            0x61 => Ok(Self::FieldRead),
            0x62 => Ok(Self::Commit),
            _ => Err(FieldError::UnknownCommand(value)),
        }
    }
}

/// LED subcommands (channel select); the second payload byte is the state
pub mod led {
    /// Power LED channel
    pub const POWER: u8 = 0x01;
    /// Charge LED channel
    pub const CHARGE: u8 = 0x02;

    /// LED off state value
    pub const STATE_OFF: u8 = 0x01;
    /// LED blue state value
    pub const STATE_BLUE: u8 = 0x02;
    /// LED amber state value
    pub const STATE_AMBER: u8 = 0x03;
}

/// Fan subcommands
pub mod fan {
    /// Set control mode: `[0x01, mode]` with mode 0x01 = auto, 0x02 = debug
    pub const SET_MODE: u8 = 0x01;
    /// Set duty: `[0x02, 0x02, duty]`, debug mode only
    pub const SET_DUTY: u8 = 0x02;
    /// Set target RPM: `[0x03, 0x03, lsb, msb]`, debug mode only
    pub const SET_RPM: u8 = 0x03;
    /// Read duty: `[0x04, 0x01]`, one response byte
    pub const GET_DUTY: u8 = 0x04;
    /// Read RPM: `[0x05, 0x02]`, two response bytes (LE16)
    pub const GET_RPM: u8 = 0x05;

    /// Automatic fan control mode value
    pub const MODE_AUTO: u8 = 0x01;
    /// Debug (manual) fan control mode value
    pub const MODE_DEBUG: u8 = 0x02;
}

/// Battery control subcommands
pub mod battery {
    /// Set mode: `[0x01, mode]` with mode 0x01 = auto, 0x02 = debug
    pub const SET_MODE: u8 = 0x01;
    /// Start charging: `[0x02, 0x01]`
    pub const CHARGE: u8 = 0x02;
    /// Start discharging: `[0x03, 0x01]`
    pub const DISCHARGE: u8 = 0x03;

    /// Automatic battery mode value
    pub const MODE_AUTO: u8 = 0x01;
    /// Debug battery mode value
    pub const MODE_DEBUG: u8 = 0x02;
}

/// Keyboard backlight subcommands
pub mod backlight {
    /// Turn backlight on
    pub const ON: u8 = 0x01;
    /// Turn backlight off
    pub const OFF: u8 = 0x02;
    /// Set brightness level: `[0x03, level]` with level 0..=3
    pub const LEVEL: u8 = 0x03;

    /// Highest supported brightness level
    pub const MAX_LEVEL: u8 = 3;
}

/// EC version subcommands
pub mod version {
    /// Read the firmware version string (fixed 20-byte ASCII response)
    pub const READ: u8 = 0x01;

    /// Fixed length of the version response buffer
    pub const RESPONSE_LEN: usize = 20;
}

/// Commit subcommands
pub mod commit {
    /// Flush pending field writes to eflash
    pub const SAVE: u8 = 0x01;
}

/// Temperature sensor ids, `(name, subcommand)`
///
/// The response for every sensor is a little-endian 16-bit reading in
/// vendor units.
pub const TEMP_SENSORS: &[(&str, u8)] = &[
    ("cpu", 0x01),
    ("pch", 0x02),
    ("gpu", 0x03),
    ("ts1", 0x04),
    ("ts2", 0x05),
    ("ts3", 0x06),
    ("ts4", 0x07),
];

/// Look up a temperature sensor subcommand by name
pub fn temp_sensor(name: &str) -> Option<u8> {
    TEMP_SENSORS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, sub)| *sub)
}

/// Encode a 16-bit value as little-endian wire bytes
pub fn le16(value: u16) -> [u8; 2] {
    value.to_le_bytes()
}

/// Decode a little-endian 16-bit value from the start of a response
pub fn read_le16(data: &[u8]) -> Option<u16> {
    Some(u16::from_le_bytes([*data.first()?, *data.get(1)?]))
}
