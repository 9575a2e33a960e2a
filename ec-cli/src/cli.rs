//! CLI definitions using clap

use std::num::NonZeroUsize;
use std::time::Duration;

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};

/// Parse an integer that may carry a `0x` prefix
fn parse_with_radix(s: &str) -> Result<u32, String> {
    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };
    u32::from_str_radix(digits, radix).map_err(|e| e.to_string())
}

pub fn parse_byte(s: &str) -> Result<u8, String> {
    let v = parse_with_radix(s)?;
    u8::try_from(v).map_err(|_| format!("byte '{s}' out of range (0-255)"))
}

pub fn parse_u16(s: &str) -> Result<u16, String> {
    let v = parse_with_radix(s)?;
    u16::try_from(v).map_err(|_| format!("value '{s}' out of range (0-65535)"))
}

/// Parse a non-negative duration given in seconds
pub fn parse_seconds(s: &str) -> Result<Duration, String> {
    let secs: f64 = s.parse().map_err(|_| format!("invalid seconds: '{s}'"))?;
    if secs < 0.0 {
        return Err(format!("seconds must be non-negative: '{s}'"));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| format!("seconds out of range: '{s}'"))
}

#[derive(Parser)]
#[command(name = "ecdiag")]
#[command(version, about = "Embedded controller diagnostic tool")]
#[command(propagate_version = true)]
pub struct Cli {
    /// EC command port (decimal or 0x hex)
    #[arg(long, global = true, default_value = "0x6C", value_parser = parse_u16)]
    pub cmd_port: u16,

    /// EC data port (decimal or 0x hex)
    #[arg(long, global = true, default_value = "0x68", value_parser = parse_u16)]
    pub data_port: u16,

    /// Use the built-in EC simulator (ignore ports)
    #[arg(long, global = true)]
    pub sim: bool,

    /// Verbose EC I/O logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Per-read wait while draining the response (seconds)
    #[arg(long, global = true, default_value = "0.5", value_parser = parse_seconds)]
    pub wait: Duration,

    /// Overall transaction timeout (seconds)
    #[arg(short = 't', long, global = true, default_value = "5.0", value_parser = parse_seconds)]
    pub timeout: Duration,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Auto,
    Debug,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LedTarget {
    Power,
    Charge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LedColor {
    Off,
    Blue,
    Amber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Brand {
    Acer,
    Asus,
    Dell,
    Hp,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read the EC firmware version string
    #[command(visible_alias = "ver")]
    Ecversion,

    /// Control the power/charge LED
    Led {
        /// LED channel
        #[arg(value_enum)]
        target: LedTarget,
        /// LED state
        #[arg(value_enum)]
        color: LedColor,
    },

    /// Fan control: mode, duty, RPM, and readback
    #[command(group(ArgGroup::new("op").required(true)))]
    Fan {
        /// Set fan control mode
        #[arg(long, value_enum, group = "op")]
        mode: Option<Mode>,
        /// Set duty 0-255 (debug mode only)
        #[arg(long, value_name = "DUTY", value_parser = parse_byte, group = "op")]
        set_duty: Option<u8>,
        /// Set target RPM (debug mode only)
        #[arg(long, value_name = "RPM", value_parser = parse_u16, group = "op")]
        set_rpm: Option<u16>,
        /// Read current duty
        #[arg(long, group = "op")]
        get_duty: bool,
        /// Read current RPM
        #[arg(long, group = "op")]
        get_rpm: bool,
    },

    /// Read a temperature sensor (cpu, pch, gpu, ts1-ts4)
    Temp {
        /// Sensor name
        sensor: String,
    },

    /// Battery control (0x30) and information (0x31)
    #[command(group(ArgGroup::new("op").required(true)))]
    Battery {
        /// Set battery mode
        #[arg(long, value_enum, group = "op")]
        mode: Option<Mode>,
        /// Start charging
        #[arg(long, group = "op")]
        charge: bool,
        /// Start discharging
        #[arg(long, group = "op")]
        discharge: bool,
        /// Read a battery information item ('all' for every item)
        #[arg(long, value_name = "ITEM", group = "op")]
        get: Option<String>,
    },

    /// Keyboard backlight control
    #[command(group(ArgGroup::new("op").required(true)))]
    Kblight {
        /// Turn backlight on
        #[arg(long, group = "op")]
        on: bool,
        /// Turn backlight off
        #[arg(long, group = "op")]
        off: bool,
        /// Set brightness level 0-3
        #[arg(long, value_name = "LEVEL", value_parser = parse_byte, group = "op")]
        level: Option<u8>,
    },

    /// Keyboard type selection
    Kbtype {
        /// Brand selection
        #[arg(long, value_enum)]
        brand: Brand,
        /// Brand-specific type code
        #[arg(long, value_name = "TYPE", value_parser = parse_byte)]
        type_code: Option<u8>,
        /// Product category code
        #[arg(long, value_name = "CAT", value_parser = parse_byte)]
        category: Option<u8>,
        /// Product size code
        #[arg(long, value_name = "SIZE", value_parser = parse_byte)]
        size: Option<u8>,
    },

    /// Read or write a configuration field
    #[command(group(ArgGroup::new("op").required(true)))]
    Field {
        /// Target field name (see `field --list`)
        #[arg(required_unless_present = "list")]
        name: Option<String>,
        /// Read the field value
        #[arg(long, group = "op")]
        read: bool,
        /// Write the field value (text, UUID or byte tokens per encoding)
        #[arg(long, value_name = "VALUE", group = "op")]
        write: Option<String>,
        /// List all known fields
        #[arg(long, group = "op")]
        list: bool,
        /// Override the field length in bytes for this run
        #[arg(long, value_name = "BYTES")]
        field_length: Option<NonZeroUsize>,
    },

    /// Send a raw EC command and read the response
    Raw {
        /// Command byte
        #[arg(long, value_parser = parse_byte)]
        cmd: u8,
        /// Optional subcommand byte
        #[arg(long, value_parser = parse_byte)]
        subcmd: Option<u8>,
        /// Payload data bytes
        #[arg(long, num_args = 0.., value_name = "BYTE", value_parser = parse_byte)]
        data: Vec<u8>,
        /// Expected response length
        #[arg(short = 'n', long, default_value_t = 0)]
        length: usize,
    },
}
