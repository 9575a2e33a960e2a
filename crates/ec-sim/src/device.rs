//! The simulated embedded controller
//!
//! [`EcSimulator`] implements the same write-command / write-data /
//! read-byte contract as the hardware port transport, so the transaction
//! engine cannot tell the two apart. A transaction context lives between
//! one `write_command` and the next: the accumulated payload, the pending
//! output queue, and a flag recording that the single-shot response was
//! already generated.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};

use tracing::debug;

use ec_protocol::command::{self, CommandId};
use ec_protocol::{codec, fields};
use ec_transport::{EcTransport, TransportError};

use crate::state::{
    default_battery_info, BacklightState, BatteryState, ControlMode, FanState,
    KeyboardTypeState, LedState, SimulatorConfig, DEFAULT_FIELD_VALUES,
};

/// Transaction-local bookkeeping, reset by each `write_command`
#[derive(Debug, Default)]
struct OpenTransaction {
    cmd: Option<u8>,
    data: Vec<u8>,
    out: VecDeque<u8>,
    responded: bool,
}

/// In-process EC device model
#[derive(Debug)]
pub struct EcSimulator {
    txn: OpenTransaction,

    version: String,
    led: LedState,
    fan: FanState,
    backlight: BacklightState,
    battery: BatteryState,
    keyboard_type: KeyboardTypeState,
    temps: BTreeMap<u8, u16>,
    battery_info: BTreeMap<u8, Vec<u8>>,

    /// Stored configuration-field buffers, keyed by read subcommand
    field_store: HashMap<u8, Vec<u8>>,
    field_length_overrides: HashMap<u8, usize>,
    commit_count: u32,
}

impl EcSimulator {
    /// Create a simulator with default state
    pub fn new() -> Self {
        Self::from_config(SimulatorConfig::default())
    }

    /// Create a simulator from an initial-state configuration
    pub fn from_config(config: SimulatorConfig) -> Self {
        let mut sim = Self {
            txn: OpenTransaction::default(),
            version: config.version,
            led: config.led,
            fan: config.fan,
            backlight: config.backlight,
            battery: config.battery,
            keyboard_type: KeyboardTypeState::default(),
            temps: config.temps,
            battery_info: default_battery_info(),
            field_store: HashMap::new(),
            field_length_overrides: HashMap::new(),
            commit_count: 0,
        };
        sim.seed_field_defaults();
        sim
    }

    /// Seed the field store by encoding the default value catalog through
    /// the real codecs; fields without a default (or whose default fails to
    /// encode) start zero-filled.
    fn seed_field_defaults(&mut self) {
        for field in fields::FIELDS {
            let default = DEFAULT_FIELD_VALUES
                .iter()
                .find(|(name, _)| *name == field.name)
                .and_then(|(_, value)| codec::encode_field(field, value).ok());
            self.field_store
                .insert(field.read_sub, default.unwrap_or_else(|| vec![0; field.length]));
        }
    }

    /// Firmware version string reported by command 0x48
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn led(&self) -> LedState {
        self.led
    }

    pub fn fan(&self) -> FanState {
        self.fan
    }

    pub fn backlight(&self) -> BacklightState {
        self.backlight
    }

    pub fn battery(&self) -> BatteryState {
        self.battery
    }

    pub fn keyboard_type(&self) -> KeyboardTypeState {
        self.keyboard_type
    }

    /// Number of commits (command 0x62) received
    pub fn commit_count(&self) -> u32 {
        self.commit_count
    }

    /// Stored bytes for a configuration field, by read subcommand
    pub fn field_bytes(&self, read_sub: u8) -> Option<&[u8]> {
        self.field_store.get(&read_sub).map(Vec::as_slice)
    }

    /// Substitute a field's byte length for the rest of this run
    ///
    /// The stored buffer is truncated or zero-padded immediately so
    /// subsequent reads are self-consistent with the new length.
    pub fn override_field_length(&mut self, read_sub: u8, length: NonZeroUsize) {
        let length = length.get();
        self.field_length_overrides.insert(read_sub, length);
        let stored = self.field_store.entry(read_sub).or_default();
        stored.resize(length, 0);
    }

    fn effective_length(&self, field: &fields::FieldDef) -> usize {
        self.field_length_overrides
            .get(&field.read_sub)
            .copied()
            .unwrap_or(field.length)
    }

    /// Materialize the response for the stored command, dispatching on the
    /// command byte. Write-style commands mutate state and leave the output
    /// queue empty, matching the real device's no-ack convention.
    fn generate_response(&mut self) {
        let Some(cmd) = self.txn.cmd else {
            return;
        };
        let data = std::mem::take(&mut self.txn.data);
        let out = match CommandId::try_from(cmd) {
            Ok(CommandId::EcVersion) => self.respond_version(&data),
            Ok(CommandId::Led) => self.handle_led(&data),
            Ok(CommandId::Fan) => self.handle_fan(&data),
            Ok(CommandId::Temperature) => self.respond_temp(&data),
            Ok(CommandId::BatteryControl) => self.handle_battery_control(&data),
            Ok(CommandId::BatteryInfo) => self.respond_battery_info(&data),
            Ok(CommandId::KeyboardBacklight) => self.handle_backlight(&data),
            Ok(CommandId::KeyboardType) => self.handle_keyboard_type(&data),
            Ok(CommandId::FieldWrite) => self.handle_field_write(&data),
            Ok(CommandId::FieldRead) => self.respond_field_read(&data),
            Ok(CommandId::Commit) => self.handle_commit(&data),
            // Unknown command: no response
            Err(_) => Vec::new(),
        };
        debug!("sim: cmd 0x{cmd:02X} -> {} response byte(s)", out.len());
        self.txn.data = data;
        self.txn.out = out.into();
    }

    fn respond_version(&self, data: &[u8]) -> Vec<u8> {
        if data.first() != Some(&command::version::READ) {
            return Vec::new();
        }
        let mut out: Vec<u8> = self
            .version
            .bytes()
            .take(command::version::RESPONSE_LEN)
            .collect();
        out.resize(command::version::RESPONSE_LEN, 0);
        out
    }

    fn handle_led(&mut self, data: &[u8]) -> Vec<u8> {
        if let [which, value, ..] = *data {
            match which {
                command::led::POWER => self.led.power_on = value != command::led::STATE_OFF,
                command::led::CHARGE => self.led.charge_on = value != command::led::STATE_OFF,
                _ => {}
            }
        }
        Vec::new()
    }

    fn handle_fan(&mut self, data: &[u8]) -> Vec<u8> {
        match *data {
            [command::fan::SET_MODE, mode, ..] => {
                self.fan.mode = if mode == command::fan::MODE_AUTO {
                    ControlMode::Auto
                } else {
                    ControlMode::Debug
                };
                Vec::new()
            }
            [command::fan::SET_DUTY, _, duty, ..] => {
                self.fan.duty = duty;
                // In debug mode the duty roughly maps onto an RPM
                if self.fan.mode == ControlMode::Debug {
                    self.fan.rpm = u16::from(duty) * 20;
                }
                Vec::new()
            }
            [command::fan::SET_RPM, _, lsb, msb, ..] => {
                self.fan.rpm = u16::from_le_bytes([lsb, msb]);
                Vec::new()
            }
            [command::fan::GET_DUTY, 0x01, ..] => vec![self.fan.duty],
            [command::fan::GET_RPM, 0x02, ..] => command::le16(self.fan.rpm).to_vec(),
            _ => Vec::new(),
        }
    }

    fn respond_temp(&self, data: &[u8]) -> Vec<u8> {
        let Some(&sensor) = data.first() else {
            return Vec::new();
        };
        let value = self.temps.get(&sensor).copied().unwrap_or(0);
        command::le16(value).to_vec()
    }

    fn handle_battery_control(&mut self, data: &[u8]) -> Vec<u8> {
        match *data {
            [command::battery::SET_MODE, mode, ..] => {
                self.battery.mode = if mode == command::battery::MODE_AUTO {
                    ControlMode::Auto
                } else {
                    ControlMode::Debug
                };
            }
            [command::battery::CHARGE, 0x01, ..] => {
                self.battery.charging = true;
                self.battery.discharging = false;
            }
            [command::battery::DISCHARGE, 0x01, ..] => {
                self.battery.discharging = true;
                self.battery.charging = false;
            }
            _ => {}
        }
        Vec::new()
    }

    fn respond_battery_info(&self, data: &[u8]) -> Vec<u8> {
        data.first()
            .and_then(|sub| self.battery_info.get(sub))
            .cloned()
            .unwrap_or_default()
    }

    fn handle_backlight(&mut self, data: &[u8]) -> Vec<u8> {
        match *data {
            [command::backlight::ON, ..] => self.backlight.on = true,
            [command::backlight::OFF, ..] => self.backlight.on = false,
            [command::backlight::LEVEL, level, ..] => {
                self.backlight.level = level.min(command::backlight::MAX_LEVEL);
                self.backlight.on = self.backlight.level > 0;
            }
            _ => {}
        }
        Vec::new()
    }

    fn handle_keyboard_type(&mut self, data: &[u8]) -> Vec<u8> {
        match *data {
            [brand, type_code] => {
                self.keyboard_type = KeyboardTypeState {
                    brand,
                    type_code: Some(type_code),
                    category: None,
                    size: None,
                };
            }
            [brand, category, size, ..] => {
                self.keyboard_type = KeyboardTypeState {
                    brand,
                    type_code: None,
                    category: Some(category),
                    size: Some(size),
                };
            }
            _ => {}
        }
        Vec::new()
    }

    fn handle_field_write(&mut self, data: &[u8]) -> Vec<u8> {
        let Some((&sub, payload)) = data.split_first() else {
            return Vec::new();
        };
        let Some(field) = fields::by_write_sub(sub) else {
            return Vec::new();
        };
        let length = self.effective_length(field);
        let mut stored = payload.to_vec();
        stored.resize(length, 0);
        stored.truncate(length);
        self.field_store.insert(field.read_sub, stored);
        Vec::new()
    }

    fn respond_field_read(&mut self, data: &[u8]) -> Vec<u8> {
        let Some(&sub) = data.first() else {
            return Vec::new();
        };
        let Some(field) = fields::by_read_sub(sub) else {
            return Vec::new();
        };
        let length = self.effective_length(field);
        let stored = self
            .field_store
            .entry(field.read_sub)
            .or_insert_with(|| vec![0; length]);
        let mut out = stored.clone();
        out.resize(length, 0);
        out.truncate(length);
        out
    }

    fn handle_commit(&mut self, data: &[u8]) -> Vec<u8> {
        if data.first() == Some(&command::commit::SAVE) {
            self.commit_count += 1;
        }
        Vec::new()
    }
}

impl Default for EcSimulator {
    fn default() -> Self {
        Self::new()
    }
}

impl EcTransport for EcSimulator {
    fn write_command(&mut self, cmd: u8) -> Result<(), TransportError> {
        // New transaction begins; previous payload and output are dropped
        self.txn = OpenTransaction {
            cmd: Some(cmd),
            ..OpenTransaction::default()
        };
        Ok(())
    }

    fn write_data(&mut self, byte: u8) -> Result<(), TransportError> {
        self.txn.data.push(byte);
        Ok(())
    }

    fn read_byte(&mut self, timeout: Duration) -> Result<u8, TransportError> {
        // The response is materialized once per transaction; an emptied
        // queue blocks until the timeout, like the real single-shot device
        if self.txn.out.is_empty() && !self.txn.responded {
            self.generate_response();
            self.txn.responded = true;
        }

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(byte) = self.txn.out.pop_front() {
                return Ok(byte);
            }
            if Instant::now() >= deadline {
                return Err(TransportError::ReadTimeout(timeout));
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn status(&mut self) -> Result<u8, TransportError> {
        Ok(0)
    }
}
