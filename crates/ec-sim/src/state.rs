//! Simulated device state
//!
//! Independent sub-states mutated only by the device's own command
//! dispatch. Defaults mirror a plausible mid-life machine so readouts look
//! realistic in demos and tests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Auto/debug control mode shared by the fan and battery subsystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMode {
    /// EC firmware drives the subsystem
    Auto,
    /// Host-issued set commands take effect
    Debug,
}

/// Power/charge LED channels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedState {
    /// Power LED lit
    pub power_on: bool,
    /// Charge LED lit
    pub charge_on: bool,
}

/// Fan mode, duty and RPM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanState {
    pub mode: ControlMode,
    pub duty: u8,
    pub rpm: u16,
}

impl Default for FanState {
    fn default() -> Self {
        Self {
            mode: ControlMode::Auto,
            duty: 128,
            rpm: 2500,
        }
    }
}

/// Keyboard backlight on/off and level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklightState {
    pub on: bool,
    /// Brightness level 0..=3
    pub level: u8,
}

/// Battery mode and charge direction flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatteryState {
    pub mode: ControlMode,
    pub charging: bool,
    pub discharging: bool,
}

impl Default for BatteryState {
    fn default() -> Self {
        Self {
            mode: ControlMode::Auto,
            charging: false,
            discharging: false,
        }
    }
}

/// Keyboard type selection, as last written by command 0x50
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyboardTypeState {
    pub brand: u8,
    /// Brand-specific type code (mutually exclusive with category/size)
    pub type_code: Option<u8>,
    pub category: Option<u8>,
    pub size: Option<u8>,
}

/// Initial state for a simulator instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Firmware version string reported by command 0x48
    pub version: String,
    pub led: LedState,
    pub fan: FanState,
    pub backlight: BacklightState,
    pub battery: BatteryState,
    /// Sensor id to temperature reading (vendor units)
    pub temps: BTreeMap<u8, u16>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            version: "SimEC v1.0".to_string(),
            led: LedState::default(),
            fan: FanState::default(),
            backlight: BacklightState::default(),
            battery: BatteryState::default(),
            temps: default_temps(),
        }
    }
}

/// Default temperature table: sensor subcommand to reading
pub fn default_temps() -> BTreeMap<u8, u16> {
    BTreeMap::from([
        (0x01, 450), // cpu
        (0x02, 420), // pch
        (0x03, 480), // gpu
        (0x04, 300), // ts1
        (0x05, 305), // ts2
        (0x06, 290), // ts3
        (0x07, 295), // ts4
    ])
}

fn le16(value: u16) -> Vec<u8> {
    ec_protocol::command::le16(value).to_vec()
}

fn ascii_fixed(text: &str, length: usize) -> Vec<u8> {
    let mut bytes: Vec<u8> = text.bytes().take(length).collect();
    bytes.resize(length, 0);
    bytes
}

/// Default battery information buffers, keyed by subcommand
pub fn default_battery_info() -> BTreeMap<u8, Vec<u8>> {
    BTreeMap::from([
        (0x01, le16(0x0000)),  // manufacturer_access
        (0x02, le16(0x0001)),  // battery_mode
        (0x03, le16(3000)),    // temperature (0.1K or vendor-defined)
        (0x04, le16(11400)),   // voltage (mV)
        (0x05, le16(1500)),    // current (mA)
        (0x06, le16(1200)),    // average_current (mA)
        (0x07, le16(5)),       // max_error (%)
        (0x08, le16(80)),      // relative_state_of_charge (%)
        (0x09, le16(78)),      // absolute_state_of_charge (%)
        (0x0A, le16(4200)),    // remaining_capacity (mAh)
        (0x0B, le16(5200)),    // full_charge_capacity (mAh)
        (0x0C, le16(2000)),    // charging_current (mA)
        (0x0D, le16(12600)),   // charging_voltage (mV)
        (0x0E, le16(0x0000)),  // battery_status (flags)
        (0x0F, le16(120)),     // cycle_count
        (0x10, le16(5600)),    // design_capacity (mAh)
        (0x11, le16(11400)),   // design_voltage (mV)
        (0x12, le16(0x1234)),  // specification_info
        (0x13, le16(0x5E21)),  // manufacture_date (encoded)
        (0x14, le16(0x0420)),  // serial_number
        (0x15, ascii_fixed("SimBattery", 14)),
        (0x16, ascii_fixed("SimDevice", 14)),
        (0x17, ascii_fixed("Li-Ion", 6)),
        (0x18, ascii_fixed("SimData", 14)),
        (0x19, le16(2850)),    // cell_voltage4 (mV)
        (0x1A, le16(2850)),    // cell_voltage3 (mV)
        (0x1B, le16(2850)),    // cell_voltage2 (mV)
        (0x1C, le16(2850)),    // cell_voltage1 (mV)
        (0x1D, le16(120)),     // run_time_to_empty (min)
        (0x1E, le16(110)),     // average_time_to_empty (min)
        (0x1F, le16(80)),      // average_time_to_full (min)
    ])
}

/// Default configuration-field values, keyed by catalog name
///
/// Fields without an entry start out zero-filled.
pub static DEFAULT_FIELD_VALUES: &[(&str, &str)] = &[
    ("system_product_name", "XPS-9710-BOM123"),
    ("product_name2", "XPS-9710-RevB"),
    ("system_family", "XPS Performance Series"),
    ("marketing_name2", "XPS Marketing Name R2"),
    ("uuid", "12345678-90ab-cdef-1234-567890abcdef"),
    ("serial_number_system", "SYSNMB0001234567890"),
    ("serial_number_mb", "MBNMB0001234567890"),
    ("asset_tag", "Asset-Tag-001"),
    ("project_define", "P01"),
    ("country_type", "0x01"),
    ("project_id", "0x02"),
    ("manufacture_name", "ExampleMFG"),
    ("shipping_region", "0x21"),
    ("secure_boot", "0x01"),
    ("uefi_boot_type", "0x02"),
    ("vmd_controller", "0x01"),
    ("vpro_sku", "0x01"),
    ("os_type", "0x02"),
    ("mac_address", "AA:BB:CC:DD:EE:FF"),
    ("touch_pad", "0x01"),
    ("keyboard_backlight_enable", "0x01"),
    ("kb_matrix_type", "0x02"),
    ("copilotkey_type", "0x01"),
    ("mic_type", "0x01"),
    ("computrace", "0x01"),
    ("custom_logo", "0x01"),
    ("battery_first_use_date", "20240315"),
    ("mfg_force_boot", "0x00"),
    ("ownership_tag", "Demo Ownership Tag"),
    ("load_default", "0x01"),
];
