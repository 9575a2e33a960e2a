//! Configuration-field catalog
//!
//! Firmware configuration fields live behind the field write/read command
//! pair (0x60/0x61). Each field is described by an immutable [`FieldDef`]:
//! its byte length, the command/subcommand pair for each direction, and the
//! encoding used to translate between display text and the stored bytes.
//!
//! The catalog is fixed process-wide configuration data. A per-run length
//! override produces a derived copy via [`FieldDef::with_length`]; the
//! catalog entry itself is never mutated.

use crate::command::CommandId;

/// Encoding kind of a configuration field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Encoding {
    /// NUL-padded ASCII text
    Ascii,
    /// 16-byte UUID with the three leading segments byte-swapped in storage
    Uuid,
    /// Colon-separated uppercase hex octets
    Mac,
    /// Packed BCD decimal digits, two per byte
    BcdDate,
    /// Raw bytes rendered as space-separated `0xHH` tokens
    Hex,
}

impl Encoding {
    /// Returns a human-readable name for the encoding
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Ascii => "ascii",
            Encoding::Uuid => "uuid",
            Encoding::Mac => "mac",
            Encoding::BcdDate => "bcd_date",
            Encoding::Hex => "hex",
        }
    }
}

/// Static metadata for one configuration field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    /// Catalog key
    pub name: &'static str,
    /// Display label
    pub label: &'static str,
    /// Stored byte length
    pub length: usize,
    /// Command byte for writes
    pub write_cmd: u8,
    /// Subcommand selecting this field on writes
    pub write_sub: u8,
    /// Command byte for reads
    pub read_cmd: u8,
    /// Subcommand selecting this field on reads
    pub read_sub: u8,
    /// Encoding kind
    pub encoding: Encoding,
}

impl FieldDef {
    /// Derived copy with a substituted byte length (per-run override)
    pub const fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }
}

/// Catalog entry constructor; all fields share the 0x60/0x61 command pair
/// and use the same subcommand in both directions.
const fn field(
    name: &'static str,
    label: &'static str,
    sub: u8,
    length: usize,
    encoding: Encoding,
) -> FieldDef {
    FieldDef {
        name,
        label,
        length,
        write_cmd: CommandId::FieldWrite as u8,
        write_sub: sub,
        read_cmd: CommandId::FieldRead as u8,
        read_sub: sub,
        encoding,
    }
}

/// The process-wide configuration-field catalog
pub static FIELDS: &[FieldDef] = &[
    field("system_product_name", "System Product Name", 0x01, 50, Encoding::Ascii),
    field("product_name2", "Product Name2", 0x02, 50, Encoding::Ascii),
    field("system_family", "System Family", 0x03, 30, Encoding::Ascii),
    field("marketing_name2", "Marketing Name2", 0x04, 30, Encoding::Ascii),
    field("uuid", "UUID", 0x05, 16, Encoding::Uuid),
    field("serial_number_system", "Serial Number (System)", 0x06, 22, Encoding::Ascii),
    field("serial_number_mb", "Serial Number (MB)", 0x07, 22, Encoding::Ascii),
    field("asset_tag", "Asset Tag", 0x08, 22, Encoding::Ascii),
    field("project_define", "Project Define", 0x09, 3, Encoding::Ascii),
    field("country_type", "Country Type", 0x0A, 1, Encoding::Hex),
    field("project_id", "Project ID", 0x0B, 1, Encoding::Hex),
    field("manufacture_name", "Manufacture Name", 0x0C, 16, Encoding::Ascii),
    field("shipping_region", "Shipping Region", 0x0D, 1, Encoding::Hex),
    field("secure_boot", "Secure Boot", 0x0E, 1, Encoding::Hex),
    field("uefi_boot_type", "UEFI Boot Type", 0x0F, 1, Encoding::Hex),
    field("vmd_controller", "VMD Controller", 0x10, 1, Encoding::Hex),
    field("vpro_sku", "Vpro SKU", 0x11, 1, Encoding::Hex),
    field("os_type", "OS Type", 0x12, 1, Encoding::Hex),
    field("mac_address", "MAC Address", 0x13, 6, Encoding::Mac),
    field("touch_pad", "Touch Pad", 0x14, 1, Encoding::Hex),
    field("keyboard_backlight_enable", "Keyboard Backlight Enable", 0x15, 1, Encoding::Hex),
    field("kb_matrix_type", "KB Matrix Type", 0x16, 1, Encoding::Hex),
    field("copilotkey_type", "Copilotkey Type", 0x17, 1, Encoding::Hex),
    field("mic_type", "MIC Type", 0x18, 1, Encoding::Hex),
    field("computrace", "Computrace", 0x19, 1, Encoding::Hex),
    field("custom_logo", "Custom Logo", 0x1A, 1, Encoding::Hex),
    field("battery_first_use_date", "Battery First Use Date", 0x1B, 4, Encoding::BcdDate),
    field("mfg_force_boot", "MFG Force Boot", 0x1C, 1, Encoding::Hex),
    field("ownership_tag", "Ownership Tag", 0x1D, 50, Encoding::Ascii),
    field("load_default", "Load Default", 0x1E, 1, Encoding::Hex),
    field("sku_number", "SKU Number", 0x1F, 16, Encoding::Ascii),
];

/// Look up a field by catalog key
pub fn by_name(name: &str) -> Option<&'static FieldDef> {
    FIELDS.iter().find(|f| f.name == name)
}

/// Look up a field by its read subcommand
pub fn by_read_sub(sub: u8) -> Option<&'static FieldDef> {
    FIELDS.iter().find(|f| f.read_sub == sub)
}

/// Look up a field by its write subcommand
pub fn by_write_sub(sub: u8) -> Option<&'static FieldDef> {
    FIELDS.iter().find(|f| f.write_sub == sub)
}

/// Iterator over all catalog keys, in catalog order
pub fn names() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().map(|f| f.name)
}

/// Battery information value interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryKind {
    /// Little-endian 16-bit integer
    Le16,
    /// NUL-padded ASCII text
    Ascii,
}

/// One battery information item under command 0x31
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryItem {
    /// Catalog key
    pub name: &'static str,
    /// Subcommand selecting the item
    pub sub: u8,
    /// Response byte length
    pub length: usize,
    /// Value interpretation
    pub kind: BatteryKind,
}

const fn batt(name: &'static str, sub: u8, length: usize, kind: BatteryKind) -> BatteryItem {
    BatteryItem {
        name,
        sub,
        length,
        kind,
    }
}

/// Battery information catalog (SBS-like item set)
pub static BATTERY_ITEMS: &[BatteryItem] = &[
    batt("manufacturer_access", 0x01, 2, BatteryKind::Le16),
    batt("battery_mode", 0x02, 2, BatteryKind::Le16),
    batt("temperature", 0x03, 2, BatteryKind::Le16),
    batt("voltage", 0x04, 2, BatteryKind::Le16),
    batt("current", 0x05, 2, BatteryKind::Le16),
    batt("average_current", 0x06, 2, BatteryKind::Le16),
    batt("max_error", 0x07, 2, BatteryKind::Le16),
    batt("relative_state_of_charge", 0x08, 2, BatteryKind::Le16),
    batt("absolute_state_of_charge", 0x09, 2, BatteryKind::Le16),
    batt("remaining_capacity", 0x0A, 2, BatteryKind::Le16),
    batt("full_charge_capacity", 0x0B, 2, BatteryKind::Le16),
    batt("charging_current", 0x0C, 2, BatteryKind::Le16),
    batt("charging_voltage", 0x0D, 2, BatteryKind::Le16),
    batt("battery_status", 0x0E, 2, BatteryKind::Le16),
    batt("cycle_count", 0x0F, 2, BatteryKind::Le16),
    batt("design_capacity", 0x10, 2, BatteryKind::Le16),
    batt("design_voltage", 0x11, 2, BatteryKind::Le16),
    batt("specification_info", 0x12, 2, BatteryKind::Le16),
    batt("manufacture_date", 0x13, 2, BatteryKind::Le16),
    batt("serial_number", 0x14, 2, BatteryKind::Le16),
    batt("manufacturer_name", 0x15, 14, BatteryKind::Ascii),
    batt("device_name", 0x16, 14, BatteryKind::Ascii),
    batt("device_chemistry", 0x17, 6, BatteryKind::Ascii),
    batt("manufacturer_data", 0x18, 14, BatteryKind::Ascii),
    batt("cell_voltage4", 0x19, 2, BatteryKind::Le16),
    batt("cell_voltage3", 0x1A, 2, BatteryKind::Le16),
    batt("cell_voltage2", 0x1B, 2, BatteryKind::Le16),
    batt("cell_voltage1", 0x1C, 2, BatteryKind::Le16),
    batt("run_time_to_empty", 0x1D, 2, BatteryKind::Le16),
    batt("average_time_to_empty", 0x1E, 2, BatteryKind::Le16),
    batt("average_time_to_full", 0x1F, 2, BatteryKind::Le16),
];

/// Look up a battery item by catalog key
pub fn battery_item(name: &str) -> Option<&'static BatteryItem> {
    BATTERY_ITEMS.iter().find(|i| i.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_subcommands_are_unique() {
        for (i, a) in FIELDS.iter().enumerate() {
            for b in &FIELDS[i + 1..] {
                assert_ne!(a.read_sub, b.read_sub, "{} vs {}", a.name, b.name);
                assert_ne!(a.name, b.name);
            }
        }
    }

    #[test]
    fn lookups_agree() {
        let mac = by_name("mac_address").unwrap();
        assert_eq!(mac.length, 6);
        assert_eq!(mac.encoding, Encoding::Mac);
        assert_eq!(by_read_sub(mac.read_sub), Some(mac));
        assert_eq!(by_write_sub(mac.write_sub), Some(mac));
    }

    #[test]
    fn with_length_derives_without_touching_catalog() {
        let uuid = by_name("uuid").unwrap();
        let short = uuid.with_length(4);
        assert_eq!(short.length, 4);
        assert_eq!(uuid.length, 16);
        assert_eq!(by_name("uuid").unwrap().length, 16);
    }

    #[test]
    fn battery_catalog_lookup() {
        let item = battery_item("device_chemistry").unwrap();
        assert_eq!(item.sub, 0x17);
        assert_eq!(item.length, 6);
        assert_eq!(item.kind, BatteryKind::Ascii);
        assert!(battery_item("bogus").is_none());
    }
}
