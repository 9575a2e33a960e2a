//! Feature command handlers
//!
//! Each handler builds `(command byte, payload, expected length)`, runs one
//! transaction through whichever backend is active, and renders the
//! response. The transaction engine treats the hardware transport and the
//! simulator identically; only the `field --field-length` override needs to
//! know when the simulator is underneath.

use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use ec_protocol::command::{self, CommandId};
use ec_protocol::fields::{self, BatteryItem, BatteryKind};
use ec_protocol::{codec, FieldError};
use ec_sim::EcSimulator;
use ec_transport::port::{DevPort, PortTransport};
use ec_transport::{txrx, EcTransport};

use crate::cli::{Brand, Commands, LedColor, LedTarget, Mode};

/// Wait before committing a field write, while the EC flushes to eflash
const EFLASH_SETTLE: Duration = Duration::from_millis(300);

/// The active EC backend: real ports or the in-process simulator
pub enum Backend {
    Port(PortTransport<DevPort>),
    Sim(EcSimulator),
}

impl Backend {
    fn transport(&mut self) -> &mut dyn EcTransport {
        match self {
            Backend::Port(transport) => transport,
            Backend::Sim(sim) => sim,
        }
    }

    fn simulator(&mut self) -> Option<&mut EcSimulator> {
        match self {
            Backend::Port(_) => None,
            Backend::Sim(sim) => Some(sim),
        }
    }
}

/// Per-invocation transaction timeouts
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    /// Per-read wait while draining
    pub wait: Duration,
    /// Overall transaction deadline
    pub overall: Duration,
}

impl Timing {
    fn send(
        &self,
        dev: &mut dyn EcTransport,
        cmd: u8,
        data: &[u8],
        expect_len: Option<usize>,
    ) -> Result<Vec<u8>, ec_transport::TransportError> {
        txrx(dev, cmd, data, expect_len, self.wait, self.overall)
    }
}

/// Run one parsed subcommand against the backend
pub fn dispatch(command: &Commands, backend: &mut Backend, timing: Timing) -> Result<()> {
    match command {
        Commands::Ecversion => ec_version(backend, timing),
        Commands::Led { target, color } => led(backend, timing, *target, *color),
        Commands::Fan {
            mode,
            set_duty,
            set_rpm,
            get_duty,
            get_rpm,
        } => fan(backend, timing, *mode, *set_duty, *set_rpm, *get_duty, *get_rpm),
        Commands::Temp { sensor } => temp(backend, timing, sensor),
        Commands::Battery {
            mode,
            charge,
            discharge,
            get,
        } => battery(backend, timing, *mode, *charge, *discharge, get.as_deref()),
        Commands::Kblight { on, off, level } => kblight(backend, timing, *on, *off, *level),
        Commands::Kbtype {
            brand,
            type_code,
            category,
            size,
        } => kbtype(backend, timing, *brand, *type_code, *category, *size),
        Commands::Field {
            name,
            read,
            write,
            list,
            field_length,
        } => field(
            backend,
            timing,
            name.as_deref(),
            *read,
            write.as_deref(),
            *list,
            *field_length,
        ),
        Commands::Raw {
            cmd,
            subcmd,
            data,
            length,
        } => raw(backend, timing, *cmd, *subcmd, data, *length),
    }
}

fn ec_version(backend: &mut Backend, timing: Timing) -> Result<()> {
    let resp = timing.send(
        backend.transport(),
        CommandId::EcVersion.byte(),
        &[command::version::READ],
        None,
    )?;
    if resp.is_empty() {
        bail!("no response received from EC");
    }
    let end = resp.iter().position(|&b| b == 0).unwrap_or(resp.len());
    println!("EC Version: {}", String::from_utf8_lossy(&resp[..end]));
    Ok(())
}

fn led(backend: &mut Backend, timing: Timing, target: LedTarget, color: LedColor) -> Result<()> {
    let (sub, which) = match target {
        LedTarget::Power => (command::led::POWER, "Power"),
        LedTarget::Charge => (command::led::CHARGE, "Charge"),
    };
    let (value, state) = match color {
        LedColor::Off => (command::led::STATE_OFF, "Off"),
        LedColor::Blue => (command::led::STATE_BLUE, "Blue"),
        LedColor::Amber => (command::led::STATE_AMBER, "Amber"),
    };
    timing.send(backend.transport(), CommandId::Led.byte(), &[sub, value], Some(0))?;
    println!("{which} LED: {state}");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn fan(
    backend: &mut Backend,
    timing: Timing,
    mode: Option<Mode>,
    set_duty: Option<u8>,
    set_rpm: Option<u16>,
    get_duty: bool,
    get_rpm: bool,
) -> Result<()> {
    let cmd = CommandId::Fan.byte();
    let dev = backend.transport();

    if let Some(mode) = mode {
        let value = match mode {
            Mode::Auto => command::fan::MODE_AUTO,
            Mode::Debug => command::fan::MODE_DEBUG,
        };
        timing.send(dev, cmd, &[command::fan::SET_MODE, value], Some(0))?;
        println!("Fan mode set: {}", mode_name(mode));
    } else if let Some(duty) = set_duty {
        timing.send(dev, cmd, &[command::fan::SET_DUTY, 0x02, duty], Some(0))?;
        println!("Fan duty set: {duty}");
    } else if let Some(rpm) = set_rpm {
        let [lsb, msb] = command::le16(rpm);
        timing.send(dev, cmd, &[command::fan::SET_RPM, 0x03, lsb, msb], Some(0))?;
        println!("Fan RPM set: {rpm}");
    } else if get_duty {
        let resp = timing.send(dev, cmd, &[command::fan::GET_DUTY, 0x01], Some(1))?;
        println!("Fan Duty: {}", resp[0]);
    } else if get_rpm {
        let resp = timing.send(dev, cmd, &[command::fan::GET_RPM, 0x02], Some(2))?;
        let rpm = command::read_le16(&resp).context("short RPM response")?;
        println!("Fan RPM: {rpm}");
    }
    Ok(())
}

fn temp(backend: &mut Backend, timing: Timing, sensor: &str) -> Result<()> {
    let Some(sub) = command::temp_sensor(sensor) else {
        let known: Vec<&str> = command::TEMP_SENSORS.iter().map(|(n, _)| *n).collect();
        bail!("unknown sensor '{sensor}' (expected one of: {})", known.join(", "));
    };
    let resp = timing.send(backend.transport(), CommandId::Temperature.byte(), &[sub], Some(2))?;
    let value = command::read_le16(&resp).context("short temperature response")?;
    println!("Temperature ({}): {value}", sensor.to_uppercase());
    Ok(())
}

fn battery(
    backend: &mut Backend,
    timing: Timing,
    mode: Option<Mode>,
    charge: bool,
    discharge: bool,
    get: Option<&str>,
) -> Result<()> {
    let ctrl = CommandId::BatteryControl.byte();
    let dev = backend.transport();

    if let Some(mode) = mode {
        let value = match mode {
            Mode::Auto => command::battery::MODE_AUTO,
            Mode::Debug => command::battery::MODE_DEBUG,
        };
        timing.send(dev, ctrl, &[command::battery::SET_MODE, value], Some(0))?;
        println!("Battery mode set: {}", mode_name(mode));
        return Ok(());
    }
    if charge {
        timing.send(dev, ctrl, &[command::battery::CHARGE, 0x01], Some(0))?;
        println!("Battery charge: start");
        return Ok(());
    }
    if discharge {
        timing.send(dev, ctrl, &[command::battery::DISCHARGE, 0x01], Some(0))?;
        println!("Battery discharge: start");
        return Ok(());
    }

    match get {
        Some("all") => {
            for item in fields::BATTERY_ITEMS {
                print_battery_item(dev, timing, item)?;
            }
            Ok(())
        }
        Some(name) => {
            let item = fields::battery_item(name)
                .with_context(|| format!("unknown battery item '{name}'"))?;
            print_battery_item(dev, timing, item)
        }
        None => Ok(()),
    }
}

fn print_battery_item(
    dev: &mut dyn EcTransport,
    timing: Timing,
    item: &BatteryItem,
) -> Result<()> {
    let resp = timing.send(dev, CommandId::BatteryInfo.byte(), &[item.sub], Some(item.length))?;
    match item.kind {
        BatteryKind::Le16 => {
            let value = command::read_le16(&resp).context("short battery response")?;
            println!("{}: {value}", item.name);
        }
        BatteryKind::Ascii => {
            let end = resp.iter().position(|&b| b == 0).unwrap_or(resp.len());
            println!("{}: {}", item.name, String::from_utf8_lossy(&resp[..end]));
        }
    }
    Ok(())
}

fn kblight(
    backend: &mut Backend,
    timing: Timing,
    on: bool,
    off: bool,
    level: Option<u8>,
) -> Result<()> {
    let cmd = CommandId::KeyboardBacklight.byte();
    let dev = backend.transport();

    if on {
        timing.send(dev, cmd, &[command::backlight::ON], Some(0))?;
        println!("KB Backlight: ON");
    } else if off {
        timing.send(dev, cmd, &[command::backlight::OFF], Some(0))?;
        println!("KB Backlight: OFF");
    } else if let Some(level) = level {
        let level = level.min(command::backlight::MAX_LEVEL);
        timing.send(dev, cmd, &[command::backlight::LEVEL, level], Some(0))?;
        println!("KB Backlight Level: {level}");
    }
    Ok(())
}

fn kbtype(
    backend: &mut Backend,
    timing: Timing,
    brand: Brand,
    type_code: Option<u8>,
    category: Option<u8>,
    size: Option<u8>,
) -> Result<()> {
    let (brand_byte, brand_name) = match brand {
        Brand::Acer => (0x01, "acer"),
        Brand::Asus => (0x02, "asus"),
        Brand::Dell => (0x03, "dell"),
        Brand::Hp => (0x04, "hp"),
    };

    let mut payload = vec![brand_byte];
    let desc = if let Some(code) = type_code {
        payload.push(code);
        format!("brand={brand_name}, type=0x{code:02X}")
    } else {
        let Some(category) = category else {
            bail!("--category is required when --type-code is not used");
        };
        payload.push(category);
        if let Some(size) = size {
            payload.push(size);
            format!("brand={brand_name}, category=0x{category:02X}, size=0x{size:02X}")
        } else {
            format!("brand={brand_name}, category=0x{category:02X}")
        }
    };

    timing.send(backend.transport(), CommandId::KeyboardType.byte(), &payload, Some(0))?;
    println!("Keyboard type set: {desc}");
    Ok(())
}

fn field(
    backend: &mut Backend,
    timing: Timing,
    name: Option<&str>,
    read: bool,
    write: Option<&str>,
    list: bool,
    field_length: Option<std::num::NonZeroUsize>,
) -> Result<()> {
    if list {
        for def in fields::FIELDS {
            println!(
                "{:<26} {:>3} byte(s)  {:<8} {}",
                def.name,
                def.length,
                def.encoding.name(),
                def.label
            );
        }
        return Ok(());
    }

    let name = name.unwrap_or_default();
    let catalog_entry = fields::by_name(name)
        .ok_or_else(|| FieldError::UnknownField(name.to_string()))?;
    let mut def = *catalog_entry;
    if let Some(length) = field_length {
        def = def.with_length(length.get());
        // Keep the simulator's stored buffer consistent with the override
        if let Some(sim) = backend.simulator() {
            sim.override_field_length(def.read_sub, length);
        }
    }

    if read {
        let resp = timing.send(
            backend.transport(),
            def.read_cmd,
            &[def.read_sub],
            Some(def.length),
        )?;
        let printable = codec::decode_field(&def, &resp)?;
        println!("{}: {printable}", def.label);
        return Ok(());
    }

    let Some(value) = write else {
        return Ok(());
    };
    let encoded = codec::encode_field(&def, value)?;
    let printable = codec::decode_field(&def, &encoded)?;

    let mut payload = vec![def.write_sub];
    payload.extend_from_slice(&encoded);
    timing
        .send(backend.transport(), def.write_cmd, &payload, Some(0))
        .with_context(|| format!("failed to write {}", def.label))?;

    // The EC needs a moment before the commit lands in eflash
    thread::sleep(EFLASH_SETTLE);
    timing
        .send(
            backend.transport(),
            CommandId::Commit.byte(),
            &[command::commit::SAVE],
            Some(0),
        )
        .context("commit command (0x62) failed")?;

    println!("{} updated: {printable}", def.label);
    Ok(())
}

fn raw(
    backend: &mut Backend,
    timing: Timing,
    cmd: u8,
    subcmd: Option<u8>,
    data: &[u8],
    length: usize,
) -> Result<()> {
    let mut payload = Vec::with_capacity(data.len() + 1);
    if let Some(sub) = subcmd {
        payload.push(sub);
    }
    payload.extend_from_slice(data);

    let resp = timing.send(backend.transport(), cmd, &payload, Some(length))?;
    if resp.is_empty() {
        if length == 0 {
            println!("OK (no response expected)");
        } else {
            println!("No response");
        }
    } else {
        let hex: Vec<String> = resp.iter().map(|b| format!("0x{b:02X}")).collect();
        println!("RESPONSE: {}", hex.join(" "));
    }
    Ok(())
}

fn mode_name(mode: Mode) -> &'static str {
    match mode {
        Mode::Auto => "auto",
        Mode::Debug => "debug",
    }
}
