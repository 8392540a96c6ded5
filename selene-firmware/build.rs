//! Build script for selene-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates focuser.toml and turns it into constants

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Emulated EEPROM size (must match selene-hal-rp2040)
const EEPROM_SIZE: i64 = 64;

/// Settings record size (must match selene-core)
const RECORD_SIZE: i64 = 8;

/// Microstep multipliers the DRV8825 supports
const MICROSTEPS: [i64; 6] = [1, 2, 4, 8, 16, 32];

/// GPIOs taken by UART0
const UART_PINS: [i64; 2] = [0, 1];

fn main() {
    setup_linker();
    let config = load_config();
    let values = validate_config(&config);
    write_constants(&values);
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Read and parse focuser.toml
fn load_config() -> toml::Value {
    println!("cargo:rerun-if-changed=focuser.toml");

    let config_path = Path::new("focuser.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: focuser.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a focuser.toml configuration file.        ║\n\
            ║  Please create one in the selene-firmware directory.             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read focuser.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in focuser.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Panic with every collected error in one box
fn report_errors(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Validated values, ready to be emitted
struct ConfigValues {
    baudrate: i64,
    pins: Vec<(&'static str, i64)>,
    enable_active_low: bool,
    invert_direction: bool,
    tick_period_us: i64,
    disable_delay_ms: i64,
    enable_settle_us: i64,
    coarse_microsteps: i64,
    fine_microsteps: i64,
    timeout_s: i64,
    base_address: i64,
}

/// Field reader that collects errors instead of stopping at the first
struct Section<'a> {
    name: &'static str,
    table: Option<&'a toml::value::Table>,
    errors: &'a mut Vec<String>,
}

impl<'a> Section<'a> {
    fn new(config: &'a toml::Value, name: &'static str, errors: &'a mut Vec<String>) -> Self {
        let table = match config.get(name) {
            Some(toml::Value::Table(t)) => Some(t),
            Some(_) => {
                errors.push(format!("[{}] must be a table", name));
                None
            }
            None => {
                errors.push(format!("Missing [{}] section", name));
                None
            }
        };
        Self {
            name,
            table,
            errors,
        }
    }

    fn integer(&mut self, key: &str, min: i64, max: i64) -> i64 {
        let Some(table) = self.table else {
            return min;
        };
        match table.get(key) {
            Some(toml::Value::Integer(v)) if (min..=max).contains(v) => *v,
            Some(toml::Value::Integer(_)) => {
                self.errors
                    .push(format!("[{}] {} must be {}-{}", self.name, key, min, max));
                min
            }
            Some(_) => {
                self.errors
                    .push(format!("[{}] {} must be an integer", self.name, key));
                min
            }
            None => {
                self.errors
                    .push(format!("[{}] missing '{}'", self.name, key));
                min
            }
        }
    }

    fn boolean(&mut self, key: &str, default: bool) -> bool {
        let Some(table) = self.table else {
            return default;
        };
        match table.get(key) {
            Some(toml::Value::Boolean(v)) => *v,
            Some(_) => {
                self.errors
                    .push(format!("[{}] {} must be true or false", self.name, key));
                default
            }
            None => default,
        }
    }
}

/// Validate focuser.toml and extract its values
fn validate_config(config: &toml::Value) -> ConfigValues {
    let mut errors = Vec::new();

    let baudrate = Section::new(config, "serial", &mut errors).integer("baudrate", 300, 921_600);

    let (pins, enable_active_low, invert_direction) = {
        let mut section = Section::new(config, "pins", &mut errors);
        let pins: Vec<_> = ["dir", "step", "enable", "m0", "m1", "m2", "led"]
            .into_iter()
            .map(|key| (key, section.integer(key, 0, 29)))
            .collect();
        let enable_active_low = section.boolean("enable_active_low", true);
        let invert_direction = section.boolean("invert_direction", false);
        (pins, enable_active_low, invert_direction)
    };

    for (i, (name, pin)) in pins.iter().enumerate() {
        if UART_PINS.contains(pin) {
            errors.push(format!("[pins] {} uses GPIO{}, reserved for UART0", name, pin));
        }
        if let Some((other, _)) = pins[..i].iter().find(|(_, p)| p == pin) {
            errors.push(format!("[pins] {} and {} both use GPIO{}", other, name, pin));
        }
    }

    let mut motion = Section::new(config, "motion", &mut errors);
    let tick_period_us = motion.integer("tick_period_us", 50, 100_000);
    let disable_delay_ms = motion.integer("disable_delay_ms", 0, 60_000);
    let enable_settle_us = motion.integer("enable_settle_us", 0, 100_000);
    let coarse_microsteps = motion.integer("coarse_microsteps", 1, 32);
    let fine_microsteps = motion.integer("fine_microsteps", 1, 32);

    for (key, value) in [
        ("coarse_microsteps", coarse_microsteps),
        ("fine_microsteps", fine_microsteps),
    ] {
        if !MICROSTEPS.contains(&value) {
            errors.push(format!("[motion] {} must be 1, 2, 4, 8, 16 or 32", key));
        }
    }

    let timeout_s = Section::new(config, "link", &mut errors).integer("timeout_s", 1, 3600);
    let base_address = Section::new(config, "storage", &mut errors).integer(
        "base_address",
        0,
        EEPROM_SIZE - RECORD_SIZE,
    );

    report_errors("Invalid configuration in focuser.toml", &errors);

    println!("cargo:warning=focuser.toml validated successfully");

    ConfigValues {
        baudrate,
        pins,
        enable_active_low,
        invert_direction,
        tick_period_us,
        disable_delay_ms,
        enable_settle_us,
        coarse_microsteps,
        fine_microsteps,
        timeout_s,
        base_address,
    }
}

/// Emit focuser_config.rs into OUT_DIR
fn write_constants(values: &ConfigValues) {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    let mut out = String::new();

    out.push_str("// Generated from focuser.toml by build.rs\n\n");
    out.push_str(&format!("pub const SERIAL_BAUDRATE: u32 = {};\n", values.baudrate));
    for (name, pin) in &values.pins {
        out.push_str(&format!(
            "pub const PIN_{}: u8 = {};\n",
            name.to_uppercase(),
            pin
        ));
    }
    out.push_str(&format!(
        "pub const ENABLE_ACTIVE_LOW: bool = {};\n",
        values.enable_active_low
    ));
    out.push_str(&format!(
        "pub const INVERT_DIRECTION: bool = {};\n",
        values.invert_direction
    ));
    out.push_str(&format!("pub const TICK_PERIOD_US: u32 = {};\n", values.tick_period_us));
    out.push_str(&format!(
        "pub const DISABLE_DELAY_MS: u32 = {};\n",
        values.disable_delay_ms
    ));
    out.push_str(&format!(
        "pub const ENABLE_SETTLE_US: u32 = {};\n",
        values.enable_settle_us
    ));
    out.push_str(&format!(
        "pub const COARSE_MICROSTEPS: u8 = {};\n",
        values.coarse_microsteps
    ));
    out.push_str(&format!(
        "pub const FINE_MICROSTEPS: u8 = {};\n",
        values.fine_microsteps
    ));
    out.push_str(&format!(
        "pub const LINK_TIMEOUT_MS: u32 = {};\n",
        values.timeout_s * 1000
    ));
    out.push_str(&format!(
        "pub const STORAGE_BASE_ADDRESS: u16 = {};\n",
        values.base_address
    ));

    // Typed pin peripherals cannot be picked at runtime, so hand them out by macro
    let pin_list = values
        .pins
        .iter()
        .map(|(_, pin)| format!("$p.PIN_{}", pin))
        .collect::<Vec<_>>()
        .join(", ");
    out.push_str(&format!(
        "\n/// Take the configured (dir, step, enable, m0, m1, m2, led) pins\n\
         macro_rules! take_board_pins {{\n    ($p:ident) => {{\n        ({})\n    }};\n}}\n",
        pin_list
    ));

    fs::write(out_dir.join("focuser_config.rs"), out).unwrap();
}
