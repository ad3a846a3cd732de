//! Build script for camlift-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates lift.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Keys accepted in each section, with the expected value kind
const SCHEMA: &[(&str, &[(&str, Kind)])] = &[
    ("debounce", &[("press_ms", Kind::Int), ("release_ms", Kind::Int)]),
    (
        "motion",
        &[
            ("steps_per_inch", Kind::Number),
            ("level_spacing_in", Kind::Number),
            ("microsteps", Kind::Int),
            ("ramp_slope", Kind::Int),
            ("ramp_table_us", Kind::IntArray),
            ("direction_setup_us", Kind::Int),
        ],
    ),
    ("homing", &[("half_period_us", Kind::Int), ("max_steps", Kind::Int)]),
    (
        "safety",
        &[("idle_timeout_ms", Kind::Int), ("fault_active_low", Kind::Bool)],
    ),
    ("jog", &[("steps", Kind::Int), ("half_period_us", Kind::Int)]),
];

#[derive(Clone, Copy)]
enum Kind {
    Int,
    Number,
    Bool,
    IntArray,
}

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).expect("create memory.x");
    f.write_all(memory_x).expect("write memory.x");

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate lift.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=lift.toml");

    let config_path = Path::new("lift.toml");
    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: lift.toml not found!                                     ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds lift.toml at build time.                    ║\n\
            ║  Please create one in the camlift-firmware directory.            ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read lift.toml                                 ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse and validate TOML syntax
    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in lift.toml                         ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_schema(&config, &mut errors);
    validate_values(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid lift configuration                               ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=lift.toml validated successfully");
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

/// Reject unknown sections and keys, and values of the wrong kind
///
/// The firmware parser rejects both at boot.
fn validate_schema(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        errors.push("lift.toml must be a table".to_string());
        return;
    };

    for (section, body) in root {
        let Some((_, keys)) = SCHEMA.iter().find(|(name, _)| name == section) else {
            errors.push(format!("unknown section [{}]", section));
            continue;
        };

        let Some(body) = body.as_table() else {
            errors.push(format!("[{}] must be a table", section));
            continue;
        };

        for (key, value) in body {
            match keys.iter().find(|(name, _)| name == key) {
                Some((_, kind)) if kind_matches(*kind, value) => {}
                Some(_) => errors.push(format!("[{}] {} has the wrong type", section, key)),
                None => errors.push(format!("[{}] unknown key '{}'", section, key)),
            }
        }
    }
}

fn kind_matches(kind: Kind, value: &toml::Value) -> bool {
    match kind {
        Kind::Int => matches!(value, toml::Value::Integer(i) if *i >= 0 && *i <= u32::MAX as i64),
        Kind::Number => matches!(value, toml::Value::Integer(_) | toml::Value::Float(_)),
        Kind::Bool => value.is_bool(),
        Kind::IntArray => value
            .as_array()
            .map(|items| items.iter().all(|i| kind_matches(Kind::Int, i)))
            .unwrap_or(false),
    }
}

fn get_int(config: &toml::Value, section: &str, key: &str) -> Option<i64> {
    config.get(section)?.get(key)?.as_integer()
}

/// Range checks that do not need the full firmware parser
fn validate_values(config: &toml::Value, errors: &mut Vec<String>) {
    if let Some(m) = get_int(config, "motion", "microsteps") {
        if ![1, 2, 4, 8, 16, 32].contains(&m) {
            errors.push("[motion] microsteps must be 1, 2, 4, 8, 16 or 32".to_string());
        }
    }

    if let Some(table) = config
        .get("motion")
        .and_then(|m| m.get("ramp_table_us"))
        .and_then(|t| t.as_array())
    {
        let values: Vec<i64> = table.iter().filter_map(|v| v.as_integer()).collect();
        if values.is_empty() {
            errors.push("[motion] ramp_table_us cannot be empty".to_string());
        }
        if values.len() > 16 {
            errors.push("[motion] ramp_table_us has more than 16 entries".to_string());
        }
        if values.contains(&0) {
            errors.push("[motion] ramp_table_us entries must be non-zero".to_string());
        }
        if values.windows(2).any(|w| w[1] >= w[0]) {
            errors.push("[motion] ramp_table_us must be strictly decreasing".to_string());
        }
    }

    if get_int(config, "motion", "ramp_slope") == Some(0) {
        errors.push("[motion] ramp_slope must be non-zero".to_string());
    }

    let press = get_int(config, "debounce", "press_ms").unwrap_or(25);
    let release = get_int(config, "debounce", "release_ms").unwrap_or(250);
    if press >= release {
        errors.push("[debounce] release_ms must be longer than press_ms".to_string());
    }

    for (section, key) in [
        ("safety", "idle_timeout_ms"),
        ("homing", "max_steps"),
        ("homing", "half_period_us"),
        ("jog", "half_period_us"),
    ] {
        if get_int(config, section, key) == Some(0) {
            errors.push(format!("[{}] {} must be non-zero", section, key));
        }
    }
}
