//! Simple TOML parser for lift configuration
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! `lift.toml`. It does NOT support full TOML syntax.
//!
//! Supported features:
//! - Key = value pairs (integer, float, boolean)
//! - Single-line integer arrays: `ramp_table_us = [2000, 1600, 1300]`
//! - [section] headers
//! - Comments (# ...)
//!
//! NOT supported:
//! - Strings, multi-line values, inline tables
//! - Dotted keys and nested sections
//!
//! Keys that are not present keep their default values. Unknown sections
//! and keys are errors so a typo never silently falls back to a default.

use heapless::Vec;

use super::types::{ConfigError, LiftConfig};
use crate::motion::ramp::{RampError, RampTable, MAX_RAMP_ENTRIES};
use crate::traits::Microsteps;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not valid in its section (or outside any section)
    UnknownKey,
    /// Line is not `key = value`
    InvalidLine,
    /// Value could not be parsed for its key
    InvalidValue,
    /// Array longer than the ramp table capacity
    TooManyItems,
    /// Ramp table rejected
    Ramp(RampError),
    /// Parsed values failed validation
    Config(ConfigError),
}

impl From<RampError> for ParseError {
    fn from(e: RampError) -> Self {
        ParseError::Ramp(e)
    }
}

impl From<ConfigError> for ParseError {
    fn from(e: ConfigError) -> Self {
        ParseError::Config(e)
    }
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Debounce,
    Motion,
    Homing,
    Safety,
    Jog,
}

/// Parse TOML configuration into a validated [`LiftConfig`]
pub fn parse_config(input: &str) -> Result<LiftConfig, ParseError> {
    let mut config = LiftConfig::default();
    let mut section = Section::Root;

    // The ramp table is rebuilt once both keys are known
    let mut ramp_entries: Option<Vec<u32, MAX_RAMP_ENTRIES>> = None;
    let mut ramp_slope: Option<u32> = None;

    for line in input.lines() {
        let line = strip_comment(line).trim();

        // Skip empty lines and comments
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidLine)?;

        match (section, key) {
            (Section::Debounce, "press_ms") => config.debounce.press_ms = parse_int(value)?,
            (Section::Debounce, "release_ms") => config.debounce.release_ms = parse_int(value)?,

            (Section::Motion, "steps_per_inch") => {
                config.motion.steps_per_inch = parse_float(value)?
            }
            (Section::Motion, "level_spacing_in") => {
                config.motion.level_spacing_in = parse_float(value)?
            }
            (Section::Motion, "microsteps") => {
                config.motion.microsteps = parse_microsteps(value)?
            }
            (Section::Motion, "ramp_slope") => ramp_slope = Some(parse_int(value)?),
            (Section::Motion, "ramp_table_us") => ramp_entries = Some(parse_int_array(value)?),
            (Section::Motion, "direction_setup_us") => {
                config.motion.direction_setup_us = parse_int(value)?
            }

            (Section::Homing, "half_period_us") => config.homing.half_period_us = parse_int(value)?,
            (Section::Homing, "max_steps") => config.homing.max_steps = parse_int(value)?,

            (Section::Safety, "idle_timeout_ms") => {
                config.safety.idle_timeout_ms = parse_int(value)?
            }
            (Section::Safety, "fault_active_low") => {
                config.safety.fault_active_low = parse_bool(value)?
            }

            (Section::Jog, "steps") => config.jog.steps = parse_int(value)?,
            (Section::Jog, "half_period_us") => config.jog.half_period_us = parse_int(value)?,

            _ => return Err(ParseError::UnknownKey),
        }
    }

    if ramp_entries.is_some() || ramp_slope.is_some() {
        let defaults = RampTable::default();
        let entries = ramp_entries
            .as_deref()
            .unwrap_or_else(|| defaults.entries());
        config.motion.ramp = RampTable::new(entries, ramp_slope.unwrap_or(defaults.slope()))?;
    }

    config.validate()?;
    Ok(config)
}

/// Parse the text between `[` and `]`
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "debounce" => Ok(Section::Debounce),
        "motion" => Ok(Section::Motion),
        "homing" => Ok(Section::Homing),
        "safety" => Ok(Section::Safety),
        "jog" => Ok(Section::Jog),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Drop a trailing `# comment`
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse an integer value, allowing `_` digit separators
fn parse_int(value: &str) -> Result<u32, ParseError> {
    let mut digits: Vec<u8, 16> = Vec::new();
    for b in value.bytes().filter(|&b| b != b'_') {
        digits.push(b).map_err(|_| ParseError::InvalidValue)?;
    }
    let digits = core::str::from_utf8(&digits).map_err(|_| ParseError::InvalidValue)?;
    digits.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a float value
fn parse_float(value: &str) -> Result<f32, ParseError> {
    let v: f32 = value.parse().map_err(|_| ParseError::InvalidValue)?;
    if !v.is_finite() || v < 0.0 {
        return Err(ParseError::InvalidValue);
    }
    Ok(v)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse a microstep factor (1, 2, 4, 8, 16 or 32)
fn parse_microsteps(value: &str) -> Result<Microsteps, ParseError> {
    Microsteps::from_factor(parse_int(value)?).ok_or(ParseError::InvalidValue)
}

/// Parse `[a, b, c]`
fn parse_int_array(value: &str) -> Result<Vec<u32, MAX_RAMP_ENTRIES>, ParseError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(ParseError::InvalidValue)?;

    let mut items = Vec::new();
    for item in inner.split(',') {
        let item = item.trim();
        // Allow a trailing comma
        if item.is_empty() {
            continue;
        }
        items
            .push(parse_int(item)?)
            .map_err(|_| ParseError::TooManyItems)?;
    }
    Ok(items)
}
