//! Camlift - Stepper Lift Firmware
//!
//! Main firmware binary for RP2040-based lift boards. Replaces the cam
//! mechanism of a four-level lift with a stepper motor and emulates the
//! cam's opto sensor for the legacy controller.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_time::{Delay, Instant};
use portable_atomic::Ordering;
use {defmt_rtt as _, panic_probe as _};

use camlift_core::config::{parse_config, LiftConfig};
use camlift_core::LiftController;
use camlift_drivers::opto::GpioOpto;
use camlift_drivers::stepper::{Drv8825, Drv8825Config};

use crate::channels::{FAULT_LATCH, FAULT_LINE_HIGH};

/// Embedded configuration (compiled into firmware)
/// Edit lift.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../lift.toml");

mod channels;
mod tasks;

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Camlift firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();
    info!(
        "Config: {} steps/level, {:?} microstepping, idle timeout {} ms",
        config.steps_per_level(),
        config.motion.microsteps,
        config.safety.idle_timeout_ms
    );

    // Inputs from the legacy controller
    // Pin assignments are board-specific (Camlift rev A: GPIO2-7)
    let pins = tasks::LiftPins {
        enable: Input::new(p.PIN_2, Pull::Down),
        direction: Input::new(p.PIN_3, Pull::Down),
        limit: Input::new(p.PIN_4, Pull::Up),
        left: Input::new(p.PIN_5, Pull::Up),
        right: Input::new(p.PIN_6, Pull::Up),
    };

    // DRV8825 nFAULT is open-drain
    let fault_pin = Input::new(p.PIN_7, Pull::Up);
    FAULT_LINE_HIGH.store(fault_pin.is_high(), Ordering::Release);

    // DRV8825 (GPIO10-16) and the emulated opto (GPIO17)
    let driver = Drv8825::new(
        Output::new(p.PIN_10, Level::Low),
        Output::new(p.PIN_11, Level::Low),
        Output::new(p.PIN_12, Level::High),
        [
            Output::new(p.PIN_13, Level::Low),
            Output::new(p.PIN_14, Level::Low),
            Output::new(p.PIN_15, Level::Low),
        ],
        Output::new(p.PIN_16, Level::Low),
        Delay,
        Drv8825Config {
            direction_setup_us: config.motion.direction_setup_us,
            ..Drv8825Config::default()
        },
    );
    let opto = GpioOpto::new(Output::new(p.PIN_17, Level::Low), false);
    info!("DRV8825 and opto output initialized");

    let led = Output::new(p.PIN_25, Level::Low);

    let fault_active_low = config.safety.fault_active_low;
    let now_ms = Instant::now().as_millis() as u32;
    let lift = LiftController::new(config, driver, opto, &FAULT_LATCH, now_ms);

    // Spawn tasks
    spawner
        .spawn(tasks::fault_monitor_task(fault_pin, fault_active_low))
        .unwrap();
    spawner.spawn(tasks::status_led_task(led)).unwrap();
    spawner.spawn(tasks::lift_task(lift, pins)).unwrap();

    info!("All tasks spawned, firmware running");
}

/// Parse the embedded lift.toml
///
/// Falls back to built-in defaults if it does not parse. build.rs checks the
/// file, so this only happens when the two validators disagree.
fn load_config() -> LiftConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {:?}", e);
            error!("Using built-in defaults");
            LiftConfig::default()
        }
    }
}
