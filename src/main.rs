//! Servo + RGB indicator firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Serial console (newline-delimited JSON tool calls)      │
//! │                                                          │
//! │  ──────────────── ActuatorService ───────────────        │
//! │    rate limit · bound checks · dispatch · events         │
//! │                                                          │
//! │  Servo<LedcChannel>        IndicatorLight<LedcChannel>   │
//! │  (ch0 / timer0, 50 Hz)     (ch1-3 / timer1, 5 kHz)       │
//! │        └── oscillation task (APP core)                   │
//! └──────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::io::{BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info};

use servolight::adapters::log_sink::LogEventSink;
use servolight::app::service::ActuatorService;
use servolight::config::ActuatorConfig;
use servolight::drivers::pwm::LedcChannel;
use servolight::drivers::rgb_light::IndicatorLight;
use servolight::drivers::servo::Servo;

/// Console poll interval while no input is pending.
const CONSOLE_IDLE_MS: u64 = 20;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  ServoLight v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = ActuatorConfig::default();
    config.validate().context("board configuration invalid")?;

    // ── 2. Actuators ──────────────────────────────────────────
    // A failed actuator stays in the service; its tools report the error.
    let servo = Servo::new(LedcChannel::new(), config.servo.clone());
    if let Err(e) = servo.initialize() {
        error!("servo init failed: {}", e);
    }

    let mut light = IndicatorLight::new(core::array::from_fn(|_| LedcChannel::new()), config.light.clone());
    if let Err(e) = light.initialize() {
        error!("rgb init failed: {}", e);
    }

    let mut service = ActuatorService::new(servo, light, config.limits.clone());
    let mut sink = LogEventSink::new();

    // ── 3. Command loop ───────────────────────────────────────
    info!("ready: send tool calls as JSON lines on the console");
    let stdin = std::io::stdin();
    let mut reader = stdin.lock();
    let mut stdout = std::io::stdout();
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => std::thread::sleep(Duration::from_millis(CONSOLE_IDLE_MS)),
            Ok(_) => {
                let call = line.trim();
                if call.is_empty() {
                    continue;
                }
                let reply = service.handle_json(call, &mut sink);
                writeln!(stdout, "{}", reply).context("console write failed")?;
                stdout.flush().context("console flush failed")?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(CONSOLE_IDLE_MS));
            }
            Err(e) => return Err(e).context("console read failed"),
        }
    }
}
