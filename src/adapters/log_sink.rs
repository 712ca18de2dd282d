//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing actuator events to the ESP-IDF
//! logger (UART / USB-CDC in production).

use log::{log, Level};

use crate::app::events::ActuatorEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`ActuatorEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

/// Console line and level for one event.
pub fn describe(event: &ActuatorEvent) -> (Level, String) {
    match event {
        ActuatorEvent::AngleSet(angle) => (Level::Info, format!("SERVO | angle={}\u{00b0}", angle)),
        ActuatorEvent::TrimSet(trim) => (Level::Info, format!("SERVO | trim={:+}\u{00b0}", trim)),
        ActuatorEvent::OscillationStarted {
            start_angle,
            end_angle,
            cycles,
            period_ms,
        } => (
            Level::Info,
            format!(
                "SERVO | oscillate {}\u{00b0}<->{}\u{00b0} x{} @ {}ms",
                start_angle, end_angle, cycles, period_ms
            ),
        ),
        ActuatorEvent::OscillationStopped { was_running } => {
            (Level::Info, format!("SERVO | stop (was_running={})", was_running))
        }
        ActuatorEvent::LightOn => (Level::Info, String::from("LIGHT | on")),
        ActuatorEvent::LightOff => (Level::Info, String::from("LIGHT | off")),
        ActuatorEvent::ColorSet { r, g, b } => {
            (Level::Info, format!("LIGHT | colour=#{:02x}{:02x}{:02x}", r, g, b))
        }
        ActuatorEvent::CommandRejected(e) => (Level::Warn, format!("CMD   | rejected: {}", e)),
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &ActuatorEvent) {
        let (level, line) = describe(event);
        log!(level, "{}", line);
    }
}
