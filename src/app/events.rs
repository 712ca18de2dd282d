//! Outbound actuator events.
//!
//! The [`ActuatorService`](super::service::ActuatorService) emits these
//! through the [`EventSink`](super::ports::EventSink) port after every
//! command, accepted or not.

use super::commands::CommandError;

/// Structured events emitted by the command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorEvent {
    /// Servo moved; carries the clamped, untrimmed angle.
    AngleSet(i32),

    /// Trim changed; takes effect on the next angle write.
    TrimSet(i32),

    OscillationStarted {
        start_angle: i32,
        end_angle: i32,
        cycles: u32,
        period_ms: u32,
    },

    /// `servo.stop` handled.  `was_running` is false when nothing was
    /// oscillating.
    OscillationStopped { was_running: bool },

    LightOn,
    LightOff,
    ColorSet { r: u8, g: u8, b: u8 },

    /// A tool call was refused by the surface or by an actuator.
    CommandRejected(CommandError),
}
