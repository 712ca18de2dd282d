//! Port traits: the hexagonal boundary between command dispatch and the
//! actuators.
//!
//! ```text
//!   Command surface ──▶ ActuatorService ──▶ ServoPort / LightPort
//!                                    └────▶ EventSink
//! ```
//!
//! [`Servo`](crate::drivers::servo::Servo) and
//! [`IndicatorLight`](crate::drivers::rgb_light::IndicatorLight) implement
//! the actuator ports for any [`PwmChannel`]; tests substitute mocks.
//!
//! Implementations MUST re-clamp angles themselves: the service validates
//! bounds, but a port may be driven by other callers.

use crate::drivers::pwm::PwmChannel;
use crate::drivers::rgb_light::IndicatorLight;
use crate::drivers::servo::Servo;
use crate::error::Result;

// ───────────────────────────────────────────────────────────────
// Servo port (driven adapter: domain → positional actuator)
// ───────────────────────────────────────────────────────────────

/// Operations on an already initialised servo.  Hardware setup happens
/// on the concrete driver before it is handed to the service.
pub trait ServoPort {
    /// Clamp to 0–180° and write.  Trim is applied by the implementation.
    fn set_angle(&mut self, angle: i32) -> Result<()>;

    /// Last successfully written angle, before trim.
    fn angle(&self) -> i32;

    /// Takes effect on the next angle write.
    fn set_trim(&mut self, trim: i32);

    fn trim(&self) -> i32;

    /// Schedule a background oscillation.  Returns once scheduled.
    fn oscillate(&mut self, start_angle: i32, end_angle: i32, cycles: u32, period_ms: u32) -> Result<()>;

    /// Cancel any running oscillation and wait for it to exit.
    fn stop(&mut self);

    fn is_oscillating(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Light port (driven adapter: domain → RGB indicator)
// ───────────────────────────────────────────────────────────────

pub trait LightPort {
    /// Store a colour; shown immediately only while the light is on.
    fn set_color(&mut self, r: u8, g: u8, b: u8) -> Result<()>;

    fn turn_on(&mut self) -> Result<()>;

    /// Zero all channels; the stored colour is kept.
    fn turn_off(&mut self) -> Result<()>;

    fn is_on(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The service emits structured [`ActuatorEvent`](super::events::ActuatorEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::ActuatorEvent);
}

// ───────────────────────────────────────────────────────────────
// Driver bindings
// ───────────────────────────────────────────────────────────────

impl<P: PwmChannel + 'static> ServoPort for Servo<P> {
    fn set_angle(&mut self, angle: i32) -> Result<()> {
        Servo::set_angle(self, angle)
    }

    fn angle(&self) -> i32 {
        Servo::angle(self)
    }

    fn set_trim(&mut self, trim: i32) {
        Servo::set_trim(self, trim)
    }

    fn trim(&self) -> i32 {
        Servo::trim(self)
    }

    fn oscillate(&mut self, start_angle: i32, end_angle: i32, cycles: u32, period_ms: u32) -> Result<()> {
        Servo::oscillate(self, start_angle, end_angle, cycles, period_ms)
    }

    fn stop(&mut self) {
        Servo::stop(self)
    }

    fn is_oscillating(&self) -> bool {
        Servo::is_oscillating(self)
    }
}

impl<P: PwmChannel> LightPort for IndicatorLight<P> {
    fn set_color(&mut self, r: u8, g: u8, b: u8) -> Result<()> {
        IndicatorLight::set_color(self, r, g, b)
    }

    fn turn_on(&mut self) -> Result<()> {
        IndicatorLight::turn_on(self)
    }

    fn turn_off(&mut self) -> Result<()> {
        IndicatorLight::turn_off(self)
    }

    fn is_on(&self) -> bool {
        IndicatorLight::is_on(self)
    }
}
