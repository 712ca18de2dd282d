//! Actuator configuration parameters
//!
//! Board constants for the servo, the RGB indicator, and the bounds the
//! command surface enforces.  Nothing here is persisted: every boot starts
//! from [`ActuatorConfig::default()`], optionally overridden by a JSON blob.

use serde::{Deserialize, Serialize};

use crate::drivers::pwm::PwmChannelConfig;
use crate::pins;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorConfig {
    pub servo: ServoConfig,
    pub light: LightConfig,
    pub limits: CommandLimits,
}

/// Positional servo wiring and pulse mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    pub gpio: i32,
    pub ledc_channel: u32,
    pub ledc_timer: u32,
    /// Frame rate in Hz (50 for hobby servos)
    pub frequency_hz: u32,
    /// Duty resolution in bits
    pub resolution_bits: u32,
    /// Pulse width at 0° (microseconds)
    pub min_pulse_us: u32,
    /// Pulse width at 180° (microseconds)
    pub max_pulse_us: u32,
    /// Mechanical trim applied at the hardware-write stage (degrees)
    pub trim: i32,
}

/// RGB indicator wiring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightConfig {
    /// GPIOs in red, green, blue order
    pub gpio: [i32; 3],
    /// LEDC channels in red, green, blue order
    pub ledc_channels: [u32; 3],
    pub ledc_timer: u32,
    pub frequency_hz: u32,
    pub resolution_bits: u32,
}

/// Bounds enforced by the command surface before anything reaches the
/// actuators, plus the command rate limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandLimits {
    pub min_cycles: u32,
    pub max_cycles: u32,
    pub min_period_ms: u32,
    pub max_period_ms: u32,
    /// Largest trim magnitude accepted from a tool call (degrees)
    pub max_trim: u32,
    /// Sustained commands per second
    pub rate_per_sec: u32,
    /// Burst capacity of the token bucket
    pub burst: u32,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            servo: ServoConfig::default(),
            light: LightConfig::default(),
            limits: CommandLimits::default(),
        }
    }
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            gpio: pins::SERVO_GPIO,
            ledc_channel: pins::SERVO_LEDC_CHANNEL,
            ledc_timer: pins::SERVO_LEDC_TIMER,
            frequency_hz: pins::SERVO_PWM_FREQ_HZ,
            resolution_bits: pins::SERVO_PWM_RESOLUTION_BITS,
            min_pulse_us: 500,
            max_pulse_us: 2500,
            trim: 0,
        }
    }
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            gpio: [pins::RGB_R_GPIO, pins::RGB_G_GPIO, pins::RGB_B_GPIO],
            ledc_channels: [
                pins::RGB_R_LEDC_CHANNEL,
                pins::RGB_G_LEDC_CHANNEL,
                pins::RGB_B_LEDC_CHANNEL,
            ],
            ledc_timer: pins::RGB_LEDC_TIMER,
            frequency_hz: pins::RGB_PWM_FREQ_HZ,
            resolution_bits: pins::RGB_PWM_RESOLUTION_BITS,
        }
    }
}

impl Default for CommandLimits {
    fn default() -> Self {
        Self {
            min_cycles: 1,
            max_cycles: 10,
            min_period_ms: 500,
            max_period_ms: 5000,
            max_trim: 30,
            rate_per_sec: 10,
            burst: 10,
        }
    }
}

impl ServoConfig {
    /// LEDC channel parameters for the servo output.
    pub fn pwm_channel(&self) -> PwmChannelConfig {
        PwmChannelConfig {
            gpio: self.gpio,
            channel: self.ledc_channel,
            timer: self.ledc_timer,
            frequency_hz: self.frequency_hz,
            resolution_bits: self.resolution_bits,
        }
    }
}

impl LightConfig {
    /// LEDC channel parameters in red, green, blue order.
    pub fn pwm_channels(&self) -> [PwmChannelConfig; 3] {
        core::array::from_fn(|i| PwmChannelConfig {
            gpio: self.gpio[i],
            channel: self.ledc_channels[i],
            timer: self.ledc_timer,
            frequency_hz: self.frequency_hz,
            resolution_bits: self.resolution_bits,
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

/// Errors from loading or validating an [`ActuatorConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The override blob is not valid JSON for this schema.
    Malformed,
    /// A field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Malformed => write!(f, "config malformed"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ActuatorConfig {
    /// Parse a JSON override and validate it.  Missing fields keep their
    /// defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Malformed)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would produce an unusable or unsafe PWM setup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.servo;
        if s.frequency_hz == 0 {
            return Err(ConfigError::ValidationFailed("servo.frequency_hz must be > 0"));
        }
        if !(1..=20).contains(&s.resolution_bits) {
            return Err(ConfigError::ValidationFailed("servo.resolution_bits must be 1..=20"));
        }
        if s.min_pulse_us >= s.max_pulse_us {
            return Err(ConfigError::ValidationFailed("servo.min_pulse_us must be < max_pulse_us"));
        }
        if s.max_pulse_us > s.pwm_channel().period_us() {
            return Err(ConfigError::ValidationFailed("servo.max_pulse_us exceeds PWM period"));
        }

        let l = &self.light;
        if l.frequency_hz == 0 {
            return Err(ConfigError::ValidationFailed("light.frequency_hz must be > 0"));
        }
        if !(1..=20).contains(&l.resolution_bits) {
            return Err(ConfigError::ValidationFailed("light.resolution_bits must be 1..=20"));
        }
        if l.ledc_timer == s.ledc_timer && l.frequency_hz != s.frequency_hz {
            return Err(ConfigError::ValidationFailed("light and servo cannot share a LEDC timer"));
        }
        if l.ledc_channels.contains(&s.ledc_channel) {
            return Err(ConfigError::ValidationFailed("light and servo cannot share a LEDC channel"));
        }

        let m = &self.limits;
        if m.min_cycles == 0 || m.min_cycles > m.max_cycles {
            return Err(ConfigError::ValidationFailed("limits.cycles range invalid"));
        }
        if m.min_period_ms == 0 || m.min_period_ms > m.max_period_ms {
            return Err(ConfigError::ValidationFailed("limits.period_ms range invalid"));
        }
        if m.max_trim > 90 {
            return Err(ConfigError::ValidationFailed("limits.max_trim must be <= 90"));
        }
        if m.rate_per_sec == 0 || m.burst == 0 {
            return Err(ConfigError::ValidationFailed("limits.rate_per_sec and burst must be > 0"));
        }
        Ok(())
    }
}
