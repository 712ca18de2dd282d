//! GPIO / LEDC assignments for the actuator board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Positional servo (SG90-class, 3-wire)
// ---------------------------------------------------------------------------

/// PWM signal line to the servo.
pub const SERVO_GPIO: i32 = 12;
/// LEDC channel driving the servo.
pub const SERVO_LEDC_CHANNEL: u32 = 0;
/// LEDC timer for the servo.  Runs at 50 Hz, so it cannot be shared with
/// the indicator timer.
pub const SERVO_LEDC_TIMER: u32 = 0;
/// Servo frame rate (20 ms period).
pub const SERVO_PWM_FREQ_HZ: u32 = 50;
/// 13 bits over 20 ms gives ~2.4 µs per count.
pub const SERVO_PWM_RESOLUTION_BITS: u32 = 13;

// ---------------------------------------------------------------------------
// RGB indicator (discrete common-cathode LED)
// ---------------------------------------------------------------------------

pub const RGB_R_GPIO: i32 = 9;
pub const RGB_G_GPIO: i32 = 10;
pub const RGB_B_GPIO: i32 = 11;

pub const RGB_R_LEDC_CHANNEL: u32 = 1;
pub const RGB_G_LEDC_CHANNEL: u32 = 2;
pub const RGB_B_LEDC_CHANNEL: u32 = 3;

/// LEDC timer shared by the three indicator channels.
pub const RGB_LEDC_TIMER: u32 = 1;
/// Indicator PWM frequency (5 kHz, flicker-free).
pub const RGB_PWM_FREQ_HZ: u32 = 5_000;
/// 8-bit gives 0 – 255 duty levels, one per colour step.
pub const RGB_PWM_RESOLUTION_BITS: u32 = 8;
