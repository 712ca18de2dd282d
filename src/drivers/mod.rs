//! Actuator drivers and peripheral helpers.

pub mod pwm;
pub mod rgb_light;
pub mod servo;
pub mod task_pin;
