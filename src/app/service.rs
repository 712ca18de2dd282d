//! Actuator service: the command surface core.
//!
//! [`ActuatorService`] owns the servo and the indicator behind their port
//! traits, validates tool calls against [`CommandLimits`], rate-limits
//! them, dispatches to the actuators, and reports every outcome through
//! an [`EventSink`].
//!
//! ```text
//!  JSON line ──▶ ┌──────────────────────────┐ ──▶ ServoPort
//!                │     ActuatorService       │ ──▶ LightPort
//!  JSON reply ◀──│  rate limit · validation  │ ──▶ EventSink
//!                └──────────────────────────┘
//! ```

use burster::Limiter;
use core::time::Duration;
use log::{debug, warn};

use crate::config::CommandLimits;

use super::commands::{reply_json, ActuatorCommand, CommandError, CommandReply, ToolCall};
use super::events::ActuatorEvent;
use super::ports::{EventSink, LightPort, ServoPort};

pub struct ActuatorService<S: ServoPort, L: LightPort> {
    servo: S,
    light: L,
    limits: CommandLimits,
    rate_limiter: burster::TokenBucket<fn() -> Duration>,
}

impl<S: ServoPort, L: LightPort> ActuatorService<S, L> {
    /// Both actuators should already be initialised; a servo that failed
    /// to initialise reports `NotInitialized` per command.
    pub fn new(servo: S, light: L, limits: CommandLimits) -> Self {
        let rate_limiter = burster::TokenBucket::new_with_time_provider(
            u64::from(limits.rate_per_sec),
            u64::from(limits.burst),
            platform_now as fn() -> Duration,
        );
        Self {
            servo,
            light,
            limits,
            rate_limiter,
        }
    }

    pub fn servo(&self) -> &S {
        &self.servo
    }

    pub fn light(&self) -> &L {
        &self.light
    }

    pub fn limits(&self) -> &CommandLimits {
        &self.limits
    }

    // ── Entry points ──────────────────────────────────────────

    /// Handle one newline-delimited JSON tool call and return the reply line.
    pub fn handle_json(&mut self, line: &str, sink: &mut impl EventSink) -> String {
        let result = self.process_json(line, sink);
        if let Err(e) = result {
            self.reject(e, sink);
        }
        reply_json(&result)
    }

    /// Handle an already decoded tool call.
    pub fn handle(&mut self, call: &ToolCall, sink: &mut impl EventSink) -> Result<CommandReply, CommandError> {
        let result = self.admit().and_then(|()| self.run(call, sink));
        if let Err(e) = result {
            self.reject(e, sink);
        }
        result
    }

    /// Execute a validated command.  Not rate-limited.
    pub fn dispatch(&mut self, cmd: ActuatorCommand, sink: &mut impl EventSink) -> Result<CommandReply, CommandError> {
        debug!("dispatch {:?}", cmd);
        match cmd {
            ActuatorCommand::LightOn => {
                self.light.turn_on()?;
                sink.emit(&ActuatorEvent::LightOn);
            }
            ActuatorCommand::LightOff => {
                self.light.turn_off()?;
                sink.emit(&ActuatorEvent::LightOff);
            }
            ActuatorCommand::SetRgb { r, g, b } => {
                self.light.set_color(r, g, b)?;
                if !self.light.is_on() {
                    self.light.turn_on()?;
                    sink.emit(&ActuatorEvent::LightOn);
                }
                sink.emit(&ActuatorEvent::ColorSet { r, g, b });
            }
            ActuatorCommand::SetAngle(angle) => {
                self.servo.set_angle(angle)?;
                sink.emit(&ActuatorEvent::AngleSet(self.servo.angle()));
            }
            ActuatorCommand::Oscillate {
                start_angle,
                end_angle,
                cycles,
                period_ms,
            } => {
                self.servo.oscillate(start_angle, end_angle, cycles, period_ms)?;
                sink.emit(&ActuatorEvent::OscillationStarted {
                    start_angle,
                    end_angle,
                    cycles,
                    period_ms,
                });
            }
            ActuatorCommand::Stop => {
                let was_running = self.servo.is_oscillating();
                self.servo.stop();
                sink.emit(&ActuatorEvent::OscillationStopped { was_running });
            }
            ActuatorCommand::GetAngle => return Ok(CommandReply::Angle(self.servo.angle())),
            ActuatorCommand::SetTrim(trim) => {
                self.servo.set_trim(trim);
                sink.emit(&ActuatorEvent::TrimSet(trim));
            }
            ActuatorCommand::GetTrim => return Ok(CommandReply::Trim(self.servo.trim())),
        }
        Ok(CommandReply::Ok)
    }

    // ── Internals ─────────────────────────────────────────────

    fn process_json(&mut self, line: &str, sink: &mut impl EventSink) -> Result<CommandReply, CommandError> {
        self.admit()?;
        let call = ToolCall::parse(line)?;
        self.run(&call, sink)
    }

    fn run(&mut self, call: &ToolCall, sink: &mut impl EventSink) -> Result<CommandReply, CommandError> {
        let cmd = call.to_command(&self.limits)?;
        self.dispatch(cmd, sink)
    }

    fn admit(&mut self) -> Result<(), CommandError> {
        self.rate_limiter
            .try_consume(1)
            .map_err(|_| CommandError::RateLimited)
    }

    fn reject(&self, e: CommandError, sink: &mut impl EventSink) {
        warn!("command rejected: {}", e);
        sink.emit(&ActuatorEvent::CommandRejected(e));
    }
}

// ── Platform time for rate limiter ───────────────────────────

#[cfg(target_os = "espidf")]
fn platform_now() -> Duration {
    // SAFETY: reads the monotonic high-resolution timer; no preconditions.
    let us = unsafe { esp_idf_svc::sys::esp_timer_get_time() };
    Duration::from_micros(us as u64)
}

#[cfg(not(target_os = "espidf"))]
fn platform_now() -> Duration {
    use std::time::Instant;
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    START.get_or_init(Instant::now).elapsed()
}
