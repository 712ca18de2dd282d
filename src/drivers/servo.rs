//! Positional servo driver with a cancellable background oscillation.
//!
//! Converts a caller-visible angle (0–180°) into a pulse width between
//! `min_pulse_us` and `max_pulse_us`, then into a duty count on a 50 Hz
//! PWM channel.  A per-servo trim is added at the hardware-write stage
//! only; [`Servo::angle`] always reports the untrimmed value.
//!
//! ## Oscillation
//!
//! [`Servo::oscillate`] spawns exactly one background task that alternates
//! between two angles, holding each for half the period.  The foreground
//! and the task share only:
//!
//! - `oscillating` / `current_angle`: atomics, read without locks;
//! - the PWM channel, behind a mutex so angle writes never interleave;
//! - the task slot, a mutex-guarded `Option` holding the join handle,
//!   non-empty exactly while `oscillating` is set.
//!
//! Cancellation is cooperative: each hold is a timed wait on a
//! [`CancelToken`], so [`Servo::stop`] wakes the task, joins it, and
//! returns only once no further angle write from that run can happen.
//!
//! ```text
//!            oscillate() ok
//!   ┌──────┐ ─────────────▶ ┌─────────────┐
//!   │ Idle │                │ Oscillating │
//!   └──────┘ ◀───────────── └─────────────┘
//!        cycles exhausted / stop()
//! ```

use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU32, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::config::ServoConfig;
use crate::drivers::pwm::PwmChannel;
use crate::drivers::task_pin::{self, Core};
use crate::error::{Error, Result};

pub const MIN_ANGLE: i32 = 0;
pub const MAX_ANGLE: i32 = 180;
/// Position commanded on initialisation.
pub const NEUTRAL_ANGLE: i32 = 90;

const OSC_TASK_NAME: &str = "servo-osc\0";
const OSC_TASK_PRIORITY: u8 = 5;
const OSC_TASK_STACK_KB: usize = 4;

/// Clamp an angle into the mechanical range.
pub fn clamp_angle(angle: i32) -> i32 {
    angle.clamp(MIN_ANGLE, MAX_ANGLE)
}

/// Map a hardware angle to a duty count.
///
/// `pulse_us = min + angle/180 * (max - min)`,
/// `duty = round(pulse_us / period_us * full_scale)`.
///
/// A config with no usable period maps every angle to 0; such a config
/// is also refused by `initialize()`.
pub fn angle_to_duty(angle: i32, config: &ServoConfig) -> u32 {
    let ch = config.pwm_channel();
    if ch.period_us() == 0 {
        return 0;
    }
    let span = config.max_pulse_us.saturating_sub(config.min_pulse_us) as f32;
    let pulse_us = config.min_pulse_us as f32 + clamp_angle(angle) as f32 / MAX_ANGLE as f32 * span;
    (pulse_us / ch.period_us() as f32 * ch.full_scale() as f32).round() as u32
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

// ───────────────────────────────────────────────────────────────
// Oscillation request + cancellation
// ───────────────────────────────────────────────────────────────

/// Parameters of one oscillation run, already clamped.  Owned by the
/// background task for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OscillationRequest {
    pub start_angle: i32,
    pub end_angle: i32,
    pub cycles: u32,
    pub period_ms: u32,
}

impl OscillationRequest {
    fn half_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.period_ms / 2))
    }
}

/// One-shot cancellation flag that a sleeping holder can be woken from.
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: Mutex<bool>,
    wake: Condvar,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        *lock(&self.cancelled) = true;
        self.wake.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *lock(&self.cancelled)
    }

    /// Hold for `duration` unless cancelled first.  Returns `true` when
    /// the token is cancelled.
    pub fn hold(&self, duration: Duration) -> bool {
        let guard = lock(&self.cancelled);
        let (guard, _) = self
            .wake
            .wait_timeout_while(guard, duration, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);
        *guard
    }
}

struct OscillationTask {
    run_id: u32,
    cancel: Arc<CancelToken>,
    handle: JoinHandle<()>,
}

// ───────────────────────────────────────────────────────────────
// Shared state
// ───────────────────────────────────────────────────────────────

struct Shared<P> {
    config: ServoConfig,
    pwm: Mutex<P>,
    trim: AtomicI32,
    current_angle: AtomicI32,
    initialized: AtomicBool,
    oscillating: AtomicBool,
    task: Mutex<Option<OscillationTask>>,
    next_run_id: AtomicU32,
}

impl<P: PwmChannel> Shared<P> {
    fn set_angle(&self, angle: i32) -> Result<()> {
        if !self.initialized.load(Ordering::Acquire) {
            error!("servo: not initialized");
            return Err(Error::NotInitialized);
        }

        let angle = clamp_angle(angle);
        let adjusted = clamp_angle(angle.saturating_add(self.trim.load(Ordering::Relaxed)));
        let duty = angle_to_duty(adjusted, &self.config);

        // The angle is published under the channel lock so it always
        // matches the last committed write.
        let mut pwm = lock(&self.pwm);
        pwm.write_duty(duty)?;
        self.current_angle.store(angle, Ordering::Release);
        debug!("servo: angle {} (adjusted {}, duty {})", angle, adjusted, duty);
        Ok(())
    }

    /// Clear the active flag and drop this run's handle, unless `stop()`
    /// already took it.
    fn finish_oscillation(&self, run_id: u32) {
        let mut slot = lock(&self.task);
        if slot.as_ref().is_some_and(|t| t.run_id == run_id) {
            slot.take();
        }
        self.oscillating.store(false, Ordering::Release);
    }
}

fn run_oscillation<P: PwmChannel>(
    shared: &Shared<P>,
    cancel: &CancelToken,
    run_id: u32,
    req: OscillationRequest,
) {
    info!(
        "servo: oscillating {}° <-> {}°, {} cycles, {} ms period",
        req.start_angle, req.end_angle, req.cycles, req.period_ms
    );

    let half = req.half_period();
    let mut completed = 0u32;
    let mut cancelled = false;

    'cycles: for _ in 0..req.cycles {
        for angle in [req.start_angle, req.end_angle] {
            if cancel.is_cancelled() {
                cancelled = true;
                break 'cycles;
            }
            // A missed frame is not fatal to a decorative motion.
            if let Err(e) = shared.set_angle(angle) {
                warn!("servo: oscillation step to {}° failed: {}", angle, e);
            }
            if cancel.hold(half) {
                cancelled = true;
                break 'cycles;
            }
        }
        completed += 1;
    }

    shared.finish_oscillation(run_id);

    if cancelled {
        info!("servo: oscillation cancelled after {}/{} cycles", completed, req.cycles);
    } else {
        info!("servo: oscillation completed ({} cycles)", completed);
    }
}

// ───────────────────────────────────────────────────────────────
// Servo
// ───────────────────────────────────────────────────────────────

/// A hobby servo on one PWM channel.
///
/// All methods take `&self`; state shared with the oscillation task is
/// synchronised internally.
pub struct Servo<P: PwmChannel + 'static> {
    shared: Arc<Shared<P>>,
}

impl<P: PwmChannel + 'static> Servo<P> {
    /// Create an uninitialised servo.  Trim starts at `config.trim`.
    pub fn new(pwm: P, config: ServoConfig) -> Self {
        let trim = config.trim;
        Self {
            shared: Arc::new(Shared {
                config,
                pwm: Mutex::new(pwm),
                trim: AtomicI32::new(trim),
                current_angle: AtomicI32::new(NEUTRAL_ANGLE),
                initialized: AtomicBool::new(false),
                oscillating: AtomicBool::new(false),
                task: Mutex::new(None),
                next_run_id: AtomicU32::new(1),
            }),
        }
    }

    /// Configure the PWM channel and move to the neutral position.
    /// Calling again after success is a no-op.
    pub fn initialize(&self) -> Result<()> {
        let s = &self.shared;
        if s.initialized.load(Ordering::Acquire) {
            return Ok(());
        }

        lock(&s.pwm).configure(&s.config.pwm_channel())?;
        s.initialized.store(true, Ordering::Release);
        info!(
            "servo: initialized on gpio {} (ch{}, trim {})",
            s.config.gpio,
            s.config.ledc_channel,
            s.trim.load(Ordering::Relaxed)
        );

        s.set_angle(NEUTRAL_ANGLE)
    }

    /// Clamp, apply trim, and write.  The stored angle is the clamped,
    /// untrimmed value and only changes when the write succeeds.
    pub fn set_angle(&self, angle: i32) -> Result<()> {
        self.shared.set_angle(angle)
    }

    /// Last successfully written angle, before trim.
    pub fn angle(&self) -> i32 {
        self.shared.current_angle.load(Ordering::Acquire)
    }

    /// Takes effect on the next `set_angle`.
    pub fn set_trim(&self, trim: i32) {
        self.shared.trim.store(trim, Ordering::Relaxed);
    }

    pub fn trim(&self) -> i32 {
        self.shared.trim.load(Ordering::Relaxed)
    }

    pub fn is_initialized(&self) -> bool {
        self.shared.initialized.load(Ordering::Acquire)
    }

    pub fn is_oscillating(&self) -> bool {
        self.shared.oscillating.load(Ordering::Acquire)
    }

    /// Duty this servo would write for a hardware (post-trim) angle.
    pub fn duty_for(&self, angle: i32) -> u32 {
        angle_to_duty(angle, &self.shared.config)
    }

    /// Start a background oscillation between two clamped angles.
    ///
    /// Returns once the task is scheduled; the motion itself runs for
    /// `cycles * period_ms` unless stopped.
    pub fn oscillate(&self, start_angle: i32, end_angle: i32, cycles: u32, period_ms: u32) -> Result<()> {
        let s = &self.shared;
        if !s.initialized.load(Ordering::Acquire) {
            error!("servo: not initialized");
            return Err(Error::NotInitialized);
        }

        // Held across the check and the spawn so two callers cannot both
        // claim the idle state.
        let mut slot = lock(&s.task);
        if s.oscillating.load(Ordering::Acquire) {
            warn!("servo: already oscillating");
            return Err(Error::AlreadyOscillating);
        }

        let start_angle = clamp_angle(start_angle);
        let end_angle = clamp_angle(end_angle);
        if start_angle == end_angle {
            warn!("servo: start and end angles are the same ({}°)", start_angle);
            return Err(Error::InvalidRange);
        }
        if period_ms == 0 {
            warn!("servo: zero oscillation period");
            return Err(Error::InvalidRange);
        }

        let req = OscillationRequest {
            start_angle,
            end_angle,
            cycles,
            period_ms,
        };
        let run_id = s.next_run_id.fetch_add(1, Ordering::Relaxed);
        let cancel = Arc::new(CancelToken::new());

        s.oscillating.store(true, Ordering::Release);
        let task_shared = Arc::clone(s);
        let task_cancel = Arc::clone(&cancel);
        let spawned = task_pin::spawn_on_core(
            Core::App,
            OSC_TASK_PRIORITY,
            OSC_TASK_STACK_KB,
            OSC_TASK_NAME,
            move || run_oscillation(&task_shared, &task_cancel, run_id, req),
        );

        match spawned {
            Ok(handle) => {
                *slot = Some(OscillationTask {
                    run_id,
                    cancel,
                    handle,
                });
                Ok(())
            }
            Err(e) => {
                s.oscillating.store(false, Ordering::Release);
                error!("servo: failed to create oscillation task");
                Err(e)
            }
        }
    }

    /// Cancel any running oscillation and wait for its task to exit.
    /// No-op when idle.
    pub fn stop(&self) {
        let Some(task) = lock(&self.shared.task).take() else {
            return;
        };

        task.cancel.cancel();
        if task.handle.join().is_err() {
            error!("servo: oscillation task panicked");
            self.shared.oscillating.store(false, Ordering::Release);
        }
        info!("servo: oscillation stopped");
    }
}

impl<P: PwmChannel + 'static> Drop for Servo<P> {
    fn drop(&mut self) {
        self.stop();
        if self.shared.initialized.swap(false, Ordering::AcqRel) {
            lock(&self.shared.pwm).release();
        }
    }
}
