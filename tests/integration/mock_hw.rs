//! Mock hardware for integration tests.
//!
//! [`MockPwm`] records every channel call in a log shared with the test,
//! so assertions can run while a driver (or its oscillation task) still
//! owns the channel.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use servolight::app::events::ActuatorEvent;
use servolight::app::ports::EventSink;
use servolight::drivers::pwm::{PwmChannel, PwmChannelConfig};
use servolight::error::{Error, Result};

/// Return code reported by injected failures.
pub const MOCK_RC: i32 = 0x105;

// ── PWM call record ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum PwmCall {
    Configure(PwmChannelConfig),
    Write(u32),
    Release,
}

#[derive(Debug, Default)]
pub struct PwmLog {
    pub calls: Vec<PwmCall>,
    pub configured: bool,
    pub fail_configure: bool,
    pub fail_writes: bool,
    /// Writes still to fail before the channel recovers.
    pub fail_next: u32,
}

// ── MockPwm ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MockPwm {
    log: Arc<Mutex<PwmLog>>,
}

#[allow(dead_code)]
impl MockPwm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<PwmCall> {
        self.log.lock().unwrap().calls.clone()
    }

    /// Duty values written, in order.
    pub fn writes(&self) -> Vec<u32> {
        self.log
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter_map(|c| match c {
                PwmCall::Write(d) => Some(*d),
                _ => None,
            })
            .collect()
    }

    pub fn last_duty(&self) -> Option<u32> {
        self.writes().last().copied()
    }

    pub fn configured_with(&self) -> Option<PwmChannelConfig> {
        self.log.lock().unwrap().calls.iter().find_map(|c| match c {
            PwmCall::Configure(cfg) => Some(*cfg),
            _ => None,
        })
    }

    pub fn released(&self) -> bool {
        self.log.lock().unwrap().calls.contains(&PwmCall::Release)
    }

    pub fn fail_configure(&self, fail: bool) {
        self.log.lock().unwrap().fail_configure = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.log.lock().unwrap().fail_writes = fail;
    }

    /// Fail only the next `count` writes.
    pub fn fail_next_writes(&self, count: u32) {
        self.log.lock().unwrap().fail_next = count;
    }
}

impl PwmChannel for MockPwm {
    fn configure(&mut self, config: &PwmChannelConfig) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        if log.configured {
            return Ok(());
        }
        if log.fail_configure {
            return Err(Error::HardwareConfig(MOCK_RC));
        }
        log.configured = true;
        log.calls.push(PwmCall::Configure(*config));
        Ok(())
    }

    fn write_duty(&mut self, duty: u32) -> Result<()> {
        let mut log = self.log.lock().unwrap();
        if !log.configured || log.fail_writes {
            return Err(Error::HardwareWrite(MOCK_RC));
        }
        if log.fail_next > 0 {
            log.fail_next -= 1;
            return Err(Error::HardwareWrite(MOCK_RC));
        }
        log.calls.push(PwmCall::Write(duty));
        Ok(())
    }

    fn release(&mut self) {
        let mut log = self.log.lock().unwrap();
        if log.configured {
            log.configured = false;
            log.calls.push(PwmCall::Release);
        }
    }

    fn is_configured(&self) -> bool {
        self.log.lock().unwrap().configured
    }
}

/// Three independent mock channels in red, green, blue order, plus the
/// handles that observe them.
pub fn rgb_channels() -> ([MockPwm; 3], [MockPwm; 3]) {
    let chans = [MockPwm::new(), MockPwm::new(), MockPwm::new()];
    let handles = chans.clone();
    (chans, handles)
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<ActuatorEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&ActuatorEvent> {
        self.events.last()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &ActuatorEvent) {
        self.events.push(*event);
    }
}

// ── Timing helper ─────────────────────────────────────────────

/// Poll `cond` until it holds or `timeout` elapses.
#[allow(dead_code)]
pub fn wait_until(timeout: Duration, cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    cond()
}
