//! Unified error type for the actuator firmware.
//!
//! Every fallible actuator operation returns [`Error`].  All variants are
//! `Copy` so they cross the foreground/background task boundary and the
//! command surface without allocation.

use core::fmt;

/// Return code used when a failure is detected in software rather than
/// reported by the platform.
pub const RC_SOFTWARE: i32 = -1;

// ---------------------------------------------------------------------------
// Actuator error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The operation requires a prior successful `initialize()`.
    NotInitialized,
    /// One-time timer/channel setup failed.  Carries the platform return code.
    HardwareConfig(i32),
    /// A single duty write failed.  Carries the platform return code.
    HardwareWrite(i32),
    /// An oscillation is already running on this actuator.
    AlreadyOscillating,
    /// Degenerate or out-of-bound parameters after clamping.
    InvalidRange,
    /// The background oscillation task could not be created.
    TaskSpawnFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "actuator not initialized"),
            Self::HardwareConfig(rc) => write!(f, "PWM configuration failed (rc={})", rc),
            Self::HardwareWrite(rc) => write!(f, "PWM duty write failed (rc={})", rc),
            Self::AlreadyOscillating => write!(f, "already oscillating"),
            Self::InvalidRange => write!(f, "invalid range"),
            Self::TaskSpawnFailed => write!(f, "oscillation task spawn failed"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
