//! Fuzz target: tool-call parsing and validation
//!
//! Feeds arbitrary bytes through `ToolCall::parse` and `to_command`.
//!
//! Invariants checked:
//! - No panics under any byte sequence
//! - Every accepted angle lies within 0–180
//! - Every accepted oscillation has cycles and period inside the limits
//!
//! cargo fuzz run fuzz_tool_call

#![no_main]

use libfuzzer_sys::fuzz_target;
use servolight::app::commands::{ActuatorCommand, ToolCall};
use servolight::config::CommandLimits;

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };
    let Ok(call) = ToolCall::parse(line) else {
        return;
    };

    let limits = CommandLimits::default();
    match call.to_command(&limits) {
        Ok(ActuatorCommand::SetAngle(a)) => assert!((0..=180).contains(&a)),
        Ok(ActuatorCommand::Oscillate {
            start_angle,
            end_angle,
            cycles,
            period_ms,
        }) => {
            assert!((0..=180).contains(&start_angle));
            assert!((0..=180).contains(&end_angle));
            assert!((limits.min_cycles..=limits.max_cycles).contains(&cycles));
            assert!((limits.min_period_ms..=limits.max_period_ms).contains(&period_ms));
        }
        Ok(ActuatorCommand::SetTrim(t)) => assert!(t.unsigned_abs() <= limits.max_trim),
        _ => {}
    }
});
