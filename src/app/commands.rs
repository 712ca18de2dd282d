//! Inbound commands to the actuator service.
//!
//! Remote callers send tool calls as JSON objects:
//!
//! ```text
//! {"name": "servo.oscillate",
//!  "arguments": {"start_angle": 0, "end_angle": 180, "cycles": 3, "period_ms": 1000}}
//! ```
//!
//! [`ToolCall::to_command`] checks every argument against its declared
//! range and rejects out-of-range values outright.  The drivers clamp
//! again on their side.

use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::CommandLimits;
use crate::drivers::servo::{MAX_ANGLE, MIN_ANGLE};
use crate::error::Error;

// ── Tool names ───────────────────────────────────────────────

pub const TOOL_LIGHT_ON: &str = "rgb_light.turn_on";
pub const TOOL_LIGHT_OFF: &str = "rgb_light.turn_off";
pub const TOOL_SET_RGB: &str = "rgb_light.set_rgb";
pub const TOOL_SET_ANGLE: &str = "servo.set_angle";
pub const TOOL_SET_PRESET: &str = "servo.set_preset";
pub const TOOL_OSCILLATE: &str = "servo.oscillate";
pub const TOOL_STOP: &str = "servo.stop";
pub const TOOL_GET_ANGLE: &str = "servo.get_angle";
pub const TOOL_SET_TRIM: &str = "servo.set_trim";
pub const TOOL_GET_TRIM: &str = "servo.get_trim";

/// Longest accepted tool name.
pub const MAX_TOOL_NAME: usize = 32;

/// Commands that the command surface can send into the actuators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCommand {
    LightOn,
    LightOff,
    /// Store the colour and make sure the light is on.
    SetRgb { r: u8, g: u8, b: u8 },
    SetAngle(i32),
    Oscillate {
        start_angle: i32,
        end_angle: i32,
        cycles: u32,
        period_ms: u32,
    },
    Stop,
    GetAngle,
    /// Mechanical offset applied from the next angle write on.
    SetTrim(i32),
    GetTrim,
}

/// Successful command outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandReply {
    Ok,
    Angle(i32),
    Trim(i32),
}

/// Why a tool call was not executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    UnknownTool,
    MissingArgument(&'static str),
    OutOfRange(&'static str),
    InvalidPreset,
    RateLimited,
    /// Not valid JSON, or an argument has the wrong type.
    Malformed,
    /// Accepted by the surface but refused by the actuator.
    Actuator(Error),
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTool => write!(f, "unknown tool"),
            Self::MissingArgument(arg) => write!(f, "missing argument '{}'", arg),
            Self::OutOfRange(arg) => write!(f, "argument '{}' out of range", arg),
            Self::InvalidPreset => write!(f, "invalid preset (expected \"0\", \"90\" or \"180\")"),
            Self::RateLimited => write!(f, "rate limited"),
            Self::Malformed => write!(f, "malformed tool call"),
            Self::Actuator(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CommandError {}

impl From<Error> for CommandError {
    fn from(e: Error) -> Self {
        Self::Actuator(e)
    }
}

impl From<serde_json::Error> for CommandError {
    fn from(_: serde_json::Error) -> Self {
        Self::Malformed
    }
}

// ───────────────────────────────────────────────────────────────
// Tool call parsing
// ───────────────────────────────────────────────────────────────

/// A decoded but not yet validated tool call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolCall {
    pub name: heapless::String<MAX_TOOL_NAME>,
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    pub fn parse(json: &str) -> Result<Self, CommandError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Resolve the tool name and validate its arguments.
    pub fn to_command(&self, limits: &CommandLimits) -> Result<ActuatorCommand, CommandError> {
        let args = &self.arguments;
        let cmd = match self.name.as_str() {
            TOOL_LIGHT_ON => ActuatorCommand::LightOn,
            TOOL_LIGHT_OFF => ActuatorCommand::LightOff,
            TOOL_SET_RGB => ActuatorCommand::SetRgb {
                r: color_arg(args, "r")?,
                g: color_arg(args, "g")?,
                b: color_arg(args, "b")?,
            },
            TOOL_SET_ANGLE => ActuatorCommand::SetAngle(angle_arg(args, "angle")?),
            TOOL_SET_PRESET => ActuatorCommand::SetAngle(preset_arg(args)?),
            TOOL_OSCILLATE => ActuatorCommand::Oscillate {
                start_angle: angle_arg(args, "start_angle")?,
                end_angle: angle_arg(args, "end_angle")?,
                cycles: u32_arg(args, "cycles", limits.min_cycles, limits.max_cycles)?,
                period_ms: u32_arg(args, "period_ms", limits.min_period_ms, limits.max_period_ms)?,
            },
            TOOL_STOP => ActuatorCommand::Stop,
            TOOL_GET_ANGLE => ActuatorCommand::GetAngle,
            TOOL_SET_TRIM => {
                let max = i64::from(limits.max_trim);
                ActuatorCommand::SetTrim(int_arg(args, "trim", -max, max)? as i32)
            }
            TOOL_GET_TRIM => ActuatorCommand::GetTrim,
            _ => return Err(CommandError::UnknownTool),
        };
        Ok(cmd)
    }
}

fn int_arg(args: &Map<String, Value>, key: &'static str, min: i64, max: i64) -> Result<i64, CommandError> {
    let n = args
        .get(key)
        .ok_or(CommandError::MissingArgument(key))?
        .as_i64()
        .ok_or(CommandError::Malformed)?;
    if !(min..=max).contains(&n) {
        return Err(CommandError::OutOfRange(key));
    }
    Ok(n)
}

fn angle_arg(args: &Map<String, Value>, key: &'static str) -> Result<i32, CommandError> {
    int_arg(args, key, i64::from(MIN_ANGLE), i64::from(MAX_ANGLE)).map(|n| n as i32)
}

fn color_arg(args: &Map<String, Value>, key: &'static str) -> Result<u8, CommandError> {
    int_arg(args, key, 0, 255).map(|n| n as u8)
}

fn u32_arg(args: &Map<String, Value>, key: &'static str, min: u32, max: u32) -> Result<u32, CommandError> {
    int_arg(args, key, i64::from(min), i64::from(max)).map(|n| n as u32)
}

fn preset_arg(args: &Map<String, Value>) -> Result<i32, CommandError> {
    let preset = args
        .get("preset")
        .ok_or(CommandError::MissingArgument("preset"))?
        .as_str()
        .ok_or(CommandError::Malformed)?;
    match preset {
        "0" => Ok(0),
        "90" => Ok(90),
        "180" => Ok(180),
        _ => Err(CommandError::InvalidPreset),
    }
}

// ───────────────────────────────────────────────────────────────
// Replies
// ───────────────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(untagged)]
enum ReplyBody {
    Ok { ok: bool },
    Angle { angle: i32 },
    Trim { trim: i32 },
    Err { ok: bool, error: String },
}

/// Serialise a command outcome as a one-line JSON reply.
pub fn reply_json(result: &Result<CommandReply, CommandError>) -> String {
    let body = match result {
        Ok(CommandReply::Ok) => ReplyBody::Ok { ok: true },
        Ok(CommandReply::Angle(angle)) => ReplyBody::Angle { angle: *angle },
        Ok(CommandReply::Trim(trim)) => ReplyBody::Trim { trim: *trim },
        Err(e) => ReplyBody::Err {
            ok: false,
            error: e.to_string(),
        },
    };
    serde_json::to_string(&body).unwrap_or_else(|_| String::from(r#"{"ok":false}"#))
}
