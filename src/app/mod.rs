//! Application core: command dispatch, zero direct I/O.
//!
//! Tool calls from the outside world are parsed and bound-checked in
//! [`commands`], dispatched by [`service`], and reported as [`events`].
//! Actuators are reached only through the **port traits** in [`ports`],
//! so this layer is testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
