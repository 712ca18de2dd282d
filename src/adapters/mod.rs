//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements | Connects to       |
//! |------------|------------|-------------------|
//! | `log_sink` | EventSink  | Serial log output |
//!
//! The actuator ports are implemented directly by the drivers in
//! [`crate::drivers`].

pub mod log_sink;
