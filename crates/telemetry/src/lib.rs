// Path: crates/telemetry/src/lib.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # castnet Telemetry
//!
//! Structured logging setup for the node binary. Library crates only emit
//! `tracing` events; installing a subscriber, and choosing its shape, is the
//! binary's decision.

mod init;

pub use init::{init_tracing, LogFormat, TelemetryConfig};
