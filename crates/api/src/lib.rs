// Path: crates/api/src/lib.rs

//! # castnet API Crate Lints
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free, and well-documented code. Panics are disallowed in non-test
//! code to promote robust error handling.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! # castnet API
//!
//! The stable contract between the consensus core and its external
//! collaborator, the FBA protocol engine. The engine is not part of this
//! workspace; anything that honors these traits (the shipped test double
//! included) can drive the node.

/// Ballots, slot views, and the pluggable ballot/payload policies.
pub mod ballot;
/// The `ProtocolEngine` trait and its event stream.
pub mod engine;
/// The quorum structure the engine exposes for direct configuration.
pub mod quorum;

pub use ballot::{AcceptAll, Ballot, BallotPolicy, PayloadPolicy, SlotContext};
pub use engine::{EngineEvent, ProtocolEngine};
pub use quorum::QuorumSet;
