// Path: crates/types/src/lib.rs
#![forbid(unsafe_code)]
#![deny(missing_docs)]
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

//! # castnet Types
//!
//! This crate is the foundational library for the castnet node, containing
//! the core data structures, identifiers, wire formats, and error types.
//!
//! ## Architectural Role
//!
//! As the base crate, `castnet-types` has minimal dependencies and is itself
//! a dependency for almost every other crate in the workspace. This structure
//! prevents circular dependencies and provides a stable, canonical definition
//! for shared types like `Cast`, `Channel`, `PublicKey`, and the various
//! error enums.

/// A top-level, crate-wide `Result` type alias with a default error type.
pub type Result<T, E = crate::error::CodecError> = std::result::Result<T, E>;

/// The `Cast` record and the `Delivery` handed to channel subscribers.
pub mod cast;
/// The canonical JSON codec for every wire and value format.
pub mod codec;
/// A unified set of all error types used across the workspace.
pub mod error;
/// Tagged identifier newtypes: `Channel`, `PublicKey`, `Sha`, `SlotId`.
pub mod id;
/// The transport envelope wrapping protocol frames.
pub mod wire;

pub use cast::{Cast, Delivery};
pub use id::{Channel, PublicKey, Sha, SlotId};
