//! Wire and host-contract types for the media picker bridge.
//!
//! This crate contains the serde-serializable types exchanged across the
//! application bridge, plus the plain data the picker hands to (and receives
//! from) the host operating system.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! - **Pure data**: No behavior beyond serialization and small accessors
//! - **1:1 with the bridge**: Field names match what the application layer reads
//! - **Stable**: Changes only when the bridge or host contract changes
//!
//! The session state machine that produces these values lives in `picker-runtime`.

pub mod intent;
pub mod types;

pub use intent::*;
pub use types::*;
