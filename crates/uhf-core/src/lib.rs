//! Shared types for the UHF reader bridge.
//!
//! Closed enumerations for memory banks, frequency regions, inventory modes
//! and event channels, the [`TagRecord`] payload, validated input types, and
//! the caller-facing [`Error`] taxonomy.

pub mod constants;
pub mod error;
pub mod event;
pub mod tag;
pub mod types;

pub use error::{Error, Operation, Result};
pub use event::{BridgeEvent, Constants, EventKind};
pub use tag::{TagRecord, TagRecordBuilder};
pub use types::*;
