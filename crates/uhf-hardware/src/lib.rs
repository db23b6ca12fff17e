//! Reader driver abstraction layer for the UHF bridge.
//!
//! This crate describes the vendor UHF SDK as a trait so that the bridge can
//! run against the real module or a simulated one without change:
//!
//! - [`UhfReader`]: one method per SDK call (power, frequency, inventory,
//!   memory access, lock, kill). Methods return what the SDK returns,
//!   including its sentinel values; interpretation happens in the bridge.
//! - [`KeySource`]: the platform key hook reporting trigger buttons.
//!
//! # Design
//!
//! - **Async-first**: native `async fn` in traits (Rust 1.90 + Edition 2024 RPITIT).
//! - **Enum dispatch**: [`AnyUhfReader`] and [`AnyKeySource`] stand in for trait
//!   objects, which RPITIT traits cannot form.
//! - **Callback delivery**: continuous inventory reports arrive through an
//!   [`InventoryCallback`] the driver may invoke from any thread.
//!
//! # Example
//!
//! ```no_run
//! use uhf_hardware::traits::UhfReader;
//! use uhf_hardware::error::Result;
//!
//! async fn read_one<R: UhfReader>(reader: &mut R) -> Result<Option<String>> {
//!     reader.init().await?;
//!     Ok(reader.inventory_single_tag().await?.and_then(|tag| tag.epc))
//! }
//! ```
//!
//! # Mock Implementations
//!
//! [`mock::MockUhfReader`] simulates a module with a field of Gen-2 tags;
//! [`mock::MockKeySource`] simulates the key hook.

pub mod devices;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

pub use devices::{AnyKeySource, AnyUhfReader};
pub use error::{DriverError, Result};
pub use traits::{KeySource, UhfReader};
pub use types::{InventoryCallback, KeyAction, RawTagInfo};
