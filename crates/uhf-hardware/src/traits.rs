//! Reader driver trait definitions.
//!
//! [`UhfReader`] mirrors the call surface of the vendor's UART UHF SDK: one
//! method per hardware capability, returning what the SDK returns (booleans,
//! nullable values, sentinel integers). Interpreting those results is the
//! adapter's job, not the driver's.
//!
//! [`KeySource`] models the platform key hook that reports the handheld's
//! physical trigger buttons.
//!
//! All traits use native `async fn` methods (Rust 1.90 + Edition 2024 RPITIT),
//! eliminating the need for the `async_trait` macro.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{InventoryCallback, KeyAction, RawTagInfo};
use uhf_core::{AccessPassword, InventoryMode, LockCode, MemoryBank, TagFilter};

/// UHF reader module driver.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods return
/// `impl Future`. Use generic parameters, or
/// [`AnyUhfReader`](crate::devices::AnyUhfReader) for enum dispatch.
///
/// # Examples
///
/// ```no_run
/// use uhf_hardware::traits::UhfReader;
/// use uhf_hardware::error::Result;
///
/// async fn firmware<R: UhfReader>(reader: &mut R) -> Result<Option<String>> {
///     if !reader.init().await? {
///         return Ok(None);
///     }
///     reader.version().await
/// }
/// ```
pub trait UhfReader: Send + Sync {
    /// Power up and open the module. `false` means the module did not answer.
    async fn init(&mut self) -> Result<bool>;

    /// Close the module and release the UART.
    async fn free(&mut self) -> Result<bool>;

    /// Firmware version, `None` if the module did not report one.
    async fn version(&self) -> Result<Option<String>>;

    /// Set transmit power in dBm.
    async fn set_power(&mut self, power: u8) -> Result<bool>;

    /// Current transmit power in dBm, negative on failure.
    async fn power(&self) -> Result<i32>;

    /// Set the frequency mode by region code.
    async fn set_frequency_mode(&mut self, code: u8) -> Result<bool>;

    /// Current frequency mode code, negative on failure.
    async fn frequency_mode(&self) -> Result<i32>;

    /// Register the callback fed during continuous inventory.
    ///
    /// Replaces any previously registered callback.
    fn set_inventory_callback(&mut self, callback: InventoryCallback);

    /// Start continuous inventory.
    async fn start_inventory_tag(&mut self) -> Result<bool>;

    /// Stop continuous inventory.
    async fn stop_inventory(&mut self) -> Result<bool>;

    /// Whether continuous inventory is running.
    async fn is_inventorying(&self) -> Result<bool>;

    /// Read one tag, `None` if no tag answered.
    async fn inventory_single_tag(&mut self) -> Result<Option<RawTagInfo>>;

    /// Read `cnt` words from `bank` starting at word `ptr`, as hex.
    async fn read_data(
        &mut self,
        password: &AccessPassword,
        bank: MemoryBank,
        ptr: u32,
        cnt: u32,
    ) -> Result<Option<String>>;

    /// Write `cnt` words of hex `data` to `bank` at word `ptr`.
    async fn write_data(
        &mut self,
        password: &AccessPassword,
        bank: MemoryBank,
        ptr: u32,
        cnt: u32,
        data: &str,
    ) -> Result<bool>;

    /// Rewrite the EPC (and its PC word) of the tag in the field.
    async fn write_data_to_epc(&mut self, password: &AccessPassword, epc: &str) -> Result<bool>;

    /// Restrict inventory to tags matching `filter`.
    async fn set_filter(&mut self, filter: &TagFilter) -> Result<bool>;

    /// Apply a lock payload.
    async fn lock_mem(&mut self, password: &AccessPassword, code: &LockCode) -> Result<bool>;

    /// Permanently disable the tag in the field.
    async fn kill_tag(&mut self, kill_password: &AccessPassword) -> Result<bool>;

    /// Select which banks are reported per inventoried tag.
    async fn set_inventory_mode(&mut self, mode: InventoryMode) -> Result<bool>;

    /// Current inventory mode, `None` if the module did not answer.
    async fn inventory_mode(&self) -> Result<Option<InventoryMode>>;
}

/// Source of physical key events (trigger buttons).
///
/// # Examples
///
/// ```no_run
/// use uhf_hardware::traits::KeySource;
/// use uhf_hardware::types::KeyAction;
/// use uhf_hardware::error::Result;
///
/// async fn wait_for_trigger<K: KeySource>(keys: &mut K, trigger: u32) -> Result<()> {
///     loop {
///         if keys.next_key().await? == KeyAction::press(trigger) {
///             return Ok(());
///         }
///     }
/// }
/// ```
pub trait KeySource: Send + Sync {
    /// Wait for the next key transition.
    ///
    /// # Errors
    ///
    /// Returns an error if the key hook is disconnected.
    async fn next_key(&mut self) -> Result<KeyAction>;
}
