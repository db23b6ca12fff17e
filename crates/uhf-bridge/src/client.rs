//! Application-facing client.
//!
//! [`UhfClient`] composes the [`DeviceAdapter`] and the [`EventRelay`]. It
//! validates caller input before any hardware call, publishes the closed
//! constant sets, and offers typed listener registration per event kind.

use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uhf_core::constants::{MAX_POWER, MIN_POWER};
use uhf_core::{
    AccessPassword, BridgeEvent, Constants, Error, EventKind, FrequencyRegion, HexWords,
    InventoryMode, LockCode, MemoryBank, Result, TagFilter, TagRecord,
};
use uhf_hardware::{AnyKeySource, AnyUhfReader, KeyAction, UhfReader};

use crate::adapter::DeviceAdapter;
use crate::config::BridgeConfig;
use crate::relay::{EventRelay, Subscription};
use crate::trigger::{TriggerKeyHook, spawn_key_task};

type KeyTask = JoinHandle<uhf_hardware::Result<()>>;

/// Parse a power level, rejecting anything outside `[MIN_POWER, MAX_POWER]`.
fn validate_power(power: i32) -> Result<u8> {
    u8::try_from(power)
        .ok()
        .filter(|power| (MIN_POWER..=MAX_POWER).contains(power))
        .ok_or_else(|| {
            Error::validation(format!(
                "Power must be between {MIN_POWER} and {MAX_POWER} dBm, got {power}"
            ))
        })
}

/// UHF reader client.
///
/// All calls are async and resolve with a typed value or an [`Error`]
/// carrying a machine-readable [`code`](Error::code).
///
/// # Examples
///
/// ```
/// use uhf_bridge::{BridgeConfig, UhfClient};
/// use uhf_core::FrequencyRegion;
/// use uhf_hardware::mock::{MockUhfReader, SimulatedTag};
///
/// #[tokio::main]
/// async fn main() -> uhf_core::Result<()> {
///     let (reader, field) = MockUhfReader::new();
///     field.add_tag(SimulatedTag::new("E20034120000000000000001").unwrap());
///
///     let client = UhfClient::new(reader, BridgeConfig::default())?;
///     client.on_tag_read(|tag| println!("{}", tag.epc));
///
///     client.init().await?;
///     client.set_power(20).await?;
///     client.set_frequency_mode(FrequencyRegion::Europe).await?;
///
///     let tag = client.inventory_single_tag().await?;
///     assert_eq!(tag.epc, "E20034120000000000000001");
///
///     assert_eq!(client.set_power(31).await.unwrap_err().code(), "VALIDATION_ERROR");
///     client.free().await?;
///     Ok(())
/// }
/// ```
pub struct UhfClient<R: UhfReader = AnyUhfReader> {
    adapter: Mutex<DeviceAdapter<R>>,
    relay: EventRelay,
    trigger: TriggerKeyHook,
    key_task: StdMutex<Option<KeyTask>>,
    constants: Constants,
}

impl<R: UhfReader> UhfClient<R> {
    /// Create a client owning `reader`. Must be called within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if `config` is invalid or no runtime is
    /// running.
    pub fn new(reader: R, config: BridgeConfig) -> Result<Self> {
        config.validate()?;

        let relay = EventRelay::new(config.event_queue_capacity)?;
        let trigger = TriggerKeyHook::new(Arc::new(config.clone()), relay.sink());
        let adapter = DeviceAdapter::new(reader, relay.sink(), config);
        let constants = adapter.constants();

        Ok(Self {
            adapter: Mutex::new(adapter),
            relay,
            trigger,
            key_task: StdMutex::new(None),
            constants,
        })
    }

    /// Memory banks, frequency regions, event names and the power range.
    pub fn constants(&self) -> &Constants {
        &self.constants
    }

    // Lifecycle

    pub async fn init(&self) -> Result<bool> {
        self.adapter.lock().await.init().await
    }

    pub async fn free(&self) -> Result<bool> {
        self.adapter.lock().await.free().await
    }

    pub async fn is_initialized(&self) -> bool {
        self.adapter.lock().await.is_initialized()
    }

    // Reader configuration

    pub async fn get_version(&self) -> Result<String> {
        self.adapter.lock().await.version().await
    }

    /// Set transmit power in dBm.
    ///
    /// # Errors
    ///
    /// Fails with `VALIDATION_ERROR`, without touching the reader, unless
    /// `power` is within `[0, 30]`.
    pub async fn set_power(&self, power: i32) -> Result<bool> {
        let power = validate_power(power)?;
        self.adapter.lock().await.set_power(power).await
    }

    pub async fn get_power(&self) -> Result<u8> {
        self.adapter.lock().await.power().await
    }

    pub async fn set_frequency_mode(&self, region: FrequencyRegion) -> Result<bool> {
        self.adapter.lock().await.set_frequency_mode(region).await
    }

    pub async fn get_frequency_mode(&self) -> Result<FrequencyRegion> {
        self.adapter.lock().await.frequency_mode().await
    }

    /// Report EPC only.
    pub async fn set_epc_mode(&self) -> Result<bool> {
        self.set_inventory_mode(InventoryMode::EpcOnly).await
    }

    /// Report EPC and TID.
    pub async fn set_epc_and_tid_mode(&self) -> Result<bool> {
        self.set_inventory_mode(InventoryMode::EpcAndTid).await
    }

    /// Report EPC, TID and `user_len` words of USER memory from `user_ptr`.
    pub async fn set_epc_tid_user_mode(&self, user_ptr: u32, user_len: u32) -> Result<bool> {
        if user_len == 0 {
            return Err(Error::validation("USER window must be at least one word"));
        }
        self.set_inventory_mode(InventoryMode::EpcTidUser { user_ptr, user_len })
            .await
    }

    pub async fn get_inventory_mode(&self) -> Result<InventoryMode> {
        self.adapter.lock().await.inventory_mode().await
    }

    async fn set_inventory_mode(&self, mode: InventoryMode) -> Result<bool> {
        self.adapter.lock().await.set_inventory_mode(mode).await
    }

    // Inventory

    /// Start continuous inventory; emits `inventory-start`, then `tag-read`
    /// for every tag seen.
    pub async fn start_inventory(&self) -> Result<bool> {
        self.adapter.lock().await.start_inventory().await
    }

    /// Stop continuous inventory; emits `inventory-stop`.
    pub async fn stop_inventory(&self) -> Result<bool> {
        self.adapter.lock().await.stop_inventory().await
    }

    pub async fn is_inventorying(&self) -> Result<bool> {
        self.adapter.lock().await.is_inventorying().await
    }

    /// Read one tag. Fails with `NO_TAG` when nothing answered.
    pub async fn inventory_single_tag(&self) -> Result<TagRecord> {
        self.adapter.lock().await.inventory_single_tag().await
    }

    /// Restrict inventory to tags whose `bank` bits `[ptr, ptr + cnt)` match
    /// `data`.
    pub async fn set_filter(&self, bank: MemoryBank, ptr: u32, cnt: u32, data: &str) -> Result<bool> {
        let filter = TagFilter::new(bank, ptr, cnt, data)?;
        self.adapter.lock().await.set_filter(&filter).await
    }

    /// Remove any inventory filter.
    pub async fn clear_filter(&self) -> Result<bool> {
        self.adapter
            .lock()
            .await
            .set_filter(&TagFilter::disabled())
            .await
    }

    // Tag memory

    /// Read `cnt` words of `bank` from word `ptr`, as upper-case hex.
    pub async fn read_data(
        &self,
        access_pwd: &str,
        bank: MemoryBank,
        ptr: u32,
        cnt: u32,
    ) -> Result<String> {
        let password = AccessPassword::new(access_pwd)?;
        if cnt == 0 {
            return Err(Error::validation("Word count must be at least 1"));
        }
        self.adapter
            .lock()
            .await
            .read_data(&password, bank, ptr, cnt)
            .await
    }

    /// Write `cnt` words of hex `data` to `bank` at word `ptr`.
    ///
    /// # Errors
    ///
    /// Fails with `VALIDATION_ERROR` unless `data` holds exactly `cnt` words.
    pub async fn write_data(
        &self,
        access_pwd: &str,
        bank: MemoryBank,
        ptr: u32,
        cnt: u32,
        data: &str,
    ) -> Result<bool> {
        let password = AccessPassword::new(access_pwd)?;
        let data = HexWords::new(data)?;
        if data.word_count() != cnt as usize {
            return Err(Error::validation(format!(
                "Data holds {} word(s), expected {cnt}",
                data.word_count()
            )));
        }
        self.adapter
            .lock()
            .await
            .write_data(&password, bank, ptr, &data)
            .await
    }

    /// Rewrite the EPC of the tag in the field.
    pub async fn write_epc(&self, access_pwd: &str, epc_data: &str) -> Result<bool> {
        let password = AccessPassword::new(access_pwd)?;
        let epc = HexWords::new(epc_data)?;
        self.adapter.lock().await.write_epc(&password, &epc).await
    }

    pub async fn lock_tag(&self, access_pwd: &str, lock_code: &str) -> Result<bool> {
        let password = AccessPassword::new(access_pwd)?;
        let code = LockCode::new(lock_code)?;
        self.adapter.lock().await.lock_tag(&password, &code).await
    }

    /// Permanently disable the tag in the field.
    ///
    /// # Errors
    ///
    /// Fails with `VALIDATION_ERROR` for the all-zero password, which can
    /// never kill a tag.
    pub async fn kill_tag(&self, kill_pwd: &str) -> Result<bool> {
        let password = AccessPassword::new(kill_pwd)?;
        if password.is_zero() {
            return Err(Error::validation("Kill password cannot be zero"));
        }
        self.adapter.lock().await.kill_tag(&password).await
    }

    // Events

    /// Register `listener` on the `kind` channel.
    pub fn subscribe<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn(&BridgeEvent) + Send + Sync + 'static,
    {
        self.relay.subscribe(kind, listener)
    }

    pub fn on_tag_read<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&TagRecord) + Send + Sync + 'static,
    {
        self.relay
            .subscribe(EventKind::TagRead, move |event: &BridgeEvent| {
                if let Some(tag) = event.tag() {
                    listener(tag);
                }
            })
    }

    pub fn on_inventory_start<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe_unit(EventKind::InventoryStart, listener)
    }

    pub fn on_inventory_stop<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe_unit(EventKind::InventoryStop, listener)
    }

    pub fn on_trigger_press<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe_unit(EventKind::TriggerPress, listener)
    }

    pub fn on_trigger_release<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe_unit(EventKind::TriggerRelease, listener)
    }

    fn subscribe_unit<F>(&self, kind: EventKind, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.relay.subscribe(kind, move |_: &BridgeEvent| listener())
    }

    pub fn remove_all_listeners(&self, kind: EventKind) -> usize {
        self.relay.remove_all_listeners(kind)
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.relay.listener_count(kind)
    }

    /// Events lost because listeners could not keep up.
    pub fn dropped_events(&self) -> u64 {
        self.relay.dropped_events()
    }

    /// Wait until every event emitted so far has reached its listeners.
    pub async fn flush_events(&self) {
        self.relay.flush().await;
    }

    // Trigger keys

    /// Forward keys from `source` to the trigger channels in the background.
    ///
    /// Replaces any previously attached source.
    pub fn attach_key_source(&self, source: AnyKeySource) {
        let task = spawn_key_task(source, self.trigger.clone());
        let previous = self
            .key_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(task);
        if let Some(previous) = previous {
            debug!("Replacing attached key source");
            previous.abort();
        }
    }

    /// Forward one key transition. Returns whether it was a trigger
    /// transition.
    pub fn handle_key(&self, action: KeyAction) -> bool {
        self.trigger.handle(action)
    }

    /// Release the reader if it is open, then stop the key task and the
    /// event relay.
    pub async fn shutdown(&mut self) {
        {
            let mut adapter = self.adapter.lock().await;
            if adapter.is_initialized()
                && let Err(e) = adapter.free().await
            {
                warn!("Reader release during shutdown failed: {}", e);
            }
        }

        self.abort_key_task();
        self.relay.flush().await;
        self.relay.shutdown();
        info!("Client shut down");
    }

    fn abort_key_task(&self) {
        let task = self
            .key_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

impl<R: UhfReader> Drop for UhfClient<R> {
    fn drop(&mut self) {
        self.abort_key_task();
    }
}

impl<R: UhfReader> std::fmt::Debug for UhfClient<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UhfClient")
            .field("relay", &self.relay)
            .field("trigger", &self.trigger)
            .finish_non_exhaustive()
    }
}
