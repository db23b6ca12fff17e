//! Device adapter.
//!
//! Owns the reader driver and exposes each hardware capability as an async
//! call that resolves with a typed value or fails with an [`Error`] from the
//! caller-facing taxonomy:
//!
//! - no open handle → `NOT_INITIALIZED`
//! - driver configuration fault → `CONFIG_ERROR`
//! - any other driver fault, or a failure sentinel → `<OPERATION>_ERROR`
//! - empty single-tag read → `NO_TAG`
//!
//! Boolean setters resolve with the driver's answer unchanged. Nothing is
//! retried.

use chrono::{DateTime, Utc};
use tracing::{debug, info, trace, warn};
use uhf_core::{
    AccessPassword, BridgeEvent, Constants, Error, FrequencyRegion, HexWords, InventoryMode,
    LockCode, MemoryBank, Operation, Result, TagFilter, TagRecord,
};
use uhf_hardware::{DriverError, RawTagInfo, UhfReader};

use crate::config::BridgeConfig;
use crate::relay::EventSink;

/// Proof of an open reader connection.
///
/// Created by a successful `init`, dropped by a successful `free`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderHandle {
    opened_at: DateTime<Utc>,
}

impl ReaderHandle {
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }
}

/// Translate a driver fault into the caller-facing taxonomy.
fn driver_error(operation: Operation, err: DriverError) -> Error {
    warn!("{} raised a driver fault: {}", operation, err);
    if err.is_configuration() {
        Error::config(err.to_string())
    } else {
        Error::operation(operation, err.to_string())
    }
}

/// Build a tag-read payload from a driver report.
///
/// Reports without an EPC are discarded.
pub(crate) fn tag_from_raw(raw: RawTagInfo) -> Option<TagRecord> {
    let epc = raw.epc.filter(|epc| !epc.trim().is_empty())?;

    TagRecord::builder(epc)
        .tid(raw.tid.unwrap_or_default())
        .user(raw.user.unwrap_or_default())
        .signal_strength(raw.rssi.unwrap_or_default())
        .read_count(raw.count)
        .build()
        .map_err(|e| warn!("Discarding malformed tag report: {}", e))
        .ok()
}

/// Wraps a [`UhfReader`] and owns its lifecycle.
///
/// # Examples
///
/// ```
/// use uhf_bridge::{BridgeConfig, DeviceAdapter, EventRelay};
/// use uhf_hardware::mock::MockUhfReader;
///
/// #[tokio::main]
/// async fn main() -> uhf_core::Result<()> {
///     let relay = EventRelay::new(16)?;
///     let (reader, _handle) = MockUhfReader::new();
///     let mut adapter = DeviceAdapter::new(reader, relay.sink(), BridgeConfig::default());
///
///     assert_eq!(adapter.power().await.unwrap_err().code(), "NOT_INITIALIZED");
///
///     assert!(adapter.init().await?);
///     assert_eq!(adapter.power().await?, 26);
///     Ok(())
/// }
/// ```
pub struct DeviceAdapter<R: UhfReader> {
    reader: R,
    handle: Option<ReaderHandle>,
    sink: EventSink,
    config: BridgeConfig,
}

impl<R: UhfReader> DeviceAdapter<R> {
    pub fn new(reader: R, sink: EventSink, config: BridgeConfig) -> Self {
        Self {
            reader,
            handle: None,
            sink,
            config,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.handle.is_some()
    }

    pub fn handle(&self) -> Option<&ReaderHandle> {
        self.handle.as_ref()
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Constants published to the application layer.
    pub fn constants(&self) -> Constants {
        Constants::PUBLISHED
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.handle.is_none() {
            return Err(Error::NotInitialized);
        }
        Ok(())
    }

    /// Open the reader and arm event delivery.
    ///
    /// Calling `init` on an open reader resolves `true` without touching
    /// the hardware.
    pub async fn init(&mut self) -> Result<bool> {
        if self.handle.is_some() {
            debug!("Reader already initialized");
            return Ok(true);
        }

        let opened = self
            .reader
            .init()
            .await
            .map_err(|e| driver_error(Operation::Init, e))?;
        if !opened {
            warn!("Reader failed to initialize");
            return Err(Error::operation(
                Operation::Init,
                "Reader did not respond to initialization",
            ));
        }

        self.handle = Some(ReaderHandle {
            opened_at: Utc::now(),
        });
        self.sink.arm();
        info!("Reader initialized");
        Ok(true)
    }

    /// Close the reader and disarm event delivery.
    ///
    /// A running inventory is stopped first when configured to. If the
    /// driver answers `false` the handle stays open.
    pub async fn free(&mut self) -> Result<bool> {
        self.ensure_initialized()?;

        if self.config.stop_inventory_on_free {
            match self.reader.is_inventorying().await {
                Ok(true) => {
                    debug!("Stopping inventory before release");
                    if let Err(e) = self.stop_inventory().await {
                        warn!("Could not stop inventory before release: {}", e);
                    }
                }
                Ok(false) => {}
                Err(e) => warn!("Could not query inventory state before release: {}", e),
            }
        }

        let released = self
            .reader
            .free()
            .await
            .map_err(|e| driver_error(Operation::Free, e))?;
        if !released {
            warn!("Reader refused to release; handle kept");
            return Ok(false);
        }

        self.sink.disarm();
        if let Some(handle) = self.handle.take() {
            let open_for = Utc::now().signed_duration_since(handle.opened_at());
            info!("Reader released after {}s", open_for.num_seconds());
        }
        Ok(true)
    }

    pub async fn version(&self) -> Result<String> {
        self.ensure_initialized()?;
        self.reader
            .version()
            .await
            .map_err(|e| driver_error(Operation::GetVersion, e))?
            .ok_or_else(|| Error::operation(Operation::GetVersion, "Reader reported no version"))
    }

    /// Set transmit power in dBm. Range checking is the caller's job.
    pub async fn set_power(&mut self, power: u8) -> Result<bool> {
        self.ensure_initialized()?;
        debug!("Setting power to {} dBm", power);
        self.reader
            .set_power(power)
            .await
            .map_err(|e| driver_error(Operation::SetPower, e))
    }

    pub async fn power(&self) -> Result<u8> {
        self.ensure_initialized()?;
        let power = self
            .reader
            .power()
            .await
            .map_err(|e| driver_error(Operation::GetPower, e))?;
        u8::try_from(power).map_err(|_| {
            Error::operation(Operation::GetPower, format!("Reader reported power {power}"))
        })
    }

    pub async fn set_frequency_mode(&mut self, region: FrequencyRegion) -> Result<bool> {
        self.ensure_initialized()?;
        debug!("Setting frequency mode to {}", region);
        self.reader
            .set_frequency_mode(region.code())
            .await
            .map_err(|e| driver_error(Operation::SetFrequencyMode, e))
    }

    pub async fn frequency_mode(&self) -> Result<FrequencyRegion> {
        self.ensure_initialized()?;
        let code = self
            .reader
            .frequency_mode()
            .await
            .map_err(|e| driver_error(Operation::GetFrequencyMode, e))?;
        u8::try_from(code)
            .ok()
            .and_then(|code| FrequencyRegion::from_code(code).ok())
            .ok_or_else(|| {
                Error::operation(
                    Operation::GetFrequencyMode,
                    format!("Reader reported unknown frequency mode {code}"),
                )
            })
    }

    /// Start continuous inventory.
    ///
    /// Registers the tag callback feeding `tag-read` and emits
    /// `inventory-start` on success.
    pub async fn start_inventory(&mut self) -> Result<bool> {
        self.ensure_initialized()?;

        if self.config.reject_start_while_inventorying
            && self
                .reader
                .is_inventorying()
                .await
                .map_err(|e| driver_error(Operation::StartInventory, e))?
        {
            return Err(Error::operation(
                Operation::StartInventory,
                "Inventory already running",
            ));
        }

        let sink = self.sink.clone();
        self.reader
            .set_inventory_callback(std::sync::Arc::new(move |raw: RawTagInfo| {
                match tag_from_raw(raw) {
                    Some(tag) => {
                        sink.emit(BridgeEvent::TagRead(tag));
                    }
                    None => trace!("Ignoring tag report without EPC"),
                }
            }));

        let started = self
            .reader
            .start_inventory_tag()
            .await
            .map_err(|e| driver_error(Operation::StartInventory, e))?;
        if !started {
            return Err(Error::operation(
                Operation::StartInventory,
                "Reader refused to start inventory",
            ));
        }

        info!("Inventory started");
        self.sink.emit(BridgeEvent::InventoryStart);
        Ok(true)
    }

    /// Stop continuous inventory and emit `inventory-stop` on success.
    pub async fn stop_inventory(&mut self) -> Result<bool> {
        self.ensure_initialized()?;

        let stopped = self
            .reader
            .stop_inventory()
            .await
            .map_err(|e| driver_error(Operation::StopInventory, e))?;
        if !stopped {
            return Err(Error::operation(
                Operation::StopInventory,
                "Reader refused to stop inventory",
            ));
        }

        info!("Inventory stopped");
        self.sink.emit(BridgeEvent::InventoryStop);
        Ok(true)
    }

    pub async fn is_inventorying(&self) -> Result<bool> {
        self.ensure_initialized()?;
        self.reader
            .is_inventorying()
            .await
            .map_err(|e| driver_error(Operation::IsInventorying, e))
    }

    /// Read one tag.
    ///
    /// Fails with `NO_TAG` when nothing answered.
    pub async fn inventory_single_tag(&mut self) -> Result<TagRecord> {
        self.ensure_initialized()?;
        self.reader
            .inventory_single_tag()
            .await
            .map_err(|e| driver_error(Operation::InventorySingleTag, e))?
            .and_then(tag_from_raw)
            .ok_or(Error::NoTag)
    }

    /// Read `cnt` words of `bank` from word `ptr`, as upper-case hex.
    pub async fn read_data(
        &mut self,
        password: &AccessPassword,
        bank: MemoryBank,
        ptr: u32,
        cnt: u32,
    ) -> Result<String> {
        self.ensure_initialized()?;
        self.reader
            .read_data(password, bank, ptr, cnt)
            .await
            .map_err(|e| driver_error(Operation::ReadData, e))?
            .map(|data| data.to_ascii_uppercase())
            .ok_or_else(|| {
                Error::operation(
                    Operation::ReadData,
                    format!("Could not read {cnt} word(s) of {bank} at {ptr}"),
                )
            })
    }

    pub async fn write_data(
        &mut self,
        password: &AccessPassword,
        bank: MemoryBank,
        ptr: u32,
        data: &HexWords,
    ) -> Result<bool> {
        self.ensure_initialized()?;
        let cnt = u32::try_from(data.word_count())
            .map_err(|_| Error::validation("Data too long"))?;
        self.reader
            .write_data(password, bank, ptr, cnt, data.as_str())
            .await
            .map_err(|e| driver_error(Operation::WriteData, e))
    }

    pub async fn write_epc(&mut self, password: &AccessPassword, epc: &HexWords) -> Result<bool> {
        self.ensure_initialized()?;
        self.reader
            .write_data_to_epc(password, epc.as_str())
            .await
            .map_err(|e| driver_error(Operation::WriteEpc, e))
    }

    pub async fn set_filter(&mut self, filter: &TagFilter) -> Result<bool> {
        self.ensure_initialized()?;
        debug!(
            "Setting filter on {}: {} bit(s) at {}",
            filter.bank(), filter.cnt(), filter.ptr()
        );
        self.reader
            .set_filter(filter)
            .await
            .map_err(|e| driver_error(Operation::SetFilter, e))
    }

    pub async fn lock_tag(&mut self, password: &AccessPassword, code: &LockCode) -> Result<bool> {
        self.ensure_initialized()?;
        self.reader
            .lock_mem(password, code)
            .await
            .map_err(|e| driver_error(Operation::LockTag, e))
    }

    pub async fn kill_tag(&mut self, kill_password: &AccessPassword) -> Result<bool> {
        self.ensure_initialized()?;
        warn!("Killing tag in field");
        self.reader
            .kill_tag(kill_password)
            .await
            .map_err(|e| driver_error(Operation::KillTag, e))
    }

    pub async fn set_inventory_mode(&mut self, mode: InventoryMode) -> Result<bool> {
        self.ensure_initialized()?;
        debug!("Setting inventory mode to {:?}", mode);
        self.reader
            .set_inventory_mode(mode)
            .await
            .map_err(|e| driver_error(Operation::SetInventoryMode, e))
    }

    pub async fn inventory_mode(&self) -> Result<InventoryMode> {
        self.ensure_initialized()?;
        self.reader
            .inventory_mode()
            .await
            .map_err(|e| driver_error(Operation::GetInventoryMode, e))?
            .ok_or_else(|| {
                Error::operation(Operation::GetInventoryMode, "Reader reported no inventory mode")
            })
    }
}

impl<R: UhfReader + std::fmt::Debug> std::fmt::Debug for DeviceAdapter<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceAdapter")
            .field("reader", &self.reader)
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::EventRelay;
    use rstest::rstest;
    use std::sync::{Arc, Mutex};
    use uhf_core::EventKind;
    use uhf_hardware::mock::{MockCall, MockFault, MockUhfHandle, MockUhfReader, SimulatedTag};

    const EPC: &str = "E20034120000000000000001";

    struct Fixture {
        relay: EventRelay,
        adapter: DeviceAdapter<MockUhfReader>,
        handle: MockUhfHandle,
        events: Arc<Mutex<Vec<BridgeEvent>>>,
    }

    fn fixture_with(config: BridgeConfig) -> Fixture {
        let relay = EventRelay::new(64).unwrap();
        let (reader, handle) = MockUhfReader::new();
        handle.add_tag(SimulatedTag::new(EPC).unwrap());
        let adapter = DeviceAdapter::new(reader, relay.sink(), config);

        let events = Arc::new(Mutex::new(Vec::new()));
        for kind in EventKind::ALL {
            let events = Arc::clone(&events);
            relay.subscribe(kind, move |event: &BridgeEvent| {
                events.lock().unwrap().push(event.clone());
            });
        }

        Fixture {
            relay,
            adapter,
            handle,
            events,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(BridgeConfig::default())
    }

    async fn open_fixture() -> Fixture {
        let mut fx = fixture();
        assert!(fx.adapter.init().await.unwrap());
        fx
    }

    fn kinds(fx: &Fixture) -> Vec<EventKind> {
        fx.events.lock().unwrap().iter().map(BridgeEvent::kind).collect()
    }

    #[test]
    fn test_tag_from_raw() {
        let raw = RawTagInfo {
            epc: Some("e200".to_string()),
            tid: Some("e280".to_string()),
            user: None,
            rssi: Some("-60.1".to_string()),
            count: 0,
        };
        let tag = tag_from_raw(raw).unwrap();
        assert_eq!(tag.epc, "E200");
        assert_eq!(tag.tid, "E280");
        assert_eq!(tag.user, "");
        assert_eq!(tag.signal_strength, "-60.1");
        assert_eq!(tag.read_count, 1);

        assert!(tag_from_raw(RawTagInfo::default()).is_none());
        assert!(tag_from_raw(RawTagInfo::with_epc("  ")).is_none());
        assert!(tag_from_raw(RawTagInfo::with_epc("XYZ")).is_none());
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let mut fx = fixture();
        assert!(!fx.adapter.is_initialized());

        assert!(fx.adapter.init().await.unwrap());
        let opened_at = fx.adapter.handle().unwrap().opened_at();
        assert!(opened_at <= Utc::now());
        assert!(fx.adapter.init().await.unwrap());

        assert_eq!(fx.handle.call_count(MockCall::Init), 1);
        assert_eq!(fx.adapter.handle().unwrap().opened_at(), opened_at);
        assert!(fx.relay.is_armed());
    }

    #[rstest]
    #[case::sentinel(MockFault::Sentinel, "INIT_ERROR")]
    #[case::fault(MockFault::Fault("UART timeout".into()), "INIT_ERROR")]
    #[case::configuration(MockFault::Configuration("bad port".into()), "CONFIG_ERROR")]
    #[tokio::test]
    async fn test_init_failures(#[case] fault: MockFault, #[case] code: &str) {
        let mut fx = fixture();
        fx.handle.fail(MockCall::Init, fault);

        let err = fx.adapter.init().await.unwrap_err();
        assert_eq!(err.code(), code);
        assert!(!fx.adapter.is_initialized());
        assert!(!fx.relay.is_armed());
    }

    #[tokio::test]
    async fn test_init_false_from_module() {
        let mut fx = fixture();
        fx.handle.set_init_result(false);

        assert_eq!(fx.adapter.init().await.unwrap_err().code(), "INIT_ERROR");
    }

    #[tokio::test]
    async fn test_free_releases_handle() {
        let mut fx = open_fixture().await;

        assert!(fx.adapter.free().await.unwrap());
        assert!(!fx.adapter.is_initialized());
        assert!(!fx.relay.is_armed());
        assert!(!fx.handle.is_initialized());

        assert!(fx.adapter.free().await.unwrap_err().is_not_initialized());
    }

    #[tokio::test]
    async fn test_free_refused_keeps_handle() {
        let mut fx = open_fixture().await;
        fx.handle.fail(MockCall::Free, MockFault::Sentinel);

        assert!(!fx.adapter.free().await.unwrap());
        assert!(fx.adapter.is_initialized());

        fx.handle.fail(MockCall::Free, MockFault::Fault("busy".into()));
        assert_eq!(fx.adapter.free().await.unwrap_err().code(), "FREE_ERROR");
        assert!(fx.adapter.is_initialized());
    }

    #[tokio::test]
    async fn test_free_stops_running_inventory() {
        let mut fx = open_fixture().await;
        fx.adapter.start_inventory().await.unwrap();

        assert!(fx.adapter.free().await.unwrap());
        fx.relay.flush().await;

        assert_eq!(
            kinds(&fx),
            vec![EventKind::InventoryStart, EventKind::InventoryStop]
        );
        assert_eq!(fx.handle.call_count(MockCall::StopInventory), 1);
    }

    #[tokio::test]
    async fn test_free_without_auto_stop() {
        let mut fx = fixture_with(BridgeConfig {
            stop_inventory_on_free: false,
            ..BridgeConfig::default()
        });
        fx.adapter.init().await.unwrap();
        fx.adapter.start_inventory().await.unwrap();

        assert!(fx.adapter.free().await.unwrap());
        fx.relay.flush().await;

        assert_eq!(kinds(&fx), vec![EventKind::InventoryStart]);
        assert_eq!(fx.handle.call_count(MockCall::StopInventory), 0);
    }

    #[tokio::test]
    async fn test_start_emits_and_delivers_tags() {
        let mut fx = open_fixture().await;

        assert!(fx.adapter.start_inventory().await.unwrap());
        assert!(fx.adapter.is_inventorying().await.unwrap());
        assert_eq!(fx.handle.run_inventory_round(), 1);
        fx.relay.flush().await;

        let events = fx.events.lock().unwrap().clone();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], BridgeEvent::InventoryStart);
        let tag = events[1].tag().unwrap();
        assert_eq!(tag.epc, EPC);
        assert_eq!(tag.tid, "");
        assert_eq!(tag.user, "");
    }

    #[tokio::test]
    async fn test_start_while_inventorying_rejected() {
        let mut fx = open_fixture().await;
        fx.adapter.start_inventory().await.unwrap();

        let err = fx.adapter.start_inventory().await.unwrap_err();
        assert_eq!(err.code(), "START_ERROR");
        assert_eq!(fx.handle.call_count(MockCall::StartInventory), 1);

        fx.relay.flush().await;
        assert_eq!(kinds(&fx), vec![EventKind::InventoryStart]);
    }

    #[tokio::test]
    async fn test_start_while_inventorying_delegated() {
        let mut fx = fixture_with(BridgeConfig {
            reject_start_while_inventorying: false,
            ..BridgeConfig::default()
        });
        fx.adapter.init().await.unwrap();
        fx.adapter.start_inventory().await.unwrap();

        // The mock module refuses a second start
        let err = fx.adapter.start_inventory().await.unwrap_err();
        assert_eq!(err.code(), "START_ERROR");
        assert_eq!(fx.handle.call_count(MockCall::StartInventory), 2);
    }

    #[tokio::test]
    async fn test_stop_emits_and_clears_state() {
        let mut fx = open_fixture().await;
        fx.adapter.start_inventory().await.unwrap();

        assert!(fx.adapter.stop_inventory().await.unwrap());
        assert!(!fx.adapter.is_inventorying().await.unwrap());
        fx.relay.flush().await;

        assert_eq!(
            kinds(&fx),
            vec![EventKind::InventoryStart, EventKind::InventoryStop]
        );
    }

    #[tokio::test]
    async fn test_stop_failure_emits_nothing() {
        let mut fx = open_fixture().await;
        fx.handle.fail(MockCall::StopInventory, MockFault::Sentinel);

        assert_eq!(fx.adapter.stop_inventory().await.unwrap_err().code(), "STOP_ERROR");
        fx.relay.flush().await;
        assert!(kinds(&fx).is_empty());
    }

    #[tokio::test]
    async fn test_single_tag_and_no_tag() {
        let mut fx = open_fixture().await;

        let tag = fx.adapter.inventory_single_tag().await.unwrap();
        assert_eq!(tag.epc, EPC);
        assert_eq!(tag.read_count, 1);

        fx.handle.clear_field();
        let err = fx.adapter.inventory_single_tag().await.unwrap_err();
        assert_eq!(err, Error::NoTag);
        assert_eq!(err.code(), "NO_TAG");
    }

    #[rstest]
    #[case::version(MockCall::Version, "VERSION_ERROR")]
    #[case::power(MockCall::Power, "POWER_ERROR")]
    #[case::frequency(MockCall::FrequencyMode, "FREQUENCY_ERROR")]
    #[case::start(MockCall::StartInventory, "START_ERROR")]
    #[case::read(MockCall::ReadData, "READ_ERROR")]
    #[case::mode(MockCall::InventoryMode, "MODE_ERROR")]
    #[tokio::test]
    async fn test_sentinels_map_to_operation_errors(#[case] call: MockCall, #[case] code: &str) {
        let mut fx = open_fixture().await;
        fx.handle.fail(call, MockFault::Sentinel);

        let password = AccessPassword::zero();
        let err = match call {
            MockCall::Version => fx.adapter.version().await.unwrap_err(),
            MockCall::Power => fx.adapter.power().await.unwrap_err(),
            MockCall::FrequencyMode => fx.adapter.frequency_mode().await.unwrap_err(),
            MockCall::StartInventory => fx.adapter.start_inventory().await.unwrap_err(),
            MockCall::ReadData => fx
                .adapter
                .read_data(&password, MemoryBank::Tid, 0, 2)
                .await
                .unwrap_err(),
            MockCall::InventoryMode => fx.adapter.inventory_mode().await.unwrap_err(),
            other => unreachable!("no case for {other:?}"),
        };
        assert_eq!(err.code(), code);
    }

    #[rstest]
    #[case::set_power(MockCall::SetPower)]
    #[case::write(MockCall::WriteData)]
    #[case::filter(MockCall::SetFilter)]
    #[case::kill(MockCall::KillTag)]
    #[tokio::test]
    async fn test_boolean_sentinels_resolve_false(#[case] call: MockCall) {
        let mut fx = open_fixture().await;
        fx.handle.fail(call, MockFault::Sentinel);

        let password = AccessPassword::zero();
        let result = match call {
            MockCall::SetPower => fx.adapter.set_power(10).await,
            MockCall::WriteData => {
                let data = HexWords::new("1234").unwrap();
                fx.adapter.write_data(&password, MemoryBank::User, 0, &data).await
            }
            MockCall::SetFilter => fx.adapter.set_filter(&TagFilter::disabled()).await,
            MockCall::KillTag => {
                let kill = AccessPassword::new("DEADBEEF").unwrap();
                fx.adapter.kill_tag(&kill).await
            }
            other => unreachable!("no case for {other:?}"),
        };
        assert_eq!(result, Ok(false));
    }

    #[rstest]
    #[case::fault(MockFault::Fault("CRC error".into()), "WRITE_ERROR")]
    #[case::configuration(MockFault::Configuration("bank locked".into()), "CONFIG_ERROR")]
    #[tokio::test]
    async fn test_driver_faults_translated(#[case] fault: MockFault, #[case] code: &str) {
        let mut fx = open_fixture().await;
        fx.handle.fail(MockCall::WriteEpc, fault);

        let epc = HexWords::new("30000000").unwrap();
        let err = fx
            .adapter
            .write_epc(&AccessPassword::zero(), &epc)
            .await
            .unwrap_err();
        assert_eq!(err.code(), code);
    }

    #[tokio::test]
    async fn test_power_and_frequency_round_trip() {
        let mut fx = open_fixture().await;

        assert!(fx.adapter.set_power(18).await.unwrap());
        assert_eq!(fx.adapter.power().await.unwrap(), 18);

        assert!(fx.adapter.set_frequency_mode(FrequencyRegion::Europe).await.unwrap());
        assert_eq!(
            fx.adapter.frequency_mode().await.unwrap(),
            FrequencyRegion::Europe
        );
    }

    #[tokio::test]
    async fn test_memory_access() {
        let mut fx = open_fixture().await;
        let password = AccessPassword::zero();

        let data = HexWords::new("CAFEBABE").unwrap();
        assert!(fx.adapter.write_data(&password, MemoryBank::User, 0, &data).await.unwrap());
        assert_eq!(
            fx.adapter
                .read_data(&password, MemoryBank::User, 0, 2)
                .await
                .unwrap(),
            "CAFEBABE"
        );

        let epc = HexWords::new("300833B2DDD9014000000000").unwrap();
        assert!(fx.adapter.write_epc(&password, &epc).await.unwrap());
        assert_eq!(fx.adapter.inventory_single_tag().await.unwrap().epc, epc.as_str());
    }

    #[tokio::test]
    async fn test_inventory_mode_round_trip() {
        let mut fx = open_fixture().await;

        assert_eq!(fx.adapter.inventory_mode().await.unwrap(), InventoryMode::EpcOnly);
        assert!(fx.adapter.set_inventory_mode(InventoryMode::EpcAndTid).await.unwrap());
        assert_eq!(fx.adapter.inventory_mode().await.unwrap(), InventoryMode::EpcAndTid);

        let tag = fx.adapter.inventory_single_tag().await.unwrap();
        assert!(!tag.tid.is_empty());
        assert_eq!(tag.user, "");
    }

    #[tokio::test]
    async fn test_events_dropped_after_free() {
        let mut fx = open_fixture().await;
        fx.adapter.start_inventory().await.unwrap();
        fx.adapter.stop_inventory().await.unwrap();
        fx.adapter.free().await.unwrap();
        fx.relay.flush().await;
        let before = fx.events.lock().unwrap().len();

        // Late callback from the driver after release
        fx.handle.deliver_raw(RawTagInfo::with_epc("E2FF"));
        fx.relay.flush().await;

        assert_eq!(fx.events.lock().unwrap().len(), before);
    }

    #[tokio::test]
    async fn test_constants() {
        let fx = fixture();

        let constants = fx.adapter.constants();
        assert_eq!(constants.max_power, 30);
        assert_eq!(constants.memory_banks.len(), 4);
        assert_eq!(constants.frequency_regions.len(), 6);
    }
}
