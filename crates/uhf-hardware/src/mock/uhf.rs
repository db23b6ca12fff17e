//! Mock UHF reader implementation for testing and development.
//!
//! This module provides a simulated UART UHF module with a field of Gen-2
//! tags that can be controlled programmatically, so the bridge can be
//! exercised without physical hardware.

use crate::{
    DriverError, Result,
    traits::UhfReader,
    types::{InventoryCallback, RawTagInfo},
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace};
use uhf_core::{
    AccessPassword, FrequencyRegion, HexWords, InventoryMode, LockCode, MemoryBank, TagFilter,
    constants::{ACCESS_PASSWORD_WORD_OFFSET, EPC_WORD_OFFSET, KILL_PASSWORD_WORD_OFFSET, MAX_POWER},
};

/// Driver calls that can be counted or have faults injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
    Init,
    Free,
    Version,
    SetPower,
    Power,
    SetFrequencyMode,
    FrequencyMode,
    StartInventory,
    StopInventory,
    IsInventorying,
    SingleTag,
    ReadData,
    WriteData,
    WriteEpc,
    SetFilter,
    LockMem,
    KillTag,
    SetInventoryMode,
    InventoryMode,
}

/// Injected outcome for a [`MockCall`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFault {
    /// The SDK throws a configuration exception.
    Configuration(String),
    /// The SDK throws.
    Fault(String),
    /// The SDK returns its failure value (`false`, `null`, `-1`) without throwing.
    Sentinel,
}

/// A Gen-2 tag in the simulated RF field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatedTag {
    reserved: Vec<u16>,
    epc_bank: Vec<u16>,
    tid: Vec<u16>,
    user: Vec<u16>,
    rssi: String,
    locked: Option<LockCode>,
}

impl SimulatedTag {
    /// Create a tag with the given EPC, a TID derived from it, and four
    /// words of blank user memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the EPC is not word-aligned hex.
    pub fn new(epc: &str) -> Result<Self> {
        let epc = parse_words(epc)?;
        let serial = epc.last().copied().unwrap_or_default();

        let mut tag = Self {
            reserved: vec![0; 4],
            epc_bank: Vec::new(),
            tid: vec![0xE280, 0x1170, 0x2000, serial],
            user: vec![0; 4],
            rssi: "-55.00".to_string(),
            locked: None,
        };
        tag.set_epc(&epc);
        Ok(tag)
    }

    /// # Errors
    ///
    /// Returns an error if the TID is not word-aligned hex.
    pub fn with_tid(mut self, tid: &str) -> Result<Self> {
        self.tid = parse_words(tid)?;
        Ok(self)
    }

    /// # Errors
    ///
    /// Returns an error if the data is not word-aligned hex.
    pub fn with_user(mut self, user: &str) -> Result<Self> {
        self.user = parse_words(user)?;
        Ok(self)
    }

    pub fn with_access_password(mut self, password: &AccessPassword) -> Self {
        let at = ACCESS_PASSWORD_WORD_OFFSET as usize;
        self.reserved[at..at + 2].copy_from_slice(&password.words());
        self
    }

    pub fn with_kill_password(mut self, password: &AccessPassword) -> Self {
        let at = KILL_PASSWORD_WORD_OFFSET as usize;
        self.reserved[at..at + 2].copy_from_slice(&password.words());
        self
    }

    pub fn with_rssi(mut self, rssi: impl Into<String>) -> Self {
        self.rssi = rssi.into();
        self
    }

    pub fn epc_hex(&self) -> String {
        HexWords::from_words(&self.epc_bank[EPC_WORD_OFFSET as usize..]).to_string()
    }

    pub fn tid_hex(&self) -> String {
        HexWords::from_words(&self.tid).to_string()
    }

    pub fn user_hex(&self) -> String {
        HexWords::from_words(&self.user).to_string()
    }

    pub fn lock_code(&self) -> Option<&LockCode> {
        self.locked.as_ref()
    }

    fn access_password(&self) -> AccessPassword {
        self.password_at(ACCESS_PASSWORD_WORD_OFFSET)
    }

    fn kill_password(&self) -> AccessPassword {
        self.password_at(KILL_PASSWORD_WORD_OFFSET)
    }

    fn password_at(&self, offset: u32) -> AccessPassword {
        let at = offset as usize;
        let hex = HexWords::from_words(&self.reserved[at..at + 2]);
        AccessPassword::new(hex.as_str()).unwrap_or_else(|_| AccessPassword::zero())
    }

    /// Access control: open tags accept any password.
    fn authorizes(&self, password: &AccessPassword) -> bool {
        let access = self.access_password();
        access.is_zero() || access == *password
    }

    /// Locked tags only accept writes from a holder of a non-zero access password.
    fn writable_with(&self, password: &AccessPassword) -> bool {
        if !self.authorizes(password) {
            return false;
        }
        self.locked.is_none() || !self.access_password().is_zero()
    }

    fn bank(&self, bank: MemoryBank) -> &[u16] {
        match bank {
            MemoryBank::Reserved => &self.reserved,
            MemoryBank::Epc => &self.epc_bank,
            MemoryBank::Tid => &self.tid,
            MemoryBank::User => &self.user,
        }
    }

    fn bank_mut(&mut self, bank: MemoryBank) -> &mut Vec<u16> {
        match bank {
            MemoryBank::Reserved => &mut self.reserved,
            MemoryBank::Epc => &mut self.epc_bank,
            MemoryBank::Tid => &mut self.tid,
            MemoryBank::User => &mut self.user,
        }
    }

    fn set_epc(&mut self, epc: &[u16]) {
        let pc = (epc.len() as u16) << 11;
        let mut bank = Vec::with_capacity(epc.len() + 2);
        bank.push(0);
        bank.push(pc);
        bank.extend_from_slice(epc);
        bank[0] = crc16(&bank[1..]);
        self.epc_bank = bank;
    }

    fn report(&self, mode: InventoryMode) -> RawTagInfo {
        let user = match mode {
            InventoryMode::EpcTidUser { user_ptr, user_len } => {
                let start = (user_ptr as usize).min(self.user.len());
                let end = (start + user_len as usize).min(self.user.len());
                Some(HexWords::from_words(&self.user[start..end]).to_string())
            }
            _ => None,
        };

        RawTagInfo {
            epc: Some(self.epc_hex()),
            tid: mode.includes_tid().then(|| self.tid_hex()),
            user,
            rssi: Some(self.rssi.clone()),
            count: 1,
        }
    }
}

/// CRC-16 over the PC and EPC words, as stored in word 0 of the EPC bank.
fn crc16(words: &[u16]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for byte in words.iter().flat_map(|w| w.to_be_bytes()) {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    !crc
}

fn parse_words(hex: &str) -> Result<Vec<u16>> {
    HexWords::new(hex)
        .map(|data| data.words())
        .map_err(|e| DriverError::invalid_data(e.to_string()))
}

#[derive(Default)]
struct MockState {
    initialized: bool,
    init_result: bool,
    version: Option<String>,
    power: u8,
    frequency: u8,
    mode: InventoryMode,
    filter: Option<TagFilter>,
    inventorying: bool,
    callback: Option<InventoryCallback>,
    field: Vec<SimulatedTag>,
    faults: HashMap<MockCall, MockFault>,
    calls: HashMap<MockCall, usize>,
}

impl MockState {
    /// Count the call and apply any injected fault.
    ///
    /// `Ok(false)` means the call must return its sentinel value.
    fn enter(&mut self, call: MockCall) -> Result<bool> {
        *self.calls.entry(call).or_default() += 1;
        let fault = self.faults.get(&call);
        if let Some(fault) = fault {
            trace!(?call, ?fault, "Injected fault");
        }
        match fault {
            None => Ok(true),
            Some(MockFault::Sentinel) => Ok(false),
            Some(MockFault::Configuration(message)) => {
                Err(DriverError::configuration(message.clone()))
            }
            Some(MockFault::Fault(message)) => Err(DriverError::fault(message.clone())),
        }
    }

    /// Like [`enter`](Self::enter), and also requires an open module.
    fn enter_open(&mut self, call: MockCall) -> Result<bool> {
        Ok(self.enter(call)? && self.initialized)
    }

    /// The tag that answers a singulated access: the first one passing the filter.
    fn selected(&mut self) -> Option<&mut SimulatedTag> {
        let filter = self.filter.clone();
        self.field.iter_mut().find(|tag| match &filter {
            Some(filter) => filter.matches(tag.bank(filter.bank())),
            None => true,
        })
    }

    fn visible(&self) -> impl Iterator<Item = &SimulatedTag> {
        self.field.iter().filter(|tag| match &self.filter {
            Some(filter) => filter.matches(tag.bank(filter.bank())),
            None => true,
        })
    }
}

fn lock(state: &Mutex<MockState>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Mock UHF reader for testing and development.
///
/// The reader and its [`MockUhfHandle`] share one simulated module: the
/// handle places tags in the field, drives inventory rounds, and injects
/// faults, while the reader is handed to the bridge.
///
/// # Examples
///
/// ```
/// use uhf_hardware::mock::{MockUhfReader, SimulatedTag};
/// use uhf_hardware::traits::UhfReader;
///
/// #[tokio::main]
/// async fn main() -> uhf_hardware::Result<()> {
///     let (mut reader, handle) = MockUhfReader::new();
///     handle.add_tag(SimulatedTag::new("E20034120000000000000001")?);
///
///     assert!(reader.init().await?);
///     let tag = reader.inventory_single_tag().await?.unwrap();
///     assert_eq!(tag.epc.as_deref(), Some("E20034120000000000000001"));
///
///     Ok(())
/// }
/// ```
pub struct MockUhfReader {
    state: Arc<Mutex<MockState>>,
}

impl MockUhfReader {
    /// Create a new mock reader with an empty field.
    ///
    /// Returns a tuple of (MockUhfReader, MockUhfHandle).
    pub fn new() -> (Self, MockUhfHandle) {
        let state = Arc::new(Mutex::new(MockState {
            init_result: true,
            version: Some("UHF-R2000 V2.0.3".to_string()),
            power: 26,
            frequency: FrequencyRegion::Usa.code(),
            ..MockState::default()
        }));

        let reader = Self {
            state: Arc::clone(&state),
        };
        (reader, MockUhfHandle { state })
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        lock(&self.state)
    }
}

impl Default for MockUhfReader {
    fn default() -> Self {
        Self::new().0
    }
}

impl std::fmt::Debug for MockUhfReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockUhfReader").finish_non_exhaustive()
    }
}

impl UhfReader for MockUhfReader {
    async fn init(&mut self) -> Result<bool> {
        let mut state = self.state();
        if !state.enter(MockCall::Init)? {
            return Ok(false);
        }
        state.initialized = state.init_result;
        Ok(state.init_result)
    }

    async fn free(&mut self) -> Result<bool> {
        let mut state = self.state();
        if !state.enter(MockCall::Free)? {
            return Ok(false);
        }
        state.initialized = false;
        state.inventorying = false;
        Ok(true)
    }

    async fn version(&self) -> Result<Option<String>> {
        let mut state = self.state();
        if !state.enter_open(MockCall::Version)? {
            return Ok(None);
        }
        Ok(state.version.clone())
    }

    async fn set_power(&mut self, power: u8) -> Result<bool> {
        let mut state = self.state();
        if !state.enter_open(MockCall::SetPower)? || power > MAX_POWER {
            return Ok(false);
        }
        state.power = power;
        Ok(true)
    }

    async fn power(&self) -> Result<i32> {
        let mut state = self.state();
        if !state.enter_open(MockCall::Power)? {
            return Ok(-1);
        }
        Ok(i32::from(state.power))
    }

    async fn set_frequency_mode(&mut self, code: u8) -> Result<bool> {
        let mut state = self.state();
        if !state.enter_open(MockCall::SetFrequencyMode)?
            || FrequencyRegion::from_code(code).is_err()
        {
            return Ok(false);
        }
        state.frequency = code;
        Ok(true)
    }

    async fn frequency_mode(&self) -> Result<i32> {
        let mut state = self.state();
        if !state.enter_open(MockCall::FrequencyMode)? {
            return Ok(-1);
        }
        Ok(i32::from(state.frequency))
    }

    fn set_inventory_callback(&mut self, callback: InventoryCallback) {
        self.state().callback = Some(callback);
    }

    async fn start_inventory_tag(&mut self) -> Result<bool> {
        let mut state = self.state();
        if !state.enter_open(MockCall::StartInventory)? || state.inventorying {
            return Ok(false);
        }
        state.inventorying = true;
        Ok(true)
    }

    async fn stop_inventory(&mut self) -> Result<bool> {
        let mut state = self.state();
        if !state.enter_open(MockCall::StopInventory)? {
            return Ok(false);
        }
        state.inventorying = false;
        Ok(true)
    }

    async fn is_inventorying(&self) -> Result<bool> {
        let mut state = self.state();
        if !state.enter_open(MockCall::IsInventorying)? {
            return Ok(false);
        }
        Ok(state.inventorying)
    }

    async fn inventory_single_tag(&mut self) -> Result<Option<RawTagInfo>> {
        let mut state = self.state();
        if !state.enter_open(MockCall::SingleTag)? || state.inventorying {
            return Ok(None);
        }
        let mode = state.mode;
        Ok(state.selected().map(|tag| tag.report(mode)))
    }

    async fn read_data(
        &mut self,
        password: &AccessPassword,
        bank: MemoryBank,
        ptr: u32,
        cnt: u32,
    ) -> Result<Option<String>> {
        let mut state = self.state();
        if !state.enter_open(MockCall::ReadData)? {
            return Ok(None);
        }
        let Some(tag) = state.selected() else {
            return Ok(None);
        };
        if !tag.authorizes(password) {
            return Ok(None);
        }

        let words = tag.bank(bank);
        let (start, end) = (ptr as usize, ptr as usize + cnt as usize);
        if cnt == 0 || end > words.len() {
            return Ok(None);
        }
        Ok(Some(HexWords::from_words(&words[start..end]).to_string()))
    }

    async fn write_data(
        &mut self,
        password: &AccessPassword,
        bank: MemoryBank,
        ptr: u32,
        cnt: u32,
        data: &str,
    ) -> Result<bool> {
        let mut state = self.state();
        if !state.enter_open(MockCall::WriteData)? || bank == MemoryBank::Tid {
            return Ok(false);
        }
        let Ok(data) = HexWords::new(data) else {
            return Ok(false);
        };
        let words = data.words();
        let Some(tag) = state.selected() else {
            return Ok(false);
        };
        if words.len() != cnt as usize || !tag.writable_with(password) {
            return Ok(false);
        }

        let target = tag.bank_mut(bank);
        let (start, end) = (ptr as usize, ptr as usize + words.len());
        if end > target.len() {
            return Ok(false);
        }
        target[start..end].copy_from_slice(&words);
        Ok(true)
    }

    async fn write_data_to_epc(&mut self, password: &AccessPassword, epc: &str) -> Result<bool> {
        let mut state = self.state();
        if !state.enter_open(MockCall::WriteEpc)? {
            return Ok(false);
        }
        let Ok(epc) = HexWords::new(epc) else {
            return Ok(false);
        };
        let Some(tag) = state.selected() else {
            return Ok(false);
        };
        if !tag.writable_with(password) {
            return Ok(false);
        }
        tag.set_epc(&epc.words());
        Ok(true)
    }

    async fn set_filter(&mut self, filter: &TagFilter) -> Result<bool> {
        let mut state = self.state();
        if !state.enter_open(MockCall::SetFilter)? {
            return Ok(false);
        }
        state.filter = filter.is_enabled().then(|| filter.clone());
        Ok(true)
    }

    async fn lock_mem(&mut self, password: &AccessPassword, code: &LockCode) -> Result<bool> {
        let mut state = self.state();
        if !state.enter_open(MockCall::LockMem)? {
            return Ok(false);
        }
        let Some(tag) = state.selected() else {
            return Ok(false);
        };
        if !tag.authorizes(password) {
            return Ok(false);
        }
        tag.locked = Some(code.clone());
        Ok(true)
    }

    async fn kill_tag(&mut self, kill_password: &AccessPassword) -> Result<bool> {
        let mut state = self.state();
        if !state.enter_open(MockCall::KillTag)? {
            return Ok(false);
        }
        let Some(tag) = state.selected() else {
            return Ok(false);
        };
        let stored = tag.kill_password();
        if stored.is_zero() || stored != *kill_password {
            return Ok(false);
        }
        let epc = tag.epc_hex();
        state.field.retain(|tag| tag.epc_hex() != epc);
        Ok(true)
    }

    async fn set_inventory_mode(&mut self, mode: InventoryMode) -> Result<bool> {
        let mut state = self.state();
        if !state.enter_open(MockCall::SetInventoryMode)? {
            return Ok(false);
        }
        state.mode = mode;
        Ok(true)
    }

    async fn inventory_mode(&self) -> Result<Option<InventoryMode>> {
        let mut state = self.state();
        if !state.enter_open(MockCall::InventoryMode)? {
            return Ok(None);
        }
        Ok(Some(state.mode))
    }
}

/// Handle for controlling a mock UHF reader.
///
/// Cloning the handle shares the same simulated module.
#[derive(Clone)]
pub struct MockUhfHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockUhfHandle {
    fn state(&self) -> MutexGuard<'_, MockState> {
        lock(&self.state)
    }

    /// Place a tag in the RF field.
    pub fn add_tag(&self, tag: SimulatedTag) {
        self.state().field.push(tag);
    }

    /// Remove the tag with the given EPC from the field.
    pub fn remove_tag(&self, epc: &str) -> bool {
        let mut state = self.state();
        let before = state.field.len();
        state.field.retain(|tag| !tag.epc_hex().eq_ignore_ascii_case(epc));
        state.field.len() != before
    }

    pub fn clear_field(&self) {
        self.state().field.clear();
    }

    pub fn tag_count(&self) -> usize {
        self.state().field.len()
    }

    /// Snapshot of the tag with the given EPC.
    pub fn tag(&self, epc: &str) -> Option<SimulatedTag> {
        self.state()
            .field
            .iter()
            .find(|tag| tag.epc_hex().eq_ignore_ascii_case(epc))
            .cloned()
    }

    /// Run one continuous-inventory round: the registered callback is invoked
    /// once per visible tag, on the calling thread.
    ///
    /// Returns the number of reports delivered; zero when inventory is not
    /// running or no callback is registered.
    pub fn run_inventory_round(&self) -> usize {
        let (callback, reports) = {
            let state = self.state();
            let Some(callback) = state.callback.clone() else {
                return 0;
            };
            if !state.inventorying {
                return 0;
            }
            let mode = state.mode;
            let reports: Vec<RawTagInfo> = state.visible().map(|tag| tag.report(mode)).collect();
            (callback, reports)
        };

        let delivered = reports.len();
        debug!("Mock inventory round: {} report(s)", delivered);
        for report in reports {
            callback(report);
        }
        delivered
    }

    /// Deliver an arbitrary report through the registered callback.
    pub fn deliver_raw(&self, report: RawTagInfo) -> bool {
        let callback = self.state().callback.clone();
        match callback {
            Some(callback) => {
                callback(report);
                true
            }
            None => false,
        }
    }

    /// Make every subsequent `call` produce `fault`.
    pub fn fail(&self, call: MockCall, fault: MockFault) {
        self.state().faults.insert(call, fault);
    }

    pub fn clear_faults(&self) {
        self.state().faults.clear();
    }

    /// Result the module reports on `init`.
    pub fn set_init_result(&self, result: bool) {
        self.state().init_result = result;
    }

    pub fn set_version(&self, version: Option<String>) {
        self.state().version = version;
    }

    /// Number of times `call` reached the driver.
    pub fn call_count(&self, call: MockCall) -> usize {
        self.state().calls.get(&call).copied().unwrap_or(0)
    }

    /// Total driver calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.state().calls.values().sum()
    }

    pub fn is_initialized(&self) -> bool {
        self.state().initialized
    }

    pub fn is_inventorying(&self) -> bool {
        self.state().inventorying
    }

    pub fn power(&self) -> u8 {
        self.state().power
    }

    pub fn filter(&self) -> Option<TagFilter> {
        self.state().filter.clone()
    }
}

impl std::fmt::Debug for MockUhfHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockUhfHandle").finish_non_exhaustive()
    }
}
