//! Enum wrappers for driver dispatch.
//!
//! Native `async fn` in traits (RPITIT, Edition 2024) is not object-safe, so
//! `Box<dyn UhfReader>` is not available. These enums provide concrete type
//! dispatch instead, and are the types the bridge is usually instantiated with.
//!
//! # Examples
//!
//! ```
//! use uhf_hardware::devices::AnyUhfReader;
//! use uhf_hardware::mock::MockUhfReader;
//!
//! let (reader, _handle) = MockUhfReader::new();
//! let any_reader = AnyUhfReader::Mock(reader);
//! ```

use crate::mock::{MockKeySource, MockUhfReader};
use crate::traits::{KeySource, UhfReader};
use crate::types::{InventoryCallback, KeyAction, RawTagInfo};
use crate::Result;
use uhf_core::{AccessPassword, InventoryMode, LockCode, MemoryBank, TagFilter};

/// Enum wrapper for UHF reader dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyUhfReader {
    /// Simulated module for development and testing.
    Mock(MockUhfReader),
    // TODO: add a `Uart` variant behind `hardware-uart` once the vendor
    // SDK's JNI surface is bound.
}

impl UhfReader for AnyUhfReader {
    async fn init(&mut self) -> Result<bool> {
        match self {
            Self::Mock(reader) => reader.init().await,
        }
    }

    async fn free(&mut self) -> Result<bool> {
        match self {
            Self::Mock(reader) => reader.free().await,
        }
    }

    async fn version(&self) -> Result<Option<String>> {
        match self {
            Self::Mock(reader) => reader.version().await,
        }
    }

    async fn set_power(&mut self, power: u8) -> Result<bool> {
        match self {
            Self::Mock(reader) => reader.set_power(power).await,
        }
    }

    async fn power(&self) -> Result<i32> {
        match self {
            Self::Mock(reader) => reader.power().await,
        }
    }

    async fn set_frequency_mode(&mut self, code: u8) -> Result<bool> {
        match self {
            Self::Mock(reader) => reader.set_frequency_mode(code).await,
        }
    }

    async fn frequency_mode(&self) -> Result<i32> {
        match self {
            Self::Mock(reader) => reader.frequency_mode().await,
        }
    }

    fn set_inventory_callback(&mut self, callback: InventoryCallback) {
        match self {
            Self::Mock(reader) => reader.set_inventory_callback(callback),
        }
    }

    async fn start_inventory_tag(&mut self) -> Result<bool> {
        match self {
            Self::Mock(reader) => reader.start_inventory_tag().await,
        }
    }

    async fn stop_inventory(&mut self) -> Result<bool> {
        match self {
            Self::Mock(reader) => reader.stop_inventory().await,
        }
    }

    async fn is_inventorying(&self) -> Result<bool> {
        match self {
            Self::Mock(reader) => reader.is_inventorying().await,
        }
    }

    async fn inventory_single_tag(&mut self) -> Result<Option<RawTagInfo>> {
        match self {
            Self::Mock(reader) => reader.inventory_single_tag().await,
        }
    }

    async fn read_data(
        &mut self,
        password: &AccessPassword,
        bank: MemoryBank,
        ptr: u32,
        cnt: u32,
    ) -> Result<Option<String>> {
        match self {
            Self::Mock(reader) => reader.read_data(password, bank, ptr, cnt).await,
        }
    }

    async fn write_data(
        &mut self,
        password: &AccessPassword,
        bank: MemoryBank,
        ptr: u32,
        cnt: u32,
        data: &str,
    ) -> Result<bool> {
        match self {
            Self::Mock(reader) => reader.write_data(password, bank, ptr, cnt, data).await,
        }
    }

    async fn write_data_to_epc(&mut self, password: &AccessPassword, epc: &str) -> Result<bool> {
        match self {
            Self::Mock(reader) => reader.write_data_to_epc(password, epc).await,
        }
    }

    async fn set_filter(&mut self, filter: &TagFilter) -> Result<bool> {
        match self {
            Self::Mock(reader) => reader.set_filter(filter).await,
        }
    }

    async fn lock_mem(&mut self, password: &AccessPassword, code: &LockCode) -> Result<bool> {
        match self {
            Self::Mock(reader) => reader.lock_mem(password, code).await,
        }
    }

    async fn kill_tag(&mut self, kill_password: &AccessPassword) -> Result<bool> {
        match self {
            Self::Mock(reader) => reader.kill_tag(kill_password).await,
        }
    }

    async fn set_inventory_mode(&mut self, mode: InventoryMode) -> Result<bool> {
        match self {
            Self::Mock(reader) => reader.set_inventory_mode(mode).await,
        }
    }

    async fn inventory_mode(&self) -> Result<Option<InventoryMode>> {
        match self {
            Self::Mock(reader) => reader.inventory_mode().await,
        }
    }
}

/// Enum wrapper for key source dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyKeySource {
    /// Simulated key hook for development and testing.
    Mock(MockKeySource),
}

impl KeySource for AnyKeySource {
    async fn next_key(&mut self) -> Result<KeyAction> {
        match self {
            Self::Mock(source) => source.next_key().await,
        }
    }
}
