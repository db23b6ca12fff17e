//! Bridge configuration.
//!
//! # Example
//!
//! ```
//! use uhf_bridge::BridgeConfig;
//!
//! let config = BridgeConfig::from_json_str(r#"{ "event_queue_capacity": 64 }"#).unwrap();
//! assert_eq!(config.event_queue_capacity, 64);
//! assert_eq!(config.trigger_key_codes, vec![139, 280, 293]);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uhf_core::constants::{DEFAULT_EVENT_QUEUE_CAPACITY, DEFAULT_TRIGGER_KEY_CODES};
use uhf_core::{Error, Result};

/// Configuration for the bridge.
///
/// Every field has a default, so a partial (or empty) JSON document is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Bound of the queue between hardware callbacks and listener dispatch.
    pub event_queue_capacity: usize,

    /// Key codes treated as the physical trigger.
    pub trigger_key_codes: Vec<u32>,

    /// Stop a running inventory (emitting `inventory-stop`) before `free`.
    pub stop_inventory_on_free: bool,

    /// Reject `startInventory` while an inventory is already running.
    pub reject_start_while_inventorying: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
            trigger_key_codes: DEFAULT_TRIGGER_KEY_CODES.to_vec(),
            stop_inventory_on_free: true,
            reject_start_while_inventorying: true,
        }
    }
}

impl BridgeConfig {
    /// Parse and validate a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the document is malformed or invalid.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Invalid bridge configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file cannot be read or is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading bridge configuration from {}", path.display());

        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::config(format!("Cannot read {}: {e}", path.display())))?;
        Self::from_json_str(&json)
    }

    /// # Errors
    ///
    /// Returns `Error::Config` for a zero queue capacity or an empty trigger
    /// key list.
    pub fn validate(&self) -> Result<()> {
        if self.event_queue_capacity == 0 {
            return Err(Error::config("event_queue_capacity must be greater than 0"));
        }
        if self.trigger_key_codes.is_empty() {
            return Err(Error::config("trigger_key_codes cannot be empty"));
        }
        Ok(())
    }

    /// Whether `code` is one of the configured trigger keys.
    pub fn is_trigger_key(&self, code: u32) -> bool {
        self.trigger_key_codes.contains(&code)
    }
}
