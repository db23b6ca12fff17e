//! Data types exchanged with reader drivers.

use std::sync::Arc;

/// Tag report as delivered by the vendor SDK.
///
/// Every field the module did not fill is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTagInfo {
    pub epc: Option<String>,
    pub tid: Option<String>,
    pub user: Option<String>,
    pub rssi: Option<String>,
    pub count: u32,
}

impl RawTagInfo {
    /// Create a report carrying only an EPC.
    pub fn with_epc(epc: impl Into<String>) -> Self {
        Self {
            epc: Some(epc.into()),
            count: 1,
            ..Self::default()
        }
    }
}

/// Callback invoked by the driver for every tag seen during continuous
/// inventory. Drivers may call it from any thread.
pub type InventoryCallback = Arc<dyn Fn(RawTagInfo) + Send + Sync>;

/// Physical key transition reported by the platform key hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Key pressed. `repeat` counts auto-repeat events (0 for the first press).
    Down { code: u32, repeat: u32 },

    /// Key released.
    Up { code: u32 },
}

impl KeyAction {
    /// First press of a key.
    pub fn press(code: u32) -> Self {
        Self::Down { code, repeat: 0 }
    }

    pub fn release(code: u32) -> Self {
        Self::Up { code }
    }

    pub fn code(&self) -> u32 {
        match self {
            Self::Down { code, .. } | Self::Up { code } => *code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_tag_with_epc() {
        let raw = RawTagInfo::with_epc("E200");
        assert_eq!(raw.epc.as_deref(), Some("E200"));
        assert_eq!(raw.tid, None);
        assert_eq!(raw.count, 1);
    }

    #[test]
    fn test_key_action_code() {
        assert_eq!(KeyAction::press(293).code(), 293);
        assert_eq!(KeyAction::release(139).code(), 139);
        assert_eq!(KeyAction::press(280), KeyAction::Down { code: 280, repeat: 0 });
    }
}
