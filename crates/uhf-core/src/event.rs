//! Event names, payloads, and the constants published to the application layer.

use crate::constants::{MAX_POWER, MIN_POWER};
use crate::tag::TagRecord;
use crate::types::{FrequencyRegion, MemoryBank};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Named event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    TagRead,
    InventoryStart,
    InventoryStop,
    TriggerPress,
    TriggerRelease,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        Self::TagRead,
        Self::InventoryStart,
        Self::InventoryStop,
        Self::TriggerPress,
        Self::TriggerRelease,
    ];

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::TagRead => "tag-read",
            Self::InventoryStart => "inventory-start",
            Self::InventoryStop => "inventory-stop",
            Self::TriggerPress => "trigger-press",
            Self::TriggerRelease => "trigger-release",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An emission on one of the event channels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "kebab-case")]
pub enum BridgeEvent {
    TagRead(TagRecord),
    InventoryStart,
    InventoryStop,
    TriggerPress,
    TriggerRelease,
}

impl BridgeEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::TagRead(_) => EventKind::TagRead,
            Self::InventoryStart => EventKind::InventoryStart,
            Self::InventoryStop => EventKind::InventoryStop,
            Self::TriggerPress => EventKind::TriggerPress,
            Self::TriggerRelease => EventKind::TriggerRelease,
        }
    }

    #[must_use]
    pub fn tag(&self) -> Option<&TagRecord> {
        match self {
            Self::TagRead(tag) => Some(tag),
            _ => None,
        }
    }
}

/// Constants published once to the application layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Constants {
    pub memory_banks: [MemoryBank; 4],
    pub frequency_regions: [FrequencyRegion; 6],
    pub events: [EventKind; 5],
    pub min_power: u8,
    pub max_power: u8,
}

impl Constants {
    pub const PUBLISHED: Constants = Constants {
        memory_banks: MemoryBank::ALL,
        frequency_regions: FrequencyRegion::ALL,
        events: EventKind::ALL,
        min_power: MIN_POWER,
        max_power: MAX_POWER,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_names() {
        let names: Vec<&str> = EventKind::ALL.iter().map(EventKind::name).collect();
        assert_eq!(
            names,
            vec![
                "tag-read",
                "inventory-start",
                "inventory-stop",
                "trigger-press",
                "trigger-release"
            ]
        );
    }

    #[test]
    fn test_event_kind_of_payload() {
        let tag = TagRecord::builder("E200").build().unwrap();
        let event = BridgeEvent::TagRead(tag.clone());
        assert_eq!(event.kind(), EventKind::TagRead);
        assert_eq!(event.tag(), Some(&tag));
        assert_eq!(BridgeEvent::TriggerPress.tag(), None);
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(BridgeEvent::InventoryStop).unwrap();
        assert_eq!(json["event"], "inventory-stop");
    }

    #[test]
    fn test_published_constants() {
        let constants = Constants::PUBLISHED;
        assert_eq!(constants.memory_banks.len(), 4);
        assert_eq!(constants.frequency_regions.len(), 6);
        assert_eq!((constants.min_power, constants.max_power), (0, 30));
        let json = serde_json::to_value(&constants).unwrap();
        assert_eq!(json["frequencyRegions"][0], "CHINA_840");
        assert_eq!(json["memoryBanks"][0], "RESERVED");
    }
}
