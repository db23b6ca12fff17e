//! Tag read results.

use crate::{Result, error::Error};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tag observation, produced by a hardware callback or a single read.
///
/// `tid` and `user` are empty strings when the active inventory mode does
/// not report those banks. Identity for de-duplication is the `epc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagRecord {
    /// EPC as upper-case hex, never empty.
    pub epc: String,

    /// TID as upper-case hex, or empty.
    pub tid: String,

    /// USER memory window as upper-case hex, or empty.
    pub user: String,

    /// RSSI as reported by the module (e.g. `"-61.5"`).
    pub signal_strength: String,

    /// Number of times the tag was seen in this report (at least 1).
    pub read_count: u32,

    /// When the bridge received the report.
    pub read_at: DateTime<Utc>,
}

impl TagRecord {
    /// Create a builder for a tag with the given EPC.
    ///
    /// # Examples
    ///
    /// ```
    /// use uhf_core::TagRecord;
    ///
    /// let tag = TagRecord::builder("e2003412")
    ///     .tid("E2801170")
    ///     .signal_strength("-58.20")
    ///     .read_count(3)
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(tag.epc, "E2003412");
    /// assert_eq!(tag.user, "");
    /// ```
    pub fn builder(epc: impl Into<String>) -> TagRecordBuilder {
        TagRecordBuilder::new(epc)
    }

    /// Whether both records refer to the same physical tag.
    #[must_use]
    pub fn same_tag(&self, other: &TagRecord) -> bool {
        self.epc == other.epc
    }
}

/// Builder for [`TagRecord`].
#[derive(Debug, Clone)]
pub struct TagRecordBuilder {
    epc: String,
    tid: String,
    user: String,
    signal_strength: String,
    read_count: u32,
    read_at: Option<DateTime<Utc>>,
}

impl TagRecordBuilder {
    pub fn new(epc: impl Into<String>) -> Self {
        Self {
            epc: epc.into(),
            tid: String::new(),
            user: String::new(),
            signal_strength: String::new(),
            read_count: 1,
            read_at: None,
        }
    }

    pub fn tid(mut self, tid: impl Into<String>) -> Self {
        self.tid = tid.into();
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    pub fn signal_strength(mut self, rssi: impl Into<String>) -> Self {
        self.signal_strength = rssi.into();
        self
    }

    /// Set the read count. Zero is raised to 1.
    pub fn read_count(mut self, count: u32) -> Self {
        self.read_count = count.max(1);
        self
    }

    /// Set a custom timestamp. Defaults to now when `build()` is called.
    pub fn read_at(mut self, read_at: DateTime<Utc>) -> Self {
        self.read_at = Some(read_at);
        self
    }

    /// # Errors
    ///
    /// Returns `Error::Validation` if the EPC is empty or not hex.
    pub fn build(self) -> Result<TagRecord> {
        let epc = self.epc.trim();
        if epc.is_empty() {
            return Err(Error::validation("Tag EPC cannot be empty"));
        }
        if !epc.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::validation(format!("Tag EPC must be hex, got {epc:?}")));
        }

        Ok(TagRecord {
            epc: epc.to_ascii_uppercase(),
            tid: self.tid.trim().to_ascii_uppercase(),
            user: self.user.trim().to_ascii_uppercase(),
            signal_strength: self.signal_strength,
            read_count: self.read_count,
            read_at: self.read_at.unwrap_or_else(Utc::now),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_builder_defaults() {
        let tag = TagRecord::builder("E200").build().unwrap();
        assert_eq!(tag.epc, "E200");
        assert_eq!(tag.tid, "");
        assert_eq!(tag.user, "");
        assert_eq!(tag.read_count, 1);
    }

    #[test]
    fn test_builder_rejects_empty_epc() {
        assert!(TagRecord::builder("").build().is_err());
        assert!(TagRecord::builder("   ").build().is_err());
        assert!(TagRecord::builder("not-hex").build().is_err());
    }

    #[test]
    fn test_zero_read_count_is_raised() {
        let tag = TagRecord::builder("E200").read_count(0).build().unwrap();
        assert_eq!(tag.read_count, 1);
    }

    #[test]
    fn test_same_tag() {
        let a = TagRecord::builder("e200").read_count(1).build().unwrap();
        let b = TagRecord::builder("E200").read_count(4).build().unwrap();
        assert!(a.same_tag(&b));
    }

    #[test]
    fn test_camel_case_serialization() {
        let read_at = Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap();
        let tag = TagRecord::builder("E200")
            .signal_strength("-60.0")
            .read_count(2)
            .read_at(read_at)
            .build()
            .unwrap();

        let json = serde_json::to_value(&tag).unwrap();
        assert_eq!(json["epc"], "E200");
        assert_eq!(json["signalStrength"], "-60.0");
        assert_eq!(json["readCount"], 2);
        assert!(json.get("readAt").is_some());
    }
}
