use crate::{
    Result,
    constants::{BITS_PER_WORD, DEFAULT_ACCESS_PASSWORD, HEX_DIGITS_PER_WORD, PASSWORD_HEX_LEN},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Gen-2 tag memory bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemoryBank {
    /// Kill and access passwords.
    Reserved,
    /// CRC, protocol control word and the EPC.
    Epc,
    /// Factory-programmed tag identifier.
    Tid,
    /// User memory.
    User,
}

impl MemoryBank {
    pub const ALL: [MemoryBank; 4] = [Self::Reserved, Self::Epc, Self::Tid, Self::User];

    /// Create from the SDK bank code (0-3).
    ///
    /// # Errors
    /// Returns `Error::Validation` for codes above 3.
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(Self::Reserved),
            1 => Ok(Self::Epc),
            2 => Ok(Self::Tid),
            3 => Ok(Self::User),
            _ => Err(Error::validation(format!("Invalid memory bank: {code}"))),
        }
    }

    /// SDK bank code.
    #[must_use]
    pub fn code(&self) -> u8 {
        match self {
            Self::Reserved => 0,
            Self::Epc => 1,
            Self::Tid => 2,
            Self::User => 3,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reserved => "RESERVED",
            Self::Epc => "EPC",
            Self::Tid => "TID",
            Self::User => "USER",
        }
    }
}

impl fmt::Display for MemoryBank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for MemoryBank {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MemoryBank::ALL
            .into_iter()
            .find(|bank| bank.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::validation(format!("Unknown memory bank: {s}")))
    }
}

/// Regulatory frequency region supported by the reader module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrequencyRegion {
    /// 840-845 MHz.
    #[serde(rename = "CHINA_840")]
    China840,
    /// 920-925 MHz.
    #[serde(rename = "CHINA_920")]
    China920,
    /// 865-868 MHz.
    #[serde(rename = "EUROPE")]
    Europe,
    /// 902-928 MHz.
    #[serde(rename = "USA")]
    Usa,
    /// 917-923 MHz.
    #[serde(rename = "KOREA")]
    Korea,
    /// 916-921 MHz.
    #[serde(rename = "JAPAN")]
    Japan,
}

impl FrequencyRegion {
    pub const ALL: [FrequencyRegion; 6] = [
        Self::China840,
        Self::China920,
        Self::Europe,
        Self::Usa,
        Self::Korea,
        Self::Japan,
    ];

    /// Create from the module's frequency mode code.
    ///
    /// # Errors
    /// Returns `Error::Validation` if the code is not one of the known regions.
    pub fn from_code(code: u8) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|region| region.code() == code)
            .ok_or_else(|| Error::validation(format!("Invalid frequency mode: 0x{code:02X}")))
    }

    /// Frequency mode code understood by the reader module.
    #[must_use]
    pub fn code(&self) -> u8 {
        match self {
            Self::China840 => 0x01,
            Self::China920 => 0x02,
            Self::Europe => 0x04,
            Self::Usa => 0x08,
            Self::Korea => 0x16,
            Self::Japan => 0x32,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::China840 => "CHINA_840",
            Self::China920 => "CHINA_920",
            Self::Europe => "EUROPE",
            Self::Usa => "USA",
            Self::Korea => "KOREA",
            Self::Japan => "JAPAN",
        }
    }

    /// Human-readable band.
    #[must_use]
    pub fn band(&self) -> &'static str {
        match self {
            Self::China840 => "840-845 MHz",
            Self::China920 => "920-925 MHz",
            Self::Europe => "865-868 MHz",
            Self::Usa => "902-928 MHz",
            Self::Korea => "917-923 MHz",
            Self::Japan => "916-921 MHz",
        }
    }
}

impl fmt::Display for FrequencyRegion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for FrequencyRegion {
    type Err = Error;

    /// Accepts region names case-insensitively, with `-` or `_` separators.
    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().replace('-', "_");
        FrequencyRegion::ALL
            .into_iter()
            .find(|region| region.name().eq_ignore_ascii_case(&normalized))
            .ok_or_else(|| Error::validation(format!("Unknown frequency region: {s}")))
    }
}

/// Which memory banks the reader reports for each inventoried tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryMode {
    /// EPC only; `tid` and `user` are reported empty.
    #[default]
    EpcOnly,
    /// EPC and TID; `user` is reported empty.
    EpcAndTid,
    /// EPC, TID and a window of USER memory (in words).
    EpcTidUser { user_ptr: u32, user_len: u32 },
}

impl InventoryMode {
    #[must_use]
    pub fn includes_tid(&self) -> bool {
        !matches!(self, Self::EpcOnly)
    }

    #[must_use]
    pub fn includes_user(&self) -> bool {
        matches!(self, Self::EpcTidUser { .. })
    }
}

/// 32-bit access or kill password (8 hex digits).
///
/// # Security
/// Equality uses constant-time comparison.
#[derive(Clone, Eq)]
pub struct AccessPassword(String);

impl AccessPassword {
    /// Create a password from its hex form.
    ///
    /// # Errors
    /// Returns `Error::Validation` unless the input is exactly 8 hex digits.
    pub fn new(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        if hex.len() != PASSWORD_HEX_LEN || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::validation(format!(
                "Password must be {PASSWORD_HEX_LEN} hex digits, got {hex:?}"
            )));
        }
        Ok(AccessPassword(hex.to_ascii_uppercase()))
    }

    /// The all-zero password (no password set).
    #[must_use]
    pub fn zero() -> Self {
        AccessPassword(DEFAULT_ACCESS_PASSWORD.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.bytes().all(|b| b == b'0')
    }

    /// The password as its two memory words.
    #[must_use]
    pub fn words(&self) -> [u16; 2] {
        let high = u16::from_str_radix(&self.0[..4], 16).unwrap_or_default();
        let low = u16::from_str_radix(&self.0[4..], 16).unwrap_or_default();
        [high, low]
    }
}

impl PartialEq for AccessPassword {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl fmt::Debug for AccessPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessPassword(********)")
    }
}

impl std::str::FromStr for AccessPassword {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AccessPassword::new(s)
    }
}

/// Word-aligned hex data destined for tag memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HexWords(String);

impl HexWords {
    /// Validate hex data for a memory write.
    ///
    /// # Errors
    /// Returns `Error::Validation` if the data is empty, not hex, or not a
    /// whole number of 16-bit words.
    pub fn new(hex: &str) -> Result<Self> {
        let hex = hex.trim();
        if hex.is_empty() {
            return Err(Error::validation("Data must not be empty"));
        }
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::validation(format!("Data must be hex, got {hex:?}")));
        }
        if hex.len() % HEX_DIGITS_PER_WORD != 0 {
            return Err(Error::validation(format!(
                "Data must be whole words ({HEX_DIGITS_PER_WORD} hex digits each), got {} digits",
                hex.len()
            )));
        }
        Ok(HexWords(hex.to_ascii_uppercase()))
    }

    /// Build from raw words.
    #[must_use]
    pub fn from_words(words: &[u16]) -> Self {
        HexWords(words.iter().map(|w| format!("{w:04X}")).collect())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn word_count(&self) -> usize {
        self.0.len() / HEX_DIGITS_PER_WORD
    }

    #[must_use]
    pub fn words(&self) -> Vec<u16> {
        hex::decode(&self.0)
            .unwrap_or_default()
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect()
    }
}

impl fmt::Display for HexWords {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lock payload produced by the SDK's lock code generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockCode(String);

impl LockCode {
    /// # Errors
    /// Returns `Error::Validation` if the code is empty or not hex.
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::validation(format!(
                "Lock code must be non-empty hex, got {code:?}"
            )));
        }
        Ok(LockCode(code.to_ascii_uppercase()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Inventory filter: only tags whose `bank` bits `[ptr, ptr + cnt)` equal
/// the leading `cnt` bits of `data` are reported.
///
/// A filter with `cnt == 0` matches every tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    bank: MemoryBank,
    ptr: u32,
    cnt: u32,
    data: String,
}

impl TagFilter {
    /// # Errors
    /// Returns `Error::Validation` if `data` is not whole-byte hex or holds
    /// fewer than `cnt` bits.
    pub fn new(bank: MemoryBank, ptr: u32, cnt: u32, data: &str) -> Result<Self> {
        let data = data.trim();
        let bytes = hex::decode(data)
            .map_err(|e| Error::validation(format!("Filter data must be hex: {e}")))?;
        let available = bytes.len() as u64 * 8;
        if u64::from(cnt) > available {
            return Err(Error::validation(format!(
                "Filter length {cnt} bits exceeds pattern ({available} bits)"
            )));
        }
        Ok(TagFilter {
            bank,
            ptr,
            cnt,
            data: data.to_ascii_uppercase(),
        })
    }

    /// A filter that matches every tag.
    #[must_use]
    pub fn disabled() -> Self {
        TagFilter {
            bank: MemoryBank::Epc,
            ptr: 0,
            cnt: 0,
            data: String::new(),
        }
    }

    #[must_use]
    pub fn bank(&self) -> MemoryBank {
        self.bank
    }

    /// Start offset in bits.
    #[must_use]
    pub fn ptr(&self) -> u32 {
        self.ptr
    }

    /// Length in bits.
    #[must_use]
    pub fn cnt(&self) -> u32 {
        self.cnt
    }

    /// Pattern as upper-case hex.
    #[must_use]
    pub fn data(&self) -> &str {
        &self.data
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.cnt > 0
    }

    /// Check a bank's contents against the filter pattern.
    #[must_use]
    pub fn matches(&self, bank_words: &[u16]) -> bool {
        if !self.is_enabled() {
            return true;
        }
        let Ok(pattern) = hex::decode(&self.data) else {
            return false;
        };
        let end = u64::from(self.ptr) + u64::from(self.cnt);
        if end > bank_words.len() as u64 * u64::from(BITS_PER_WORD) {
            return false;
        }

        // A deserialized filter may carry a pattern shorter than `cnt`
        if u64::from(self.cnt) > pattern.len() as u64 * 8 {
            return false;
        }

        (0..self.cnt).all(|i| {
            let bit = self.ptr + i;
            let (Some(word), Some(byte)) = (
                bank_words.get((bit / BITS_PER_WORD) as usize),
                pattern.get((i / 8) as usize),
            ) else {
                return false;
            };
            let tag_bit = (word >> (BITS_PER_WORD - 1 - bit % BITS_PER_WORD)) & 1;
            let pattern_bit = (byte >> (7 - i % 8)) & 1;
            tag_bit == u16::from(pattern_bit)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, MemoryBank::Reserved)]
    #[case(1, MemoryBank::Epc)]
    #[case(2, MemoryBank::Tid)]
    #[case(3, MemoryBank::User)]
    fn test_memory_bank_codes(#[case] code: u8, #[case] bank: MemoryBank) {
        assert_eq!(MemoryBank::from_code(code).unwrap(), bank);
        assert_eq!(bank.code(), code);
    }

    #[test]
    fn test_memory_bank_invalid() {
        assert!(MemoryBank::from_code(4).is_err());
        assert_eq!("tid".parse::<MemoryBank>().unwrap(), MemoryBank::Tid);
        assert!("flash".parse::<MemoryBank>().is_err());
    }

    #[rstest]
    #[case(0x01, FrequencyRegion::China840)]
    #[case(0x02, FrequencyRegion::China920)]
    #[case(0x04, FrequencyRegion::Europe)]
    #[case(0x08, FrequencyRegion::Usa)]
    #[case(0x16, FrequencyRegion::Korea)]
    #[case(0x32, FrequencyRegion::Japan)]
    fn test_frequency_region_codes(#[case] code: u8, #[case] region: FrequencyRegion) {
        assert_eq!(FrequencyRegion::from_code(code).unwrap(), region);
        assert_eq!(region.code(), code);
    }

    #[rstest]
    #[case("usa", FrequencyRegion::Usa)]
    #[case("china-840", FrequencyRegion::China840)]
    #[case("CHINA_920", FrequencyRegion::China920)]
    fn test_frequency_region_parse(#[case] input: &str, #[case] expected: FrequencyRegion) {
        assert_eq!(input.parse::<FrequencyRegion>().unwrap(), expected);
    }

    #[test]
    fn test_frequency_region_unknown_code() {
        assert!(FrequencyRegion::from_code(0x03).is_err());
    }

    #[test]
    fn test_frequency_region_serialization() {
        let json = serde_json::to_string(&FrequencyRegion::China840).unwrap();
        assert_eq!(json, "\"CHINA_840\"");
    }

    #[test]
    fn test_inventory_mode_banks() {
        assert!(!InventoryMode::EpcOnly.includes_tid());
        assert!(InventoryMode::EpcAndTid.includes_tid());
        assert!(!InventoryMode::EpcAndTid.includes_user());
        let mode = InventoryMode::EpcTidUser {
            user_ptr: 0,
            user_len: 2,
        };
        assert!(mode.includes_tid() && mode.includes_user());
    }

    #[rstest]
    #[case("00000000")]
    #[case("12345678")]
    #[case("deadBEEF")]
    fn test_access_password_valid(#[case] input: &str) {
        let password = AccessPassword::new(input).unwrap();
        assert_eq!(password.as_str(), input.to_ascii_uppercase());
    }

    #[rstest]
    #[case("")]
    #[case("1234567")]
    #[case("123456789")]
    #[case("1234567G")]
    fn test_access_password_invalid(#[case] input: &str) {
        assert!(AccessPassword::new(input).unwrap_err().is_validation());
    }

    #[test]
    fn test_access_password_words_and_zero() {
        let password = AccessPassword::new("DEADBEEF").unwrap();
        assert_eq!(password.words(), [0xDEAD, 0xBEEF]);
        assert!(!password.is_zero());
        assert!(AccessPassword::zero().is_zero());
        assert_eq!(password, AccessPassword::new("deadbeef").unwrap());
        assert_eq!(format!("{password:?}"), "AccessPassword(********)");
    }

    #[test]
    fn test_hex_words() {
        let data = HexWords::new("e2003412abcd").unwrap();
        assert_eq!(data.as_str(), "E2003412ABCD");
        assert_eq!(data.word_count(), 3);
        assert_eq!(data.words(), vec![0xE200, 0x3412, 0xABCD]);
        assert_eq!(HexWords::from_words(&[0x0001, 0xFFFF]).as_str(), "0001FFFF");
    }

    #[rstest]
    #[case("")]
    #[case("ABC")]
    #[case("ABCDEF")]
    #[case("XYZW")]
    fn test_hex_words_invalid(#[case] input: &str) {
        assert!(HexWords::new(input).is_err());
    }

    #[test]
    fn test_lock_code() {
        assert_eq!(LockCode::new("0c0300").unwrap().as_str(), "0C0300");
        assert!(LockCode::new("").is_err());
        assert!(LockCode::new("lock").is_err());
    }

    #[test]
    fn test_filter_matches_bit_range() {
        // CRC, PC, then EPC E200 3412
        let bank = [0x1234, 0x3000, 0xE200, 0x3412];
        let filter = TagFilter::new(MemoryBank::Epc, 32, 16, "E200").unwrap();
        assert!(filter.matches(&bank));

        let filter = TagFilter::new(MemoryBank::Epc, 32, 12, "E20F").unwrap();
        assert!(filter.matches(&bank));

        let filter = TagFilter::new(MemoryBank::Epc, 32, 16, "E201").unwrap();
        assert!(!filter.matches(&bank));
    }

    #[test]
    fn test_filter_out_of_range_and_disabled() {
        let bank = [0x0000, 0x3000];
        let filter = TagFilter::new(MemoryBank::Epc, 32, 8, "E2").unwrap();
        assert!(!filter.matches(&bank));
        assert!(TagFilter::disabled().matches(&bank));
        assert!(!TagFilter::disabled().is_enabled());
    }

    #[test]
    fn test_filter_rejects_short_pattern() {
        assert!(TagFilter::new(MemoryBank::Epc, 32, 24, "E200").is_err());
        assert!(TagFilter::new(MemoryBank::Epc, 32, 8, "E").is_err());
    }

    #[test]
    fn test_filter_with_short_pattern_never_matches() {
        let bank = [0x0000, 0x0000];
        let filter = TagFilter {
            bank: MemoryBank::Epc,
            ptr: 0,
            cnt: 16,
            data: String::new(),
        };
        assert!(!filter.matches(&bank));

        let filter: TagFilter = serde_json::from_str(
            r#"{ "bank": "EPC", "ptr": 0, "cnt": 24, "data": "0000" }"#,
        )
        .unwrap();
        assert_eq!(filter.cnt(), 24);
        assert!(!filter.matches(&bank));
    }

    #[test]
    fn test_filter_accessors() {
        let filter = TagFilter::new(MemoryBank::Tid, 8, 16, "e280").unwrap();
        assert_eq!(filter.bank(), MemoryBank::Tid);
        assert_eq!(filter.ptr(), 8);
        assert_eq!(filter.cnt(), 16);
        assert_eq!(filter.data(), "E280");
    }
}
