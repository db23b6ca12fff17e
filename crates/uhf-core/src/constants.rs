//! Reader-level constants shared across the bridge.
//!
//! Values follow the EPC Class-1 Gen-2 memory layout and the limits of the
//! UART UHF module found in handheld readers.
//!
//! # Usage
//!
//! ```
//! use uhf_core::constants::*;
//!
//! fn power_is_valid(power: i32) -> bool {
//!     (MIN_POWER as i32..=MAX_POWER as i32).contains(&power)
//! }
//!
//! assert!(power_is_valid(30));
//! assert!(!power_is_valid(31));
//! ```

// ============================================================================
// Transmit Power
// ============================================================================

/// Lowest accepted transmit power (dBm).
pub const MIN_POWER: u8 = 0;

/// Highest accepted transmit power (dBm).
pub const MAX_POWER: u8 = 30;

// ============================================================================
// Tag Memory
// ============================================================================

/// Bits in one tag memory word.
pub const BITS_PER_WORD: u32 = 16;

/// Hex digits needed to represent one tag memory word.
pub const HEX_DIGITS_PER_WORD: usize = 4;

/// Hex digits in an access or kill password (32 bits).
pub const PASSWORD_HEX_LEN: usize = 8;

/// Password used when a tag has no access password set.
pub const DEFAULT_ACCESS_PASSWORD: &str = "00000000";

/// Word offset of the EPC itself inside the EPC bank (after CRC and PC).
pub const EPC_WORD_OFFSET: u32 = 2;

/// Bit offset of the EPC itself inside the EPC bank, for filters.
pub const EPC_BIT_OFFSET: u32 = EPC_WORD_OFFSET * BITS_PER_WORD;

/// Word offset of the kill password inside the reserved bank.
pub const KILL_PASSWORD_WORD_OFFSET: u32 = 0;

/// Word offset of the access password inside the reserved bank.
pub const ACCESS_PASSWORD_WORD_OFFSET: u32 = 2;

// ============================================================================
// Event Relay
// ============================================================================

/// Default bound of the queue between hardware callbacks and listeners.
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 1024;

/// Key codes emitted by the pistol-grip and side trigger buttons.
pub const DEFAULT_TRIGGER_KEY_CODES: [u32; 3] = [139, 280, 293];
