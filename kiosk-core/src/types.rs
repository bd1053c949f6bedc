//! Base types, configuration constants and error codes.

use core::fmt::Write as _;

// ============================================================================
// Configuration Constants
// ============================================================================

/// Maximum number of cards the registry will hold
pub const MAX_CARDS: usize = 50;

/// Maximum raw UID length read from a tag, in bytes
pub const UID_RAW_MAX: usize = 10;

/// Maximum encoded UID length (two hex digits per raw byte)
pub const UID_HEX_MAX: usize = UID_RAW_MAX * 2;

/// Maximum card holder name length
pub const NAME_MAX: usize = 30;

/// Maximum number of charger slots in a pool
pub const MAX_SLOTS: usize = 8;

/// How long a slot may stay granted before the sweep reclaims it (90 seconds)
pub const MAX_HOLD_MS: TimeMs = 90_000;

/// Dwell time of the success / full-notice pages (10 seconds)
pub const WARNING_TIMEOUT_MS: TimeMs = 10_000;

/// Dwell time of the scan-accepted / scan-rejected pages (2 seconds)
pub const NOTICE_TIMEOUT_MS: TimeMs = 2_000;

/// Settle delay before the door lock is energized (100 ms)
pub const DOOR_SETTLE_MS: u32 = 100;

// ============================================================================
// Basic Types
// ============================================================================

/// Timestamp in milliseconds, monotonically increasing
pub type TimeMs = u64;

/// Relay output channel identifier
pub type RelayId = u8;

/// Encoded card UID (lowercase hex, two digits per byte)
pub type Uid = heapless::String<UID_HEX_MAX>;

/// Card holder name, bounded
pub type Name = heapless::String<NAME_MAX>;

/// Encode raw UID bytes as the working UID string.
///
/// Two lowercase hex digits per byte, in the order read. Bytes beyond
/// [`UID_RAW_MAX`] are dropped so the result always fits. Scanning the same
/// tag twice yields the same string.
pub fn encode_uid(bytes: &[u8]) -> Uid {
    let mut uid = Uid::new();
    for b in bytes.iter().take(UID_RAW_MAX) {
        // Cannot fail: capacity is two chars per accepted byte
        let _ = write!(uid, "{:02x}", b);
    }
    uid
}

/// Copy a string into a bounded buffer, dropping what does not fit.
pub(crate) fn truncated<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for ch in s.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

// ============================================================================
// Error Types
// ============================================================================

/// Result type for kiosk core operations
pub type Result<T> = core::result::Result<T, Error>;

/// Error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
pub enum Error {
    /// Invalid argument provided
    InvalidArg,
    /// Out of memory
    NoMemory,
    /// Slot is already granted
    Occupied,
    /// Slot is already free
    Vacant,
    /// Card already holds a slot
    AlreadyExists,
}

// ============================================================================
// Kiosk Pages
// ============================================================================

/// One discrete kiosk screen.
///
/// The current page is both the display selector and the discriminant of the
/// session state machine. Exactly one page is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
pub enum Page {
    /// Idle, waiting for a card scan
    #[default]
    ScanWait,
    /// Card recognized, short notice before branching
    ScanAccepted,
    /// Card unknown, short notice before returning to idle
    ScanRejected,
    /// Charger slot selection menu
    SlotPicker,
    /// Confirm granting the selected slot
    EnableConfirm,
    /// Slot granted
    EnableSuccess,
    /// Waiting for the battery compartment door to close
    DoorWait,
    /// Confirm releasing the held slot
    DisableConfirm,
    /// Slot released
    DisableSuccess,
    /// Every slot is taken
    SlotFull,
    /// Goodbye screen, driven externally
    Logout,
}

// ============================================================================
// Input Events
// ============================================================================

/// Panel button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
pub enum Button {
    /// Left button (advance / confirm)
    Left,
    /// Center button (select)
    Center,
    /// Right button (retreat / cancel)
    Right,
}

// ============================================================================
// Slot Actions
// ============================================================================

/// The slot operation a confirm or door page refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
pub enum SlotAction {
    /// Granting the slot at this index
    Enable(usize),
    /// Releasing the slot at this index
    Disable(usize),
}

impl SlotAction {
    /// Index of the slot the action refers to
    pub fn slot(&self) -> usize {
        match *self {
            SlotAction::Enable(i) | SlotAction::Disable(i) => i,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_uid_padding() {
        assert_eq!(encode_uid(&[0x04, 0xa1, 0xb2]).as_str(), "04a1b2");
        assert_eq!(encode_uid(&[0x00, 0x0f]).as_str(), "000f");
    }

    #[test]
    fn test_encode_uid_deterministic() {
        let bytes = [0xde, 0xad, 0xbe, 0xef];
        assert_eq!(encode_uid(&bytes), encode_uid(&bytes));
    }

    #[test]
    fn test_encode_uid_bounded() {
        let long = [0xaa_u8; 16];
        let uid = encode_uid(&long);
        assert_eq!(uid.len(), UID_HEX_MAX);
    }

    #[test]
    fn test_truncated() {
        let s: heapless::String<4> = truncated("abcdef");
        assert_eq!(s.as_str(), "abcd");
    }
}
