//! Hardware abstraction layer.
//!
//! The core never touches pins directly; everything physical goes through
//! this trait:
//! - Time measurement
//! - Charger relay outputs
//! - The door-lock actuator
//!
//! # Implementing a HAL
//!
//! ```ignore
//! struct BoardHal;
//!
//! impl Hal for BoardHal {
//!     fn time_ms(&self) -> TimeMs {
//!         // Read hardware timer
//!     }
//!
//!     fn relay_set(&mut self, relay: RelayId, on: bool) {
//!         // Drive the relay's GPIO
//!     }
//!
//!     // ... implement other methods
//! }
//! ```

use crate::types::*;

// ============================================================================
// HAL Trait
// ============================================================================

/// Hardware abstraction layer trait
///
/// Implement this for your target board (ESP32, STM32, etc.)
pub trait Hal {
    /// Get current time in milliseconds
    ///
    /// Must be monotonically increasing.
    fn time_ms(&self) -> TimeMs;

    /// Busy-wait delay
    ///
    /// Used once per door-lock arming; nothing else blocks.
    fn delay_ms(&self, ms: u32);

    /// Drive a charger relay output
    fn relay_set(&mut self, relay: RelayId, on: bool);

    /// Drive the battery-compartment door-lock actuator
    fn door_lock_set(&mut self, engaged: bool);

    /// Get platform name
    fn platform_name(&self) -> &'static str;
}

// ============================================================================
// Simulated HAL (for testing)
// ============================================================================

/// Number of relay channels the simulated HAL records
#[cfg(any(test, feature = "std"))]
const SIM_RELAY_COUNT: usize = MAX_SLOTS;

/// Simulated HAL for testing and host-side scenario playback
///
/// Keeps a virtual clock and records every actuator write so tests can
/// assert physical state against pool state.
#[cfg(any(test, feature = "std"))]
pub struct SimHal {
    time: core::sync::atomic::AtomicU64,
    relays: [bool; SIM_RELAY_COUNT],
    door_lock: bool,
}

#[cfg(any(test, feature = "std"))]
impl SimHal {
    /// Create a simulated HAL with the clock at zero
    pub fn new() -> Self {
        Self {
            time: core::sync::atomic::AtomicU64::new(0),
            relays: [false; SIM_RELAY_COUNT],
            door_lock: false,
        }
    }

    /// Advance the virtual clock
    pub fn advance(&self, ms: TimeMs) {
        self.time
            .fetch_add(ms, core::sync::atomic::Ordering::SeqCst);
    }

    /// Recorded state of one relay channel
    pub fn relay(&self, relay: RelayId) -> bool {
        self.relays
            .get(relay as usize)
            .copied()
            .unwrap_or(false)
    }

    /// Recorded state of the door-lock actuator
    pub fn door_lock(&self) -> bool {
        self.door_lock
    }
}

#[cfg(any(test, feature = "std"))]
impl Default for SimHal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "std"))]
impl Hal for SimHal {
    fn time_ms(&self) -> TimeMs {
        self.time.load(core::sync::atomic::Ordering::SeqCst)
    }

    fn delay_ms(&self, ms: u32) {
        self.advance(ms as TimeMs);
    }

    fn relay_set(&mut self, relay: RelayId, on: bool) {
        if let Some(state) = self.relays.get_mut(relay as usize) {
            *state = on;
        }
    }

    fn door_lock_set(&mut self, engaged: bool) {
        self.door_lock = engaged;
    }

    fn platform_name(&self) -> &'static str {
        "sim"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_clock() {
        let hal = SimHal::new();
        assert_eq!(hal.time_ms(), 0);
        hal.advance(250);
        assert_eq!(hal.time_ms(), 250);
        hal.delay_ms(100);
        assert_eq!(hal.time_ms(), 350);
    }

    #[test]
    fn test_sim_actuators() {
        let mut hal = SimHal::new();
        hal.relay_set(2, true);
        assert!(hal.relay(2));
        assert!(!hal.relay(0));

        hal.door_lock_set(true);
        assert!(hal.door_lock());
        hal.door_lock_set(false);
        assert!(!hal.door_lock());
    }
}
