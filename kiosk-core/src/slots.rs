//! Charger slot pool.
//!
//! A fixed bank of relay-switched charging outputs. The pool is the only
//! code allowed to drive slot relays, so the physical output of each slot
//! always mirrors its occupancy.

use crate::hal::Hal;
use crate::render::SlotView;
use crate::types::*;

// ============================================================================
// Slot Configuration
// ============================================================================

/// Static wiring of one slot
#[derive(Debug, Clone, Copy)]
pub struct SlotConfig {
    /// Menu label shown on the picker
    pub label: &'static str,
    /// Relay output channel bound to this slot
    pub relay: RelayId,
    /// Whether granting this slot opens the battery compartment flow
    pub gates_door: bool,
}

/// The standard four-slot bank
///
/// Three wall chargers plus the battery compartment charger, which gates
/// the door lock. The door-lock actuator itself sits on its own channel
/// behind [`Hal::door_lock_set`].
pub const STANDARD_BANK: [SlotConfig; 4] = [
    SlotConfig {
        label: "Charger 60V",
        relay: 0,
        gates_door: false,
    },
    SlotConfig {
        label: "Charger 72V",
        relay: 1,
        gates_door: false,
    },
    SlotConfig {
        label: "Slot Charger",
        relay: 2,
        gates_door: false,
    },
    SlotConfig {
        label: "Battery Charger",
        relay: 3,
        gates_door: true,
    },
];

/// Pool tuning
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Maximum hold duration before the sweep reclaims a slot
    pub max_hold_ms: TimeMs,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_hold_ms: MAX_HOLD_MS,
        }
    }
}

// ============================================================================
// Slot
// ============================================================================

/// An active hold on a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotHold {
    /// Card holding the slot
    pub uid: Uid,
    /// When the hold was granted
    pub since: TimeMs,
}

/// One charger slot: static wiring plus the current hold, if any
#[derive(Debug, Clone)]
pub struct Slot {
    config: SlotConfig,
    hold: Option<SlotHold>,
}

impl Slot {
    fn new(config: SlotConfig) -> Self {
        Self { config, hold: None }
    }

    /// Menu label
    pub fn label(&self) -> &'static str {
        self.config.label
    }

    /// Bound relay channel
    pub fn relay(&self) -> RelayId {
        self.config.relay
    }

    /// Whether this slot gates the door lock
    pub fn gates_door(&self) -> bool {
        self.config.gates_door
    }

    /// The current hold, if granted
    pub fn hold(&self) -> Option<&SlotHold> {
        self.hold.as_ref()
    }

    /// Whether the slot is granted
    pub fn is_occupied(&self) -> bool {
        self.hold.is_some()
    }
}

// ============================================================================
// Slot Pool Statistics
// ============================================================================

/// Lifetime counters for the pool
#[derive(Debug, Clone, Copy, Default)]
pub struct PoolStats {
    /// Slots granted
    pub grants: u32,
    /// Slots released, explicitly or by the sweep
    pub releases: u32,
    /// Releases forced by the expiry sweep
    pub expired: u32,
}

// ============================================================================
// Slot Pool
// ============================================================================

/// The bank of charger slots
pub struct SlotPool {
    slots: heapless::Vec<Slot, MAX_SLOTS>,
    config: PoolConfig,
    stats: PoolStats,
}

impl SlotPool {
    /// Build a pool from a slot layout.
    ///
    /// Returns [`Error::InvalidArg`] for an empty layout and
    /// [`Error::NoMemory`] for one larger than [`MAX_SLOTS`].
    pub fn new(layout: &[SlotConfig], config: Option<PoolConfig>) -> Result<Self> {
        if layout.is_empty() {
            return Err(Error::InvalidArg);
        }

        let mut slots = heapless::Vec::new();
        for cfg in layout {
            slots.push(Slot::new(*cfg)).map_err(|_| Error::NoMemory)?;
        }

        Ok(Self {
            slots,
            config: config.unwrap_or_default(),
            stats: PoolStats::default(),
        })
    }

    /// Number of slots in the bank
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the bank has no slots (never true for a built pool)
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot at `index`
    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Iterate over slots in bank order
    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter()
    }

    /// First slot held by `uid`, scanning in bank order.
    ///
    /// A returning card is detected through this lookup: holding a slot
    /// routes its next scan into the release flow.
    pub fn find_holding(&self, uid: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.hold.as_ref().map(|h| h.uid.as_str()) == Some(uid))
    }

    /// First free slot, lowest index wins.
    pub fn find_free(&self) -> Option<usize> {
        self.slots.iter().position(|s| s.hold.is_none())
    }

    /// Whether every slot is granted
    pub fn is_full(&self) -> bool {
        self.find_free().is_none()
    }

    /// Number of granted slots
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_occupied()).count()
    }

    /// Grant the slot at `index` to `uid` and power its relay.
    ///
    /// Preconditions are checked: the slot must be free
    /// ([`Error::Occupied`]) and the card must not hold any other slot
    /// ([`Error::AlreadyExists`]).
    pub fn grant<H: Hal>(
        &mut self,
        hal: &mut H,
        index: usize,
        uid: Uid,
        now: TimeMs,
    ) -> Result<()> {
        if self.find_holding(uid.as_str()).is_some() {
            return Err(Error::AlreadyExists);
        }

        let slot = self.slots.get_mut(index).ok_or(Error::InvalidArg)?;
        if slot.hold.is_some() {
            return Err(Error::Occupied);
        }

        slot.hold = Some(SlotHold { uid, since: now });
        hal.relay_set(slot.config.relay, true);
        self.stats.grants += 1;
        Ok(())
    }

    /// Release the slot at `index` and cut its relay.
    ///
    /// Returns [`Error::Vacant`] if the slot is already free. A door-gating
    /// slot also forces the door-lock actuator off, so a sweep expiry can
    /// never leave the lock energized.
    pub fn release<H: Hal>(&mut self, hal: &mut H, index: usize) -> Result<()> {
        let slot = self.slots.get_mut(index).ok_or(Error::InvalidArg)?;
        if slot.hold.is_none() {
            return Err(Error::Vacant);
        }

        slot.hold = None;
        hal.relay_set(slot.config.relay, false);
        if slot.config.gates_door {
            hal.door_lock_set(false);
        }
        self.stats.releases += 1;
        Ok(())
    }

    /// Reclaim every slot held longer than the maximum duration.
    ///
    /// Runs once per tick, before page dispatch, regardless of what the
    /// display shows. Returns the number of slots released so the caller
    /// can invalidate an open picker.
    pub fn sweep_expired<H: Hal>(&mut self, hal: &mut H, now: TimeMs) -> usize {
        let mut released = 0;
        for index in 0..self.slots.len() {
            let expired = self.slots[index]
                .hold
                .as_ref()
                .map(|h| now.saturating_sub(h.since) > self.config.max_hold_ms)
                .unwrap_or(false);

            if expired {
                self.release(hal, index).ok();
                self.stats.expired += 1;
                released += 1;
            }
        }
        released
    }

    /// Per-slot occupancy snapshot for render directives
    pub fn views(&self) -> heapless::Vec<SlotView, MAX_SLOTS> {
        self.slots
            .iter()
            .map(|s| SlotView {
                label: s.config.label,
                occupied: s.is_occupied(),
            })
            .collect()
    }

    /// Lifetime counters
    pub fn stats(&self) -> PoolStats {
        self.stats
    }
}
