//! Property tests for the slot pool.
//!
//! Invariants under arbitrary operation interleavings:
//! - A card holds at most one slot at a time
//! - Relay outputs mirror occupancy exactly
//! - Expiry fires strictly after the maximum hold, never before
//! - Grant followed by release restores the pre-grant state

use kiosk_core::{encode_uid, PoolConfig, SimHal, SlotPool, TimeMs, STANDARD_BANK};
use proptest::prelude::*;

// ============================================================================
// Strategies
// ============================================================================

#[derive(Debug, Clone)]
enum Op {
    Grant { slot: usize, card: u8 },
    Release { slot: usize },
    Sweep { advance: TimeMs },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..4, 0u8..6).prop_map(|(slot, card)| Op::Grant { slot, card }),
        (0usize..4).prop_map(|slot| Op::Release { slot }),
        (0u64..120_000u64).prop_map(|advance| Op::Sweep { advance }),
    ]
}

fn timestamp() -> impl Strategy<Value = TimeMs> {
    0u64..1_000_000u64
}

// ============================================================================
// Interleaving Property Tests
// ============================================================================

proptest! {
    /// CORE INVARIANTS: one slot per card, relay mirrors occupancy
    ///
    /// Holds after every single operation, whatever the interleaving of
    /// grants, releases and sweeps.
    #[test]
    fn invariants_hold_under_any_interleaving(
        ops in prop::collection::vec(op_strategy(), 1..64)
    ) {
        let mut hal = SimHal::new();
        let mut pool = SlotPool::new(&STANDARD_BANK, None).unwrap();
        let mut now: TimeMs = 1;

        for op in ops {
            match op {
                Op::Grant { slot, card } => {
                    // Precondition violations are rejected, not applied
                    let _ = pool.grant(&mut hal, slot, encode_uid(&[card]), now);
                }
                Op::Release { slot } => {
                    let _ = pool.release(&mut hal, slot);
                }
                Op::Sweep { advance } => {
                    now += advance;
                    pool.sweep_expired(&mut hal, now);
                }
            }

            // No card on two slots
            for i in 0..pool.len() {
                let held = match pool.slot(i).unwrap().hold() {
                    Some(h) => h.uid.clone(),
                    None => continue,
                };
                for j in (i + 1)..pool.len() {
                    let other = pool.slot(j).unwrap().hold().map(|o| o.uid.as_str());
                    prop_assert_ne!(Some(held.as_str()), other);
                }
            }

            // Every relay mirrors its slot
            for i in 0..pool.len() {
                let slot = pool.slot(i).unwrap();
                prop_assert_eq!(
                    hal.relay(slot.relay()),
                    slot.is_occupied(),
                    "relay {} out of step with slot {}",
                    slot.relay(),
                    i
                );
            }
        }
    }

    /// Accounting matches occupancy after any interleaving
    #[test]
    fn stats_balance(
        ops in prop::collection::vec(op_strategy(), 1..64)
    ) {
        let mut hal = SimHal::new();
        let mut pool = SlotPool::new(&STANDARD_BANK, None).unwrap();
        let mut now: TimeMs = 1;

        for op in ops {
            match op {
                Op::Grant { slot, card } => {
                    let _ = pool.grant(&mut hal, slot, encode_uid(&[card]), now);
                }
                Op::Release { slot } => {
                    let _ = pool.release(&mut hal, slot);
                }
                Op::Sweep { advance } => {
                    now += advance;
                    pool.sweep_expired(&mut hal, now);
                }
            }
        }

        let stats = pool.stats();
        prop_assert!(stats.expired <= stats.releases);
        prop_assert_eq!(
            stats.grants as usize - stats.releases as usize,
            pool.occupied_count()
        );
    }
}

// ============================================================================
// Expiry Timing Property Tests
// ============================================================================

proptest! {
    /// A hold survives to exactly the limit and dies one tick past it
    #[test]
    fn expiry_boundary_exact(
        max_hold in 1_000u64..200_000u64,
        t0 in timestamp()
    ) {
        let config = PoolConfig { max_hold_ms: max_hold };
        let mut pool = SlotPool::new(&STANDARD_BANK, Some(config)).unwrap();
        let mut hal = SimHal::new();
        pool.grant(&mut hal, 0, encode_uid(&[0x42]), t0).unwrap();

        prop_assert_eq!(pool.sweep_expired(&mut hal, t0 + max_hold), 0);
        prop_assert!(pool.slot(0).unwrap().is_occupied());

        prop_assert_eq!(pool.sweep_expired(&mut hal, t0 + max_hold + 1), 1);
        prop_assert!(!pool.slot(0).unwrap().is_occupied());
        prop_assert!(!hal.relay(0));
    }

    /// Sweeping early is a no-op for every slot
    #[test]
    fn no_early_expiry(
        t0 in timestamp(),
        dt in 0u64..=90_000u64
    ) {
        let mut pool = SlotPool::new(&STANDARD_BANK, None).unwrap();
        let mut hal = SimHal::new();
        for i in 0..pool.len() {
            pool.grant(&mut hal, i, encode_uid(&[i as u8]), t0).unwrap();
        }

        prop_assert_eq!(pool.sweep_expired(&mut hal, t0 + dt), 0);
        prop_assert!(pool.is_full());
    }
}

// ============================================================================
// Round Trip Property Tests
// ============================================================================

proptest! {
    /// Grant then release leaves no residue
    #[test]
    fn grant_release_round_trip(
        slot in 0usize..4,
        card in prop::collection::vec(any::<u8>(), 1..8),
        t0 in timestamp()
    ) {
        let mut pool = SlotPool::new(&STANDARD_BANK, None).unwrap();
        let mut hal = SimHal::new();
        let uid = encode_uid(&card);

        pool.grant(&mut hal, slot, uid.clone(), t0).unwrap();
        prop_assert_eq!(pool.find_holding(uid.as_str()), Some(slot));

        pool.release(&mut hal, slot).unwrap();
        prop_assert_eq!(pool.find_holding(uid.as_str()), None);
        prop_assert_eq!(pool.occupied_count(), 0);
        for i in 0..pool.len() {
            let s = pool.slot(i).unwrap();
            prop_assert!(s.hold().is_none());
            prop_assert!(!hal.relay(s.relay()));
        }
    }

    /// Filling every slot with distinct cards saturates the pool
    #[test]
    fn distinct_cards_fill_the_pool(seed in 0u8..200u8) {
        let mut pool = SlotPool::new(&STANDARD_BANK, None).unwrap();
        let mut hal = SimHal::new();

        for i in 0..pool.len() {
            prop_assert!(!pool.is_full());
            let free = pool.find_free().unwrap();
            prop_assert_eq!(free, i);
            pool.grant(&mut hal, free, encode_uid(&[seed.wrapping_add(i as u8)]), 0)
                .unwrap();
        }
        prop_assert!(pool.is_full());
        prop_assert_eq!(pool.find_free(), None);
    }
}
