//! # Charging Kiosk Control Core
//!
//! Control logic for a self-service charging-station kiosk: a user scans
//! an RFID card, picks one of a fixed bank of charger slots, and the kiosk
//! powers the slot's relay until the user releases it or the hold expires.
//! One slot additionally gates a door-locked battery compartment.
//!
//! The crate holds the decision logic only. Display rendering, the RFID
//! reader, input debouncing and the storage behind the card list are
//! external collaborators reached through [`Hal`], the [`Inputs`] batch
//! and the returned [`RenderDirective`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use kiosk_core::prelude::*;
//!
//! let registry = CardRegistry::from_reader(open_card_list()?)?;
//! let pool = SlotPool::new(&STANDARD_BANK, None)?;
//! let mut kiosk = Kiosk::new(registry, pool, None);
//!
//! loop {
//!     let now = hal.time_ms();
//!     let inputs = sample_inputs();
//!     let directive = kiosk.tick(&mut hal, &inputs, now)?;
//!     display.draw(&directive);
//! }
//! ```
//!
//! ## Guarantees
//!
//! - A card holds at most one slot, and a slot at most one card.
//! - A slot's relay is powered exactly while the slot is granted.
//! - Holds past the maximum duration are reclaimed by the per-tick sweep,
//!   whatever page is on screen.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

// Core modules
pub mod hal;
pub mod kiosk;
pub mod registry;
pub mod render;
pub mod slots;
pub mod types;

// Re-exports for convenience
pub use hal::Hal;
pub use kiosk::{Inputs, Kiosk, KioskConfig, KioskStatus, Session};
pub use registry::{Card, CardRegistry};
pub use render::{Redraw, RenderDirective, SlotView};
pub use slots::{PoolConfig, PoolStats, Slot, SlotConfig, SlotHold, SlotPool, STANDARD_BANK};
pub use types::*;

#[cfg(any(test, feature = "std"))]
pub use hal::SimHal;

/// Prelude - commonly used items
pub mod prelude {
    pub use crate::hal::Hal;
    pub use crate::kiosk::{Inputs, Kiosk, KioskConfig};
    pub use crate::registry::CardRegistry;
    pub use crate::render::{Redraw, RenderDirective};
    pub use crate::slots::{SlotPool, STANDARD_BANK};
    pub use crate::types::*;
}
