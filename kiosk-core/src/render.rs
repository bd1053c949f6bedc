//! Render directives.
//!
//! The display is an external collaborator; the core tells it what to draw
//! through one directive per tick and never touches pixels itself. Redraw
//! granularity is explicit so the display can skip work instead of keeping
//! its own shadow of the machine state.

use crate::types::*;

// ============================================================================
// Redraw Granularity
// ============================================================================

/// How much of the screen the display must repaint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-log", derive(defmt::Format))]
pub enum Redraw {
    /// Nothing changed; page-local animation may continue
    None,
    /// Only the picker cursor moved
    Selection,
    /// Page entry, or the occupancy shown on screen went stale
    Full,
}

// ============================================================================
// Slot View
// ============================================================================

/// Occupancy of one slot as the picker should show it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotView {
    /// Menu label
    pub label: &'static str,
    /// Whether the slot is granted
    pub occupied: bool,
}

// ============================================================================
// Render Directive
// ============================================================================

/// Everything the display needs for the current tick
#[derive(Debug, Clone)]
pub struct RenderDirective {
    /// Page to show
    pub page: Page,
    /// Repaint granularity
    pub redraw: Redraw,
    /// Picker cursor, when a selection is on screen
    pub selection: Option<usize>,
    /// Per-slot occupancy, in bank order
    pub slots: heapless::Vec<SlotView, MAX_SLOTS>,
    /// Scanned UID of the active session
    pub uid: Option<Uid>,
    /// Registry name for the scanned card
    pub card_name: Option<Name>,
    /// The slot operation a confirm or door page refers to
    pub action: Option<SlotAction>,
}
