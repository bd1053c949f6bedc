//! Session state machine.
//!
//! The kiosk owns the current page, the slot pool and the card registry,
//! and consumes one batch of debounced inputs per tick. Every tick runs in
//! strict order: expiry sweep, then the handler for the current page, then
//! one render directive out. All shared state lives here and is touched
//! only from the tick, so there is nothing to lock.
//!
//! Unrecognized input on a page is dropped, never queued. Scan events are
//! only honored on the idle page; a card presented while a confirm page is
//! open does nothing.

use crate::hal::Hal;
use crate::registry::CardRegistry;
use crate::render::{Redraw, RenderDirective};
use crate::slots::SlotPool;
use crate::types::*;

// ============================================================================
// Inputs
// ============================================================================

/// Debounced input edges for one tick.
///
/// Button and door fields are "pressed/closed this tick" edges, produced
/// by the upstream input driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct Inputs<'a> {
    /// Raw UID bytes of a tag presented this tick
    pub scan: Option<&'a [u8]>,
    /// Left button pressed
    pub left: bool,
    /// Center button pressed
    pub center: bool,
    /// Right button pressed
    pub right: bool,
    /// Door sensor reported a closed edge
    pub door_closed: bool,
}

impl<'a> Inputs<'a> {
    /// A tick with no input
    pub fn idle() -> Inputs<'static> {
        Inputs::default()
    }

    /// A tick carrying a tag scan
    pub fn scanned(bytes: &'a [u8]) -> Self {
        Inputs {
            scan: Some(bytes),
            ..Inputs::default()
        }
    }

    /// A tick carrying one button press
    pub fn pressed(button: Button) -> Inputs<'static> {
        let mut inputs = Inputs::default();
        match button {
            Button::Left => inputs.left = true,
            Button::Center => inputs.center = true,
            Button::Right => inputs.right = true,
        }
        inputs
    }

    /// A tick carrying the door-closed edge
    pub fn door() -> Inputs<'static> {
        Inputs {
            door_closed: true,
            ..Inputs::default()
        }
    }

    /// Whether any button was pressed this tick
    pub fn any_button(&self) -> bool {
        self.left || self.center || self.right
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// Page timing configuration
#[derive(Debug, Clone, Copy)]
pub struct KioskConfig {
    /// Dwell time of the scan-accepted / scan-rejected notices
    pub notice_timeout_ms: TimeMs,
    /// Dwell time of the success and full-notice pages
    pub warning_timeout_ms: TimeMs,
    /// Settle delay before the door lock is energized
    pub door_settle_ms: u32,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            notice_timeout_ms: NOTICE_TIMEOUT_MS,
            warning_timeout_ms: WARNING_TIMEOUT_MS,
            door_settle_ms: DOOR_SETTLE_MS,
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// Transient record of one authenticated card's interaction.
///
/// Created on an accepted scan, dropped when the machine returns to idle.
#[derive(Debug, Clone)]
pub struct Session {
    /// Encoded UID of the scanned card
    pub uid: Uid,
    /// Picker cursor position
    pub selection: usize,
    /// Slot operation a confirm or door page refers to
    pub action: Option<SlotAction>,
}

// ============================================================================
// Status
// ============================================================================

/// Kiosk status summary
#[derive(Debug, Clone, Copy)]
pub struct KioskStatus {
    /// Current page
    pub page: Page,
    /// Picker cursor, when a session is active
    pub selection: Option<usize>,
    /// Granted slot count
    pub occupied: usize,
    /// Total ticks processed
    pub ticks_total: u32,
    /// Scans that passed registry lookup
    pub scans_accepted: u32,
    /// Scans that failed registry lookup
    pub scans_rejected: u32,
}

// ============================================================================
// Kiosk
// ============================================================================

/// The kiosk control core.
pub struct Kiosk {
    registry: CardRegistry,
    pool: SlotPool,
    config: KioskConfig,

    page: Page,
    session: Option<Session>,
    /// When the current page was entered
    page_since: TimeMs,

    full_redraw: bool,
    selection_moved: bool,

    ticks_total: u32,
    scans_accepted: u32,
    scans_rejected: u32,
}

impl Kiosk {
    /// Create a kiosk on the idle page.
    pub fn new(registry: CardRegistry, pool: SlotPool, config: Option<KioskConfig>) -> Self {
        Self {
            registry,
            pool,
            config: config.unwrap_or_default(),
            page: Page::ScanWait,
            session: None,
            page_since: 0,
            full_redraw: true,
            selection_moved: false,
            ticks_total: 0,
            scans_accepted: 0,
            scans_rejected: 0,
        }
    }

    /// Current page
    pub fn page(&self) -> Page {
        self.page
    }

    /// Active session, if any
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The slot pool
    pub fn pool(&self) -> &SlotPool {
        &self.pool
    }

    /// The card registry
    pub fn registry(&self) -> &CardRegistry {
        &self.registry
    }

    /// Status summary
    pub fn status(&self) -> KioskStatus {
        KioskStatus {
            page: self.page,
            selection: self.session.as_ref().map(|s| s.selection),
            occupied: self.pool.occupied_count(),
            ticks_total: self.ticks_total,
            scans_accepted: self.scans_accepted,
            scans_rejected: self.scans_rejected,
        }
    }

    /// Process one polling tick.
    ///
    /// Order is fixed: reclaim expired slots first, then dispatch the
    /// current page's handler, then report what to draw.
    pub fn tick<H: Hal>(
        &mut self,
        hal: &mut H,
        inputs: &Inputs,
        now: TimeMs,
    ) -> Result<RenderDirective> {
        self.ticks_total += 1;

        // The sweep runs regardless of the page. An open picker shows
        // occupancy, so any reclaim there goes stale on screen.
        if self.pool.sweep_expired(hal, now) > 0 && self.page == Page::SlotPicker {
            self.full_redraw = true;
        }

        match self.page {
            Page::ScanWait => self.on_scan_wait(inputs, now),
            Page::ScanRejected => {
                if self.elapsed(now) > self.config.notice_timeout_ms {
                    self.end_session(now);
                }
            }
            Page::ScanAccepted => self.on_scan_accepted(now),
            Page::SlotPicker => self.on_slot_picker(inputs, now),
            Page::EnableConfirm => self.on_enable_confirm(hal, inputs, now)?,
            Page::DoorWait => {
                // Physical door state is authoritative; nothing else exits
                if inputs.door_closed {
                    hal.door_lock_set(false);
                    self.end_session(now);
                }
            }
            Page::EnableSuccess | Page::DisableSuccess | Page::SlotFull => {
                if inputs.any_button() || self.elapsed(now) > self.config.warning_timeout_ms {
                    self.end_session(now);
                }
            }
            Page::DisableConfirm => self.on_disable_confirm(hal, inputs, now)?,
            Page::Logout => {}
        }

        Ok(self.directive())
    }

    // ========================================================================
    // Page Handlers
    // ========================================================================

    fn on_scan_wait(&mut self, inputs: &Inputs, now: TimeMs) {
        let bytes = match inputs.scan {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return,
        };

        let uid = encode_uid(bytes);
        if self.registry.is_registered(uid.as_str()) {
            self.scans_accepted += 1;
            self.session = Some(Session {
                uid,
                selection: 0,
                action: None,
            });
            self.goto(Page::ScanAccepted, now);
        } else {
            self.scans_rejected += 1;
            self.goto(Page::ScanRejected, now);
        }
    }

    fn on_scan_accepted(&mut self, now: TimeMs) {
        if self.elapsed(now) <= self.config.notice_timeout_ms {
            return;
        }

        let uid = match self.session.as_ref() {
            Some(session) => session.uid.clone(),
            None => {
                self.end_session(now);
                return;
            }
        };

        if let Some(index) = self.pool.find_holding(uid.as_str()) {
            // Returning card: offer to release its slot
            if let Some(session) = self.session.as_mut() {
                session.action = Some(SlotAction::Disable(index));
            }
            self.goto(Page::DisableConfirm, now);
        } else if self.pool.is_full() {
            self.goto(Page::SlotFull, now);
        } else {
            if let Some(session) = self.session.as_mut() {
                session.selection = 0;
            }
            self.goto(Page::SlotPicker, now);
        }
    }

    fn on_slot_picker(&mut self, inputs: &Inputs, now: TimeMs) {
        let count = self.pool.len();
        let mut moved = false;

        if let Some(session) = self.session.as_mut() {
            if inputs.left {
                session.selection = (session.selection + 1) % count;
                moved = true;
            }
            if inputs.right {
                session.selection = (session.selection + count - 1) % count;
                moved = true;
            }
        }
        if moved {
            self.selection_moved = true;
        }

        if inputs.center {
            let selection = match self.session.as_ref() {
                Some(session) => session.selection,
                None => return,
            };
            let free = self
                .pool
                .slot(selection)
                .map_or(false, |s| !s.is_occupied());

            // An occupied slot cannot be toggled from the picker; release
            // goes through the re-scan flow
            if free {
                if let Some(session) = self.session.as_mut() {
                    session.action = Some(SlotAction::Enable(selection));
                }
                self.goto(Page::EnableConfirm, now);
            }
        }
    }

    fn on_enable_confirm<H: Hal>(
        &mut self,
        hal: &mut H,
        inputs: &Inputs,
        now: TimeMs,
    ) -> Result<()> {
        if inputs.right {
            if let Some(session) = self.session.as_mut() {
                session.action = None;
            }
            self.goto(Page::SlotPicker, now);
        } else if inputs.left {
            let (uid, index) = match self.session.as_ref() {
                Some(session) => (session.uid.clone(), session.selection),
                None => {
                    self.end_session(now);
                    return Ok(());
                }
            };

            self.pool.grant(hal, index, uid, now)?;

            let gates_door = self.pool.slot(index).map_or(false, |s| s.gates_door());
            if gates_door {
                self.enter_door_wait(hal, now);
            } else {
                self.goto(Page::EnableSuccess, now);
            }
        }
        Ok(())
    }

    fn on_disable_confirm<H: Hal>(
        &mut self,
        hal: &mut H,
        inputs: &Inputs,
        now: TimeMs,
    ) -> Result<()> {
        if inputs.right {
            self.end_session(now);
        } else if inputs.left {
            let uid = match self.session.as_ref() {
                Some(session) => session.uid.clone(),
                None => {
                    self.end_session(now);
                    return Ok(());
                }
            };

            // Re-look-up the hold: the sweep may have reclaimed it while
            // this page was open
            match self.pool.find_holding(uid.as_str()) {
                Some(index) => {
                    if let Some(session) = self.session.as_mut() {
                        session.action = Some(SlotAction::Disable(index));
                    }
                    let gates_door =
                        self.pool.slot(index).map_or(false, |s| s.gates_door());
                    self.pool.release(hal, index)?;

                    if gates_door {
                        self.enter_door_wait(hal, now);
                    } else {
                        self.goto(Page::DisableSuccess, now);
                    }
                }
                None => self.end_session(now),
            }
        }
        Ok(())
    }

    // ========================================================================
    // Private Helpers
    // ========================================================================

    /// Enter the door-wait page and arm the lock after the settle delay.
    ///
    /// The delay stalls the whole control loop; accepted, it is the only
    /// blocking step in a tick.
    fn enter_door_wait<H: Hal>(&mut self, hal: &mut H, now: TimeMs) {
        self.goto(Page::DoorWait, now);
        hal.delay_ms(self.config.door_settle_ms);
        hal.door_lock_set(true);
    }

    fn end_session(&mut self, now: TimeMs) {
        self.session = None;
        self.goto(Page::ScanWait, now);
    }

    fn goto(&mut self, page: Page, now: TimeMs) {
        self.page = page;
        self.page_since = now;
        self.full_redraw = true;
    }

    fn elapsed(&self, now: TimeMs) -> TimeMs {
        now.saturating_sub(self.page_since)
    }

    fn directive(&mut self) -> RenderDirective {
        let redraw = if self.full_redraw {
            Redraw::Full
        } else if self.selection_moved {
            Redraw::Selection
        } else {
            Redraw::None
        };
        self.full_redraw = false;
        self.selection_moved = false;

        let selection = match self.page {
            Page::SlotPicker | Page::EnableConfirm => {
                self.session.as_ref().map(|s| s.selection)
            }
            _ => None,
        };

        let uid = self.session.as_ref().map(|s| s.uid.clone());
        let card_name: Option<Name> = uid
            .as_ref()
            .and_then(|u| self.registry.name_of(u.as_str()))
            .map(truncated);

        RenderDirective {
            page: self.page,
            redraw,
            selection,
            slots: self.pool.views(),
            uid,
            card_name,
            action: self.session.as_ref().and_then(|s| s.action),
        }
    }
}
