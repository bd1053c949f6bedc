//! Kiosk bench node - scenario playback for the kiosk core.
//!
//! Plays a JSON input scenario against the control core on a virtual
//! clock, logs every page transition and actuator change, and prints a
//! JSON summary of the run.
//!
//! # Usage
//!
//! ```bash
//! # Play a scenario with the bundled card list
//! kiosk-node --scenario bench/demo.json
//!
//! # Custom card list and a coarser tick
//! kiosk-node --cards /srv/kiosk/card_list.csv --scenario bench/demo.json --tick-ms 50
//! ```
//!
//! A missing or unreadable card list is not fatal: the kiosk boots with an
//! empty registry and every scan is rejected, matching the firmware's
//! behavior when its storage fails to mount.

mod scenario;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use clap::Parser;
use kiosk_core::prelude::*;
use kiosk_core::{Button, SimHal};
use scenario::{InputKind, Scenario};
use serde_json::json;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Charging kiosk bench node
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Card registry file (uid,name per line)
    #[arg(short, long, default_value = "bench/card_list.csv")]
    cards: PathBuf,

    /// Scenario file to play
    #[arg(short, long)]
    scenario: PathBuf,

    /// Polling tick period in milliseconds
    #[arg(long, default_value = "20")]
    tick_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Setup logging
    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let scenario = Scenario::load(&args.scenario)?;

    // Print banner
    println!();
    println!("╔══════════════════════════════════════════════╗");
    println!("║        Kiosk Bench - Scenario Playback       ║");
    println!("╠══════════════════════════════════════════════╣");
    println!("║  Scenario: {:<33} ║", truncate(&scenario.name, 33));
    println!(
        "║  Cards:    {:<33} ║",
        truncate(&args.cards.display().to_string(), 33)
    );
    println!("║  Tick:     {:<33} ║", format!("{} ms", args.tick_ms));
    println!("╚══════════════════════════════════════════════╝");
    println!();

    let registry = load_registry(&args.cards);
    let pool = SlotPool::new(&STANDARD_BANK, None).map_err(fmt_core_err)?;
    let mut kiosk = Kiosk::new(registry, pool, None);
    let mut hal = SimHal::new();
    info!(platform = hal.platform_name(), "bench HAL ready");

    let summary = run(&mut kiosk, &mut hal, &scenario, args.tick_ms.max(1))?;
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}

/// Load the card registry, degrading to an empty one on any failure.
fn load_registry(path: &Path) -> CardRegistry {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => {
            warn!("cannot open {}: {}; every scan will be rejected", path.display(), e);
            return CardRegistry::new();
        }
    };

    match CardRegistry::from_reader(BufReader::new(file)) {
        Ok(registry) => {
            info!("loaded {} cards from {}", registry.len(), path.display());
            registry
        }
        Err(e) => {
            warn!("failed reading {}: {}; every scan will be rejected", path.display(), e);
            CardRegistry::new()
        }
    }
}

/// Drive the tick loop over the scenario and collect the run summary.
fn run(
    kiosk: &mut Kiosk,
    hal: &mut SimHal,
    scenario: &Scenario,
    tick_ms: u64,
) -> std::result::Result<serde_json::Value, Box<dyn std::error::Error>> {
    let mut pending = scenario.inputs.iter().peekable();
    let mut transitions = Vec::new();
    let mut last_page = kiosk.page();
    let mut last_relays: Vec<bool> = kiosk.pool().iter().map(|s| hal.relay(s.relay())).collect();
    let mut last_door = hal.door_lock();

    // The HAL owns the clock, as on hardware. The door settle delay also
    // advances it, so ticks drift past the nominal grid exactly as the
    // blocking delay would drift a real loop.
    let mut now: TimeMs = hal.time_ms();
    while now <= scenario.duration_ms {
        // Merge every input due by this tick into one batch
        let mut scan_bytes: Option<Vec<u8>> = None;
        let (mut left, mut center, mut right, mut door_closed) = (false, false, false, false);
        while let Some(event) = pending.peek() {
            if event.at_ms > now {
                break;
            }
            match &event.kind {
                InputKind::Scan(bytes) => scan_bytes = Some(bytes.clone()),
                InputKind::Press(Button::Left) => left = true,
                InputKind::Press(Button::Center) => center = true,
                InputKind::Press(Button::Right) => right = true,
                InputKind::DoorClosed => door_closed = true,
            }
            pending.next();
        }

        let inputs = Inputs {
            scan: scan_bytes.as_deref(),
            left,
            center,
            right,
            door_closed,
        };
        let directive = kiosk.tick(hal, &inputs, now).map_err(fmt_core_err)?;

        if directive.page != last_page {
            info!(at_ms = now, from = ?last_page, to = ?directive.page, "page transition");
            transitions.push(json!({
                "at_ms": now,
                "from": format!("{:?}", last_page),
                "to": format!("{:?}", directive.page),
            }));
            last_page = directive.page;
        }

        for (index, slot) in kiosk.pool().iter().enumerate() {
            let on = hal.relay(slot.relay());
            if on != last_relays[index] {
                info!(at_ms = now, slot = slot.label(), on, "relay switched");
                last_relays[index] = on;
            }
        }
        let door = hal.door_lock();
        if door != last_door {
            info!(at_ms = now, engaged = door, "door lock switched");
            last_door = door;
        }

        hal.advance(tick_ms);
        now = hal.time_ms();
    }

    let status = kiosk.status();
    let stats = kiosk.pool().stats();
    Ok(json!({
        "scenario": scenario.name,
        "cards": kiosk.registry().len(),
        "ticks": status.ticks_total,
        "final_page": format!("{:?}", status.page),
        "transitions": transitions,
        "slots": kiosk
            .pool()
            .iter()
            .map(|s| json!({
                "label": s.label(),
                "occupied": s.is_occupied(),
                "uid": s.hold().map(|h| h.uid.as_str()),
            }))
            .collect::<Vec<_>>(),
        "stats": {
            "grants": stats.grants,
            "releases": stats.releases,
            "expired": stats.expired,
            "scans_accepted": status.scans_accepted,
            "scans_rejected": status.scans_rejected,
        },
    }))
}

/// Wrap a core error code for the `?` chain.
fn fmt_core_err(e: kiosk_core::Error) -> Box<dyn std::error::Error> {
    format!("kiosk core error: {:?}", e).into()
}

/// Truncate string with ellipsis
fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len - 3])
    }
}
