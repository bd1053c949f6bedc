//! Scenario files for bench playback.
//!
//! A scenario is a JSON record of timed input events played against the
//! kiosk core on a virtual clock:
//!
//! ```json
//! {
//!   "name": "enable battery slot",
//!   "events": [
//!     { "at_ms": 1000, "scan": "04a1b2" },
//!     { "at_ms": 4000, "button": "right" },
//!     { "at_ms": 5000, "button": "center" },
//!     { "at_ms": 6000, "button": "left" },
//!     { "at_ms": 9000, "door": "closed" }
//!   ]
//! }
//! ```
//!
//! Each event carries exactly one input. An event lands on the first tick
//! at or after its `at_ms`. `duration_ms` is optional and defaults to the
//! last event plus a settle margin.

use std::path::Path;

use kiosk_core::{Button, UID_RAW_MAX};
use serde::Deserialize;
use thiserror::Error;

/// Idle time appended after the last event when no duration is given
const SETTLE_MARGIN_MS: u64 = 15_000;

/// Scenario loading and validation errors
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("event at {at_ms} ms: {detail}")]
    BadEvent { at_ms: u64, detail: String },
}

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    name: String,
    #[serde(default)]
    duration_ms: Option<u64>,
    events: Vec<RawEvent>,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    at_ms: u64,
    #[serde(default)]
    scan: Option<String>,
    #[serde(default)]
    button: Option<String>,
    #[serde(default)]
    door: Option<String>,
}

/// One validated input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputKind {
    /// Tag presented, raw UID bytes
    Scan(Vec<u8>),
    /// Panel button pressed
    Press(Button),
    /// Door sensor closed edge
    DoorClosed,
}

/// A validated input with its fire time
#[derive(Debug, Clone)]
pub struct TimedInput {
    pub at_ms: u64,
    pub kind: InputKind,
}

/// A loaded, validated scenario
#[derive(Debug)]
pub struct Scenario {
    pub name: String,
    pub duration_ms: u64,
    pub inputs: Vec<TimedInput>,
}

impl Scenario {
    /// Load and validate a scenario file.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse and validate scenario JSON.
    pub fn parse(text: &str) -> Result<Self, ScenarioError> {
        let file: ScenarioFile = serde_json::from_str(text)?;

        let mut inputs = Vec::with_capacity(file.events.len());
        for event in &file.events {
            inputs.push(TimedInput {
                at_ms: event.at_ms,
                kind: validate(event)?,
            });
        }
        inputs.sort_by_key(|e| e.at_ms);

        let last = inputs.last().map(|e| e.at_ms).unwrap_or(0);
        Ok(Self {
            name: file.name,
            duration_ms: file.duration_ms.unwrap_or(last + SETTLE_MARGIN_MS),
            inputs,
        })
    }
}

fn validate(event: &RawEvent) -> Result<InputKind, ScenarioError> {
    let bad = |detail: String| ScenarioError::BadEvent {
        at_ms: event.at_ms,
        detail,
    };

    let set = [
        event.scan.is_some(),
        event.button.is_some(),
        event.door.is_some(),
    ]
    .iter()
    .filter(|&&s| s)
    .count();
    if set != 1 {
        return Err(bad(format!(
            "expected exactly one of scan/button/door, found {}",
            set
        )));
    }

    if let Some(hex) = &event.scan {
        return decode_uid_hex(hex).map(InputKind::Scan).map_err(bad);
    }

    if let Some(button) = &event.button {
        let button = match button.as_str() {
            "left" => Button::Left,
            "center" => Button::Center,
            "right" => Button::Right,
            other => return Err(bad(format!("unknown button '{}'", other))),
        };
        return Ok(InputKind::Press(button));
    }

    match event.door.as_deref() {
        Some("closed") => Ok(InputKind::DoorClosed),
        Some(other) => Err(bad(format!("unknown door state '{}'", other))),
        None => Err(bad("empty event".to_string())),
    }
}

/// Decode a hex UID string into raw tag bytes.
fn decode_uid_hex(hex: &str) -> Result<Vec<u8>, String> {
    if hex.is_empty() || hex.len() % 2 != 0 {
        return Err(format!("uid '{}' is not an even-length hex string", hex));
    }
    if hex.len() > UID_RAW_MAX * 2 {
        return Err(format!("uid '{}' exceeds {} bytes", hex, UID_RAW_MAX));
    }

    (0..hex.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&hex[i..i + 2], 16)
                .map_err(|_| format!("uid '{}' contains non-hex digits", hex))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scenario() {
        let text = r#"{
            "name": "demo",
            "events": [
                { "at_ms": 3000, "button": "left" },
                { "at_ms": 1000, "scan": "04a1b2" },
                { "at_ms": 5000, "door": "closed" }
            ]
        }"#;
        let scenario = Scenario::parse(text).unwrap();

        assert_eq!(scenario.name, "demo");
        assert_eq!(scenario.duration_ms, 5_000 + SETTLE_MARGIN_MS);
        // Events come out sorted by fire time
        assert_eq!(scenario.inputs[0].at_ms, 1_000);
        assert_eq!(
            scenario.inputs[0].kind,
            InputKind::Scan(vec![0x04, 0xa1, 0xb2])
        );
        assert_eq!(scenario.inputs[2].kind, InputKind::DoorClosed);
    }

    #[test]
    fn test_explicit_duration_wins() {
        let text = r#"{ "name": "idle", "duration_ms": 500, "events": [] }"#;
        let scenario = Scenario::parse(text).unwrap();
        assert_eq!(scenario.duration_ms, 500);
    }

    #[test]
    fn test_rejects_unknown_button() {
        let text = r#"{ "name": "x", "events": [{ "at_ms": 0, "button": "middle" }] }"#;
        assert!(matches!(
            Scenario::parse(text),
            Err(ScenarioError::BadEvent { .. })
        ));
    }

    #[test]
    fn test_rejects_multi_input_event() {
        let text =
            r#"{ "name": "x", "events": [{ "at_ms": 0, "button": "left", "door": "closed" }] }"#;
        assert!(matches!(
            Scenario::parse(text),
            Err(ScenarioError::BadEvent { .. })
        ));
    }

    #[test]
    fn test_decode_uid_hex() {
        assert_eq!(decode_uid_hex("04a1b2").unwrap(), vec![0x04, 0xa1, 0xb2]);
        assert!(decode_uid_hex("04a").is_err());
        assert!(decode_uid_hex("zz").is_err());
        assert!(decode_uid_hex("").is_err());
        assert!(decode_uid_hex(&"ab".repeat(UID_RAW_MAX + 1)).is_err());
    }
}
