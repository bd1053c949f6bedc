//! Authorized-card registry.
//!
//! Loaded once at boot from a line-oriented `uid,name` record source and
//! read-only afterwards. Lookups are linear scans; at the stated scale
//! (tens of cards) nothing faster is warranted.

use crate::types::*;

// ============================================================================
// Card
// ============================================================================

/// One authorized card: encoded UID plus a display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    /// Encoded UID, compared byte-for-byte against scans
    pub uid: Uid,
    /// Holder name shown on confirm pages
    pub name: Name,
}

// ============================================================================
// Card Registry
// ============================================================================

/// Bounded table of authorized cards.
#[derive(Debug, Default)]
pub struct CardRegistry {
    cards: heapless::Vec<Card, MAX_CARDS>,
}

impl CardRegistry {
    /// Create an empty registry.
    pub const fn new() -> Self {
        Self {
            cards: heapless::Vec::new(),
        }
    }

    /// Add one card, truncating oversized fields to their bounds.
    ///
    /// Returns [`Error::NoMemory`] once the registry is full.
    pub fn add(&mut self, uid: &str, name: &str) -> Result<()> {
        let card = Card {
            uid: truncated(uid),
            name: truncated(name),
        };
        self.cards.push(card).map_err(|_| Error::NoMemory)
    }

    /// Split one record line into `(uid, name)`.
    ///
    /// Records are comma-separated with the name after the first comma.
    /// Lines without a comma, or with an empty uid, are malformed and
    /// yield `None`.
    pub fn parse_line(line: &str) -> Option<(&str, &str)> {
        let (uid, name) = line.split_once(',')?;
        let uid = uid.trim();
        if uid.is_empty() {
            return None;
        }
        Some((uid, name.trim()))
    }

    /// Build a registry from record lines.
    ///
    /// Malformed lines are skipped. Input past [`MAX_CARDS`] records is
    /// silently dropped.
    pub fn from_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut registry = Self::new();
        for line in lines {
            if let Some((uid, name)) = Self::parse_line(line) {
                if registry.add(uid, name).is_err() {
                    break;
                }
            }
        }
        registry
    }

    /// Build a registry from a line-oriented reader.
    ///
    /// Same record handling as [`from_lines`](Self::from_lines). I/O errors
    /// are returned to the caller, which is expected to fall back to an
    /// empty registry rather than abort boot.
    #[cfg(feature = "std")]
    pub fn from_reader<R: std::io::BufRead>(reader: R) -> std::io::Result<Self> {
        let mut registry = Self::new();
        for line in reader.lines() {
            let line = line?;
            if let Some((uid, name)) = Self::parse_line(&line) {
                if registry.add(uid, name).is_err() {
                    break;
                }
            }
        }
        Ok(registry)
    }

    /// Whether a scanned UID is authorized.
    pub fn is_registered(&self, uid: &str) -> bool {
        self.cards.iter().any(|c| c.uid.as_str() == uid)
    }

    /// Display name for a UID, if registered.
    pub fn name_of(&self, uid: &str) -> Option<&str> {
        self.cards
            .iter()
            .find(|c| c.uid.as_str() == uid)
            .map(|c| c.name.as_str())
    }

    /// Number of loaded cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether no cards were loaded.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate over loaded cards.
    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(
            CardRegistry::parse_line("04a1b2,Alice"),
            Some(("04a1b2", "Alice"))
        );
        assert_eq!(
            CardRegistry::parse_line("04a1b2, Alice Doe "),
            Some(("04a1b2", "Alice Doe"))
        );
        assert_eq!(CardRegistry::parse_line("no separator"), None);
        assert_eq!(CardRegistry::parse_line(",nameless"), None);
    }

    #[test]
    fn test_from_lines_skips_malformed() {
        let text = "04a1b2,Alice\ngarbage\nffee00,Bob\n";
        let registry = CardRegistry::from_lines(text.lines());
        assert_eq!(registry.len(), 2);
        assert!(registry.is_registered("04a1b2"));
        assert!(registry.is_registered("ffee00"));
        assert!(!registry.is_registered("garbage"));
    }

    #[test]
    fn test_name_lookup() {
        let registry = CardRegistry::from_lines("04a1b2,Alice".lines());
        assert_eq!(registry.name_of("04a1b2"), Some("Alice"));
        assert_eq!(registry.name_of("ffffff"), None);
    }

    #[test]
    fn test_capacity_truncates_silently() {
        let mut text = String::new();
        for i in 0..MAX_CARDS + 10 {
            text.push_str(&format!("{:06x},Holder {}\n", i, i));
        }
        let registry = CardRegistry::from_lines(text.lines());
        assert_eq!(registry.len(), MAX_CARDS);
    }

    #[test]
    fn test_oversized_fields_truncate() {
        let mut registry = CardRegistry::new();
        let long_uid = "a".repeat(UID_HEX_MAX + 8);
        let long_name = "b".repeat(NAME_MAX + 8);
        registry.add(&long_uid, &long_name).unwrap();

        let card = registry.iter().next().unwrap();
        assert_eq!(card.uid.len(), UID_HEX_MAX);
        assert_eq!(card.name.len(), NAME_MAX);
    }

    #[cfg(feature = "std")]
    #[test]
    fn test_from_reader() {
        let data = "04a1b2,Alice\r\nffee00,Bob\n";
        let registry = CardRegistry::from_reader(std::io::Cursor::new(data)).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.name_of("ffee00"), Some("Bob"));
    }
}
