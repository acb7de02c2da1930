// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Rhythm pattern catalog.
//!
//! Static timing templates consumed by the playback engine: each slot
//! holds a relative onset in [0,1) and a duration multiplier, both
//! scaled by the chord's wall-clock duration at play time. Chords with
//! more notes than a pattern has slots reuse the last slot.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Broad feel of a pattern, for grouping in pickers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternCategory {
    Block,
    Arpeggio,
    Syncopated,
    Waltz,
}

impl fmt::Display for PatternCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PatternCategory::Block => "block",
            PatternCategory::Arpeggio => "arpeggio",
            PatternCategory::Syncopated => "syncopated",
            PatternCategory::Waltz => "waltz",
        };
        write!(f, "{}", name)
    }
}

/// A read-only timing template
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RhythmPattern {
    pub name: &'static str,
    pub category: PatternCategory,
    pub description: &'static str,
    /// Relative onset per note slot, each in [0,1)
    pub onsets: &'static [f64],
    /// Duration multiplier per note slot
    pub durations: &'static [f64],
}

impl RhythmPattern {
    /// Onset fraction for a note slot, clamped to the last defined slot
    pub fn onset(&self, slot: usize) -> f64 {
        self.onsets[slot.min(self.onsets.len() - 1)]
    }

    /// Duration multiplier for a note slot, clamped like `onset`
    pub fn duration(&self, slot: usize) -> f64 {
        self.durations[slot.min(self.durations.len() - 1)]
    }

    /// Number of defined slots
    pub fn slots(&self) -> usize {
        self.onsets.len()
    }
}

/// Built-in patterns. The first entry doubles as the fallback for
/// unknown names.
pub const PATTERNS: [RhythmPattern; 7] = [
    RhythmPattern {
        name: "Block Chord",
        category: PatternCategory::Block,
        description: "All notes played simultaneously",
        onsets: &[0.0],
        durations: &[1.0],
    },
    RhythmPattern {
        name: "Up Arpeggio",
        category: PatternCategory::Arpeggio,
        description: "Notes played from low to high",
        onsets: &[0.0, 0.15, 0.3, 0.45],
        durations: &[0.85, 0.85, 0.85, 0.85],
    },
    RhythmPattern {
        name: "Down Arpeggio",
        category: PatternCategory::Arpeggio,
        description: "Notes played from high to low",
        onsets: &[0.0, 0.15, 0.3, 0.45],
        durations: &[0.85, 0.85, 0.85, 0.85],
    },
    RhythmPattern {
        name: "Broken Chord",
        category: PatternCategory::Arpeggio,
        description: "Root, fifth, third pattern",
        onsets: &[0.0, 0.25, 0.5, 0.75],
        durations: &[0.3, 0.3, 0.3, 0.3],
    },
    RhythmPattern {
        name: "Syncopated",
        category: PatternCategory::Syncopated,
        description: "Off-beat rhythm pattern",
        onsets: &[0.0, 0.125, 0.375, 0.625],
        durations: &[0.4, 0.25, 0.4, 0.5],
    },
    RhythmPattern {
        name: "Waltz",
        category: PatternCategory::Waltz,
        description: "Root on 1, chord on 2 & 3",
        onsets: &[0.0, 0.33, 0.66],
        durations: &[0.33, 0.33, 0.33],
    },
    RhythmPattern {
        name: "Strum",
        category: PatternCategory::Arpeggio,
        description: "Quick guitar-like strum",
        onsets: &[0.0, 0.05, 0.1, 0.15],
        durations: &[0.9, 0.9, 0.9, 0.9],
    },
];

/// Look up a pattern by name (case-insensitive). Unknown names fall
/// back to the first catalog entry rather than failing.
pub fn pattern_by_name(name: &str) -> &'static RhythmPattern {
    PATTERNS
        .iter()
        .find(|pattern| pattern.name.eq_ignore_ascii_case(name.trim()))
        .unwrap_or(&PATTERNS[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_shape() {
        assert_eq!(PATTERNS.len(), 7);
        for pattern in &PATTERNS {
            assert_eq!(pattern.onsets.len(), pattern.durations.len());
            assert!(pattern.onsets.iter().all(|&t| (0.0..1.0).contains(&t)));
            assert!(pattern.durations.iter().all(|&d| d > 0.0));
            assert!(pattern.onsets.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(pattern_by_name("Waltz").name, "Waltz");
        assert_eq!(pattern_by_name("block chord").name, "Block Chord");
    }

    #[test]
    fn test_unknown_name_falls_back_to_first() {
        assert_eq!(pattern_by_name("polka").name, PATTERNS[0].name);
        assert_eq!(pattern_by_name("").name, "Block Chord");
    }

    #[test]
    fn test_slot_clamping() {
        let block = pattern_by_name("Block Chord");
        assert_eq!(block.onset(0), 0.0);
        assert_eq!(block.onset(5), 0.0);
        assert_eq!(block.duration(5), 1.0);

        let syncopated = pattern_by_name("Syncopated");
        assert_eq!(syncopated.onset(9), 0.625);
        assert_eq!(syncopated.duration(9), 0.5);
    }
}
