// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Scale catalog for progression generation.
//!
//! Each scale pairs its semitone intervals with a parallel list of
//! diatonic chord qualities, one per degree. The two lists are always
//! the same length.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::chord::ChordQuality;

/// Errors from theory-level lookups
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TheoryError {
    /// Progressions cannot be generated without the scale's interval
    /// data, so this is the one lookup that refuses to fall back.
    #[error("unknown scale: {0}")]
    UnknownScale(String),
}

/// Scales supported by the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScaleType {
    // Major scale and modes
    Major,
    Dorian,
    Phrygian,
    Lydian,
    Mixolydian,
    Minor, // Aeolian
    Locrian,

    // Other minor scales
    HarmonicMinor,
    MelodicMinor, // Ascending form

    // Pentatonic and blues
    PentatonicMajor,
    PentatonicMinor,
    Blues,
}

impl ScaleType {
    /// All scales in catalog order
    pub const ALL: [ScaleType; 12] = [
        ScaleType::Major,
        ScaleType::Minor,
        ScaleType::HarmonicMinor,
        ScaleType::MelodicMinor,
        ScaleType::Dorian,
        ScaleType::Phrygian,
        ScaleType::Lydian,
        ScaleType::Mixolydian,
        ScaleType::Locrian,
        ScaleType::PentatonicMajor,
        ScaleType::PentatonicMinor,
        ScaleType::Blues,
    ];

    /// Get the intervals (semitones from root) for this scale
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ScaleType::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleType::Minor => &[0, 2, 3, 5, 7, 8, 10],
            ScaleType::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            ScaleType::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            ScaleType::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            ScaleType::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            ScaleType::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            ScaleType::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            ScaleType::Locrian => &[0, 1, 3, 5, 6, 8, 10],
            ScaleType::PentatonicMajor => &[0, 2, 4, 7, 9],
            ScaleType::PentatonicMinor => &[0, 3, 5, 7, 10],
            ScaleType::Blues => &[0, 3, 5, 6, 7, 10],
        }
    }

    /// Diatonic chord quality for each scale degree, parallel to
    /// `intervals()`
    pub fn chord_qualities(self) -> &'static [ChordQuality] {
        use ChordQuality::{Aug, Dim, Maj, Min};
        match self {
            ScaleType::Major => &[Maj, Min, Min, Maj, Maj, Min, Dim],
            ScaleType::Minor => &[Min, Dim, Maj, Min, Min, Maj, Maj],
            ScaleType::HarmonicMinor => &[Min, Dim, Aug, Min, Maj, Maj, Dim],
            ScaleType::MelodicMinor => &[Min, Min, Aug, Maj, Maj, Dim, Dim],
            ScaleType::Dorian => &[Min, Min, Maj, Maj, Min, Dim, Maj],
            ScaleType::Phrygian => &[Min, Maj, Maj, Min, Dim, Maj, Min],
            ScaleType::Lydian => &[Maj, Maj, Min, Dim, Maj, Min, Min],
            ScaleType::Mixolydian => &[Maj, Min, Dim, Maj, Min, Min, Maj],
            ScaleType::Locrian => &[Dim, Maj, Min, Min, Maj, Maj, Min],
            ScaleType::PentatonicMajor => &[Maj, Min, Min, Maj, Min],
            ScaleType::PentatonicMinor => &[Min, Maj, Maj, Min, Maj],
            ScaleType::Blues => &[Min, Maj, Maj, Dim, Maj, Maj],
        }
    }

    /// Catalog id, as used in settings and saved snapshots
    pub fn id(self) -> &'static str {
        match self {
            ScaleType::Major => "major",
            ScaleType::Minor => "minor",
            ScaleType::HarmonicMinor => "harmonic-minor",
            ScaleType::MelodicMinor => "melodic-minor",
            ScaleType::Dorian => "dorian",
            ScaleType::Phrygian => "phrygian",
            ScaleType::Lydian => "lydian",
            ScaleType::Mixolydian => "mixolydian",
            ScaleType::Locrian => "locrian",
            ScaleType::PentatonicMajor => "pentatonic-major",
            ScaleType::PentatonicMinor => "pentatonic-minor",
            ScaleType::Blues => "blues",
        }
    }

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            ScaleType::Major => "Major",
            ScaleType::Minor => "Natural Minor",
            ScaleType::HarmonicMinor => "Harmonic Minor",
            ScaleType::MelodicMinor => "Melodic Minor",
            ScaleType::Dorian => "Dorian",
            ScaleType::Phrygian => "Phrygian",
            ScaleType::Lydian => "Lydian",
            ScaleType::Mixolydian => "Mixolydian",
            ScaleType::Locrian => "Locrian",
            ScaleType::PentatonicMajor => "Pentatonic Major",
            ScaleType::PentatonicMinor => "Pentatonic Minor",
            ScaleType::Blues => "Blues",
        }
    }

    /// Parse a scale id (tolerant of case and separator style)
    pub fn from_id(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase().replace([' ', '_'], "-");
        ScaleType::ALL.iter().copied().find(|scale| scale.id() == s)
    }

    /// Resolve a scale id or fail with `UnknownScale`
    pub fn lookup(s: &str) -> Result<Self, TheoryError> {
        ScaleType::from_id(s).ok_or_else(|| TheoryError::UnknownScale(s.to_string()))
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
