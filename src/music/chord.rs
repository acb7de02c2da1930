// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord construction from quality, extensions, and inversion.
//!
//! Everything here is pure arithmetic over pitch classes: the same
//! inputs always produce the same sorted note list.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{note_name, MidiNote};

/// Chord qualities supported by the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChordQuality {
    // Triads
    Maj,
    Min,
    Dim,
    Aug,
    Sus2,
    Sus4,

    // Sevenths
    Maj7,
    Min7,
    Dom7,
    M7b5, // Half-diminished
    Dim7,
    Aug7,

    // Ninths
    Maj9,
    Min9,
    Dom9,
    Add9,

    // Elevenths and thirteenths
    Maj11,
    Min11,
    Maj13,
    Min13,
    Dom13,
}

impl ChordQuality {
    /// Get the intervals (semitones from the chord root) for this quality
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ChordQuality::Maj => &[0, 4, 7],
            ChordQuality::Min => &[0, 3, 7],
            ChordQuality::Dim => &[0, 3, 6],
            ChordQuality::Aug => &[0, 4, 8],
            ChordQuality::Sus2 => &[0, 2, 7],
            ChordQuality::Sus4 => &[0, 5, 7],

            ChordQuality::Maj7 => &[0, 4, 7, 11],
            ChordQuality::Min7 => &[0, 3, 7, 10],
            ChordQuality::Dom7 => &[0, 4, 7, 10],
            ChordQuality::M7b5 => &[0, 3, 6, 10],
            ChordQuality::Dim7 => &[0, 3, 6, 9],
            ChordQuality::Aug7 => &[0, 4, 8, 10],

            ChordQuality::Maj9 => &[0, 4, 7, 11, 14],
            ChordQuality::Min9 => &[0, 3, 7, 10, 14],
            ChordQuality::Dom9 => &[0, 4, 7, 10, 14],
            ChordQuality::Add9 => &[0, 4, 7, 14],

            ChordQuality::Maj11 => &[0, 4, 7, 11, 14, 17],
            ChordQuality::Min11 => &[0, 3, 7, 10, 14, 17],
            ChordQuality::Maj13 => &[0, 4, 7, 11, 14, 17, 21],
            ChordQuality::Min13 => &[0, 3, 7, 10, 14, 17, 21],
            ChordQuality::Dom13 => &[0, 4, 7, 10, 14, 17, 21],
        }
    }

    /// Parse a quality tag. Unknown tags fall back to a plain major
    /// triad, like the other tolerant catalog lookups.
    pub fn from_tag(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "min" => ChordQuality::Min,
            "dim" => ChordQuality::Dim,
            "aug" => ChordQuality::Aug,
            "sus2" => ChordQuality::Sus2,
            "sus4" => ChordQuality::Sus4,
            "maj7" => ChordQuality::Maj7,
            "min7" => ChordQuality::Min7,
            "dom7" => ChordQuality::Dom7,
            "m7b5" => ChordQuality::M7b5,
            "dim7" => ChordQuality::Dim7,
            "aug7" => ChordQuality::Aug7,
            "maj9" => ChordQuality::Maj9,
            "min9" => ChordQuality::Min9,
            "dom9" => ChordQuality::Dom9,
            "add9" => ChordQuality::Add9,
            "maj11" => ChordQuality::Maj11,
            "min11" => ChordQuality::Min11,
            "maj13" => ChordQuality::Maj13,
            "min13" => ChordQuality::Min13,
            "dom13" => ChordQuality::Dom13,
            _ => ChordQuality::Maj,
        }
    }

    /// Tag used in chord symbols and persisted snapshots
    pub fn tag(self) -> &'static str {
        match self {
            ChordQuality::Maj => "maj",
            ChordQuality::Min => "min",
            ChordQuality::Dim => "dim",
            ChordQuality::Aug => "aug",
            ChordQuality::Sus2 => "sus2",
            ChordQuality::Sus4 => "sus4",
            ChordQuality::Maj7 => "maj7",
            ChordQuality::Min7 => "min7",
            ChordQuality::Dom7 => "dom7",
            ChordQuality::M7b5 => "m7b5",
            ChordQuality::Dim7 => "dim7",
            ChordQuality::Aug7 => "aug7",
            ChordQuality::Maj9 => "maj9",
            ChordQuality::Min9 => "min9",
            ChordQuality::Dom9 => "dom9",
            ChordQuality::Add9 => "add9",
            ChordQuality::Maj11 => "maj11",
            ChordQuality::Min11 => "min11",
            ChordQuality::Maj13 => "maj13",
            ChordQuality::Min13 => "min13",
            ChordQuality::Dom13 => "dom13",
        }
    }

    /// Richer variants a plain triad may be substituted with when the
    /// generator is asked for extended harmony. Qualities without an
    /// entry are left unmodified.
    pub fn substitutions(self) -> &'static [ChordQuality] {
        match self {
            ChordQuality::Maj => &[ChordQuality::Maj7, ChordQuality::Maj9, ChordQuality::Add9],
            ChordQuality::Min => &[ChordQuality::Min7, ChordQuality::Min9],
            ChordQuality::Dim => &[ChordQuality::M7b5, ChordQuality::Dim7],
            _ => &[],
        }
    }
}

impl fmt::Display for ChordQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Extension tags that can be attached to a chord on top of its quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Extension {
    #[serde(rename = "7")]
    Seventh,
    #[serde(rename = "maj7")]
    MajorSeventh,
    #[serde(rename = "9")]
    Ninth,
    #[serde(rename = "add9")]
    AddNinth,
    #[serde(rename = "b9")]
    FlatNinth,
    #[serde(rename = "#9")]
    SharpNinth,
    #[serde(rename = "11")]
    Eleventh,
    #[serde(rename = "#11")]
    SharpEleventh,
    #[serde(rename = "b13")]
    FlatThirteenth,
    #[serde(rename = "13")]
    Thirteenth,
}

impl Extension {
    /// All extension tags, in catalog order
    pub const ALL: [Extension; 10] = [
        Extension::Seventh,
        Extension::MajorSeventh,
        Extension::Ninth,
        Extension::AddNinth,
        Extension::FlatNinth,
        Extension::SharpNinth,
        Extension::Eleventh,
        Extension::SharpEleventh,
        Extension::FlatThirteenth,
        Extension::Thirteenth,
    ];

    /// Parse an extension tag (e.g. "7", "#9", "b13")
    pub fn from_tag(s: &str) -> Option<Self> {
        match s.trim() {
            "7" => Some(Extension::Seventh),
            "maj7" => Some(Extension::MajorSeventh),
            "9" => Some(Extension::Ninth),
            "add9" => Some(Extension::AddNinth),
            "b9" => Some(Extension::FlatNinth),
            "#9" => Some(Extension::SharpNinth),
            "11" => Some(Extension::Eleventh),
            "#11" => Some(Extension::SharpEleventh),
            "b13" => Some(Extension::FlatThirteenth),
            "13" => Some(Extension::Thirteenth),
            _ => None,
        }
    }

    /// Tag string for chord symbols and persistence
    pub fn tag(self) -> &'static str {
        match self {
            Extension::Seventh => "7",
            Extension::MajorSeventh => "maj7",
            Extension::Ninth => "9",
            Extension::AddNinth => "add9",
            Extension::FlatNinth => "b9",
            Extension::SharpNinth => "#9",
            Extension::Eleventh => "11",
            Extension::SharpEleventh => "#11",
            Extension::FlatThirteenth => "b13",
            Extension::Thirteenth => "13",
        }
    }

    /// Fold this extension into an interval set derived from `quality`.
    ///
    /// Plain tensions are idempotent (skipped when the interval is
    /// already present); altered tensions always append. A bare `7`
    /// picks the major seventh only on a plain major triad.
    fn apply(self, quality: ChordQuality, intervals: &mut Vec<u8>) {
        match self {
            Extension::Seventh => {
                if !intervals.contains(&10) && !intervals.contains(&11) {
                    intervals.push(if quality == ChordQuality::Maj { 11 } else { 10 });
                }
            }
            Extension::MajorSeventh => push_unless_present(intervals, 11),
            Extension::Ninth | Extension::AddNinth => push_unless_present(intervals, 14),
            Extension::FlatNinth => intervals.push(13),
            Extension::SharpNinth => intervals.push(15),
            Extension::Eleventh => push_unless_present(intervals, 17),
            Extension::SharpEleventh => intervals.push(18),
            Extension::FlatThirteenth => intervals.push(20),
            Extension::Thirteenth => push_unless_present(intervals, 21),
        }
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

fn push_unless_present(intervals: &mut Vec<u8>, interval: u8) {
    if !intervals.contains(&interval) {
        intervals.push(interval);
    }
}

/// A voiced chord: root name, quality, extensions, inversion, and the
/// resolved note numbers (sorted ascending, 60 = middle C).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chord {
    pub root: String,
    pub quality: ChordQuality,
    #[serde(default)]
    pub extensions: Vec<Extension>,
    #[serde(default)]
    pub inversion: usize,
    pub midi_notes: Vec<MidiNote>,
}

impl Chord {
    /// Build a chord from a root pitch class, resolving its note list
    pub fn build(
        root_pc: u8,
        quality: ChordQuality,
        octave: u8,
        extensions: Vec<Extension>,
        inversion: usize,
    ) -> Self {
        let midi_notes = chord_notes(root_pc, quality, octave, &extensions, inversion);
        Chord {
            root: note_name(root_pc).to_string(),
            quality,
            extensions,
            inversion,
            midi_notes,
        }
    }

    /// Chord symbol for display (e.g. "Cmaj7", "Amin9")
    pub fn symbol(&self) -> String {
        let mut s = format!("{}{}", self.root, self.quality.tag());
        for ext in &self.extensions {
            s.push_str(ext.tag());
        }
        s
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Resolve the absolute note numbers for a chord.
///
/// The base note is `root + 12 * octave`; quality intervals come from
/// the fixed table, extensions are folded in on top, and inversion `k`
/// raises the lowest `k` notes by an octave before the final sort.
/// Inversion beyond the note count saturates at the note count.
pub fn chord_notes(
    root_pc: u8,
    quality: ChordQuality,
    octave: u8,
    extensions: &[Extension],
    inversion: usize,
) -> Vec<MidiNote> {
    let base = root_pc as u16 + 12 * octave as u16;
    let mut intervals: Vec<u8> = quality.intervals().to_vec();

    for ext in extensions {
        ext.apply(quality, &mut intervals);
    }

    let mut notes: Vec<MidiNote> = intervals
        .iter()
        .map(|&interval| (base + interval as u16).min(127) as MidiNote)
        .collect();
    notes.sort_unstable();

    for note in notes.iter_mut().take(inversion) {
        *note = note.saturating_add(12).min(127);
    }
    notes.sort_unstable();
    notes
}
