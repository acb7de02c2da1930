// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Music theory engine.
//!
//! Pure functions that turn a key, scale, and degree template into
//! concrete chords and (optionally) a melody line. No I/O, no timing.

pub mod chord;
pub mod melody;
pub mod progression;
pub mod scale;

pub use chord::{chord_notes, Chord, ChordQuality, Extension};
pub use melody::{generate_melody, Melody, MelodyNote};
pub use progression::{
    generate_progression, template_by_name, ChordProgression, ChordTemplate, TEMPLATES,
};
pub use scale::{ScaleType, TheoryError};

/// MIDI note number type (0-127)
pub type MidiNote = u8;

/// Pitch class names in chromatic order (sharp spelling)
pub const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Name for a note's pitch class (e.g. 60 -> "C")
pub fn note_name(note: MidiNote) -> &'static str {
    NOTE_NAMES[(note % 12) as usize]
}

/// A key the user can pick: pitch class plus display name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Key {
    pub name: &'static str,
    pub value: u8,
}

/// The twelve keys, enharmonic pairs shown together
pub const KEYS: [Key; 12] = [
    Key { name: "C", value: 0 },
    Key { name: "C#/Db", value: 1 },
    Key { name: "D", value: 2 },
    Key { name: "D#/Eb", value: 3 },
    Key { name: "E", value: 4 },
    Key { name: "F", value: 5 },
    Key { name: "F#/Gb", value: 6 },
    Key { name: "G", value: 7 },
    Key { name: "G#/Ab", value: 8 },
    Key { name: "A", value: 9 },
    Key { name: "A#/Bb", value: 10 },
    Key { name: "B", value: 11 },
];

/// Resolve a key name to its pitch class.
///
/// Unknown names resolve to 0 (C) so malformed input never blocks
/// generation. Accepts either half of an enharmonic pair ("C#", "Db").
pub fn key_pitch_class(name: &str) -> u8 {
    let trimmed = name.trim();
    KEYS.iter()
        .find(|key| {
            key.name.eq_ignore_ascii_case(trimmed)
                || key
                    .name
                    .split('/')
                    .any(|part| part.eq_ignore_ascii_case(trimmed))
        })
        .map(|key| key.value)
        .unwrap_or(0)
}
