// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Progression generation from a key, scale, and degree template.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::chord::{Chord, Extension};
use super::key_pitch_class;
use super::melody::{generate_melody, Melody};
use super::scale::{ScaleType, TheoryError};

/// Octave chords are voiced at (base note = root + 12 * octave)
pub const DEFAULT_OCTAVE: u8 = 4;

/// Advisory tempo written into generated progressions. Playback keeps
/// its own live tempo; this field is metadata for display and export.
pub const DEFAULT_TEMPO: f64 = 120.0;

/// Melody span allotted to each chord when a melody is requested
pub const MELODY_BEATS_PER_CHORD: f64 = 4.0;

/// Chance that a plain triad is swapped for a richer substitute
const QUALITY_SUBSTITUTION_PROB: f64 = 0.7;

/// Chance that a chord gets a tension tag on top of its quality
const EXTENSION_ATTACH_PROB: f64 = 0.4;

/// A named degree sequence (e.g. I-V-vi-IV). An empty degree list
/// means "random": the generator draws degrees itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordTemplate {
    pub name: &'static str,
    pub degrees: &'static [usize],
}

/// Built-in progression templates
pub const TEMPLATES: [ChordTemplate; 9] = [
    ChordTemplate { name: "I-V-vi-IV", degrees: &[0, 4, 5, 3] },
    ChordTemplate { name: "vi-IV-I-V", degrees: &[5, 3, 0, 4] },
    ChordTemplate { name: "ii-V-I", degrees: &[1, 4, 0] },
    ChordTemplate { name: "I-vi-IV-V", degrees: &[0, 5, 3, 4] },
    ChordTemplate { name: "iii-vi-ii-V", degrees: &[2, 5, 1, 4] },
    ChordTemplate { name: "I-IV-vi-V", degrees: &[0, 3, 5, 4] },
    ChordTemplate { name: "vi-ii-V-I", degrees: &[5, 1, 4, 0] },
    ChordTemplate { name: "I-iii-IV-V", degrees: &[0, 2, 3, 4] },
    ChordTemplate { name: "Random", degrees: &[] },
];

/// Find a template by name (case-insensitive)
pub fn template_by_name(name: &str) -> Option<&'static ChordTemplate> {
    TEMPLATES
        .iter()
        .find(|template| template.name.eq_ignore_ascii_case(name.trim()))
}

/// An ordered chord sequence with its generation context.
///
/// Immutable once produced: regeneration replaces the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordProgression {
    pub chords: Vec<Chord>,
    pub key: String,
    pub scale: ScaleType,
    pub tempo: f64,
    #[serde(default)]
    pub melody: Option<Melody>,
}

/// Generate a progression.
///
/// The key name is resolved tolerantly (unknown -> C); the scale id is
/// not, since its interval table is structurally required. Non-empty
/// `template_degrees` are used verbatim (degrees beyond the scale wrap
/// via modulo); an empty template draws `length` random degrees.
pub fn generate_progression(
    key: &str,
    scale: &str,
    template_degrees: &[usize],
    length: usize,
    add_extensions: bool,
    want_melody: bool,
    rng: &mut StdRng,
) -> Result<ChordProgression, TheoryError> {
    let key_pc = key_pitch_class(key);
    let scale_type = ScaleType::lookup(scale)?;
    let intervals = scale_type.intervals();
    let qualities = scale_type.chord_qualities();

    let degrees: Vec<usize> = if !template_degrees.is_empty() {
        template_degrees.to_vec()
    } else {
        (0..length).map(|_| rng.gen_range(0..intervals.len())).collect()
    };

    let mut chords = Vec::with_capacity(degrees.len());
    for degree in degrees {
        let idx = degree % intervals.len();
        let root_pc = (key_pc + intervals[idx]) % 12;
        let mut quality = qualities[idx];

        if add_extensions && rng.gen_bool(QUALITY_SUBSTITUTION_PROB) {
            let substitutes = quality.substitutions();
            if !substitutes.is_empty() {
                quality = substitutes[rng.gen_range(0..substitutes.len())];
            }
        }

        let extensions = if add_extensions && rng.gen_bool(EXTENSION_ATTACH_PROB) {
            let tag = if rng.gen_bool(0.5) { Extension::Ninth } else { Extension::Eleventh };
            vec![tag]
        } else {
            Vec::new()
        };

        chords.push(Chord::build(root_pc, quality, DEFAULT_OCTAVE, extensions, 0));
    }

    let melody = if want_melody {
        let total_beats = chords.len() as f64 * MELODY_BEATS_PER_CHORD;
        Some(generate_melody(key, scale_type, &chords, total_beats, rng))
    } else {
        None
    };

    Ok(ChordProgression {
        chords,
        key: key.to_string(),
        scale: scale_type,
        tempo: DEFAULT_TEMPO,
        melody,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::ChordQuality;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_axis_progression_in_c_major() {
        let progression =
            generate_progression("C", "major", &[0, 4, 5, 3], 4, false, false, &mut rng()).unwrap();

        assert_eq!(progression.chords.len(), 4);
        let roots: Vec<&str> = progression.chords.iter().map(|c| c.root.as_str()).collect();
        assert_eq!(roots, ["C", "G", "A", "F"]);
        let qualities: Vec<ChordQuality> =
            progression.chords.iter().map(|c| c.quality).collect();
        assert_eq!(
            qualities,
            [ChordQuality::Maj, ChordQuality::Maj, ChordQuality::Min, ChordQuality::Maj]
        );
        for chord in &progression.chords {
            assert!(chord.midi_notes.windows(2).all(|w| w[0] <= w[1]));
        }
        assert_eq!(progression.tempo, 120.0);
        assert!(progression.melody.is_none());
    }

    #[test]
    fn test_unknown_scale_is_an_error() {
        let result = generate_progression("C", "klingon", &[0], 1, false, false, &mut rng());
        assert_eq!(result.unwrap_err(), TheoryError::UnknownScale("klingon".into()));
    }

    #[test]
    fn test_unknown_key_falls_back_to_c() {
        let odd = generate_progression("H", "major", &[0, 4], 2, false, false, &mut rng()).unwrap();
        let c = generate_progression("C", "major", &[0, 4], 2, false, false, &mut rng()).unwrap();
        let odd_roots: Vec<_> = odd.chords.iter().map(|c| c.root.clone()).collect();
        let c_roots: Vec<_> = c.chords.iter().map(|c| c.root.clone()).collect();
        assert_eq!(odd_roots, c_roots);
    }

    #[test]
    fn test_empty_template_draws_requested_length() {
        let mut rng = rng();
        for length in [1, 4, 8, 16] {
            let progression =
                generate_progression("D", "dorian", &[], length, false, false, &mut rng).unwrap();
            assert_eq!(progression.chords.len(), length);
        }
    }

    #[test]
    fn test_random_degrees_stay_in_scale() {
        let mut rng = rng();
        let scale = ScaleType::PentatonicMinor;
        let pcs: Vec<u8> = scale.intervals().iter().map(|&i| (2 + i) % 12).collect();
        let progression =
            generate_progression("D", "pentatonic-minor", &[], 32, false, false, &mut rng).unwrap();
        for chord in &progression.chords {
            let root_pc = chord.midi_notes[0] % 12;
            assert!(pcs.contains(&root_pc), "root {} outside scale", chord.root);
        }
    }

    #[test]
    fn test_degrees_beyond_scale_wrap() {
        let wrapped =
            generate_progression("C", "major", &[7, 8], 2, false, false, &mut rng()).unwrap();
        let plain = generate_progression("C", "major", &[0, 1], 2, false, false, &mut rng()).unwrap();
        assert_eq!(wrapped.chords, plain.chords);
    }

    #[test]
    fn test_extended_qualities_come_from_substitution_tables() {
        let mut rng = rng();
        let progression =
            generate_progression("C", "major", &[], 32, true, false, &mut rng).unwrap();
        for chord in &progression.chords {
            let allowed = matches!(
                chord.quality,
                ChordQuality::Maj
                    | ChordQuality::Min
                    | ChordQuality::Dim
                    | ChordQuality::Maj7
                    | ChordQuality::Maj9
                    | ChordQuality::Add9
                    | ChordQuality::Min7
                    | ChordQuality::Min9
                    | ChordQuality::M7b5
                    | ChordQuality::Dim7
            );
            assert!(allowed, "unexpected quality {:?}", chord.quality);
            for ext in &chord.extensions {
                assert!(matches!(ext, Extension::Ninth | Extension::Eleventh));
            }
        }
    }

    #[test]
    fn test_melody_attached_on_request() {
        let progression =
            generate_progression("C", "major", &[0, 4, 5, 3], 4, false, true, &mut rng()).unwrap();
        let melody = progression.melody.expect("melody requested");
        assert_eq!(melody.length_beats, 4.0 * MELODY_BEATS_PER_CHORD);
        assert!(!melody.notes.is_empty());
    }

    #[test]
    fn test_template_catalog() {
        assert_eq!(TEMPLATES.len(), 9);
        assert_eq!(template_by_name("I-V-vi-IV").unwrap().degrees, &[0, 4, 5, 3]);
        assert_eq!(template_by_name("random").unwrap().degrees, &[] as &[usize]);
        assert!(template_by_name("nope").is_none());
    }
}
