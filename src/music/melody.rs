// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Melody generation over a chord sequence.
//!
//! Notes favor chord tones, stay within an octave of their
//! predecessor, and prefer stepwise motion over wide leaps.

use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::chord::Chord;
use super::key_pitch_class;
use super::scale::ScaleType;
use super::MidiNote;

/// Octave anchor for melody notes (middle C)
pub const MELODY_OCTAVE_ANCHOR: MidiNote = 60;

/// Chance a note is drawn from the chord rather than the scale
const CHORD_TONE_PROB: f64 = 0.7;

/// Chance a wide leap is replaced by a step when one is available
const STEP_PREFERENCE_PROB: f64 = 0.7;

/// Leaps wider than a perfect fifth trigger the step preference
const LEAP_LIMIT: i32 = 7;

/// One melody note: absolute pitch plus its place on the beat grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelodyNote {
    pub note: MidiNote,
    /// Length in beats
    pub duration: f64,
    /// Onset in beats from the start of the melody; non-decreasing
    /// across the sequence
    pub start: f64,
    /// 0-127, generated in 70-99
    pub velocity: u8,
}

/// A melody overlay for a progression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Melody {
    pub notes: Vec<MelodyNote>,
    pub key: String,
    pub scale: ScaleType,
    pub length_beats: f64,
}

/// Generate a melody across `chords`, dividing `total_beats` evenly
/// among them. Each chord gets 2-4 evenly spaced notes.
pub fn generate_melody(
    key: &str,
    scale: ScaleType,
    chords: &[Chord],
    total_beats: f64,
    rng: &mut StdRng,
) -> Melody {
    let mut melody = Melody {
        notes: Vec::new(),
        key: key.to_string(),
        scale,
        length_beats: total_beats,
    };
    if chords.is_empty() {
        return melody;
    }

    let key_pc = key_pitch_class(key);
    let scale_pcs: Vec<u8> = scale.intervals().iter().map(|&i| (key_pc + i) % 12).collect();
    let beats_per_chord = total_beats / chords.len() as f64;
    let mut prev: Option<i32> = None;

    for (chord_idx, chord) in chords.iter().enumerate() {
        let chord_start = chord_idx as f64 * beats_per_chord;
        let chord_pcs: Vec<u8> = chord.midi_notes.iter().map(|&n| n % 12).collect();
        let count = rng.gen_range(2..=4usize);
        let slot = beats_per_chord / count as f64;

        for slot_idx in 0..count {
            let start = chord_start + slot_idx as f64 * slot;

            let pc = if rng.gen_bool(CHORD_TONE_PROB) {
                chord_pcs[rng.gen_range(0..chord_pcs.len())]
            } else {
                scale_pcs[rng.gen_range(0..scale_pcs.len())]
            };
            let mut note = MELODY_OCTAVE_ANCHOR as i32 + pc as i32;

            if let Some(prev) = prev {
                // Fold into the octave around the previous note
                while note - prev > 12 {
                    note -= 12;
                }
                while prev - note > 12 {
                    note += 12;
                }

                let jump = note - prev;
                if jump.abs() > LEAP_LIMIT && rng.gen_bool(STEP_PREFERENCE_PROB) {
                    let step = rng.gen_range(1..=3);
                    let stepped = if jump > 0 { prev + step } else { prev - step };
                    let stepped_pc = stepped.rem_euclid(12) as u8;
                    // Only step onto a tone the harmony supports
                    if scale_pcs.contains(&stepped_pc) || chord_pcs.contains(&stepped_pc) {
                        note = stepped;
                    }
                }
            }

            let note = note.clamp(0, 127) as MidiNote;
            melody.notes.push(MelodyNote {
                note,
                duration: slot * rng.gen_range(0.7..1.3),
                start,
                velocity: rng.gen_range(70..=99),
            });
            prev = Some(note as i32);
        }
    }

    melody
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::{generate_progression, ChordQuality};
    use rand::SeedableRng;

    fn test_chords() -> Vec<Chord> {
        generate_progression(
            "C",
            "major",
            &[0, 4, 5, 3],
            4,
            false,
            false,
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap()
        .chords
    }

    #[test]
    fn test_start_times_non_decreasing() {
        let mut rng = StdRng::seed_from_u64(7);
        let melody = generate_melody("C", ScaleType::Major, &test_chords(), 16.0, &mut rng);
        assert!(melody.notes.windows(2).all(|w| w[0].start <= w[1].start));
    }

    #[test]
    fn test_note_count_bounds() {
        let chords = test_chords();
        let mut rng = StdRng::seed_from_u64(7);
        let melody = generate_melody("C", ScaleType::Major, &chords, 16.0, &mut rng);
        assert!(melody.notes.len() >= chords.len() * 2);
        assert!(melody.notes.len() <= chords.len() * 4);
    }

    #[test]
    fn test_velocity_and_duration_bounds() {
        let mut rng = StdRng::seed_from_u64(13);
        let melody = generate_melody("A", ScaleType::Minor, &test_chords(), 16.0, &mut rng);
        for note in &melody.notes {
            assert!((70..=99).contains(&note.velocity));
            assert!(note.duration > 0.0);
            // Longest slot is 2 beats (2 notes over 4), stretched by at most 1.3
            assert!(note.duration <= 2.0 * 1.3 + 1e-9);
        }
    }

    #[test]
    fn test_consecutive_notes_within_an_octave() {
        let mut rng = StdRng::seed_from_u64(99);
        let melody = generate_melody("C", ScaleType::Major, &test_chords(), 16.0, &mut rng);
        for pair in melody.notes.windows(2) {
            let jump = pair[1].note as i32 - pair[0].note as i32;
            assert!(jump.abs() <= 12, "jump of {} semitones", jump);
        }
    }

    #[test]
    fn test_same_seed_same_melody() {
        let chords = test_chords();
        let a = generate_melody("C", ScaleType::Major, &chords, 16.0, &mut StdRng::seed_from_u64(5));
        let b = generate_melody("C", ScaleType::Major, &chords, 16.0, &mut StdRng::seed_from_u64(5));
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_chords_yield_empty_melody() {
        let mut rng = StdRng::seed_from_u64(5);
        let melody = generate_melody("C", ScaleType::Major, &[], 16.0, &mut rng);
        assert!(melody.notes.is_empty());
        assert_eq!(melody.length_beats, 16.0);
    }

    #[test]
    fn test_first_note_near_anchor() {
        // No previous note to correct against: the first pick sits in
        // the anchor octave
        let chord = Chord::build(0, ChordQuality::Maj, 4, vec![], 0);
        let mut rng = StdRng::seed_from_u64(3);
        let melody = generate_melody("C", ScaleType::Major, &[chord], 4.0, &mut rng);
        let first = melody.notes[0].note;
        assert!((60..72).contains(&first));
    }
}
