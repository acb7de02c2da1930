// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Standard MIDI file encoding for progressions.
//!
//! Builds the whole file in memory: a 14-byte header chunk plus one
//! track of block chords (channel 0) and, when the progression carries
//! a melody, a second track (channel 1). Callers decide where the bytes
//! go; nothing here touches the filesystem.

use crate::music::ChordProgression;

/// Ticks per quarter note written into the header.
const TICKS_PER_QUARTER: u32 = 96;

/// Note-on velocity for chord tones.
const CHORD_VELOCITY: u8 = 100;
/// Release velocity for every note-off.
const RELEASE_VELOCITY: u8 = 64;

/// Encode a progression as a complete standard MIDI file.
///
/// Format 0 with a single chord track, or format 1 with a chord track
/// and a melody track when a melody is attached. Each chord occupies
/// one quarter note; melody notes keep their generated beat timing.
pub fn progression_to_midi(progression: &ChordProgression) -> Vec<u8> {
    let melody_track = progression.melody.as_ref().map(|melody| {
        let mut data = Vec::new();
        let mut cursor: u32 = 0;
        for note in &melody.notes {
            let start_tick = (note.start * TICKS_PER_QUARTER as f64).round() as u32;
            let duration_ticks = (note.duration * TICKS_PER_QUARTER as f64).round() as u32;
            // Delta from the previous note-off; overlapping notes clamp
            // to zero rather than going backwards.
            write_variable_length(&mut data, start_tick.saturating_sub(cursor));
            data.extend_from_slice(&[0x91, note.note, note.velocity]);
            write_variable_length(&mut data, duration_ticks);
            data.extend_from_slice(&[0x81, note.note, RELEASE_VELOCITY]);
            cursor = start_tick + duration_ticks;
        }
        end_of_track(&mut data);
        data
    });

    let mut chord_data = Vec::new();
    for chord in &progression.chords {
        for &note in &chord.midi_notes {
            write_variable_length(&mut chord_data, 0);
            chord_data.extend_from_slice(&[0x90, note, CHORD_VELOCITY]);
        }
        for (i, &note) in chord.midi_notes.iter().enumerate() {
            let delta = if i == 0 { TICKS_PER_QUARTER } else { 0 };
            write_variable_length(&mut chord_data, delta);
            chord_data.extend_from_slice(&[0x80, note, RELEASE_VELOCITY]);
        }
    }
    end_of_track(&mut chord_data);

    let (format, ntracks) = if melody_track.is_some() {
        (1u16, 2u16)
    } else {
        (0u16, 1u16)
    };

    let mut bytes = Vec::new();
    write_header(&mut bytes, format, ntracks);
    write_track(&mut bytes, &chord_data);
    if let Some(melody_data) = melody_track {
        write_track(&mut bytes, &melody_data);
    }
    bytes
}

/// Default download filename: `progression_{key}_{scale}.mid`, with
/// slashes in enharmonic key names turned into dashes.
pub fn export_filename(progression: &ChordProgression) -> String {
    format!(
        "progression_{}_{}.mid",
        progression.key,
        progression.scale.id()
    )
    .replace('/', "-")
}

/// Write the MThd chunk.
fn write_header(out: &mut Vec<u8>, format: u16, ntracks: u16) {
    out.extend_from_slice(b"MThd");
    out.extend_from_slice(&[0, 0, 0, 6]);
    out.extend_from_slice(&format.to_be_bytes());
    out.extend_from_slice(&ntracks.to_be_bytes());
    out.extend_from_slice(&(TICKS_PER_QUARTER as u16).to_be_bytes());
}

/// Write an MTrk chunk around already-encoded event data.
fn write_track(out: &mut Vec<u8>, track_data: &[u8]) {
    out.extend_from_slice(b"MTrk");
    out.extend_from_slice(&(track_data.len() as u32).to_be_bytes());
    out.extend_from_slice(track_data);
}

/// Append the end-of-track meta event.
fn end_of_track(data: &mut Vec<u8>) {
    data.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
}

/// Write a variable-length quantity: 7 bits per byte, high bit set on
/// all but the last.
fn write_variable_length(out: &mut Vec<u8>, mut value: u32) {
    let mut bytes = Vec::new();

    bytes.push((value & 0x7F) as u8);
    value >>= 7;

    while value > 0 {
        bytes.push((value & 0x7F) as u8 | 0x80);
        value >>= 7;
    }

    bytes.reverse();
    out.extend_from_slice(&bytes);
}
