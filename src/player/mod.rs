// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Progression playback scheduling.
//!
//! The [`Player`] is a poll-driven state machine over one logical
//! millisecond timeline. Starting a chord schedules a single pending
//! advance deadline; [`tick`](Player::tick) fires it when due. Chords
//! deliberately overlap: each sounds for 1.8 beats while the advance
//! lands at 85% of that, so successive chords blur together instead of
//! playing as detached blocks.

use tracing::{debug, info};

use crate::audio::{AudioError, AudioSession, Instrument};
use crate::music::Chord;
use crate::rhythm::{RhythmPattern, PATTERNS};

/// Beats each chord sustains. Longer than the advance interval on
/// purpose; the overlap is the legato feel.
const CHORD_BEATS: f64 = 1.8;
/// Fraction of a chord's duration after which the next chord starts.
const ADVANCE_RATIO: f64 = 0.85;
/// Synthesis runs slightly past the nominal duration so release tails
/// are not clipped by the note-end cutoff.
const SYNTH_TAIL: f64 = 1.1;
/// Preview chords sound for a flat second.
const PREVIEW_MS: f64 = 1000.0;
/// Slowest playable tempo in BPM.
pub const MIN_TEMPO: f64 = 20.0;
/// Fastest playable tempo in BPM.
pub const MAX_TEMPO: f64 = 300.0;
/// Tempo before any configuration is applied.
pub const DEFAULT_TEMPO: f64 = 120.0;

/// What the player is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Idle,
    Playing,
    Previewing,
}

/// The one scheduled advance: at `due_ms`, move to `next_index`.
#[derive(Debug, Clone, Copy)]
struct Advance {
    due_ms: u64,
    next_index: usize,
}

/// Steps through a progression, handing each chord to the audio session
/// and deciding when the next one starts.
pub struct Player {
    session: AudioSession,
    state: PlayState,
    looping: bool,
    tempo: f64,
    /// Index of the sounding chord, -1 when nothing from the
    /// progression is sounding.
    current_index: i32,
    chords: Vec<Chord>,
    pattern: &'static RhythmPattern,
    instrument: Instrument,
    pending: Option<Advance>,
    preview_until: Option<u64>,
}

impl Player {
    /// Create an idle player wrapping the given audio session.
    pub fn new(session: AudioSession) -> Self {
        Self {
            session,
            state: PlayState::Idle,
            looping: false,
            tempo: DEFAULT_TEMPO,
            current_index: -1,
            chords: Vec::new(),
            pattern: &PATTERNS[0],
            instrument: Instrument::Sine,
            pending: None,
            preview_until: None,
        }
    }

    /// Start playing a progression, or stop if one is already playing.
    ///
    /// The toggle mirrors a single play/stop control. An empty chord
    /// list is a no-op.
    pub fn play_progression(&mut self, chords: &[Chord], now_ms: u64) -> Result<(), AudioError> {
        if self.state == PlayState::Playing {
            self.stop_playback();
            return Ok(());
        }
        if chords.is_empty() {
            debug!("play requested with no chords");
            return Ok(());
        }
        self.chords = chords.to_vec();
        self.pending = None;
        self.preview_until = None;
        self.state = PlayState::Playing;
        info!(chords = self.chords.len(), tempo = self.tempo, "playback started");
        self.start_chord(0, now_ms)
    }

    /// Sound chord `index` and schedule the advance toward `index + 1`.
    fn start_chord(&mut self, index: usize, now_ms: u64) -> Result<(), AudioError> {
        let duration_ms = (60.0 / self.tempo) * 1000.0 * CHORD_BEATS;
        let chord = &self.chords[index];
        debug!(index, symbol = %chord.symbol(), duration_ms, "chord");
        self.session.play_chord(
            &chord.midi_notes,
            duration_ms * SYNTH_TAIL,
            false,
            self.pattern,
            self.instrument,
        )?;
        self.current_index = index as i32;
        self.pending = Some(Advance {
            due_ms: now_ms + (duration_ms * ADVANCE_RATIO).round() as u64,
            next_index: index + 1,
        });
        Ok(())
    }

    /// Advance time. Fires the pending chord advance when due and
    /// expires a finished preview. Call this frequently with a
    /// monotonically non-decreasing clock.
    pub fn tick(&mut self, now_ms: u64) -> Result<(), AudioError> {
        if self.state == PlayState::Previewing {
            if let Some(until) = self.preview_until {
                if now_ms >= until {
                    self.preview_until = None;
                    self.state = PlayState::Idle;
                }
            }
        }

        if self.state != PlayState::Playing {
            return Ok(());
        }
        let advance = match self.pending {
            Some(advance) if now_ms >= advance.due_ms => advance,
            _ => return Ok(()),
        };
        self.pending = None;

        if advance.next_index < self.chords.len() {
            self.start_chord(advance.next_index, now_ms)
        } else if self.looping {
            self.start_chord(0, now_ms)
        } else {
            // Natural end: let the final tails ring out.
            info!("playback finished");
            self.state = PlayState::Idle;
            self.current_index = -1;
            Ok(())
        }
    }

    /// Stop playback: cancel the pending advance and fade all voices.
    /// Safe to call repeatedly or when already idle.
    pub fn stop_playback(&mut self) {
        if self.state != PlayState::Idle {
            info!("playback stopped");
        }
        self.pending = None;
        self.preview_until = None;
        self.state = PlayState::Idle;
        self.current_index = -1;
        self.session.stop_all();
    }

    /// Audition a single chord for one second at preview volume.
    ///
    /// Ignored while a progression is playing. Does not touch the
    /// current index or the loop flag.
    pub fn play_chord_preview(&mut self, chord: &Chord, now_ms: u64) -> Result<(), AudioError> {
        if self.state == PlayState::Playing {
            return Ok(());
        }
        debug!(symbol = %chord.symbol(), "preview");
        self.session.play_chord(
            &chord.midi_notes,
            PREVIEW_MS,
            true,
            &PATTERNS[0],
            self.instrument,
        )?;
        self.state = PlayState::Previewing;
        self.preview_until = Some(now_ms + PREVIEW_MS as u64);
        Ok(())
    }

    /// Set the tempo in BPM, clamped to [20, 300]. Chords already
    /// scheduled keep their deadline; the change applies from the next
    /// chord on.
    pub fn set_tempo(&mut self, bpm: f64) {
        self.tempo = bpm.clamp(MIN_TEMPO, MAX_TEMPO);
    }

    /// Current tempo in BPM.
    pub fn tempo(&self) -> f64 {
        self.tempo
    }

    /// Flip the loop flag; consulted when the last chord's advance
    /// fires. Returns the new value.
    pub fn toggle_loop(&mut self) -> bool {
        self.looping = !self.looping;
        self.looping
    }

    /// Whether playback loops at the end of the progression.
    pub fn looping(&self) -> bool {
        self.looping
    }

    /// Select the rhythm pattern applied to subsequent chords.
    pub fn set_pattern(&mut self, pattern: &'static RhythmPattern) {
        self.pattern = pattern;
    }

    /// Rhythm pattern currently in use.
    pub fn pattern(&self) -> &'static RhythmPattern {
        self.pattern
    }

    /// Select the instrument applied to subsequent chords.
    pub fn set_instrument(&mut self, instrument: Instrument) {
        self.instrument = instrument;
    }

    /// Instrument currently in use.
    pub fn instrument(&self) -> Instrument {
        self.instrument
    }

    /// Forwarded to the audio session's master gain stage; audible on
    /// chords already sounding.
    pub fn set_master_volume(&mut self, volume: f32) {
        self.session.set_master_volume(volume);
    }

    /// Current master volume.
    pub fn master_volume(&self) -> f32 {
        self.session.master_volume()
    }

    /// Current playback state.
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Index of the sounding chord, or -1 when idle/previewing.
    pub fn current_chord_index(&self) -> i32 {
        self.current_index
    }

    /// Voices still sounding or in their release tail.
    pub fn active_voices(&self) -> usize {
        self.session.active_voices()
    }
}
