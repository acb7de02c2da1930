// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Oscillator voices and the shared voice bank.
//!
//! Each sounding note is a [`Voice`]: a stack of phase-accumulated
//! partials shaped by a piecewise-linear envelope. The [`VoiceBank`]
//! owns every active voice, sums them through the master limiter and
//! volume stage, and drops voices once their release tail ends.

use std::f64::consts::PI;

use crate::music::MidiNote;
use crate::rhythm::{PatternCategory, RhythmPattern};

use super::limiter::Limiter;

/// Envelope attack time in seconds for full playback.
const ATTACK_S: f64 = 0.02;
/// Shorter attack for chord previews.
const PREVIEW_ATTACK_S: f64 = 0.01;
/// Release tail in seconds for full playback.
const RELEASE_S: f64 = 0.25;
/// Shorter release for chord previews.
const PREVIEW_RELEASE_S: f64 = 0.08;
/// Sustain ends this many seconds before the nominal note end.
const SUSTAIN_TRIM_S: f64 = 0.3;
/// Preview variant of the sustain trim.
const PREVIEW_SUSTAIN_TRIM_S: f64 = 0.1;
/// Sustain level as a fraction of the attack peak.
const SUSTAIN_LEVEL: f64 = 0.85;
/// Per-chord gain before dividing by note count.
const FULL_GAIN: f64 = 0.08;
/// Quieter gain for previews.
const PREVIEW_GAIN: f64 = 0.03;
/// Detune spread for the pad chorus, in cents.
const PAD_DETUNE_CENTS: f64 = 8.0;

/// Convert a MIDI note number to frequency in Hz.
///
/// Standard equal-tempered tuning: A4 (MIDI 69) = 440 Hz.
pub fn midi_to_freq(note: MidiNote) -> f64 {
    440.0 * 2.0_f64.powf((note as f64 - 69.0) / 12.0)
}

/// Waveform shapes used by the instrument recipes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Triangle,
    Sawtooth,
}

/// Generate a single sample for the given waveform at the specified phase.
///
/// `phase` is in `[0.0, 1.0)`, one full cycle. Returns a value in
/// `[-1.0, 1.0]`.
pub fn oscillator(waveform: Waveform, phase: f64) -> f64 {
    match waveform {
        Waveform::Sine => (phase * 2.0 * PI).sin(),
        Waveform::Triangle => {
            if phase < 0.25 {
                4.0 * phase
            } else if phase < 0.75 {
                2.0 - 4.0 * phase
            } else {
                4.0 * phase - 4.0
            }
        }
        Waveform::Sawtooth => 2.0 * phase - 1.0,
    }
}

/// One oscillator in an instrument recipe: a frequency ratio relative to
/// the note fundamental, a mix weight, and a waveform.
#[derive(Debug, Clone, Copy)]
struct Partial {
    ratio: f64,
    weight: f64,
    waveform: Waveform,
}

/// Harmonic ratios for the organ drawbar stack.
const ORGAN_RATIOS: [f64; 6] = [1.0, 2.0, 1.5, 4.0, 2.67, 8.0];
/// Mix weights matching [`ORGAN_RATIOS`] position by position.
const ORGAN_WEIGHTS: [f64; 6] = [0.8, 0.6, 0.4, 0.3, 0.2, 0.15];

/// Selectable instrument timbres.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instrument {
    /// Single sine partial.
    Sine,
    /// Three detuned partials mixing triangle and sawtooth.
    WarmPad,
    /// Additive harmonic stack.
    Organ,
}

impl Instrument {
    /// All instruments in catalog order.
    pub const ALL: [Instrument; 3] = [Instrument::Sine, Instrument::WarmPad, Instrument::Organ];

    /// Stable identifier used in config files and CLI flags.
    pub fn id(&self) -> &'static str {
        match self {
            Instrument::Sine => "sine",
            Instrument::WarmPad => "warm-pad",
            Instrument::Organ => "organ",
        }
    }

    /// Human-readable display name.
    pub fn name(&self) -> &'static str {
        match self {
            Instrument::Sine => "Sine Wave",
            Instrument::WarmPad => "Warm Pad",
            Instrument::Organ => "Organ",
        }
    }

    /// Look up an instrument by identifier.
    ///
    /// Unknown ids fall back to the first catalog entry rather than
    /// failing, so stale config values still produce sound.
    pub fn from_id(id: &str) -> Instrument {
        let normalized = id.trim().to_lowercase().replace([' ', '_'], "-");
        match normalized.as_str() {
            "sine" | "sine-wave" => Instrument::Sine,
            "warm-pad" => Instrument::WarmPad,
            "organ" => Instrument::Organ,
            _ => Instrument::Sine,
        }
    }

    /// Oscillator recipe for this timbre.
    fn partials(&self) -> Vec<Partial> {
        match self {
            Instrument::Sine => vec![Partial {
                ratio: 1.0,
                weight: 1.0,
                waveform: Waveform::Sine,
            }],
            Instrument::WarmPad => {
                let up = 2.0_f64.powf(PAD_DETUNE_CENTS / 1200.0);
                let down = 2.0_f64.powf(-PAD_DETUNE_CENTS / 1200.0);
                vec![
                    Partial {
                        ratio: down,
                        weight: 0.3,
                        waveform: Waveform::Triangle,
                    },
                    Partial {
                        ratio: 1.0,
                        weight: 0.4,
                        waveform: Waveform::Sawtooth,
                    },
                    Partial {
                        ratio: up,
                        weight: 0.3,
                        waveform: Waveform::Triangle,
                    },
                ]
            }
            Instrument::Organ => ORGAN_RATIOS
                .iter()
                .zip(ORGAN_WEIGHTS.iter())
                .map(|(&ratio, &weight)| Partial {
                    ratio,
                    weight,
                    waveform: Waveform::Sine,
                })
                .collect(),
        }
    }
}

/// Phase-accumulating state for one partial of a voice.
#[derive(Debug, Clone)]
struct PartialState {
    weight: f64,
    freq: f64,
    waveform: Waveform,
    phase: f64,
}

/// A stop request captured mid-envelope: fade from `level` to zero over
/// the voice's release window, starting at voice-local sample `start`.
#[derive(Debug, Clone, Copy)]
struct ForcedRelease {
    start: u64,
    level: f64,
}

/// One sounding note: partial stack plus envelope position.
#[derive(Debug, Clone)]
struct Voice {
    partials: Vec<PartialState>,
    sample_rate: f64,
    /// Samples of silence before the note speaks (strum/arpeggio delay).
    onset_samples: u64,
    attack_samples: u64,
    sustain_end_samples: u64,
    release_samples: u64,
    peak: f64,
    /// Samples rendered since the chord started.
    position: u64,
    forced_release: Option<ForcedRelease>,
    finished: bool,
}

impl Voice {
    fn new(
        note: MidiNote,
        instrument: Instrument,
        sample_rate: f64,
        onset_s: f64,
        duration_s: f64,
        preview: bool,
        peak: f64,
    ) -> Self {
        let freq = midi_to_freq(note);
        let partials = instrument
            .partials()
            .into_iter()
            .map(|p| PartialState {
                weight: p.weight,
                freq: freq * p.ratio,
                waveform: p.waveform,
                phase: 0.0,
            })
            .collect();

        let (attack_s, release_s, trim_s) = if preview {
            (PREVIEW_ATTACK_S, PREVIEW_RELEASE_S, PREVIEW_SUSTAIN_TRIM_S)
        } else {
            (ATTACK_S, RELEASE_S, SUSTAIN_TRIM_S)
        };
        let sustain_end_s = (duration_s - trim_s).max(attack_s);

        let to_samples = |s: f64| (s * sample_rate).round() as u64;
        let attack_samples = to_samples(attack_s).max(1);
        Self {
            partials,
            sample_rate,
            onset_samples: to_samples(onset_s.max(0.0)),
            attack_samples,
            sustain_end_samples: to_samples(sustain_end_s).max(attack_samples),
            release_samples: to_samples(release_s).max(1),
            peak,
            position: 0,
            forced_release: None,
            finished: false,
        }
    }

    /// Envelope level at voice-local sample `t`, ignoring forced release.
    /// Only valid below `sustain_end + release`.
    fn natural_level(&self, t: u64) -> f64 {
        if t < self.attack_samples {
            return self.peak * t as f64 / self.attack_samples as f64;
        }
        if t < self.sustain_end_samples {
            let span = (self.sustain_end_samples - self.attack_samples).max(1) as f64;
            let frac = (t - self.attack_samples) as f64 / span;
            return self.peak * (1.0 - frac * (1.0 - SUSTAIN_LEVEL));
        }
        let dt = (t - self.sustain_end_samples) as f64;
        self.peak * SUSTAIN_LEVEL * (1.0 - dt / self.release_samples as f64)
    }

    /// Render the next sample and advance the envelope and phases.
    fn next_sample(&mut self) -> f32 {
        if self.finished {
            return 0.0;
        }
        let pos = self.position;
        self.position += 1;
        if pos < self.onset_samples {
            return 0.0;
        }
        let t = pos - self.onset_samples;

        let level = match self.forced_release {
            Some(rel) => {
                let dt = t.saturating_sub(rel.start);
                if dt >= self.release_samples {
                    self.finished = true;
                    return 0.0;
                }
                rel.level * (1.0 - dt as f64 / self.release_samples as f64)
            }
            None => {
                if t >= self.sustain_end_samples + self.release_samples {
                    self.finished = true;
                    return 0.0;
                }
                self.natural_level(t)
            }
        };

        let mut sample = 0.0;
        for partial in &mut self.partials {
            sample += partial.weight * oscillator(partial.waveform, partial.phase);
            partial.phase = (partial.phase + partial.freq / self.sample_rate).fract();
        }
        (sample * level) as f32
    }

    /// Force the voice into its release segment from the current level.
    ///
    /// Voices that have not spoken yet (still inside the onset delay)
    /// just finish silently. Already-finished voices are untouched.
    fn release_now(&mut self) {
        if self.finished || self.forced_release.is_some() {
            return;
        }
        if self.position < self.onset_samples {
            self.finished = true;
            return;
        }
        let t = self.position - self.onset_samples;
        if t >= self.sustain_end_samples + self.release_samples {
            self.finished = true;
            return;
        }
        let level = self.natural_level(t);
        if level <= 0.0 {
            self.finished = true;
            return;
        }
        self.forced_release = Some(ForcedRelease { start: t, level });
    }

    fn finished(&self) -> bool {
        self.finished
    }
}

/// Expand a chord into `(note, slot)` pairs per the pattern's shape.
///
/// Block chords, strums, and plain arpeggios keep the given ascending
/// order. The down arpeggio reverses it. The broken-chord figure walks
/// root, fifth, third, seventh. Waltz plays the root alone on the
/// downbeat, then the full upper voicing on each remaining slot.
fn pattern_order(notes: &[MidiNote], pattern: &RhythmPattern) -> Vec<(MidiNote, usize)> {
    if notes.is_empty() {
        return Vec::new();
    }
    if pattern.category == PatternCategory::Waltz {
        let mut pairs = vec![(notes[0], 0)];
        for slot in 1..pattern.slots() {
            for &note in &notes[1..] {
                pairs.push((note, slot));
            }
        }
        return pairs;
    }
    match pattern.name {
        "Down Arpeggio" => notes
            .iter()
            .rev()
            .enumerate()
            .map(|(slot, &note)| (note, slot))
            .collect(),
        "Broken Chord" => {
            let mut order: Vec<usize> = [0usize, 2, 1, 3]
                .iter()
                .copied()
                .filter(|&i| i < notes.len())
                .collect();
            order.extend(4..notes.len());
            order
                .into_iter()
                .enumerate()
                .map(|(slot, i)| (notes[i], slot))
                .collect()
        }
        _ => notes
            .iter()
            .enumerate()
            .map(|(slot, &note)| (note, slot))
            .collect(),
    }
}

/// All active voices plus the master limiter and volume stage.
///
/// Shared between the control thread and the audio callback behind a
/// mutex; every method is a short, lock-friendly operation.
#[derive(Debug)]
pub struct VoiceBank {
    voices: Vec<Voice>,
    limiter: Limiter,
    master_volume: f32,
    sample_rate: f64,
}

impl VoiceBank {
    /// Create an empty bank rendering at `sample_rate`.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            voices: Vec::new(),
            limiter: Limiter::new(sample_rate as f32),
            master_volume: 0.7,
            sample_rate: sample_rate as f64,
        }
    }

    /// Begin sounding a chord, releasing whatever was playing first.
    ///
    /// `duration_ms` covers the whole figure; slot onsets and durations
    /// are fractions of it. `preview` selects the quieter, snappier
    /// envelope.
    pub fn start_chord(
        &mut self,
        notes: &[MidiNote],
        duration_ms: f64,
        preview: bool,
        pattern: &RhythmPattern,
        instrument: Instrument,
    ) {
        self.release_all();
        if notes.is_empty() {
            return;
        }
        let total_s = (duration_ms / 1000.0).max(0.0);
        let gain = if preview { PREVIEW_GAIN } else { FULL_GAIN };
        let peak = gain / notes.len() as f64;

        for (note, slot) in pattern_order(notes, pattern) {
            let onset_s = pattern.onset(slot) * total_s;
            let note_s = pattern.duration(slot) * total_s;
            self.voices.push(Voice::new(
                note,
                instrument,
                self.sample_rate,
                onset_s,
                note_s,
                preview,
                peak,
            ));
        }
    }

    /// Send every active voice into its release tail.
    pub fn release_all(&mut self) {
        for voice in &mut self.voices {
            voice.release_now();
        }
    }

    /// Render interleaved frames into `buffer`, mixing every voice
    /// through the limiter and master volume. The same mono sample is
    /// written to each channel of a frame. Finished voices are dropped.
    pub fn mix_into(&mut self, buffer: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for frame in buffer.chunks_mut(channels) {
            let mut sum = 0.0_f32;
            for voice in &mut self.voices {
                sum += voice.next_sample();
            }
            let out = self.limiter.process(sum) * self.master_volume;
            for slot in frame.iter_mut() {
                *slot = out;
            }
        }
        self.voices.retain(|voice| !voice.finished());
    }

    /// Set the master volume, clamped to `[0.0, 1.0]`. Takes effect on
    /// the next rendered sample, including notes already sounding.
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    /// Current master volume.
    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Number of voices still sounding or in their release tail.
    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Sample rate the bank renders at.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }
}
