// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Real-time audio: voice synthesis, limiting, and device output.
//!
//! [`AudioSession`] owns the shared [`VoiceBank`] and, lazily on first
//! play, a cpal output stream whose callback drains the bank. Sessions
//! can also run offline with no device, rendering blocks directly; the
//! test suites rely on that mode.

pub mod limiter;
pub mod output;
pub mod synth;

pub use output::{list_devices, AudioConfig, AudioOutput};
pub use synth::{midi_to_freq, oscillator, Instrument, VoiceBank, Waveform};

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tracing::info;

use crate::music::MidiNote;
use crate::rhythm::RhythmPattern;

/// Sample rate used when no device is opened.
const OFFLINE_SAMPLE_RATE: u32 = 44_100;

/// Audio device and session errors.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoDevice,

    #[error("audio initialization failed: {0}")]
    InitFailed(String),

    #[error("audio stream failed: {0}")]
    StreamFailed(String),

    #[error("audio state lock poisoned")]
    LockFailed,
}

/// Shared audio state: one voice bank, one master volume, at most one
/// output stream.
///
/// The bank sits behind a mutex because the cpal callback renders from
/// its own thread; every control-side operation is a short lock-and-poke.
pub struct AudioSession {
    bank: Arc<Mutex<VoiceBank>>,
    output: Option<AudioOutput>,
    /// Whether play calls should open a device stream.
    live: bool,
}

impl AudioSession {
    /// Create a live session. The device stream opens lazily on the
    /// first chord, so construction never touches audio hardware.
    pub fn new() -> Self {
        Self {
            bank: Arc::new(Mutex::new(VoiceBank::new(OFFLINE_SAMPLE_RATE))),
            output: None,
            live: true,
        }
    }

    /// Create a device-free session rendering at `sample_rate`.
    ///
    /// Voices behave exactly as in live mode; callers pull samples with
    /// [`render_block`](AudioSession::render_block).
    pub fn offline(sample_rate: u32) -> Self {
        Self {
            bank: Arc::new(Mutex::new(VoiceBank::new(sample_rate))),
            output: None,
            live: false,
        }
    }

    /// Open the output stream if this session is live and has none yet.
    ///
    /// The device's native sample rate wins; if it differs from the
    /// bank's provisional rate the (still empty) bank is rebuilt.
    fn ensure_started(&mut self) -> Result<(), AudioError> {
        if !self.live || self.output.is_some() {
            return Ok(());
        }

        let bank = Arc::clone(&self.bank);
        let output = AudioOutput::new(AudioConfig::default(), move |buffer, channels| {
            if let Ok(mut bank) = bank.lock() {
                bank.mix_into(buffer, channels);
            }
        })?;

        let rate = output.sample_rate();
        {
            let mut bank = self.bank.lock().map_err(|_| AudioError::LockFailed)?;
            if bank.sample_rate() != rate as f64 {
                let volume = bank.master_volume();
                let mut fresh = VoiceBank::new(rate);
                fresh.set_master_volume(volume);
                *bank = fresh;
            }
        }

        info!(
            sample_rate = rate,
            latency_ms = output.config().latency_ms(),
            "audio stream started"
        );
        self.output = Some(output);
        Ok(())
    }

    /// Start a chord: release anything sounding, then schedule voices
    /// for each note per the rhythm pattern and instrument.
    pub fn play_chord(
        &mut self,
        notes: &[MidiNote],
        duration_ms: f64,
        preview: bool,
        pattern: &RhythmPattern,
        instrument: Instrument,
    ) -> Result<(), AudioError> {
        self.ensure_started()?;
        let mut bank = self.bank.lock().map_err(|_| AudioError::LockFailed)?;
        bank.start_chord(notes, duration_ms, preview, pattern, instrument);
        Ok(())
    }

    /// Fade out every active voice. Safe to call at any time, including
    /// when nothing is sounding.
    pub fn stop_all(&mut self) {
        if let Ok(mut bank) = self.bank.lock() {
            bank.release_all();
        }
    }

    /// Set the master volume, clamped to `[0.0, 1.0]`. Audible on the
    /// next rendered buffer, in-flight notes included.
    pub fn set_master_volume(&mut self, volume: f32) {
        if let Ok(mut bank) = self.bank.lock() {
            bank.set_master_volume(volume);
        }
    }

    /// Current master volume.
    pub fn master_volume(&self) -> f32 {
        self.bank.lock().map(|bank| bank.master_volume()).unwrap_or(0.0)
    }

    /// Number of voices still sounding or fading.
    pub fn active_voices(&self) -> usize {
        self.bank.lock().map(|bank| bank.active_voices()).unwrap_or(0)
    }

    /// Render an interleaved block directly, bypassing any device.
    /// This is how offline sessions produce audio.
    pub fn render_block(&mut self, buffer: &mut [f32], channels: usize) {
        if let Ok(mut bank) = self.bank.lock() {
            bank.mix_into(buffer, channels);
        }
    }
}

impl Default for AudioSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhythm::PATTERNS;

    #[test]
    fn test_offline_session_plays_without_device() {
        let mut session = AudioSession::offline(44_100);
        session
            .play_chord(&[60, 64, 67], 900.0, false, &PATTERNS[0], Instrument::Sine)
            .unwrap();
        assert_eq!(session.active_voices(), 3);
    }

    #[test]
    fn test_stop_all_drains_voices() {
        let mut session = AudioSession::offline(44_100);
        session
            .play_chord(&[60, 64, 67], 5_000.0, false, &PATTERNS[0], Instrument::Sine)
            .unwrap();
        let mut buffer = vec![0.0_f32; 4_096];
        session.render_block(&mut buffer, 1);
        assert_eq!(session.active_voices(), 3);

        session.stop_all();
        // Render past the 0.25s release tail.
        let mut tail = vec![0.0_f32; 16_384];
        session.render_block(&mut tail, 1);
        assert_eq!(session.active_voices(), 0);

        // Stopping again with nothing sounding is a no-op.
        session.stop_all();
        assert_eq!(session.active_voices(), 0);
    }

    #[test]
    fn test_master_volume_roundtrip_and_clamp() {
        let mut session = AudioSession::offline(44_100);
        session.set_master_volume(0.4);
        assert!((session.master_volume() - 0.4).abs() < 1e-6);
        session.set_master_volume(2.0);
        assert_eq!(session.master_volume(), 1.0);
    }

    #[test]
    fn test_error_messages_name_the_failure() {
        assert!(AudioError::NoDevice.to_string().contains("device"));
        assert!(AudioError::StreamFailed("boom".into())
            .to_string()
            .contains("boom"));
    }
}
