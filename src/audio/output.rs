// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Audio output via cpal.
//!
//! Owns the output device and stream. Rendering happens in the callback
//! handed in by the audio session; this module only does the plumbing.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Stream, StreamConfig};
use tracing::error;

use super::AudioError;

/// Audio output configuration.
#[derive(Debug, Clone)]
pub struct AudioConfig {
    /// Requested sample rate in Hz. The device's native rate wins when
    /// the stream opens.
    pub sample_rate: u32,
    /// Buffer size in frames.
    pub buffer_size: u32,
    /// Number of output channels.
    pub channels: u16,
}

impl AudioConfig {
    /// Callback latency implied by the buffer size, in milliseconds.
    pub fn latency_ms(&self) -> f64 {
        (self.buffer_size as f64 / self.sample_rate as f64) * 1000.0
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            buffer_size: 512,
            channels: 2,
        }
    }
}

/// A running output stream.
pub struct AudioOutput {
    /// cpal stream, kept alive for the lifetime of the output.
    _stream: Stream,
    /// Output device.
    _device: Device,
    /// Configuration actually in effect.
    config: AudioConfig,
}

impl AudioOutput {
    /// Open the default output device and start a stream.
    ///
    /// `callback` fills each interleaved buffer; it receives the buffer
    /// and the channel count. The device's native sample rate replaces
    /// the requested one, so callers should re-check
    /// [`sample_rate`](AudioOutput::sample_rate) after construction.
    pub fn new<F>(config: AudioConfig, mut callback: F) -> Result<Self, AudioError>
    where
        F: FnMut(&mut [f32], usize) + Send + 'static,
    {
        let host = cpal::default_host();

        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;

        let supported = device
            .default_output_config()
            .map_err(|e| AudioError::InitFailed(format!("no default output config: {}", e)))?;
        let sample_rate = supported.sample_rate().0;

        let stream_config = StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        };

        let channels = config.channels as usize;

        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    // Clear buffer first
                    for sample in data.iter_mut() {
                        *sample = 0.0;
                    }
                    callback(data, channels);
                },
                move |err| {
                    error!("audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::StreamFailed(format!("failed to build stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| AudioError::StreamFailed(format!("failed to start stream: {}", e)))?;

        Ok(Self {
            _stream: stream,
            _device: device,
            config: AudioConfig {
                sample_rate,
                ..config
            },
        })
    }

    /// Configuration in effect for the running stream.
    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    /// Sample rate the device is actually running at.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }
}

/// List available audio output device names.
pub fn list_devices() -> Vec<String> {
    let host = cpal::default_host();
    host.output_devices()
        .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
        .unwrap_or_default()
}
