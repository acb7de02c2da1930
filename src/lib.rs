// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Cadence: a chord progression sketchpad.
//!
//! Generates diatonic chord progressions (with optional melodies) from
//! a scale and template catalog, plays them through a small additive
//! synthesizer, exports them as standard MIDI files, and keeps a
//! library of saved ideas.

pub mod audio;
pub mod config;
pub mod export;
pub mod library;
pub mod music;
pub mod player;
pub mod rhythm;
