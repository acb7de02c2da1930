// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Master bus limiter.
//!
//! Soft-knee gain reduction with smoothed attack and release, sitting
//! between the summed voices and the master volume stage. Settings match
//! a conventional mastering-limiter curve: everything below the threshold
//! passes untouched, the knee eases in the reduction, and steep ratio
//! keeps chord stacks from clipping the output.

/// Threshold below full scale where reduction begins, in dB.
const THRESHOLD_DB: f32 = -24.0;
/// Width of the soft knee centered on the threshold, in dB.
const KNEE_DB: f32 = 30.0;
/// Compression ratio above the knee.
const RATIO: f32 = 12.0;
/// Gain reduction attack time in seconds.
const ATTACK_S: f32 = 0.003;
/// Gain reduction release time in seconds.
const RELEASE_S: f32 = 0.25;

/// Soft-knee limiter with one-pole attack/release smoothing.
///
/// Call [`process`](Limiter::process) per sample or
/// [`process_block`](Limiter::process_block) on a whole mono buffer.
#[derive(Debug, Clone)]
pub struct Limiter {
    attack_coeff: f32,
    release_coeff: f32,
    /// Current smoothed gain reduction in dB (always <= 0).
    reduction_db: f32,
}

impl Limiter {
    /// Create a limiter for the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            attack_coeff: smoothing_coeff(ATTACK_S, sample_rate),
            release_coeff: smoothing_coeff(RELEASE_S, sample_rate),
            reduction_db: 0.0,
        }
    }

    /// Process one sample, returning the limited value.
    #[inline]
    pub fn process(&mut self, sample: f32) -> f32 {
        let target = gain_reduction_db(sample);
        // Faster coefficient when clamping down, slower when letting go.
        let coeff = if target < self.reduction_db {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.reduction_db = target + coeff * (self.reduction_db - target);
        sample * db_to_linear(self.reduction_db)
    }

    /// Limit an entire buffer in-place.
    #[inline]
    pub fn process_block(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Current gain reduction in dB (0 when idle, negative under load).
    pub fn reduction_db(&self) -> f32 {
        self.reduction_db
    }

    /// Drop any held gain reduction, as after a full stop.
    pub fn reset(&mut self) {
        self.reduction_db = 0.0;
    }
}

impl Default for Limiter {
    fn default() -> Self {
        Self::new(44_100.0)
    }
}

/// One-pole coefficient for the given time constant at `sample_rate`.
fn smoothing_coeff(time_s: f32, sample_rate: f32) -> f32 {
    (-1.0 / (time_s * sample_rate)).exp()
}

/// Desired gain reduction in dB for a single sample, soft knee included.
#[inline]
fn gain_reduction_db(sample: f32) -> f32 {
    let level = sample.abs();
    if level <= 1e-6 {
        return 0.0;
    }
    let level_db = 20.0 * level.log10();
    let over = level_db - THRESHOLD_DB;
    let out_db = if 2.0 * over < -KNEE_DB {
        // Fully below the knee: unity gain.
        level_db
    } else if 2.0 * over.abs() <= KNEE_DB {
        // Inside the knee: quadratic interpolation toward the ratio slope.
        let t = over + KNEE_DB / 2.0;
        level_db + (1.0 / RATIO - 1.0) * t * t / (2.0 * KNEE_DB)
    } else {
        THRESHOLD_DB + over / RATIO
    };
    out_db - level_db
}

/// Convert decibels to a linear amplitude factor.
#[inline]
fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_signal_passes_unchanged() {
        let mut limiter = Limiter::new(44_100.0);
        // -40 dB is well below the knee; gain stays at unity.
        let quiet = 0.01;
        let out = limiter.process(quiet);
        assert!((out - quiet).abs() < 1e-4);
        assert!(limiter.reduction_db().abs() < 1e-3);
    }

    #[test]
    fn test_loud_signal_is_reduced() {
        let mut limiter = Limiter::new(44_100.0);
        let mut out = 0.0;
        // Run long enough for the attack to settle.
        for _ in 0..4_410 {
            out = limiter.process(0.9);
        }
        assert!(out < 0.9);
        assert!(limiter.reduction_db() < -1.0);
    }

    #[test]
    fn test_reduction_releases_after_peak() {
        let mut limiter = Limiter::new(44_100.0);
        for _ in 0..4_410 {
            limiter.process(0.9);
        }
        let held = limiter.reduction_db();
        // A second of silence recovers nearly all of the gain.
        for _ in 0..44_100 {
            limiter.process(0.0);
        }
        assert!(limiter.reduction_db() > held);
        assert!(limiter.reduction_db() > -1.0);
    }

    #[test]
    fn test_process_block_matches_per_sample() {
        let mut a = Limiter::new(44_100.0);
        let mut b = Limiter::new(44_100.0);
        let input: Vec<f32> = (0..256).map(|i| (i as f32 / 16.0).sin() * 0.8).collect();

        let mut block = input.clone();
        a.process_block(&mut block);
        let per_sample: Vec<f32> = input.iter().map(|&s| b.process(s)).collect();
        assert_eq!(block, per_sample);
    }

    #[test]
    fn test_reset_clears_reduction() {
        let mut limiter = Limiter::new(44_100.0);
        for _ in 0..4_410 {
            limiter.process(0.9);
        }
        assert!(limiter.reduction_db() < 0.0);
        limiter.reset();
        assert_eq!(limiter.reduction_db(), 0.0);
    }

    #[test]
    fn test_output_stays_in_sane_range() {
        let mut limiter = Limiter::new(44_100.0);
        for i in 0..44_100 {
            let x = ((i as f32) * 0.31).sin() * 1.5;
            let y = limiter.process(x);
            assert!(y.abs() <= 1.5);
            assert!(y.is_finite());
        }
    }
}
