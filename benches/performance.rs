// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Performance benchmarks for Cadence
//!
//! Run with: cargo bench
//!
//! These benchmarks measure:
//! - Progression and melody generation throughput
//! - MIDI file encoding
//! - Per-block synthesis cost at audio rates
//! - Limiter overhead

use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;

use cadence::audio::limiter::Limiter;
use cadence::audio::{Instrument, VoiceBank};
use cadence::export::progression_to_midi;
use cadence::music::{generate_progression, Chord, ChordQuality, Extension};
use cadence::rhythm::pattern_by_name;

/// Benchmark progression generation at several lengths
fn bench_progression_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");

    for length in [4usize, 8, 16].iter() {
        group.bench_with_input(BenchmarkId::new("chords", length), length, |b, &length| {
            b.iter_batched(
                || StdRng::seed_from_u64(7),
                |mut rng| {
                    generate_progression("C", "major", &[], length, true, false, &mut rng)
                        .unwrap()
                },
                BatchSize::SmallInput,
            )
        });

        group.bench_with_input(
            BenchmarkId::new("with_melody", length),
            length,
            |b, &length| {
                b.iter_batched(
                    || StdRng::seed_from_u64(7),
                    |mut rng| {
                        generate_progression("C", "major", &[], length, true, true, &mut rng)
                            .unwrap()
                    },
                    BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

/// Benchmark chord spelling across the quality table
fn bench_chord_construction(c: &mut Criterion) {
    let qualities = [
        ChordQuality::Maj,
        ChordQuality::Min,
        ChordQuality::Dim,
        ChordQuality::Maj7,
        ChordQuality::Min7,
        ChordQuality::Dom7,
    ];

    c.bench_function("chord_build", |b| {
        b.iter(|| {
            let mut notes = 0usize;
            for root_pc in 0..12u8 {
                for quality in qualities.iter() {
                    let chord = Chord::build(
                        black_box(root_pc),
                        *quality,
                        4,
                        vec![Extension::Ninth],
                        0,
                    );
                    notes += chord.midi_notes.len();
                }
            }
            black_box(notes)
        })
    });
}

/// Benchmark MIDI file encoding at several progression sizes
fn bench_midi_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("midi_export");

    for length in [4usize, 16, 64].iter() {
        let mut rng = StdRng::seed_from_u64(7);
        let progression =
            generate_progression("C", "major", &[], *length, true, true, &mut rng).unwrap();

        group.bench_with_input(
            BenchmarkId::from_parameter(length),
            &progression,
            |b, progression| b.iter(|| progression_to_midi(black_box(progression))),
        );
    }

    group.finish();
}

/// Benchmark rendering one audio callback worth of samples per instrument
fn bench_synthesis_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("synthesis");
    let pattern = pattern_by_name("Block Chord");

    for instrument in Instrument::ALL.iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(instrument.id()),
            instrument,
            |b, &instrument| {
                b.iter_batched(
                    || {
                        let mut bank = VoiceBank::new(44_100);
                        bank.start_chord(&[48, 60, 64, 67], 900.0, false, pattern, instrument);
                        (bank, vec![0.0f32; 512 * 2])
                    },
                    |(mut bank, mut buffer)| {
                        bank.mix_into(&mut buffer, 2);
                        black_box(buffer[0])
                    },
                    BatchSize::SmallInput,
                )
            },
        );
    }

    group.finish();
}

/// Benchmark the limiter on a hot buffer
fn bench_limiter(c: &mut Criterion) {
    let mut signal = vec![0.0f32; 512];
    for (i, sample) in signal.iter_mut().enumerate() {
        *sample = (i as f32 * 0.05).sin() * 0.9;
    }

    c.bench_function("limiter_block", |b| {
        b.iter_batched(
            || (Limiter::new(44_100.0), signal.clone()),
            |(mut limiter, mut buffer)| {
                limiter.process_block(&mut buffer);
                black_box(buffer[0])
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_progression_generation,
    bench_chord_construction,
    bench_midi_export,
    bench_synthesis_block,
    bench_limiter,
);

criterion_main!(benches);
