// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::fs;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use cadence::audio::{self, AudioSession, Instrument};
use cadence::config::AppConfig;
use cadence::export::{export_filename, progression_to_midi};
use cadence::library::{GenerationSettings, IdeaStore, SavedIdea};
use cadence::music::{
    generate_progression, template_by_name, Chord, ChordProgression, ScaleType, KEYS, TEMPLATES,
};
use cadence::player::{PlayState, Player};
use cadence::rhythm::{pattern_by_name, PATTERNS};

fn print_usage() {
    println!("cadence - chord progression sketchpad");
    println!();
    println!("Usage: cadence [--config FILE] ACTION [OPTIONS]");
    println!();
    println!("Catalogs:");
    println!("  --list-keys              List available keys");
    println!("  --list-scales            List available scales");
    println!("  --list-templates         List progression templates");
    println!("  --list-patterns          List rhythm patterns");
    println!("  --list-instruments       List instruments");
    println!("  --list-devices           List audio output devices");
    println!();
    println!("Generation:");
    println!("  --generate [KEY] [SCALE] Generate a progression (defaults from config)");
    println!("    --template NAME        Use a progression template");
    println!("    --length N             Random degrees instead of a template");
    println!("    --extensions           Allow chord extensions");
    println!("    --melody               Also generate a melody line");
    println!("    --seed N               Seed the random generator");
    println!();
    println!("Library:");
    println!("  --ideas [--folder NAME | --tag NAME]   List saved ideas");
    println!("  --load ID                Load a saved idea");
    println!("  --delete ID              Delete a saved idea");
    println!();
    println!("Attachable to --generate and --load:");
    println!("  --export [FILE]          Write a MIDI file");
    println!("  --save NAME [--folder NAME] [--tag NAME ...]");
    println!("  --play [--loop] [--tempo BPM] [--pattern NAME]");
    println!("         [--instrument ID] [--volume V]");
    println!("  --preview N              Audition chord N for one second (--load only)");
    println!();
    println!("  --help                   Show this help message");
}

fn list_keys() {
    println!("Keys:");
    for key in KEYS {
        println!("  {:>2}  {}", key.value, key.name);
    }
}

fn list_scales() {
    println!("Scales:");
    for scale in ScaleType::ALL {
        println!("  {:<18} {}", scale.id(), scale.name());
    }
}

fn list_templates() {
    println!("Progression templates:");
    for template in &TEMPLATES {
        if template.degrees.is_empty() {
            println!("  {:<16} (random degrees)", template.name);
        } else {
            println!("  {:<16} degrees {:?}", template.name, template.degrees);
        }
    }
}

fn list_patterns() {
    println!("Rhythm patterns:");
    for pattern in &PATTERNS {
        println!(
            "  {:<13} [{}]  {}",
            pattern.name, pattern.category, pattern.description
        );
    }
}

fn list_instruments() {
    println!("Instruments:");
    for instrument in Instrument::ALL {
        println!("  {:<10} {}", instrument.id(), instrument.name());
    }
}

fn list_devices() {
    let devices = audio::list_devices();
    if devices.is_empty() {
        println!("No audio output devices found");
        return;
    }
    println!("Audio output devices:");
    for (i, name) in devices.iter().enumerate() {
        println!("  {}: {}", i, name);
    }
}

/// Options that can trail `--generate` or `--load`.
#[derive(Default)]
struct ActionOptions {
    template: Option<String>,
    length: Option<usize>,
    extensions: bool,
    melody: bool,
    seed: Option<u64>,
    export: bool,
    export_file: Option<String>,
    save: Option<String>,
    folder: Option<String>,
    tags: Vec<String>,
    play: bool,
    looping: bool,
    tempo: Option<f64>,
    pattern: Option<String>,
    instrument: Option<String>,
    volume: Option<f32>,
    preview: Option<usize>,
}

/// Parse trailing flags, leaving leading positionals to the caller.
fn parse_action_options(args: &[String]) -> Result<ActionOptions> {
    let mut opts = ActionOptions::default();
    let mut i = 0;

    fn value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str> {
        *i += 1;
        match args.get(*i) {
            Some(v) if !v.starts_with("--") => {
                *i += 1;
                Ok(v)
            }
            _ => bail!("{} requires a value", flag),
        }
    }

    while i < args.len() {
        match args[i].as_str() {
            "--template" => opts.template = Some(value(args, &mut i, "--template")?.to_string()),
            "--length" => {
                let v = value(args, &mut i, "--length")?;
                opts.length = Some(v.parse().with_context(|| format!("invalid length: {}", v))?);
            }
            "--extensions" => {
                opts.extensions = true;
                i += 1;
            }
            "--melody" => {
                opts.melody = true;
                i += 1;
            }
            "--seed" => {
                let v = value(args, &mut i, "--seed")?;
                opts.seed = Some(v.parse().with_context(|| format!("invalid seed: {}", v))?);
            }
            "--export" => {
                opts.export = true;
                i += 1;
                // Optional filename.
                if let Some(v) = args.get(i) {
                    if !v.starts_with("--") {
                        opts.export_file = Some(v.clone());
                        i += 1;
                    }
                }
            }
            "--save" => opts.save = Some(value(args, &mut i, "--save")?.to_string()),
            "--folder" => opts.folder = Some(value(args, &mut i, "--folder")?.to_string()),
            "--tag" => opts.tags.push(value(args, &mut i, "--tag")?.to_string()),
            "--play" => {
                opts.play = true;
                i += 1;
            }
            "--loop" => {
                opts.looping = true;
                i += 1;
            }
            "--tempo" => {
                let v = value(args, &mut i, "--tempo")?;
                opts.tempo = Some(v.parse().with_context(|| format!("invalid tempo: {}", v))?);
            }
            "--pattern" => opts.pattern = Some(value(args, &mut i, "--pattern")?.to_string()),
            "--instrument" => {
                opts.instrument = Some(value(args, &mut i, "--instrument")?.to_string())
            }
            "--volume" => {
                let v = value(args, &mut i, "--volume")?;
                opts.volume = Some(v.parse().with_context(|| format!("invalid volume: {}", v))?);
            }
            "--preview" => {
                let v = value(args, &mut i, "--preview")?;
                opts.preview = Some(
                    v.parse()
                        .with_context(|| format!("invalid chord index: {}", v))?,
                );
            }
            other => bail!("unknown option: {}", other),
        }
    }
    Ok(opts)
}

fn print_progression(progression: &ChordProgression) {
    println!(
        "{} {} at {:.0} BPM, {} chords",
        progression.key,
        progression.scale.name(),
        progression.tempo,
        progression.chords.len()
    );
    for (i, chord) in progression.chords.iter().enumerate() {
        println!("  {:>2}. {:<10} {:?}", i + 1, chord.symbol(), chord.midi_notes);
    }
    if let Some(melody) = &progression.melody {
        println!(
            "  melody: {} notes over {:.0} beats",
            melody.notes.len(),
            melody.length_beats
        );
    }
}

fn export_progression(progression: &ChordProgression, file: Option<&str>) -> Result<()> {
    let bytes = progression_to_midi(progression);
    let name = match file {
        Some(name) => name.to_string(),
        None => export_filename(progression),
    };
    fs::write(&name, &bytes).with_context(|| format!("Failed to write MIDI file: {}", name))?;
    println!("Wrote {} bytes to {}", bytes.len(), name);
    Ok(())
}

fn save_progression(
    config: &AppConfig,
    progression: &ChordProgression,
    settings: &GenerationSettings,
    opts: &ActionOptions,
    name: &str,
    existing_id: Option<&str>,
) -> Result<()> {
    let store = IdeaStore::new(&config.library_path);
    let idea = store.save_idea(
        name,
        opts.folder.clone(),
        opts.tags.clone(),
        progression,
        settings,
        existing_id,
    )?;
    println!("Saved '{}' as {}", idea.name, idea.id);
    Ok(())
}

/// Drive the player against the wall clock until it goes idle.
///
/// Audio trouble mid-run is logged and ends playback instead of
/// surfacing as an error.
fn run_player(player: &mut Player, chords: &[Chord]) {
    let start = Instant::now();
    let mut last_index = -1;
    loop {
        let now_ms = start.elapsed().as_millis() as u64;
        if let Err(err) = player.tick(now_ms) {
            warn!("playback interrupted: {}", err);
            player.stop_playback();
            break;
        }

        let index = player.current_chord_index();
        if index != last_index {
            last_index = index;
            if let Some(chord) = usize::try_from(index).ok().and_then(|i| chords.get(i)) {
                println!("  {:>2}. {}", index + 1, chord.symbol());
            }
        }
        if player.state() == PlayState::Idle {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
}

fn play_progression(config: &AppConfig, progression: &ChordProgression, opts: &ActionOptions) {
    let mut player = Player::new(AudioSession::new());

    let pattern_name = opts.pattern.as_deref().unwrap_or(&config.rhythm_pattern);
    player.set_pattern(pattern_by_name(pattern_name));
    let instrument_id = opts.instrument.as_deref().unwrap_or(&config.instrument);
    player.set_instrument(Instrument::from_id(instrument_id));
    player.set_tempo(opts.tempo.unwrap_or(config.tempo));
    player.set_master_volume(opts.volume.unwrap_or(config.master_volume));
    if opts.looping {
        player.toggle_loop();
        println!("Looping (press Ctrl+C to stop)");
    }

    println!(
        "Playing {} chords at {:.0} BPM ({} / {})",
        progression.chords.len(),
        player.tempo(),
        player.pattern().name,
        player.instrument().name(),
    );
    if let Err(err) = player.play_progression(&progression.chords, 0) {
        warn!("playback unavailable: {}", err);
        return;
    }
    run_player(&mut player, &progression.chords);
}

fn preview_chord(progression: &ChordProgression, index: usize, opts: &ActionOptions) -> Result<()> {
    let chord = index
        .checked_sub(1)
        .and_then(|i| progression.chords.get(i))
        .ok_or_else(|| {
            anyhow!(
                "chord index {} out of range 1..={}",
                index,
                progression.chords.len()
            )
        })?;
    let mut player = Player::new(AudioSession::new());
    if let Some(id) = opts.instrument.as_deref() {
        player.set_instrument(Instrument::from_id(id));
    }
    println!("Previewing {}", chord.symbol());
    if let Err(err) = player.play_chord_preview(chord, 0) {
        warn!("preview unavailable: {}", err);
        return Ok(());
    }
    run_player(&mut player, &[]);
    Ok(())
}

fn cmd_generate(args: &[String], config: &AppConfig) -> Result<()> {
    // Leading positionals: KEY then SCALE, both optional.
    let mut positionals = Vec::new();
    let mut rest = args;
    while let Some(first) = rest.first() {
        if first.starts_with("--") || positionals.len() == 2 {
            break;
        }
        positionals.push(first.clone());
        rest = &rest[1..];
    }
    let opts = parse_action_options(rest)?;

    let key = positionals.first().cloned().unwrap_or_else(|| config.key.clone());
    let scale = positionals.get(1).cloned().unwrap_or_else(|| config.scale.clone());

    // --length requests random degrees; otherwise a template drives.
    let template_name = match (&opts.template, opts.length) {
        (Some(name), _) => name.clone(),
        (None, Some(_)) => "Random".to_string(),
        (None, None) => config.template.clone(),
    };
    let template = template_by_name(&template_name)
        .ok_or_else(|| anyhow!("unknown template: {}", template_name))?;
    let length = opts.length.unwrap_or(4);

    let add_extensions = opts.extensions || config.add_extensions;
    let want_melody = opts.melody || config.generate_melody;

    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let progression = generate_progression(
        &key,
        &scale,
        template.degrees,
        length,
        add_extensions,
        want_melody,
        &mut rng,
    )?;
    print_progression(&progression);

    if opts.export || opts.export_file.is_some() {
        export_progression(&progression, opts.export_file.as_deref())?;
    }
    if let Some(name) = &opts.save {
        let settings = GenerationSettings {
            key: key.clone(),
            scale: scale.clone(),
            template: template.name.to_string(),
            rhythm_pattern: opts
                .pattern
                .clone()
                .unwrap_or_else(|| config.rhythm_pattern.clone()),
            add_extensions,
            generate_melody: want_melody,
        };
        save_progression(config, &progression, &settings, &opts, name, None)?;
    }
    if opts.play {
        play_progression(config, &progression, &opts);
    }
    Ok(())
}

fn print_idea_line(idea: &SavedIdea) {
    let folder = idea.folder.as_deref().unwrap_or("-");
    let tags = if idea.tags.is_empty() {
        "-".to_string()
    } else {
        idea.tags.join(",")
    };
    println!(
        "  {:<16} {:<20} {:<12} {:<16} {} {} ({} chords)",
        idea.id,
        idea.name,
        folder,
        tags,
        idea.progression.key,
        idea.progression.scale.id(),
        idea.progression.chords.len()
    );
}

fn cmd_ideas(args: &[String], config: &AppConfig) -> Result<()> {
    let opts = parse_action_options(args)?;
    let store = IdeaStore::new(&config.library_path);

    let ideas = if let Some(folder) = &opts.folder {
        store.ideas_in_folder(folder)
    } else if let Some(tag) = opts.tags.first() {
        store.ideas_with_tag(tag)
    } else {
        store.ideas()
    };

    if ideas.is_empty() {
        println!("No saved ideas");
        return Ok(());
    }
    println!("Saved ideas ({}):", ideas.len());
    for idea in &ideas {
        print_idea_line(idea);
    }
    let folders = store.folders();
    if !folders.is_empty() {
        println!("Folders: {}", folders.join(", "));
    }
    let tags = store.all_tags();
    if !tags.is_empty() {
        println!("Tags: {}", tags.join(", "));
    }
    Ok(())
}

fn cmd_load(args: &[String], config: &AppConfig) -> Result<()> {
    let id = args
        .first()
        .filter(|a| !a.starts_with("--"))
        .ok_or_else(|| anyhow!("--load requires an idea id"))?;
    let opts = parse_action_options(&args[1..])?;

    let store = IdeaStore::new(&config.library_path);
    let idea = store
        .load_idea(id)
        .ok_or_else(|| anyhow!("no idea with id: {}", id))?;

    println!(
        "Loaded '{}' ({} / {})",
        idea.name, idea.settings.template, idea.settings.rhythm_pattern
    );
    print_progression(&idea.progression);

    if opts.export || opts.export_file.is_some() {
        export_progression(&idea.progression, opts.export_file.as_deref())?;
    }
    if let Some(name) = &opts.save {
        save_progression(
            config,
            &idea.progression,
            &idea.settings,
            &opts,
            name,
            Some(&idea.id),
        )?;
    }
    if let Some(index) = opts.preview {
        preview_chord(&idea.progression, index, &opts)?;
    }
    if opts.play {
        play_progression(config, &idea.progression, &opts);
    }
    Ok(())
}

fn cmd_delete(args: &[String], config: &AppConfig) -> Result<()> {
    let id = args
        .first()
        .filter(|a| !a.starts_with("--"))
        .ok_or_else(|| anyhow!("--delete requires an idea id"))?;
    let store = IdeaStore::new(&config.library_path);
    if store.delete_idea(id)? {
        println!("Deleted {}", id);
        Ok(())
    } else {
        bail!("no idea with id: {}", id)
    }
}

/// Pull a leading `--config FILE` out of the argument list.
fn extract_config_path(args: &mut Vec<String>) -> Option<String> {
    if args.len() >= 3 && args[1] == "--config" {
        let path = args[2].clone();
        args.drain(1..3);
        return Some(path);
    }
    None
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args: Vec<String> = env::args().collect();
    let config_path = extract_config_path(&mut args);
    let config = AppConfig::load_or_default(config_path.as_deref().unwrap_or("cadence.yaml"));

    if args.len() < 2 {
        println!("cadence - chord progression sketchpad");
        println!("Run with --help for usage information");
        return Ok(());
    }

    match args[1].as_str() {
        "--list-keys" => list_keys(),
        "--list-scales" => list_scales(),
        "--list-templates" => list_templates(),
        "--list-patterns" => list_patterns(),
        "--list-instruments" => list_instruments(),
        "--list-devices" => list_devices(),
        "--generate" => cmd_generate(&args[2..], &config)?,
        "--ideas" => cmd_ideas(&args[2..], &config)?,
        "--load" => cmd_load(&args[2..], &config)?,
        "--delete" => cmd_delete(&args[2..], &config)?,
        "--help" | "-h" => print_usage(),
        _ => {
            eprintln!("Unknown option: {}", args[1]);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}
