// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Saved-idea library.
//!
//! Ideas live in one YAML file: a flat list of named progressions plus
//! the generation settings that produced them, so an idea can be
//! reloaded or re-rolled later. Reads are tolerant: a missing or
//! damaged library comes back empty instead of failing. Every mutation
//! rewrites the whole file.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::music::ChordProgression;

/// Library persistence errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("library I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("library serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// The knobs that produced a progression, kept alongside it so the
/// idea can be regenerated with the same setup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub key: String,
    pub scale: String,
    pub template: String,
    pub rhythm_pattern: String,
    #[serde(default)]
    pub add_extensions: bool,
    #[serde(default)]
    pub generate_melody: bool,
}

/// One saved progression with its metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedIdea {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub progression: ChordProgression,
    pub settings: GenerationSettings,
    /// Milliseconds since the Unix epoch.
    pub created_at: u64,
    pub updated_at: u64,
}

/// File-backed idea collection. Cheap to construct; every operation
/// reads or rewrites the backing file.
pub struct IdeaStore {
    path: PathBuf,
}

impl IdeaStore {
    /// Create a store over the given library file. The file does not
    /// need to exist yet.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All saved ideas, in stored order.
    ///
    /// A missing file is a normal first run and reads as empty. An
    /// unreadable or malformed file also reads as empty, with a warning,
    /// so one bad write never bricks the library.
    pub fn ideas(&self) -> Vec<SavedIdea> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "library unreadable, treating as empty");
                return Vec::new();
            }
        };
        match serde_yaml::from_str(&contents) {
            Ok(ideas) => ideas,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "library malformed, treating as empty");
                Vec::new()
            }
        }
    }

    /// Save an idea, returning the stored record.
    ///
    /// With `existing_id` set and present in the library, the idea is
    /// updated in place: `created_at` is preserved and `updated_at`
    /// refreshed. Otherwise a new record is appended under a fresh id.
    pub fn save_idea(
        &self,
        name: &str,
        folder: Option<String>,
        tags: Vec<String>,
        progression: &ChordProgression,
        settings: &GenerationSettings,
        existing_id: Option<&str>,
    ) -> Result<SavedIdea, StoreError> {
        let mut ideas = self.ideas();
        let now = now_ms();

        let saved = match existing_id.and_then(|id| ideas.iter_mut().find(|idea| idea.id == id)) {
            Some(idea) => {
                idea.name = name.to_string();
                idea.folder = folder;
                idea.tags = tags;
                idea.progression = progression.clone();
                idea.settings = settings.clone();
                idea.updated_at = now;
                idea.clone()
            }
            None => {
                let idea = SavedIdea {
                    id: generate_id(),
                    name: name.to_string(),
                    folder,
                    tags,
                    progression: progression.clone(),
                    settings: settings.clone(),
                    created_at: now,
                    updated_at: now,
                };
                ideas.push(idea.clone());
                idea
            }
        };

        self.write(&ideas)?;
        Ok(saved)
    }

    /// Look up a single idea by id.
    pub fn load_idea(&self, id: &str) -> Option<SavedIdea> {
        self.ideas().into_iter().find(|idea| idea.id == id)
    }

    /// Remove an idea. Returns whether anything was deleted.
    pub fn delete_idea(&self, id: &str) -> Result<bool, StoreError> {
        let mut ideas = self.ideas();
        let before = ideas.len();
        ideas.retain(|idea| idea.id != id);
        if ideas.len() == before {
            return Ok(false);
        }
        self.write(&ideas)?;
        Ok(true)
    }

    /// Distinct folder names in use, sorted.
    pub fn folders(&self) -> Vec<String> {
        let mut folders: Vec<String> = self
            .ideas()
            .into_iter()
            .filter_map(|idea| idea.folder)
            .collect();
        folders.sort();
        folders.dedup();
        folders
    }

    /// Distinct tags in use, sorted.
    pub fn all_tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .ideas()
            .into_iter()
            .flat_map(|idea| idea.tags)
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }

    /// Ideas filed under the given folder.
    pub fn ideas_in_folder(&self, folder: &str) -> Vec<SavedIdea> {
        self.ideas()
            .into_iter()
            .filter(|idea| idea.folder.as_deref() == Some(folder))
            .collect()
    }

    /// Ideas carrying the given tag.
    pub fn ideas_with_tag(&self, tag: &str) -> Vec<SavedIdea> {
        self.ideas()
            .into_iter()
            .filter(|idea| idea.tags.iter().any(|t| t == tag))
            .collect()
    }

    fn write(&self, ideas: &[SavedIdea]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_yaml::to_string(ideas)?)?;
        Ok(())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Compact unique id: the timestamp in base 36 plus a random suffix.
fn generate_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect();
    format!("{}{}", to_base36(now_ms()), suffix)
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::{Chord, ChordQuality, ScaleType};
    use std::collections::HashSet;

    fn sample_progression() -> ChordProgression {
        ChordProgression {
            chords: vec![
                Chord::build(0, ChordQuality::Maj, 4, Vec::new(), 0),
                Chord::build(7, ChordQuality::Maj, 4, Vec::new(), 0),
            ],
            key: "C".to_string(),
            scale: ScaleType::Major,
            tempo: 120.0,
            melody: None,
        }
    }

    fn sample_settings() -> GenerationSettings {
        GenerationSettings {
            key: "C".to_string(),
            scale: "major".to_string(),
            template: "I-V-vi-IV".to_string(),
            rhythm_pattern: "Block Chord".to_string(),
            add_extensions: false,
            generate_melody: false,
        }
    }

    fn temp_store() -> (tempfile::TempDir, IdeaStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = IdeaStore::new(dir.path().join("ideas.yaml"));
        (dir, store)
    }

    #[test]
    fn test_missing_library_reads_empty() {
        let (_dir, store) = temp_store();
        assert!(store.ideas().is_empty());
        assert!(store.load_idea("nope").is_none());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let (_dir, store) = temp_store();
        let saved = store
            .save_idea(
                "First sketch",
                Some("sketches".to_string()),
                vec!["mellow".to_string()],
                &sample_progression(),
                &sample_settings(),
                None,
            )
            .unwrap();

        assert!(!saved.id.is_empty());
        assert!(saved.created_at > 0);
        assert_eq!(saved.created_at, saved.updated_at);

        let loaded = store.load_idea(&saved.id).unwrap();
        assert_eq!(loaded.name, "First sketch");
        assert_eq!(loaded.progression.chords.len(), 2);
        assert_eq!(loaded.progression.key, "C");
        assert_eq!(loaded.settings, sample_settings());
    }

    #[test]
    fn test_update_preserves_created_at() {
        let (_dir, store) = temp_store();
        let first = store
            .save_idea(
                "Draft",
                None,
                Vec::new(),
                &sample_progression(),
                &sample_settings(),
                None,
            )
            .unwrap();

        let updated = store
            .save_idea(
                "Draft v2",
                Some("keepers".to_string()),
                vec!["bright".to_string()],
                &sample_progression(),
                &sample_settings(),
                Some(&first.id),
            )
            .unwrap();

        assert_eq!(updated.id, first.id);
        assert_eq!(updated.created_at, first.created_at);
        assert!(updated.updated_at >= first.updated_at);
        assert_eq!(store.ideas().len(), 1);
        assert_eq!(store.load_idea(&first.id).unwrap().name, "Draft v2");
    }

    #[test]
    fn test_unknown_existing_id_appends() {
        let (_dir, store) = temp_store();
        store
            .save_idea(
                "Orphan update",
                None,
                Vec::new(),
                &sample_progression(),
                &sample_settings(),
                Some("missing-id"),
            )
            .unwrap();
        let ideas = store.ideas();
        assert_eq!(ideas.len(), 1);
        assert_ne!(ideas[0].id, "missing-id");
    }

    #[test]
    fn test_delete_idea() {
        let (_dir, store) = temp_store();
        let saved = store
            .save_idea(
                "Disposable",
                None,
                Vec::new(),
                &sample_progression(),
                &sample_settings(),
                None,
            )
            .unwrap();

        assert!(store.delete_idea(&saved.id).unwrap());
        assert!(store.ideas().is_empty());
        assert!(!store.delete_idea(&saved.id).unwrap());
    }

    #[test]
    fn test_folders_and_tags_sorted_unique() {
        let (_dir, store) = temp_store();
        for (name, folder, tags) in [
            ("a", Some("zeta"), vec!["warm", "slow"]),
            ("b", Some("alpha"), vec!["warm"]),
            ("c", None, vec!["bright"]),
            ("d", Some("alpha"), vec![]),
        ] {
            store
                .save_idea(
                    name,
                    folder.map(str::to_string),
                    tags.into_iter().map(str::to_string).collect(),
                    &sample_progression(),
                    &sample_settings(),
                    None,
                )
                .unwrap();
        }

        assert_eq!(store.folders(), vec!["alpha", "zeta"]);
        assert_eq!(store.all_tags(), vec!["bright", "slow", "warm"]);
        assert_eq!(store.ideas_in_folder("alpha").len(), 2);
        assert_eq!(store.ideas_with_tag("warm").len(), 2);
        assert!(store.ideas_with_tag("nonexistent").is_empty());
    }

    #[test]
    fn test_corrupt_library_reads_empty() {
        let (_dir, store) = temp_store();
        fs::write(store.path(), "][ not yaml ][").unwrap();
        assert!(store.ideas().is_empty());
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let ids: HashSet<String> = (0..100).map(|_| generate_id()).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn test_base36_digits() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
