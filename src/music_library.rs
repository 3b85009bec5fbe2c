use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::ProviderError;

// @module: Background music catalogue and model-driven choice

// @struct: One catalogue entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    // @field: Identifier the model answers with
    pub id: u32,

    // @field: Audio file, relative to the catalogue file
    pub file: String,

    // @field: Mood and genre tags
    #[serde(default, deserialize_with = "keywords_from_list_or_string")]
    pub keywords: Vec<String>,

    #[serde(default)]
    pub artist: String,

    // @field: Where the track comes from (license, URL)
    #[serde(default)]
    pub source: String,
}

fn keywords_from_list_or_string<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Keywords {
        List(Vec<String>),
        Text(String),
    }

    Ok(match Keywords::deserialize(deserializer)? {
        Keywords::List(list) => list,
        Keywords::Text(text) => text
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

fn id_from_number_or_string<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Number(u32),
        Text(String),
    }

    match Id::deserialize(deserializer)? {
        Id::Number(id) => Ok(id),
        Id::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// The model's pick
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MusicChoice {
    #[serde(default)]
    pub reasoning: String,

    #[serde(deserialize_with = "id_from_number_or_string")]
    pub id: u32,
}

impl MusicChoice {
    /// Parse a model answer, tolerating code fences around the JSON
    pub fn parse(response: &str) -> Result<Self, ProviderError> {
        let start = response
            .find('{')
            .ok_or_else(|| ProviderError::ParseError(format!("No JSON object in music choice: {}", response)))?;
        let json = &response[start..];

        // Only the first object is read; fences or prose after it are ignored
        match serde_json::Deserializer::from_str(json).into_iter::<Self>().next() {
            Some(Ok(choice)) => Ok(choice),
            Some(Err(e)) => Err(ProviderError::ParseError(format!("Invalid music choice {}: {}", json, e))),
            None => Err(ProviderError::ParseError(format!("No JSON object in music choice: {}", response))),
        }
    }
}

/// Songs loaded from a catalogue file
#[derive(Debug, Clone, PartialEq)]
pub struct MusicLibrary {
    songs: Vec<Song>,
    base_dir: PathBuf,
}

impl MusicLibrary {
    pub fn new(songs: Vec<Song>, base_dir: impl Into<PathBuf>) -> Self {
        Self { songs, base_dir: base_dir.into() }
    }

    /// Load a JSON array of songs
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read music library: {}", path.display()))?;
        let songs: Vec<Song> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse music library: {}", path.display()))?;

        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        debug!("Loaded {} songs from {}", songs.len(), path.display());
        Ok(Self::new(songs, base_dir))
    }

    pub fn songs(&self) -> &[Song] {
        &self.songs
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    pub fn find(&self, id: u32) -> Option<&Song> {
        self.songs.iter().find(|s| s.id == id)
    }

    /// Catalogue as sent to the model
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(&self.songs).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn path_of(&self, song: &Song) -> PathBuf {
        self.base_dir.join(&song.file)
    }

    /// Resolve a choice to a file; unknown ids mean no music
    pub fn resolve(&self, choice: &MusicChoice) -> Option<PathBuf> {
        match self.find(choice.id) {
            Some(song) => {
                debug!("Music choice {} ({}): {}", song.id, song.file, choice.reasoning);
                Some(self.path_of(song))
            }
            None => {
                warn!("Music choice {} is not in the library, continuing without music", choice.id);
                None
            }
        }
    }
}
