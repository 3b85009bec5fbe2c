use anyhow::{Context, Result};
use log::debug;
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::errors::AppError;

// @module: File and artifact persistence

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Read a file to bytes
    pub fn read_bytes<P: AsRef<Path>>(path: P) -> Result<Vec<u8>> {
        fs::read(&path)
            .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write bytes to a file, creating the parent directory
    pub fn write_bytes<P: AsRef<Path>>(path: P, content: &[u8]) -> Result<()> {
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Write a string to a file, creating the parent directory
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        Self::write_bytes(path, content.as_bytes())
    }
}

/// Named byte buffers belonging to one request
pub trait ArtifactStore: Send + Sync + Debug {
    /// Store `bytes` under `name`, replacing any previous content
    fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, AppError>;

    fn load(&self, name: &str) -> Result<Vec<u8>, AppError>;

    /// Where `name` lives, whether or not it exists yet
    fn path_for(&self, name: &str) -> PathBuf;
}

/// Artifacts as files in one directory per request
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store rooted at `output_dir/<request_id>/`, created if missing
    pub fn create(output_dir: &Path, request_id: &str) -> Result<Self, AppError> {
        let dir = output_dir.join(request_id);
        fs::create_dir_all(&dir)
            .map_err(|e| AppError::File(format!("Failed to create {}: {}", dir.display(), e)))?;
        debug!("Artifact directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn checked_name(name: &str) -> Result<&str, AppError> {
        let valid = !name.is_empty()
            && name != "."
            && name != ".."
            && !name.contains(['/', '\\']);
        if valid {
            Ok(name)
        } else {
            Err(AppError::File(format!("Invalid artifact name: {:?}", name)))
        }
    }
}

impl ArtifactStore for FileStore {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<PathBuf, AppError> {
        let path = self.dir.join(Self::checked_name(name)?);
        fs::write(&path, bytes)
            .map_err(|e| AppError::File(format!("Failed to write {}: {}", path.display(), e)))?;
        debug!("Saved {} ({} bytes)", path.display(), bytes.len());
        Ok(path)
    }

    fn load(&self, name: &str) -> Result<Vec<u8>, AppError> {
        let path = self.dir.join(Self::checked_name(name)?);
        fs::read(&path).map_err(|e| AppError::File(format!("Failed to read {}: {}", path.display(), e)))
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }
}

/// File names of the artifacts of one request
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactNames {
    id: String,
}

impl ArtifactNames {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    pub fn script(&self) -> String {
        format!("{}_script.txt", self.id)
    }

    pub fn narration(&self, extension: &str) -> String {
        format!("{}.{}", self.id, extension)
    }

    pub fn transcript(&self) -> String {
        format!("{}_transcript.json", self.id)
    }

    pub fn subtitles(&self) -> String {
        format!("{}.srt", self.id)
    }

    /// Slot image, numbered from 1
    pub fn image(&self, slot: usize) -> String {
        format!("{}_img_{}.png", self.id, slot + 1)
    }

    pub fn mixed_audio(&self, extension: &str) -> String {
        format!("{}_mixed.{}", self.id, extension)
    }

    pub fn video(&self) -> String {
        format!("{}_final.mp4", self.id)
    }
}
