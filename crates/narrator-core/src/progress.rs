//! Per-document narration progress.
//!
//! One JSON record per document key, stored under `<root>/<sha256(key)>/`
//! so arbitrary file names never touch the filesystem directly. Records are
//! advisory: anything that fails to parse or validate reads back as absent.

use crate::speech::PlaybackParams;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

pub const PROGRESS_RECORD_VERSION: u32 = 1;
const PROGRESS_FILE: &str = "progress.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub version: u32,
    /// Index of the next sentence to narrate.
    pub index: usize,
    pub rate: f32,
    pub pitch: f32,
    pub volume: f32,
    pub voice: Option<String>,
    pub saved_at_ms: u64,
}

impl ProgressRecord {
    pub fn new(index: usize, params: &PlaybackParams) -> Self {
        let saved_at_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self {
            version: PROGRESS_RECORD_VERSION,
            index,
            rate: params.rate,
            pitch: params.pitch,
            volume: params.volume,
            voice: params.voice.clone(),
            saved_at_ms,
        }
    }

    pub fn params(&self) -> PlaybackParams {
        PlaybackParams {
            rate: self.rate,
            pitch: self.pitch,
            volume: self.volume,
            voice: self.voice.clone(),
        }
        .clamped()
    }

    fn is_valid(&self) -> bool {
        self.version == PROGRESS_RECORD_VERSION
            && self.rate.is_finite()
            && self.pitch.is_finite()
            && self.volume.is_finite()
    }
}

/// Parse a stored record, treating malformed or foreign-version data as absent.
pub fn parse_record(raw: &str) -> Option<ProgressRecord> {
    match serde_json::from_str::<ProgressRecord>(raw) {
        Ok(record) if record.is_valid() => Some(record),
        Ok(record) => {
            tracing::warn!(
                version = record.version,
                "Ignoring progress record with unsupported version or values"
            );
            None
        }
        Err(err) => {
            tracing::warn!("Ignoring malformed progress record: {err}");
            None
        }
    }
}

pub trait ProgressStore {
    fn load(&self, key: &str) -> Option<ProgressRecord>;
    fn save(&mut self, key: &str, record: &ProgressRecord) -> Result<()>;
}

/// Progress records on disk, one directory per hashed document key.
#[derive(Debug, Clone)]
pub struct FileProgressStore {
    root: PathBuf,
}

impl FileProgressStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn record_path(&self, key: &str) -> PathBuf {
        key_dir(&self.root, key).join(PROGRESS_FILE)
    }
}

impl ProgressStore for FileProgressStore {
    fn load(&self, key: &str) -> Option<ProgressRecord> {
        let path = self.record_path(key);
        let data = fs::read_to_string(&path).ok()?;
        let record = parse_record(&data)?;
        tracing::debug!(path = %path.display(), index = record.index, "Loaded progress record");
        Some(record)
    }

    fn save(&mut self, key: &str, record: &ProgressRecord) -> Result<()> {
        let path = self.record_path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Creating progress dir {}", parent.display()))?;
        }
        let payload = serde_json::to_string(record).context("Serializing progress record")?;
        fs::write(&path, payload)
            .with_context(|| format!("Writing progress record {}", path.display()))?;
        Ok(())
    }
}

/// In-process store; keeps raw JSON so it behaves like the file store.
#[derive(Debug, Clone, Default)]
pub struct MemoryProgressStore {
    records: HashMap<String, String>,
}

impl MemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_raw(&mut self, key: &str, raw: impl Into<String>) {
        self.records.insert(key.to_string(), raw.into());
    }
}

impl ProgressStore for MemoryProgressStore {
    fn load(&self, key: &str) -> Option<ProgressRecord> {
        self.records.get(key).and_then(|raw| parse_record(raw))
    }

    fn save(&mut self, key: &str, record: &ProgressRecord) -> Result<()> {
        let payload = serde_json::to_string(record)?;
        self.records.insert(key.to_string(), payload);
        Ok(())
    }
}

pub fn key_dir(root: &Path, key: &str) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    root.join(format!("{:x}", hasher.finalize()))
}
