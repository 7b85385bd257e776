//! Persistent record of application boots.
//!
//! Written by a startup action scheduled last, so a record only lands on disk
//! once every other startup action succeeded.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::startup::StartupAction;

const BOOT_FILE: &str = "boot.json";

fn default_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(".hostkit"))
        .context("no home directory for the boot record")
}

/// Contents of boot.json
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BootRecord {
    #[serde(default)]
    pub boot_count: u64,

    /// RFC 3339 time of the latest successful boot
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_boot: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_boot: Option<String>,

    /// Application version that booted first
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_version: Option<String>,
}

/// Location of boot.json.
///
/// The record is replaced through a sibling temp file and a rename, so an
/// interrupted boot leaves either the old or the new record behind.
#[derive(Debug, Clone)]
pub struct BootRecordStore {
    path: PathBuf,
}

impl BootRecordStore {
    /// Store in `cache_dir`, or in `~/.hostkit` when none is given.
    pub fn new(cache_dir: Option<String>) -> Result<Self> {
        let dir = match cache_dir {
            Some(dir) => PathBuf::from(dir),
            None => default_dir()?,
        };
        Self::in_dir(dir)
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("cannot create boot record dir {}", dir.display()))?;
        Ok(Self {
            path: dir.join(BOOT_FILE),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record; a store that was never written yields an empty one.
    pub fn read(&self) -> Result<BootRecord> {
        match fs::read_to_string(&self.path) {
            Ok(text) => serde_json::from_str(&text)
                .with_context(|| format!("{} is not a valid boot record", self.path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BootRecord::default()),
            Err(e) => Err(e).with_context(|| format!("cannot read {}", self.path.display())),
        }
    }

    pub fn write(&self, record: &BootRecord) -> Result<()> {
        let staged = self.path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(record)?;
        fs::write(&staged, bytes)
            .with_context(|| format!("cannot write {}", staged.display()))?;
        fs::rename(&staged, &self.path)
            .with_context(|| format!("cannot replace {}", self.path.display()))?;
        debug!("Boot record saved to {}", self.path.display());
        Ok(())
    }

    /// Count one more boot of `version`.
    ///
    /// An unreadable record is replaced rather than failing the boot.
    pub fn record_boot(&self, version: &str) -> Result<BootRecord> {
        let mut record = self.read().unwrap_or_else(|e| {
            warn!("Discarding unreadable boot record: {}", e);
            BootRecord::default()
        });

        let now = chrono::Utc::now().to_rfc3339();
        record.boot_count += 1;
        record.last_boot = Some(now.clone());
        if record.first_boot.is_none() {
            record.first_boot = Some(now);
            record.first_version = Some(version.to_string());
        }

        self.write(&record)?;
        Ok(record)
    }
}

/// Startup action that updates the boot record.
pub struct BootRecordAction {
    store: BootRecordStore,
    version: String,
}

impl BootRecordAction {
    pub fn new(store: BootRecordStore, version: impl Into<String>) -> Self {
        Self {
            store,
            version: version.into(),
        }
    }
}

impl StartupAction for BootRecordAction {
    fn name(&self) -> &str {
        "boot-record"
    }

    fn run(&mut self) -> Result<()> {
        let record = self.store.record_boot(&self.version)?;
        info!("Boot #{} recorded", record.boot_count);
        Ok(())
    }
}
