//! Bytecode digests and the JSONL run log.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::compiler::OptimizationProfile;
use crate::utils::sha256_hex;

/// Identity of one profile's bytecode without the bytecode itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDigest {
    pub profile: String,
    pub byte_len: usize,
    pub sha256: String,
}

impl ProfileDigest {
    pub fn from_hex(
        profile: OptimizationProfile,
        bytecode_hex: &str,
    ) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(bytecode_hex)?;
        Ok(ProfileDigest {
            profile: profile.name().to_string(),
            byte_len: bytes.len(),
            sha256: sha256_hex(&bytes),
        })
    }
}

/// What a command reports about one processed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLogEntry {
    pub file: PathBuf,
    pub success: bool,
    pub outcome: String,
    pub error: Option<String>,
    pub elapsed_ms: u128,
    pub digests: Vec<ProfileDigest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLogRecord {
    pub ts: String,
    pub run_id: String,
    pub command: String,
    pub file: String,
    pub success: bool,
    pub outcome: String,
    pub error: Option<String>,
    pub elapsed_ms: u128,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub digests: Vec<ProfileDigest>,
}

/// Append-only JSONL log of one command run, one record per processed file.
#[derive(Debug)]
pub struct RunLog {
    run_id: String,
    command: String,
    path: PathBuf,
    file: File,
}

impl RunLog {
    /// Create `<dir>/<command>-<timestamp>-<run id prefix>.jsonl`.
    pub fn create(dir: &Path, command: &str) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create run log directory {}", dir.display()))?;
        let run_id = uuid::Uuid::new_v4().to_string();
        let ts = Utc::now().format("%Y%m%d-%H%M%S");
        let path = dir.join(format!("{}-{}-{}.jsonl", command, ts, &run_id[..8]));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open run log {}", path.display()))?;
        Ok(RunLog {
            run_id,
            command: command.to_string(),
            path,
            file,
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&mut self, entry: RunLogEntry) -> Result<()> {
        let record = RunLogRecord {
            ts: Utc::now().to_rfc3339(),
            run_id: self.run_id.clone(),
            command: self.command.clone(),
            file: entry.file.display().to_string(),
            success: entry.success,
            outcome: entry.outcome,
            error: entry.error,
            elapsed_ms: entry.elapsed_ms,
            digests: entry.digests,
        };
        let line = serde_json::to_string(&record)?;
        writeln!(self.file, "{}", line)
            .with_context(|| format!("Failed to write run log {}", self.path.display()))?;
        Ok(())
    }

    pub fn append_all(&mut self, entries: impl IntoIterator<Item = RunLogEntry>) -> Result<()> {
        for entry in entries {
            self.append(entry)?;
        }
        Ok(())
    }
}
