//! Per-user conversation transcripts persisted to a JSON file.
//!
//! The whole table is rewritten on every append. Writes go to a sibling
//! `.tmp` file which is then renamed over the target, so a crash mid-write
//! leaves the previous file intact.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

/// User ID (as a string) to turns in arrival order.
pub type HistoryTable = BTreeMap<String, Vec<String>>;

#[derive(Debug)]
pub enum HistoryError {
    Read { path: PathBuf, source: std::io::Error },
    Parse { path: PathBuf, source: serde_json::Error },
    Write { path: PathBuf, source: std::io::Error },
    Serialize(serde_json::Error),
}

impl fmt::Display for HistoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "failed to read history file '{}': {}", path.display(), source)
            }
            Self::Parse { path, source } => {
                write!(f, "history file '{}' is corrupt: {}", path.display(), source)
            }
            Self::Write { path, source } => {
                write!(f, "failed to write history file '{}': {}", path.display(), source)
            }
            Self::Serialize(e) => write!(f, "failed to serialize history: {e}"),
        }
    }
}

impl std::error::Error for HistoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } | Self::Write { source, .. } => Some(source),
            Self::Parse { source, .. } | Self::Serialize(source) => Some(source),
        }
    }
}

/// Format one exchange the way it is stored and shown to the admin.
pub fn format_turn(input: &str, answer: &str) -> String {
    format!("🟢 {input}\n🔵 {answer}")
}

pub struct HistoryStore {
    path: PathBuf,
    table: HistoryTable,
}

impl HistoryStore {
    /// Load the table from `path`, or start empty if the file does not exist.
    pub fn load(path: &Path) -> Result<Self, HistoryError> {
        let path = path.to_path_buf();
        if !path.exists() {
            info!("No history file at {:?}, starting fresh", path);
            return Ok(Self {
                path,
                table: HistoryTable::new(),
            });
        }

        let json = std::fs::read_to_string(&path).map_err(|e| HistoryError::Read {
            path: path.clone(),
            source: e,
        })?;
        let table: HistoryTable = serde_json::from_str(&json).map_err(|e| HistoryError::Parse {
            path: path.clone(),
            source: e,
        })?;

        let turns: usize = table.values().map(Vec::len).sum();
        info!("Loaded history from {:?} ({} users, {} turns)", path, table.len(), turns);
        Ok(Self { path, table })
    }

    /// Append a turn for `user_id` and rewrite the file.
    ///
    /// The turn stays in memory even if persisting fails.
    pub fn append(&mut self, user_id: &str, turn: String) -> Result<(), HistoryError> {
        self.table.entry(user_id.to_string()).or_default().push(turn);
        self.save()
    }

    /// Last `n` turns for `user_id`, oldest first.
    pub fn recent(&self, user_id: &str, n: usize) -> &[String] {
        match self.table.get(user_id) {
            Some(turns) => &turns[turns.len().saturating_sub(n)..],
            None => &[],
        }
    }

    pub fn table(&self) -> &HistoryTable {
        &self.table
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<(), HistoryError> {
        // serde_json leaves non-ASCII characters unescaped
        let json = serde_json::to_string(&self.table).map_err(HistoryError::Serialize)?;

        let tmp_path = tmp_path_for(&self.path);
        let write_err = |e: std::io::Error| HistoryError::Write {
            path: tmp_path.clone(),
            source: e,
        };

        let mut file = std::fs::File::create(&tmp_path).map_err(write_err)?;
        file.write_all(json.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);

        std::fs::rename(&tmp_path, &self.path).map_err(|e| HistoryError::Write {
            path: self.path.clone(),
            source: e,
        })?;

        debug!("💾 Saved history ({} bytes)", json.len());
        Ok(())
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "history.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}
