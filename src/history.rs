use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const HISTORY_LIMIT: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandHistoryEntry {
    pub inventory_file: String,
    pub playbooks: Vec<String>,
    pub dry_run: bool,
}

impl CommandHistoryEntry {
    pub fn new(inventory_file: &str, playbooks: &[String], dry_run: bool) -> Self {
        CommandHistoryEntry {
            inventory_file: inventory_file.to_string(),
            playbooks: playbooks.to_vec(),
            dry_run,
        }
    }
}

/// The most recent runs, oldest first, backed by a file holding one JSON
/// object per line.
#[derive(Debug)]
pub struct HistoryStore {
    path: Option<PathBuf>,
    entries: Vec<CommandHistoryEntry>,
}

impl HistoryStore {
    /// A store that keeps entries in memory only.
    pub fn detached() -> Self {
        HistoryStore {
            path: None,
            entries: Vec::new(),
        }
    }

    /// A missing file is an empty history. Lines that fail to parse are skipped.
    pub fn load(path: &Path) -> Result<Self> {
        let mut store = HistoryStore {
            path: Some(path.to_path_buf()),
            entries: Vec::new(),
        };

        // decoded line by line so one bad line cannot hide the others
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(store),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()))
            }
        };

        for line in data
            .split(|b| *b == b'\n')
            .map(<[u8]>::trim_ascii)
            .filter(|line| !line.is_empty())
        {
            match serde_json::from_slice::<CommandHistoryEntry>(line) {
                Ok(entry) => store.entries.push(entry),
                Err(e) => debug!("Skipping malformed history line: {e}"),
            }
        }
        store.truncate();

        Ok(store)
    }

    /// Like [`HistoryStore::load`], but an unreadable file becomes an empty
    /// in-memory history. The file is left untouched.
    pub fn load_or_empty(path: &Path) -> Self {
        HistoryStore::load(path).unwrap_or_else(|e| {
            warn!("Could not load command history: {e:#}");
            HistoryStore::detached()
        })
    }

    pub fn entries(&self) -> &[CommandHistoryEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest_first(&self) -> impl Iterator<Item = &CommandHistoryEntry> {
        self.entries.iter().rev()
    }

    pub fn append(&mut self, entry: CommandHistoryEntry) {
        self.entries.push(entry);
        self.truncate();
    }

    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut data = String::new();
        for entry in &self.entries {
            data.push_str(&serde_json::to_string(entry)?);
            data.push('\n');
        }

        fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))
    }

    /// Appends and saves, logging instead of failing if the file cannot be
    /// written.
    pub fn record(&mut self, entry: CommandHistoryEntry) {
        self.append(entry);
        if let Err(e) = self.save() {
            warn!("Could not save command history: {e:#}");
        }
    }

    fn truncate(&mut self) {
        if self.entries.len() > HISTORY_LIMIT {
            let excess = self.entries.len() - HISTORY_LIMIT;
            self.entries.drain(..excess);
        }
    }
}
