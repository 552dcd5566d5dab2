//! Append-only feedback threads
//!
//! One JSON-lines file per item under `.postgate/threads/`. Entries are only
//! ever appended; nothing here can edit or remove one.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who wrote an entry or performed an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Human,
    Agent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub role: Role,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Human => "human",
            Role::Agent => "agent",
        }
    }
}

impl Actor {
    pub fn human(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: Role::Human,
        }
    }

    pub fn agent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: Role::Agent,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Note,
    Feedback,
    Approved,
    Posted,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Note => "note",
            EntryKind::Feedback => "feedback",
            EntryKind::Approved => "approved",
            EntryKind::Posted => "posted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadEntry {
    pub author: String,
    pub role: Role,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ThreadEntry {
    pub fn new(author: &Actor, kind: EntryKind, message: impl Into<String>) -> Self {
        Self {
            author: author.name.clone(),
            role: author.role,
            kind,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FeedbackThread {
    path: PathBuf,
}

impl FeedbackThread {
    /// Thread for the item named `item` (its file name) under `threads_dir`
    pub fn for_item(threads_dir: &Path, item: &str) -> Self {
        Self {
            path: threads_dir.join(format!("{}.jsonl", item)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, entry: &ThreadEntry) -> io::Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        // one write per entry so a line is never interleaved
        file.write_all(line.as_bytes())?;
        file.sync_data()
    }

    /// All entries in order. Lines that fail to parse are skipped.
    pub fn entries(&self) -> io::Result<Vec<ThreadEntry>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut entries = Vec::new();
        for (n, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(entry) => entries.push(entry),
                Err(e) => tracing::warn!(
                    thread = %self.path.display(),
                    line = n + 1,
                    "skipping unreadable thread entry: {}",
                    e
                ),
            }
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_and_read_in_order() {
        let dir = TempDir::new().unwrap();
        let thread = FeedbackThread::for_item(dir.path(), "launch.md");
        assert!(thread.entries().unwrap().is_empty());

        let alice = Actor::human("alice");
        let bot = Actor::agent("drafter");
        thread
            .append(&ThreadEntry::new(&alice, EntryKind::Feedback, "too long"))
            .unwrap();
        thread
            .append(&ThreadEntry::new(&bot, EntryKind::Note, "shortened"))
            .unwrap();

        let entries = thread.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].author, "alice");
        assert_eq!(entries[0].kind, EntryKind::Feedback);
        assert_eq!(entries[1].role, Role::Agent);
        assert_eq!(entries[1].message, "shortened");
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = ThreadEntry::new(&Actor::human("alice"), EntryKind::Approved, "ok");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["type"], "approved");
        assert_eq!(value["role"], "human");
    }

    #[test]
    fn test_corrupt_line_is_skipped() {
        let dir = TempDir::new().unwrap();
        let thread = FeedbackThread::for_item(dir.path(), "x.md");
        thread
            .append(&ThreadEntry::new(&Actor::human("a"), EntryKind::Note, "one"))
            .unwrap();
        let mut file = OpenOptions::new().append(true).open(thread.path()).unwrap();
        file.write_all(b"{not json\n").unwrap();
        thread
            .append(&ThreadEntry::new(&Actor::human("a"), EntryKind::Note, "two"))
            .unwrap();

        let messages: Vec<_> = thread
            .entries()
            .unwrap()
            .into_iter()
            .map(|e| e.message)
            .collect();
        assert_eq!(messages, vec!["one", "two"]);
    }
}
