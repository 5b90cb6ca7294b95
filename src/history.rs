//! Questions answered during this run, kept in memory only.

use chrono::{DateTime, Local};

use crate::router::Route;

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub question: String,
    pub answer: String,
    pub route: Route,
    pub answered_at: DateTime<Local>,
}

impl HistoryEntry {
    pub fn new(question: impl Into<String>, answer: impl Into<String>, route: Route) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            route,
            answered_at: Local::now(),
        }
    }
}

/// Append-only record of successful answers, oldest first internally
#[derive(Debug, Clone, Default)]
pub struct SessionHistory {
    entries: Vec<HistoryEntry>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in display order, most recent first
    pub fn newest_first(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev()
    }

    /// Entry by display position (0 is the most recent)
    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries
            .len()
            .checked_sub(index + 1)
            .and_then(|i| self.entries.get(i))
    }
}
