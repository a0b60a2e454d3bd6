//! Append-only result histories kept for the lifetime of a session.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::eid::Eid;

#[derive(Debug, Clone, Serialize)]
pub struct Entry<T> {
    pub id: Eid,
    pub created_at: DateTime<Local>,
    pub item: T,
}

/// Ordered list of results. Entries are never edited, only removed.
#[derive(Debug, Clone)]
pub struct History<T> {
    entries: Vec<Entry<T>>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self { entries: vec![] }
    }
}

impl<T> History<T> {
    pub fn push(&mut self, item: T) -> &Entry<T> {
        let idx = self.entries.len();
        self.entries.push(Entry {
            id: Eid::new(),
            created_at: Local::now(),
            item,
        });
        &self.entries[idx]
    }

    pub fn get(&self, id: &Eid) -> Option<&Entry<T>> {
        self.entries.iter().find(|entry| &entry.id == id)
    }

    pub fn delete(&mut self, id: &Eid) -> Option<Entry<T>> {
        let idx = self.entries.iter().position(|entry| &entry.id == id)?;
        Some(self.entries.remove(idx))
    }

    /// Remove everything, returning how many entries were dropped.
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    pub fn entries(&self) -> &[Entry<T>] {
        &self.entries
    }

    pub fn items(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|entry| &entry.item)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
