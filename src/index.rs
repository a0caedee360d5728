use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::EditError;
use crate::layout::{Key, Layout};
use crate::record::Record;

/// Split file content into lines without their `\n`. A trailing newline
/// does not produce a final empty line; `\r` and other bytes are untouched.
pub fn split_lines(content: &str) -> Vec<&str> {
    if content.is_empty() {
        return Vec::new();
    }
    let body = content.strip_suffix('\n').unwrap_or(content);
    body.split('\n').collect()
}

/// Every line of a file parsed once, plus a lookup from key to the line
/// that first carries it.
#[derive(Debug)]
pub struct LineIndex<L: Layout> {
    records: Vec<Record<L>>,
    lookup: HashMap<Key, usize>,
}

impl<L: Layout> LineIndex<L> {
    pub fn build(content: &str, layout: &L, path: &Path) -> Result<Self, EditError> {
        let mut records = Vec::new();
        let mut lookup = HashMap::new();
        for (number, raw) in split_lines(content).into_iter().enumerate() {
            let record = Record::parse(raw, layout.clone())
                .map_err(|err| err.located(path, number + 1))?;
            if record.is_data() {
                lookup.entry(layout.key_of(&record)).or_insert(number);
            }
            records.push(record);
        }
        Ok(Self { records, lookup })
    }

    pub fn find(&self, key: &Key) -> Option<usize> {
        self.lookup.get(key).copied()
    }

    pub fn record_mut(&mut self, line: usize) -> Option<&mut Record<L>> {
        self.records.get_mut(line)
    }
}

/// Line replacements and appended lines not yet written.
#[derive(Debug)]
pub struct PendingChanges<L: Layout> {
    updates: BTreeMap<usize, Record<L>>,
    inserts: Vec<Record<L>>,
    insert_keys: HashMap<Key, usize>,
}

impl<L: Layout> Default for PendingChanges<L> {
    fn default() -> Self {
        Self {
            updates: BTreeMap::new(),
            inserts: Vec::new(),
            insert_keys: HashMap::new(),
        }
    }
}

impl<L: Layout> PendingChanges<L> {
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty() && self.inserts.is_empty()
    }

    /// Record the merged state of an indexed line. An unchanged record
    /// cancels any update queued earlier for the same line.
    pub fn track_update(&mut self, line: usize, record: &Record<L>) {
        if record.changed() {
            self.updates.insert(line, record.clone());
        } else {
            self.updates.remove(&line);
        }
    }

    /// Queue a new line. A second insert with the same key replaces the
    /// first instead of appending a duplicate.
    pub fn queue_insert(&mut self, key: Key, record: Record<L>) {
        if let Some(&slot) = self.insert_keys.get(&key) {
            self.inserts[slot] = record;
            return;
        }
        self.insert_keys.insert(key, self.inserts.len());
        self.inserts.push(record);
    }

    pub fn clear(&mut self) {
        self.updates.clear();
        self.inserts.clear();
        self.insert_keys.clear();
    }

    /// Apply the pending changes to `original` and return the full new
    /// content, ending with exactly one newline.
    pub fn rewrite(&self, original: &str) -> String {
        let mut lines: Vec<String> = split_lines(original)
            .into_iter()
            .map(str::to_string)
            .collect();
        for (line, record) in &self.updates {
            if let Some(slot) = lines.get_mut(*line) {
                *slot = record.render();
            }
        }
        lines.extend(self.inserts.iter().map(Record::render));
        lines.push(String::new());
        lines.join("\n")
    }
}
