//! Bounded command history with a navigation cursor.

use std::collections::VecDeque;

/// Default number of retained history entries.
pub const DEFAULT_HISTORY_SIZE: usize = 1000;

/// A bounded FIFO of raw command lines.
///
/// The navigation cursor supports console-style arrow-key walking:
/// `navigate_previous` steps towards the oldest entry and clamps there,
/// `navigate_next` steps back and yields `None` past the newest entry.
/// Adding an entry resets the cursor.
#[derive(Debug, Clone)]
pub struct CommandHistory {
    entries: VecDeque<String>,
    max_size: usize,
    cursor: usize,
}

impl CommandHistory {
    pub fn new(max_size: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            max_size,
            cursor: 0,
        }
    }

    /// Appends a line, skipping empty lines and exact consecutive
    /// duplicates. Evicts the oldest entry past capacity.
    pub fn add(&mut self, line: &str) {
        if line.is_empty() {
            return;
        }
        if self.entries.back().is_some_and(|last| last.as_str() == line) {
            return;
        }

        self.entries.push_back(line.to_owned());
        if self.entries.len() > self.max_size {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len();
    }

    pub fn navigate_previous(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        if self.cursor > 0 {
            self.cursor -= 1;
        }
        self.entries.get(self.cursor).map(String::as_str)
    }

    pub fn navigate_next(&mut self) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        if self.cursor + 1 < self.entries.len() {
            self.cursor += 1;
            self.entries.get(self.cursor).map(String::as_str)
        } else {
            // Past the newest entry the console shows a fresh line.
            self.cursor = self.entries.len();
            None
        }
    }

    pub fn reset_navigation(&mut self) {
        self.cursor = self.entries.len();
    }

    /// The most recent `count` entries, oldest first.
    pub fn recent(&self, count: usize) -> Vec<String> {
        let skip = self.entries.len().saturating_sub(count);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Snapshot of the full history, oldest first.
    pub fn all(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    /// Entry by index, 0 being the oldest.
    pub fn entry(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    /// Shrinks the capacity, trimming the oldest entries as needed.
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        while self.entries.len() > self.max_size {
            self.entries.pop_front();
        }
        if self.cursor > self.entries.len() {
            self.cursor = self.entries.len();
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}
