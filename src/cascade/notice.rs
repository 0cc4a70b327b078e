use super::condition::{self, Condition};
use serde::Serialize;
use std::panic::Location;

/// One non-fatal diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub number: u32,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl Notice {
    /// Notice originating at the caller's location.
    #[track_caller]
    #[must_use]
    pub fn here(number: u32, message: impl Into<String>) -> Self {
        let location = Location::caller();
        Self {
            number,
            message: message.into(),
            file: Some(location.file().to_owned()),
            line: Some(location.line()),
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        condition::type_name(self.number).unwrap_or("NOTICE")
    }
}

impl From<Condition> for Notice {
    fn from(c: Condition) -> Self {
        Self {
            number: c.number,
            message: c.message,
            file: c.file,
            line: c.line,
        }
    }
}

/// Append-only notice accumulator for one dispatch.
///
/// Only [`NoticeLog::clear`] and [`NoticeLog::take`] empty it.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct NoticeLog {
    entries: Vec<Notice>,
}

impl NoticeLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notice: Notice) {
        self.entries.push(notice);
    }

    #[must_use]
    pub fn entries(&self) -> &[Notice] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drain every notice, leaving the log empty.
    pub fn take(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.entries)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Extend<Notice> for NoticeLog {
    fn extend<T: IntoIterator<Item = Notice>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}
