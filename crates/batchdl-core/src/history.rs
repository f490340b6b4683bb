//! Short, capped log of finished batches, newest first.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

use crate::aggregate::BatchSummary;
use crate::job::{JobResult, MediaKind, ResultState};

/// One successfully downloaded item in a history record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub title: String,
    pub url: String,
}

/// One finished batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRecord {
    pub started_at: DateTime<Utc>,
    pub kind: MediaKind,
    pub entries: Vec<HistoryEntry>,
    pub summary: BatchSummary,
}

impl BatchRecord {
    /// Builds a record from a batch's results. Only successful jobs become
    /// entries, ordered by job index.
    pub fn from_results(
        started_at: DateTime<Utc>,
        kind: MediaKind,
        results: &[JobResult],
        summary: BatchSummary,
    ) -> Self {
        let mut ok: Vec<&JobResult> = results
            .iter()
            .filter(|r| r.state == ResultState::Success)
            .collect();
        ok.sort_by_key(|r| r.index);
        let entries = ok
            .into_iter()
            .map(|r| HistoryEntry {
                title: r.display_name().to_string(),
                url: r.url.clone(),
            })
            .collect();
        Self {
            started_at,
            kind,
            entries,
            summary,
        }
    }
}

#[derive(Debug, Clone)]
pub struct History {
    limit: usize,
    records: VecDeque<BatchRecord>,
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            records: VecDeque::new(),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Adds a record at the front, dropping the oldest beyond the cap.
    pub fn record(&mut self, record: BatchRecord) {
        if self.limit == 0 {
            return;
        }
        self.records.push_front(record);
        self.records.truncate(self.limit);
    }

    /// Records, newest first.
    pub fn records(&self) -> impl Iterator<Item = &BatchRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
