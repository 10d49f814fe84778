//! Attempt records handed to persistence.

use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::engine::{Scores, Summary};

/// Everything a store needs to remember about one submitted attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub exercise_id: String,
    pub label: String,
    pub user: String,
    pub started_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
    pub max_total_score: f64,
    pub total_score: f64,
    pub max_scores: Scores,
    pub scores: Scores,
    pub parameters: IndexMap<String, String>,
    pub answers: IndexMap<String, Option<String>>,
}

impl AttemptRecord {
    pub fn new(
        exercise_id: String,
        label: &str,
        user: &str,
        started_at: Option<DateTime<Utc>>,
        summary: &Summary,
    ) -> Self {
        AttemptRecord {
            exercise_id,
            label: label.to_string(),
            user: user.to_string(),
            started_at,
            submitted_at: Utc::now(),
            max_total_score: summary.max_total_score,
            total_score: summary.total_score,
            max_scores: summary.max_scores.clone(),
            scores: summary.scores.clone(),
            parameters: summary
                .parameters
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect(),
            answers: summary
                .answers
                .iter()
                .map(|(k, v)| (k.clone(), v.as_ref().map(ToString::to_string)))
                .collect(),
        }
    }
}

/// Persistence boundary; the storage schema is the implementor's business.
pub trait ResultStore: Send {
    fn save(&self, record: &AttemptRecord) -> anyhow::Result<()>;
}

/// Keeps records in memory; clones share the same records.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: Arc<Mutex<Vec<AttemptRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<AttemptRecord> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl ResultStore for MemoryStore {
    fn save(&self, record: &AttemptRecord) -> anyhow::Result<()> {
        self.records
            .lock()
            .map_err(|_| anyhow!("result store lock poisoned"))?
            .push(record.clone());
        Ok(())
    }
}
