//! The persisted swap task document and its state transitions.
//!
//! A [`SwapTask`] is the single source of truth for one submitted swap: where
//! its two input images live, whether a face was detected on each side, and
//! where the result ended up. A task is *pending* until `result_path` is
//! written; after that it is terminal and never mutated again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type TaskId = String;

/// Reserved `result_path` value meaning "processing finished but no swap could
/// be produced" — distinct from `None`, which means "not processed yet".
pub const FACES_NOT_FOUND_SENTINEL: &str = "faces_not_found_error";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SwapTask {
    pub id: TaskId,
    /// Insertion sequence number, assigned by the store. Recovery replays
    /// pending tasks in this order.
    pub seq: u64,
    pub source_path: String,
    pub target_path: String,
    pub source_face: Option<bool>,
    pub target_face: Option<bool>,
    pub result_path: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
}

/// Outcome of one inference run, persisted in a single atomic update.
///
/// All three fields are written together so a reader never observes a task
/// with a result but unknown face flags.
#[derive(Debug, Clone)]
pub struct SwapReport {
    pub source_face: bool,
    pub target_face: bool,
    pub result_path: String,
}

impl SwapReport {
    /// Report for a completed swap with a stored result image.
    pub fn done(result_path: String) -> Self {
        Self {
            source_face: true,
            target_face: true,
            result_path,
        }
    }

    /// Report for a run where at least one side had no detectable face.
    pub fn faces_not_found(source_face: bool, target_face: bool) -> Self {
        Self {
            source_face,
            target_face,
            result_path: FACES_NOT_FOUND_SENTINEL.to_string(),
        }
    }
}

/// Client-facing view of a task, derived from the persisted fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwapState {
    /// No result recorded yet.
    Pending,
    /// Terminal: inference ran but a face was missing on the flagged side(s).
    FacesNotFound { source: bool, target: bool },
    /// Terminal: result image available under `result_path`.
    Done { result_path: String },
}

impl SwapTask {
    pub fn is_pending(&self) -> bool {
        self.result_path.is_none()
    }

    /// Derive the client-facing state. A side counts as "no face" only when
    /// its flag was explicitly written `false`.
    pub fn state(&self) -> SwapState {
        match &self.result_path {
            None => SwapState::Pending,
            Some(path) if path == FACES_NOT_FOUND_SENTINEL => SwapState::FacesNotFound {
                source: self.source_face == Some(false),
                target: self.target_face == Some(false),
            },
            Some(path) => SwapState::Done {
                result_path: path.clone(),
            },
        }
    }
}
