use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::ValidationError;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 5;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub question_id: u32,
    pub score: u8,
}

/// Body of `POST /api/calculate`. Also the format accepted by `--answers`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CalculateRequest {
    pub responses: Vec<Response>,
}

// ---------------------------------------------------------------------------
// QuestionState
// ---------------------------------------------------------------------------

/// Per-question selection state. There is no way back to `Unanswered`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuestionState {
    Unanswered,
    Answered(u8),
}

// ---------------------------------------------------------------------------
// ResponseStore
// ---------------------------------------------------------------------------

/// At most one score per catalog question; the last write wins.
#[derive(Clone, Debug)]
pub struct ResponseStore {
    /// Catalog ids in order, used for completeness checks and serialization.
    order: Vec<u32>,
    scores: HashMap<u32, u8>,
}

impl ResponseStore {
    pub fn new(catalog: &Catalog) -> Self {
        Self {
            order: catalog.ids().collect(),
            scores: HashMap::new(),
        }
    }

    /// Upsert a response. Out-of-range scores and unknown ids are rejected
    /// without touching the store.
    pub fn record_response(&mut self, question_id: u32, score: i64) -> Result<(), ValidationError> {
        if !self.order.contains(&question_id) {
            return Err(ValidationError::UnknownQuestion(question_id));
        }
        if score < MIN_SCORE as i64 || score > MAX_SCORE as i64 {
            return Err(ValidationError::ScoreOutOfRange { question_id, score });
        }

        self.scores.insert(question_id, score as u8);
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.order.iter().all(|id| self.scores.contains_key(id))
    }

    /// Answered / total, in `[0, 1]`.
    pub fn progress_fraction(&self) -> f64 {
        if self.order.is_empty() {
            return 0.0;
        }
        self.answered_count() as f64 / self.order.len() as f64
    }

    pub fn answered_count(&self) -> usize {
        self.scores.len()
    }

    pub fn total(&self) -> usize {
        self.order.len()
    }

    pub fn score_of(&self, question_id: u32) -> Option<u8> {
        self.scores.get(&question_id).copied()
    }

    pub fn state_of(&self, question_id: u32) -> QuestionState {
        match self.score_of(question_id) {
            Some(score) => QuestionState::Answered(score),
            None => QuestionState::Unanswered,
        }
    }

    /// Answered responses in catalog order.
    pub fn responses(&self) -> Vec<Response> {
        self.order
            .iter()
            .filter_map(|&id| {
                self.score_of(id).map(|score| Response {
                    question_id: id,
                    score,
                })
            })
            .collect()
    }

    pub fn to_request(&self) -> CalculateRequest {
        CalculateRequest {
            responses: self.responses(),
        }
    }

    /// Fill the store from a request body, stopping at the first invalid entry.
    pub fn load_request(&mut self, request: &CalculateRequest) -> Result<(), ValidationError> {
        for r in &request.responses {
            self.record_response(r.question_id, r.score as i64)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
