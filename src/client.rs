//! Client for the external scoring service.
//!
//! The service is a black box: it receives the raw 1-5 answers and returns
//! five trait scores. Nothing here interprets or inverts answers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use serde::Deserialize;

use crate::error::{SubmitError, ValidationError};
use crate::responses::{CalculateRequest, ResponseStore};
use crate::result::ResultSet;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/api/calculate";

/// reqwest's own default, spelled out so `--timeout` shows it.
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Status and body of a completed HTTP exchange.
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// One POST of a JSON body. Implementations must not retry.
pub trait Transport: Send + Sync {
    fn post_json(&self, request: &CalculateRequest) -> Result<RawResponse, SubmitError>;

    /// Where requests go, for logs and exports.
    fn endpoint(&self) -> &str;
}

pub struct HttpTransport {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpTransport {
    /// `None` waits for the scoring service indefinitely.
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow!("failed to build http client: {e}"))?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

impl Transport for HttpTransport {
    fn post_json(&self, request: &CalculateRequest) -> Result<RawResponse, SubmitError> {
        // `.json()` sets `Content-Type: application/json`.
        let resp = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| SubmitError::Transport(format!("failed to read response body: {e}")))?;

        Ok(RawResponse { status, body })
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

// ---------------------------------------------------------------------------
// SubmissionClient
// ---------------------------------------------------------------------------

/// Error body sent by the service alongside 4xx/5xx statuses.
#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct SubmissionClient {
    transport: Arc<dyn Transport>,
    expected: usize,
}

impl SubmissionClient {
    /// `expected` is the catalog length: a request must carry exactly that
    /// many responses.
    pub fn new(transport: Arc<dyn Transport>, expected: usize) -> Self {
        Self {
            transport,
            expected,
        }
    }

    pub fn endpoint(&self) -> &str {
        self.transport.endpoint()
    }

    /// Check the precondition for a submission without sending anything.
    pub fn check(&self, store: &ResponseStore) -> Result<(), ValidationError> {
        if store.answered_count() != self.expected || !store.is_complete() {
            return Err(ValidationError::Incomplete {
                answered: store.answered_count(),
                total: self.expected,
            });
        }
        Ok(())
    }

    pub fn submit(&self, store: &ResponseStore) -> Result<ResultSet, SubmitError> {
        self.check(store)?;
        self.submit_request(&store.to_request())
    }

    /// Send a prepared request body. Exactly one transport call is made when
    /// the response count matches, none otherwise.
    pub fn submit_request(&self, request: &CalculateRequest) -> Result<ResultSet, SubmitError> {
        if request.responses.len() != self.expected {
            return Err(ValidationError::Incomplete {
                answered: request.responses.len(),
                total: self.expected,
            }
            .into());
        }

        tracing::info!(
            endpoint = self.endpoint(),
            responses = request.responses.len(),
            "submitting responses for scoring"
        );

        let raw = self.transport.post_json(request).map_err(|e| {
            tracing::warn!(error = %e, "scoring request failed");
            e
        })?;

        let result = interpret_response(&raw);
        match &result {
            Ok(scores) => tracing::info!(?scores, "scores received"),
            Err(e) => tracing::warn!(status = raw.status, error = %e, "scoring rejected"),
        }
        result
    }
}

/// Turn a raw exchange into scores. Non-2xx statuses and bodies without all
/// five numeric trait keys are errors.
pub fn interpret_response(raw: &RawResponse) -> Result<ResultSet, SubmitError> {
    if !(200..300).contains(&raw.status) {
        let message = serde_json::from_str::<ErrorBody>(&raw.body)
            .ok()
            .map(|b| b.error);
        return Err(SubmitError::Status {
            status: raw.status,
            message,
        });
    }

    serde_json::from_str::<ResultSet>(&raw.body).map_err(|e| SubmitError::Malformed(e.to_string()))
}

// ---------------------------------------------------------------------------
// Test double
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
