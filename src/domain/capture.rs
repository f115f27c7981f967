use crate::error::BillingError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a gateway order to be captured.
///
/// Always non-empty; surrounding whitespace is stripped on construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CaptureKey(String);

impl CaptureKey {
    pub fn new(raw: impl AsRef<str>) -> Result<Self, BillingError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(BillingError::InvalidKey);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CaptureKey {
    type Error = BillingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CaptureKey> for String {
    fn from(key: CaptureKey) -> Self {
        key.0
    }
}

impl fmt::Display for CaptureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Response data returned by the gateway for a successful capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturePayload {
    /// Gateway-side identifier of the capture itself (distinct from the order id).
    pub capture_id: String,
    /// Gateway status string, e.g. `COMPLETED`.
    pub status: String,
    /// Untouched gateway response body.
    #[serde(default)]
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No usable response from the gateway.
    Transport,
    /// The gateway answered and declined the capture.
    GatewayRejected,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureFailure {
    pub kind: FailureKind,
    pub code: Option<String>,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CaptureResult {
    Captured(CapturePayload),
    Failed(CaptureFailure),
}

/// Immutable record of one finished capture attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureOutcome {
    key: CaptureKey,
    result: CaptureResult,
    completed_at: DateTime<Utc>,
}

impl CaptureOutcome {
    pub fn captured(key: CaptureKey, payload: CapturePayload) -> Self {
        Self {
            key,
            result: CaptureResult::Captured(payload),
            completed_at: Utc::now(),
        }
    }

    pub fn failed(key: CaptureKey, failure: CaptureFailure) -> Self {
        Self {
            key,
            result: CaptureResult::Failed(failure),
            completed_at: Utc::now(),
        }
    }

    pub fn key(&self) -> &CaptureKey {
        &self.key
    }

    pub fn result(&self) -> &CaptureResult {
        &self.result
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    pub fn is_success(&self) -> bool {
        matches!(self.result, CaptureResult::Captured(_))
    }

    pub fn payload(&self) -> Option<&CapturePayload> {
        match &self.result {
            CaptureResult::Captured(payload) => Some(payload),
            CaptureResult::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&CaptureFailure> {
        match &self.result {
            CaptureResult::Captured(_) => None,
            CaptureResult::Failed(failure) => Some(failure),
        }
    }

    /// Converts the outcome into the payload, or into the error matching its failure kind.
    pub fn into_result(self) -> Result<CapturePayload, BillingError> {
        match self.result {
            CaptureResult::Captured(payload) => Ok(payload),
            CaptureResult::Failed(CaptureFailure {
                kind: FailureKind::Transport,
                detail,
                ..
            }) => Err(BillingError::TransportError(detail)),
            CaptureResult::Failed(CaptureFailure {
                kind: FailureKind::GatewayRejected,
                code,
                detail,
            }) => Err(BillingError::GatewayRejected { code, detail }),
        }
    }
}
