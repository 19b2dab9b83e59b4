use std::fmt;

use scrape_core::{Identity, JobState, ResultLimit, Stage};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Local id of one scrape operation (registry key, log correlation).
pub type JobId = u64;

/// Provider-issued identifier of a submitted job.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validated submission handed to a [`crate::JobProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub target: Identity,
    pub limit: ResultLimit,
    pub options: Map<String, Value>,
}

/// Body of a status query.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProviderStatus {
    pub state: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeEvent {
    StageChanged { job_id: JobId, stage: Stage },
    Polled {
        job_id: JobId,
        attempt: u32,
        state: JobState,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderFailureKind,
    pub message: String,
}

impl ProviderError {
    pub fn new(kind: ProviderFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Worth asking again: connection trouble, timeouts and 5xx answers.
    pub fn is_transient(&self) -> bool {
        match self.kind {
            ProviderFailureKind::Network | ProviderFailureKind::Timeout => true,
            ProviderFailureKind::HttpStatus(code) => code >= 500,
            ProviderFailureKind::Decode => false,
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ProviderError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFailureKind {
    HttpStatus(u16),
    Timeout,
    Network,
    Decode,
}

impl fmt::Display for ProviderFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderFailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            ProviderFailureKind::Timeout => write!(f, "timeout"),
            ProviderFailureKind::Network => write!(f, "network error"),
            ProviderFailureKind::Decode => write!(f, "undecodable response"),
        }
    }
}
