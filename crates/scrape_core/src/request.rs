use std::num::NonZeroU32;

use serde_json::{Map, Value};

/// Upper bound on the number of records a job should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultLimit {
    Limited(NonZeroU32),
    #[default]
    Unbounded,
}

impl ResultLimit {
    /// `0` maps to [`ResultLimit::Unbounded`].
    pub fn from_count(count: u32) -> Self {
        match NonZeroU32::new(count) {
            Some(n) => ResultLimit::Limited(n),
            None => ResultLimit::Unbounded,
        }
    }

    pub fn as_option(&self) -> Option<u32> {
        match self {
            ResultLimit::Limited(n) => Some(n.get()),
            ResultLimit::Unbounded => None,
        }
    }
}

/// One scrape request as built by the caller. Consumed once by the submitter.
#[derive(Debug, Clone, PartialEq)]
pub struct JobRequest {
    target: String,
    limit: ResultLimit,
    options: Map<String, Value>,
}

impl JobRequest {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            limit: ResultLimit::Unbounded,
            options: Map::new(),
        }
    }

    pub fn with_limit(mut self, limit: ResultLimit) -> Self {
        self.limit = limit;
        self
    }

    /// Adds one provider-specific option. Later values replace earlier ones.
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn limit(&self) -> ResultLimit {
        self.limit
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }
}
