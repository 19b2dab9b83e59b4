use thiserror::Error;

/// Caller-visible failure of a scrape operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScrapeError {
    #[error("invalid identity '{0}'")]
    InvalidIdentity(String),
    #[error("provider rejected submission with status {status}: {body}")]
    SubmissionRejected { status: u16, body: String },
    #[error("provider unreachable: {0}")]
    ProviderUnreachable(String),
    #[error("job failed: {0}")]
    Failed(String),
    #[error("timed out waiting for job to finish")]
    TimedOut,
    #[error("account unavailable: {0}")]
    AccountUnavailable(String),
    #[error("job succeeded but returned no usable records")]
    EmptyResult,
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
    #[error("scrape cancelled")]
    Cancelled,
}

/// Coarse grouping used to pick user-facing messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The caller sent something unusable; nothing was sent to the provider.
    InvalidInput,
    /// The operation completed but there is nothing to scrape.
    NothingToScrape,
    /// The operation could not complete.
    Incomplete,
}

impl ScrapeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScrapeError::InvalidIdentity(_) => ErrorCategory::InvalidInput,
            ScrapeError::AccountUnavailable(_) | ScrapeError::EmptyResult => {
                ErrorCategory::NothingToScrape
            }
            ScrapeError::SubmissionRejected { .. }
            | ScrapeError::ProviderUnreachable(_)
            | ScrapeError::Failed(_)
            | ScrapeError::TimedOut
            | ScrapeError::MalformedResponse(_)
            | ScrapeError::Cancelled => ErrorCategory::Incomplete,
        }
    }
}
