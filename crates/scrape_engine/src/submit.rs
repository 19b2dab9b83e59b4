use std::sync::Arc;

use scrape_core::{Identity, JobRequest, ScrapeError};
use scrape_logging::{scrape_info, scrape_warn};

use crate::{JobHandle, JobProvider, ProviderError, ProviderFailureKind, Submission};

/// Validates a [`JobRequest`] and starts the remote job. Never retries.
#[derive(Clone)]
pub struct Submitter {
    provider: Arc<dyn JobProvider>,
}

impl Submitter {
    pub fn new(provider: Arc<dyn JobProvider>) -> Self {
        Self { provider }
    }

    pub async fn submit(&self, request: JobRequest) -> Result<JobHandle, ScrapeError> {
        let target = Identity::parse(request.target()).inspect_err(|_| {
            scrape_warn!("Rejected submission for invalid identity {:?}", request.target());
        })?;

        let submission = Submission {
            target,
            limit: request.limit(),
            options: request.options().clone(),
        };
        let handle = self
            .provider
            .submit(&submission)
            .await
            .map_err(submission_error)?;
        scrape_info!(
            "Submitted job target={} limit={:?} handle={}",
            submission.target,
            submission.limit.as_option(),
            handle
        );
        Ok(handle)
    }
}

fn submission_error(err: ProviderError) -> ScrapeError {
    scrape_warn!("Submission failed: {}", err);
    match err.kind {
        ProviderFailureKind::HttpStatus(status) => ScrapeError::SubmissionRejected {
            status,
            body: err.message,
        },
        ProviderFailureKind::Decode => ScrapeError::MalformedResponse(err.message),
        ProviderFailureKind::Network | ProviderFailureKind::Timeout => {
            ScrapeError::ProviderUnreachable(err.message)
        }
    }
}
