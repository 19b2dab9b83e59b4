use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{JobHandle, ProviderError, ProviderFailureKind, ProviderStatus, Submission};

/// Submit / status / results contract of a job-based scraping provider.
#[async_trait::async_trait]
pub trait JobProvider: Send + Sync {
    /// Starts one remote job. Issues exactly one request.
    async fn submit(&self, submission: &Submission) -> Result<JobHandle, ProviderError>;

    async fn status(&self, handle: &JobHandle) -> Result<ProviderStatus, ProviderError>;

    /// Raw result payload, in whatever shape the provider answers with.
    async fn results(&self, handle: &JobHandle) -> Result<Value, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Serialize)]
struct SubmitBody<'a> {
    target: &'a str,
    limit: Option<u32>,
    options: &'a Map<String, Value>,
}

#[derive(Deserialize)]
struct SubmitAccepted {
    #[serde(rename = "jobId")]
    job_id: String,
}

/// [`JobProvider`] speaking the REST protocol:
/// `POST /submit`, `GET /status/{jobId}`, `GET /results/{jobId}`.
#[derive(Debug, Clone)]
pub struct HttpJobProvider {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpJobProvider {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        settings: ProviderSettings,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| ProviderError::new(ProviderFailureKind::Network, err.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ProviderError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(ProviderError::new(
                ProviderFailureKind::HttpStatus(status.as_u16()),
                body_or_reason(status, body),
            ));
        }

        serde_json::from_str(&body)
            .map_err(|err| ProviderError::new(ProviderFailureKind::Decode, err.to_string()))
    }
}

#[async_trait::async_trait]
impl JobProvider for HttpJobProvider {
    async fn submit(&self, submission: &Submission) -> Result<JobHandle, ProviderError> {
        let body = SubmitBody {
            target: submission.target.as_str(),
            limit: submission.limit.as_option(),
            options: &submission.options,
        };
        let request = self.client.post(self.endpoint("submit")).json(&body);
        let accepted: SubmitAccepted = self.send_json(request).await?;
        Ok(JobHandle::new(accepted.job_id))
    }

    async fn status(&self, handle: &JobHandle) -> Result<ProviderStatus, ProviderError> {
        let request = self
            .client
            .get(self.endpoint(&format!("status/{}", handle.as_str())));
        self.send_json(request).await
    }

    async fn results(&self, handle: &JobHandle) -> Result<Value, ProviderError> {
        let request = self
            .client
            .get(self.endpoint(&format!("results/{}", handle.as_str())));
        self.send_json(request).await
    }
}

fn body_or_reason(status: StatusCode, body: String) -> String {
    if body.trim().is_empty() {
        status.to_string()
    } else {
        body
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        return ProviderError::new(ProviderFailureKind::Timeout, err.to_string());
    }
    if err.is_decode() {
        return ProviderError::new(ProviderFailureKind::Decode, err.to_string());
    }
    ProviderError::new(ProviderFailureKind::Network, err.to_string())
}
