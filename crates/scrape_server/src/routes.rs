use axum::extract::{FromRequest, Path, Request, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{async_trait, Form, Json};
use chrono::Utc;
use scrape_core::{filter_by_keyword, Identity, PostRecord, Stage};
use scrape_engine::{write_csv_export, CsvExport, JobId};
use scrape_logging::{scrape_info, scrape_warn};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{ApiError, AppState};

/// Body of the scrape routes, accepted as JSON or as a urlencoded form.
#[derive(Debug, Default, Deserialize)]
pub struct ScrapeParams {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl ScrapeParams {
    /// Trimmed username and keyword; a blank keyword counts as none.
    fn split(self) -> Result<(String, Option<String>, Option<u32>), ApiError> {
        let username = self
            .username
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ApiError::bad_request("username is required"))?;
        let keyword = self
            .keyword
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        Ok((username, keyword, self.limit))
    }
}

#[async_trait]
impl<S> FromRequest<S> for ScrapeParams
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        let parsed = if is_json {
            Json::<ScrapeParams>::from_request(req, state)
                .await
                .map(|Json(params)| params)
                .map_err(|err| err.body_text())
        } else {
            Form::<ScrapeParams>::from_request(req, state)
                .await
                .map(|Form(params)| params)
                .map_err(|err| err.body_text())
        };
        parsed.map_err(|detail| {
            scrape_warn!("Failed to parse request body: {}", detail);
            ApiError::bad_request(
                "Unable to parse request body (expecting JSON or form data).",
            )
        })
    }
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Runs the whole scrape and answers with the CSV.
pub async fn scrape_posts(
    State(state): State<AppState>,
    params: ScrapeParams,
) -> Result<Response, ApiError> {
    let (username, keyword, limit) = params.split()?;
    scrape_info!("scrape_posts username={} keyword={:?}", username, keyword);

    let request = state.job_request(&username, limit);
    let records = state.engine.scraper().scrape(request).await?;
    let export = export_csv(&state, username, keyword, records).await?;
    Ok(csv_response(&export))
}

/// Starts a background scrape and answers with its request id.
pub async fn start_scrape(
    State(state): State<AppState>,
    params: ScrapeParams,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let (username, keyword, limit) = params.split()?;
    Identity::parse(&username)?;
    let request = state.job_request(&username, limit);
    let id = state.engine.enqueue(request, keyword);
    Ok((StatusCode::ACCEPTED, Json(json!({ "request_id": id }))))
}

#[derive(Debug, Serialize)]
pub struct StatusBody {
    pub request_id: JobId,
    pub username: String,
    pub keyword: Option<String>,
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub async fn scrape_status(
    State(state): State<AppState>,
    Path(id): Path<JobId>,
) -> Result<Json<StatusBody>, ApiError> {
    let snapshot = state.engine.status(id).ok_or_else(|| unknown_id(id))?;
    let (records, error) = match &snapshot.outcome {
        Some(Ok(records)) => (Some(records.len()), None),
        Some(Err(err)) => (None, Some(err.to_string())),
        None => (None, None),
    };
    Ok(Json(StatusBody {
        request_id: snapshot.id,
        username: snapshot.target,
        keyword: snapshot.keyword,
        stage: snapshot.stage,
        records,
        error,
    }))
}

pub async fn download(
    State(state): State<AppState>,
    Path(id): Path<JobId>,
) -> Result<Response, ApiError> {
    let snapshot = state.engine.status(id).ok_or_else(|| unknown_id(id))?;
    match snapshot.outcome {
        None => Err(ApiError::new(
            StatusCode::CONFLICT,
            format!("scrape {id} still in progress (stage {:?})", snapshot.stage),
        )),
        Some(Err(err)) => Err(err.into()),
        Some(Ok(records)) => {
            let slot = state.engine.export_slot(id).ok_or_else(|| unknown_id(id))?;
            let export = slot
                .get_or_try_init(|| {
                    export_csv(&state, snapshot.target, snapshot.keyword, records)
                })
                .await?;
            Ok(csv_response(export))
        }
    }
}

/// Stops waiting for a background scrape. The provider-side job keeps running.
pub async fn cancel_scrape(
    State(state): State<AppState>,
    Path(id): Path<JobId>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if state.engine.cancel(id) {
        return Ok((StatusCode::ACCEPTED, Json(json!({ "cancelled": id }))));
    }
    match state.engine.status(id) {
        Some(_) => Err(ApiError::new(
            StatusCode::CONFLICT,
            format!("scrape {id} already finished"),
        )),
        None => Err(unknown_id(id)),
    }
}

fn unknown_id(id: JobId) -> ApiError {
    ApiError::not_found(format!("unknown or expired request id {id}"))
}

/// Filters and writes the CSV on the blocking pool.
async fn export_csv(
    state: &AppState,
    username: String,
    keyword: Option<String>,
    records: Vec<PostRecord>,
) -> Result<CsvExport, ApiError> {
    let results_dir = state.results_dir.clone();
    tokio::task::spawn_blocking(move || {
        let records = filter_by_keyword(records, keyword.as_deref());
        let export = write_csv_export(
            &results_dir,
            &username,
            keyword.as_deref(),
            &records,
            Utc::now().timestamp(),
        )?;
        scrape_info!(
            "Wrote {} posts for {} to {:?}",
            records.len(),
            username,
            export.path
        );
        Ok::<_, ApiError>(export)
    })
    .await
    .map_err(|err| {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("export task failed: {err}"),
        )
    })?
}

fn csv_response(export: &CsvExport) -> Response {
    let headers = [
        (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", export.download_name),
        ),
    ];
    (headers, export.content.clone()).into_response()
}
