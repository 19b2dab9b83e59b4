//! HTTP surface of the post scraper.
mod config;
mod error;
mod routes;
mod state;

use axum::routing::{delete, get, post};
use axum::Router;

pub use config::Config;
pub use error::ApiError;
pub use routes::{ScrapeParams, StatusBody};
pub use state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/scrape_posts", post(routes::scrape_posts))
        .route("/scrape", post(routes::start_scrape))
        .route("/scrape/:id", delete(routes::cancel_scrape))
        .route("/status/:id", get(routes::scrape_status))
        .route("/download/:id", get(routes::download))
        .with_state(state)
}
