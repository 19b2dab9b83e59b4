//! Scrape core: pure job-protocol types, state machines and result normalization.
mod error;
mod filter;
mod identity;
mod normalize;
mod raw;
mod record;
mod request;
mod stage;
mod state;

pub use error::{ErrorCategory, ScrapeError};
pub use filter::filter_by_keyword;
pub use identity::{Identity, MAX_IDENTITY_LEN};
pub use normalize::{Normalizer, TitleFallback, TITLE_MAX_CHARS};
pub use raw::RawResult;
pub use record::{PostRecord, CSV_COLUMNS};
pub use request::{JobRequest, ResultLimit};
pub use stage::{update, Stage, StageMsg};
pub use state::{InvalidTransition, JobState};

/// Result alias used throughout the scrape crates.
pub type ScrapeResult<T> = Result<T, ScrapeError>;
