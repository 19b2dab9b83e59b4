//! Scrape engine: provider IO, job polling and result export.
mod engine;
mod export;
mod filename;
mod persist;
mod pipeline;
mod poll;
mod provider;
mod registry;
mod submit;
mod types;

pub use engine::EngineHandle;
pub use export::{encode_csv, write_csv_export, CsvExport, ExportError};
pub use filename::{download_filename, export_filename, safe_keyword};
pub use persist::{PersistError, ResultsDir};
pub use pipeline::{NullSink, ProgressSink, Scraper};
pub use poll::{PollSettings, Poller};
pub use provider::{HttpJobProvider, JobProvider, ProviderSettings};
pub use registry::{ExportSlot, JobRegistry, JobSnapshot, RegistrySettings};
pub use submit::Submitter;
pub use types::{
    JobHandle, JobId, ProviderError, ProviderFailureKind, ProviderStatus, ScrapeEvent, Submission,
};
