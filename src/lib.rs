pub mod config;
pub mod description;
pub mod episode;
pub mod error;
pub mod feed;
pub mod handler;
pub mod http;
pub mod ledger;
pub mod naming;
pub mod orchestrator;
pub mod organizer;
pub mod probe;
pub mod progress;
pub mod sync;

// Re-export main types for convenience
pub use config::Config;
pub use description::{FolderDescription, PodcastSettings};
pub use error::{
    ConfigError, CopyError, DescriptionError, DownloadError, FeedError, LedgerError, NamingError,
    OrganizeError, ProbeError, RunError, ScanError, SyncError,
};
pub use feed::{EpisodeRecord, fetch_feed, parse_feed};
pub use http::{HttpClient, HttpResponse, ReqwestClient};
pub use ledger::DownloadLedger;
pub use naming::{extract_prefix, is_valid_prefixed_name, natural_sort, output_name};
pub use orchestrator::{FolderOutcome, FolderStatus, RunSummary, run};
pub use organizer::{OrganizeReport, organize};
pub use probe::{DurationProbe, LoftyProbe};
pub use progress::{NoopReporter, ProgressEvent, ProgressReporter, SharedProgressReporter};
pub use sync::{SyncResult, sync_podcast};
