// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::Arc;

/// Events emitted while organizing folders, for progress reporting
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Processing of an input folder begins
    FolderStarted { folder: String, kind: &'static str },

    /// An input folder was ignored because its name does not match `DD_name`
    FolderSkipped { folder: String, reason: String },

    /// Feed is being fetched from URL or file
    FetchingFeed { source: String },

    /// Feed has been parsed and diffed against the ledger
    FeedParsed {
        total_episodes: usize,
        new_episodes: usize,
    },

    /// Stale partial downloads were cleaned up before syncing
    PartialFilesCleanedUp { count: usize },

    /// A download is starting
    DownloadStarting {
        episode_title: String,
        /// Index of this episode among the new episodes
        episode_index: usize,
        total_to_download: usize,
        /// Expected content length in bytes, if known
        content_length: Option<u64>,
    },

    /// Download progress update
    DownloadProgress {
        bytes_downloaded: u64,
        total_bytes: Option<u64>,
    },

    /// The transfer finished; the episode still has to pass the duration check
    DownloadCompleted {
        episode_title: String,
        bytes_downloaded: u64,
    },

    /// A download or duration probe failed; the episode is retried next sync
    DownloadFailed { episode_title: String, error: String },

    /// Episode was long enough and kept
    EpisodeAccepted {
        episode_title: String,
        filename: String,
        duration_secs: f64,
    },

    /// Episode was shorter than the folder's minimum and discarded for good
    EpisodeRejected {
        episode_title: String,
        duration_secs: f64,
        min_duration: f64,
    },

    /// Podcast sync pass completed
    SyncCompleted {
        downloaded_count: usize,
        rejected_count: usize,
        skipped_count: usize,
        failed_count: usize,
    },

    /// More files were found than an output folder can hold
    FilesTruncated { kept: usize, dropped: usize },

    /// Copying into the output folder begins
    OrganizeStarted { output_folder: String, total: usize },

    /// A file was copied to its numbered name
    FileCopied {
        index: usize,
        total: usize,
        source_name: String,
        output_name: String,
        bytes: u64,
    },

    /// A single file could not be copied and was skipped
    CopyFailed { source_name: String, error: String },

    /// Processing of an input folder finished
    FolderCompleted {
        folder: String,
        success: bool,
        message: String,
    },
}

/// Trait for reporting progress events during a run.
///
/// Implementations can use this to display progress bars, log messages,
/// or collect statistics.
pub trait ProgressReporter: Send + Sync {
    /// Report a progress event
    fn report(&self, event: ProgressEvent);
}

/// A shared reference to a progress reporter
pub type SharedProgressReporter = Arc<dyn ProgressReporter>;

/// A no-op progress reporter that silently ignores all events.
/// Useful for tests or quiet mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn report(&self, _event: ProgressEvent) {
        // Intentionally empty
    }
}

impl NoopReporter {
    /// Create a new NoopReporter wrapped in an Arc
    pub fn shared() -> SharedProgressReporter {
        Arc::new(Self)
    }
}

/// Reporter that records every event, for assertions in tests
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingReporter {
    pub events: std::sync::Mutex<Vec<ProgressEvent>>,
}

#[cfg(test)]
impl ProgressReporter for RecordingReporter {
    fn report(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}
