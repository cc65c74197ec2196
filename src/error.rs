// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur when reading or validating a folder description
#[derive(Error, Debug)]
pub enum DescriptionError {
    #[error("Description file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read description file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in description file {path}: {source}")]
    InvalidYaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Description file must contain a YAML mapping")]
    NotAMapping,

    #[error("Description file must contain a 'type' field")]
    MissingType,

    #[error("Invalid type '{0}'. Must be 'static' or 'rss'")]
    UnknownType(String),

    #[error("Description with type 'rss' must contain a 'feed_url' field")]
    MissingFeedUrl,

    #[error("'feed_url' must be a non-empty string")]
    EmptyFeedUrl,

    #[error("'min_duration' must be a number")]
    MinDurationNotANumber,

    #[error("'min_duration' must be a positive number, got {0}")]
    MinDurationNotPositive(f64),
}

/// Errors raised for folder names outside the `DD_name` pattern
#[derive(Error, Debug)]
pub enum NamingError {
    #[error("Folder name '{0}' does not start with two digits followed by an underscore")]
    InvalidPrefix(String),

    #[error("Output index {0} is outside 1..=255")]
    IndexOutOfRange(usize),
}

/// Errors that can occur when fetching or parsing RSS feeds
#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Failed to fetch feed from {url}: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read feed file {path}: {source}")]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse RSS feed: {0}")]
    ParseFailed(#[from] rss::Error),

    #[error("Episode '{title}' has no audio enclosure")]
    MissingEnclosure { title: String },

    #[error("Episode '{title}' has an invalid enclosure URL: {source}")]
    InvalidEnclosureUrl {
        title: String,
        #[source]
        source: url::ParseError,
    },
}

/// Errors that can occur during episode downloads
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("HTTP request failed for {url}: {source}")]
    HttpFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Failed to create file {path}: {source}")]
    FileCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to file {path}: {source}")]
    FileWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stream error while downloading {url}: {source}")]
    StreamFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to move {from} to {to}: {source}")]
    FinalizeFailed {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised by the audio duration probe
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read audio properties of {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: lofty::error::LoftyError,
    },
}

/// Errors that can occur while loading or saving the download ledger
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Failed to read ledger file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write ledger file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while scanning a folder for audio files
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Folder does not exist: {0}")]
    FolderNotFound(PathBuf),

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectoryFailed {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// Errors that abort organizing a whole folder
#[derive(Error, Debug)]
pub enum OrganizeError {
    #[error(transparent)]
    Naming(#[from] NamingError),

    #[error("Failed to create output folder {path}: {source}")]
    CreateOutputFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Error for copying a single file, which only skips that file
#[derive(Error, Debug)]
#[error("Failed to copy {from} to {to}: {source}")]
pub struct CopyError {
    pub from: PathBuf,
    pub to: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Errors that abort a podcast sync pass for one folder
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Errors raised while preparing the run configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot expand '~': home directory is unknown")]
    NoHomeDirectory,

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectoryFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that abort the whole run
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Input directory does not exist: {0}")]
    InputNotFound(PathBuf),

    #[error("Failed to read input directory {path}: {source}")]
    ReadInputFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
