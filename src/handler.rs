// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-kind resolution of an input folder into the ordered list of files to organize.

use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::description::{FolderDescription, PodcastSettings};
use crate::error::{ScanError, SyncError};
use crate::http::HttpClient;
use crate::ledger::DownloadLedger;
use crate::naming::natural_sort_paths;
use crate::probe::DurationProbe;
use crate::progress::SharedProgressReporter;
use crate::sync::{SyncResult, sync_podcast};

/// Files resolved for one folder, plus the outcome of a podcast sync if one ran
#[derive(Debug, Default)]
pub struct Resolved {
    pub files: Vec<PathBuf>,
    pub sync: Option<Result<SyncResult, SyncError>>,
}

/// Whether a path has an `.mp3` extension, ignoring case
pub fn is_mp3_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("mp3"))
}

/// Recursively collect every MP3 file below `folder`, naturally sorted by file name
pub fn find_mp3_files(folder: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !folder.is_dir() {
        return Err(ScanError::FolderNotFound(folder.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(folder).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|e| ScanError::ReadDirectoryFailed {
            path: folder.to_path_buf(),
            source: e,
        })?;

        if entry.file_type().is_file() && is_mp3_file(entry.path()) {
            files.push(entry.into_path());
        }
    }

    natural_sort_paths(&mut files);
    debug!(folder = %folder.display(), count = files.len(), "found mp3 files");
    Ok(files)
}

/// Album handler: the folder's MP3 files as they are
pub fn resolve_static(folder: &Path) -> Result<Vec<PathBuf>, ScanError> {
    find_mp3_files(folder)
}

/// Podcast handler: optionally sync with the feed, then take all MP3 files present
///
/// A failed sync is reported in [`Resolved::sync`]; files already in the folder
/// are still returned.
pub async fn resolve_podcast<C: HttpClient, P: DurationProbe>(
    client: &C,
    probe: &P,
    folder: &Path,
    settings: &PodcastSettings,
    update_requested: bool,
    reporter: &SharedProgressReporter,
) -> Result<Resolved, ScanError> {
    let sync = if update_requested {
        let result = match DownloadLedger::load(folder) {
            Ok(mut ledger) => {
                sync_podcast(client, probe, settings, folder, &mut ledger, reporter).await
            }
            Err(e) => Err(SyncError::from(e)),
        };
        Some(result)
    } else {
        None
    };

    let files = find_mp3_files(folder)?;
    Ok(Resolved { files, sync })
}

/// Dispatch on the folder description
pub async fn resolve<C: HttpClient, P: DurationProbe>(
    client: &C,
    probe: &P,
    folder: &Path,
    description: &FolderDescription,
    update_requested: bool,
    reporter: &SharedProgressReporter,
) -> Result<Resolved, ScanError> {
    match description {
        FolderDescription::Static => Ok(Resolved {
            files: resolve_static(folder)?,
            sync: None,
        }),
        FolderDescription::Rss(settings) => {
            resolve_podcast(client, probe, folder, settings, update_requested, reporter).await
        }
    }
}
