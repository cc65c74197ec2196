// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::description::PodcastSettings;
use crate::episode::{
    DownloadContext, PARTIAL_SUFFIX, download_episode, episode_filename, partial_path,
    unique_destination,
};
use crate::error::{DownloadError, SyncError};
use crate::feed::{EpisodeRecord, fetch_feed};
use crate::http::HttpClient;
use crate::ledger::DownloadLedger;
use crate::probe::DurationProbe;
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// Result of a sync operation
#[derive(Debug, Clone, Default)]
pub struct SyncResult {
    /// Episodes downloaded and kept
    pub downloaded: usize,
    /// Episodes downloaded and discarded as too short
    pub rejected: usize,
    /// Episodes already accepted or rejected by an earlier sync
    pub skipped: usize,
    /// Episodes whose download or duration probe failed
    pub failed: usize,
    /// Details of failed episodes (title, error message)
    pub failed_episodes: Vec<(String, String)>,
}

enum EpisodeOutcome {
    Accepted(PathBuf),
    Rejected,
}

/// Synchronize a podcast folder with its feed
///
/// 1. Fetches and parses the feed; failure aborts without touching the ledger
/// 2. Removes stale `.partial` files from interrupted runs
/// 3. Downloads every episode the ledger does not know, one at a time in feed order
/// 4. Rejects episodes shorter than `settings.min_duration`, keeps the rest
/// 5. Saves the ledger once
///
/// Download and probe failures only skip the affected episode; it stays out of
/// the ledger and is retried on the next sync. If the ledger cannot be saved,
/// the episodes accepted in this pass are removed again and the ledger is left
/// as loaded, so the folder never holds a file the ledger does not list.
pub async fn sync_podcast<C: HttpClient, P: DurationProbe>(
    client: &C,
    probe: &P,
    settings: &PodcastSettings,
    folder: &Path,
    ledger: &mut DownloadLedger,
    reporter: &SharedProgressReporter,
) -> Result<SyncResult, SyncError> {
    reporter.report(ProgressEvent::FetchingFeed {
        source: settings.feed_url.clone(),
    });

    let episodes = fetch_feed(client, &settings.feed_url).await?;

    let cleaned = clean_partial_files(folder);
    if cleaned > 0 {
        reporter.report(ProgressEvent::PartialFilesCleanedUp { count: cleaned });
    }

    let (known, new): (Vec<_>, Vec<_>) = episodes
        .into_iter()
        .partition(|episode| ledger.is_known(&episode.url));

    reporter.report(ProgressEvent::FeedParsed {
        total_episodes: known.len() + new.len(),
        new_episodes: new.len(),
    });

    let mut result = SyncResult {
        skipped: known.len(),
        ..Default::default()
    };

    let loaded = ledger.clone();
    let mut accepted_files = Vec::new();
    let total_to_download = new.len();
    for (episode_index, episode) in new.iter().enumerate() {
        // A feed can list the same enclosure twice
        if ledger.is_known(&episode.url) {
            result.skipped += 1;
            continue;
        }

        let context = DownloadContext {
            episode_index,
            total_to_download,
        };

        match process_episode(client, probe, settings, folder, episode, context, reporter).await {
            Ok(EpisodeOutcome::Accepted(destination)) => {
                ledger.record_accepted(&episode.url);
                accepted_files.push(destination);
                result.downloaded += 1;
            }
            Ok(EpisodeOutcome::Rejected) => {
                ledger.record_rejected(&episode.url);
                result.rejected += 1;
            }
            Err(error) => {
                warn!(url = %episode.url, "episode failed: {error}");
                reporter.report(ProgressEvent::DownloadFailed {
                    episode_title: episode.title.clone(),
                    error: error.clone(),
                });
                result.failed += 1;
                result.failed_episodes.push((episode.title.clone(), error));
            }
        }
    }

    if let Err(e) = ledger.save(folder) {
        warn!(
            folder = %folder.display(),
            count = accepted_files.len(),
            "ledger not saved, removing unrecorded episodes: {e}"
        );
        for file in &accepted_files {
            let _ = std::fs::remove_file(file);
        }
        *ledger = loaded;
        return Err(e.into());
    }

    reporter.report(ProgressEvent::SyncCompleted {
        downloaded_count: result.downloaded,
        rejected_count: result.rejected,
        skipped_count: result.skipped,
        failed_count: result.failed,
    });

    Ok(result)
}

async fn process_episode<C: HttpClient, P: DurationProbe>(
    client: &C,
    probe: &P,
    settings: &PodcastSettings,
    folder: &Path,
    episode: &EpisodeRecord,
    context: DownloadContext,
    reporter: &SharedProgressReporter,
) -> Result<EpisodeOutcome, String> {
    let destination = unique_destination(folder, &episode_filename(episode));
    let temp_path = partial_path(&destination);

    download_episode(client, episode, &temp_path, context, reporter)
        .await
        .map_err(|e| e.to_string())?;

    let duration_secs = match probe.duration_secs(&temp_path) {
        Ok(seconds) => seconds,
        Err(e) => {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e.to_string());
        }
    };

    if duration_secs < settings.min_duration {
        debug!(
            url = %episode.url,
            duration_secs,
            min_duration = settings.min_duration,
            "rejecting short episode"
        );
        let _ = std::fs::remove_file(&temp_path);
        reporter.report(ProgressEvent::EpisodeRejected {
            episode_title: episode.title.clone(),
            duration_secs,
            min_duration: settings.min_duration,
        });
        return Ok(EpisodeOutcome::Rejected);
    }

    if let Err(e) = std::fs::rename(&temp_path, &destination) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(DownloadError::FinalizeFailed {
            from: temp_path,
            to: destination,
            source: e,
        }
        .to_string());
    }

    reporter.report(ProgressEvent::EpisodeAccepted {
        episode_title: episode.title.clone(),
        filename: destination
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        duration_secs,
    });

    Ok(EpisodeOutcome::Accepted(destination))
}

/// Remove `.partial` files left in the folder by an interrupted run
fn clean_partial_files(folder: &Path) -> usize {
    let Ok(entries) = std::fs::read_dir(folder) else {
        return 0;
    };

    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(PARTIAL_SUFFIX))
        })
        .filter(|path| std::fs::remove_file(path).is_ok())
        .count()
}
