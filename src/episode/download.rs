// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::error::DownloadError;
use crate::feed::EpisodeRecord;
use crate::http::HttpClient;
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// Suffix of in-flight downloads inside an input folder
pub const PARTIAL_SUFFIX: &str = ".partial";

/// Position of a download within the current sync pass
#[derive(Debug, Clone, Copy)]
pub struct DownloadContext {
    /// Index of this episode among the new episodes
    pub episode_index: usize,
    /// Number of new episodes in this pass
    pub total_to_download: usize,
}

/// Temporary path a download for `destination` is streamed to
pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.as_os_str().to_owned();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Download an episode's enclosure to the specified path
///
/// Streams the response body to disk, reporting progress through the reporter.
/// Returns the number of bytes downloaded on success. A file left behind by a
/// failed download is removed.
pub async fn download_episode<C: HttpClient>(
    client: &C,
    episode: &EpisodeRecord,
    output_path: &Path,
    context: DownloadContext,
    reporter: &SharedProgressReporter,
) -> Result<u64, DownloadError> {
    let result = stream_to_file(client, episode, output_path, context, reporter).await;
    if result.is_err() {
        let _ = tokio::fs::remove_file(output_path).await;
    }
    result
}

async fn stream_to_file<C: HttpClient>(
    client: &C,
    episode: &EpisodeRecord,
    output_path: &Path,
    context: DownloadContext,
    reporter: &SharedProgressReporter,
) -> Result<u64, DownloadError> {
    let url = episode.url.as_str();

    let response = client
        .get_stream(url)
        .await
        .map_err(|e| DownloadError::HttpFailed {
            url: url.to_string(),
            source: e,
        })?;

    if response.status >= 400 {
        return Err(DownloadError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    reporter.report(ProgressEvent::DownloadStarting {
        episode_title: episode.title.clone(),
        episode_index: context.episode_index,
        total_to_download: context.total_to_download,
        content_length: response.content_length,
    });

    let mut file =
        File::create(output_path)
            .await
            .map_err(|e| DownloadError::FileCreateFailed {
                path: output_path.to_path_buf(),
                source: e,
            })?;

    let mut bytes_downloaded: u64 = 0;
    let mut stream = response.body;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::StreamFailed {
            url: url.to_string(),
            source: e,
        })?;

        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::FileWriteFailed {
                path: output_path.to_path_buf(),
                source: e,
            })?;

        bytes_downloaded += chunk.len() as u64;

        reporter.report(ProgressEvent::DownloadProgress {
            bytes_downloaded,
            total_bytes: response.content_length,
        });
    }

    file.flush()
        .await
        .map_err(|e| DownloadError::FileWriteFailed {
            path: output_path.to_path_buf(),
            source: e,
        })?;

    reporter.report(ProgressEvent::DownloadCompleted {
        episode_title: episode.title.clone(),
        bytes_downloaded,
    });

    Ok(bytes_downloaded)
}
