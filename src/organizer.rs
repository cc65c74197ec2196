// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{CopyError, OrganizeError};
use crate::naming::{MAX_OUTPUT_FILES, extract_prefix, output_name};
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// Result of organizing one folder into the output tree
#[derive(Debug)]
pub struct OrganizeReport {
    /// The folder inside the output root, named after the two-digit prefix
    pub output_folder: PathBuf,
    /// Number of files copied to their numbered names
    pub copied: usize,
    /// Files beyond the per-folder limit that were left out
    pub truncated: usize,
    /// Files that could not be copied
    pub failures: Vec<CopyError>,
}

impl OrganizeReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Copy a folder's sorted files to `<output_root>/<prefix>/001.mp3 ...`
///
/// Existing files at the destination names are overwritten and the output
/// folder is reused if present. Sources are left in place. A failed copy
/// skips that file only.
pub fn organize(
    folder_name: &str,
    files: &[PathBuf],
    output_root: &Path,
    reporter: &SharedProgressReporter,
) -> Result<OrganizeReport, OrganizeError> {
    let prefix = extract_prefix(folder_name)?;

    let (files, truncated) = if files.len() > MAX_OUTPUT_FILES {
        let dropped = files.len() - MAX_OUTPUT_FILES;
        warn!(
            folder = folder_name,
            kept = MAX_OUTPUT_FILES,
            dropped,
            "too many files for one output folder, ignoring the rest"
        );
        reporter.report(ProgressEvent::FilesTruncated {
            kept: MAX_OUTPUT_FILES,
            dropped,
        });
        (&files[..MAX_OUTPUT_FILES], dropped)
    } else {
        (files, 0)
    };

    let output_folder = output_root.join(prefix);
    std::fs::create_dir_all(&output_folder).map_err(|e| OrganizeError::CreateOutputFailed {
        path: output_folder.clone(),
        source: e,
    })?;

    reporter.report(ProgressEvent::OrganizeStarted {
        output_folder: output_folder.display().to_string(),
        total: files.len(),
    });

    let mut copied = 0;
    let mut failures = Vec::new();

    for (position, source) in files.iter().enumerate() {
        let index = position + 1;
        let name = output_name(index)?;
        let destination = output_folder.join(&name);
        let source_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match std::fs::copy(source, &destination) {
            Ok(bytes) => {
                copied += 1;
                reporter.report(ProgressEvent::FileCopied {
                    index,
                    total: files.len(),
                    source_name,
                    output_name: name,
                    bytes,
                });
            }
            Err(e) => {
                let error = CopyError {
                    from: source.clone(),
                    to: destination,
                    source: e,
                };
                warn!("{error}");
                reporter.report(ProgressEvent::CopyFailed {
                    source_name,
                    error: error.to_string(),
                });
                failures.push(error);
            }
        }
    }

    Ok(OrganizeReport {
        output_folder,
        copied,
        truncated,
        failures,
    })
}
