// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use lofty::file::AudioFile;
use lofty::probe::Probe;

use crate::error::ProbeError;

/// Audio duration probe abstraction for testability
pub trait DurationProbe: Send + Sync {
    /// Playback duration of the file in seconds
    fn duration_secs(&self, path: &Path) -> Result<f64, ProbeError>;
}

/// Duration probe reading audio properties with lofty
///
/// The file type is guessed from content, so temporary files without an
/// `.mp3` extension are probed correctly.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyProbe;

impl DurationProbe for LoftyProbe {
    fn duration_secs(&self, path: &Path) -> Result<f64, ProbeError> {
        let tagged_file = Probe::open(path)
            .map_err(|e| ProbeError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?
            .guess_file_type()
            .map_err(|e| ProbeError::OpenFailed {
                path: path.to_path_buf(),
                source: e,
            })?
            .read()
            .map_err(|e| ProbeError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(tagged_file.properties().duration().as_secs_f64())
    }
}
