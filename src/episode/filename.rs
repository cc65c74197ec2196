// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::feed::EpisodeRecord;

/// Maximum length for a title-derived filename stem
const MAX_STEM_LENGTH: usize = 100;

/// Check if a character is allowed in title-derived filenames (whitelist approach)
fn is_valid_filename_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' ')
}

/// Derive the stable local filename for an episode
///
/// Preference order:
/// 1. the last path segment of the enclosure URL, if it names an `.mp3`
/// 2. the sanitized episode title
/// 3. `episode_<hash>.mp3`, hashing the enclosure URL
pub fn episode_filename(episode: &EpisodeRecord) -> String {
    if let Some(name) = filename_from_url(episode) {
        return name;
    }

    let stem = sanitize_title(&episode.title);
    if !stem.is_empty() {
        return format!("{stem}.mp3");
    }

    format!("episode_{}.mp3", url_hash(&episode.url))
}

/// First free path for `filename` in `folder`, appending `_1`, `_2`, ... to the stem
pub fn unique_destination(folder: &Path, filename: &str) -> PathBuf {
    let candidate = folder.join(filename);
    if !candidate.exists() {
        return candidate;
    }

    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());

    let mut counter = 1;
    loop {
        let candidate = folder.join(format!("{stem}_{counter}.mp3"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

fn filename_from_url(episode: &EpisodeRecord) -> Option<String> {
    let url = episode.parsed_url()?;
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())?;

    let sanitized = sanitize_filename::sanitize(segment);
    let lower = sanitized.to_ascii_lowercase();
    let stem_len = lower.strip_suffix(".mp3")?.trim_start_matches('.').len();
    if stem_len == 0 {
        return None;
    }

    // Normalize the extension so the album scan always sees `.mp3`
    Some(format!("{}.mp3", &sanitized[..sanitized.len() - 4]))
}

fn url_hash(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    digest.iter().take(4).map(|b| format!("{b:02x}")).collect()
}

/// Sanitize a title for use in a filename using whitelist approach
fn sanitize_title(title: &str) -> String {
    let sanitized: String = title
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|&c| is_valid_filename_char(c))
        .collect();

    let collapsed = collapse_separators(sanitized.trim());
    let trimmed = collapsed.trim_matches('_');

    truncate_at_boundary(trimmed, MAX_STEM_LENGTH)
}

/// Collapse runs of whitespace into a single underscore
fn collapse_separators(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut last_was_space = false;

    for c in s.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                result.push('_');
                last_was_space = true;
            }
        } else {
            result.push(c);
            last_was_space = false;
        }
    }

    result
}

/// Truncate string at a word boundary
fn truncate_at_boundary(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }

    // Only ASCII remains after sanitizing, so byte slicing is safe
    let truncated = &s[..max_len];
    if let Some(pos) = truncated.rfind('_')
        && pos > max_len / 2
    {
        return truncated[..pos].to_string();
    }

    truncated.trim_end_matches('_').to_string()
}
