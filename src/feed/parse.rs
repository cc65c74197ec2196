// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tracing::debug;
use url::Url;

use crate::error::FeedError;

/// A remote episode, identified by its enclosure URL
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeRecord {
    pub title: String,
    /// Enclosure URL exactly as written in the feed; used as ledger identifier
    pub url: String,
}

impl EpisodeRecord {
    /// The enclosure URL parsed for path inspection
    pub fn parsed_url(&self) -> Option<Url> {
        Url::parse(&self.url).ok()
    }
}

/// Parse RSS feed XML bytes into episodes, preserving feed order
pub fn parse_feed(xml_bytes: &[u8]) -> Result<Vec<EpisodeRecord>, FeedError> {
    let channel = rss::Channel::read_from(xml_bytes)?;

    let episodes = channel
        .items()
        .iter()
        .filter_map(|item| match parse_episode(item) {
            Ok(episode) => Some(episode),
            Err(e) => {
                debug!("skipping feed item: {e}");
                None
            }
        })
        .collect();

    Ok(episodes)
}

fn parse_episode(item: &rss::Item) -> Result<EpisodeRecord, FeedError> {
    let title = item
        .title()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Unknown Episode".to_string());

    let enclosure = item
        .enclosure()
        .filter(|enc| is_audio_mime(enc.mime_type()))
        .ok_or_else(|| FeedError::MissingEnclosure {
            title: title.clone(),
        })?;

    let url = enclosure.url().trim();
    Url::parse(url).map_err(|e| FeedError::InvalidEnclosureUrl {
        title: title.clone(),
        source: e,
    })?;

    Ok(EpisodeRecord {
        title,
        url: url.to_string(),
    })
}

/// Enclosures without a declared type are accepted; otherwise it must be audio
fn is_audio_mime(mime: &str) -> bool {
    let mime = mime.trim();
    mime.is_empty() || mime.to_ascii_lowercase().starts_with("audio/")
}
