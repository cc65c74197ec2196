// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::error::DescriptionError;

/// Name of the description document inside every input folder
pub const DESCRIPTION_FILE: &str = "description.yaml";

/// Minimum episode duration in seconds when a description does not set one
pub const DEFAULT_MIN_DURATION: f64 = 60.0;

/// Settings of an RSS-fed podcast folder
#[derive(Debug, Clone, PartialEq)]
pub struct PodcastSettings {
    pub feed_url: String,
    /// Episodes shorter than this many seconds are rejected
    pub min_duration: f64,
}

/// Validated contents of a folder's `description.yaml`
#[derive(Debug, Clone, PartialEq)]
pub enum FolderDescription {
    /// A fixed album; files are taken as they are
    Static,
    /// A podcast synchronized from an RSS feed
    Rss(PodcastSettings),
}

impl FolderDescription {
    /// Short label used in progress output
    pub fn kind(&self) -> &'static str {
        match self {
            FolderDescription::Static => "static",
            FolderDescription::Rss(_) => "rss",
        }
    }

    /// Validate a parsed key/value mapping
    pub fn parse(raw: &Mapping) -> Result<Self, DescriptionError> {
        let kind = match raw.get("type") {
            None | Some(Value::Null) => return Err(DescriptionError::MissingType),
            Some(Value::String(s)) => s.as_str(),
            Some(other) => return Err(DescriptionError::UnknownType(render(other))),
        };

        // Validated for every kind, only kept for podcasts
        let min_duration = parse_min_duration(raw.get("min_duration"))?;

        match kind {
            "static" => Ok(FolderDescription::Static),
            "rss" => {
                let feed_url = match raw.get("feed_url") {
                    None => return Err(DescriptionError::MissingFeedUrl),
                    Some(Value::String(url)) if !url.trim().is_empty() => url.trim().to_string(),
                    Some(_) => return Err(DescriptionError::EmptyFeedUrl),
                };

                Ok(FolderDescription::Rss(PodcastSettings {
                    feed_url,
                    min_duration: min_duration.unwrap_or(DEFAULT_MIN_DURATION),
                }))
            }
            other => Err(DescriptionError::UnknownType(other.to_string())),
        }
    }

    /// Parse a description document from YAML text
    pub fn from_yaml(text: &str, path: &Path) -> Result<Self, DescriptionError> {
        let value: Value =
            serde_yaml::from_str(text).map_err(|e| DescriptionError::InvalidYaml {
                path: path.to_path_buf(),
                source: e,
            })?;

        match value {
            Value::Mapping(mapping) => Self::parse(&mapping),
            _ => Err(DescriptionError::NotAMapping),
        }
    }

    /// Read and validate `description.yaml` from an input folder
    pub fn load(folder: &Path) -> Result<Self, DescriptionError> {
        let path = folder.join(DESCRIPTION_FILE);

        let text = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DescriptionError::NotFound(path.clone())
            } else {
                DescriptionError::ReadFailed {
                    path: path.clone(),
                    source: e,
                }
            }
        })?;

        Self::from_yaml(&text, &path)
    }
}

fn parse_min_duration(value: Option<&Value>) -> Result<Option<f64>, DescriptionError> {
    let Some(value) = value else {
        return Ok(None);
    };

    let seconds = match value {
        Value::Number(n) => n
            .as_f64()
            .ok_or(DescriptionError::MinDurationNotANumber)?,
        _ => return Err(DescriptionError::MinDurationNotANumber),
    };

    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(DescriptionError::MinDurationNotPositive(seconds));
    }

    Ok(Some(seconds))
}

fn render(value: &Value) -> String {
    serde_yaml::to_string(value)
        .map(|s| s.trim_end().to_string())
        .unwrap_or_else(|_| format!("{value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn parse(yaml: &str) -> Result<FolderDescription, DescriptionError> {
        FolderDescription::from_yaml(yaml, Path::new("description.yaml"))
    }

    #[test]
    fn parses_static_description() {
        assert_eq!(parse("type: static").unwrap(), FolderDescription::Static);
    }

    #[test]
    fn static_description_drops_feed_fields() {
        let description = parse("type: static\nfeed_url: https://example.com/feed.xml\n").unwrap();
        assert_eq!(description, FolderDescription::Static);
    }

    #[test]
    fn parses_rss_description_with_default_duration() {
        let description = parse("type: rss\nfeed_url: https://example.com/feed.xml\n").unwrap();
        assert_eq!(
            description,
            FolderDescription::Rss(PodcastSettings {
                feed_url: "https://example.com/feed.xml".to_string(),
                min_duration: DEFAULT_MIN_DURATION,
            })
        );
    }

    #[test]
    fn parses_integer_and_float_min_duration() {
        for (yaml, expected) in [("120", 120.0), ("90.5", 90.5)] {
            let text = format!("type: rss\nfeed_url: https://a.example/f\nmin_duration: {yaml}\n");
            match parse(&text).unwrap() {
                FolderDescription::Rss(settings) => assert_eq!(settings.min_duration, expected),
                other => panic!("expected rss, got {other:?}"),
            }
        }
    }

    #[test]
    fn missing_type_fails() {
        assert!(matches!(
            parse("feed_url: https://example.com"),
            Err(DescriptionError::MissingType)
        ));
    }

    #[test]
    fn unknown_type_fails() {
        assert!(matches!(
            parse("type: playlist"),
            Err(DescriptionError::UnknownType(t)) if t == "playlist"
        ));
        assert!(matches!(
            parse("type: 5"),
            Err(DescriptionError::UnknownType(_))
        ));
    }

    #[test]
    fn rss_without_feed_url_fails() {
        assert!(matches!(
            parse("type: rss"),
            Err(DescriptionError::MissingFeedUrl)
        ));
    }

    #[test]
    fn rss_with_empty_feed_url_fails() {
        assert!(matches!(
            parse("type: rss\nfeed_url: ''"),
            Err(DescriptionError::EmptyFeedUrl)
        ));
        assert!(matches!(
            parse("type: rss\nfeed_url: 42"),
            Err(DescriptionError::EmptyFeedUrl)
        ));
    }

    #[test]
    fn non_positive_min_duration_fails() {
        for value in ["0", "-5", "-0.1"] {
            let text = format!("type: rss\nfeed_url: https://a.example/f\nmin_duration: {value}\n");
            assert!(matches!(
                parse(&text),
                Err(DescriptionError::MinDurationNotPositive(_))
            ));
        }
    }

    #[test]
    fn non_numeric_min_duration_fails() {
        for value in ["'120'", "true", "[1]"] {
            let text = format!("type: rss\nfeed_url: https://a.example/f\nmin_duration: {value}\n");
            assert!(matches!(
                parse(&text),
                Err(DescriptionError::MinDurationNotANumber)
            ));
        }
    }

    #[test]
    fn min_duration_is_validated_for_static_too() {
        assert!(parse("type: static\nmin_duration: -1").is_err());
    }

    #[test]
    fn non_mapping_document_fails() {
        assert!(matches!(
            parse("- static\n- rss\n"),
            Err(DescriptionError::NotAMapping)
        ));
    }

    #[test]
    fn invalid_yaml_fails() {
        assert!(matches!(
            parse("type: [unclosed"),
            Err(DescriptionError::InvalidYaml { .. })
        ));
    }

    #[test]
    fn load_reads_description_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(DESCRIPTION_FILE), "type: static\n").unwrap();

        assert_eq!(
            FolderDescription::load(dir.path()).unwrap(),
            FolderDescription::Static
        );
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            FolderDescription::load(dir.path()),
            Err(DescriptionError::NotFound(_))
        ));
    }
}
