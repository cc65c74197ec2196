// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

pub const DEFAULT_INPUT_PATH: &str = "~/data/tonuino/input";
pub const DEFAULT_OUTPUT_PATH: &str = "~/data/tonuino/output";

/// Immutable settings for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the `DD_name` input folders
    pub input_root: PathBuf,
    /// Directory receiving the `DD/NNN.mp3` layout
    pub output_root: PathBuf,
    /// Fetch podcast feeds and download new episodes
    pub update: bool,
}

impl Config {
    pub fn new(input_root: PathBuf, output_root: PathBuf, update: bool) -> Self {
        Self {
            input_root,
            output_root,
            update,
        }
    }

    /// Build a configuration from optional user paths, expanding `~`
    pub fn from_args(
        input: Option<&str>,
        output: Option<&str>,
        update: bool,
    ) -> Result<Self, ConfigError> {
        Ok(Self::new(
            expand_path(input.unwrap_or(DEFAULT_INPUT_PATH))?,
            expand_path(output.unwrap_or(DEFAULT_OUTPUT_PATH))?,
            update,
        ))
    }

    /// Create the input and output roots if they do not exist
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        for dir in [&self.input_root, &self.output_root] {
            std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDirectoryFailed {
                path: dir.clone(),
                source: e,
            })?;
        }
        Ok(())
    }
}

/// Expand a leading `~` to the user's home directory
pub fn expand_path(path: &str) -> Result<PathBuf, ConfigError> {
    let rest = if path == "~" {
        ""
    } else if let Some(rest) = path.strip_prefix("~/") {
        rest
    } else {
        return Ok(PathBuf::from(path));
    };

    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(if rest.is_empty() {
        home
    } else {
        home.join(Path::new(rest))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn expand_path_leaves_plain_paths_alone() {
        assert_eq!(expand_path("/music/in").unwrap(), PathBuf::from("/music/in"));
        assert_eq!(expand_path("relative").unwrap(), PathBuf::from("relative"));
        assert_eq!(expand_path("~user/x").unwrap(), PathBuf::from("~user/x"));
    }

    #[test]
    fn expand_path_resolves_home() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_path("~").unwrap(), home);
            assert_eq!(expand_path("~/data").unwrap(), home.join("data"));
        }
    }

    #[test]
    fn from_args_uses_explicit_paths() {
        let config = Config::from_args(Some("/in"), Some("/out"), true).unwrap();
        assert_eq!(config, Config::new("/in".into(), "/out".into(), true));
    }

    #[test]
    fn from_args_defaults_below_home() {
        if let Some(home) = dirs::home_dir() {
            let config = Config::from_args(None, None, false).unwrap();
            assert_eq!(config.input_root, home.join("data/tonuino/input"));
            assert_eq!(config.output_root, home.join("data/tonuino/output"));
        }
    }

    #[test]
    fn ensure_directories_creates_missing_roots() {
        let dir = tempdir().unwrap();
        let config = Config::new(dir.path().join("in/a"), dir.path().join("out/b"), false);

        config.ensure_directories().unwrap();

        assert!(config.input_root.is_dir());
        assert!(config.output_root.is_dir());
    }
}
