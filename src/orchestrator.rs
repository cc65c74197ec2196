// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::Config;
use crate::description::FolderDescription;
use crate::error::{RunError, SyncError};
use crate::handler::resolve;
use crate::http::HttpClient;
use crate::naming::is_valid_prefixed_name;
use crate::organizer::organize;
use crate::probe::DurationProbe;
use crate::progress::{ProgressEvent, SharedProgressReporter};

/// An input folder whose name matches `DD_name`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFolder {
    pub name: String,
    pub prefix: String,
    pub path: PathBuf,
}

/// Result of scanning the input root
#[derive(Debug, Default)]
pub struct Discovery {
    /// Valid folders in prefix order
    pub folders: Vec<InputFolder>,
    /// Directory names that do not match the pattern
    pub skipped: Vec<String>,
}

/// Final state of one folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderStatus {
    Organized,
    /// No MP3 files to organize
    Empty,
    Failed(String),
}

/// Per-folder summary line
#[derive(Debug, Clone)]
pub struct FolderOutcome {
    pub name: String,
    pub status: FolderStatus,
    pub files_copied: usize,
    pub files_truncated: usize,
    pub copy_failures: Vec<String>,
    pub downloaded: usize,
    pub rejected: usize,
    /// Episodes that could not be downloaded, as `title: error`
    pub failed_episodes: Vec<String>,
    /// Set when `--update` was requested but the feed could not be synced
    pub sync_error: Option<String>,
}

impl FolderOutcome {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            status: FolderStatus::Empty,
            files_copied: 0,
            files_truncated: 0,
            copy_failures: Vec::new(),
            downloaded: 0,
            rejected: 0,
            failed_episodes: Vec::new(),
            sync_error: None,
        }
    }

    fn failed(name: &str, reason: impl Into<String>) -> Self {
        Self {
            status: FolderStatus::Failed(reason.into()),
            ..Self::new(name)
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, FolderStatus::Failed(_))
    }

    /// One-line human readable result
    pub fn message(&self) -> String {
        let mut message = match &self.status {
            FolderStatus::Organized => format!("{} file(s) organized", self.files_copied),
            FolderStatus::Empty => "no MP3 files to organize".to_string(),
            FolderStatus::Failed(reason) => reason.clone(),
        };
        if self.downloaded > 0 || self.rejected > 0 || !self.failed_episodes.is_empty() {
            message.push_str(&format!(
                ", {} episode(s) downloaded, {} rejected, {} failed",
                self.downloaded,
                self.rejected,
                self.failed_episodes.len()
            ));
        }
        if self.files_truncated > 0 {
            message.push_str(&format!(", {} file(s) over the limit", self.files_truncated));
        }
        if let Some(error) = &self.sync_error {
            message.push_str(&format!(", feed not updated: {error}"));
        }
        message
    }
}

/// Aggregated result of a run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub folders: Vec<FolderOutcome>,
    pub skipped: Vec<String>,
}

impl RunSummary {
    /// Whether any folder failed; drives the process exit status
    pub fn has_failures(&self) -> bool {
        self.folders.iter().any(FolderOutcome::is_failure)
    }

    pub fn processed(&self) -> usize {
        self.folders
            .iter()
            .filter(|f| f.status == FolderStatus::Organized)
            .count()
    }

    pub fn files_copied(&self) -> usize {
        self.folders.iter().map(|f| f.files_copied).sum()
    }

    pub fn downloaded(&self) -> usize {
        self.folders.iter().map(|f| f.downloaded).sum()
    }

    pub fn rejected(&self) -> usize {
        self.folders.iter().map(|f| f.rejected).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &FolderOutcome> {
        self.folders.iter().filter(|f| f.is_failure())
    }

    /// Episodes that failed to download, paired with their folder name
    pub fn failed_episodes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.folders.iter().flat_map(|f| {
            f.failed_episodes
                .iter()
                .map(move |episode| (f.name.as_str(), episode.as_str()))
        })
    }
}

/// List the immediate subdirectories of the input root that match `DD_name`
pub fn discover_folders(input_root: &Path) -> Result<Discovery, RunError> {
    if !input_root.is_dir() {
        return Err(RunError::InputNotFound(input_root.to_path_buf()));
    }

    let entries = std::fs::read_dir(input_root).map_err(|e| RunError::ReadInputFailed {
        path: input_root.to_path_buf(),
        source: e,
    })?;

    let mut discovery = Discovery::default();
    for entry in entries {
        let entry = entry.map_err(|e| RunError::ReadInputFailed {
            path: input_root.to_path_buf(),
            source: e,
        })?;

        let path = entry.path();
        if !path.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        if is_valid_prefixed_name(&name) {
            discovery.folders.push(InputFolder {
                prefix: name[..2].to_string(),
                name,
                path,
            });
        } else {
            discovery.skipped.push(name);
        }
    }

    discovery
        .folders
        .sort_by(|a, b| a.prefix.cmp(&b.prefix).then_with(|| a.name.cmp(&b.name)));
    discovery.skipped.sort();
    Ok(discovery)
}

/// Organize every valid input folder, one after another
///
/// Failures are isolated to the folder they occur in; the returned summary
/// lists every folder's outcome.
pub async fn run<C: HttpClient, P: DurationProbe>(
    config: &Config,
    client: &C,
    probe: &P,
    reporter: &SharedProgressReporter,
) -> Result<RunSummary, RunError> {
    let discovery = discover_folders(&config.input_root)?;

    for name in &discovery.skipped {
        warn!(folder = %name, "skipping folder without a two-digit prefix");
        reporter.report(ProgressEvent::FolderSkipped {
            folder: name.clone(),
            reason: "name must start with two digits and an underscore".to_string(),
        });
    }

    let mut summary = RunSummary {
        folders: Vec::with_capacity(discovery.folders.len()),
        skipped: discovery.skipped,
    };
    let mut claimed: HashMap<String, String> = HashMap::new();

    for folder in &discovery.folders {
        let outcome = if let Some(owner) = claimed.get(&folder.prefix) {
            FolderOutcome::failed(
                &folder.name,
                format!("prefix {} is already used by {owner}", folder.prefix),
            )
        } else {
            claimed.insert(folder.prefix.clone(), folder.name.clone());
            process_folder(config, client, probe, folder, reporter).await
        };

        if let FolderStatus::Failed(reason) = &outcome.status {
            warn!(folder = %folder.name, "folder failed: {reason}");
        }
        reporter.report(ProgressEvent::FolderCompleted {
            folder: folder.name.clone(),
            success: !outcome.is_failure(),
            message: outcome.message(),
        });
        summary.folders.push(outcome);
    }

    Ok(summary)
}

async fn process_folder<C: HttpClient, P: DurationProbe>(
    config: &Config,
    client: &C,
    probe: &P,
    folder: &InputFolder,
    reporter: &SharedProgressReporter,
) -> FolderOutcome {
    let description = match FolderDescription::load(&folder.path) {
        Ok(description) => description,
        Err(e) => return FolderOutcome::failed(&folder.name, format!("invalid description: {e}")),
    };

    reporter.report(ProgressEvent::FolderStarted {
        folder: folder.name.clone(),
        kind: description.kind(),
    });
    debug!(folder = %folder.name, kind = description.kind(), "processing folder");

    let resolved = match resolve(
        client,
        probe,
        &folder.path,
        &description,
        config.update,
        reporter,
    )
    .await
    {
        Ok(resolved) => resolved,
        Err(e) => return FolderOutcome::failed(&folder.name, e.to_string()),
    };

    let mut outcome = FolderOutcome::new(&folder.name);
    let mut ledger_error = None;
    match resolved.sync {
        Some(Ok(sync)) => {
            outcome.downloaded = sync.downloaded;
            outcome.rejected = sync.rejected;
            outcome.failed_episodes = sync
                .failed_episodes
                .into_iter()
                .map(|(title, error)| format!("{title}: {error}"))
                .collect();
        }
        Some(Err(e @ SyncError::Ledger(_))) => {
            warn!(folder = %folder.name, "podcast sync failed: {e}");
            ledger_error = Some(format!("download ledger not updated: {e}"));
        }
        Some(Err(e)) => {
            warn!(folder = %folder.name, "podcast sync failed: {e}");
            outcome.sync_error = Some(e.to_string());
        }
        None => {}
    }

    if !resolved.files.is_empty() {
        organize_into(config, folder, &resolved.files, reporter, &mut outcome);
    }

    // Local files are organized either way
    if let Some(reason) = ledger_error {
        outcome.status = FolderStatus::Failed(reason);
    }

    outcome
}

fn organize_into(
    config: &Config,
    folder: &InputFolder,
    files: &[PathBuf],
    reporter: &SharedProgressReporter,
    outcome: &mut FolderOutcome,
) {
    match organize(&folder.name, files, &config.output_root, reporter) {
        Ok(report) => {
            outcome.files_copied = report.copied;
            outcome.files_truncated = report.truncated;
            outcome.copy_failures = report.failures.iter().map(|e| e.to_string()).collect();
            outcome.status = if report.is_complete() {
                FolderStatus::Organized
            } else {
                FolderStatus::Failed(format!(
                    "{} of {} file(s) could not be copied",
                    report.failures.len(),
                    report.failures.len() + report.copied
                ))
            };
        }
        Err(e) => outcome.status = FolderStatus::Failed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::DESCRIPTION_FILE;
    use crate::ledger::{ACCEPTED_FILE, REJECTED_FILE};
    use crate::progress::{NoopReporter, RecordingReporter};
    use crate::sync::tests::{MockHttpClient, MockProbe, feed_with};
    use std::sync::Arc;
    use tempfile::{TempDir, tempdir};

    struct Fixture {
        _root: TempDir,
        config: Config,
    }

    impl Fixture {
        fn new(update: bool) -> Self {
            let root = tempdir().unwrap();
            let config = Config::new(root.path().join("in"), root.path().join("out"), update);
            config.ensure_directories().unwrap();
            Self {
                _root: root,
                config,
            }
        }

        fn folder(&self, name: &str, description: &str, files: &[(&str, &str)]) -> PathBuf {
            let path = self.config.input_root.join(name);
            std::fs::create_dir_all(&path).unwrap();
            std::fs::write(path.join(DESCRIPTION_FILE), description).unwrap();
            for (file, content) in files {
                std::fs::write(path.join(file), content).unwrap();
            }
            path
        }

        fn output(&self, relative: &str) -> PathBuf {
            self.config.output_root.join(relative)
        }

        async fn run(&self, client: &MockHttpClient) -> RunSummary {
            run(&self.config, client, &MockProbe, &NoopReporter::shared())
                .await
                .unwrap()
        }
    }

    #[test]
    fn discover_filters_and_sorts_folders() {
        let dir = tempdir().unwrap();
        for name in ["10_Ten", "02_Two", "1_Bad", "001_Bad", "01x"] {
            std::fs::create_dir(dir.path().join(name)).unwrap();
        }
        std::fs::write(dir.path().join("03_file.txt"), b"not a dir").unwrap();

        let discovery = discover_folders(dir.path()).unwrap();

        let names: Vec<_> = discovery.folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["02_Two", "10_Ten"]);
        assert_eq!(discovery.folders[0].prefix, "02");
        assert_eq!(discovery.skipped, vec!["001_Bad", "01x", "1_Bad"]);
    }

    #[test]
    fn discover_fails_for_missing_root() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            discover_folders(&dir.path().join("missing")),
            Err(RunError::InputNotFound(_))
        ));
    }

    #[tokio::test]
    async fn static_album_is_organized_in_natural_order() {
        let fixture = Fixture::new(false);
        fixture.folder(
            "01_Test",
            "type: static\n",
            &[
                ("b.mp3", "b"),
                ("a.mp3", "a"),
                ("c10.mp3", "c10"),
                ("c2.mp3", "c2"),
            ],
        );

        let summary = fixture.run(&MockHttpClient::default()).await;

        assert!(!summary.has_failures());
        assert_eq!(summary.files_copied(), 4);
        for (name, content) in [
            ("01/001.mp3", "a"),
            ("01/002.mp3", "b"),
            ("01/003.mp3", "c2"),
            ("01/004.mp3", "c10"),
        ] {
            assert_eq!(std::fs::read_to_string(fixture.output(name)).unwrap(), content);
        }
    }

    #[tokio::test]
    async fn rerun_of_static_album_is_identical() {
        let fixture = Fixture::new(false);
        fixture.folder("04_Same", "type: static\n", &[("1.mp3", "one"), ("2.mp3", "two")]);
        let client = MockHttpClient::default();

        fixture.run(&client).await;
        let first = std::fs::read(fixture.output("04/002.mp3")).unwrap();
        fixture.run(&client).await;

        assert_eq!(std::fs::read(fixture.output("04/002.mp3")).unwrap(), first);
        assert_eq!(std::fs::read_dir(fixture.output("04")).unwrap().count(), 2);
    }

    #[tokio::test]
    async fn invalid_folder_name_is_skipped_without_failing_run() {
        let fixture = Fixture::new(false);
        fixture.folder("1_Bad", "type: static\n", &[("a.mp3", "a")]);
        fixture.folder("02_Good", "type: static\n", &[("a.mp3", "a")]);

        let summary = fixture.run(&MockHttpClient::default()).await;

        assert!(!summary.has_failures());
        assert_eq!(summary.skipped, vec!["1_Bad"]);
        assert!(!fixture.output("1").exists());
        assert!(!fixture.output("01").exists());
        assert!(fixture.output("02/001.mp3").exists());
    }

    #[tokio::test]
    async fn reports_skipped_and_completed_folders() {
        let fixture = Fixture::new(false);
        fixture.folder("bad", "type: static\n", &[]);
        fixture.folder("06_Ok", "type: static\n", &[("a.mp3", "a")]);
        let recorder = Arc::new(RecordingReporter::default());
        let reporter: SharedProgressReporter = recorder.clone();

        run(&fixture.config, &MockHttpClient::default(), &MockProbe, &reporter)
            .await
            .unwrap();

        let events = recorder.events.lock().unwrap();
        assert!(matches!(
            &events[0],
            ProgressEvent::FolderSkipped { folder, .. } if folder == "bad"
        ));
        assert!(matches!(
            events.last(),
            Some(ProgressEvent::FolderCompleted { folder, success: true, .. }) if folder == "06_Ok"
        ));
    }

    #[tokio::test]
    async fn invalid_description_fails_only_that_folder() {
        let fixture = Fixture::new(false);
        fixture.folder("01_Broken", "type: cassette\n", &[("a.mp3", "a")]);
        fixture.folder("02_Fine", "type: static\n", &[("a.mp3", "a")]);

        let summary = fixture.run(&MockHttpClient::default()).await;

        assert!(summary.has_failures());
        assert_eq!(summary.failures().count(), 1);
        assert_eq!(summary.processed(), 1);
        assert!(!fixture.output("01").exists());
        assert!(fixture.output("02/001.mp3").exists());
    }

    #[tokio::test]
    async fn duplicate_prefix_fails_later_folder() {
        let fixture = Fixture::new(false);
        fixture.folder("05_A", "type: static\n", &[("a.mp3", "from A")]);
        fixture.folder("05_B", "type: static\n", &[("a.mp3", "from B")]);

        let summary = fixture.run(&MockHttpClient::default()).await;

        assert!(summary.has_failures());
        assert_eq!(summary.folders[1].name, "05_B");
        assert!(summary.folders[1].is_failure());
        assert_eq!(
            std::fs::read_to_string(fixture.output("05/001.mp3")).unwrap(),
            "from A"
        );
    }

    #[tokio::test]
    async fn empty_folder_is_not_a_failure() {
        let fixture = Fixture::new(false);
        fixture.folder("07_Empty", "type: static\n", &[]);

        let summary = fixture.run(&MockHttpClient::default()).await;

        assert!(!summary.has_failures());
        assert_eq!(summary.folders[0].status, FolderStatus::Empty);
        assert!(!fixture.output("07").exists());
    }

    #[tokio::test]
    async fn podcast_update_rejects_short_episode_and_organizes_rest() {
        let fixture = Fixture::new(true);
        let folder = fixture.folder(
            "03_Pod",
            "type: rss\nfeed_url: https://example.com/feed.xml\nmin_duration: 120\n",
            &[],
        );
        let client = MockHttpClient::new(feed_with(&[
            ("Short", "https://example.com/short.mp3"),
            ("Long", "https://example.com/long.mp3"),
        ]))
        .with_payload("https://example.com/short.mp3", 200, b"90")
        .with_payload("https://example.com/long.mp3", 200, b"1800");

        let summary = fixture.run(&client).await;

        let outcome = &summary.folders[0];
        assert_eq!(outcome.status, FolderStatus::Organized);
        assert_eq!(outcome.downloaded, 1);
        assert_eq!(outcome.rejected, 1);
        assert_eq!(outcome.files_copied, 1);
        assert_eq!(
            std::fs::read_to_string(fixture.output("03/001.mp3")).unwrap(),
            "1800"
        );
        assert!(
            std::fs::read_to_string(folder.join(REJECTED_FILE))
                .unwrap()
                .contains("https://example.com/short.mp3")
        );

        let summary = fixture.run(&client).await;
        assert_eq!(summary.folders[0].downloaded, 0);
        assert_eq!(client.download_count(), 2);
    }

    #[tokio::test]
    async fn podcast_feed_failure_keeps_folder_successful() {
        let fixture = Fixture::new(true);
        fixture.folder(
            "08_Pod",
            "type: rss\nfeed_url: https://example.com/feed.xml\n",
            &[("old.mp3", "old")],
        );

        let summary = fixture.run(&MockHttpClient::new("garbage".to_string())).await;

        let outcome = &summary.folders[0];
        assert!(!summary.has_failures());
        assert!(outcome.sync_error.is_some());
        assert_eq!(outcome.files_copied, 1);
    }

    #[tokio::test]
    async fn podcast_ledger_failure_fails_folder_but_organizes_local_files() {
        let fixture = Fixture::new(true);
        let folder = fixture.folder(
            "09_Pod",
            "type: rss\nfeed_url: https://example.com/feed.xml\n",
            &[("old.mp3", "old")],
        );
        std::fs::create_dir(folder.join(ACCEPTED_FILE)).unwrap();
        let client = MockHttpClient::new(feed_with(&[("Ep", "https://example.com/ep.mp3")]))
            .with_payload("https://example.com/ep.mp3", 200, b"300");

        let summary = fixture.run(&client).await;

        let outcome = &summary.folders[0];
        assert!(summary.has_failures());
        assert!(outcome.message().contains("download ledger not updated"));
        assert_eq!(outcome.files_copied, 1);
        assert_eq!(client.download_count(), 0);
        assert!(fixture.output("09/001.mp3").exists());
    }

    #[tokio::test]
    async fn failed_episodes_are_listed_without_failing_folder() {
        let fixture = Fixture::new(true);
        fixture.folder(
            "10_Pod",
            "type: rss\nfeed_url: https://example.com/feed.xml\n",
            &[],
        );
        let client = MockHttpClient::new(feed_with(&[
            ("Broken", "https://example.com/broken.mp3"),
            ("Fine", "https://example.com/fine.mp3"),
        ]))
        .with_payload("https://example.com/broken.mp3", 500, b"")
        .with_payload("https://example.com/fine.mp3", 200, b"300");

        let summary = fixture.run(&client).await;

        let outcome = &summary.folders[0];
        assert!(!summary.has_failures());
        assert_eq!(outcome.failed_episodes.len(), 1);
        assert!(outcome.failed_episodes[0].starts_with("Broken: "));
        assert_eq!(summary.failed_episodes().count(), 1);
    }
}
