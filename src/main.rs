// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use console::Emoji;
use indicatif::{HumanBytes, MultiProgress, ProgressBar, ProgressStyle};
use tracing::Level;

use tonuino_organizer::config::{DEFAULT_INPUT_PATH, DEFAULT_OUTPUT_PATH};
use tonuino_organizer::{
    Config, LoftyProbe, NoopReporter, ProgressEvent, ProgressReporter, ReqwestClient,
    SharedProgressReporter, run,
};

// Emoji with fallback for terminals without Unicode support
static MUSIC: Emoji<'_, '_> = Emoji("🎵 ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "[>] ");
static DOWNLOAD: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "[?] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

/// Organize albums and podcasts into numbered TonUINO folders
#[derive(Parser, Debug)]
#[command(name = "tonuino-organizer")]
#[command(about = "Organize MP3 albums and RSS podcasts into numbered TonUINO folders")]
#[command(version)]
struct Args {
    #[arg(short, long, help = format!("Input directory path (default: {DEFAULT_INPUT_PATH})"))]
    input: Option<String>,

    #[arg(short, long, help = format!("Output directory path (default: {DEFAULT_OUTPUT_PATH})"))]
    output: Option<String>,

    /// Update RSS feeds and download new episodes
    #[arg(short, long)]
    update: bool,

    /// Quiet mode - suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Print debug logs to stderr
    #[arg(short, long)]
    verbose: bool,
}

/// Progress reporter using indicatif for terminal output
struct IndicatifReporter {
    multi: MultiProgress,
    main_bar: ProgressBar,
    transfer: Mutex<Option<ProgressBar>>,
}

impl IndicatifReporter {
    fn new() -> Self {
        let multi = MultiProgress::new();

        let main_style = ProgressStyle::default_bar()
            .template("{spinner:.green} {wide_msg}")
            .unwrap();

        let main_bar = multi.add(ProgressBar::new_spinner());
        main_bar.set_style(main_style);
        main_bar.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            multi,
            main_bar,
            transfer: Mutex::new(None),
        }
    }

    fn line(&self, message: String) {
        let _ = self.multi.println(message);
    }

    fn transfer_bar(&self) -> ProgressBar {
        let mut transfer = self.transfer.lock().unwrap();

        if let Some(bar) = transfer.as_ref() {
            return bar.clone();
        }

        let style = ProgressStyle::default_bar()
            .template(&format!(
                "  {DOWNLOAD}[{{bar:30.cyan/blue}}] {{bytes}}/{{total_bytes}} {{wide_msg}}"
            ))
            .unwrap()
            .progress_chars("█▓░");

        let bar = self.multi.add(ProgressBar::new(0));
        bar.set_style(style);
        *transfer = Some(bar.clone());
        bar
    }

    fn finish_transfer(&self) {
        if let Some(bar) = self.transfer.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }
}

impl Drop for IndicatifReporter {
    fn drop(&mut self) {
        self.finish_transfer();
        self.main_bar.finish_and_clear();
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::FolderStarted { folder, kind } => {
                self.main_bar.set_message(format!(
                    "{FOLDER}{} ({})",
                    folder.bold(),
                    kind.dimmed()
                ));
            }

            ProgressEvent::FolderSkipped { folder, reason } => {
                self.line(format!(
                    "{WARNING}Skipping {}: {}",
                    folder.yellow(),
                    reason.dimmed()
                ));
            }

            ProgressEvent::FetchingFeed { source } => {
                self.main_bar
                    .set_message(format!("{SEARCH}Fetching feed: {}", source.cyan()));
            }

            ProgressEvent::FeedParsed {
                total_episodes,
                new_episodes,
            } => {
                self.main_bar.set_message(format!(
                    "{SEARCH}{} episodes in feed, {} new",
                    total_episodes.to_string().cyan(),
                    new_episodes.to_string().yellow()
                ));
            }

            ProgressEvent::PartialFilesCleanedUp { count } => {
                self.line(format!(
                    "  Removed {} unfinished download(s)",
                    count.to_string().yellow()
                ));
            }

            ProgressEvent::DownloadStarting {
                episode_title,
                episode_index,
                total_to_download,
                content_length,
            } => {
                let bar = self.transfer_bar();
                bar.set_length(content_length.unwrap_or(0));
                bar.set_position(0);
                bar.set_message(format!(
                    "[{}/{}] {}",
                    (episode_index + 1).to_string().cyan(),
                    total_to_download.to_string().cyan(),
                    truncate_title(&episode_title, 40)
                ));
            }

            ProgressEvent::DownloadProgress {
                bytes_downloaded,
                total_bytes,
            } => {
                let bar = self.transfer_bar();
                if let Some(total) = total_bytes {
                    bar.set_length(total);
                }
                bar.set_position(bytes_downloaded);
            }

            ProgressEvent::DownloadCompleted { .. } => {
                self.finish_transfer();
            }

            ProgressEvent::DownloadFailed {
                episode_title,
                error,
            } => {
                self.finish_transfer();
                self.line(format!(
                    "  {FAILURE}{} - {}",
                    truncate_title(&episode_title, 30).red(),
                    error.red()
                ));
            }

            ProgressEvent::EpisodeAccepted {
                episode_title,
                filename,
                duration_secs,
            } => {
                self.line(format!(
                    "  {SUCCESS}{} → {} ({:.1}s)",
                    truncate_title(&episode_title, 40).green(),
                    filename,
                    duration_secs
                ));
            }

            ProgressEvent::EpisodeRejected {
                episode_title,
                duration_secs,
                min_duration,
            } => {
                self.line(format!(
                    "  {WARNING}{} too short ({:.1}s < {:.1}s), discarded",
                    truncate_title(&episode_title, 40).yellow(),
                    duration_secs,
                    min_duration
                ));
            }

            ProgressEvent::SyncCompleted {
                downloaded_count,
                rejected_count,
                skipped_count,
                failed_count,
            } => {
                self.line(format!(
                    "  Feed synced: {} downloaded, {} rejected, {} known, {} failed",
                    downloaded_count.to_string().green().bold(),
                    rejected_count.to_string().yellow(),
                    skipped_count.to_string().dimmed(),
                    if failed_count > 0 {
                        failed_count.to_string().red().bold()
                    } else {
                        failed_count.to_string().green()
                    }
                ));
            }

            ProgressEvent::FilesTruncated { kept, dropped } => {
                self.line(format!(
                    "  {WARNING}Only the first {} files fit, {} left out",
                    kept,
                    dropped.to_string().yellow()
                ));
            }

            ProgressEvent::OrganizeStarted {
                output_folder,
                total,
            } => {
                self.main_bar.set_message(format!(
                    "{FOLDER}Copying {} file(s) to {}",
                    total.to_string().cyan(),
                    output_folder.cyan()
                ));
            }

            ProgressEvent::FileCopied {
                index,
                total,
                source_name,
                output_name,
                bytes,
            } => {
                self.main_bar.set_message(format!(
                    "{FOLDER}[{}/{}] {} → {} ({})",
                    index.to_string().cyan(),
                    total.to_string().cyan(),
                    truncate_title(&source_name, 40),
                    output_name,
                    HumanBytes(bytes)
                ));
            }

            ProgressEvent::CopyFailed { source_name, error } => {
                self.line(format!("  {CROSS}{} - {}", source_name.red(), error.dimmed()));
            }

            ProgressEvent::FolderCompleted {
                folder,
                success,
                message,
            } => {
                if success {
                    self.line(format!("{SUCCESS}{}: {}", folder.bold(), message.green()));
                } else {
                    self.line(format!("{FAILURE}{}: {}", folder.bold(), message.red()));
                }
            }
        }
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let cut: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::WARN
        })
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = Config::from_args(args.input.as_deref(), args.output.as_deref(), args.update)
        .context("Failed to resolve input/output paths")?;
    config
        .ensure_directories()
        .context("Failed to prepare input/output directories")?;

    if !args.quiet {
        println!(
            "\n{}{} {}\n",
            MUSIC,
            "tonuino-organizer".bold().magenta(),
            "- TonUINO folder organizer".dimmed()
        );
        println!("Input:  {}", config.input_root.display().to_string().cyan());
        println!("Output: {}", config.output_root.display().to_string().cyan());
        if config.update {
            println!(
                "{}",
                "Update mode: RSS feeds will be checked for new episodes".yellow()
            );
        }
        println!();
    }

    let reporter: SharedProgressReporter = if args.quiet {
        NoopReporter::shared()
    } else {
        Arc::new(IndicatifReporter::new())
    };

    let client = ReqwestClient::new().context("Failed to create HTTP client")?;
    let summary = run(&config, &client, &LoftyProbe, &reporter)
        .await
        .context("Failed to organize folders")?;
    drop(reporter);

    if !args.quiet {
        if summary.folders.is_empty() {
            println!(
                "{}",
                "No valid album/podcast folders found (names must start with two digits and an underscore, e.g. 01_Album)"
                    .yellow()
            );
        }

        println!(
            "\n{PARTY}{} {} folder(s) organized, {} file(s) copied, {} episode(s) downloaded, {} rejected",
            "Done:".bold().green(),
            summary.processed().to_string().green().bold(),
            summary.files_copied().to_string().cyan(),
            summary.downloaded().to_string().cyan(),
            summary.rejected().to_string().yellow()
        );

        if !summary.skipped.is_empty() {
            println!(
                "{WARNING}Skipped folders: {}",
                summary.skipped.join(", ").yellow()
            );
        }

        if summary.has_failures() {
            println!("\n{}", "Failed folders:".red().bold());
            for outcome in summary.failures() {
                println!(
                    "  {}{} - {}",
                    CROSS,
                    outcome.name.yellow(),
                    outcome.message().dimmed()
                );
                for failure in &outcome.copy_failures {
                    println!("      {}", failure.dimmed());
                }
            }
        }

        let failed_episodes: Vec<_> = summary.failed_episodes().collect();
        if !failed_episodes.is_empty() {
            println!(
                "\n{WARNING}{}",
                "Episodes not downloaded (retried on the next update):".yellow()
            );
            for (folder, episode) in failed_episodes {
                println!("  {}{} - {}", CROSS, folder.yellow(), episode.dimmed());
            }
        }
        println!();
    }

    if summary.has_failures() {
        std::process::exit(1);
    }

    Ok(())
}
