mod download;
mod filename;

pub use download::{DownloadContext, PARTIAL_SUFFIX, download_episode, partial_path};
pub use filename::{episode_filename, unique_destination};
