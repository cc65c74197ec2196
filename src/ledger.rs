// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::LedgerError;

/// Tracking file listing accepted episode URLs
pub const ACCEPTED_FILE: &str = ".downloaded_files";
/// Tracking file listing rejected (too short) episode URLs
pub const REJECTED_FILE: &str = ".rejected_files";

/// Accepted and rejected episode identifiers of one podcast folder
///
/// An identifier is in at most one of the two sets. Rejected identifiers are
/// never downloaded again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadLedger {
    accepted: BTreeSet<String>,
    rejected: BTreeSet<String>,
}

impl DownloadLedger {
    /// Load the ledger from a folder. Missing tracking files yield empty sets.
    pub fn load(folder: &Path) -> Result<Self, LedgerError> {
        let mut accepted = read_identifiers(&folder.join(ACCEPTED_FILE))?;
        let rejected = read_identifiers(&folder.join(REJECTED_FILE))?;

        // Rejection is permanent, so it wins over a conflicting acceptance
        let before = accepted.len();
        accepted.retain(|url| !rejected.contains(url));
        if accepted.len() != before {
            warn!(
                folder = %folder.display(),
                conflicts = before - accepted.len(),
                "identifiers listed as both accepted and rejected, treating them as rejected"
            );
        }

        Ok(Self { accepted, rejected })
    }

    /// Overwrite both tracking files with the current sets, one identifier per line
    ///
    /// The rejected file is written first. If writing the accepted file then
    /// fails, the accepted file still holds its previous contents.
    pub fn save(&self, folder: &Path) -> Result<(), LedgerError> {
        write_identifiers(&folder.join(REJECTED_FILE), &self.rejected)?;
        write_identifiers(&folder.join(ACCEPTED_FILE), &self.accepted)?;
        debug!(
            folder = %folder.display(),
            accepted = self.accepted.len(),
            rejected = self.rejected.len(),
            "saved download ledger"
        );
        Ok(())
    }

    /// Whether the identifier was accepted or rejected before
    pub fn is_known(&self, url: &str) -> bool {
        self.accepted.contains(url) || self.rejected.contains(url)
    }

    pub fn record_accepted(&mut self, url: &str) {
        self.rejected.remove(url);
        self.accepted.insert(url.to_string());
    }

    pub fn record_rejected(&mut self, url: &str) {
        self.accepted.remove(url);
        self.rejected.insert(url.to_string());
    }

    pub fn accepted(&self) -> &BTreeSet<String> {
        &self.accepted
    }

    pub fn rejected(&self) -> &BTreeSet<String> {
        &self.rejected
    }
}

fn read_identifiers(path: &Path) -> Result<BTreeSet<String>, LedgerError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeSet::new()),
        Err(e) => {
            return Err(LedgerError::ReadFailed {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let mut identifiers = BTreeSet::new();
    for (number, line) in bytes.split(|&b| b == b'\n').enumerate() {
        match std::str::from_utf8(line) {
            Ok(line) => {
                let line = line.trim();
                if !line.is_empty() {
                    identifiers.insert(line.to_string());
                }
            }
            Err(_) => warn!(
                path = %path.display(),
                line = number + 1,
                "skipping malformed ledger line"
            ),
        }
    }

    Ok(identifiers)
}

fn write_identifiers(path: &Path, identifiers: &BTreeSet<String>) -> Result<(), LedgerError> {
    let mut contents = String::new();
    for identifier in identifiers {
        contents.push_str(identifier);
        contents.push('\n');
    }

    std::fs::write(path, contents).map_err(|e| LedgerError::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}
