// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Folder-name validation, natural ordering and output file naming.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::error::NamingError;

/// Largest number of files a single output folder can hold
pub const MAX_OUTPUT_FILES: usize = 255;

/// Check whether a folder name starts with exactly two ASCII digits and an underscore
pub fn is_valid_prefixed_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_digit()
        && bytes[1].is_ascii_digit()
        && bytes[2] == b'_'
}

/// Extract the two-digit prefix of a valid folder name
pub fn extract_prefix(name: &str) -> Result<&str, NamingError> {
    if !is_valid_prefixed_name(name) {
        return Err(NamingError::InvalidPrefix(name.to_string()));
    }

    // The first two bytes are ASCII, so this is a char boundary
    Ok(&name[..2])
}

/// Output filename for a 1-based position: `001.mp3` ... `255.mp3`
pub fn output_name(index: usize) -> Result<String, NamingError> {
    if !(1..=MAX_OUTPUT_FILES).contains(&index) {
        return Err(NamingError::IndexOutOfRange(index));
    }
    Ok(format!("{index:03}.mp3"))
}

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Text(String),
    Number(&'a str),
}

/// Split a name into alternating text and digit runs, always starting with text
fn chunks(name: &str) -> Vec<Chunk<'_>> {
    let mut result = Vec::new();
    let mut text = String::new();
    let mut rest = name;

    while let Some(c) = rest.chars().next() {
        if c.is_ascii_digit() {
            let end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            result.push(Chunk::Text(std::mem::take(&mut text)));
            result.push(Chunk::Number(&rest[..end]));
            rest = &rest[end..];
        } else {
            text.extend(c.to_lowercase());
            rest = &rest[c.len_utf8()..];
        }
    }

    result.push(Chunk::Text(text));
    result
}

/// Compare two digit runs by numeric value without parsing into a fixed-width integer
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Natural ("alphanumeric") comparison: digit runs compare numerically, text case-insensitively
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a = chunks(a);
    let b = chunks(b);

    for (left, right) in a.iter().zip(b.iter()) {
        let ordering = match (left, right) {
            (Chunk::Text(l), Chunk::Text(r)) => l.cmp(r),
            (Chunk::Number(l), Chunk::Number(r)) => compare_digits(l, r),
            // Chunks alternate from a leading text chunk, so kinds always line up
            (Chunk::Text(_), Chunk::Number(_)) => Ordering::Less,
            (Chunk::Number(_), Chunk::Text(_)) => Ordering::Greater,
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    a.len().cmp(&b.len())
}

/// Sort names naturally. Stable: equal keys keep their relative order.
pub fn natural_sort<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by(|a, b| natural_cmp(a.as_ref(), b.as_ref()));
}

/// Sort paths naturally by their file name
pub fn natural_sort_paths(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| natural_cmp(&file_name_lossy(a), &file_name_lossy(b)));
}

fn file_name_lossy(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
