//! Persisted-state layout of the working directory.
//!
//! The ripping loop writes one `NNNN_<title>.html` file per item (4-digit
//! zero-padded index, sanitized title); the assembler later reads the same
//! directory back. Intended order is recovered from the numeric index prefix,
//! never from directory listing order.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Map a display title to a safe filename component.
///
/// Path-hostile characters, whitespace, and control characters collapse to
/// single underscores.
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::new();
    let mut prev_sep = false;
    for ch in title.chars() {
        let mapped = match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\'' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') => c,
            _ => '_',
        };
        if mapped == '_' {
            if !prev_sep {
                out.push('_');
                prev_sep = true;
            }
        } else {
            out.push(mapped);
            prev_sep = false;
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() { "untitled".to_string() } else { trimmed.to_string() }
}

/// Filename for one ripped item.
pub fn page_filename(index: usize, title: &str) -> String {
    format!("{index:04}_{}.html", sanitize_title(title))
}

/// Parse the numeric index prefix of a persisted filename.
pub fn parse_index(file_name: &str) -> Option<usize> {
    let digits: String = file_name.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Collect every persisted page in a directory, sorted by index.
pub fn scan_pages(directory: &Path) -> Result<Vec<(usize, PathBuf)>> {
    let mut pages = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("html") {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(index) = parse_index(name) {
            pages.push((index, path));
        }
    }
    pages.sort_by_key(|(index, _)| *index);
    Ok(pages)
}
