//! Reads package requests from a pip-style requirements file.

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use log::warn;

use crate::request::PackageRequest;

/// Parses a requirements file into requests, in file order.
///
/// Blank lines and comments are skipped. Option lines such as
/// `--index-url` or `-e` are outside our scope and skipped with a
/// warning. Any remaining line must be a valid requirement.
pub fn parse_requirements(path: &Path) -> Result<Vec<PackageRequest>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read requirements file {}", path.display()))?;

    let mut requests = Vec::new();
    for (index, raw_line) in contents.lines().enumerate() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with('-') {
            warn!(
                "{}:{}: skipping option line {:?}",
                path.display(),
                index + 1,
                line
            );
            continue;
        }
        let request = PackageRequest::from_str(line)
            .with_context(|| format!("{}:{}", path.display(), index + 1))?;
        requests.push(request);
    }
    Ok(requests)
}

/// Cuts an inline comment. A `#` only starts a comment at the start of
/// the line or after whitespace, so names like `pkg#egg` stay intact.
fn strip_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'#' && (i == 0 || bytes[i - 1].is_ascii_whitespace()) {
            return &line[..i];
        }
    }
    line
}
