use std::fs;

use anyhow::Context;
use log::warn;
use url::Url;

/// Reads non-empty, non-comment lines from a target list file.
pub fn read_lines(path: &str) -> anyhow::Result<Vec<String>> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read '{}'", path))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect())
}

/// Keeps only entries that parse as absolute http(s) URLs; anything
/// else is logged and dropped.
pub fn filter_valid_targets(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .filter(|line| match Url::parse(line) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => true,
            _ => {
                warn!("skipping invalid target: {}", line);
                false
            }
        })
        .collect()
}
