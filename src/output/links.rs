//! Property link file: one absolute URL per line

use crate::output::traits::OutputResult;
use std::path::Path;

/// Writes `links` to `path`, one per line
pub async fn write_links(path: &Path, links: &[String]) -> OutputResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut contents = links.join("\n");
    if !contents.is_empty() {
        contents.push('\n');
    }
    tokio::fs::write(path, contents).await?;

    tracing::info!("Wrote {} property links to {}", links.len(), path.display());
    Ok(())
}

/// Reads links from `path`, trimming lines and skipping blank ones
pub async fn read_links(path: &Path) -> OutputResult<Vec<String>> {
    let contents = tokio::fs::read_to_string(path).await?;
    Ok(parse_links(&contents))
}

fn parse_links(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
