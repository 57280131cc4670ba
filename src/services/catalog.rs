//! Channel catalog serialization and output validation
//!
//! Takes the raw accepted `name,url` lines, deduplicates and buckets them by
//! category, sorts each bucket, writes the artifact and re-reads it to check
//! its structure. A broken write here is fatal to the run.

use anyhow::{Context, Result};
use chrono::Local;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tokio::fs;
use tracing::info;

use crate::models::Category;

lazy_static! {
    /// CCTV channel numbering (CCTV-5, CCTV5+, CCTV 13, CCTV-4K, ...)
    static ref CCTV_PATTERN: Regex = Regex::new(r"(?i)CCTV[-\s]?(\d{1,2}\+?|4K|8K|HD)").unwrap();
    /// First embedded integer, used to order the CCTV bucket
    static ref FIRST_NUMBER: Regex = Regex::new(r"\d+").unwrap();
}

/// Section marker expected exactly once per category
const GENRE_MARKER: &str = "#genre#";

/// CCTV entries with no digits sort after every numbered channel
const NO_NUMBER_SORT_KEY: u32 = 999;

#[derive(Debug, Error)]
pub enum ValidateError {
    #[error("output file missing: {0}")]
    Missing(String),
    #[error("output file too short: {got} bytes (minimum {min})")]
    TooShort { got: usize, min: usize },
    #[error("expected 3 section markers, found {0}")]
    BadSections(usize),
    #[error("failed to read output file: {0}")]
    Io(#[from] std::io::Error),
}

/// Derive the category of a `name,url` line from its channel name.
pub fn categorize(line: &str) -> Category {
    let name = line.split(',').next().unwrap_or(line);
    if CCTV_PATTERN.is_match(name) {
        Category::Cctv
    } else if name.contains("卫视") {
        Category::Satellite
    } else {
        Category::Other
    }
}

fn cctv_sort_key(line: &str) -> u32 {
    FIRST_NUMBER
        .find(line)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(NO_NUMBER_SORT_KEY)
}

/// Render the full artifact text: two header lines, a blank line, then one
/// sorted section per category in fixed order.
pub fn render(lines: &[String], build_id: &str, timestamp: &str) -> String {
    let mut cctv = Vec::new();
    let mut satellite = Vec::new();
    let mut other = Vec::new();

    // Exact-line dedup across all API endpoints
    let unique: HashSet<&String> = lines.iter().collect();
    for line in unique {
        match categorize(line) {
            Category::Cctv => cctv.push(line.clone()),
            Category::Satellite => satellite.push(line.clone()),
            Category::Other => other.push(line.clone()),
        }
    }

    // Numeric order for CCTV, lexicographic for the rest; ties break on the
    // full line so output is deterministic
    cctv.sort_by(|a, b| cctv_sort_key(a).cmp(&cctv_sort_key(b)).then(a.cmp(b)));
    satellite.sort();
    other.sort();

    let sections = [
        (Category::Cctv, cctv),
        (Category::Satellite, satellite),
        (Category::Other, other),
    ];
    let blocks: Vec<String> = sections
        .iter()
        .map(|(category, bucket)| {
            format!("{},{}\n{}", category.label(), GENRE_MARKER, bucket.join("\n"))
        })
        .collect();

    format!(
        "# 最后更新: {}\n# 构建ID: {}\n\n{}",
        timestamp,
        build_id,
        blocks.join("\n\n")
    )
}

/// Serialize the accepted channel lines to `path`.
///
/// The artifact is written to a temp file and renamed into place so a failed
/// write never leaves a truncated file behind.
pub async fn save_channels(lines: &[String], path: &str, build_id: &str) -> Result<()> {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let content = render(lines, build_id, &timestamp);

    let target = Path::new(path);
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create output directory")?;
        }
    }

    let tmp = target.with_extension("tmp");
    fs::write(&tmp, content.as_bytes())
        .await
        .context("Failed to write output file")?;
    let _ = fs::remove_file(&target).await;
    fs::rename(&tmp, &target)
        .await
        .context("Failed to finalize output file")?;

    info!("Wrote {} bytes to {}", content.len(), path);
    Ok(())
}

/// Re-read the just-written artifact and check its structural invariants:
/// it exists, it is at least `min_bytes` long and it contains exactly three
/// section markers.
pub async fn validate_output(path: &str, min_bytes: usize) -> Result<(), ValidateError> {
    let target = Path::new(path);
    if !target.exists() {
        return Err(ValidateError::Missing(path.to_string()));
    }

    let content = fs::read_to_string(target).await?;
    if content.len() < min_bytes {
        return Err(ValidateError::TooShort {
            got: content.len(),
            min: min_bytes,
        });
    }

    let markers = content.matches(GENRE_MARKER).count();
    if markers != 3 {
        return Err(ValidateError::BadSections(markers));
    }

    info!("Output validation passed: {}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_categorize() {
        assert_eq!(categorize("CCTV-5,http://x/5"), Category::Cctv);
        assert_eq!(categorize("CCTV5,http://x/5"), Category::Cctv);
        assert_eq!(categorize("CCTV-4K,http://x/4k"), Category::Cctv);
        assert_eq!(categorize("cctv 8,http://x/8"), Category::Cctv);
        assert_eq!(categorize("CCTV-5+,http://x/5p"), Category::Cctv);
        assert_eq!(categorize("湖南卫视,http://x/hn"), Category::Satellite);
        assert_eq!(categorize("凤凰中文,http://x/fh"), Category::Other);
    }

    #[test]
    fn test_cctv_numeric_sort_order() {
        let input = lines(&[
            "CCTV-13,http://x/a",
            "CCTV-1,http://x/b",
            "CCTV-5,http://x/c",
            "CCTV-HD,http://x/d",
        ]);
        let out = render(&input, "deadbeef", "2026-08-30 12:00:00");
        let cctv_section: Vec<&str> = out
            .lines()
            .skip_while(|l| *l != "央视频道,#genre#")
            .skip(1)
            .take_while(|l| !l.is_empty())
            .collect();
        assert_eq!(
            cctv_section,
            vec![
                "CCTV-1,http://x/b",
                "CCTV-5,http://x/c",
                "CCTV-13,http://x/a",
                "CCTV-HD,http://x/d",
            ]
        );
    }

    #[test]
    fn test_render_dedups_exact_lines() {
        let input = lines(&["CCTV-1,http://x/1", "CCTV-1,http://x/1", "CCTV-1,http://y/1"]);
        let out = render(&input, "deadbeef", "2026-08-30 12:00:00");
        assert_eq!(out.matches("CCTV-1,http://x/1").count(), 1);
        assert_eq!(out.matches("CCTV-1,http://y/1").count(), 1);
    }

    #[test]
    fn test_render_structure() {
        let input = lines(&["湖南卫视,http://x/hn", "某地方台,http://x/df"]);
        let out = render(&input, "cafe1234", "2026-08-30 12:00:00");

        assert!(out.starts_with("# 最后更新: 2026-08-30 12:00:00\n# 构建ID: cafe1234\n\n"));
        assert_eq!(out.matches(GENRE_MARKER).count(), 3);

        // Fixed section order, even when a bucket is empty
        let cctv_at = out.find("央视频道,#genre#").unwrap();
        let satellite_at = out.find("卫视频道,#genre#").unwrap();
        let other_at = out.find("其他频道,#genre#").unwrap();
        assert!(cctv_at < satellite_at && satellite_at < other_at);
        assert!(out.contains("湖南卫视,http://x/hn"));
        assert!(out.contains("某地方台,http://x/df"));
    }

    #[tokio::test]
    async fn test_save_and_validate_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zby.txt");
        let path = path.to_str().unwrap();

        let input = lines(&["CCTV-1,http://x/1", "湖南卫视,http://x/hn"]);
        save_channels(&input, path, "deadbeef").await.unwrap();
        validate_output(path, 50).await.unwrap();

        // No temp file left behind
        assert!(!dir.path().join("zby.tmp").exists());
    }

    #[tokio::test]
    async fn test_validate_missing_file() {
        let err = validate_output("/nonexistent/zby.txt", 500).await.unwrap_err();
        assert!(matches!(err, ValidateError::Missing(_)));
    }

    #[tokio::test]
    async fn test_validate_short_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zby.txt");
        tokio::fs::write(&path, "tiny").await.unwrap();

        let err = validate_output(path.to_str().unwrap(), 500).await.unwrap_err();
        assert!(matches!(err, ValidateError::TooShort { got: 4, .. }));
    }

    #[tokio::test]
    async fn test_validate_wrong_marker_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("zby.txt");
        let content = format!(
            "header\n央视频道,#genre#\n卫视频道,#genre#\n{}",
            "x".repeat(600)
        );
        tokio::fs::write(&path, content).await.unwrap();

        let err = validate_output(path.to_str().unwrap(), 500).await.unwrap_err();
        assert!(matches!(err, ValidateError::BadSections(2)));
    }
}
