//! Source-document ingestion: fetch-once caching and page extraction.
//!
//! The statute PDF is downloaded a single time and kept at the configured
//! cache path; presence of that file is the sole signal to skip the
//! download. Parsing produces one [`TextUnit`] per page in document order.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::CorpusError;
use crate::models::TextUnit;

/// Ensure the source document exists at `local_path`, downloading it from
/// `url` if absent. The download is written to a temporary sibling and
/// renamed, so a crash mid-download never leaves a half-written cache
/// behind to be mistaken for the real document.
pub async fn ensure_local(
    url: &str,
    local_path: &Path,
    timeout_secs: u64,
) -> Result<PathBuf, CorpusError> {
    if local_path.exists() {
        tracing::debug!(path = %local_path.display(), "source document already cached");
        return Ok(local_path.to_path_buf());
    }

    if let Some(parent) = local_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| CorpusError::Fetch(format!("create {}: {}", parent.display(), e)))?;
    }

    tracing::info!(url, path = %local_path.display(), "downloading source document");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| CorpusError::Fetch(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| CorpusError::Fetch(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CorpusError::Fetch(format!("{} returned HTTP {}", url, status)));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| CorpusError::Fetch(e.to_string()))?;

    let tmp_path = local_path.with_extension("download");
    std::fs::write(&tmp_path, &bytes)
        .map_err(|e| CorpusError::Fetch(format!("write {}: {}", tmp_path.display(), e)))?;
    std::fs::rename(&tmp_path, local_path)
        .map_err(|e| CorpusError::Fetch(format!("rename to {}: {}", local_path.display(), e)))?;

    tracing::info!(bytes = bytes.len(), "source document cached");
    Ok(local_path.to_path_buf())
}

/// Extract one [`TextUnit`] per page, in document order. Pages whose
/// extracted text is empty after trimming are dropped — scanned covers and
/// blank separators contribute nothing to retrieval.
pub fn parse_pages(path: &Path) -> Result<Vec<TextUnit>, CorpusError> {
    let pages = pdf_extract::extract_text_by_pages(path)
        .map_err(|e| CorpusError::Parse(e.to_string()))?;

    let units: Vec<TextUnit> = pages
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, text)| TextUnit {
            page: (i + 1) as i64,
            text,
        })
        .collect();

    if units.is_empty() {
        return Err(CorpusError::Parse(format!(
            "{} contains no extractable text",
            path.display()
        )));
    }

    tracing::info!(pages = units.len(), "parsed source document");
    Ok(units)
}
