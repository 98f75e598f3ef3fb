//! Plain-text document loading.
//!
//! Encoding detection is out of scope: bytes are decoded as UTF-8 with
//! replacement characters and a leading BOM is dropped.

use crate::document::Document;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

pub const UNTITLED_DOCUMENT_KEY: &str = "untitled.txt";

/// Key used to namespace persisted progress: the bare file name.
pub fn document_key_for_path(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(UNTITLED_DOCUMENT_KEY)
        .to_string()
}

pub fn decode_text(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.strip_prefix('\u{feff}').unwrap_or(&*text).to_string()
}

pub fn load_text_file(path: &Path) -> Result<String> {
    info!(path = %path.display(), "Loading plain text content");
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let text = decode_text(&bytes);
    info!(
        bytes = bytes.len(),
        chars = text.chars().count(),
        "Finished loading plain text content"
    );
    Ok(text)
}

pub fn load_document(path: &Path) -> Result<Document> {
    let text = load_text_file(path)?;
    Ok(Document::from_text(document_key_for_path(path), &text))
}
