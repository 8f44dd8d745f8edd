//! Machine-readable site manifest.
//!
//! Mirrors the built page set (url, title, date, tags) as JSON so external
//! tools - search indexes, link checkers - can read the site without
//! scraping HTML.

use crate::config::SiteConfig;
use crate::log;
use anyhow::{Context as _, Result};
use serde::Serialize;
use std::fs;

/// One built page in the manifest.
#[derive(Debug, Serialize)]
pub struct PageRecord {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// Write the manifest when enabled.
pub fn write(records: &[PageRecord], config: &SiteConfig) -> Result<()> {
    if !config.build.manifest.enable {
        return Ok(());
    }

    let path = config.build.output.join(&config.build.manifest.path);
    let json = serde_json::to_string_pretty(records)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, json)
        .with_context(|| format!("Failed to write manifest to {}", path.display()))?;

    log!("manifest"; "{} pages", records.len());
    Ok(())
}
