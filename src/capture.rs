use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Non-text metadata about the element a block came from, supplied by the
/// rendering driver. The engine never touches the DOM itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StructuralHints {
    pub is_article_like: bool,
    pub has_rating_label: bool,
    pub rating_aria_label: Option<String>,
    pub rating_glyph_text: Option<String>,
}

/// One contiguous unit of rendered text plus its structural hints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawBlock {
    pub text: String,
    #[serde(default)]
    pub hints: StructuralHints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawImage {
    pub url: String,
    #[serde(default)]
    pub alt: String,
}

/// Everything the pagination driver harvested from one page, in discovery
/// order. Serialized to JSON so `process` can re-run the engine offline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageCapture {
    pub page_url: String,
    pub business_name: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    #[serde(default)]
    pub blocks: Vec<RawBlock>,
    #[serde(default)]
    pub images: Vec<RawImage>,
    pub scroll_passes: u32,
    pub captured_at: String,
}

impl PageCapture {
    pub fn new(page_url: &str) -> Self {
        Self {
            page_url: page_url.to_string(),
            business_name: None,
            metadata: BTreeMap::new(),
            blocks: Vec::new(),
            images: Vec::new(),
            scroll_passes: 0,
            captured_at: chrono::Local::now().to_rfc3339(),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write capture to {}", path.display()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read capture from {}", path.display()))?;
        serde_json::from_str(&json).context("Capture file is not valid JSON")
    }
}
