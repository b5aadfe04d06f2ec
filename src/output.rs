use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::engine::aggregate::ResultDocument;

const LATEST_FILE: &str = "scraped_data_latest.json";

/// Write the result document twice: a timestamped snapshot and a stable
/// "latest" path for downstream consumers.
pub fn write_results(doc: &ResultDocument, out_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output dir {}", out_dir.display()))?;

    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let snapshot = out_dir.join(format!("scraped_data_{}.json", stamp));
    let json = serde_json::to_string_pretty(doc)?;

    std::fs::write(&snapshot, &json)
        .with_context(|| format!("Failed to write {}", snapshot.display()))?;
    std::fs::write(out_dir.join(LATEST_FILE), &json)
        .with_context(|| format!("Failed to write {}", out_dir.join(LATEST_FILE).display()))?;

    info!("Results saved to {}", snapshot.display());
    Ok(snapshot)
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::process_capture;
    use crate::capture::PageCapture;

    #[test]
    fn writes_snapshot_and_latest() {
        let dir = std::env::temp_dir().join(format!("fbpage_scraper_test_{}", std::process::id()));
        let doc = process_capture(&PageCapture::new("https://example.com/page"), "Elite Painting");

        let snapshot = write_results(&doc, &dir).unwrap();
        assert!(snapshot.exists());
        assert!(dir.join(LATEST_FILE).exists());

        let round: ResultDocument =
            serde_json::from_str(&std::fs::read_to_string(dir.join(LATEST_FILE)).unwrap()).unwrap();
        assert_eq!(round.business_name, "Elite Painting");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
