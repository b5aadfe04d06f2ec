pub mod aggregate;
pub mod classify;
pub mod dedup;
pub mod extract;
pub mod normalize;

use tracing::debug;

use crate::capture::PageCapture;
use aggregate::{Aggregator, ResultDocument};
use classify::{classify, Classification};
use extract::ReviewExtractor;
use normalize::normalize;

/// Single-pass pipeline over one capture: normalize → classify → extract →
/// dedup → aggregate. Zero blocks is a valid, empty outcome; data-quality
/// problems are absorbed by defaults or silent discard, never raised.
pub fn process_capture(capture: &PageCapture, business_name: &str) -> ResultDocument {
    let extractor = ReviewExtractor::new(business_name);
    let mut agg = Aggregator::new(business_name, &capture.page_url);
    agg.extend_metadata(&capture.metadata);

    for block in &capture.blocks {
        let norm = normalize(&block.text, business_name);
        match classify(&block.text, &norm, &block.hints, business_name) {
            Classification::Review => {
                if let Some(review) = extractor.extract(&block.text, &block.hints) {
                    agg.push_review(review);
                } else {
                    debug!("Dropped review candidate with unusable body");
                }
            }
            Classification::Post => {
                agg.push_post(&block.text);
            }
            Classification::Noise => {}
        }
    }

    for image in &capture.images {
        agg.push_image(&image.url, &image.alt);
    }

    agg.finish()
}

// ── Tests ──
