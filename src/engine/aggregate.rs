use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::dedup::{review_fingerprint, FingerprintSet};
use super::extract::ExtractedReview;

pub const MAX_REVIEWS: usize = 30;
pub const MAX_POSTS: usize = 30;
const PREVIEW_CHARS: usize = 500;

/// URL path fragments of fixed-size thumbnails (profile pics, icons).
const THUMBNAIL_MARKERS: &[&str] = &["p50x50", "p32x32", "s50x50"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub index: usize,
    pub text: String,
    pub full_text: String,
    pub author: String,
    pub rating: u8,
    pub extracted_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub index: usize,
    pub text: String,
    pub full_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRecord {
    pub index: usize,
    pub url: String,
    pub alt: String,
    pub source: String,
}

/// The root aggregate, written out once at the end of a run. Field names are
/// fixed for downstream compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultDocument {
    pub business_name: String,
    pub scraped_at: String,
    pub page_url: String,
    pub reviews: Vec<ReviewRecord>,
    pub images: Vec<ImageRecord>,
    pub posts: Vec<PostRecord>,
    pub metadata: BTreeMap<String, String>,
}

/// Owns the result collections for one run: assigns sequential indices,
/// enforces per-category caps, and runs dedup before append. The cap is a
/// final acceptance gate; fingerprints keep accumulating regardless so that
/// later duplicates of an early review never sneak in as "new".
pub struct Aggregator {
    doc: ResultDocument,
    review_fps: FingerprintSet,
    image_fps: FingerprintSet,
}

impl Aggregator {
    pub fn new(business_name: &str, page_url: &str) -> Self {
        Self {
            doc: ResultDocument {
                business_name: business_name.to_string(),
                scraped_at: chrono::Local::now().to_rfc3339(),
                page_url: page_url.to_string(),
                reviews: Vec::new(),
                images: Vec::new(),
                posts: Vec::new(),
                metadata: BTreeMap::new(),
            },
            review_fps: FingerprintSet::new(),
            image_fps: FingerprintSet::new(),
        }
    }

    pub fn extend_metadata(&mut self, fields: &BTreeMap<String, String>) {
        for (k, v) in fields {
            self.doc.metadata.insert(k.clone(), v.clone());
        }
    }

    /// Returns true if the review was accepted into the collection.
    pub fn push_review(&mut self, review: ExtractedReview) -> bool {
        if !self.review_fps.admit(&review_fingerprint(&review.body)) {
            return false;
        }
        if self.doc.reviews.len() >= MAX_REVIEWS {
            return false;
        }
        let record = ReviewRecord {
            index: self.doc.reviews.len() + 1,
            text: preview(&review.body),
            full_text: review.body,
            author: review.author,
            rating: review.rating,
            extracted_at: chrono::Local::now().to_rfc3339(),
        };
        self.doc.reviews.push(record);
        true
    }

    pub fn push_post(&mut self, full_text: &str) -> bool {
        if self.doc.posts.len() >= MAX_POSTS {
            return false;
        }
        let record = PostRecord {
            index: self.doc.posts.len() + 1,
            text: preview(full_text),
            full_text: full_text.to_string(),
        };
        self.doc.posts.push(record);
        true
    }

    /// Small fixed-size images are rejected at intake, before dedup.
    pub fn push_image(&mut self, url: &str, alt: &str) -> bool {
        if THUMBNAIL_MARKERS.iter().any(|m| url.contains(m)) {
            return false;
        }
        if !self.image_fps.admit(url) {
            return false;
        }
        let record = ImageRecord {
            index: self.doc.images.len() + 1,
            url: url.to_string(),
            alt: alt.to_string(),
            source: "facebook".to_string(),
        };
        self.doc.images.push(record);
        true
    }

    pub fn review_count(&self) -> usize {
        self.doc.reviews.len()
    }

    pub fn post_count(&self) -> usize {
        self.doc.posts.len()
    }

    pub fn image_count(&self) -> usize {
        self.doc.images.len()
    }

    pub fn finish(self) -> ResultDocument {
        self.doc
    }
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

// ── Tests ──
