use std::sync::LazyLock;

use regex::Regex;

use super::normalize::{NormalizedBlock, MONTH_PAT};
use crate::capture::StructuralHints;

static FOLLOWER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b[\d.,]+[KM]?\s*(followers|following)\b").unwrap());
static POST_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b(?:{}) \d{{1,2}} at \d{{1,2}}:\d{{2}}\s*[AP]M\b",
        MONTH_PAT
    ))
    .unwrap()
});

const MIN_CONTENT_CHARS: usize = 50;
const MAX_BARE_REPLY_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Review,
    Post,
    Noise,
}

/// First-match-wins policy, specificity before generality. Conservative on
/// purpose: anything ambiguous is Noise, never content.
pub fn classify(
    raw: &str,
    norm: &NormalizedBlock,
    hints: &StructuralHints,
    business_name: &str,
) -> Classification {
    let len = norm.text.chars().count();

    // Too short to be a genuine review or post
    if len < MIN_CONTENT_CHARS {
        return Classification::Noise;
    }

    let lower = norm.text.to_lowercase();

    // Page header chrome: recommendation percentage, follower counts
    if lower.contains("100% recommend") || FOLLOWER_RE.is_match(&norm.text) {
        return Classification::Noise;
    }

    // Bare business reply with no attached review context
    let first_line = raw.lines().next().map(str::trim).unwrap_or("");
    if first_line == business_name && len < MAX_BARE_REPLY_CHARS {
        return Classification::Noise;
    }

    // "<anyone> recommends <business>" is the review signature on this platform
    if !business_name.is_empty()
        && lower.contains(&format!("recommends {}", business_name.to_lowercase()))
    {
        return Classification::Review;
    }

    // Star rating present and not a date-stamped post
    let has_stars = hints.has_rating_label
        || hints
            .rating_glyph_text
            .as_deref()
            .is_some_and(|t| t.contains('★'));
    if has_stars && !POST_DATE_RE.is_match(&norm.text) {
        return Classification::Review;
    }

    if hints.is_article_like {
        return Classification::Post;
    }

    Classification::Noise
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::normalize::normalize;

    const BIZ: &str = "Elite Painting";

    fn classify_raw(raw: &str, hints: &StructuralHints) -> Classification {
        let norm = normalize(raw, BIZ);
        classify(raw, &norm, hints, BIZ)
    }

    fn article() -> StructuralHints {
        StructuralHints {
            is_article_like: true,
            ..Default::default()
        }
    }

    #[test]
    fn short_blocks_are_noise() {
        let hints = article();
        assert_eq!(classify_raw("only thirty characters here!!", &hints), Classification::Noise);
    }

    #[test]
    fn header_signature_is_noise() {
        let raw = "Elite Painting · Painting service\n100% recommend (41 Reviews) long enough text here";
        assert_eq!(classify_raw(raw, &article()), Classification::Noise);
        let raw = "Elite Painting has 1,024 followers and more page chrome text following it";
        assert_eq!(classify_raw(raw, &Default::default()), Classification::Noise);
    }

    #[test]
    fn bare_business_reply_is_noise() {
        let raw = "Elite Painting\nThanks so much for trusting us with your home, it means a lot!";
        assert_eq!(classify_raw(raw, &Default::default()), Classification::Noise);
    }

    #[test]
    fn recommends_phrase_is_review() {
        let raw = "Jane Doe recommends Elite Painting.\nThey did a wonderful job on our siding this spring.";
        assert_eq!(classify_raw(raw, &Default::default()), Classification::Review);
    }

    #[test]
    fn recommends_is_case_insensitive() {
        let raw = "JANE DOE RECOMMENDS ELITE PAINTING and everyone should hire them right away.";
        assert_eq!(classify_raw(raw, &Default::default()), Classification::Review);
    }

    #[test]
    fn rating_hint_without_post_date_is_review() {
        let hints = StructuralHints {
            has_rating_label: true,
            rating_aria_label: Some("5 out of 5 stars".into()),
            ..Default::default()
        };
        let raw = "Super professional crew, finished ahead of schedule and cleaned up after.";
        assert_eq!(classify_raw(raw, &hints), Classification::Review);
    }

    #[test]
    fn dated_post_with_stars_is_not_review() {
        let hints = StructuralHints {
            is_article_like: true,
            rating_glyph_text: Some("★★★★★".into()),
            ..Default::default()
        };
        let raw = "March 3 at 2:15 PM\nWe are proud of our five ★★★★★ rating, thanks everyone!";
        assert_eq!(classify_raw(raw, &hints), Classification::Post);
    }

    #[test]
    fn article_container_is_post() {
        let raw = "We just wrapped up a full exterior repaint in Maplewood. Swipe for photos!";
        assert_eq!(classify_raw(raw, &article()), Classification::Post);
    }

    #[test]
    fn unhinted_text_is_noise() {
        let raw = "Some random page furniture text that is long enough to pass the length gate.";
        assert_eq!(classify_raw(raw, &Default::default()), Classification::Noise);
    }

    #[test]
    fn empty_after_normalization_is_noise() {
        assert_eq!(classify_raw("", &article()), Classification::Noise);
    }
}
