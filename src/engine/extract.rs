use regex::Regex;

use super::normalize::{collapse_ws, MONTH_PAT};
use crate::capture::StructuralHints;

const DEFAULT_AUTHOR: &str = "Customer";
const DEFAULT_RATING: u8 = 5;
const MAX_AUTHOR_CHARS: usize = 50;
const MIN_BODY_CHARS: usize = 15;
const AUTHOR_SCAN_LINES: usize = 5;

/// Structured fields pulled out of one Review-classified block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedReview {
    pub author: String,
    pub rating: u8,
    pub body: String,
}

/// Tiered field extraction over the raw block text. The patterns embed the
/// business name, so they are compiled once per run rather than as statics.
pub struct ReviewExtractor {
    business_name: String,
    author_re: Regex,
    body_recommends_re: Regex,
    body_dated_re: Regex,
    lead_recommends_re: Regex,
    lead_date_re: Regex,
}

impl ReviewExtractor {
    pub fn new(business_name: &str) -> Self {
        let biz = regex::escape(business_name);
        let date = format!(r"(?:{}) \d{{1,2}}, \d{{4}}", MONTH_PAT);
        // An empty business name must disable the reply stop, not turn it
        // into a bare "\n" that truncates multi-line bodies
        let stop = if business_name.is_empty() {
            r"(?:\nAll reactions:|\z)".to_string()
        } else {
            format!(r"(?:\nAll reactions:|\n{}|\z)", biz)
        };

        let author_re = Regex::new(&format!(
            r"\A([A-Z][\w'’.-]*(?:\s+[A-Z][\w'’.-]*)*)\s+recommends\s+{}",
            biz
        ))
        .unwrap();

        // recommends-line, date line, short separator line, then the body
        let body_recommends_re = Regex::new(&format!(
            r"(?s)recommends[^\n]*{}[^\n]*\n\s*{}[^\n]*\n[^\n]{{0,3}}\n(.*?){}",
            biz, date, stop
        ))
        .unwrap();

        // bare date line, short separator line, then the body
        let body_dated_re = Regex::new(&format!(
            r"(?s)(?:\A|\n)\s*{}[^\n]*\n[^\n]{{0,3}}\n(.*?){}",
            date, stop
        ))
        .unwrap();

        let lead_recommends_re = Regex::new(r"(?m)^[^\n]*\brecommends\b[^\n]*\n?").unwrap();
        let lead_date_re = Regex::new(&format!(r"(?m)^\s*{}[^\n]*\n?", date)).unwrap();

        Self {
            business_name: business_name.to_string(),
            author_re,
            body_recommends_re,
            body_dated_re,
            lead_recommends_re,
            lead_date_re,
        }
    }

    /// Resolve author, rating, and body for one candidate block. Never
    /// errors: unmatched tiers fall through to defaults, and a candidate
    /// whose body is too short is silently discarded (`None`).
    pub fn extract(&self, raw: &str, hints: &StructuralHints) -> Option<ExtractedReview> {
        let body = self.resolve_body(raw)?;
        Some(ExtractedReview {
            author: self.resolve_author(raw),
            rating: resolve_rating(hints),
            body,
        })
    }

    fn resolve_author(&self, raw: &str) -> String {
        // Tier (a): capitalized name anchored at block start
        if let Some(caps) = self.author_re.captures(raw) {
            return caps[1].to_string();
        }

        // Tier (b): "recommends" + business name within the first few lines
        let biz_lower = self.business_name.to_lowercase();
        for line in raw.lines().take(AUTHOR_SCAN_LINES) {
            let lower = line.to_lowercase();
            if !lower.contains("recommends") || !lower.contains(&biz_lower) {
                continue;
            }
            if let Some(idx) = lower.find("recommends") {
                let left = line[..idx].trim();
                if !left.is_empty() && left.chars().count() < MAX_AUTHOR_CHARS {
                    return left.to_string();
                }
            }
        }

        DEFAULT_AUTHOR.to_string()
    }

    fn resolve_body(&self, raw: &str) -> Option<String> {
        let captured = self
            .body_recommends_re
            .captures(raw)
            .or_else(|| self.body_dated_re.captures(raw))
            .map(|caps| caps[1].to_string())
            .unwrap_or_else(|| self.strip_lead_lines(raw));

        let body = collapse_ws(&captured);
        if body.chars().count() <= MIN_BODY_CHARS {
            return None;
        }
        Some(body)
    }

    /// Tier (c): drop the leading recommends line and the date line that
    /// follows it, keep whatever remains as the body.
    fn strip_lead_lines(&self, raw: &str) -> String {
        let mut text = self.lead_recommends_re.replacen(raw, 1, "").into_owned();
        text = self.lead_date_re.replacen(&text, 1, "").into_owned();
        if let Some(pos) = text.find("All reactions:") {
            text.truncate(pos);
        }
        text
    }
}

/// Tiered rating resolution: aria label, then glyph count, then default.
/// A zero glyph count is unresolved, not a zero rating.
fn resolve_rating(hints: &StructuralHints) -> u8 {
    if let Some(label) = hints.rating_aria_label.as_deref() {
        if let Some(n) = leading_int(label) {
            if (1..=5).contains(&n) {
                return n;
            }
        }
    }

    if let Some(glyphs) = hints.rating_glyph_text.as_deref() {
        let stars = glyphs.chars().filter(|c| *c == '★').count();
        if (1..=5).contains(&stars) {
            return stars as u8;
        }
    }

    DEFAULT_RATING
}

fn leading_int(s: &str) -> Option<u8> {
    let digits: String = s.trim_start().chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    const BIZ: &str = "Elite Painting";

    fn extractor() -> ReviewExtractor {
        ReviewExtractor::new(BIZ)
    }

    fn rated(label: &str) -> StructuralHints {
        StructuralHints {
            has_rating_label: true,
            rating_aria_label: Some(label.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn full_review_block() {
        let raw = "Jane Doe recommends Elite Painting.\nMarch 3, 2023\n·\nGreat work, highly recommend!\nAll reactions: 4";
        let r = extractor().extract(raw, &rated("5 out of 5 stars")).unwrap();
        assert_eq!(r.author, "Jane Doe");
        assert_eq!(r.rating, 5);
        assert_eq!(r.body, "Great work, highly recommend!");
    }

    #[test]
    fn author_from_recommends_line_not_at_start() {
        let raw = "Reviewed 3 days ago\nBob Smith recommends Elite Painting.\nMarch 3, 2023\n·\nThey painted our fence beautifully.";
        let r = extractor().extract(raw, &Default::default()).unwrap();
        assert_eq!(r.author, "Bob Smith");
    }

    #[test]
    fn author_defaults_to_customer() {
        let raw = "March 3, 2023\n·\nWonderful experience from the first call to the final walkthrough.";
        let r = extractor().extract(raw, &Default::default()).unwrap();
        assert_eq!(r.author, "Customer");
        assert_eq!(
            r.body,
            "Wonderful experience from the first call to the final walkthrough."
        );
    }

    #[test]
    fn body_stops_at_business_reply() {
        let raw = "Jane Doe recommends Elite Painting.\nMarch 3, 2023\n·\nQuick, clean, and careful with our furniture.\nElite Painting\nThank you Jane!";
        let r = extractor().extract(raw, &Default::default()).unwrap();
        assert_eq!(r.body, "Quick, clean, and careful with our furniture.");
    }

    #[test]
    fn fallback_strips_lead_lines() {
        // No separator line, so both structured tiers fail
        let raw = "Jane Doe recommends Elite Painting.\nMarch 3, 2023\nThe team was punctual and the finish looks amazing.";
        let r = extractor().extract(raw, &Default::default()).unwrap();
        assert_eq!(r.body, "The team was punctual and the finish looks amazing.");
    }

    #[test]
    fn short_body_is_discarded() {
        let raw = "Jane Doe recommends Elite Painting.\nMarch 3, 2023\n·\nGreat job!";
        assert!(extractor().extract(raw, &Default::default()).is_none());
    }

    #[test]
    fn empty_business_name_keeps_multiline_body() {
        let raw = "March 3, 2023\n·\nFirst line of the body\nand the second line too.";
        let r = ReviewExtractor::new("").extract(raw, &Default::default()).unwrap();
        assert_eq!(r.body, "First line of the body and the second line too.");
    }

    #[test]
    fn rating_from_aria_label() {
        assert_eq!(resolve_rating(&rated("3 out of 5 stars")), 3);
    }

    #[test]
    fn rating_from_glyph_count() {
        let hints = StructuralHints {
            rating_glyph_text: Some("★★★★".into()),
            ..Default::default()
        };
        assert_eq!(resolve_rating(&hints), 4);
    }

    #[test]
    fn zero_glyphs_fall_to_default() {
        let hints = StructuralHints {
            rating_glyph_text: Some("no stars here".into()),
            ..Default::default()
        };
        assert_eq!(resolve_rating(&hints), 5);
    }

    #[test]
    fn out_of_range_label_falls_through() {
        let hints = StructuralHints {
            has_rating_label: true,
            rating_aria_label: Some("0 out of 5 stars".into()),
            rating_glyph_text: Some("★★".into()),
            ..Default::default()
        };
        assert_eq!(resolve_rating(&hints), 2);
    }

    #[test]
    fn unhinted_rating_defaults_to_five() {
        assert_eq!(resolve_rating(&Default::default()), 5);
    }
}
