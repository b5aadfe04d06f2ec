use std::collections::HashSet;

/// Chars of resolved body (or raw text) that make up a review fingerprint.
const REVIEW_FINGERPRINT_CHARS: usize = 100;

/// First-seen-wins duplicate suppression, scoped to one aggregation run.
/// Overlapping scroll passes re-render the same content, so without this a
/// single real review would be counted once per overlap.
#[derive(Debug, Default)]
pub struct FingerprintSet {
    seen: HashSet<String>,
}

impl FingerprintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the fingerprint was not seen before (keep the item),
    /// false if it is a repeat (discard the later-seen instance).
    pub fn admit(&mut self, fingerprint: &str) -> bool {
        self.seen.insert(fingerprint.to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }
}

/// Review fingerprint: the first 100 chars of the resolved body, or of the
/// raw block text when body resolution never got that far.
pub fn review_fingerprint(text: &str) -> String {
    text.chars().take(REVIEW_FINGERPRINT_CHARS).collect()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_seen_wins() {
        let mut set = FingerprintSet::new();
        assert!(set.admit("abc"));
        assert!(!set.admit("abc"));
        assert!(set.admit("def"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn retention_is_order_independent() {
        let fps = ["a", "b", "a", "c", "b", "a"];
        let mut forward = FingerprintSet::new();
        for fp in fps {
            forward.admit(fp);
        }
        let mut reverse = FingerprintSet::new();
        for fp in fps.iter().rev() {
            reverse.admit(fp);
        }
        assert_eq!(forward.len(), reverse.len());
        assert_eq!(forward.len(), 3);
    }

    #[test]
    fn fingerprint_truncates_at_100_chars() {
        let long = "x".repeat(250);
        assert_eq!(review_fingerprint(&long).chars().count(), 100);
    }

    #[test]
    fn short_text_fingerprints_whole() {
        assert_eq!(review_fingerprint("short body"), "short body");
    }

    #[test]
    fn equal_prefixes_collide() {
        let a = format!("{}{}", "y".repeat(100), "tail one");
        let b = format!("{}{}", "y".repeat(100), "a different tail");
        assert_eq!(review_fingerprint(&a), review_fingerprint(&b));
    }
}
