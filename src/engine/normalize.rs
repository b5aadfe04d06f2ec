use std::sync::LazyLock;

use regex::Regex;

pub(crate) const MONTH_PAT: &str = "January|February|March|April|May|June|July|August|September|October|November|December";

// Tokens can wrap across a rendered line break, so these match any
// whitespace run where a space would appear; otherwise a wrapped token
// would survive the strip only to be joined by the whitespace collapse.
static SEE_MORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(…\s*|\.{3}\s*)?\bsee\s+(more|less)\b").unwrap());
static AGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d+[wy]\b").unwrap());
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\b(?:{})\s+\d{{1,2}},\s+\d{{4}}\b", MONTH_PAT)).unwrap()
});
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

const REACTIONS_MARKER: &str = "All reactions:";

/// A block with noise tokens removed: expansion links, engagement telemetry,
/// business replies, age stamps, calendar dates. `line_count` is taken before
/// the final whitespace collapse.
#[derive(Debug, Clone)]
pub struct NormalizedBlock {
    pub text: String,
    pub line_count: usize,
}

/// Run the full cleaning sequence over one raw block. Each step is
/// individually idempotent, so normalizing an already-normalized block is a
/// no-op on the text. Never fails; an empty result is valid.
pub fn normalize(raw: &str, business_name: &str) -> NormalizedBlock {
    let mut text = SEE_MORE_RE.replace_all(raw, "").into_owned();

    if let Some(pos) = text.find(REACTIONS_MARKER) {
        text.truncate(pos);
    }

    if let Some(pos) = reply_start(&text, business_name) {
        text.truncate(pos);
    }

    let text = AGE_RE.replace_all(&text, "");
    let text = DATE_RE.replace_all(&text, "");

    let line_count = text.lines().filter(|l| !l.trim().is_empty()).count();
    NormalizedBlock {
        text: collapse_ws(&text),
        line_count,
    }
}

/// Collapse whitespace runs (including newlines) to single spaces and trim.
pub fn collapse_ws(text: &str) -> String {
    WS_RE.replace_all(text, " ").trim().to_string()
}

/// Byte offset of a trailing business-reply line: a non-first line that
/// starts with the business name. The first line is left alone so the
/// classifier can still inspect bare-reply blocks.
fn reply_start(text: &str, business_name: &str) -> Option<usize> {
    if business_name.is_empty() {
        return None;
    }
    let mut offset = 0;
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 && line.trim_start().starts_with(business_name) {
            return Some(offset);
        }
        offset += line.len() + 1;
    }
    None
}

// ── Tests ──
