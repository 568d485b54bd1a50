//! Lightweight HTML text extraction.
//!
//! Not a full HTML parser: it removes non-content elements, pulls the title
//! and h1–h3 headings, and flattens what is left into single-spaced text.
//! Good enough for feeding a page to a model, which tolerates the odd stray
//! fragment far better than it tolerates markup.

use std::sync::LazyLock;

use regex_lite::{Captures, Regex};

static COMMENTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));

static NON_CONTENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<noscript\b.*?</noscript\s*>|<svg\b.*?</svg\s*>",
    )
    .expect("valid regex")
});

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title\s*>").expect("valid regex"));

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<h[1-3]\b[^>]*>(.*?)</h[1-3]\s*>").expect("valid regex")
});

static BODY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*)</body\s*>").expect("valid regex"));

static HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<head\b.*?</head\s*>").expect("valid regex"));

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid regex"));

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").expect("valid regex")
});

/// Content pulled out of one HTML document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    /// `<title>` text, `None` when missing or blank
    pub title: Option<String>,

    /// Non-empty h1–h3 texts in document order
    pub headings: Vec<String>,

    /// Visible text collapsed to single spaces
    pub text: String,
}

pub fn extract(html: &str) -> ExtractedPage {
    let without_comments = COMMENTS.replace_all(html, " ");
    let cleaned = NON_CONTENT.replace_all(&without_comments, " ");

    let title = TITLE
        .captures(&cleaned)
        .and_then(|caps| caps.get(1))
        .map(|m| text_of(m.as_str()))
        .filter(|t| !t.is_empty());

    let headings = HEADING
        .captures_iter(&cleaned)
        .filter_map(|caps| caps.get(1))
        .map(|m| text_of(m.as_str()))
        .filter(|h| !h.is_empty())
        .collect();

    let text = match BODY.captures(&cleaned).and_then(|caps| caps.get(1)) {
        Some(body) => text_of(body.as_str()),
        None => {
            let without_head = HEAD.replace_all(&cleaned, " ");
            text_of(&TITLE.replace_all(&without_head, " "))
        }
    };

    ExtractedPage {
        title,
        headings,
        text,
    }
}

/// Strip tags from a fragment, decode entities and collapse whitespace.
pub fn text_of(fragment: &str) -> String {
    let without_tags = TAG.replace_all(fragment, " ");
    let decoded = decode_entities(&without_tags);
    decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decode numeric and common named character references. Unknown names are
/// left as written.
pub fn decode_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let raw = &caps[0];
            let name = &caps[1];
            let decoded = if let Some(hex) = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(name)
            };
            decoded.map_or_else(|| raw.to_string(), String::from)
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    Some(match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '©',
        "reg" => '®',
        "hellip" => '…',
        "mdash" => '—',
        "ndash" => '–',
        "lsquo" => '‘',
        "rsquo" => '’',
        "ldquo" => '“',
        "rdquo" => '”',
        _ => return None,
    })
}
