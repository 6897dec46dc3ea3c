//! Identity resolution: product record → canonical slug.
//!
//! The slug is the filename stem of the product document and the last path
//! segment of its URL, so every generator must derive it the same way.

use std::sync::LazyLock;

use percent_encoding::utf8_percent_encode;
use regex::Regex;

use catalogc_shared::{ProductId, ProductRecord};

use crate::links::URL_COMPONENT;

/// Upper bound on the normalized title part, in characters.
pub const MAX_SLUG_CHARS: usize = 100;

/// Upper bound on the normalized title part, in UTF-8 bytes. With a 20-digit
/// id and `.html` the file name stays under the 255-byte limit.
pub const MAX_SLUG_BYTES: usize = 200;

/// Connective words dropped when they appear as whole tokens.
const STOP_WORDS: &[&str] = &["من", "في", "على", "الى", "عن", "و", "مع", "يا", "أيها"];

/// Promotional words stripped from the start of a title.
const PROMO_PREFIXES: &[&str] = &["عرض"];

/// Canonical, filesystem- and URL-safe product identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Slug(String);

impl Slug {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Document file name inside the products directory.
    pub fn file_name(&self) -> String {
        format!("{}.html", self.0)
    }

    /// Percent-encoded form for use as a URL path segment.
    pub fn encoded(&self) -> String {
        utf8_percent_encode(&self.0, URL_COMPONENT).to_string()
    }
}

impl std::fmt::Display for Slug {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolve the slug for a catalog record.
pub fn resolve(record: &ProductRecord) -> Slug {
    resolve_parts(record.id, &record.title)
}

/// Resolve the slug from its two inputs. Pure and total.
///
/// A title that normalizes to nothing yields the bare id.
pub fn resolve_parts(id: ProductId, title: &str) -> Slug {
    let normalized = normalize_title(title);
    if normalized.is_empty() {
        Slug(id.to_string())
    } else {
        Slug(format!("{id}-{normalized}"))
    }
}

/// Remove promotional prefixes and collapse whitespace.
///
/// A title made only of promotional words is returned unchanged rather than
/// emptied.
pub fn clean_title(title: &str) -> String {
    let tokens: Vec<&str> = title.split_whitespace().collect();
    let promo = tokens
        .iter()
        .take_while(|t| PROMO_PREFIXES.contains(t))
        .count();
    let kept = if promo < tokens.len() {
        &tokens[promo..]
    } else {
        &tokens[..]
    };
    kept.join(" ")
}

/// Title → lower-case, hyphen-joined, length-bounded slug body.
pub fn normalize_title(title: &str) -> String {
    static DISALLOWED_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^\p{L}\p{N}\s-]").expect("valid regex"));
    static WHITESPACE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    let cleaned = clean_title(title);
    let kept: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|token| !STOP_WORDS.contains(token))
        .collect();
    let joined = kept.join(" ");

    let stripped = DISALLOWED_RE.replace_all(&joined, "");
    let hyphenated = WHITESPACE_RE.replace_all(stripped.trim(), "-");
    let lowered = hyphenated.to_lowercase();

    truncate_at_boundary(&lowered, MAX_SLUG_CHARS, MAX_SLUG_BYTES)
}

/// Cut to at most `max_chars` chars and `max_bytes` bytes on a char
/// boundary, backing off to the last hyphen when the cut would split a
/// token, then drop trailing hyphens.
fn truncate_at_boundary(slug: &str, max_chars: usize, max_bytes: usize) -> String {
    let mut end = 0;
    for (count, (at, c)) in slug.char_indices().enumerate() {
        if count == max_chars || at + c.len_utf8() > max_bytes {
            break;
        }
        end = at + c.len_utf8();
    }
    if end == slug.len() {
        return slug.to_string();
    }

    let head = &slug[..end];
    let next = slug[end..].chars().next();
    let cut = match (next, head.rfind('-')) {
        (Some('-'), _) => head,
        (_, Some(pos)) if pos > 0 => &head[..pos],
        _ => head,
    };

    cut.trim_end_matches('-').to_string()
}
