//! Description selection with a templated fallback.

use catalogc_shared::{DescriptionIndex, ProductId};

/// Descriptions shorter than this (after cleanup) are replaced by the template.
pub const MIN_DESCRIPTION_CHARS: usize = 20;

/// Separators left behind when a description repeats the title first.
const LEADING_SEPARATORS: &[char] = &[' ', '-', '–', '—', ':', '،', ',', '.', '|'];

/// Where the selected description came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptionSource {
    Index,
    Template,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Description {
    pub text: String,
    pub source: DescriptionSource,
}

/// Pick the description for a product.
///
/// `titles` are the title variants (raw and cleaned) stripped when the
/// indexed text merely repeats them at the start.
pub fn select_description(
    index: &DescriptionIndex,
    id: ProductId,
    titles: &[&str],
    display_title: &str,
    store_name: &str,
) -> Description {
    let indexed = index
        .get(id)
        .map(collapse_whitespace)
        .map(|text| strip_leading_title(&text, titles))
        .filter(|text| text.chars().count() >= MIN_DESCRIPTION_CHARS);

    match indexed {
        Some(text) => Description {
            text,
            source: DescriptionSource::Index,
        },
        None => Description {
            text: template_description(display_title, store_name),
            source: DescriptionSource::Template,
        },
    }
}

/// Fallback used when the index has nothing usable.
pub fn template_description(title: &str, store_name: &str) -> String {
    format!("{title} - منتج أصلي بضمان الجودة. اطلب الآن من {store_name}!")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn strip_leading_title(text: &str, titles: &[&str]) -> String {
    let mut variants: Vec<String> = titles
        .iter()
        .map(|t| collapse_whitespace(t))
        .filter(|t| !t.is_empty())
        .collect();
    // Longest first so a raw title with a prefix wins over its cleaned form.
    variants.sort_by_key(|t| std::cmp::Reverse(t.len()));

    for title in &variants {
        if let Some(rest) = text.strip_prefix(title.as_str()) {
            return rest.trim_start_matches(LEADING_SEPARATORS).to_string();
        }
    }
    text.to_string()
}

/// Truncate to at most `max` characters, appending an ellipsis when cut.
pub fn excerpt(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let head: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", head.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(entries: &[(ProductId, &str)]) -> DescriptionIndex {
        entries.iter().map(|(id, t)| (*id, t.to_string())).collect()
    }

    #[test]
    fn uses_indexed_description() {
        let idx = index(&[(7, "جهاز يساعد على الاسترخاء وتخفيف آلام العضلات بسرعة")]);
        let d = select_description(&idx, 7, &["جهاز تدليك"], "جهاز تدليك", "المتجر");
        assert_eq!(d.source, DescriptionSource::Index);
        assert!(d.text.starts_with("جهاز يساعد"));
    }

    #[test]
    fn missing_entry_uses_template() {
        let d = select_description(&DescriptionIndex::empty(), 7, &["x"], "جهاز", "المتجر");
        assert_eq!(d.source, DescriptionSource::Template);
        assert_eq!(d.text, "جهاز - منتج أصلي بضمان الجودة. اطلب الآن من المتجر!");
    }

    #[test]
    fn duplicated_title_is_stripped_before_length_check() {
        let idx = index(&[(1, "عرض ساعة ذكية - ممتازة")]);
        let d = select_description(&idx, 1, &["عرض ساعة ذكية", "ساعة ذكية"], "ساعة ذكية", "S");
        // Only "ممتازة" remains, which is too short.
        assert_eq!(d.source, DescriptionSource::Template);

        let idx = index(&[(1, "ساعة ذكية: تتابع نبضات القلب والنوم وتعرض الإشعارات")]);
        let d = select_description(&idx, 1, &["عرض ساعة ذكية", "ساعة ذكية"], "ساعة ذكية", "S");
        assert_eq!(d.source, DescriptionSource::Index);
        assert!(d.text.starts_with("تتابع"));
    }

    #[test]
    fn whitespace_is_collapsed() {
        let idx = index(&[(2, "سطر أول\n\n   سطر ثاني طويل بما يكفي للاستخدام")]);
        let d = select_description(&idx, 2, &[], "t", "S");
        assert_eq!(d.text, "سطر أول سطر ثاني طويل بما يكفي للاستخدام");
    }

    #[test]
    fn excerpt_respects_limit() {
        assert_eq!(excerpt("short", 10), "short");
        let long = "a".repeat(200);
        let cut = excerpt(&long, 160);
        assert_eq!(cut.chars().count(), 160);
        assert!(cut.ends_with("..."));
    }
}
