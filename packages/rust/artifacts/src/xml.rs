//! Text escaping shared by the feed and the sitemap.

use std::borrow::Cow;

use quick_xml::escape::escape;

/// Whether XML 1.0 allows `c` in character data.
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}

/// Escape markup characters and replace characters XML 1.0 forbids
/// (C0 controls other than tab/newline/return, U+FFFE, U+FFFF) with a space.
pub(crate) fn xml_text(text: &str) -> Cow<'_, str> {
    if text.chars().all(is_xml_char) {
        return escape(text);
    }
    let cleaned: String = text
        .chars()
        .map(|c| if is_xml_char(c) { c } else { ' ' })
        .collect();
    Cow::Owned(escape(&cleaned).into_owned())
}

/// `<name>escaped text</name>` on its own indented line.
pub(crate) fn push_element(xml: &mut String, indent: usize, name: &str, text: &str) {
    xml.push_str(&format!(
        "{:indent$}<{name}>{}</{name}>\n",
        "",
        xml_text(text),
    ));
}
