//! Idempotent metadata injection.
//!
//! The injector owns exactly one region of the document head: everything
//! between [`REGION_BEGIN`] and [`REGION_END`]. Each pass deletes every
//! owned region it finds, drops legacy head tags that an owned region
//! supersedes, and inserts one freshly rendered region immediately before
//! `</head>`. Nothing outside the head is ever touched.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use catalogc_products::{ProductView, excerpt};
use catalogc_shared::{Result, SiteConfig};

use crate::schema::{ProductSchema, StoreSchema, to_script_json};

/// Start of the injector-owned head region.
pub const REGION_BEGIN: &str = "<!-- catalog:meta:begin -->";
/// End of the injector-owned head region.
pub const REGION_END: &str = "<!-- catalog:meta:end -->";
/// Insertion anchor.
pub const HEAD_END: &str = "</head>";

const META_DESCRIPTION_CHARS: usize = 160;
const SOCIAL_DESCRIPTION_CHARS: usize = 200;

/// Result of one injection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Injection {
    /// The document with its owned region rendered from the current record.
    /// Equal to the input when the document was already up to date.
    Injected(String),
    /// The document has no `</head>`; it was left untouched.
    NoAnchor,
}

/// Rewrite the owned metadata region of `document` for `view`.
pub fn inject(document: &str, view: &ProductView<'_>, site: &SiteConfig) -> Result<Injection> {
    if find_head_end(document).is_none() {
        return Ok(Injection::NoAnchor);
    }

    let stripped = strip_legacy_head_tags(&strip_owned_regions(document));
    let Some(anchor) = find_head_end(&stripped) else {
        return Ok(Injection::NoAnchor);
    };

    let region = render_region(view, site)?;

    let mut out = String::with_capacity(stripped.len() + region.len());
    out.push_str(&stripped[..anchor]);
    out.push_str(&region);
    out.push_str(&stripped[anchor..]);
    Ok(Injection::Injected(out))
}

/// Render the full owned region, markers included, ending with a newline.
pub fn render_region(view: &ProductView<'_>, site: &SiteConfig) -> Result<String> {
    let product_json = to_script_json(&ProductSchema::new(view, site))?;
    let store_json = to_script_json(&StoreSchema::new(site))?;

    let title = esc(&view.title);
    let store = esc(&site.store_name);
    let url = esc(&view.url);
    let image = esc(&view.image);
    let description = esc(&excerpt(&view.description.text, META_DESCRIPTION_CHARS)).into_owned();
    let social = esc(&excerpt(&view.description.text, SOCIAL_DESCRIPTION_CHARS)).into_owned();
    let price = format!("{:.2}", view.pricing.sale_price);
    let currency = esc(&site.currency);

    Ok(format!(
        r#"{REGION_BEGIN}
    <title>{title} | {store}</title>
    <meta name="description" content="{description}">
    <link rel="canonical" href="{url}">
    <meta property="og:type" content="product">
    <meta property="og:site_name" content="{store}">
    <meta property="og:title" content="{title}">
    <meta property="og:description" content="{social}">
    <meta property="og:image" content="{image}">
    <meta property="og:url" content="{url}">
    <meta property="product:price:amount" content="{price}">
    <meta property="product:price:currency" content="{currency}">
    <meta name="twitter:card" content="summary_large_image">
    <meta name="twitter:title" content="{title}">
    <meta name="twitter:description" content="{social}">
    <meta name="twitter:image" content="{image}">
    <script type="application/ld+json">
{product_json}
    </script>
    <script type="application/ld+json">
{store_json}
    </script>
{REGION_END}
"#
    ))
}

/// Remove every owned region, each with the newline that follows it.
///
/// A begin marker without a matching end marker is removed up to `</head>`
/// (or to the end of the text when there is none).
pub fn strip_owned_regions(document: &str) -> String {
    let mut out = String::with_capacity(document.len());
    let mut rest = document;

    while let Some(begin) = rest.find(REGION_BEGIN) {
        out.push_str(&rest[..begin]);
        let after_begin = &rest[begin..];

        rest = match after_begin.find(REGION_END) {
            Some(end) => {
                let tail = &after_begin[end + REGION_END.len()..];
                tail.strip_prefix('\n').unwrap_or(tail)
            }
            None => {
                warn!("owned region has no end marker, removing it up to </head>");
                match find_head_end(after_begin) {
                    Some(anchor) => &after_begin[anchor..],
                    None => "",
                }
            }
        };
    }

    out.push_str(rest);
    out
}

/// Drop head tags that the owned region replaces: structured-data scripts,
/// `<title>`, description/keywords, social-preview meta tags and the
/// canonical link. Only the text before `</head>` is examined.
fn strip_legacy_head_tags(document: &str) -> String {
    static LEGACY_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(concat!(
            r#"(?is)[ \t]*(?:"#,
            r#"<script[^>]*application/ld\+json[^>]*>.*?</script>"#,
            r#"|<title[^>]*>.*?</title>"#,
            r#"|<meta\s[^>]*(?:name|property)\s*=\s*["'](?:description|keywords|og:[^"']*|product:[^"']*|twitter:[^"']*)["'][^>]*>"#,
            r#"|<link\s[^>]*rel\s*=\s*["']canonical["'][^>]*>"#,
            r#")[ \t]*\r?\n?"#,
        ))
        .expect("valid regex")
    });

    let Some(anchor) = find_head_end(document) else {
        return document.to_string();
    };
    let (head, rest) = document.split_at(anchor);
    let mut out = LEGACY_RE.replace_all(head, "").into_owned();
    out.push_str(rest);
    out
}

/// Byte offset of the first `</head>`, ignoring ASCII case.
fn find_head_end(document: &str) -> Option<usize> {
    document.to_ascii_lowercase().find(HEAD_END)
}

fn esc(text: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(text)
}
