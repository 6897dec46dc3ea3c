//! Merchant feed (RSS 2.0 with the Google product namespace).

use catalogc_products::{ProductView, format_money};
use catalogc_shared::{ProductId, SiteConfig};

use crate::xml::push_element;

pub const GOOGLE_NS: &str = "http://base.google.com/ns/1.0";

const SHIPPING_SERVICE: &str = "Standard";

/// One `<item>`; lives only for the duration of an emit run.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub id: ProductId,
    pub title: String,
    pub description: String,
    pub link: String,
    pub image_link: String,
    pub price: f64,
    pub sale_price: f64,
    pub mpn: String,
    pub category_path: &'static str,
    pub product_type: &'static str,
}

impl FeedEntry {
    /// `image_link` is the normalized link carried by the eligibility verdict.
    pub fn new(view: &ProductView<'_>, image_link: String) -> Self {
        Self {
            id: view.record.id,
            title: view.title.clone(),
            description: view.description.text.clone(),
            link: view.url.clone(),
            image_link,
            price: view.pricing.price,
            sale_price: view.pricing.sale_price,
            mpn: view.mpn.clone(),
            category_path: view.classification.category_path,
            product_type: view.classification.label,
        }
    }
}

/// Serialize the feed. Output depends only on its inputs.
pub fn render_feed(site: &SiteConfig, entries: &[FeedEntry]) -> String {
    let currency = &site.currency;
    let mut xml = String::with_capacity(1024 + entries.len() * 1024);

    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<rss version=\"2.0\" xmlns:g=\"{GOOGLE_NS}\">\n"));
    xml.push_str("  <channel>\n");
    push_element(&mut xml, 4, "title", &site.store_name);
    push_element(&mut xml, 4, "link", &format!("{}/", site.base()));
    push_element(&mut xml, 4, "description", &site.feed_description);
    push_element(&mut xml, 4, "language", &site.language);

    for entry in entries {
        xml.push_str("    <item>\n");
        push_element(&mut xml, 6, "g:id", &entry.id.to_string());
        push_element(&mut xml, 6, "g:title", &entry.title);
        push_element(&mut xml, 6, "g:description", &entry.description);
        push_element(&mut xml, 6, "g:link", &entry.link);
        push_element(&mut xml, 6, "g:image_link", &entry.image_link);
        push_element(&mut xml, 6, "g:condition", "new");
        push_element(&mut xml, 6, "g:availability", "in stock");
        push_element(&mut xml, 6, "g:price", &format_money(entry.price, currency));
        push_element(&mut xml, 6, "g:sale_price", &format_money(entry.sale_price, currency));
        push_element(&mut xml, 6, "g:brand", &site.store_name);
        push_element(&mut xml, 6, "g:mpn", &entry.mpn);
        push_element(&mut xml, 6, "g:google_product_category", entry.category_path);
        push_element(&mut xml, 6, "g:product_type", entry.product_type);
        xml.push_str("      <g:shipping>\n");
        push_element(&mut xml, 8, "g:country", &site.country);
        push_element(&mut xml, 8, "g:service", SHIPPING_SERVICE);
        push_element(&mut xml, 8, "g:price", &format_money(0.0, currency));
        xml.push_str("      </g:shipping>\n");
        xml.push_str("    </item>\n");
    }

    xml.push_str("  </channel>\n");
    xml.push_str("</rss>\n");
    xml
}

#[cfg(test)]
mod tests {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    use super::*;

    fn entry(id: ProductId, title: &str) -> FeedEntry {
        FeedEntry {
            id,
            title: title.into(),
            description: "وصف".into(),
            link: format!("https://example.test/products/{id}.html"),
            image_link: "https://cdn.test/a.jpg".into(),
            price: 200.0,
            sale_price: 150.0,
            mpn: format!("ALS{id:06}"),
            category_path: "Health & Beauty > Health Care",
            product_type: "الصحة والعافية",
        }
    }

    /// Text of every element named `name`, unescaped.
    fn texts(xml: &str, name: &[u8]) -> Vec<String> {
        let mut reader = Reader::from_str(xml);
        let mut out = Vec::new();
        let mut inside = false;
        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => inside = e.name().as_ref() == name,
                Ok(Event::Text(e)) if inside => out.push(e.unescape().unwrap().into_owned()),
                Ok(Event::End(_)) => inside = false,
                Ok(Event::Eof) => break,
                Err(e) => panic!("feed is not well-formed: {e}"),
                _ => {}
            }
        }
        out
    }

    #[test]
    fn feed_items_carry_escaped_fields() {
        let site = SiteConfig::default();
        let xml = render_feed(&site, &[entry(1, "Cable <USB> & \"Fast\""), entry(2, "ساعة")]);

        assert!(xml.contains("Health &amp; Beauty &gt; Health Care"));
        assert_eq!(texts(&xml, b"g:id"), vec!["1", "2"]);
        assert_eq!(texts(&xml, b"g:title")[0], "Cable <USB> & \"Fast\"");
        assert_eq!(texts(&xml, b"g:sale_price"), vec!["150.00 SAR", "150.00 SAR"]);
        assert_eq!(texts(&xml, b"g:mpn")[1], "ALS000002");
        assert_eq!(texts(&xml, b"g:service"), vec!["Standard", "Standard"]);
    }

    #[test]
    fn shipping_price_is_zero() {
        let site = SiteConfig::default();
        let xml = render_feed(&site, &[entry(5, "x")]);
        // g:price appears for the item and inside the shipping block.
        assert_eq!(texts(&xml, b"g:price"), vec!["200.00 SAR", "0.00 SAR"]);
    }

    #[test]
    fn control_characters_do_not_break_the_feed() {
        let site = SiteConfig::default();
        let xml = render_feed(&site, &[entry(3, "ساعة\u{0B}ذكية\u{1}")]);

        assert!(
            xml.chars()
                .all(|c| matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}'))
        );
        assert_eq!(texts(&xml, b"g:title"), vec!["ساعة ذكية "]);
    }

    #[test]
    fn empty_feed_is_still_well_formed() {
        let xml = render_feed(&SiteConfig::default(), &[]);
        assert!(texts(&xml, b"g:id").is_empty());
        assert_eq!(texts(&xml, b"language"), vec!["ar"]);
    }
}
