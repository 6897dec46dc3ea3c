//! Absolute link building: product URLs and the pre-filled contact link.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use catalogc_shared::SiteConfig;

use crate::pricing::{Pricing, format_amount};
use crate::slug::Slug;

/// Everything except RFC 3986 unreserved characters gets encoded.
pub(crate) const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Canonical URL of a product document.
pub fn product_url(site: &SiteConfig, products_segment: &str, slug: &Slug) -> String {
    format!(
        "{}/{}/{}.html",
        site.base(),
        products_segment.trim_matches('/'),
        slug.encoded()
    )
}

/// Pre-filled order message for the contact channel.
pub fn contact_message(title: &str, pricing: &Pricing, url: &str) -> String {
    format!(
        "مرحباً، أريد طلب المنتج التالي:\n\n\
         📦 المنتج: {title}\n\
         💰 السعر: {sale} ريال (السعر الأصلي: {price} ريال)\n\
         💵 التوفير: {discount} ريال ({percent}% خصم)\n\
         🔗 الرابط: {url}\n\n\
         يرجى تأكيد التوفر والتوصيل.",
        sale = format_amount(pricing.sale_price),
        price = format_amount(pricing.price),
        discount = format_amount(pricing.discount),
        percent = pricing.discount_percent,
    )
}

/// Contact-channel link with the message percent-encoded into `text`.
pub fn contact_link(site: &SiteConfig, message: &str) -> String {
    format!(
        "{}/{}?text={}",
        site.contact_url_base.trim_end_matches('/'),
        site.contact_phone,
        utf8_percent_encode(message, URL_COMPONENT)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slug::resolve_parts;

    #[test]
    fn product_url_encodes_slug() {
        let site = SiteConfig::default();
        let slug = resolve_parts(7, "جهاز");
        let url = product_url(&site, "products", &slug);
        assert_eq!(
            url,
            "https://sherow1982.github.io/alsooq-alsaudi/products/7-%D8%AC%D9%87%D8%A7%D8%B2.html"
        );
    }

    #[test]
    fn contact_link_is_fully_encoded() {
        let site = SiteConfig::default();
        let pricing = Pricing::new(200.0, 150.0);
        let message = contact_message("جهاز", &pricing, "https://x.test/p/7.html");
        assert!(message.contains("50 ريال (25% خصم)"));

        let link = contact_link(&site, &message);
        assert!(link.starts_with("https://wa.me/201110760081?text="));
        let query = link.split_once("?text=").unwrap().1;
        assert!(query.is_ascii());
        assert!(!query.contains(' '));
        assert!(!query.contains('/'));
        assert!(query.contains("%0A"));
    }
}
