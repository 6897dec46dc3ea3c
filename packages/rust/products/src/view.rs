//! Everything the document, metadata, and feed renderers need for one
//! product, derived in one place so they can never disagree.

use catalogc_shared::ProductRecord;

use crate::context::CatalogContext;
use crate::description::{Description, select_description};
use crate::image::normalize_image_link;
use crate::links::{contact_link, contact_message, product_url};
use crate::pricing::Pricing;
use crate::slug::{Slug, clean_title, resolve};
use crate::taxonomy::{Classification, classify};

#[derive(Debug, Clone)]
pub struct ProductView<'a> {
    pub record: &'a ProductRecord,
    pub slug: Slug,
    /// Title without promotional prefixes.
    pub title: String,
    /// Normalized image link, or the site placeholder.
    pub image: String,
    /// Whether `image` came from the record rather than the placeholder.
    pub has_image: bool,
    pub classification: Classification,
    pub description: Description,
    pub pricing: Pricing,
    /// Canonical absolute URL of the product document.
    pub url: String,
    /// Pre-filled contact-channel link.
    pub contact_link: String,
    /// Manufacturer part number.
    pub mpn: String,
}

impl<'a> ProductView<'a> {
    pub(crate) fn build(ctx: &CatalogContext, record: &'a ProductRecord) -> Self {
        let site = ctx.site();
        let slug = resolve(record);
        let title = clean_title(&record.title);

        let (image, has_image) =
            match normalize_image_link(&record.image_link, ctx.filter().rewrites_video_links()) {
                Ok(link) => (link, true),
                Err(_) => (ctx.placeholder_image(), false),
            };

        let pricing = Pricing::new(record.price, record.sale_price);

        let description = select_description(
            ctx.descriptions(),
            record.id,
            &[record.title.as_str(), title.as_str()],
            &title,
            &site.store_name,
        );

        let url = product_url(site, ctx.products_segment(), &slug);
        let contact_link = contact_link(site, &contact_message(&title, &pricing, &url));

        Self {
            record,
            classification: classify(&title),
            mpn: format!("{}{:06}", site.mpn_prefix, record.id),
            slug,
            title,
            image,
            has_image,
            description,
            pricing,
            url,
            contact_link,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use catalogc_shared::{AppConfig, DescriptionIndex};

    use super::*;
    use crate::description::DescriptionSource;

    fn ctx() -> CatalogContext {
        CatalogContext::new(
            &AppConfig::default(),
            DescriptionIndex::empty(),
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn massage_device_view() {
        let record = ProductRecord {
            id: 7,
            title: "عرض جهاز تدليك كهربائي".into(),
            price: 200.0,
            sale_price: 150.0,
            image_link: "http://x/img.webp".into(),
        };
        let ctx = ctx();
        let view = ctx.view(&record);

        assert_eq!(view.slug.as_str(), "7-جهاز-تدليك-كهربائي");
        assert_eq!(view.title, "جهاز تدليك كهربائي");
        assert_eq!(view.image, "http://x/img.jpg");
        assert!(view.has_image);
        assert_eq!(view.classification.category_path, "Electronics");
        assert_eq!(view.pricing.discount, 50.0);
        assert_eq!(view.pricing.discount_percent, 25);
        assert_eq!(view.mpn, "ALS000007");
        assert!(view.url.ends_with(&format!("/products/{}.html", view.slug.encoded())));
        assert_eq!(view.description.source, DescriptionSource::Template);
    }

    #[test]
    fn missing_image_uses_placeholder() {
        let record = ProductRecord {
            id: 8,
            title: "طاولة".into(),
            price: 0.0,
            sale_price: 0.0,
            image_link: String::new(),
        };
        let ctx = ctx();
        let view = ctx.view(&record);
        assert!(!view.has_image);
        assert!(view.image.ends_with("/logo.png"));
        assert_eq!(view.pricing.discount_percent, 0);
    }
}
