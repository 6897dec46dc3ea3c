//! Sitemap with the image extension.

use chrono::NaiveDate;

use catalogc_products::ProductView;
use catalogc_shared::{SiteConfig, StaticPage};

use crate::xml::push_element;

pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
pub const IMAGE_NS: &str = "http://www.google.com/schemas/sitemap-image/1.1";

const PRODUCT_CHANGEFREQ: &str = "weekly";
const PRODUCT_PRIORITY: f64 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapImage {
    pub loc: String,
    pub title: String,
}

/// One `<url>`; lives only for the duration of an emit run.
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: NaiveDate,
    pub changefreq: String,
    pub priority: f64,
    pub image: Option<SitemapImage>,
}

impl SitemapEntry {
    pub fn for_static_page(site: &SiteConfig, page: &StaticPage, lastmod: NaiveDate) -> Self {
        Self {
            loc: format!("{}/{}", site.base(), page.path.trim_start_matches('/')),
            lastmod,
            changefreq: page.changefreq.clone(),
            priority: page.priority,
            image: None,
        }
    }

    pub fn for_product(view: &ProductView<'_>, lastmod: NaiveDate) -> Self {
        Self {
            loc: view.url.clone(),
            lastmod,
            changefreq: PRODUCT_CHANGEFREQ.to_string(),
            priority: PRODUCT_PRIORITY,
            image: view.has_image.then(|| SitemapImage {
                loc: view.image.clone(),
                title: view.title.clone(),
            }),
        }
    }
}

pub fn render_sitemap(entries: &[SitemapEntry]) -> String {
    let mut xml = String::with_capacity(256 + entries.len() * 512);

    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!(
        "<urlset xmlns=\"{SITEMAP_NS}\" xmlns:image=\"{IMAGE_NS}\">\n"
    ));

    for entry in entries {
        xml.push_str("  <url>\n");
        push_element(&mut xml, 4, "loc", &entry.loc);
        push_element(&mut xml, 4, "lastmod", &entry.lastmod.format("%Y-%m-%d").to_string());
        push_element(&mut xml, 4, "changefreq", &entry.changefreq);
        push_element(&mut xml, 4, "priority", &format!("{:.1}", entry.priority));
        if let Some(image) = &entry.image {
            xml.push_str("    <image:image>\n");
            push_element(&mut xml, 6, "image:loc", &image.loc);
            push_element(&mut xml, 6, "image:title", &image.title);
            xml.push_str("    </image:image>\n");
        }
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>\n");
    xml
}
