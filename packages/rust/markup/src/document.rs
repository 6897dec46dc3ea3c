//! Product document synthesis.
//!
//! The synthesizer only writes the static skeleton (head anchor and body).
//! The metadata region is always produced by [`inject`], so a fresh document
//! and a re-injected one can never drift apart.

use catalogc_products::{ProductView, format_amount};
use catalogc_shared::{CatalogError, Result, SiteConfig};

use crate::inject::{Injection, inject};

const RTL_LANGUAGES: &[&str] = &["ar", "he", "fa", "ur"];

/// Render a complete product document, metadata region included.
pub fn synthesize(view: &ProductView<'_>, site: &SiteConfig) -> Result<String> {
    let skeleton = skeleton(view, site);
    match inject(&skeleton, view, site)? {
        Injection::Injected(html) => Ok(html),
        Injection::NoAnchor => Err(CatalogError::Render(format!(
            "document skeleton for product {} has no head anchor",
            view.record.id
        ))),
    }
}

fn skeleton(view: &ProductView<'_>, site: &SiteConfig) -> String {
    let lang = esc(&site.language);
    let dir = if RTL_LANGUAGES.contains(&site.language.as_str()) {
        "rtl"
    } else {
        "ltr"
    };
    let title = esc(&view.title);
    let store = esc(&site.store_name);
    let image = esc(&view.image);
    let label = esc(view.classification.label);
    let description = esc(&view.description.text);
    let contact = esc(&view.contact_link);
    let currency = esc(&site.currency);
    let sale = format_amount(view.pricing.sale_price);
    let [transit_min, transit_max] = site.transit_days;

    let old_price = if view.pricing.has_discount() {
        format!(
            "\n                    <span class=\"old-price\">{} {currency}</span>\n                    <span class=\"discount\">-{}%</span>",
            format_amount(view.pricing.price),
            view.pricing.discount_percent,
        )
    } else {
        String::new()
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}" dir="{dir}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <link rel="stylesheet" href="../assets/product.css">
</head>
<body>
    <header class="header">
        <a href="../index.html" class="logo">{store}</a>
    </header>

    <nav class="breadcrumb">
        <a href="../index.html">الرئيسية</a> &rsaquo; <span>{label}</span> &rsaquo; <span>{title}</span>
    </nav>

    <main class="container">
        <div class="product-main">
            <div class="product-gallery">
                <img src="{image}" alt="{title}" class="product-image" loading="lazy">
            </div>

            <div class="product-info">
                <h1>{title}</h1>

                <div class="prices">
                    <span class="current-price">{sale} {currency}</span>{old_price}
                </div>

                <div class="description">
                    <p>{description}</p>
                </div>

                <a href="{contact}" class="contact-btn" target="_blank" rel="noopener">اطلب عبر واتساب</a>

                <dl class="product-meta">
                    <dt>التوفير</dt><dd>{saving} {currency}</dd>
                    <dt>الفئة</dt><dd>{label}</dd>
                    <dt>الشحن</dt><dd>مجاناً</dd>
                    <dt>التوصيل</dt><dd>{transit_min}-{transit_max} أيام عمل</dd>
                </dl>
            </div>
        </div>
    </main>

    <footer class="footer">
        <p>&copy; {store}</p>
    </footer>
</body>
</html>
"#,
        saving = format_amount(view.pricing.discount),
    )
}

fn esc(text: &str) -> std::borrow::Cow<'_, str> {
    quick_xml::escape::escape(text)
}
