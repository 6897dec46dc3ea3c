//! Structured-data (JSON-LD) model.
//!
//! Field order is struct order, so the serialized block is byte-stable for
//! a given product and site configuration.

use serde::Serialize;

use catalogc_products::ProductView;
use catalogc_shared::{CatalogError, Result, SiteConfig};

const SCHEMA_CONTEXT: &str = "https://schema.org/";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSchema<'a> {
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(rename = "@type")]
    kind: &'static str,
    name: &'a str,
    image: Vec<&'a str>,
    description: &'a str,
    sku: String,
    mpn: &'a str,
    brand: Named<'a>,
    category: &'static str,
    offers: Offer<'a>,
    aggregate_rating: AggregateRating<'a>,
}

#[derive(Debug, Serialize)]
struct Named<'a> {
    #[serde(rename = "@type")]
    kind: &'static str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Offer<'a> {
    #[serde(rename = "@type")]
    kind: &'static str,
    url: &'a str,
    price_currency: &'a str,
    price: String,
    price_valid_until: &'a str,
    item_condition: &'static str,
    availability: &'static str,
    seller: Named<'a>,
    has_merchant_return_policy: ReturnPolicy<'a>,
    shipping_details: ShippingDetails<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReturnPolicy<'a> {
    #[serde(rename = "@type")]
    kind: &'static str,
    applicable_country: &'a str,
    return_policy_category: &'static str,
    merchant_return_days: u32,
    return_method: &'static str,
    return_fees: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ShippingDetails<'a> {
    #[serde(rename = "@type")]
    kind: &'static str,
    shipping_rate: MonetaryAmount<'a>,
    shipping_destination: DefinedRegion<'a>,
    delivery_time: DeliveryTime,
}

#[derive(Debug, Serialize)]
struct MonetaryAmount<'a> {
    #[serde(rename = "@type")]
    kind: &'static str,
    value: &'static str,
    currency: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DefinedRegion<'a> {
    #[serde(rename = "@type")]
    kind: &'static str,
    address_country: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeliveryTime {
    #[serde(rename = "@type")]
    kind: &'static str,
    handling_time: DayRange,
    transit_time: DayRange,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DayRange {
    #[serde(rename = "@type")]
    kind: &'static str,
    min_value: u32,
    max_value: u32,
    unit_code: &'static str,
}

impl DayRange {
    fn days([min_value, max_value]: [u32; 2]) -> Self {
        Self {
            kind: "QuantitativeValue",
            min_value,
            max_value,
            unit_code: "DAY",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AggregateRating<'a> {
    #[serde(rename = "@type")]
    kind: &'static str,
    rating_value: &'a str,
    review_count: u32,
}

impl<'a> ProductSchema<'a> {
    pub fn new(view: &'a ProductView<'_>, site: &'a SiteConfig) -> Self {
        let image = if view.has_image {
            vec![view.image.as_str()]
        } else {
            Vec::new()
        };

        Self {
            context: SCHEMA_CONTEXT,
            kind: "Product",
            name: &view.title,
            image,
            description: &view.description.text,
            sku: format!("SKU_{}", view.record.id),
            mpn: &view.mpn,
            brand: Named {
                kind: "Brand",
                name: &site.store_name,
            },
            category: view.classification.category_path,
            offers: Offer {
                kind: "Offer",
                url: &view.url,
                price_currency: &site.currency,
                price: format!("{:.2}", view.pricing.sale_price),
                price_valid_until: &site.price_valid_until,
                item_condition: "https://schema.org/NewCondition",
                availability: "https://schema.org/InStock",
                seller: Named {
                    kind: "Organization",
                    name: &site.store_name,
                },
                has_merchant_return_policy: ReturnPolicy {
                    kind: "MerchantReturnPolicy",
                    applicable_country: &site.country,
                    return_policy_category: "https://schema.org/MerchantReturnFiniteReturnWindow",
                    merchant_return_days: site.return_days,
                    return_method: "https://schema.org/ReturnByMail",
                    return_fees: "https://schema.org/FreeReturn",
                },
                shipping_details: ShippingDetails {
                    kind: "OfferShippingDetails",
                    shipping_rate: MonetaryAmount {
                        kind: "MonetaryAmount",
                        value: "0",
                        currency: &site.currency,
                    },
                    shipping_destination: DefinedRegion {
                        kind: "DefinedRegion",
                        address_country: &site.country,
                    },
                    delivery_time: DeliveryTime {
                        kind: "ShippingDeliveryTime",
                        handling_time: DayRange::days(site.handling_days),
                        transit_time: DayRange::days(site.transit_days),
                    },
                },
            },
            aggregate_rating: AggregateRating {
                kind: "AggregateRating",
                rating_value: &site.rating_value,
                review_count: site.review_count,
            },
        }
    }
}

/// The store itself, published next to every product block.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSchema<'a> {
    #[serde(rename = "@context")]
    context: &'static str,
    #[serde(rename = "@type")]
    kind: &'static str,
    name: &'a str,
    url: String,
    logo: String,
    contact_point: ContactPoint<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ContactPoint<'a> {
    #[serde(rename = "@type")]
    kind: &'static str,
    telephone: String,
    contact_type: &'static str,
    area_served: &'a str,
    available_language: &'a str,
}

impl<'a> StoreSchema<'a> {
    pub fn new(site: &'a SiteConfig) -> Self {
        Self {
            context: SCHEMA_CONTEXT,
            kind: "OnlineStore",
            name: &site.store_name,
            url: format!("{}/", site.base()),
            logo: format!("{}/logo.png", site.base()),
            contact_point: ContactPoint {
                kind: "ContactPoint",
                telephone: format!("+{}", site.contact_phone),
                contact_type: "customer service",
                area_served: &site.country,
                available_language: &site.language,
            },
        }
    }
}

/// Serialize for embedding inside `<script>`: pretty-printed, with `<`, `>`
/// and `&` written as `\u` escapes.
///
/// Text fields can then never close the element, open a comment, or spell
/// out a region marker or `</head>`.
pub fn to_script_json<T: Serialize>(value: &T) -> Result<String> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CatalogError::Render(format!("structured data: {e}")))?;
    Ok(json
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026"))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use serde_json::Value;

    use catalogc_products::CatalogContext;
    use catalogc_shared::{AppConfig, DescriptionIndex, ProductRecord};

    use super::*;

    fn ctx() -> CatalogContext {
        CatalogContext::new(
            &AppConfig::default(),
            DescriptionIndex::empty(),
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        )
        .unwrap()
    }

    fn record(title: &str, image: &str) -> ProductRecord {
        ProductRecord {
            id: 7,
            title: title.into(),
            price: 200.0,
            sale_price: 150.0,
            image_link: image.into(),
        }
    }

    #[test]
    fn product_block_carries_offer_and_policies() {
        let ctx = ctx();
        let record = record("جهاز تدليك", "https://cdn.test/a.webp");
        let view = ctx.view(&record);
        let json = to_script_json(&ProductSchema::new(&view, ctx.site())).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["@type"], "Product");
        assert_eq!(value["mpn"], "ALS000007");
        assert_eq!(value["image"][0], "https://cdn.test/a.jpg");
        assert_eq!(value["offers"]["price"], "150.00");
        assert_eq!(value["offers"]["priceCurrency"], "SAR");
        assert_eq!(value["offers"]["priceValidUntil"], "2026-12-31");
        assert_eq!(
            value["offers"]["hasMerchantReturnPolicy"]["returnPolicyCategory"],
            "https://schema.org/MerchantReturnFiniteReturnWindow"
        );
        assert_eq!(value["offers"]["shippingDetails"]["shippingRate"]["value"], "0");
        assert_eq!(
            value["offers"]["shippingDetails"]["deliveryTime"]["transitTime"]["maxValue"],
            3
        );
        assert_eq!(value["aggregateRating"]["reviewCount"], 25);
    }

    #[test]
    fn missing_image_serializes_empty_list() {
        let ctx = ctx();
        let record = record("جهاز", "");
        let view = ctx.view(&record);
        let json = to_script_json(&ProductSchema::new(&view, ctx.site())).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["image"], Value::Array(vec![]));
    }

    #[test]
    fn script_close_sequence_is_escaped() {
        let ctx = ctx();
        let record = record("evil </script><b>", "https://cdn.test/a.jpg");
        let view = ctx.view(&record);
        let json = to_script_json(&ProductSchema::new(&view, ctx.site())).unwrap();
        assert!(!json.contains("</script>"));
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["name"], "evil </script><b>");
    }

    #[test]
    fn store_block_uses_site_identity() {
        let site = SiteConfig::default();
        let json = to_script_json(&StoreSchema::new(&site)).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["@type"], "OnlineStore");
        assert_eq!(value["contactPoint"]["telephone"], "+201110760081");
        assert!(value["url"].as_str().unwrap().ends_with('/'));
    }
}
