//! Title-keyword taxonomy classifier.
//!
//! Rules are data: an ordered table evaluated top to bottom, first rule with
//! any matching keyword wins. The order is part of the contract.

/// Platform category path plus the local display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Shopping-platform category path (e.g. `Electronics`).
    pub category_path: &'static str,
    /// Local breadcrumb label shown on the product page.
    pub label: &'static str,
}

/// One `(keywords → classification)` row.
#[derive(Debug, Clone, Copy)]
pub struct TaxonomyRule {
    pub keywords: &'static [&'static str],
    pub classification: Classification,
}

/// Returned when no rule matches.
pub const DEFAULT_CLASSIFICATION: Classification = Classification {
    category_path: "Home & Garden",
    label: "المنزل والأدوات",
};

/// Built-in rule table.
pub const TAXONOMY: &[TaxonomyRule] = &[
    TaxonomyRule {
        keywords: &[
            "شعر", "شامبو", "بلسم", "زيت", "ماسك", "صبغة", "حلاقة", "فرد", "تمويج", "تصفيف",
            "مشط", "مبخرة",
        ],
        classification: Classification {
            category_path: "Health & Beauty > Personal Care > Hair Care",
            label: "العناية بالشعر",
        },
    },
    TaxonomyRule {
        keywords: &[
            "بشرة", "كريم", "سيروم", "واقي", "مرطب", "تفتيح", "صابون", "غسول", "مكياج", "روج",
            "شفاه", "قناع", "كولاجين", "فيلر", "بوتوكس",
        ],
        classification: Classification {
            category_path: "Health & Beauty > Personal Care > Cosmetics",
            label: "العناية بالجمال",
        },
    },
    TaxonomyRule {
        keywords: &[
            "جهاز", "ماكينة", "آلة", "كهربائي", "قابل للشحن", "شاحن", "سماعة", "كاميرا", "جوال",
            "تابلت", "ساعة", "ضغط", "مقياس", "مساج", "تدليك",
        ],
        classification: Classification {
            category_path: "Electronics",
            label: "الإلكترونيات",
        },
    },
    TaxonomyRule {
        keywords: &[
            "فيتامين", "مكمل", "كبسولات", "حبوب", "علاج", "مشد", "مصحح", "ركبة", "ظهر", "كاحل",
        ],
        classification: Classification {
            category_path: "Health & Beauty > Health Care",
            label: "الصحة والعافية",
        },
    },
    TaxonomyRule {
        keywords: &[
            "ملابس", "شورت", "قميص", "حقيبة", "نظارة", "حذاء", "جورب", "شماغ", "باندل", "عطر",
        ],
        classification: Classification {
            category_path: "Apparel & Accessories",
            label: "الأزياء والموضة",
        },
    },
];

/// Classify a title with the built-in table.
pub fn classify(title: &str) -> Classification {
    classify_with(TAXONOMY, DEFAULT_CLASSIFICATION, title)
}

/// Classify a title against an explicit rule table.
pub fn classify_with(
    rules: &[TaxonomyRule],
    fallback: Classification,
    title: &str,
) -> Classification {
    let title = title.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| title.contains(k)))
        .map_or(fallback, |rule| rule.classification)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn massage_device_is_electronics() {
        let c = classify("عرض جهاز تدليك كهربائي");
        assert_eq!(c.category_path, "Electronics");
        assert_eq!(c.label, "الإلكترونيات");
    }

    #[test]
    fn first_matching_rule_wins() {
        // "زيت" (hair) and "فيتامين" (health) both match; hair care comes first.
        let c = classify("زيت فيتامين للشعر");
        assert_eq!(c.category_path, "Health & Beauty > Personal Care > Hair Care");
    }

    #[test]
    fn unmatched_titles_fall_back() {
        assert_eq!(classify("طاولة خشبية"), DEFAULT_CLASSIFICATION);
        assert_eq!(classify(""), DEFAULT_CLASSIFICATION);
    }

    #[test]
    fn custom_tables_are_evaluated_in_order() {
        const A: Classification = Classification {
            category_path: "A",
            label: "a",
        };
        const B: Classification = Classification {
            category_path: "B",
            label: "b",
        };
        let rules = [
            TaxonomyRule {
                keywords: &["lamp"],
                classification: A,
            },
            TaxonomyRule {
                keywords: &["desk", "lamp"],
                classification: B,
            },
        ];
        assert_eq!(classify_with(&rules, DEFAULT_CLASSIFICATION, "Desk LAMP"), A);
        assert_eq!(classify_with(&rules, DEFAULT_CLASSIFICATION, "desk"), B);
    }
}
