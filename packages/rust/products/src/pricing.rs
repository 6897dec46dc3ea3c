//! Price arithmetic and formatting.

/// Derived price figures for one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pricing {
    pub price: f64,
    pub sale_price: f64,
    /// `price - sale_price`, never negative.
    pub discount: f64,
    /// Rounded discount percentage in `[0, 100]`.
    pub discount_percent: u32,
}

impl Pricing {
    pub fn new(price: f64, sale_price: f64) -> Self {
        let discount = if price.is_finite() && sale_price.is_finite() {
            (price - sale_price).max(0.0)
        } else {
            0.0
        };

        let discount_percent = if price > 0.0 && price.is_finite() {
            (discount / price * 100.0).round().clamp(0.0, 100.0) as u32
        } else {
            0
        };

        Self {
            price,
            sale_price,
            discount,
            discount_percent,
        }
    }

    pub fn has_discount(&self) -> bool {
        self.discount > 0.0
    }
}

/// Human display: integers without decimals, everything else with two.
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value:.2}")
    }
}

/// Feed format: fixed two decimals followed by the currency code.
pub fn format_money(value: f64, currency: &str) -> String {
    format!("{value:.2} {currency}")
}
