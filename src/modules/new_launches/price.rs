//! Price range filtering over the free-text price column.

use std::sync::LazyLock;

use regex::Regex;

static PRICE_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?)\s*(?:(million|mil|billion|bn|k|m|b)\b)?")
        .expect("valid price regex")
});

/// First amount in a price label, e.g. `"From $1.2M"` is 1 200 000.
pub fn parse_price(text: &str) -> Option<f64> {
    let captures = PRICE_AMOUNT.captures(text)?;
    let amount: f64 = captures.get(1)?.as_str().replace(',', "").parse().ok()?;
    let multiplier = match captures
        .get(2)
        .map(|m| m.as_str().to_ascii_lowercase())
        .as_deref()
    {
        Some("k") => 1_000.0,
        Some("m" | "mil" | "million") => 1_000_000.0,
        Some("b" | "bn" | "billion") => 1_000_000_000.0,
        _ => 1.0,
    };
    Some(amount * multiplier)
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// Listings without a readable price never match a bounded range.
    pub fn matches(&self, price: Option<&str>) -> bool {
        if self.is_unbounded() {
            return true;
        }
        let Some(amount) = price.and_then(parse_price) else {
            return false;
        };
        self.min.is_none_or(|min| amount >= min) && self.max.is_none_or(|max| amount <= max)
    }
}
