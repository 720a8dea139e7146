//! Price estimation rules for the public cost calculator.
//!
//! Quotes are computed per tonne of steel, scaled by fabrication complexity,
//! plus an optional per-tonne coating surcharge, with a minimum order price.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Pricing constants (RUB)
// ---------------------------------------------------------------------------

/// Base price per tonne.
pub const BASE_PRICE_PER_TONNE: f64 = 50_000.0;
/// Hot-dip zinc coating surcharge per tonne.
pub const ZINC_PRICE_PER_TONNE: f64 = 15_000.0;
/// Paint coating surcharge per tonne.
pub const PAINT_PRICE_PER_TONNE: f64 = 8_000.0;
/// Minimum quoted price.
pub const MINIMUM_PRICE: f64 = 50_000.0;
/// Currency code reported alongside every quote.
pub const CURRENCY: &str = "RUB";

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

/// Fabrication complexity. Unrecognized values fall back to `Medium`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Complexity {
    Simple,
    #[default]
    Medium,
    Complex,
}

impl Complexity {
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("simple") => Self::Simple,
            Some("complex") => Self::Complex,
            _ => Self::Medium,
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            Self::Simple => 1.0,
            Self::Medium => 1.2,
            Self::Complex => 1.5,
        }
    }
}

/// Surface coating. Unrecognized values fall back to `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coating {
    Zinc,
    Paint,
    #[default]
    None,
}

impl Coating {
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("zinc") => Self::Zinc,
            Some("paint") => Self::Paint,
            _ => Self::None,
        }
    }

    pub fn price_per_tonne(self) -> f64 {
        match self {
            Self::Zinc => ZINC_PRICE_PER_TONNE,
            Self::Paint => PAINT_PRICE_PER_TONNE,
            Self::None => 0.0,
        }
    }
}

/// Raw calculator request. `product_type` is accepted but does not affect the
/// quote.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub weight: Option<f64>,
    pub complexity: Option<String>,
    pub coating: Option<String>,
    pub product_type: Option<String>,
}

/// A computed quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceQuote {
    pub price: u64,
    pub currency: &'static str,
}

// ---------------------------------------------------------------------------
// Estimation logic
// ---------------------------------------------------------------------------

/// Compute a quote in whole currency units.
///
/// `weight` is in tonnes and must be a finite number greater than zero.
pub fn estimate_price(
    weight: Option<f64>,
    complexity: Complexity,
    coating: Coating,
) -> Result<PriceQuote, CoreError> {
    let weight = match weight {
        Some(w) if w.is_finite() && w > 0.0 => w,
        _ => {
            return Err(CoreError::InvalidInput(
                "weight must be a number greater than zero".to_string(),
            ))
        }
    };

    let mut total = weight * BASE_PRICE_PER_TONNE * complexity.multiplier();
    total += weight * coating.price_per_tonne();
    let total = total.max(MINIMUM_PRICE);

    Ok(PriceQuote {
        price: total.round() as u64,
        currency: CURRENCY,
    })
}

/// Parse a raw calculator request and compute its quote.
pub fn estimate_request(request: &EstimateRequest) -> Result<PriceQuote, CoreError> {
    estimate_price(
        request.weight,
        Complexity::parse_lenient(request.complexity.as_deref()),
        Coating::parse_lenient(request.coating.as_deref()),
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn medium_zinc_two_tonnes() {
        let quote = estimate_price(Some(2.0), Complexity::Medium, Coating::Zinc).unwrap();
        assert_eq!(quote.price, 150_000);
        assert_eq!(quote.currency, "RUB");
    }

    #[test]
    fn small_order_clamps_to_minimum() {
        let quote = estimate_price(Some(0.1), Complexity::Simple, Coating::None).unwrap();
        assert_eq!(quote.price, 50_000);
    }

    #[test]
    fn complex_paint() {
        // 3 * 50000 * 1.5 + 3 * 8000 = 225000 + 24000
        let quote = estimate_price(Some(3.0), Complexity::Complex, Coating::Paint).unwrap();
        assert_eq!(quote.price, 249_000);
    }

    #[test]
    fn result_is_rounded() {
        // (1 + 2^-16) * 50000 = 50000.762939453125 -> 50001
        let quote =
            estimate_price(Some(1.000_015_258_789_062_5), Complexity::Simple, Coating::None)
                .unwrap();
        assert_eq!(quote.price, 50_001);
    }

    #[test]
    fn zero_or_negative_weight_rejected() {
        assert_matches!(
            estimate_price(Some(0.0), Complexity::Medium, Coating::None),
            Err(CoreError::InvalidInput(_))
        );
        assert_matches!(
            estimate_price(Some(-1.0), Complexity::Medium, Coating::None),
            Err(CoreError::InvalidInput(_))
        );
    }

    #[test]
    fn missing_or_nan_weight_rejected() {
        assert_matches!(
            estimate_price(None, Complexity::Medium, Coating::None),
            Err(CoreError::InvalidInput(_))
        );
        assert_matches!(
            estimate_price(Some(f64::NAN), Complexity::Medium, Coating::None),
            Err(CoreError::InvalidInput(_))
        );
    }

    #[test]
    fn unrecognized_options_use_defaults() {
        assert_eq!(Complexity::parse_lenient(Some("extreme")), Complexity::Medium);
        assert_eq!(Complexity::parse_lenient(None), Complexity::Medium);
        assert_eq!(Coating::parse_lenient(Some("chrome")), Coating::None);
        assert_eq!(Coating::parse_lenient(None), Coating::None);
    }

    #[test]
    fn request_with_unknown_complexity_prices_as_medium() {
        let request = EstimateRequest {
            weight: Some(2.0),
            complexity: Some("unknown".into()),
            coating: Some("zinc".into()),
            product_type: Some("beams".into()),
        };
        assert_eq!(estimate_request(&request).unwrap().price, 150_000);
    }
}
