//! Unit conversion within a single category.

use convrelay_common::is_currency_pair;
use tracing::{debug, error, warn};

use crate::catalog::UnitCatalog;

/// Converts amounts between units of the same category.
///
/// Every failure is reported as `None`: tokens that are not units are the
/// normal path for currency requests, so the caller decides what absence
/// means.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnitConverter {
    catalog: UnitCatalog,
}

impl UnitConverter {
    /// Create a converter over the given catalog.
    pub fn new(catalog: UnitCatalog) -> Self {
        Self { catalog }
    }

    /// Get the catalog.
    pub fn catalog(&self) -> &UnitCatalog {
        &self.catalog
    }

    /// Convert `amount` from one unit to another.
    ///
    /// The result is `amount * scale(from) / scale(to)` at full `f64`
    /// precision. Units with equal scale return `amount` unchanged, and a
    /// result that overflows to infinity is rejected.
    pub fn convert(&self, amount: f64, from: &str, to: &str) -> Option<f64> {
        let (Some(from_category), Some(to_category)) =
            (self.catalog.category_of(from), self.catalog.category_of(to))
        else {
            debug!(from, to, "Not a unit pair");
            return None;
        };

        if from_category != to_category {
            // Tokens like "gal"/"lbs" are probably a currency pair, stay quiet.
            if !is_currency_pair(from, to) {
                warn!(
                    from,
                    to,
                    from_category = %from_category,
                    to_category = %to_category,
                    "Cannot convert between unit categories"
                );
            }
            return None;
        }

        let factor_from = self.catalog.scale_factor(from_category, from)?;
        let factor_to = self.catalog.scale_factor(to_category, to)?;

        if factor_from == factor_to {
            return Some(amount);
        }

        if factor_to == 0.0 {
            error!(to, category = %to_category, "Target unit has zero scale factor");
            return None;
        }

        let value = amount * factor_from / factor_to;
        if !value.is_finite() {
            error!(amount, from, to, "Unit conversion overflowed");
            return None;
        }
        Some(value)
    }

    /// Check whether both tokens are known units of the same category.
    pub fn is_convertible(&self, from: &str, to: &str) -> bool {
        match (self.catalog.category_of(from), self.catalog.category_of(to)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{UnitCategory, UnitDef};
    use proptest::prelude::*;

    fn converter() -> UnitConverter {
        UnitConverter::default()
    }

    fn approx_eq(a: f64, b: f64, rel: f64) -> bool {
        (a - b).abs() <= rel * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn test_basic_conversions() {
        let c = converter();

        assert_eq!(c.convert(5.0, "km", "m"), Some(5000.0));
        assert_eq!(c.convert(2.5, "l", "ml"), Some(2500.0));
        assert!(approx_eq(c.convert(10.0, "kg", "lb").unwrap(), 22.046_244, 1e-6));
    }

    #[test]
    fn test_meters_to_yards() {
        let result = converter().convert(7.32, "m", "yd").unwrap();

        assert!((result - 7.32 / 0.9144).abs() < 1e-12);
        assert!((result - 8.0052).abs() < 1e-3);
    }

    #[test]
    fn test_identity_is_exact() {
        let c = converter();

        for def in c.catalog().iter() {
            assert_eq!(c.convert(123.456, def.code, def.code), Some(123.456), "{}", def.code);
        }
    }

    #[test]
    fn test_identity_is_exact_for_awkward_amounts() {
        let c = converter();

        for def in c.catalog().iter() {
            for x in [0.1, 7.32, 1e-7, 3.0, -42.75] {
                assert_eq!(c.convert(x, def.code, def.code), Some(x), "{} {}", x, def.code);
            }
        }
        assert_eq!(c.convert(3.0, "in", "IN"), Some(3.0));
    }

    #[test]
    fn test_overflow_rejected() {
        let c = converter();

        assert_eq!(c.convert(1e308, "km", "mm"), None);
        assert_eq!(c.convert(f64::MAX, "t", "mg"), None);
        assert_eq!(c.convert(1e300, "km", "mm"), Some(1e300 * 1000.0 / 0.001));
    }

    #[test]
    fn test_category_mismatch_rejected() {
        assert_eq!(converter().convert(1.0, "kg", "m"), None);
        assert_eq!(converter().convert(1.0, "gal", "lb"), None);
    }

    #[test]
    fn test_unknown_unit_rejected() {
        assert_eq!(converter().convert(1.0, "km", "xyz"), None);
        assert_eq!(converter().convert(1.0, "USD", "UAH"), None);
    }

    #[test]
    fn test_case_insensitive_tokens() {
        assert_eq!(converter().convert(1.0, "KM", "M"), Some(1000.0));
    }

    #[test]
    fn test_zero_target_scale_guarded() {
        static BROKEN: &[UnitDef] = &[
            UnitDef {
                code: "a",
                category: UnitCategory::Length,
                scale_to_base: 1.0,
            },
            UnitDef {
                code: "z",
                category: UnitCategory::Length,
                scale_to_base: 0.0,
            },
        ];
        let c = UnitConverter::new(UnitCatalog::from_static(BROKEN));

        assert_eq!(c.convert(1.0, "a", "z"), None);
        assert_eq!(c.convert(1.0, "z", "a"), Some(0.0));
    }

    #[test]
    fn test_is_convertible() {
        let c = converter();

        assert!(c.is_convertible("ft", "mi"));
        assert!(!c.is_convertible("ft", "kg"));
        assert!(!c.is_convertible("ft", "eur"));
    }

    proptest! {
        #[test]
        fn prop_round_trip_within_category(x in -1.0e9f64..1.0e9f64) {
            let c = converter();
            for category in UnitCategory::all() {
                let units: Vec<_> = c.catalog().units_in(*category).collect();
                for from in &units {
                    for to in &units {
                        let there = c.convert(x, from, to).unwrap();
                        let back = c.convert(there, to, from).unwrap();
                        prop_assert!(
                            approx_eq(back, x, 1e-9),
                            "{} -> {} -> {}: {} vs {}", from, to, from, back, x
                        );
                    }
                }
            }
        }
    }
}
