//! Static unit catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Physical quantity a unit measures. Units only convert within a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitCategory {
    /// Base unit: meter.
    Length,
    /// Base unit: kilogram.
    Mass,
    /// Base unit: liter.
    Volume,
}

impl UnitCategory {
    /// Code of the SI base unit every scale factor is relative to.
    pub fn base_unit(&self) -> &'static str {
        match self {
            UnitCategory::Length => "m",
            UnitCategory::Mass => "kg",
            UnitCategory::Volume => "l",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UnitCategory::Length => "length",
            UnitCategory::Mass => "mass",
            UnitCategory::Volume => "volume",
        }
    }

    pub fn all() -> &'static [UnitCategory] {
        &[UnitCategory::Length, UnitCategory::Mass, UnitCategory::Volume]
    }
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One catalog row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitDef {
    /// Lowercase unit code.
    pub code: &'static str,
    pub category: UnitCategory,
    /// Multiplier taking 1 of this unit to the category base unit.
    pub scale_to_base: f64,
}

const fn unit(code: &'static str, category: UnitCategory, scale_to_base: f64) -> UnitDef {
    UnitDef {
        code,
        category,
        scale_to_base,
    }
}

static STANDARD_UNITS: &[UnitDef] = &[
    // Length, base m
    unit("mm", UnitCategory::Length, 0.001),
    unit("cm", UnitCategory::Length, 0.01),
    unit("m", UnitCategory::Length, 1.0),
    unit("km", UnitCategory::Length, 1000.0),
    unit("in", UnitCategory::Length, 0.0254),
    unit("ft", UnitCategory::Length, 0.3048),
    unit("yd", UnitCategory::Length, 0.9144),
    unit("mi", UnitCategory::Length, 1609.34),
    // Mass, base kg
    unit("mg", UnitCategory::Mass, 0.000001),
    unit("g", UnitCategory::Mass, 0.001),
    unit("kg", UnitCategory::Mass, 1.0),
    unit("t", UnitCategory::Mass, 1000.0),
    unit("oz", UnitCategory::Mass, 0.0283495),
    unit("lb", UnitCategory::Mass, 0.453592),
    // Volume, base l
    unit("ml", UnitCategory::Volume, 0.001),
    unit("l", UnitCategory::Volume, 1.0),
    unit("m3", UnitCategory::Volume, 1000.0),
    unit("gal", UnitCategory::Volume, 3.78541),
];

/// Immutable unit lookup table. Lookups are case-insensitive.
#[derive(Debug, Clone, Copy)]
pub struct UnitCatalog {
    units: &'static [UnitDef],
}

impl UnitCatalog {
    /// The built-in catalog.
    pub const fn standard() -> Self {
        Self {
            units: STANDARD_UNITS,
        }
    }

    /// Catalog over a custom static table.
    pub const fn from_static(units: &'static [UnitDef]) -> Self {
        Self { units }
    }

    /// Find a unit definition.
    pub fn lookup(&self, unit: &str) -> Option<&'static UnitDef> {
        let code = unit.to_lowercase();
        let units: &'static [UnitDef] = self.units;
        units.iter().find(|def| def.code == code)
    }

    /// Category of a unit, or `None` if the token is not a known unit.
    pub fn category_of(&self, unit: &str) -> Option<UnitCategory> {
        self.lookup(unit).map(|def| def.category)
    }

    /// Scale factor of a unit within a category.
    ///
    /// Returns `None` if the unit is unknown or belongs to another category.
    pub fn scale_factor(&self, category: UnitCategory, unit: &str) -> Option<f64> {
        self.lookup(unit)
            .filter(|def| def.category == category)
            .map(|def| def.scale_to_base)
    }

    /// Unit codes of a category, in catalog order.
    pub fn units_in(&self, category: UnitCategory) -> impl Iterator<Item = &'static str> {
        let units: &'static [UnitDef] = self.units;
        units
            .iter()
            .filter(move |def| def.category == category)
            .map(|def| def.code)
    }

    /// All definitions.
    pub fn iter(&self) -> impl Iterator<Item = &'static UnitDef> {
        let units: &'static [UnitDef] = self.units;
        units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl Default for UnitCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
