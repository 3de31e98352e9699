//! Conversion between dimensionally equivalent unit expressions.
//!
//! A conversion is planned once into a [`Transform`]: a plain factor for
//! ordinary units, or an affine map when both sides are temperature scales.

use crate::error::{Result, UnitError};
use crate::expression::UnitExpression;
use crate::reduce::simplify_to_base;
use crate::tables::SymbolTables;
use serde::{Deserialize, Serialize};

/// Temperature scales with an affine relation to kelvin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureScale {
    Kelvin,
    Celsius,
    Fahrenheit,
}

impl TemperatureScale {
    /// Size of one degree in kelvin.
    pub fn kelvin_ratio(self) -> f64 {
        match self {
            TemperatureScale::Kelvin | TemperatureScale::Celsius => 1.0,
            TemperatureScale::Fahrenheit => 5.0 / 9.0,
        }
    }

    /// Offset added before scaling: `kelvin = ratio * (reading + offset)`.
    pub fn kelvin_offset(self) -> f64 {
        match self {
            TemperatureScale::Kelvin => 0.0,
            TemperatureScale::Celsius => 273.15,
            TemperatureScale::Fahrenheit => 459.67,
        }
    }

    /// Whether zero on this scale is absolute zero.
    pub fn is_absolute(self) -> bool {
        self.kelvin_offset() == 0.0
    }
}

/// How values change under a conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Transform {
    /// `y = factor * x`
    Linear(f64),
    /// `y = scale * x + offset`
    Affine { scale: f64, offset: f64 },
}

impl Transform {
    pub fn apply(&self, x: f64) -> f64 {
        match *self {
            Transform::Linear(factor) => factor * x,
            Transform::Affine { scale, offset } => scale * x + offset,
        }
    }

    pub fn is_identity(&self) -> bool {
        match *self {
            Transform::Linear(factor) => factor == 1.0,
            Transform::Affine { scale, offset } => scale == 1.0 && offset == 0.0,
        }
    }
}

/// The temperature scale and prefix factor of `expr`, if it is a single
/// temperature term raised to the first power.
pub fn temperature_of(
    expr: &UnitExpression,
    tables: &SymbolTables,
) -> Option<(TemperatureScale, f64)> {
    match expr.terms() {
        [term] if term.exponent() == 1.0 => tables
            .temperature_scale(term.base())
            .map(|scale| (scale, term.scale())),
        _ => None,
    }
}

/// Works out the transform taking values in `from` to values in `to`.
pub fn plan_conversion(
    from: &UnitExpression,
    to: &UnitExpression,
    tables: &SymbolTables,
) -> Result<Transform> {
    if from.same_dimension(to) {
        let factor = from.magnitude() / to.magnitude();
        tracing::debug!("Converting \"{}\" to \"{}\" by prefix factor {}", from, to, factor);
        return Ok(Transform::Linear(factor));
    }

    let (from_base, from_factor) = simplify_to_base(from, tables)?;
    let (to_base, to_factor) = simplify_to_base(to, tables)?;
    if !from_base.same_dimension(&to_base) {
        return Err(UnitError::dimension_mismatch(from.unparse(), to.unparse()));
    }

    match (temperature_of(from, tables), temperature_of(to, tables)) {
        (Some(source), Some(target)) => {
            let transform = affine_temperature(source, target);
            tracing::debug!("Converting \"{}\" to \"{}\" as {:?}", from, to, transform);
            Ok(transform)
        }
        (Some((scale, _)), None) | (None, Some((scale, _))) if !scale.is_absolute() => {
            Err(UnitError::unsupported(from.unparse(), to.unparse()))
        }
        _ => {
            let factor = from_factor / to_factor;
            tracing::debug!("Converting \"{}\" to \"{}\" by base factor {}", from, to, factor);
            Ok(Transform::Linear(factor))
        }
    }
}

/// Maps a (prefixed) reading on one scale to a (prefixed) reading on another
/// through kelvin.
fn affine_temperature(
    source: (TemperatureScale, f64),
    target: (TemperatureScale, f64),
) -> Transform {
    let (src, src_prefix) = source;
    let (dst, dst_prefix) = target;
    if src == dst && src_prefix == dst_prefix {
        return Transform::Linear(1.0);
    }

    let ratio = src.kelvin_ratio() / dst.kelvin_ratio();
    Transform::Affine {
        scale: ratio * src_prefix / dst_prefix,
        offset: (ratio * src.kelvin_offset() - dst.kelvin_offset()) / dst_prefix,
    }
}
