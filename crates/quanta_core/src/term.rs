//! Single unit terms: a prefixed base symbol raised to a power.

use crate::error::{Result, UnitError};
use crate::tables::SymbolTables;
use serde::Serialize;
use std::fmt;

/// Longest abbreviated prefix (`da`), in characters.
const SHORT_PREFIX_MAX: usize = 2;
/// Longest spelled-out prefix (`hecto`, `micro`, ...), in characters.
const LONG_PREFIX_MAX: usize = 5;

/// One factor of a unit expression, e.g. `kg^2` is prefix `k`, base `g`, exponent 2.
///
/// Terms are immutable; operations that change the exponent return a new term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitTerm {
    prefix: String,
    base: String,
    exponent: f64,
    #[serde(skip)]
    scale: f64,
}

impl UnitTerm {
    /// The dimensionless term (empty prefix and base, exponent 1).
    pub fn dimensionless() -> Self {
        Self {
            prefix: String::new(),
            base: String::new(),
            exponent: 1.0,
            scale: 1.0,
        }
    }

    /// Parses a token such as `"kg^2"`, `"mm"` or `"Hz"`.
    pub fn parse(token: &str, tables: &SymbolTables) -> Result<Self> {
        let token = token.trim();
        let mut pieces = token.split('^');
        let letters = pieces.next().unwrap_or_default();

        let exponent = match (pieces.next(), pieces.next()) {
            (None, _) => 1.0,
            (Some(text), None) => parse_exponent(token, text)?,
            (Some(_), Some(_)) => {
                return Err(UnitError::malformed(
                    token,
                    "power symbol \"^\" may be used only once",
                ))
            }
        };

        if !letters.chars().all(is_unit_letter) {
            return Err(UnitError::malformed(
                token,
                "only letters may precede the power symbol \"^\"",
            ));
        }

        let (prefix, base) = split_prefix(letters, tables)
            .ok_or_else(|| UnitError::UnknownUnit(token.to_string()))?;
        let scale = tables
            .prefix_factor(prefix)
            .ok_or_else(|| UnitError::UnknownUnit(token.to_string()))?;

        Ok(Self {
            prefix: prefix.to_string(),
            base: base.to_string(),
            exponent: normalize(exponent),
            scale,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn exponent(&self) -> f64 {
        self.exponent
    }

    /// Multiplicative factor of the prefix alone.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn is_dimensionless(&self) -> bool {
        self.base.is_empty()
    }

    /// Same prefix and base with a different exponent.
    pub fn with_exponent(&self, exponent: f64) -> Self {
        Self {
            exponent: normalize(exponent),
            ..self.clone()
        }
    }

    /// Factor turning a value in `self` into a value in `to`'s prefix, at
    /// `self`'s exponent: `(self.scale / to.scale) ^ self.exponent`.
    pub fn conversion_factor(&self, to: &UnitTerm) -> f64 {
        pow_factor(self.scale / to.scale, self.exponent)
    }

    /// Prefix factor raised to the term's exponent.
    pub fn magnitude(&self) -> f64 {
        pow_factor(self.scale, self.exponent)
    }

    /// Canonical text, with an exponent of 1 omitted.
    pub fn unparsed(&self) -> String {
        if self.exponent == 1.0 {
            format!("{}{}", self.prefix, self.base)
        } else {
            format!("{}{}^{}", self.prefix, self.base, self.exponent)
        }
    }

    /// siunitx-compatible rendering, e.g. `kg^{2}`.
    pub fn latex(&self) -> String {
        if self.exponent == 1.0 {
            format!("{}{}", self.prefix, self.base)
        } else {
            format!("{}{}^{{{}}}", self.prefix, self.base, self.exponent)
        }
    }
}

impl fmt::Display for UnitTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.unparsed())
    }
}

fn is_unit_letter(c: char) -> bool {
    c.is_alphabetic() || c == '°'
}

fn parse_exponent(token: &str, text: &str) -> Result<f64> {
    let exponent: f64 = text.trim().parse().map_err(|_| {
        UnitError::malformed(token, "only numbers may follow the power symbol \"^\"")
    })?;
    if !exponent.is_finite() {
        return Err(UnitError::malformed(token, "exponent must be finite"));
    }
    Ok(exponent)
}

/// Folds `-0.0` into `0.0` so exponents print without a sign.
fn normalize(exponent: f64) -> f64 {
    if exponent == 0.0 {
        0.0
    } else {
        exponent
    }
}

/// Splits `letters` into a known prefix and a known unit.
///
/// Split points are tried shortest prefix first, up to the longest abbreviated
/// prefix for short tokens and the longest spelled-out prefix otherwise; the
/// first split where both halves are recognized wins.
pub fn split_prefix<'a>(letters: &'a str, tables: &SymbolTables) -> Option<(&'a str, &'a str)> {
    let char_count = letters.chars().count();
    let bound = if char_count < LONG_PREFIX_MAX {
        SHORT_PREFIX_MAX
    } else {
        LONG_PREFIX_MAX
    };

    letters
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(letters.len()))
        .take(bound + 1)
        .map(|offset| letters.split_at(offset))
        .find(|(prefix, base)| tables.prefix_factor(prefix).is_some() && tables.is_unit(base))
}

/// Raises a factor to an exponent, using integer powers when the exponent is integral.
pub(crate) fn pow_factor(factor: f64, exponent: f64) -> f64 {
    if exponent.fract() == 0.0 && exponent.abs() <= i32::MAX as f64 {
        factor.powi(exponent as i32)
    } else {
        factor.powf(exponent)
    }
}
