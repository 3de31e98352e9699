//! Numeric payload of a quantity: a scalar or a vector of readings.

use crate::error::{Result, UnitError};
use nalgebra::DVector;
use num_traits::ToPrimitive;
use std::fmt;
use std::str::FromStr;

/// One or more floating-point values sharing a unit.
///
/// Binary operations broadcast a scalar against an array; two arrays must
/// have the same length.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Scalar(f64),
    Array(DVector<f64>),
}

impl Values {
    /// Coerces a sequence of primitive numbers.
    pub fn from_numbers<T: ToPrimitive>(items: &[T]) -> Result<Self> {
        if items.is_empty() {
            return Err(UnitError::InvalidValue(
                "at least one value is required".to_string(),
            ));
        }
        let converted = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.to_f64().ok_or_else(|| {
                    UnitError::InvalidValue(format!("element {i} is not representable as f64"))
                })
            })
            .collect::<Result<Vec<f64>>>()?;
        Ok(Values::Array(DVector::from_vec(converted)))
    }

    pub fn len(&self) -> usize {
        match self {
            Values::Scalar(_) => 1,
            Values::Array(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Values::Scalar(_))
    }

    pub fn as_slice(&self) -> &[f64] {
        match self {
            Values::Scalar(value) => std::slice::from_ref(value),
            Values::Array(values) => values.as_slice(),
        }
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.as_slice().to_vec()
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        match self {
            Values::Scalar(value) => Values::Scalar(f(*value)),
            Values::Array(values) => Values::Array(values.map(f)),
        }
    }

    pub fn scale(&self, factor: f64) -> Self {
        self.map(|x| x * factor)
    }

    /// Elementwise combination with broadcasting.
    pub fn zip_with(&self, other: &Values, f: impl Fn(f64, f64) -> f64) -> Result<Self> {
        match (self, other) {
            (Values::Scalar(a), Values::Scalar(b)) => Ok(Values::Scalar(f(*a, *b))),
            (Values::Scalar(a), Values::Array(b)) => Ok(Values::Array(b.map(|y| f(*a, y)))),
            (Values::Array(a), Values::Scalar(b)) => Ok(Values::Array(a.map(|x| f(x, *b)))),
            (Values::Array(a), Values::Array(b)) => {
                if a.len() != b.len() {
                    return Err(UnitError::ShapeMismatch {
                        left: a.len(),
                        right: b.len(),
                    });
                }
                Ok(Values::Array(a.zip_map(b, f)))
            }
        }
    }

    /// Whether `pred` holds for every broadcast pair.
    pub fn all_pairs(&self, other: &Values, pred: impl Fn(f64, f64) -> bool) -> Result<bool> {
        let flags = self.zip_with(other, |a, b| if pred(a, b) { 1.0 } else { 0.0 })?;
        Ok(flags.as_slice().iter().all(|&flag| flag == 1.0))
    }
}

impl From<f64> for Values {
    fn from(value: f64) -> Self {
        Values::Scalar(value)
    }
}

impl From<i32> for Values {
    fn from(value: i32) -> Self {
        Values::Scalar(value as f64)
    }
}

impl From<Vec<f64>> for Values {
    fn from(values: Vec<f64>) -> Self {
        Values::Array(DVector::from_vec(values))
    }
}

impl From<&[f64]> for Values {
    fn from(values: &[f64]) -> Self {
        Values::Array(DVector::from_column_slice(values))
    }
}

impl From<DVector<f64>> for Values {
    fn from(values: DVector<f64>) -> Self {
        Values::Array(values)
    }
}

impl FromStr for Values {
    type Err = UnitError;

    /// Accepts a number (`2.5`) or a bracketed list (`[1, 2, 3]`).
    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        if let Some(inner) = text.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            let items = inner
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(|item| {
                    item.parse::<f64>().map_err(|_| {
                        UnitError::InvalidValue(format!("\"{item}\" is not a number"))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            return Values::from_numbers(&items);
        }
        text.parse::<f64>()
            .map(Values::Scalar)
            .map_err(|_| UnitError::InvalidValue(format!("\"{text}\" is not a number")))
    }
}

impl fmt::Display for Values {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Values::Scalar(value) => write!(f, "{value}"),
            Values::Array(values) => {
                let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", items.join(", "))
            }
        }
    }
}
