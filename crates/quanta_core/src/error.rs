//! Error types for unit parsing, conversion and quantity arithmetic.

use thiserror::Error;

/// Errors raised by the unit engine.
///
/// Every variant is reported at the call that triggers it; operands are
/// never modified by a failed operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    /// Unit token has a bad exponent or non-letter characters.
    #[error("Malformed unit \"{unit}\": {reason}")]
    MalformedUnit { unit: String, reason: String },

    /// No prefix/base split of the token is recognized.
    #[error("\"{0}\" cannot be parsed into a known prefix and unit")]
    UnknownUnit(String),

    /// Quantity values could not be coerced to numbers.
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Units reduce to different SI base dimensions.
    #[error("Cannot convert \"{from}\" to \"{to}\": dimensions do not match")]
    DimensionMismatch { from: String, to: String },

    /// Dimensions match but no transform exists (e.g. offset temperature scales).
    #[error("Unsupported conversion from \"{from}\" to \"{to}\"")]
    UnsupportedConversion { from: String, to: String },

    /// Operator requires a quantity operand.
    #[error("{operation} requires a quantity operand, got {found}")]
    TypeMismatch {
        operation: &'static str,
        found: String,
    },

    /// Value arrays cannot be broadcast together.
    #[error("Value shapes are not broadcast-compatible: {left} vs {right} elements")]
    ShapeMismatch { left: usize, right: usize },
}

impl UnitError {
    pub fn malformed(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedUnit {
            unit: unit.into(),
            reason: reason.into(),
        }
    }

    pub fn dimension_mismatch(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::DimensionMismatch {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn unsupported(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::UnsupportedConversion {
            from: from.into(),
            to: to.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, UnitError>;
