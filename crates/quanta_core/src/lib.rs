//! The `quanta_core` crate provides the dimensional-analysis engine for Quanta.
//! Quantities carry a value (or vector of values) and a compound unit such as
//! `kg*m/s^2`; the engine parses units, reduces them to SI base form, converts
//! between equivalent units and enforces dimensional consistency in arithmetic.
//!
//! Key components:
//! - **Tables**: `SymbolTables` (prefixes, units, SI decompositions), loaded once and shared.
//! - **Terms & Expressions**: `UnitTerm` (`kg^2`) and `UnitExpression` (`kg*m/s^2`) parsing and rendering.
//! - **Reduce**: base reduction and simplification, each returning a scale factor.
//! - **Convert**: `Transform` planning, linear for ordinary units and affine for temperature scales.
//! - **Quantity**: value-plus-units arithmetic, comparison and formatting.

pub mod convert;
pub mod error;
pub mod expression;
pub mod quantity;
pub mod reduce;
pub mod tables;
pub mod term;
pub mod values;

pub use error::{Result, UnitError};
pub use expression::UnitExpression;
pub use quantity::Quantity;
pub use tables::SymbolTables;
pub use term::UnitTerm;
pub use values::Values;
