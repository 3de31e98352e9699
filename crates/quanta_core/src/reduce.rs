//! Base reduction and simplification of unit expressions.
//!
//! Both passes return a new expression together with the factor that values
//! must be multiplied by to stay equal in the new units.

use crate::error::{Result, UnitError};
use crate::expression::UnitExpression;
use crate::tables::SymbolTables;
use crate::term::{pow_factor, UnitTerm};

/// Deepest chain of derived-unit decompositions followed during reduction.
const MAX_DECOMPOSITION_DEPTH: usize = 16;

/// Rewrites every term in SI base units.
///
/// Decompositions are followed until only base units remain, so a table may
/// define units in terms of other derived or prefixed units. Terms are
/// expanded but not merged, so a base symbol may appear more than once in the
/// result.
pub fn reduce_to_base(
    expr: &UnitExpression,
    tables: &SymbolTables,
) -> Result<(UnitExpression, f64)> {
    let mut terms = Vec::new();
    let factor = expand_terms(expr, tables, 0, &mut terms)?;
    Ok((UnitExpression::from_terms(terms), factor))
}

fn expand_terms(
    expr: &UnitExpression,
    tables: &SymbolTables,
    depth: usize,
    out: &mut Vec<UnitTerm>,
) -> Result<f64> {
    let mut factor = 1.0;
    for term in expr.terms() {
        factor *= expand_term(term, tables, depth, out)?;
    }
    Ok(factor)
}

/// Appends the base terms of `term` to `out` and returns the factor taking a
/// value in `term` to a value in those terms.
fn expand_term(
    term: &UnitTerm,
    tables: &SymbolTables,
    depth: usize,
    out: &mut Vec<UnitTerm>,
) -> Result<f64> {
    if depth > MAX_DECOMPOSITION_DEPTH {
        return Err(UnitError::malformed(
            term.base(),
            "unit decompositions nest too deeply",
        ));
    }

    let exponent = term.exponent();
    let decomposition = tables
        .decomposition(term.base())
        .ok_or_else(|| UnitError::UnknownUnit(term.base().to_string()))?;
    let (literal, rest) = split_scale_literal(decomposition)?;
    let expansion = UnitExpression::parse(rest, tables)?;

    // The decomposition describes the unit at its reference prefix.
    let reference = tables.reference_factor(term.base());
    let mut factor =
        pow_factor(term.scale() / reference, exponent) * pow_factor(literal, exponent);

    let mut nested = Vec::new();
    if is_base_unit(term.base(), &expansion) {
        nested.extend(expansion.terms().iter().cloned());
    } else {
        let nested_factor = expand_terms(&expansion, tables, depth + 1, &mut nested)?;
        factor *= pow_factor(nested_factor, exponent);
    }

    out.extend(
        nested
            .iter()
            .map(|sub| sub.with_exponent(sub.exponent() * exponent)),
    );
    Ok(factor)
}

/// Whether `symbol` decomposes to itself, making it one of the base units.
pub(crate) fn is_base_unit(symbol: &str, expansion: &UnitExpression) -> bool {
    matches!(expansion.terms(), [only] if only.base() == symbol && only.exponent() == 1.0)
}

/// Merges terms that share a base symbol.
///
/// The first prefix seen for a base is kept; later terms are rescaled to it.
/// Bases whose exponents cancel are dropped. Output keeps first-seen order.
pub fn simplify(expr: &UnitExpression) -> (UnitExpression, f64) {
    let mut kept: Vec<UnitTerm> = Vec::new();
    let mut factor = 1.0;

    for term in expr.terms() {
        if term.is_dimensionless() || term.exponent() == 0.0 {
            continue;
        }
        match kept.iter().position(|k| k.base() == term.base()) {
            Some(index) => {
                factor *= term.conversion_factor(&kept[index]);
                let exponent = kept[index].exponent() + term.exponent();
                if exponent == 0.0 {
                    kept.remove(index);
                } else {
                    kept[index] = kept[index].with_exponent(exponent);
                }
            }
            None => kept.push(term.clone()),
        }
    }

    if kept.is_empty() {
        (UnitExpression::dimensionless(), factor)
    } else {
        (UnitExpression::from_terms(kept), factor)
    }
}

/// [`reduce_to_base`] followed by [`simplify`], with both factors combined.
pub fn simplify_to_base(
    expr: &UnitExpression,
    tables: &SymbolTables,
) -> Result<(UnitExpression, f64)> {
    let (reduced, reduce_factor) = reduce_to_base(expr, tables)?;
    let (merged, merge_factor) = simplify(&reduced);
    Ok((merged, reduce_factor * merge_factor))
}

/// Splits a leading numeric literal off a decomposition string.
///
/// `"1000*kg"` gives `(1000.0, "kg")`, `"60/s"` gives `(60.0, "/s")` and a
/// decomposition without a literal gives `(1.0, decomposition)`.
pub fn split_scale_literal(decomposition: &str) -> Result<(f64, &str)> {
    let trimmed = decomposition.trim_start();
    let starts_numeric = trimmed
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '.');
    if !starts_numeric {
        return Ok((1.0, decomposition));
    }

    let (head, rest) = match trimmed.find(|c: char| c == '*' || c == '/') {
        Some(index) if trimmed[index..].starts_with('*') => {
            (&trimmed[..index], &trimmed[index + 1..])
        }
        Some(index) => (&trimmed[..index], &trimmed[index..]),
        None => (trimmed, ""),
    };
    let literal: f64 = head.trim().parse().map_err(|_| {
        UnitError::malformed(decomposition, "leading scale literal is not a number")
    })?;
    Ok((literal, rest))
}
