//! Compound unit expressions such as `kg*m/s^2`.

use crate::error::Result;
use crate::tables::SymbolTables;
use crate::term::UnitTerm;
use serde::Serialize;
use std::fmt;

/// An ordered product of unit terms.
///
/// Order is kept for display only; [`UnitExpression::dimension`] is the
/// order-independent signature used for equivalence checks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitExpression {
    terms: Vec<UnitTerm>,
}

impl UnitExpression {
    /// Parses `group ('/' group)*` where each group is `term ('*' term)*`.
    ///
    /// Group signs alternate (`a/b/c` is `a * b^-1 * c`). A leading `/` leaves
    /// the numerator empty, so `/s` is `s^-1`.
    pub fn parse(text: &str, tables: &SymbolTables) -> Result<Self> {
        let groups: Vec<&str> = text.split('/').collect();
        let mut terms = Vec::new();

        for (index, group) in groups.iter().enumerate() {
            if index == 0 && groups.len() > 1 && group.trim().is_empty() {
                continue;
            }
            let sign = if index % 2 == 0 { 1.0 } else { -1.0 };
            for token in group.split('*') {
                let term = UnitTerm::parse(token, tables)?;
                let exponent = term.exponent() * sign;
                terms.push(term.with_exponent(exponent));
            }
        }

        Ok(Self { terms })
    }

    pub fn from_terms(terms: Vec<UnitTerm>) -> Self {
        Self { terms }
    }

    /// The expression holding only the dimensionless term.
    pub fn dimensionless() -> Self {
        Self {
            terms: vec![UnitTerm::dimensionless()],
        }
    }

    pub fn terms(&self) -> &[UnitTerm] {
        &self.terms
    }

    /// Terms of `self` followed by the terms of `other`, unmerged.
    pub fn concat(&self, other: &UnitExpression) -> Self {
        let mut terms = self.terms.clone();
        terms.extend(other.terms.iter().cloned());
        Self { terms }
    }

    /// Every exponent negated.
    pub fn inverse(&self) -> Self {
        self.powf(-1.0)
    }

    /// Every exponent multiplied by `power`. Terms whose exponent becomes 0
    /// are dropped.
    pub fn powf(&self, power: f64) -> Self {
        let terms: Vec<UnitTerm> = self
            .terms
            .iter()
            .filter_map(|term| {
                if term.is_dimensionless() {
                    return Some(term.clone());
                }
                let exponent = term.exponent() * power;
                (exponent != 0.0).then(|| term.with_exponent(exponent))
            })
            .collect();

        if terms.is_empty() {
            Self::dimensionless()
        } else {
            Self { terms }
        }
    }

    /// Product of every term's prefix factor raised to its exponent.
    pub fn magnitude(&self) -> f64 {
        self.terms.iter().map(UnitTerm::magnitude).product()
    }

    /// Prefix-free `(base, exponent)` pairs, sorted, dimensionless terms dropped.
    ///
    /// Two expressions with equal signatures have the same terms up to order
    /// and prefixes.
    pub fn dimension(&self) -> Vec<(String, f64)> {
        let mut signature: Vec<(String, f64)> = self
            .terms
            .iter()
            .filter(|term| !term.is_dimensionless())
            .map(|term| (term.base().to_string(), term.exponent()))
            .collect();
        signature.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
        signature
    }

    pub fn same_dimension(&self, other: &UnitExpression) -> bool {
        self.dimension() == other.dimension()
    }

    /// Canonical text: non-negative powers joined by `*`, then `/` and the
    /// negative powers with their sign flipped.
    pub fn unparse(&self) -> String {
        let mut numerator = Vec::new();
        let mut denominator = Vec::new();

        for term in self.terms.iter().filter(|term| !term.is_dimensionless()) {
            if term.exponent() >= 0.0 {
                numerator.push(term.unparsed());
            } else {
                denominator.push(term.with_exponent(-term.exponent()).unparsed());
            }
        }

        match (numerator.is_empty(), denominator.is_empty()) {
            (_, true) => numerator.join("*"),
            (true, false) => format!("/{}", denominator.join("*")),
            (false, false) => format!("{}/{}", numerator.join("*"), denominator.join("*")),
        }
    }

    /// siunitx-style rendering with signed exponents joined by `.`.
    pub fn latex(&self) -> String {
        self.terms
            .iter()
            .filter(|term| !term.is_dimensionless())
            .map(UnitTerm::latex)
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for UnitExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.unparse())
    }
}
