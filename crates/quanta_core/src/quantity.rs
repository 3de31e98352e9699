//! Quantities: values tagged with a unit expression.
//!
//! Quantities are values. Every operation returns a new quantity and leaves
//! both operands untouched, including when it fails.

use crate::convert::plan_conversion;
use crate::error::{Result, UnitError};
use crate::expression::UnitExpression;
use crate::reduce::{reduce_to_base, simplify, simplify_to_base};
use crate::tables::SymbolTables;
use crate::values::Values;
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};
use std::str::FromStr;
use std::sync::Arc;

/// Relative tolerance used by `==` after converting the right operand.
pub const EQ_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone)]
pub struct Quantity {
    values: Values,
    units: UnitExpression,
    tables: Arc<SymbolTables>,
}

impl Quantity {
    /// Builds a quantity against the shared SI tables.
    pub fn new(values: impl Into<Values>, units: &str) -> Result<Self> {
        Self::with_tables(values, units, SymbolTables::si())
    }

    pub fn with_tables(
        values: impl Into<Values>,
        units: &str,
        tables: Arc<SymbolTables>,
    ) -> Result<Self> {
        let values = values.into();
        if values.is_empty() {
            return Err(UnitError::InvalidValue(
                "at least one value is required".to_string(),
            ));
        }
        let units = UnitExpression::parse(units, &tables)?;
        Ok(Self {
            values,
            units,
            tables,
        })
    }

    /// A dimensionless scalar.
    pub fn dimensionless(value: f64) -> Self {
        Self {
            values: Values::Scalar(value),
            units: UnitExpression::dimensionless(),
            tables: SymbolTables::si(),
        }
    }

    fn derive(&self, values: Values, units: UnitExpression) -> Self {
        Self {
            values,
            units,
            tables: Arc::clone(&self.tables),
        }
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    /// Canonical unit string.
    pub fn units(&self) -> String {
        self.units.unparse()
    }

    pub fn unit_expression(&self) -> &UnitExpression {
        &self.units
    }

    pub fn tables(&self) -> &Arc<SymbolTables> {
        &self.tables
    }

    /// Units rewritten in SI base symbols (unmerged) and the factor relating them.
    pub fn base(&self) -> Result<(UnitExpression, f64)> {
        reduce_to_base(&self.units, &self.tables)
    }

    /// Merges like terms of `units` (or of this quantity's own units),
    /// optionally reducing to SI base units first.
    pub fn simplify(&self, units: Option<&str>, to_base: bool) -> Result<(UnitExpression, f64)> {
        let parsed;
        let expr = match units {
            Some(text) => {
                parsed = UnitExpression::parse(text, &self.tables)?;
                &parsed
            }
            None => &self.units,
        };
        if to_base {
            simplify_to_base(expr, &self.tables)
        } else {
            Ok(simplify(expr))
        }
    }

    /// The same quantity with like unit terms merged.
    pub fn simplified(&self) -> Self {
        let (units, factor) = simplify(&self.units);
        self.derive(self.values.scale(factor), units)
    }

    /// Whether the units reduce to no base dimension at all.
    pub fn is_dimensionless(&self) -> bool {
        simplify_to_base(&self.units, &self.tables)
            .map(|(units, _)| units.dimension().is_empty())
            .unwrap_or(false)
    }

    /// Expresses the quantity in `units`.
    pub fn convert(&self, units: &str) -> Result<Self> {
        let target = UnitExpression::parse(units, &self.tables)?;
        self.convert_to(&target)
    }

    pub fn convert_to(&self, target: &UnitExpression) -> Result<Self> {
        let transform = plan_conversion(&self.units, target, &self.tables)?;
        Ok(self.derive(self.values.map(|x| transform.apply(x)), target.clone()))
    }

    /// Adds `rhs` after converting it into `self`'s units.
    pub fn checked_add(&self, rhs: &Quantity) -> Result<Self> {
        let rhs = rhs.convert_to(&self.units)?;
        let values = self.values.zip_with(&rhs.values, |a, b| a + b)?;
        Ok(self.derive(values, self.units.clone()))
    }

    /// Subtracts `rhs` after converting it into `self`'s units.
    pub fn checked_sub(&self, rhs: &Quantity) -> Result<Self> {
        let rhs = rhs.convert_to(&self.units)?;
        let values = self.values.zip_with(&rhs.values, |a, b| a - b)?;
        Ok(self.derive(values, self.units.clone()))
    }

    pub fn checked_mul(&self, rhs: &Quantity) -> Result<Self> {
        let (units, factor) = simplify(&self.units.concat(&rhs.units));
        let values = self.values.zip_with(&rhs.values, |a, b| a * b)?;
        Ok(self.derive(values.scale(factor), units))
    }

    pub fn checked_div(&self, rhs: &Quantity) -> Result<Self> {
        let (units, factor) = simplify(&self.units.concat(&rhs.units.inverse()));
        let values = self.values.zip_with(&rhs.values, |a, b| a / b)?;
        Ok(self.derive(values.scale(factor), units))
    }

    /// Adds a bare number; only meaningful for dimensionless quantities.
    pub fn add_number(&self, rhs: f64) -> Result<Self> {
        self.number_operand("addition", rhs)
            .and_then(|rhs| self.checked_add(&rhs))
    }

    /// Subtracts a bare number; only meaningful for dimensionless quantities.
    pub fn sub_number(&self, rhs: f64) -> Result<Self> {
        self.number_operand("subtraction", rhs)
            .and_then(|rhs| self.checked_sub(&rhs))
    }

    fn number_operand(&self, operation: &'static str, value: f64) -> Result<Self> {
        if !self.is_dimensionless() {
            return Err(UnitError::TypeMismatch {
                operation,
                found: format!("bare number {value} against \"{}\"", self.units()),
            });
        }
        Ok(self.derive(Values::Scalar(value), UnitExpression::dimensionless()))
    }

    /// Scales the values; units are unchanged.
    pub fn scale(&self, factor: f64) -> Self {
        self.derive(self.values.scale(factor), self.units.clone())
    }

    /// `1 / self`: reciprocal values, inverted units.
    pub fn recip(&self) -> Self {
        self.derive(self.values.map(|x| 1.0 / x), self.units.inverse())
    }

    pub fn powf(&self, power: f64) -> Self {
        self.derive(self.values.map(|x| x.powf(power)), self.units.powf(power))
    }

    pub fn powi(&self, power: i32) -> Self {
        self.derive(
            self.values.map(|x| x.powi(power)),
            self.units.powf(power as f64),
        )
    }

    fn compare(&self, other: &Quantity, pred: impl Fn(f64, f64) -> bool) -> Result<bool> {
        let other = other.convert_to(&self.units)?;
        self.values.all_pairs(&other.values, pred)
    }

    /// `self < other` for every element, after converting `other`.
    pub fn try_lt(&self, other: &Quantity) -> Result<bool> {
        self.compare(other, |a, b| a < b)
    }

    pub fn try_le(&self, other: &Quantity) -> Result<bool> {
        self.compare(other, |a, b| a <= b)
    }

    pub fn try_gt(&self, other: &Quantity) -> Result<bool> {
        self.compare(other, |a, b| a > b)
    }

    pub fn try_ge(&self, other: &Quantity) -> Result<bool> {
        self.compare(other, |a, b| a >= b)
    }

    /// siunitx rendering: `\SI{2}{kg^{2}}` or `\SIlist{1;2}{m}`.
    pub fn latex(&self) -> String {
        match &self.values {
            Values::Scalar(value) => format!("\\SI{{{}}}{{{}}}", value, self.units.latex()),
            Values::Array(values) => {
                let items: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                format!("\\SIlist{{{}}}{{{}}}", items.join(";"), self.units.latex())
            }
        }
    }
}

fn approx_eq(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= EQ_TOLERANCE * a.abs().max(b.abs())
}

impl PartialEq for Quantity {
    /// Converts `other` into `self`'s units first; incompatible units are unequal.
    fn eq(&self, other: &Self) -> bool {
        self.compare(other, approx_eq).unwrap_or(false)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = self.units.unparse();
        if units.is_empty() {
            write!(f, "{}", self.values)
        } else {
            write!(f, "{} {}", self.values, units)
        }
    }
}

impl FromStr for Quantity {
    type Err = UnitError;

    /// Parses `"<values> <units>"`, e.g. `"9.81 m/s^2"` or `"[1, 2] kg"`.
    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        let (values, units) = if text.starts_with('[') {
            match text.find(']') {
                Some(end) => text.split_at(end + 1),
                None => {
                    return Err(UnitError::InvalidValue(format!(
                        "\"{text}\" has an unterminated value list"
                    )))
                }
            }
        } else {
            text.split_once(char::is_whitespace).unwrap_or((text, ""))
        };
        let values: Values = values.parse()?;
        Quantity::new(values, units.trim())
    }
}

impl Neg for &Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        self.scale(-1.0)
    }
}

impl Neg for Quantity {
    type Output = Quantity;

    fn neg(self) -> Quantity {
        -&self
    }
}

impl Add for &Quantity {
    type Output = Result<Quantity>;

    fn add(self, rhs: &Quantity) -> Self::Output {
        self.checked_add(rhs)
    }
}

impl Sub for &Quantity {
    type Output = Result<Quantity>;

    fn sub(self, rhs: &Quantity) -> Self::Output {
        self.checked_sub(rhs)
    }
}

impl Mul for &Quantity {
    type Output = Result<Quantity>;

    fn mul(self, rhs: &Quantity) -> Self::Output {
        self.checked_mul(rhs)
    }
}

impl Div for &Quantity {
    type Output = Result<Quantity>;

    fn div(self, rhs: &Quantity) -> Self::Output {
        self.checked_div(rhs)
    }
}

impl Add<f64> for &Quantity {
    type Output = Result<Quantity>;

    fn add(self, rhs: f64) -> Self::Output {
        self.add_number(rhs)
    }
}

impl Sub<f64> for &Quantity {
    type Output = Result<Quantity>;

    fn sub(self, rhs: f64) -> Self::Output {
        self.sub_number(rhs)
    }
}

impl Mul<f64> for &Quantity {
    type Output = Quantity;

    fn mul(self, rhs: f64) -> Quantity {
        self.scale(rhs)
    }
}

impl Div<f64> for &Quantity {
    type Output = Quantity;

    fn div(self, rhs: f64) -> Quantity {
        self.derive(self.values.map(|x| x / rhs), self.units.clone())
    }
}

impl Mul<&Quantity> for f64 {
    type Output = Quantity;

    fn mul(self, rhs: &Quantity) -> Quantity {
        rhs.scale(self)
    }
}

impl Div<&Quantity> for f64 {
    type Output = Quantity;

    fn div(self, rhs: &Quantity) -> Quantity {
        rhs.recip().scale(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(values: impl Into<Values>, units: &str) -> Quantity {
        Quantity::new(values, units).expect("quantity should build")
    }

    fn assert_values(actual: &Quantity, expected: &[f64]) {
        let values = actual.values().as_slice();
        assert_eq!(values.len(), expected.len());
        for (a, e) in values.iter().zip(expected) {
            assert!(
                (a - e).abs() <= 1e-9 * e.abs().max(1.0),
                "expected {expected:?}, got {values:?}"
            );
        }
    }

    #[test]
    fn construction_keeps_values_and_units() {
        let scalar = q(2.0, "");
        assert_eq!(scalar.values(), &Values::Scalar(2.0));
        assert_eq!(scalar.units(), "");
        assert_eq!(scalar.latex(), "\\SI{2}{}");

        let array = q(vec![1.0, 2.0, 3.0], "");
        assert_eq!(array.values().to_vec(), vec![1.0, 2.0, 3.0]);

        let single = q(2, "kg^2");
        assert_eq!(single.units(), "kg^2");
        assert_eq!(single.latex(), "\\SI{2}{kg^{2}}");

        let multiple = q(2.0, "kg^2*m^3/A*s^4");
        assert_eq!(multiple.units(), "kg^2*m^3/A*s^4");
        assert_eq!(
            multiple.unit_expression().latex(),
            "kg^{2}.m^{3}.A^{-1}.s^{-4}"
        );
    }

    #[test]
    fn construction_rejects_bad_input() {
        assert!(matches!(
            Quantity::new(Vec::<f64>::new(), "m").unwrap_err(),
            UnitError::InvalidValue(_)
        ));
        assert!(matches!(
            Quantity::new(1.0, "m^^2").unwrap_err(),
            UnitError::MalformedUnit { .. }
        ));
        assert!(matches!(
            Quantity::new(1.0, "furlong").unwrap_err(),
            UnitError::UnknownUnit(_)
        ));
    }

    #[test]
    fn base_reduces_to_si() {
        let (units, factor) = q(2.0, "mm^2").base().unwrap();
        assert_eq!(units, UnitExpression::parse("m^2", &SymbolTables::si()).unwrap());
        assert!((factor - 1e-6).abs() < 1e-18);

        let (units, factor) = q(2.0, "g^2").base().unwrap();
        assert_eq!(units.unparse(), "kg^2");
        assert!((factor - 1e-6).abs() < 1e-18);
    }

    #[test]
    fn simplify_accepts_other_units() {
        let quantity = q(1.0, "kg");
        let (units, factor) = quantity.simplify(Some("N/mm"), true).unwrap();
        assert_eq!(units.unparse(), "kg/s^2");
        assert!((factor - 1e3).abs() < 1e-9);

        let (units, factor) = quantity.simplify(None, false).unwrap();
        assert_eq!(units.unparse(), "kg");
        assert_eq!(factor, 1.0);
    }

    #[test]
    fn simplified_merges_like_terms() {
        let merged = q(3.0, "m*mm").simplified();
        assert_eq!(merged.units(), "m^2");
        assert_values(&merged, &[3e-3]);
    }

    #[test]
    fn converts_kelvin_to_celsius() {
        let converted = q(2.0, "K").convert("°C").unwrap();
        assert_eq!(converted.units(), "°C");
        assert_values(&converted, &[-271.15]);
        assert_eq!(converted, q(-271.15, "°C"));
    }

    #[test]
    fn converts_area_prefixes() {
        let converted = q(2.0, "m^2").convert("cm^2").unwrap();
        assert_eq!(converted.units(), "cm^2");
        assert_values(&converted, &[20000.0]);
        assert_eq!(converted, q(20000.0, "cm^2"));
    }

    #[test]
    fn conversion_keeps_requested_units() {
        let converted = q(1.0, "kN").convert("kg*m/s^2").unwrap();
        assert_eq!(converted.units(), "kg*m/s^2");
        assert_values(&converted, &[1000.0]);
    }

    #[test]
    fn incompatible_conversion_fails() {
        let area = q(2.0, "m^2");
        assert_eq!(
            area.convert("cm").unwrap_err(),
            UnitError::dimension_mismatch("m^2", "cm")
        );
        assert!(matches!(
            area.convert("kg").unwrap_err(),
            UnitError::DimensionMismatch { .. }
        ));
        assert_eq!(area.units(), "m^2");
    }

    #[test]
    fn conversion_round_trips() {
        for (value, from, to) in [
            (2.5, "km/s", "mm/ms"),
            (300.0, "K", "°F"),
            (12.0, "kWb", "V*s"),
            (4.0, "mPa", "N/m^2"),
        ] {
            let original = q(value, from);
            let back = original.convert(to).unwrap().convert(from).unwrap();
            assert_values(&back, &[value]);
        }
    }

    #[test]
    fn adds_across_prefixes() {
        let sum = (&q(2.0, "cm^2") + &q(4.0, "m^2")).unwrap();
        assert_eq!(sum.units(), "cm^2");
        assert_values(&sum, &[40002.0]);
        assert_eq!(sum, q(40002.0, "cm^2"));
    }

    #[test]
    fn subtracts_across_units() {
        let difference = (&q(1.0, "kN") - &q(250.0, "kg*m/s^2")).unwrap();
        assert_eq!(difference.units(), "kN");
        assert_values(&difference, &[0.75]);
    }

    #[test]
    fn addition_requires_matching_dimensions() {
        let err = (&q(1.0, "m") + &q(1.0, "s")).unwrap_err();
        assert_eq!(err, UnitError::dimension_mismatch("s", "m"));
    }

    #[test]
    fn addition_of_bare_numbers() {
        let err = (&q(1.0, "m") + 2.0).unwrap_err();
        assert!(matches!(err, UnitError::TypeMismatch { .. }));

        let sum = (&q(1.0, "") + 2.0).unwrap();
        assert_values(&sum, &[3.0]);

        let ratio = (&q(5.0, "mm/m") - 1.0).unwrap();
        assert_eq!(ratio.units(), "mm/m");
        assert_values(&ratio, &[-995.0]);
    }

    #[test]
    fn broadcasts_values() {
        let sum = (&q(vec![1.0, 2.0, 3.0], "m") + &q(1.0, "km")).unwrap();
        assert_values(&sum, &[1001.0, 1002.0, 1003.0]);

        let err = (&q(vec![1.0, 2.0], "m") + &q(vec![1.0, 2.0, 3.0], "m")).unwrap_err();
        assert_eq!(err, UnitError::ShapeMismatch { left: 2, right: 3 });
    }

    #[test]
    fn multiplies_and_merges_units() {
        let product = (&q(2.0, "m") * &q(3.0, "mm")).unwrap();
        assert_eq!(product.units(), "m^2");
        assert_values(&product, &[6e-3]);

        let work = (&q(2.0, "N") * &q(3.0, "m")).unwrap();
        assert_eq!(work.units(), "N*m");
        assert_values(&work, &[6.0]);
    }

    #[test]
    fn divides_and_cancels_units() {
        let speed = (&q(100.0, "m") / &q(10.0, "s")).unwrap();
        assert_eq!(speed.units(), "m/s");
        assert_values(&speed, &[10.0]);

        let ratio = (&q(1.0, "km") / &q(1.0, "m")).unwrap();
        assert_eq!(ratio.units(), "");
        assert_values(&ratio, &[1000.0]);
        assert!(ratio.is_dimensionless());
    }

    #[test]
    fn multiplication_then_division_cancels() {
        let a = q(vec![3.0, 6.0], "kg*m");
        let b = q(2.0, "ms");
        let back = (&(&a * &b).unwrap() / &b).unwrap();
        assert_eq!(back.units(), "kg*m");
        assert_eq!(back, a);
    }

    #[test]
    fn scales_by_numbers() {
        let length = q(4.0, "m");
        assert_values(&(&length * 2.5), &[10.0]);
        assert_values(&(&length / 2.0), &[2.0]);
        assert_values(&(3.0 * &length), &[12.0]);
        assert_eq!((&length * 2.5).units(), "m");

        let frequency = 2.0 / &length;
        assert_eq!(frequency.units(), "/m");
        assert_values(&frequency, &[0.5]);
    }

    #[test]
    fn raises_to_powers() {
        let area = q(3.0, "m").powi(2);
        assert_eq!(area.units(), "m^2");
        assert_values(&area, &[9.0]);

        let side = q(16.0, "m^2").powf(0.5);
        assert_eq!(side.units(), "m");
        assert_values(&side, &[4.0]);

        let root = q(4.0, "s").powf(0.5);
        assert_eq!(root.units(), "s^0.5");
    }

    #[test]
    fn negation_flips_values() {
        let negated = -&q(vec![1.0, -2.0], "J");
        assert_values(&negated, &[-1.0, 2.0]);
        assert_eq!(negated.units(), "J");
    }

    #[test]
    fn equality_converts_first() {
        assert_eq!(q(1.0, "km"), q(1000.0, "m"));
        assert_ne!(q(1.0, "km"), q(1.0, "m"));
        assert_ne!(q(1.0, "m"), q(1.0, "s"));
        assert_eq!(q(vec![1.0, 2.0], "m"), q(vec![100.0, 200.0], "cm"));
    }

    #[test]
    fn ordering_converts_first() {
        let short = q(1.0, "m");
        let long = q(1.0, "km");
        assert!(short.try_lt(&long).unwrap());
        assert!(short.try_le(&long).unwrap());
        assert!(long.try_gt(&short).unwrap());
        assert!(long.try_ge(&q(1000.0, "m")).unwrap());
        assert!(!long.try_gt(&q(1000.0, "m")).unwrap());
    }

    #[test]
    fn ordering_fails_on_mismatched_dimensions() {
        let err = q(1.0, "m").try_lt(&q(1.0, "kg")).unwrap_err();
        assert!(matches!(err, UnitError::DimensionMismatch { .. }));
    }

    #[test]
    fn failed_operations_leave_operands_unchanged() {
        let a = q(2.0, "m");
        let b = q(3.0, "s");
        assert!((&a + &b).is_err());
        assert_eq!(a.units(), "m");
        assert_eq!(b.units(), "s");
        assert_values(&a, &[2.0]);
        assert_values(&b, &[3.0]);
    }

    #[test]
    fn displays_values_with_units() {
        assert_eq!(q(2.0, "kg^2").to_string(), "2 kg^2");
        assert_eq!(q(vec![1.0, 2.0, 3.0], "m").to_string(), "[1, 2, 3] m");
        assert_eq!(q(2.0, "").to_string(), "2");
        assert_eq!(
            q(vec![1.0, 2.0], "m/s").latex(),
            "\\SIlist{1;2}{m.s^{-1}}"
        );
    }

    #[test]
    fn parses_from_text() {
        let gravity: Quantity = "9.81 m/s^2".parse().unwrap();
        assert_eq!(gravity.units(), "m/s^2");
        assert_values(&gravity, &[9.81]);

        let lengths: Quantity = "[1, 2] km".parse().unwrap();
        assert_eq!(lengths.units(), "km");
        assert_values(&lengths, &[1.0, 2.0]);

        let bare: Quantity = "4".parse().unwrap();
        assert_eq!(bare.units(), "");

        assert!(matches!(
            "[1, 2 km".parse::<Quantity>().unwrap_err(),
            UnitError::InvalidValue(_)
        ));
    }

    fn custom_tables() -> Arc<SymbolTables> {
        let text = r#"
[prefixes]
k = 1e3
d = 1e-1

[units]
m = "m"
g = "kg"
s = "s"
t = "1000*kg"
L = "dm^3"
J = "kg*m^2/s^2"
kWh = "3.6e6*J"

[references]
g = "k"
"#;
        Arc::new(SymbolTables::from_toml_str(text).unwrap())
    }

    #[test]
    fn custom_tables_flow_through_operations() {
        let tables = custom_tables();
        let load = Quantity::with_tables(2.0, "t", Arc::clone(&tables)).unwrap();
        let converted = load.convert("kg").unwrap();
        assert_values(&converted, &[2000.0]);
        assert!(Arc::ptr_eq(converted.tables(), &tables));
    }

    #[test]
    fn custom_units_defined_with_prefixes_convert() {
        let volume = Quantity::with_tables(1.0, "L", custom_tables()).unwrap();
        assert_values(&volume.convert("m^3").unwrap(), &[1e-3]);
        assert_values(&volume.convert("dm^3").unwrap(), &[1.0]);
    }

    #[test]
    fn custom_units_defined_by_derived_units_convert() {
        let energy = Quantity::with_tables(1.0, "kWh", custom_tables()).unwrap();
        let joules = energy.convert("J").unwrap();
        assert_eq!(joules.units(), "J");
        assert_values(&joules, &[3.6e6]);
        assert_values(&energy.convert("kJ").unwrap(), &[3.6e3]);
    }

    #[test]
    fn zero_power_is_dimensionless() {
        let unit = q(3.0, "m*s").powi(0);
        assert_eq!(unit.units(), "");
        assert_values(&unit, &[1.0]);
        assert!(unit.is_dimensionless());
        assert_eq!(q(2.0, "kg").powf(0.0).unit_expression(), &UnitExpression::dimensionless());
    }

    #[test]
    fn capitalized_unit_names_convert() {
        assert_values(&q(2.0, "Coulomb").convert("A*s").unwrap(), &[2.0]);
        assert_values(&q(1.0, "kBecquerel").convert("Hz").unwrap(), &[1000.0]);
    }
}
