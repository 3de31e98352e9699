//! Symbol tables: recognized prefixes, units and their SI decompositions.
//!
//! The tables are configuration data. They are deserialized once (from the
//! embedded SI table or a caller-supplied TOML/JSON document), validated, and
//! treated as read-only afterwards, so a single `Arc<SymbolTables>` can be
//! shared by every quantity in the process.

use crate::convert::TemperatureScale;
use crate::expression::UnitExpression;
use crate::reduce::{is_base_unit, reduce_to_base, split_scale_literal};
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// The SI prefix and unit table shipped with the crate, in TOML.
pub const SI_TABLE: &str = include_str!("../data/si.toml");

/// Lookup tables consulted by the parser, reducer and conversion engine.
///
/// Deserializing always goes through [`SymbolTables::validate`], whatever the
/// format, and adds the empty prefix and dimensionless unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "TableFile")]
pub struct SymbolTables {
    /// Prefix symbol (spelled out or abbreviated) to multiplicative factor.
    pub prefixes: HashMap<String, f64>,
    /// Recognized unit symbol to its SI decomposition string.
    pub units: HashMap<String, String>,
    /// Unit symbol to the prefix its SI reference form carries (`g` -> `k`).
    pub references: HashMap<String, String>,
    /// Unit symbols that name a temperature scale.
    pub temperatures: HashMap<String, TemperatureScale>,
}

/// Table document as written, before defaults and validation.
#[derive(Deserialize)]
struct TableFile {
    #[serde(default)]
    prefixes: HashMap<String, f64>,
    #[serde(default)]
    units: HashMap<String, String>,
    #[serde(default)]
    references: HashMap<String, String>,
    #[serde(default)]
    temperatures: HashMap<String, TemperatureScale>,
}

impl TryFrom<TableFile> for SymbolTables {
    type Error = anyhow::Error;

    fn try_from(file: TableFile) -> Result<Self> {
        let mut tables = SymbolTables::empty();
        tables.prefixes.extend(file.prefixes);
        tables.units.extend(file.units);
        tables.references = file.references;
        tables.temperatures = file.temperatures;
        tables.validate()?;

        tracing::debug!(
            "Loaded symbol tables with {} prefixes and {} units",
            tables.prefixes.len(),
            tables.units.len()
        );
        Ok(tables)
    }
}

impl SymbolTables {
    /// Shared SI tables, parsed from [`SI_TABLE`] on first use.
    pub fn si() -> Arc<SymbolTables> {
        static SI: OnceLock<Arc<SymbolTables>> = OnceLock::new();
        SI.get_or_init(|| {
            Arc::new(
                SymbolTables::from_toml_str(SI_TABLE).expect("embedded SI table is well-formed"),
            )
        })
        .clone()
    }

    /// Empty tables holding only the dimensionless unit and the empty prefix.
    pub fn empty() -> Self {
        Self {
            prefixes: HashMap::from([(String::new(), 1.0)]),
            units: HashMap::from([(String::new(), String::new())]),
            references: HashMap::new(),
            temperatures: HashMap::new(),
        }
    }

    /// Parses and validates a TOML table (see [`SI_TABLE`] for the layout).
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse symbol table as TOML")
    }

    /// Parses and validates a JSON table with the same fields as the TOML form.
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse symbol table as JSON")
    }

    /// Loads a table file; `.json` files are read as JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read symbol table: {:?}", path))?;

        if path.extension().map_or(false, |e| e == "json") {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Checks that the tables are self-consistent.
    ///
    /// Every decomposition must parse against these same tables, a unit that
    /// decomposes to itself must do so at its reference prefix, and every unit
    /// must reduce to SI base form without cycles.
    pub fn validate(&self) -> Result<()> {
        if self.prefix_factor("") != Some(1.0) {
            bail!("the empty prefix must have factor 1");
        }
        if self.decomposition("") != Some("") {
            bail!("the empty unit must decompose to nothing");
        }

        for (symbol, decomposition) in &self.units {
            let (literal, rest) = split_scale_literal(decomposition)
                .map_err(|e| anyhow!("decomposition of \"{symbol}\": {e}"))?;
            let expansion = UnitExpression::parse(rest, self)
                .map_err(|e| anyhow!("decomposition of \"{symbol}\": {e}"))?;
            if is_base_unit(symbol, &expansion) {
                let prefix_factor = expansion.terms()[0].scale();
                if literal != 1.0 || prefix_factor != self.reference_factor(symbol) {
                    bail!(
                        "base unit \"{symbol}\" must decompose to itself at its reference prefix"
                    );
                }
            }
        }

        for (symbol, prefix) in &self.references {
            if !self.prefixes.contains_key(prefix) {
                bail!("reference prefix \"{prefix}\" of \"{symbol}\" is not a known prefix");
            }
        }

        for symbol in self.temperatures.keys() {
            if !self.units.contains_key(symbol) {
                bail!("temperature symbol \"{symbol}\" is not a known unit");
            }
        }

        for symbol in self.units.keys() {
            UnitExpression::parse(symbol, self)
                .and_then(|expr| reduce_to_base(&expr, self))
                .map_err(|e| anyhow!("unit \"{symbol}\" does not reduce to base units: {e}"))?;
        }

        Ok(())
    }

    pub fn prefix_factor(&self, prefix: &str) -> Option<f64> {
        self.prefixes.get(prefix).copied()
    }

    pub fn is_unit(&self, symbol: &str) -> bool {
        self.units.contains_key(symbol)
    }

    pub fn decomposition(&self, symbol: &str) -> Option<&str> {
        self.units.get(symbol).map(String::as_str)
    }

    /// Factor of the prefix carried by the SI reference form of `symbol`
    /// (1000 for the gram, 1 for everything else in the SI table).
    pub fn reference_factor(&self, symbol: &str) -> f64 {
        self.references
            .get(symbol)
            .and_then(|prefix| self.prefix_factor(prefix))
            .unwrap_or(1.0)
    }

    pub fn temperature_scale(&self, symbol: &str) -> Option<TemperatureScale> {
        self.temperatures.get(symbol).copied()
    }
}
