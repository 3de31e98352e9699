//! JavaScript-facing quantity wrapper.

use js_sys::Float64Array;
use quanta_core::{Quantity, UnitError, UnitExpression, Values};
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

/// Units paired with the factor relating them to the source units.
#[derive(Serialize)]
struct ScaledUnits<'a> {
    units: String,
    expression: &'a UnitExpression,
    factor: f64,
}

fn to_js(err: UnitError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn scaled_units(expression: &UnitExpression, factor: f64) -> Result<JsValue, JsValue> {
    let payload = ScaledUnits {
        units: expression.unparse(),
        expression,
        factor,
    };
    to_value(&payload).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

#[wasm_bindgen]
pub struct WasmQuantity {
    inner: Quantity,
}

impl From<Quantity> for WasmQuantity {
    fn from(inner: Quantity) -> Self {
        Self { inner }
    }
}

#[wasm_bindgen]
impl WasmQuantity {
    /// A single value builds a scalar quantity; several build an array.
    #[wasm_bindgen(constructor)]
    pub fn new(values: Vec<f64>, units: &str) -> Result<WasmQuantity, JsValue> {
        console_error_panic_hook::set_once();

        let values = if values.len() == 1 {
            Values::Scalar(values[0])
        } else {
            Values::from(values)
        };
        Quantity::new(values, units).map(Self::from).map_err(to_js)
    }

    /// Parses text such as `"9.81 m/s^2"` or `"[1, 2] km"`.
    pub fn parse(text: &str) -> Result<WasmQuantity, JsValue> {
        console_error_panic_hook::set_once();
        text.parse::<Quantity>().map(Self::from).map_err(to_js)
    }

    pub fn values(&self) -> Float64Array {
        Float64Array::from(self.inner.values().as_slice())
    }

    pub fn is_scalar(&self) -> bool {
        self.inner.values().is_scalar()
    }

    pub fn units(&self) -> String {
        self.inner.units()
    }

    pub fn latex(&self) -> String {
        self.inner.latex()
    }

    #[wasm_bindgen(js_name = toString)]
    pub fn to_display_string(&self) -> String {
        self.inner.to_string()
    }

    pub fn convert(&self, units: &str) -> Result<WasmQuantity, JsValue> {
        self.inner.convert(units).map(Self::from).map_err(to_js)
    }

    /// `{ units, expression, factor }` for the SI base form of the units.
    pub fn base(&self) -> Result<JsValue, JsValue> {
        let (expression, factor) = self.inner.base().map_err(to_js)?;
        scaled_units(&expression, factor)
    }

    pub fn simplify(&self, units: Option<String>, to_base: bool) -> Result<JsValue, JsValue> {
        let (expression, factor) = self
            .inner
            .simplify(units.as_deref(), to_base)
            .map_err(to_js)?;
        scaled_units(&expression, factor)
    }

    pub fn add(&self, other: &WasmQuantity) -> Result<WasmQuantity, JsValue> {
        self.inner.checked_add(&other.inner).map(Self::from).map_err(to_js)
    }

    pub fn sub(&self, other: &WasmQuantity) -> Result<WasmQuantity, JsValue> {
        self.inner.checked_sub(&other.inner).map(Self::from).map_err(to_js)
    }

    pub fn mul(&self, other: &WasmQuantity) -> Result<WasmQuantity, JsValue> {
        self.inner.checked_mul(&other.inner).map(Self::from).map_err(to_js)
    }

    pub fn div(&self, other: &WasmQuantity) -> Result<WasmQuantity, JsValue> {
        self.inner.checked_div(&other.inner).map(Self::from).map_err(to_js)
    }

    pub fn add_number(&self, value: f64) -> Result<WasmQuantity, JsValue> {
        self.inner.add_number(value).map(Self::from).map_err(to_js)
    }

    pub fn scale(&self, factor: f64) -> WasmQuantity {
        self.inner.scale(factor).into()
    }

    pub fn pow(&self, power: f64) -> WasmQuantity {
        self.inner.powf(power).into()
    }

    pub fn equals(&self, other: &WasmQuantity) -> bool {
        self.inner == other.inner
    }

    pub fn less_than(&self, other: &WasmQuantity) -> Result<bool, JsValue> {
        self.inner.try_lt(&other.inner).map_err(to_js)
    }

    pub fn less_equal(&self, other: &WasmQuantity) -> Result<bool, JsValue> {
        self.inner.try_le(&other.inner).map_err(to_js)
    }

    pub fn greater_than(&self, other: &WasmQuantity) -> Result<bool, JsValue> {
        self.inner.try_gt(&other.inner).map_err(to_js)
    }

    pub fn greater_equal(&self, other: &WasmQuantity) -> Result<bool, JsValue> {
        self.inner.try_ge(&other.inner).map_err(to_js)
    }
}
