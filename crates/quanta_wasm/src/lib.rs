//! WASM bindings for the Quanta core library.

mod quantity;

pub use quantity::WasmQuantity;
