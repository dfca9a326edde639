// In: src/ffi/mod.rs

pub mod python;
