//! This module defines the core, strongly-typed data representations used
//! throughout the ncd-matrix engine.
//!
//! It currently includes the `Item` enum, the opaque unit of comparison, and the
//! `TextEncoding` policy that turns textual items into compressible bytes.

pub mod item;

// Re-export the main type(s) for easier access.
pub use item::{Item, TextEncoding};
