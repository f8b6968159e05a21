//! Unified error types for the run store.
//!
//! This module provides a single error type shared by the DOM, the positional
//! decoders and the attribute stores.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
