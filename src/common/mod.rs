//! Common types and utilities shared across the crate.
//!
//! This module provides the unified error type and the XML text helpers used
//! by the DOM.

// Submodule declarations
pub mod error;
pub mod xml;

// Re-exports for convenience
pub use error::{Error, Result};
