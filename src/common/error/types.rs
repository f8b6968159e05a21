//! Unified error types for the run store.
//!
//! Every fallible operation in the crate returns [`Result`]. Corruption of the
//! internal reference table is not represented here: it is a programming
//! error and panics.
use thiserror::Error;

/// Main error type for table store operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid file format, such as a malformed repeat count
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    XmlError(String),

    /// A caller passed an argument no position can be built from
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for table store operations.
pub type Result<T> = std::result::Result<T, Error>;
