//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert from the errors
//! of the XML backend to the unified Error type.

use super::types::Error;

#[cfg(feature = "odf")]
impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlError(err.to_string())
    }
}

#[cfg(feature = "odf")]
impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlError(format!("Invalid attribute: {}", err))
    }
}
