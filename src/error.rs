//! Error types for mesh-to-3MF conversion
//!
//! This module provides the error type shared by every pipeline stage.
//! All errors carry an error code for categorization.
//!
//! # Error Codes
//!
//! Error codes follow the pattern: `E<category><number>`
//!
//! Categories:
//! - **E1xxx**: I/O and archive errors
//! - **E2xxx**: XML reading and writing errors, package layout errors
//! - **E3xxx**: Fatal input errors
//! - **E4xxx**: External collaborator errors
//! - **E5xxx**: Post-build validation errors
//!
//! Degraded conditions (a texture that fails to decode, an out-of-range
//! material index) are not errors. They are logged and counted, and the run
//! continues with a fallback color.

use std::io;
use thiserror::Error;

/// Result type for conversion operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting a mesh into a 3MF package
#[derive(Error, Debug)]
pub enum Error {
    /// IO error occurred while reading or writing a file
    ///
    /// **Error Code**: E1001
    #[error("[E1001] I/O error: {0}")]
    Io(#[from] io::Error),

    /// ZIP archive error
    ///
    /// **Error Code**: E1002
    ///
    /// **Common Causes**:
    /// - Corrupted or truncated archive passed to [`crate::read_archive`]
    /// - Failure while finalizing an archive
    #[error("[E1002] ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// XML parsing error
    ///
    /// **Error Code**: E2001
    #[error("[E2001] XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML attribute error
    ///
    /// **Error Code**: E2002
    ///
    /// **Common Causes**:
    /// - Malformed attribute syntax
    /// - Attribute value that is not valid UTF-8
    #[error("[E2002] XML attribute error: {0}")]
    XmlAttr(String),

    /// Invalid XML structure
    ///
    /// **Error Code**: E2003
    ///
    /// **Common Causes**:
    /// - Missing required attributes
    /// - DTD declarations in a model document
    #[error("[E2003] Invalid XML structure: {0}")]
    InvalidXml(String),

    /// Invalid 3MF package layout
    ///
    /// **Error Code**: E2004
    ///
    /// **Common Causes**:
    /// - Missing `[Content_Types].xml` or `_rels/.rels`
    /// - No model relationship in the root relationships
    #[error("[E2004] Invalid 3MF format: {0}")]
    InvalidFormat(String),

    /// Numeric attribute that does not parse
    ///
    /// **Error Code**: E2006
    #[error("[E2006] Parse error: {0}")]
    ParseError(String),

    /// XML writing error
    ///
    /// **Error Code**: E2005
    #[error("[E2005] XML writing error: {0}")]
    XmlWrite(String),

    /// Fatal input error
    ///
    /// **Error Code**: E3001
    ///
    /// **Common Causes**:
    /// - Source mesh without a position buffer
    /// - Mesh with zero triangles
    /// - Triangle index referencing a vertex that does not exist
    /// - Run parameters outside their allowed range
    ///
    /// No package is produced when this error is returned.
    #[error("[E3001] Invalid input: {0}")]
    InvalidInput(String),

    /// External decimation collaborator failed
    ///
    /// **Error Code**: E4001
    ///
    /// **Common Causes**:
    /// - Decimation engine not ready
    /// - Decimation engine returned more triangles than requested
    /// - Decimation engine returned an empty mesh
    ///
    /// Simplification is never skipped silently; the run fails instead.
    #[error("[E4001] Decimation failed: {0}")]
    Decimation(String),

    /// Post-build package validation failed
    ///
    /// **Error Code**: E5001
    ///
    /// Carries the complete list of validator errors so hosts can report
    /// specifics.
    #[error("[E5001] Package validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlAttr(format!("Attribute parsing failed: {}", err))
    }
}

impl From<std::num::ParseFloatError> for Error {
    fn from(err: std::num::ParseFloatError) -> Self {
        Error::ParseError(format!("Failed to parse floating-point number: {}", err))
    }
}

impl From<std::num::ParseIntError> for Error {
    fn from(err: std::num::ParseIntError) -> Self {
        Error::ParseError(format!("Failed to parse integer: {}", err))
    }
}

impl Error {
    /// Create an InvalidInput error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Error::InvalidInput(message.into())
    }

    /// Create a Decimation error
    pub fn decimation(message: impl Into<String>) -> Self {
        Error::Decimation(message.into())
    }

    /// Create an XmlWrite error
    ///
    /// # Arguments
    /// * `message` - Description of the writing error
    pub fn xml_write(message: String) -> Self {
        Error::XmlWrite(message)
    }

    /// Whether this error was caused by the caller's input rather than by
    /// the conversion itself
    pub fn is_fatal_input(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }

    /// Validator messages carried by a [`Error::Validation`] error
    pub fn validation_errors(&self) -> &[String] {
        match self {
            Error::Validation(errors) => errors,
            _ => &[],
        }
    }
}
