//! Reader error types and stable diagnostic codes.

use std::fmt;

use thiserror::Error;

use crate::core::framework::FrameworkParseError;
use crate::core::license::LicenseExpressionError;
use crate::reader::document::DocumentError;

/// Stable diagnostic codes downstream tooling matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// Invalid license expression.
    NU5032,
    /// Invalid license-expression version.
    NU5034,
}

impl DiagnosticCode {
    pub fn as_u32(self) -> u32 {
        match self {
            DiagnosticCode::NU5032 => 5032,
            DiagnosticCode::NU5034 => 5034,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NU{}", self.as_u32())
    }
}

/// Error during manifest reading.
#[derive(Debug, Error)]
pub enum NuspecError {
    #[error("failed to read manifest document")]
    Xml(#[from] DocumentError),

    #[error("manifest has no `{element}` element")]
    MissingElement { element: String },

    #[error(
        "the element {element} in package `{package}` is missing required attribute `{attribute}`"
    )]
    MissingAttribute {
        element: String,
        attribute: String,
        package: String,
    },

    #[error(
        "the element {element} in package `{package}` has invalid value `{value}` for attribute `{attribute}`"
    )]
    InvalidAttribute {
        element: String,
        attribute: String,
        value: String,
        package: String,
    },

    #[error(
        "the version `{version}` declared for dependency `{id}` in package `{package}` is not a valid version range"
    )]
    InvalidDependencyVersion {
        id: String,
        package: String,
        version: String,
    },

    #[error(transparent)]
    Framework(#[from] FrameworkParseError),

    #[error("NU5034: the license version string `{value}` is invalid")]
    InvalidLicenseVersion { value: String },

    #[error("NU5032: the license expression `{expression}` is invalid")]
    InvalidLicenseExpression {
        expression: String,
        #[source]
        source: LicenseExpressionError,
    },
}

impl NuspecError {
    /// The stable diagnostic code for this error, where one is defined.
    pub fn code(&self) -> Option<DiagnosticCode> {
        match self {
            NuspecError::InvalidLicenseExpression { .. } => Some(DiagnosticCode::NU5032),
            NuspecError::InvalidLicenseVersion { .. } => Some(DiagnosticCode::NU5034),
            _ => None,
        }
    }
}
