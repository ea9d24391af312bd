//! Manifest reading layer.
//!
//! [`document`] materializes the XML tree, [`errors`] defines the typed
//! failure surface, and [`nuspec`] holds the resolvers that turn the
//! tree into the domain values of [`crate::core`].

pub mod document;
pub mod errors;
pub mod nuspec;

pub use document::{Document, DocumentError, Element};
pub use errors::{DiagnosticCode, NuspecError};
pub use nuspec::NuspecReader;
