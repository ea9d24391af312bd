//! Core data structures for nuspec.
//!
//! This module contains the domain values a resolved manifest produces:
//! - Framework identities and version ranges
//! - Dependency and framework-specific groups
//! - License metadata and expressions
//! - Content-files and package-type declarations

pub mod dependency;
pub mod framework;
pub mod license;
pub mod package;
pub mod version_range;

pub use dependency::{
    canonicalize_flags, FrameworkSpecificGroup, PackageDependency, PackageDependencyGroup,
};
pub use framework::{FrameworkIdentity, FrameworkParseError};
pub use license::{
    LicenseExpression, LicenseExpressionError, LicenseMetadata, LicenseType,
};
pub use package::{ContentFilesEntry, PackageType};
pub use version_range::{VersionRange, VersionRangeError};
