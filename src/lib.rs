//! nuspec - reader for NuGet-style `.nuspec` package manifests.
//!
//! This crate turns a manifest's loosely-structured, attribute-driven
//! XML into a validated, queryable in-memory model: per-framework
//! dependency groups, reference groups, merged framework-assembly
//! groups, content-files entries and license metadata. Resolvers are
//! pure reads of an immutable document; errors are typed and, for
//! license failures, carry stable diagnostic codes.

pub mod core;
pub mod reader;

pub use core::{
    canonicalize_flags, ContentFilesEntry, FrameworkIdentity, FrameworkSpecificGroup,
    LicenseExpression, LicenseMetadata, LicenseType, PackageDependency, PackageDependencyGroup,
    PackageType, VersionRange,
};

pub use reader::{DiagnosticCode, NuspecError, NuspecReader};
