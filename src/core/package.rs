//! Package-level manifest declarations.

use semver::Version;
use serde::Serialize;

/// One `files` entry from the content-files section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentFilesEntry {
    include: String,
    exclude: Option<String>,
    build_action: Option<String>,
    copy_to_output: Option<bool>,
    flatten: Option<bool>,
}

impl ContentFilesEntry {
    pub fn new(
        include: impl Into<String>,
        exclude: Option<String>,
        build_action: Option<String>,
        copy_to_output: Option<bool>,
        flatten: Option<bool>,
    ) -> Self {
        ContentFilesEntry {
            include: include.into(),
            exclude,
            build_action,
            copy_to_output,
            flatten,
        }
    }

    /// Glob of files the entry covers. Always present and non-empty.
    pub fn include(&self) -> &str {
        &self.include
    }

    /// Glob of files excluded from `include`.
    pub fn exclude(&self) -> Option<&str> {
        self.exclude.as_deref()
    }

    /// Build action applied to the covered files.
    pub fn build_action(&self) -> Option<&str> {
        self.build_action.as_deref()
    }

    pub fn copy_to_output(&self) -> Option<bool> {
        self.copy_to_output
    }

    pub fn flatten(&self) -> Option<bool> {
        self.flatten
    }
}

/// A declared package type (`dependency`, `dotnettool`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageType {
    name: String,
    version: Version,
}

impl PackageType {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        PackageType {
            name: name.into(),
            version,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type version; 0.0.0 when the manifest gives none.
    pub fn version(&self) -> &Version {
        &self.version
    }
}
