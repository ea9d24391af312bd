//! Package dependency model and per-framework groups.

use std::fmt;

use serde::Serialize;

use crate::core::framework::FrameworkIdentity;
use crate::core::version_range::VersionRange;

/// Canonicalize a comma-delimited asset-flag list.
///
/// Tokens are trimmed and lowercased, empty tokens dropped, duplicates
/// collapsed, and the result sorted ascending so downstream comparison
/// and serialization are deterministic. Lowercasing makes the
/// canonicalization a pure function of the token set, which in turn
/// makes structural dependency equality collapse case-variant
/// duplicate declarations.
pub fn canonicalize_flags(raw: &str) -> Vec<String> {
    let mut flags: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    flags.sort();
    flags.dedup();
    flags
}

/// One dependency declared by a manifest.
///
/// Equality is structural over all fields; groups collapse structurally
/// equal declarations into one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDependency {
    id: String,
    version_range: Option<VersionRange>,
    include: Vec<String>,
    exclude: Vec<String>,
}

impl PackageDependency {
    pub fn new(
        id: impl Into<String>,
        version_range: Option<VersionRange>,
        include: Vec<String>,
        exclude: Vec<String>,
    ) -> Self {
        PackageDependency {
            id: id.into(),
            version_range,
            include,
            exclude,
        }
    }

    /// Identifier of the depended-upon package.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Allowed version interval; `None` means unconstrained.
    pub fn version_range(&self) -> Option<&VersionRange> {
        self.version_range.as_ref()
    }

    /// Canonicalized include flags.
    pub fn include(&self) -> &[String] {
        &self.include
    }

    /// Canonicalized exclude flags.
    pub fn exclude(&self) -> &[String] {
        &self.exclude
    }
}

impl fmt::Display for PackageDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        if let Some(range) = &self.version_range {
            write!(f, " {}", range)?;
        }
        Ok(())
    }
}

/// Dependencies declared for one framework identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageDependencyGroup {
    target_framework: FrameworkIdentity,
    packages: Vec<PackageDependency>,
}

impl PackageDependencyGroup {
    pub fn new(target_framework: FrameworkIdentity, packages: Vec<PackageDependency>) -> Self {
        PackageDependencyGroup {
            target_framework,
            packages,
        }
    }

    pub fn target_framework(&self) -> &FrameworkIdentity {
        &self.target_framework
    }

    /// The deduplicated dependency set, in declaration order.
    pub fn packages(&self) -> &[PackageDependency] {
        &self.packages
    }
}

/// Generic per-framework item list, used for reference items and for
/// merged framework-assembly names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrameworkSpecificGroup {
    target_framework: FrameworkIdentity,
    items: Vec<String>,
}

impl FrameworkSpecificGroup {
    pub fn new(target_framework: FrameworkIdentity, items: Vec<String>) -> Self {
        FrameworkSpecificGroup {
            target_framework,
            items,
        }
    }

    pub fn target_framework(&self) -> &FrameworkIdentity {
        &self.target_framework
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_flags_dedup_and_order() {
        assert_eq!(
            canonicalize_flags("Build, build , COMPILE"),
            vec!["build".to_string(), "compile".to_string()]
        );
    }

    #[test]
    fn test_canonicalize_flags_empty_input() {
        assert!(canonicalize_flags("").is_empty());
        assert!(canonicalize_flags(" , ,, ").is_empty());
    }

    #[test]
    fn test_canonicalize_flags_sorted_case_insensitively() {
        assert_eq!(
            canonicalize_flags("runtime,Build,compile"),
            vec![
                "build".to_string(),
                "compile".to_string(),
                "runtime".to_string()
            ]
        );
    }

    #[test]
    fn test_structural_equality() {
        let a = PackageDependency::new("pkg", None, vec!["build".into()], vec![]);
        let b = PackageDependency::new("pkg", None, vec!["build".into()], vec![]);
        let c = PackageDependency::new("pkg", None, vec![], vec![]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_dependency_display() {
        let range = VersionRange::parse("[1.0,2.0)").unwrap();
        let dep = PackageDependency::new("serde", Some(range), vec![], vec![]);
        assert_eq!(dep.to_string(), "serde [1.0.0, 2.0.0)");

        let unconstrained = PackageDependency::new("serde", None, vec![], vec![]);
        assert_eq!(unconstrained.to_string(), "serde");
    }
}
