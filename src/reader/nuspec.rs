//! Nuspec manifest reading.
//!
//! `NuspecReader` interprets the metadata element of a parsed manifest
//! document: dependency groups (with legacy groupless fallback),
//! reference groups, merged framework-assembly groups, content files,
//! package types and license metadata. Every resolver is a pure read of
//! the immutable document; consuming one twice re-runs the same
//! computation.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use semver::Version;
use tracing::debug;

use crate::core::dependency::{
    canonicalize_flags, FrameworkSpecificGroup, PackageDependency, PackageDependencyGroup,
};
use crate::core::framework::FrameworkIdentity;
use crate::core::license::{LicenseExpression, LicenseMetadata, LicenseType};
use crate::core::package::{ContentFilesEntry, PackageType};
use crate::core::version_range::{parse_version_lenient, VersionRange};
use crate::reader::document::{Document, Element};
use crate::reader::errors::NuspecError;

const METADATA: &str = "metadata";
const DEPENDENCIES: &str = "dependencies";
const DEPENDENCY: &str = "dependency";
const REFERENCES: &str = "references";
const REFERENCE: &str = "reference";
const GROUP: &str = "group";
const FRAMEWORK_ASSEMBLIES: &str = "frameworkAssemblies";
const FRAMEWORK_ASSEMBLY: &str = "frameworkAssembly";
const CONTENT_FILES: &str = "contentFiles";
const FILES: &str = "files";
const PACKAGE_TYPES: &str = "packageTypes";
const PACKAGE_TYPE: &str = "packageType";
const LICENSE: &str = "license";

const TARGET_FRAMEWORK: &str = "targetFramework";
const ASSEMBLY_NAME: &str = "assemblyName";

/// Reader over one parsed manifest.
#[derive(Debug, Clone)]
pub struct NuspecReader {
    metadata: Element,
    namespace: Option<String>,
}

impl NuspecReader {
    /// Parse manifest XML and locate its metadata element.
    pub fn parse(xml: &str) -> Result<Self, NuspecError> {
        let document = Document::parse(xml)?;
        let root = document.root();

        let metadata = if root.name() == METADATA {
            root.clone()
        } else {
            root.children()
                .find(|child| child.name() == METADATA)
                .cloned()
                .ok_or_else(|| NuspecError::MissingElement {
                    element: METADATA.to_string(),
                })?
        };
        let namespace = metadata.namespace().map(str::to_string);

        Ok(NuspecReader {
            metadata,
            namespace,
        })
    }

    /// Load a manifest from a file path.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        Ok(Self::parse(&content)?)
    }

    /// Declared package id, if present.
    pub fn id(&self) -> Option<&str> {
        self.scalar("id")
    }

    /// Declared package version string, if present.
    pub fn version(&self) -> Option<&str> {
        self.scalar("version")
    }

    /// Declared description, if present.
    pub fn description(&self) -> Option<&str> {
        self.scalar("description")
    }

    /// Whether the package is marked as a development-only dependency.
    pub fn development_dependency(&self) -> bool {
        self.scalar("developmentDependency")
            .is_some_and(|text| text.eq_ignore_ascii_case("true"))
    }

    /// Minimum client version required by the manifest, if declared.
    pub fn min_client_version(&self) -> Result<Option<Version>, NuspecError> {
        match self.metadata.attribute("minClientVersion") {
            None => Ok(None),
            Some(raw) => parse_version_lenient(raw).map(Some).ok_or_else(|| {
                NuspecError::InvalidAttribute {
                    element: self.metadata.describe(),
                    attribute: "minClientVersion".to_string(),
                    value: raw.to_string(),
                    package: self.identity(),
                }
            }),
        }
    }

    /// `id.version` string used in diagnostics.
    pub fn identity(&self) -> String {
        format!(
            "{}.{}",
            self.id().unwrap_or_default(),
            self.version().unwrap_or_default()
        )
    }

    /// Resolve per-framework dependency groups.
    ///
    /// Explicit `group` elements each yield one group, empty or not; the
    /// legacy groupless form yields a single "any framework" group only
    /// when no explicit group exists and at least one dependency was
    /// declared. `strict` rejects dependencies without a parseable
    /// version range instead of treating them as unconstrained.
    pub fn dependency_groups(
        &self,
        strict: bool,
    ) -> Result<Vec<PackageDependencyGroup>, NuspecError> {
        let mut groups = Vec::new();
        let Some(section) = self.section(DEPENDENCIES) else {
            return Ok(groups);
        };

        let explicit: Vec<&Element> = self.children_of(section, GROUP).collect();
        for group in &explicit {
            let target = self.target_framework_of(group)?;
            let packages = self.dependencies_in(group, strict)?;
            groups.push(PackageDependencyGroup::new(target, packages));
        }

        if explicit.is_empty() {
            let packages = self.dependencies_in(section, strict)?;
            if !packages.is_empty() {
                groups.push(PackageDependencyGroup::new(FrameworkIdentity::Any, packages));
            }
        }

        Ok(groups)
    }

    /// Resolve per-framework reference groups.
    ///
    /// Same group/legacy duality as dependencies, but items are `file`
    /// attributes kept in document order without deduplication, and
    /// there is no strict validation.
    pub fn reference_groups(&self) -> Result<Vec<FrameworkSpecificGroup>, NuspecError> {
        let mut groups = Vec::new();
        let Some(section) = self.section(REFERENCES) else {
            return Ok(groups);
        };

        let explicit: Vec<&Element> = self.children_of(section, GROUP).collect();
        for group in &explicit {
            let target = self.target_framework_of(group)?;
            let items = self.reference_files(group);
            groups.push(FrameworkSpecificGroup::new(target, items));
        }

        if explicit.is_empty() {
            let items = self.reference_files(section);
            if !items.is_empty() {
                groups.push(FrameworkSpecificGroup::new(FrameworkIdentity::Any, items));
            }
        }

        Ok(groups)
    }

    /// Resolve framework-assembly declarations into merged groups.
    ///
    /// A declaration may target several frameworks at once via a
    /// comma-delimited attribute, and the same framework may be spelled
    /// differently across declarations; accumulation therefore keys on
    /// the parsed identity, unioning assembly names. Output is sorted by
    /// framework identity, item lists case-insensitively.
    pub fn framework_assembly_groups(
        &self,
    ) -> Result<Vec<FrameworkSpecificGroup>, NuspecError> {
        let Some(section) = self.section(FRAMEWORK_ASSEMBLIES) else {
            return Ok(Vec::new());
        };

        let mut merged: BTreeMap<FrameworkIdentity, Vec<String>> = BTreeMap::new();
        for assembly in self.children_of(section, FRAMEWORK_ASSEMBLY) {
            let raw = assembly
                .attribute(TARGET_FRAMEWORK)
                .map(str::trim)
                .unwrap_or_default();
            let targets = if raw.is_empty() {
                vec![FrameworkIdentity::Any]
            } else {
                raw.split(',')
                    .map(str::trim)
                    .filter(|segment| !segment.is_empty())
                    .map(FrameworkIdentity::parse)
                    .collect::<Result<_, _>>()?
            };

            let name = assembly
                .attribute(ASSEMBLY_NAME)
                .map(str::trim)
                .unwrap_or_default();
            for target in targets {
                let items = merged.entry(target).or_default();
                if !name.is_empty()
                    && !items.iter().any(|item| item.eq_ignore_ascii_case(name))
                {
                    items.push(name.to_string());
                }
            }
        }

        Ok(merged
            .into_iter()
            .map(|(target, mut items)| {
                items.sort_by_key(|item| item.to_ascii_lowercase());
                FrameworkSpecificGroup::new(target, items)
            })
            .collect())
    }

    /// Resolve content-files entries.
    pub fn content_files(&self) -> Result<Vec<ContentFilesEntry>, NuspecError> {
        let mut entries = Vec::new();
        let Some(section) = self.section(CONTENT_FILES) else {
            return Ok(entries);
        };

        for files in self.children_of(section, FILES) {
            let include = match files.attribute("include").map(str::trim) {
                Some(include) if !include.is_empty() => include,
                _ => {
                    return Err(NuspecError::MissingAttribute {
                        element: files.describe(),
                        attribute: "include".to_string(),
                        package: self.identity(),
                    })
                }
            };

            entries.push(ContentFilesEntry::new(
                include,
                non_empty_attribute(files, "exclude"),
                non_empty_attribute(files, "buildAction"),
                self.bool_attribute(files, "copyToOutput")?,
                self.bool_attribute(files, "flatten")?,
            ));
        }

        Ok(entries)
    }

    /// Resolve declared package types.
    pub fn package_types(&self) -> Result<Vec<PackageType>, NuspecError> {
        let mut types = Vec::new();
        let Some(section) = self.section(PACKAGE_TYPES) else {
            return Ok(types);
        };

        for node in self.children_of(section, PACKAGE_TYPE) {
            let name = match node.attribute("name").map(str::trim) {
                Some(name) if !name.is_empty() => name,
                _ => {
                    return Err(NuspecError::MissingAttribute {
                        element: node.describe(),
                        attribute: "name".to_string(),
                        package: self.identity(),
                    })
                }
            };
            let version = match node.attribute("version") {
                None => Version::new(0, 0, 0),
                Some(raw) => parse_version_lenient(raw).ok_or_else(|| {
                    NuspecError::InvalidAttribute {
                        element: node.describe(),
                        attribute: "version".to_string(),
                        value: raw.to_string(),
                        package: self.identity(),
                    }
                })?,
            };
            types.push(PackageType::new(name, version));
        }

        Ok(types)
    }

    /// Resolve the license declaration.
    ///
    /// Absent or unrecognized declarations are `Ok(None)`; malformed
    /// recognized declarations are typed errors carrying NU5032/NU5034.
    /// An expression format version above
    /// [`LicenseMetadata::current_version`] is accepted structurally but
    /// its expression is left unparsed.
    pub fn license_metadata(&self) -> Result<Option<LicenseMetadata>, NuspecError> {
        let Some(license) = self.section(LICENSE) else {
            return Ok(None);
        };

        let raw_type = license.attribute("type").unwrap_or_default();
        let Some(license_type) = LicenseType::from_attribute(raw_type) else {
            if !raw_type.is_empty() {
                debug!(
                    license_type = raw_type,
                    "ignoring unrecognized license type"
                );
            }
            return Ok(None);
        };

        let text = license.text().to_string();
        let version = match license.attribute("version") {
            None => LicenseMetadata::empty_version(),
            Some(raw) => parse_version_lenient(raw).ok_or_else(|| {
                NuspecError::InvalidLicenseVersion {
                    value: raw.to_string(),
                }
            })?,
        };

        if license_type == LicenseType::Expression {
            if version <= LicenseMetadata::current_version() {
                let expression = LicenseExpression::parse(&text).map_err(|source| {
                    NuspecError::InvalidLicenseExpression {
                        expression: text.clone(),
                        source,
                    }
                })?;
                return Ok(Some(LicenseMetadata::new(
                    license_type,
                    text,
                    Some(expression),
                    version,
                )));
            }
            // Format version newer than we understand: accept the
            // declaration, leave the expression unevaluated.
            return Ok(Some(LicenseMetadata::new(license_type, text, None, version)));
        }

        Ok(Some(LicenseMetadata::new(
            license_type,
            text,
            None,
            LicenseMetadata::empty_version(),
        )))
    }

    fn scalar(&self, name: &str) -> Option<&str> {
        self.section(name).map(Element::text).filter(|text| !text.is_empty())
    }

    fn section(&self, name: &str) -> Option<&Element> {
        self.metadata.child(self.namespace.as_deref(), name)
    }

    fn children_of<'a>(
        &'a self,
        parent: &'a Element,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        parent.children_named(self.namespace.as_deref(), name)
    }

    fn target_framework_of(&self, group: &Element) -> Result<FrameworkIdentity, NuspecError> {
        match group.attribute(TARGET_FRAMEWORK).map(str::trim) {
            None | Some("") => Ok(FrameworkIdentity::Any),
            Some(token) => Ok(FrameworkIdentity::parse(token)?),
        }
    }

    fn dependencies_in(
        &self,
        parent: &Element,
        strict: bool,
    ) -> Result<Vec<PackageDependency>, NuspecError> {
        let mut packages: Vec<PackageDependency> = Vec::new();
        for dependency in self.children_of(parent, DEPENDENCY) {
            let id = match dependency.attribute("id").map(str::trim) {
                Some(id) if !id.is_empty() => id,
                _ => {
                    return Err(NuspecError::MissingAttribute {
                        element: dependency.describe(),
                        attribute: "id".to_string(),
                        package: self.identity(),
                    })
                }
            };

            let raw_version = dependency
                .attribute("version")
                .map(str::trim)
                .unwrap_or_default();
            let version_range = if raw_version.is_empty() {
                if strict {
                    return Err(NuspecError::InvalidDependencyVersion {
                        id: id.to_string(),
                        package: self.identity(),
                        version: String::new(),
                    });
                }
                None
            } else {
                match VersionRange::parse(raw_version) {
                    Ok(range) => Some(range),
                    Err(_) if strict => {
                        return Err(NuspecError::InvalidDependencyVersion {
                            id: id.to_string(),
                            package: self.identity(),
                            version: raw_version.to_string(),
                        })
                    }
                    Err(error) => {
                        debug!(
                            dependency = id,
                            version = raw_version,
                            %error,
                            "treating unparseable dependency version as unconstrained"
                        );
                        None
                    }
                }
            };

            let include = canonicalize_flags(dependency.attribute("include").unwrap_or_default());
            let exclude = canonicalize_flags(dependency.attribute("exclude").unwrap_or_default());

            let package = PackageDependency::new(id, version_range, include, exclude);
            if !packages.contains(&package) {
                packages.push(package);
            }
        }
        Ok(packages)
    }

    fn reference_files(&self, parent: &Element) -> Vec<String> {
        self.children_of(parent, REFERENCE)
            .filter_map(|reference| reference.attribute("file"))
            .map(str::trim)
            .filter(|file| !file.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn bool_attribute(
        &self,
        element: &Element,
        name: &str,
    ) -> Result<Option<bool>, NuspecError> {
        match element.attribute(name) {
            None => Ok(None),
            Some(raw) => match raw.trim() {
                value if value.eq_ignore_ascii_case("true") => Ok(Some(true)),
                value if value.eq_ignore_ascii_case("false") => Ok(Some(false)),
                _ => Err(NuspecError::InvalidAttribute {
                    element: element.describe(),
                    attribute: name.to_string(),
                    value: raw.to_string(),
                    package: self.identity(),
                }),
            },
        }
    }
}

fn non_empty_attribute(element: &Element, name: &str) -> Option<String> {
    element
        .attribute(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn reader(metadata_body: &str) -> NuspecReader {
        let xml = format!(
            r#"<package><metadata><id>demo</id><version>1.0.0</version>{}</metadata></package>"#,
            metadata_body
        );
        NuspecReader::parse(&xml).unwrap()
    }

    #[test]
    fn test_parse_requires_metadata() {
        let result = NuspecReader::parse("<package><files /></package>");
        assert!(matches!(
            result,
            Err(NuspecError::MissingElement { element }) if element == "metadata"
        ));
    }

    #[test]
    fn test_identity_and_scalars() {
        let reader = reader("<description>A demo</description>");
        assert_eq!(reader.id(), Some("demo"));
        assert_eq!(reader.version(), Some("1.0.0"));
        assert_eq!(reader.description(), Some("A demo"));
        assert_eq!(reader.identity(), "demo.1.0.0");
        assert!(!reader.development_dependency());
    }

    #[test]
    fn test_development_dependency_flag() {
        let reader = reader("<developmentDependency>true</developmentDependency>");
        assert!(reader.development_dependency());
    }

    #[test]
    fn test_min_client_version() {
        let xml = r#"<package><metadata minClientVersion="3.4"><id>demo</id><version>1.0.0</version></metadata></package>"#;
        let reader = NuspecReader::parse(xml).unwrap();
        assert_eq!(
            reader.min_client_version().unwrap(),
            Some(Version::new(3, 4, 0))
        );

        let bad = r#"<package><metadata minClientVersion="abc"><id>demo</id><version>1.0.0</version></metadata></package>"#;
        let reader = NuspecReader::parse(bad).unwrap();
        assert!(matches!(
            reader.min_client_version(),
            Err(NuspecError::InvalidAttribute { attribute, .. }) if attribute == "minClientVersion"
        ));
    }

    #[test]
    fn test_load_from_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("demo.nuspec");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"<package><metadata><id>demo</id><version>2.0.0</version></metadata></package>"#
        )
        .unwrap();

        let reader = NuspecReader::load(&path).unwrap();
        assert_eq!(reader.identity(), "demo.2.0.0");

        let missing = NuspecReader::load(&tmp.path().join("missing.nuspec"));
        assert!(missing.is_err());
    }

    #[test]
    fn test_missing_sections_resolve_empty() {
        let reader = reader("");
        assert!(reader.dependency_groups(false).unwrap().is_empty());
        assert!(reader.reference_groups().unwrap().is_empty());
        assert!(reader.framework_assembly_groups().unwrap().is_empty());
        assert!(reader.content_files().unwrap().is_empty());
        assert!(reader.package_types().unwrap().is_empty());
        assert!(reader.license_metadata().unwrap().is_none());
    }

    #[test]
    fn test_package_types() {
        let reader = reader(
            r#"<packageTypes>
                 <packageType name="Dependency" />
                 <packageType name="DotnetTool" version="2.1" />
               </packageTypes>"#,
        );
        let types = reader.package_types().unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].name(), "Dependency");
        assert_eq!(types[0].version(), &Version::new(0, 0, 0));
        assert_eq!(types[1].name(), "DotnetTool");
        assert_eq!(types[1].version(), &Version::new(2, 1, 0));
    }

    #[test]
    fn test_package_type_requires_name() {
        let reader = reader(r#"<packageTypes><packageType version="1.0" /></packageTypes>"#);
        assert!(matches!(
            reader.package_types(),
            Err(NuspecError::MissingAttribute { attribute, .. }) if attribute == "name"
        ));
    }
}
