//! Version range parsing.
//!
//! Manifests declare allowed dependency versions in interval notation:
//! a bare `1.0` means "1.0 or newer", `[1.0]` pins exactly, and
//! `[1.0,2.0)` style intervals carry inclusive (`[` `]`) or exclusive
//! (`(` `)`) bounds on either side.

use std::fmt;

use semver::Version;
use serde::Serialize;
use thiserror::Error;

/// Error from parsing a version range.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{input}` is not a valid version range: {reason}")]
pub struct VersionRangeError {
    /// The range as it appeared in the manifest.
    pub input: String,
    /// What made it unparseable.
    pub reason: String,
}

impl VersionRangeError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        VersionRangeError {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}

/// An allowed version interval.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VersionRange {
    min: Option<Version>,
    min_inclusive: bool,
    max: Option<Version>,
    max_inclusive: bool,
}

impl VersionRange {
    /// Parse interval notation.
    pub fn parse(input: &str) -> Result<Self, VersionRangeError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(VersionRangeError::new(input, "empty range"));
        }

        let first = trimmed.chars().next().unwrap_or_default();
        if first != '[' && first != '(' {
            // Bare version: minimum-inclusive, unbounded above.
            let min = parse_version_lenient(trimmed)
                .ok_or_else(|| VersionRangeError::new(input, "invalid minimum version"))?;
            return Ok(VersionRange {
                min: Some(min),
                min_inclusive: true,
                max: None,
                max_inclusive: false,
            });
        }

        let last = trimmed.chars().last().unwrap_or_default();
        if last != ']' && last != ')' {
            return Err(VersionRangeError::new(input, "unterminated interval"));
        }
        let min_inclusive = first == '[';
        let max_inclusive = last == ']';

        let inner = &trimmed[1..trimmed.len() - 1];
        let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
        match parts.as_slice() {
            [exact] => {
                if !min_inclusive || !max_inclusive {
                    return Err(VersionRangeError::new(
                        input,
                        "an exact range requires inclusive bounds",
                    ));
                }
                let version = parse_version_lenient(exact)
                    .ok_or_else(|| VersionRangeError::new(input, "invalid version"))?;
                Ok(VersionRange {
                    min: Some(version.clone()),
                    min_inclusive: true,
                    max: Some(version),
                    max_inclusive: true,
                })
            }
            [low, high] => {
                let min = if low.is_empty() {
                    None
                } else {
                    Some(parse_version_lenient(low).ok_or_else(|| {
                        VersionRangeError::new(input, "invalid minimum version")
                    })?)
                };
                let max = if high.is_empty() {
                    None
                } else {
                    Some(parse_version_lenient(high).ok_or_else(|| {
                        VersionRangeError::new(input, "invalid maximum version")
                    })?)
                };
                if min.is_none() && max.is_none() {
                    return Err(VersionRangeError::new(input, "interval has no bounds"));
                }
                if let (Some(min), Some(max)) = (&min, &max) {
                    if min > max {
                        return Err(VersionRangeError::new(
                            input,
                            "minimum is greater than maximum",
                        ));
                    }
                }
                Ok(VersionRange {
                    min,
                    min_inclusive,
                    max,
                    max_inclusive,
                })
            }
            _ => Err(VersionRangeError::new(input, "too many interval parts")),
        }
    }

    /// Lower bound, if bounded below.
    pub fn min(&self) -> Option<&Version> {
        self.min.as_ref()
    }

    /// Upper bound, if bounded above.
    pub fn max(&self) -> Option<&Version> {
        self.max.as_ref()
    }

    /// Whether the lower bound itself is allowed.
    pub fn is_min_inclusive(&self) -> bool {
        self.min_inclusive
    }

    /// Whether the upper bound itself is allowed.
    pub fn is_max_inclusive(&self) -> bool {
        self.max_inclusive
    }

    /// Check a version against the interval.
    pub fn satisfies(&self, version: &Version) -> bool {
        if let Some(min) = &self.min {
            let ok = if self.min_inclusive {
                version >= min
            } else {
                version > min
            };
            if !ok {
                return false;
            }
        }
        if let Some(max) = &self.max {
            let ok = if self.max_inclusive {
                version <= max
            } else {
                version < max
            };
            if !ok {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let (Some(min), Some(max)) = (&self.min, &self.max) {
            if min == max && self.min_inclusive && self.max_inclusive {
                return write!(f, "[{}]", min);
            }
        }
        write!(f, "{}", if self.min_inclusive { '[' } else { '(' })?;
        if let Some(min) = &self.min {
            write!(f, "{}", min)?;
        }
        write!(f, ", ")?;
        if let Some(max) = &self.max {
            write!(f, "{}", max)?;
        }
        write!(f, "{}", if self.max_inclusive { ']' } else { ')' })
    }
}

/// Parse a version string, allowing for incomplete versions.
///
/// `1` and `1.2` fill missing components with zero; anything beyond
/// three numeric components is rejected.
pub(crate) fn parse_version_lenient(s: &str) -> Option<Version> {
    let s = s.trim();
    if let Ok(v) = s.parse() {
        return Some(v);
    }

    let parts: Vec<&str> = s.split('.').collect();
    match parts.len() {
        1 => {
            let major: u64 = parts[0].parse().ok()?;
            Some(Version::new(major, 0, 0))
        }
        2 => {
            let major: u64 = parts[0].parse().ok()?;
            let minor: u64 = parts[1].parse().ok()?;
            Some(Version::new(major, minor, 0))
        }
        _ => None,
    }
}
