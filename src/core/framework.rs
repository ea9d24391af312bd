//! Target framework identities.
//!
//! A `FrameworkIdentity` names one compatibility target a manifest entry
//! applies to (`net45`, `netstandard2.0`, ...), or the "any framework"
//! sentinel used by entries that apply everywhere. Identities are the
//! grouping keys for dependency, reference and framework-assembly
//! resolution, so they carry a total order and exact equality.

use std::fmt;

use semver::Version;
use serde::Serialize;
use thiserror::Error;

/// Error from parsing a target framework token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid target framework `{token}`: {reason}")]
pub struct FrameworkParseError {
    /// The token as it appeared in the manifest.
    pub token: String,
    /// What made it unparseable.
    pub reason: String,
}

impl FrameworkParseError {
    fn new(token: &str, reason: impl Into<String>) -> Self {
        FrameworkParseError {
            token: token.to_string(),
            reason: reason.into(),
        }
    }
}

/// A normalized compatibility target.
///
/// `Any` sorts before every concrete framework; concrete frameworks order
/// by (identifier, version, profile). Two identities are equal only when
/// all of their parts are equal - there is no substring or prefix
/// matching anywhere in the reader.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FrameworkIdentity {
    /// Applies to every framework. Declared by an absent, empty, or
    /// literal `any` target-framework attribute.
    Any,
    /// A concrete framework target.
    Framework {
        /// Normalized lowercase identifier (`net`, `netstandard`, ...).
        /// Unknown identifiers are preserved rather than rejected so
        /// newer manifests keep resolving.
        identifier: String,
        /// Framework version; compressed digit forms (`45`, `462`) are
        /// expanded during parsing.
        version: Version,
        /// Optional profile suffix (`net40-client`).
        profile: Option<String>,
    },
}

/// Identifier aliases, raw spelling to normalized form.
const IDENTIFIER_ALIASES: &[(&str, &str)] = &[
    ("net", "net"),
    ("netframework", "net"),
    (".netframework", "net"),
    ("netstandard", "netstandard"),
    (".netstandard", "netstandard"),
    ("netcoreapp", "netcoreapp"),
    (".netcoreapp", "netcoreapp"),
    ("netcore", "netcore"),
    ("uap", "uap"),
    ("win", "win"),
    ("wp", "wp"),
    ("sl", "sl"),
    ("monoandroid", "monoandroid"),
    ("xamarinios", "xamarinios"),
];

impl FrameworkIdentity {
    /// Parse a single framework token.
    ///
    /// Empty (after trimming) and `any` tokens yield [`FrameworkIdentity::Any`].
    /// Structurally malformed tokens are errors; merely *unknown*
    /// identifiers are not.
    pub fn parse(token: &str) -> Result<Self, FrameworkParseError> {
        let trimmed = token.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("any") {
            return Ok(FrameworkIdentity::Any);
        }

        let (body, profile) = match trimmed.split_once('-') {
            Some((_, "")) => {
                return Err(FrameworkParseError::new(token, "empty profile after `-`"));
            }
            Some((body, profile)) => (body, Some(profile.to_ascii_lowercase())),
            None => (trimmed, None),
        };

        let version_start = body
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(body.len());
        let (identifier_raw, version_raw) = body.split_at(version_start);
        let identifier_raw = identifier_raw.trim_end_matches('.');

        if identifier_raw.is_empty() {
            return Err(FrameworkParseError::new(token, "missing framework identifier"));
        }
        if !identifier_raw
            .chars()
            .all(|c| c.is_ascii_alphabetic() || c == '.')
        {
            return Err(FrameworkParseError::new(
                token,
                "identifier contains invalid characters",
            ));
        }

        let version = parse_framework_version(version_raw)
            .ok_or_else(|| FrameworkParseError::new(token, "invalid framework version"))?;

        let lowered = identifier_raw.to_ascii_lowercase();
        let identifier = IDENTIFIER_ALIASES
            .iter()
            .find(|(alias, _)| *alias == lowered)
            .map_or(lowered.clone(), |(_, normalized)| (*normalized).to_string());

        Ok(FrameworkIdentity::Framework {
            identifier,
            version,
            profile,
        })
    }

    /// Whether this is the "any framework" sentinel.
    pub fn is_any(&self) -> bool {
        matches!(self, FrameworkIdentity::Any)
    }
}

/// Expand a framework version string.
///
/// Dotted forms parse component-wise (`4.6.2`); undotted digit runs are
/// compressed notation where every digit is one component (`45` is 4.5,
/// `462` is 4.6.2). An absent version is 0.0.0.
fn parse_framework_version(raw: &str) -> Option<Version> {
    if raw.is_empty() {
        return Some(Version::new(0, 0, 0));
    }

    if raw.contains('.') {
        let parts: Vec<&str> = raw.split('.').collect();
        if parts.len() > 3 {
            return None;
        }
        let mut numbers = [0u64; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            *slot = part.parse().ok()?;
        }
        return Some(Version::new(numbers[0], numbers[1], numbers[2]));
    }

    if raw.len() > 3 || !raw.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut digits = raw.chars().map(|c| u64::from(c as u8 - b'0'));
    let major = digits.next()?;
    let minor = digits.next().unwrap_or(0);
    let patch = digits.next().unwrap_or(0);
    Some(Version::new(major, minor, patch))
}

impl fmt::Display for FrameworkIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameworkIdentity::Any => write!(f, "any"),
            FrameworkIdentity::Framework {
                identifier,
                version,
                profile,
            } => {
                write!(f, "{}{}.{}", identifier, version.major, version.minor)?;
                if version.patch > 0 {
                    write!(f, ".{}", version.patch)?;
                }
                if let Some(profile) = profile {
                    write!(f, "-{}", profile)?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_any_sentinel() {
        assert_eq!(FrameworkIdentity::parse("").unwrap(), FrameworkIdentity::Any);
        assert_eq!(
            FrameworkIdentity::parse("  any  ").unwrap(),
            FrameworkIdentity::Any
        );
        assert!(FrameworkIdentity::parse("Any").unwrap().is_any());
    }

    #[test]
    fn test_parse_compressed_version() {
        let net45 = FrameworkIdentity::parse("net45").unwrap();
        assert_eq!(
            net45,
            FrameworkIdentity::Framework {
                identifier: "net".to_string(),
                version: Version::new(4, 5, 0),
                profile: None,
            }
        );

        let net462 = FrameworkIdentity::parse("net462").unwrap();
        assert_eq!(
            net462,
            FrameworkIdentity::Framework {
                identifier: "net".to_string(),
                version: Version::new(4, 6, 2),
                profile: None,
            }
        );
    }

    #[test]
    fn test_parse_dotted_version() {
        let ns20 = FrameworkIdentity::parse("netstandard2.0").unwrap();
        assert_eq!(
            ns20,
            FrameworkIdentity::Framework {
                identifier: "netstandard".to_string(),
                version: Version::new(2, 0, 0),
                profile: None,
            }
        );

        let net60 = FrameworkIdentity::parse("net6.0").unwrap();
        assert_eq!(
            net60,
            FrameworkIdentity::Framework {
                identifier: "net".to_string(),
                version: Version::new(6, 0, 0),
                profile: None,
            }
        );
    }

    #[test]
    fn test_alias_spellings_are_equal() {
        let short = FrameworkIdentity::parse("net45").unwrap();
        let long = FrameworkIdentity::parse(".NETFramework4.5").unwrap();
        assert_eq!(short, long);
    }

    #[test]
    fn test_parse_profile() {
        let id = FrameworkIdentity::parse("net40-Client").unwrap();
        assert_eq!(
            id,
            FrameworkIdentity::Framework {
                identifier: "net".to_string(),
                version: Version::new(4, 0, 0),
                profile: Some("client".to_string()),
            }
        );
    }

    #[test]
    fn test_unknown_identifier_is_not_an_error() {
        let id = FrameworkIdentity::parse("quantum1.0").unwrap();
        assert_eq!(
            id,
            FrameworkIdentity::Framework {
                identifier: "quantum".to_string(),
                version: Version::new(1, 0, 0),
                profile: None,
            }
        );
    }

    #[test]
    fn test_malformed_tokens_are_errors() {
        assert!(FrameworkIdentity::parse("4.5").is_err());
        assert!(FrameworkIdentity::parse("net4.5.6.7").is_err());
        assert!(FrameworkIdentity::parse("net45-").is_err());
        assert!(FrameworkIdentity::parse("ne!t45").is_err());
    }

    #[test]
    fn test_any_sorts_first() {
        let any = FrameworkIdentity::Any;
        let net45 = FrameworkIdentity::parse("net45").unwrap();
        let ns20 = FrameworkIdentity::parse("netstandard2.0").unwrap();

        let mut ids = vec![ns20.clone(), net45.clone(), any.clone()];
        ids.sort();
        assert_eq!(ids, vec![any, net45, ns20]);
    }

    #[test]
    fn test_version_orders_within_identifier() {
        let net45 = FrameworkIdentity::parse("net45").unwrap();
        let net46 = FrameworkIdentity::parse("net46").unwrap();
        assert!(net45 < net46);
    }

    #[test]
    fn test_display_round_trips_meaning() {
        assert_eq!(FrameworkIdentity::parse("net45").unwrap().to_string(), "net4.5");
        assert_eq!(
            FrameworkIdentity::parse("netstandard2.0").unwrap().to_string(),
            "netstandard2.0"
        );
        assert_eq!(FrameworkIdentity::Any.to_string(), "any");
    }
}
