//! Protocol version triples.
//!
//! Versions are written `<major>.<minor>` or `<major>.<minor>.<build>`; a
//! missing build component means `0`. Major and minor are mandatory, so a
//! bare `"5"` is rejected rather than read as `5.0.0`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A protocol version. Ordering is lexicographic on `(major, minor, build)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub build: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64, build: u64) -> Self {
        Self {
            major,
            minor,
            build,
        }
    }

    /// Parse `<major>.<minor>[.<build>]`.
    pub fn parse(input: &str) -> Result<Self, TypeError> {
        let invalid = |reason: &str| TypeError::InvalidVersion {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = input.split('.').collect();
        let (major, minor, build) = match parts.as_slice() {
            [major, minor] => (*major, *minor, None),
            [major, minor, build] => (*major, *minor, Some(*build)),
            [_] => return Err(invalid("missing minor component")),
            _ => return Err(invalid("expected at most three components")),
        };

        let component = |name: &str, raw: &str| -> Result<u64, TypeError> {
            if raw.is_empty() {
                return Err(invalid(&format!("empty {name} component")));
            }
            if !raw.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid(&format!("{name} component is not numeric")));
            }
            if raw.len() > 1 && raw.starts_with('0') {
                return Err(invalid(&format!("{name} component has a leading zero")));
            }
            raw.parse()
                .map_err(|_| invalid(&format!("{name} component out of range")))
        };

        Ok(Self {
            major: component("major", major)?,
            minor: component("minor", minor)?,
            build: build.map(|b| component("build", b)).transpose()?.unwrap_or(0),
        })
    }

    /// `v<major>.<minor>.<build>`, the release tag for this version.
    pub fn tag_name(&self) -> String {
        format!("v{self}")
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

impl FromStr for Version {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(v: Version) -> Self {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn major_only_is_rejected() {
        assert!(matches!(
            Version::parse("5"),
            Err(TypeError::InvalidVersion { .. })
        ));
    }

    #[test]
    fn two_components_default_build_to_zero() {
        assert_eq!(Version::parse("5.2").unwrap(), Version::new(5, 2, 0));
    }

    #[test]
    fn three_components() {
        assert_eq!(Version::parse("5.2.1").unwrap(), Version::new(5, 2, 1));
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = Version::parse("5.2").unwrap();
        let b = Version::parse("5.3").unwrap();
        let c = Version::parse("6.0").unwrap();
        assert!(a < b);
        assert!(b < c);
        assert!(Version::new(5, 10, 0) > Version::new(5, 9, 7));
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        for bad in ["", ".0", "5.", "5..1", "a.b", "5.2.1.4", "+5.2", "05.0", "5.-1", " 5.2"] {
            assert!(Version::parse(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn tag_name_includes_build() {
        assert_eq!(Version::new(5, 2, 0).tag_name(), "v5.2.0");
    }

    #[test]
    fn serializes_as_dotted_string() {
        let v = Version::new(6, 1, 0);
        assert_eq!(serde_json::to_string(&v).unwrap(), "\"6.1.0\"");
        let back: Version = serde_json::from_str("\"6.1\"").unwrap();
        assert_eq!(back, v);
        assert!(serde_json::from_str::<Version>("\"6\"").is_err());
    }

    proptest! {
        #[test]
        fn display_parses_back(major in 0u64..10_000, minor in 0u64..10_000, build in 0u64..10_000) {
            let v = Version::new(major, minor, build);
            prop_assert_eq!(Version::parse(&v.to_string()).unwrap(), v);
        }

        #[test]
        fn order_matches_tuple_order(a in any::<(u16, u16, u16)>(), b in any::<(u16, u16, u16)>()) {
            let va = Version::new(a.0.into(), a.1.into(), a.2.into());
            let vb = Version::new(b.0.into(), b.1.into(), b.2.into());
            prop_assert_eq!(va.cmp(&vb), a.cmp(&b));
        }
    }
}
