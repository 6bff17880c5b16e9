//! Server versions and the construction-time version gate

use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// A negotiated MediaWiki server version.
///
/// Variant order defines the total order: `Unknown` sorts below every
/// concrete release and `Development` above all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MediaWikiVersion {
    Unknown,
    Release { major: u16, minor: u16 },
    Development,
}

impl MediaWikiVersion {
    pub const MW1_09: Self = Self::release(1, 9);
    pub const MW1_10: Self = Self::release(1, 10);
    pub const MW1_11: Self = Self::release(1, 11);
    pub const MW1_12: Self = Self::release(1, 12);
    pub const MW1_13: Self = Self::release(1, 13);
    pub const MW1_14: Self = Self::release(1, 14);
    pub const MW1_15: Self = Self::release(1, 15);
    pub const MW1_16: Self = Self::release(1, 16);
    pub const MW1_19: Self = Self::release(1, 19);
    pub const MW1_23: Self = Self::release(1, 23);
    pub const MW1_24: Self = Self::release(1, 24);
    pub const MW1_27: Self = Self::release(1, 27);
    pub const MW1_31: Self = Self::release(1, 31);
    pub const MW1_35: Self = Self::release(1, 35);
    pub const MW1_39: Self = Self::release(1, 39);
    pub const MW1_43: Self = Self::release(1, 43);

    pub const fn release(major: u16, minor: u16) -> Self {
        Self::Release { major, minor }
    }

    /// The "greater-or-equal" relation used by the version gate.
    pub fn greater_eq(&self, other: &Self) -> bool {
        self >= other
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Parse the `generator` field of a siteinfo response, e.g.
    /// `"MediaWiki 1.39.3"` or `"MediaWiki 1.42.0-wmf.5"`.
    ///
    /// Release numbers carrying an `alpha` or `wmf` marker are treated as
    /// development snapshots. Anything unparsable yields `Unknown`.
    pub fn from_generator(generator: &str) -> Self {
        let number = generator
            .trim()
            .strip_prefix("MediaWiki")
            .unwrap_or(generator)
            .trim();

        let lower = number.to_ascii_lowercase();
        match number.parse::<Self>() {
            Ok(Self::Release { .. }) if lower.contains("alpha") || lower.contains("wmf") => {
                Self::Development
            }
            Ok(version) => version,
            Err(_) => Self::Unknown,
        }
    }
}

impl Default for MediaWikiVersion {
    fn default() -> Self {
        Self::Unknown
    }
}

impl fmt::Display for MediaWikiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::Release { major, minor } => write!(f, "{}.{}", major, minor),
            Self::Development => write!(f, "DEVELOPMENT"),
        }
    }
}

impl FromStr for MediaWikiVersion {
    type Err = CoreError;

    /// Accepts `"1.13"`, `"1.13.2"` and suffixed forms like `"1.43-alpha"`;
    /// only major and minor are kept.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_uppercase().as_str() {
            "UNKNOWN" => return Ok(Self::Unknown),
            "DEVELOPMENT" => return Ok(Self::Development),
            _ => {}
        }

        let mut parts = s.split('.');
        let major = parts.next().and_then(leading_number);
        let minor = parts.next().and_then(leading_number);
        match (major, minor) {
            (Some(major), Some(minor)) => Ok(Self::release(major, minor)),
            _ => Err(CoreError::parse(format!("not a version number: '{}'", s))),
        }
    }
}

fn leading_number(part: &str) -> Option<u16> {
    let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Construction-time compatibility check between an action's declared
/// versions and the negotiated server version.
pub struct VersionGate;

impl VersionGate {
    /// Succeeds if `negotiated` is one of `supported`, or is greater-or-equal
    /// than the smallest of them. An empty set declares no minimum.
    pub fn check(supported: &[MediaWikiVersion], negotiated: MediaWikiVersion) -> CoreResult<()> {
        let Some(minimum) = supported.iter().min() else {
            return Ok(());
        };

        if supported.contains(&negotiated) || negotiated.greater_eq(minimum) {
            return Ok(());
        }

        let supported = supported
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Err(CoreError::UnsupportedVersion {
            negotiated,
            supported,
        })
    }
}
