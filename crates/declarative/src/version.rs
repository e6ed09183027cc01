//! Semantic-version policy for versioned resources
//!
//! The catalog keeps an append-only history of versions per resource. Only the
//! highest version (by semantic-version precedence) is ever compared or
//! superseded, and a superseding version is always computed with [`next`].

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

pub use semver::Version;

/// The implicit version that predates every real version
pub const BASELINE: Version = Version::new(0, 0, 0);

/// Rule used to compute the next version of a changed resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpStrategy {
    #[default]
    Minor,
    Patch,
}

impl fmt::Display for BumpStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
        }
    }
}

impl FromStr for BumpStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            other => Err(format!("unknown bump strategy '{other}' (expected minor or patch)")),
        }
    }
}

/// Parse a version string
pub fn parse(input: &str) -> Result<Version> {
    Version::parse(input).map_err(|e| {
        log::trace!("rejecting version '{input}': {e}");
        Error::invalid_version(input)
    })
}

/// Compute the version following `current` under a bump strategy
///
/// The bumped component increments and all lower components reset to zero.
/// A pre-release is first promoted to its release when that release already
/// satisfies the strategy (`1.2.3-rc.1` patch is `1.2.3`, `1.3.0-rc.1` minor
/// is `1.3.0`). Build metadata is dropped.
pub fn bump(current: &Version, strategy: BumpStrategy) -> Result<Version> {
    let prerelease = !current.pre.is_empty();
    let overflow = || Error::VersionOverflow {
        version: current.to_string(),
        strategy: strategy.to_string(),
    };

    let (minor, patch) = match strategy {
        BumpStrategy::Patch if prerelease => (current.minor, current.patch),
        BumpStrategy::Patch => (
            current.minor,
            current.patch.checked_add(1).ok_or_else(overflow)?,
        ),
        BumpStrategy::Minor if prerelease && current.patch == 0 => (current.minor, 0),
        BumpStrategy::Minor => (current.minor.checked_add(1).ok_or_else(overflow)?, 0),
    };
    Ok(Version::new(current.major, minor, patch))
}

/// Check whether a string is a syntactically valid semantic version
pub fn is_valid(version: &str) -> bool {
    Version::parse(version).is_ok()
}

/// Compare two version strings by semantic-version precedence
///
/// Build metadata is ignored: `1.0.0+a` and `1.0.0+b` are equal.
pub fn compare(a: &str, b: &str) -> Result<Ordering> {
    Ok(parse(a)?.cmp_precedence(&parse(b)?))
}

/// Compute the next version string after `current`
pub fn next(current: &str, strategy: BumpStrategy) -> Result<String> {
    Ok(bump(&parse(current)?, strategy)?.to_string())
}

/// Select the item carrying the highest version
///
/// Linear scan seeded with [`BASELINE`]. Returns `None` when no item carries a
/// version at or above the baseline, meaning the resource has no versions
/// yet. Items whose version is not valid semver are skipped.
pub fn latest_by<T, F>(items: impl IntoIterator<Item = T>, version_of: F) -> Option<T>
where
    F: Fn(&T) -> Option<&str>,
{
    let mut best = BASELINE;
    let mut selected: Option<T> = None;

    for item in items {
        let Some(raw) = version_of(&item) else {
            log::warn!("Skipping catalog version record without a version string");
            continue;
        };
        let Ok(candidate) = Version::parse(raw) else {
            log::warn!("Skipping catalog version record with invalid version '{raw}'");
            continue;
        };
        let ordering = candidate.cmp_precedence(&best);
        let wins = match selected {
            None => ordering.is_ge(),
            Some(_) => ordering.is_gt(),
        };
        if wins {
            best = candidate;
            selected = Some(item);
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid() {
        assert!(is_valid("0.0.0"));
        assert!(is_valid("1.2.3"));
        assert!(is_valid("1.2.3-alpha.1"));
        assert!(is_valid("1.2.3+build.5"));
        assert!(is_valid("1.2.3-rc.1+build.5"));

        assert!(!is_valid(""));
        assert!(!is_valid("1.2"));
        assert!(!is_valid("v1.2.3"));
        assert!(!is_valid("01.2.3"));
        assert!(!is_valid("1.2.3-01"));
        assert!(!is_valid("1.2.3 "));
        assert!(!is_valid("99999999999999999999.0.0"));
    }

    #[test]
    fn test_compare_reflexive() {
        for v in ["0.0.0", "1.0.0", "1.0.0-alpha", "2.10.3-rc.1+b7"] {
            assert_eq!(compare(v, v).unwrap(), Ordering::Equal);
        }
    }

    #[test]
    fn test_compare_precedence_chain() {
        // Ordering from the semantic versioning specification
        let chain = [
            "1.0.0-alpha",
            "1.0.0-alpha.1",
            "1.0.0-alpha.beta",
            "1.0.0-beta",
            "1.0.0-beta.2",
            "1.0.0-beta.11",
            "1.0.0-rc.1",
            "1.0.0",
            "1.0.1",
            "1.1.0",
            "1.10.0",
            "2.0.0",
        ];
        for (i, a) in chain.iter().enumerate() {
            for (j, b) in chain.iter().enumerate() {
                assert_eq!(compare(a, b).unwrap(), i.cmp(&j), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_compare_ignores_build_metadata() {
        assert_eq!(compare("1.0.0+a", "1.0.0+b").unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_compare_invalid() {
        assert!(matches!(
            compare("1.0", "1.0.0"),
            Err(Error::InvalidVersion { .. })
        ));
    }

    #[test]
    fn test_next_patch_increases_only_patch() {
        assert_eq!(next("1.0.0", BumpStrategy::Patch).unwrap(), "1.0.1");
        assert_eq!(next("3.7.9", BumpStrategy::Patch).unwrap(), "3.7.10");
        assert_eq!(next("0.0.0", BumpStrategy::Patch).unwrap(), "0.0.1");
    }

    #[test]
    fn test_next_minor_resets_patch() {
        assert_eq!(next("1.0.0", BumpStrategy::Minor).unwrap(), "1.1.0");
        assert_eq!(next("3.7.9", BumpStrategy::Minor).unwrap(), "3.8.0");
    }

    #[test]
    fn test_next_prerelease_promotes() {
        assert_eq!(next("1.2.3-rc.1", BumpStrategy::Patch).unwrap(), "1.2.3");
        assert_eq!(next("1.3.0-rc.1", BumpStrategy::Minor).unwrap(), "1.3.0");
        assert_eq!(next("1.2.3-rc.1", BumpStrategy::Minor).unwrap(), "1.3.0");
        assert_eq!(next("1.2.3+b1", BumpStrategy::Patch).unwrap(), "1.2.4");
    }

    #[test]
    fn test_next_never_decreases() {
        for v in ["0.0.0", "1.2.3", "1.2.3-rc.1", "1.3.0-alpha", "9.9.9+x"] {
            for strategy in [BumpStrategy::Minor, BumpStrategy::Patch] {
                let bumped = next(v, strategy).unwrap();
                assert_eq!(compare(&bumped, v).unwrap(), Ordering::Greater, "{v} {strategy}");
            }
        }
    }

    #[test]
    fn test_next_at_component_limit_is_an_error() {
        let max = u64::MAX;
        assert!(matches!(
            next(&format!("0.0.{max}"), BumpStrategy::Patch),
            Err(Error::VersionOverflow { strategy, .. }) if strategy == "patch"
        ));
        assert!(matches!(
            next(&format!("0.{max}.4"), BumpStrategy::Minor),
            Err(Error::VersionOverflow { strategy, .. }) if strategy == "minor"
        ));
        // Promotion needs no increment, so it still succeeds at the limit
        assert_eq!(
            next(&format!("0.0.{max}-rc.1"), BumpStrategy::Patch).unwrap(),
            format!("0.0.{max}")
        );
    }

    #[test]
    fn test_next_invalid() {
        assert!(matches!(
            next("latest", BumpStrategy::Patch),
            Err(Error::InvalidVersion { version }) if version == "latest"
        ));
    }

    #[test]
    fn test_latest_by_selects_highest() {
        let records = vec![("a", "1.0.0"), ("b", "1.10.0"), ("c", "1.2.0"), ("d", "bogus")];
        let latest = latest_by(records, |r| Some(r.1)).unwrap();
        assert_eq!(latest.0, "b");
    }

    #[test]
    fn test_latest_by_empty_is_none() {
        let records: Vec<(&str, &str)> = Vec::new();
        assert!(latest_by(records, |r| Some(r.1)).is_none());
    }

    #[test]
    fn test_latest_by_baseline() {
        let baseline = latest_by(vec!["0.0.0"], |v| Some(*v));
        assert_eq!(baseline, Some("0.0.0"));
        // Pre-releases of the baseline predate it
        assert!(latest_by(vec!["0.0.0-alpha"], |v| Some(*v)).is_none());
    }

    #[test]
    fn test_latest_by_first_of_equal_precedence_wins() {
        let records = vec![("a", "1.0.0+build.1"), ("b", "1.0.0+build.2")];
        assert_eq!(latest_by(records, |r| Some(r.1)).unwrap().0, "a");
    }

    #[test]
    fn test_bump_strategy_from_str() {
        assert_eq!("PATCH".parse(), Ok(BumpStrategy::Patch));
        assert_eq!("minor".parse(), Ok(BumpStrategy::Minor));
        assert!("major".parse::<BumpStrategy>().is_err());
    }

    #[test]
    fn test_parse_keeps_full_form() {
        for v in ["1.2.3", "1.2.3-alpha.1", "1.2.3-rc.1+build.5"] {
            assert_eq!(parse(v).unwrap().to_string(), v);
        }
    }
}
