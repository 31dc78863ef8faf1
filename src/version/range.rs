//! Version range evaluation
//!
//! Follows Composer's constraint grammar, which is what release ranges in
//! client declarations are written against:
//! - `5.0.13`, `=5.0.13`, `==5.0.13` - exact match
//! - `!=5.0.13` - anything but
//! - `>=5.0`, `>5.0`, `<=5.1`, `<5.1` - comparison operators
//! - `^5.0.0` - next significant release (>=5.0.0 <6.0.0, special cases for 0.x)
//! - `~5.0.10` - precision-sensitive (>=5.0.10 <5.1.0, but `~5.0` is >=5.0.0 <6.0.0)
//! - `5.0.*`, `5.x`, `*` - wildcards
//! - `5.0 - 5.1` - hyphen range (inclusive, partial upper bounds round up)
//! - `>=5.0 <5.2`, `>=5.0, <5.2` - AND
//! - `^4 || ^5`, `^4 | ^5` - OR

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use semver::Version;

use crate::version::error::RangeError;
use crate::version::semver::{parse_partial, parse_version};

static HYPHEN_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\S+)\s+-\s+(\S+)$").expect("valid hyphen range regex"));

static OPERATOR_SPACING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(>=|<=|!=|==|[<>=^~])\s+").expect("valid operator spacing regex")
});

static AND_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s,]+").expect("valid AND separator regex"));

/// A parsed version range as declared by a client
#[derive(Debug, Clone)]
pub struct VersionConstraint {
    raw: String,
    spec: VersionSpec,
}

impl VersionConstraint {
    /// Parse a range expression
    pub fn parse(raw: &str) -> Result<Self, RangeError> {
        VersionSpec::parse(raw)
            .map(|spec| Self {
                raw: raw.trim().to_string(),
                spec,
            })
            .ok_or_else(|| RangeError::Invalid(raw.to_string()))
    }

    /// Check if a concrete version satisfies this range
    pub fn satisfies(&self, version: &Version) -> bool {
        self.spec.satisfies(version)
    }

    /// The range as originally written
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for VersionConstraint {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Check whether `version` satisfies `range`.
///
/// Returns false when either side fails to parse.
pub fn satisfies(version: &str, range: &str) -> bool {
    let Some(version) = parse_version(version) else {
        return false;
    };

    VersionConstraint::parse(range)
        .map(|constraint| constraint.satisfies(&version))
        .unwrap_or(false)
}

/// Select the first catalog entry satisfying every range.
///
/// `catalog` is expected to be ordered from highest to lowest, so the first
/// match is the highest acceptable release. With no ranges, the first entry
/// is returned.
pub fn select_best_version(
    ranges: &[VersionConstraint],
    catalog: &[Version],
) -> Option<Version> {
    catalog
        .iter()
        .find(|candidate| ranges.iter().all(|range| range.satisfies(candidate)))
        .cloned()
}

/// Top-level range expression
#[derive(Debug, Clone)]
enum VersionSpec {
    Single(VersionRange),
    /// All must satisfy
    And(Vec<VersionRange>),
    /// Any must satisfy
    Or(Vec<VersionSpec>),
}

impl VersionSpec {
    fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }

        // OR has the lowest precedence; Composer accepts both `||` and `|`
        let normalized = spec.replace("||", "|");
        let or_parts: Vec<&str> = normalized.split('|').map(str::trim).collect();
        if or_parts.len() > 1 {
            let specs: Option<Vec<VersionSpec>> = or_parts
                .into_iter()
                .map(Self::parse_and_or_single)
                .collect();
            return specs.map(VersionSpec::Or);
        }

        Self::parse_and_or_single(spec)
    }

    fn parse_and_or_single(spec: &str) -> Option<Self> {
        let spec = spec.trim();
        if spec.is_empty() {
            return None;
        }

        if let Some(range) = VersionRange::parse_hyphen(spec) {
            return Some(VersionSpec::Single(range));
        }

        let attached = OPERATOR_SPACING.replace_all(spec, "$1");
        let parts: Vec<&str> = AND_SEPARATOR
            .split(&attached)
            .filter(|p| !p.is_empty())
            .collect();

        match parts.as_slice() {
            [] => None,
            [single] => VersionRange::parse(single).map(VersionSpec::Single),
            _ => parts
                .iter()
                .map(|p| VersionRange::parse(p))
                .collect::<Option<Vec<_>>>()
                .map(VersionSpec::And),
        }
    }

    fn satisfies(&self, version: &Version) -> bool {
        match self {
            VersionSpec::Single(range) => range.satisfies(version),
            VersionSpec::And(ranges) => ranges.iter().all(|r| r.satisfies(version)),
            VersionSpec::Or(specs) => specs.iter().any(|s| s.satisfies(version)),
        }
    }
}

/// A single comparator, with caret, tilde, wildcard and hyphen forms
/// already lowered to explicit bounds
#[derive(Debug, Clone)]
enum VersionRange {
    Exact(Version),
    NotEqual(Version),
    Gte(Version),
    Gt(Version),
    Lte(Version),
    Lt(Version),
    Any,
    /// >=from <to
    Between { from: Version, to: Version },
    /// >=from <=to
    Inclusive { from: Version, to: Version },
}

impl VersionRange {
    fn parse(spec: &str) -> Option<Self> {
        let spec = spec.trim();

        if spec == "*" || spec.eq_ignore_ascii_case("x") {
            return Some(VersionRange::Any);
        }

        if let Some(rest) = spec.strip_prefix(">=") {
            parse_version(rest).map(VersionRange::Gte)
        } else if let Some(rest) = spec.strip_prefix('>') {
            parse_version(rest).map(VersionRange::Gt)
        } else if let Some(rest) = spec.strip_prefix("<=") {
            parse_version(rest).map(VersionRange::Lte)
        } else if let Some(rest) = spec.strip_prefix('<') {
            parse_version(rest).map(VersionRange::Lt)
        } else if let Some(rest) = spec.strip_prefix("!=") {
            parse_version(rest).map(VersionRange::NotEqual)
        } else if let Some(rest) = spec.strip_prefix("==") {
            parse_version(rest).map(VersionRange::Exact)
        } else if let Some(rest) = spec.strip_prefix('=') {
            parse_version(rest).map(VersionRange::Exact)
        } else if let Some(rest) = spec.strip_prefix('^') {
            parse_partial(rest).and_then(|(v, precision)| Self::caret(v, precision))
        } else if let Some(rest) = spec.strip_prefix('~') {
            parse_partial(rest).and_then(|(v, precision)| Self::tilde(v, precision))
        } else if let Some(range) = Self::parse_wildcard(spec) {
            Some(range)
        } else {
            parse_version(spec).map(VersionRange::Exact)
        }
    }

    /// ^5.1.2 -> >=5.1.2 <6.0.0
    /// ^0.3.1 -> >=0.3.1 <0.4.0
    /// ^0.0.3 -> >=0.0.3 <0.0.4
    /// ^0 -> >=0.0.0 <1.0.0, ^0.0 -> >=0.0.0 <0.1.0
    ///
    /// None when the upper bound does not fit in a version component.
    fn caret(from: Version, precision: usize) -> Option<Self> {
        let to = if from.major > 0 {
            next_major(&from)?
        } else if from.minor > 0 {
            next_minor(&from)?
        } else {
            match precision {
                1 => Version::new(1, 0, 0),
                2 => Version::new(0, 1, 0),
                _ => Version::new(0, 0, from.patch.checked_add(1)?),
            }
        };
        Some(VersionRange::Between { from, to })
    }

    /// ~5 and ~5.0 -> >=5.0.0 <6.0.0
    /// ~5.0.10 -> >=5.0.10 <5.1.0
    fn tilde(from: Version, precision: usize) -> Option<Self> {
        let to = if precision < 3 {
            next_major(&from)?
        } else {
            next_minor(&from)?
        };
        Some(VersionRange::Between { from, to })
    }

    /// Parse hyphen range like "5.0.0 - 5.1.0"
    fn parse_hyphen(spec: &str) -> Option<Self> {
        let captures = HYPHEN_RANGE.captures(spec)?;
        let from = parse_version(&captures[1])?;
        let (to, precision) = parse_partial(&captures[2])?;

        Some(match precision {
            1 => VersionRange::Between {
                from,
                to: next_major(&to)?,
            },
            2 => VersionRange::Between {
                from,
                to: next_minor(&to)?,
            },
            _ => VersionRange::Inclusive { from, to },
        })
    }

    /// Parse wildcard patterns like "5.*", "5.x" or "5.0.*"
    fn parse_wildcard(spec: &str) -> Option<Self> {
        let spec = spec.strip_prefix('v').unwrap_or(spec);
        let parts: Vec<&str> = spec.split('.').collect();
        let is_wildcard = |s: &str| s == "*" || s.eq_ignore_ascii_case("x");

        match parts.as_slice() {
            [major, w] if is_wildcard(w) => {
                let from = Version::new(major.parse::<u64>().ok()?, 0, 0);
                Some(VersionRange::Between {
                    to: next_major(&from)?,
                    from,
                })
            }
            [major, minor, w] if is_wildcard(w) => {
                let from = Version::new(major.parse::<u64>().ok()?, minor.parse::<u64>().ok()?, 0);
                Some(VersionRange::Between {
                    to: next_minor(&from)?,
                    from,
                })
            }
            _ => None,
        }
    }

    fn satisfies(&self, version: &Version) -> bool {
        match self {
            VersionRange::Exact(v) => version == v,
            VersionRange::NotEqual(v) => version != v,
            VersionRange::Gte(v) => version >= v,
            VersionRange::Gt(v) => version > v,
            VersionRange::Lte(v) => version <= v,
            VersionRange::Lt(v) => version < v,
            VersionRange::Any => true,
            VersionRange::Between { from, to } => version >= from && below(version, to),
            VersionRange::Inclusive { from, to } => version >= from && version <= to,
        }
    }
}

fn next_major(version: &Version) -> Option<Version> {
    Some(Version::new(version.major.checked_add(1)?, 0, 0))
}

fn next_minor(version: &Version) -> Option<Version> {
    Some(Version::new(version.major, version.minor.checked_add(1)?, 0))
}

/// Exclusive upper bound that also keeps pre-releases of the bound itself
/// out (`<6.0.0` does not admit `6.0.0-beta1`)
fn below(version: &Version, bound: &Version) -> bool {
    let prerelease_of_bound = !version.pre.is_empty()
        && version.major == bound.major
        && version.minor == bound.minor
        && version.patch == bound.patch;

    version < bound && !prerelease_of_bound
}
