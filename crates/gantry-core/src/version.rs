//! Maven-compatible version ordering, ranges, and constraints.
//!
//! Versions are split on `.` and `-` into segments. Numeric segments compare
//! as numbers, known qualifiers follow the Maven ordering
//! `alpha < beta < milestone < rc < snapshot < "" (release) < sp`, and
//! unknown text compares case-insensitively below a release.

use std::cmp::Ordering;
use std::fmt;

/// A parsed version with comparable segments. Equality follows the segment
/// comparison, so `1.0` and `1.0.0` are equal.
#[derive(Debug, Clone)]
pub struct Version {
    original: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum Segment {
    Numeric(u64),
    Qualifier(Qualifier),
    Text(String),
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd)]
enum Qualifier {
    Alpha,
    Beta,
    Milestone,
    Rc,
    Snapshot,
    Release,
    Sp,
}

impl Version {
    pub fn parse(version: &str) -> Self {
        let mut segments = Vec::new();
        for token in version.split(['.', '-']) {
            if !token.is_empty() {
                segments.push(classify_token(token));
            }
        }
        Self {
            original: version.to_string(),
            segments,
        }
    }

    /// The exact text this version was parsed from.
    pub fn as_str(&self) -> &str {
        &self.original
    }

    pub fn is_snapshot(&self) -> bool {
        self.original.ends_with("-SNAPSHOT")
    }
}

fn classify_token(token: &str) -> Segment {
    if let Ok(n) = token.parse::<u64>() {
        return Segment::Numeric(n);
    }
    match token.to_lowercase().as_str() {
        "alpha" | "a" => Segment::Qualifier(Qualifier::Alpha),
        "beta" | "b" => Segment::Qualifier(Qualifier::Beta),
        "milestone" | "m" => Segment::Qualifier(Qualifier::Milestone),
        "rc" | "cr" => Segment::Qualifier(Qualifier::Rc),
        "snapshot" => Segment::Qualifier(Qualifier::Snapshot),
        "ga" | "final" | "release" => Segment::Qualifier(Qualifier::Release),
        "sp" => Segment::Qualifier(Qualifier::Sp),
        _ => Segment::Text(token.to_string()),
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let ordering = match (self.segments.get(i), other.segments.get(i)) {
                (None, None) => Ordering::Equal,
                (Some(segment), None) => padded(segment),
                (None, Some(segment)) => padded(segment).reverse(),
                (Some(a), Some(b)) => compare(a, b),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// How a segment compares against a missing counterpart (a shorter version is
/// padded with empty release segments).
fn padded(segment: &Segment) -> Ordering {
    match segment {
        Segment::Numeric(0) => Ordering::Equal,
        Segment::Numeric(_) => Ordering::Greater,
        Segment::Qualifier(q) => q.cmp(&Qualifier::Release),
        Segment::Text(_) => Ordering::Less,
    }
}

fn compare(a: &Segment, b: &Segment) -> Ordering {
    match (a, b) {
        (Segment::Numeric(a), Segment::Numeric(b)) => a.cmp(b),
        (Segment::Qualifier(a), Segment::Qualifier(b)) => a.cmp(b),
        (Segment::Numeric(_), _) => Ordering::Greater,
        (_, Segment::Numeric(_)) => Ordering::Less,
        (Segment::Text(a), Segment::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Segment::Qualifier(q), Segment::Text(_)) => {
            if *q >= Qualifier::Release {
                Ordering::Greater
            } else {
                Ordering::Less
            }
        }
        (Segment::Text(_), Segment::Qualifier(q)) => {
            if *q >= Qualifier::Release {
                Ordering::Less
            } else {
                Ordering::Greater
            }
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

/// One end of a version range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
    pub version: Version,
    pub inclusive: bool,
}

/// A version range expression such as `[1.0,2.0)`, `[1.0,]`, `(,2.0)`, or the
/// exact form `[1.0]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRange {
    raw: String,
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

impl VersionRange {
    /// Parse a range expression. Returns `None` for bare versions.
    pub fn parse(spec: &str) -> Option<Self> {
        let s = spec.trim();
        let open_inclusive = match s.chars().next() {
            Some('[') => true,
            Some('(') => false,
            _ => return None,
        };
        let close_inclusive = match s.chars().last() {
            Some(']') => true,
            Some(')') => false,
            _ => return None,
        };
        let inner = &s[1..s.len() - 1];

        let (lower, upper) = match inner.split_once(',') {
            Some((lower, upper)) => {
                let bound = |text: &str, inclusive: bool| {
                    let text = text.trim();
                    (!text.is_empty()).then(|| Bound {
                        version: Version::parse(text),
                        inclusive,
                    })
                };
                (bound(lower, open_inclusive), bound(upper, close_inclusive))
            }
            None => {
                // exact pin, e.g. [1.0]
                let version = Version::parse(inner.trim());
                let bound = |inclusive| {
                    Some(Bound {
                        version: version.clone(),
                        inclusive,
                    })
                };
                (bound(open_inclusive), bound(close_inclusive))
            }
        };

        Some(Self {
            raw: s.to_string(),
            lower,
            upper,
        })
    }

    pub fn contains(&self, version: &Version) -> bool {
        if let Some(lower) = &self.lower {
            let ordering = version.cmp(&lower.version);
            if ordering == Ordering::Less || (!lower.inclusive && ordering == Ordering::Equal) {
                return false;
            }
        }
        if let Some(upper) = &self.upper {
            let ordering = version.cmp(&upper.version);
            if ordering == Ordering::Greater || (!upper.inclusive && ordering == Ordering::Equal) {
                return false;
            }
        }
        true
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// The constraint a dependency declares: either a single pinned version or a
/// range expression that must be expanded against repositories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    Exact(Version),
    Range(VersionRange),
}

impl VersionConstraint {
    pub fn parse(spec: &str) -> Self {
        match VersionRange::parse(spec) {
            Some(range) => Self::Range(range),
            None => Self::Exact(Version::parse(spec)),
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Self::Range(_))
    }

    pub fn contains(&self, version: &Version) -> bool {
        match self {
            Self::Exact(pinned) => pinned == version,
            Self::Range(range) => range.contains(version),
        }
    }
}

impl fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(version) => version.fmt(f),
            Self::Range(range) => range.fmt(f),
        }
    }
}
