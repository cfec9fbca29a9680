//! Latest tag resolution for `vMAJOR.MINOR[.PATCH]-BUILD` tags
//!
//! Tags are compared by the tuple `(major, minor, patch, build)`. A tag
//! without a patch component sorts before every tag of the same
//! `major.minor` that has one, so `v1.9-5 < v1.9.0-5`. Tags of any other
//! shape never take part in the comparison.
//!
//! Resolution is a pure function of its input: it does not log, print or
//! keep state between calls.

use std::sync::LazyLock;

use regex::Regex;

use crate::version::types::TagRecord;

/// `v` + 2 or 3 dot-separated numbers + `-` + build number, nothing else
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^v(\d+)\.(\d+)(?:\.(\d+))?-(\d+)$").expect("tag pattern is a valid regex")
});

/// Numeric components of an eligible tag
///
/// Field order is the comparison order. `patch: None` orders below any
/// `Some(_)`, which gives two-component tags their place before `x.y.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ParsedVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: Option<u64>,
    pub build: u64,
}

/// Parses an eligible tag, or returns `None` when the tag does not follow
/// the convention or a component does not fit in an integer.
pub fn parse_tag(tag: &str) -> Option<ParsedVersion> {
    let caps = TAG_PATTERN.captures(tag)?;
    let number = |i: usize| caps.get(i).map(|m| m.as_str().parse::<u64>());

    Some(ParsedVersion {
        major: number(1)?.ok()?,
        minor: number(2)?.ok()?,
        patch: match number(3) {
            Some(patch) => Some(patch.ok()?),
            None => None,
        },
        build: number(4)?.ok()?,
    })
}

/// Selects the latest eligible tag, optionally restricted to one version line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LatestTagResolver {
    version_prefix: Option<String>,
}

impl LatestTagResolver {
    /// An empty prefix is the same as no prefix
    pub fn new(version_prefix: Option<&str>) -> Self {
        Self {
            version_prefix: version_prefix
                .filter(|p| !p.is_empty())
                .map(|p| format!("{}-", p)),
        }
    }

    fn matches_prefix(&self, tag: &str) -> bool {
        self.version_prefix
            .as_deref()
            .is_none_or(|prefix| tag.starts_with(prefix))
    }

    /// Returns the latest candidate, or `None` when no candidate is eligible
    ///
    /// The first of several candidates with equal versions wins.
    pub fn resolve<'a>(&self, candidates: &'a [TagRecord]) -> Option<&'a TagRecord> {
        let mut best: Option<(&'a TagRecord, ParsedVersion)> = None;
        for record in candidates.iter().filter(|r| self.matches_prefix(&r.tag)) {
            let Some(version) = parse_tag(&record.tag) else {
                continue;
            };
            if best.is_none_or(|(_, current)| version > current) {
                best = Some((record, version));
            }
        }
        best.map(|(record, _)| record)
    }

    /// Same as [`resolve`](Self::resolve) but returns only the tag string
    pub fn resolve_tag(&self, candidates: &[TagRecord]) -> Option<String> {
        self.resolve(candidates).map(|record| record.tag.clone())
    }
}

/// Resolves the latest tag of `candidates` under an optional version prefix
pub fn resolve_latest(candidates: &[TagRecord], version_prefix: Option<&str>) -> Option<String> {
    LatestTagResolver::new(version_prefix).resolve_tag(candidates)
}
