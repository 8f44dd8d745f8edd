//! Identifiers and glob-style patterns.
//!
//! A [`Pattern`] selects items by the shape of their [`Identifier`] and
//! drives output routing through wildcard captures.
//!
//! # Dialect
//!
//! | Form | Meaning |
//! |------|---------|
//! | `posts/hello.md` | exact literal |
//! | `posts/*.md` | `*` matches within one segment (at most one per segment) |
//! | `posts/**` | `**` matches any number of whole segments |
//!
//! Matching is a pure function of the pattern and identifier shapes; it never
//! depends on registration order. Overlap between two patterns is likewise a
//! static property, which is what lets rule sets reject ambiguity up front.

use std::fmt;
use thiserror::Error;

// ============================================================================
// Identifier
// ============================================================================

/// A path-shaped key identifying one content item.
///
/// Normalized to forward slashes with no leading `./` or `/`. Immutable once
/// assigned; items are looked up and routed by this key for the whole run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalized = raw.as_ref().replace('\\', "/");
        let trimmed = normalized
            .trim_start_matches("./")
            .trim_start_matches('/')
            .to_owned();
        Self(trimmed)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

// ============================================================================
// Pattern
// ============================================================================

/// Pattern syntax errors, surfaced when a rule is constructed.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("empty pattern")]
    Empty,

    #[error("pattern `{0}`: `**` must stand alone in its segment")]
    MisplacedSpan(String),

    #[error("pattern `{0}`: at most one `*` per segment")]
    TooManyWildcards(String),
}

/// One segment of a glob pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Seg {
    Literal(String),
    /// `prefix*suffix` within a single segment; `*` alone has empty affixes.
    Wild { prefix: String, suffix: String },
    /// `**`: spans zero or more whole segments.
    Span,
}

#[derive(Debug, Clone)]
enum Kind {
    Glob(Vec<Seg>),
    List(Vec<Identifier>),
}

/// A predicate over identifiers.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    kind: Kind,
}

impl Pattern {
    /// Parse a glob pattern (`posts/*.md`, `drafts/**`).
    pub fn glob(raw: &str) -> Result<Self, PatternError> {
        if raw.is_empty() {
            return Err(PatternError::Empty);
        }
        let segs = raw
            .split('/')
            .map(|seg| parse_segment(raw, seg))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            raw: raw.to_owned(),
            kind: Kind::Glob(segs),
        })
    }

    /// An explicit finite enumeration of identifiers (single named resources).
    pub fn list<I>(ids: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Identifier>,
    {
        let ids: Vec<Identifier> = ids.into_iter().map(Into::into).collect();
        let raw = ids
            .iter()
            .map(Identifier::as_str)
            .collect::<Vec<_>>()
            .join(",");
        Self {
            raw,
            kind: Kind::List(ids),
        }
    }

    pub fn matches(&self, id: &Identifier) -> bool {
        self.captures(id).is_some()
    }

    /// Wildcard captures in pattern order, or `None` when `id` does not match.
    ///
    /// `*` captures its in-segment span; `**` captures the matched segments
    /// joined with `/` (possibly empty). List patterns capture nothing.
    pub fn captures(&self, id: &Identifier) -> Option<Vec<String>> {
        match &self.kind {
            Kind::List(ids) => ids.contains(id).then(Vec::new),
            Kind::Glob(segs) => {
                let parts: Vec<&str> = id.as_str().split('/').collect();
                let mut caps = Vec::new();
                glob_match(segs, &parts, &mut caps).then_some(caps)
            }
        }
    }

    /// Whether some identifier could match both patterns.
    ///
    /// This is a static, exact check within the dialect; it does not consult
    /// any discovered item set.
    pub fn overlaps(&self, other: &Self) -> bool {
        match (&self.kind, &other.kind) {
            (Kind::List(a), Kind::List(b)) => a.iter().any(|id| b.contains(id)),
            (Kind::List(ids), Kind::Glob(_)) => ids.iter().any(|id| other.matches(id)),
            (Kind::Glob(_), Kind::List(ids)) => ids.iter().any(|id| self.matches(id)),
            (Kind::Glob(a), Kind::Glob(b)) => globs_intersect(a, b),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_segment(raw: &str, seg: &str) -> Result<Seg, PatternError> {
    if seg == "**" {
        return Ok(Seg::Span);
    }
    if seg.contains("**") {
        return Err(PatternError::MisplacedSpan(raw.to_owned()));
    }
    match seg.matches('*').count() {
        0 => Ok(Seg::Literal(seg.to_owned())),
        1 => {
            let star = seg.find('*').unwrap_or_default();
            Ok(Seg::Wild {
                prefix: seg[..star].to_owned(),
                suffix: seg[star + 1..].to_owned(),
            })
        }
        _ => Err(PatternError::TooManyWildcards(raw.to_owned())),
    }
}

/// Backtracking match of pattern segments against identifier segments,
/// accumulating captures in pattern order.
fn glob_match(segs: &[Seg], parts: &[&str], caps: &mut Vec<String>) -> bool {
    match segs.split_first() {
        None => parts.is_empty(),
        Some((Seg::Literal(lit), rest)) => match parts.split_first() {
            Some((part, tail)) if *part == lit.as_str() => glob_match(rest, tail, caps),
            _ => false,
        },
        Some((Seg::Wild { prefix, suffix }, rest)) => {
            let Some((part, tail)) = parts.split_first() else {
                return false;
            };
            if part.len() >= prefix.len() + suffix.len()
                && part.starts_with(prefix.as_str())
                && part.ends_with(suffix.as_str())
            {
                caps.push(part[prefix.len()..part.len() - suffix.len()].to_owned());
                if glob_match(rest, tail, caps) {
                    return true;
                }
                caps.pop();
            }
            false
        }
        Some((Seg::Span, rest)) => {
            for take in 0..=parts.len() {
                caps.push(parts[..take].join("/"));
                if glob_match(rest, &parts[take..], caps) {
                    return true;
                }
                caps.pop();
            }
            false
        }
    }
}

/// Emptiness check for the intersection of two glob patterns.
fn globs_intersect(a: &[Seg], b: &[Seg]) -> bool {
    match (a.first(), b.first()) {
        (None, None) => true,
        // A span can absorb zero segments (skip it) or whatever string the
        // other side's next segment denotes (every segment is satisfiable).
        (Some(Seg::Span), _) => {
            globs_intersect(&a[1..], b) || (!b.is_empty() && globs_intersect(a, &b[1..]))
        }
        (_, Some(Seg::Span)) => {
            globs_intersect(a, &b[1..]) || (!a.is_empty() && globs_intersect(&a[1..], b))
        }
        (Some(x), Some(y)) => segs_intersect(x, y) && globs_intersect(&a[1..], &b[1..]),
        _ => false,
    }
}

/// Whether two segment patterns can match a common segment string.
fn segs_intersect(x: &Seg, y: &Seg) -> bool {
    match (x, y) {
        (Seg::Literal(a), Seg::Literal(b)) => a == b,
        (Seg::Literal(lit), Seg::Wild { prefix, suffix })
        | (Seg::Wild { prefix, suffix }, Seg::Literal(lit)) => {
            lit.len() >= prefix.len() + suffix.len()
                && lit.starts_with(prefix.as_str())
                && lit.ends_with(suffix.as_str())
        }
        // Taking the longer prefix plus the longer suffix always yields a
        // common witness, so affix compatibility is exact here.
        (
            Seg::Wild {
                prefix: p1,
                suffix: s1,
            },
            Seg::Wild {
                prefix: p2,
                suffix: s2,
            },
        ) => {
            (p1.starts_with(p2.as_str()) || p2.starts_with(p1.as_str()))
                && (s1.ends_with(s2.as_str()) || s2.ends_with(s1.as_str()))
        }
        (Seg::Span, _) | (_, Seg::Span) => true,
    }
}

// ============================================================================
// Tests
// ============================================================================
