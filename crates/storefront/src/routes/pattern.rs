//! Route path patterns.
//!
//! A pattern is either the catch-all `*` or a `/`-separated list of segments
//! where at most one segment is a `:name` parameter.

use std::cmp::Ordering;

use clinicshop_core::{Location, Params};

use super::RouteError;

/// One segment of a path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
}

/// Match precedence class. Lower sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Specificity {
    /// Every segment is a literal.
    Exact,
    /// One segment is a parameter.
    Parameterized,
    /// The `*` fallback.
    CatchAll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Shape {
    Path(Vec<Segment>),
    CatchAll,
}

/// A parsed route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePattern {
    raw: String,
    shape: Shape,
}

impl RoutePattern {
    /// The catch-all pattern text.
    pub const CATCH_ALL: &'static str = "*";

    /// Parse a pattern such as `/products/:productId`.
    ///
    /// # Errors
    ///
    /// Returns `RouteError::InvalidPattern` for a missing leading slash, an
    /// empty segment, an unnamed parameter, or a `*` that is not the whole
    /// pattern, and `RouteError::MultipleParams` for more than one parameter.
    pub fn parse(raw: &str) -> Result<Self, RouteError> {
        if raw == Self::CATCH_ALL {
            return Ok(Self {
                raw: raw.to_string(),
                shape: Shape::CatchAll,
            });
        }

        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };

        let rest = raw
            .strip_prefix('/')
            .ok_or_else(|| invalid("must start with '/'"))?;

        let mut segments = Vec::new();
        if !rest.is_empty() {
            for part in rest.split('/') {
                if part.is_empty() {
                    return Err(invalid("empty segment"));
                }
                if part.contains('*') {
                    return Err(invalid("'*' is only valid as the whole pattern"));
                }
                match part.strip_prefix(':') {
                    Some("") => return Err(invalid("parameter needs a name")),
                    Some(name) => segments.push(Segment::Param(name.to_string())),
                    None => segments.push(Segment::Literal(part.to_string())),
                }
            }
        }

        let params = segments
            .iter()
            .filter(|s| matches!(s, Segment::Param(_)))
            .count();
        if params > 1 {
            return Err(RouteError::MultipleParams(raw.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            shape: Shape::Path(segments),
        })
    }

    /// The pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub const fn is_catch_all(&self) -> bool {
        matches!(self.shape, Shape::CatchAll)
    }

    #[must_use]
    pub fn specificity(&self) -> Specificity {
        match &self.shape {
            Shape::CatchAll => Specificity::CatchAll,
            Shape::Path(segments) if segments.iter().any(|s| matches!(s, Segment::Param(_))) => {
                Specificity::Parameterized
            }
            Shape::Path(_) => Specificity::Exact,
        }
    }

    fn literal_count(&self) -> usize {
        match &self.shape {
            Shape::CatchAll => 0,
            Shape::Path(segments) => segments
                .iter()
                .filter(|s| matches!(s, Segment::Literal(_)))
                .count(),
        }
    }

    /// Compare two patterns by match precedence.
    ///
    /// Exact before parameterized before catch-all. Among parameterized
    /// patterns, more literal segments win. Equal results fall back to
    /// registration order in the table.
    #[must_use]
    pub fn precedence(&self, other: &Self) -> Ordering {
        self.specificity()
            .cmp(&other.specificity())
            .then_with(|| other.literal_count().cmp(&self.literal_count()))
    }

    /// Key under which two patterns count as duplicates.
    ///
    /// Parameter names and literal case are ignored, so `/products/:id` and
    /// `/Products/:handle` collide.
    #[must_use]
    pub fn shape_key(&self) -> String {
        match &self.shape {
            Shape::CatchAll => Self::CATCH_ALL.to_string(),
            Shape::Path(segments) if segments.is_empty() => "/".to_string(),
            Shape::Path(segments) => segments
                .iter()
                .map(|s| match s {
                    Segment::Literal(lit) => format!("/{}", lit.to_ascii_lowercase()),
                    Segment::Param(_) => "/:".to_string(),
                })
                .collect(),
        }
    }

    /// Match a location, returning the extracted parameters.
    ///
    /// Literals compare ASCII case-insensitively. Parameter values are
    /// percent-decoded; a value that does not decode to UTF-8 is kept raw.
    #[must_use]
    pub fn matches(&self, location: &Location) -> Option<Params> {
        let segments = match &self.shape {
            Shape::CatchAll => return Some(Params::new()),
            Shape::Path(segments) => segments,
        };

        let actual: Vec<&str> = location.segments().collect();
        if actual.len() != segments.len() {
            return None;
        }

        let mut params = Params::new();
        for (pattern, value) in segments.iter().zip(actual) {
            match pattern {
                Segment::Literal(lit) => {
                    if !lit.eq_ignore_ascii_case(value) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let decoded = urlencoding::decode(value)
                        .map_or_else(|_| value.to_string(), std::borrow::Cow::into_owned);
                    params.insert(name.clone(), decoded);
                }
            }
        }

        Some(params)
    }
}

impl std::fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
