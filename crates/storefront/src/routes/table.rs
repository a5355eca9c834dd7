//! Route table: pattern → page bindings with match precedence.

use std::collections::HashSet;

use clinicshop_core::{Location, Params};

use super::RouteError;
use super::pattern::RoutePattern;
use crate::pages::PageId;

/// A path pattern bound to a page.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pattern: RoutePattern,
    page: PageId,
}

impl RouteEntry {
    #[must_use]
    pub const fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    #[must_use]
    pub const fn page(&self) -> PageId {
        self.page
    }
}

/// Result of resolving a location against the table.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    pub entry: &'a RouteEntry,
    /// The resolved location, with matched parameters attached.
    pub location: Location,
}

impl RouteMatch<'_> {
    #[must_use]
    pub const fn page(&self) -> PageId {
        self.entry.page
    }

    #[must_use]
    pub const fn params(&self) -> &Params {
        self.location.params()
    }
}

/// Validated, ordered set of route entries.
#[derive(Debug, Clone)]
pub struct RouteTable {
    entries: Vec<RouteEntry>,
}

impl RouteTable {
    #[must_use]
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::default()
    }

    /// Entries in registration order.
    #[must_use]
    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    #[must_use]
    pub fn has_catch_all(&self) -> bool {
        self.entries.iter().any(|e| e.pattern.is_catch_all())
    }

    /// Select the single best-matching entry for `location`.
    ///
    /// Returns `None` only when nothing matches and the table has no catch-all.
    #[must_use]
    pub fn resolve(&self, location: &Location) -> Option<RouteMatch<'_>> {
        let mut best: Option<(&RouteEntry, Params)> = None;

        for entry in &self.entries {
            let Some(params) = entry.pattern.matches(location) else {
                continue;
            };
            let better = best
                .as_ref()
                .is_none_or(|(current, _)| entry.pattern.precedence(&current.pattern).is_lt());
            if better {
                best = Some((entry, params));
            }
        }

        best.map(|(entry, params)| RouteMatch {
            entry,
            location: Location::new(location.path()).with_params(params),
        })
    }
}

/// Builder for [`RouteTable`].
#[derive(Debug, Default)]
pub struct RouteTableBuilder {
    routes: Vec<(String, PageId)>,
}

impl RouteTableBuilder {
    /// Bind `pattern` to `page`.
    #[must_use]
    pub fn route(mut self, pattern: &str, page: PageId) -> Self {
        self.routes.push((pattern.to_string(), page));
        self
    }

    /// Bind the `*` fallback to `page`.
    #[must_use]
    pub fn catch_all(self, page: PageId) -> Self {
        self.route(RoutePattern::CATCH_ALL, page)
    }

    /// Validate and build a table that must contain a catch-all.
    ///
    /// # Errors
    ///
    /// Returns `RouteError` for malformed or duplicate patterns, or
    /// `RouteError::MissingCatchAll` when no `*` entry was registered.
    pub fn build(self) -> Result<RouteTable, RouteError> {
        let table = self.build_without_fallback()?;
        if !table.has_catch_all() {
            return Err(RouteError::MissingCatchAll);
        }
        Ok(table)
    }

    /// Validate and build a table that may lack a catch-all.
    ///
    /// Locations that match nothing resolve to `None` and render nothing.
    ///
    /// # Errors
    ///
    /// Returns `RouteError` for malformed or duplicate patterns.
    pub fn build_without_fallback(self) -> Result<RouteTable, RouteError> {
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(self.routes.len());

        for (raw, page) in self.routes {
            let pattern = RoutePattern::parse(&raw)?;
            if !seen.insert(pattern.shape_key()) {
                return Err(RouteError::Duplicate(raw));
            }
            entries.push(RouteEntry { pattern, page });
        }

        Ok(RouteTable { entries })
    }
}
