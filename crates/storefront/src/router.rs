//! Client-side router with a browser-style history stack.
//!
//! The router owns the current location. Every navigation re-resolves the
//! match synchronously; there is no I/O.

use clinicshop_core::Location;
use tracing::debug;
use url::Url;

use crate::error::add_breadcrumb;
use crate::routes::{RouteMatch, RouteTable};

/// History-backed router over a [`RouteTable`].
#[derive(Debug, Clone)]
pub struct Router {
    table: RouteTable,
    back_stack: Vec<Location>,
    current: Location,
    forward_stack: Vec<Location>,
}

impl Router {
    /// Create a router positioned at `/`.
    #[must_use]
    pub fn new(table: RouteTable) -> Self {
        Self::with_location(table, Location::default())
    }

    /// Create a router positioned at the location encoded in a hash URL.
    #[must_use]
    pub fn from_url(table: RouteTable, url: &Url) -> Self {
        Self::with_location(table, Location::from_url(url))
    }

    #[must_use]
    pub fn with_location(table: RouteTable, location: Location) -> Self {
        Self {
            table,
            back_stack: Vec::new(),
            current: location,
            forward_stack: Vec::new(),
        }
    }

    #[must_use]
    pub const fn table(&self) -> &RouteTable {
        &self.table
    }

    /// The active location, without matched parameters.
    #[must_use]
    pub const fn location(&self) -> &Location {
        &self.current
    }

    /// Push a new location, discarding any forward entries.
    pub fn navigate(&mut self, path: &str) -> Option<RouteMatch<'_>> {
        let location = Location::new(path);
        debug!(from = %self.location().path(), to = %location.path(), "navigate");
        add_breadcrumb("navigation", location.path(), None);

        self.forward_stack.clear();
        let previous = std::mem::replace(&mut self.current, location);
        self.back_stack.push(previous);
        self.current_match()
    }

    /// Rewrite the current history entry in place.
    pub fn replace(&mut self, path: &str) -> Option<RouteMatch<'_>> {
        let location = Location::new(path);
        debug!(from = %self.location().path(), to = %location.path(), "replace");

        self.current = location;
        self.current_match()
    }

    /// Step back one entry. Returns whether the location changed.
    pub fn back(&mut self) -> bool {
        let Some(previous) = self.back_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.current, previous);
        self.forward_stack.push(current);
        true
    }

    /// Step forward one entry. Returns whether the location changed.
    pub fn forward(&mut self) -> bool {
        let Some(next) = self.forward_stack.pop() else {
            return false;
        };
        let current = std::mem::replace(&mut self.current, next);
        self.back_stack.push(current);
        true
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.back_stack.len() + 1 + self.forward_stack.len()
    }

    /// Resolve the active location against the table.
    #[must_use]
    pub fn current_match(&self) -> Option<RouteMatch<'_>> {
        self.table.resolve(self.location())
    }
}
