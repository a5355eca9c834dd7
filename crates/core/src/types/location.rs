//! Current location of the single-page app.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use url::Url;

/// Parameters extracted from the matched route pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// A normalized location path plus the parameters matched against it.
///
/// Paths are normalized on construction:
/// - query strings and fragments are dropped
/// - a leading `/` is ensured
/// - trailing slashes are removed, except for the root
///
/// ```
/// use clinicshop_core::Location;
///
/// assert_eq!(Location::new("about/").path(), "/about");
/// assert_eq!(Location::new("/cart?step=2").path(), "/cart");
/// assert_eq!(Location::new("").path(), "/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    path: String,
    params: Params,
}

impl Location {
    /// Create a location with no matched parameters.
    #[must_use]
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize_path(path),
            params: Params::new(),
        }
    }

    /// Read the location from a hash-routed URL (`https://shop/#/products/42`).
    ///
    /// A URL without a fragment points at the root.
    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        Self::new(url.fragment().unwrap_or("/"))
    }

    /// Attach the parameters a route match extracted.
    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn params(&self) -> &Params {
        &self.params
    }

    /// Path segments, without the leading empty segment.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').skip(1).filter(|s| !s.is_empty())
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::new("/")
    }
}

fn normalize_path(raw: &str) -> String {
    let end = raw.find(['?', '#']).unwrap_or(raw.len());
    let path = raw.get(..end).unwrap_or(raw).trim();
    let trimmed = path.trim_end_matches('/');

    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path("///"), "/");
        assert_eq!(normalize_path("/products/"), "/products");
        assert_eq!(normalize_path("products/42"), "/products/42");
        assert_eq!(normalize_path("/blog#top"), "/blog");
        assert_eq!(normalize_path("?ref=mail"), "/");
    }

    #[test]
    fn test_from_url_reads_fragment() {
        let url = Url::parse("https://clinic.test/#/products/42?ref=home").unwrap();
        assert_eq!(Location::from_url(&url).path(), "/products/42");

        let url = Url::parse("https://clinic.test/").unwrap();
        assert_eq!(Location::from_url(&url).path(), "/");
    }

    #[test]
    fn test_segments() {
        let location = Location::new("/admin/dashboard");
        assert_eq!(location.segments().collect::<Vec<_>>(), ["admin", "dashboard"]);
        assert_eq!(Location::new("/").segments().count(), 0);
    }

    #[test]
    fn test_params() {
        let params: Params = [("productId", "42")].into_iter().collect();
        let location = Location::new("/products/42").with_params(params);
        assert_eq!(location.params().get("productId"), Some("42"));
        assert_eq!(location.params().get("missing"), None);
    }
}
