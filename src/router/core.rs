//! Router core module - hot path for request routing.
//!
//! Patterns are compiled once, when they are registered, and then tested in
//! registration order for every request. The first pattern that matches wins.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use regex::Regex;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Maximum number of path parameters before heap allocation.
/// Most REST APIs have ≤4 path params (e.g., /users/{id}/posts/{postId}).
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names use `Arc<str>` because they come from the compiled pattern and are
/// shared by every request that matches it. Values are per-request data.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Matching slower than this is reported as a warning.
const SLOW_MATCH_THRESHOLD: Duration = Duration::from_millis(1);

/// Returned when a route pattern is not a valid regular expression.
#[derive(Debug, Clone)]
pub struct PatternError {
    pattern: String,
    source: regex::Error,
}

impl PatternError {
    /// The pattern that failed to compile
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid route pattern '{}': {}", self.pattern, self.source)
    }
}

impl std::error::Error for PatternError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Named values captured from a request path.
///
/// Every named group of the matched pattern has an entry, even when the group
/// captured nothing. Unnamed groups are never present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    params: ParamVec,
}

impl ParameterSet {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a parameter by name
    #[inline]
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the set has an entry for `name`
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.params.iter().any(|(k, _)| k.as_ref() == name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate over `(name, value)` pairs in group order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    /// Convert to a HashMap
    /// Note: This allocates - use get() in hot paths instead
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, String> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

impl<K: Into<Arc<str>>, V: Into<String>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = ParamVec::new();
        for (k, v) in iter {
            let k: Arc<str> = k.into();
            let v: String = v.into();
            // Keys stay unique: a later value replaces an earlier one.
            match params.iter_mut().find(|(name, _)| *name == k) {
                Some(slot) => slot.1 = v,
                None => params.push((k, v)),
            }
        }
        Self { params }
    }
}

/// A compiled path pattern.
///
/// The pattern is applied exactly as written. It is not anchored unless it
/// contains its own `^`/`$`, so `/items` also matches `/api/items/7`.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    regex: Regex,
    /// (capture group index, group name) for every named group
    names: Vec<(usize, Arc<str>)>,
}

impl PathMatcher {
    /// Compile a pattern such as `^/items/(?P<id>\d+)$`
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the pattern is not a valid regular expression.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        let regex = Regex::new(pattern).map_err(|source| PatternError {
            pattern: pattern.to_string(),
            source,
        })?;

        // Group 0 is the whole match and is never exposed.
        let names = regex
            .capture_names()
            .enumerate()
            .skip(1)
            .filter_map(|(idx, name)| name.map(|n| (idx, Arc::<str>::from(n))))
            .collect();

        Ok(Self { regex, names })
    }

    /// The source text of the pattern
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Names of the named capture groups, in declaration order
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|(_, n)| n.as_ref())
    }

    #[inline]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Test `path` and extract the named groups on success.
    ///
    /// Groups that did not participate in the match are reported as `""`.
    pub fn match_path(&self, path: &str) -> Option<ParameterSet> {
        let caps = self.regex.captures(path)?;
        let mut params = ParamVec::new();
        for (idx, name) in &self.names {
            let value = caps
                .get(*idx)
                .map(|m| m.as_str().to_owned())
                .unwrap_or_default();
            params.push((Arc::clone(name), value));
        }
        Some(ParameterSet { params })
    }
}

/// A registered pattern together with whatever the caller bound to it.
#[derive(Debug)]
pub struct Route<T> {
    matcher: PathMatcher,
    target: T,
}

impl<T> Route<T> {
    pub fn pattern(&self) -> &str {
        self.matcher.as_str()
    }

    pub fn matcher(&self) -> &PathMatcher {
        &self.matcher
    }

    pub fn target(&self) -> &T {
        &self.target
    }
}

/// Result of successfully matching a request path to a route
#[derive(Debug)]
pub struct RouteMatch<'a, T> {
    /// The route that matched
    pub route: &'a Route<T>,
    /// Named groups extracted from the path (e.g. `(?P<id>\d+)` → `{"id": "123"}`)
    pub path_params: ParameterSet,
}

impl<'a, T> RouteMatch<'a, T> {
    /// The value bound to the matched route
    pub fn target(&self) -> &'a T {
        &self.route.target
    }

    /// Get a path parameter by name
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params.get(name)
    }
}

/// Ordered route table.
///
/// Lookup is a linear scan in registration order, which keeps tie-breaking
/// obvious: when two patterns match the same path the earlier one wins.
#[derive(Debug)]
pub struct Router<T> {
    routes: Vec<Route<T>>,
}

impl<T> Default for Router<T> {
    fn default() -> Self {
        Self { routes: Vec::new() }
    }
}

impl<T> Router<T> {
    /// Create an empty router
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `pattern` and append it to the end of the table.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if the pattern does not compile. The table is
    /// left unchanged in that case.
    pub fn register(&mut self, pattern: &str, target: T) -> Result<(), PatternError> {
        let matcher = PathMatcher::compile(pattern).inspect_err(|e| {
            warn!(pattern = %pattern, error = %e, "Route pattern rejected");
        })?;
        info!(
            pattern = %pattern,
            params = ?matcher.param_names().collect::<Vec<_>>(),
            position = self.routes.len(),
            "Route registered"
        );
        self.routes.push(Route { matcher, target });
        Ok(())
    }

    /// Find the first route whose pattern matches `path`.
    ///
    /// # Returns
    ///
    /// * `Some(RouteMatch)` - If a matching route is found
    /// * `None` - If no route matches (results in 404)
    #[must_use]
    pub fn route(&self, path: &str) -> Option<RouteMatch<'_, T>> {
        debug!(path = %path, routes_count = self.routes.len(), "Route match attempt");
        let match_start = Instant::now();

        let found = self
            .routes
            .iter()
            .find_map(|route| route.matcher.match_path(path).map(|params| (route, params)));

        let match_duration = match_start.elapsed();

        match found {
            Some((route, path_params)) => {
                if match_duration > SLOW_MATCH_THRESHOLD {
                    warn!(
                        path = %path,
                        route_pattern = %route.pattern(),
                        duration_us = match_duration.as_micros(),
                        "Slow route matching detected"
                    );
                } else {
                    debug!(
                        path = %path,
                        route_pattern = %route.pattern(),
                        path_params = ?path_params,
                        duration_us = match_duration.as_micros(),
                        "Route matched"
                    );
                }
                Some(RouteMatch { route, path_params })
            }
            None => {
                debug!(
                    path = %path,
                    duration_us = match_duration.as_micros(),
                    "No route matched"
                );
                None
            }
        }
    }

    /// All registered patterns, in registration order
    #[must_use]
    pub fn patterns(&self) -> Vec<&str> {
        self.routes.iter().map(Route::pattern).collect()
    }

    /// Print all registered routes to stdout
    ///
    /// Useful for debugging and verifying that routes are loaded correctly.
    pub fn dump_routes(&self) {
        println!("[routes] count={}", self.routes.len());
        for (idx, route) in self.routes.iter().enumerate() {
            println!("[route] #{idx} {}", route.pattern());
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route<T>> {
        self.routes.iter()
    }
}
