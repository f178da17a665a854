//! # Router Module
//!
//! Path matching and route resolution.
//!
//! ## Overview
//!
//! Each route is a regular expression compiled at registration time. Named capture
//! groups (`(?P<id>\d+)`) become path parameters. For every request the router tests
//! the path against the compiled patterns in registration order and returns the
//! first match.
//!
//! Patterns are applied as written. Nothing is anchored implicitly, so a pattern
//! meant to cover the whole path should carry `^` and `$`.
//!
//! ## Example
//!
//! ```rust
//! use webapi_router::router::Router;
//!
//! let mut router = Router::new();
//! router.register(r"^/pets/(?P<id>\d+)$", "get_pet").unwrap();
//!
//! let m = router.route("/pets/123").unwrap();
//! assert_eq!(*m.target(), "get_pet");
//! assert_eq!(m.get_path_param("id"), Some("123"));
//! ```
//!
//! ## Performance
//!
//! Matching is O(n) in the number of routes. That is the intended trade-off for
//! small route tables where registration order must decide ties.

mod core;

pub use self::core::{
    ParamVec, ParameterSet, PathMatcher, PatternError, Route, RouteMatch, Router,
    MAX_INLINE_PARAMS,
};
