//! Dispatcher core module - hot path for request dispatch.

use http::Method;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::middleware::{compose, Middleware};
use crate::resource::{Capabilities, Resource};
use crate::router::{PatternError, Router};
use crate::server::{decode_path, split_target, ApiResponse, Envelope, IncomingRequest, RequestContext};

/// A request handler: takes the request context, returns a status and envelope.
pub type Handler = Arc<dyn Fn(&RequestContext) -> Reply + Send + Sync>;

/// Wrap a closure as a [`Handler`]
pub fn handler_fn<F>(f: F) -> Handler
where
    F: Fn(&RequestContext) -> Reply + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Handler output: status code plus response envelope.
///
/// A status of `0` is the defer sentinel used by
/// [`handlers`](crate::middleware::handlers); see [`Reply::next`].
#[derive(Debug, Clone, Default)]
pub struct Reply {
    pub status: u16,
    pub envelope: Envelope,
}

impl Reply {
    #[must_use]
    pub fn new(status: u16, envelope: Envelope) -> Self {
        Self { status, envelope }
    }

    /// `200` with `data`
    #[must_use]
    pub fn ok<T: serde::Serialize + Send + Sync + 'static>(data: T) -> Self {
        Self::new(200, Envelope::with_data(data))
    }

    /// `201` with `data`
    #[must_use]
    pub fn created<T: serde::Serialize + Send + Sync + 'static>(data: T) -> Self {
        Self::new(201, Envelope::with_data(data))
    }

    /// `status` with `error`
    #[must_use]
    pub fn error<T: serde::Serialize + Send + Sync + 'static>(status: u16, error: T) -> Self {
        Self::new(status, Envelope::with_error(error))
    }

    /// Zero status and an empty envelope: "let the next handler answer"
    #[must_use]
    pub fn next() -> Self {
        Self::default()
    }

    pub fn is_deferred(&self) -> bool {
        self.status == 0
    }
}

impl From<(u16, Envelope)> for Reply {
    fn from((status, envelope): (u16, Envelope)) -> Self {
        Self::new(status, envelope)
    }
}

/// Why a request never reached a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No route pattern matched the path
    NotFound { path: String },
    /// A route matched but its resource does not serve the method
    MethodNotAllowed { method: String, pattern: String },
    /// The handler panicked; its partial output is discarded
    HandlerPanicked { path: String },
}

impl DispatchError {
    /// The status code this error is answered with
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::NotFound { .. } => 404,
            DispatchError::MethodNotAllowed { .. } => 405,
            DispatchError::HandlerPanicked { .. } => 500,
        }
    }
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::NotFound { path } => write!(f, "no route matches '{path}'"),
            DispatchError::MethodNotAllowed { method, pattern } => {
                write!(f, "method {method} not supported by route '{pattern}'")
            }
            DispatchError::HandlerPanicked { path } => {
                write!(f, "handler for '{path}' panicked")
            }
        }
    }
}

impl std::error::Error for DispatchError {}

/// What the router stores for each route: the resource's capabilities with the
/// route's middleware chain already composed around every handler.
#[derive(Debug)]
pub struct Endpoint {
    capabilities: Capabilities,
    middleware_count: usize,
}

impl Endpoint {
    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Number of middleware (global + route) wrapped around each handler
    pub fn middleware_count(&self) -> usize {
        self.middleware_count
    }
}

/// The API: an ordered route table plus the global middleware list.
///
/// Routes and global middleware are configured through `&mut self` during setup.
/// Serving wraps the API in an `Arc` (see [`HttpServer`](crate::server::HttpServer)),
/// after which it can only be read.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use webapi_router::{Capabilities, IncomingRequest, Reply, WebApi};
///
/// let mut api = WebApi::new();
/// api.add(
///     r"^/items/(?P<id>\d+)$",
///     Capabilities::new().on(Method::GET, |ctx| Reply::ok(ctx.parameter("id").to_string())),
/// )
/// .unwrap();
///
/// let resp = api.handle(IncomingRequest::new("GET", "/items/42"));
/// assert_eq!(resp.status, 200);
/// assert_eq!(resp.body, br#"{"data":"42"}"#.to_vec());
/// ```
#[derive(Default)]
pub struct WebApi {
    router: Router<Endpoint>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl WebApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the global middleware for every route added after this call.
    ///
    /// Replaces any previously applied list. Routes that are already registered
    /// keep the chain they were registered with.
    pub fn apply<I>(&mut self, middleware: I)
    where
        I: IntoIterator<Item = Arc<dyn Middleware>>,
    {
        self.middleware = middleware.into_iter().collect();
        info!(
            global_middleware = self.middleware.len(),
            "Global middleware applied"
        );
    }

    pub fn global_middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }

    /// Register `resource` under `pattern` with no route-specific middleware.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if `pattern` does not compile; nothing is added.
    pub fn add<R: Resource>(&mut self, pattern: &str, resource: R) -> Result<(), PatternError> {
        self.add_with(pattern, resource, Vec::new())
    }

    /// Register `resource` under `pattern`, wrapped by the current global
    /// middleware followed by `middleware`.
    ///
    /// The last middleware in the combined list is the outermost wrapper.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] if `pattern` does not compile; nothing is added.
    pub fn add_with<R, I>(
        &mut self,
        pattern: &str,
        resource: R,
        middleware: I,
    ) -> Result<(), PatternError>
    where
        R: Resource,
        I: IntoIterator<Item = Arc<dyn Middleware>>,
    {
        let chain: Vec<Arc<dyn Middleware>> = self
            .middleware
            .iter()
            .map(Arc::clone)
            .chain(middleware)
            .collect();

        let capabilities = Arc::new(resource)
            .capabilities()
            .map_handlers(|h| compose(&chain, h));

        debug!(
            pattern = %pattern,
            methods = ?capabilities.allowed_methods(),
            middleware_count = chain.len(),
            "Resource capabilities resolved"
        );

        self.router.register(
            pattern,
            Endpoint {
                capabilities,
                middleware_count: chain.len(),
            },
        )
    }

    pub fn router(&self) -> &Router<Endpoint> {
        &self.router
    }

    /// Route and invoke the handler for `request`.
    ///
    /// # Errors
    ///
    /// * [`DispatchError::NotFound`] - no pattern matched; nothing ran
    /// * [`DispatchError::MethodNotAllowed`] - the matched resource does not serve
    ///   the method; no middleware or handler ran
    /// * [`DispatchError::HandlerPanicked`] - the handler or a middleware panicked
    pub fn dispatch(&self, request: IncomingRequest) -> Result<Reply, DispatchError> {
        let IncomingRequest {
            method,
            path: target,
            headers,
            body,
        } = request;
        let (raw_path, _) = split_target(&target);
        let path = decode_path(raw_path);

        let Some(route_match) = self.router.route(&path) else {
            warn!(method = %method, path = %path, "No route matched");
            return Err(DispatchError::NotFound {
                path: path.to_string(),
            });
        };
        let route = route_match.route;

        let handler = Method::from_bytes(method.as_bytes())
            .ok()
            .and_then(|m| {
                route
                    .target()
                    .capabilities
                    .resolve(&m)
                    .map(|h| (m, Arc::clone(h)))
            });
        let Some((method, handler)) = handler else {
            warn!(
                method = %method,
                path = %path,
                route_pattern = %route.pattern(),
                allowed = ?route.target().capabilities.allowed_methods(),
                "Method not allowed"
            );
            return Err(DispatchError::MethodNotAllowed {
                method,
                pattern: route.pattern().to_string(),
            });
        };

        let ctx = RequestContext::new(method, &target, headers, body, route_match.path_params);

        let start = Instant::now();
        let Ok(reply) = catch_unwind(AssertUnwindSafe(|| handler(&ctx))) else {
            error!(
                request_id = %ctx.request_id(),
                method = %ctx.method(),
                path = %ctx.path(),
                "Handler panicked"
            );
            return Err(DispatchError::HandlerPanicked {
                path: ctx.path().to_string(),
            });
        };

        debug!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %ctx.path(),
            route_pattern = %route.pattern(),
            status = reply.status,
            duration_us = start.elapsed().as_micros(),
            "Handler completed"
        );

        Ok(reply)
    }

    /// Full pipeline: dispatch, then serialize.
    ///
    /// 404, 405 and handler panics are written with no body. A reply that
    /// cannot be encoded becomes a bare 500.
    pub fn handle(&self, request: IncomingRequest) -> ApiResponse {
        match self.dispatch(request) {
            Ok(reply) => ApiResponse::from_reply(&reply),
            Err(e) => ApiResponse::empty(e.status()),
        }
    }
}

impl fmt::Debug for WebApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebApi")
            .field("routes", &self.router.patterns())
            .field("global_middleware", &self.middleware.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_api_is_empty() {
        let api = WebApi::new();
        assert!(api.router().is_empty());
        assert!(api.global_middleware().is_empty());
    }

    #[test]
    fn test_apply_replaces_global_middleware() {
        let mut api = WebApi::new();
        let mw: Arc<dyn Middleware> = Arc::new(|h: Handler| h);
        api.apply([Arc::clone(&mw), Arc::clone(&mw)]);
        assert_eq!(api.global_middleware().len(), 2);
        api.apply([mw]);
        assert_eq!(api.global_middleware().len(), 1);
    }

    #[test]
    fn test_reply_helpers() {
        assert!(Reply::next().is_deferred());
        assert!(Reply::next().envelope.is_empty());
        assert_eq!(Reply::created(json!({})).status, 201);
        let r = Reply::error(500, "boom");
        assert!(r.envelope.data().is_none());
        assert!(r.envelope.error().is_some());
        let r: Reply = (204, Envelope::new()).into();
        assert_eq!(r.status, 204);
    }

    #[test]
    fn test_dispatch_error_status() {
        let nf = DispatchError::NotFound { path: "/x".into() };
        assert_eq!(nf.status(), 404);
        assert_eq!(nf.to_string(), "no route matches '/x'");
        let na = DispatchError::MethodNotAllowed {
            method: "POST".into(),
            pattern: "^/x$".into(),
        };
        assert_eq!(na.status(), 405);
    }

    #[test]
    fn test_invalid_method_token_is_405() {
        let mut api = WebApi::new();
        api.add("^/x$", Capabilities::new().on(Method::GET, |_| Reply::ok(1)))
            .unwrap();
        let err = api
            .dispatch(IncomingRequest::new("BAD METHOD", "/x"))
            .unwrap_err();
        assert_eq!(err.status(), 405);
    }

    #[test]
    fn test_query_string_ignored_for_routing() {
        let mut api = WebApi::new();
        api.add(
            "^/search$",
            Capabilities::new().on(Method::GET, |ctx| {
                Reply::ok(ctx.query_param("q").map(|q| q.into_owned()))
            }),
        )
        .unwrap();
        let resp = api.handle(IncomingRequest::new("GET", "/search?q=abc"));
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, br#"{"data":"abc"}"#.to_vec());
    }

    #[test]
    fn test_handler_panic_is_500() {
        let mut api = WebApi::new();
        api.add(
            "^/panic$",
            Capabilities::new().on(Method::GET, |_| panic!("handler bug")),
        )
        .unwrap();
        let resp = api.handle(IncomingRequest::new("GET", "/panic"));
        assert_eq!(resp, ApiResponse::empty(500));
    }

    #[test]
    fn test_endpoint_records_middleware_count() {
        let mut api = WebApi::new();
        let mw: Arc<dyn Middleware> = Arc::new(|h: Handler| h);
        api.apply([Arc::clone(&mw)]);
        api.add_with("^/a$", Capabilities::new(), [mw]).unwrap();
        let route = api.router().iter().next().unwrap();
        assert_eq!(route.target().middleware_count(), 2);
    }
}
