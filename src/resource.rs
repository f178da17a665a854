//! # Resources and method capabilities
//!
//! A resource is whatever the application registers under a route. It declares
//! which HTTP methods it serves by implementing any of [`SupportsGet`],
//! [`SupportsPost`], [`SupportsPut`] and [`SupportsDelete`], and listing them in
//! [`Resource::capabilities`]. The resulting [`Capabilities`] table is built once
//! at registration; dispatch is a lookup in that table.
//!
//! ```rust
//! use std::sync::Arc;
//! use webapi_router::{Capabilities, Reply, RequestContext, Resource, SupportsGet};
//!
//! struct Health;
//!
//! impl SupportsGet for Health {
//!     fn get(&self, _ctx: &RequestContext) -> Reply {
//!         Reply::ok(serde_json::json!({"status": "ok"}))
//!     }
//! }
//!
//! impl Resource for Health {
//!     fn capabilities(self: Arc<Self>) -> Capabilities {
//!         Capabilities::new().get(&self)
//!     }
//! }
//! ```

use http::Method;
use std::fmt;
use std::sync::Arc;

use crate::dispatcher::{Handler, Reply};
use crate::server::RequestContext;

/// A resource that answers GET requests
pub trait SupportsGet: Send + Sync + 'static {
    fn get(&self, ctx: &RequestContext) -> Reply;
}

/// A resource that answers POST requests
pub trait SupportsPost: Send + Sync + 'static {
    fn post(&self, ctx: &RequestContext) -> Reply;
}

/// A resource that answers PUT requests
pub trait SupportsPut: Send + Sync + 'static {
    fn put(&self, ctx: &RequestContext) -> Reply;
}

/// A resource that answers DELETE requests
pub trait SupportsDelete: Send + Sync + 'static {
    fn delete(&self, ctx: &RequestContext) -> Reply;
}

/// Anything that can be registered on a route.
pub trait Resource: Send + Sync + 'static {
    /// List the methods this resource serves.
    fn capabilities(self: Arc<Self>) -> Capabilities;
}

/// Handlers for the four dispatchable methods. Missing entries answer 405.
#[derive(Clone, Default)]
pub struct Capabilities {
    get: Option<Handler>,
    post: Option<Handler>,
    put: Option<Handler>,
    delete: Option<Handler>,
}

impl Capabilities {
    /// A table with no capabilities; every method is unsupported
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get<R: SupportsGet>(mut self, resource: &Arc<R>) -> Self {
        let r = Arc::clone(resource);
        self.get = Some(Arc::new(move |ctx: &RequestContext| r.get(ctx)));
        self
    }

    #[must_use]
    pub fn post<R: SupportsPost>(mut self, resource: &Arc<R>) -> Self {
        let r = Arc::clone(resource);
        self.post = Some(Arc::new(move |ctx: &RequestContext| r.post(ctx)));
        self
    }

    #[must_use]
    pub fn put<R: SupportsPut>(mut self, resource: &Arc<R>) -> Self {
        let r = Arc::clone(resource);
        self.put = Some(Arc::new(move |ctx: &RequestContext| r.put(ctx)));
        self
    }

    #[must_use]
    pub fn delete<R: SupportsDelete>(mut self, resource: &Arc<R>) -> Self {
        let r = Arc::clone(resource);
        self.delete = Some(Arc::new(move |ctx: &RequestContext| r.delete(ctx)));
        self
    }

    /// Bind a closure to a method. Methods other than GET, POST, PUT and DELETE
    /// are ignored, since they can never be dispatched.
    #[must_use]
    pub fn on<F>(mut self, method: Method, f: F) -> Self
    where
        F: Fn(&RequestContext) -> Reply + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(f);
        match method {
            Method::GET => self.get = Some(handler),
            Method::POST => self.post = Some(handler),
            Method::PUT => self.put = Some(handler),
            Method::DELETE => self.delete = Some(handler),
            _ => {}
        }
        self
    }

    /// Look up the handler for `method`.
    ///
    /// Returns `None` when the resource does not serve the method, and always
    /// for methods other than GET, POST, PUT and DELETE.
    pub fn resolve(&self, method: &Method) -> Option<&Handler> {
        match *method {
            Method::GET => self.get.as_ref(),
            Method::POST => self.post.as_ref(),
            Method::PUT => self.put.as_ref(),
            Method::DELETE => self.delete.as_ref(),
            _ => None,
        }
    }

    pub fn supports(&self, method: &Method) -> bool {
        self.resolve(method).is_some()
    }

    /// Methods with a handler, in GET, POST, PUT, DELETE order
    pub fn allowed_methods(&self) -> Vec<Method> {
        [Method::GET, Method::POST, Method::PUT, Method::DELETE]
            .into_iter()
            .filter(|m| self.supports(m))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.get.is_none() && self.post.is_none() && self.put.is_none() && self.delete.is_none()
    }

    /// Replace every handler with `f(handler)`.
    #[must_use]
    pub fn map_handlers(self, f: impl Fn(Handler) -> Handler) -> Self {
        Self {
            get: self.get.map(&f),
            post: self.post.map(&f),
            put: self.put.map(&f),
            delete: self.delete.map(&f),
        }
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("methods", &self.allowed_methods())
            .finish()
    }
}

impl Resource for Capabilities {
    fn capabilities(self: Arc<Self>) -> Capabilities {
        Arc::unwrap_or_clone(self)
    }
}
