//! # webapi-router
//!
//! A small resource-dispatch layer for JSON HTTP APIs, served on the `may`
//! coroutine runtime through `may_minihttp`.
//!
//! ## Overview
//!
//! An application registers **resources** under regular-expression route
//! patterns. A resource declares which of GET, POST, PUT and DELETE it serves;
//! any other method, or a method the resource lacks, answers `405`. Named
//! capture groups in the pattern become path parameters. Handlers return a
//! status and an [`Envelope`] (`{"data": ..., "error": ...}`) which is written
//! as the JSON response body.
//!
//! ## Architecture
//!
//! - **[`router`]** - ordered regex routing; the first registered match wins
//! - **[`resource`]** - method capability traits and the per-route [`Capabilities`] table
//! - **[`dispatcher`]** - [`WebApi`]: registration, global middleware and dispatch
//! - **[`middleware`]** - handler wrappers, composition and the `handlers` fallback chain
//! - **[`server`]** - request context, JSON envelope, `may_minihttp` service and server
//! - **[`config`]** / **[`logging`]** - TOML + environment configuration and `tracing` setup
//! - **[`cli`]** / **[`demo`]** - the `webapi-router` binary and its demo API
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as HttpServer<br/>(may_minihttp)
//!     participant Api as WebApi
//!     participant Router
//!     participant Chain as Middleware Chain
//!     participant Handler
//!
//!     Client->>Server: POST /subscriptions
//!     Server->>Api: IncomingRequest
//!     Api->>Router: route(path)
//!     alt No pattern matches
//!         Api-->>Client: 404 (empty body)
//!     end
//!     Router-->>Api: Endpoint + path parameters
//!     alt Method not in capabilities
//!         Api-->>Client: 405 (empty body)
//!     end
//!     Api->>Chain: RequestContext
//!     Chain->>Handler: last middleware outermost
//!     Handler-->>Chain: (status, Envelope)
//!     Chain-->>Api: Reply
//!     Api-->>Client: status + JSON envelope
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use webapi_router::{
//!     Capabilities, IncomingRequest, Reply, RequestContext, Resource, SupportsGet, WebApi,
//! };
//!
//! struct User;
//!
//! impl SupportsGet for User {
//!     fn get(&self, ctx: &RequestContext) -> Reply {
//!         Reply::ok(format!("user {}", ctx.parameter("id")))
//!     }
//! }
//!
//! impl Resource for User {
//!     fn capabilities(self: Arc<Self>) -> Capabilities {
//!         Capabilities::new().get(&self)
//!     }
//! }
//!
//! let mut api = WebApi::new();
//! api.add(r"^/users/(?P<id>\d+)$", User).unwrap();
//!
//! let resp = api.handle(IncomingRequest::new("GET", "/users/7"));
//! assert_eq!(resp.status, 200);
//! assert_eq!(resp.body, br#"{"data":"user 7"}"#.to_vec());
//!
//! let resp = api.handle(IncomingRequest::new("DELETE", "/users/7"));
//! assert_eq!(resp.status, 405);
//! ```
//!
//! To serve it, hand the API to [`HttpServer`]:
//!
//! ```rust,no_run
//! # use webapi_router::{HttpServer, WebApi};
//! let handle = HttpServer::new(WebApi::new()).start("127.0.0.1:3002").unwrap();
//! handle.join().unwrap();
//! ```

pub mod cli;
pub mod config;
pub mod demo;
pub mod dispatcher;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod resource;
pub mod router;
pub mod server;

pub use dispatcher::{handler_fn, DispatchError, Handler, Reply, WebApi};
pub use middleware::{apply, compose, handlers, next, Middleware};
pub use resource::{
    Capabilities, Resource, SupportsDelete, SupportsGet, SupportsPost, SupportsPut,
};
pub use router::{ParameterSet, PathMatcher, PatternError, Router};
pub use server::{
    ApiResponse, DecodeError, EncodeError, Envelope, HttpServer, IncomingRequest,
    RequestContext, ServerHandle,
};
