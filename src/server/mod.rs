//! # Server Module
//!
//! The transport-facing side of the crate.
//!
//! - [`request`] - [`RequestContext`] handed to handlers, plus the conversion from a
//!   `may_minihttp` request into an [`IncomingRequest`]
//! - [`response`] - the JSON [`Envelope`] and its serialization into an [`ApiResponse`]
//! - [`service`] - [`ApiService`], the `may_minihttp::HttpService` over a frozen
//!   [`WebApi`](crate::WebApi)
//! - [`http_server`] - starting and stopping the server

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle, MAX_HEADERS};
pub use request::{
    decode_path, parse_request, split_target, Body, DecodeError, HeaderVec, IncomingRequest,
    RequestContext, MAX_INLINE_HEADERS,
};
pub use response::{
    status_allows_body, status_reason, write_api_response, ApiResponse, ContentType, EncodeError,
    Envelope, Payload,
};
pub use service::ApiService;
