use http::Method;
use may_minihttp::Request;
use serde::de::DeserializeOwned;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::ids::RequestId;
use crate::router::ParameterSet;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Header storage, names lowercased
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Request body as delivered by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Body {
    #[default]
    Empty,
    Bytes(Vec<u8>),
    /// The transport failed while reading the body
    Unreadable { kind: io::ErrorKind, message: String },
}

impl Body {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Body::Bytes(b) => b,
            Body::Empty | Body::Unreadable { .. } => &[],
        }
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        if bytes.is_empty() {
            Body::Empty
        } else {
            Body::Bytes(bytes)
        }
    }
}

/// Raw request as handed over by the transport, before routing.
#[derive(Debug, Clone, Default)]
pub struct IncomingRequest {
    pub method: String,
    /// Request target, possibly including a query string
    pub path: String,
    pub headers: HeaderVec,
    pub body: Body,
}

impl IncomingRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Add a header; the name is stored lowercased
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .push((Arc::<str>::from(name.to_ascii_lowercase()), value.into()));
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Body::from(body.into());
        self
    }
}

/// Returned when the request body cannot be decoded into the requested type.
#[derive(Debug)]
pub enum DecodeError {
    /// The body could not be read from the connection
    Io(io::Error),
    /// The body is not valid JSON for the target type
    Json(serde_json::Error),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Io(e) => write!(f, "failed to read request body: {e}"),
            DecodeError::Json(e) => write!(f, "malformed request body: {e}"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DecodeError::Io(e) => Some(e),
            DecodeError::Json(e) => Some(e),
        }
    }
}

/// Per-request view handed to handlers and middleware.
///
/// Built by the dispatcher after a route matched, dropped once the response is
/// written.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: RequestId,
    method: Method,
    path: String,
    query: Option<String>,
    headers: HeaderVec,
    body: Body,
    params: ParameterSet,
}

impl RequestContext {
    /// Build a context from its parts. `target` may include a query string.
    pub fn new(
        method: Method,
        target: &str,
        headers: HeaderVec,
        body: Body,
        params: ParameterSet,
    ) -> Self {
        let (path, query) = split_target(target);
        let request_id = RequestId::from_header_or_new(
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("x-request-id"))
                .map(|(_, v)| v.as_str()),
        );
        Self {
            request_id,
            method,
            path: decode_path(path).into_owned(),
            query: query.map(str::to_string),
            headers,
            body,
            params,
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path without the query string
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path parameter by name, `""` when the route has no such parameter
    #[inline]
    pub fn parameter(&self, name: &str) -> &str {
        self.params.get(name).unwrap_or("")
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    /// Query parameter by name, URL-decoded. The last occurrence wins.
    pub fn query_param(&self, name: &str) -> Option<Cow<'_, str>> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .filter(|(k, _)| k == name)
            .last()
            .map(|(_, v)| v)
    }

    pub fn body(&self) -> &[u8] {
        self.body.as_bytes()
    }

    /// Decode the JSON body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Io`] if the transport failed to read the body and
    /// [`DecodeError::Json`] if the body is empty or not valid JSON for `T`.
    pub fn decode_body<T: DeserializeOwned>(&self) -> Result<T, DecodeError> {
        match &self.body {
            Body::Unreadable { kind, message } => {
                Err(DecodeError::Io(io::Error::new(*kind, message.clone())))
            }
            body => serde_json::from_slice(body.as_bytes()).map_err(|e| {
                debug!(request_id = %self.request_id, error = %e, "Request body decode failed");
                DecodeError::Json(e)
            }),
        }
    }
}

/// Split a request target into path and optional query string
pub fn split_target(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}

/// Percent-decode a request path.
///
/// Malformed escapes are kept as written; bytes that do not form valid UTF-8
/// are replaced with U+FFFD.
pub fn decode_path(path: &str) -> Cow<'_, str> {
    if !path.contains('%') {
        return Cow::Borrowed(path);
    }
    match urlencoding::decode(path) {
        Ok(decoded) => decoded,
        Err(_) => {
            let bytes = urlencoding::decode_binary(path.as_bytes());
            Cow::Owned(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

/// Extract an [`IncomingRequest`] from a `may_minihttp::Request`.
pub fn parse_request(req: Request) -> IncomingRequest {
    let method = req.method().to_string();
    let path = req.path().to_string();

    let headers: HeaderVec = req
        .headers()
        .iter()
        .map(|h| {
            (
                Arc::<str>::from(h.name.to_ascii_lowercase()),
                String::from_utf8_lossy(h.value).into_owned(),
            )
        })
        .collect();

    debug!(
        method = %method,
        path = %path,
        header_count = headers.len(),
        "Headers extracted"
    );

    let mut bytes = Vec::new();
    let body = match req.body().read_to_end(&mut bytes) {
        Ok(_) => Body::from(bytes),
        Err(e) => {
            warn!(method = %method, path = %path, error = %e, "Failed to read request body");
            Body::Unreadable {
                kind: e.kind(),
                message: e.to_string(),
            }
        }
    };

    IncomingRequest {
        method,
        path,
        headers,
        body,
    }
}
