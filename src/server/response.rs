use http::StatusCode;
use may_minihttp::Response;
use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::dispatcher::Reply;

/// Type-erased JSON payload.
///
/// Handlers put any `Serialize` value into an [`Envelope`]; it is only turned into
/// JSON when the response is written, so a value that cannot be encoded surfaces
/// as an [`EncodeError`] at that point.
#[derive(Clone)]
pub struct Payload(Arc<dyn EncodeJson>);

trait EncodeJson: Send + Sync {
    fn encode_json(&self) -> serde_json::Result<Value>;
}

impl<T: Serialize + Send + Sync> EncodeJson for T {
    fn encode_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

impl Payload {
    pub fn new<T: Serialize + Send + Sync + 'static>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Encode the payload as a JSON value
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if the value's `Serialize` impl fails.
    pub fn to_value(&self) -> Result<Value, EncodeError> {
        self.0.encode_json().map_err(EncodeError)
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.encode_json() {
            Ok(v) => write!(f, "Payload({v})"),
            Err(_) => f.write_str("Payload(<unencodable>)"),
        }
    }
}

/// Response body shape: `{"data": ..., "error": ...}`.
///
/// Either key is left out of the JSON when it is unset.
#[derive(Debug, Clone, Default)]
pub struct Envelope {
    data: Option<Payload>,
    error: Option<Payload>,
}

impl Envelope {
    /// An envelope with neither `data` nor `error`
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data<T: Serialize + Send + Sync + 'static>(data: T) -> Self {
        Self {
            data: Some(Payload::new(data)),
            error: None,
        }
    }

    pub fn with_error<T: Serialize + Send + Sync + 'static>(error: T) -> Self {
        Self {
            data: None,
            error: Some(Payload::new(error)),
        }
    }

    pub fn set_data<T: Serialize + Send + Sync + 'static>(&mut self, data: T) {
        self.data = Some(Payload::new(data));
    }

    pub fn set_error<T: Serialize + Send + Sync + 'static>(&mut self, error: T) {
        self.error = Some(Payload::new(error));
    }

    pub fn data(&self) -> Option<&Payload> {
        self.data.as_ref()
    }

    pub fn error(&self) -> Option<&Payload> {
        self.error.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_none() && self.error.is_none()
    }

    /// Encode to a JSON object
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if either payload fails to serialize.
    pub fn to_value(&self) -> Result<Value, EncodeError> {
        let mut map = Map::new();
        if let Some(data) = &self.data {
            map.insert("data".to_string(), data.to_value()?);
        }
        if let Some(error) = &self.error {
            map.insert("error".to_string(), error.to_value()?);
        }
        Ok(Value::Object(map))
    }

    /// Encode to JSON bytes
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if either payload fails to serialize.
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        serde_json::to_vec(self).map_err(EncodeError)
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = usize::from(self.data.is_some()) + usize::from(self.error.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(data) = &self.data {
            let v = data.to_value().map_err(S::Error::custom)?;
            map.serialize_entry("data", &v)?;
        }
        if let Some(error) = &self.error {
            let v = error.to_value().map_err(S::Error::custom)?;
            map.serialize_entry("error", &v)?;
        }
        map.end()
    }
}

/// Returned when an envelope payload cannot be encoded as JSON.
#[derive(Debug)]
pub struct EncodeError(serde_json::Error);

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to encode response envelope: {}", self.0)
    }
}

impl std::error::Error for EncodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

/// Content types the dispatch core can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Json => "application/json",
        }
    }

    fn header_line(self) -> &'static str {
        match self {
            ContentType::Json => "Content-Type: application/json",
        }
    }
}

/// What the dispatch core hands back to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: Option<ContentType>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// A response with a status and no body (404, 405, encode failures)
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            content_type: None,
            body: Vec::new(),
        }
    }

    /// Serialize a handler reply.
    ///
    /// A reply whose envelope cannot be encoded, or whose status is not a valid
    /// HTTP status code, becomes a bare 500. Informational, 204 and 304 replies
    /// are written without a body whatever their envelope holds.
    pub fn from_reply(reply: &Reply) -> Self {
        if StatusCode::from_u16(reply.status).is_err() {
            warn!(status = reply.status, "Handler produced an invalid status code");
            return Self::empty(500);
        }
        if !status_allows_body(reply.status) {
            debug!(status = reply.status, "Envelope dropped for bodiless status");
            return Self::empty(reply.status);
        }
        match reply.envelope.encode() {
            Ok(body) => {
                debug!(status = reply.status, size_bytes = body.len(), "Response encoded");
                Self {
                    status: reply.status,
                    content_type: Some(ContentType::Json),
                    body,
                }
            }
            Err(e) => {
                error!(status = reply.status, error = %e, "Response encoding failed");
                Self::empty(500)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Whether a response with `status` may carry a body (RFC 9110 §6.4.1)
pub fn status_allows_body(status: u16) -> bool {
    !matches!(status, 100..=199 | 204 | 304)
}

/// Reason phrase for a status code, `"Unknown"` when the code has none
pub fn status_reason(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown")
}

/// Write an [`ApiResponse`] to the may_minihttp response.
pub fn write_api_response(res: &mut Response, api_response: ApiResponse) {
    res.status_code(api_response.status as usize, status_reason(api_response.status));
    if let Some(ct) = api_response.content_type {
        res.header(ct.header_line());
    }
    res.body_vec(api_response.body);
}
