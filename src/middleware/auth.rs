use std::sync::Arc;
use tracing::warn;

use super::Middleware;
use crate::dispatcher::{Handler, Reply};
use crate::server::RequestContext;

/// Rejects requests whose `Authorization` header is not the configured token.
///
/// Rejected requests get `401 {"error": "Unauthorized"}` and never reach the
/// wrapped handler.
pub struct AuthMiddleware {
    token: Arc<str>,
}

impl AuthMiddleware {
    pub fn new(token: impl Into<Arc<str>>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl Middleware for AuthMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        let token = Arc::clone(&self.token);
        Arc::new(move |ctx: &RequestContext| match ctx.header("authorization") {
            Some(h) if h == token.as_ref() => next(ctx),
            _ => {
                warn!(
                    request_id = %ctx.request_id(),
                    path = %ctx.path(),
                    "Request rejected: missing or invalid authorization"
                );
                Reply::error(401, "Unauthorized")
            }
        })
    }
}
