use std::sync::Arc;

use crate::dispatcher::{Handler, Reply};
use crate::server::RequestContext;

/// A handler-to-handler transformation.
///
/// Any `Fn(Handler) -> Handler` closure is a middleware. The returned handler
/// decides whether and when to call the one it wraps, so it can inspect or
/// rewrite the reply, or answer on its own without calling it at all.
pub trait Middleware: Send + Sync {
    fn wrap(&self, next: Handler) -> Handler;
}

impl<F> Middleware for F
where
    F: Fn(Handler) -> Handler + Send + Sync,
{
    fn wrap(&self, next: Handler) -> Handler {
        self(next)
    }
}

/// Compose `middleware` around `base`.
///
/// The list is folded left to right and each middleware wraps the result so
/// far: `m[n-1](...m[1](m[0](base)))`. The last middleware is the outermost. It
/// runs first and can short-circuit everything inside it. The first one runs
/// closest to `base`.
pub fn compose(middleware: &[Arc<dyn Middleware>], base: Handler) -> Handler {
    middleware.iter().fold(base, |inner, m| m.wrap(inner))
}

/// Same fold as [`compose`], for middleware that is not behind an `Arc`.
pub fn apply<M, I>(handler: Handler, middleware: I) -> Handler
where
    M: Middleware,
    I: IntoIterator<Item = M>,
{
    middleware.into_iter().fold(handler, |inner, m| m.wrap(inner))
}

/// Run `handlers` in order and return the first reply with a non-zero status.
///
/// A handler defers to the next one by returning [`next()`]. When every handler
/// defers, the last (deferred) reply is returned as is and carries no meaning;
/// an empty list yields the defer sentinel.
pub fn handlers(ctx: &RequestContext, handlers: &[Handler]) -> Reply {
    let mut reply = Reply::next();
    for handler in handlers {
        reply = handler(ctx);
        if !reply.is_deferred() {
            return reply;
        }
    }
    reply
}

/// The defer sentinel: zero status, empty envelope.
pub fn next() -> Reply {
    Reply::next()
}
