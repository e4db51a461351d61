//! Middleware layer.
//!
//! Middleware wraps a route's handler and is the right place for
//! cross-cutting concerns: tracing, authentication, header rewriting.
//!
//! A middleware is any async function taking the [`Request`] and a [`Next`]
//! continuation. Chains are onion-shaped: for middlewares `[a, b]` around
//! handler `h`, the call order is `a → b → h → b → a`.
//!
//! ```rust
//! use proxy_router::middleware::Next;
//! use proxy_router::{Error, IntoReply, ProblemDocument, Reply, Request};
//!
//! async fn require_api_key(req: Request, next: Next) -> Result<Reply, Error> {
//!     if req.header("x-api-key").is_none() {
//!         // Never calling `next` short-circuits the chain.
//!         return ProblemDocument::unauthorized("missing API key").into_reply();
//!     }
//!     next.run(req).await
//! }
//! ```
//!
//! Errors from any link reach the resolver's caller unchanged.

mod trace;

pub use trace::trace;

use std::future::Future;
use std::sync::Arc;

use crate::error::Error;
use crate::handler::{BoxFuture, BoxedHandler, ErasedHandler};
use crate::request::Request;
use crate::response::{IntoReply, Reply};

/// The remainder of a middleware chain.
///
/// Call [`Next::run`] to continue; drop it to short-circuit.
pub struct Next(BoxedHandler);

impl Next {
    /// Runs the rest of the chain, ending with the route's handler.
    pub fn run(self, req: Request) -> BoxFuture {
        self.0.call(req)
    }
}

/// Internal dispatch interface, see [`ErasedHandler`].
#[doc(hidden)]
pub trait ErasedMiddleware {
    fn handle(&self, req: Request, next: Next) -> BoxFuture;
}

/// A type-erased middleware shared by every route that lists it.
#[doc(hidden)]
pub type BoxedMiddleware = Arc<dyn ErasedMiddleware + Send + Sync + 'static>;

/// Implemented for every valid middleware function:
///
/// ```text
/// async fn name(req: Request, next: Next) -> Result<impl IntoReply, Error>
/// ```
pub trait Middleware: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_middleware(self) -> BoxedMiddleware;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
    R: IntoReply + Send + 'static,
{
}

impl<F, Fut, R> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
    R: IntoReply + Send + 'static,
{
    fn into_boxed_middleware(self) -> BoxedMiddleware {
        Arc::new(FnMiddleware(self))
    }
}

struct FnMiddleware<F>(F);

impl<F, Fut, R> ErasedMiddleware for FnMiddleware<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
    R: IntoReply + Send + 'static,
{
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let fut = (self.0)(req, next);
        Box::pin(async move { fut.await?.into_reply() })
    }
}

/// Wraps `handler` in `middlewares`, first middleware outermost.
///
/// The chain is folded right to left: the last middleware wraps the handler,
/// the one before it wraps that, and so on.
pub fn compose(middlewares: &[BoxedMiddleware], handler: BoxedHandler) -> BoxedHandler {
    middlewares.iter().rev().fold(handler, |next, middleware| {
        Arc::new(Link { middleware: Arc::clone(middleware), next })
    })
}

/// One layer of the onion: a middleware and everything inside it.
struct Link {
    middleware: BoxedMiddleware,
    next: BoxedHandler,
}

impl ErasedHandler for Link {
    fn call(&self, req: Request) -> BoxFuture {
        self.middleware.handle(req, Next(Arc::clone(&self.next)))
    }
}

/// Runs `handler` behind `middlewares` for one request.
pub(crate) async fn dispatch(
    middlewares: &[BoxedMiddleware],
    handler: &BoxedHandler,
    req: Request,
) -> Result<Reply, Error> {
    compose(middlewares, Arc::clone(handler)).call(req).await
}
