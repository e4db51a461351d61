//! Route handlers.
//!
//! Every route stores its handler as the same erased type, whatever `async
//! fn` the caller registered, so a resolver can keep all routes in one
//! `Vec<Route>` and share a handler between the fan-out routes of one
//! registration.
//!
//! ```text
//! app.get("/users/<id>").to(get_user)
//!        ↓ Handler::into_boxed_handler
//! Arc<FnHandler<get_user>>  as  BoxedHandler
//!        ↓ per request
//! ErasedHandler::call(req) → BoxFuture → get_user(req).await?.into_reply()
//! ```
//!
//! A composed middleware chain is a `BoxedHandler` too (see
//! [`middleware::compose`](crate::middleware::compose)), so the resolver
//! dispatches a bare handler and a wrapped one the same way.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::Error;
use crate::request::Request;
use crate::response::{IntoReply, Reply};

/// The future every erased handler returns: a [`Reply`] or the handler's
/// error. `Send` so a multi-threaded runtime may poll it anywhere.
pub type BoxFuture = Pin<Box<dyn Future<Output = Result<Reply, Error>> + Send + 'static>>;

/// Object-safe call interface behind [`BoxedHandler`].
///
/// Public only because [`Handler::into_boxed_handler`] names it.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A handler shared by reference count between routes and requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Any async function usable as a route handler.
///
/// Satisfied automatically by functions and closures of the shape
///
/// ```text
/// async fn name(req: Request) -> Result<impl IntoReply, Error>
/// ```
///
/// where the reply is a [`Response`](crate::Response), a
/// `serde_json::Value`, a [`Json`](crate::Json) wrapper, a
/// [`ProblemDocument`](crate::ProblemDocument) or a string. Sealed.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
    R: IntoReply + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
    R: IntoReply + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, Error>> + Send + 'static,
    R: IntoReply + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let reply = (self.0)(req);
        Box::pin(async move { reply.await?.into_reply() })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::event::{InvocationContext, ProxyEvent};
    use crate::request::Context;
    use crate::response::Response;

    #[tokio::test]
    async fn erased_handler_converts_its_reply() {
        async fn created(_req: Request) -> Result<Response, Error> {
            Ok(Response::status(201))
        }

        let req = Request::new(
            Arc::new(ProxyEvent::new("POST", "/")),
            Arc::new(InvocationContext::default()),
            Default::default(),
            Arc::new(Context::new()),
        );
        let reply = created.into_boxed_handler().call(req).await.unwrap();
        assert_eq!(reply, Reply::Response(Response::status(201)));
    }
}
