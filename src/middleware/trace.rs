//! Per-request tracing middleware.

use std::time::Instant;

use tracing::{Instrument, debug, info_span, warn};

use crate::error::Error;
use crate::middleware::Next;
use crate::request::Request;
use crate::response::Reply;

/// Opens a span carrying method, path and request id, and logs the outcome
/// with its latency.
///
/// ```rust
/// use proxy_router::{Registrar, Resolver, Request, Response, middleware};
///
/// async fn ping(_req: Request) -> Result<Response, proxy_router::Error> {
///     Ok(Response::text("pong"))
/// }
///
/// let mut app = Resolver::new();
/// app.get("/ping").middleware(middleware::trace).to(ping);
/// ```
pub async fn trace(req: Request, next: Next) -> Result<Reply, Error> {
    let span = info_span!(
        "request",
        method = %req.method(),
        path = %req.path(),
        request_id = %req.invocation().request_id,
    );
    let started = Instant::now();

    let result = next.run(req).instrument(span.clone()).await;
    let latency_us = started.elapsed().as_micros();

    let _entered = span.enter();
    match &result {
        Ok(Reply::Response(response)) => {
            debug!(status = response.status_code, latency_us, "request handled");
        }
        Ok(Reply::Value(_)) => debug!(latency_us, "request handled"),
        Err(e) => warn!(error = %e, latency_us, "request failed"),
    }
    result
}
