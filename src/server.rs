//! Local development server.
//!
//! Serverless platforms deliver requests as proxy events. On a laptop there
//! is no platform, so [`LocalServer`] plays its part: it accepts plain HTTP,
//! turns each request into a [`ProxyEvent`], runs it through the
//! [`Resolver`], and writes the [`ProxyResponse`] back as HTTP.
//!
//! ```rust,no_run
//! use proxy_router::{LocalServer, Resolver, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), proxy_router::Error> {
//!     let app = Resolver::new();
//!     LocalServer::from_config(ServerConfig::from_env()?).serve(app).await
//! }
//! ```
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C the server stops accepting connections, lets every
//! in-flight connection finish, and returns from [`LocalServer::serve`].

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::Error;
use crate::event::{InvocationContext, ProxyEvent};
use crate::resolver::{Resolver, internal_error};
use crate::response::ProxyResponse;

/// Environment variable holding the port to listen on.
pub const PORT_ENV: &str = "TEST_SERVER_PORT";

pub const DEFAULT_PORT: u16 = 4000;

/// Where the local server listens.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
}

impl ServerConfig {
    /// `0.0.0.0:$TEST_SERVER_PORT`, or port 4000 when unset.
    pub fn from_env() -> Result<Self, Error> {
        let port = match std::env::var(PORT_ENV) {
            Ok(raw) => raw.trim().parse::<u16>().map_err(|e| {
                Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("{PORT_ENV}={raw:?} is not a port: {e}"),
                ))
            })?,
            Err(_) => DEFAULT_PORT,
        };
        Ok(Self { addr: SocketAddr::from(([0, 0, 0, 0], port)) })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)) }
    }
}

/// The local HTTP server.
pub struct LocalServer {
    addr: SocketAddr,
}

impl LocalServer {
    /// Configures the server to bind to `addr` when [`serve`](Self::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    pub fn from_config(config: ServerConfig) -> Self {
        Self { addr: config.addr }
    }

    /// Starts accepting connections and dispatching them through `resolver`.
    ///
    /// Returns only after a full graceful shutdown.
    pub async fn serve(self, resolver: Resolver) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // Shared read-only across every connection task.
        let resolver = Arc::new(resolver);

        info!(addr = %self.addr, "local server listening");

        // JoinSet tracks every spawned connection task so we can wait for
        // them all to finish during graceful shutdown.
        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting at once.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let resolver = Arc::clone(&resolver);
                    // TokioIo adapts tokio's AsyncRead/AsyncWrite to the hyper
                    // IO traits.
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req| {
                            let resolver = Arc::clone(&resolver);
                            async move { dispatch(resolver, req).await }
                        });

                        // `auto::Builder` serves HTTP/1.1 and HTTP/2, whichever
                        // the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("local server stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one HTTP request. Every failure becomes a `500` problem document,
/// so hyper never sees an error.
async fn dispatch(
    resolver: Arc<Resolver>,
    req: hyper::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let response = match to_event(req).await {
        Ok(event) => {
            let invocation = InvocationContext::new(Uuid::new_v4().to_string());
            resolver.handle(event, invocation).await
        }
        Err(e) => {
            error!(error = %e, "cannot build proxy event");
            internal_error(&format!("Error handling request: {e}"))
        }
    };

    Ok(into_http(response).unwrap_or_else(|e| {
        error!(error = %e, "cannot build HTTP response");
        let fallback = internal_error(&format!("Error constructing response: {e}"));
        let mut res = http::Response::new(Full::new(Bytes::from(fallback.body)));
        *res.status_mut() = http::StatusCode::INTERNAL_SERVER_ERROR;
        if let Ok(ct) = http::HeaderValue::from_str(crate::problem::MIME_TYPE) {
            res.headers_mut().insert(http::header::CONTENT_TYPE, ct);
        }
        res
    }))
}

async fn to_event(req: hyper::Request<Incoming>) -> Result<ProxyEvent, Error> {
    let (parts, body) = req.into_parts();
    let body = body
        .collect()
        .await
        .map_err(|e| Error::InvalidEvent(format!("cannot read request body: {e}")))?
        .to_bytes();
    let body = String::from_utf8_lossy(&body).into_owned();

    let mut headers: HashMap<String, String> = HashMap::new();
    let mut multi_value_headers: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in &parts.headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        let values: Vec<String> = value.split(',').map(|v| v.trim().to_owned()).collect();
        if values.len() > 1 {
            multi_value_headers.entry(name.as_str().to_owned()).or_default().extend(values);
        }
        headers
            .entry(name.as_str().to_owned())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    headers
        .entry("content-length".to_owned())
        .or_insert_with(|| body.len().to_string());

    let (query, multi_value_query) = parse_query(parts.uri.query().unwrap_or_default());

    Ok(ProxyEvent {
        http_method: parts.method.as_str().to_owned(),
        path: parts.uri.path().to_owned(),
        headers,
        body: Some(body),
        is_base64_encoded: false,
        query_string_parameters: Some(query),
        multi_value_query_string_parameters: Some(multi_value_query),
        multi_value_headers: Some(multi_value_headers),
    })
}

/// Decodes `a=1&b=2,3` into single-value (`a`) and multi-value (`b`) maps.
/// Percent escapes and `+` are decoded before the comma split.
fn parse_query(query: &str) -> (HashMap<String, String>, HashMap<String, Vec<String>>) {
    let mut single = HashMap::new();
    let mut multi = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let values: Vec<String> = value.split(',').map(|v| v.trim().to_owned()).collect();
        if values.len() > 1 {
            multi.insert(key.into_owned(), values);
        } else {
            single.insert(key.into_owned(), value.into_owned());
        }
    }
    (single, multi)
}

fn into_http(response: ProxyResponse) -> Result<http::Response<Full<Bytes>>, Error> {
    let body = response.body_bytes()?;
    let mut builder = http::Response::builder().status(response.status_code);
    for (name, value) in &response.headers {
        if http::HeaderValue::from_str(value).is_err() {
            warn!(header = %name, "dropping header with invalid value");
            continue;
        }
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
        .body(Full::new(Bytes::from(body)))
        .map_err(|e| Error::Response(e.to_string()))
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or Ctrl-C. On Windows only Ctrl-C exists.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // `pending()` never resolves, so on non-Unix platforms the SIGTERM arm
    // is effectively disabled.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
