//! # proxy-router
//!
//! A declarative HTTP router for serverless proxy events.
//!
//! ## The contract
//!
//! The platform (API Gateway, a load balancer, a function URL) terminates
//! HTTP and hands the function a proxy event. proxy-router takes it from
//! there:
//!
//! - **Matching**: `<name>` rules compiled to anchored patterns, scanned in
//!   descending source-text order, first match wins
//! - **Prefix stripping**: `/prod/users` routed as `/users`
//! - **Middleware**: onion-style async chains per route
//! - **Responses**: CORS, `Cache-Control`, gzip, base64 for binary bodies
//! - **Errors**: RFC 9457 problem documents for not-found and failures
//!
//! What the platform owns, proxy-router ignores: TLS,
//! body-size limits, rate limiting, timeouts, retries.
//!
//! ## Quick start
//!
//! ```rust
//! use proxy_router::{
//!     CorsConfig, Error, InvocationContext, Json, ProxyEvent, Registrar, Request, Resolver, Response,
//! };
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let mut app = Resolver::new().with_cors(CorsConfig::new());
//! app.get("/users/<id>").to(get_user);
//! app.post("/users").to(create_user);
//!
//! let event = ProxyEvent::new("GET", "/users/42");
//! let response = app.handle(event, InvocationContext::default()).await;
//! assert_eq!(response.status_code, 200);
//! assert_eq!(response.body, r#"{"id":"42"}"#);
//! # }
//!
//! async fn get_user(req: Request) -> Result<Json<serde_json::Value>, Error> {
//!     Ok(Json(json!({ "id": req.param("id") })))
//! }
//!
//! async fn create_user(req: Request) -> Result<Response, Error> {
//!     if req.body().unwrap_or_default().is_empty() {
//!         return Ok(Response::status(400));
//!     }
//!     Ok(Response::builder()
//!         .status(201)
//!         .header("Location", "/users/99")
//!         .json(r#"{"id":"99"}"#))
//! }
//! ```

mod cors;
mod error;
mod event;
mod handler;
mod headers;
mod method;
mod pattern;
mod problem;
mod request;
mod resolver;
mod response;
mod route;
mod router;
mod server;

pub mod middleware;

pub use cors::CorsConfig;
pub use error::{BoxError, Error};
pub use event::{InvocationContext, ProxyEvent};
pub use handler::Handler;
pub use headers::{Headers, lookup_key};
pub use method::{Method, Methods};
pub use pattern::Pattern;
pub use problem::{MIME_TYPE, ProblemDocument, ProblemType, UUID_PREFIX};
pub use request::{Args, Context, Request};
pub use resolver::{Resolver, ResolverConfig, internal_error};
pub use response::{Body, ContentType, IntoReply, Json, ProxyResponse, Reply, Response, ResponseBuilder};
pub use route::{Registrar, Route, RouteBuilder, RouteDef};
pub use router::Router;
pub use server::{LocalServer, ServerConfig};
