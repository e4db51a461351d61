//! Helpers shared by the integration test binaries.

#![allow(dead_code)]

use std::sync::Once;

use proxy_router::{Error, InvocationContext, Json, ProxyEvent, Request, Response};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Routes test logs through the libtest writer. Set `RUST_LOG` to see them.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn event(method: &str, path: &str) -> ProxyEvent {
    ProxyEvent::new(method, path)
}

pub fn invocation() -> InvocationContext {
    InvocationContext::new("test-request-id")
}

pub async fn ok(_req: Request) -> Result<Response, Error> {
    Ok(Response::json(r#"{"message":"ok"}"#))
}

/// Answers with the captured path arguments as a JSON object.
pub async fn echo_args(req: Request) -> Result<Json<Value>, Error> {
    Ok(Json(json!(req.args())))
}

pub fn body_json(body: &str) -> Value {
    serde_json::from_str(body).expect("body is JSON")
}
