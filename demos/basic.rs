//! Minimal proxy-router example: JSON endpoints behind the local server.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl http://localhost:4000/prod/users/42
//!   curl -X POST http://localhost:4000/prod/users -d '{"name":"alice"}'
//!   curl -X DELETE http://localhost:4000/prod/users/42 -H 'x-api-key: secret'
//!   curl -H 'accept-encoding: gzip' http://localhost:4000/prod/v1/report --output -
//!   curl -X OPTIONS -i http://localhost:4000/prod/users

use proxy_router::middleware::{self, Next};
use proxy_router::{
    Context, CorsConfig, Error, IntoReply, Json, LocalServer, ProblemDocument, Registrar, Reply,
    Request, Resolver, Response, Router, ServerConfig,
};
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut app = Resolver::new()
        .with_cors(CorsConfig::new().expose_headers(["Location"]))
        .strip_prefixes(["/prod"]);
    app.append_context(Context::from([("stage", "prod")]));

    app.get("/users/<id>").middleware(middleware::trace).to(get_user);
    app.post("/users").to(create_user);
    app.delete("/users/<id>").middleware(require_api_key).to(delete_user);

    let mut reports = Router::new();
    reports.get("/report").compress(true).cache_control("max-age=300").to(report);
    app.include_routes(&reports, "/v1");

    LocalServer::from_config(ServerConfig::from_env()?).serve(app).await
}

// GET /users/<id>
async fn get_user(req: Request) -> Result<Json<Value>, Error> {
    Ok(Json(json!({
        "id": req.param("id"),
        "name": "alice",
        "stage": req.context().get("stage"),
    })))
}

// POST /users: a pre-shaped result: status and body pass through verbatim.
async fn create_user(req: Request) -> Result<Value, Error> {
    if req.body().unwrap_or_default().is_empty() {
        return Ok(json!({ "statusCode": 400, "body": "empty body" }));
    }
    Ok(json!({
        "statusCode": 201,
        "headers": { "Location": "/users/99" },
        "body": r#"{"id":"99","name":"new_user"}"#,
    }))
}

// DELETE /users/<id> → 204 No Content
async fn delete_user(_req: Request) -> Result<Response, Error> {
    Ok(Response::status(204))
}

// GET /v1/report: gzip-compressed when the client accepts it.
async fn report(_req: Request) -> Result<Response, Error> {
    Ok(Response::text("quarterly numbers\n".repeat(100)))
}

async fn require_api_key(req: Request, next: Next) -> Result<Reply, Error> {
    if req.header("x-api-key").is_none() {
        return ProblemDocument::unauthorized("missing x-api-key header").into_reply();
    }
    next.run(req).await
}
