//! Response model, handler-result normalisation and the wire response.
//!
//! A handler's result travels three steps before it leaves the router:
//!
//! ```text
//! handler output ──into_reply──▶ Reply ──to_response──▶ Response ──build──▶ ProxyResponse
//!                                 │                       │                   │
//!                      built response or plain     route transforms:     {statusCode, body,
//!                      JSON value                  CORS, Cache-Control,   isBase64Encoded,
//!                                                  gzip, base64           headers}
//! ```

use std::io::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cors::CorsConfig;
use crate::error::Error;
use crate::event::ProxyEvent;
use crate::headers::{Headers, lookup_key, set_header};
use crate::problem::{MIME_TYPE, ProblemDocument};
use crate::route::Route;

const JSON: &str = "application/json";

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ResponseBuilder::bytes`].
pub enum ContentType {
    Html,        // text/html
    Json,        // application/json
    OctetStream, // application/octet-stream
    Text,        // text/plain
    Xhtml,       // application/xhtml+xml
    Xml,         // application/xml
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html        => "text/html",
            Self::Json        => JSON,
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain",
            Self::Xhtml       => "application/xhtml+xml",
            Self::Xml         => "application/xml",
        }
    }
}

// ── Body ──────────────────────────────────────────────────────────────────────

/// A response body: text goes out as-is, binary goes out base64-encoded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Body {
    Text(String),
    Binary(Vec<u8>),
}

impl Body {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::Binary(b) => b.is_empty(),
        }
    }

    fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Text(s) => s.into_bytes(),
            Self::Binary(b) => b,
        }
    }
}

impl Default for Body {
    fn default() -> Self { Self::Text(String::new()) }
}

impl From<String> for Body {
    fn from(s: String) -> Self { Self::Text(s) }
}

impl From<&str> for Body {
    fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<Vec<u8>> for Body {
    fn from(b: Vec<u8>) -> Self { Self::Binary(b) }
}

// ── Response ──────────────────────────────────────────────────────────────────

/// A response before route transforms and wire encoding.
///
/// # Shortcuts (200, no custom headers needed)
///
/// ```rust
/// use proxy_router::Response;
///
/// Response::json(r#"{"id":1}"#);
/// Response::text("hello");
/// Response::status(204);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use proxy_router::{ContentType, Response};
///
/// Response::builder()
///     .status(201)
///     .header("Location", "/users/42")
///     .json(r#"{"id":42}"#);
///
/// Response::builder()
///     .bytes(ContentType::OctetStream, vec![0xde, 0xad, 0xbe, 0xef]);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub status_code: u16,
    pub content_type: Option<String>,
    pub body: Body,
    pub headers: Headers,
    /// Set when a text body already holds base64 data.
    pub base64_encoded: bool,
}

impl Response {
    /// A response whose `Content-Type` header is filled from `content_type`
    /// unless `headers` already carries one.
    pub fn new(
        status_code: u16,
        content_type: Option<&str>,
        body: impl Into<Body>,
        mut headers: Headers,
    ) -> Self {
        if let Some(ct) = content_type {
            if lookup_key(&headers, "Content-Type").is_none() {
                headers.insert("Content-Type".to_owned(), ct.to_owned());
            }
        }
        Self {
            status_code,
            content_type: content_type.map(str::to_owned),
            body: body.into(),
            headers,
            base64_encoded: false,
        }
    }

    /// `200` with `application/json`.
    pub fn json(body: impl Into<String>) -> Self {
        Self::new(200, Some(JSON), body.into(), Headers::new())
    }

    /// `200` with `text/plain`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::new(200, Some(ContentType::Text.as_str()), body.into(), Headers::new())
    }

    /// Response with no body.
    pub fn status(code: u16) -> Self {
        Self::new(code, None, Body::default(), Headers::new())
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: Headers::new(), status: 200 }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        lookup_key(&self.headers, name).map(String::as_str)
    }

    /// Applies route transforms and encodes the response for the wire.
    ///
    /// `route` is `None` on the not-found path, which skips CORS,
    /// cache-control and compression entirely.
    pub fn build(
        mut self,
        event: &ProxyEvent,
        route: Option<&Route>,
        cors: Option<&CorsConfig>,
    ) -> Result<ProxyResponse, Error> {
        if let Some(route) = route {
            self.apply_route(event, route, cors)?;
        }

        let body = match self.body {
            Body::Text(text) => text,
            Body::Binary(bytes) => {
                self.base64_encoded = true;
                BASE64.encode(bytes)
            }
        };

        Ok(ProxyResponse {
            status_code: self.status_code,
            body,
            is_base64_encoded: self.base64_encoded,
            headers: self.headers,
        })
    }

    fn apply_route(
        &mut self,
        event: &ProxyEvent,
        route: &Route,
        cors: Option<&CorsConfig>,
    ) -> Result<(), Error> {
        if let (true, Some(cors)) = (route.cors, cors) {
            for (name, value) in cors.headers() {
                set_header(&mut self.headers, &name, value);
            }
        }

        // Only a 200 may be cached, whatever the route asked for.
        if let Some(cache_control) = route.cache_control.as_deref() {
            let value = if self.status_code == 200 { cache_control } else { "no-cache" };
            set_header(&mut self.headers, "Cache-Control", value);
        }

        let accepts_gzip = event
            .header("accept-encoding")
            .is_some_and(|enc| enc.contains("gzip"));
        if route.compress && accepts_gzip {
            set_header(&mut self.headers, "Content-Encoding", "gzip");
            if !self.body.is_empty() {
                self.body = Body::Binary(gzip(std::mem::take(&mut self.body).into_bytes())?);
            }
        }
        Ok(())
    }
}

fn gzip(bytes: Vec<u8>) -> Result<Vec<u8>, Error> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(bytes.len() / 2), Compression::default());
    encoder.write_all(&bytes)?;
    Ok(encoder.finish()?)
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200`.
/// Terminated by a typed body method.
pub struct ResponseBuilder {
    headers: Headers,
    status: u16,
}

impl ResponseBuilder {
    pub fn status(mut self, code: u16) -> Self {
        self.status = code;
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        set_header(&mut self.headers, name, value);
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: impl Into<String>) -> Response {
        self.finish(JSON, Body::Text(body.into()))
    }

    /// Terminate with a plain-text body (`text/plain`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(ContentType::Text.as_str(), Body::Text(body.into()))
    }

    /// Terminate with a binary body. It is base64-encoded on the wire.
    pub fn bytes(self, content_type: ContentType, body: Vec<u8>) -> Response {
        self.finish(content_type.as_str(), Body::Binary(body))
    }

    /// Terminate with no body (e.g. `204`, `301`).
    pub fn no_body(self) -> Response {
        Response::new(self.status, None, Body::default(), self.headers)
    }

    fn finish(self, content_type: &str, body: Body) -> Response {
        Response::new(self.status, Some(content_type), body, self.headers)
    }
}

// ── Reply ─────────────────────────────────────────────────────────────────────

/// What a handler produced: a fully built [`Response`], or a plain JSON value
/// still to be shaped into one.
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    Response(Response),
    Value(Value),
}

impl Reply {
    /// Normalises the handler result into a [`Response`].
    ///
    /// - A built response is used as-is.
    /// - A JSON object with both `statusCode` and `body` is a pre-shaped
    ///   response: its status, body and headers are taken verbatim. The
    ///   content type comes from a `Content-Type` header (any case), then a
    ///   `contentType` field, then defaults to `application/json`.
    /// - Anything else is serialised whole as a `200` JSON body.
    pub fn to_response(self) -> Result<Response, Error> {
        match self {
            Reply::Response(response) => Ok(response),
            Reply::Value(Value::Object(fields))
                if fields.contains_key("statusCode") && fields.contains_key("body") =>
            {
                shaped_response(fields)
            }
            Reply::Value(value) => {
                Ok(Response::new(200, Some(JSON), serde_json::to_string(&value)?, Headers::new()))
            }
        }
    }
}

fn shaped_response(mut fields: Map<String, Value>) -> Result<Response, Error> {
    let status = fields
        .get("statusCode")
        .and_then(Value::as_u64)
        .and_then(|code| u16::try_from(code).ok())
        .ok_or_else(|| Error::Response("`statusCode` must be an HTTP status code".to_owned()))?;

    let headers: Headers = match fields.remove("headers") {
        Some(Value::Object(map)) => map
            .into_iter()
            .map(|(name, value)| match value {
                Value::String(s) => (name, s),
                other => (name, other.to_string()),
            })
            .collect(),
        Some(Value::Null) | None => Headers::new(),
        Some(_) => return Err(Error::Response("`headers` must be an object".to_owned())),
    };

    let content_type = lookup_key(&headers, "Content-Type")
        .cloned()
        .or_else(|| fields.get("contentType").and_then(Value::as_str).map(str::to_owned))
        .unwrap_or_else(|| JSON.to_owned());

    let body = match fields.remove("body") {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => serde_json::to_string(&other)?,
    };

    let mut response = Response::new(status, Some(content_type.as_str()), body, headers);
    response.base64_encoded = fields
        .get("isBase64Encoded")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    Ok(response)
}

// ── IntoReply ─────────────────────────────────────────────────────────────────

/// Conversion of a handler's output into a [`Reply`].
///
/// Implement on your own types to return them directly from handlers.
/// Serialisable data can go through [`Json`]:
///
/// ```rust
/// use proxy_router::{Error, Json, Request};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct User { id: u32 }
///
/// async fn get_user(_req: Request) -> Result<Json<User>, Error> {
///     Ok(Json(User { id: 1 }))
/// }
/// ```
pub trait IntoReply {
    fn into_reply(self) -> Result<Reply, Error>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Reply, Error> { Ok(self) }
}

impl IntoReply for Response {
    fn into_reply(self) -> Result<Reply, Error> { Ok(Reply::Response(self)) }
}

impl IntoReply for Value {
    fn into_reply(self) -> Result<Reply, Error> { Ok(Reply::Value(self)) }
}

impl IntoReply for String {
    fn into_reply(self) -> Result<Reply, Error> { Ok(Reply::Value(Value::String(self))) }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Result<Reply, Error> { Ok(Reply::Value(Value::from(self))) }
}

/// A problem document becomes a response with its own status and the
/// `application/problem+json` media type.
impl IntoReply for ProblemDocument {
    fn into_reply(self) -> Result<Reply, Error> {
        let body = serde_json::to_string(&self)?;
        Ok(Reply::Response(Response::new(self.status, Some(MIME_TYPE), body, Headers::new())))
    }
}

/// Serialises `T` into a plain JSON value reply.
#[derive(Clone, Debug)]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoReply for Json<T> {
    fn into_reply(self) -> Result<Reply, Error> {
        Ok(Reply::Value(serde_json::to_value(self.0)?))
    }
}

// ── ProxyResponse ─────────────────────────────────────────────────────────────

/// The universal serverless-proxy response.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyResponse {
    pub status_code: u16,
    pub body: String,
    pub is_base64_encoded: bool,
    pub headers: Headers,
}

impl ProxyResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        lookup_key(&self.headers, name).map(String::as_str)
    }

    /// The body as raw bytes, base64-decoded when flagged.
    pub fn body_bytes(&self) -> Result<Vec<u8>, Error> {
        if self.is_base64_encoded {
            BASE64
                .decode(&self.body)
                .map_err(|e| Error::Response(format!("invalid base64 body: {e}")))
        } else {
            Ok(self.body.clone().into_bytes())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn plain_value_is_serialised_whole() {
        let response = Reply::Value(json!({"foo": 1})).to_response().unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, Body::Text(r#"{"foo":1}"#.to_owned()));
        assert_eq!(response.header("content-type"), Some("application/json"));
    }

    #[test]
    fn shaped_value_keeps_status_and_body() {
        let response = Reply::Value(json!({"statusCode": 201, "body": "ok"}))
            .to_response()
            .unwrap();
        assert_eq!(response.status_code, 201);
        assert_eq!(response.body, Body::Text("ok".to_owned()));
        assert_eq!(response.content_type.as_deref(), Some("application/json"));
    }

    #[test]
    fn shaped_value_content_type_prefers_header() {
        let response = Reply::Value(json!({
            "statusCode": 200,
            "body": "<p/>",
            "contentType": "text/plain",
            "headers": {"content-type": "text/html"}
        }))
        .to_response()
        .unwrap();
        assert_eq!(response.content_type.as_deref(), Some("text/html"));
        assert_eq!(response.headers.len(), 1);

        let response = Reply::Value(json!({"statusCode": 200, "body": "", "contentType": "text/plain"}))
            .to_response()
            .unwrap();
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn object_missing_body_is_a_plain_value() {
        let response = Reply::Value(json!({"statusCode": 201})).to_response().unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, Body::Text(r#"{"statusCode":201}"#.to_owned()));
    }

    #[test]
    fn non_numeric_status_is_rejected() {
        let err = Reply::Value(json!({"statusCode": "201", "body": ""}))
            .to_response()
            .unwrap_err();
        assert!(matches!(err, Error::Response(_)));
    }

    #[test]
    fn binary_body_goes_out_base64() {
        let wire = Response::builder()
            .bytes(ContentType::OctetStream, vec![0, 159, 146, 150])
            .build(&ProxyEvent::new("GET", "/"), None, None)
            .unwrap();
        assert!(wire.is_base64_encoded);
        assert_eq!(wire.body, "AJ+Slg==");
        assert_eq!(wire.body_bytes().unwrap(), vec![0, 159, 146, 150]);
    }
}
