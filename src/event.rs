//! Inbound proxy event and invocation context.
//!
//! Platform adapters (API Gateway v1/v2, load balancers, function URLs)
//! all reduce to the same minimal shape: method, path, headers, body. The
//! router consumes nothing else.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::headers::lookup_key;

/// One inbound HTTP request as delivered by a serverless platform.
///
/// Deserialises from the API Gateway proxy JSON. `httpMethod` and `headers`
/// must be present; the optional collections accept `null`.
///
/// ```rust
/// use proxy_router::ProxyEvent;
///
/// let event: ProxyEvent = serde_json::from_str(r#"{
///     "httpMethod": "GET",
///     "path": "/users/42",
///     "headers": {"Accept-Encoding": "gzip"},
///     "body": null,
///     "isBase64Encoded": false,
///     "queryStringParameters": null
/// }"#).unwrap();
///
/// assert_eq!(event.header("accept-encoding"), Some("gzip"));
/// ```
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyEvent {
    pub http_method: String,
    #[serde(default)]
    pub path: String,
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub is_base64_encoded: bool,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub multi_value_query_string_parameters: Option<HashMap<String, Vec<String>>>,
    #[serde(default)]
    pub multi_value_headers: Option<HashMap<String, Vec<String>>>,
}

impl ProxyEvent {
    /// An event with the given method and path and nothing else.
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            http_method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Fails fast on an event the router cannot route.
    pub fn validate(&self) -> Result<(), Error> {
        if self.http_method.trim().is_empty() {
            return Err(Error::InvalidEvent("HTTP method is required".to_owned()));
        }
        Ok(())
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        lookup_key(&self.headers, name).map(String::as_str)
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_string_parameters
            .as_ref()
            .and_then(|q| q.get(name))
            .map(String::as_str)
    }
}

/// Host-provided metadata about the current invocation.
///
/// The router never inspects it. It travels untouched to every middleware
/// and handler in the chain.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvocationContext {
    pub request_id: String,
    pub function_name: Option<String>,
    pub invoked_function_arn: Option<String>,
    /// Milliseconds since the epoch after which the host kills the invocation.
    pub deadline_ms: Option<u64>,
}

impl InvocationContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self { request_id: request_id.into(), ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_method_fails_validation() {
        let err = ProxyEvent::new("", "/").validate().unwrap_err();
        assert_eq!(err.to_string(), "invalid proxy event: HTTP method is required");
    }

    #[test]
    fn missing_headers_fail_deserialization() {
        let err = serde_json::from_str::<ProxyEvent>(r#"{"httpMethod": "GET", "path": "/"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("headers"));
    }

    #[test]
    fn reads_multi_value_fields() {
        let event: ProxyEvent = serde_json::from_str(
            r#"{
                "httpMethod": "GET",
                "path": "/",
                "headers": {},
                "multiValueQueryStringParameters": {"tag": ["a", "b"]},
                "queryStringParameters": {"page": "2"}
            }"#,
        )
        .unwrap();
        assert_eq!(event.query("page"), Some("2"));
        assert_eq!(event.multi_value_query_string_parameters.unwrap()["tag"], ["a", "b"]);
    }
}
