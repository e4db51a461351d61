//! Cross-origin resource sharing policy.
//!
//! A [`CorsConfig`] is built once, handed to the
//! [`Resolver`](crate::Resolver), and turned into response headers for every
//! CORS-enabled route, for not-found responses, and for `OPTIONS` preflights.
//!
//! ```rust
//! use proxy_router::CorsConfig;
//!
//! let cors = CorsConfig::new()
//!     .allow_origin("https://app.example.com")
//!     .allow_headers(["X-Request-Id"])
//!     .expose_headers(["X-Total-Count"])
//!     .max_age(600)
//!     .allow_credentials(true);
//!
//! let headers = cors.headers();
//! assert_eq!(headers["Access-Control-Max-Age"], "600");
//! ```

use serde::Deserialize;

use crate::headers::Headers;

/// Headers every non-wildcard policy allows, whatever the caller configured.
const REQUIRED_HEADERS: [&str; 5] = [
    "Authorization",
    "Content-Type",
    "X-Amz-Date",
    "X-Api-Key",
    "X-Amz-Security-Token",
];

/// An immutable CORS policy.
///
/// Deserialises from `{"allowOrigin", "allowHeaders", "exposeHeaders",
/// "maxAge", "allowCredentials"}`, every field optional.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(from = "RawCorsConfig")]
pub struct CorsConfig {
    allow_origin: String,
    allow_headers: Vec<String>,
    expose_headers: Vec<String>,
    max_age: Option<u64>,
    allow_credentials: bool,
}

impl CorsConfig {
    /// Allow any origin, the required headers, nothing exposed, no caching
    /// of preflights, no credentials.
    pub fn new() -> Self {
        Self {
            allow_origin: "*".to_owned(),
            allow_headers: normalize_allow_headers(Vec::new()),
            expose_headers: Vec::new(),
            max_age: None,
            allow_credentials: false,
        }
    }

    pub fn allow_origin(mut self, origin: impl Into<String>) -> Self {
        self.allow_origin = origin.into();
        self
    }

    /// Adds headers to the allow-list. Passing `"*"` collapses the list to
    /// the wildcard alone.
    pub fn allow_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut requested = self.allow_headers;
        requested.extend(headers.into_iter().map(Into::into));
        self.allow_headers = normalize_allow_headers(requested);
        self
    }

    pub fn expose_headers<I, S>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expose_headers = headers.into_iter().map(Into::into).collect();
        self
    }

    /// Seconds a browser may cache the preflight result.
    pub fn max_age(mut self, seconds: u64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    pub fn allowed_headers(&self) -> &[String] {
        &self.allow_headers
    }

    /// The response headers implementing this policy.
    ///
    /// `Access-Control-Allow-Origin` and `Access-Control-Allow-Headers` are
    /// always present. Expose-headers, max-age and credentials appear only
    /// when configured.
    pub fn headers(&self) -> Headers {
        let mut headers = Headers::new();
        headers.insert("Access-Control-Allow-Origin".to_owned(), self.allow_origin.clone());
        headers.insert("Access-Control-Allow-Headers".to_owned(), self.allow_headers.join(","));

        if !self.expose_headers.is_empty() {
            headers.insert(
                "Access-Control-Expose-Headers".to_owned(),
                self.expose_headers.join(","),
            );
        }
        if let Some(max_age) = self.max_age {
            headers.insert("Access-Control-Max-Age".to_owned(), max_age.to_string());
        }
        if self.allow_credentials {
            headers.insert("Access-Control-Allow-Credentials".to_owned(), "true".to_owned());
        }
        headers
    }
}

impl Default for CorsConfig {
    fn default() -> Self { Self::new() }
}

/// Wildcard wins outright; otherwise the required baseline comes first,
/// followed by the caller's headers, first occurrence kept.
fn normalize_allow_headers(requested: Vec<String>) -> Vec<String> {
    if requested.iter().any(|h| h == "*") {
        return vec!["*".to_owned()];
    }
    let mut headers: Vec<String> = Vec::with_capacity(REQUIRED_HEADERS.len() + requested.len());
    for header in REQUIRED_HEADERS.iter().map(|h| (*h).to_owned()).chain(requested) {
        if !headers.contains(&header) {
            headers.push(header);
        }
    }
    headers
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawCorsConfig {
    allow_origin: String,
    allow_headers: Vec<String>,
    expose_headers: Vec<String>,
    max_age: Option<u64>,
    allow_credentials: bool,
}

impl Default for RawCorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_owned(),
            allow_headers: Vec::new(),
            expose_headers: Vec::new(),
            max_age: None,
            allow_credentials: false,
        }
    }
}

impl From<RawCorsConfig> for CorsConfig {
    fn from(raw: RawCorsConfig) -> Self {
        let mut cors = CorsConfig::new()
            .allow_origin(raw.allow_origin)
            .allow_headers(raw.allow_headers)
            .expose_headers(raw.expose_headers)
            .allow_credentials(raw.allow_credentials);
        cors.max_age = raw.max_age;
        cors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_carry_required_headers() {
        let headers = CorsConfig::new().headers();
        assert_eq!(headers["Access-Control-Allow-Origin"], "*");
        assert_eq!(
            headers["Access-Control-Allow-Headers"],
            "Authorization,Content-Type,X-Amz-Date,X-Api-Key,X-Amz-Security-Token"
        );
        assert!(!headers.contains_key("Access-Control-Expose-Headers"));
        assert!(!headers.contains_key("Access-Control-Max-Age"));
        assert!(!headers.contains_key("Access-Control-Allow-Credentials"));
    }

    #[test]
    fn custom_headers_follow_baseline_without_duplicates() {
        let cors = CorsConfig::new().allow_headers(["test_header", "Content-Type"]);
        assert_eq!(
            cors.headers()["Access-Control-Allow-Headers"],
            "Authorization,Content-Type,X-Amz-Date,X-Api-Key,X-Amz-Security-Token,test_header"
        );
    }

    #[test]
    fn wildcard_collapses_allow_list() {
        let cors = CorsConfig::new().allow_headers(["X-One", "*"]).allow_headers(["X-Two"]);
        assert_eq!(cors.allowed_headers(), ["*".to_owned()]);
        assert_eq!(cors.headers()["Access-Control-Allow-Headers"], "*");
    }

    #[test]
    fn optional_headers_when_configured() {
        let headers = CorsConfig::new()
            .expose_headers(["X-A", "X-B"])
            .max_age(0)
            .allow_credentials(true)
            .headers();
        assert_eq!(headers["Access-Control-Expose-Headers"], "X-A,X-B");
        assert_eq!(headers["Access-Control-Max-Age"], "0");
        assert_eq!(headers["Access-Control-Allow-Credentials"], "true");
    }

    #[test]
    fn deserializes_with_defaults() {
        let cors: CorsConfig =
            serde_json::from_str(r#"{"allowHeaders": ["X-Custom"], "maxAge": 60}"#).unwrap();
        let headers = cors.headers();
        assert_eq!(headers["Access-Control-Allow-Origin"], "*");
        assert!(headers["Access-Control-Allow-Headers"].ends_with(",X-Custom"));
        assert_eq!(headers["Access-Control-Max-Age"], "60");
    }
}
