//! RFC 9457 problem documents.
//!
//! Not-found and internal-error responses carry a machine-readable body:
//!
//! ```json
//! {
//!   "type": "urn:problems:not-found",
//!   "status": 404,
//!   "title": "The specified resource could not be found.",
//!   "detail": "No route found for the HTTP path",
//!   "instance": "urn:uuid:0b4e2b9c-4d0e-4a55-9d7b-2f0c3c8b1a6e",
//!   "created": "2026-10-19T08:30:00.000Z"
//! }
//! ```
//!
//! Handlers can return a [`ProblemDocument`] directly; it becomes a response
//! with its own status and the `application/problem+json` media type.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Media type of a serialised problem document.
pub const MIME_TYPE: &str = "application/problem+json";

/// Prefix of a generated `instance` URN.
pub const UUID_PREFIX: &str = "urn:uuid:";

/// The fixed catalog of problem types.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ProblemType {
    BadRequest,          // 400
    Unauthorized,        // 401
    Forbidden,           // 403
    NotFound,            // 404
    MethodNotAllowed,    // 405
    Conflict,            // 409
    TooManyRequests,     // 429
    InternalServerError, // 500
    BadGateway,          // 502
    ServiceUnavailable,  // 503
    GatewayTimeout,      // 504
}

impl ProblemType {
    pub const ALL: [ProblemType; 11] = [
        Self::BadRequest,
        Self::Unauthorized,
        Self::Forbidden,
        Self::NotFound,
        Self::MethodNotAllowed,
        Self::Conflict,
        Self::TooManyRequests,
        Self::InternalServerError,
        Self::BadGateway,
        Self::ServiceUnavailable,
        Self::GatewayTimeout,
    ];

    pub fn code(self) -> u16 {
        match self {
            Self::BadRequest          => 400,
            Self::Unauthorized        => 401,
            Self::Forbidden           => 403,
            Self::NotFound            => 404,
            Self::MethodNotAllowed    => 405,
            Self::Conflict            => 409,
            Self::TooManyRequests     => 429,
            Self::InternalServerError => 500,
            Self::BadGateway          => 502,
            Self::ServiceUnavailable  => 503,
            Self::GatewayTimeout      => 504,
        }
    }

    pub fn urn(self) -> &'static str {
        match self {
            Self::BadRequest          => "urn:problems:bad-request",
            Self::Unauthorized        => "urn:problems:unauthorized",
            Self::Forbidden           => "urn:problems:forbidden",
            Self::NotFound            => "urn:problems:not-found",
            Self::MethodNotAllowed    => "urn:problems:method-not-allowed",
            Self::Conflict            => "urn:problems:conflict",
            Self::TooManyRequests     => "urn:problems:too-many-requests",
            Self::InternalServerError => "urn:problems:internal-server-error",
            Self::BadGateway          => "urn:problems:bad-gateway",
            Self::ServiceUnavailable  => "urn:problems:service-unavailable",
            Self::GatewayTimeout      => "urn:problems:gateway-timeout",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::BadRequest          => "Request could not be processed because it is invalid.",
            Self::Unauthorized        => "Authentication required.",
            Self::Forbidden           => "User is not authorized to perform the requested operation.",
            Self::NotFound            => "The specified resource could not be found.",
            Self::MethodNotAllowed    => "The specified method is not allowed.",
            Self::Conflict            => {
                "Request could not be completed due to a conflict with the current state of the resource."
            }
            Self::TooManyRequests     => "User has sent too many requests.",
            Self::InternalServerError => "An unexpected error occurred.",
            Self::BadGateway          => "Invalid response from upstream server.",
            Self::ServiceUnavailable  => "Service is temporarily unavailable.",
            Self::GatewayTimeout      => "Timeout invoking upstream server.",
        }
    }
}

/// A problem document.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ProblemDocument {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub instance: String,
    pub created: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Map<String, Value>>,
}

impl ProblemDocument {
    /// A bare document with `status`, a fresh `urn:uuid:` instance and the
    /// current time.
    pub fn new(status: u16) -> Self {
        Self {
            kind: None,
            status,
            title: None,
            detail: None,
            instance: format!("{UUID_PREFIX}{}", Uuid::new_v4()),
            created: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            extensions: None,
        }
    }

    /// A document for one of the catalogued problem types.
    pub fn from_type(
        problem: ProblemType,
        detail: Option<String>,
        extensions: Option<Map<String, Value>>,
    ) -> Self {
        Self {
            kind: Some(problem.urn().to_owned()),
            title: Some(problem.title().to_owned()),
            detail,
            extensions,
            ..Self::new(problem.code())
        }
    }

    pub fn with_type(mut self, urn: impl Into<String>) -> Self {
        self.kind = Some(urn.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Replaces the generated instance URN.
    pub fn with_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = instance.into();
        self
    }

    pub fn with_extensions(mut self, extensions: Map<String, Value>) -> Self {
        self.extensions = Some(extensions);
        self
    }
}

macro_rules! shortcuts {
    ($($name:ident => $problem:ident,)*) => {
        impl ProblemDocument {
            $(
                #[doc = concat!("A [`ProblemType::", stringify!($problem), "`] document.")]
                pub fn $name(detail: impl Into<String>) -> Self {
                    Self::from_type(ProblemType::$problem, Some(detail.into()), None)
                }
            )*
        }
    };
}

shortcuts! {
    bad_request           => BadRequest,
    unauthorized          => Unauthorized,
    forbidden             => Forbidden,
    not_found             => NotFound,
    method_not_allowed    => MethodNotAllowed,
    conflict              => Conflict,
    too_many_requests     => TooManyRequests,
    internal_server_error => InternalServerError,
    bad_gateway           => BadGateway,
    service_unavailable   => ServiceUnavailable,
    gateway_timeout       => GatewayTimeout,
}
