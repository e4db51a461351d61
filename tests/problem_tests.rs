//! RFC 9457 problem documents.

use chrono::DateTime;
use proxy_router::{MIME_TYPE, ProblemDocument, ProblemType, UUID_PREFIX};
use serde_json::{Map, Value, json};

#[test]
fn catalogue_is_complete() {
    let expected = [
        (400, "urn:problems:bad-request", "Request could not be processed because it is invalid."),
        (401, "urn:problems:unauthorized", "Authentication required."),
        (403, "urn:problems:forbidden", "User is not authorized to perform the requested operation."),
        (404, "urn:problems:not-found", "The specified resource could not be found."),
        (405, "urn:problems:method-not-allowed", "The specified method is not allowed."),
        (
            409,
            "urn:problems:conflict",
            "Request could not be completed due to a conflict with the current state of the resource.",
        ),
        (429, "urn:problems:too-many-requests", "User has sent too many requests."),
        (500, "urn:problems:internal-server-error", "An unexpected error occurred."),
        (502, "urn:problems:bad-gateway", "Invalid response from upstream server."),
        (503, "urn:problems:service-unavailable", "Service is temporarily unavailable."),
        (504, "urn:problems:gateway-timeout", "Timeout invoking upstream server."),
    ];

    assert_eq!(ProblemType::ALL.len(), expected.len());
    for (problem, (code, urn, title)) in ProblemType::ALL.into_iter().zip(expected) {
        assert_eq!(problem.code(), code);
        assert_eq!(problem.urn(), urn);
        assert_eq!(problem.title(), title);
    }
}

#[test]
fn shortcuts_fill_type_title_and_detail() {
    let problem = ProblemDocument::too_many_requests("slow down");
    assert_eq!(problem.status, 429);
    assert_eq!(problem.kind.as_deref(), Some("urn:problems:too-many-requests"));
    assert_eq!(problem.title.as_deref(), Some("User has sent too many requests."));
    assert_eq!(problem.detail.as_deref(), Some("slow down"));
    assert_eq!(problem.extensions, None);
}

#[test]
fn instance_is_a_fresh_uuid_urn() {
    let a = ProblemDocument::new(500);
    let b = ProblemDocument::new(500);
    assert!(a.instance.starts_with(UUID_PREFIX));
    assert_eq!(a.instance.len(), UUID_PREFIX.len() + 36);
    assert_ne!(a.instance, b.instance);
}

#[test]
fn created_is_millisecond_utc() {
    let problem = ProblemDocument::new(400);
    assert!(problem.created.ends_with('Z'), "{}", problem.created);
    assert_eq!(problem.created.len(), "2024-01-01T00:00:00.000Z".len());
    DateTime::parse_from_rfc3339(&problem.created).unwrap();
}

#[test]
fn optional_members_are_omitted() {
    let value = serde_json::to_value(ProblemDocument::new(418)).unwrap();
    let members: Vec<_> = value.as_object().unwrap().keys().cloned().collect();
    assert_eq!(members, ["created", "instance", "status"]);
}

#[test]
fn serialises_type_member_and_extensions() {
    let mut extensions = Map::new();
    extensions.insert("balance".to_owned(), json!(30));
    let problem = ProblemDocument::from_type(ProblemType::Forbidden, None, Some(extensions))
        .with_instance("/account/12345/msgs/abc");

    let value = serde_json::to_value(&problem).unwrap();
    assert_eq!(value["type"], "urn:problems:forbidden");
    assert_eq!(value["status"], 403);
    assert_eq!(value["instance"], "/account/12345/msgs/abc");
    assert_eq!(value["extensions"]["balance"], 30);
    assert_eq!(value.get("detail"), None);

    let back: ProblemDocument = serde_json::from_value(value).unwrap();
    assert_eq!(back, problem);
}

#[test]
fn builder_overrides_catalogue_values() {
    let problem = ProblemDocument::new(422)
        .with_type("https://example.com/probs/out-of-credit")
        .with_title("You do not have enough credit.")
        .with_detail("Your current balance is 30, but that costs 50.");
    let value: Value = serde_json::to_value(&problem).unwrap();
    assert_eq!(value["type"], "https://example.com/probs/out-of-credit");
    assert_eq!(value["title"], "You do not have enough credit.");
    assert_eq!(value["status"], 422);
}

#[test]
fn media_type() {
    assert_eq!(MIME_TYPE, "application/problem+json");
}
