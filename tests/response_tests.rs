//! Handler-result normalisation and wire encoding.

mod common;

use proxy_router::{
    Body, ContentType, CorsConfig, Error, IntoReply, Json, ProblemDocument, ProxyResponse,
    Registrar, Reply, Request, Resolver, Response,
};
use serde::Serialize;
use serde_json::json;

use common::{event, invocation};

#[test]
fn built_response_is_used_as_is() {
    let response = Response::builder()
        .status(202)
        .header("X-Job", "17")
        .text("queued");
    let normalised = response.clone().into_reply().unwrap().to_response().unwrap();
    assert_eq!(normalised, response);
}

#[test]
fn plain_values_become_json_200() {
    for (value, body) in [
        (json!({"foo": "bar"}), r#"{"foo":"bar"}"#),
        (json!([1, 2, 3]), "[1,2,3]"),
        (json!("text"), r#""text""#),
        (json!(null), "null"),
    ] {
        let response = Reply::Value(value).to_response().unwrap();
        assert_eq!(response.status_code, 200);
        assert_eq!(response.body, Body::Text(body.to_owned()));
        assert_eq!(response.header("Content-Type"), Some("application/json"));
    }
}

#[test]
fn shaped_body_may_be_any_json() {
    let response = Reply::Value(json!({"statusCode": 200, "body": {"nested": true}}))
        .to_response()
        .unwrap();
    assert_eq!(response.body, Body::Text(r#"{"nested":true}"#.to_owned()));

    let response = Reply::Value(json!({"statusCode": 204, "body": null}))
        .to_response()
        .unwrap();
    assert_eq!(response.status_code, 204);
    assert!(response.body.is_empty());
}

#[test]
fn shaped_base64_flag_is_honoured() {
    let response = Reply::Value(json!({
        "statusCode": 200,
        "body": "AQID",
        "isBase64Encoded": true,
        "contentType": "application/octet-stream",
    }))
    .to_response()
    .unwrap();

    let wire = response.build(&event("GET", "/"), None, None).unwrap();
    assert!(wire.is_base64_encoded);
    assert_eq!(wire.body, "AQID");
    assert_eq!(wire.body_bytes().unwrap(), vec![1, 2, 3]);
    assert_eq!(wire.header("content-type"), Some("application/octet-stream"));
}

#[test]
fn shaped_headers_must_be_an_object() {
    let err = Reply::Value(json!({"statusCode": 200, "body": "", "headers": ["nope"]}))
        .to_response()
        .unwrap_err();
    assert!(matches!(err, Error::Response(_)));
}

#[test]
fn serialisable_data_goes_through_json() {
    #[derive(Serialize)]
    struct User {
        id: u32,
        name: &'static str,
    }

    let response = Json(User { id: 1, name: "alice" })
        .into_reply()
        .unwrap()
        .to_response()
        .unwrap();
    assert_eq!(response.body, Body::Text(r#"{"id":1,"name":"alice"}"#.to_owned()));
}

#[test]
fn problem_document_reply_keeps_its_status() {
    let response = ProblemDocument::conflict("version mismatch")
        .into_reply()
        .unwrap()
        .to_response()
        .unwrap();
    assert_eq!(response.status_code, 409);
    assert_eq!(response.header("Content-Type"), Some("application/problem+json"));
}

#[test]
fn explicit_content_type_header_is_kept() {
    let response = Response::builder()
        .header("content-type", "text/csv")
        .text("a,b\n1,2");
    assert_eq!(response.headers.len(), 1);
    assert_eq!(response.header("Content-Type"), Some("text/csv"));
}

#[test]
fn wire_response_serialises_camel_case() {
    let wire = Response::builder()
        .bytes(ContentType::OctetStream, vec![0xde, 0xad])
        .build(&event("GET", "/"), None, None)
        .unwrap();
    let value = serde_json::to_value(&wire).unwrap();
    assert_eq!(value["statusCode"], 200);
    assert_eq!(value["isBase64Encoded"], true);
    assert_eq!(value["body"], "3q0=");
    assert_eq!(value["headers"]["Content-Type"], "application/octet-stream");

    let back: ProxyResponse = serde_json::from_value(value).unwrap();
    assert_eq!(back, wire);
}

#[tokio::test]
async fn binary_handler_result_is_base64_on_the_wire() {
    async fn image(_req: Request) -> Result<Response, Error> {
        Ok(Response::builder().bytes(ContentType::OctetStream, vec![0, 159, 146, 150]))
    }

    let mut app = Resolver::new().with_cors(CorsConfig::new());
    app.get("/image").to(image);

    let wire = app.resolve(event("GET", "/image"), invocation()).await.unwrap();
    assert!(wire.is_base64_encoded);
    assert_eq!(wire.body, "AJ+Slg==");
    assert_eq!(wire.header("Access-Control-Allow-Origin"), Some("*"));
}

#[tokio::test]
async fn empty_body_is_not_compressed() {
    async fn empty(_req: Request) -> Result<Response, Error> {
        Ok(Response::status(204))
    }

    let mut app = Resolver::new();
    app.get("/empty").compress(true).to(empty);

    let wire = app
        .resolve(event("GET", "/empty").with_header("accept-encoding", "gzip"), invocation())
        .await
        .unwrap();
    assert_eq!(wire.header("Content-Encoding"), Some("gzip"));
    assert_eq!(wire.body, "");
    assert!(!wire.is_base64_encoded);
}
