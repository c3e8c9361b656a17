mod common;

use std::sync::Arc;

use common::{EXAMS, Exams, What, body_str, exams_app, request, with_exams};
use gantry::{App, ErrorResponse, ServerConfig};
use http::StatusCode;

#[tokio::test]
async fn list_exams() {
    let (app, _) = exams_app();
    let res = app.handle(request("GET", "/exams", "")).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.header("content-type"), Some("application/json"));
    assert_eq!(body_str(&res), r#"["asdasd","dsfsdfdsf","sdfdsfdsf","fsdfsdf"]"#);
}

#[tokio::test]
async fn add_exam_returns_title_and_uuid() {
    let (app, _) = exams_app();
    let res = app.handle(request("POST", "/exams/add", r#"{"title":"Midterm"}"#)).await;

    assert_eq!(res.status(), StatusCode::OK);
    let reply: String = res.json_body().unwrap();
    let token = reply.strip_prefix("Midterm -> ").expect("title prefix");
    assert!(uuid::Uuid::parse_str(token).is_ok(), "not a uuid: {token}");
}

#[tokio::test]
async fn add_exam_with_wrong_method_is_405() {
    let (app, exams) = exams_app();
    let res = app.handle(request("GET", "/exams/add", "")).await;

    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.header("content-type"), Some("application/json"));
    assert_eq!(
        body_str(&res),
        r#"{"message":"GET method not allowed for this endpoint","code":"method not allowed","statusCode":405}"#
    );
    assert_eq!(exams.calls(), 0);
}

#[tokio::test]
async fn wrong_method_wins_over_an_oversized_body() {
    let config = ServerConfig { max_body_size: 4, ..ServerConfig::default() };
    let exams = Arc::new(Exams::default());
    let app = with_exams(App::builder().config(&config), &exams).build().unwrap();

    let res = app.handle(request("GET", "/exams/add", "0123456789")).await;
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.header("allow"), Some("POST"));

    // No body binding, so the body is never read.
    let res = app.handle(request("GET", "/exams", "0123456789")).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.handle(request("POST", "/exams/add", r#"{"title":"Final"}"#)).await;
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(exams.calls(), 1);
}

#[tokio::test]
async fn unknown_path_is_404_before_any_handler() {
    let (app, exams) = exams_app();
    for uri in ["/unknown-path", "/exams/", "/exams/add/more", "/"] {
        let res = app.handle(request("GET", uri, "")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{uri}");
        let body: ErrorResponse = res.json_body().unwrap();
        assert_eq!(body.status_code, 404);
        assert_eq!(body.code, "not found");
    }
    assert_eq!(exams.calls(), 0);
}

#[tokio::test]
async fn unknown_body_fields_are_ignored() {
    let (app, _) = exams_app();
    let body = r#"{"id":1,"title":"x","date":"2024-01-01","extra":"ignored"}"#;
    let res = app.handle(request("POST", "/exams/what", body)).await;

    assert_eq!(res.status(), StatusCode::OK);
    let exams: Vec<String> = res.json_body().unwrap();
    assert_eq!(exams, EXAMS);
}

#[tokio::test]
async fn malformed_body_is_400_and_skips_the_handler() {
    let (app, exams) = exams_app();
    for body in ["", "{", r#"{"title":42}"#] {
        let res = app.handle(request("POST", "/exams/add", body)).await;
        let err: ErrorResponse = res.json_body().unwrap();
        assert_eq!((err.status_code, err.code.as_str()), (400, "invalid body"), "{body:?}");
    }
    assert_eq!(exams.calls(), 0);
}

#[tokio::test]
async fn required_query_parameter() {
    let (app, exams) = exams_app();

    let res = app.handle(request("GET", "/exams/search", "")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let err: ErrorResponse = res.json_body().unwrap();
    assert_eq!(err.code, "missing parameter");
    assert_eq!(exams.calls(), 0);

    let res = app.handle(request("GET", "/exams/search?term=alg", "")).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json_body().unwrap();
    assert_eq!(body["term"], "alg");
}

#[tokio::test]
async fn optional_parameters_take_defaults() {
    let (app, _) = exams_app();

    let res = app.handle(request("GET", "/exams/search?term=a", "")).await;
    let body: serde_json::Value = res.json_body().unwrap();
    assert_eq!(body["limit"], 2);
    assert_eq!(body["from"], serde_json::Value::Null);

    let res = app.handle(request("GET", "/exams/search?term=a&limit=7&from=2024-03-05&limit=9", "")).await;
    let body: serde_json::Value = res.json_body().unwrap();
    assert_eq!(body["limit"], 7);
    assert_eq!(body["from"], "2024-03-05");
}

#[tokio::test]
async fn bad_query_values_are_400() {
    let (app, _) = exams_app();
    for uri in ["/exams/search?term=a&limit=many", "/exams/search?term=a&from=yesterday"] {
        let res = app.handle(request("GET", uri, "")).await;
        let err: ErrorResponse = res.json_body().unwrap();
        assert_eq!((err.status_code, err.code.as_str()), (400, "invalid parameter"), "{uri}");
    }
}

#[tokio::test]
async fn handlers_can_take_the_request_context() {
    let (app, _) = exams_app();
    let res = app.handle(request("GET", "/exams/echo-path?x=1", "")).await;
    assert_eq!(body_str(&res), r#""/exams/echo-path""#);
}

#[test]
fn body_shape_drops_unknown_fields_on_round_trip() {
    let what = What { id: Some(3), title: Some("final".into()), date: chrono::NaiveDate::from_ymd_opt(2024, 6, 1) };
    let mut value = serde_json::to_value(&what).unwrap();
    value["extra"] = serde_json::json!(true);
    let decoded: What = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, what);
}
