use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use form_client::{ApiError, ApiSubmitTarget, FormApi, HttpFormApi};
use form_spec::{DefaultValidator, FormDefinition, FormSession, SubmitOutcome};
use serde_json::json;

/// Answers a single HTTP request with `status` and `body`, returning the
/// base URL and a handle that yields the raw request line and body.
fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<(String, String)>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).expect("request line");

        let mut content_length = 0usize;
        loop {
            let mut header = String::new();
            reader.read_line(&mut header).expect("header");
            let header = header.trim_end();
            if header.is_empty() {
                break;
            }
            if let Some((name, value)) = header.split_once(':')
                && name.eq_ignore_ascii_case("content-length")
            {
                content_length = value.trim().parse().expect("content length");
            }
        }
        let mut request_body = vec![0u8; content_length];
        reader.read_exact(&mut request_body).expect("body");

        let response = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        let mut stream = reader.into_inner();
        stream.write_all(response.as_bytes()).expect("respond");
        stream.flush().expect("flush");
        (
            request_line.trim_end().to_string(),
            String::from_utf8(request_body).expect("utf8"),
        )
    });
    (format!("http://{addr}/api"), handle)
}

#[test]
fn fetches_public_forms() {
    let (base, server) = serve_once("200 OK", include_str!("fixtures/campaign_brief.json"));
    let api = HttpFormApi::new(base);

    let form = api.fetch_form("campaign-brief").expect("form");
    let (request_line, _) = server.join().expect("server");

    assert_eq!(request_line, "GET /api/form/public/campaign-brief HTTP/1.1");
    assert_eq!(form.fields.len(), 2);
}

#[test]
fn missing_forms_map_to_not_found() {
    let (base, server) = serve_once("404 Not Found", r#"{"error":"missing"}"#);
    let api = HttpFormApi::new(base);

    let err = api.fetch_form("gone").expect_err("should fail");
    server.join().expect("server");

    assert!(matches!(err, ApiError::NotFound));
    assert_eq!(err.user_message(), "Form not found");
}

#[test]
fn server_errors_keep_status_and_body() {
    let (base, server) = serve_once("500 Internal Server Error", "database offline");
    let api = HttpFormApi::new(base);

    let err = api.fetch_form("brief").expect_err("should fail");
    server.join().expect("server");

    match err {
        ApiError::Status { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "database offline");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn malformed_forms_are_decode_errors() {
    let (base, server) = serve_once("200 OK", r#"{"title": 7}"#);
    let api = HttpFormApi::new(base);

    let err = api.fetch_form("brief").expect_err("should fail");
    server.join().expect("server");
    assert!(matches!(err, ApiError::Decode(_)));
    assert_eq!(err.user_message(), "Failed to load form");
}

#[test]
fn sessions_submit_through_the_api() {
    let (base, server) = serve_once("201 Created", r#"{"id":"resp_1"}"#);
    let api = HttpFormApi::new(base);
    let form = FormDefinition::from_json(include_str!("fixtures/campaign_brief.json"))
        .expect("fixture");

    let mut session = FormSession::new(form);
    session.on_field_change("a", json!("no")).expect("change");
    let mut target = ApiSubmitTarget::new(&api, "campaign-brief");
    let outcome = session
        .submit(&DefaultValidator, &mut target)
        .expect("submit");

    let (request_line, body) = server.join().expect("server");
    assert_eq!(
        request_line,
        "POST /api/form/public/campaign-brief/submit HTTP/1.1"
    );
    let sent: serde_json::Value = serde_json::from_str(&body).expect("json body");
    assert_eq!(sent, json!({"a": "no"}));
    assert_eq!(outcome, SubmitOutcome::Accepted(json!({"id": "resp_1"})));
    assert!(session.is_submitted());
}

#[test]
fn rejected_submissions_keep_values() {
    let (base, server) = serve_once("422 Unprocessable Entity", "nope");
    let api = HttpFormApi::new(base);
    let form = FormDefinition::from_json(include_str!("fixtures/campaign_brief.json"))
        .expect("fixture");

    let mut session = FormSession::new(form);
    session.on_field_change("a", json!("no")).expect("change");
    let mut target = ApiSubmitTarget::new(&api, "campaign-brief");
    let result = session.submit(&DefaultValidator, &mut target);
    server.join().expect("server");

    assert!(result.is_err());
    assert!(!session.is_submitted());
    assert!(!session.is_submitting());
    assert_eq!(session.values().get("a"), Some(&json!("no")));
}
