//! Integration tests for formfill-api

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use formfill_api::{app, app_with_state, AppState, FieldsResponse, ServerConfig};
use formfill_test_suite::{utils, FormSnapshot, FormTemplateBuilder};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tower::util::ServiceExt;

const BOUNDARY: &str = "----boundary----";

fn template() -> Vec<u8> {
    FormTemplateBuilder::new()
        .text_field("Name", [50.0, 700.0, 250.0, 720.0])
        .checkbox("Agree", [50.0, 650.0, 64.0, 664.0])
        .new_page()
        .text_field("Name", [50.0, 700.0, 250.0, 720.0])
        .build()
}

/// Multipart body with an optional `pdf` file part followed by text parts
fn multipart_body(pdf: Option<&[u8]>, parts: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(pdf) = pdf {
        body.extend_from_slice(b"------boundary----\r\n");
        body.extend_from_slice(
            b"Content-Disposition: form-data; name=\"pdf\"; filename=\"form.pdf\"\r\n",
        );
        body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
        body.extend_from_slice(pdf);
        body.extend_from_slice(b"\r\n");
    }
    for (name, value) in parts {
        body.extend_from_slice(b"------boundary----\r\n");
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
        );
        body.extend_from_slice(value.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(b"------boundary------\r\n");
    body
}

fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn json_request(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("POST")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, body.to_vec())
}

#[tokio::test]
async fn test_health_check_endpoint() {
    let request = Request::builder()
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "formfill API");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_index_serves_test_page() {
    let request = Request::builder().uri("/").body(Body::empty()).unwrap();
    let (status, content_type, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
    let html = String::from_utf8(body).unwrap();
    assert!(html.contains("/api/fill"));
    assert!(html.contains("name=\"pdf\""));
}

#[tokio::test]
async fn test_fields_lists_unique_names() {
    let body = multipart_body(Some(&template()), &[]);
    let (status, _, body) = send(app(), multipart_request("/api/fields", body)).await;

    assert_eq!(status, StatusCode::OK);
    let response: FieldsResponse = serde_json::from_slice(&body).unwrap();
    let summary: Vec<(&str, &str)> = response
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.kind.as_str()))
        .collect();
    assert_eq!(summary, vec![("Name", "text"), ("Agree", "checkbox")]);
    assert_eq!(response.fields[0].rect, [50.0, 72.0, 250.0, 92.0]);
}

#[tokio::test]
async fn test_fields_without_multipart_is_empty() {
    let request = json_request("/api/fields", &json!({ "pdf": "abc" }));
    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json, json!({ "fields": [] }));
}

#[tokio::test]
async fn test_fields_with_unreadable_pdf_is_empty() {
    let body = multipart_body(Some(b"not a pdf"), &[]);
    let (status, _, body) = send(app(), multipart_request("/api/fields", body)).await;

    assert_eq!(status, StatusCode::OK);
    let response: FieldsResponse = serde_json::from_slice(&body).unwrap();
    assert!(response.fields.is_empty());
}

#[tokio::test]
async fn test_fill_json_returns_pdf() {
    let request = json_request(
        "/api/fill",
        &json!({
            "pdf": utils::to_base64(&template()),
            "data": { "Name": "Ada", "Agree": "yes" }
        }),
    );
    let (status, content_type, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/pdf"));
    assert!(body.starts_with(b"%PDF"));

    let snapshot = FormSnapshot::load(&body).unwrap();
    assert_eq!(snapshot.field_value("Name"), Some("Ada".to_string()));
    assert_eq!(snapshot.field_value("Agree"), Some("Yes".to_string()));
}

#[tokio::test]
async fn test_fill_ignores_requested_return_mode() {
    let request = json_request(
        "/api/fill",
        &json!({
            "pdf": utils::to_base64(&template()),
            "return": "base64"
        }),
    );
    let (status, content_type, _) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/pdf"));
}

#[tokio::test]
async fn test_fill_without_pdf_is_bad_request() {
    let request = json_request("/api/fill", &json!({ "data": { "Name": "Ada" } }));
    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["report"], "error");
    assert_eq!(json["code"], "ATKPDF-01");
    assert!(json["message"].as_str().unwrap().contains("required"));
}

#[tokio::test]
async fn test_fill_with_undecodable_pdf_reports_decode_failure() {
    let request = json_request("/api/fill", &json!({ "pdf": "!!not base64!!" }));
    let (status, _, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["code"], "ATKPDF-03");
}

#[tokio::test]
async fn test_fill_multipart_marks_fields_readonly() {
    let body = multipart_body(
        Some(&template()),
        &[("fields", r#"{"Name": "Grace"}"#), ("readonly", "true")],
    );
    let (status, content_type, body) = send(app(), multipart_request("/api/fill", body)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/pdf"));

    let snapshot = FormSnapshot::load(&body).unwrap();
    let name = snapshot.widget("Name").unwrap();
    assert_eq!(name.value, Some("Grace".to_string()));
    assert_eq!(name.flags & 1, 1);
    assert_eq!(snapshot.widget("Agree").unwrap().flags & 1, 1);
}

#[tokio::test]
async fn test_fill_multipart_ignores_malformed_fields_part() {
    let body = multipart_body(Some(&template()), &[("fields", "{not json")]);
    let (status, _, body) = send(app(), multipart_request("/api/fill", body)).await;

    assert_eq!(status, StatusCode::OK);
    let snapshot = FormSnapshot::load(&body).unwrap();
    assert_eq!(snapshot.page_count(), 2);
}

#[tokio::test]
async fn test_process_returns_base64_envelope() {
    let request = json_request(
        "/api/process",
        &json!({
            "pdf": utils::to_base64(&template()),
            "data": { "Name": "Ada" }
        }),
    );
    let (status, content_type, body) = send(app(), request).await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("application/json"));

    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["report"], "success");
    assert_eq!(json["code"], "200");

    let pdf = utils::from_base64(json["pdf"].as_str().unwrap()).unwrap();
    assert_eq!(json["meta"]["bytes"], pdf.len());
    let snapshot = FormSnapshot::load(&pdf).unwrap();
    assert_eq!(snapshot.field_value("Name"), Some("Ada".to_string()));
}

#[tokio::test]
async fn test_process_saves_into_configured_directory() {
    let dir = utils::create_test_output_dir().unwrap();
    let config = ServerConfig {
        download_dir: Some(dir.path().to_path_buf()),
        ..ServerConfig::default()
    };
    let app = app_with_state(AppState::from_config(&config));

    let request = json_request(
        "/api/process",
        &json!({
            "pdf": utils::to_base64(&template()),
            "return": { "mode": "file", "filename": "out.pdf" }
        }),
    );
    let (status, _, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["report"], "success");
    assert_eq!(json["message"], "File saved successfully");

    let path = std::path::PathBuf::from(json["path"].as_str().unwrap());
    assert_eq!(path.file_name().unwrap(), "out.pdf");
    assert!(path.exists());
    assert!(dir.path().join("out.pdf").exists());
}

#[tokio::test]
async fn test_process_multipart_structured_return_part_saves() {
    let dir = utils::create_test_output_dir().unwrap();
    let config = ServerConfig {
        download_dir: Some(dir.path().to_path_buf()),
        ..ServerConfig::default()
    };
    let app = app_with_state(AppState::from_config(&config));

    let body = multipart_body(Some(&template()), &[("return", r#"{"mode": "save"}"#)]);
    let (status, _, body) = send(app, multipart_request("/api/process", body)).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["report"], "success");
    assert!(dir.path().join("atkfile.pdf").exists());
}

#[tokio::test]
async fn test_process_multipart_plain_save_part_returns_base64() {
    let dir = utils::create_test_output_dir().unwrap();
    let config = ServerConfig {
        download_dir: Some(dir.path().to_path_buf()),
        ..ServerConfig::default()
    };
    let app = app_with_state(AppState::from_config(&config));

    let body = multipart_body(Some(&template()), &[("return", "save")]);
    let (status, _, body) = send(app, multipart_request("/api/process", body)).await;

    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["report"], "success");
    assert!(json["pdf"].is_string());
    assert!(!dir.path().join("atkfile.pdf").exists());
}
