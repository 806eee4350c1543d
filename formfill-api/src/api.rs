use axum::{
    body::{self, Body},
    extract::{
        multipart::MultipartRejection, DefaultBodyLimit, FromRequest, Multipart, Request, State,
    },
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use formfill::{
    list_fields, normalize, BodyKind, FieldInfo, FillError, FillOutput, FillRequest, FormFiller,
    MultipartForm, RequestBody, ReturnSpec,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub filler: Arc<FormFiller>,
    /// Cap on buffered request bodies
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(filler: FormFiller, max_body_bytes: usize) -> Self {
        Self {
            filler: Arc::new(filler),
            max_body_bytes,
        }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            FormFiller::from_config(config.fill_config()),
            config.max_body_bytes,
        )
    }
}

/// Response for the field listing endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct FieldsResponse {
    pub fields: Vec<FieldEntry>,
}

/// One field in [`FieldsResponse`]
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct FieldEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub rect: [f64; 4],
}

impl From<FieldInfo> for FieldEntry {
    fn from(info: FieldInfo) -> Self {
        let kind = serde_json::to_value(info.kind)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        Self {
            name: info.name,
            kind,
            rect: info.rect.into(),
        }
    }
}

/// Envelope for failures that are not fill errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub report: String,
    pub message: String,
}

/// Application-specific error types for the API
#[derive(Debug, Error)]
pub enum AppError {
    /// A fill failed with a coded error
    #[error(transparent)]
    Fill(#[from] FillError),
    /// The worker running the fill did not finish
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Fill(err) => {
                warn!(code = err.code(), error = %err, "fill failed");
                (StatusCode::BAD_REQUEST, Json(err.envelope())).into_response()
            }
            AppError::Internal(message) => {
                error!(error = %message, "unexpected failure");
                let body = ErrorResponse {
                    report: "error".to_string(),
                    message,
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("fill worker failed: {err}"))
    }
}

/// Build the application router with default configuration
pub fn app() -> Router {
    app_with_state(AppState::from_config(&ServerConfig::default()))
}

/// Build the application router around `state`
pub fn app_with_state(state: AppState) -> Router {
    let limit = state.max_body_bytes;
    Router::new()
        .route("/", get(index))
        .route("/api/health", get(health_check))
        .route("/api/fields", post(fields_handler))
        .route("/api/fill", post(fill_handler))
        .route("/api/process", post(process_handler))
        .layer(DefaultBodyLimit::max(limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Manual test page
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "formfill API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// List the fields of an uploaded PDF. Failures yield an empty list.
pub async fn fields_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Json<FieldsResponse> {
    let pdf = match multipart {
        Ok(multipart) => read_multipart(multipart).await.pdf,
        Err(rejection) => {
            debug!(error = %rejection, "fields request is not multipart");
            None
        }
    };

    let fields = match (pdf, state.filler.backend().cloned()) {
        (Some(pdf), Some(backend)) => {
            tokio::task::spawn_blocking(move || list_fields(backend.as_ref(), &pdf))
                .await
                .map_err(|e| e.to_string())
                .and_then(|r| r.map_err(|e| e.to_string()))
                .unwrap_or_else(|e| {
                    warn!(error = %e, "could not list fields");
                    Vec::new()
                })
        }
        _ => Vec::new(),
    };

    Json(FieldsResponse {
        fields: fields.into_iter().map(FieldEntry::from).collect(),
    })
}

/// Fill and return the PDF as `application/pdf`
pub async fn fill_handler(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, AppError> {
    let fill = read_fill_request(&state, request)
        .await
        .with_return(ReturnSpec::Bytes);
    let output = run_fill(&state, fill).await?;
    Ok(output_response(output))
}

/// Fill and answer in the mode the request's `return` asks for
pub async fn process_handler(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, AppError> {
    let fill = read_fill_request(&state, request).await;
    let output = run_fill(&state, fill).await?;
    Ok(output_response(output))
}

async fn run_fill(state: &AppState, request: FillRequest) -> Result<FillOutput, AppError> {
    let filler = Arc::clone(&state.filler);
    let output = tokio::task::spawn_blocking(move || filler.fill(&request)).await??;
    info!(bytes = output.byte_len(), "fill request completed");
    Ok(output)
}

fn output_response(output: FillOutput) -> Response {
    match output {
        FillOutput::Bytes(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/pdf"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"filled.pdf\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        other => match other.envelope() {
            Some(envelope) => (StatusCode::OK, Json(envelope)).into_response(),
            None => AppError::Internal("output has no envelope".to_string()).into_response(),
        },
    }
}

/// Turn any inbound body into a typed fill request; malformed input
/// degrades to empty parts
async fn read_fill_request(state: &AppState, request: Request) -> FillRequest {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = match BodyKind::from_content_type(content_type.as_deref()) {
        BodyKind::Multipart => match Multipart::from_request(request, state).await {
            Ok(multipart) => RequestBody::Multipart(read_multipart(multipart).await),
            Err(rejection) => {
                warn!(error = %rejection, "unreadable multipart body");
                RequestBody::Multipart(MultipartForm::default())
            }
        },
        BodyKind::Json => {
            RequestBody::Json(read_body(request.into_body(), state.max_body_bytes).await)
        }
        BodyKind::Other => {
            RequestBody::Other(read_body(request.into_body(), state.max_body_bytes).await)
        }
    };

    FillRequest::from_value(&normalize(body))
}

async fn read_body(body: Body, limit: usize) -> Vec<u8> {
    match body::to_bytes(body, limit).await {
        Ok(bytes) => bytes.to_vec(),
        Err(e) => {
            warn!(error = %e, "could not read request body");
            Vec::new()
        }
    }
}

/// Collect the known parts of a fill upload; unknown parts are ignored
async fn read_multipart(mut multipart: Multipart) -> MultipartForm {
    let mut form = MultipartForm::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, "failed to read multipart field");
                break;
            }
        };
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "pdf" {
            match field.bytes().await {
                Ok(bytes) => form.pdf = Some(bytes.to_vec()),
                Err(e) => warn!(error = %e, "failed to read pdf part"),
            }
            continue;
        }

        let text = match field.text().await {
            Ok(text) => text,
            Err(e) => {
                warn!(part = %name, error = %e, "failed to read text part");
                continue;
            }
        };
        match name.as_str() {
            "fields" => form.fields = Some(text),
            "images" => form.images = Some(text),
            "readonly" => form.readonly = Some(text),
            "flatten" => form.flatten = Some(text),
            "return" => form.return_spec = Some(text),
            other => debug!(part = %other, "ignoring unknown part"),
        }
    }

    form
}
