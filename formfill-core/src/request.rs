//! Fill request model and request-shape normalization
//!
//! Inbound requests arrive either as multipart forms (PDF upload plus JSON
//! text parts) or as JSON bodies. [`normalize`] turns both into one canonical
//! JSON mapping with the keys `pdf`, `data`, `images`, `form` and `return`;
//! [`FillRequest::from_value`] then reads that mapping into typed form.
//! Neither step fails: malformed parts degrade to empty defaults.

use crate::error::FillError;
use crate::image_source::decode_base64;
use crate::value::{self, lookup, lookup_present, lookup_str};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tracing::debug;

/// Return modes that write the PDF to disk
pub const FILE_MODES: [&str; 4] = ["file", "save", "path", "pdf"];

/// Where the template PDF comes from
#[derive(Debug, Clone, PartialEq)]
pub enum PdfSource {
    /// Raw PDF bytes
    Raw(Vec<u8>),
    /// Base64 text or a `data:` URL
    Encoded(String),
    /// A JSON value that cannot carry a PDF (number, object, ...)
    Unsupported(String),
}

impl PdfSource {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(s) => PdfSource::Encoded(s.clone()),
            other => PdfSource::Unsupported(json_kind(other).to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            PdfSource::Raw(bytes) => bytes.is_empty(),
            PdfSource::Encoded(text) => text.trim().is_empty(),
            PdfSource::Unsupported(_) => false,
        }
    }

    /// Decode to raw PDF bytes
    pub fn decode(&self) -> Result<Vec<u8>, FillError> {
        let bytes = match self {
            PdfSource::Raw(bytes) => bytes.clone(),
            PdfSource::Encoded(text) => decode_base64(text).ok_or_else(|| {
                FillError::DecodeFailed("PDF input is not valid base64".to_string())
            })?,
            PdfSource::Unsupported(kind) => {
                return Err(FillError::DecodeFailed(format!(
                    "PDF input of type {kind} cannot be decoded to bytes"
                )))
            }
        };
        if bytes.is_empty() {
            return Err(FillError::DecodeFailed(
                "PDF input could not be decoded to bytes.".to_string(),
            ));
        }
        Ok(bytes)
    }
}

/// Where an image comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Raw(Vec<u8>),
    /// URL, `www.` host, data URL or base64 text
    Text(String),
}

/// One image to place into the document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageSpec {
    pub source: Option<ImageSource>,
    pub preserve_aspect: Option<bool>,
    pub max_bytes: Option<u64>,
    pub anchor: Option<String>,
    pub fit_to_anchor: bool,
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl ImageSpec {
    pub fn new(source: ImageSource) -> Self {
        Self {
            source: Some(source),
            ..Self::default()
        }
    }

    /// Read an image entry. A bare string is shorthand for `{"source": ...}`.
    pub fn from_value(value: &Value) -> Self {
        if let Value::String(s) = value {
            return Self::new(ImageSource::Text(s.clone()));
        }

        let source = lookup_present(value, "source")
            .or_else(|| lookup_present(value, "data"))
            .or_else(|| lookup_present(value, "url"))
            .and_then(Value::as_str)
            .map(|s| ImageSource::Text(s.to_string()));

        let preserve_aspect = value::lookup_bool(value, "preserveAspect")
            .or_else(|| value::lookup_bool(value, "keepProportion"));

        Self {
            source,
            preserve_aspect,
            max_bytes: value::lookup_u64(value, "maxBytes").filter(|n| *n > 0),
            anchor: lookup_str(value, "anchor")
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            fit_to_anchor: value::flag(value, "fitToAnchor", false),
            x: value::lookup_f64(value, "x"),
            y: value::lookup_f64(value, "y"),
            width: value::lookup_f64(value, "width"),
            height: value::lookup_f64(value, "height"),
        }
    }

    /// Whether `value` looks like an image entry (an object with `source`)
    pub fn is_image_value(value: &Value) -> bool {
        value.as_object().is_some_and(|o| o.contains_key("source"))
    }

    /// Aspect-ratio handling, `true` unless explicitly disabled
    pub fn keep_proportion(&self) -> bool {
        self.preserve_aspect.unwrap_or(true)
    }

    pub fn with_anchor(mut self, anchor: impl Into<String>, fit: bool) -> Self {
        self.anchor = Some(anchor.into());
        self.fit_to_anchor = fit;
        self
    }

    pub fn at(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// Post-fill form options
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FormOptions {
    pub readonly: bool,
    pub flatten: bool,
}

/// Options for writing the result to disk
#[derive(Debug, Clone, PartialEq)]
pub struct SaveOptions {
    pub filename: Option<String>,
    pub directory: Option<PathBuf>,
    pub overwrite: bool,
    pub mkdirs: bool,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            filename: None,
            directory: None,
            overwrite: false,
            mkdirs: true,
        }
    }
}

impl SaveOptions {
    pub fn from_value(value: &Value) -> Self {
        Self {
            filename: lookup_present(value, "filename")
                .and_then(Value::as_str)
                .map(str::to_string),
            directory: lookup_present(value, "directory")
                .and_then(Value::as_str)
                .map(PathBuf::from),
            overwrite: value::flag(value, "overwrite", false),
            mkdirs: value::flag(value, "mkdirs", true),
        }
    }
}

/// Requested output form
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ReturnSpec {
    /// Base64 text inside a success envelope
    #[default]
    Base64,
    /// Raw PDF bytes
    Bytes,
    /// Save to disk and report the path
    File(SaveOptions),
}

impl ReturnSpec {
    /// A plain string only chooses between bytes and base64; saving to disk
    /// needs the structured `{mode: ...}` form
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(mode)) if is_mode(mode, "bytes") => ReturnSpec::Bytes,
            Some(obj @ Value::Object(_)) => {
                let mode = lookup_str(obj, "mode").unwrap_or("base64");
                if FILE_MODES.iter().any(|file| is_mode(mode, file)) {
                    ReturnSpec::File(SaveOptions::from_value(obj))
                } else if is_mode(mode, "bytes") {
                    ReturnSpec::Bytes
                } else {
                    ReturnSpec::Base64
                }
            }
            _ => ReturnSpec::Base64,
        }
    }
}

fn is_mode(mode: &str, expected: &str) -> bool {
    mode.trim().eq_ignore_ascii_case(expected)
}

/// One fill operation's inputs
#[derive(Debug, Clone, Default)]
pub struct FillRequest {
    pub pdf: Option<PdfSource>,
    /// Field name to value, in request order
    pub data: Map<String, Value>,
    /// Explicit image entries, in request order
    pub images: Vec<(String, ImageSpec)>,
    pub form: FormOptions,
    pub return_spec: ReturnSpec,
}

impl FillRequest {
    pub fn new(pdf: PdfSource) -> Self {
        Self {
            pdf: Some(pdf),
            ..Self::default()
        }
    }

    /// Read the canonical mapping produced by [`normalize`] (or any JSON
    /// object of the same shape).
    pub fn from_value(obj: &Value) -> Self {
        let pdf = lookup_present(obj, "pdf")
            .or_else(|| lookup_present(obj, "file"))
            .map(PdfSource::from_value);

        let data = lookup(obj, "data")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        let images = lookup(obj, "images")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .map(|(name, cfg)| (name.clone(), ImageSpec::from_value(cfg)))
                    .collect()
            })
            .unwrap_or_default();

        let form = lookup(obj, "form")
            .map(|form| FormOptions {
                readonly: value::flag(form, "readonly", false),
                flatten: value::flag(form, "flatten", false),
            })
            .unwrap_or_default();

        Self {
            pdf,
            data,
            images,
            form,
            return_spec: ReturnSpec::from_value(lookup(obj, "return")),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }

    pub fn with_image(mut self, name: impl Into<String>, spec: ImageSpec) -> Self {
        self.images.push((name.into(), spec));
        self
    }

    pub fn with_form(mut self, form: FormOptions) -> Self {
        self.form = form;
        self
    }

    pub fn with_return(mut self, return_spec: ReturnSpec) -> Self {
        self.return_spec = return_spec;
        self
    }

    /// Explicit images followed by legacy image entries found in `data`.
    ///
    /// A legacy entry is a `data` value that is an object with a `source`
    /// key; it is only used when `images` has no entry of the same name.
    pub fn merged_images(&self) -> Vec<(String, ImageSpec)> {
        let mut merged = self.images.clone();
        for (name, value) in &self.data {
            if ImageSpec::is_image_value(value) && !merged.iter().any(|(n, _)| n == name) {
                debug!(field = %name, "using legacy image entry from data");
                merged.push((name.clone(), ImageSpec::from_value(value)));
            }
        }
        merged
    }
}

/// Parts of a multipart fill upload
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    /// The uploaded `pdf` file
    pub pdf: Option<Vec<u8>>,
    /// JSON text of the `fields` part
    pub fields: Option<String>,
    /// JSON text of the `images` part
    pub images: Option<String>,
    pub readonly: Option<String>,
    pub flatten: Option<String>,
    /// `return` part, JSON or a plain mode name
    pub return_spec: Option<String>,
}

/// Classified request body
#[derive(Debug, Clone)]
pub enum RequestBody {
    Multipart(MultipartForm),
    Json(Vec<u8>),
    Other(Vec<u8>),
}

/// Body kind implied by a `Content-Type` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Multipart,
    Json,
    Other,
}

impl BodyKind {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let ct = content_type.unwrap_or_default().to_ascii_lowercase();
        if ct.contains("multipart/form-data") {
            BodyKind::Multipart
        } else if ct.contains("application/json") {
            BodyKind::Json
        } else {
            BodyKind::Other
        }
    }
}

/// Convert an inbound body into the canonical request mapping
pub fn normalize(body: RequestBody) -> Value {
    let map = match body {
        RequestBody::Multipart(form) => normalize_multipart(form),
        RequestBody::Json(bytes) | RequestBody::Other(bytes) => parse_object(&bytes),
    };
    Value::Object(map)
}

fn normalize_multipart(form: MultipartForm) -> Map<String, Value> {
    let mut result = Map::new();

    if let Some(pdf) = form.pdf {
        result.insert("pdf".into(), Value::String(STANDARD.encode(pdf)));
    }

    let fields = form
        .fields
        .as_deref()
        .map(|text| parse_object(text.as_bytes()))
        .unwrap_or_default();
    result.insert("data".into(), Value::Object(fields));

    if let Some(text) = form.images.as_deref() {
        if let Ok(Value::Object(images)) = serde_json::from_str::<Value>(text) {
            result.insert("images".into(), Value::Object(images));
        } else {
            debug!("ignoring malformed images part");
        }
    }

    let mut options = Map::new();
    if let Some(raw) = form.readonly.as_deref() {
        options.insert("readonly".into(), Value::Bool(value::parse_flag(raw)));
    }
    if let Some(raw) = form.flatten.as_deref() {
        options.insert("flatten".into(), Value::Bool(value::parse_flag(raw)));
    }
    if !options.is_empty() {
        result.insert("form".into(), Value::Object(options));
    }

    if let Some(raw) = form.return_spec {
        let parsed = serde_json::from_str::<Value>(&raw).unwrap_or(Value::String(raw));
        result.insert("return".into(), parsed);
    }

    result
}

fn parse_object(bytes: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            debug!("request body is JSON but not an object");
            Map::new()
        }
        Err(_) => Map::new(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
