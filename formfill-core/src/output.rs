//! Output dispatch: base64 envelope, raw bytes or a file on disk

use crate::error::{FillError, Result};
use crate::request::{ReturnSpec, SaveOptions};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

/// Filename used when a save request names none
pub const DEFAULT_FILENAME: &str = "atkfile.pdf";

/// Successful result of a fill
#[derive(Debug, Clone, PartialEq)]
pub enum FillOutput {
    Base64 { pdf: String, bytes: usize },
    Bytes(Vec<u8>),
    Saved { path: PathBuf, bytes: usize },
}

impl FillOutput {
    /// JSON envelope for the base64 and file modes. Raw bytes have none.
    pub fn envelope(&self) -> Option<serde_json::Value> {
        let value = match self {
            FillOutput::Base64 { pdf, bytes } => serde_json::to_value(Base64Envelope {
                report: "success",
                message: "PDF processed successfully",
                code: "200",
                pdf,
                meta: Meta { bytes: *bytes },
            }),
            FillOutput::Saved { path, .. } => serde_json::to_value(SavedEnvelope {
                report: "success",
                message: "File saved successfully",
                path: path.to_string_lossy().into_owned(),
            }),
            FillOutput::Bytes(_) => return None,
        };
        value.ok()
    }

    /// Size of the produced PDF
    pub fn byte_len(&self) -> usize {
        match self {
            FillOutput::Base64 { bytes, .. } | FillOutput::Saved { bytes, .. } => *bytes,
            FillOutput::Bytes(bytes) => bytes.len(),
        }
    }
}

#[derive(Serialize)]
struct Base64Envelope<'a> {
    report: &'static str,
    message: &'static str,
    code: &'static str,
    pdf: &'a str,
    meta: Meta,
}

#[derive(Serialize)]
struct Meta {
    bytes: usize,
}

#[derive(Serialize)]
struct SavedEnvelope {
    report: &'static str,
    message: &'static str,
    path: String,
}

/// Deliver `bytes` in the form `spec` asks for
pub fn dispatch(bytes: Vec<u8>, spec: &ReturnSpec, default_dir: &Path) -> Result<FillOutput> {
    match spec {
        ReturnSpec::Bytes => Ok(FillOutput::Bytes(bytes)),
        ReturnSpec::Base64 => Ok(FillOutput::Base64 {
            pdf: STANDARD.encode(&bytes),
            bytes: bytes.len(),
        }),
        ReturnSpec::File(options) => {
            let path = save_pdf(&bytes, options, default_dir)?;
            Ok(FillOutput::Saved {
                path,
                bytes: bytes.len(),
            })
        }
    }
}

/// Write `bytes` according to `options` and return the absolute path
pub fn save_pdf(bytes: &[u8], options: &SaveOptions, default_dir: &Path) -> Result<PathBuf> {
    let directory = options
        .directory
        .as_deref()
        .map(expand_home)
        .unwrap_or_else(|| default_dir.to_path_buf());

    if options.mkdirs {
        fs::create_dir_all(&directory).map_err(|e| save_error(&directory, e))?;
    } else if !directory.is_dir() {
        return Err(FillError::SaveFailed(format!(
            "directory {} does not exist",
            directory.display()
        )));
    }

    let filename = options
        .filename
        .as_deref()
        .and_then(final_component)
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string());

    let mut target = directory.join(&filename);
    if !options.overwrite {
        target = unique_path(&target);
    }

    fs::write(&target, bytes).map_err(|e| save_error(&target, e))?;
    let absolute = fs::canonicalize(&target).map_err(|e| save_error(&target, e))?;
    info!(path = %absolute.display(), bytes = bytes.len(), "saved filled PDF");
    Ok(absolute)
}

fn save_error(path: &Path, err: std::io::Error) -> FillError {
    FillError::SaveFailed(format!("{}: {err}", path.display()))
}

/// `~` and `~/...` resolve against `$HOME`
fn expand_home(path: &Path) -> PathBuf {
    let mut components = path.components();
    match components.next() {
        Some(Component::Normal(first)) if first == "~" => match std::env::var_os("HOME") {
            Some(home) => PathBuf::from(home).join(components.as_path()),
            None => path.to_path_buf(),
        },
        _ => path.to_path_buf(),
    }
}

/// Last path component of a requested filename; directory parts are dropped
fn final_component(name: &str) -> Option<String> {
    let normalized = name.replace('\\', "/");
    Path::new(&normalized)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.trim().is_empty())
}

/// `name.ext`, then `name(2).ext`, `name(3).ext`, ... until one is unused
fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut n = 2u32;
    loop {
        let candidate = path.with_file_name(format!("{stem}({n}){extension}"));
        if !candidate.exists() {
            debug!(path = %candidate.display(), "target existed, using next free name");
            return candidate;
        }
        n += 1;
    }
}
