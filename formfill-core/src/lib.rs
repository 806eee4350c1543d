//! # formfill
//!
//! Fill PDF AcroForm templates with field values and images.
//!
//! ## Features
//!
//! - **Request normalization**: multipart uploads and JSON bodies end up as
//!   one typed [`FillRequest`]
//! - **Field values**: text, choice, checkbox and radio widgets
//! - **Images**: placed into image-button widgets, next to anchor widgets or
//!   at explicit coordinates; sources can be URLs, data URLs or base64
//! - **Post-processing**: lock every field read-only or flatten the form
//! - **Output**: base64 envelope, raw bytes, or a file saved with
//!   collision-free names
//!
//! PDF parsing and serialization sit behind the [`PdfBackend`] trait. The
//! `lopdf-backend` feature (on by default) provides [`LopdfBackend`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use formfill::{FillRequest, FormFiller, PdfSource, ReturnSpec};
//!
//! # fn main() -> formfill::Result<()> {
//! let template = std::fs::read("form.pdf").map_err(|e| formfill::FillError::DecodeFailed(e.to_string()))?;
//! let request = FillRequest::new(PdfSource::Raw(template))
//!     .with_value("Name", "Ada")
//!     .with_value("Agree", true)
//!     .with_return(ReturnSpec::Bytes);
//!
//! let output = FormFiller::new().fill(&request)?;
//! println!("{} bytes", output.byte_len());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod fields;
pub mod filler;
pub mod geometry;
pub mod image_source;
pub mod output;
pub mod request;
pub mod value;

#[cfg(feature = "lopdf-backend")]
pub use backend::LopdfBackend;
pub use backend::{default_backend, PdfBackend, PdfDocument, Widget, WidgetId, WidgetKind};
pub use config::FillConfig;
pub use error::{BackendError, ErrorEnvelope, FillError, Result};
pub use fields::{list_fields, FieldInfo};
pub use filler::{FillReport, FilledDocument, FormFiller};
pub use geometry::Rect;
pub use image_source::{HttpFetcher, ImageFetcher, ImageResolver, ResolveError};
pub use output::{dispatch, save_pdf, FillOutput};
pub use request::{
    normalize, BodyKind, FillRequest, FormOptions, ImageSource, ImageSpec, MultipartForm,
    PdfSource, RequestBody, ReturnSpec, SaveOptions,
};

/// Current version of formfill
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
