//! PDF Test Generators
//!
//! This module provides utilities for generating form templates and images
//! programmatically.

pub mod form_template;
pub mod images;

pub use form_template::{FormTemplateBuilder, PdfRect, PAGE_HEIGHT, PAGE_WIDTH};
pub use images::{jpeg_bytes, png_bytes, png_data_url, png_with_alpha};
