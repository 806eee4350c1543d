//! PDF capability interface
//!
//! The filler never touches the PDF object model directly. It talks to a
//! [`PdfBackend`] that opens documents and a [`PdfDocument`] that exposes the
//! handful of widget and page operations a form fill needs.

#[cfg(feature = "lopdf-backend")]
mod appearance;
#[cfg(feature = "lopdf-backend")]
mod lopdf_backend;

#[cfg(feature = "lopdf-backend")]
pub use lopdf_backend::{LopdfBackend, LopdfDocument};

use crate::error::BackendError;
use crate::geometry::Rect;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Identifies a widget annotation inside one open document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WidgetId {
    pub object: u32,
    pub generation: u16,
}

impl fmt::Display for WidgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.object, self.generation)
    }
}

/// Kind of form field a widget belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Text,
    Checkbox,
    Radio,
    /// Push button; commonly used as an image placeholder
    Button,
    Choice,
    Signature,
    Unknown,
}

impl WidgetKind {
    /// Kinds that carry a textual value
    pub fn is_textual(&self) -> bool {
        matches!(self, WidgetKind::Text | WidgetKind::Choice)
    }
}

/// Snapshot of a widget as read from the document
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    pub id: WidgetId,
    /// Fully-qualified field name
    pub name: String,
    pub kind: WidgetKind,
    /// Position on the page, top-left origin
    pub rect: Rect,
    /// Current value (`/V`), checkbox states by name
    pub value: Option<String>,
    pub read_only: bool,
}

/// Opens PDF documents
pub trait PdfBackend: Send + Sync {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, BackendError>;
}

/// An open, mutable PDF document. Dropping it releases all resources.
pub trait PdfDocument {
    fn page_count(&self) -> usize;

    /// Widgets on `page` (0-based) in their native order
    fn widgets(&self, page: usize) -> Result<Vec<Widget>, BackendError>;

    fn set_text(&mut self, widget: &Widget, value: &str) -> Result<(), BackendError>;

    fn set_checked(&mut self, widget: &Widget, checked: bool) -> Result<(), BackendError>;

    /// Select a radio widget when `value` names its on-state, clear it otherwise
    fn set_radio(&mut self, widget: &Widget, value: &str) -> Result<(), BackendError>;

    fn set_read_only(&mut self, widget: &Widget) -> Result<(), BackendError>;

    /// Draw an image on top of the page content inside `rect`
    fn insert_image(
        &mut self,
        page: usize,
        rect: Rect,
        image: &[u8],
        keep_proportion: bool,
    ) -> Result<(), BackendError>;

    /// Bake the widget's appearance into the page and remove the widget
    fn flatten_widget(&mut self, page: usize, widget: &Widget) -> Result<(), BackendError>;

    fn to_bytes(&mut self) -> Result<Vec<u8>, BackendError>;
}

/// The backend compiled into this build, if any
#[cfg(feature = "lopdf-backend")]
pub fn default_backend() -> Option<Arc<dyn PdfBackend>> {
    Some(Arc::new(LopdfBackend::new()))
}

/// The backend compiled into this build, if any
#[cfg(not(feature = "lopdf-backend"))]
pub fn default_backend() -> Option<Arc<dyn PdfBackend>> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widget_kind_serialization() {
        let json = serde_json::to_value(WidgetKind::Checkbox).unwrap();
        assert_eq!(json, "checkbox");
        assert!(WidgetKind::Text.is_textual());
        assert!(WidgetKind::Choice.is_textual());
        assert!(!WidgetKind::Button.is_textual());
    }

    #[test]
    fn test_widget_id_display() {
        let id = WidgetId {
            object: 12,
            generation: 0,
        };
        assert_eq!(id.to_string(), "12 0 R");
    }
}
