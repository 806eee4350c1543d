//! Form field listing

use crate::backend::{PdfBackend, WidgetKind};
use crate::error::BackendError;
use crate::geometry::Rect;
use serde::Serialize;
use std::collections::HashSet;

/// One named field as reported to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    pub rect: Rect,
}

/// Every named widget of the document, first occurrence per name
pub fn list_fields(backend: &dyn PdfBackend, pdf: &[u8]) -> Result<Vec<FieldInfo>, BackendError> {
    let document = backend.open(pdf)?;
    let mut seen = HashSet::new();
    let mut fields = Vec::new();

    for page in 0..document.page_count() {
        for widget in document.widgets(page)? {
            if widget.name.is_empty() || !seen.insert(widget.name.clone()) {
                continue;
            }
            fields.push(FieldInfo {
                name: widget.name,
                kind: widget.kind,
                rect: widget.rect,
            });
        }
    }
    Ok(fields)
}
