//! Form-fill orchestration
//!
//! [`FormFiller`] drives one fill from a [`FillRequest`] to a [`FillOutput`]:
//! it validates and decodes the template, walks every page's widgets to apply
//! values and images, optionally locks or flattens the form, and hands the
//! serialized document to the output dispatcher.

use crate::backend::{self, PdfBackend, PdfDocument, Widget, WidgetKind};
use crate::config::FillConfig;
use crate::error::{FillError, Result};
use crate::geometry::Rect;
use crate::image_source::{HttpFetcher, ImageFetcher, ImageResolver, ResolveError};
use crate::output::{self, FillOutput};
use crate::request::{FillRequest, ImageSpec};
use crate::value;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Placement used for free images when neither the request nor an anchor
/// provides a coordinate
const FALLBACK_X: f64 = 50.0;
const FALLBACK_Y: f64 = 50.0;
const FALLBACK_WIDTH: f64 = 100.0;
const FALLBACK_HEIGHT: f64 = 100.0;

/// What a fill did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FillReport {
    pub pages: usize,
    /// Names of widgets that received a value
    pub fields_filled: Vec<String>,
    pub images_placed: Vec<String>,
    /// Image name with the reason it was not placed
    pub images_skipped: Vec<(String, String)>,
}

/// Serialized PDF together with its [`FillReport`]
#[derive(Debug, Clone)]
pub struct FilledDocument {
    pub bytes: Vec<u8>,
    pub report: FillReport,
}

/// Fills PDF forms. Cheap to share behind an `Arc`.
#[derive(Clone)]
pub struct FormFiller {
    backend: Option<Arc<dyn PdfBackend>>,
    resolver: ImageResolver,
    config: FillConfig,
}

impl std::fmt::Debug for FormFiller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormFiller")
            .field("backend", &self.backend.is_some())
            .field("resolver", &self.resolver)
            .field("config", &self.config)
            .finish()
    }
}

impl Default for FormFiller {
    fn default() -> Self {
        Self::new()
    }
}

impl FormFiller {
    /// Filler with the compiled-in backend and default settings
    pub fn new() -> Self {
        Self::from_config(FillConfig::default())
    }

    pub fn from_config(config: FillConfig) -> Self {
        let fetcher = Arc::new(HttpFetcher::new(config.fetch_timeout));
        Self {
            backend: backend::default_backend(),
            resolver: ImageResolver::new(fetcher)
                .with_default_max_bytes(config.default_max_image_bytes),
            config,
        }
    }

    /// Replace the PDF backend; `None` makes every fill fail with ATKPDF-02
    pub fn with_backend(mut self, backend: Option<Arc<dyn PdfBackend>>) -> Self {
        self.backend = backend;
        self
    }

    /// Replace how remote images are downloaded
    pub fn with_fetcher(mut self, fetcher: Arc<dyn ImageFetcher>) -> Self {
        self.resolver = ImageResolver::new(fetcher)
            .with_default_max_bytes(self.config.default_max_image_bytes);
        self
    }

    pub fn config(&self) -> &FillConfig {
        &self.config
    }

    pub fn backend(&self) -> Option<&Arc<dyn PdfBackend>> {
        self.backend.as_ref()
    }

    /// Fill and deliver the result in the form the request's return spec asks for
    pub fn fill(&self, request: &FillRequest) -> Result<FillOutput> {
        let filled = self.fill_document(request)?;
        info!(
            pages = filled.report.pages,
            fields = filled.report.fields_filled.len(),
            images = filled.report.images_placed.len(),
            skipped = filled.report.images_skipped.len(),
            bytes = filled.bytes.len(),
            "form filled"
        );
        output::dispatch(
            filled.bytes,
            &request.return_spec,
            &self.config.resolved_download_dir(),
        )
    }

    /// Fill and return the serialized PDF without dispatching it
    pub fn fill_document(&self, request: &FillRequest) -> Result<FilledDocument> {
        let source = request
            .pdf
            .as_ref()
            .filter(|pdf| !pdf.is_empty())
            .ok_or(FillError::MissingInput)?;
        let backend = self.backend.as_ref().ok_or(FillError::MissingDependency)?;
        let bytes = source.decode()?;

        let images = request.merged_images();
        let mut document = backend.open(&bytes)?;
        let mut run = FillRun::new(request, images, document.page_count());

        for page in 0..run.report.pages {
            run.process_page(document.as_mut(), page, &self.resolver)?;
        }

        let bytes = document.to_bytes()?;
        Ok(FilledDocument {
            bytes,
            report: run.report,
        })
    }
}

/// State of one fill in progress
struct FillRun<'a> {
    request: &'a FillRequest,
    images: Vec<(String, ImageSpec)>,
    consumed: Vec<bool>,
    report: FillReport,
}

impl<'a> FillRun<'a> {
    fn new(request: &'a FillRequest, images: Vec<(String, ImageSpec)>, pages: usize) -> Self {
        Self {
            request,
            consumed: vec![false; images.len()],
            images,
            report: FillReport {
                pages,
                ..FillReport::default()
            },
        }
    }

    fn process_page(
        &mut self,
        document: &mut dyn PdfDocument,
        page: usize,
        resolver: &ImageResolver,
    ) -> Result<()> {
        let widgets = document.widgets(page)?;
        debug!(page, widgets = widgets.len(), "processing page");

        for widget in &widgets {
            self.apply_value(document, widget)?;
        }

        if self.request.form.readonly {
            for widget in &widgets {
                if let Err(e) = document.set_read_only(widget) {
                    warn!(field = %widget.name, error = %e, "could not set read-only flag");
                }
            }
        }

        for widget in &widgets {
            let Some(index) = self.take_image(|name| name == widget.name) else {
                continue;
            };
            let spec = self.images[index].1.clone();
            self.place(document, page, index, widget.rect, &spec, resolver);
        }

        self.place_free_images(document, page, &widgets, resolver);

        if self.request.form.flatten {
            for widget in &widgets {
                if let Err(e) = document.flatten_widget(page, widget) {
                    warn!(
                        field = %widget.name,
                        widget = %widget.id,
                        error = %e,
                        "could not flatten widget"
                    );
                }
            }
        }
        Ok(())
    }

    fn apply_value(&mut self, document: &mut dyn PdfDocument, widget: &Widget) -> Result<()> {
        let Some(value) = self.request.data.get(&widget.name) else {
            return Ok(());
        };
        if ImageSpec::is_image_value(value) {
            return Ok(());
        }

        match widget.kind {
            WidgetKind::Checkbox => {
                let checked = value::is_checked(value);
                debug!(field = %widget.name, checked, "setting checkbox");
                document.set_checked(widget, checked)?;
            }
            WidgetKind::Radio => {
                let choice = value::to_field_text(value);
                debug!(field = %widget.name, choice = %choice, "setting radio button");
                document.set_radio(widget, &choice)?;
            }
            kind if kind.is_textual() => {
                let text = value::to_field_text(value);
                debug!(field = %widget.name, "setting text value");
                document.set_text(widget, &text)?;
            }
            kind => {
                debug!(field = %widget.name, ?kind, "widget takes no value");
                return Ok(());
            }
        }
        self.report.fields_filled.push(widget.name.clone());
        Ok(())
    }

    /// Images whose name matches no widget on this page are placed by anchor
    /// or coordinates on this page
    fn place_free_images(
        &mut self,
        document: &mut dyn PdfDocument,
        page: usize,
        widgets: &[Widget],
        resolver: &ImageResolver,
    ) {
        for index in 0..self.images.len() {
            let name = &self.images[index].0;
            if self.consumed[index] || widgets.iter().any(|w| &w.name == name) {
                continue;
            }
            self.consumed[index] = true;

            let spec = self.images[index].1.clone();
            let anchor = spec
                .anchor
                .as_deref()
                .and_then(|anchor| widgets.iter().find(|w| w.name == anchor));
            if spec.anchor.is_some() && anchor.is_none() {
                debug!(image = %self.images[index].0, page, "anchor not on this page");
            }

            let rect = free_image_rect(&spec, anchor.map(|w| w.rect));
            self.place(document, page, index, rect, &spec, resolver);
        }
    }

    fn take_image(&mut self, matches: impl Fn(&str) -> bool) -> Option<usize> {
        let index = self
            .images
            .iter()
            .enumerate()
            .position(|(i, (name, _))| !self.consumed[i] && matches(name))?;
        self.consumed[index] = true;
        Some(index)
    }

    fn place(
        &mut self,
        document: &mut dyn PdfDocument,
        page: usize,
        index: usize,
        rect: Rect,
        spec: &ImageSpec,
        resolver: &ImageResolver,
    ) {
        let name = self.images[index].0.clone();
        let result = if rect.is_empty() {
            Err("placement rectangle is empty".to_string())
        } else {
            spec.source
                .as_ref()
                .ok_or(ResolveError::MissingSource)
                .and_then(|source| resolver.resolve(source, spec.max_bytes))
                .map_err(|e| e.to_string())
                .and_then(|bytes| {
                    document
                        .insert_image(page, rect, &bytes, spec.keep_proportion())
                        .map_err(|e| e.to_string())
                })
        };

        match result {
            Ok(()) => {
                debug!(image = %name, page, ?rect, "image placed");
                self.report.images_placed.push(name);
            }
            Err(reason) => {
                warn!(image = %name, page, reason = %reason, "image skipped");
                self.report.images_skipped.push((name, reason));
            }
        }
    }
}

/// Rectangle for a free image. Explicit coordinates win, then the anchor's,
/// then the fixed fallbacks; `fitToAnchor` uses the anchor rectangle as is.
fn free_image_rect(spec: &ImageSpec, anchor: Option<Rect>) -> Rect {
    if let (Some(anchor), true) = (anchor, spec.fit_to_anchor) {
        return anchor;
    }
    let positive = |v: &f64| *v > 0.0;
    let x = spec.x.or(anchor.map(|a| a.x0)).unwrap_or(FALLBACK_X);
    let y = spec.y.or(anchor.map(|a| a.y0)).unwrap_or(FALLBACK_Y);
    let width = spec
        .width
        .filter(positive)
        .or(anchor.map(|a| a.width()).filter(positive))
        .unwrap_or(FALLBACK_WIDTH);
    let height = spec
        .height
        .filter(positive)
        .or(anchor.map(|a| a.height()).filter(positive))
        .unwrap_or(FALLBACK_HEIGHT);
    Rect::from_position_and_size(x, y, width, height)
}
