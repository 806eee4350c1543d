//! [`PdfBackend`] implementation on top of lopdf

use super::appearance::{self, fmt, FONT_RESOURCE};
use super::{PdfBackend, PdfDocument, Widget, WidgetId, WidgetKind};
use crate::error::BackendError;
use crate::geometry::Rect;
use flate2::{write::ZlibEncoder, Compression};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::HashMap;
use std::io::Write;
use tracing::debug;

/// Guard against `/Parent` cycles in malformed files
const MAX_PARENT_DEPTH: usize = 32;

/// US Letter, used when a page has no usable `/MediaBox`
const DEFAULT_PAGE_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

// Field flags (ISO 32000-1 Table 221, 226, 228)
const FF_READ_ONLY: i64 = 1;
const FF_MULTILINE: i64 = 1 << 12;
const FF_RADIO: i64 = 1 << 15;
const FF_PUSHBUTTON: i64 = 1 << 16;

// Annotation flags (Table 165)
const F_HIDDEN: i64 = 1 << 1;

impl From<lopdf::Error> for BackendError {
    fn from(err: lopdf::Error) -> Self {
        BackendError::InvalidStructure(err.to_string())
    }
}

/// Opens documents with lopdf
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfBackend;

impl LopdfBackend {
    pub fn new() -> Self {
        Self
    }
}

impl PdfBackend for LopdfBackend {
    fn open(&self, bytes: &[u8]) -> Result<Box<dyn PdfDocument>, BackendError> {
        Ok(Box::new(LopdfDocument::load(bytes)?))
    }
}

/// A document loaded into memory with lopdf
pub struct LopdfDocument {
    doc: Document,
    pages: Vec<ObjectId>,
    font: Option<ObjectId>,
    /// Pages whose original content is already wrapped in `q`/`Q`, mapped
    /// to the `/Contents` index where flattened appearances are inserted.
    /// Images are appended after that point so they stay on top.
    isolated: HashMap<ObjectId, usize>,
}

impl LopdfDocument {
    pub fn load(bytes: &[u8]) -> Result<Self, BackendError> {
        let doc = Document::load_mem(bytes).map_err(|e| BackendError::Parse(e.to_string()))?;
        let pages = doc.get_pages().into_values().collect();
        let mut document = Self {
            doc,
            pages,
            font: None,
            isolated: HashMap::new(),
        };
        document.detach_inline_acroform()?;
        Ok(document)
    }

    fn page_id(&self, page: usize) -> Result<ObjectId, BackendError> {
        self.pages
            .get(page)
            .copied()
            .ok_or(BackendError::InvalidPage(page))
    }

    fn dict(&self, id: ObjectId) -> Result<&Dictionary, BackendError> {
        Ok(self.doc.get_object(id)?.as_dict()?)
    }

    fn dict_mut(&mut self, id: ObjectId) -> Result<&mut Dictionary, BackendError> {
        Ok(self.doc.get_object_mut(id)?.as_dict_mut()?)
    }

    /// Follow one level of indirection
    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            other => other,
        }
    }

    /// `start` followed by its `/Parent` ancestors
    fn chain(&self, start: ObjectId) -> Vec<(ObjectId, &Dictionary)> {
        let mut chain: Vec<(ObjectId, &Dictionary)> = Vec::new();
        let mut current = Some(start);
        while let Some(id) = current {
            if chain.len() >= MAX_PARENT_DEPTH || chain.iter().any(|(seen, _)| *seen == id) {
                break;
            }
            let Ok(dict) = self.dict(id) else { break };
            chain.push((id, dict));
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }
        chain
    }

    /// Value of `key` on `id` or the nearest ancestor that defines it
    fn inherited(&self, id: ObjectId, key: &[u8]) -> Option<&Object> {
        self.chain(id)
            .into_iter()
            .find_map(|(_, dict)| dict.get(key).ok())
            .map(|obj| self.resolve(obj))
    }

    fn inherited_int(&self, id: ObjectId, key: &[u8]) -> i64 {
        match self.inherited(id, key) {
            Some(Object::Integer(i)) => *i,
            Some(Object::Real(r)) => *r as i64,
            _ => 0,
        }
    }

    /// The terminal field a widget belongs to: the nearest node with `/T`
    fn field_id(&self, widget: ObjectId) -> ObjectId {
        self.chain(widget)
            .into_iter()
            .find(|(_, dict)| dict.has(b"T"))
            .map(|(id, _)| id)
            .unwrap_or(widget)
    }

    fn field_name(&self, widget: ObjectId) -> String {
        let mut parts: Vec<String> = self
            .chain(widget)
            .into_iter()
            .filter_map(|(_, dict)| match dict.get(b"T") {
                Ok(Object::String(bytes, _)) => Some(appearance::decode_text_string(bytes)),
                _ => None,
            })
            .collect();
        parts.reverse();
        parts.join(".")
    }

    fn widget_kind(&self, widget: ObjectId) -> WidgetKind {
        let field_type = match self.inherited(widget, b"FT") {
            Some(Object::Name(name)) => name.as_slice(),
            _ => return WidgetKind::Unknown,
        };
        let flags = self.inherited_int(widget, b"Ff");
        match field_type {
            b"Tx" => WidgetKind::Text,
            b"Ch" => WidgetKind::Choice,
            b"Sig" => WidgetKind::Signature,
            b"Btn" if flags & FF_PUSHBUTTON != 0 => WidgetKind::Button,
            b"Btn" if flags & FF_RADIO != 0 => WidgetKind::Radio,
            b"Btn" => WidgetKind::Checkbox,
            _ => WidgetKind::Unknown,
        }
    }

    fn widget_value(&self, widget: ObjectId) -> Option<String> {
        let field = self.dict(self.field_id(widget)).ok()?;
        let value = field
            .get(b"V")
            .ok()
            .or_else(|| self.dict(widget).ok()?.get(b"AS").ok())?;
        match self.resolve(value) {
            Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
            Object::String(bytes, _) => Some(appearance::decode_text_string(bytes)),
            _ => None,
        }
    }

    /// Name of the widget's "on" appearance state, `Yes` when none is declared
    fn on_state(&self, widget: ObjectId) -> Vec<u8> {
        let states = self
            .dict(widget)
            .ok()
            .and_then(|d| d.get(b"AP").ok())
            .map(|ap| self.resolve(ap))
            .and_then(|ap| ap.as_dict().ok())
            .and_then(|ap| ap.get(b"N").or_else(|_| ap.get(b"D")).ok())
            .map(|n| self.resolve(n));

        if let Some(Object::Dictionary(states)) = states {
            if let Some((name, _)) = states.iter().find(|(name, _)| name.as_slice() != b"Off") {
                return name.clone();
            }
        }
        b"Yes".to_vec()
    }

    fn page_box(&self, page_id: ObjectId) -> [f64; 4] {
        let Some(Object::Array(items)) = self.inherited(page_id, b"MediaBox") else {
            return DEFAULT_PAGE_BOX;
        };
        let values: Vec<f64> = items.iter().filter_map(|o| number(self.resolve(o))).collect();
        match values.as_slice() {
            [x0, y0, x1, y1] if x1 != x0 && y1 != y0 => {
                [x0.min(*x1), y0.min(*y1), x0.max(*x1), y0.max(*y1)]
            }
            _ => DEFAULT_PAGE_BOX,
        }
    }

    /// Widget `/Rect` in PDF user space, normalized to `[llx, lly, urx, ury]`
    fn raw_rect(&self, widget: ObjectId) -> Option<[f64; 4]> {
        let dict = self.dict(widget).ok()?;
        let Object::Array(items) = self.resolve(dict.get(b"Rect").ok()?) else {
            return None;
        };
        let values: Vec<f64> = items.iter().filter_map(|o| number(self.resolve(o))).collect();
        match values.as_slice() {
            [x0, y0, x1, y1] => Some([x0.min(*x1), y0.min(*y1), x0.max(*x1), y0.max(*y1)]),
            _ => None,
        }
    }

    fn annotation_ids(&self, page_id: ObjectId) -> Vec<ObjectId> {
        let Ok(page) = self.dict(page_id) else {
            return Vec::new();
        };
        match page.get(b"Annots").map(|a| self.resolve(a)) {
            Ok(Object::Array(items)) => items
                .iter()
                .filter_map(|o| o.as_reference().ok())
                .collect(),
            _ => Vec::new(),
        }
    }

    fn root_id(&self) -> Result<ObjectId, BackendError> {
        Ok(self.doc.trailer.get(b"Root")?.as_reference()?)
    }

    fn acroform_id(&self) -> Option<ObjectId> {
        let root = self.root_id().ok()?;
        self.dict(root).ok()?.get(b"AcroForm").ok()?.as_reference().ok()
    }

    /// Move an inline `/AcroForm` into its own object so it can be edited by id
    fn detach_inline_acroform(&mut self) -> Result<(), BackendError> {
        let Ok(root) = self.root_id() else {
            return Ok(());
        };
        let inline = match self.dict(root)?.get(b"AcroForm") {
            Ok(Object::Dictionary(form)) => form.clone(),
            _ => return Ok(()),
        };
        let form_id = self.doc.add_object(inline);
        self.dict_mut(root)?.set("AcroForm", form_id);
        Ok(())
    }

    fn default_appearance(&self, widget: ObjectId) -> Option<String> {
        let da = self.inherited(widget, b"DA").or_else(|| {
            let form = self.dict(self.acroform_id()?).ok()?;
            form.get(b"DA").ok().map(|o| self.resolve(o))
        })?;
        match da {
            Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }

    fn helvetica(&mut self) -> ObjectId {
        if let Some(id) = self.font {
            return id;
        }
        let id = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        self.font = Some(id);
        id
    }

    fn to_page_space(&self, page_id: ObjectId, raw: [f64; 4]) -> Rect {
        let [bx0, _, _, by1] = self.page_box(page_id);
        Rect::new(raw[0] - bx0, by1 - raw[3], raw[2] - bx0, by1 - raw[1])
    }

    /// Lower-left corner in user space for a page-space rectangle
    fn to_user_space(&self, page_id: ObjectId, rect: Rect) -> (f64, f64) {
        let [bx0, _, _, by1] = self.page_box(page_id);
        (rect.x0 + bx0, by1 - rect.y1)
    }

    /// Give the page its own inline `/Resources` with an inline `/XObject`
    /// dictionary, copying whatever it inherited.
    fn own_xobjects(&mut self, page_id: ObjectId) -> Result<&mut Dictionary, BackendError> {
        let mut resources = match self.inherited(page_id, b"Resources") {
            Some(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        };
        let xobjects = match resources.get(b"XObject").map(|o| self.resolve(o)) {
            Ok(Object::Dictionary(dict)) => dict.clone(),
            _ => Dictionary::new(),
        };
        resources.set("XObject", xobjects);

        let page = self.dict_mut(page_id)?;
        page.set("Resources", resources);
        Ok(page
            .get_mut(b"Resources")?
            .as_dict_mut()?
            .get_mut(b"XObject")?
            .as_dict_mut()?)
    }

    /// Register an XObject on the page under a fresh name
    fn register_xobject(
        &mut self,
        page_id: ObjectId,
        prefix: &str,
        xobject: ObjectId,
    ) -> Result<String, BackendError> {
        let xobjects = self.own_xobjects(page_id)?;
        let mut n = xobjects.len() + 1;
        let mut name = format!("{prefix}{n}");
        while xobjects.has(name.as_bytes()) {
            n += 1;
            name = format!("{prefix}{n}");
        }
        xobjects.set(name.clone(), xobject);
        Ok(name)
    }

    /// Wrap the page's existing content in `q`/`Q` so that appended drawing
    /// starts from the default graphics state.
    fn isolate_content(&mut self, page_id: ObjectId) -> Result<(), BackendError> {
        if self.isolated.contains_key(&page_id) {
            return Ok(());
        }
        let existing: Vec<Object> = match self.dict(page_id)?.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        };

        let push = self
            .doc
            .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let pop = self
            .doc
            .add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));

        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(push));
        contents.extend(existing);
        contents.push(Object::Reference(pop));
        let baked_end = contents.len();
        self.dict_mut(page_id)?.set("Contents", contents);

        self.isolated.insert(page_id, baked_end);
        Ok(())
    }

    /// Add a content stream on top of the page
    fn append_content(&mut self, page_id: ObjectId, content: String) -> Result<(), BackendError> {
        self.isolate_content(page_id)?;
        let stream = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        let page = self.dict_mut(page_id)?;
        page.get_mut(b"Contents")?
            .as_array_mut()?
            .push(Object::Reference(stream));
        Ok(())
    }

    /// Add a content stream above the original content but below anything
    /// added through [`Self::append_content`]
    fn insert_baked_content(
        &mut self,
        page_id: ObjectId,
        content: String,
    ) -> Result<(), BackendError> {
        self.isolate_content(page_id)?;
        let stream = self
            .doc
            .add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        let position = self.isolated.get(&page_id).copied().unwrap_or(0);
        let contents = self.dict_mut(page_id)?.get_mut(b"Contents")?.as_array_mut()?;
        let position = position.min(contents.len());
        contents.insert(position, Object::Reference(stream));
        self.isolated.insert(page_id, position + 1);
        Ok(())
    }

    /// Remove `target` from the array stored under `key` in `owner`, whether
    /// the array is inline or indirect. Returns the remaining length.
    fn remove_reference(
        &mut self,
        owner: ObjectId,
        key: &[u8],
        target: ObjectId,
    ) -> Result<Option<usize>, BackendError> {
        let indirect = match self.dict(owner)?.get(key) {
            Ok(Object::Reference(id)) => Some(*id),
            Ok(Object::Array(_)) => None,
            _ => return Ok(None),
        };
        let array = match indirect {
            Some(id) => self.doc.get_object_mut(id)?.as_array_mut()?,
            None => self.dict_mut(owner)?.get_mut(key)?.as_array_mut()?,
        };
        array.retain(|o| o.as_reference().ok() != Some(target));
        Ok(Some(array.len()))
    }

    /// Normal appearance stream for the widget's current state
    fn normal_appearance(&self, widget: ObjectId) -> Option<ObjectId> {
        let dict = self.dict(widget).ok()?;
        let ap = self.resolve(dict.get(b"AP").ok()?).as_dict().ok()?;
        match ap.get(b"N").ok()? {
            Object::Reference(id) => match self.doc.get_object(*id).ok()? {
                Object::Stream(_) => Some(*id),
                Object::Dictionary(states) => state_stream(states, dict),
                _ => None,
            },
            Object::Dictionary(states) => state_stream(states, dict),
            _ => None,
        }
    }

    fn stream_bbox(&self, id: ObjectId) -> Option<[f64; 4]> {
        let Ok(Object::Stream(stream)) = self.doc.get_object(id) else {
            return None;
        };
        let Object::Array(items) = self.resolve(stream.dict.get(b"BBox").ok()?) else {
            return None;
        };
        let values: Vec<f64> = items.iter().filter_map(|o| number(self.resolve(o))).collect();
        match values.as_slice() {
            [x0, y0, x1, y1] => Some([x0.min(*x1), y0.min(*y1), x0.max(*x1), y0.max(*y1)]),
            _ => None,
        }
    }
}

impl PdfDocument for LopdfDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn widgets(&self, page: usize) -> Result<Vec<Widget>, BackendError> {
        let page_id = self.page_id(page)?;
        let mut widgets = Vec::new();

        for annot in self.annotation_ids(page_id) {
            let Ok(dict) = self.dict(annot) else { continue };
            if !matches!(dict.get(b"Subtype"), Ok(Object::Name(n)) if n.as_slice() == b"Widget") {
                continue;
            }
            let rect = self
                .raw_rect(annot)
                .map(|raw| self.to_page_space(page_id, raw))
                .unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0));

            widgets.push(Widget {
                id: WidgetId {
                    object: annot.0,
                    generation: annot.1,
                },
                name: self.field_name(annot),
                kind: self.widget_kind(annot),
                rect,
                value: self.widget_value(annot),
                read_only: self.inherited_int(annot, b"Ff") & FF_READ_ONLY != 0,
            });
        }

        Ok(widgets)
    }

    fn set_text(&mut self, widget: &Widget, value: &str) -> Result<(), BackendError> {
        let id = object_id(widget);
        let field = self.field_id(id);
        let encoded = appearance::encode_text_string(value);
        let format = if value.is_ascii() {
            StringFormat::Literal
        } else {
            StringFormat::Hexadecimal
        };
        self.dict_mut(field)?.set("V", Object::String(encoded, format));

        let Some([x0, y0, x1, y1]) = self.raw_rect(id) else {
            return Ok(());
        };
        let (width, height) = (x1 - x0, y1 - y0);
        let font_size = self
            .default_appearance(id)
            .and_then(|da| appearance::font_size_from_da(&da));
        let multiline = self.inherited_int(id, b"Ff") & FF_MULTILINE != 0;
        let content = appearance::text_appearance(value, width, height, font_size, multiline);

        let font = self.helvetica();
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Form",
                "BBox" => vec![Object::Integer(0), Object::Integer(0), Object::Real(width as f32), Object::Real(height as f32)],
                "Resources" => dictionary! {
                    "Font" => dictionary! { FONT_RESOURCE => font },
                },
            },
            content,
        );
        let stream_id = self.doc.add_object(stream);
        self.dict_mut(id)?
            .set("AP", dictionary! { "N" => stream_id });
        debug!(field = %widget.name, "text value set");
        Ok(())
    }

    fn set_checked(&mut self, widget: &Widget, checked: bool) -> Result<(), BackendError> {
        let id = object_id(widget);
        let state = if checked {
            self.on_state(id)
        } else {
            b"Off".to_vec()
        };
        let field = self.field_id(id);
        self.dict_mut(field)?.set("V", Object::Name(state.clone()));
        self.dict_mut(id)?.set("AS", Object::Name(state));
        Ok(())
    }

    fn set_radio(&mut self, widget: &Widget, value: &str) -> Result<(), BackendError> {
        let id = object_id(widget);
        let on = self.on_state(id);
        if on == value.as_bytes() {
            let field = self.field_id(id);
            self.dict_mut(field)?.set("V", Object::Name(on.clone()));
            self.dict_mut(id)?.set("AS", Object::Name(on));
        } else {
            self.dict_mut(id)?.set("AS", Object::Name(b"Off".to_vec()));
        }
        Ok(())
    }

    fn set_read_only(&mut self, widget: &Widget) -> Result<(), BackendError> {
        let id = object_id(widget);
        let flags = self.inherited_int(id, b"Ff") | FF_READ_ONLY;
        let field = self.field_id(id);
        self.dict_mut(field)?.set("Ff", flags);
        Ok(())
    }

    fn insert_image(
        &mut self,
        page: usize,
        rect: Rect,
        image: &[u8],
        keep_proportion: bool,
    ) -> Result<(), BackendError> {
        let page_id = self.page_id(page)?;
        let decoded = image::load_from_memory(image)
            .map_err(|e| BackendError::InvalidImage(e.to_string()))?
            .to_rgba8();
        let (img_w, img_h) = decoded.dimensions();
        if img_w == 0 || img_h == 0 {
            return Err(BackendError::InvalidImage("image has no pixels".into()));
        }

        let mut rgb = Vec::with_capacity((img_w * img_h * 3) as usize);
        let mut alpha = Vec::with_capacity((img_w * img_h) as usize);
        for pixel in decoded.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel.0[3]);
        }

        let mut image_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => img_w as i64,
            "Height" => img_h as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8_i64,
            "Filter" => "FlateDecode",
        };
        if alpha.iter().any(|a| *a != u8::MAX) {
            let smask = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => img_w as i64,
                    "Height" => img_h as i64,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8_i64,
                    "Filter" => "FlateDecode",
                },
                deflate(&alpha)?,
            );
            image_dict.set("SMask", self.doc.add_object(smask));
        }
        let image_id = self.doc.add_object(Stream::new(image_dict, deflate(&rgb)?));

        let target = if keep_proportion {
            rect.fit(img_w as f64, img_h as f64)
        } else {
            rect
        };
        let (x, y) = self.to_user_space(page_id, target);
        let name = self.register_xobject(page_id, "FfIm", image_id)?;
        self.append_content(
            page_id,
            format!(
                "q {} 0 0 {} {} {} cm /{name} Do Q\n",
                fmt(target.width()),
                fmt(target.height()),
                fmt(x),
                fmt(y)
            ),
        )
    }

    fn flatten_widget(&mut self, page: usize, widget: &Widget) -> Result<(), BackendError> {
        let page_id = self.page_id(page)?;
        let id = object_id(widget);

        let hidden = matches!(
            self.dict(id)?.get(b"F"),
            Ok(Object::Integer(f)) if f & F_HIDDEN != 0
        );
        let appearance = self.normal_appearance(id);

        if let (false, Some(stream_id), Some([x0, y0, x1, y1])) =
            (hidden, appearance, self.raw_rect(id))
        {
            let [bx0, by0, bx1, by1] = self
                .stream_bbox(stream_id)
                .unwrap_or([0.0, 0.0, x1 - x0, y1 - y0]);
            let sx = if bx1 > bx0 { (x1 - x0) / (bx1 - bx0) } else { 1.0 };
            let sy = if by1 > by0 { (y1 - y0) / (by1 - by0) } else { 1.0 };
            let name = self.register_xobject(page_id, "FfFl", stream_id)?;
            self.insert_baked_content(
                page_id,
                format!(
                    "q {} 0 0 {} {} {} cm /{name} Do Q\n",
                    fmt(sx),
                    fmt(sy),
                    fmt(x0 - bx0 * sx),
                    fmt(y0 - by0 * sy)
                ),
            )?;
        }

        self.remove_reference(page_id, b"Annots", id)?;

        if let Some(form) = self.acroform_id() {
            self.remove_reference(form, b"Fields", id)?;
            let parent = self
                .dict(id)?
                .get(b"Parent")
                .and_then(Object::as_reference)
                .ok();
            if let Some(parent) = parent {
                if self.remove_reference(parent, b"Kids", id)? == Some(0) {
                    self.remove_reference(form, b"Fields", parent)?;
                }
            }
        }
        Ok(())
    }

    fn to_bytes(&mut self) -> Result<Vec<u8>, BackendError> {
        let mut out = Vec::new();
        self.doc.save_to(&mut out)?;
        Ok(out)
    }
}

fn object_id(widget: &Widget) -> ObjectId {
    (widget.id.object, widget.id.generation)
}

/// Pick the appearance for the widget's `/AS` state out of a state dictionary
fn state_stream(states: &Dictionary, widget: &Dictionary) -> Option<ObjectId> {
    let state = match widget.get(b"AS") {
        Ok(Object::Name(name)) => name.as_slice(),
        _ => b"Off",
    };
    states.get(state).ok()?.as_reference().ok()
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, BackendError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
