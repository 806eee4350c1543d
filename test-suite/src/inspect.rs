//! Read back filled PDFs in tests

use anyhow::{anyhow, Context};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

/// Widget as seen in a saved PDF
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSnapshot {
    pub name: String,
    /// 0-based page index
    pub page: usize,
    /// `/V` of the owning field
    pub value: Option<String>,
    /// `/AS` of the widget
    pub state: Option<String>,
    /// `/Ff` of the owning field
    pub flags: i64,
}

/// A loaded PDF with form-oriented accessors
pub struct FormSnapshot {
    doc: Document,
}

impl FormSnapshot {
    pub fn load(bytes: &[u8]) -> anyhow::Result<Self> {
        let doc = Document::load_mem(bytes).context("output is not a readable PDF")?;
        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    fn page_ids(&self) -> Vec<ObjectId> {
        self.doc.get_pages().into_values().collect()
    }

    /// Widgets referenced from page `/Annots`, in page order
    pub fn widgets(&self) -> Vec<WidgetSnapshot> {
        let mut widgets = Vec::new();
        for (page, page_id) in self.page_ids().into_iter().enumerate() {
            for id in self.annots(page_id) {
                let Ok(dict) = self.dict(id) else { continue };
                if !matches!(dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Widget") {
                    continue;
                }
                let field = self.field_of(id);
                widgets.push(WidgetSnapshot {
                    name: self.full_name(id),
                    page,
                    value: field
                        .and_then(|f| f.get(b"V").ok())
                        .and_then(|v| text_of(self.resolve(v))),
                    state: dict.get(b"AS").ok().and_then(text_of),
                    flags: field
                        .and_then(|f| f.get(b"Ff").ok())
                        .and_then(|v| v.as_i64().ok())
                        .unwrap_or(0),
                });
            }
        }
        widgets
    }

    pub fn widget(&self, name: &str) -> Option<WidgetSnapshot> {
        self.widgets().into_iter().find(|w| w.name == name)
    }

    pub fn field_value(&self, name: &str) -> Option<String> {
        self.widget(name)?.value
    }

    /// Number of entries in the AcroForm `/Fields` array
    pub fn acroform_field_count(&self) -> usize {
        let count = || -> anyhow::Result<usize> {
            let root = self.doc.trailer.get(b"Root")?.as_reference()?;
            let form = self.resolve(self.dict(root)?.get(b"AcroForm")?);
            let fields = self.resolve(form.as_dict()?.get(b"Fields")?);
            Ok(fields.as_array()?.len())
        };
        count().unwrap_or(0)
    }

    /// Concatenated, decompressed content streams of a page
    pub fn page_content(&self, page: usize) -> anyhow::Result<String> {
        let page_id = *self
            .page_ids()
            .get(page)
            .ok_or_else(|| anyhow!("no page {page}"))?;
        let mut out = Vec::new();
        for id in self.doc.get_page_contents(page_id) {
            if let Ok(Object::Stream(stream)) = self.doc.get_object(id) {
                let content = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                out.extend_from_slice(&content);
                out.push(b'\n');
            }
        }
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// XObject streams registered on a page, by resource name
    fn page_xobjects(&self, page: usize) -> Vec<(String, &Stream)> {
        let Some(page_id) = self.page_ids().get(page).copied() else {
            return Vec::new();
        };
        let Ok(page) = self.dict(page_id) else {
            return Vec::new();
        };
        let xobjects = page
            .get(b"Resources")
            .map(|r| self.resolve(r))
            .and_then(Object::as_dict)
            .and_then(|r| r.get(b"XObject"))
            .map(|x| self.resolve(x))
            .and_then(Object::as_dict);
        let Ok(xobjects) = xobjects else {
            return Vec::new();
        };

        xobjects
            .iter()
            .filter_map(|(name, obj)| match self.resolve(obj) {
                Object::Stream(stream) => Some((String::from_utf8_lossy(name).into_owned(), stream)),
                _ => None,
            })
            .collect()
    }

    /// Form XObjects on a page as `(name, content)`
    pub fn page_forms(&self, page: usize) -> Vec<(String, String)> {
        self.page_xobjects(page)
            .into_iter()
            .filter(|(_, stream)| {
                matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Form")
            })
            .map(|(name, stream)| {
                let content = stream
                    .decompressed_content()
                    .unwrap_or_else(|_| stream.content.clone());
                (name, String::from_utf8_lossy(&content).into_owned())
            })
            .collect()
    }

    /// Image XObjects on a page as `(name, width, height, has_soft_mask)`
    pub fn page_images(&self, page: usize) -> Vec<(String, i64, i64, bool)> {
        self.page_xobjects(page)
            .into_iter()
            .filter_map(|(name, stream)| {
                if !matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Image") {
                    return None;
                }
                let width = stream.dict.get(b"Width").ok()?.as_i64().ok()?;
                let height = stream.dict.get(b"Height").ok()?.as_i64().ok()?;
                Some((
                    name,
                    width,
                    height,
                    stream.dict.has(b"SMask"),
                ))
            })
            .collect()
    }

    fn annots(&self, page_id: ObjectId) -> Vec<ObjectId> {
        self.dict(page_id)
            .ok()
            .and_then(|p| p.get(b"Annots").ok())
            .map(|a| self.resolve(a))
            .and_then(|a| a.as_array().ok())
            .map(|items| items.iter().filter_map(|o| o.as_reference().ok()).collect())
            .unwrap_or_default()
    }

    fn dict(&self, id: ObjectId) -> lopdf::Result<&Dictionary> {
        self.doc.get_object(id)?.as_dict()
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> &'a Object {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).unwrap_or(obj),
            other => other,
        }
    }

    fn ancestors(&self, id: ObjectId) -> Vec<&Dictionary> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            let Ok(dict) = self.dict(id) else { break };
            chain.push(dict);
            if chain.len() > 32 {
                break;
            }
            current = dict.get(b"Parent").and_then(Object::as_reference).ok();
        }
        chain
    }

    fn field_of(&self, widget: ObjectId) -> Option<&Dictionary> {
        self.ancestors(widget).into_iter().find(|d| d.has(b"T"))
    }

    fn full_name(&self, widget: ObjectId) -> String {
        let mut parts: Vec<String> = self
            .ancestors(widget)
            .into_iter()
            .filter_map(|d| d.get(b"T").ok().and_then(text_of))
            .collect();
        parts.reverse();
        parts.join(".")
    }
}

fn text_of(obj: &Object) -> Option<String> {
    match obj {
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        Object::String(bytes, _) if bytes.starts_with(&[0xFE, 0xFF]) => {
            let units: Vec<u16> = bytes[2..]
                .chunks_exact(2)
                .map(|c| u16::from_be_bytes([c[0], c[1]]))
                .collect();
            Some(String::from_utf16_lossy(&units))
        }
        Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}
