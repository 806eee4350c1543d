//! AcroForm template builder
//!
//! Produces small but structurally complete form PDFs: a page tree, a
//! Helvetica resource, an `/AcroForm` with `/Fields`, and widget
//! annotations with appearance streams where real authoring tools emit them.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// US Letter in points
pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;

const FF_RADIO: i64 = 1 << 15;
const FF_PUSHBUTTON: i64 = 1 << 16;
const FF_MULTILINE: i64 = 1 << 12;

/// Rectangle in PDF user space: `[llx, lly, urx, ury]`
pub type PdfRect = [f32; 4];

#[derive(Debug, Clone)]
enum FieldTemplate {
    Text {
        name: String,
        rect: PdfRect,
        multiline: bool,
    },
    Checkbox {
        name: String,
        rect: PdfRect,
        on_state: String,
    },
    Radio {
        name: String,
        options: Vec<(String, PdfRect)>,
    },
    ImageButton {
        name: String,
        rect: PdfRect,
    },
    Nested {
        parent: String,
        child: String,
        rect: PdfRect,
    },
}

/// Builder for form templates
#[derive(Debug, Clone)]
pub struct FormTemplateBuilder {
    pages: Vec<Vec<FieldTemplate>>,
    page_box: PdfRect,
}

impl Default for FormTemplateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl FormTemplateBuilder {
    /// A builder with one empty US Letter page
    pub fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            page_box: [0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT],
        }
    }

    /// Use a custom `/MediaBox` for every page
    pub fn with_page_box(mut self, page_box: PdfRect) -> Self {
        self.page_box = page_box;
        self
    }

    /// Start a new page; later fields go there
    pub fn new_page(mut self) -> Self {
        self.pages.push(Vec::new());
        self
    }

    pub fn text_field(self, name: &str, rect: PdfRect) -> Self {
        self.push(FieldTemplate::Text {
            name: name.to_string(),
            rect,
            multiline: false,
        })
    }

    pub fn multiline_field(self, name: &str, rect: PdfRect) -> Self {
        self.push(FieldTemplate::Text {
            name: name.to_string(),
            rect,
            multiline: true,
        })
    }

    /// Checkbox with `Yes`/`Off` appearance states
    pub fn checkbox(self, name: &str, rect: PdfRect) -> Self {
        self.checkbox_with_state(name, rect, "Yes")
    }

    /// Checkbox whose on-state has a custom name
    pub fn checkbox_with_state(self, name: &str, rect: PdfRect, on_state: &str) -> Self {
        self.push(FieldTemplate::Checkbox {
            name: name.to_string(),
            rect,
            on_state: on_state.to_string(),
        })
    }

    /// Radio group: one widget per `(state, rect)` option
    pub fn radio_group(self, name: &str, options: &[(&str, PdfRect)]) -> Self {
        self.push(FieldTemplate::Radio {
            name: name.to_string(),
            options: options
                .iter()
                .map(|(state, rect)| (state.to_string(), *rect))
                .collect(),
        })
    }

    /// Push button used as an image placeholder
    pub fn image_button(self, name: &str, rect: PdfRect) -> Self {
        self.push(FieldTemplate::ImageButton {
            name: name.to_string(),
            rect,
        })
    }

    /// Text widget `child` under a non-terminal field `parent`,
    /// addressed as `parent.child`
    pub fn nested_text_field(self, parent: &str, child: &str, rect: PdfRect) -> Self {
        self.push(FieldTemplate::Nested {
            parent: parent.to_string(),
            child: child.to_string(),
            rect,
        })
    }

    fn push(mut self, field: FieldTemplate) -> Self {
        if let Some(page) = self.pages.last_mut() {
            page.push(field);
        }
        self
    }

    /// Serialized PDF
    pub fn build(&self) -> Vec<u8> {
        let mut doc = self.build_document();
        let mut out = Vec::new();
        doc.save_to(&mut out).expect("writing to a Vec cannot fail");
        out
    }

    /// The in-memory document
    pub fn build_document(&self) -> Document {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut page_ids = Vec::new();
        let mut fields = Vec::new();

        for (index, templates) in self.pages.iter().enumerate() {
            let page_id = doc.new_object_id();
            let content = format!("BT /Helv 12 Tf 50 760 Td (Form page {}) Tj ET\n", index + 1);
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));

            let mut annots = Vec::new();
            for template in templates {
                let (widgets, field) = add_field(&mut doc, page_id, font_id, template);
                annots.extend(widgets.into_iter().map(Object::Reference));
                fields.push(Object::Reference(field));
            }

            doc.objects.insert(
                page_id,
                Object::Dictionary(dictionary! {
                    "Type" => "Page",
                    "Parent" => pages_id,
                    "MediaBox" => self.page_box.iter().map(|v| Object::Real(*v)).collect::<Vec<_>>(),
                    "Contents" => content_id,
                    "Resources" => dictionary! {
                        "Font" => dictionary! { "Helv" => font_id },
                    },
                    "Annots" => annots,
                }),
            );
            page_ids.push(page_id);
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
                "Count" => page_ids.len() as i64,
            }),
        );

        let acroform_id = doc.add_object(dictionary! {
            "Fields" => fields,
            "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
            "DR" => dictionary! {
                "Font" => dictionary! { "Helv" => font_id },
            },
        });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
            "AcroForm" => acroform_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }
}

/// Add one field; returns the widget ids to list in `/Annots` and the id to
/// list in `/Fields`
fn add_field(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    template: &FieldTemplate,
) -> (Vec<ObjectId>, ObjectId) {
    match template {
        FieldTemplate::Text {
            name,
            rect,
            multiline,
        } => {
            let mut widget = widget_dict(page_id, *rect);
            widget.set("FT", "Tx");
            widget.set("T", Object::string_literal(name.as_str()));
            widget.set("DA", Object::string_literal("/Helv 10 Tf 0 g"));
            if *multiline {
                widget.set("Ff", FF_MULTILINE);
            }
            let ap = appearance(doc, *rect, font_id, b"/Tx BMC EMC\n".to_vec());
            widget.set("AP", dictionary! { "N" => ap });
            let id = doc.add_object(widget);
            (vec![id], id)
        }
        FieldTemplate::Checkbox {
            name,
            rect,
            on_state,
        } => {
            let mut widget = widget_dict(page_id, *rect);
            widget.set("FT", "Btn");
            widget.set("T", Object::string_literal(name.as_str()));
            widget.set("V", "Off");
            widget.set("AS", "Off");
            let states = toggle_states(doc, *rect, font_id, on_state);
            widget.set("AP", dictionary! { "N" => states });
            let id = doc.add_object(widget);
            (vec![id], id)
        }
        FieldTemplate::Radio { name, options } => {
            let parent_id = doc.new_object_id();
            let mut kids = Vec::new();
            for (state, rect) in options {
                let mut widget = widget_dict(page_id, *rect);
                widget.set("Parent", parent_id);
                widget.set("AS", "Off");
                let states = toggle_states(doc, *rect, font_id, state);
                widget.set("AP", dictionary! { "N" => states });
                kids.push(doc.add_object(widget));
            }
            doc.objects.insert(
                parent_id,
                Object::Dictionary(dictionary! {
                    "FT" => "Btn",
                    "Ff" => FF_RADIO,
                    "T" => Object::string_literal(name.as_str()),
                    "V" => "Off",
                    "Kids" => kids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
                }),
            );
            (kids, parent_id)
        }
        FieldTemplate::ImageButton { name, rect } => {
            let mut widget = widget_dict(page_id, *rect);
            widget.set("FT", "Btn");
            widget.set("Ff", FF_PUSHBUTTON);
            widget.set("T", Object::string_literal(name.as_str()));
            let ap = appearance(
                doc,
                *rect,
                font_id,
                b"0.9 g 0 0 m 1 0 l 1 1 l 0 1 l f\n".to_vec(),
            );
            widget.set("AP", dictionary! { "N" => ap });
            let id = doc.add_object(widget);
            (vec![id], id)
        }
        FieldTemplate::Nested {
            parent,
            child,
            rect,
        } => {
            let parent_id = doc.new_object_id();
            let mut widget = widget_dict(page_id, *rect);
            widget.set("FT", "Tx");
            widget.set("T", Object::string_literal(child.as_str()));
            widget.set("Parent", parent_id);
            let widget_id = doc.add_object(widget);
            doc.objects.insert(
                parent_id,
                Object::Dictionary(dictionary! {
                    "T" => Object::string_literal(parent.as_str()),
                    "Kids" => vec![Object::Reference(widget_id)],
                }),
            );
            (vec![widget_id], parent_id)
        }
    }
}

fn widget_dict(page_id: ObjectId, rect: PdfRect) -> Dictionary {
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "Rect" => rect.iter().map(|v| Object::Real(*v)).collect::<Vec<_>>(),
        "P" => page_id,
        "F" => 4,
    }
}

fn appearance(doc: &mut Document, rect: PdfRect, font_id: ObjectId, content: Vec<u8>) -> ObjectId {
    let width = rect[2] - rect[0];
    let height = rect[3] - rect[1];
    doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![Object::Integer(0), Object::Integer(0), Object::Real(width), Object::Real(height)],
            "Resources" => dictionary! {
                "Font" => dictionary! { "Helv" => font_id },
            },
        },
        content,
    ))
}

/// `/N` state dictionary with `on_state` and `Off`
fn toggle_states(doc: &mut Document, rect: PdfRect, font_id: ObjectId, on_state: &str) -> Dictionary {
    let on = appearance(doc, rect, font_id, b"q 0 g BT /Helv 10 Tf 2 2 Td (X) Tj ET Q\n".to_vec());
    let off = appearance(doc, rect, font_id, Vec::new());
    let mut states = Dictionary::new();
    states.set(on_state, on);
    states.set("Off", off);
    states
}
