use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::Serialize;
use tracing::debug;

use crate::error::ComposeError;

/// Attributes a page may inherit from its ancestors in the page tree.
pub(crate) const INHERITABLE: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

// Guards against cyclic /Parent chains in damaged files.
const MAX_TREE_DEPTH: usize = 64;

/// Raw bytes of an input document together with the name that identifies it
/// in errors and reports.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl DocumentInput {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        DocumentInput {
            name: name.into(),
            bytes,
        }
    }
}

/// A loaded PDF whose pages can be enumerated and copied.
pub struct SourceDocument {
    doc: Document,
    name: String,
}

impl SourceDocument {
    pub fn load(input: &DocumentInput) -> Result<Self, ComposeError> {
        let doc = Document::load_mem(&input.bytes)
            .map_err(|e| ComposeError::unprocessable(&input.name, e))?;
        Self::from_document(&input.name, doc)
    }

    /// Wrap an already parsed document, checking that its pages can be
    /// enumerated.
    pub fn from_document(name: &str, doc: Document) -> Result<Self, ComposeError> {
        if doc.is_encrypted() {
            return Err(ComposeError::unprocessable(name, "document is encrypted"));
        }

        let pages_ref = doc
            .catalog()
            .and_then(|catalog| catalog.get(b"Pages"))
            .and_then(Object::as_reference)
            .map_err(|e| ComposeError::unprocessable(name, format!("no page tree: {}", e)))?;
        doc.get_dictionary(pages_ref)
            .map_err(|e| ComposeError::unprocessable(name, format!("no page tree: {}", e)))?;

        for (num, id) in doc.get_pages() {
            if doc.get_dictionary(id).is_err() {
                return Err(ComposeError::unprocessable(
                    name,
                    format!("page {} ({} {} R) is missing", num, id.0, id.1),
                ));
            }
        }

        debug!(name, pages = doc.get_pages().len(), "source document loaded");
        Ok(SourceDocument {
            doc,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn document(&self) -> &Document {
        &self.doc
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    pub fn page_id(&self, page: u32) -> Option<ObjectId> {
        self.doc.get_pages().get(&page).copied()
    }

    /// Width and height of a page's media box in points, following
    /// inheritance from the page tree.
    pub fn page_size(&self, page: u32) -> Option<(f32, f32)> {
        let id = self.page_id(page)?;
        let media_box = inherited_attribute(&self.doc, id, b"MediaBox")?;
        let values: Vec<f32> = match resolve(&self.doc, media_box) {
            Object::Array(items) => items
                .iter()
                .filter_map(|item| number(resolve(&self.doc, item)))
                .collect(),
            _ => return None,
        };
        match values.as_slice() {
            [x0, y0, x1, y1] => Some(((x1 - x0).abs(), (y1 - y0).abs())),
            _ => None,
        }
    }

    /// Get metadata from the document info dictionary
    pub fn info(&self) -> DocumentInfo {
        let mut info = DocumentInfo {
            page_count: self.page_count(),
            ..Default::default()
        };

        let dict = self
            .doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|obj| resolve(&self.doc, obj).as_dict().ok());
        if let Some(dict) = dict {
            info.title = get_string_from_dict(dict, b"Title");
            info.author = get_string_from_dict(dict, b"Author");
            info.subject = get_string_from_dict(dict, b"Subject");
            info.keywords = get_string_from_dict(dict, b"Keywords");
            info.creator = get_string_from_dict(dict, b"Creator");
            info.producer = get_string_from_dict(dict, b"Producer");
            info.creation_date = get_string_from_dict(dict, b"CreationDate");
            info.mod_date = get_string_from_dict(dict, b"ModDate");
        }

        info.page_size = self.page_size(1).map(|(width, height)| PageSize {
            width: width.round() as u32,
            height: height.round() as u32,
            unit: "points",
        });
        info
    }
}

#[derive(Debug, Default, Clone, Serialize)]
pub struct DocumentInfo {
    pub page_count: u32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
    /// Size of the first page
    pub page_size: Option<PageSize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
    pub unit: &'static str,
}

/// Look up `key` on a page, walking up /Parent links when the page itself
/// does not carry it.
pub(crate) fn inherited_attribute<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut dict = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        let parent = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
        dict = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// Follow a single indirect reference, leaving direct objects untouched.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        _ => None,
    }
}

fn decode_pdf_string(bytes: &[u8]) -> Option<String> {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16(&units).ok()
        }
        // PDFDocEncoding agrees with Latin-1 for the printable range
        _ => Some(bytes.iter().map(|&b| b as char).collect()),
    }
}
