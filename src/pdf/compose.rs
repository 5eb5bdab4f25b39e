use std::collections::{BTreeMap, HashMap};

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::error::ComposeError;
use crate::page_range::PageSet;
use crate::pdf::document::{inherited_attribute, DocumentInput, SourceDocument, INHERITABLE};
use crate::pdf::raster::{self, DecodedImage, ImageInput};

/// A new PDF assembled page by page. Pages can only be appended; `finish`
/// serialises the result and consumes the document.
pub struct ComposedDocument {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl Default for ComposedDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl ComposedDocument {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.7");
        // the /Pages node itself is written by `finish`
        let pages_id = doc.new_object_id();
        ComposedDocument {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Copy the given 1-based pages of `source`, in iteration order.
    ///
    /// Objects shared between those pages, such as fonts, are copied once.
    pub fn append_pages<I>(&mut self, source: &SourceDocument, pages: I) -> Result<usize, ComposeError>
    where
        I: IntoIterator<Item = u32>,
    {
        let page_ids = source.document().get_pages();
        let mut copier = PageCopier::new(source.document(), &page_ids);
        let mut appended = 0;

        for page in pages {
            let page_id = *page_ids.get(&page).ok_or_else(|| {
                ComposeError::unprocessable(source.name(), format!("page {} does not exist", page))
            })?;
            let new_id = copier
                .copy_page(&mut self.doc, page_id, self.pages_id)
                .map_err(|reason| ComposeError::unprocessable(source.name(), reason))?;
            self.kids.push(new_id);
            appended += 1;
        }

        Ok(appended)
    }

    /// Add a page showing `image`, sized by [`raster::place`].
    pub fn append_image_page(&mut self, image: DecodedImage) -> Result<(), ComposeError> {
        let placement = raster::place(image.width, image.height);

        let mut image_dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"XObject".to_vec())),
            ("Subtype", Object::Name(b"Image".to_vec())),
            ("Width", Object::Integer(i64::from(image.width))),
            ("Height", Object::Integer(i64::from(image.height))),
            ("ColorSpace", Object::Name(image.color.pdf_name().to_vec())),
            ("BitsPerComponent", Object::Integer(8)),
        ]);
        if let Some(alpha) = image.alpha {
            let mask = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"XObject".to_vec())),
                ("Subtype", Object::Name(b"Image".to_vec())),
                ("Width", Object::Integer(i64::from(image.width))),
                ("Height", Object::Integer(i64::from(image.height))),
                ("ColorSpace", Object::Name(b"DeviceGray".to_vec())),
                ("BitsPerComponent", Object::Integer(8)),
            ]);
            let mask_id = self.doc.add_object(compressed(mask, alpha));
            image_dict.set("SMask", Object::Reference(mask_id));
        }
        let image_id = self.doc.add_object(compressed(image_dict, image.pixels));

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(placement.width),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(placement.height),
                        Object::Real(placement.x),
                        Object::Real(placement.y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = self
            .doc
            .add_object(compressed(Dictionary::new(), content.encode()?));

        let resources = Dictionary::from_iter(vec![(
            "XObject",
            Object::Dictionary(Dictionary::from_iter(vec![(
                "Im0",
                Object::Reference(image_id),
            )])),
        )]);
        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(self.pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Real(placement.page_width),
                    Object::Real(placement.page_height),
                ]),
            ),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]);
        let page_id = self.doc.add_object(page);
        self.kids.push(page_id);

        debug!(
            width = image.width,
            height = image.height,
            page_width = placement.page_width,
            page_height = placement.page_height,
            "image page added"
        );
        Ok(())
    }

    /// Write the page tree and catalog, then serialise.
    pub fn finish(mut self) -> Result<Vec<u8>, ComposeError> {
        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            (
                "Kids",
                Object::Array(self.kids.iter().map(|&id| Object::Reference(id)).collect()),
            ),
            ("Count", Object::Integer(self.kids.len() as i64)),
        ]);
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));

        let catalog_id = self.doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        let info_id = self.doc.add_object(Dictionary::from_iter(vec![(
            "Producer",
            Object::String(
                concat!("pagewright ", env!("CARGO_PKG_VERSION")).into(),
                StringFormat::Literal,
            ),
        )]));
        self.doc.trailer.set("Info", Object::Reference(info_id));

        let mut output = Vec::new();
        self.doc
            .save_to(&mut output)
            .map_err(ComposeError::Serialize)?;

        debug!(pages = self.kids.len(), bytes = output.len(), "composed document written");
        Ok(output)
    }
}

fn compressed(dict: Dictionary, content: Vec<u8>) -> Stream {
    let mut stream = Stream::new(dict, content);
    if let Err(err) = stream.compress() {
        // an uncompressed stream is still valid
        warn!(%err, "stream compression failed");
    }
    stream
}

/// Deep-copies pages of one source document into a target, remapping object
/// ids. The remap table is shared by every page copied through the same
/// copier, so each source object lands in the target at most once.
///
/// Indirect objects are copied from a worklist, not by recursion, so the
/// depth of a reference chain is unbounded.
struct PageCopier<'a> {
    source: &'a Document,
    page_ids: &'a BTreeMap<u32, ObjectId>,
    remap: HashMap<ObjectId, ObjectId>,
    // (source id, target id) pairs allocated but not yet filled in
    pending: Vec<(ObjectId, ObjectId)>,
}

impl<'a> PageCopier<'a> {
    fn new(source: &'a Document, page_ids: &'a BTreeMap<u32, ObjectId>) -> Self {
        PageCopier {
            source,
            page_ids,
            remap: HashMap::new(),
            pending: Vec::new(),
        }
    }

    fn copy_page(
        &mut self,
        target: &mut Document,
        page_id: ObjectId,
        parent: ObjectId,
    ) -> Result<ObjectId, String> {
        let source = self.source;
        let page = source
            .get_dictionary(page_id)
            .map_err(|e| format!("page object {} {} R: {}", page_id.0, page_id.1, e))?;

        let new_id = target.new_object_id();
        self.remap.insert(page_id, new_id);

        let mut dict = Dictionary::new();
        for (key, value) in page.iter() {
            if key.as_slice() == b"Parent" {
                continue;
            }
            dict.set(key.clone(), self.copy(target, value));
        }
        for key in INHERITABLE {
            if dict.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(source, page_id, key) {
                dict.set(key.to_vec(), self.copy(target, value));
            }
        }
        dict.set("Parent", Object::Reference(parent));
        target.objects.insert(new_id, Object::Dictionary(dict));

        self.drain(target);
        Ok(new_id)
    }

    /// Fill in every object allocated by `copy_reference`, including those
    /// discovered while copying others.
    fn drain(&mut self, target: &mut Document) {
        let source = self.source;
        while let Some((old_id, new_id)) = self.pending.pop() {
            let copied = match source.get_object(old_id) {
                Ok(object) => self.copy(target, object),
                Err(_) => Object::Null,
            };
            target.objects.insert(new_id, copied);
        }
    }

    fn copy(&mut self, target: &mut Document, object: &Object) -> Object {
        match object {
            Object::Reference(id) => self.copy_reference(target, *id),
            Object::Array(items) => {
                Object::Array(items.iter().map(|item| self.copy(target, item)).collect())
            }
            Object::Dictionary(dict) => Object::Dictionary(self.copy_dict(target, dict)),
            Object::Stream(stream) => {
                let mut copied = stream.clone();
                copied.dict = self.copy_dict(target, &stream.dict);
                Object::Stream(copied)
            }
            other => other.clone(),
        }
    }

    fn copy_dict(&mut self, target: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut copied = Dictionary::new();
        for (key, value) in dict.iter() {
            copied.set(key.clone(), self.copy(target, value));
        }
        copied
    }

    fn copy_reference(&mut self, target: &mut Document, id: ObjectId) -> Object {
        if let Some(&new_id) = self.remap.get(&id) {
            return Object::Reference(new_id);
        }

        let source = self.source;
        let object = match source.get_object(id) {
            Ok(object) => object,
            Err(err) => {
                warn!(?id, %err, "unresolvable reference replaced with null");
                return Object::Null;
            }
        };

        // Links to pages that are not (yet) part of the output, and to the
        // source's page tree, would drag the whole source document along.
        let is_page = self.page_ids.values().any(|&page| page == id);
        if is_page || matches!(object.type_name().unwrap_or(b""), b"Page" | b"Pages") {
            return Object::Null;
        }

        let new_id = target.new_object_id();
        self.remap.insert(id, new_id);
        self.pending.push((id, new_id));
        Object::Reference(new_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionKind {
    Selection,
    Concatenation,
    Images,
}

/// What happened to one input of a composition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    Included { name: String, pages: usize },
    Skipped { name: String, reason: String },
}

/// Per-input outcomes and page counts of a finished composition.
#[derive(Debug, Clone, Serialize)]
pub struct CompositionReport {
    pub kind: CompositionKind,
    pub total_pages: usize,
    /// Page count of the source document of a selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_pages: Option<u32>,
    pub items: Vec<ItemOutcome>,
}

impl CompositionReport {
    fn new(kind: CompositionKind) -> Self {
        CompositionReport {
            kind,
            total_pages: 0,
            source_pages: None,
            items: Vec::new(),
        }
    }

    /// Number of input documents or images.
    pub fn sources(&self) -> usize {
        self.items.len()
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().filter_map(|item| match item {
            ItemOutcome::Skipped { name, reason } => Some((name.as_str(), reason.as_str())),
            ItemOutcome::Included { .. } => None,
        })
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().count()
    }

    /// Whether some inputs were left out of an otherwise successful result.
    pub fn is_partial(&self) -> bool {
        self.skipped_count() > 0
    }
}

pub struct Composition {
    pub document: ComposedDocument,
    pub report: CompositionReport,
}

/// Copy the selected pages of `source`, in ascending order, into a new
/// document.
#[instrument(skip_all, fields(source = source.name(), selected = pages.len()))]
pub fn compose_from_selection(
    source: &SourceDocument,
    pages: &PageSet,
) -> Result<Composition, ComposeError> {
    if pages.is_empty() {
        return Err(ComposeError::EmptySelection);
    }

    let mut document = ComposedDocument::new();
    let copied = document.append_pages(source, pages)?;

    let mut report = CompositionReport::new(CompositionKind::Selection);
    report.items.push(ItemOutcome::Included {
        name: source.name().to_string(),
        pages: copied,
    });
    report.total_pages = document.page_count();
    report.source_pages = Some(source.page_count());

    info!(
        total_pages = report.total_pages,
        source_pages = source.page_count(),
        "selection composed"
    );
    Ok(Composition { document, report })
}

/// Append every page of every input, in input order. The first input that
/// cannot be loaded aborts the whole composition.
#[instrument(skip_all, fields(inputs = inputs.len()))]
pub fn compose_from_concatenation(inputs: &[DocumentInput]) -> Result<Composition, ComposeError> {
    let mut document = ComposedDocument::new();
    let mut report = CompositionReport::new(CompositionKind::Concatenation);

    for input in inputs {
        let source = SourceDocument::load(input)?;
        let added = document.append_pages(&source, 1..=source.page_count())?;
        debug!(name = %input.name, pages = added, "source appended");
        report.items.push(ItemOutcome::Included {
            name: input.name.clone(),
            pages: added,
        });
    }

    if document.page_count() == 0 {
        return Err(ComposeError::NoOutput(
            "the input documents contain no pages".to_string(),
        ));
    }
    report.total_pages = document.page_count();

    info!(
        total_pages = report.total_pages,
        sources = report.sources(),
        "concatenation composed"
    );
    Ok(Composition { document, report })
}

/// Render each image on a page of its own. Images that cannot be rendered are
/// skipped and recorded in the report; the composition fails only when none
/// can be rendered.
#[instrument(skip_all, fields(images = images.len()))]
pub fn compose_from_images(images: &[ImageInput]) -> Result<Composition, ComposeError> {
    let mut document = ComposedDocument::new();
    let mut report = CompositionReport::new(CompositionKind::Images);

    for input in images {
        match raster::decode(&input.bytes) {
            Ok(decoded) => {
                document.append_image_page(decoded)?;
                report.items.push(ItemOutcome::Included {
                    name: input.name.clone(),
                    pages: 1,
                });
            }
            Err(reason) => {
                warn!(name = %input.name, %reason, "skipping image");
                report.items.push(ItemOutcome::Skipped {
                    name: input.name.clone(),
                    reason: reason.to_string(),
                });
            }
        }
    }

    if document.page_count() == 0 {
        return Err(ComposeError::NoOutput(format!(
            "none of the {} images could be rendered",
            images.len()
        )));
    }
    report.total_pages = document.page_count();

    info!(
        total_pages = report.total_pages,
        skipped = report.skipped_count(),
        "images composed"
    );
    Ok(Composition { document, report })
}
