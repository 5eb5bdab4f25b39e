//! In-memory PDFs for tests.
//!
//! Every page draws a single text marker "<label><n>", e.g. "A3", so tests
//! can tell which source page ended up where. MediaBox and the font resource
//! live on the /Pages root and are inherited by the pages.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

pub fn pdf(label: &str, pages: u32) -> Document {
    pdf_with_sizes(label, &vec![None; pages as usize])
}

pub fn pdf_bytes(label: &str, pages: u32) -> Vec<u8> {
    save(&mut pdf(label, pages))
}

/// A document with one page per entry; `Some((w, h))` gives that page its
/// own MediaBox instead of inheriting the Letter-sized one.
pub fn pdf_with_sizes(label: &str, sizes: &[Option<(i64, i64)>]) -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));

    let mut kids = Vec::new();
    for (i, size) in sizes.iter().enumerate() {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
                ),
                Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("{}{}", label, i + 1).into_bytes(),
                        StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().unwrap(),
        ));

        let mut page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ]);
        if let Some((w, h)) = size {
            page.set("MediaBox", media_box(*w, *h));
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(sizes.len() as i64)),
        ("Kids", Object::Array(kids)),
        ("MediaBox", media_box(612, 792)),
        (
            "Resources",
            Object::Dictionary(Dictionary::from_iter(vec![(
                "Font",
                Object::Dictionary(Dictionary::from_iter(vec![(
                    "F1",
                    Object::Reference(font_id),
                )])),
            )])),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc
}

/// Mark `doc` as encrypted with the standard security handler. The keys are
/// junk, so no password opens it.
pub fn encrypt(doc: &mut Document) {
    let encrypt_id = doc.add_object(Dictionary::from_iter(vec![
        ("Filter", Object::Name(b"Standard".to_vec())),
        ("V", Object::Integer(1)),
        ("R", Object::Integer(2)),
        ("Length", Object::Integer(40)),
        ("P", Object::Integer(-4)),
        ("O", Object::String(vec![0x4F; 32], StringFormat::Hexadecimal)),
        ("U", Object::String(vec![0x55; 32], StringFormat::Hexadecimal)),
    ]));
    doc.trailer.set("Encrypt", Object::Reference(encrypt_id));
}

pub fn save(doc: &mut Document) -> Vec<u8> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// The text marker drawn on a page, e.g. "A3".
pub fn marker(doc: &Document, page_id: ObjectId) -> String {
    let content = doc.get_page_content(page_id).unwrap();
    let text = String::from_utf8_lossy(&content);
    let start = text.find('(').unwrap() + 1;
    let end = start + text[start..].find(')').unwrap();
    text[start..end].to_string()
}

/// Markers of every page, in page order.
pub fn markers(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .values()
        .map(|&id| marker(doc, id))
        .collect()
}

fn media_box(w: i64, h: i64) -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(w),
        Object::Integer(h),
    ])
}
