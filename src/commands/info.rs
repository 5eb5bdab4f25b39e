use crate::config::Limits;
use crate::pdf::SourceDocument;
use crate::request::read_pdf;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P, limits: &Limits) -> Result<()> {
    let path = path.as_ref();
    let input = read_pdf(path, limits)?;
    let size = input.bytes.len();
    let doc = SourceDocument::load(&input)?;
    let info = doc.info();

    println!("File: {}", path.display());
    println!("Size: {:.2} KB", size as f64 / 1024.0);
    println!("Pages: {}", info.page_count);

    if let Some(size) = &info.page_size {
        println!("Page size: {} x {} {}", size.width, size.height, size.unit);
    }
    if let Some(title) = &info.title {
        println!("Title: {}", title);
    }
    if let Some(author) = &info.author {
        println!("Author: {}", author);
    }
    if let Some(subject) = &info.subject {
        println!("Subject: {}", subject);
    }
    if let Some(keywords) = &info.keywords {
        println!("Keywords: {}", keywords);
    }
    if let Some(creator) = &info.creator {
        println!("Creator: {}", creator);
    }
    if let Some(producer) = &info.producer {
        println!("Producer: {}", producer);
    }
    if let Some(creation_date) = &info.creation_date {
        println!("Created: {}", format_pdf_date(creation_date));
    }
    if let Some(mod_date) = &info.mod_date {
        println!("Modified: {}", format_pdf_date(mod_date));
    }

    Ok(())
}

/// Render a PDF date (D:YYYYMMDDHHmmSS...) as "YYYY-MM-DD HH:mm:SS",
/// leaving anything else untouched.
pub fn format_pdf_date(date: &str) -> String {
    let Some(d) = date.strip_prefix("D:") else {
        return date.to_string();
    };
    let part = |range: std::ops::Range<usize>| d.get(range).filter(|s| s.bytes().all(|b| b.is_ascii_digit()));

    match (part(0..4), part(4..6), part(6..8)) {
        (Some(year), Some(month), Some(day)) => {
            let time = match (part(8..10), part(10..12), part(12..14)) {
                (Some(h), Some(m), Some(s)) => format!(" {}:{}:{}", h, m, s),
                _ => String::new(),
            };
            format!("{}-{}-{}{}", year, month, day, time)
        }
        _ => date.to_string(),
    }
}
