//! PDFs built in memory for tests.

#![allow(dead_code)]

use lopdf::{dictionary, Document, Object, Stream};

/// Builds a PDF whose pages each draw one line of text. An empty string
/// yields a page without text, like a scanned image page.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    build(pages, 0)
}

/// Like [`pdf_with_pages`], plus an unreferenced stream of `padding` bytes to
/// reach a realistic file size.
pub fn padded_pdf(pages: &[&str], padding: usize) -> Vec<u8> {
    build(pages, padding)
}

/// A sentence-rich line of roughly `len` characters.
pub fn long_text(len: usize) -> String {
    let mut text = String::new();
    let mut n = 1;
    while text.len() < len {
        text.push_str(&format!("Sentence number {} explains the topic. ", n));
        n += 1;
    }
    text.trim_end().to_string()
}

fn build(pages: &[&str], padding: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = if text.is_empty() {
            String::new()
        } else {
            format!("BT /F1 12 Tf 50 700 Td ({}) Tj ET", text)
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    if padding > 0 {
        doc.add_object(Stream::new(dictionary! {}, vec![b'0'; padding]));
    }

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}
