//! Text-layer extraction.
//!
//! Pages are visited in document order and their text is emitted as a stream
//! of [`PageEvent`]s. Iteration stops at the page cap, so later pages are never
//! decoded.

use std::collections::VecDeque;

use lopdf::Document;

use crate::error::ExtractError;

/// Every PDF starts with this marker.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Marker lopdf emits for CID fonts it cannot decode.
const IDENTITY_H_PATTERN: &str = "?Identity-H Unimplemented?";

/// One step of the text-layer walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    /// A new page begins (1-based).
    Page(u32),
    /// A whitespace-free text token on the current page.
    Text(String),
}

/// Lazy iterator over page and text events, ending after `page_limit` pages.
pub struct PageEvents<'a> {
    doc: &'a Document,
    pages: std::vec::IntoIter<u32>,
    page_limit: u32,
    pending: VecDeque<PageEvent>,
}

impl<'a> PageEvents<'a> {
    pub fn new(doc: &'a Document, page_limit: u32) -> Self {
        let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
        Self {
            doc,
            pages: pages.into_iter(),
            page_limit,
            pending: VecDeque::new(),
        }
    }

    fn load_page(&mut self, page: u32) {
        self.pending.push_back(PageEvent::Page(page));
        match self.doc.extract_text(&[page]) {
            Ok(text) => {
                let text = text.replace(IDENTITY_H_PATTERN, " ");
                self.pending.extend(
                    text.split_whitespace()
                        .map(|token| PageEvent::Text(token.to_string())),
                );
            }
            Err(e) => {
                tracing::warn!(page, error = %e, "Failed to decode page text, skipping");
            }
        }
    }
}

impl Iterator for PageEvents<'_> {
    type Item = PageEvent;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(event) = self.pending.pop_front() {
            return Some(event);
        }

        let page = self.pages.next()?;
        if page > self.page_limit {
            tracing::debug!(page, limit = self.page_limit, "Page cap reached");
            // Drain so later calls stay cheap.
            self.pages = Vec::new().into_iter();
            return None;
        }

        self.load_page(page);
        self.pending.pop_front()
    }
}

/// Result of reading the embedded text of a PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLayer {
    /// Tokens joined by single spaces, trimmed.
    pub text: String,
    /// Total pages in the document.
    pub page_count: u32,
    /// Highest page that was read.
    pub extracted_pages: u32,
}

/// Checks the `%PDF-` signature.
pub fn check_signature(bytes: &[u8]) -> Result<(), ExtractError> {
    if bytes.starts_with(PDF_MAGIC) {
        Ok(())
    } else {
        Err(ExtractError::Format)
    }
}

/// Parses the buffer. Structural errors are returned, never swallowed.
pub fn load_document(bytes: &[u8]) -> Result<Document, ExtractError> {
    check_signature(bytes)?;
    Document::load_mem(bytes).map_err(|e| ExtractError::Parse(e.to_string()))
}

/// Reads the text layer of at most `page_limit` pages.
pub fn extract_text_layer(bytes: &[u8], page_limit: u32) -> Result<TextLayer, ExtractError> {
    let _span = tracing::info_span!("processor.pdf", page_limit).entered();

    let doc = load_document(bytes)?;
    let page_count = doc.get_pages().len() as u32;
    if page_count == 0 {
        return Err(ExtractError::Parse("document has no pages".to_string()));
    }

    let mut text = String::new();
    let mut extracted_pages = 0;

    for event in PageEvents::new(&doc, page_limit) {
        match event {
            PageEvent::Page(page) => extracted_pages = extracted_pages.max(page),
            PageEvent::Text(token) => {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(&token);
            }
        }
    }

    tracing::debug!(
        page_count,
        extracted_pages,
        chars = text.chars().count(),
        "Text layer read"
    );

    Ok(TextLayer {
        text: text.trim().to_string(),
        page_count,
        extracted_pages,
    })
}
