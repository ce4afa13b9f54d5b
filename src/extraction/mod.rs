//! Page extraction contract: positioned words and tables per page.
//!
//! The indexer opens the PDF to validate it and count its pages, but never interprets content
//! streams. An external extractor produces, for every page, the words with their coordinates
//! and the tables with their bounding boxes; this module defines that shape and the traits the
//! pipeline consumes it through.

mod layout_file;

pub use layout_file::{LayoutFile, LayoutFileOpener, LayoutPage, layout_path_for};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while opening a document or extracting one of its pages.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The document path does not exist.
    #[error("input document not found: {0}")]
    MissingInput(PathBuf),
    /// The document exists but is not a PDF that can be parsed.
    #[error("failed to parse PDF {path}: {source}")]
    UnreadablePdf {
        /// Path of the offending document.
        path: PathBuf,
        /// Underlying parser failure.
        #[source]
        source: lopdf::Error,
    },
    /// The document exists but its extracted layout could not be read.
    #[error("failed to read layout for {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The layout file is not valid JSON for the expected shape.
    #[error("malformed layout file {path}: {source}")]
    Malformed {
        /// Path of the offending layout file.
        path: PathBuf,
        /// Underlying decoding failure.
        #[source]
        source: serde_json::Error,
    },
    /// A single page could not be extracted.
    #[error("page {page} could not be extracted: {message}")]
    Page {
        /// 1-based page number.
        page: usize,
        /// Extractor diagnostic.
        message: String,
    },
}

/// One word with the coordinates of its top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedWord {
    /// Word text as extracted.
    pub text: String,
    /// Horizontal position of the word's left edge.
    pub x0: f64,
    /// Vertical position of the word's top edge (grows downwards).
    pub top: f64,
}

impl PositionedWord {
    /// Convenience constructor.
    pub fn new(text: impl Into<String>, x0: f64, top: f64) -> Self {
        Self {
            text: text.into(),
            x0,
            top,
        }
    }
}

/// Axis-aligned bounding box in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x0: f64,
    /// Top edge.
    pub top: f64,
    /// Right edge.
    pub x1: f64,
    /// Bottom edge.
    pub bottom: f64,
}

/// A table found on a page: rows of optional cells plus its bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionedTable {
    /// Table rows; extractors report merged or empty cells as `None`.
    pub rows: Vec<Vec<Option<String>>>,
    /// Where the table sits on the page.
    pub bbox: BoundingBox,
}

impl PositionedTable {
    /// Top coordinate of the table.
    pub fn top(&self) -> f64 {
        self.bbox.top
    }

    /// Bottom coordinate of the table.
    pub fn bottom(&self) -> f64 {
        self.bbox.bottom
    }
}

/// Everything the pipeline needs from one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageLayout {
    /// 1-based page number.
    pub page_number: usize,
    /// Positioned words in extractor order.
    #[serde(default)]
    pub words: Vec<PositionedWord>,
    /// Tables on the page in extractor order.
    #[serde(default)]
    pub tables: Vec<PositionedTable>,
}

/// Source of per-page layouts for one open document.
pub trait PageTextExtractor {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Extract a single page (1-based).
    fn extract_page(&self, page_number: usize) -> Result<PageLayout, ExtractionError>;
}

/// Opens a document path into a page extractor.
pub trait DocumentOpener {
    /// Open `path`, failing with [`ExtractionError::MissingInput`] when it does not exist.
    fn open(&self, path: &Path) -> Result<Box<dyn PageTextExtractor>, ExtractionError>;
}

/// Extractor over layouts that are already in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPages {
    pages: Vec<PageLayout>,
    page_count: usize,
}

impl InMemoryPages {
    /// Build from page layouts; the page count is the highest page number present.
    pub fn new(pages: Vec<PageLayout>) -> Self {
        let page_count = pages.iter().map(|page| page.page_number).max().unwrap_or(0);
        Self { pages, page_count }
    }
}

impl PageTextExtractor for InMemoryPages {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn extract_page(&self, page_number: usize) -> Result<PageLayout, ExtractionError> {
        self.pages
            .iter()
            .find(|page| page.page_number == page_number)
            .cloned()
            .ok_or_else(|| ExtractionError::Page {
                page: page_number,
                message: "page not present".into(),
            })
    }
}
