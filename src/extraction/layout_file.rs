//! Layout sidecar files written by an external PDF word/table extractor.
//!
//! For `SOP-ULT-2023.pdf` the extractor writes `SOP-ULT-2023.pdf.layout.json`:
//!
//! ```json
//! { "page_count": 120,
//!   "pages": [ { "page_number": 9, "words": [...], "tables": [...] },
//!              { "page_number": 10, "error": "content stream truncated" } ] }
//! ```
//!
//! The PDF itself is parsed with `lopdf` before the sidecar is read. A file that does not parse
//! fails the document, and the page count always comes from the PDF's page tree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::{
    DocumentOpener, ExtractionError, PageLayout, PageTextExtractor, PositionedTable, PositionedWord,
};

const LAYOUT_SUFFIX: &str = ".layout.json";

/// Serialized layout of a whole document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutFile {
    /// Page count the extractor saw; only compared against the PDF's own count.
    #[serde(default)]
    pub page_count: Option<usize>,
    /// Extracted pages.
    #[serde(default)]
    pub pages: Vec<LayoutPage>,
}

/// One page entry of a [`LayoutFile`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutPage {
    /// 1-based page number.
    pub page_number: usize,
    /// Positioned words.
    #[serde(default)]
    pub words: Vec<PositionedWord>,
    /// Positioned tables.
    #[serde(default)]
    pub tables: Vec<PositionedTable>,
    /// Set when the extractor failed on this page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Location of the layout sidecar for a PDF path.
pub fn layout_path_for(pdf_path: &Path) -> PathBuf {
    let mut name = pdf_path.as_os_str().to_os_string();
    name.push(LAYOUT_SUFFIX);
    PathBuf::from(name)
}

/// Opens PDFs through their layout sidecar.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutFileOpener;

impl DocumentOpener for LayoutFileOpener {
    fn open(&self, path: &Path) -> Result<Box<dyn PageTextExtractor>, ExtractionError> {
        if !path.exists() {
            return Err(ExtractionError::MissingInput(path.to_path_buf()));
        }
        let page_count = pdf_page_count(path)?;
        let layout_path = layout_path_for(path);
        let raw = std::fs::read_to_string(&layout_path).map_err(|source| ExtractionError::Io {
            path: layout_path.clone(),
            source,
        })?;
        let layout: LayoutFile =
            serde_json::from_str(&raw).map_err(|source| ExtractionError::Malformed {
                path: layout_path.clone(),
                source,
            })?;
        tracing::debug!(
            layout = %layout_path.display(),
            pages = layout.pages.len(),
            page_count,
            "Loaded page layout"
        );
        Ok(Box::new(LayoutFileExtractor::new(layout, page_count)))
    }
}

/// Number of pages in the PDF's page tree.
fn pdf_page_count(path: &Path) -> Result<usize, ExtractionError> {
    let document = lopdf::Document::load(path).map_err(|source| ExtractionError::UnreadablePdf {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(document.get_pages().len())
}

struct LayoutFileExtractor {
    page_count: usize,
    pages: BTreeMap<usize, LayoutPage>,
}

impl LayoutFileExtractor {
    fn new(file: LayoutFile, page_count: usize) -> Self {
        if let Some(listed) = file.page_count.filter(|listed| *listed != page_count) {
            tracing::warn!(
                listed,
                page_count,
                "Layout page count differs from the PDF; using the PDF"
            );
        }
        let pages = file
            .pages
            .into_iter()
            .filter(|page| page.page_number <= page_count)
            .map(|page| (page.page_number, page))
            .collect();
        Self { page_count, pages }
    }
}

impl PageTextExtractor for LayoutFileExtractor {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn extract_page(&self, page_number: usize) -> Result<PageLayout, ExtractionError> {
        let Some(page) = self.pages.get(&page_number) else {
            return Err(ExtractionError::Page {
                page: page_number,
                message: "page missing from layout file".into(),
            });
        };
        if let Some(message) = &page.error {
            return Err(ExtractionError::Page {
                page: page_number,
                message: message.clone(),
            });
        }
        Ok(PageLayout {
            page_number,
            words: page.words.clone(),
            tables: page.tables.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{Document, Object, dictionary};
    use std::fs;

    fn write_pdf(path: &Path, pages: usize) {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        let mut kids = Vec::new();
        for _ in 0..pages {
            let page = dictionary! { "Type" => "Page", "Parent" => pages_id };
            kids.push(Object::Reference(document.add_object(page)));
        }
        let tree = dictionary! { "Type" => "Pages", "Kids" => kids, "Count" => pages as i64 };
        document.objects.insert(pages_id, Object::Dictionary(tree));
        let catalog = dictionary! { "Type" => "Catalog", "Pages" => pages_id };
        let catalog_id = document.add_object(catalog);
        document.trailer.set("Root", catalog_id);
        document.save(path).unwrap();
    }

    #[test]
    fn layout_path_appends_suffix() {
        let path = layout_path_for(Path::new("/data/SOP-ULT-2023.pdf"));
        assert_eq!(path, PathBuf::from("/data/SOP-ULT-2023.pdf.layout.json"));
    }

    #[test]
    fn open_rejects_missing_document() {
        let error = LayoutFileOpener
            .open(Path::new("/definitely/not/here.pdf"))
            .err()
            .expect("missing input");
        assert!(matches!(error, ExtractionError::MissingInput(_)));
    }

    #[test]
    fn open_reads_pages_and_page_errors() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("sop.pdf");
        write_pdf(&pdf, 4);
        let layout = serde_json::json!({
            "page_count": 4,
            "pages": [
                { "page_number": 1, "words": [{ "text": "Hello", "x0": 10.0, "top": 20.0 }] },
                { "page_number": 2, "error": "broken content stream" }
            ]
        });
        fs::write(layout_path_for(&pdf), layout.to_string()).unwrap();

        let extractor = LayoutFileOpener.open(&pdf).expect("layout opens");
        assert_eq!(extractor.page_count(), 4);
        assert_eq!(extractor.extract_page(1).unwrap().words.len(), 1);
        assert!(matches!(
            extractor.extract_page(2),
            Err(ExtractionError::Page { page: 2, .. })
        ));
        assert!(matches!(
            extractor.extract_page(3),
            Err(ExtractionError::Page { page: 3, .. })
        ));
    }

    #[test]
    fn page_count_comes_from_the_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("short.pdf");
        write_pdf(&pdf, 2);
        let layout = serde_json::json!({
            "page_count": 5,
            "pages": [
                { "page_number": 2, "words": [] },
                { "page_number": 5, "words": [] }
            ]
        });
        fs::write(layout_path_for(&pdf), layout.to_string()).unwrap();

        let extractor = LayoutFileOpener.open(&pdf).expect("layout opens");
        assert_eq!(extractor.page_count(), 2);
        assert!(extractor.extract_page(2).is_ok());
        assert!(extractor.extract_page(5).is_err());
    }

    #[test]
    fn open_rejects_file_that_is_not_a_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("scan.pdf");
        fs::write(&pdf, b"not a pdf at all").unwrap();
        fs::write(layout_path_for(&pdf), r#"{ "pages": [] }"#).unwrap();

        let error = LayoutFileOpener.open(&pdf).err().expect("unreadable");
        assert!(matches!(error, ExtractionError::UnreadablePdf { .. }));
    }

    #[test]
    fn open_reports_malformed_layout() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("broken.pdf");
        write_pdf(&pdf, 1);
        fs::write(layout_path_for(&pdf), "{ not json").unwrap();

        let error = LayoutFileOpener.open(&pdf).err().expect("malformed");
        assert!(matches!(error, ExtractionError::Malformed { .. }));
    }
}
