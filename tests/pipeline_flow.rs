use std::path::Path;

use sop_indexer::extraction::{
    BoundingBox, DocumentOpener, ExtractionError, InMemoryPages, LayoutFileOpener, PageLayout,
    PageTextExtractor, PositionedTable, PositionedWord,
};
use sop_indexer::pipeline::{Category, IndexOptions, IndexingService, PageWindow};
use sop_indexer::store::{DocumentStatus, MemoryStore};

struct StaticPages(Vec<PageLayout>);

impl DocumentOpener for StaticPages {
    fn open(&self, _path: &Path) -> Result<Box<dyn PageTextExtractor>, ExtractionError> {
        Ok(Box::new(InMemoryPages::new(self.0.clone())))
    }
}

fn words_at(text: &str, top: f64) -> Vec<PositionedWord> {
    text.split_whitespace()
        .enumerate()
        .map(|(i, word)| PositionedWord::new(word, 40.0 + i as f64 * 55.0, top))
        .collect()
}

fn component_table(rows: &[(&str, &str)], top: f64, bottom: f64) -> PositionedTable {
    let mut cells = vec![vec![
        Some("No.".to_string()),
        Some("Komponen".to_string()),
        Some("Uraian".to_string()),
    ]];
    cells.extend(rows.iter().enumerate().map(|(i, (label, text))| {
        vec![
            Some(format!("{}.", i + 1)),
            Some(label.to_string()),
            Some(text.to_string()),
        ]
    }));
    PositionedTable {
        rows: cells,
        bbox: BoundingBox {
            x0: 30.0,
            top,
            x1: 560.0,
            bottom,
        },
    }
}

fn title_page(number: usize, title: &str, rows: &[(&str, &str)]) -> PageLayout {
    PageLayout {
        page_number: number,
        words: words_at(title, 60.0),
        tables: vec![component_table(rows, 90.0, 700.0)],
    }
}

fn continuation_page(number: usize, rows: &[(&str, &str)]) -> PageLayout {
    PageLayout {
        page_number: number,
        words: words_at("Lanjutan tabel", 20.0),
        tables: vec![component_table(rows, 40.0, 500.0)],
    }
}

fn service_for(pages: Vec<PageLayout>, store: MemoryStore) -> IndexingService<MemoryStore> {
    IndexingService::new(Box::new(StaticPages(pages)), store, IndexOptions::default())
}

#[test]
fn record_spanning_pages_collects_both_tables() {
    let pages = vec![
        title_page(
            1,
            "1. Standar Pelayanan Legalisir Ijazah",
            &[("Persyaratan Pelayanan", "Fotokopi ijazah")],
        ),
        continuation_page(
            2,
            &[(
                "Sistem, Mekanisme dan Prosedur",
                "a. Isi formulir. b. Serahkan berkas. c. Ambil hasil.",
            )],
        ),
    ];
    let mut service = service_for(pages, MemoryStore::new());
    let report = service.index_document(Path::new("SOP-ULT-2023.pdf"));

    assert!(report.succeeded(), "{:?}", report.error);
    assert_eq!(report.pages_scanned, 2);
    assert_eq!(report.records.len(), 1);

    let stored = &service.store().records()[0].batch;
    assert_eq!(stored.record.code, "SOP-ULT-001");
    assert_eq!(stored.record.title, "Standar Pelayanan Legalisir Ijazah");
    assert_eq!(stored.record.start_page, 1);
    assert_eq!(
        stored.record.file_url,
        "storage/dokumen/sop/SOP-ULT-2023.pdf"
    );
    let categories: Vec<Category> = stored.components.iter().map(|c| c.category).collect();
    assert_eq!(
        categories,
        vec![Category::Requirements, Category::Procedure]
    );

    let steps: Vec<&str> = stored
        .steps
        .iter()
        .map(|s| s.description.as_str())
        .collect();
    assert_eq!(
        steps,
        vec!["Isi formulir.", "Serahkan berkas.", "Ambil hasil."]
    );

    let sequences: Vec<u32> = stored.chunks.iter().map(|c| c.sequence).collect();
    assert_eq!(sequences, (1..=5).collect::<Vec<u32>>());
}

#[test]
fn codes_follow_flush_order() {
    let pages: Vec<PageLayout> = (1..=12)
        .map(|n| {
            title_page(
                n,
                &format!("{n}. Standar Pelayanan Layanan {n}"),
                &[("Biaya/Tarif", "Tidak dipungut biaya")],
            )
        })
        .collect();
    let mut service = service_for(pages, MemoryStore::new());
    let report = service.index_document(Path::new("sop.pdf"));

    assert!(report.succeeded());
    let codes: Vec<&str> = report.records.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes.len(), 12);
    assert_eq!(codes[0], "SOP-ULT-001");
    assert_eq!(codes[11], "SOP-ULT-012");
    assert_eq!(report.records[11].start_page, 12);
}

#[test]
fn tables_before_first_title_are_not_attributed() {
    let pages = vec![
        continuation_page(1, &[("Biaya", "Rp 10.000")]),
        title_page(
            2,
            "1. Standar Pelayanan Cuti",
            &[("Produk Layanan", "Surat cuti")],
        ),
    ];
    let mut service = service_for(pages, MemoryStore::new());
    let report = service.index_document(Path::new("sop.pdf"));

    assert!(report.succeeded());
    assert_eq!(report.warnings.orphaned_tables, 1);
    let stored = &service.store().records()[0].batch;
    assert_eq!(stored.components.len(), 1);
    assert_eq!(stored.components[0].category, Category::Product);
}

#[test]
fn page_window_skips_pages_outside_it() {
    let pages = vec![
        title_page(1, "1. Standar Pelayanan Daftar Isi", &[("Biaya", "-")]),
        title_page(2, "2. Standar Pelayanan Legalisir", &[("Biaya", "Gratis")]),
        title_page(3, "3. Standar Pelayanan Wisuda", &[("Biaya", "Rp 500.000")]),
    ];
    let options = IndexOptions {
        window: PageWindow::new(2, Some(2)).unwrap(),
        ..IndexOptions::default()
    };
    let mut service =
        IndexingService::new(Box::new(StaticPages(pages)), MemoryStore::new(), options);
    let report = service.index_document(Path::new("sop.pdf"));

    assert_eq!(report.pages_scanned, 1);
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].title, "Standar Pelayanan Legalisir");
    assert_eq!(report.records[0].code, "SOP-ULT-001");
}

#[test]
fn failed_page_is_skipped() {
    // Page 2 is absent, so the extractor reports an error for it.
    let pages = vec![
        title_page(1, "1. Standar Pelayanan Legalisir", &[("Biaya", "Gratis")]),
        continuation_page(3, &[("Jangka Waktu", "1 hari kerja")]),
    ];
    let mut service = service_for(pages, MemoryStore::new());
    let report = service.index_document(Path::new("sop.pdf"));

    assert!(report.succeeded());
    assert_eq!(report.warnings.failed_pages, 1);
    assert_eq!(report.pages_scanned, 2);
    let stored = &service.store().records()[0].batch;
    assert_eq!(stored.components.len(), 2);
    assert_eq!(service.metrics_snapshot().pages_failed, 1);
}

#[test]
fn missing_document_is_marked_failed() {
    let mut service = IndexingService::new(
        Box::new(LayoutFileOpener),
        MemoryStore::new(),
        IndexOptions::default(),
    );
    let report = service.index_document(Path::new("/no/such/dir/sop.pdf"));

    assert!(!report.succeeded());
    assert!(report.records.is_empty());
    assert!(report.error.as_deref().unwrap().contains("not found"));
    let document_id = report.document_id.expect("document registered");
    let store = service.store();
    assert_eq!(
        store.document(document_id).unwrap().status,
        Some(DocumentStatus::Failed)
    );
    assert!(store.records().is_empty());
    assert_eq!(service.metrics_snapshot().documents_failed, 1);
}

#[test]
fn store_failure_aborts_document() {
    let pages = vec![
        title_page(1, "1. Standar Pelayanan A", &[("Biaya", "Gratis")]),
        title_page(2, "2. Standar Pelayanan B", &[("Biaya", "Gratis")]),
        title_page(3, "3. Standar Pelayanan C", &[("Biaya", "Gratis")]),
    ];
    let mut service = service_for(pages, MemoryStore::with_persist_limit(1));
    let report = service.index_document(Path::new("sop.pdf"));

    assert!(!report.succeeded());
    assert_eq!(report.records.len(), 1);
    assert!(report.error.as_deref().unwrap().contains("persist limit"));
    let store = service.store();
    assert_eq!(store.records().len(), 1);
    let document_id = report.document_id.unwrap();
    assert_eq!(
        store.document(document_id).unwrap().status,
        Some(DocumentStatus::Failed)
    );
}

#[test]
fn batch_continues_after_failure() {
    let pages = vec![title_page(1, "1. Standar Pelayanan A", &[("Biaya", "Gratis")])];
    let mut service = service_for(pages, MemoryStore::new());
    let reports = service.index_batch(&["a.pdf".into(), "b.pdf".into()]);
    assert!(reports.iter().all(|report| report.succeeded()));
    assert_ne!(reports[0].run_id, reports[1].run_id);
    assert_eq!(service.store().documents().len(), 2);

    let metrics = service.metrics_snapshot();
    assert_eq!(metrics.documents_indexed, 2);
    assert_eq!(metrics.records_flushed, 2);
}
