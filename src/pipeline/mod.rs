//! SOP extraction pipeline: title detection, table attribution, accumulation and assembly.

pub mod accumulator;
pub mod assembly;
pub mod attribution;
pub mod rows;
pub mod run;
pub mod sanitize;
pub mod scanner;
mod service;
pub mod steps;
pub mod taxonomy;
pub mod title;
pub mod types;

pub use accumulator::{AccumulatorError, FlushedRecord, MergeOutcome, RecordAccumulator};
pub use assembly::{AssemblyContext, assemble_record, compute_chunk_hash, record_code};
pub use attribution::{Attribution, attribute_tables};
pub use rows::{LabeledRow, read_component_rows};
pub use run::{RunLog, WarningCounts};
pub use sanitize::{normalize_whitespace, split_ordinal};
pub use scanner::PageScanner;
pub use service::IndexingService;
pub use steps::split_steps;
pub use taxonomy::{Category, normalize_label};
pub use title::{DEFAULT_LINE_TOLERANCE, DetectedTitle, TitleDetector};
pub use types::{DocumentReport, IndexOptions, IndexingError, PageWindow, RecordSummary};
