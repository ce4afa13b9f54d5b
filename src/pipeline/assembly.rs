//! Turning a flushed record into the rows the store persists.

use sha2::{Digest, Sha256};

use crate::store::{ChunkEntry, ComponentEntry, RecordBatch, RecordEntry, StepEntry};

use super::accumulator::FlushedRecord;
use super::sanitize::{normalize_whitespace, split_ordinal};
use super::steps::split_steps;
use super::taxonomy::Category;

/// Run-wide settings applied to every assembled record.
#[derive(Debug, Clone)]
pub struct AssemblyContext {
    /// Code prefix, e.g. `SOP-ULT`.
    pub code_prefix: String,
    /// `file_url` stored on every record of the document.
    pub file_url: String,
}

/// Record code for the `sequence`-th flushed record.
pub fn record_code(prefix: &str, sequence: u32) -> String {
    format!("{prefix}-{sequence:03}")
}

/// Stable digest of a chunk's text.
pub fn compute_chunk_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Build the persisted shape of `record`, the `sequence`-th record of the run.
///
/// Components come in category declaration order, one per non-empty category. Steps come from
/// the procedure text. Chunk sequence numbers run from 1 over component chunks first, then
/// step chunks.
pub fn assemble_record(
    record: &FlushedRecord,
    sequence: u32,
    context: &AssemblyContext,
) -> RecordBatch {
    let (source_ordinal, title) = split_ordinal(&record.title);
    let page = record.start_page;

    let components: Vec<ComponentEntry> = Category::ALL
        .into_iter()
        .filter_map(|category| {
            let text = normalize_whitespace(record.section(category));
            (!text.is_empty()).then(|| ComponentEntry {
                category,
                label: category.label().to_string(),
                text,
                page,
            })
        })
        .collect();

    let steps: Vec<StepEntry> = split_steps(record.section(Category::Procedure))
        .into_iter()
        .map(|step| normalize_whitespace(&step))
        .filter(|step| !step.is_empty())
        .zip(1u32..)
        .map(|(description, sequence)| StepEntry {
            sequence,
            description,
        })
        .collect();

    let component_chunks = components.iter().map(|component| {
        (
            format!("{title} - {}: {}", component.label, component.text),
            component.category.as_str().to_string(),
        )
    });
    let step_chunks = steps.iter().map(|step| {
        (
            format!("{title} - Langkah {}: {}", step.sequence, step.description),
            format!("step {}", step.sequence),
        )
    });
    let chunks = component_chunks
        .chain(step_chunks)
        .zip(1u32..)
        .map(|((text, section), sequence)| ChunkEntry {
            sequence,
            chunk_hash: compute_chunk_hash(&text),
            text,
            page,
            section,
        })
        .collect();

    RecordBatch {
        record: RecordEntry {
            code: record_code(&context.code_prefix, sequence),
            title,
            source_ordinal,
            start_page: page,
            file_url: context.file_url.clone(),
            service_category: None,
            service_audience: None,
        },
        components,
        steps,
        chunks,
    }
}
