// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

mod orchestrator;
mod processor;
mod progress;

pub use orchestrator::CognifyPipeline;
pub use processor::{
    BELONGS_TO_SET, CONTAINS, DocumentProcessor, IS_A, IS_PART_OF, MADE_FROM, ProcessedDocument,
};
pub use progress::{PipelineStats, ProgressTracker};
