//! Tenderdesk Checkpoint Form Engine
//!
//! Schema-driven multi-page forms for the tender/document-management
//! workflow: admission forms, material intake, training exams and tender
//! detail editing all run on the same engine.
//!
//! ## Features
//! - Server-described schemas (pages, checkpoints, value types)
//! - Conditional parent/dependent field visibility
//! - Mandatory-field validation
//! - Pluggable derived fields (bid-total calculator)
//! - Exam mode: correctness scoring and elapsed-time tracking
//! - Submission encoding (values map + base64 attachments)

use thiserror::Error;

pub mod answer;
pub mod dependent;
pub mod derived;
pub mod engine;
pub mod exam;
pub mod schema;
pub mod submit;

pub use answer::{AnswerValue, FileAnswer};
pub use dependent::{DependentSpec, SelectionMode};
pub use derived::DerivedField;
pub use engine::{FormEngine, PageEntry, ValidationReport};
pub use exam::{ExamTimer, ScoreCard};
pub use schema::{Checkpoint, CheckpointRecord, FieldType, FormSchema, MenuRecord, TypeRecord};
pub use submit::SubmissionPayload;

/// Form engine error type
#[derive(Error, Debug)]
pub enum FormsError {
    /// Checkpoint id not present in the loaded schema
    #[error("unknown checkpoint: {0}")]
    UnknownCheckpoint(u32),

    /// Field is rendered read-only and rejects input
    #[error("checkpoint {0} is not editable")]
    ReadOnlyField(u32),

    /// Header/Description pseudo-fields never hold answers
    #[error("checkpoint {0} is a static label")]
    StaticField(u32),
}

/// Result type for the form engine
pub type Result<T> = std::result::Result<T, FormsError>;
