//! Tenderdesk Client
//!
//! Collaborators and orchestration around the checkpoint form engine:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        FORM SESSION                          │
//! │                                                              │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐        │
//! │  │    Schema    │  │  Submission  │  │     Geo      │        │
//! │  │   Provider   │  │     Sink     │  │   Locator    │        │
//! │  │  (3 fetches) │  │ (values+img) │  │ (10s budget) │        │
//! │  └──────┬───────┘  └──────┬───────┘  └──────┬───────┘        │
//! │         │                 │                 │                │
//! │  ┌──────▼─────────────────▼─────────────────▼──────┐         │
//! │  │            FormEngine (tenderdesk-forms)        │         │
//! │  └─────────────────────────────────────────────────┘         │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session loads the three schema resources concurrently, owns the
//! engine behind a lock, and drives the submission pipeline:
//! validate → locate → encode → values request → attachments request.

use thiserror::Error;

pub mod config;
pub mod geo;
pub mod provider;
pub mod session;
pub mod sink;

pub use config::ClientConfig;
pub use geo::{Coordinates, DeniedLocator, FixedLocator, GeoLocator};
pub use provider::{ApiEnvelope, HttpSchemaProvider, MenuSelector, SchemaProvider};
pub use session::{FormSession, SessionOptions, SubmissionReceipt};
pub use sink::{AttachmentsRequest, HttpSubmissionSink, SubmissionSink, ValuesRequest};

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// A schema fetch failed or reported `success: false`; the form must
    /// not render partially and the caller offers a retry.
    #[error("schema load failed: {0}")]
    SchemaLoad(String),

    /// Mandatory fields missing at submit time; the sink is never called.
    #[error("{} mandatory field(s) missing", .fields.len())]
    Validation { fields: Vec<u32> },

    /// Geolocation denied or timed out; the whole submission aborts.
    #[error("location unavailable: {0}")]
    Location(String),

    /// Values or attachments request rejected. Answers stay intact so the
    /// user can retry.
    #[error("submission failed: {0}")]
    Submission(String),

    /// Configuration file could not be read or written.
    #[error("config error: {0}")]
    Config(String),
}

/// Result type for the client
pub type Result<T> = std::result::Result<T, ClientError>;
