//! typescope - Authorship analysis engine for editor activity logs
//!
//! typescope turns a compact log of editor events (inserts, deletes, saves)
//! into authenticity metrics through a deterministic pipeline: wire parsing →
//! normalization → feature extraction → file risk and work patterns → flags
//! and an overall score.
//!
//! ## Modules
//!
//! - **Analysis**: [`analyze`] / [`analyze_json`] return a bare [`AnalysisResult`]
//! - **Reports**: [`AnalysisProcessor`] wraps results in a versioned report envelope
//! - **Messages**: instructor-facing wording is rendered from a keyed catalogue

pub mod encoder;
pub mod error;
pub mod features;
pub mod flags;
pub mod messages;
pub mod normalizer;
pub mod patterns;
pub mod pipeline;
pub mod risk;
pub mod schema;
pub mod scoring;
pub mod summary;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use error::AnalysisError;
pub use messages::{Catalogue, MessageArgs, MessageRenderer, RenderError};
pub use pipeline::{analyze, analyze_json, analyze_log, analyze_with_deadline, AnalysisProcessor};
pub use types::{AnalysisResult, AuthenticityReport, EditEvent, EditKind, EventLog};

// Schema exports
pub use schema::{CompactRecord, WireAdapter, WIRE_SCHEMA};

pub use encoder::REPORT_VERSION;

/// Engine version embedded in all reports
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "typescope";
