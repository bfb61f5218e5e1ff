//! # Harvest - LinkedIn automation pipelines
//!
//! Drives a remote automation provider (submit a job, poll it, collect the
//! result) and turns whatever JSON comes back into flat tables that can be
//! filtered by role keywords and exported one sheet per table.
//!
//! ## Modules
//!
//! - **jobs**: job submission, the HTTP client and bounded polling
//! - **table**: tabular results and the JSON normalizer
//! - **pipeline**: fixed multi-stage recipes (post, profile, company, searches, batch)
//! - **filter** / **keywords**: decision-maker and head-count filters
//! - **report** / **input**: CSV export and spreadsheet input
//! - **comments**: comment suggestions from a hosted model
//!
//! ## Quick Start
//!
//! ```rust
//! use harvest::table::{NormalizeConfig, TableNormalizer};
//! use serde_json::json;
//!
//! let normalizer = TableNormalizer::new(NormalizeConfig::default());
//! let table = normalizer.to_table(&json!([
//!     {"name": "Ada", "company": {"name": "Engines"}, "followers": "120"},
//!     {"name": "Grace", "company": {"name": "Navy"}, "followers": 95}
//! ]));
//!
//! assert_eq!(table.column_names(), vec!["name", "company.name", "followers"]);
//! assert!(table.column("followers").unwrap().is_numeric());
//! ```

pub mod comments;
pub mod config;
pub mod error;
pub mod filter;
pub mod input;
pub mod jobs;
pub mod keywords;
pub mod pipeline;
pub mod report;
pub mod table;
pub mod telemetry;

// Re-export commonly used types for convenience
pub use config::{InferenceSettings, ProviderSettings};
pub use error::{ConfigurationError, JobFailure, SubmissionError};
pub use filter::{FilterSpec, FilterStatus, HeadcountFilter, KeywordFilter};
pub use jobs::{JobClient, JobHandle, JobOutcome, JobRequest, PollPolicy, Poller, TexauClient};
pub use keywords::KeywordSet;
pub use pipeline::{Orchestrator, PipelineRun, StageWarning};
pub use report::ReportAssembler;
pub use table::{Cell, Column, TabularResult, TableNormalizer};
