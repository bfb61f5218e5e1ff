//! Fixed multi-stage workflows over the automation provider
//!
//! A pipeline is a short recipe of stages. Each stage submits one job,
//! polls it to completion and normalizes the terminal payload into a
//! [`TabularResult`]. Stages run strictly one after another.
//!
//! A stage that fails never aborts its pipeline: it contributes an empty
//! table and a [`StageWarning`]. Only bad identifiers ([`ConfigurationError`])
//! stop a run, and they do so before anything is submitted.
//!
//! [`ConfigurationError`]: crate::error::ConfigurationError

pub mod automations;
pub mod batch;
pub mod company;
pub mod inputs;
pub mod post;
pub mod profile;
pub mod search;

pub use automations::{AutomationKind, LINKEDIN_PLATFORM_ID};
pub use batch::{BatchError, BatchRun};
pub use company::CompanyOptions;
pub use post::PostOptions;
pub use profile::ProfileOptions;
pub use search::{PostSearchOptions, PostedBy, SortOrder, TimeRange};

use crate::config::ProviderSettings;
use crate::error::JobFailure;
use crate::filter::{FilterSpec, FilterStatus, KeywordFilter};
use crate::jobs::{Clock, JobClient, JobRequest, PollPolicy, Poller};
use crate::keywords::KeywordSet;
use crate::report::ReportAssembler;
use crate::table::{NormalizeConfig, TabularResult, TableNormalizer};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{info, info_span, warn};

/// Preferred display order for post search results
pub const POST_COLUMNS: &[&str] = &[
    "liPublicProfileUrl",
    "firstName",
    "lastName",
    "companyName",
    "liCompanyPublicUrl",
    "headcountRange",
    "jobLocationArea",
    "jobTitle",
    "jobTenure",
    "profileDescription",
    "liProfileHeadline",
    "emailAddressPersonal",
    "profileLocationCountry",
    "profileLocationCity",
    "profileLocationArea",
    "locationCountryCode",
    "industry",
];

/// Preferred display order for people search results
pub const PROFILE_COLUMNS: &[&str] = &[
    "liPublicProfileUrl",
    "firstName",
    "lastName",
    "companyName",
    "jobTitle",
    "headline",
    "locationArea",
    "connectionDegree",
    "emailAddressPersonal",
    "liProfileUrl",
    "liProfileImageUrl",
    "liProfilePublicId",
    "snProfileUrl",
    "isPremium",
    "pastJobTitle",
    "hashtags",
    "serviceProvider",
];

/// Something that went wrong in a run without stopping it
#[derive(Debug, Clone, PartialEq)]
pub enum StageWarning {
    Failed { stage: String, failure: JobFailure },
    FilterNotApplied { stage: String, column: String },
}

impl fmt::Display for StageWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageWarning::Failed { stage, failure } => write!(f, "{} stage failed: {}", stage, failure),
            StageWarning::FilterNotApplied { stage, column } => write!(
                f,
                "{}: column {:?} not found, results are unfiltered",
                stage, column
            ),
        }
    }
}

/// A list embedded in a stage payload that is exported as its own sheet
#[derive(Debug, Clone, Copy)]
pub struct Section {
    pub sheet: &'static str,
    /// Payload keys that may hold the list, first match wins
    pub keys: &'static [&'static str],
    /// Column name for list items that are bare strings
    pub item: &'static str,
}

/// What one stage produced
#[derive(Debug, Clone)]
pub struct StageOutput {
    pub table: TabularResult,
    /// Raw terminal payload, for stages that derive more tables from it
    pub payload: Option<Value>,
    pub failure: Option<JobFailure>,
}

/// Tables produced by one pipeline invocation
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub primary_sheet: String,
    pub primary: TabularResult,
    /// Dependent stages in execution order
    pub stages: Vec<(String, TabularResult)>,
    pub warnings: Vec<StageWarning>,
    /// Columns worth showing first when previewing `primary`
    pub preview: &'static [&'static str],
}

impl PipelineRun {
    pub fn new(primary_sheet: impl Into<String>) -> Self {
        PipelineRun {
            primary_sheet: primary_sheet.into(),
            primary: TabularResult::new(),
            stages: Vec::new(),
            warnings: Vec::new(),
            preview: &[],
        }
    }

    pub fn with_preview(mut self, columns: &'static [&'static str]) -> Self {
        self.preview = columns;
        self
    }

    /// Store a table under `sheet`. The primary sheet replaces `primary`.
    pub fn put(&mut self, sheet: &str, table: TabularResult) {
        if sheet == self.primary_sheet {
            self.primary = table;
        } else {
            self.stages.push((sheet.to_string(), table));
        }
    }

    /// Record a stage's table and failure, handing back its payload
    pub fn absorb(&mut self, sheet: &str, output: StageOutput) -> Option<Value> {
        if let Some(failure) = output.failure {
            self.warnings.push(StageWarning::Failed {
                stage: sheet.to_string(),
                failure,
            });
        }
        self.put(sheet, output.table);
        output.payload
    }

    /// Table for `sheet`, primary included
    pub fn stage(&self, sheet: &str) -> Option<&TabularResult> {
        if sheet == self.primary_sheet {
            return Some(&self.primary);
        }
        self.stages.iter().find(|(name, _)| name == sheet).map(|(_, t)| t)
    }

    /// All sheets, primary first
    pub fn sheets(&self) -> Vec<(&str, &TabularResult)> {
        std::iter::once((self.primary_sheet.as_str(), &self.primary))
            .chain(self.stages.iter().map(|(name, t)| (name.as_str(), t)))
            .collect()
    }

    /// Primary table restricted to the preview columns that exist
    pub fn preview_table(&self) -> TabularResult {
        let projected = self.primary.select(self.preview);
        if projected.width() == 0 {
            self.primary.clone()
        } else {
            projected
        }
    }

    pub fn into_report(self) -> ReportAssembler {
        let mut report = ReportAssembler::new();
        report.add(self.primary_sheet, self.primary);
        for (sheet, table) in self.stages {
            report.add(sheet, table);
        }
        report
    }
}

/// Runs pipeline stages against one provider account
pub struct Orchestrator<'a> {
    poller: Poller<'a>,
    normalizer: TableNormalizer,
    keywords: KeywordSet,
    account: String,
    timezone: String,
}

impl<'a> Orchestrator<'a> {
    pub fn new(client: &'a dyn JobClient, clock: &'a dyn Clock, settings: &ProviderSettings) -> Self {
        Orchestrator {
            poller: Poller::new(client, clock),
            normalizer: TableNormalizer::new(NormalizeConfig::default()),
            keywords: KeywordSet::decision_makers(),
            account: settings.connected_account_id.clone(),
            timezone: settings.timezone.clone(),
        }
    }

    /// Replace the decision-maker keywords used by filters and employee exports
    pub fn with_keywords(mut self, keywords: KeywordSet) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn with_normalizer(mut self, config: NormalizeConfig) -> Self {
        self.normalizer = TableNormalizer::new(config);
        self
    }

    pub fn keywords(&self) -> &KeywordSet {
        &self.keywords
    }

    /// A request for `kind` under this account, with no inputs yet
    pub fn request(&self, kind: AutomationKind) -> JobRequest {
        let (name, description) = kind.label();
        JobRequest::new(kind.id(), &self.account, &self.timezone).named(name, description)
    }

    /// Submit, poll and normalize one stage
    pub fn run_stage(&self, stage: &str, request: &JobRequest, policy: PollPolicy) -> StageOutput {
        let span = info_span!("stage", stage = stage);
        let _guard = span.enter();
        info!(automation = %request.automation_id, max_attempts = policy.max_attempts, "submitting job");

        match self.poller.run(request, policy).into_payload() {
            Ok(payload) => {
                let (table, report) = self.normalizer.normalize(&payload);
                if report.skipped > 0 {
                    warn!(skipped = report.skipped, "skipped malformed records");
                }
                info!(rows = table.len(), columns = table.width(), "stage complete");
                StageOutput {
                    table,
                    payload: Some(payload),
                    failure: None,
                }
            }
            Err(failure) => {
                warn!("stage failed: {}", failure);
                StageOutput {
                    table: TabularResult::new(),
                    payload: None,
                    failure: Some(failure),
                }
            }
        }
    }

    /// Tables for the lists embedded in a payload. A list payload
    /// contributes its first record.
    pub fn sections(&self, payload: &Value, sections: &[Section]) -> Vec<(&'static str, TabularResult)> {
        let record = match payload {
            Value::Array(items) => items.first(),
            other => Some(other),
        };
        let record = match record {
            Some(Value::Object(record)) => record,
            _ => return Vec::new(),
        };

        sections
            .iter()
            .filter_map(|section| {
                let value = section.keys.iter().find_map(|key| record.get(*key))?;
                let table = self.normalizer.to_table(&wrap_strings(value, section.item));
                Some((section.sheet, table))
            })
            .collect()
    }

    /// Store a stage's table plus the sections derived from its payload
    pub(crate) fn absorb_with_sections(
        &self,
        run: &mut PipelineRun,
        sheet: &str,
        output: StageOutput,
        sections: &[Section],
    ) {
        if let Some(payload) = run.absorb(sheet, output) {
            for (name, table) in self.sections(&payload, sections) {
                run.put(name, table);
            }
        }
    }

    pub(crate) fn normalizer(&self) -> &TableNormalizer {
        &self.normalizer
    }

    pub(crate) fn poller(&self) -> &Poller<'a> {
        &self.poller
    }

    /// Keep primary rows whose `column` mentions a decision-maker title
    pub(crate) fn filter_primary(&self, run: &mut PipelineRun, column: &str) {
        // A failed stage already left a warning; there is nothing to filter
        if run.primary.is_empty() {
            return;
        }

        let spec = FilterSpec::new(column, self.keywords.clone());
        let filtered = KeywordFilter::apply(&run.primary, &spec);
        match filtered.status {
            FilterStatus::Applied { kept, dropped } => {
                info!(sheet = %run.primary_sheet, kept, dropped, "keyword filter applied");
            }
            FilterStatus::NotApplied { column } => {
                warn!(sheet = %run.primary_sheet, "column {} missing, keyword filter skipped", column);
                run.warnings.push(StageWarning::FilterNotApplied {
                    stage: run.primary_sheet.clone(),
                    column,
                });
            }
        }
        run.primary = filtered.table;
    }
}

/// Lists of bare strings get a named column instead of being read as JSON text
fn wrap_strings(value: &Value, item: &str) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|entry| match entry {
                    Value::String(s) => {
                        let mut record = Map::new();
                        record.insert(item.to_string(), Value::String(s.clone()));
                        Value::Object(record)
                    }
                    other => other.clone(),
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::config::ProviderSettings;

    pub fn settings() -> ProviderSettings {
        ProviderSettings::new(
            Some("key".into()),
            Some("acct-1".into()),
            None,
            Some("workspace".into()),
            None,
        )
        .unwrap()
    }
}
