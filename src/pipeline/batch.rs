//! Batch profile enrichment from an input sheet
//!
//! Identifiers are processed one at a time. The first failure stops the
//! batch: later identifiers are never submitted, and the profiles gathered so
//! far are still merged and returned alongside the error.

use super::{AutomationKind, Orchestrator, PipelineRun, StageWarning};
use crate::error::{ConfigurationError, JobFailure};
use crate::filter::{FilterStatus, HeadcountFilter};
use crate::jobs::JobRequest;
use crate::table::TabularResult;
use serde_json::Value;
use tracing::{info, info_span, warn};

pub const PROFILE_URL_COLUMN: &str = "liPublicProfileURL";
pub const PROFILE_PREFIX: &str = "profile_";
pub const HEADCOUNT_COLUMN: &str = "profile_headcountRange";
pub const HEADCOUNT_THRESHOLD: u64 = 450;

/// The identifier that stopped a batch, and why
#[derive(Debug, Clone, PartialEq)]
pub struct BatchError {
    pub identifier: String,
    pub failure: JobFailure,
}

#[derive(Debug, Clone)]
pub struct BatchRun {
    pub run: PipelineRun,
    /// Identifiers that produced a payload
    pub processed: usize,
    /// Identifiers in the input, after de-duplication
    pub total: usize,
    pub errors: Vec<BatchError>,
}

impl BatchRun {
    pub fn failed_identifier(&self) -> Option<&str> {
        self.errors.first().map(|e| e.identifier.as_str())
    }
}

impl<'a> Orchestrator<'a> {
    /// Run `kind` once per identifier until the first failure.
    /// Returns the payloads gathered so far.
    pub fn run_each<F>(
        &self,
        kind: AutomationKind,
        identifiers: &[String],
        build: F,
    ) -> (Vec<Value>, Option<BatchError>)
    where
        F: Fn(&str) -> JobRequest,
    {
        let mut payloads = Vec::with_capacity(identifiers.len());
        for (index, identifier) in identifiers.iter().enumerate() {
            let span = info_span!("batch_item", item = index + 1, of = identifiers.len());
            let _guard = span.enter();
            info!(identifier = %identifier, "extracting");

            match self.poller().run(&build(identifier.as_str()), kind.policy()).into_payload() {
                Ok(payload) => payloads.push(payload),
                Err(failure) => {
                    warn!(identifier = %identifier, "stopping batch: {}", failure);
                    let error = BatchError {
                        identifier: identifier.clone(),
                        failure,
                    };
                    return (payloads, Some(error));
                }
            }
        }
        (payloads, None)
    }

    /// Enrich the rows of `input` with profile data, then keep large companies
    pub fn batch_profiles(&self, input: &TabularResult) -> Result<BatchRun, ConfigurationError> {
        let urls = input
            .unique_values(PROFILE_URL_COLUMN)
            .ok_or_else(|| ConfigurationError::MissingColumn(PROFILE_URL_COLUMN.to_string()))?;
        info!(count = urls.len(), "unique profile URLs found");

        let kind = AutomationKind::ProfileScraper;
        let (payloads, error) = self.run_each(kind, &urls, |url| {
            self.request(kind)
                .named("Batch Profile Extraction", "Batch: Extract profile data")
                .input("liProfileUrl", url)
        });

        let mut run = PipelineRun::new("profiles");
        if let Some(ref error) = error {
            run.warnings.push(StageWarning::Failed {
                stage: format!("profile {}", error.identifier),
                failure: error.failure.clone(),
            });
        }

        if !payloads.is_empty() {
            let profiles = self
                .normalizer()
                .to_table(&Value::Array(payloads.clone()))
                .prefix_columns(PROFILE_PREFIX, PROFILE_URL_COLUMN);
            let merged = input.concat_columns(&profiles);

            let filtered = HeadcountFilter::apply(&merged, HEADCOUNT_COLUMN, HEADCOUNT_THRESHOLD);
            match filtered.status {
                FilterStatus::Applied { kept, dropped } => {
                    info!(kept, dropped, "kept companies above {} employees", HEADCOUNT_THRESHOLD);
                }
                FilterStatus::NotApplied { column } => {
                    warn!("column {} missing, exporting full merged result", column);
                    run.warnings.push(StageWarning::FilterNotApplied {
                        stage: "profiles".to_string(),
                        column,
                    });
                }
            }
            run.primary = filtered.table;
        }

        Ok(BatchRun {
            run,
            processed: payloads.len(),
            total: urls.len(),
            errors: error.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubmissionError;
    use crate::jobs::fake::{FakeClock, ScriptedClient};
    use crate::jobs::JobOutcome;
    use crate::pipeline::testing::settings;
    use crate::table::{Cell, Column};
    use serde_json::json;

    fn input(urls: &[&str]) -> TabularResult {
        TabularResult::from_columns(vec![
            Column::new(
                PROFILE_URL_COLUMN,
                urls.iter().map(|u| Cell::from(*u)).collect(),
            ),
            Column::new("owner", urls.iter().map(|_| Cell::from("sales")).collect()),
        ])
    }

    #[test]
    fn test_batch_stops_at_first_failure() {
        let id = AutomationKind::ProfileScraper.id();
        let client = ScriptedClient::new()
            .ready(id, json!({"firstName": "Ada", "headcountRange": "1,001-5,000"}))
            .reject(id, SubmissionError::Rejected { status: 429, body: "limit".into() })
            .ready(id, json!({"firstName": "Ken", "headcountRange": "10,001+"}));
        let clock = FakeClock::default();
        let settings = settings();
        let orchestrator = Orchestrator::new(&client, &clock, &settings);

        let batch = orchestrator
            .batch_profiles(&input(&["https://linkedin.com/in/a", "https://linkedin.com/in/b", "https://linkedin.com/in/c"]))
            .unwrap();

        assert_eq!(batch.processed, 1);
        assert_eq!(batch.total, 3);
        assert_eq!(batch.failed_identifier(), Some("https://linkedin.com/in/b"));
        assert_eq!(batch.run.primary.len(), 1);
        // the third profile was never submitted
        let urls: Vec<String> = client
            .submitted()
            .iter()
            .filter_map(|r| r.input_str("liProfileUrl").map(String::from))
            .collect();
        assert_eq!(urls, vec!["https://linkedin.com/in/a", "https://linkedin.com/in/b"]);
    }

    #[test]
    fn test_merge_prefixes_and_filters_headcount() {
        let id = AutomationKind::ProfileScraper.id();
        let client = ScriptedClient::new()
            .ready(id, json!({"firstName": "Ada", "headcountRange": "51-200"}))
            .ready(id, json!({"firstName": "Ken", "headcountRange": "10,001+"}));
        let clock = FakeClock::default();
        let settings = settings();
        let orchestrator = Orchestrator::new(&client, &clock, &settings);

        let batch = orchestrator
            .batch_profiles(&input(&["https://linkedin.com/in/a", "https://linkedin.com/in/k"]))
            .unwrap();

        assert!(batch.errors.is_empty());
        let table = &batch.run.primary;
        assert_eq!(
            table.column_names(),
            vec![PROFILE_URL_COLUMN, "owner", "profile_firstName", "profile_headcountRange"]
        );
        assert_eq!(table.len(), 1);
        assert_eq!(table.cell(0, "profile_firstName").unwrap().as_text(), "Ken");
    }

    #[test]
    fn test_url_column_from_payload_is_not_prefixed() {
        let id = AutomationKind::ProfileScraper.id();
        let client = ScriptedClient::new()
            .ready(id, json!({"liPublicProfileURL": "https://linkedin.com/in/a", "firstName": "Ada"}));
        let clock = FakeClock::default();
        let settings = settings();
        let orchestrator = Orchestrator::new(&client, &clock, &settings);

        let batch = orchestrator.batch_profiles(&input(&["https://linkedin.com/in/a"])).unwrap();

        // the payload's URL column collides with the input's and is dropped
        assert_eq!(
            batch.run.primary.column_names(),
            vec![PROFILE_URL_COLUMN, "owner", "profile_firstName"]
        );
        assert!(matches!(
            batch.run.warnings.as_slice(),
            [StageWarning::FilterNotApplied { .. }]
        ));
    }

    #[test]
    fn test_timeout_is_fatal_to_the_batch() {
        let id = AutomationKind::ProfileScraper.id();
        let client = ScriptedClient::new().script(id, vec![JobOutcome::Pending]);
        let clock = FakeClock::default();
        let settings = settings();
        let orchestrator = Orchestrator::new(&client, &clock, &settings);

        let batch = orchestrator
            .batch_profiles(&input(&["https://linkedin.com/in/a", "https://linkedin.com/in/b"]))
            .unwrap();

        assert_eq!(batch.processed, 0);
        assert!(batch.run.primary.is_empty());
        assert_eq!(batch.errors[0].failure, JobFailure::Timeout { attempts: 60 });
        assert_eq!(client.submitted().len(), 1);
    }

    #[test]
    fn test_missing_url_column() {
        let client = ScriptedClient::new();
        let clock = FakeClock::default();
        let settings = settings();
        let orchestrator = Orchestrator::new(&client, &clock, &settings);

        let table = TabularResult::from_columns(vec![Column::new("url", vec!["x".into()])]);
        assert_eq!(
            orchestrator.batch_profiles(&table).unwrap_err(),
            ConfigurationError::MissingColumn(PROFILE_URL_COLUMN.into())
        );
    }
}
