//! Comment suggestions for scraped posts via a hosted text-generation model
//!
//! Generation errors never abort a run. Each failed row gets an
//! `Error: ...` cell and the run moves on; only a failing connection check
//! stops it before any row is sent.

use crate::config::InferenceSettings;
use crate::error::ConfigurationError;
use crate::jobs::Clock;
use crate::table::{Cell, Column, TabularResult};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const CONTENT_COLUMN: &str = "liPostContent";
pub const COMMENT_COLUMN: &str = "generated_comment";
pub const SHEET_NAME: &str = "posts_with_comments";

const MAX_CONTENT_CHARS: usize = 500;
const CHECK_TEXT: &str = "This is a test post about technology innovation";
const NO_CONTENT: &str = "No content to generate comment";

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
    temperature: f32,
    do_sample: bool,
}

impl Default for GenerationParameters {
    fn default() -> Self {
        GenerationParameters {
            max_new_tokens: 100,
            temperature: 0.7,
            do_sample: true,
        }
    }
}

/// Something that turns a post into a comment. Errors are display text.
pub trait TextGenerator {
    fn generate(&self, text: &str) -> Result<String, String>;
}

/// Hosted inference endpoint
pub struct InferenceClient {
    agent: ureq::Agent,
    endpoint: String,
    token: String,
    timeout: Duration,
}

impl InferenceClient {
    pub fn new(settings: &InferenceSettings) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(settings.timeout))
            .http_status_as_error(false)
            .build();

        InferenceClient {
            agent: config.into(),
            endpoint: settings.endpoint.clone(),
            token: settings.token.clone(),
            timeout: settings.timeout,
        }
    }
}

impl TextGenerator for InferenceClient {
    fn generate(&self, text: &str) -> Result<String, String> {
        let payload = GenerationRequest {
            inputs: text,
            parameters: GenerationParameters::default(),
        };

        let response = self
            .agent
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .header("Authorization", format!("Bearer {}", self.token))
            .send_json(&payload)
            .map_err(|e| match e {
                ureq::Error::Timeout(_) => format!("Timeout after {} seconds", self.timeout.as_secs()),
                other => other.to_string(),
            })?;

        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| e.to_string())?;
        if status != 200 {
            return Err(format!("Status {}: {}", status, body));
        }

        generated_text(&body)
    }
}

/// Accepts `{"generated_text": ..}` or a list whose first item has it
fn generated_text(body: &str) -> Result<String, String> {
    let value: Value = serde_json::from_str(body).map_err(|e| format!("Invalid response: {}", e))?;
    let item = match &value {
        Value::Array(items) => items.first().ok_or("Empty response")?,
        Value::Object(_) => &value,
        _ => return Err("Invalid response format".to_string()),
    };

    Ok(item
        .get("generated_text")
        .and_then(Value::as_str)
        .unwrap_or("No response")
        .to_string())
}

/// Cut long posts to keep prompts inside the model's window
fn truncate_content(content: &str) -> String {
    if content.chars().count() > MAX_CONTENT_CHARS {
        let head: String = content.chars().take(MAX_CONTENT_CHARS).collect();
        format!("{}...", head)
    } else {
        content.to_string()
    }
}

/// Input table plus its new comment column
#[derive(Debug, Clone)]
pub struct CommentReport {
    pub table: TabularResult,
    pub generated: usize,
    pub failed: usize,
    pub skipped: usize,
}

pub struct CommentGenerator<'a> {
    generator: &'a dyn TextGenerator,
    clock: &'a dyn Clock,
    pause: Duration,
}

impl<'a> CommentGenerator<'a> {
    pub fn new(generator: &'a dyn TextGenerator, clock: &'a dyn Clock, pause: Duration) -> Self {
        CommentGenerator {
            generator,
            clock,
            pause,
        }
    }

    /// One throwaway generation to wake the endpoint and check credentials
    pub fn check_connection(&self) -> Result<(), String> {
        self.generator.generate(CHECK_TEXT).map(|_| ())
    }

    /// Add a `generated_comment` column with one suggestion per post
    pub fn annotate(&self, table: &TabularResult) -> Result<CommentReport, ConfigurationError> {
        let contents = table
            .column(CONTENT_COLUMN)
            .ok_or_else(|| ConfigurationError::MissingColumn(CONTENT_COLUMN.to_string()))?;

        let total = contents.cells.len();
        let mut comments = Vec::with_capacity(total);
        let (mut generated, mut failed, mut skipped) = (0, 0, 0);

        for (row, cell) in contents.cells.iter().enumerate() {
            let content = cell.as_text();
            if content.trim().is_empty() {
                skipped += 1;
                comments.push(Cell::from(NO_CONTENT));
                continue;
            }

            debug!(row = row + 1, total, "generating comment");
            let comment = match self.generator.generate(&truncate_content(&content)) {
                Ok(text) => {
                    generated += 1;
                    text
                }
                Err(e) => {
                    warn!(row = row + 1, "comment generation failed: {}", e);
                    failed += 1;
                    format!("Error: {}", e)
                }
            };
            comments.push(Cell::Text(comment));
            self.clock.sleep(self.pause);
        }

        info!(generated, total, "comments generated");

        let mut table = table.clone();
        table.push_column(Column::new(COMMENT_COLUMN, comments));
        Ok(CommentReport {
            table,
            generated,
            failed,
            skipped,
        })
    }
}
