//! Remote automation jobs
//!
//! A job is submitted once, then polled until the provider has a terminal
//! payload for it. [`JobClient`] is the transport seam; [`Poller`] drives a
//! client to completion under a bounded attempt budget.

pub mod client;
pub mod poller;

#[cfg(test)]
pub mod fake;

pub use client::TexauClient;
pub use poller::{Clock, PollPolicy, PollState, PollStep, Poller, SystemClock};

use crate::error::{JobFailure, SubmissionError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One automation request. Built once, never changed after submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub name: String,
    pub description: String,
    pub automation_id: String,
    pub connected_account_id: String,
    pub timezone: String,
    pub inputs: Map<String, Value>,
}

impl JobRequest {
    pub fn new(
        automation_id: impl Into<String>,
        connected_account_id: impl Into<String>,
        timezone: impl Into<String>,
    ) -> Self {
        JobRequest {
            name: String::new(),
            description: String::new(),
            automation_id: automation_id.into(),
            connected_account_id: connected_account_id.into(),
            timezone: timezone.into(),
            inputs: Map::new(),
        }
    }

    /// Label shown in the provider's run history
    pub fn named(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.name = name.into();
        self.description = description.into();
        self
    }

    pub fn input(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.inputs.insert(key.into(), value.into());
        self
    }

    /// Set `key` only when a value is given
    pub fn input_opt<V: Into<Value>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.input(key, v),
            None => self,
        }
    }

    pub fn input_str(&self, key: &str) -> Option<&str> {
        self.inputs.get(key).and_then(Value::as_str)
    }
}

/// Provider-assigned execution id, used as the poll key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobHandle(pub String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        JobHandle(id.into())
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of a single status check
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// No terminal payload yet
    Pending,
    /// Terminal payload
    Ready(Value),
    Failed(JobFailure),
}

impl JobOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobOutcome::Pending)
    }

    pub fn into_payload(self) -> Result<Value, JobFailure> {
        match self {
            JobOutcome::Ready(payload) => Ok(payload),
            JobOutcome::Failed(failure) => Err(failure),
            JobOutcome::Pending => Err(JobFailure::Timeout { attempts: 0 }),
        }
    }
}

/// An automation listed in the provider's catalog
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Automation {
    pub id: String,
    #[serde(default)]
    pub label: String,
}

/// Transport to the automation provider. No polling, no retries.
pub trait JobClient {
    /// Hand a job to the provider
    fn submit(&self, request: &JobRequest) -> Result<JobHandle, SubmissionError>;

    /// One status check, at most one network round trip
    fn fetch(&self, handle: &JobHandle) -> JobOutcome;

    /// Automations the provider offers for a platform
    fn list_automations(&self, platform_id: &str) -> Result<Vec<Automation>, SubmissionError>;
}

/// Pick the first automation whose label contains `label`, ignoring case
pub fn resolve_automation<'a>(automations: &'a [Automation], label: &str) -> Option<&'a Automation> {
    let needle = label.to_lowercase();
    automations
        .iter()
        .find(|a| a.label.to_lowercase().contains(&needle))
}
