//! HTTP transport for the TexAu automation API

use super::{Automation, JobClient, JobHandle, JobOutcome, JobRequest};
use crate::config::ProviderSettings;
use crate::error::{JobFailure, SubmissionError};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

/// Blocking client for job submission and status retrieval
pub struct TexauClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: String,
    context: Option<String>,
}

#[derive(Deserialize)]
struct AutomationList {
    #[serde(default)]
    data: Vec<Automation>,
}

impl TexauClient {
    pub fn new(settings: &ProviderSettings) -> Self {
        // Non-2xx responses are inspected, not turned into transport errors
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(settings.request_timeout))
            .http_status_as_error(false)
            .build();

        TexauClient {
            agent: config.into(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            context: settings.context.clone(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorize<B>(&self, request: ureq::RequestBuilder<B>) -> ureq::RequestBuilder<B> {
        let request = request.header("Authorization", format!("Bearer {}", self.api_key));
        match &self.context {
            Some(context) => request.header("X-TexAu-Context", context.as_str()),
            None => request,
        }
    }

    /// GET `path` and return (status, body)
    fn get(&self, path: &str) -> Result<(u16, String), String> {
        let response = self
            .authorize(self.agent.get(self.url(path)))
            .call()
            .map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| e.to_string())?;
        Ok((status, body))
    }
}

impl JobClient for TexauClient {
    fn submit(&self, request: &JobRequest) -> Result<JobHandle, SubmissionError> {
        info!(automation = %request.automation_id, name = %request.name, "submitting job");

        let response = self
            .authorize(self.agent.post(self.url("public/run")))
            .send_json(request)
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        let handle = submission_result(status, body)?;
        debug!(execution = %handle, "job accepted");
        Ok(handle)
    }

    fn fetch(&self, handle: &JobHandle) -> JobOutcome {
        let (status, body) = match self.get(&format!("public/results/{}", handle)) {
            Ok(reply) => reply,
            Err(e) => return JobOutcome::Failed(JobFailure::Transport(e)),
        };

        fetch_outcome(status, body)
    }

    fn list_automations(&self, platform_id: &str) -> Result<Vec<Automation>, SubmissionError> {
        let (status, body) = self
            .get(&format!("public/automations?platformId={}", platform_id))
            .map_err(SubmissionError::Transport)?;

        if !(200..300).contains(&status) {
            return Err(SubmissionError::Rejected { status, body });
        }

        serde_json::from_str::<AutomationList>(&body)
            .map(|list| list.data)
            .map_err(|e| SubmissionError::Transport(format!("malformed automation list: {}", e)))
    }
}

/// Map a submission reply to a handle
fn submission_result(status: u16, body: String) -> Result<JobHandle, SubmissionError> {
    if !(200..300).contains(&status) {
        return Err(SubmissionError::Rejected { status, body });
    }

    let handle = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|v| execution_id(&v))
        .map(JobHandle::new);
    handle.ok_or(SubmissionError::MissingExecutionId { body })
}

/// Map a status reply to an outcome. Rejections are terminal.
fn fetch_outcome(status: u16, body: String) -> JobOutcome {
    if !(200..300).contains(&status) {
        return JobOutcome::Failed(JobFailure::Rejected { status, body });
    }
    outcome_from_body(&body)
}

/// `data.id`, falling back to `data.workflowId`
fn execution_id(response: &Value) -> Option<String> {
    let data = response.get("data")?;
    ["id", "workflowId"].iter().find_map(|key| match data.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// A populated `data` field is terminal; anything else means "not yet"
fn outcome_from_body(body: &str) -> JobOutcome {
    let parsed: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => return JobOutcome::Pending,
    };

    match parsed.get("data") {
        Some(data) if is_populated(data) => JobOutcome::Ready(data.clone()),
        _ => JobOutcome::Pending,
    }
}

fn is_populated(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
        Value::Number(_) => true,
    }
}
