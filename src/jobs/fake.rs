//! Scripted job client and clock for tests.
//!
//! Each automation id gets a queue of scripts. Every submission takes the
//! next script (the last one repeats), and every fetch takes the next
//! outcome of that script (the last outcome repeats).

use super::{Automation, Clock, JobClient, JobHandle, JobOutcome, JobRequest};
use crate::error::SubmissionError;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Script {
    Reject(SubmissionError),
    Outcomes(Vec<JobOutcome>),
}

#[derive(Debug, Default)]
pub struct ScriptedClient {
    scripts: Mutex<HashMap<String, VecDeque<Script>>>,
    running: Mutex<HashMap<JobHandle, VecDeque<JobOutcome>>>,
    submitted: Mutex<Vec<JobRequest>>,
    fetches: Mutex<u32>,
    automations: Vec<Automation>,
}

#[allow(dead_code)]
impl ScriptedClient {
    pub fn new() -> Self {
        ScriptedClient::default()
    }

    /// Queue a sequence of fetch outcomes for the next submission of `automation_id`
    pub fn script(self, automation_id: &str, outcomes: Vec<JobOutcome>) -> Self {
        self.push(automation_id, Script::Outcomes(outcomes))
    }

    /// Queue an immediately ready job
    pub fn ready(self, automation_id: &str, payload: Value) -> Self {
        self.script(automation_id, vec![JobOutcome::Ready(payload)])
    }

    /// Queue a rejected submission
    pub fn reject(self, automation_id: &str, error: SubmissionError) -> Self {
        self.push(automation_id, Script::Reject(error))
    }

    pub fn with_automations(mut self, automations: Vec<Automation>) -> Self {
        self.automations = automations;
        self
    }

    fn push(self, automation_id: &str, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(automation_id.to_string())
            .or_default()
            .push_back(script);
        self
    }

    pub fn fetch_count(&self) -> u32 {
        *self.fetches.lock().unwrap()
    }

    /// Every request handed to `submit`, in order
    pub fn submitted(&self) -> Vec<JobRequest> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn submitted_automations(&self) -> Vec<String> {
        self.submitted()
            .into_iter()
            .map(|r| r.automation_id)
            .collect()
    }
}

/// Take the front item, leaving the last one in place
fn next_repeating<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

impl JobClient for ScriptedClient {
    fn submit(&self, request: &JobRequest) -> Result<JobHandle, SubmissionError> {
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(request.clone());
        let handle = JobHandle::new(format!("job-{}", submitted.len()));

        let script = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&request.automation_id)
            .and_then(next_repeating);

        match script {
            Some(Script::Outcomes(outcomes)) => {
                self.running
                    .lock()
                    .unwrap()
                    .insert(handle.clone(), outcomes.into());
                Ok(handle)
            }
            Some(Script::Reject(error)) => Err(error),
            None => Err(SubmissionError::Rejected {
                status: 404,
                body: format!("unknown automation {}", request.automation_id),
            }),
        }
    }

    fn fetch(&self, handle: &JobHandle) -> JobOutcome {
        *self.fetches.lock().unwrap() += 1;
        self.running
            .lock()
            .unwrap()
            .get_mut(handle)
            .and_then(next_repeating)
            .unwrap_or(JobOutcome::Pending)
    }

    fn list_automations(&self, _platform_id: &str) -> Result<Vec<Automation>, SubmissionError> {
        Ok(self.automations.clone())
    }
}

/// Records requested sleeps instead of blocking
#[derive(Debug, Default)]
pub struct FakeClock {
    sleeps: Mutex<Vec<Duration>>,
}

impl FakeClock {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Clock for FakeClock {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}
