//! Bounded polling of submitted jobs
//!
//! The provider offers no push notification, so a job is checked at a fixed
//! interval until it yields a terminal outcome or the attempt budget runs
//! out. The loop is an explicit state machine ([`PollState`]) so it can be
//! driven by a fake client and a fake clock in tests.

use super::{JobClient, JobHandle, JobOutcome, JobRequest};
use crate::error::JobFailure;
use std::time::Duration;
use tracing::{debug, warn};

/// Source of waiting between attempts
pub trait Clock {
    fn sleep(&self, duration: Duration);
}

/// Blocks the current thread
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Attempt cap and constant interval for one call site
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        PollPolicy {
            max_attempts,
            interval,
        }
    }

    /// Single-record lookups (post, profile, likers, comments)
    pub const fn quick() -> Self {
        PollPolicy::new(60, Duration::from_secs(1))
    }

    /// Searches and company lookups
    pub const fn standard() -> Self {
        PollPolicy::new(120, Duration::from_secs(1))
    }

    /// People search exports
    pub const fn long() -> Self {
        PollPolicy::new(300, Duration::from_secs(1))
    }

    /// Employee and activity exports, up to ten minutes
    pub const fn extended() -> Self {
        PollPolicy::new(600, Duration::from_secs(1))
    }
}

/// What to do after one status check
#[derive(Debug, Clone, PartialEq)]
pub enum PollStep {
    Done(JobOutcome),
    Wait(Duration),
}

/// Attempt counter for one job
#[derive(Debug, Clone)]
pub struct PollState {
    policy: PollPolicy,
    attempts: u32,
}

impl PollState {
    pub fn new(policy: PollPolicy) -> Self {
        PollState {
            policy,
            attempts: 0,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Record one status check. Pending turns into a timeout once the
    /// budget is spent.
    pub fn advance(&mut self, outcome: JobOutcome) -> PollStep {
        self.attempts += 1;
        match outcome {
            JobOutcome::Pending if self.attempts < self.policy.max_attempts => {
                PollStep::Wait(self.policy.interval)
            }
            JobOutcome::Pending => PollStep::Done(JobOutcome::Failed(JobFailure::Timeout {
                attempts: self.attempts,
            })),
            terminal => PollStep::Done(terminal),
        }
    }
}

/// Drives a [`JobClient`] until a job is ready, failed or out of budget
pub struct Poller<'a> {
    client: &'a dyn JobClient,
    clock: &'a dyn Clock,
}

impl<'a> Poller<'a> {
    pub fn new(client: &'a dyn JobClient, clock: &'a dyn Clock) -> Self {
        Poller { client, clock }
    }

    /// Poll `handle` at most `policy.max_attempts` times
    pub fn poll_until_ready(&self, handle: &JobHandle, policy: PollPolicy) -> JobOutcome {
        if policy.max_attempts == 0 {
            return JobOutcome::Failed(JobFailure::Timeout { attempts: 0 });
        }

        let mut state = PollState::new(policy);
        loop {
            let outcome = self.client.fetch(handle);
            match state.advance(outcome) {
                PollStep::Done(outcome) => {
                    if let JobOutcome::Failed(ref failure) = outcome {
                        warn!(execution = %handle, attempts = state.attempts(), "job failed: {}", failure);
                    }
                    return outcome;
                }
                PollStep::Wait(interval) => {
                    debug!(execution = %handle, attempt = state.attempts(), "job pending");
                    self.clock.sleep(interval);
                }
            }
        }
    }

    /// Submit `request` and poll it to completion
    pub fn run(&self, request: &JobRequest, policy: PollPolicy) -> JobOutcome {
        match self.client.submit(request) {
            Ok(handle) => self.poll_until_ready(&handle, policy),
            Err(e) => {
                warn!(automation = %request.automation_id, "submission failed: {}", e);
                JobOutcome::Failed(JobFailure::Submission(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SubmissionError;
    use crate::jobs::fake::{FakeClock, ScriptedClient};
    use serde_json::json;

    fn policy(max_attempts: u32) -> PollPolicy {
        PollPolicy::new(max_attempts, Duration::from_secs(1))
    }

    #[test]
    fn test_ready_after_two_pending() {
        let client = ScriptedClient::new().script(
            "a",
            vec![JobOutcome::Pending, JobOutcome::Pending, JobOutcome::Ready(json!({"x": 1}))],
        );
        let clock = FakeClock::default();
        let handle = client.submit(&JobRequest::new("a", "acct", "UTC")).unwrap();

        let outcome = Poller::new(&client, &clock).poll_until_ready(&handle, policy(5));

        assert_eq!(outcome, JobOutcome::Ready(json!({"x": 1})));
        assert_eq!(client.fetch_count(), 3);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(1); 2]);
    }

    #[test]
    fn test_timeout_after_exactly_max_attempts() {
        let client = ScriptedClient::new().script("a", vec![JobOutcome::Pending]);
        let clock = FakeClock::default();
        let handle = client.submit(&JobRequest::new("a", "acct", "UTC")).unwrap();

        let outcome = Poller::new(&client, &clock).poll_until_ready(&handle, policy(3));

        assert_eq!(outcome, JobOutcome::Failed(JobFailure::Timeout { attempts: 3 }));
        assert_eq!(client.fetch_count(), 3);
        assert_eq!(clock.sleeps().len(), 2);
    }

    #[test]
    fn test_failure_ends_wait_early() {
        let failure = JobFailure::Transport("connection reset".into());
        let client = ScriptedClient::new().script(
            "a",
            vec![JobOutcome::Pending, JobOutcome::Failed(failure.clone())],
        );
        let clock = FakeClock::default();
        let handle = client.submit(&JobRequest::new("a", "acct", "UTC")).unwrap();

        let outcome = Poller::new(&client, &clock).poll_until_ready(&handle, policy(10));

        assert_eq!(outcome, JobOutcome::Failed(failure));
        assert_eq!(client.fetch_count(), 2);
    }

    #[test]
    fn test_run_maps_submission_error() {
        let rejected = SubmissionError::Rejected { status: 401, body: "bad key".into() };
        let client = ScriptedClient::new().reject("a", rejected.clone());
        let clock = FakeClock::default();

        let outcome = Poller::new(&client, &clock)
            .run(&JobRequest::new("a", "acct", "UTC"), policy(3));

        assert_eq!(outcome, JobOutcome::Failed(JobFailure::Submission(rejected)));
        assert_eq!(client.fetch_count(), 0);
    }

    #[test]
    fn test_state_machine_transitions() {
        let mut state = PollState::new(policy(2));

        assert_eq!(state.advance(JobOutcome::Pending), PollStep::Wait(Duration::from_secs(1)));
        assert_eq!(
            state.advance(JobOutcome::Pending),
            PollStep::Done(JobOutcome::Failed(JobFailure::Timeout { attempts: 2 }))
        );
        assert_eq!(state.attempts(), 2);
    }
}
