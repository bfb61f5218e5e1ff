use thiserror::Error;

/// Failure to hand a job to the automation provider. Fatal to one stage only.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubmissionError {
    #[error("request to automation provider failed: {0}")]
    Transport(String),

    #[error("automation provider rejected the job (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("submission response carried no execution id: {body}")]
    MissingExecutionId { body: String },
}

/// Why a job never produced a terminal payload.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobFailure {
    #[error("job produced no data after {attempts} poll attempts")]
    Timeout { attempts: u32 },

    #[error("status check failed: {0}")]
    Transport(String),

    #[error("status check rejected (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// Problems with the inputs of a whole pipeline run. These abort the run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("missing required identifier: {0}")]
    MissingIdentifier(&'static str),

    #[error("{value:?} is not a valid {expected}")]
    InvalidUrl { expected: &'static str, value: String },

    #[error("input is missing required column {0:?}")]
    MissingColumn(String),

    #[error("missing required setting {0}")]
    MissingSetting(&'static str),

    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },
}
