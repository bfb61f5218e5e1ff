//! Validation of pipeline identifiers
//!
//! Every check here fails with a [`ConfigurationError`], which aborts the
//! whole run before any job is submitted.

use crate::error::ConfigurationError;
use once_cell::sync::Lazy;
use regex::Regex;

static LINKEDIN_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)linkedin\.com").unwrap());
static PROFILE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)linkedin\.com/in/").unwrap());
static COMPANY_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)linkedin\.com/company/").unwrap());

fn required(raw: &str, what: &'static str) -> Result<String, ConfigurationError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ConfigurationError::MissingIdentifier(what));
    }
    Ok(value.to_string())
}

fn matching(raw: &str, what: &'static str, pattern: &Regex) -> Result<String, ConfigurationError> {
    let value = required(raw, what)?;
    if !pattern.is_match(&value) {
        return Err(ConfigurationError::InvalidUrl {
            expected: what,
            value,
        });
    }
    Ok(value)
}

pub fn post_url(raw: &str) -> Result<String, ConfigurationError> {
    matching(raw, "LinkedIn post URL", &LINKEDIN_URL)
}

pub fn profile_url(raw: &str) -> Result<String, ConfigurationError> {
    matching(raw, "LinkedIn profile URL", &PROFILE_URL)
}

pub fn company_url(raw: &str) -> Result<String, ConfigurationError> {
    matching(raw, "LinkedIn company URL", &COMPANY_URL)
}

/// A keyword or search URL; anything non-blank is accepted
pub fn search_query(raw: &str) -> Result<String, ConfigurationError> {
    required(raw, "search keyword or URL")
}

pub fn bounded(name: &'static str, value: u32, min: u32, max: u32) -> Result<u32, ConfigurationError> {
    if value < min || value > max {
        return Err(ConfigurationError::OutOfRange {
            name,
            min,
            max,
            value,
        });
    }
    Ok(value)
}
