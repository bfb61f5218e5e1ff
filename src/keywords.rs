//! Role-title keyword sets shared by every filtering pipeline

use anyhow::{Context, Result};
use std::path::Path;

/// Titles that mark a decision-maker. Lowercase, matched as substrings.
pub const DECISION_MAKER_KEYWORDS: &[&str] = &[
    // founders, chairs, presidents
    "founder", "co-founder", "chairman", "executive chairman", "president",
    "executive vice president",
    // chief executive
    "ceo", "chief executive officer", "group chief executive officer", "chief executive office",
    // operations
    "coo", "chief operating officer", "group chief operating officer",
    // finance
    "cfo", "chief financial officer", "group chief financial officer",
    // technology and innovation
    "cto", "chief technology officer", "chief innovation officer",
    "chief technology & strategy officer", "chief digital officer", "chief information officer",
    "cio", "chief information architect", "chief technology architect",
    "chief digital & information officer",
    // people and talent
    "chro", "chief human resources officer", "chief people officer",
    "chief people and sustainability officer", "chief human resources and corporate officer",
    "interim chief people and culture officer", "group director of people & purpose",
    "head of talent", "head of talent acquisition", "svp of people & culture",
    // product and customer
    "cpo", "chief product officer", "chief product & customer officer", "chief customer officer",
    "chief merchandising officer", "chief supply chain officer",
    "chief supply chain and industrial officer",
    // revenue and commercial
    "cro", "chief revenue officer", "chief commercial officer", "group chief commercial officer",
    "group managing director, business development", "vp - sales", "svp of sales",
    // marketing and brand
    "cmo", "chief marketing officer", "group brand director", "marketing director",
    "head of marketing", "marketing manager", "vp of global marketing",
    // legal, risk, compliance
    "clo", "chief legal officer", "group general counsel", "general counsel",
    "chief legal counsel", "chief risk officer", "chief compliance officer",
    "group chief risk and regulatory officer",
    // strategy, growth, analytics
    "chief strategy officer", "group strategy director", "chief analytics officer",
    "vp strategy", "director of strategy", "strategic advisor", "chief growth officer",
    "group corporate development director",
    // finance and accounting
    "finance director", "head of finance", "group cfo", "vp of finance", "finance manager",
    // data and security
    "chief data officer", "chief information security officer", "group ciso",
    "group it infrastructure manager",
    // science and medical
    "chief scientific officer", "chief medical officer", "vp of it and mis", "vp of engineering",
    "chief technology & chief analytics officer", "lcms technical manager",
    "senior lc technical specialist",
    // communications
    "group communication director", "vp of communications", "media enquiries lead",
    "director of production and content",
    // sustainability and policy
    "chief sustainability officer", "group esg", "sustainable development director",
    "chief policy officer",
    // operations and services
    "head of operations", "vp of operations", "head of membership and marketing",
    "customer experience manager", "chief operations officer", "head of quality",
    "svp customer services", "group senior legal manager",
    // boards and directors
    "board member", "managing director", "group managing director", "business unit director",
    "director", "director of strategy & programmers", "associate director", "deputy director",
    "chief architect",
    // vice presidents
    "svp", "senior vice president", "vp", "vice president", "avp", "assistant vice president",
    // functional heads
    "head of hr", "head of hr & engagement", "head of finance & operations",
    "head of china & asia", "head of event content", "head of marketing and data",
    "head of commercial banking",
    // other executive titles
    "chief administrative officer", "chief development officer", "chief transformation officer",
    "chief science officer", "group advisory leader", "global assurance leader",
    "global chairman", "vp of product", "vp of global demand generation",
    "customer experience director", "senior business specialist",
    "business development manager", "director of insurance & partnerships",
];

/// An ordered, de-duplicated set of lowercase keywords
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeywordSet(Vec<String>);

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !out.contains(&keyword) {
                out.push(keyword);
            }
        }
        KeywordSet(out)
    }

    pub fn decision_makers() -> Self {
        KeywordSet::new(DECISION_MAKER_KEYWORDS)
    }

    /// One keyword per line; blank lines and `#` comments are ignored
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read keyword file {}", path.display()))?;
        Ok(KeywordSet::new(
            text.lines().filter(|l| !l.trim_start().starts_with('#')),
        ))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Comma-joined form some automations accept as a single input
    pub fn joined(&self) -> String {
        self.0.join(",")
    }
}
