//! Keyword searches, with and without decision-maker filtering

use super::{inputs, AutomationKind, Orchestrator, PipelineRun, POST_COLUMNS, PROFILE_COLUMNS};
use crate::error::ConfigurationError;
use crate::jobs::JobRequest;
use std::fmt;
use std::str::FromStr;

pub const MAX_POST_SEARCH: u32 = 2500;
pub const MAX_PEOPLE_SEARCH: u32 = 1000;
pub const DEFAULT_POST_SEARCH: u32 = 10;
pub const DEFAULT_PEOPLE_SEARCH: u32 = 50;

/// Column holding the author's headline in post search results
pub const POST_HEADLINE_COLUMN: &str = "liProfileHeadline";
/// Column holding the headline in people search results
pub const PEOPLE_HEADLINE_COLUMN: &str = "headline";

macro_rules! provider_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Value the provider expects
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($wire => Ok($name::$variant),)+
                    other => Err(format!(
                        "unknown {} {:?}, expected one of: {}",
                        stringify!($name),
                        other,
                        [$($wire),+].join(", ")
                    )),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

provider_enum!(
    /// How far back to search
    TimeRange {
        PastDay => "past-24h",
        PastWeek => "past-week",
        PastMonth => "past-month",
    }
);

provider_enum!(
    SortOrder {
        DatePosted => "date_posted",
        Relevance => "relevance",
    }
);

provider_enum!(
    /// Whose posts to include
    PostedBy {
        FirstConnections => "first",
        Me => "me",
        Following => "following",
    }
);

/// Optional refinements of a post search. Unset fields use provider defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostSearchOptions {
    pub time_range: Option<TimeRange>,
    pub sort: Option<SortOrder>,
    pub posted_by: Option<PostedBy>,
    pub limit: u32,
}

impl Default for PostSearchOptions {
    fn default() -> Self {
        PostSearchOptions {
            time_range: None,
            sort: None,
            posted_by: None,
            limit: DEFAULT_POST_SEARCH,
        }
    }
}

impl<'a> Orchestrator<'a> {
    fn post_search_request(
        &self,
        query: &str,
        options: &PostSearchOptions,
    ) -> Result<JobRequest, ConfigurationError> {
        let query = inputs::search_query(query)?;
        let limit = inputs::bounded("post search limit", options.limit, 1, MAX_POST_SEARCH)?;

        Ok(self
            .request(AutomationKind::PostSearch)
            .input("liPostSearchUrl", query)
            .input_opt("startTime", options.time_range.map(TimeRange::as_str))
            .input_opt("sortBy", options.sort.map(SortOrder::as_str))
            .input_opt("postedBy", options.posted_by.map(PostedBy::as_str))
            .input("maxCountPostSearch", limit))
    }

    /// Posts matching a keyword or search URL, unfiltered
    pub fn post_search(&self, query: &str, options: &PostSearchOptions) -> Result<PipelineRun, ConfigurationError> {
        let request = self.post_search_request(query, options)?;
        let mut run = PipelineRun::new("keyword_posts").with_preview(POST_COLUMNS);
        let policy = AutomationKind::PostSearch.policy();
        run.absorb("keyword_posts", self.run_stage("keyword_posts", &request, policy));
        Ok(run)
    }

    /// Post search narrowed to authors whose headline names a decision-maker role
    pub fn decision_maker_posts(
        &self,
        query: &str,
        options: &PostSearchOptions,
    ) -> Result<PipelineRun, ConfigurationError> {
        let request = self.post_search_request(query, options)?;
        let mut run = PipelineRun::new("decision_makers").with_preview(POST_COLUMNS);
        let policy = AutomationKind::PostSearch.policy();
        run.absorb("decision_makers", self.run_stage("keyword_search", &request, policy));
        self.filter_primary(&mut run, POST_HEADLINE_COLUMN);
        Ok(run)
    }

    /// People search narrowed to decision-maker headlines
    pub fn people_search(&self, query: &str, limit: u32) -> Result<PipelineRun, ConfigurationError> {
        let query = inputs::search_query(query)?;
        let limit = inputs::bounded("people search limit", limit, 1, MAX_PEOPLE_SEARCH)?;

        let kind = AutomationKind::PeopleSearch;
        let request = self
            .request(kind)
            .input("liPeopleSearchUrl", query)
            .input("maxCountPeopleSearch", limit);

        let mut run = PipelineRun::new("filtered_profiles").with_preview(PROFILE_COLUMNS);
        run.absorb("filtered_profiles", self.run_stage("people_search", &request, kind.policy()));
        self.filter_primary(&mut run, PEOPLE_HEADLINE_COLUMN);
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::fake::{FakeClock, ScriptedClient};
    use crate::pipeline::testing::settings;
    use crate::pipeline::StageWarning;
    use serde_json::json;

    fn search_results() -> serde_json::Value {
        json!([
            {"firstName": "Ada", "liProfileHeadline": "Co-Founder at Engines", "postUrl": "p1"},
            {"firstName": "Bob", "liProfileHeadline": "Student", "postUrl": "p2"},
            {"firstName": "Cy", "liProfileHeadline": "VP Sales", "postUrl": "p3"}
        ])
    }

    #[test]
    fn test_post_search_inputs() {
        let client = ScriptedClient::new().ready(AutomationKind::PostSearch.id(), search_results());
        let clock = FakeClock::default();
        let settings = settings();
        let orchestrator = Orchestrator::new(&client, &clock, &settings);

        let options = PostSearchOptions {
            time_range: Some(TimeRange::PastWeek),
            sort: Some(SortOrder::Relevance),
            posted_by: None,
            limit: 25,
        };
        let run = orchestrator.post_search("rust compilers", &options).unwrap();

        let request = &client.submitted()[0];
        assert_eq!(request.input_str("liPostSearchUrl"), Some("rust compilers"));
        assert_eq!(request.input_str("startTime"), Some("past-week"));
        assert_eq!(request.input_str("sortBy"), Some("relevance"));
        assert!(request.input_str("postedBy").is_none());
        assert_eq!(request.inputs["maxCountPostSearch"], json!(25));
        assert_eq!(run.primary.len(), 3);
    }

    #[test]
    fn test_decision_maker_posts_filters_on_headline() {
        let client = ScriptedClient::new().ready(AutomationKind::PostSearch.id(), search_results());
        let clock = FakeClock::default();
        let settings = settings();
        let orchestrator = Orchestrator::new(&client, &clock, &settings);

        let run = orchestrator
            .decision_maker_posts("engines", &PostSearchOptions::default())
            .unwrap();

        let names: Vec<String> = run
            .primary
            .column("firstName")
            .unwrap()
            .cells
            .iter()
            .map(|c| c.as_text().into_owned())
            .collect();
        assert_eq!(names, vec!["Ada", "Cy"]);
        assert_eq!(
            run.preview_table().column_names(),
            vec!["firstName", "liProfileHeadline"]
        );
        assert!(run.warnings.is_empty());
    }

    #[test]
    fn test_people_search_without_headline_is_unfiltered() {
        let client = ScriptedClient::new()
            .ready(AutomationKind::PeopleSearch.id(), json!([{"name": "Ada"}, {"name": "Bob"}]));
        let clock = FakeClock::default();
        let settings = settings();
        let orchestrator = Orchestrator::new(&client, &clock, &settings);

        let run = orchestrator.people_search("founders", DEFAULT_PEOPLE_SEARCH).unwrap();

        assert_eq!(run.primary.len(), 2);
        assert_eq!(
            run.warnings,
            vec![StageWarning::FilterNotApplied {
                stage: "filtered_profiles".into(),
                column: "headline".into(),
            }]
        );
    }

    #[test]
    fn test_limits_and_blank_queries_are_rejected() {
        let client = ScriptedClient::new();
        let clock = FakeClock::default();
        let settings = settings();
        let orchestrator = Orchestrator::new(&client, &clock, &settings);

        assert!(matches!(
            orchestrator.people_search("founders", 1001),
            Err(ConfigurationError::OutOfRange { max: 1000, .. })
        ));
        assert!(matches!(
            orchestrator.post_search("  ", &PostSearchOptions::default()),
            Err(ConfigurationError::MissingIdentifier(_))
        ));
        assert!(client.submitted().is_empty());
    }

    #[test]
    fn test_option_parsing() {
        assert_eq!("PAST-24H".parse::<TimeRange>(), Ok(TimeRange::PastDay));
        assert_eq!("date_posted".parse::<SortOrder>(), Ok(SortOrder::DatePosted));
        assert!("friends".parse::<PostedBy>().is_err());
    }
}
