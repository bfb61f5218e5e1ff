//! Profile lookup, its embedded sections, and optional activity exports

use super::{inputs, AutomationKind, Orchestrator, PipelineRun, Section};
use crate::error::ConfigurationError;
use crate::table::TabularResult;
use serde_json::Value;

pub const DEFAULT_ACTIVITY_COUNT: u32 = 10;
pub const DEFAULT_POSTS_COUNT: u32 = 5;
pub const MAX_EXPORT_COUNT: u32 = 1000;

/// Sections of a profile payload exported as their own sheets
const SECTIONS: &[Section] = &[
    Section { sheet: "experiences", keys: &["experiences"], item: "title" },
    Section { sheet: "education", keys: &["education"], item: "school" },
    Section { sheet: "skills", keys: &["skills"], item: "skill" },
];

/// `None` skips the stage; `Some(n)` caps the number of items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProfileOptions {
    pub activity: Option<u32>,
    pub posts: Option<u32>,
}

impl<'a> Orchestrator<'a> {
    pub fn profile(&self, url: &str, options: &ProfileOptions) -> Result<PipelineRun, ConfigurationError> {
        let url = inputs::profile_url(url)?;
        let activity = options
            .activity
            .map(|n| inputs::bounded("activity count", n, 1, MAX_EXPORT_COUNT))
            .transpose()?;
        let posts = options
            .posts
            .map(|n| inputs::bounded("posts count", n, 1, MAX_EXPORT_COUNT))
            .transpose()?;
        let mut run = PipelineRun::new("profile");

        let kind = AutomationKind::ProfileScraper;
        let request = self.request(kind).input("liProfileUrl", url.as_str());
        let output = self.run_stage("profile", &request, kind.policy());
        self.absorb_with_sections(&mut run, "profile", output, SECTIONS);

        let exports = [
            (AutomationKind::ProfileActivity, "profile_activity", activity),
            (AutomationKind::ProfilePosts, "profile_posts", posts),
        ];
        for (kind, sheet, count) in exports {
            if let Some(count) = count {
                let request = self
                    .request(kind)
                    .input("liProfileUrl", url.as_str())
                    .input("maxCount", count);
                run.absorb(sheet, self.run_stage(sheet, &request, kind.policy()));
            }
        }

        Ok(run)
    }

    /// Tables for the list sections embedded in a profile payload
    pub fn profile_sections(&self, payload: &Value) -> Vec<(&'static str, TabularResult)> {
        self.sections(payload, SECTIONS)
    }
}
