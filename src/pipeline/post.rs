//! Post lookup with optional likers and comments exports

use super::{inputs, AutomationKind, Orchestrator, PipelineRun, Section};
use crate::error::ConfigurationError;

/// People embedded in the post payload itself
const SECTIONS: &[Section] = &[
    Section { sheet: "reactors", keys: &["reactors", "reactions"], item: "name" },
    Section { sheet: "commenters", keys: &["commenters", "comments"], item: "comment" },
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostOptions {
    pub likers: bool,
    pub comments: bool,
}

impl<'a> Orchestrator<'a> {
    /// Post details, then likers and comments of the same post
    pub fn post(&self, url: &str, options: &PostOptions) -> Result<PipelineRun, ConfigurationError> {
        let url = inputs::post_url(url)?;
        let mut run = PipelineRun::new("post");

        let stages = [
            (AutomationKind::PostScraper, "post", true),
            (AutomationKind::PostLikers, "likers", options.likers),
            (AutomationKind::PostComments, "comments_export", options.comments),
        ];
        for (kind, sheet, wanted) in stages {
            if !wanted {
                continue;
            }
            let request = self.request(kind).input("liPostUrl", url.as_str());
            let output = self.run_stage(sheet, &request, kind.policy());
            if kind == AutomationKind::PostScraper {
                self.absorb_with_sections(&mut run, sheet, output, SECTIONS);
            } else {
                run.absorb(sheet, output);
            }
        }

        Ok(run)
    }
}
