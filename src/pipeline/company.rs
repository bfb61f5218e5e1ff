//! Company lookup with decision-maker employees and recent activity

use super::{inputs, AutomationKind, Orchestrator, PipelineRun, Section};
use crate::error::ConfigurationError;

/// Key people listed on the company page
const SECTIONS: &[Section] = &[Section {
    sheet: "personnel",
    keys: &["personnel", "keyPeople"],
    item: "name",
}];

/// Recent company posts fetched by the activity stage
const COMPANY_ACTIVITY_COUNT: u32 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompanyOptions {
    pub employees: bool,
    pub activity: bool,
}

impl<'a> Orchestrator<'a> {
    pub fn company(&self, url: &str, options: &CompanyOptions) -> Result<PipelineRun, ConfigurationError> {
        let url = inputs::company_url(url)?;
        let mut run = PipelineRun::new("company");

        let kind = AutomationKind::CompanyScraper;
        let request = self.request(kind).input("liCompanyUrl", url.as_str());
        let output = self.run_stage("company", &request, kind.policy());
        self.absorb_with_sections(&mut run, "company", output, SECTIONS);

        if options.employees {
            // The provider filters employees by title when given keywords
            let kind = AutomationKind::CompanyEmployees;
            let request = self
                .request(kind)
                .input("liCompanyUrl", url.as_str())
                .input("keyword", self.keywords().joined());
            run.absorb(
                "company_employees",
                self.run_stage("company_employees", &request, kind.policy()),
            );
        }

        if options.activity {
            let kind = AutomationKind::CompanyActivity;
            let request = self
                .request(kind)
                .input("liCompanyUrl", url.as_str())
                .input("mode", "all")
                .input("maxCountCompanyActivity", COMPANY_ACTIVITY_COUNT);
            run.absorb(
                "company_activity",
                self.run_stage("company_activity", &request, kind.policy()),
            );
        }

        Ok(run)
    }
}
