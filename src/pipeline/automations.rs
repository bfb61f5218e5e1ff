//! Provider automations used by the pipelines

use crate::jobs::PollPolicy;

/// Platform id of LinkedIn in the provider's catalog
pub const LINKEDIN_PLATFORM_ID: &str = "622f03eb770f6bba0b8facaa";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomationKind {
    PostScraper,
    PostLikers,
    PostComments,
    ProfileScraper,
    ProfileActivity,
    ProfilePosts,
    CompanyScraper,
    CompanyEmployees,
    CompanyActivity,
    PostSearch,
    PeopleSearch,
}

impl AutomationKind {
    pub const ALL: [AutomationKind; 11] = [
        AutomationKind::PostScraper,
        AutomationKind::PostLikers,
        AutomationKind::PostComments,
        AutomationKind::ProfileScraper,
        AutomationKind::ProfileActivity,
        AutomationKind::ProfilePosts,
        AutomationKind::CompanyScraper,
        AutomationKind::CompanyEmployees,
        AutomationKind::CompanyActivity,
        AutomationKind::PostSearch,
        AutomationKind::PeopleSearch,
    ];

    /// Provider automation id
    pub fn id(self) -> &'static str {
        match self {
            AutomationKind::PostScraper => "63fdd06c82e9647288a2d925",
            AutomationKind::PostLikers => "63fc575f7022e05c11bba145",
            AutomationKind::PostComments => "63fc8cd27022e05c113c3c73",
            AutomationKind::ProfileScraper => "63f48ee97022e05c116fc798",
            AutomationKind::ProfileActivity => "63f5bf1d7022e05c1119cff2",
            AutomationKind::ProfilePosts => "649425e10f7b435e858547c2",
            AutomationKind::CompanyScraper => "63f742037022e05c11a9440e",
            AutomationKind::CompanyEmployees => "645e38f5f74978ad3262f00d",
            AutomationKind::CompanyActivity => "64709b0f90217363308b2aaa",
            AutomationKind::PostSearch => "64099c6e0936e46db5d76f4c",
            AutomationKind::PeopleSearch => "63f5eaad7022e05c1180244a",
        }
    }

    /// Run name and description shown in the provider's history
    pub fn label(self) -> (&'static str, &'static str) {
        match self {
            AutomationKind::PostScraper => ("Post Extraction", "Extract LinkedIn post data"),
            AutomationKind::PostLikers => ("Post Likers Export", "Export LinkedIn post likers"),
            AutomationKind::PostComments => ("Post Commenters Export", "Export LinkedIn post comments"),
            AutomationKind::ProfileScraper => ("Profile Extraction", "Extract LinkedIn profile data"),
            AutomationKind::ProfileActivity => ("Profile Activity Export", "Export LinkedIn profile activity"),
            AutomationKind::ProfilePosts => ("Profile Posts Export", "Export LinkedIn profile posts"),
            AutomationKind::CompanyScraper => ("Company Extraction", "Extract LinkedIn company data"),
            AutomationKind::CompanyEmployees => ("Company Employees Export", "Export decision-makers of a company"),
            AutomationKind::CompanyActivity => ("Company Activity Export", "Export LinkedIn company activity"),
            AutomationKind::PostSearch => ("Post Search Export", "Search LinkedIn posts by keyword or URL"),
            AutomationKind::PeopleSearch => ("People Search Export", "Search LinkedIn profiles by keyword or URL"),
        }
    }

    /// Poll budget, sized to how long the provider usually takes
    pub fn policy(self) -> PollPolicy {
        match self {
            AutomationKind::PostScraper
            | AutomationKind::PostLikers
            | AutomationKind::PostComments
            | AutomationKind::ProfileScraper => PollPolicy::quick(),
            AutomationKind::ProfilePosts
            | AutomationKind::CompanyScraper
            | AutomationKind::PostSearch => PollPolicy::standard(),
            AutomationKind::PeopleSearch => PollPolicy::long(),
            AutomationKind::ProfileActivity
            | AutomationKind::CompanyEmployees
            | AutomationKind::CompanyActivity => PollPolicy::extended(),
        }
    }
}
