//! Research Collaborator Contracts
//!
//! A collaborator is an independently invokable data-gathering unit with its
//! own internal failure handling. Recoverable failures (network errors,
//! upstream API errors, parse failures) never surface as `Err`: the
//! collaborator returns a degraded typed result whose `errors` list records
//! what went wrong. An `Err` from a collaborator is an infrastructure-level
//! failure and aborts the whole job.
//!
//! One trait per research stage keeps the result envelopes strongly typed
//! while the fuser stays polymorphic over a small capability set
//! (has-live-website, has-platforms, has-mentions, has-opportunities).

/// Rule-based business analysis over earlier stage outputs.
pub mod business;
/// Press-mention scan backed by web search.
pub mod news;
/// Slug-based social profile scout.
pub mod social;
/// HTTP website probe with contact extraction.
pub mod website;

use crate::pipeline::CancelToken;
use crate::types::{
    BusinessIntel, Company, NewsIntel, Result, SocialIntel, SocialProfile, WebsiteIntel,
};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

pub use business::RuleBasedAnalyst;
pub use news::PressMentionScan;
pub use social::SlugProfileScout;
pub use website::HttpWebsiteProbe;

/// Read-only view of the subject handed to every collaborator call.
#[derive(Debug, Clone)]
pub struct SubjectSnapshot {
    pub company_id: Uuid,
    pub name: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl From<&Company> for SubjectSnapshot {
    fn from(company: &Company) -> Self {
        Self {
            company_id: company.id,
            name: company.name.clone(),
            website: company.website.clone(),
            phone: company.phone.clone(),
            address: company.address.clone(),
        }
    }
}

/// Per-job context threaded through every collaborator call.
///
/// Carries the cancellation token and the outputs of the stages that have
/// already completed, so later stages can build on earlier findings.
#[derive(Debug, Clone, Default)]
pub struct ResearchContext {
    pub job_id: Uuid,
    pub cancel: CancelToken,
    pub website: Option<WebsiteIntel>,
    pub social: Option<SocialIntel>,
    pub news: Option<NewsIntel>,
}

/// Result of one platform sub-call inside the social fan-out.
#[derive(Debug, Clone, Default)]
pub struct PlatformLookup {
    /// The profile found on this platform, if any.
    pub profile: Option<SocialProfile>,
    /// Recoverable failures encountered during the lookup.
    pub errors: Vec<String>,
}

/// Website stage collaborator.
#[async_trait]
pub trait WebsiteCollaborator: Send + Sync {
    fn source_name(&self) -> &str;

    async fn invoke(
        &self,
        subject: &SubjectSnapshot,
        ctx: &ResearchContext,
    ) -> Result<WebsiteIntel>;
}

/// Social stage collaborator. The sequencer fans out one `platform_lookup`
/// per configured platform and joins all of them.
#[async_trait]
pub trait SocialCollaborator: Send + Sync {
    fn source_name(&self) -> &str;

    async fn platform_lookup(
        &self,
        subject: &SubjectSnapshot,
        platform: &str,
        ctx: &ResearchContext,
    ) -> Result<PlatformLookup>;

    /// Presence score 0-100 over the joined profiles.
    fn presence_score(&self, profiles: &[SocialProfile]) -> u8 {
        (profiles.len() * 25).min(100) as u8
    }
}

/// Optional verification sub-call run after the social fan-out joins.
/// A verified profile gets a confidence boost, an unverified one a penalty.
#[async_trait]
pub trait ProfileVerifier: Send + Sync {
    fn source_name(&self) -> &str;

    async fn verify(&self, subject: &SubjectSnapshot, profile: &SocialProfile) -> Result<bool>;
}

/// News/reputation stage collaborator.
#[async_trait]
pub trait NewsCollaborator: Send + Sync {
    fn source_name(&self) -> &str;

    async fn invoke(&self, subject: &SubjectSnapshot, ctx: &ResearchContext) -> Result<NewsIntel>;
}

/// Business-analysis stage collaborator.
#[async_trait]
pub trait BusinessCollaborator: Send + Sync {
    fn source_name(&self) -> &str;

    async fn invoke(
        &self,
        subject: &SubjectSnapshot,
        ctx: &ResearchContext,
    ) -> Result<BusinessIntel>;
}

/// The full collaborator line-up a sequencer drives, one per stage plus the
/// optional verifier.
#[derive(Clone)]
pub struct CollaboratorSet {
    pub website: Arc<dyn WebsiteCollaborator>,
    pub social: Arc<dyn SocialCollaborator>,
    pub verifier: Option<Arc<dyn ProfileVerifier>>,
    pub news: Arc<dyn NewsCollaborator>,
    pub business: Arc<dyn BusinessCollaborator>,
}

impl CollaboratorSet {
    /// Built-in reference collaborators: HTTP website probe, slug-based
    /// social scout, press-mention scan and the rule-based analyst.
    pub fn builtin(request_timeout: std::time::Duration) -> Result<Self> {
        Ok(Self {
            website: Arc::new(HttpWebsiteProbe::new(request_timeout)?),
            social: Arc::new(SlugProfileScout::new(request_timeout)?),
            verifier: None,
            news: Arc::new(PressMentionScan::default()),
            business: Arc::new(RuleBasedAnalyst),
        })
    }
}
