//! Mock collaborators and fixtures for testing.
//!
//! Collaborators here are configurable stand-ins for the built-in probes so
//! pipeline and API tests run without touching the network.

use async_trait::async_trait;
use chrono::Utc;
use dossier::collaborators::{
    BusinessCollaborator, CollaboratorSet, NewsCollaborator, PlatformLookup, ResearchContext,
    SocialCollaborator, SubjectSnapshot, WebsiteCollaborator,
};
use dossier::types::{
    AppError, BusinessIntel, Company, CompanyStatus, NewsIntel, NewsMention, Result, SocialProfile,
    WebsiteIntel,
};
use std::sync::Arc;
use uuid::Uuid;

/// Website collaborator returning a fixed result, optionally failing hard or
/// cancelling the job from inside the stage.
#[derive(Clone)]
pub struct MockWebsite {
    intel: WebsiteIntel,
    should_fail: bool,
    cancel_during_stage: bool,
}

impl MockWebsite {
    pub fn live() -> Self {
        Self {
            intel: WebsiteIntel {
                url: Some("https://acme.example".to_string()),
                live: true,
                title: Some("Acme Corp".to_string()),
                emails: vec!["info@acme.example".to_string()],
                phones: vec![],
                has_ssl: true,
                confidence: 85,
                errors: vec![],
            },
            should_fail: false,
            cancel_during_stage: false,
        }
    }

    /// Unreachable site: degraded result, not a hard failure.
    pub fn unreachable() -> Self {
        Self {
            intel: WebsiteIntel {
                url: Some("https://acme.example".to_string()),
                live: false,
                title: None,
                emails: vec![],
                phones: vec![],
                has_ssl: false,
                confidence: 0,
                errors: vec!["Request failed: connection refused".to_string()],
            },
            should_fail: false,
            cancel_during_stage: false,
        }
    }

    pub fn failing() -> Self {
        let mut mock = Self::live();
        mock.should_fail = true;
        mock
    }

    /// Fires the job's cancel token while the stage is running.
    pub fn cancelling() -> Self {
        let mut mock = Self::live();
        mock.cancel_during_stage = true;
        mock
    }
}

#[async_trait]
impl WebsiteCollaborator for MockWebsite {
    fn source_name(&self) -> &str {
        "mock_website"
    }

    async fn invoke(
        &self,
        _subject: &SubjectSnapshot,
        ctx: &ResearchContext,
    ) -> Result<WebsiteIntel> {
        if self.should_fail {
            return Err(AppError::Collaborator("Mock website failure".to_string()));
        }
        if self.cancel_during_stage {
            ctx.cancel.cancel();
        }
        Ok(self.intel.clone())
    }
}

/// Social collaborator that finds one profile per platform at a fixed
/// confidence, or misses everywhere.
#[derive(Clone)]
pub struct MockSocial {
    found: bool,
    confidence: u8,
    should_fail: bool,
}

impl MockSocial {
    pub fn found() -> Self {
        Self {
            found: true,
            confidence: 60,
            should_fail: false,
        }
    }

    pub fn empty() -> Self {
        Self {
            found: false,
            confidence: 0,
            should_fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            found: false,
            confidence: 0,
            should_fail: true,
        }
    }
}

#[async_trait]
impl SocialCollaborator for MockSocial {
    fn source_name(&self) -> &str {
        "mock_social"
    }

    async fn platform_lookup(
        &self,
        _subject: &SubjectSnapshot,
        platform: &str,
        _ctx: &ResearchContext,
    ) -> Result<PlatformLookup> {
        if self.should_fail {
            return Err(AppError::Collaborator("Mock social failure".to_string()));
        }
        if !self.found {
            return Ok(PlatformLookup::default());
        }
        Ok(PlatformLookup {
            profile: Some(SocialProfile {
                platform: platform.to_string(),
                url: format!("https://{}.example/acme", platform),
                confidence: self.confidence,
                verified: None,
            }),
            errors: vec![],
        })
    }
}

/// News collaborator with a fixed number of mentions.
#[derive(Clone)]
pub struct MockNews {
    mention_count: usize,
}

impl MockNews {
    pub fn with_mentions(mention_count: usize) -> Self {
        Self { mention_count }
    }

    pub fn empty() -> Self {
        Self { mention_count: 0 }
    }
}

#[async_trait]
impl NewsCollaborator for MockNews {
    fn source_name(&self) -> &str {
        "mock_news"
    }

    async fn invoke(&self, subject: &SubjectSnapshot, _ctx: &ResearchContext) -> Result<NewsIntel> {
        let mentions: Vec<NewsMention> = (0..self.mention_count)
            .map(|i| NewsMention {
                title: format!("{} in the news {}", subject.name, i),
                url: Some(format!("https://news.example/{}", i)),
                snippet: Some("A routine press mention".to_string()),
            })
            .collect();
        let count = mentions.len();
        Ok(NewsIntel {
            mentions,
            reputation_score: (50 + (count * 5).min(30)) as u8,
            confidence: (40 + (count * 10).min(50)) as u8,
            errors: vec![],
        })
    }
}

/// Business collaborator returning a fixed opportunity list.
#[derive(Clone)]
pub struct MockBusiness {
    opportunities: Vec<String>,
}

impl MockBusiness {
    pub fn with_opportunities(opportunities: &[&str]) -> Self {
        Self {
            opportunities: opportunities.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl BusinessCollaborator for MockBusiness {
    fn source_name(&self) -> &str {
        "mock_business"
    }

    async fn invoke(
        &self,
        _subject: &SubjectSnapshot,
        _ctx: &ResearchContext,
    ) -> Result<BusinessIntel> {
        Ok(BusinessIntel {
            opportunities: self.opportunities.clone(),
            digital_maturity_score: 70,
            opportunity_score: ((self.opportunities.len() * 15).min(100)) as u8,
            confidence: 70,
            errors: vec![],
        })
    }
}

/// A collaborator set where every stage succeeds with rich data.
pub fn successful_set() -> CollaboratorSet {
    CollaboratorSet {
        website: Arc::new(MockWebsite::live()),
        social: Arc::new(MockSocial::found()),
        verifier: None,
        news: Arc::new(MockNews::with_mentions(3)),
        business: Arc::new(MockBusiness::with_opportunities(&["Launch a newsletter"])),
    }
}

/// A set where the website is down and nothing else is found.
pub fn degraded_set() -> CollaboratorSet {
    CollaboratorSet {
        website: Arc::new(MockWebsite::unreachable()),
        social: Arc::new(MockSocial::empty()),
        verifier: None,
        news: Arc::new(MockNews::empty()),
        business: Arc::new(MockBusiness::with_opportunities(&[
            "Build a website",
            "Create social profiles",
        ])),
    }
}

/// A fresh company in pending state.
pub fn company(name: &str) -> Company {
    let now = Utc::now();
    Company {
        id: Uuid::new_v4(),
        name: name.to_string(),
        website: Some("https://acme.example".to_string()),
        phone: None,
        address: None,
        status: CompanyStatus::Pending,
        created_at: now,
        updated_at: now,
    }
}
