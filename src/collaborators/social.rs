//! Slug-based social profile scout
//!
//! Guesses the subject's profile URL on each platform from a slug of the
//! company name and checks whether the page exists. A reachable profile is
//! weak evidence on its own, so found profiles start at a modest confidence
//! and rely on the verification pass for a boost.

use super::{PlatformLookup, ResearchContext, SocialCollaborator, SubjectSnapshot};
use crate::types::{AppError, Result, SocialProfile};
use async_trait::async_trait;
use std::time::Duration;

/// Confidence assigned to a profile found purely by slug guessing.
const SLUG_MATCH_CONFIDENCE: u8 = 55;

pub struct SlugProfileScout {
    client: reqwest::Client,
}

impl SlugProfileScout {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("dossier-server/0.3")
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Lowercase alphanumeric slug with dashes, e.g. "Acme Widgets Ltd." -> "acme-widgets-ltd".
    pub fn slugify(name: &str) -> String {
        let mut slug = String::with_capacity(name.len());
        let mut last_dash = true;
        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
                last_dash = false;
            } else if !last_dash {
                slug.push('-');
                last_dash = true;
            }
        }
        slug.trim_end_matches('-').to_string()
    }

    fn profile_url(platform: &str, slug: &str) -> Option<String> {
        let url = match platform {
            "linkedin" => format!("https://www.linkedin.com/company/{}", slug),
            "facebook" => format!("https://www.facebook.com/{}", slug),
            "instagram" => format!("https://www.instagram.com/{}", slug),
            "x" | "twitter" => format!("https://x.com/{}", slug.replace('-', "")),
            _ => return None,
        };
        Some(url)
    }
}

#[async_trait]
impl SocialCollaborator for SlugProfileScout {
    fn source_name(&self) -> &str {
        "social_scout"
    }

    async fn platform_lookup(
        &self,
        subject: &SubjectSnapshot,
        platform: &str,
        _ctx: &ResearchContext,
    ) -> Result<PlatformLookup> {
        let mut lookup = PlatformLookup::default();

        let slug = Self::slugify(&subject.name);
        if slug.is_empty() {
            lookup
                .errors
                .push(format!("Cannot derive a profile slug for '{}'", subject.name));
            return Ok(lookup);
        }

        let Some(url) = Self::profile_url(platform, &slug) else {
            lookup
                .errors
                .push(format!("Unsupported platform '{}'", platform));
            return Ok(lookup);
        };

        match self.client.get(&url).send().await {
            Ok(resp) if resp.status().is_success() => {
                lookup.profile = Some(SocialProfile {
                    platform: platform.to_string(),
                    url,
                    confidence: SLUG_MATCH_CONFIDENCE,
                    verified: None,
                });
            }
            // Not found is an ordinary miss, not an error.
            Ok(_) => {}
            Err(e) => {
                lookup
                    .errors
                    .push(format!("{} lookup failed: {}", platform, e));
            }
        }

        Ok(lookup)
    }
}
