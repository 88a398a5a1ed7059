//! Rule-based business analyst
//!
//! Derives a digital-maturity estimate and concrete opportunities from the
//! outputs the earlier stages placed in the research context. Pure local
//! computation; it can never fail a job.

use super::{BusinessCollaborator, ResearchContext, SubjectSnapshot};
use crate::types::{BusinessIntel, Result};
use async_trait::async_trait;

pub struct RuleBasedAnalyst;

#[async_trait]
impl BusinessCollaborator for RuleBasedAnalyst {
    fn source_name(&self) -> &str {
        "rule_analyst"
    }

    async fn invoke(
        &self,
        _subject: &SubjectSnapshot,
        ctx: &ResearchContext,
    ) -> Result<BusinessIntel> {
        let mut intel = BusinessIntel::default();
        let mut maturity: u32 = 0;

        let website = ctx.website.as_ref();
        let social = ctx.social.as_ref();
        let news = ctx.news.as_ref();

        match website {
            Some(site) if site.live => {
                maturity += 40;
                if site.has_ssl {
                    maturity += 10;
                } else {
                    intel
                        .opportunities
                        .push("Move the website to HTTPS".to_string());
                }
                if site.has_contact() {
                    maturity += 10;
                } else {
                    intel
                        .opportunities
                        .push("Publish contact details on the website".to_string());
                }
            }
            _ => {
                intel
                    .opportunities
                    .push("Establish or restore a live website presence".to_string());
            }
        }

        let platform_count = social.map(|s| s.platform_count()).unwrap_or(0);
        maturity += (platform_count as u32 * 10).min(30);
        if platform_count == 0 {
            intel
                .opportunities
                .push("Create social media profiles".to_string());
        }
        if !social.map(|s| s.has_linkedin()).unwrap_or(false) {
            intel
                .opportunities
                .push("Create a LinkedIn company page".to_string());
        }

        if news.map(|n| n.mentions.is_empty()).unwrap_or(true) {
            intel
                .opportunities
                .push("Invest in press coverage and publicity".to_string());
        } else {
            maturity += 10;
        }

        intel.digital_maturity_score = maturity.min(100) as u8;
        intel.opportunity_score = (intel.opportunities.len() * 15).min(100) as u8;
        intel.confidence = if website.is_some() && social.is_some() {
            70
        } else {
            40
        };

        Ok(intel)
    }
}
