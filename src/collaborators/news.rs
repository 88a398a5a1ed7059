//! Press-mention scan
//!
//! Searches the web (DuckDuckGo via the daedra crate) for recent mentions of
//! the subject. Search failures degrade the result instead of failing the
//! stage.

use super::{NewsCollaborator, ResearchContext, SubjectSnapshot};
use crate::types::{NewsIntel, NewsMention, Result};
use async_trait::async_trait;

pub struct PressMentionScan {
    max_results: usize,
}

impl PressMentionScan {
    pub fn new(max_results: usize) -> Self {
        Self { max_results }
    }
}

impl Default for PressMentionScan {
    fn default() -> Self {
        Self::new(10)
    }
}

#[async_trait]
impl NewsCollaborator for PressMentionScan {
    fn source_name(&self) -> &str {
        "press_scan"
    }

    async fn invoke(&self, subject: &SubjectSnapshot, _ctx: &ResearchContext) -> Result<NewsIntel> {
        let mut intel = NewsIntel {
            // No findings reads as neutral reputation.
            reputation_score: 50,
            ..Default::default()
        };

        let search_args = daedra::SearchArgs {
            query: format!("\"{}\" news", subject.name),
            options: Some(daedra::SearchOptions {
                num_results: self.max_results,
                ..Default::default()
            }),
        };

        match daedra::tools::search::perform_search(&search_args).await {
            Ok(response) => {
                intel.mentions = response
                    .data
                    .iter()
                    .map(|r| NewsMention {
                        title: r.title.clone(),
                        url: Some(r.url.clone()),
                        snippet: Some(r.description.clone()),
                    })
                    .collect();

                let count = intel.mentions.len();
                intel.reputation_score = (50 + (count * 5).min(30)) as u8;
                intel.confidence = (40 + (count * 10).min(50)) as u8;
            }
            Err(e) => {
                intel.errors.push(format!("Mention search failed: {}", e));
                intel.confidence = 0;
            }
        }

        Ok(intel)
    }
}
