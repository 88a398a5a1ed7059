//! HTTP website probe
//!
//! Fetches the subject's recorded website, checks liveness and extracts
//! contact details (emails, phone numbers) and the page title. Every network
//! or parse failure is recorded in the returned `errors` list; the probe
//! itself never fails a job.

use super::{ResearchContext, SubjectSnapshot, WebsiteCollaborator};
use crate::types::{AppError, Result, WebsiteIntel};
use async_trait::async_trait;
use regex::Regex;
use std::time::Duration;

const MAX_CONTACTS: usize = 10;

pub struct HttpWebsiteProbe {
    client: reqwest::Client,
    email_re: Regex,
    phone_re: Regex,
    title_re: Regex,
}

impl HttpWebsiteProbe {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("dossier-server/0.3")
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            email_re: Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}")
                .map_err(|e| AppError::Internal(e.to_string()))?,
            phone_re: Regex::new(r"\+?\d[\d\s().\-]{7,14}\d")
                .map_err(|e| AppError::Internal(e.to_string()))?,
            title_re: Regex::new(r"(?is)<title[^>]*>(.*?)</title>")
                .map_err(|e| AppError::Internal(e.to_string()))?,
        })
    }

    fn normalize_url(raw: &str) -> String {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            raw.to_string()
        } else {
            format!("https://{}", raw)
        }
    }

    fn extract(&self, body: &str, intel: &mut WebsiteIntel) {
        if let Some(caps) = self.title_re.captures(body) {
            let title = caps[1].trim().to_string();
            if !title.is_empty() {
                intel.title = Some(title);
            }
        }

        let mut emails: Vec<String> = self
            .email_re
            .find_iter(body)
            .map(|m| m.as_str().to_ascii_lowercase())
            // Asset filenames match the email pattern surprisingly often.
            .filter(|e| !e.ends_with(".png") && !e.ends_with(".jpg") && !e.ends_with(".svg"))
            .collect();
        emails.sort_unstable();
        emails.dedup();
        emails.truncate(MAX_CONTACTS);
        intel.emails = emails;

        let mut phones: Vec<String> = self
            .phone_re
            .find_iter(body)
            .map(|m| m.as_str().trim().to_string())
            .collect();
        phones.sort_unstable();
        phones.dedup();
        phones.truncate(MAX_CONTACTS);
        intel.phones = phones;
    }
}

#[async_trait]
impl WebsiteCollaborator for HttpWebsiteProbe {
    fn source_name(&self) -> &str {
        "website_probe"
    }

    async fn invoke(
        &self,
        subject: &SubjectSnapshot,
        _ctx: &ResearchContext,
    ) -> Result<WebsiteIntel> {
        let mut intel = WebsiteIntel::default();

        let Some(raw_url) = subject.website.as_deref() else {
            intel
                .errors
                .push("No website on record for this company".to_string());
            return Ok(intel);
        };

        let url = Self::normalize_url(raw_url);
        intel.has_ssl = url.starts_with("https://");
        intel.url = Some(url.clone());

        let response = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                intel.errors.push(format!("Request failed: {}", e));
                intel.confidence = 0;
                return Ok(intel);
            }
        };

        intel.live = response.status().is_success();
        if !intel.live {
            intel
                .errors
                .push(format!("Website returned status {}", response.status()));
            intel.confidence = 10;
            return Ok(intel);
        }

        match response.text().await {
            Ok(body) => self.extract(&body, &mut intel),
            Err(e) => intel.errors.push(format!("Failed to read body: {}", e)),
        }

        let mut confidence = 70u8;
        if intel.has_contact() {
            confidence += 15;
        }
        if intel.title.is_some() {
            confidence += 15;
        }
        intel.confidence = confidence.min(100);

        Ok(intel)
    }
}
