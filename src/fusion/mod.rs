//! Intelligence Fuser
//!
//! Combines the four stage outputs of one research job into the dossier's
//! derived scores and gap list. Pure computation over the outputs; no I/O.
//!
//! Completeness is a weighted sum over six all-or-nothing criteria (max
//! 100). Confidence blends the website confidence with the mean social
//! profile confidence; by inherited behavior the result is NOT clamped to
//! 100 (see `confidence_score`).

use crate::types::{BusinessIntel, CompanyDossier, NewsIntel, SocialIntel, WebsiteIntel};
use chrono::Utc;

pub const GAP_NO_LIVE_WEBSITE: &str = "Website is not live or could not be reached";
pub const GAP_NO_CONTACT_EMAIL: &str = "No contact email found on website";
pub const GAP_NO_SOCIAL_PRESENCE: &str = "No social media presence found";
pub const GAP_NO_LINKEDIN: &str = "No LinkedIn profile found";
pub const GAP_NO_NEWS_MENTIONS: &str = "No recent news or press mentions found";

/// Weighted coverage over six fixed criteria, 0-100.
///
/// +30 live website, +20 at least one social platform, +15 at least one
/// news mention, +15 at least one opportunity, +10 at least one contact
/// email or phone on the website, +10 at least two distinct platforms.
pub fn completeness_score(
    website: Option<&WebsiteIntel>,
    social: Option<&SocialIntel>,
    news: Option<&NewsIntel>,
    business: Option<&BusinessIntel>,
) -> u8 {
    let mut score = 0u8;

    if website.map(|w| w.live).unwrap_or(false) {
        score += 30;
    }
    let platform_count = social.map(|s| s.platform_count()).unwrap_or(0);
    if platform_count >= 1 {
        score += 20;
    }
    if news.map(|n| !n.mentions.is_empty()).unwrap_or(false) {
        score += 15;
    }
    if business.map(|b| !b.opportunities.is_empty()).unwrap_or(false) {
        score += 15;
    }
    if website.map(|w| w.has_contact()).unwrap_or(false) {
        score += 10;
    }
    if platform_count >= 2 {
        score += 10;
    }

    score
}

/// Blended confidence: `round(website_confidence/2 + mean(social)/4 + 25)`.
///
/// The divisor substitutes 1 for an empty platform list, so missing social
/// data contributes 0. The result is intentionally not clamped to [0,100];
/// inputs above the documented range propagate through unchanged.
pub fn confidence_score(website: Option<&WebsiteIntel>, social: Option<&SocialIntel>) -> i64 {
    let website_confidence = website.map(|w| f64::from(w.confidence)).unwrap_or(0.0);
    let social_mean = social.map(|s| s.mean_confidence()).unwrap_or(0.0);

    (website_confidence / 2.0 + social_mean / 4.0 + 25.0).round() as i64
}

/// Fixed-vocabulary gap descriptions, in stable order.
pub fn identify_gaps(
    website: Option<&WebsiteIntel>,
    social: Option<&SocialIntel>,
    news: Option<&NewsIntel>,
) -> Vec<String> {
    let mut gaps = Vec::new();

    if !website.map(|w| w.live).unwrap_or(false) {
        gaps.push(GAP_NO_LIVE_WEBSITE.to_string());
    }
    if !website.map(|w| !w.emails.is_empty()).unwrap_or(false) {
        gaps.push(GAP_NO_CONTACT_EMAIL.to_string());
    }
    if social.map(|s| s.platform_count()).unwrap_or(0) == 0 {
        gaps.push(GAP_NO_SOCIAL_PRESENCE.to_string());
    }
    if !social.map(|s| s.has_linkedin()).unwrap_or(false) {
        gaps.push(GAP_NO_LINKEDIN.to_string());
    }
    if !news.map(|n| !n.mentions.is_empty()).unwrap_or(false) {
        gaps.push(GAP_NO_NEWS_MENTIONS.to_string());
    }

    gaps
}

/// Compute every derived field of the dossier from its four stage outputs.
pub fn fuse(dossier: &mut CompanyDossier) {
    let website = dossier.website.as_ref();
    let social = dossier.social.as_ref();
    let news = dossier.news.as_ref();
    let business = dossier.business.as_ref();

    dossier.completeness_score = completeness_score(website, social, news, business);
    dossier.confidence_score = confidence_score(website, social);

    dossier.digital_maturity_score = business.map(|b| b.digital_maturity_score).unwrap_or(0);
    dossier.opportunity_score = business
        .map(|b| {
            // Cap at min(count * 15, 100) even when the collaborator did not.
            let cap = (b.opportunities.len() * 15).min(100) as u8;
            b.opportunity_score.min(cap)
        })
        .unwrap_or(0);
    dossier.social_presence_score = social.map(|s| s.presence_score).unwrap_or(0);
    // A missing news stage reads as neutral reputation.
    dossier.reputation_score = news.map(|n| n.reputation_score).unwrap_or(50);

    dossier.gaps = identify_gaps(website, social, news);
    dossier.researched_at = Utc::now();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NewsMention, SocialProfile};
    use rstest::rstest;
    use uuid::Uuid;

    fn website(live: bool, contact: bool) -> WebsiteIntel {
        WebsiteIntel {
            live,
            emails: if contact {
                vec!["info@acme.example".to_string()]
            } else {
                vec![]
            },
            confidence: if live { 80 } else { 10 },
            ..Default::default()
        }
    }

    fn social(platforms: &[&str]) -> SocialIntel {
        SocialIntel {
            profiles: platforms
                .iter()
                .map(|p| SocialProfile {
                    platform: (*p).to_string(),
                    url: format!("https://{}.example/acme", p),
                    confidence: 60,
                    verified: None,
                })
                .collect(),
            presence_score: (platforms.len() * 25).min(100) as u8,
            errors: vec![],
        }
    }

    fn news(mentions: usize) -> NewsIntel {
        NewsIntel {
            mentions: (0..mentions)
                .map(|i| NewsMention {
                    title: format!("Mention {}", i),
                    url: None,
                    snippet: None,
                })
                .collect(),
            reputation_score: 60,
            confidence: 50,
            errors: vec![],
        }
    }

    fn business(opportunities: usize) -> BusinessIntel {
        BusinessIntel {
            opportunities: (0..opportunities)
                .map(|i| format!("Opportunity {}", i))
                .collect(),
            digital_maturity_score: 70,
            opportunity_score: (opportunities * 15).min(100) as u8,
            confidence: 70,
            ..Default::default()
        }
    }

    #[test]
    fn test_completeness_exhaustive_over_criteria() {
        // Drive all 2^6 combinations of the six criteria and check the score
        // is the exact sum of the triggered weights.
        for bits in 0u32..64 {
            let live = bits & 1 != 0;
            let one_platform = bits & 2 != 0;
            let has_mention = bits & 4 != 0;
            let has_opportunity = bits & 8 != 0;
            let has_contact = bits & 16 != 0;
            let two_platforms = bits & 32 != 0;

            let platforms: &[&str] = if two_platforms {
                &["linkedin", "facebook"]
            } else if one_platform {
                &["linkedin"]
            } else {
                &[]
            };

            let w = website(live, has_contact);
            let s = social(platforms);
            let n = news(usize::from(has_mention));
            let b = business(usize::from(has_opportunity));

            let expected = u8::from(live) * 30
                + u8::from(!platforms.is_empty()) * 20
                + u8::from(has_mention) * 15
                + u8::from(has_opportunity) * 15
                + u8::from(has_contact) * 10
                + u8::from(platforms.len() >= 2) * 10;

            let score = completeness_score(Some(&w), Some(&s), Some(&n), Some(&b));
            assert_eq!(score, expected, "bits {:06b}", bits);
            assert!(score <= 100);
        }
    }

    #[test]
    fn test_completeness_scenario_from_field_data() {
        // Live site (+30), two platforms (+20, +10), no mentions, one
        // opportunity (+15), one contact email (+10) = 85.
        let w = website(true, true);
        let s = social(&["linkedin", "instagram"]);
        let n = news(0);
        let b = business(1);

        assert_eq!(completeness_score(Some(&w), Some(&s), Some(&n), Some(&b)), 85);
    }

    #[test]
    fn test_completeness_all_absent() {
        assert_eq!(completeness_score(None, None, None, None), 0);
    }

    #[test]
    fn test_confidence_formula() {
        let w = WebsiteIntel {
            confidence: 80,
            ..Default::default()
        };
        let s = social(&["linkedin", "facebook"]);

        // 80/2 + 60/4 + 25 = 40 + 15 + 25 = 80.
        assert_eq!(confidence_score(Some(&w), Some(&s)), 80);
    }

    #[test]
    fn test_confidence_empty_social_contributes_zero() {
        let w = WebsiteIntel {
            confidence: 100,
            ..Default::default()
        };
        let s = SocialIntel::default();

        // 100/2 + 0 + 25 = 75; empty platform list must not divide by zero.
        assert_eq!(confidence_score(Some(&w), Some(&s)), 75);
        assert_eq!(confidence_score(None, None), 25);
    }

    #[test]
    fn test_confidence_boundary_and_no_clamp() {
        let w = WebsiteIntel {
            confidence: 100,
            ..Default::default()
        };
        let mut s = social(&["linkedin"]);
        s.profiles[0].confidence = 100;

        // 50 + 25 + 25 sits exactly at the boundary.
        assert_eq!(confidence_score(Some(&w), Some(&s)), 100);

        // Out-of-range inputs push past 100; the formula does not clamp.
        let hot = WebsiteIntel {
            confidence: 200,
            ..Default::default()
        };
        assert_eq!(confidence_score(Some(&hot), Some(&s)), 150);
    }

    #[rstest]
    #[case(false, false, &[], 0, vec![
        GAP_NO_LIVE_WEBSITE,
        GAP_NO_CONTACT_EMAIL,
        GAP_NO_SOCIAL_PRESENCE,
        GAP_NO_LINKEDIN,
        GAP_NO_NEWS_MENTIONS,
    ])]
    #[case(true, true, &["linkedin"], 2, vec![])]
    #[case(true, false, &["facebook"], 1, vec![GAP_NO_CONTACT_EMAIL, GAP_NO_LINKEDIN])]
    fn test_gap_identification(
        #[case] live: bool,
        #[case] contact: bool,
        #[case] platforms: &[&str],
        #[case] mentions: usize,
        #[case] expected: Vec<&str>,
    ) {
        let w = website(live, contact);
        let s = social(platforms);
        let n = news(mentions);

        let gaps = identify_gaps(Some(&w), Some(&s), Some(&n));
        assert_eq!(gaps, expected);
    }

    #[test]
    fn test_gap_order_is_stable() {
        let gaps = identify_gaps(None, None, None);
        assert_eq!(
            gaps,
            vec![
                GAP_NO_LIVE_WEBSITE,
                GAP_NO_CONTACT_EMAIL,
                GAP_NO_SOCIAL_PRESENCE,
                GAP_NO_LINKEDIN,
                GAP_NO_NEWS_MENTIONS,
            ]
        );
    }

    #[test]
    fn test_fuse_derived_scores() {
        let mut dossier = CompanyDossier::empty(Uuid::new_v4(), "Acme");
        dossier.website = Some(website(true, true));
        dossier.social = Some(social(&["linkedin", "facebook"]));
        dossier.news = Some(news(2));
        dossier.business = Some(business(3));

        fuse(&mut dossier);

        assert_eq!(dossier.digital_maturity_score, 70);
        assert_eq!(dossier.social_presence_score, 50);
        assert_eq!(dossier.reputation_score, 60);
        assert_eq!(dossier.opportunity_score, 45);
        assert_eq!(dossier.completeness_score, 100);
        assert!(dossier.gaps.is_empty());
    }

    #[test]
    fn test_fuse_defaults_without_news_and_business() {
        let mut dossier = CompanyDossier::empty(Uuid::new_v4(), "Acme");
        dossier.website = Some(website(false, false));

        fuse(&mut dossier);

        assert_eq!(dossier.reputation_score, 50);
        assert_eq!(dossier.opportunity_score, 0);
        assert_eq!(dossier.digital_maturity_score, 0);
        assert_eq!(dossier.completeness_score, 0);
        assert_eq!(dossier.gaps.len(), 5);
    }

    #[test]
    fn test_fuse_caps_uncapped_opportunity_score() {
        let mut dossier = CompanyDossier::empty(Uuid::new_v4(), "Acme");
        let mut b = business(2);
        // A collaborator reporting an uncapped score gets reined in.
        b.opportunity_score = 95;
        dossier.business = Some(b);

        fuse(&mut dossier);

        assert_eq!(dossier.opportunity_score, 30);
    }
}
