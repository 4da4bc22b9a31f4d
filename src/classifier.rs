//! Campaign classification with ordered rule tables
//!
//! Both tables are evaluated top-down and the first matching rule wins. Several
//! rules overlap (a spotlight send's name also looks like a newsletter issue),
//! so the order of the entries is part of their meaning.

use crate::models::{CampaignRecord, ClassifiedCampaign, EmailType};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// One entry in the email type table
struct TypeRule {
    name: &'static str,
    matches: fn(&CampaignRecord) -> bool,
    email_type: EmailType,
}

/// Ordered email type rules. Do not reorder.
static EMAIL_TYPE_RULES: &[TypeRule] = &[
    TypeRule {
        name: "blast-label-or-name",
        matches: is_labelled_or_named_blast,
        email_type: EmailType::Blast,
    },
    TypeRule {
        name: "welcome-series-label",
        matches: is_labelled_welcome_series,
        email_type: EmailType::WelcomeSeries,
    },
    TypeRule {
        name: "welcome-list-days-name",
        matches: is_welcome_list_days_send,
        email_type: EmailType::WelcomeSeries,
    },
    TypeRule {
        name: "dive-iversary",
        matches: is_dive_iversary,
        email_type: EmailType::Audience,
    },
    TypeRule {
        name: "update-profile-list",
        matches: is_update_profile_list,
        email_type: EmailType::Audience,
    },
    TypeRule {
        name: "linkedin-list-and-name",
        matches: is_linkedin_send,
        email_type: EmailType::Audience,
    },
    // Spotlight names start with "Issue: " too, so this has to come before
    // the newsletter rule.
    TypeRule {
        name: "spotlight-label",
        matches: is_labelled_spotlight,
        email_type: EmailType::Spotlight,
    },
    TypeRule {
        name: "weekender-list-or-name",
        matches: is_weekender,
        email_type: EmailType::Weekender,
    },
    TypeRule {
        name: "newsletter-label-or-issue-name",
        matches: is_newsletter,
        email_type: EmailType::Newsletter,
    },
    TypeRule {
        name: "blast-list",
        matches: is_blast_list,
        email_type: EmailType::Blast,
    },
    TypeRule {
        name: "breaking-subject",
        matches: is_breaking_news,
        email_type: EmailType::BreakingNews,
    },
    TypeRule {
        name: "supply-chain-operations-issue",
        matches: is_supply_chain_operations_issue,
        email_type: EmailType::Newsletter,
    },
];

fn is_labelled_or_named_blast(c: &CampaignRecord) -> bool {
    c.has_label("Blast") || c.name().contains("-blast-")
}

fn is_labelled_welcome_series(c: &CampaignRecord) -> bool {
    c.has_label("Welcome Series")
}

fn is_welcome_list_days_send(c: &CampaignRecord) -> bool {
    c.list_name().contains("Welcome") && c.name().to_lowercase().contains(" days ")
}

fn is_dive_iversary(c: &CampaignRecord) -> bool {
    c.subject().contains("Dive-iversary") || c.list_name().contains("Dive-iversary")
}

fn is_update_profile_list(c: &CampaignRecord) -> bool {
    c.list_name().contains("update profile")
}

fn is_linkedin_send(c: &CampaignRecord) -> bool {
    c.list_name().to_lowercase().contains("linkedin") && c.name().to_lowercase().contains("linkedin")
}

fn is_labelled_spotlight(c: &CampaignRecord) -> bool {
    c.has_label("spotlight-newsletter")
}

fn is_weekender(c: &CampaignRecord) -> bool {
    c.list_name().ends_with("Weekender") || c.name().starts_with("Newsletter Weekly Roundup")
}

fn is_newsletter(c: &CampaignRecord) -> bool {
    c.has_label("newsletter") || c.name().starts_with("Issue: ")
}

fn is_blast_list(c: &CampaignRecord) -> bool {
    c.list_name().to_lowercase().ends_with("blast list")
}

fn is_breaking_news(c: &CampaignRecord) -> bool {
    c.subject().starts_with("BREAKING")
}

fn is_supply_chain_operations_issue(c: &CampaignRecord) -> bool {
    c.list_name() == "Supply Chain Dive: Operations" && c.name().contains("Issue")
}

/// Classify a campaign into one of the [`EmailType`] categories.
///
/// Never fails; campaigns that match no rule are [`EmailType::Unknown`].
pub fn classify(campaign: &CampaignRecord) -> EmailType {
    classify_with_rule(campaign).0
}

/// Classify a campaign and report the name of the rule that matched
pub fn classify_with_rule(campaign: &CampaignRecord) -> (EmailType, Option<&'static str>) {
    EMAIL_TYPE_RULES
        .iter()
        .find(|rule| (rule.matches)(campaign))
        .map(|rule| (rule.email_type, Some(rule.name)))
        .unwrap_or((EmailType::Unknown, None))
}

/// Regular blast lists, plus the "<pub> and sub pubs Blast List" lists some
/// spotlights go out to
static BLAST_LIST_SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"( and sub pubs)? [Bb]last [Ll]ist$").unwrap());

static WEEKENDER_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r" [Ww]eekender$").unwrap());

/// One entry in the publication table
struct PublicationRule {
    email_types: &'static [EmailType],
    /// Lowercase suffix the list name must end with, if any
    list_suffix: Option<&'static str>,
    /// Pattern removed from the list name; `None` keeps the list name as is
    strip: Option<&'static Lazy<Regex>>,
}

impl PublicationRule {
    fn applies(&self, email_type: EmailType, list_lower: &str) -> bool {
        self.email_types.contains(&email_type)
            && self.list_suffix.map_or(true, |suffix| list_lower.ends_with(suffix))
    }

    fn publication(&self, list_name: &str) -> String {
        match self.strip {
            Some(pattern) => pattern.replace(list_name, "").into_owned(),
            None => list_name.to_string(),
        }
    }
}

/// Ordered publication rules. Do not reorder.
static PUBLICATION_RULES: &[PublicationRule] = &[
    PublicationRule {
        email_types: &[EmailType::Blast, EmailType::Spotlight],
        list_suffix: Some("blast list"),
        strip: Some(&BLAST_LIST_SUFFIX),
    },
    PublicationRule {
        email_types: &[EmailType::Weekender],
        list_suffix: Some("weekender"),
        strip: Some(&WEEKENDER_SUFFIX),
    },
    PublicationRule {
        email_types: &[EmailType::Newsletter],
        list_suffix: None,
        strip: None,
    },
];

/// Infer the publication (e.g. "Healthcare Dive" or "Education Dive: Higher Ed")
/// from the campaign's list name.
///
/// The email type is computed when not supplied. Returns `None` when the list
/// name carries no recognised publication.
pub fn resolve_publication(campaign: &CampaignRecord, email_type: Option<EmailType>) -> Option<String> {
    let email_type = email_type.unwrap_or_else(|| classify(campaign));
    let list_lower = campaign.list_name().to_lowercase();

    PUBLICATION_RULES
        .iter()
        .find(|rule| rule.applies(email_type, &list_lower))
        .map(|rule| rule.publication(campaign.list_name()))
}

/// Attach email type and publication to a campaign
pub fn annotate(campaign: CampaignRecord) -> ClassifiedCampaign {
    let email_type = classify(&campaign);
    let publication = resolve_publication(&campaign, Some(email_type));

    ClassifiedCampaign {
        campaign,
        email_type,
        publication,
    }
}

/// Count campaigns per email type
pub fn tally_by_type(campaigns: &[ClassifiedCampaign]) -> BTreeMap<EmailType, usize> {
    let mut counts = BTreeMap::new();
    for campaign in campaigns {
        *counts.entry(campaign.email_type).or_insert(0) += 1;
    }
    counts
}
