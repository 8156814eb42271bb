//! Typed builder for declarative redirect rules.
//!
//! Each blocked domain expands into eight scoped match patterns plus one
//! substring catch-all. All rules redirect top-level navigations to the
//! static block page.

use serde::{Deserialize, Serialize};

use super::block_page;

/// Priority of the eight scoped patterns.
pub const SCOPED_PRIORITY: u32 = 1;
/// The catch-all outranks the scoped patterns.
pub const CATCH_ALL_PRIORITY: u32 = 2;
/// Rules emitted per domain.
pub const RULES_PER_DOMAIN: usize = 9;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectRule {
    pub id: u32,
    pub priority: u32,
    pub action: RuleAction,
    pub condition: RuleCondition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RuleAction {
    Redirect { redirect: RedirectTarget },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectTarget {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    pub url_filter: String,
    pub resource_types: Vec<ResourceType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    MainFrame,
}

/// The eight scoped patterns for `domain`: bare and `*.` subdomain forms,
/// each with a path, exact, query and fragment suffix.
pub fn url_patterns(domain: &str) -> [String; 8] {
    [
        format!("*://{domain}/*"),
        format!("*://*.{domain}/*"),
        format!("*://{domain}"),
        format!("*://*.{domain}"),
        format!("*://{domain}?*"),
        format!("*://*.{domain}?*"),
        format!("*://{domain}#*"),
        format!("*://*.{domain}#*"),
    ]
}

/// Substring pattern matching `domain` anywhere in the URL.
pub fn catch_all_pattern(domain: &str) -> String {
    format!("*{domain}*")
}

fn redirect_rule(id: u32, priority: u32, url_filter: String, target: &str) -> RedirectRule {
    RedirectRule {
        id,
        priority,
        action: RuleAction::Redirect {
            redirect: RedirectTarget {
                url: target.to_string(),
            },
        },
        condition: RuleCondition {
            url_filter,
            resource_types: vec![ResourceType::MainFrame],
        },
    }
}

/// Build the full rule list for `domains`, numbering ids from `first_id`.
pub fn build_rules<'a, I>(domains: I, first_id: u32) -> Vec<RedirectRule>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut rules = Vec::new();
    let mut next_id = first_id;
    let mut take_id = || {
        let id = next_id;
        next_id = next_id.saturating_add(1);
        id
    };

    for domain in domains {
        let target = block_page::redirect_url(domain);
        for pattern in url_patterns(domain) {
            rules.push(redirect_rule(take_id(), SCOPED_PRIORITY, pattern, &target));
        }
        rules.push(redirect_rule(
            take_id(),
            CATCH_ALL_PRIORITY,
            catch_all_pattern(domain),
            &target,
        ));
    }
    rules
}
