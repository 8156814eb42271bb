//! Website blocking: the blocklist, the redirect rule builder and the
//! routine that installs rules into the host.

pub mod block_page;
mod blocklist;
pub mod rules;
mod sink;

pub use blocklist::{is_valid, normalize, BlockedUrlEntry, Blocklist, DEFAULT_BLOCKED};
pub use rules::{build_rules, RedirectRule, RULES_PER_DOMAIN};
pub use sink::{sync_rules, MemoryRuleTable, RuleSink, StoredRuleTable};
