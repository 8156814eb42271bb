//! Host network-filtering facility and the rule-set replacement routine.

use super::blocklist::Blocklist;
use super::rules::{build_rules, RedirectRule};
use crate::error::RuleError;
use crate::storage::{self, keys, Store};

/// The host's dynamic rule table.
///
/// `update_dynamic_rules` applies removals before additions as one update,
/// the same contract the browser facility offers.
pub trait RuleSink {
    fn dynamic_rules(&self) -> Result<Vec<RedirectRule>, RuleError>;
    fn update_dynamic_rules(
        &mut self,
        remove_rule_ids: &[u32],
        add_rules: Vec<RedirectRule>,
    ) -> Result<(), RuleError>;
}

fn apply_update(
    table: &mut Vec<RedirectRule>,
    remove_rule_ids: &[u32],
    add_rules: Vec<RedirectRule>,
) -> Result<(), RuleError> {
    let mut next: Vec<RedirectRule> = table
        .iter()
        .filter(|r| !remove_rule_ids.contains(&r.id))
        .cloned()
        .collect();
    for rule in add_rules {
        if next.iter().any(|r| r.id == rule.id) {
            return Err(RuleError::DuplicateId(rule.id));
        }
        next.push(rule);
    }
    *table = next;
    Ok(())
}

/// In-memory rule table. Records every update for inspection.
#[derive(Debug, Default)]
pub struct MemoryRuleTable {
    rules: Vec<RedirectRule>,
    updates: Vec<(Vec<u32>, usize)>,
}

impl MemoryRuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(removed ids, added count)` for each update applied so far.
    pub fn updates(&self) -> &[(Vec<u32>, usize)] {
        &self.updates
    }
}

impl RuleSink for MemoryRuleTable {
    fn dynamic_rules(&self) -> Result<Vec<RedirectRule>, RuleError> {
        Ok(self.rules.clone())
    }

    fn update_dynamic_rules(
        &mut self,
        remove_rule_ids: &[u32],
        add_rules: Vec<RedirectRule>,
    ) -> Result<(), RuleError> {
        let added = add_rules.len();
        apply_update(&mut self.rules, remove_rule_ids, add_rules)?;
        self.updates.push((remove_rule_ids.to_vec(), added));
        Ok(())
    }
}

/// Rule table persisted under [`keys::DYNAMIC_RULES`], so separate
/// processes see the same installed set.
pub struct StoredRuleTable<S: Store> {
    store: S,
}

impl<S: Store> StoredRuleTable<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: Store> RuleSink for StoredRuleTable<S> {
    fn dynamic_rules(&self) -> Result<Vec<RedirectRule>, RuleError> {
        Ok(storage::read(&self.store, keys::DYNAMIC_RULES)?.unwrap_or_default())
    }

    fn update_dynamic_rules(
        &mut self,
        remove_rule_ids: &[u32],
        add_rules: Vec<RedirectRule>,
    ) -> Result<(), RuleError> {
        let mut table = self.dynamic_rules()?;
        apply_update(&mut table, remove_rule_ids, add_rules)?;
        storage::write(&self.store, keys::DYNAMIC_RULES, &table)?;
        Ok(())
    }
}

/// Replace the installed rule set with the one `blocklist` calls for.
///
/// Every existing rule id is removed and, when blocking is active, the full
/// new list is added in the same update. Returns the number of rules now
/// installed.
pub fn sync_rules(
    sink: &mut impl RuleSink,
    blocklist: &Blocklist,
    first_id: u32,
) -> Result<usize, RuleError> {
    let existing: Vec<u32> = sink.dynamic_rules()?.iter().map(|r| r.id).collect();
    let new_rules = if blocklist.is_active() {
        build_rules(blocklist.domains(), first_id)
    } else {
        Vec::new()
    };
    let count = new_rules.len();

    tracing::debug!(
        removing = existing.len(),
        adding = count,
        enabled = blocklist.is_enabled(),
        "replacing dynamic rules"
    );
    sink.update_dynamic_rules(&existing, new_rules)?;
    Ok(count)
}
