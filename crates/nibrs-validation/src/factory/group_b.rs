//! Group B arrest report rules

use super::push_header_rules;
use crate::rules::RuleSet;
use nibrs_model::GroupBArrest;

/// Report-level rules for a Group B arrest; its arrestees have their own set.
#[must_use]
pub fn rules() -> RuleSet<GroupBArrest> {
    let mut rules = RuleSet::new();
    push_header_rules(&mut rules, |b: &GroupBArrest| &b.header);
    rules
}
