//! Duplicate detection. Pure predicates over the batch snapshots.

use super::snapshot::{CompanyIndex, DamageIndex, ProductIndex, SlotId};
use crate::models::{DamageKey, DetailLine};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    New,
    /// Existing product that does not yet carry the incoming line.
    Mergeable(SlotId),
    Duplicate,
}

/// Companies have no merge path: an exact name match is a duplicate.
pub fn classify_company(index: &CompanyIndex, name: &str) -> Match {
    if index.contains(name) {
        Match::Duplicate
    } else {
        Match::New
    }
}

pub fn classify_detail(
    index: &ProductIndex,
    company_id: &str,
    product_name: &str,
    line: &DetailLine,
) -> Match {
    match index.lookup(company_id, product_name) {
        None => Match::New,
        Some(slot) if index.get(slot).has_line(line) => Match::Duplicate,
        Some(slot) => Match::Mergeable(slot),
    }
}

pub fn classify_damage(index: &DamageIndex, key: &DamageKey) -> Match {
    if index.contains(key) {
        Match::Duplicate
    } else {
        Match::New
    }
}
