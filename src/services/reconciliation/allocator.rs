//! Sequential display ids (`C1`, `C2`, ... / `P1`, `P2`, ...).

use tracing::warn;

use crate::repositories::{Store, StoreError};

/// Entity families that receive display ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdFamily {
    Company,
    Product,
}

impl IdFamily {
    pub fn prefix(self) -> &'static str {
        match self {
            IdFamily::Company => "C",
            IdFamily::Product => "P",
        }
    }
}

/// Numeric suffix of `id` when it is `prefix` followed by digits only.
pub fn parse_suffix(prefix: &str, id: &str) -> Option<u64> {
    let digits = id.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// `prefix + (max + 1)`, or `prefix + "1"` for an empty family.
pub fn next_id(prefix: &str, current_max: Option<u64>) -> String {
    format!("{}{}", prefix, current_max.map_or(1, |max| max + 1))
}

/// Batch-scoped allocator. Seeded once from the loaded snapshot and the
/// stored high-water mark, then incremented in memory so a batch never
/// re-queries storage.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    family: IdFamily,
    current_max: Option<u64>,
    issued: usize,
}

impl IdAllocator {
    pub fn new(family: IdFamily) -> Self {
        Self {
            family,
            current_max: None,
            issued: 0,
        }
    }

    /// Seeds from existing ids. Ids without the family prefix and a numeric
    /// suffix are skipped.
    pub fn seeded<'a, I>(family: IdFamily, existing: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let prefix = family.prefix();
        let current_max = existing
            .into_iter()
            .filter_map(|id| {
                let parsed = parse_suffix(prefix, id);
                if parsed.is_none() {
                    warn!(id, prefix, "ignoring id without a numeric suffix while seeding allocator");
                }
                parsed
            })
            .max();
        Self {
            family,
            current_max,
            issued: 0,
        }
    }

    /// Never allocates at or below `mark`. Ids of deleted rows stay retired
    /// because the mark outlives them.
    pub fn with_floor(mut self, mark: Option<u64>) -> Self {
        self.current_max = self.current_max.max(mark);
        self
    }

    pub fn current_max(&self) -> Option<u64> {
        self.current_max
    }

    pub fn allocate(&mut self) -> String {
        let id = next_id(self.family.prefix(), self.current_max);
        self.current_max = Some(self.current_max.map_or(1, |max| max + 1));
        self.issued += 1;
        id
    }

    /// Raises the stored high-water mark past every id this allocator issued.
    /// Call after the allocated rows are persisted.
    pub async fn commit(&self, store: &dyn Store) -> Result<(), StoreError> {
        match self.current_max {
            Some(max) if self.issued > 0 => {
                store.raise_id_high_water(self.family.prefix(), max).await
            }
            _ => Ok(()),
        }
    }
}

/// Raises the stored mark to `id`'s suffix before the row is deleted, so the
/// id stays retired even when it predates the mark.
pub async fn retire_id(store: &dyn Store, family: IdFamily, id: &str) -> Result<(), StoreError> {
    match parse_suffix(family.prefix(), id) {
        Some(suffix) => store.raise_id_high_water(family.prefix(), suffix).await,
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("C", "C9", Some(9))]
    #[case("C", "C10", Some(10))]
    #[case("P", "P007", Some(7))]
    #[case("C", "P3", None)]
    #[case("C", "C", None)]
    #[case("C", "C1a", None)]
    #[case("C", "C-4", None)]
    #[case("C", "legacy-id", None)]
    fn parses_numeric_suffixes(
        #[case] prefix: &str,
        #[case] id: &str,
        #[case] expected: Option<u64>,
    ) {
        assert_eq!(parse_suffix(prefix, id), expected);
    }

    #[test]
    fn empty_family_starts_at_one() {
        assert_eq!(next_id("C", None), "C1");
        assert_eq!(IdAllocator::new(IdFamily::Product).allocate(), "P1");
    }

    #[test]
    fn suffixes_compare_numerically() {
        let mut allocator = IdAllocator::seeded(IdFamily::Company, ["C2", "C9", "C10", "C3"]);
        assert_eq!(allocator.current_max(), Some(10));
        assert_eq!(allocator.allocate(), "C11");
    }

    #[test]
    fn next_after_c9_is_c10() {
        let mut allocator = IdAllocator::seeded(IdFamily::Company, ["C1", "C9"]);
        assert_eq!(allocator.allocate(), "C10");
    }

    #[test]
    fn allocations_within_a_batch_never_collide() {
        let mut allocator = IdAllocator::seeded(IdFamily::Product, ["P4"]);
        let ids: Vec<_> = (0..3).map(|_| allocator.allocate()).collect();
        assert_eq!(ids, vec!["P5", "P6", "P7"]);
    }

    #[test]
    fn floor_skips_retired_ids() {
        let mut allocator = IdAllocator::seeded(IdFamily::Company, ["C1"]).with_floor(Some(2));
        assert_eq!(allocator.allocate(), "C3");

        let mut below = IdAllocator::seeded(IdFamily::Company, ["C5"]).with_floor(Some(2));
        assert_eq!(below.allocate(), "C6");
    }

    #[tokio::test]
    async fn commit_records_only_issued_ids() {
        let store = crate::repositories::InMemoryStore::new();
        let idle = IdAllocator::seeded(IdFamily::Product, ["P3"]);
        idle.commit(&store).await.unwrap();
        assert_eq!(store.id_high_water("P").await.unwrap(), None);

        let mut busy = IdAllocator::seeded(IdFamily::Product, ["P3"]);
        busy.allocate();
        busy.allocate();
        busy.commit(&store).await.unwrap();
        assert_eq!(store.id_high_water("P").await.unwrap(), Some(5));
    }

    #[test]
    fn foreign_ids_do_not_affect_seed() {
        let mut allocator = IdAllocator::seeded(IdFamily::Company, ["P99", "imported", "C2"]);
        assert_eq!(allocator.allocate(), "C3");
    }
}
