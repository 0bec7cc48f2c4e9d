//! In-memory views of stored state, loaded once per batch and updated as
//! writes are staged so later records see earlier ones.

use std::collections::{HashMap, HashSet};

use crate::models::{Company, DamageKey, DamageRecord, Product};

/// Company name -> company id.
#[derive(Debug, Default)]
pub struct CompanyIndex {
    by_name: HashMap<String, String>,
}

impl CompanyIndex {
    pub fn from_companies(companies: &[Company]) -> Self {
        Self {
            by_name: companies
                .iter()
                .map(|c| (c.name.clone(), c.id.clone()))
                .collect(),
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn id_for(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn insert(&mut self, company: &Company) {
        self.by_name.insert(company.name.clone(), company.id.clone());
    }
}

/// Handle to a product slot inside a [`ProductIndex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotState {
    Existing,
    Created,
    Updated,
}

#[derive(Debug)]
struct Slot {
    product: Product,
    state: SlotState,
}

/// Arena of products keyed by `(company_id, name)`.
///
/// Each slot remembers whether it was loaded, created in this batch or
/// updated in this batch. A created product that later receives more lines
/// stays created.
#[derive(Debug, Default)]
pub struct ProductIndex {
    slots: Vec<Slot>,
    by_key: HashMap<(String, String), SlotId>,
    created: Vec<SlotId>,
    updated: Vec<SlotId>,
}

impl ProductIndex {
    pub fn from_products(products: Vec<Product>) -> Self {
        let mut index = Self::default();
        for product in products {
            index.push(product, SlotState::Existing);
        }
        index
    }

    fn push(&mut self, product: Product, state: SlotState) -> SlotId {
        let id = SlotId(self.slots.len());
        self.by_key
            .insert((product.company_id.clone(), product.name.clone()), id);
        self.slots.push(Slot { product, state });
        id
    }

    pub fn lookup(&self, company_id: &str, name: &str) -> Option<SlotId> {
        self.by_key
            .get(&(company_id.to_string(), name.to_string()))
            .copied()
    }

    pub fn get(&self, slot: SlotId) -> &Product {
        &self.slots[slot.0].product
    }

    pub fn find(&self, company_id: &str, name: &str) -> Option<&Product> {
        self.lookup(company_id, name).map(|slot| self.get(slot))
    }

    pub fn stage_created(&mut self, product: Product) -> SlotId {
        let slot = self.push(product, SlotState::Created);
        self.created.push(slot);
        slot
    }

    /// Mutable access for a merge; marks a loaded product as updated.
    pub fn stage_updated(&mut self, slot: SlotId) -> &mut Product {
        let entry = &mut self.slots[slot.0];
        if entry.state == SlotState::Existing {
            entry.state = SlotState::Updated;
            self.updated.push(slot);
        }
        &mut entry.product
    }

    /// Products created in this batch, in creation order.
    pub fn created(&self) -> Vec<Product> {
        self.created
            .iter()
            .map(|slot| self.get(*slot).clone())
            .collect()
    }

    /// Loaded products modified in this batch, in first-modification order.
    pub fn updated(&self) -> Vec<Product> {
        self.updated
            .iter()
            .map(|slot| self.get(*slot).clone())
            .collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.slots.iter().map(|slot| slot.product.id.as_str())
    }
}

/// Set of damage record keys, released records included.
#[derive(Debug, Default)]
pub struct DamageIndex {
    keys: HashSet<DamageKey>,
}

impl DamageIndex {
    pub fn from_records(records: &[DamageRecord]) -> Self {
        Self {
            keys: records.iter().map(DamageRecord::key).collect(),
        }
    }

    pub fn contains(&self, key: &DamageKey) -> bool {
        self.keys.contains(key)
    }

    pub fn insert(&mut self, key: DamageKey) {
        self.keys.insert(key);
    }
}
