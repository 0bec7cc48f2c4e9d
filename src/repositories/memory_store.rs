use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{sort_by_display_id, Store, StoreError};
use crate::models::{Company, DamageRecord, Product};

#[derive(Debug, Default)]
struct Collections {
    companies: Vec<Company>,
    products: Vec<Product>,
    damage_records: Vec<DamageRecord>,
    id_marks: HashMap<String, u64>,
}

/// In-memory store. Collections are kept in insertion order and sorted on
/// read to the ordering documented on [`Store`].
///
/// Key constraints mirror the SQL schema so both backends reject the same
/// writes: unique company ids and names, unique product ids and
/// `(company_id, name)` pairs, unique damage record ids.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unique_violation(what: &str, value: &str) -> StoreError {
    StoreError::Backend(format!("unique constraint violated: {} '{}'", what, value))
}

#[async_trait]
impl Store for InMemoryStore {
    async fn companies(&self) -> Result<Vec<Company>, StoreError> {
        let mut rows = self.inner.read().await.companies.clone();
        sort_by_display_id(&mut rows, |c| c.id.as_str());
        Ok(rows)
    }

    async fn company(&self, id: &str) -> Result<Option<Company>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.companies.iter().find(|c| c.id == id).cloned())
    }

    async fn insert_companies(&self, companies: &[Company]) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        for (i, company) in companies.iter().enumerate() {
            let earlier = &companies[..i];
            if inner.companies.iter().chain(earlier).any(|c| c.id == company.id) {
                return Err(unique_violation("companies.id", &company.id));
            }
            if inner.companies.iter().chain(earlier).any(|c| c.name == company.name) {
                return Err(unique_violation("companies.name", &company.name));
            }
        }
        inner.companies.extend_from_slice(companies);
        Ok(())
    }

    async fn update_company(&self, company: &Company) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .companies
            .iter()
            .any(|c| c.id != company.id && c.name == company.name)
        {
            return Err(unique_violation("companies.name", &company.name));
        }
        let slot = inner
            .companies
            .iter_mut()
            .find(|c| c.id == company.id)
            .ok_or_else(|| StoreError::Missing {
                entity: "company",
                id: company.id.clone(),
            })?;
        *slot = company.clone();
        Ok(())
    }

    async fn delete_company(&self, id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.companies.len();
        inner.companies.retain(|c| c.id != id);
        Ok(inner.companies.len() != before)
    }

    async fn products(&self) -> Result<Vec<Product>, StoreError> {
        let mut rows = self.inner.read().await.products.clone();
        sort_by_display_id(&mut rows, |p| p.id.as_str());
        Ok(rows)
    }

    async fn product(&self, id: &str) -> Result<Option<Product>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.products.iter().find(|p| p.id == id).cloned())
    }

    async fn insert_products(&self, products: &[Product]) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        for (i, product) in products.iter().enumerate() {
            let earlier = &products[..i];
            if inner.products.iter().chain(earlier).any(|p| p.id == product.id) {
                return Err(unique_violation("products.id", &product.id));
            }
            if inner
                .products
                .iter()
                .chain(earlier)
                .any(|p| p.company_id == product.company_id && p.name == product.name)
            {
                return Err(unique_violation("products.(company_id, name)", &product.name));
            }
        }
        inner.products.extend_from_slice(products);
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        if inner.products.iter().any(|p| {
            p.id != product.id && p.company_id == product.company_id && p.name == product.name
        }) {
            return Err(unique_violation("products.(company_id, name)", &product.name));
        }
        let slot = inner
            .products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or_else(|| StoreError::Missing {
                entity: "product",
                id: product.id.clone(),
            })?;
        *slot = product.clone();
        Ok(())
    }

    async fn delete_product(&self, id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.products.len();
        inner.products.retain(|p| p.id != id);
        Ok(inner.products.len() != before)
    }

    async fn damage_records(&self) -> Result<Vec<DamageRecord>, StoreError> {
        let mut rows = self.inner.read().await.damage_records.clone();
        rows.sort_by_key(|d| d.created_at);
        Ok(rows)
    }

    async fn damage_record(&self, id: Uuid) -> Result<Option<DamageRecord>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.damage_records.iter().find(|d| d.id == id).cloned())
    }

    async fn insert_damage_records(&self, records: &[DamageRecord]) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        for (i, record) in records.iter().enumerate() {
            if inner
                .damage_records
                .iter()
                .chain(&records[..i])
                .any(|d| d.id == record.id)
            {
                return Err(unique_violation("damage_records.id", &record.id.to_string()));
            }
        }
        inner.damage_records.extend_from_slice(records);
        Ok(())
    }

    async fn update_damage_record(&self, record: &DamageRecord) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let slot = inner
            .damage_records
            .iter_mut()
            .find(|d| d.id == record.id)
            .ok_or_else(|| StoreError::Missing {
                entity: "damage record",
                id: record.id.to_string(),
            })?;
        *slot = record.clone();
        Ok(())
    }

    async fn id_high_water(&self, prefix: &str) -> Result<Option<u64>, StoreError> {
        Ok(self.inner.read().await.id_marks.get(prefix).copied())
    }

    async fn raise_id_high_water(&self, prefix: &str, value: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let mark = inner.id_marks.entry(prefix.to_string()).or_insert(value);
        *mark = (*mark).max(value);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
