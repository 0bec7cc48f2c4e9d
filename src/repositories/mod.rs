//! Storage collaborator for companies, products and damage records.
//!
//! Everything above this layer talks to `Arc<dyn Store>`. Two backends are
//! provided: [`SeaOrmStore`] for SQLite/Postgres and [`InMemoryStore`] for
//! tests and throwaway runs.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Company, DamageRecord, Product};

pub mod memory_store;
pub mod sea_orm_store;

pub use memory_store::InMemoryStore;
pub use sea_orm_store::SeaOrmStore;

/// Storage errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("{entity} '{id}' does not exist")]
    Missing { entity: &'static str, id: String },
}

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Document-style store.
///
/// Companies and products are listed in display-id order, comparing the
/// numeric suffix (`C2` before `C10`). Damage records are listed by creation
/// time. Both backends follow the same ordering.
#[async_trait]
pub trait Store: Send + Sync {
    async fn companies(&self) -> Result<Vec<Company>, StoreError>;
    async fn company(&self, id: &str) -> Result<Option<Company>, StoreError>;
    async fn insert_companies(&self, companies: &[Company]) -> Result<(), StoreError>;
    async fn update_company(&self, company: &Company) -> Result<(), StoreError>;
    /// Returns whether a record was removed.
    async fn delete_company(&self, id: &str) -> Result<bool, StoreError>;

    async fn products(&self) -> Result<Vec<Product>, StoreError>;
    async fn product(&self, id: &str) -> Result<Option<Product>, StoreError>;
    async fn insert_products(&self, products: &[Product]) -> Result<(), StoreError>;
    async fn update_product(&self, product: &Product) -> Result<(), StoreError>;
    async fn delete_product(&self, id: &str) -> Result<bool, StoreError>;

    async fn damage_records(&self) -> Result<Vec<DamageRecord>, StoreError>;
    async fn damage_record(&self, id: Uuid) -> Result<Option<DamageRecord>, StoreError>;
    async fn insert_damage_records(&self, records: &[DamageRecord]) -> Result<(), StoreError>;
    async fn update_damage_record(&self, record: &DamageRecord) -> Result<(), StoreError>;

    /// Highest id suffix ever allocated under `prefix`, deleted rows included.
    async fn id_high_water(&self, prefix: &str) -> Result<Option<u64>, StoreError>;
    /// Raises the mark for `prefix` to `value`; a lower value is ignored.
    async fn raise_id_high_water(&self, prefix: &str, value: u64) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

// Display ids share a prefix, so shorter ids were allocated first ("C9" < "C10").
pub(crate) fn sort_by_display_id<T>(rows: &mut [T], id: impl Fn(&T) -> &str) {
    rows.sort_by(|a, b| {
        let (a, b) = (id(a), id(b));
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    });
}

pub type SharedStore = Arc<dyn Store>;

/// Opens the backend selected by `storage_backend`, running migrations first
/// when `auto_migrate` is set on a database backend.
pub async fn open_store(config: &crate::config::AppConfig) -> Result<SharedStore, StoreError> {
    if config.uses_in_memory_store() {
        tracing::warn!("using in-memory storage; data is lost on exit");
        return Ok(Arc::new(InMemoryStore::new()));
    }

    let pool = crate::db::establish_connection_with_config(&crate::db::DbConfig::from(config))
        .await?;
    if config.auto_migrate {
        crate::db::run_migrations(&pool).await?;
    }
    Ok(Arc::new(SeaOrmStore::new(Arc::new(pool))))
}
