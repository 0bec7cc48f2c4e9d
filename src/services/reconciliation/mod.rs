//! Bulk reconciliation of incoming companies, products and damage records
//! against stored state.
//!
//! A batch loads its snapshots once, classifies every record in input order,
//! stages inserts and merges in memory, then persists: staged inserts as one
//! bulk insert, staged updates one by one. There is no rollback; a storage
//! failure part way through leaves earlier writes in place.

pub mod allocator;
pub mod matcher;
pub mod merge;
pub mod outcome;
pub mod records;
pub mod snapshot;

use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{info, instrument, warn};

use crate::errors::ServiceError;
use crate::models::{Company, DamageKey, DamageRecord, Product};
use crate::repositories::Store;

pub use allocator::{IdAllocator, IdFamily};
pub use matcher::Match;
pub use outcome::{
    CompanyDuplicate, CompanyImportResponse, DamageDuplicate, DamageImportResponse,
    ImportMessage, ImportOutcome, ProductDuplicate, ProductImportResponse,
};
pub use records::{IncomingCompany, IncomingDamageRecord, IncomingProductLine};
use snapshot::{CompanyIndex, DamageIndex, ProductIndex};

/// When batch references (company, product) are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceValidation {
    /// Resolve every reference before classifying anything; a missing
    /// reference fails the batch with no writes.
    #[default]
    Upfront,
    /// Resolve references as records are processed; on the first missing
    /// reference, writes staged so far are persisted and the batch fails.
    Interleaved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum EntityKind {
    Companies,
    Products,
    DamageRecords,
}

/// Orchestrates one import batch per call. Holds no state between calls.
#[derive(Clone)]
pub struct BatchReconciler {
    store: Arc<dyn Store>,
    reference_validation: ReferenceValidation,
    max_batch_size: usize,
}

fn missing_company(name: &str) -> ServiceError {
    ServiceError::ReferenceNotFound(format!("company '{}' does not exist", name))
}

fn resolve_company(companies: &CompanyIndex, name: &str) -> Result<String, ServiceError> {
    companies
        .id_for(name)
        .map(str::to_string)
        .ok_or_else(|| missing_company(name))
}

fn resolve_product(
    companies: &CompanyIndex,
    products: &ProductIndex,
    record: &IncomingDamageRecord,
) -> Result<(String, String), ServiceError> {
    let company_id = resolve_company(companies, &record.company_name)?;
    let product = products
        .find(&company_id, &record.product_name)
        .ok_or_else(|| {
            ServiceError::ReferenceNotFound(format!(
                "product '{}' does not exist for company '{}'",
                record.product_name, record.company_name
            ))
        })?;
    let product_id = product.id.clone();
    Ok((company_id, product_id))
}

fn record_outcomes(entity: &'static str, created: usize, updated: usize, duplicates: usize) {
    counter!("stockroom_import_records_total", created as u64, "entity" => entity, "outcome" => "created");
    counter!("stockroom_import_records_total", updated as u64, "entity" => entity, "outcome" => "updated");
    counter!("stockroom_import_records_total", duplicates as u64, "entity" => entity, "outcome" => "duplicate");
}

fn record_failure(entity: &'static str, err: &ServiceError) {
    counter!("stockroom_import_failures_total", 1, "entity" => entity, "kind" => err.kind());
}

impl BatchReconciler {
    pub fn new(
        store: Arc<dyn Store>,
        reference_validation: ReferenceValidation,
        max_batch_size: usize,
    ) -> Self {
        Self {
            store,
            reference_validation,
            max_batch_size,
        }
    }

    pub fn reference_validation(&self) -> ReferenceValidation {
        self.reference_validation
    }

    /// Dispatches on `kind`; used where the kind is only known at runtime.
    pub async fn reconcile(
        &self,
        kind: EntityKind,
        payload: Value,
    ) -> Result<ImportOutcome, ServiceError> {
        Ok(match kind {
            EntityKind::Companies => ImportOutcome::Companies(self.import_companies(payload).await?),
            EntityKind::Products => ImportOutcome::Products(self.import_products(payload).await?),
            EntityKind::DamageRecords => {
                ImportOutcome::DamageRecords(self.import_damage_records(payload).await?)
            }
        })
    }

    #[instrument(skip(self, payload))]
    pub async fn import_companies(
        &self,
        payload: Value,
    ) -> Result<CompanyImportResponse, ServiceError> {
        let result = self.reconcile_companies(payload).await;
        if let Err(err) = &result {
            record_failure("companies", err);
        }
        result
    }

    async fn reconcile_companies(
        &self,
        payload: Value,
    ) -> Result<CompanyImportResponse, ServiceError> {
        let records: Vec<IncomingCompany> = records::parse_batch(payload, self.max_batch_size)?;

        let existing = self.store.companies().await?;
        let mark = self.store.id_high_water(IdFamily::Company.prefix()).await?;
        let mut index = CompanyIndex::from_companies(&existing);
        let mut allocator =
            IdAllocator::seeded(IdFamily::Company, existing.iter().map(|c| c.id.as_str()))
                .with_floor(mark);

        let mut created = Vec::new();
        let mut duplicates = Vec::new();
        for record in records {
            match matcher::classify_company(&index, &record.company_name) {
                Match::Duplicate => duplicates.push(CompanyDuplicate {
                    company_name: record.company_name,
                    is_duplicate: true,
                }),
                Match::New | Match::Mergeable(_) => {
                    let company = Company::new(allocator.allocate(), record.company_name);
                    index.insert(&company);
                    created.push(company);
                }
            }
        }

        self.store.insert_companies(&created).await?;
        allocator.commit(self.store.as_ref()).await?;

        info!(
            created = created.len(),
            duplicates = duplicates.len(),
            "company batch reconciled"
        );
        record_outcomes("companies", created.len(), 0, duplicates.len());

        Ok(CompanyImportResponse {
            message: ImportMessage::from_writes(!created.is_empty()),
            new_companies: created,
            duplicates,
        })
    }

    #[instrument(skip(self, payload))]
    pub async fn import_products(
        &self,
        payload: Value,
    ) -> Result<ProductImportResponse, ServiceError> {
        let result = self.reconcile_products(payload).await;
        if let Err(err) = &result {
            record_failure("products", err);
        }
        result
    }

    async fn reconcile_products(
        &self,
        payload: Value,
    ) -> Result<ProductImportResponse, ServiceError> {
        let lines: Vec<IncomingProductLine> = records::parse_batch(payload, self.max_batch_size)?;

        let companies = CompanyIndex::from_companies(&self.store.companies().await?);
        if self.reference_validation == ReferenceValidation::Upfront {
            for line in &lines {
                resolve_company(&companies, &line.company_name)?;
            }
        }

        let mut products = ProductIndex::from_products(self.store.products().await?);
        let mark = self.store.id_high_water(IdFamily::Product.prefix()).await?;
        let mut allocator = IdAllocator::seeded(IdFamily::Product, products.ids()).with_floor(mark);

        let mut duplicates = Vec::new();
        for line in lines {
            let company_id = match resolve_company(&companies, &line.company_name) {
                Ok(id) => id,
                Err(err) => {
                    self.persist_products(&products, &allocator).await?;
                    warn!(error = %err, "product batch partially applied before a missing reference");
                    return Err(err);
                }
            };

            let detail = line.detail_line();
            match matcher::classify_detail(&products, &company_id, &line.product_name, &detail) {
                Match::New => {
                    let product = Product::new(
                        allocator.allocate(),
                        line.product_name,
                        company_id,
                        vec![detail],
                    );
                    products.stage_created(product);
                }
                Match::Mergeable(slot) => merge::merge(products.stage_updated(slot), detail),
                Match::Duplicate => duplicates.push(ProductDuplicate {
                    product_name: line.product_name,
                    is_duplicate: true,
                }),
            }
        }

        let (created, updated) = self.persist_products(&products, &allocator).await?;

        info!(
            created = created.len(),
            updated = updated.len(),
            duplicates = duplicates.len(),
            "product batch reconciled"
        );
        record_outcomes("products", created.len(), updated.len(), duplicates.len());

        Ok(ProductImportResponse {
            message: ImportMessage::from_writes(!created.is_empty() || !updated.is_empty()),
            new_products: created,
            updated_products: updated,
            duplicates,
        })
    }

    async fn persist_products(
        &self,
        products: &ProductIndex,
        allocator: &IdAllocator,
    ) -> Result<(Vec<Product>, Vec<Product>), ServiceError> {
        let created = products.created();
        let updated = products.updated();

        self.store.insert_products(&created).await?;
        allocator.commit(self.store.as_ref()).await?;
        for product in &updated {
            self.store.update_product(product).await?;
        }
        Ok((created, updated))
    }

    #[instrument(skip(self, payload))]
    pub async fn import_damage_records(
        &self,
        payload: Value,
    ) -> Result<DamageImportResponse, ServiceError> {
        let result = self.reconcile_damage_records(payload).await;
        if let Err(err) = &result {
            record_failure("damage_records", err);
        }
        result
    }

    async fn reconcile_damage_records(
        &self,
        payload: Value,
    ) -> Result<DamageImportResponse, ServiceError> {
        let records: Vec<IncomingDamageRecord> =
            records::parse_batch(payload, self.max_batch_size)?;

        let companies = CompanyIndex::from_companies(&self.store.companies().await?);
        let products = ProductIndex::from_products(self.store.products().await?);
        if self.reference_validation == ReferenceValidation::Upfront {
            for record in &records {
                resolve_product(&companies, &products, record)?;
            }
        }

        let mut index = DamageIndex::from_records(&self.store.damage_records().await?);
        let mut created: Vec<DamageRecord> = Vec::new();
        let mut duplicates = Vec::new();
        for record in records {
            let (company_id, product_id) = match resolve_product(&companies, &products, &record) {
                Ok(ids) => ids,
                Err(err) => {
                    self.store.insert_damage_records(&created).await?;
                    warn!(error = %err, "damage batch partially applied before a missing reference");
                    return Err(err);
                }
            };

            let key = DamageKey {
                product_id,
                company_id,
                unit_price: record.unit_price,
                expiry: record.expiry,
            };
            match matcher::classify_damage(&index, &key) {
                Match::Duplicate => duplicates.push(DamageDuplicate {
                    company_id: key.company_id,
                    product_id: key.product_id,
                    is_duplicate: true,
                }),
                Match::New | Match::Mergeable(_) => {
                    let damage = DamageRecord::new(
                        key.product_id.clone(),
                        key.company_id.clone(),
                        record.quantity,
                        record.unit_price,
                        record.expiry,
                    );
                    index.insert(key);
                    created.push(damage);
                }
            }
        }

        self.store.insert_damage_records(&created).await?;

        info!(
            created = created.len(),
            duplicates = duplicates.len(),
            "damage batch reconciled"
        );
        record_outcomes("damage_records", created.len(), 0, duplicates.len());

        Ok(DamageImportResponse {
            message: ImportMessage::from_writes(!created.is_empty()),
            new_damage_records: created,
            duplicates,
        })
    }
}
