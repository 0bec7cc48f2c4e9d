use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use super::reconciliation::ImportMessage;
use crate::errors::ServiceError;
use crate::models::DamageRecord;
use crate::repositories::Store;

/// Outcome of adding a single damage record. A duplicate key is not an error.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DamageAddOutcome {
    pub message: ImportMessage,
    pub is_duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<DamageRecord>,
}

/// Fields accepted by a damage record update.
#[derive(Debug, Clone, Default)]
pub struct DamageChanges {
    pub quantity: Option<i64>,
    pub unit_price: Option<Decimal>,
}

#[derive(Clone)]
pub struct DamageRecordService {
    store: Arc<dyn Store>,
}

fn not_found(id: Uuid) -> ServiceError {
    ServiceError::NotFound(format!("damage record '{}' not found", id))
}

impl DamageRecordService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<DamageRecord>, ServiceError> {
        Ok(self.store.damage_records().await?)
    }

    pub async fn get(&self, id: Uuid) -> Result<DamageRecord, ServiceError> {
        self.store.damage_record(id).await?.ok_or_else(|| not_found(id))
    }

    /// Adds one write-off for an existing product of an existing company.
    #[instrument(skip(self))]
    pub async fn add(
        &self,
        company_id: String,
        product_id: String,
        quantity: i64,
        unit_price: Decimal,
        expiry: NaiveDate,
    ) -> Result<DamageAddOutcome, ServiceError> {
        if self.store.company(&company_id).await?.is_none() {
            return Err(ServiceError::ReferenceNotFound(format!(
                "company '{}' does not exist",
                company_id
            )));
        }
        match self.store.product(&product_id).await? {
            Some(product) if product.company_id == company_id => {}
            _ => {
                return Err(ServiceError::ReferenceNotFound(format!(
                    "product '{}' does not exist for company '{}'",
                    product_id, company_id
                )))
            }
        }

        let record = DamageRecord::new(product_id, company_id, quantity, unit_price, expiry);
        let key = record.key();
        if self
            .store
            .damage_records()
            .await?
            .iter()
            .any(|existing| existing.key() == key)
        {
            return Ok(DamageAddOutcome {
                message: ImportMessage::Duplicate,
                is_duplicate: true,
                record: None,
            });
        }

        self.store
            .insert_damage_records(std::slice::from_ref(&record))
            .await?;
        info!(id = %record.id, "damage record created");
        Ok(DamageAddOutcome {
            message: ImportMessage::Created,
            is_duplicate: false,
            record: Some(record),
        })
    }

    /// Changes quantity and/or unit price. A price change that would collide
    /// with another record's key is a conflict.
    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: Uuid,
        changes: DamageChanges,
    ) -> Result<DamageRecord, ServiceError> {
        let records = self.store.damage_records().await?;
        let mut record = records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))?;

        if let Some(quantity) = changes.quantity {
            record.quantity = quantity;
        }
        if let Some(unit_price) = changes.unit_price {
            record.unit_price = unit_price;
            let key = record.key();
            if records.iter().any(|r| r.id != id && r.key() == key) {
                return Err(ServiceError::Conflict(
                    "another damage record already has this product, price and expiry".into(),
                ));
            }
        }

        self.store.update_damage_record(&record).await?;
        Ok(record)
    }

    /// Marks the write-off as released. Releasing twice is a no-op.
    #[instrument(skip(self))]
    pub async fn release(&self, id: Uuid) -> Result<DamageRecord, ServiceError> {
        let mut record = self.get(id).await?;
        if !record.deleted {
            record.release();
            self.store.update_damage_record(&record).await?;
            info!(%id, "damage record released");
        }
        Ok(record)
    }
}
