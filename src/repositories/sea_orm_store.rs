use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use super::{sort_by_display_id, Store, StoreError};
use crate::entities::{company, damage_record, id_sequence, product};
use crate::models::{Company, DamageRecord, DetailLine, Product};

/// sea-orm backed store over the `companies`, `products`, `damage_records`
/// and `id_sequences` tables.
#[derive(Debug, Clone)]
pub struct SeaOrmStore {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

fn missing_on_noop(err: DbErr, entity: &'static str, id: String) -> StoreError {
    match err {
        DbErr::RecordNotUpdated | DbErr::RecordNotFound(_) => StoreError::Missing { entity, id },
        other => StoreError::from(other),
    }
}

impl From<company::Model> for Company {
    fn from(model: company::Model) -> Self {
        Company {
            id: model.id,
            name: model.name,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn company_active_model(company: &Company) -> company::ActiveModel {
    company::ActiveModel {
        id: Set(company.id.clone()),
        name: Set(company.name.clone()),
        created_at: Set(company.created_at),
        updated_at: Set(company.updated_at),
    }
}

impl TryFrom<product::Model> for Product {
    type Error = StoreError;

    fn try_from(model: product::Model) -> Result<Self, Self::Error> {
        let details: Vec<DetailLine> = serde_json::from_value(model.details)?;
        Ok(Product {
            id: model.id,
            name: model.name,
            company_id: model.company_id,
            details,
            total_quantity: model.total_quantity,
        })
    }
}

fn product_active_model(product: &Product) -> Result<product::ActiveModel, StoreError> {
    Ok(product::ActiveModel {
        id: Set(product.id.clone()),
        name: Set(product.name.clone()),
        company_id: Set(product.company_id.clone()),
        details: Set(serde_json::to_value(&product.details)?),
        total_quantity: Set(product.total_quantity),
    })
}

impl TryFrom<damage_record::Model> for DamageRecord {
    type Error = StoreError;

    fn try_from(model: damage_record::Model) -> Result<Self, Self::Error> {
        let unit_price = model.unit_price.parse::<Decimal>().map_err(|e| {
            StoreError::Serialization(format!(
                "damage record {} has unit price '{}': {}",
                model.id, model.unit_price, e
            ))
        })?;
        Ok(DamageRecord {
            id: model.id,
            product_id: model.product_id,
            company_id: model.company_id,
            quantity: model.quantity,
            unit_price,
            expiry: model.expiry,
            deleted: model.deleted,
            created_at: model.created_at,
        })
    }
}

fn damage_active_model(record: &DamageRecord) -> damage_record::ActiveModel {
    damage_record::ActiveModel {
        id: Set(record.id),
        product_id: Set(record.product_id.clone()),
        company_id: Set(record.company_id.clone()),
        quantity: Set(record.quantity),
        unit_price: Set(record.unit_price.to_string()),
        expiry: Set(record.expiry),
        deleted: Set(record.deleted),
        created_at: Set(record.created_at),
    }
}

#[async_trait]
impl Store for SeaOrmStore {
    async fn companies(&self) -> Result<Vec<Company>, StoreError> {
        let mut rows: Vec<Company> = company::Entity::find()
            .all(self.connection())
            .await?
            .into_iter()
            .map(Company::from)
            .collect();
        sort_by_display_id(&mut rows, |c| c.id.as_str());
        Ok(rows)
    }

    async fn company(&self, id: &str) -> Result<Option<Company>, StoreError> {
        Ok(company::Entity::find_by_id(id.to_string())
            .one(self.connection())
            .await?
            .map(Company::from))
    }

    async fn insert_companies(&self, companies: &[Company]) -> Result<(), StoreError> {
        if companies.is_empty() {
            return Ok(());
        }
        debug!(count = companies.len(), "bulk inserting companies");
        company::Entity::insert_many(companies.iter().map(company_active_model))
            .exec(self.connection())
            .await?;
        Ok(())
    }

    async fn update_company(&self, company: &Company) -> Result<(), StoreError> {
        company_active_model(company)
            .update(self.connection())
            .await
            .map_err(|e| missing_on_noop(e, "company", company.id.clone()))?;
        Ok(())
    }

    async fn delete_company(&self, id: &str) -> Result<bool, StoreError> {
        let result = company::Entity::delete_by_id(id.to_string())
            .exec(self.connection())
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn products(&self) -> Result<Vec<Product>, StoreError> {
        let mut rows = product::Entity::find()
            .all(self.connection())
            .await?
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        sort_by_display_id(&mut rows, |p| p.id.as_str());
        Ok(rows)
    }

    async fn product(&self, id: &str) -> Result<Option<Product>, StoreError> {
        product::Entity::find_by_id(id.to_string())
            .one(self.connection())
            .await?
            .map(Product::try_from)
            .transpose()
    }

    async fn insert_products(&self, products: &[Product]) -> Result<(), StoreError> {
        if products.is_empty() {
            return Ok(());
        }
        debug!(count = products.len(), "bulk inserting products");
        let models = products
            .iter()
            .map(product_active_model)
            .collect::<Result<Vec<_>, _>>()?;
        product::Entity::insert_many(models)
            .exec(self.connection())
            .await?;
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<(), StoreError> {
        product_active_model(product)?
            .update(self.connection())
            .await
            .map_err(|e| missing_on_noop(e, "product", product.id.clone()))?;
        Ok(())
    }

    async fn delete_product(&self, id: &str) -> Result<bool, StoreError> {
        let result = product::Entity::delete_by_id(id.to_string())
            .exec(self.connection())
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn damage_records(&self) -> Result<Vec<DamageRecord>, StoreError> {
        damage_record::Entity::find()
            .order_by_asc(damage_record::Column::CreatedAt)
            .all(self.connection())
            .await?
            .into_iter()
            .map(DamageRecord::try_from)
            .collect()
    }

    async fn damage_record(&self, id: Uuid) -> Result<Option<DamageRecord>, StoreError> {
        damage_record::Entity::find_by_id(id)
            .one(self.connection())
            .await?
            .map(DamageRecord::try_from)
            .transpose()
    }

    async fn insert_damage_records(&self, records: &[DamageRecord]) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }
        debug!(count = records.len(), "bulk inserting damage records");
        damage_record::Entity::insert_many(records.iter().map(damage_active_model))
            .exec(self.connection())
            .await?;
        Ok(())
    }

    async fn update_damage_record(&self, record: &DamageRecord) -> Result<(), StoreError> {
        damage_active_model(record)
            .update(self.connection())
            .await
            .map_err(|e| missing_on_noop(e, "damage record", record.id.to_string()))?;
        Ok(())
    }

    async fn id_high_water(&self, prefix: &str) -> Result<Option<u64>, StoreError> {
        let row = id_sequence::Entity::find_by_id(prefix.to_string())
            .one(self.connection())
            .await?;
        Ok(row.and_then(|r| u64::try_from(r.high_water).ok()))
    }

    async fn raise_id_high_water(&self, prefix: &str, value: u64) -> Result<(), StoreError> {
        let value = i64::try_from(value).map_err(|_| {
            StoreError::Backend(format!("id suffix {} for '{}' overflows", value, prefix))
        })?;
        let existing = id_sequence::Entity::find_by_id(prefix.to_string())
            .one(self.connection())
            .await?;
        let model = id_sequence::ActiveModel {
            prefix: Set(prefix.to_string()),
            high_water: Set(value),
        };
        match existing {
            Some(row) if row.high_water >= value => {}
            Some(_) => {
                model.update(self.connection()).await?;
            }
            None => {
                id_sequence::Entity::insert(model)
                    .exec(self.connection())
                    .await?;
            }
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.connection().ping().await?;
        Ok(())
    }
}
