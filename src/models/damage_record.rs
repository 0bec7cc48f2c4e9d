use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// A damaged-stock write-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DamageRecord {
    pub id: Uuid,
    pub product_id: String,
    pub company_id: String,
    pub quantity: i64,
    #[schema(value_type = String, example = "12.50")]
    pub unit_price: Decimal,
    pub expiry: NaiveDate,
    /// Set when the write-off is released; records are never removed
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
}

/// Uniqueness key of a damage record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DamageKey {
    pub product_id: String,
    pub company_id: String,
    pub unit_price: Decimal,
    pub expiry: NaiveDate,
}

impl DamageRecord {
    pub fn new(
        product_id: impl Into<String>,
        company_id: impl Into<String>,
        quantity: i64,
        unit_price: Decimal,
        expiry: NaiveDate,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id: product_id.into(),
            company_id: company_id.into(),
            quantity,
            unit_price,
            expiry,
            deleted: false,
            created_at: Utc::now(),
        }
    }

    pub fn key(&self) -> DamageKey {
        DamageKey {
            product_id: self.product_id.clone(),
            company_id: self.company_id.clone(),
            unit_price: self.unit_price,
            expiry: self.expiry,
        }
    }

    pub fn release(&mut self) {
        self.deleted = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    #[test]
    fn key_ignores_quantity_and_release_state() {
        let expiry = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let a = DamageRecord::new("P1", "C1", 3, dec!(4.50), expiry);
        let mut b = DamageRecord::new("P1", "C1", 9, dec!(4.5), expiry);
        b.release();

        let keys: HashSet<DamageKey> = [a.key(), b.key()].into_iter().collect();
        assert_eq!(keys.len(), 1);
        assert!(b.deleted);
    }
}
