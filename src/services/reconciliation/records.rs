//! Incoming batch records and payload parsing.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::errors::ServiceError;
use crate::models::{expiry, DetailLine};

pub const MAX_QUANTITY: i64 = 1_000_000_000;

pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn validate_decimal_min_zero(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO {
        let mut err = ValidationError::new("decimal_min_zero");
        err.message = Some("must not be negative".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn validate_percent(value: &Decimal) -> Result<(), ValidationError> {
    if *value < Decimal::ZERO || *value > Decimal::ONE_HUNDRED {
        let mut err = ValidationError::new("percent");
        err.message = Some("must be between 0 and 100".into());
        return Err(err);
    }
    Ok(())
}

/// `{ companyName }`
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncomingCompany {
    #[validate(custom = "validate_not_blank")]
    #[schema(example = "Acme Pharma")]
    pub company_name: String,
}

/// One product detail line addressed by company and product name.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncomingProductLine {
    #[validate(custom = "validate_not_blank")]
    pub company_name: String,
    #[validate(custom = "validate_not_blank")]
    pub product_name: String,
    #[serde(alias = "mrp")]
    #[validate(custom = "validate_decimal_min_zero")]
    #[schema(value_type = String, example = "12.50")]
    pub unit_price: Decimal,
    #[serde(alias = "defaultpercentage")]
    #[validate(custom = "validate_percent")]
    #[schema(value_type = String, example = "5")]
    pub discount_percent: Decimal,
    #[validate(range(min = 0, max = 1000000000))]
    pub quantity: i64,
    #[serde(alias = "dOExpiry", deserialize_with = "expiry::deserialize")]
    #[schema(value_type = String, example = "2025-06-30")]
    pub expiry: NaiveDate,
    #[serde(alias = "selectedWarehouse")]
    pub warehouse: String,
}

impl IncomingProductLine {
    pub fn detail_line(&self) -> DetailLine {
        DetailLine {
            warehouse: self.warehouse.clone(),
            unit_price: self.unit_price,
            discount_percent: self.discount_percent,
            quantity: self.quantity,
            expiry: self.expiry,
        }
    }
}

/// A damage write-off addressed by company and product name.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncomingDamageRecord {
    #[validate(custom = "validate_not_blank")]
    pub company_name: String,
    #[validate(custom = "validate_not_blank")]
    pub product_name: String,
    #[validate(range(min = 0, max = 1000000000))]
    pub quantity: i64,
    #[serde(alias = "mrp")]
    #[validate(custom = "validate_decimal_min_zero")]
    #[schema(value_type = String, example = "12.50")]
    pub unit_price: Decimal,
    #[serde(alias = "dOExpiry", deserialize_with = "expiry::deserialize")]
    #[schema(value_type = String, example = "2025-06-30")]
    pub expiry: NaiveDate,
}

/// Decodes and validates a whole batch before anything touches storage.
///
/// Fails when the payload is not an array, is empty, holds more than
/// `max_batch_size` elements, or any element is malformed or invalid.
pub fn parse_batch<T>(payload: Value, max_batch_size: usize) -> Result<Vec<T>, ServiceError>
where
    T: DeserializeOwned + Validate,
{
    let items = match payload {
        Value::Array(items) => items,
        other => {
            return Err(ServiceError::ValidationError(format!(
                "import payload must be an array, got {}",
                json_kind(&other)
            )))
        }
    };

    if items.is_empty() {
        return Err(ServiceError::ValidationError(
            "import payload must contain at least one record".to_string(),
        ));
    }
    if items.len() > max_batch_size {
        return Err(ServiceError::ValidationError(format!(
            "import payload has {} records, the limit is {}",
            items.len(),
            max_batch_size
        )));
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let record: T = serde_json::from_value(item).map_err(|e| {
                ServiceError::ValidationError(format!("record {}: {}", index, e))
            })?;
            record.validate().map_err(|e| {
                ServiceError::ValidationError(format!("record {}: {}", index, e))
            })?;
            Ok(record)
        })
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
