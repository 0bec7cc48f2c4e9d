//! Import responses.

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Company, DamageRecord, Product};

/// `"created"` when the batch staged any write, otherwise `"duplicate"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImportMessage {
    Created,
    Duplicate,
}

impl ImportMessage {
    pub fn from_writes(any_write: bool) -> Self {
        if any_write {
            ImportMessage::Created
        } else {
            ImportMessage::Duplicate
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyDuplicate {
    pub company_name: String,
    pub is_duplicate: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyImportResponse {
    pub message: ImportMessage,
    pub new_companies: Vec<Company>,
    pub duplicates: Vec<CompanyDuplicate>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductDuplicate {
    pub product_name: String,
    pub is_duplicate: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductImportResponse {
    pub message: ImportMessage,
    pub new_products: Vec<Product>,
    pub updated_products: Vec<Product>,
    pub duplicates: Vec<ProductDuplicate>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DamageDuplicate {
    pub company_id: String,
    pub product_id: String,
    pub is_duplicate: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DamageImportResponse {
    pub message: ImportMessage,
    pub new_damage_records: Vec<DamageRecord>,
    pub duplicates: Vec<DamageDuplicate>,
}

/// Result of [`super::BatchReconciler::reconcile`], serialized as the
/// matching per-kind response.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ImportOutcome {
    Companies(CompanyImportResponse),
    Products(ProductImportResponse),
    DamageRecords(DamageImportResponse),
}
