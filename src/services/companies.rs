use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;

use super::reconciliation::{allocator::retire_id, IdAllocator, IdFamily, ImportMessage};
use crate::errors::ServiceError;
use crate::models::Company;
use crate::repositories::Store;

/// Outcome of adding a single company. A duplicate name is not an error.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyAddOutcome {
    pub message: ImportMessage,
    pub is_duplicate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
}

/// Service for single-record company operations
#[derive(Clone)]
pub struct CompanyService {
    store: Arc<dyn Store>,
}

impl CompanyService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Company>, ServiceError> {
        Ok(self.store.companies().await?)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Company, ServiceError> {
        self.store
            .company(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("company '{}' not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn add(&self, name: String) -> Result<CompanyAddOutcome, ServiceError> {
        let existing = self.store.companies().await?;
        if existing.iter().any(|c| c.name == name) {
            return Ok(CompanyAddOutcome {
                message: ImportMessage::Duplicate,
                is_duplicate: true,
                company: None,
            });
        }

        let mark = self.store.id_high_water(IdFamily::Company.prefix()).await?;
        let mut allocator =
            IdAllocator::seeded(IdFamily::Company, existing.iter().map(|c| c.id.as_str()))
                .with_floor(mark);
        let company = Company::new(allocator.allocate(), name);
        self.store
            .insert_companies(std::slice::from_ref(&company))
            .await?;
        allocator.commit(self.store.as_ref()).await?;
        info!(id = %company.id, "company created");

        Ok(CompanyAddOutcome {
            message: ImportMessage::Created,
            is_duplicate: false,
            company: Some(company),
        })
    }

    #[instrument(skip(self))]
    pub async fn rename(&self, id: &str, name: String) -> Result<Company, ServiceError> {
        let companies = self.store.companies().await?;
        if companies.iter().any(|c| c.id != id && c.name == name) {
            return Err(ServiceError::Conflict(format!(
                "company name '{}' is already taken",
                name
            )));
        }
        let mut company = companies
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("company '{}' not found", id)))?;

        company.rename(name);
        self.store.update_company(&company).await?;
        Ok(company)
    }

    /// Deletes a company and returns the remaining ones. Products and damage
    /// records referencing it are left untouched.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<Vec<Company>, ServiceError> {
        if self.store.company(id).await?.is_none() {
            return Err(ServiceError::NotFound(format!("company '{}' not found", id)));
        }
        retire_id(self.store.as_ref(), IdFamily::Company, id).await?;
        if !self.store.delete_company(id).await? {
            return Err(ServiceError::NotFound(format!("company '{}' not found", id)));
        }
        info!(id, "company deleted");
        self.list().await
    }
}
