use std::sync::Arc;
use tracing::{info, instrument};

use super::reconciliation::{allocator::retire_id, IdAllocator, IdFamily};
use crate::errors::ServiceError;
use crate::models::{DetailLine, Product};
use crate::repositories::Store;

/// Service for single-record product operations
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn Store>,
}

fn not_found(id: &str) -> ServiceError {
    ServiceError::NotFound(format!("product '{}' not found", id))
}

impl ProductService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Product>, ServiceError> {
        Ok(self.store.products().await?)
    }

    pub async fn list_by_company(&self, company_id: &str) -> Result<Vec<Product>, ServiceError> {
        Ok(self
            .store
            .products()
            .await?
            .into_iter()
            .filter(|p| p.company_id == company_id)
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Product, ServiceError> {
        self.store.product(id).await?.ok_or_else(|| not_found(id))
    }

    async fn ensure_company(&self, company_id: &str) -> Result<(), ServiceError> {
        match self.store.company(company_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::ReferenceNotFound(format!(
                "company '{}' does not exist",
                company_id
            ))),
        }
    }

    /// Creates a product; the total is computed from `details`.
    #[instrument(skip(self, details))]
    pub async fn create(
        &self,
        name: String,
        company_id: String,
        details: Vec<DetailLine>,
    ) -> Result<Product, ServiceError> {
        self.ensure_company(&company_id).await?;

        let existing = self.store.products().await?;
        if existing
            .iter()
            .any(|p| p.company_id == company_id && p.name == name)
        {
            return Err(ServiceError::Conflict(format!(
                "product '{}' already exists for company '{}'",
                name, company_id
            )));
        }

        let mark = self.store.id_high_water(IdFamily::Product.prefix()).await?;
        let mut allocator =
            IdAllocator::seeded(IdFamily::Product, existing.iter().map(|p| p.id.as_str()))
                .with_floor(mark);
        let product = Product::new(allocator.allocate(), name, company_id, details);
        self.store
            .insert_products(std::slice::from_ref(&product))
            .await?;
        allocator.commit(self.store.as_ref()).await?;
        info!(id = %product.id, "product created");
        Ok(product)
    }

    /// Replaces name, company and details. The total is recomputed.
    #[instrument(skip(self, details))]
    pub async fn update(
        &self,
        id: &str,
        name: String,
        company_id: String,
        details: Vec<DetailLine>,
    ) -> Result<Product, ServiceError> {
        self.ensure_company(&company_id).await?;

        let products = self.store.products().await?;
        if products
            .iter()
            .any(|p| p.id != id && p.company_id == company_id && p.name == name)
        {
            return Err(ServiceError::Conflict(format!(
                "product '{}' already exists for company '{}'",
                name, company_id
            )));
        }
        let mut product = products
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found(id))?;

        product.name = name;
        product.company_id = company_id;
        product.details = details;
        product.recompute_total();

        self.store.update_product(&product).await?;
        Ok(product)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        if self.store.product(id).await?.is_none() {
            return Err(not_found(id));
        }
        retire_id(self.store.as_ref(), IdFamily::Product, id).await?;
        if !self.store.delete_product(id).await? {
            return Err(not_found(id));
        }
        info!(id, "product deleted");
        Ok(())
    }
}
