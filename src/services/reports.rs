//! Company-level roll-ups of product stock or damage quantities for the dashboard.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

use crate::errors::ServiceError;
use crate::models::{Company, DamageRecord, Product};
use crate::repositories::Store;

const TOP_COMPANIES: usize = 5;

/// Which quantity a report sums.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QuantitySource {
    /// `totalQuantity` of products
    #[default]
    Stock,
    /// `quantity` of damage records not yet released
    Damage,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// `stock` (default) or `damage`
    #[serde(default)]
    pub source: QuantitySource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompanyQuantity {
    pub company_name: String,
    pub total_quantity: i64,
}

/// Sums product totals per company id.
pub fn stock_totals(products: &[Product]) -> HashMap<String, i64> {
    let mut totals = HashMap::new();
    for product in products {
        *totals.entry(product.company_id.clone()).or_insert(0) += product.total_quantity;
    }
    totals
}

/// Sums quantities of active (not released) damage records per company id.
pub fn damage_totals(records: &[DamageRecord]) -> HashMap<String, i64> {
    let mut totals = HashMap::new();
    for record in records.iter().filter(|r| !r.deleted) {
        *totals.entry(record.company_id.clone()).or_insert(0) += record.quantity;
    }
    totals
}

/// Attaches company names in company order. Totals whose company no longer
/// exists are dropped.
pub fn join_company_names(
    companies: &[Company],
    totals: &HashMap<String, i64>,
) -> Vec<CompanyQuantity> {
    companies
        .iter()
        .filter_map(|company| {
            totals.get(&company.id).map(|total| CompanyQuantity {
                company_name: company.name.clone(),
                total_quantity: *total,
            })
        })
        .collect()
}

/// Name ascending, ties by quantity descending, at most five rows.
pub fn top_five_by_company_name(mut rows: Vec<CompanyQuantity>) -> Vec<CompanyQuantity> {
    rows.sort_by(|a, b| {
        a.company_name
            .cmp(&b.company_name)
            .then_with(|| b.total_quantity.cmp(&a.total_quantity))
    });
    rows.truncate(TOP_COMPANIES);
    rows
}

/// Quantity descending, untruncated. Rows with equal quantities have no
/// guaranteed relative order.
pub fn ranked_by_quantity(mut rows: Vec<CompanyQuantity>) -> Vec<CompanyQuantity> {
    rows.sort_unstable_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
    rows
}

#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn Store>,
}

impl ReportService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    async fn company_quantities(
        &self,
        source: QuantitySource,
    ) -> Result<Vec<CompanyQuantity>, ServiceError> {
        let companies = self.store.companies().await?;
        let totals = match source {
            QuantitySource::Stock => stock_totals(&self.store.products().await?),
            QuantitySource::Damage => damage_totals(&self.store.damage_records().await?),
        };
        Ok(join_company_names(&companies, &totals))
    }

    #[instrument(skip(self))]
    pub async fn top_companies(
        &self,
        source: QuantitySource,
    ) -> Result<Vec<CompanyQuantity>, ServiceError> {
        Ok(top_five_by_company_name(
            self.company_quantities(source).await?,
        ))
    }

    #[instrument(skip(self))]
    pub async fn company_ranking(
        &self,
        source: QuantitySource,
    ) -> Result<Vec<CompanyQuantity>, ServiceError> {
        Ok(ranked_by_quantity(self.company_quantities(source).await?))
    }

    pub async fn company_count(&self) -> Result<usize, ServiceError> {
        Ok(self.store.companies().await?.len())
    }

    pub async fn active_damage_count(&self) -> Result<usize, ServiceError> {
        Ok(self
            .store
            .damage_records()
            .await?
            .iter()
            .filter(|r| !r.deleted)
            .count())
    }
}
