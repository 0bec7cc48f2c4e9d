pub mod common;
pub mod companies;
pub mod damage_records;
pub mod dashboard;
pub mod products;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::repositories::SharedStore;
use crate::services::{
    companies::CompanyService, damage_records::DamageRecordService, products::ProductService,
    reconciliation::BatchReconciler, reports::ReportService,
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub reconciler: Arc<BatchReconciler>,
    pub companies: Arc<CompanyService>,
    pub products: Arc<ProductService>,
    pub damage_records: Arc<DamageRecordService>,
    pub reports: Arc<ReportService>,
}

impl AppServices {
    /// Wires every service over one shared store.
    pub fn new(store: SharedStore, config: &AppConfig) -> Self {
        Self {
            reconciler: Arc::new(BatchReconciler::new(
                store.clone(),
                config.reference_validation,
                config.max_batch_size,
            )),
            companies: Arc::new(CompanyService::new(store.clone())),
            products: Arc::new(ProductService::new(store.clone())),
            damage_records: Arc::new(DamageRecordService::new(store.clone())),
            reports: Arc::new(ReportService::new(store)),
        }
    }
}
