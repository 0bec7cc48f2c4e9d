// Bulk import engine
pub mod reconciliation;

// Single-record operations
pub mod companies;
pub mod damage_records;
pub mod products;

// Dashboard reporting
pub mod reports;
