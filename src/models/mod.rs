//! Domain documents handled by the store and the reconciliation engine.

pub mod company;
pub mod damage_record;
pub mod expiry;
pub mod product;

pub use company::Company;
pub use damage_record::{DamageKey, DamageRecord};
pub use product::{DetailLine, Product};
