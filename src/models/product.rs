use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One warehouse/expiry/quantity entry embedded in a product.
///
/// Equality covers all five fields. `expiry` is a calendar date, so two lines
/// recorded at different times of the same day are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DetailLine {
    #[schema(example = "North Depot")]
    pub warehouse: String,
    #[schema(value_type = String, example = "12.50")]
    pub unit_price: Decimal,
    #[schema(value_type = String, example = "5")]
    pub discount_percent: Decimal,
    #[schema(example = 40)]
    pub quantity: i64,
    pub expiry: NaiveDate,
}

/// Product aggregate: a named item of one company with its detail lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Display id, e.g. `P7`
    #[schema(example = "P7")]
    pub id: String,
    pub name: String,
    /// Display id of the owning company
    pub company_id: String,
    pub details: Vec<DetailLine>,
    /// Always the sum of `details[*].quantity`
    pub total_quantity: i64,
}

impl Product {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        company_id: impl Into<String>,
        details: Vec<DetailLine>,
    ) -> Self {
        let total_quantity = sum_quantities(&details);
        Self {
            id: id.into(),
            name: name.into(),
            company_id: company_id.into(),
            details,
            total_quantity,
        }
    }

    /// Sum of the detail line quantities.
    pub fn details_total(&self) -> i64 {
        sum_quantities(&self.details)
    }

    /// Whether `total_quantity` agrees with the detail lines.
    pub fn is_consistent(&self) -> bool {
        self.total_quantity == self.details_total()
    }

    pub fn recompute_total(&mut self) {
        self.total_quantity = self.details_total();
    }

    pub fn has_line(&self, line: &DetailLine) -> bool {
        self.details.iter().any(|existing| existing == line)
    }
}

fn sum_quantities(details: &[DetailLine]) -> i64 {
    details.iter().map(|d| d.quantity).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn line(warehouse: &str, quantity: i64) -> DetailLine {
        DetailLine {
            warehouse: warehouse.to_string(),
            unit_price: dec!(10.00),
            discount_percent: dec!(5),
            quantity,
            expiry: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
        }
    }

    #[test]
    fn new_product_totals_its_lines() {
        let product = Product::new("P1", "Aspirin", "C1", vec![line("A", 10), line("B", 15)]);
        assert_eq!(product.total_quantity, 25);
        assert!(product.is_consistent());
    }

    #[test]
    fn decimal_scale_does_not_affect_line_equality() {
        let mut other = line("A", 10);
        other.unit_price = dec!(10.0);
        assert_eq!(line("A", 10), other);
    }

    #[test]
    fn recompute_repairs_a_drifted_total() {
        let mut product = Product::new("P1", "Aspirin", "C1", vec![line("A", 10)]);
        product.total_quantity = 99;
        assert!(!product.is_consistent());

        product.recompute_total();
        assert_eq!(product.total_quantity, 10);
    }

    #[test]
    fn has_line_compares_all_fields() {
        let product = Product::new("P1", "Aspirin", "C1", vec![line("A", 10)]);
        assert!(product.has_line(&line("A", 10)));
        assert!(!product.has_line(&line("A", 11)));
        assert!(!product.has_line(&line("B", 10)));
    }
}
