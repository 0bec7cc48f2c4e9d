use crate::models::{DetailLine, Product};

/// Appends `line` and adds its quantity to the running total. Does not persist.
pub fn merge(product: &mut Product, line: DetailLine) {
    product.total_quantity += line.quantity;
    product.details.push(line);
}
