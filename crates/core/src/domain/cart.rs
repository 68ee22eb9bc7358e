use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::errors::DomainError;

/// Ordered product selections for one shopper. Duplicates are kept and names
/// are not validated on append; price lookups happen at read time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub name: String,
    pub price: u64,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>) {
        self.items.push(name.into());
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn last_item(&self) -> Option<&str> {
        self.items.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pairs every item with its catalog price. An item missing from the
    /// catalog is a caller contract breach.
    pub fn lines(&self, catalog: &Catalog) -> Result<Vec<CartLine>, DomainError> {
        self.items
            .iter()
            .map(|name| {
                catalog
                    .find(name)
                    .map(|product| CartLine { name: name.clone(), price: product.price })
                    .ok_or_else(|| missing_item(name))
            })
            .collect()
    }

    /// Sum of line prices. A total that does not fit in `u64` is refused
    /// rather than wrapped.
    pub fn total(&self, catalog: &Catalog) -> Result<u64, DomainError> {
        self.lines(catalog)?.iter().try_fold(0u64, |total, line| {
            total.checked_add(line.price).ok_or_else(|| {
                DomainError::InvariantViolation(format!(
                    "cart total overflows when adding `{}` ({})",
                    line.name, line.price
                ))
            })
        })
    }
}

fn missing_item(name: &str) -> DomainError {
    DomainError::InvariantViolation(format!("cart item `{name}` is not present in the catalog"))
}
