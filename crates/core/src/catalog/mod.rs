//! Product catalog: loading from the flat product file and read-only lookups.
//!
//! Loading is all-or-nothing. A catalog value always holds at least one
//! product, names are unique, and every product carries the bucket derived
//! from its normalized price.

mod records;

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::product::{normalize_price, PriceBucket, Product};

/// Number of fields every catalog record must carry: name, price, image.
pub const CATALOG_ARITY: usize = 3;

#[derive(Debug, Error)]
pub enum CatalogLoadError {
    #[error("catalog file was not found: `{0}`")]
    Missing(PathBuf),
    #[error("could not read catalog file `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("malformed catalog record at line {line}: {message}")]
    Malformed { line: usize, message: String },
    #[error("catalog record at line {line} has {found} fields, expected 3 (name, price, image)")]
    Arity { line: usize, found: usize },
    #[error("catalog record at line {line} has an empty product name")]
    EmptyName { line: usize },
    #[error("product `{name}` appears more than once (line {line})")]
    DuplicateProduct { name: String, line: usize },
    #[error("catalog contains no products")]
    Empty,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CatalogOptions {
    /// Skip the first record. Header names are never inspected.
    pub has_header: bool,
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self { has_header: true }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Catalog {
    products: Vec<Product>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogLoadError> {
        let lines = (1..=products.len()).collect::<Vec<_>>();
        Self::from_products(products, &lines)
    }

    pub fn load(path: &Path, options: CatalogOptions) -> Result<Self, CatalogLoadError> {
        if !path.exists() {
            return Err(CatalogLoadError::Missing(path.to_path_buf()));
        }

        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogLoadError::Read { path: path.to_path_buf(), source })?;
        let catalog = Self::parse(&raw, options)?;

        info!(
            event_name = "catalog.load.completed",
            path = %path.display(),
            product_count = catalog.len(),
            "product catalog loaded"
        );
        Ok(catalog)
    }

    pub fn parse(raw: &str, options: CatalogOptions) -> Result<Self, CatalogLoadError> {
        let records = records::read_records(raw)?;
        let skip = usize::from(options.has_header);
        if records.len() <= skip {
            return Err(CatalogLoadError::Empty);
        }

        let mut products = Vec::with_capacity(records.len() - skip);
        let mut lines = Vec::with_capacity(records.len() - skip);
        for record in records.into_iter().skip(skip) {
            if record.fields.len() != CATALOG_ARITY {
                return Err(CatalogLoadError::Arity {
                    line: record.line,
                    found: record.fields.len(),
                });
            }

            let mut fields = record.fields.into_iter();
            let name = fields.next().unwrap_or_default();
            let raw_price = fields.next().unwrap_or_default();
            let image = fields.next().unwrap_or_default();

            let price = normalize_price(&raw_price);
            if price == 0 && raw_price.trim() != "0" {
                debug!(
                    event_name = "catalog.price.coerced",
                    line = record.line,
                    raw_price = %raw_price,
                    "price coerced to zero"
                );
            }

            products.push(Product::new(name, price, image));
            lines.push(record.line);
        }

        Self::from_products(products, &lines)
    }

    fn from_products(products: Vec<Product>, lines: &[usize]) -> Result<Self, CatalogLoadError> {
        if products.is_empty() {
            return Err(CatalogLoadError::Empty);
        }

        let mut index = HashMap::with_capacity(products.len());
        for (position, product) in products.iter().enumerate() {
            let line = lines.get(position).copied().unwrap_or(position + 1);
            if product.name.trim().is_empty() {
                return Err(CatalogLoadError::EmptyName { line });
            }
            if index.insert(product.name.clone(), position).is_some() {
                return Err(CatalogLoadError::DuplicateProduct {
                    name: product.name.clone(),
                    line,
                });
            }
        }

        Ok(Self { products, index })
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&Product> {
        self.index.get(name).map(|&position| &self.products[position])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn in_bucket(&self, bucket: PriceBucket) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(move |product| product.bucket == bucket)
    }

    /// Case-insensitive substring search in catalog order. `None` and the
    /// empty filter both return every product.
    pub fn search(&self, filter: Option<&str>) -> Vec<&Product> {
        let needle = filter.map(str::to_lowercase).filter(|needle| !needle.is_empty());
        match needle {
            None => self.products.iter().collect(),
            Some(needle) => self
                .products
                .iter()
                .filter(|product| product.name.to_lowercase().contains(&needle))
                .collect(),
        }
    }

    /// Product whose price is closest to `price`, skipping `exclude`; ties go
    /// to the earliest catalog entry.
    pub fn nearest_by_price(&self, price: u64, exclude: Option<&str>) -> Option<&Product> {
        self.products
            .iter()
            .filter(|product| exclude != Some(product.name.as_str()))
            .min_by_key(|product| product.price.abs_diff(price))
    }
}
