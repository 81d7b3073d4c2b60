//! In-memory product catalog
//!
//! The catalog is the pricing authority at checkout: when a cart line
//! references a known product, the server recomputes the line price from
//! catalog data instead of trusting the client's estimate.

use parking_lot::RwLock;
use shared::models::{Product, ProductMeta};
use std::collections::HashMap;
use std::sync::Arc;

/// Catalog service backed by an in-memory map
#[derive(Clone, Default)]
pub struct CatalogService {
    products: Arc<RwLock<HashMap<String, Product>>>,
}

impl CatalogService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load or replace a batch of products
    pub fn load_products(&self, products: Vec<Product>) {
        let mut map = self.products.write();
        for product in products {
            map.insert(product.id.clone(), product);
        }
        tracing::debug!(count = map.len(), "Catalog loaded");
    }

    /// Insert or replace a single product
    pub fn upsert_product(&self, product: Product) {
        self.products.write().insert(product.id.clone(), product);
    }

    /// Get a full product by ID
    pub fn get_product(&self, product_id: &str) -> Option<Product> {
        self.products.read().get(product_id).cloned()
    }

    /// Get pricing metadata for one product
    pub fn get_product_meta(&self, product_id: &str) -> Option<ProductMeta> {
        self.products.read().get(product_id).map(ProductMeta::from)
    }

    /// Batch metadata lookup for checkout. Unknown IDs are simply
    /// absent from the result; the pipeline falls back to client prices.
    pub fn get_product_meta_batch(&self, product_ids: &[String]) -> HashMap<String, ProductMeta> {
        let map = self.products.read();
        product_ids
            .iter()
            .filter_map(|id| map.get(id).map(|p| (id.clone(), ProductMeta::from(p))))
            .collect()
    }

    /// All active products, sorted by name
    pub fn list_active(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self
            .products
            .read()
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        products
    }
}
