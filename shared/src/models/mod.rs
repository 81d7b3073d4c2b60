//! Catalog and personnel models

pub mod driver;
pub mod product;

pub use driver::Driver;
pub use product::{Product, ProductMeta};
