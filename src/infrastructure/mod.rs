//! Infrastructure layer - In-memory storage, services and process setup

pub mod catalog;
pub mod hierarchy;
pub mod logging;
pub mod prompt;
pub mod services;
pub mod workflow;

pub use catalog::{Catalog, CatalogRepositories};
