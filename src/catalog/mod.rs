//! Catalog models and the external-platform client capability.

mod client;
mod http_client;
mod models;

pub use client::{CatalogClient, CatalogClientRegistry, CatalogError};
pub use http_client::HttpCatalogClient;
pub use models::{AudioFeatures, Catalog, Playlist, Song};

#[cfg(feature = "mock")]
pub use client::MockCatalogClient;
