//! Error taxonomy for playlist conversions.

use thiserror::Error;

use crate::catalog::Catalog;

/// Errors surfaced by the conversion orchestrator.
///
/// `DuplicateConversion` and `PlaylistNotFound` reject the request before a
/// record exists; every other failure terminates the admitted record, which
/// is returned to the caller with its status set to Failed.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("a conversion for this playlist and catalog already exists: {existing_id}")]
    DuplicateConversion { existing_id: String },

    #[error("source playlist not found: {0}")]
    PlaylistNotFound(String),

    #[error("compatibility score {score:.2} is below the minimum {min_score:.2}")]
    LowCompatibility { score: f64, min_score: f64 },

    #[error("no usable credential for {catalog}")]
    NoCredential { catalog: Catalog },

    #[error("external catalog failure: {0}")]
    ExternalCatalog(String),

    #[error("conversion cancelled by caller")]
    Cancelled,

    #[error("store error: {0}")]
    Store(#[from] anyhow::Error),
}
