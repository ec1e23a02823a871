//! Playlist conversion: records, storage and orchestration.

mod error;
mod models;
mod orchestrator;
mod schema;
mod store;

pub use error::ConversionError;
pub use models::{
    ConversionOutcome, ConversionRecord, ConversionStats, ConversionStatus, SongConversionError,
};
pub use orchestrator::{ConversionOrchestrator, ConversionSettings};
pub use store::{ConversionStore, SqliteConversionStore};
