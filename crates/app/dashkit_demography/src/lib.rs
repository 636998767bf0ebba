//! # dashkit_demography
//!
//! World demography tool server: countries, population pyramids, demography
//! series and a world fertility map over an in-memory SQLite copy of the
//! dataset.

pub mod db;
pub mod error;
pub mod queries;
pub mod tools;

#[cfg(test)]
mod test_support;

use std::path::Path;

pub use error::QueryError;
pub use tools::{Demography, NS, build_app};

/// Load the dataset at `path` into a fresh execution state.
pub async fn init(dataset_path: &Path) -> Result<Demography, QueryError> {
    Ok(Demography {
        pool: db::init(dataset_path).await?,
    })
}
