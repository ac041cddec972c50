//! Craftworld scenario generator.
//!
//! Builds square crafting-world maps around a sampled goal item and writes
//! them out as pipe-delimited train/test datasets. `generate_json` is the
//! filesystem-free entry point: it accepts a JSON `BatchParams` document and
//! returns the dataset as JSON.

use tracing_subscriber::{fmt, EnvFilter};

pub mod batch;
pub mod check;
pub mod error;
pub mod generate;
pub mod grid;
pub mod prng;
pub mod scenario;
pub mod types;

pub use error::{Error, Result};

/// Generate a dataset from a JSON `BatchParams` document.
///
/// Returns `{"train": [...], "test": [...]}` with one dataset line per
/// scenario in seed order.
pub fn generate_json(params_json: &str) -> Result<String> {
    let params: types::BatchParams = serde_json::from_str(params_json)?;
    let dataset = batch::generate_dataset(&params)?;
    Ok(serde_json::to_string(&dataset)?)
}

/// Install the global `tracing` subscriber. Honours `RUST_LOG`.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
