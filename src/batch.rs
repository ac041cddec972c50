//! Train/test dataset generation across a fixed-size worker pool.
//!
//! Builds for different seeds share nothing, so each worker returns its
//! `(seed, line)` pair by value and ordering is restored afterwards by
//! walking the seed range.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::generate::build_scenario;
use crate::types::{BatchParams, GoalWeights, ScenarioParams};

pub const TRAIN_FILE: &str = "train.txt";
pub const TEST_FILE: &str = "test.txt";

/// Serialized scenarios, each segment in ascending seed order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub train: Vec<String>,
    pub test: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetPaths {
    pub train: PathBuf,
    pub test: PathBuf,
}

/// Build every seed in `seeds` on `pool`, keyed by seed.
///
/// The first failing build aborts the segment.
pub fn build_segment(
    pool: &rayon::ThreadPool,
    seeds: Range<u64>,
    params: &ScenarioParams,
    weights: &GoalWeights,
) -> Result<BTreeMap<u64, String>> {
    let pairs = pool.install(|| {
        seeds
            .into_par_iter()
            .map(|seed| {
                build_scenario(seed, params, weights)
                    .map(|scenario| (seed, scenario.to_line()))
                    .inspect_err(|e| error!(seed, "scenario build failed: {e}"))
            })
            .collect::<Result<Vec<(u64, String)>>>()
    })?;
    Ok(pairs.into_iter().collect())
}

/// Lines for `seeds` in ascending order. Every seed must be present.
fn ordered_lines(results: &mut BTreeMap<u64, String>, seeds: Range<u64>) -> Result<Vec<String>> {
    seeds
        .map(|seed| results.remove(&seed).ok_or(Error::MissingSeed(seed)))
        .collect()
}

pub fn generate_dataset(params: &BatchParams) -> Result<Dataset> {
    params.validate()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(params.workers)
        .build()?;
    let scenario_params = params.scenario_params();
    let (train_weights, test_weights) = params.distributions.for_mode(params.hard);

    let mut segments = Vec::with_capacity(2);
    for (name, seeds, weights) in [
        ("train", params.train_seeds(), train_weights),
        ("test", params.test_seeds(), test_weights),
    ] {
        let started = Instant::now();
        info!(
            segment = name,
            seeds = ?seeds,
            weights = ?weights,
            map_size = params.map_size,
            hard = params.hard,
            "generating segment"
        );
        let mut results = build_segment(&pool, seeds.clone(), &scenario_params, &weights)?;
        let lines = ordered_lines(&mut results, seeds)?;
        info!(
            segment = name,
            scenarios = lines.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "segment done"
        );
        segments.push(lines);
    }

    let test = segments.pop().unwrap_or_default();
    let train = segments.pop().unwrap_or_default();
    Ok(Dataset { train, test })
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    Ok(())
}

/// Write `train.txt` and `test.txt` under `dir`, creating it if needed.
pub fn write_dataset(dataset: &Dataset, dir: &Path) -> Result<DatasetPaths> {
    fs::create_dir_all(dir)?;
    let paths = DatasetPaths {
        train: dir.join(TRAIN_FILE),
        test: dir.join(TEST_FILE),
    };
    write_lines(&paths.train, &dataset.train)?;
    write_lines(&paths.test, &dataset.test)?;
    info!(
        train = %paths.train.display(),
        test = %paths.test.display(),
        "wrote dataset"
    );
    Ok(paths)
}

/// Generate the whole dataset and write it to `dir`. Nothing is written if
/// any build fails.
pub fn run(params: &BatchParams, dir: &Path) -> Result<DatasetPaths> {
    let dataset = generate_dataset(params)?;
    write_dataset(&dataset, dir)
}
