//! Generate, preview and audit craftworld scenario datasets.
//!
//! Usage: `craftworld-gen generate --export-path DIR [--hard] ...`

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info};

use craftworld_gen::batch;
use craftworld_gen::check::check_scenario;
use craftworld_gen::generate::build_scenario;
use craftworld_gen::scenario::Scenario;
use craftworld_gen::types::BatchParams;

#[derive(Parser, Debug)]
#[command(name = "craftworld-gen")]
#[command(about = "Procedurally generate craftworld train/test scenarios")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write train.txt and test.txt to the export directory
    Generate(GenerateArgs),
    /// Build one scenario and draw it to stdout
    Preview(PreviewArgs),
    /// Parse a dataset file and report malformed scenarios
    Check {
        /// Dataset file, one scenario per line
        file: PathBuf,
    },
}

/// Options shared by every command that builds scenarios. Flags override
/// values from the params file.
#[derive(Args, Debug)]
struct MapArgs {
    /// JSON params file (BatchParams); missing fields take defaults
    #[arg(long)]
    params: Option<PathBuf>,

    /// Side length of the square map
    #[arg(long = "map-size", alias = "map_size")]
    map_size: Option<usize>,

    /// Hard mode: water moat and the hard goal distributions
    #[arg(long)]
    hard: bool,

    /// Extra random primitives per map
    #[arg(long = "num-primitive", alias = "num_primitive")]
    num_primitive: Option<u32>,

    /// Extra decorative grass per map
    #[arg(long = "num-grass", alias = "num_grass")]
    num_grass: Option<u32>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Output directory, created if absent
    #[arg(long = "export-path", alias = "export_path")]
    export_path: PathBuf,

    /// Number of maps in the train set
    #[arg(long = "num-train", alias = "num_train")]
    num_train: Option<u64>,

    /// Number of maps in the test set
    #[arg(long = "num-test", alias = "num_test")]
    num_test: Option<u64>,

    /// Worker threads
    #[arg(long)]
    workers: Option<usize>,

    #[command(flatten)]
    map: MapArgs,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Sample the goal from the test distribution
    #[arg(long)]
    test: bool,

    #[command(flatten)]
    map: MapArgs,
}

fn load_params(map: &MapArgs) -> anyhow::Result<BatchParams> {
    let mut params = match &map.params {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => BatchParams::default(),
    };
    if let Some(v) = map.map_size {
        params.map_size = v;
    }
    if map.hard {
        params.hard = true;
    }
    if let Some(v) = map.num_primitive {
        params.num_primitive = v;
    }
    if let Some(v) = map.num_grass {
        params.num_grass = v;
    }
    Ok(params)
}

fn generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mut params = load_params(&args.map)?;
    if let Some(v) = args.num_train {
        params.num_train = v;
    }
    if let Some(v) = args.num_test {
        params.num_test = v;
    }
    if let Some(v) = args.workers {
        params.workers = v;
    }

    let paths = batch::run(&params, &args.export_path)
        .with_context(|| format!("generating dataset into {}", args.export_path.display()))?;
    info!(
        train = %paths.train.display(),
        test = %paths.test.display(),
        "done"
    );
    Ok(())
}

fn preview(args: PreviewArgs) -> anyhow::Result<()> {
    let params = load_params(&args.map)?;
    params.validate()?;
    let (train, test) = params.distributions.for_mode(params.hard);
    let weights = if args.test { test } else { train };
    let scenario = build_scenario(args.seed, &params.scenario_params(), &weights)?;
    print!("{}", scenario.render());
    println!("{}", scenario.to_line());
    Ok(())
}

fn check(file: PathBuf) -> anyhow::Result<()> {
    let text = fs::read_to_string(&file)
        .with_context(|| format!("reading {}", file.display()))?;
    let mut bad = 0usize;
    let mut total = 0usize;
    for (idx, line) in text.lines().enumerate() {
        total += 1;
        let line_no = idx + 1;
        match line.parse::<Scenario>() {
            Ok(scenario) => {
                let violations = check_scenario(&scenario);
                if !violations.is_empty() {
                    bad += 1;
                }
                for v in violations {
                    error!(line = line_no, "{v}");
                }
            }
            Err(e) => {
                bad += 1;
                error!(line = line_no, "{e}");
            }
        }
    }
    if bad > 0 {
        bail!("{bad} of {total} scenarios in {} failed checks", file.display());
    }
    info!(scenarios = total, "all scenarios passed");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    craftworld_gen::init_logging();

    let cli = Cli::parse();
    match cli.command {
        Command::Generate(args) => generate(args),
        Command::Preview(args) => preview(args),
        Command::Check { file } => check(file),
    }
}
