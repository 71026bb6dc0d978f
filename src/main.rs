use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use log::LevelFilter;
use miette::{Context, IntoDiagnostic, Result};
use rand::{rngs::StdRng, SeedableRng};

use rowindex::{
    config::{DEFAULT_BTREE_DEGREE, DEFAULT_HASH_CAPACITY, DEFAULT_LOAD_FACTOR},
    generator::{item_of_interest, random_rows, sequential_rows},
    harness::{self, IndexKind, Measurement},
    IndexConfig, RowStore,
};

#[derive(Parser, Debug)]
#[command(name = "rowindex", version, about, long_about = None)]
struct Cli {
    /// Path to the row file (defaults to $HOME/.rowindex/rows.csv)
    #[arg(global = true, short, long)]
    data: Option<PathBuf>,

    /// Maximum number of children of a B-tree node
    #[arg(global = true, long, default_value_t = DEFAULT_BTREE_DEGREE)]
    degree: usize,

    /// Initial number of hash buckets (power of two)
    #[arg(global = true, long, default_value_t = DEFAULT_HASH_CAPACITY)]
    capacity: usize,

    /// Hash table load factor
    #[arg(global = true, long, default_value_t = DEFAULT_LOAD_FACTOR)]
    load_factor: f64,

    /// Print debug logs
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Write a synthetic row file
    #[command(alias = "gen")]
    Generate {
        /// Number of rows
        #[arg(short, long, default_value_t = 10_000)]
        rows: usize,

        /// Draw keys at random instead of 0..rows
        #[arg(long)]
        random: bool,

        /// Largest random key
        #[arg(long, default_value_t = 1_000)]
        max_key: u64,

        /// Seed for random keys
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Look a key up through one or every index
    #[command(alias = "l")]
    Lookup {
        key: String,

        #[arg(short, long, value_enum, default_value_t = IndexChoice::All)]
        index: IndexChoice,
    },

    /// Time every index against the linear scan
    #[command(alias = "b")]
    Bench {
        /// Key to look up (defaults to the key of a row from the right half of the file)
        #[arg(short, long)]
        key: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum IndexChoice {
    Btree,
    Hash,
    Bitmap,
    Scan,
    All,
}

impl IndexChoice {
    fn kinds(self) -> Vec<IndexKind> {
        match self {
            IndexChoice::Btree => vec![IndexKind::BTree],
            IndexChoice::Hash => vec![IndexKind::Hash],
            IndexChoice::Bitmap => vec![IndexKind::Bitmap],
            IndexChoice::Scan => vec![IndexKind::Scan],
            IndexChoice::All => IndexKind::ALL.to_vec(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(if cli.verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Warn
        })
        .parse_default_env()
        .init();

    let config = IndexConfig {
        btree_degree: cli.degree,
        hash_capacity: cli.capacity,
        hash_load_factor: cli.load_factor,
    };
    config.validate().into_diagnostic()?;

    let data_path = cli.data.unwrap_or_else(default_data_path);

    match cli.command {
        Command::Generate {
            rows,
            random,
            max_key,
            seed,
        } => {
            let store = if random {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(seed),
                    None => StdRng::from_entropy(),
                };
                random_rows(rows, max_key, &mut rng)
            } else {
                sequential_rows(rows)
            };
            store
                .write_csv(&data_path)
                .into_diagnostic()
                .wrap_err_with(|| format!("failed to write rows to {:?}", data_path))?;
            success(&format!("wrote {} rows to {:?}", store.len(), data_path));
        }
        Command::Lookup { key, index } => {
            let store = load(&data_path)?;
            for kind in index.kinds() {
                let built = kind.build(&store, &config);
                let row_ids = built.look_up(&key);
                if row_ids.is_empty() {
                    warn(&format!("{}: key not found: {key}", built.name()));
                } else {
                    info(&format!("{}: {key} -> {:?}", built.name(), row_ids));
                }
            }
        }
        Command::Bench { key } => {
            let store = load(&data_path)?;
            let key = match key {
                Some(key) => key,
                None => {
                    let mut rng = StdRng::from_entropy();
                    let row_id = item_of_interest(&store, &mut rng)
                        .ok_or_else(|| miette::miette!("no rows in {:?}", data_path))?;
                    store
                        .get(row_id)
                        .map(|row| row.key().clone())
                        .ok_or_else(|| miette::miette!("row {row_id} missing"))?
                }
            };

            let report = harness::run(&store, &key, &config);
            info(&format!(
                "{} rows, key {key}, started {}",
                report.rows,
                report.started_at.format("%Y-%m-%d %H:%M:%S")
            ));
            print_measurement(&report.baseline);
            for measurement in &report.indexes {
                print_measurement(measurement);
            }

            if report.is_consistent() {
                success("every index agrees with the linear scan");
            } else {
                warn("some index disagrees with the linear scan");
            }
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<RowStore<String, String>> {
    RowStore::load_csv(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to load rows from {:?}", path))
}

fn print_measurement(measurement: &Measurement) {
    let line = format!(
        "{:<6} build {:>12?}  look-up {:>10?}  rows {:?}",
        measurement.index, measurement.build, measurement.look_up, measurement.row_ids
    );
    if !measurement.agrees || !measurement.round_trip {
        warn(&format!("{line}  (disagrees)"));
    } else if !measurement.not_slower {
        warn(&format!("{line}  (slower than scan)"));
    } else {
        info(&line);
    }
}

/// Resolve the default row file depending on OS
fn default_data_path() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".rowindex"))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rows.csv")
}

fn success(msg: &str) {
    println!("{} {}", "✔".bright_green().bold(), msg.normal());
}

fn warn(msg: &str) {
    eprintln!("{} {}", "⚠".bright_yellow().bold(), msg.yellow());
}

fn info(msg: &str) {
    println!("{} {}", "➤".bright_cyan().bold(), msg.cyan());
}
