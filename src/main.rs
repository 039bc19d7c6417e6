//! brent-regimes CLI - change-point analysis of crude oil prices

use anyhow::Context;
use brent_regimes::changepoint::DetectorStrategy;
use brent_regimes::config::AnalysisConfig;
use brent_regimes::io::{load_events, load_price_rows, write_artifacts};
use brent_regimes::pipeline::run_analysis;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "brent-regimes")]
#[command(about = "Detect and quantify regime changes in a price series")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis and write analysis.json plus a text report
    Analyze {
        /// CSV file with Date and Price columns
        #[arg(long, value_name = "CSV")]
        prices: PathBuf,

        /// Optional event catalog CSV
        #[arg(long, value_name = "CSV")]
        events: Option<PathBuf>,

        /// Directory for the output artifacts
        #[arg(short, long, default_value = "output")]
        output_dir: PathBuf,

        /// JSON configuration file; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of change points for the Bayesian model
        #[arg(short = 'k', long)]
        change_points: Option<usize>,

        /// auto, bayesian or segmentation
        #[arg(long)]
        strategy: Option<DetectorStrategy>,

        #[arg(long)]
        seed: Option<u64>,

        /// Retained draws per chain
        #[arg(long)]
        draws: Option<usize>,

        /// Warm-up iterations per chain
        #[arg(long)]
        tune: Option<usize>,

        #[arg(long)]
        chains: Option<usize>,

        /// Event association window in days
        #[arg(long)]
        window_days: Option<i64>,

        /// Segmentation penalty
        #[arg(long)]
        penalty: Option<f64>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            prices,
            events,
            output_dir,
            config,
            change_points,
            strategy,
            seed,
            draws,
            tune,
            chains,
            window_days,
            penalty,
        } => {
            let mut analysis = match &config {
                Some(path) => AnalysisConfig::from_json_file(path)
                    .with_context(|| format!("loading config {}", path.display()))?,
                None => AnalysisConfig::default(),
            };
            if let Some(k) = change_points {
                analysis = analysis.n_change_points(k);
            }
            if let Some(strategy) = strategy {
                analysis = analysis.strategy(strategy);
            }
            if let Some(seed) = seed {
                analysis = analysis.seed(seed);
            }
            if let Some(draws) = draws {
                analysis = analysis.draws(draws);
            }
            if let Some(tune) = tune {
                analysis = analysis.tune(tune);
            }
            if let Some(chains) = chains {
                analysis = analysis.chains(chains);
            }
            if let Some(days) = window_days {
                analysis = analysis.window_days(days);
            }
            if let Some(penalty) = penalty {
                analysis = analysis.penalty(penalty);
            }

            let rows = load_price_rows(&prices)
                .with_context(|| format!("reading prices from {}", prices.display()))?;
            let catalog = match &events {
                Some(path) => load_events(path)
                    .with_context(|| format!("reading events from {}", path.display()))?,
                None => None,
            };

            let artifact =
                run_analysis(&rows, catalog.as_ref(), &analysis).context("analysis failed")?;

            let paths = write_artifacts(&output_dir, &artifact)
                .with_context(|| format!("writing artifacts to {}", output_dir.display()))?;

            info!(
                change_points = artifact.change_points().len(),
                regimes = artifact.regimes.len(),
                method = %artifact.detection.method,
                "analysis complete"
            );
            println!("{}", paths.artifact.display());
            println!("{}", paths.report.display());
        }
    }

    Ok(())
}
