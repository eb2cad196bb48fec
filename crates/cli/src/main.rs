//! stochvuln CLI - Monte Carlo DEM-uncertainty vulnerability analysis

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use stochvuln_core::io::read_geotiff;
use stochvuln_core::Raster;
use stochvuln_simulation::{
    format_elapsed, GeoTiffToolbox, ProgressObserver, Severity, Simulation, SimulationConfig,
};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "stochvuln")]
#[command(author, version, long_about = None)]
#[command(about = "Monte Carlo DEM-uncertainty vulnerability analysis")]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the stochastic simulation
    Run {
        /// JSON configuration file
        #[arg(short, long)]
        config: PathBuf,
        /// Override the number of iterations
        #[arg(short = 'n', long)]
        iterations: Option<usize>,
        /// Override the random seed
        #[arg(long)]
        seed: Option<u64>,
        /// Override the working directory
        #[arg(short, long)]
        working_dir: Option<PathBuf>,
        /// Keep the last iteration's transient rasters
        #[arg(long)]
        keep_transients: bool,
    },
    /// Print the default configuration as JSON
    Config {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install log subscriber")
}

fn spinner(msg: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Ok(pb)
}

fn read_raster(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...")?;
    let raster: Raster<f64> = read_geotiff(path)
        .with_context(|| format!("Failed to read raster {}", path.display()))?;
    pb.finish_and_clear();
    Ok(raster)
}

/// Iteration progress bar for `run`
struct BarObserver {
    bar: ProgressBar,
}

impl BarObserver {
    fn new(total: usize) -> Result<Self> {
        let bar = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}",
        )?;
        bar.set_style(style.progress_chars("=> "));
        Ok(Self { bar })
    }
}

impl ProgressObserver for BarObserver {
    fn on_iteration(&mut self, iteration: usize, total: usize) {
        self.bar.set_position(iteration as u64 - 1);
        self.bar.set_message(format!("Iteration {} of {}", iteration, total));
    }

    fn on_finalize(&mut self) {
        self.bar.finish_and_clear();
    }
}

fn run(
    config_path: &Path,
    iterations: Option<usize>,
    seed: Option<u64>,
    working_dir: Option<PathBuf>,
    keep_transients: bool,
) -> Result<()> {
    let mut config = SimulationConfig::from_json_file(config_path)
        .with_context(|| format!("Failed to load configuration {}", config_path.display()))?;
    if let Some(n) = iterations {
        config.iterations = n;
    }
    if seed.is_some() {
        config.seed = seed;
    }
    if let Some(dir) = working_dir {
        config.working_dir = dir;
    }
    config.keep_transients |= keep_transients;

    let toolbox = GeoTiffToolbox::new(config.seed);
    let mut simulation = Simulation::new(config, toolbox).context("Invalid simulation setup")?;

    let mut observer = BarObserver::new(simulation.config().iterations)?;
    let outcome = simulation
        .run_with_progress(&mut observer)
        .context("Stochastic simulation failed")?;

    for (severity, path) in Severity::ALL.iter().zip(&outcome.uncertainty) {
        println!("{} uncertainty saved to: {}", severity, path.display());
    }
    println!("  Processing time: {}", format_elapsed(outcome.elapsed));
    Ok(())
}

fn print_default_config(output: Option<&Path>) -> Result<()> {
    let json = SimulationConfig::default().to_json_pretty()?;
    match output {
        Some(path) => {
            fs::write(path, json + "\n")
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Default configuration written to {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn print_info(input: &Path) -> Result<()> {
    let raster = read_raster(input)?;
    let (rows, cols) = raster.shape();
    let bounds = raster.bounds();
    let stats = raster.statistics();

    println!("File: {}", input.display());
    println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
    println!("Cell size: {}", raster.cell_size());
    println!(
        "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
        bounds.0, bounds.1, bounds.2, bounds.3
    );
    if let Some(crs) = raster.crs() {
        println!("CRS: {}", crs);
    }
    if let Some(nodata) = raster.nodata() {
        println!("NoData: {}", nodata);
    }
    println!("\nStatistics:");
    if let Some(min) = stats.min {
        println!("  Min: {:.4}", min);
    }
    if let Some(max) = stats.max {
        println!("  Max: {:.4}", max);
    }
    if let Some(mean) = stats.mean {
        println!("  Mean: {:.4}", mean);
    }
    println!(
        "  Valid cells: {} ({:.1}%)",
        stats.valid_count,
        100.0 * stats.valid_count as f64 / raster.len().max(1) as f64
    );
    Ok(())
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Run {
            config,
            iterations,
            seed,
            working_dir,
            keep_transients,
        } => run(&config, iterations, seed, working_dir, keep_transients),
        Commands::Config { output } => print_default_config(output.as_deref()),
        Commands::Info { input } => print_info(&input),
    }
}
