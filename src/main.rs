//! fast-mci command line
//!
//! - `fast-mci price` prices a European or Asian basket call from a directory of CSV histories
//! - `fast-mci integrate` estimates the volume of a domain and an optional integral over it
//! - `fast-mci interactive` (the default) asks for everything through numbered menus

use clap::{Parser, Subcommand};
use fast_mci::config::{DomainShape, IntegrationConfig, PricingConfig, DEFAULT_OUTPUT_FILE};
use fast_mci::console::{Console, Mode};
use fast_mci::finance::loader::AssetCountType;
use fast_mci::finance::paths::DEFAULT_HORIZON_DAYS;
use fast_mci::finance::payoff::OptionType;
use fast_mci::mc::iteration::DEFAULT_ITERATIONS;
use fast_mci::orchestrator::{integrate, price_option, IntegrationReport, PricingReport};
use fast_mci::output::{render_integration, render_pricing, write_integration_results};
use fast_mci::McResult;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Monte Carlo integration over hyper-domains and basket option pricing
#[derive(Parser)]
#[command(name = "fast-mci")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log pipeline stages (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Price a basket call option from CSV price histories
    Price {
        /// european | asian
        #[arg(short = 't', long, default_value = "european")]
        option_type: OptionType,

        /// single | multiple
        #[arg(short, long, default_value = "multiple")]
        assets: AssetCountType,

        /// Directory of per-asset CSV files
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,

        /// Strike price (at-the-money basket level when omitted)
        #[arg(short = 'k', long)]
        strike: Option<f64>,

        #[arg(short, long, default_value_t = 0.05)]
        rate: f64,

        /// Maturity in years
        #[arg(short, long, default_value_t = 1.0)]
        maturity: f64,

        /// Trading days simulated per trial; short histories only support short horizons
        #[arg(long, default_value_t = DEFAULT_HORIZON_DAYS)]
        horizon: usize,

        #[arg(short, long, default_value_t = DEFAULT_ITERATIONS)]
        iterations: usize,

        /// Simulations per iteration (1e6 European, 1e5 Asian when omitted)
        #[arg(short = 'n', long)]
        simulations: Option<usize>,

        #[arg(short, long)]
        seed: Option<u64>,

        /// Run the outer iterations in parallel
        #[arg(long)]
        concurrent: bool,

        /// Results file
        #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
        output: PathBuf,

        /// Skip writing the results file
        #[arg(long)]
        no_output: bool,
    },

    /// Estimate the volume of a domain and optionally integrate a formula over it
    Integrate {
        /// sphere | cube | rectangle
        #[arg(long, default_value = "sphere")]
        shape: DomainShape,

        #[arg(short, long, default_value_t = 3)]
        dimension: usize,

        #[arg(short, long, default_value_t = 1.0)]
        radius: f64,

        /// Half-width of the cube
        #[arg(long, default_value_t = 1.0)]
        side: f64,

        /// Rectangle bounds as lower0,upper0,lower1,upper1,...
        #[arg(short, long, value_delimiter = ',', allow_negative_numbers = true)]
        bounds: Vec<f64>,

        /// Formula over x0, x1, ...
        #[arg(short, long)]
        integrand: Option<String>,

        #[arg(short = 'n', long, default_value_t = 1_000_000)]
        simulations: usize,

        #[arg(short, long)]
        seed: Option<u64>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Numbered menus on stdin
    Interactive {
        #[arg(short, long, default_value = "data")]
        data_dir: PathBuf,

        #[arg(short, long)]
        seed: Option<u64>,
    },
}

fn print_progress(percent: f64) {
    println!("Process at {}% ...", percent);
}

fn show_pricing(report: &PricingReport) -> McResult<()> {
    println!();
    render_pricing(report, &mut io::stdout().lock())?;
    Ok(())
}

fn show_integration(report: &IntegrationReport) -> McResult<()> {
    render_integration(report, &mut io::stdout().lock())?;
    Ok(())
}

fn run_pricing(cfg: PricingConfig) -> McResult<()> {
    println!("Calculating the price of the option...");
    let report = price_option(cfg.clone(), print_progress)?;
    show_pricing(&report)?;
    if let Some(path) = &cfg.output_path {
        println!("\nThe results have been saved to {}", path.display());
    }
    Ok(())
}

fn run_integration(cfg: IntegrationConfig, output: Option<PathBuf>) -> McResult<()> {
    let report = integrate(&cfg)?;
    show_integration(&report)?;
    if let Some(path) = output {
        write_integration_results(&path, &report)?;
        info!(path = %path.display(), "results written");
    }
    Ok(())
}

fn run(command: Commands) -> McResult<()> {
    match command {
        Commands::Price {
            option_type,
            assets,
            data_dir,
            strike,
            rate,
            maturity,
            horizon,
            iterations,
            simulations,
            seed,
            concurrent,
            output,
            no_output,
        } => run_pricing(PricingConfig {
            option_type,
            asset_count: assets,
            data_dir,
            strike,
            risk_free_rate: rate,
            maturity,
            horizon_days: horizon,
            num_iterations: iterations,
            num_simulations: simulations,
            seed,
            concurrent_iterations: concurrent,
            output_path: (!no_output).then_some(output),
            ..Default::default()
        }),

        Commands::Integrate {
            shape,
            dimension,
            radius,
            side,
            bounds,
            integrand,
            simulations,
            seed,
            output,
        } => run_integration(
            IntegrationConfig {
                shape,
                dimension,
                radius,
                side,
                bounds,
                integrand,
                num_simulations: simulations,
                seed,
                ..Default::default()
            },
            output,
        ),

        Commands::Interactive { data_dir, seed } => {
            let mut console = Console::stdio();
            match console.select_mode()? {
                Mode::Finance => {
                    let base = PricingConfig {
                        data_dir,
                        seed,
                        ..Default::default()
                    };
                    run_pricing(console.pricing_config(base)?)
                }
                Mode::Integration => {
                    let base = IntegrationConfig {
                        seed,
                        ..Default::default()
                    };
                    run_integration(console.integration_config(base)?, None)
                }
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    let command = cli.command.unwrap_or(Commands::Interactive {
        data_dir: PathBuf::from("data"),
        seed: None,
    });

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
