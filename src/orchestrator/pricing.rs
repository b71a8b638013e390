// src/orchestrator/pricing.rs
//! Option Pricing Pipeline
//!
//! # Stages
//!
//! ```text
//! SelectOptionType → SelectAssetCount → LoadAssets → ComputeBounds
//!     → BuildDomain → BuildPayoff → RunEstimation → ReportResults → Done
//! ```
//!
//! Each stage owns what the previous ones produced, so a later stage cannot
//! run on missing inputs. Any error ends the run.
//!
//! # Integration Bounds
//!
//! With `k = 24 · (min observations / 21)`, axis `i` of the sampling box is
//!
//! ```text
//! [μᵢ − k·σᵢ + 1, μᵢ + k·σᵢ + 1]
//! ```
//!
//! The configured horizon must keep the simulated factors inside that box
//! (see [`ReturnLaw::check_fits`]); a short history with a long horizon is a
//! bounds error rather than a silently truncated price.

use crate::analytics::bs_analytic::bs_call_price_for_asset;
use crate::config::PricingConfig;
use crate::error::McResult;
use crate::finance::asset::Asset;
use crate::finance::bounds::{integration_bounds, multiplier_for};
use crate::finance::loader::{load_assets, AssetCountType};
use crate::finance::paths::ReturnLaw;
use crate::finance::payoff::{at_the_money_strike, OptionType, PayoffFunction};
use crate::geometry::domain::Domain;
use crate::math_utils::Timer;
use crate::mc::iteration::{run_iterations, AggregatedResult};
use crate::output::write_results;
use tracing::{debug, info};

/// Everything a finished pricing run reports
#[derive(Debug, Clone)]
pub struct PricingReport {
    pub option_type: OptionType,
    pub asset_count: AssetCountType,
    pub asset_names: Vec<String>,
    pub formula: String,
    pub strike: f64,
    pub risk_free_rate: f64,
    pub maturity: f64,
    pub std_dev_multiplier: usize,
    pub bounds: Vec<f64>,
    pub result: AggregatedResult,
    /// Closed-form cross-check, single-asset European runs only
    pub bs_price: Option<f64>,
    pub seed: u64,
    pub elapsed_ms: f64,
}

/// Inputs fixed by the two selection stages
#[derive(Debug, Clone, Copy)]
struct Selection {
    option_type: OptionType,
    asset_count: AssetCountType,
}

#[derive(Debug)]
struct Calibrated {
    selection: Selection,
    assets: Vec<Asset>,
    multiplier: usize,
}

#[derive(Debug)]
enum Stage {
    SelectOptionType,
    SelectAssetCount(OptionType),
    LoadAssets(Selection),
    ComputeBounds(Selection, Vec<Asset>),
    BuildDomain(Calibrated, Vec<f64>),
    BuildPayoff(Calibrated, Domain),
    RunEstimation(Calibrated, Domain, PayoffFunction),
    ReportResults(Box<PricingReport>),
    Done(Box<PricingReport>),
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::SelectOptionType => "select option type",
            Stage::SelectAssetCount(_) => "select asset count",
            Stage::LoadAssets(_) => "load assets",
            Stage::ComputeBounds(..) => "compute bounds",
            Stage::BuildDomain(..) => "build domain",
            Stage::BuildPayoff(..) => "build payoff",
            Stage::RunEstimation(..) => "run estimation",
            Stage::ReportResults(_) => "report results",
            Stage::Done(_) => "done",
        }
    }
}

/// Drives one pricing run from a validated configuration
pub struct PricingOrchestrator<P: FnMut(f64)> {
    cfg: PricingConfig,
    progress: P,
    timer: Timer,
}

impl PricingOrchestrator<fn(f64)> {
    /// Orchestrator that discards progress updates
    pub fn new(cfg: PricingConfig) -> Self {
        fn ignore(_: f64) {}
        PricingOrchestrator::with_progress(cfg, ignore as fn(f64))
    }
}

impl<P: FnMut(f64)> PricingOrchestrator<P> {
    /// `progress` receives the completed percentage after each outer iteration
    pub fn with_progress(cfg: PricingConfig, progress: P) -> Self {
        PricingOrchestrator {
            cfg,
            progress,
            timer: Timer::new(),
        }
    }

    pub fn run(mut self) -> McResult<PricingReport> {
        self.cfg.validate()?;
        self.timer.start();

        let mut stage = Stage::SelectOptionType;
        loop {
            debug!(stage = stage.name(), "entering stage");
            stage = match self.advance(stage)? {
                Stage::Done(report) => return Ok(*report),
                next => next,
            };
        }
    }

    fn advance(&mut self, stage: Stage) -> McResult<Stage> {
        let next = match stage {
            Stage::SelectOptionType => Stage::SelectAssetCount(self.cfg.option_type),

            Stage::SelectAssetCount(option_type) => Stage::LoadAssets(Selection {
                option_type,
                asset_count: self.cfg.asset_count,
            }),

            Stage::LoadAssets(selection) => {
                info!(directory = %self.cfg.data_dir.display(), "loading assets from csv");
                let assets = load_assets(&self.cfg.data_dir, selection.asset_count)?;
                Stage::ComputeBounds(selection, assets)
            }

            Stage::ComputeBounds(selection, assets) => {
                let multiplier = multiplier_for(&assets)?;
                let bounds = integration_bounds(&assets, multiplier as f64)?;
                debug!(multiplier, ?bounds, "integration bounds set");
                Stage::BuildDomain(
                    Calibrated {
                        selection,
                        assets,
                        multiplier,
                    },
                    bounds,
                )
            }

            Stage::BuildDomain(calibrated, bounds) => {
                let domain = Domain::hyperrectangle(bounds)?;
                Stage::BuildPayoff(calibrated, domain)
            }

            Stage::BuildPayoff(calibrated, domain) => {
                let strike = self
                    .cfg
                    .strike
                    .unwrap_or_else(|| at_the_money_strike(&calibrated.assets));
                let payoff = PayoffFunction::new(
                    calibrated.selection.option_type,
                    &calibrated.assets,
                    strike,
                    self.cfg.risk_free_rate,
                    self.cfg.maturity,
                )?;
                info!(formula = payoff.formula(), strike, "payoff built");
                Stage::RunEstimation(calibrated, domain, payoff)
            }

            Stage::RunEstimation(calibrated, domain, payoff) => {
                let report = self.estimate(calibrated, domain, payoff)?;
                Stage::ReportResults(Box::new(report))
            }

            Stage::ReportResults(report) => {
                if let Some(path) = &self.cfg.output_path {
                    write_results(path, &report)?;
                    info!(path = %path.display(), "results written");
                }
                Stage::Done(report)
            }

            Stage::Done(report) => Stage::Done(report),
        };
        Ok(next)
    }

    fn estimate(
        &mut self,
        calibrated: Calibrated,
        domain: Domain,
        payoff: PayoffFunction,
    ) -> McResult<PricingReport> {
        let Calibrated {
            selection,
            assets,
            multiplier,
        } = calibrated;

        let law = ReturnLaw::new(&assets, selection.option_type, self.cfg.horizon_days)?;
        law.check_fits(&domain)?;
        let iteration_cfg = self.cfg.iteration_config();
        info!("calculating the price of the option");
        let result = run_iterations(
            &domain,
            &payoff,
            |axis, rng| law.draw(axis, rng),
            &iteration_cfg,
            &mut self.progress,
        )?;

        let bs_price = match (selection.option_type, assets.as_slice()) {
            (OptionType::European, [asset]) => Some(bs_call_price_for_asset(
                asset,
                payoff.strike(),
                payoff.rate(),
                payoff.maturity(),
            )?),
            _ => None,
        };

        let bounds = match &domain {
            Domain::HyperRectangle(rect) => rect.bounds().to_vec(),
            _ => Vec::new(),
        };

        Ok(PricingReport {
            option_type: selection.option_type,
            asset_count: selection.asset_count,
            asset_names: assets.iter().map(|a| a.name().to_string()).collect(),
            formula: payoff.formula().to_string(),
            strike: payoff.strike(),
            risk_free_rate: payoff.rate(),
            maturity: payoff.maturity(),
            std_dev_multiplier: multiplier,
            bounds,
            result,
            bs_price,
            seed: iteration_cfg.seed,
            elapsed_ms: self.timer.elapsed_ms(),
        })
    }
}

/// Run the full pricing pipeline for `cfg`
pub fn price_option<P: FnMut(f64)>(cfg: PricingConfig, progress: P) -> McResult<PricingReport> {
    PricingOrchestrator::with_progress(cfg, progress).run()
}
