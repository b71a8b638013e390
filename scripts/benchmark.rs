// scripts/benchmark.rs
use fast_mci::analytics::bs_analytic;
use fast_mci::expression::Expression;
use fast_mci::finance::asset::Asset;
use fast_mci::finance::bounds::{integration_bounds, multiplier_for};
use fast_mci::finance::paths::{ReturnLaw, DEFAULT_HORIZON_DAYS};
use fast_mci::finance::payoff::{OptionType, PayoffFunction};
use fast_mci::geometry::{Domain, PointSampler};
use fast_mci::math_utils::Timer;
use fast_mci::mc::estimator::{estimate_integral, estimate_volume};
use fast_mci::mc::iteration::{run_iterations, IterationConfig};
use fast_mci::output::write_summary_to_csv;
use fast_mci::McResult;
use std::env;
use std::path::Path;
use std::process::Command;

#[derive(Debug)]
struct SystemInfo {
    os: String,
    cpu_cores: usize,
    rust_version: String,
    rayon_threads: usize,
}

impl SystemInfo {
    fn gather() -> Self {
        Self {
            os: env::consts::OS.to_string(),
            cpu_cores: num_cpus::get(),
            rust_version: Command::new("rustc")
                .arg("--version")
                .output()
                .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
                .unwrap_or_else(|_| "Unknown Rust version".to_string()),
            rayon_threads: rayon::current_num_threads(),
        }
    }
}

#[derive(Debug)]
struct BenchmarkResult {
    name: String,
    points: usize,
    time_ms: f64,
    throughput_points_per_sec: f64,
    value: f64,
    reference_value: Option<f64>,
    relative_error: Option<f64>,
}

impl BenchmarkResult {
    fn new(name: String, points: usize, time_ms: f64, value: f64, reference: Option<f64>) -> Self {
        Self {
            name,
            points,
            time_ms,
            throughput_points_per_sec: points as f64 / (time_ms / 1000.0),
            value,
            reference_value: reference,
            relative_error: reference.map(|r| (value - r).abs() / r),
        }
    }

    fn row(&self) -> Vec<String> {
        let optional =
            |v: Option<f64>| v.map(|x| format!("{:.6}", x)).unwrap_or_else(|| "N/A".to_string());
        vec![
            self.name.clone(),
            self.points.to_string(),
            format!("{:.2}", self.time_ms),
            format!("{:.0}", self.throughput_points_per_sec),
            format!("{:.6}", self.value),
            optional(self.reference_value),
            optional(self.relative_error),
        ]
    }
}

fn run_volume_benchmarks() -> McResult<Vec<BenchmarkResult>> {
    let mut results = Vec::new();
    let mut timer = Timer::new();

    for &points in &[10_000, 100_000, 1_000_000] {
        println!("Unit 3-ball volume with {} points...", points);
        let ball = Domain::hypersphere(3, 1.0)?;
        let sampler = PointSampler::new(3, 42)?;
        timer.start();
        let estimate = estimate_volume(&ball, &sampler, points)?;
        results.push(BenchmarkResult::new(
            format!("3-ball volume ({}k points)", points / 1000),
            points,
            timer.elapsed_ms(),
            estimate.approximate_volume,
            Some(estimate.exact_volume),
        ));
    }

    // same domain sampled inline and on the worker pool
    let dimension = 32;
    let points = 20_000;
    for (label, threshold) in [("inline", usize::MAX), ("pooled", 1)] {
        println!("Hypercube d={} sampled {}...", dimension, label);
        let cube = Domain::hypercube(dimension, 0.5)?;
        let sampler = PointSampler::with_parallel_threshold(dimension, 42, threshold)?;
        timer.start();
        let estimate = estimate_volume(&cube, &sampler, points)?;
        results.push(BenchmarkResult::new(
            format!("Hypercube d={} ({})", dimension, label),
            points,
            timer.elapsed_ms(),
            estimate.approximate_volume,
            Some(estimate.exact_volume),
        ));
    }

    Ok(results)
}

fn run_integral_benchmarks() -> McResult<Vec<BenchmarkResult>> {
    println!("Integral of x0^2 + x1^2 over the unit disc...");
    let disc = Domain::hypersphere(2, 1.0)?;
    let f = Expression::compile("x0^2 + x1^2", &["x0", "x1"])?;
    let sampler = PointSampler::new(2, 7)?;
    let points = 1_000_000;

    let mut timer = Timer::new();
    timer.start();
    let estimate = estimate_integral(&disc, &f, &sampler, points)?;
    Ok(vec![BenchmarkResult::new(
        "Disc second moment".to_string(),
        points,
        timer.elapsed_ms(),
        estimate.integral,
        Some(std::f64::consts::PI / 2.0),
    )])
}

fn run_pricing_benchmarks() -> McResult<Vec<BenchmarkResult>> {
    let mut results = Vec::new();
    let daily_vol = 0.2 / 252f64.sqrt();
    let assets = vec![
        Asset::new("A", 0.0, daily_vol, 100.0, 252)?,
        Asset::new("B", 0.0, daily_vol, 80.0, 252)?,
        Asset::new("C", 0.0, daily_vol, 120.0, 252)?,
    ];
    let k = multiplier_for(&assets)?;

    let cases = [
        (OptionType::European, 1usize, 200_000usize),
        (OptionType::European, 3, 200_000),
        (OptionType::Asian, 1, 5_000),
    ];

    for (option_type, count, simulations) in cases {
        println!("{} call on {} asset(s)...", option_type, count);
        let basket = &assets[..count];
        let domain = Domain::hyperrectangle(integration_bounds(basket, k as f64)?)?;
        let strike = 100.0;
        let payoff = PayoffFunction::new(option_type, basket, strike, 0.0, 1.0)?;
        let law = ReturnLaw::new(basket, option_type, DEFAULT_HORIZON_DAYS)?;
        law.check_fits(&domain)?;
        let cfg = IterationConfig {
            num_iterations: 4,
            num_simulations: simulations,
            seed: 42,
            ..Default::default()
        };

        let mut timer = Timer::new();
        timer.start();
        let result = run_iterations(&domain, &payoff, |i, rng| law.draw(i, rng), &cfg, |_| {})?;
        let reference = match (option_type, basket) {
            (OptionType::European, [asset]) => {
                Some(bs_analytic::bs_call_price_for_asset(asset, strike, 0.0, 1.0)?)
            }
            _ => None,
        };

        results.push(BenchmarkResult::new(
            format!("{} call, {} asset(s)", option_type, count),
            cfg.num_iterations * simulations,
            timer.elapsed_ms(),
            result.price,
            reference,
        ));
    }

    Ok(results)
}

fn main() -> McResult<()> {
    println!("fast-mci Benchmark Suite");
    println!("========================\n");

    let system_info = SystemInfo::gather();
    println!("System Information:");
    println!("  OS: {}", system_info.os);
    println!("  CPU Cores: {}", system_info.cpu_cores);
    println!("  Rust Version: {}", system_info.rust_version);
    println!("  Rayon Threads: {}", system_info.rayon_threads);
    println!();

    let mut all_results = run_volume_benchmarks()?;
    all_results.extend(run_integral_benchmarks()?);
    all_results.extend(run_pricing_benchmarks()?);

    println!("\n{:=<80}", "");
    println!("BENCHMARK RESULTS");
    println!("{:=<80}", "");
    println!(
        "{:<32} {:>9} {:>10} {:>13} {:>10} {:>10} {:>10}",
        "Benchmark", "Points", "Time (ms)", "Throughput", "Value", "Reference", "Rel Error"
    );
    println!("{:-<80}", "");
    for result in &all_results {
        println!(
            "{:<32} {:>9} {:>10.2} {:>13.0} {:>10.4} {:>10} {:>10}",
            result.name,
            result.points,
            result.time_ms,
            result.throughput_points_per_sec,
            result.value,
            result
                .reference_value
                .map(|v| format!("{:.4}", v))
                .unwrap_or_else(|| "N/A".to_string()),
            result
                .relative_error
                .map(|e| format!("{:.2}%", e * 100.0))
                .unwrap_or_else(|| "N/A".to_string())
        );
    }
    println!("{:=<80}", "");

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let filename = format!("benchmark_results_{}.csv", timestamp);
    let rows: Vec<Vec<String>> = all_results.iter().map(BenchmarkResult::row).collect();
    write_summary_to_csv(
        Path::new(&filename),
        &[
            "Benchmark",
            "Points",
            "Time_ms",
            "Throughput_points_per_sec",
            "Value",
            "Reference_Value",
            "Relative_Error",
        ],
        &rows,
    )?;

    println!("\nResults saved to: {}", filename);
    Ok(())
}
