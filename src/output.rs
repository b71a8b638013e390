// src/output.rs
use crate::orchestrator::integration::IntegrationReport;
use crate::orchestrator::pricing::PricingReport;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

fn timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Human-readable summary of a pricing run
pub fn render_pricing(report: &PricingReport, out: &mut impl Write) -> io::Result<()> {
    let result = &report.result;
    writeln!(out, "Timestamp: {}", timestamp())?;
    writeln!(out, "Option type: {}", report.option_type)?;
    writeln!(out, "Assets: {}", report.asset_names.join(", "))?;
    writeln!(out, "Payoff function: {}", report.formula)?;
    writeln!(out, "Strike price: {}", report.strike)?;
    writeln!(out, "Risk-free rate: {}", report.risk_free_rate)?;
    writeln!(out, "Maturity (years): {}", report.maturity)?;
    writeln!(out, "Std devs from mean: {}", report.std_dev_multiplier)?;
    for (name, pair) in report.asset_names.iter().zip(report.bounds.chunks_exact(2)) {
        writeln!(out, "Integration bounds {}: [{}, {}]", name, pair[0], pair[1])?;
    }
    writeln!(out, "Number of simulations: {}", result.num_simulations)?;
    writeln!(out, "Number of iterations: {}", result.num_iterations)?;
    writeln!(out, "Seed: {}", report.seed)?;
    writeln!(out, "Rejected points: {}", result.points_rejected)?;
    writeln!(out)?;
    if let Some(bs) = report.bs_price {
        writeln!(out, "Option price (Black-Scholes): {}", bs)?;
    }
    writeln!(out, "Option price (Monte Carlo): {}", result.price)?;
    writeln!(out, "Variance: {}", result.variance)?;
    writeln!(out, "Standard error: {}", result.standard_error)?;
    writeln!(out)?;
    for (name, price) in report.asset_names.iter().zip(&result.predicted_asset_prices) {
        writeln!(out, "Predicted price of {}: {}", name, price)?;
    }
    writeln!(out, "Elapsed: {:.1} ms", report.elapsed_ms)?;
    Ok(())
}

/// Human-readable summary of an integration run
pub fn render_integration(report: &IntegrationReport, out: &mut impl Write) -> io::Result<()> {
    let volume = &report.volume;
    writeln!(out, "Timestamp: {}", timestamp())?;
    writeln!(out, "Domain: {} ({} dimensions)", report.domain, report.dimension)?;
    writeln!(out, "Number of points: {}", volume.num_simulations)?;
    writeln!(out, "Points inside: {}", volume.points_inside)?;
    writeln!(out, "Seed: {}", report.seed)?;
    writeln!(out, "Approximate volume: {}", volume.approximate_volume)?;
    writeln!(out, "Exact volume: {}", volume.exact_volume)?;
    writeln!(out, "Absolute error: {}", volume.absolute_error())?;
    writeln!(out, "Standard error: {}", volume.standard_error)?;
    if let (Some(formula), Some(integral)) = (&report.integrand, &report.integral) {
        writeln!(out, "Integrand: {}", formula)?;
        writeln!(out, "Integral: {}", integral.integral)?;
        writeln!(out, "Integral standard error: {}", integral.standard_error)?;
    }
    writeln!(out, "Elapsed: {:.1} ms", report.elapsed_ms)?;
    Ok(())
}

pub fn write_results(path: &Path, report: &PricingReport) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    render_pricing(report, &mut file)?;
    file.flush()
}

pub fn write_integration_results(path: &Path, report: &IntegrationReport) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);
    render_integration(report, &mut file)?;
    file.flush()
}

pub fn write_summary_to_csv(path: &Path, header: &[&str], rows: &[Vec<String>]) -> io::Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finance::loader::AssetCountType;
    use crate::finance::payoff::OptionType;
    use crate::mc::iteration::AggregatedResult;

    fn report(bs_price: Option<f64>) -> PricingReport {
        PricingReport {
            option_type: OptionType::European,
            asset_count: AssetCountType::Single,
            asset_names: vec!["ACME".to_string()],
            formula: "exp(-r*T) * max(0, c0*x0 - K)".to_string(),
            strike: 100.0,
            risk_free_rate: 0.05,
            maturity: 1.0,
            std_dev_multiplier: 288,
            bounds: vec![0.5, 1.5],
            result: AggregatedResult {
                price: 10.25,
                variance: 4.0,
                standard_error: 0.002,
                predicted_asset_prices: vec![105.1],
                points_rejected: 0,
                num_iterations: 10,
                num_simulations: 1_000_000,
            },
            bs_price,
            seed: 7,
            elapsed_ms: 12.5,
        }
    }

    #[test]
    fn test_pricing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("output.txt");
        write_results(&path, &report(Some(10.45))).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Timestamp: "));
        assert!(text.contains("Option type: European"));
        assert!(text.contains("Payoff function: exp(-r*T) * max(0, c0*x0 - K)"));
        assert!(text.contains("Number of simulations: 1000000"));
        assert!(text.contains("Number of iterations: 10"));
        assert!(text.contains("Option price (Black-Scholes): 10.45"));
        assert!(text.contains("Option price (Monte Carlo): 10.25"));
        assert!(text.contains("Standard error: 0.002"));
        assert!(text.contains("Predicted price of ACME: 105.1"));
    }

    #[test]
    fn test_black_scholes_line_omitted() {
        let mut buf = Vec::new();
        render_pricing(&report(None), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(!text.contains("Black-Scholes"));
    }

    #[test]
    fn test_summary_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        write_summary_to_csv(
            &path,
            &["case", "ms"],
            &[vec!["volume".to_string(), "1.5".to_string()]],
        )
        .unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "case,ms\nvolume,1.5\n");
    }
}
