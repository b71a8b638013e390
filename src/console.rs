// src/console.rs
//! Interactive menus. Every prompt re-asks until it gets one of the listed
//! integers; end of input is an error.

use crate::config::{DomainShape, IntegrationConfig, PricingConfig};
use crate::error::{McError, McResult};
use crate::finance::loader::AssetCountType;
use crate::finance::payoff::OptionType;
use std::io::{self, BufRead, Write};
use std::str::FromStr;

/// Top-level computation chosen at start-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Finance,
    Integration,
}

impl TryFrom<u32> for Mode {
    type Error = McError;

    fn try_from(choice: u32) -> McResult<Self> {
        match choice {
            1 => Ok(Mode::Finance),
            2 => Ok(Mode::Integration),
            other => Err(McError::InvalidSelection {
                what: "computation type".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Console::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Console { input, output }
    }

    fn read_line(&mut self) -> McResult<String> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(McError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed while waiting for a choice",
            )));
        }
        Ok(line.trim().to_string())
    }

    /// Ask until the answer is one of `1..=options.len()`, returning it
    pub fn prompt_choice(&mut self, title: &str, options: &[&str]) -> McResult<u32> {
        loop {
            writeln!(self.output, "{}", title)?;
            for (i, option) in options.iter().enumerate() {
                writeln!(self.output, "{}. {}", i + 1, option)?;
            }
            self.output.flush()?;

            match self.read_line()?.parse::<u32>() {
                Ok(choice) if (1..=options.len() as u32).contains(&choice) => return Ok(choice),
                Ok(_) => {
                    let listed: Vec<String> = (1..=options.len()).map(|i| i.to_string()).collect();
                    writeln!(self.output, "Invalid choice. Please enter {}.", listed.join(" or "))?;
                }
                Err(_) => writeln!(self.output, "Invalid input. Please enter a number.")?,
            }
        }
    }

    /// Ask for a value, using `default` on an empty answer
    pub fn prompt_value<T: FromStr>(&mut self, label: &str, default: T) -> McResult<T> {
        loop {
            write!(self.output, "{}: ", label)?;
            self.output.flush()?;
            let line = self.read_line()?;
            if line.is_empty() {
                return Ok(default);
            }
            match line.parse() {
                Ok(value) => return Ok(value),
                Err(_) => writeln!(self.output, "Invalid input: '{}'.", line)?,
            }
        }
    }

    pub fn select_mode(&mut self) -> McResult<Mode> {
        let choice = self.prompt_choice(
            "Choose computation type:",
            &["Finance Monte Carlo", "Monte Carlo Integration"],
        )?;
        Mode::try_from(choice)
    }

    pub fn select_option_type(&mut self) -> McResult<OptionType> {
        let choice = self.prompt_choice("Choose the option type:", &["European", "Asian"])?;
        OptionType::try_from(choice)
    }

    pub fn select_asset_count(&mut self) -> McResult<AssetCountType> {
        let choice = self.prompt_choice(
            "Choose the number of assets:",
            &["Single asset", "Multiple assets"],
        )?;
        AssetCountType::try_from(choice)
    }

    pub fn select_domain_shape(&mut self) -> McResult<DomainShape> {
        let choice = self.prompt_choice(
            "Choose the integration domain:",
            &["Hypersphere", "Hypercube", "Hyperrectangle"],
        )?;
        DomainShape::try_from(choice)
    }

    /// Fill the interactive parts of a pricing run on top of `base`
    pub fn pricing_config(&mut self, base: PricingConfig) -> McResult<PricingConfig> {
        let option_type = self.select_option_type()?;
        let asset_count = self.select_asset_count()?;
        // must fit the history's bounds, see ReturnLaw::check_fits
        let horizon_days = self.prompt_value("Horizon in trading days", base.horizon_days)?;
        Ok(PricingConfig {
            option_type,
            asset_count,
            horizon_days,
            ..base
        })
    }

    /// Fill a whole integration run on top of `base`
    pub fn integration_config(&mut self, base: IntegrationConfig) -> McResult<IntegrationConfig> {
        let shape = self.select_domain_shape()?;
        let mut cfg = IntegrationConfig { shape, ..base };

        match shape {
            DomainShape::Sphere => {
                cfg.dimension = self.prompt_value("Dimension", cfg.dimension)?;
                cfg.radius = self.prompt_value("Radius", cfg.radius)?;
            }
            DomainShape::Cube => {
                cfg.dimension = self.prompt_value("Dimension", cfg.dimension)?;
                cfg.side = self.prompt_value("Half side", cfg.side)?;
            }
            DomainShape::Rectangle => {
                let dimension: usize = self.prompt_value("Dimension", cfg.dimension)?;
                cfg.bounds.clear();
                for axis in 0..dimension {
                    let lower = self.prompt_value(&format!("Lower bound x{}", axis), 0.0)?;
                    let upper = self.prompt_value(&format!("Upper bound x{}", axis), 1.0)?;
                    cfg.bounds.extend([lower, upper]);
                }
                cfg.dimension = dimension;
            }
        }

        let formula: String =
            self.prompt_value("Integrand over x0, x1, ... (empty for volume only)", String::new())?;
        cfg.integrand = if formula.is_empty() { None } else { Some(formula) };
        cfg.num_simulations = self.prompt_value("Number of points", cfg.num_simulations)?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_reprompts_until_valid() {
        let mut c = console("abc\n7\n2\n");
        assert_eq!(c.select_option_type().unwrap(), OptionType::Asian);
        let shown = String::from_utf8(c.output.clone()).unwrap();
        assert!(shown.contains("Invalid input. Please enter a number."));
        assert!(shown.contains("Invalid choice. Please enter 1 or 2."));
        assert_eq!(shown.matches("Choose the option type:").count(), 3);
    }

    #[test]
    fn test_end_of_input() {
        let mut c = console("x\n");
        assert!(matches!(c.select_mode(), Err(McError::Io(_))));
    }

    #[test]
    fn test_pricing_menus() {
        let mut c = console("1\n2\n21\n");
        let cfg = c.pricing_config(PricingConfig::default()).unwrap();
        assert_eq!(cfg.option_type, OptionType::European);
        assert_eq!(cfg.asset_count, AssetCountType::Multiple);
        assert_eq!(cfg.horizon_days, 21);

        let mut c = console("2\n1\n\n");
        let cfg = c.pricing_config(PricingConfig::default()).unwrap();
        assert_eq!(cfg.option_type, OptionType::Asian);
        assert_eq!(cfg.horizon_days, 252);
    }

    #[test]
    fn test_rectangle_menu() {
        let mut c = console("3\n2\n0\n1\n-1\n1\nx0*x1\n5000\n");
        let cfg = c.integration_config(IntegrationConfig::default()).unwrap();
        assert_eq!(cfg.shape, DomainShape::Rectangle);
        assert_eq!(cfg.bounds, vec![0.0, 1.0, -1.0, 1.0]);
        assert_eq!(cfg.integrand.as_deref(), Some("x0*x1"));
        assert_eq!(cfg.num_simulations, 5000);
    }

    #[test]
    fn test_defaults_on_empty_answers() {
        let mut c = console("1\n\n\n\n\n");
        let cfg = c.integration_config(IntegrationConfig::default()).unwrap();
        assert_eq!(cfg.shape, DomainShape::Sphere);
        assert_eq!(cfg.dimension, 3);
        assert!(cfg.integrand.is_none());
        assert_eq!(cfg.num_simulations, 1_000_000);
    }
}
