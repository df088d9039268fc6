use log::warn;
use rand::Rng;

use crate::error::{Result, SpnError};
use crate::leaves::{
    check_finite, check_positive, require, unknown_parameter, weighted_mean, weighted_stdev,
    LeafAdapter,
};
use crate::stats::{Family, Parameters};
use crate::types::LeafType;

/// Log-normal distribution: `ln(X)` is normal with the stored mean and stdev.
///
/// ```text
/// PDF(x) = 1 / (x * sigma * sqrt(2 pi)) * exp(-(ln(x) - mu)^2 / (2 sigma^2))
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LogNormal {
    mean: Option<f64>,
    stdev: Option<f64>,
}

impl LogNormal {
    pub fn new(mean: f64, stdev: f64) -> Result<Self> {
        let mut d = LogNormal {
            mean: None,
            stdev: None,
        };
        d.set_params(mean, stdev)?;
        Ok(d)
    }

    /// Create a LogNormal, drawing omitted parameters like [`Gaussian::init`][crate::leaves::Gaussian::init].
    pub fn init<R>(mean: Option<f64>, stdev: Option<f64>, rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        let mean = mean.unwrap_or_else(|| rng.random_range(-1.0..1.0));
        let stdev = stdev.unwrap_or_else(|| rng.random_range(1.0..3.0));
        Self::new(mean, stdev)
    }

    pub fn set_params(&mut self, mean: f64, stdev: f64) -> Result<()> {
        check_finite(mean, "mean", LeafType::LogNormal)?;
        check_positive(stdev, "stdev", LeafType::LogNormal)?;
        // Mode at exp(mu - sigma^2).
        let log_mode_density =
            -mean + 0.5 * stdev * stdev - stdev.ln() - 0.5 * (2.0 * std::f64::consts::PI).ln();
        if log_mode_density >= 0.0 {
            warn!(
                "Degenerated LogNormal: density at the mode exceeds 1.0 (mean = {}, stdev = {})",
                mean, stdev
            );
        }
        self.mean = Some(mean);
        self.stdev = Some(stdev);
        Ok(())
    }

    pub fn get_params(&self) -> Result<(f64, f64)> {
        Ok((
            require(self.mean, "mean", LeafType::LogNormal)?,
            require(self.stdev, "stdev", LeafType::LogNormal)?,
        ))
    }
}

impl LeafAdapter for LogNormal {
    fn leaf_type(&self) -> LeafType {
        LeafType::LogNormal
    }

    fn family(&self) -> Family {
        Family::LogNorm
    }

    fn parameters(&self) -> Result<Parameters> {
        let (mean, stdev) = self.get_params()?;
        Ok(Parameters::from([("s", stdev), ("scale", mean.exp())]))
    }

    fn unset_parameter(&mut self, name: &str) -> Result<()> {
        match name {
            "mean" => self.mean = None,
            "stdev" => self.stdev = None,
            _ => return Err(unknown_parameter(name, LeafType::LogNormal)),
        }
        Ok(())
    }

    fn natural_parameters(&self) -> Result<Vec<f64>> {
        let (mean, stdev) = self.get_params()?;
        let var = stdev * stdev;
        Ok(vec![mean / var, -1.0 / (2.0 * var)])
    }

    fn base_measure(&self, x: f64) -> Result<f64> {
        Ok(1.0 / (x * (2.0 * std::f64::consts::PI).sqrt()))
    }

    fn sufficient_statistics(&self, x: f64) -> Result<Vec<f64>> {
        let ln_x = x.ln();
        Ok(vec![ln_x, ln_x * ln_x])
    }

    fn log_partition_natural(&self) -> Result<f64> {
        let eta = self.natural_parameters()?;
        Ok(-eta[0] * eta[0] / (4.0 * eta[1]) - 0.5 * (-2.0 * eta[1]).ln())
    }

    fn log_partition_param(&self) -> Result<f64> {
        let (mean, stdev) = self.get_params()?;
        Ok(mean * mean / (2.0 * stdev * stdev) + stdev.ln())
    }

    fn update_parameters_em(&mut self, values: &[f64], responsibilities: &[f64]) -> Result<()> {
        if let Some(x) = values.iter().find(|&&x| !(x > 0.0)) {
            return Err(SpnError::domain(format!(
                "LogNormal cannot be fitted to non-positive value {}",
                x
            )));
        }
        let logs: Vec<f64> = values.iter().map(|x| x.ln()).collect();
        let (mean, total) = weighted_mean(&logs, responsibilities)?;
        let stdev = weighted_stdev(&logs, responsibilities, mean, total);
        self.set_params(mean, stdev)
    }
}
