use log::warn;
use rand::Rng;

use crate::error::Result;
use crate::leaves::{
    check_finite, check_positive, require, unknown_parameter, weighted_mean, weighted_stdev,
    LeafAdapter,
};
use crate::stats::{Family, Parameters};
use crate::types::LeafType;

const HALF_LOG_TWO_PI: f64 = 0.918_938_533_204_672_8;

/// Univariate normal distribution.
///
/// ```text
/// PDF(x) = 1 / sqrt(2 pi sigma^2) * exp(-(x - mu)^2 / (2 sigma^2))
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Gaussian {
    mean: Option<f64>,
    stdev: Option<f64>,
}

impl Gaussian {
    pub fn new(mean: f64, stdev: f64) -> Result<Self> {
        let mut g = Gaussian {
            mean: None,
            stdev: None,
        };
        g.set_params(mean, stdev)?;
        Ok(g)
    }

    /// Create a Gaussian, drawing omitted parameters: `mean ~ U(-1, 1)`, `stdev ~ U(1, 3)`.
    pub fn init<R>(mean: Option<f64>, stdev: Option<f64>, rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        let mean = mean.unwrap_or_else(|| rng.random_range(-1.0..1.0));
        let stdev = stdev.unwrap_or_else(|| rng.random_range(1.0..3.0));
        Self::new(mean, stdev)
    }

    pub fn set_params(&mut self, mean: f64, stdev: f64) -> Result<()> {
        check_finite(mean, "mean", LeafType::Gaussian)?;
        check_positive(stdev, "stdev", LeafType::Gaussian)?;
        // Density at the mode is 1 / (stdev * sqrt(2 pi)).
        if stdev * (2.0 * std::f64::consts::PI).sqrt() <= 1.0 {
            warn!(
                "Degenerated Gaussian: density at the mean exceeds 1.0 (mean = {}, stdev = {})",
                mean, stdev
            );
        }
        self.mean = Some(mean);
        self.stdev = Some(stdev);
        Ok(())
    }

    pub fn get_params(&self) -> Result<(f64, f64)> {
        Ok((
            require(self.mean, "mean", LeafType::Gaussian)?,
            require(self.stdev, "stdev", LeafType::Gaussian)?,
        ))
    }
}

impl LeafAdapter for Gaussian {
    fn leaf_type(&self) -> LeafType {
        LeafType::Gaussian
    }

    fn family(&self) -> Family {
        Family::Norm
    }

    fn parameters(&self) -> Result<Parameters> {
        let (mean, stdev) = self.get_params()?;
        Ok(Parameters::from([("loc", mean), ("scale", stdev)]))
    }

    fn unset_parameter(&mut self, name: &str) -> Result<()> {
        match name {
            "mean" => self.mean = None,
            "stdev" => self.stdev = None,
            _ => return Err(unknown_parameter(name, LeafType::Gaussian)),
        }
        Ok(())
    }

    fn natural_parameters(&self) -> Result<Vec<f64>> {
        let (mean, stdev) = self.get_params()?;
        let var = stdev * stdev;
        Ok(vec![mean / var, -1.0 / (2.0 * var)])
    }

    fn base_measure(&self, _x: f64) -> Result<f64> {
        Ok((-HALF_LOG_TWO_PI).exp())
    }

    fn sufficient_statistics(&self, x: f64) -> Result<Vec<f64>> {
        Ok(vec![x, x * x])
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
        let (mean, total) = weighted_mean(values, responsibilities)?;
        let stdev = weighted_stdev(values, responsibilities, mean, total);
        self.set_params(mean, stdev)
    }
}
