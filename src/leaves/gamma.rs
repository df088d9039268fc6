use rand::Rng;

use crate::error::{Result, SpnError};
use crate::leaves::{check_positive, require, unknown_parameter, weighted_mean, LeafAdapter};
use crate::stats::{ln_gamma, Family, Parameters};
use crate::types::LeafType;

/// Gamma distribution with shape `alpha` and rate `beta`.
///
/// ```text
/// PDF(x) = beta^alpha / Gamma(alpha) * x^(alpha - 1) * exp(-beta * x)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Gamma {
    alpha: Option<f64>,
    beta: Option<f64>,
}

impl Gamma {
    pub fn new(alpha: f64, beta: f64) -> Result<Self> {
        let mut d = Gamma {
            alpha: None,
            beta: None,
        };
        d.set_params(alpha, beta)?;
        Ok(d)
    }

    /// Create a Gamma, drawing `alpha ~ U(0.5, 5)` and `beta ~ U(0.5, 2)` if omitted.
    pub fn init<R>(alpha: Option<f64>, beta: Option<f64>, rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        let alpha = alpha.unwrap_or_else(|| rng.random_range(0.5..5.0));
        let beta = beta.unwrap_or_else(|| rng.random_range(0.5..2.0));
        Self::new(alpha, beta)
    }

    pub fn set_params(&mut self, alpha: f64, beta: f64) -> Result<()> {
        check_positive(alpha, "alpha", LeafType::Gamma)?;
        check_positive(beta, "beta", LeafType::Gamma)?;
        self.alpha = Some(alpha);
        self.beta = Some(beta);
        Ok(())
    }

    pub fn get_params(&self) -> Result<(f64, f64)> {
        Ok((
            require(self.alpha, "alpha", LeafType::Gamma)?,
            require(self.beta, "beta", LeafType::Gamma)?,
        ))
    }
}

impl LeafAdapter for Gamma {
    fn leaf_type(&self) -> LeafType {
        LeafType::Gamma
    }

    fn family(&self) -> Family {
        Family::Gamma
    }

    fn parameters(&self) -> Result<Parameters> {
        let (alpha, beta) = self.get_params()?;
        Ok(Parameters::from([("a", alpha), ("scale", 1.0 / beta)]))
    }

    fn unset_parameter(&mut self, name: &str) -> Result<()> {
        match name {
            "alpha" => self.alpha = None,
            "beta" => self.beta = None,
            _ => return Err(unknown_parameter(name, LeafType::Gamma)),
        }
        Ok(())
    }

    fn natural_parameters(&self) -> Result<Vec<f64>> {
        let (alpha, beta) = self.get_params()?;
        Ok(vec![alpha - 1.0, -beta])
    }

    fn base_measure(&self, _x: f64) -> Result<f64> {
        Ok(1.0)
    }

    fn sufficient_statistics(&self, x: f64) -> Result<Vec<f64>> {
        Ok(vec![x.ln(), x])
    }

    fn log_partition_natural(&self) -> Result<f64> {
        let eta = self.natural_parameters()?;
        Ok(ln_gamma(eta[0] + 1.0) - (eta[0] + 1.0) * (-eta[1]).ln())
    }

    fn log_partition_param(&self) -> Result<f64> {
        let (alpha, beta) = self.get_params()?;
        Ok(ln_gamma(alpha) - alpha * beta.ln())
    }

    /// Approximate maximum-likelihood update (Minka's closed-form shape estimate).
    fn update_parameters_em(&mut self, values: &[f64], responsibilities: &[f64]) -> Result<()> {
        if let Some(x) = values.iter().find(|&&x| !(x > 0.0)) {
            return Err(SpnError::domain(format!(
                "Gamma cannot be fitted to non-positive value {}",
                x
            )));
        }
        let (mean, _) = weighted_mean(values, responsibilities)?;
        let logs: Vec<f64> = values.iter().map(|x| x.ln()).collect();
        let (mean_log, _) = weighted_mean(&logs, responsibilities)?;
        let s = mean.ln() - mean_log;
        if !(s > 0.0) {
            return Err(SpnError::domain(
                "Gamma cannot be fitted to data without spread",
            ));
        }
        let alpha = (3.0 - s + ((s - 3.0) * (s - 3.0) + 24.0 * s).sqrt()) / (12.0 * s);
        self.set_params(alpha, alpha / mean)
    }
}
