use rand::Rng;

use crate::error::{Result, SpnError};
use crate::leaves::{require, unknown_parameter, weighted_mean, LeafAdapter};
use crate::stats::{ln_gamma, Family, Parameters};
use crate::types::LeafType;

/// Poisson distribution with rate `l` (mean and variance).
#[derive(Debug, Clone, PartialEq)]
pub struct Poisson {
    l: Option<f64>,
}

impl Poisson {
    pub fn new(l: f64) -> Result<Self> {
        let mut d = Poisson { l: None };
        d.set_params(l)?;
        Ok(d)
    }

    /// Create a Poisson, drawing `l ~ U(1, 10)` if omitted.
    pub fn init<R>(l: Option<f64>, rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        Self::new(l.unwrap_or_else(|| rng.random_range(1.0..10.0)))
    }

    pub fn set_params(&mut self, l: f64) -> Result<()> {
        if !l.is_finite() || l < 0.0 {
            return Err(SpnError::invalid_parameters(format!(
                "Value of l for Poisson distribution must be finite and greater or equal to 0.0, but was: {}",
                l
            )));
        }
        self.l = Some(l);
        Ok(())
    }

    pub fn get_params(&self) -> Result<f64> {
        require(self.l, "l", LeafType::Poisson)
    }
}

impl LeafAdapter for Poisson {
    fn leaf_type(&self) -> LeafType {
        LeafType::Poisson
    }

    fn family(&self) -> Family {
        Family::Poisson
    }

    fn parameters(&self) -> Result<Parameters> {
        Ok(Parameters::from([("mu", self.get_params()?)]))
    }

    fn unset_parameter(&mut self, name: &str) -> Result<()> {
        match name {
            "l" => self.l = None,
            _ => return Err(unknown_parameter(name, LeafType::Poisson)),
        }
        Ok(())
    }

    fn natural_parameters(&self) -> Result<Vec<f64>> {
        Ok(vec![self.get_params()?.ln()])
    }

    fn base_measure(&self, x: f64) -> Result<f64> {
        Ok((-ln_gamma(x + 1.0)).exp())
    }

    fn sufficient_statistics(&self, x: f64) -> Result<Vec<f64>> {
        Ok(vec![x])
    }

    fn log_partition_natural(&self) -> Result<f64> {
        Ok(self.natural_parameters()?[0].exp())
    }

    fn log_partition_param(&self) -> Result<f64> {
        self.get_params()
    }

    fn update_parameters_em(&mut self, values: &[f64], responsibilities: &[f64]) -> Result<()> {
        let (mean, _) = weighted_mean(values, responsibilities)?;
        self.set_params(mean)
    }
}
