use rand::Rng;

use crate::error::{Result, SpnError};
use crate::leaves::{check_positive, require, unknown_parameter, weighted_mean, LeafAdapter};
use crate::stats::{Family, Parameters};
use crate::types::LeafType;

/// Exponential distribution with rate `l`: `PDF(x) = l * exp(-l * x)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Exponential {
    l: Option<f64>,
}

impl Exponential {
    pub fn new(l: f64) -> Result<Self> {
        let mut d = Exponential { l: None };
        d.set_params(l)?;
        Ok(d)
    }

    /// Create an Exponential, drawing `l ~ U(0.5, 2)` if omitted.
    pub fn init<R>(l: Option<f64>, rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        Self::new(l.unwrap_or_else(|| rng.random_range(0.5..2.0)))
    }

    pub fn set_params(&mut self, l: f64) -> Result<()> {
        check_positive(l, "l", LeafType::Exponential)?;
        self.l = Some(l);
        Ok(())
    }

    pub fn get_params(&self) -> Result<f64> {
        require(self.l, "l", LeafType::Exponential)
    }
}

impl LeafAdapter for Exponential {
    fn leaf_type(&self) -> LeafType {
        LeafType::Exponential
    }

    fn family(&self) -> Family {
        Family::Expon
    }

    fn parameters(&self) -> Result<Parameters> {
        Ok(Parameters::from([("scale", 1.0 / self.get_params()?)]))
    }

    fn unset_parameter(&mut self, name: &str) -> Result<()> {
        match name {
            "l" => self.l = None,
            _ => return Err(unknown_parameter(name, LeafType::Exponential)),
        }
        Ok(())
    }

    fn natural_parameters(&self) -> Result<Vec<f64>> {
        Ok(vec![-self.get_params()?])
    }

    fn base_measure(&self, _x: f64) -> Result<f64> {
        Ok(1.0)
    }

    fn sufficient_statistics(&self, x: f64) -> Result<Vec<f64>> {
        Ok(vec![x])
    }

    fn log_partition_natural(&self) -> Result<f64> {
        Ok(-(-self.natural_parameters()?[0]).ln())
    }

    fn log_partition_param(&self) -> Result<f64> {
        Ok(-self.get_params()?.ln())
    }

    fn update_parameters_em(&mut self, values: &[f64], responsibilities: &[f64]) -> Result<()> {
        let (mean, _) = weighted_mean(values, responsibilities)?;
        if !(mean > 0.0) {
            return Err(SpnError::domain(format!(
                "Exponential cannot be fitted to data with mean {}",
                mean
            )));
        }
        self.set_params(1.0 / mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_initialization() {
        assert!(Exponential::new(1.0).is_ok());
        assert!(Exponential::new(0.0).is_err());
        assert!(Exponential::new(-1.0).is_err());
        assert!(Exponential::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_backend_scale() {
        let d = Exponential::new(4.0).unwrap();
        assert_eq!(d.parameters().unwrap()["scale"], 0.25);
    }

    #[test]
    fn test_em_update() {
        let mut d = Exponential::new(1.0).unwrap();
        d.update_parameters_em(&[0.5, 1.5], &[1.0, 1.0]).unwrap();
        assert!((d.get_params().unwrap() - 1.0).abs() < 1e-12);
        assert!(d.update_parameters_em(&[0.0], &[1.0]).is_err());
    }
}
