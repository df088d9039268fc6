use rand::Rng;

use crate::error::Result;
use crate::leaves::{check_probability, require, unknown_parameter, weighted_mean, LeafAdapter};
use crate::stats::{Family, Parameters};
use crate::types::LeafType;

/// Bernoulli distribution over `{0, 1}` with success probability `p`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bernoulli {
    p: Option<f64>,
}

impl Bernoulli {
    pub fn new(p: f64) -> Result<Self> {
        let mut b = Bernoulli { p: None };
        b.set_params(p)?;
        Ok(b)
    }

    /// Create a Bernoulli, drawing `p ~ U(0, 1)` if omitted.
    pub fn init<R>(p: Option<f64>, rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        Self::new(p.unwrap_or_else(|| rng.random::<f64>()))
    }

    pub fn set_params(&mut self, p: f64) -> Result<()> {
        check_probability(p, "p", LeafType::Bernoulli)?;
        self.p = Some(p);
        Ok(())
    }

    pub fn get_params(&self) -> Result<f64> {
        require(self.p, "p", LeafType::Bernoulli)
    }
}

impl LeafAdapter for Bernoulli {
    fn leaf_type(&self) -> LeafType {
        LeafType::Bernoulli
    }

    fn family(&self) -> Family {
        Family::Bernoulli
    }

    fn parameters(&self) -> Result<Parameters> {
        Ok(Parameters::from([("p", self.get_params()?)]))
    }

    fn unset_parameter(&mut self, name: &str) -> Result<()> {
        match name {
            "p" => self.p = None,
            _ => return Err(unknown_parameter(name, LeafType::Bernoulli)),
        }
        Ok(())
    }

    fn natural_parameters(&self) -> Result<Vec<f64>> {
        let p = self.get_params()?;
        Ok(vec![(p / (1.0 - p)).ln()])
    }

    fn base_measure(&self, _x: f64) -> Result<f64> {
        Ok(1.0)
    }

    fn sufficient_statistics(&self, x: f64) -> Result<Vec<f64>> {
        Ok(vec![x])
    }

    fn log_partition_natural(&self) -> Result<f64> {
        let eta = self.natural_parameters()?[0];
        Ok(eta.exp().ln_1p())
    }

    fn log_partition_param(&self) -> Result<f64> {
        Ok(-(-self.get_params()?).ln_1p())
    }

    fn update_parameters_em(&mut self, values: &[f64], responsibilities: &[f64]) -> Result<()> {
        let (p, _) = weighted_mean(values, responsibilities)?;
        self.set_params(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn test_initialization() {
        assert!(Bernoulli::new(0.0).is_ok());
        assert!(Bernoulli::new(1.0).is_ok());
        assert!(Bernoulli::new(-0.01).is_err());
        assert!(Bernoulli::new(1.01).is_err());
        assert!(Bernoulli::new(f64::NAN).is_err());
        assert!(Bernoulli::new(f64::INFINITY).is_err());
    }

    #[test]
    fn test_log_partition() {
        let b = Bernoulli::new(0.3).unwrap();
        let a = b.log_partition_natural().unwrap();
        assert!((a - b.log_partition_param().unwrap()).abs() < 1e-12);
        assert!((a - (1.0f64 / 0.7).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_em_update() {
        let mut b = Bernoulli::new(0.5).unwrap();
        b.update_parameters_em(&[1.0, 0.0, 0.0, 0.0], &[1.0; 4]).unwrap();
        assert!((b.get_params().unwrap() - 0.25).abs() < 1e-12);
    }
}
