use rand::Rng;

use crate::error::{Result, SpnError};
use crate::leaves::{require, unknown_parameter, weighted_mean, LeafAdapter};
use crate::stats::{Family, Parameters};
use crate::types::LeafType;

/// Geometric distribution: number of trials up to and including the first success.
///
/// Support is `k >= 1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometric {
    p: Option<f64>,
}

impl Geometric {
    pub fn new(p: f64) -> Result<Self> {
        let mut d = Geometric { p: None };
        d.set_params(p)?;
        Ok(d)
    }

    pub fn init<R>(p: Option<f64>, rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        Self::new(p.unwrap_or_else(|| 1.0 - rng.random::<f64>()))
    }

    pub fn set_params(&mut self, p: f64) -> Result<()> {
        if !p.is_finite() || p <= 0.0 || p > 1.0 {
            return Err(SpnError::invalid_parameters(format!(
                "Value of p for Geometric distribution must be in (0.0, 1.0], but was: {}",
                p
            )));
        }
        self.p = Some(p);
        Ok(())
    }

    pub fn get_params(&self) -> Result<f64> {
        require(self.p, "p", LeafType::Geometric)
    }
}

impl LeafAdapter for Geometric {
    fn leaf_type(&self) -> LeafType {
        LeafType::Geometric
    }

    fn family(&self) -> Family {
        Family::Geom
    }

    fn parameters(&self) -> Result<Parameters> {
        Ok(Parameters::from([("p", self.get_params()?)]))
    }

    fn unset_parameter(&mut self, name: &str) -> Result<()> {
        match name {
            "p" => self.p = None,
            _ => return Err(unknown_parameter(name, LeafType::Geometric)),
        }
        Ok(())
    }

    fn natural_parameters(&self) -> Result<Vec<f64>> {
        Ok(vec![(-self.get_params()?).ln_1p()])
    }

    fn base_measure(&self, _x: f64) -> Result<f64> {
        Ok(1.0)
    }

    fn sufficient_statistics(&self, x: f64) -> Result<Vec<f64>> {
        Ok(vec![x - 1.0])
    }

    fn log_partition_natural(&self) -> Result<f64> {
        let eta = self.natural_parameters()?[0];
        Ok(-(-eta.exp()).ln_1p())
    }

    fn log_partition_param(&self) -> Result<f64> {
        Ok(-self.get_params()?.ln())
    }

    fn update_parameters_em(&mut self, values: &[f64], responsibilities: &[f64]) -> Result<()> {
        let (mean, _) = weighted_mean(values, responsibilities)?;
        if !(mean >= 1.0) {
            return Err(SpnError::domain(format!(
                "Geometric cannot be fitted to data with mean {}",
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
        assert!(Geometric::new(1.0).is_ok());
        assert!(Geometric::new(0.0).is_err());
        assert!(Geometric::new(1.2).is_err());
    }

    #[test]
    fn test_em_update() {
        let mut d = Geometric::new(0.5).unwrap();
        d.update_parameters_em(&[1.0, 3.0, 4.0], &[1.0, 1.0, 2.0]).unwrap();
        assert!((d.get_params().unwrap() - 1.0 / 3.0).abs() < 1e-12);
    }
}
