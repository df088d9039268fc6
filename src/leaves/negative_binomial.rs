use rand::Rng;

use crate::error::{Result, SpnError};
use crate::leaves::{require, unknown_parameter, weighted_mean, LeafAdapter};
use crate::stats::{ln_binomial, Family, Parameters};
use crate::types::LeafType;

/// Negative binomial distribution: failures before the `n`-th success.
///
/// ```text
/// PMF(k) = C(k + n - 1, n - 1) * p^n * (1 - p)^k
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct NegativeBinomial {
    n: Option<u64>,
    p: Option<f64>,
}

impl NegativeBinomial {
    pub fn new(n: u64, p: f64) -> Result<Self> {
        let mut d = NegativeBinomial { n: None, p: None };
        d.set_params(n, p)?;
        Ok(d)
    }

    /// Create a NegativeBinomial, drawing `n` from `1..=10` and `p ~ U(0, 1]` if omitted.
    pub fn init<R>(n: Option<u64>, p: Option<f64>, rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        let n = n.unwrap_or_else(|| rng.random_range(1..=10));
        let p = p.unwrap_or_else(|| 1.0 - rng.random::<f64>());
        Self::new(n, p)
    }

    pub fn set_params(&mut self, n: u64, p: f64) -> Result<()> {
        if !p.is_finite() || p <= 0.0 || p > 1.0 {
            return Err(SpnError::invalid_parameters(format!(
                "Value of p for NegativeBinomial distribution must be in (0.0, 1.0], but was: {}",
                p
            )));
        }
        self.n = Some(n);
        self.p = Some(p);
        Ok(())
    }

    pub fn get_params(&self) -> Result<(u64, f64)> {
        Ok((
            require(self.n, "n", LeafType::NegativeBinomial)?,
            require(self.p, "p", LeafType::NegativeBinomial)?,
        ))
    }
}

impl LeafAdapter for NegativeBinomial {
    fn leaf_type(&self) -> LeafType {
        LeafType::NegativeBinomial
    }

    fn family(&self) -> Family {
        Family::NBinom
    }

    fn parameters(&self) -> Result<Parameters> {
        let (n, p) = self.get_params()?;
        Ok(Parameters::from([("n", n as f64), ("p", p)]))
    }

    fn unset_parameter(&mut self, name: &str) -> Result<()> {
        match name {
            "n" => self.n = None,
            "p" => self.p = None,
            _ => return Err(unknown_parameter(name, LeafType::NegativeBinomial)),
        }
        Ok(())
    }

    fn natural_parameters(&self) -> Result<Vec<f64>> {
        let (_, p) = self.get_params()?;
        Ok(vec![(-p).ln_1p()])
    }

    fn base_measure(&self, x: f64) -> Result<f64> {
        let (n, _) = self.get_params()?;
        if n == 0 {
            return Ok(if x == 0.0 { 1.0 } else { 0.0 });
        }
        if x < 0.0 || x.fract() != 0.0 {
            return Ok(0.0);
        }
        let k = x as u64;
        Ok(ln_binomial(k + n - 1, k).exp())
    }

    fn sufficient_statistics(&self, x: f64) -> Result<Vec<f64>> {
        Ok(vec![x])
    }

    fn log_partition_natural(&self) -> Result<f64> {
        let (n, _) = self.get_params()?;
        let eta = self.natural_parameters()?[0];
        Ok(-(n as f64) * (-eta.exp()).ln_1p())
    }

    fn log_partition_param(&self) -> Result<f64> {
        let (n, p) = self.get_params()?;
        Ok(-(n as f64) * p.ln())
    }

    /// Moment update with `n` fixed: `p = n / (n + mean)`.
    fn update_parameters_em(&mut self, values: &[f64], responsibilities: &[f64]) -> Result<()> {
        let (n, _) = self.get_params()?;
        let (mean, _) = weighted_mean(values, responsibilities)?;
        if n == 0 {
            return self.set_params(n, 1.0);
        }
        self.set_params(n, n as f64 / (n as f64 + mean))
    }
}
