use rand::Rng;

use crate::error::{Result, SpnError};
use crate::leaves::{check_probability, require, unknown_parameter, weighted_mean, LeafAdapter};
use crate::stats::{ln_binomial, Family, Parameters};
use crate::types::LeafType;

/// Binomial distribution: number of successes in `n` independent trials.
///
/// ```text
/// PMF(k) = C(n, k) * p^k * (1 - p)^(n - k)
/// ```
///
/// The exponential-family view treats `n` as fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct Binomial {
    n: Option<u64>,
    p: Option<f64>,
}

impl Binomial {
    pub fn new(n: u64, p: f64) -> Result<Self> {
        let mut b = Binomial { n: None, p: None };
        b.set_params(n, p)?;
        Ok(b)
    }

    /// Create a Binomial, drawing `n` from `1..=10` and `p ~ U(0, 1)` if omitted.
    pub fn init<R>(n: Option<u64>, p: Option<f64>, rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        let n = n.unwrap_or_else(|| rng.random_range(1..=10));
        let p = p.unwrap_or_else(|| rng.random::<f64>());
        Self::new(n, p)
    }

    pub fn set_params(&mut self, n: u64, p: f64) -> Result<()> {
        check_probability(p, "p", LeafType::Binomial)?;
        self.n = Some(n);
        self.p = Some(p);
        Ok(())
    }

    pub fn get_params(&self) -> Result<(u64, f64)> {
        Ok((
            require(self.n, "n", LeafType::Binomial)?,
            require(self.p, "p", LeafType::Binomial)?,
        ))
    }
}

impl LeafAdapter for Binomial {
    fn leaf_type(&self) -> LeafType {
        LeafType::Binomial
    }

    fn family(&self) -> Family {
        Family::Binom
    }

    fn parameters(&self) -> Result<Parameters> {
        let (n, p) = self.get_params()?;
        Ok(Parameters::from([("n", n as f64), ("p", p)]))
    }

    fn unset_parameter(&mut self, name: &str) -> Result<()> {
        match name {
            "n" => self.n = None,
            "p" => self.p = None,
            _ => return Err(unknown_parameter(name, LeafType::Binomial)),
        }
        Ok(())
    }

    fn natural_parameters(&self) -> Result<Vec<f64>> {
        let (_, p) = self.get_params()?;
        Ok(vec![(p / (1.0 - p)).ln()])
    }

    fn base_measure(&self, x: f64) -> Result<f64> {
        let (n, _) = self.get_params()?;
        if x < 0.0 || x.fract() != 0.0 {
            return Ok(0.0);
        }
        Ok(ln_binomial(n, x as u64).exp())
    }

    fn sufficient_statistics(&self, x: f64) -> Result<Vec<f64>> {
        Ok(vec![x])
    }

    fn log_partition_natural(&self) -> Result<f64> {
        let (n, _) = self.get_params()?;
        let eta = self.natural_parameters()?[0];
        Ok(n as f64 * eta.exp().ln_1p())
    }

    fn log_partition_param(&self) -> Result<f64> {
        let (n, p) = self.get_params()?;
        Ok(-(n as f64) * (-p).ln_1p())
    }

    fn update_parameters_em(&mut self, values: &[f64], responsibilities: &[f64]) -> Result<()> {
        let (n, _) = self.get_params()?;
        if n == 0 {
            return Err(SpnError::invalid_parameters(
                "cannot estimate p of a Binomial with zero trials",
            ));
        }
        let (mean, _) = weighted_mean(values, responsibilities)?;
        self.set_params(n, mean / n as f64)
    }
}
