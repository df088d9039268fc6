//! Statistics backend for the univariate families backing leaf nodes.
//!
//! Each [`Family`] reads its arguments from a [`Parameters`] map using its own
//! naming convention (the one from `scipy.stats`), builds the matching
//! [`statrs`] distribution and evaluates it. Adapters are responsible for
//! translating their stored parameters, see
//! [`LeafAdapter::parameters`][crate::leaves::LeafAdapter::parameters].
//!
//! | Family      | Arguments                                         | Support                    |
//! |-------------|---------------------------------------------------|----------------------------|
//! | `Norm`      | `loc`, `scale`                                    | reals                      |
//! | `LogNorm`   | `s`, `scale`                                      | `x > 0`                    |
//! | `Bernoulli` | `p`                                               | `{0, 1}`                   |
//! | `Binom`     | `n`, `p`                                          | `{0, ..., n}`              |
//! | `Hypergeom` | `M` (population), `n` (successes), `N` (draws)    | `{max(0, N-M+n), ..., min(n, N)}` |
//! | `Poisson`   | `mu`                                              | `{0, 1, ...}`              |
//! | `NBinom`    | `n`, `p`                                          | `{0, 1, ...}`              |
//! | `Expon`     | `scale`                                           | `x >= 0`                   |
//! | `Gamma`     | `a`, `scale`                                      | `x >= 0`                   |
//! | `Geom`      | `p`                                               | `{1, 2, ...}`              |
//!
//! Non-finite observations, and discrete observations that are not integers
//! inside the support, are rejected with [`SpnError::Domain`]. A continuous
//! family has density zero outside its support. A missing or out-of-range
//! argument is reported as [`SpnError::InvalidParameters`].

use std::collections::BTreeMap;
use std::fmt;

use rand::distr::{Distribution, Open01};
use rand::Rng;
use statrs::distribution::{self as dist, Continuous, ContinuousCDF, Discrete, DiscreteCDF};

use crate::error::{Result, SpnError};

pub use statrs::function::factorial::ln_binomial;
pub use statrs::function::gamma::ln_gamma;

/// Named arguments passed to a [`Family`].
pub type Parameters = BTreeMap<&'static str, f64>;

/// A univariate distribution family.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Family {
    Norm,
    LogNorm,
    Bernoulli,
    Binom,
    Hypergeom,
    Poisson,
    NBinom,
    Expon,
    Gamma,
    Geom,
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Family::Norm => "norm",
            Family::LogNorm => "lognorm",
            Family::Bernoulli => "bernoulli",
            Family::Binom => "binom",
            Family::Hypergeom => "hypergeom",
            Family::Poisson => "poisson",
            Family::NBinom => "nbinom",
            Family::Expon => "expon",
            Family::Gamma => "gamma",
            Family::Geom => "geom",
        };
        f.write_str(name)
    }
}

impl Family {
    pub fn is_discrete(self) -> bool {
        matches!(
            self,
            Family::Bernoulli
                | Family::Binom
                | Family::Hypergeom
                | Family::Poisson
                | Family::NBinom
                | Family::Geom
        )
    }

    fn arg(self, params: &Parameters, name: &str) -> Result<f64> {
        params.get(name).copied().ok_or_else(|| {
            SpnError::invalid_parameters(format!("{} requires argument '{}'", self, name))
        })
    }

    /// Integer-valued argument, e.g. a count of trials.
    fn count(self, params: &Parameters, name: &str) -> Result<u64> {
        let value = self.arg(params, name)?;
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
            return Err(SpnError::invalid_parameters(format!(
                "{} argument '{}' must be a non-negative integer, but was: {}",
                self, name, value
            )));
        }
        Ok(value as u64)
    }

    fn build<D, E>(self, built: std::result::Result<D, E>) -> Result<D>
    where
        E: fmt::Display,
    {
        built.map_err(|e| SpnError::invalid_parameters(format!("{}: {}", self, e)))
    }

    /// Integer support bounds `(low, high)` of a discrete family.
    pub fn support(self, params: &Parameters) -> Result<Option<(f64, f64)>> {
        let bounds = match self {
            Family::Bernoulli => (0.0, 1.0),
            Family::Binom => (0.0, self.arg(params, "n")?),
            Family::Hypergeom => {
                let pop = self.arg(params, "M")?;
                let succ = self.arg(params, "n")?;
                let draws = self.arg(params, "N")?;
                ((draws - (pop - succ)).max(0.0), succ.min(draws))
            }
            Family::Poisson | Family::NBinom => (0.0, f64::INFINITY),
            Family::Geom => (1.0, f64::INFINITY),
            _ => return Ok(None),
        };
        Ok(Some(bounds))
    }

    /// Checks `x` against a discrete support and returns it as a count.
    fn check_domain(self, x: f64, params: &Parameters) -> Result<Option<u64>> {
        if !x.is_finite() {
            return Err(SpnError::domain(format!(
                "{} cannot be evaluated at non-finite value {}",
                self, x
            )));
        }
        let Some((low, high)) = self.support(params)? else {
            return Ok(None);
        };
        if x.fract() != 0.0 {
            return Err(SpnError::domain(format!(
                "{} is only defined for integers, got {}",
                self, x
            )));
        }
        if x < low || x > high {
            return Err(SpnError::domain(format!(
                "{} value {} lies outside of support [{}, {}]",
                self, x, low, high
            )));
        }
        Ok(Some(x as u64))
    }

    /// Log-density (or log-mass) at `x`.
    pub fn logpdf(self, x: f64, params: &Parameters) -> Result<f64> {
        let k = self.check_domain(x, params)?.unwrap_or_default();
        let value = match self {
            Family::Norm => {
                let loc = self.arg(params, "loc")?;
                let scale = self.arg(params, "scale")?;
                self.build(dist::Normal::new(loc, scale))?.ln_pdf(x)
            }
            Family::LogNorm => {
                let s = self.arg(params, "s")?;
                let scale = self.arg(params, "scale")?;
                let d = self.build(dist::LogNormal::new(scale.ln(), s))?;
                if x <= 0.0 {
                    f64::NEG_INFINITY
                } else {
                    d.ln_pdf(x)
                }
            }
            Family::Bernoulli => {
                let p = self.arg(params, "p")?;
                self.build(dist::Bernoulli::new(p))?.ln_pmf(k)
            }
            Family::Binom => {
                let n = self.count(params, "n")?;
                let p = self.arg(params, "p")?;
                self.build(dist::Binomial::new(p, n))?.ln_pmf(k)
            }
            Family::Hypergeom => {
                let pop = self.count(params, "M")?;
                let succ = self.count(params, "n")?;
                let draws = self.count(params, "N")?;
                self.build(dist::Hypergeometric::new(pop, succ, draws))?
                    .ln_pmf(k)
            }
            Family::Poisson => {
                let mu = self.arg(params, "mu")?;
                if mu == 0.0 {
                    point_mass(k)
                } else {
                    self.build(dist::Poisson::new(mu))?.ln_pmf(k)
                }
            }
            Family::NBinom => {
                let n = self.arg(params, "n")?;
                let p = self.arg(params, "p")?;
                if n == 0.0 {
                    // Zero required successes: all mass sits at zero failures.
                    point_mass(k)
                } else {
                    self.build(dist::NegativeBinomial::new(n, p))?.ln_pmf(k)
                }
            }
            Family::Expon => {
                let scale = self.arg(params, "scale")?;
                let d = self.build(dist::Exp::new(1.0 / scale))?;
                if x < 0.0 {
                    f64::NEG_INFINITY
                } else {
                    d.ln_pdf(x)
                }
            }
            Family::Gamma => {
                let a = self.arg(params, "a")?;
                let scale = self.arg(params, "scale")?;
                let d = self.build(dist::Gamma::new(a, 1.0 / scale))?;
                if x < 0.0 {
                    f64::NEG_INFINITY
                } else if x == 0.0 {
                    // Density at the boundary: x^(a-1) dominates.
                    match a.partial_cmp(&1.0) {
                        Some(std::cmp::Ordering::Less) => f64::INFINITY,
                        Some(std::cmp::Ordering::Equal) => -scale.ln(),
                        _ => f64::NEG_INFINITY,
                    }
                } else {
                    d.ln_pdf(x)
                }
            }
            Family::Geom => {
                let p = self.arg(params, "p")?;
                self.build(dist::Geometric::new(p))?.ln_pmf(k)
            }
        };
        Ok(value)
    }

    /// Density (or mass) at `x`.
    pub fn pdf(self, x: f64, params: &Parameters) -> Result<f64> {
        Ok(self.logpdf(x, params)?.exp())
    }

    /// Draw one value by inverting the distribution function at a uniform
    /// variate from `rng`.
    pub fn sample<R>(self, params: &Parameters, rng: &mut R) -> Result<f64>
    where
        R: Rng + ?Sized,
    {
        let u: f64 = Open01.sample(rng);
        let value = match self {
            Family::Norm => {
                let loc = self.arg(params, "loc")?;
                let scale = self.arg(params, "scale")?;
                self.build(dist::Normal::new(loc, scale))?.inverse_cdf(u)
            }
            Family::LogNorm => {
                let s = self.arg(params, "s")?;
                let scale = self.arg(params, "scale")?;
                self.build(dist::LogNormal::new(scale.ln(), s))?
                    .inverse_cdf(u)
            }
            Family::Bernoulli => {
                let p = self.arg(params, "p")?;
                self.build(dist::Bernoulli::new(p))?.inverse_cdf(u) as f64
            }
            Family::Binom => {
                let n = self.count(params, "n")?;
                let p = self.arg(params, "p")?;
                self.build(dist::Binomial::new(p, n))?.inverse_cdf(u) as f64
            }
            Family::Hypergeom => {
                let pop = self.count(params, "M")?;
                let succ = self.count(params, "n")?;
                let draws = self.count(params, "N")?;
                self.build(dist::Hypergeometric::new(pop, succ, draws))?
                    .inverse_cdf(u) as f64
            }
            Family::Poisson => {
                let mu = self.arg(params, "mu")?;
                if mu == 0.0 {
                    0.0
                } else {
                    self.build(dist::Poisson::new(mu))?.inverse_cdf(u) as f64
                }
            }
            Family::NBinom => {
                let n = self.arg(params, "n")?;
                let p = self.arg(params, "p")?;
                if n == 0.0 || p == 1.0 {
                    0.0
                } else {
                    self.build(dist::NegativeBinomial::new(n, p))?
                        .inverse_cdf(u) as f64
                }
            }
            Family::Expon => {
                let scale = self.arg(params, "scale")?;
                self.build(dist::Exp::new(1.0 / scale))?.inverse_cdf(u)
            }
            Family::Gamma => {
                let a = self.arg(params, "a")?;
                let scale = self.arg(params, "scale")?;
                self.build(dist::Gamma::new(a, 1.0 / scale))?.inverse_cdf(u)
            }
            Family::Geom => {
                let p = self.arg(params, "p")?;
                self.build(dist::Geometric::new(p))?.inverse_cdf(u) as f64
            }
        };
        Ok(value)
    }
}

fn point_mass(k: u64) -> f64 {
    if k == 0 {
        0.0
    } else {
        f64::NEG_INFINITY
    }
}
