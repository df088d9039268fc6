use rand::Rng;

use crate::error::{Result, SpnError};
use crate::leaves::{require, unknown_parameter, LeafAdapter};
use crate::stats::{Family, Parameters};
use crate::types::LeafType;

/// Hypergeometric distribution: successes in `n` draws without replacement.
///
/// ```text
/// PMF(k) = C(M, k) * C(N - M, n - k) / C(N, n)
/// ```
///
/// - `N`: population size,
/// - `M`: entities with the property of interest, `M <= N`,
/// - `n`: number of draws, `n <= N`.
///
/// No exponential-family form and no EM update.
#[derive(Debug, Clone, PartialEq)]
#[allow(non_snake_case)]
pub struct Hypergeometric {
    N: Option<u64>,
    M: Option<u64>,
    n: Option<u64>,
}

#[allow(non_snake_case)]
impl Hypergeometric {
    pub fn new(N: u64, M: u64, n: u64) -> Result<Self> {
        let mut h = Hypergeometric {
            N: None,
            M: None,
            n: None,
        };
        h.set_params(N, M, n)?;
        Ok(h)
    }

    /// Create a Hypergeometric, drawing `N` from `1..100`, then `M` and `n` from `0..N`.
    pub fn init<R>(N: Option<u64>, M: Option<u64>, n: Option<u64>, rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        let N = N.unwrap_or_else(|| rng.random_range(1..100));
        let M = M.unwrap_or_else(|| rng.random_range(0..N.max(1)));
        let n = n.unwrap_or_else(|| rng.random_range(0..N.max(1)));
        Self::new(N, M, n)
    }

    pub fn set_params(&mut self, N: u64, M: u64, n: u64) -> Result<()> {
        if M > N {
            return Err(SpnError::invalid_parameters(format!(
                "Value of M for Hypergeometric distribution must be less or equal to N ({}), but was: {}",
                N, M
            )));
        }
        if n > N {
            return Err(SpnError::invalid_parameters(format!(
                "Value of n for Hypergeometric distribution must be less or equal to N ({}), but was: {}",
                N, n
            )));
        }
        self.N = Some(N);
        self.M = Some(M);
        self.n = Some(n);
        Ok(())
    }

    pub fn get_params(&self) -> Result<(u64, u64, u64)> {
        Ok((
            require(self.N, "N", LeafType::Hypergeometric)?,
            require(self.M, "M", LeafType::Hypergeometric)?,
            require(self.n, "n", LeafType::Hypergeometric)?,
        ))
    }
}

impl LeafAdapter for Hypergeometric {
    fn leaf_type(&self) -> LeafType {
        LeafType::Hypergeometric
    }

    fn family(&self) -> Family {
        Family::Hypergeom
    }

    #[allow(non_snake_case)]
    fn parameters(&self) -> Result<Parameters> {
        let (N, M, n) = self.get_params()?;
        // The backend names population size `M`, successes `n` and draws `N`.
        Ok(Parameters::from([
            ("M", N as f64),
            ("n", M as f64),
            ("N", n as f64),
        ]))
    }

    fn unset_parameter(&mut self, name: &str) -> Result<()> {
        match name {
            "N" => self.N = None,
            "M" => self.M = None,
            "n" => self.n = None,
            _ => return Err(unknown_parameter(name, LeafType::Hypergeometric)),
        }
        Ok(())
    }
}
