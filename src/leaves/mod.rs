//! Parametric leaf distributions and their adapters.
//!
//! Every concrete distribution implements [`LeafAdapter`], which translates the
//! stored parameters into the argument convention of the statistics backend
//! ([`crate::stats`]) and optionally exposes exponential-family statistics and
//! an EM update.
//!
//! The free functions in this module are the entry points used by inference.
//! They resolve the adapter of a node and fail with
//! [`SpnError::NotImplemented`] when there is none, telling apart a leaf
//! without a distribution ("does not provide") from an inner node ("cannot
//! provide").
//!
//! Observations are read from column `scope[0]` of a [`DataMatrix`]. A `NaN`
//! cell is marginalized: probability 1, log-probability 0.

mod bernoulli;
mod binomial;
mod exponential;
mod gamma;
mod gaussian;
mod geometric;
mod hypergeometric;
mod log_normal;
mod negative_binomial;
mod poisson;

pub use bernoulli::Bernoulli;
pub use binomial::Binomial;
pub use exponential::Exponential;
pub use gamma::Gamma;
pub use gaussian::Gaussian;
pub use geometric::Geometric;
pub use hypergeometric::Hypergeometric;
pub use log_normal::LogNormal;
pub use negative_binomial::NegativeBinomial;
pub use poisson::Poisson;

use std::fmt;

use log::debug;
use rand::Rng;

use crate::data::DataMatrix;
use crate::error::{Result, SpnError};
use crate::reference::NodeId;
use crate::spn::Spn;
use crate::stats::{Family, Parameters};
use crate::types::LeafType;

/// Capabilities of a parametric leaf distribution.
///
/// Only [`leaf_type`](LeafAdapter::leaf_type), [`family`](LeafAdapter::family),
/// [`parameters`](LeafAdapter::parameters) and
/// [`unset_parameter`](LeafAdapter::unset_parameter) are mandatory. The
/// exponential-family methods and the EM update default to
/// [`SpnError::NotImplemented`].
pub trait LeafAdapter: fmt::Debug {
    fn leaf_type(&self) -> LeafType;

    /// The backend family used to evaluate this distribution.
    fn family(&self) -> Family;

    /// Stored parameters, renamed for the backend.
    ///
    /// Fails with [`SpnError::InvalidParameters`] if any parameter is unset.
    fn parameters(&self) -> Result<Parameters>;

    /// Clear a parameter, leaving the distribution unusable until it is set again.
    fn unset_parameter(&mut self, name: &str) -> Result<()>;

    /// Draw a value from the distribution.
    fn sample(&self, rng: &mut dyn rand::RngCore) -> Result<f64> {
        self.family().sample(&self.parameters()?, rng)
    }

    fn natural_parameters(&self) -> Result<Vec<f64>> {
        Err(unsupported(self.leaf_type(), "natural parameters"))
    }

    fn base_measure(&self, _x: f64) -> Result<f64> {
        Err(unsupported(self.leaf_type(), "a base measure"))
    }

    fn sufficient_statistics(&self, _x: f64) -> Result<Vec<f64>> {
        Err(unsupported(self.leaf_type(), "sufficient statistics"))
    }

    fn log_partition_natural(&self) -> Result<f64> {
        Err(unsupported(self.leaf_type(), "a log-partition function"))
    }

    fn log_partition_param(&self) -> Result<f64> {
        Err(unsupported(self.leaf_type(), "a log-partition function"))
    }

    /// One M-step over the observed (non-missing) values of the scope column.
    fn update_parameters_em(&mut self, _values: &[f64], _responsibilities: &[f64]) -> Result<()> {
        Err(unsupported(self.leaf_type(), "EM parameter updates"))
    }
}

fn unsupported(leaf_type: LeafType, what: &str) -> SpnError {
    SpnError::not_implemented(format!("{} does not provide {}", leaf_type, what))
}

/// Read a parameter that may have been unset.
pub(crate) fn require<T: Copy>(value: Option<T>, name: &str, leaf_type: LeafType) -> Result<T> {
    value.ok_or_else(|| {
        SpnError::invalid_parameters(format!(
            "Parameter '{}' of {} must not be None",
            name, leaf_type
        ))
    })
}

pub(crate) fn unknown_parameter(name: &str, leaf_type: LeafType) -> SpnError {
    SpnError::invalid_parameters(format!("{} has no parameter '{}'", leaf_type, name))
}

pub(crate) fn check_probability(p: f64, name: &str, leaf_type: LeafType) -> Result<()> {
    if !p.is_finite() || !(0.0..=1.0).contains(&p) {
        return Err(SpnError::invalid_parameters(format!(
            "Value of {} for {} distribution must be between 0.0 and 1.0, but was: {}",
            name, leaf_type, p
        )));
    }
    Ok(())
}

pub(crate) fn check_positive(value: f64, name: &str, leaf_type: LeafType) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(SpnError::invalid_parameters(format!(
            "Value of {} for {} distribution must be finite and greater than 0.0, but was: {}",
            name, leaf_type, value
        )));
    }
    Ok(())
}

pub(crate) fn check_finite(value: f64, name: &str, leaf_type: LeafType) -> Result<()> {
    if !value.is_finite() {
        return Err(SpnError::invalid_parameters(format!(
            "Value of {} for {} distribution must be finite, but was: {}",
            name, leaf_type, value
        )));
    }
    Ok(())
}

/// Responsibility-weighted mean of `values`, and the total responsibility mass.
pub(crate) fn weighted_mean(values: &[f64], responsibilities: &[f64]) -> Result<(f64, f64)> {
    if values.len() != responsibilities.len() {
        return Err(SpnError::shape(format!(
            "{} values but {} responsibilities",
            values.len(),
            responsibilities.len()
        )));
    }
    let total: f64 = responsibilities.iter().sum();
    if !(total > 0.0) {
        return Err(SpnError::invalid_parameters(
            "total responsibility mass must be positive",
        ));
    }
    let mean = values
        .iter()
        .zip(responsibilities)
        .map(|(x, r)| x * r)
        .sum::<f64>()
        / total;
    Ok((mean, total))
}

/// Responsibility-weighted standard deviation around `mean`.
pub(crate) fn weighted_stdev(values: &[f64], responsibilities: &[f64], mean: f64, total: f64) -> f64 {
    let var = values
        .iter()
        .zip(responsibilities)
        .map(|(x, r)| r * (x - mean) * (x - mean))
        .sum::<f64>()
        / total;
    var.sqrt()
}

/// The distribution carried by a leaf node.
#[derive(Debug, Clone, PartialEq)]
pub enum Leaf {
    /// A leaf without a distribution, e.g. a placeholder produced by a structure builder.
    Unparameterized,
    Gaussian(Gaussian),
    Bernoulli(Bernoulli),
    Binomial(Binomial),
    Hypergeometric(Hypergeometric),
    LogNormal(LogNormal),
    Poisson(Poisson),
    NegativeBinomial(NegativeBinomial),
    Exponential(Exponential),
    Gamma(Gamma),
    Geometric(Geometric),
}

impl Leaf {
    pub fn leaf_type(&self) -> LeafType {
        match self.adapter() {
            Some(adapter) => adapter.leaf_type(),
            None => LeafType::Unparameterized,
        }
    }

    pub fn adapter(&self) -> Option<&dyn LeafAdapter> {
        match self {
            Leaf::Unparameterized => None,
            Leaf::Gaussian(d) => Some(d),
            Leaf::Bernoulli(d) => Some(d),
            Leaf::Binomial(d) => Some(d),
            Leaf::Hypergeometric(d) => Some(d),
            Leaf::LogNormal(d) => Some(d),
            Leaf::Poisson(d) => Some(d),
            Leaf::NegativeBinomial(d) => Some(d),
            Leaf::Exponential(d) => Some(d),
            Leaf::Gamma(d) => Some(d),
            Leaf::Geometric(d) => Some(d),
        }
    }

    pub fn adapter_mut(&mut self) -> Option<&mut dyn LeafAdapter> {
        match self {
            Leaf::Unparameterized => None,
            Leaf::Gaussian(d) => Some(d),
            Leaf::Bernoulli(d) => Some(d),
            Leaf::Binomial(d) => Some(d),
            Leaf::Hypergeometric(d) => Some(d),
            Leaf::LogNormal(d) => Some(d),
            Leaf::Poisson(d) => Some(d),
            Leaf::NegativeBinomial(d) => Some(d),
            Leaf::Exponential(d) => Some(d),
            Leaf::Gamma(d) => Some(d),
            Leaf::Geometric(d) => Some(d),
        }
    }

    /// Draw a leaf of the given type with random valid parameters.
    pub fn random<R>(leaf_type: LeafType, rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        let leaf = match leaf_type {
            LeafType::Unparameterized => Leaf::Unparameterized,
            LeafType::Gaussian => Leaf::Gaussian(Gaussian::init(None, None, rng)?),
            LeafType::Bernoulli => Leaf::Bernoulli(Bernoulli::init(None, rng)?),
            LeafType::Binomial => Leaf::Binomial(Binomial::init(None, None, rng)?),
            LeafType::Hypergeometric => {
                Leaf::Hypergeometric(Hypergeometric::init(None, None, None, rng)?)
            }
            LeafType::LogNormal => Leaf::LogNormal(LogNormal::init(None, None, rng)?),
            LeafType::Poisson => Leaf::Poisson(Poisson::init(None, rng)?),
            LeafType::NegativeBinomial => {
                Leaf::NegativeBinomial(NegativeBinomial::init(None, None, rng)?)
            }
            LeafType::Exponential => Leaf::Exponential(Exponential::init(None, rng)?),
            LeafType::Gamma => Leaf::Gamma(Gamma::init(None, None, rng)?),
            LeafType::Geometric => Leaf::Geometric(Geometric::init(None, rng)?),
        };
        Ok(leaf)
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.adapter() {
            None => write!(f, "{}", self.leaf_type()),
            Some(adapter) => match adapter.parameters() {
                Ok(params) => write!(f, "{} - Param.: {:?}", self.leaf_type(), params),
                Err(_) => write!(f, "{} - Param.: <unset>", self.leaf_type()),
            },
        }
    }
}

macro_rules! impl_from_distribution {
    ($($t:ident),*) => {
        $(
            impl From<$t> for Leaf {
                fn from(d: $t) -> Self {
                    Leaf::$t(d)
                }
            }
        )*
    };
}

impl_from_distribution!(
    Gaussian,
    Bernoulli,
    Binomial,
    Hypergeometric,
    LogNormal,
    Poisson,
    NegativeBinomial,
    Exponential,
    Gamma,
    Geometric
);

/// Resolve the adapter of a node, or explain why there is none.
pub fn adapter<'a>(spn: &'a Spn, id: NodeId, capability: &str) -> Result<&'a dyn LeafAdapter> {
    let node = spn.node(id);
    match node.leaf() {
        Some(leaf) => leaf.adapter().ok_or_else(|| {
            SpnError::not_implemented(format!("{} does not provide {}", node, capability))
        }),
        None => Err(SpnError::not_implemented(format!(
            "{} cannot provide {}",
            node, capability
        ))),
    }
}

/// Mutable variant of [`adapter`].
pub fn adapter_mut<'a>(
    spn: &'a mut Spn,
    id: NodeId,
    capability: &str,
) -> Result<&'a mut dyn LeafAdapter> {
    let description = spn.node(id).to_string();
    match spn.leaf_mut(id) {
        Some(leaf) => leaf.adapter_mut().ok_or_else(|| {
            SpnError::not_implemented(format!("{} does not provide {}", description, capability))
        }),
        None => Err(SpnError::not_implemented(format!(
            "{} cannot provide {}",
            description, capability
        ))),
    }
}

/// Backend parameters of a leaf.
pub fn parameters(spn: &Spn, id: NodeId) -> Result<Parameters> {
    adapter(spn, id, "parameters")?.parameters()
}

fn scope_column(spn: &Spn, id: NodeId, data: &DataMatrix) -> Result<usize> {
    let col = spn.node(id).scope()[0];
    data.check_column(col)?;
    Ok(col)
}

/// Per-row log-probabilities of a leaf.
pub fn log_probability(spn: &Spn, id: NodeId, data: &DataMatrix) -> Result<Vec<f64>> {
    let adapter = adapter(spn, id, "log-probabilities")?;
    let params = adapter.parameters()?;
    let family = adapter.family();
    let col = scope_column(spn, id, data)?;
    data.column_iter(col)
        .map(|x| if x.is_nan() { Ok(0.0) } else { family.logpdf(x, &params) })
        .collect()
}

/// Per-row probabilities of a leaf.
pub fn probability(spn: &Spn, id: NodeId, data: &DataMatrix) -> Result<Vec<f64>> {
    let adapter = adapter(spn, id, "probabilities")?;
    let params = adapter.parameters()?;
    let family = adapter.family();
    let col = scope_column(spn, id, data)?;
    data.column_iter(col)
        .map(|x| if x.is_nan() { Ok(1.0) } else { family.pdf(x, &params) })
        .collect()
}

pub fn natural_parameters(spn: &Spn, id: NodeId) -> Result<Vec<f64>> {
    adapter(spn, id, "natural parameters")?.natural_parameters()
}

/// Per-row base measure; missing rows yield `NaN`.
pub fn base_measure(spn: &Spn, id: NodeId, data: &DataMatrix) -> Result<Vec<f64>> {
    let adapter = adapter(spn, id, "a base measure")?;
    let col = scope_column(spn, id, data)?;
    data.column_iter(col)
        .map(|x| if x.is_nan() { Ok(f64::NAN) } else { adapter.base_measure(x) })
        .collect()
}

/// Per-row sufficient statistics; missing rows yield an empty vector.
pub fn sufficient_statistics(spn: &Spn, id: NodeId, data: &DataMatrix) -> Result<Vec<Vec<f64>>> {
    let adapter = adapter(spn, id, "sufficient statistics")?;
    let col = scope_column(spn, id, data)?;
    data.column_iter(col)
        .map(|x| {
            if x.is_nan() {
                Ok(Vec::new())
            } else {
                adapter.sufficient_statistics(x)
            }
        })
        .collect()
}

pub fn log_partition_natural(spn: &Spn, id: NodeId) -> Result<f64> {
    adapter(spn, id, "a log-partition function")?.log_partition_natural()
}

pub fn log_partition_param(spn: &Spn, id: NodeId) -> Result<f64> {
    adapter(spn, id, "a log-partition function")?.log_partition_param()
}

/// One EM M-step for a leaf.
///
/// `responsibilities` holds one weight per data row. Rows whose scope value is
/// missing do not contribute.
pub fn update_parameters_em(
    spn: &mut Spn,
    id: NodeId,
    data: &DataMatrix,
    responsibilities: &[f64],
) -> Result<()> {
    if responsibilities.len() != data.rows() {
        return Err(SpnError::shape(format!(
            "{} responsibilities for {} rows",
            responsibilities.len(),
            data.rows()
        )));
    }
    let col = scope_column(spn, id, data)?;
    let (values, weights): (Vec<f64>, Vec<f64>) = data
        .column_iter(col)
        .zip(responsibilities.iter().copied())
        .filter(|(x, _)| !x.is_nan())
        .unzip();
    debug!(
        "update_parameters_em(node = {}, rows = {}, observed = {})",
        id,
        data.rows(),
        values.len()
    );
    adapter_mut(spn, id, "EM parameter updates")?.update_parameters_em(&values, &weights)
}

/// Invalidate a parameter of a leaf, see [`LeafAdapter::unset_parameter`].
pub fn unset_parameter(spn: &mut Spn, id: NodeId, name: &str) -> Result<()> {
    adapter_mut(spn, id, "parameters")?.unset_parameter(name)
}
