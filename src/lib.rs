//! # spn-rs: Sum-Product Networks in Rust
//!
//! **`spn-rs`** is an evaluation engine for **Sum-Product Networks (SPNs)**: tractable
//! probabilistic models represented as a directed acyclic graph of weighted mixtures
//! (sum nodes), factorizations over disjoint variables (product nodes), and univariate
//! parametric distributions (leaves).
//!
//! ## Key Features
//!
//! - **Arena-Centric Architecture**: All nodes live in an [`Spn`][crate::spn::Spn] arena and are referenced through lightweight [`NodeId`][crate::reference::NodeId] handles. Subgraphs may be shared by several parents.
//! - **Checked Construction**: Scope and weight invariants are validated when a node is built, so an evaluation never meets a malformed node.
//! - **Memoized Evaluation**: The generic [bottom-up and top-down evaluators][crate::eval] compute every unique node exactly once.
//! - **Missing Data**: A `NaN` cell marginalizes its variable.
//! - **Pluggable Handlers**: A [`Registry`][crate::dispatch::Registry] maps a network type, an inference kind, and a node type to a handler function.
//!
//! ## Basic Usage
//!
//! ```rust
//! use spn_rs::data::DataMatrix;
//! use spn_rs::dispatch::NetworkType;
//! use spn_rs::leaves::Gaussian;
//! use spn_rs::spn::Spn;
//!
//! # fn main() -> spn_rs::error::Result<()> {
//! let mut spn = Spn::default();
//!
//! // P(x, y) = 0.3 * N(x; 0, 1) N(y; 0, 1) + 0.7 * N(x; 1, 1) N(y; 1, 1)
//! let x0 = spn.mk_leaf(&[0], Gaussian::new(0.0, 1.0)?)?;
//! let y0 = spn.mk_leaf(&[1], Gaussian::new(0.0, 1.0)?)?;
//! let x1 = spn.mk_leaf(&[0], Gaussian::new(1.0, 1.0)?)?;
//! let y1 = spn.mk_leaf(&[1], Gaussian::new(1.0, 1.0)?)?;
//! let p0 = spn.mk_product(&[x0, y0], &[0, 1])?;
//! let p1 = spn.mk_product(&[x1, y1], &[0, 1])?;
//! let root = spn.mk_sum(&[p0, p1], &[0, 1], Some(&[0.3, 0.7]))?;
//!
//! // The second row leaves `x` unobserved.
//! let data = DataMatrix::from_rows([[0.5, 0.5], [f64::NAN, 0.5]])?;
//! let lik = spn.likelihood(NetworkType::Spn, root, &data)?;
//! let log_lik = spn.log_likelihood(NetworkType::Spn, root, &data)?;
//! assert!((lik[0] - log_lik[0].exp()).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Components
//!
//! - **[`spn`]**: The [`Spn`][crate::spn::Spn] arena and node construction.
//! - **[`leaves`]**: Leaf distributions and their adapters.
//! - **[`eval`]**: Generic bottom-up and top-down evaluation.
//! - **[`inference`]**, **[`gradient`]**, **[`sampling`]**: Queries built on top of the evaluators.

pub mod data;
pub mod debug;
pub mod dispatch;
pub mod error;
pub mod eval;
pub mod gradient;
pub mod inference;
pub mod leaves;
pub mod node;
pub mod reference;
pub mod sampling;
pub mod spn;
pub mod stats;
pub mod traversal;
pub mod types;
pub mod utils;
