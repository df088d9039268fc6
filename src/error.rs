//! Error types shared by every part of the crate.

use thiserror::Error;

use crate::types::NodeType;

/// Errors raised while building or evaluating a Sum-Product Network.
///
/// None of these are retried internally: every variant describes a violated
/// precondition and is surfaced to the caller as soon as it is detected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpnError {
    /// The graph breaks a structural invariant (scope mismatch, malformed weights, cycle).
    #[error("Structural error: {message}")]
    Structural { message: String },

    /// Leaf parameters are unset or out of their domain.
    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },

    /// An observation lies outside the support of a distribution.
    #[error("Domain error: {message}")]
    Domain { message: String },

    /// No adapter or capability is available for a node.
    #[error("Not implemented: {message}")]
    NotImplemented { message: String },

    /// The bottom-up evaluator found a node kind without an applicable handler.
    #[error("No handler associated with node type: {node_type}")]
    MissingHandler { node_type: NodeType },

    /// Input data does not fit the network.
    #[error("Shape mismatch: {message}")]
    Shape { message: String },
}

impl SpnError {
    pub fn structural(message: impl Into<String>) -> Self {
        SpnError::Structural {
            message: message.into(),
        }
    }

    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        SpnError::InvalidParameters {
            message: message.into(),
        }
    }

    pub fn domain(message: impl Into<String>) -> Self {
        SpnError::Domain {
            message: message.into(),
        }
    }

    pub fn not_implemented(message: impl Into<String>) -> Self {
        SpnError::NotImplemented {
            message: message.into(),
        }
    }

    pub fn shape(message: impl Into<String>) -> Self {
        SpnError::Shape {
            message: message.into(),
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, SpnError::Structural { .. })
    }
    pub fn is_invalid_parameters(&self) -> bool {
        matches!(self, SpnError::InvalidParameters { .. })
    }
    pub fn is_domain(&self) -> bool {
        matches!(self, SpnError::Domain { .. })
    }
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, SpnError::NotImplemented { .. })
    }
}

pub type Result<T, E = SpnError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    use crate::types::LeafType;

    #[test]
    fn test_display() {
        let err = SpnError::structural("cycle");
        assert_eq!(err.to_string(), "Structural error: cycle");

        let err = SpnError::MissingHandler {
            node_type: NodeType::Leaf(LeafType::Gaussian),
        };
        assert_eq!(err.to_string(), "No handler associated with node type: Gaussian");
    }

    #[test]
    fn test_predicates() {
        assert!(SpnError::domain("x").is_domain());
        assert!(!SpnError::domain("x").is_structural());
        assert!(SpnError::invalid_parameters("x").is_invalid_parameters());
        assert!(SpnError::not_implemented("x").is_not_implemented());
    }
}
