//! Features Module - Transaction schema
//!
//! `Transaction` is what arrives on the wire, `FeatureLayout` turns it into
//! an ordered vector the scaler and classifier understand.

pub mod layout;
pub mod transaction;

use thiserror::Error;

pub use layout::FeatureLayout;
pub use transaction::Transaction;

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("feature layout is empty")]
    EmptyLayout,

    #[error("feature at position {0} has an empty name")]
    EmptyName(usize),

    #[error("duplicate feature: {0}")]
    DuplicateFeature(String),

    #[error("missing feature: {0}")]
    MissingFeature(String),

    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    #[error("feature {feature} is not finite: {value}")]
    NonFinite { feature: String, value: f64 },

    #[error("cannot fit on an empty partition")]
    EmptyFit,

    #[error("fitted statistics for {0} are not finite")]
    NonFiniteStatistic(String),

    #[error("expected {expected} features, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },
}
