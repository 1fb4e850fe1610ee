//! Feature Layout - Ordered feature schema shared by scaler and model
//!
//! **The layout controls how a transaction becomes a vector**
//!
//! ## Rules:
//! 1. The layout is fixed when the scaler is fitted (CSV header order)
//! 2. Scaler and model artifacts both carry its hash
//! 3. Serving never reorders, adds or drops features

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use super::transaction::Transaction;
use super::FeatureError;

// ============================================================================
// FEATURE LAYOUT
// ============================================================================

/// Feature names in the exact order they appear in every vector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureLayout {
    names: Vec<String>,
}

impl FeatureLayout {
    /// Build a layout, rejecting empty and duplicate names
    pub fn new(names: Vec<String>) -> Result<Self, FeatureError> {
        if names.is_empty() {
            return Err(FeatureError::EmptyLayout);
        }

        for (i, name) in names.iter().enumerate() {
            if name.is_empty() {
                return Err(FeatureError::EmptyName(i));
            }
            if names[..i].contains(name) {
                return Err(FeatureError::DuplicateFeature(name.clone()));
            }
        }

        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get feature index by name (O(n) but features are few)
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// CRC32 of the ordered names, used to detect mismatched artifacts
    pub fn layout_hash(&self) -> u32 {
        let mut hasher = Hasher::new();
        for name in &self.names {
            hasher.update(name.as_bytes());
            hasher.update(&[0]); // Separator
        }
        hasher.finalize()
    }

    /// Order a transaction's values by this layout.
    ///
    /// Fails on a missing feature, an unknown feature or a non-finite value.
    pub fn vectorize(&self, transaction: &Transaction) -> Result<Vec<f64>, FeatureError> {
        if let Some(unknown) = transaction
            .feature_names()
            .find(|name| self.index_of(name).is_none())
        {
            return Err(FeatureError::UnknownFeature(unknown.to_string()));
        }

        self.names
            .iter()
            .map(|name| match transaction.get(name) {
                Some(value) if value.is_finite() => Ok(value),
                Some(value) => Err(FeatureError::NonFinite {
                    feature: name.clone(),
                    value,
                }),
                None => Err(FeatureError::MissingFeature(name.clone())),
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(names: &[&str]) -> FeatureLayout {
        FeatureLayout::new(names.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_rejects_empty_and_duplicates() {
        assert!(matches!(FeatureLayout::new(vec![]), Err(FeatureError::EmptyLayout)));

        let dup = FeatureLayout::new(vec!["V1".into(), "V2".into(), "V1".into()]);
        assert!(matches!(dup, Err(FeatureError::DuplicateFeature(name)) if name == "V1"));
    }

    #[test]
    fn test_layout_hash_depends_on_order() {
        let a = layout(&["Time", "V1", "Amount"]);
        let b = layout(&["V1", "Time", "Amount"]);

        assert_eq!(a.layout_hash(), layout(&["Time", "V1", "Amount"]).layout_hash());
        assert_ne!(a.layout_hash(), b.layout_hash());
    }

    #[test]
    fn test_vectorize_orders_by_layout() {
        let l = layout(&["Time", "V1", "Amount"]);
        let tx = Transaction::from_pairs([("Amount", 9.5), ("Time", 1.0), ("V1", -0.3)]);

        assert_eq!(l.vectorize(&tx).unwrap(), vec![1.0, -0.3, 9.5]);
    }

    #[test]
    fn test_vectorize_missing_feature() {
        let l = layout(&["Time", "V1", "Amount"]);
        let tx = Transaction::from_pairs([("Time", 1.0), ("V1", -0.3)]);

        assert!(matches!(l.vectorize(&tx), Err(FeatureError::MissingFeature(name)) if name == "Amount"));
    }

    #[test]
    fn test_vectorize_unknown_feature() {
        let l = layout(&["Time"]);
        let tx = Transaction::from_pairs([("Time", 1.0), ("Merchant", 3.0)]);

        assert!(matches!(l.vectorize(&tx), Err(FeatureError::UnknownFeature(name)) if name == "Merchant"));
    }

    #[test]
    fn test_vectorize_non_finite() {
        let l = layout(&["Amount"]);
        let tx = Transaction::from_pairs([("Amount", f64::NAN)]);

        assert!(matches!(l.vectorize(&tx), Err(FeatureError::NonFinite { .. })));
    }

    #[test]
    fn test_index_of() {
        let l = layout(&["Time", "V1", "Amount"]);
        assert_eq!(l.index_of("Time"), Some(0));
        assert_eq!(l.index_of("Amount"), Some(2));
        assert_eq!(l.index_of("nonexistent"), None);
    }
}
