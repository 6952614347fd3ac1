//! Out-of-band creation input
//!
//! Privacy-sensitive creation fields travel in the invocation's transient
//! field set, never in recorded arguments. The registry pulls fields
//! through [`FieldSource`] so the same construction path serves transient
//! input (private assets) and direct arguments (public assets).

use crate::error::{ContractError, Result};
use std::collections::BTreeMap;

/// Decoded creation fields keyed by field name
pub type FieldMap = BTreeMap<String, String>;

/// A source of named creation fields
pub trait FieldSource {
    /// Look up one field; `None` when absent
    fn field(&self, name: &str) -> Result<Option<String>>;
}

impl FieldSource for FieldMap {
    fn field(&self, name: &str) -> Result<Option<String>> {
        Ok(self.get(name).cloned())
    }
}

/// The transient field set attached to one invocation.
///
/// Values arrive as raw bytes from the submitting client and are decoded
/// on access; they are never persisted verbatim.
#[derive(Debug, Clone, Default)]
pub struct TransientInputs(BTreeMap<String, Vec<u8>>);

impl TransientInputs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl FieldSource for TransientInputs {
    fn field(&self, name: &str) -> Result<Option<String>> {
        match self.0.get(name) {
            Some(bytes) => {
                let value = std::str::from_utf8(bytes).map_err(|_| {
                    ContractError::BadArguments(format!(
                        "transient field {} is not valid UTF-8",
                        name
                    ))
                })?;
                Ok(Some(value.to_string()))
            }
            None => Ok(None),
        }
    }
}

impl<S: Into<String>, V: Into<Vec<u8>>> FromIterator<(S, V)> for TransientInputs {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}
