//! Human-readable status messages, kept out of the tracker core.
//!
//! Lookup is a total function over `(operation kind, status)`: deployments
//! override individual entries from YAML, everything else falls back to the
//! built-in table. The tracker never consumes the catalog; callers render
//! events through it.

use std::collections::HashMap;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::{OperationKind, OperationStatus, Stage};

/// Message table: optional per-kind, per-status overrides over a complete
/// default vocabulary.
///
/// YAML override shape, keyed by wire names:
///
/// ```yaml
/// mint:
///   waitingForMining: "Minting: waiting for the ledger."
/// createToken:
///   indexed: "Token deployed and visible."
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct MessageCatalog {
    overrides: HashMap<String, HashMap<String, String>>,
}

impl MessageCatalog {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Load overrides from a YAML file.
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Message for a status of an operation kind. Total: unknown pairs fall
    /// back to the default table.
    pub fn message(&self, kind: OperationKind, status: &OperationStatus) -> String {
        if let Some(message) = self
            .overrides
            .get(kind.wire_name())
            .and_then(|by_status| by_status.get(status.label()))
        {
            return message.clone();
        }
        default_message(kind, status)
    }
}

/// Built-in vocabulary. Capitalizes the kind's label for sentence starts.
fn default_message(kind: OperationKind, status: &OperationStatus) -> String {
    let label = kind.label();
    match status {
        OperationStatus::Preparing => format!("Preparing {}: awaiting authorization.", label),
        OperationStatus::Submitting => format!("Submitting {} to the ledger.", label),
        OperationStatus::WaitingForMining => {
            format!("{} submitted; waiting for the transaction to be mined.", sentence(label))
        }
        OperationStatus::Mined { block } => {
            format!("Transaction mined in block {}.", block.number)
        }
        OperationStatus::WaitingForIndexing => {
            "Transaction mined; waiting for the change to become visible.".to_string()
        }
        OperationStatus::Indexed => format!("{} complete.", sentence(label)),
        OperationStatus::Failed { reason } => match reason {
            Some(reason) => format!("{} failed: {}.", sentence(label), reason),
            None => format!("{} failed.", sentence(label)),
        },
        OperationStatus::Dropped => format!(
            "The {} transaction was dropped before mining. Check the ledger before retrying.",
            label
        ),
        OperationStatus::TimedOut {
            stage: Stage::Mining,
        } => format!(
            "Timed out waiting for the {} transaction to be mined. Its outcome is unknown; check the ledger before retrying.",
            label
        ),
        OperationStatus::TimedOut {
            stage: Stage::Indexing,
        } => format!(
            "{} succeeded on the ledger but is not yet visible. No action needed.",
            sentence(label)
        ),
        OperationStatus::Cancelled => format!("Stopped watching the {}.", label),
    }
}

fn sentence(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
