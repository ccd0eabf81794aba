//! Wire DTOs for the gateway, authorization, and indexer endpoints.

use serde::{Deserialize, Serialize};

use waypoint_core::{BlockRef, GatewayError, TransactionStatus};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmitBody<'a> {
    pub kind: &'a str,
    pub target: &'a str,
    pub payload: &'a serde_json::Value,
    pub actor_id: &'a str,
    pub challenge_id: &'a str,
    pub proof: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SubmitResponse {
    pub transaction_id: String,
}

/// Error payload the gateway and authorization service both use.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorBody {
    pub error_code: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TransactionStatusResponse {
    pub status: String,
    #[serde(default)]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub block_hash: Option<String>,
    #[serde(default)]
    pub revert_reason: Option<String>,
}

impl TransactionStatusResponse {
    /// Map the wire status onto the tracker's vocabulary. A `mined` report
    /// without a block number is invalid: the tracker propagates the block
    /// reference to its caller.
    pub(crate) fn into_status(self) -> Result<TransactionStatus, GatewayError> {
        match self.status.as_str() {
            "pending" => Ok(TransactionStatus::Pending),
            "mined" => {
                let number = self.block_number.ok_or_else(|| GatewayError::InvalidResponse {
                    message: "mined status without blockNumber".into(),
                })?;
                Ok(TransactionStatus::Mined {
                    block: BlockRef {
                        number,
                        hash: self.block_hash,
                    },
                })
            }
            "reverted" => Ok(TransactionStatus::Reverted {
                reason: self.revert_reason,
            }),
            "dropped" => Ok(TransactionStatus::Dropped),
            other => Err(GatewayError::InvalidResponse {
                message: format!("unknown transaction status: {}", other),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChallengeBody<'a> {
    pub user_id: &'a str,
    pub kind: &'a str,
    pub label: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChallengeResponse {
    pub challenge_id: String,
    pub proof: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProbeBody<'a> {
    pub entity: &'a str,
    pub condition: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProbeResponse {
    pub satisfied: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mined_without_block_number_is_invalid() {
        let response = TransactionStatusResponse {
            status: "mined".into(),
            block_number: None,
            block_hash: None,
            revert_reason: None,
        };
        assert!(matches!(
            response.into_status(),
            Err(GatewayError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn wire_statuses_map_onto_the_tracker_vocabulary() {
        let mined = TransactionStatusResponse {
            status: "mined".into(),
            block_number: Some(42),
            block_hash: Some("0xfeed".into()),
            revert_reason: None,
        };
        assert_eq!(
            mined.into_status().unwrap(),
            TransactionStatus::Mined {
                block: BlockRef {
                    number: 42,
                    hash: Some("0xfeed".into())
                }
            }
        );

        let reverted = TransactionStatusResponse {
            status: "reverted".into(),
            block_number: Some(43),
            block_hash: None,
            revert_reason: Some("InsufficientBalance".into()),
        };
        assert_eq!(
            reverted.into_status().unwrap(),
            TransactionStatus::Reverted {
                reason: Some("InsufficientBalance".into())
            }
        );
    }
}
