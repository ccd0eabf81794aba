//! Contract tests for the HTTP bindings: every error code and wire status
//! the services can return maps onto the tracker's taxonomy.

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use waypoint_core::{
    ActionDescriptor, AuthFailure, AuthorizationChallenge, ChallengeProvider, EntityProbe,
    GatewayError, Indexer, LedgerGateway, OperationKind, OperationRequest, ResourceAddress,
    SubmissionError, TransactionHandle, TransactionStatus, UserId,
};
use waypoint_gateway::{EndpointConfig, HttpGateway, HttpIndexer};

fn request() -> OperationRequest {
    OperationRequest::new(
        OperationKind::Mint,
        ResourceAddress::parse("0x00000000000000000000000000000000000000cc").unwrap(),
        UserId::new("operator-1"),
    )
    .with_payload(json!({"amount": "250"}))
}

fn challenge() -> AuthorizationChallenge {
    AuthorizationChallenge::new("ch_1", "482913")
}

fn gateway_for(server: &MockServer) -> HttpGateway {
    HttpGateway::new(EndpointConfig::parse(&server.uri()).unwrap())
}

// =============================================================================
// Submission
// =============================================================================
#[tokio::test]
async fn submit_posts_the_challenge_proof_and_returns_the_handle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/operations"))
        .and(body_partial_json(json!({
            "kind": "mint",
            "target": "0x00000000000000000000000000000000000000cc",
            "actorId": "operator-1",
            "challengeId": "ch_1",
            "proof": "482913",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "transactionId": "0xfeedbeef"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let handle = gateway
        .submit_operation(&request(), challenge())
        .await
        .unwrap();
    assert_eq!(handle.as_str(), "0xfeedbeef");
}

#[tokio::test]
async fn gateway_rejection_carries_the_error_code() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/operations"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "errorCode": "insufficient_permission",
            "message": "caller lacks MINTER role",
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway
        .submit_operation(&request(), challenge())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SubmissionError::Rejected {
            code: "insufficient_permission".into(),
            message: "caller lacks MINTER role".into(),
        }
    );
}

#[tokio::test]
async fn gateway_5xx_is_a_transport_error_not_a_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/operations"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway
        .submit_operation(&request(), challenge())
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::Transport { .. }), "{:?}", err);
}

#[tokio::test]
async fn unreachable_gateway_is_a_transport_error() {
    // Unroutable without a server: connection refused.
    let gateway = HttpGateway::new(EndpointConfig::parse("http://127.0.0.1:9").unwrap());
    let err = gateway
        .submit_operation(&request(), challenge())
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::Transport { .. }), "{:?}", err);
}

// =============================================================================
// Transaction status
// =============================================================================
#[tokio::test]
async fn transaction_statuses_map_onto_the_vocabulary() {
    let server = MockServer::start().await;
    let cases = [
        (json!({"status": "pending"}), TransactionStatus::Pending),
        (
            json!({"status": "mined", "blockNumber": 77, "blockHash": "0xabc"}),
            TransactionStatus::Mined {
                block: waypoint_core::BlockRef {
                    number: 77,
                    hash: Some("0xabc".into()),
                },
            },
        ),
        (
            json!({"status": "reverted", "revertReason": "InsufficientBalance"}),
            TransactionStatus::Reverted {
                reason: Some("InsufficientBalance".into()),
            },
        ),
        (json!({"status": "dropped"}), TransactionStatus::Dropped),
    ];

    let gateway = gateway_for(&server);
    for (index, (body, expected)) in cases.into_iter().enumerate() {
        let tx = TransactionHandle::new(format!("0xtx{}", index));
        Mock::given(method("GET"))
            .and(path(format!("/transactions/{}", tx.as_str())))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        let status = gateway.transaction_status(&tx).await.unwrap();
        assert_eq!(status, expected);
    }
}

#[tokio::test]
async fn unknown_wire_status_is_an_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transactions/0xtx"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "simulated"})))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway
        .transaction_status(&TransactionHandle::new("0xtx"))
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::InvalidResponse { .. }), "{:?}", err);
}

#[tokio::test]
async fn status_poll_sends_the_configured_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/transactions/0xtx"))
        .and(header("authorization", "Bearer sekrit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "pending"})))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(
        EndpointConfig::parse(&server.uri())
            .unwrap()
            .with_auth_token("sekrit"),
    );
    let status = gateway
        .transaction_status(&TransactionHandle::new("0xtx"))
        .await
        .unwrap();
    assert_eq!(status, TransactionStatus::Pending);
}

// =============================================================================
// Challenges
// =============================================================================
#[tokio::test]
async fn challenge_issuance_round_trips() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/challenges"))
        .and(body_partial_json(json!({
            "userId": "operator-1",
            "kind": "mint",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "challengeId": "ch_9",
            "proof": "031337",
        })))
        .mount(&server)
        .await;

    let gateway = HttpGateway::new(EndpointConfig::parse(&server.uri())?);
    let action = ActionDescriptor::new(OperationKind::Mint, "mint on 0xcc");
    let challenge = gateway
        .obtain_challenge(&UserId::new("operator-1"), &action)
        .await?;
    assert_eq!(challenge.challenge_id, "ch_9");
    assert_eq!(challenge.into_proof(), "031337");
    Ok(())
}

#[tokio::test]
async fn challenge_error_codes_map_onto_distinct_failures() {
    let cases = [
        ("wrong_secret", AuthFailure::WrongSecret),
        ("factor_expired", AuthFailure::FactorExpired),
        ("factor_locked", AuthFailure::FactorLocked),
        ("no_factor", AuthFailure::NoFactorConfigured),
    ];

    let action = ActionDescriptor::new(OperationKind::Burn, "burn on 0xcc");
    for (code, expected) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/challenges"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({"errorCode": code})),
            )
            .mount(&server)
            .await;
        let gateway = gateway_for(&server);
        let err = gateway
            .obtain_challenge(&UserId::new("operator-1"), &action)
            .await
            .unwrap_err();
        assert_eq!(err, expected, "code {}", code);
    }
}

#[tokio::test]
async fn challenge_5xx_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/challenges"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway
        .obtain_challenge(
            &UserId::new("operator-1"),
            &ActionDescriptor::new(OperationKind::Pause, "pause on 0xcc"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AuthFailure::Unavailable { .. }), "{:?}", err);
}

// =============================================================================
// Indexer probes
// =============================================================================
#[tokio::test]
async fn probe_forwards_the_condition_and_reads_satisfied() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .and(body_partial_json(json!({
            "entity": "token:0xcc",
            "condition": {"totalSupply": "250"},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"satisfied": true})))
        .mount(&server)
        .await;

    let indexer = HttpIndexer::new(EndpointConfig::parse(&server.uri()).unwrap());
    let probe = EntityProbe::new("token:0xcc", json!({"totalSupply": "250"}));
    assert!(indexer.probe(&probe).await.unwrap());
}

#[tokio::test]
async fn probe_surfaces_indexer_outages_as_transport_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let indexer = HttpIndexer::new(EndpointConfig::parse(&server.uri()).unwrap());
    let probe = EntityProbe::new("token:0xcc", json!({"paused": true}));
    let err = indexer.probe(&probe).await.unwrap_err();
    assert!(matches!(
        err,
        waypoint_core::IndexerError::Transport { .. }
    ));
}
