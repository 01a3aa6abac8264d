use super::*;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode as HttpStatus,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use shared::protocol::MoveArg;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct MockAgentState {
    approved: bool,
    reject_signatures: bool,
    signed: Arc<Mutex<Vec<EntryFunctionPayload>>>,
}

async fn connect() -> impl IntoResponse {
    Json(json!({ "address": "0xA1", "public_key": "0xpub" }))
}

async fn account(State(state): State<MockAgentState>) -> impl IntoResponse {
    if state.approved {
        (HttpStatus::OK, Json(json!({ "address": "0xA1" })))
    } else {
        (
            HttpStatus::NOT_FOUND,
            Json(json!({ "code": "unauthorized", "message": "no approved session" })),
        )
    }
}

async fn sign_and_submit(
    State(state): State<MockAgentState>,
    Json(payload): Json<EntryFunctionPayload>,
) -> impl IntoResponse {
    if state.reject_signatures {
        return (
            HttpStatus::FORBIDDEN,
            Json(json!({ "code": "user_rejected", "message": "User rejected the request" })),
        );
    }
    let mut signed = state.signed.lock().await;
    signed.push(payload);
    (
        HttpStatus::OK,
        Json(json!({ "hash": format!("0xhash{}", signed.len()) })),
    )
}

async fn spawn_agent_server(state: MockAgentState) -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = Router::new()
        .route("/connect", post(connect))
        .route("/account", get(account))
        .route("/sign_and_submit", post(sign_and_submit))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}/"))
}

fn list_payload() -> EntryFunctionPayload {
    EntryFunctionPayload::new(
        "0xCAFE::AutoLending::list_vehicle",
        Vec::new(),
        vec![MoveArg::U64(1), MoveArg::U64(100)],
    )
}

#[tokio::test]
async fn connect_returns_the_agent_account() -> Result<()> {
    let base_url = spawn_agent_server(MockAgentState::default()).await?;
    let agent = HttpSigningAgent::new(base_url);

    assert_eq!(agent.connect().await?, AccountAddress::new("0xA1"));
    Ok(())
}

#[tokio::test]
async fn account_without_approved_session_is_none() -> Result<()> {
    let base_url = spawn_agent_server(MockAgentState::default()).await?;
    let agent = HttpSigningAgent::new(base_url);

    assert_eq!(agent.account().await?, None);
    Ok(())
}

#[tokio::test]
async fn account_with_approved_session_is_returned() -> Result<()> {
    let base_url = spawn_agent_server(MockAgentState {
        approved: true,
        ..MockAgentState::default()
    })
    .await?;
    let agent = HttpSigningAgent::new(base_url);

    assert_eq!(agent.account().await?, Some(AccountAddress::new("0xA1")));
    Ok(())
}

#[tokio::test]
async fn signing_forwards_payload_and_returns_hash() -> Result<()> {
    let state = MockAgentState::default();
    let base_url = spawn_agent_server(state.clone()).await?;
    let agent = HttpSigningAgent::new(base_url);

    let hash = agent
        .sign_and_submit_transaction(&list_payload())
        .await?;

    assert_eq!(hash, TxHash::new("0xhash1"));
    let signed = state.signed.lock().await;
    assert_eq!(signed.as_slice(), [list_payload()]);
    Ok(())
}

#[tokio::test]
async fn rejection_in_the_wallet_maps_to_rejected() -> Result<()> {
    let state = MockAgentState {
        reject_signatures: true,
        ..MockAgentState::default()
    };
    let base_url = spawn_agent_server(state.clone()).await?;
    let agent = HttpSigningAgent::new(base_url);

    let err = agent
        .sign_and_submit_transaction(&list_payload())
        .await
        .expect_err("rejected");

    assert_eq!(err, AgentError::Rejected);
    assert!(state.signed.lock().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn unreachable_agent_is_unavailable() -> Result<()> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    let agent = HttpSigningAgent::new(format!("http://{addr}"));

    assert_eq!(agent.connect().await.expect_err("closed port"), AgentError::Unavailable);
    Ok(())
}

#[tokio::test]
async fn missing_agent_is_always_unavailable() {
    let agent = MissingSigningAgent;
    assert_eq!(agent.connect().await, Err(AgentError::Unavailable));
    assert_eq!(agent.account().await, Err(AgentError::Unavailable));
    assert_eq!(
        agent
            .sign_and_submit_transaction(&list_payload())
            .await,
        Err(AgentError::Unavailable)
    );
}
