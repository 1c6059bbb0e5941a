use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use chain_client::ChainClient;
use chain_crypto::{Address, Hash256};

use crate::errors::RpcError;

pub type SharedClient = Arc<ChainClient>;

#[derive(Deserialize)]
pub struct Page {
    #[serde(default)]
    offset: usize,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    50
}

#[derive(Deserialize)]
pub struct EventsQuery {
    name: Option<String>,
    #[serde(default = "default_limit")]
    limit: usize,
}

pub async fn list_blocks(State(client): State<SharedClient>, Query(page): Query<Page>) -> Json<Value> {
    let blocks = client.list_blocks(page.offset, page.limit);
    Json(json!({ "blocks": blocks }))
}

pub async fn get_block(
    State(client): State<SharedClient>,
    Path(index): Path<u64>,
) -> Result<Json<Value>, RpcError> {
    client
        .get_block(index)
        .map(|block| Json(json!(block)))
        .ok_or(RpcError::BlockNotFound)
}

pub async fn get_latest_block(State(client): State<SharedClient>) -> Json<Value> {
    Json(json!(client.get_latest_block()))
}

pub async fn get_transaction(
    State(client): State<SharedClient>,
    Path(hash_hex): Path<String>,
) -> Result<Json<Value>, RpcError> {
    let hash = Hash256::from_hex(&hash_hex).map_err(|_| RpcError::TransactionNotFound)?;
    let (block_index, tx) = client
        .get_transaction(&hash)?
        .ok_or(RpcError::TransactionNotFound)?;
    Ok(Json(json!({ "block_index": block_index, "transaction": tx })))
}

pub async fn get_merkle_proof(
    State(client): State<SharedClient>,
    Path((block_index, tx_index)): Path<(u64, usize)>,
) -> Result<Json<Value>, RpcError> {
    let proof = client
        .get_merkle_proof(block_index, tx_index)?
        .ok_or(RpcError::TransactionNotFound)?;
    Ok(Json(json!(proof)))
}

pub async fn get_pending_transactions(State(client): State<SharedClient>) -> Json<Value> {
    Json(json!({ "pending": client.get_pending_transactions() }))
}

pub async fn get_account(
    State(client): State<SharedClient>,
    Path(address_hex): Path<String>,
) -> Result<Json<Value>, RpcError> {
    let address = Address::from_hex(&address_hex).map_err(|_| RpcError::AccountNotFound)?;
    let account = client.get_account(&address)?.ok_or(RpcError::AccountNotFound)?;
    Ok(Json(json!(account)))
}

pub async fn get_treasury(State(client): State<SharedClient>) -> Result<Json<Value>, RpcError> {
    let account = client.get_treasury_account()?.ok_or(RpcError::AccountNotFound)?;
    Ok(Json(json!(account)))
}

pub async fn get_sop_state(State(client): State<SharedClient>) -> Json<Value> {
    Json(json!({ "state": client.get_sop_state() }))
}

pub async fn get_current_proposal(State(client): State<SharedClient>) -> Result<Json<Value>, RpcError> {
    client
        .get_current_proposal()
        .map(|p| Json(json!(p)))
        .ok_or(RpcError::ProposalNotFound)
}

pub async fn get_sop_events(
    State(client): State<SharedClient>,
    Query(query): Query<EventsQuery>,
) -> Json<Value> {
    let events = client.get_events(query.name.as_deref(), query.limit);
    Json(json!({ "events": events }))
}

pub async fn check_consensus(
    State(client): State<SharedClient>,
    Path(proposal_id): Path<String>,
) -> Result<Json<Value>, RpcError> {
    let result = client.check_consensus(&proposal_id)?.ok_or(RpcError::ProposalNotFound)?;
    Ok(Json(json!(result)))
}

pub async fn get_blockchain_info(State(client): State<SharedClient>) -> Json<Value> {
    Json(json!(client.get_blockchain_info()))
}
