use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use chain_client::ChainClient;

use crate::handlers::{self, SharedClient};

/// Read-only HTTP surface (§6) over a shared [`ChainClient`]. Mirrors the
/// original RPC server's handler/port shape, with warp's filter chains
/// replaced by an axum `Router`.
pub struct RpcServer {
    router: Router,
    port: u16,
}

impl RpcServer {
    pub fn new(client: Arc<ChainClient>, port: u16) -> Self {
        let router = build_router(client);
        Self { router, port }
    }

    pub async fn start(self) -> std::io::Result<()> {
        let addr = SocketAddr::from(([127, 0, 0, 1], self.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "chain-rpc listening");
        axum::serve(listener, self.router).await
    }
}

fn build_router(client: Arc<ChainClient>) -> Router {
    let client: SharedClient = client;
    Router::new()
        .route("/blocks", get(handlers::list_blocks))
        .route("/blocks/latest", get(handlers::get_latest_block))
        .route("/blocks/{index}", get(handlers::get_block))
        .route(
            "/blocks/{block_index}/transactions/{tx_index}/proof",
            get(handlers::get_merkle_proof),
        )
        .route("/transactions/{hash}", get(handlers::get_transaction))
        .route("/mempool", get(handlers::get_pending_transactions))
        .route("/accounts/{address}", get(handlers::get_account))
        .route("/treasury", get(handlers::get_treasury))
        .route("/sop/state", get(handlers::get_sop_state))
        .route("/sop/proposal", get(handlers::get_current_proposal))
        .route("/sop/events", get(handlers::get_sop_events))
        .route("/proposals/{id}/consensus", get(handlers::check_consensus))
        .route("/info", get(handlers::get_blockchain_info))
        .with_state(client)
}
