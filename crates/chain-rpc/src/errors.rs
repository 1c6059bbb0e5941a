use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(thiserror::Error, Debug)]
pub enum RpcError {
    #[error("block not found")]
    BlockNotFound,

    #[error("transaction not found")]
    TransactionNotFound,

    #[error("account not found")]
    AccountNotFound,

    #[error("proposal not found")]
    ProposalNotFound,

    #[error(transparent)]
    Client(#[from] chain_client::ClientError),
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        let status = match &self {
            RpcError::BlockNotFound
            | RpcError::TransactionNotFound
            | RpcError::AccountNotFound
            | RpcError::ProposalNotFound => StatusCode::NOT_FOUND,
            RpcError::Client(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
