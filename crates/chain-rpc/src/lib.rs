pub mod errors;
pub mod handlers;
pub mod server;

pub use errors::RpcError;
pub use server::RpcServer;
