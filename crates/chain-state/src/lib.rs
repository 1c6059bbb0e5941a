pub mod error;
pub mod pubkey_registry;
pub mod world_state;

pub use error::{Result, StateError};
pub use pubkey_registry::PublicKeyRegistry;
pub use world_state::WorldState;
