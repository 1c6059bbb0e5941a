use std::sync::{Arc, Mutex};

use clap::{Parser, Subcommand};

use chain_client::ChainClient;
use chain_crypto::KeyPair;
use chain_ledger::Node;
use chain_rpc::RpcServer;
use chain_state::WorldState;

#[derive(Parser)]
#[command(name = "chain-node")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a node and serve the read API on `port`.
    Start {
        #[arg(long, default_value_t = 8080)]
        port: u16,
        /// Directory for the sled database. Omit for an ephemeral, in-memory node.
        #[arg(long)]
        data_dir: Option<String>,
    },
    /// Generate a keypair and print its address and secret key.
    Keygen,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Start { port, data_dir } => start(port, data_dir).await?,
        Commands::Keygen => keygen(),
    }

    Ok(())
}

async fn start(port: u16, data_dir: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let world_state = match data_dir {
        Some(path) => WorldState::open(&path)?,
        None => WorldState::open_temporary()?,
    };

    let node = Node::new(world_state)?;
    let treasury = node.treasury_address();
    tracing::info!(treasury = %treasury.to_hex(), %port, "starting chain-node");

    let node = Arc::new(Mutex::new(node));
    let client = Arc::new(ChainClient::new(node));

    RpcServer::new(client, port).start().await?;
    Ok(())
}

fn keygen() {
    let keypair = KeyPair::generate();
    let address = chain_crypto::Address::from_public_key(&keypair.public_key_bytes());
    println!("address:     {}", address.to_hex());
    println!("public_key:  {}", keypair.public_key().to_hex());
    println!("private_key: {}", keypair.export_secret_hex());
}
