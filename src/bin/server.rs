//! immustore Server Binary
//!
//! Starts the HTTP server for immustore.

use std::sync::Arc;

use clap::Parser;
use immustore::network::Server;
use immustore::{Config, ObjectStore};
use tracing_subscriber::{fmt, EnvFilter};

/// immustore Server
#[derive(Parser, Debug)]
#[command(name = "immustore-server")]
#[command(about = "Write-once object store over HTTP")]
#[command(version)]
struct Args {
    /// Storage root directory
    #[arg(short = 'r', long, default_value = "./data/blobstore")]
    storage_root: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "0.0.0.0:7070")]
    listen: String,

    /// Streaming chunk size in KiB for GET responses
    #[arg(long, default_value = "64")]
    chunk_kb: usize,

    /// Reject request bodies larger than this many MiB
    #[arg(long)]
    max_object_mb: Option<usize>,

    /// Refuse to replace an object published by a concurrent writer
    #[arg(long)]
    exclusive: bool,

    /// Skip fsync of parent directories after publishing
    #[arg(long)]
    no_dir_sync: bool,
}

#[tokio::main]
async fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,immustore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("immustore server v{}", immustore::VERSION);
    tracing::info!("Storage root: {}", args.storage_root);
    tracing::info!("Listen address: {}", args.listen);

    // Build config from args
    let config = Config::builder()
        .storage_root(&args.storage_root)
        .listen_addr(&args.listen)
        .stream_chunk_size(args.chunk_kb * 1024)
        .max_object_size(args.max_object_mb.map(|mb| mb * 1024 * 1024))
        .exclusive_publish(args.exclusive)
        .sync_directories(!args.no_dir_sync)
        .build();

    // Open store
    let store = match ObjectStore::open(config.clone()) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Store initialized successfully");

    // Start server (returns after Ctrl+C and drain)
    let server = Server::new(config, store);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
