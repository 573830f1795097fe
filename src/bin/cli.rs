//! immustore CLI
//!
//! Offline administration against a storage root, using the same key mapping
//! and write path as the server.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use immustore::{map_key_to_path, Config, ObjectStore, Result};

/// immustore CLI
#[derive(Parser, Debug)]
#[command(name = "immustore-cli")]
#[command(about = "CLI for the immustore object store")]
struct Args {
    /// Storage root directory
    #[arg(short = 'r', long, default_value = "./data/blobstore")]
    storage_root: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a blob (write-once)
    Put {
        /// The object key
        key: String,

        /// File to read; stdin when omitted
        file: Option<String>,
    },

    /// Fetch a blob
    Get {
        /// The object key
        key: String,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Show where a key maps on disk, or why it is rejected
    Resolve {
        /// The object key
        key: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let config = Config::builder().storage_root(&args.storage_root).build();

    match args.command {
        Commands::Resolve { key } => {
            let path = map_key_to_path(&config.storage_root, &key)?;
            println!("{}", path.display());
        }
        Commands::Put { key, file } => {
            let store = ObjectStore::open(config)?;
            let receipt = match file {
                Some(path) => store.put(&key, File::open(path)?)?,
                None => store.put(&key, io::stdin().lock())?,
            };
            println!("created {} ({} bytes)", receipt.key, receipt.size);
        }
        Commands::Get { key, output } => {
            let store = ObjectStore::open(config)?;
            match output {
                Some(path) => {
                    export(&store, &key, Path::new(&path))?;
                }
                None => {
                    let mut out = io::stdout().lock();
                    store.get(&key, &mut out)?;
                    out.flush()?;
                }
            }
        }
    }

    Ok(())
}

/// Copy a blob to `output`
///
/// The bytes land in a temp file beside `output`, which is renamed into place
/// only after the full copy and fsync. A missing key or failed read leaves
/// `output` untouched.
fn export(store: &ObjectStore, key: &str, output: &Path) -> Result<u64> {
    let dir = match output.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".immustore-")
        .tempfile_in(dir)?;
    let size = store.get(key, tmp.as_file_mut())?;
    tmp.as_file().sync_all()?;
    tmp.persist(output).map_err(|e| e.error)?;

    Ok(size)
}
