//! mcmeta CLI Client
//!
//! Command-line interface for issuing meta commands to a memcached server.

use clap::{Parser, Subcommand};
use mcmeta::{Client, ClientConfig, GetOptions, MetaError};
use tracing_subscriber::{fmt, EnvFilter};

/// mcmeta CLI
#[derive(Parser, Debug)]
#[command(name = "mcmeta-cli")]
#[command(about = "CLI for memcached over the meta protocol")]
#[command(version)]
struct Args {
    /// Server address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:11211")]
    server: String,

    /// Request timeout in milliseconds (0 disables)
    #[arg(short, long, default_value = "1000")]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value with its metadata
    Get {
        key: String,
    },

    /// Get a value and its CAS token
    Gets {
        key: String,
    },

    /// Store a value unconditionally
    Set {
        key: String,
        value: String,

        /// TTL in seconds
        #[arg(long)]
        ttl: Option<u32>,
    },

    /// Store only if the key is absent
    Add {
        key: String,
        value: String,
        #[arg(long)]
        ttl: Option<u32>,
    },

    /// Store only if the key exists
    Replace {
        key: String,
        value: String,
        #[arg(long)]
        ttl: Option<u32>,
    },

    /// Delete a key
    Delete {
        key: String,
    },

    /// Increment a counter
    Incr {
        key: String,
        #[arg(default_value = "1")]
        delta: u64,
    },

    /// Decrement a counter (floors at zero)
    Decr {
        key: String,
        #[arg(default_value = "1")]
        delta: u64,
    },

    /// Set a new TTL without reading the value
    Touch {
        key: String,
        ttl: u32,
    },

    /// Invalidate all items
    Flush {
        /// Seconds before the flush takes effect
        #[arg(long)]
        delay: Option<u32>,
    },

    /// Check the server responds
    Ping,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,mcmeta=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let config = ClientConfig::builder()
        .addr(&args.server)
        .request_timeout_ms(args.timeout_ms)
        .build();

    let client = Client::new(config);

    if let Err(e) = run(&client, args.command) {
        eprintln!("error ({}): {}", e.kind(), e);
        std::process::exit(1);
    }

    client.close();
}

fn run(client: &Client, command: Commands) -> Result<(), MetaError> {
    match command {
        Commands::Get { key } => {
            match client.get_with(&key, GetOptions::new().ttl().hit_before())? {
                Some(hit) => {
                    println!("{}", String::from_utf8_lossy(&hit.value));
                    tracing::debug!(
                        "flags={} ttl={:?} hit_before={:?}",
                        hit.client_flags,
                        hit.ttl,
                        hit.hit_before
                    );
                }
                None => println!("(miss)"),
            }
        }
        Commands::Gets { key } => match client.gets(&key)? {
            Some((value, token)) => println!("{} cas={}", String::from_utf8_lossy(&value), token),
            None => println!("(miss)"),
        },
        Commands::Set { key, value, ttl } => {
            client.set(&key, value, ttl)?;
            println!("STORED");
        }
        Commands::Add { key, value, ttl } => {
            client.add(&key, value, ttl)?;
            println!("STORED");
        }
        Commands::Replace { key, value, ttl } => {
            client.replace(&key, value, ttl)?;
            println!("STORED");
        }
        Commands::Delete { key } => {
            client.delete(&key)?;
            println!("DELETED");
        }
        Commands::Incr { key, delta } => println!("{}", client.incr(&key, delta)?),
        Commands::Decr { key, delta } => println!("{}", client.decr(&key, delta)?),
        Commands::Touch { key, ttl } => {
            if client.touch(&key, ttl)? {
                println!("TOUCHED");
            } else {
                println!("(miss)");
            }
        }
        Commands::Flush { delay } => {
            client.flush_all(delay)?;
            println!("OK");
        }
        Commands::Ping => {
            client.noop()?;
            println!("PONG");
        }
    }
    Ok(())
}
