//! Loading a configuration struct from a namespace and writing it back.
//!
//! Run with: cargo run --example simple

use serde::{Deserialize, Serialize};
use serde_envpath::{envmap, from_namespace, to_env_map};
use std::error::Error;
use std::time::Duration;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Database {
    url: String,
    pool_size: u32,
    #[serde(with = "serde_envpath::duration")]
    timeout: Duration,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Config {
    name: String,
    debug: bool,
    allowed_hosts: Vec<String>,
    database: Database,
}

fn main() -> Result<(), Box<dyn Error>> {
    let env = envmap! {
        "MYAPP_NAME" => "billing",
        "MYAPP_DEBUG" => true,
        "MYAPP_ALLOWED_HOSTS" => "example.com,api.example.com",
        "MYAPP_DATABASE_URL" => "postgres://db/billing",
        "MYAPP_DATABASE_POOL_SIZE" => 16,
        "MYAPP_DATABASE_TIMEOUT" => "1m30s",
    };

    let config: Config = from_namespace(&env, &["myapp"])?;
    println!("Decoded:\n{:#?}\n", config);

    // Sequences are written in the indexed form
    let written = to_env_map(&config, &["myapp"])?;
    println!("Encoded:\n{}", written);

    let back: Config = from_namespace(&written, &["myapp"])?;
    assert_eq!(config, back);
    println!("✓ Round-trip successful");

    Ok(())
}
