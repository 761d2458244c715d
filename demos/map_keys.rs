//! Map keys containing underscores, and what happens when a name can be
//! split in more than one way.
//!
//! Run with: cargo run --example map_keys

use serde::{Deserialize, Serialize};
use serde_envpath::{envmap, from_namespace, to_env_map};
use std::collections::BTreeMap;
use std::error::Error;

#[derive(Debug, Serialize, Deserialize)]
struct Upstream {
    host: String,
    #[serde(rename = "max_conns")]
    max_connections: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Labels {
    team: String,
    cost_team: String,
}

fn main() -> Result<(), Box<dyn Error>> {
    let env = envmap! {
        "PROXY_EU_WEST_1_HOST" => "10.0.0.1",
        "PROXY_EU_WEST_1_MAX_CONNS" => 64,
        "PROXY_LOCAL_HOST" => "127.0.0.1",
        // Matches no field of Upstream and is ignored
        "PROXY_LOCAL_PORT" => 8080,
    };

    let upstreams: BTreeMap<String, Upstream> = from_namespace(&env, &["proxy"])?;
    for (key, upstream) in &upstreams {
        println!("{key:>10} -> {upstream:?}");
    }
    println!();

    // Keys are lowercased on decode, so lowercase keys round-trip
    println!("Encoded:\n{}", to_env_map(&upstreams, &["proxy"])?);

    // OWNERS_X_COST_TEAM could be key "x" with field "cost_team" or key
    // "x_cost" with field "team". The shorter field path wins, giving key
    // "x_cost", and a warning is logged when a logger is installed.
    let env = envmap! { "OWNERS_X_COST_TEAM" => "finance" };
    let owners: BTreeMap<String, Labels> = from_namespace(&env, &["owners"])?;
    println!("Ambiguous name resolved to: {:?}", owners);

    Ok(())
}
