//! Customizing name resolution with EnvOptions.
//!
//! Run with: cargo run --example custom_options

use serde::{Deserialize, Serialize};
use serde_envpath::{
    envmap, from_namespace_with_options, to_namespace_with_options, EnvMap, EnvOptions,
};
use std::error::Error;

#[derive(Debug, Serialize, Deserialize)]
struct Config {
    #[serde(rename = "env:\"service_name\" json:\"name\"")]
    name: String,
    #[serde(rename = "json:\"tags\"")]
    tags: Vec<String>,
    #[serde(rename = "json:\"-\"")]
    #[serde(default)]
    secret: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let env = envmap! {
        "APP_NAME" => "from-json-tag",
        "APP_SERVICE_NAME" => "from-env-tag",
        "APP_TAGS" => "blue;green",
        "APP_SECRET" => "never read",
    };

    // Default tags are yaml, json, mapstructure; lists split on ';' here
    let options = EnvOptions::new().with_list_separator(';');
    let config: Config = from_namespace_with_options(&env, &["app"], &options)?;
    println!("Default tags:\n{:#?}\n", config);

    // Tag keys are consulted in order, so `env` now wins over `json`
    let options = EnvOptions::new()
        .with_tags(["env", "json"])
        .with_list_separator(';');
    let config: Config = from_namespace_with_options(&env, &["app"], &options)?;
    println!("With `env` tag:\n{:#?}\n", config);

    let mut written = EnvMap::new();
    to_namespace_with_options(&config, &["app"], &mut written, &options)?;
    println!("Encoded:\n{}", written);

    Ok(())
}
