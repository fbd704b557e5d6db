use std::path::PathBuf;

use clap::Parser;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;

use backend_relay::config::loader::{load_config, load_from_env};
use backend_relay::{AppState, LoadOptions, RelayError};

#[derive(Parser)]
#[command(name = "relay-fetch")]
#[command(about = "Load one backend document through the relay's loader", long_about = None)]
struct Cli {
    /// Backend path relative to the API prefix, e.g. `documents?tenant_id=t1`.
    path: String,

    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, default_value = "GET")]
    method: String,

    /// Extra request header as `name:value`. Repeatable.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    let mut options = LoadOptions {
        method: Some(Method::from_bytes(cli.method.to_ascii_uppercase().as_bytes())?),
        ..LoadOptions::default()
    };
    for raw in &cli.headers {
        let (name, value) = raw
            .split_once(':')
            .ok_or_else(|| format!("header must be name:value, got {raw:?}"))?;
        options = options.with_header(
            HeaderName::from_bytes(name.trim().as_bytes())?,
            HeaderValue::from_str(value.trim())?,
        );
    }

    let loader = AppState::from_config(&config)?.loader();
    match loader.load::<Value>(&cli.path, options).await {
        Ok(document) => {
            println!("{}", serde_json::to_string_pretty(&document)?);
            Ok(())
        }
        Err(RelayError::UpstreamStatus { status, body }) => {
            eprintln!("Error: backend returned status {}", status);
            eprintln!("{}", String::from_utf8_lossy(&body));
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
