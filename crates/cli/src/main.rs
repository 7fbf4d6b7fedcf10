//! Operator CLI for the Campus API client.
//!
//! Run with: `campus <command>`
//!
//! Results go to stdout as JSON and failures to stderr, so `println!` and
//! `eprintln!` are used for user-facing output. Diagnostics go through
//! `tracing` and are controlled by `RUST_LOG` or `CAMPUS_LOG_LEVEL`.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::env;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context};
use campus_infra::api::{ApiClient, ApiRequest};
use campus_infra::{config, observability};
use serde_json::Value;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Command failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &[String]) -> anyhow::Result<()> {
    let command = args.first().map(String::as_str);
    if matches!(command, Some("help") | None) {
        print_help();
        return Ok(());
    }

    let settings = config::load().context("failed to load configuration")?;
    observability::init_tracing(&settings.logging).context("failed to initialise logging")?;
    tracing::debug!(base_url = %settings.api.base_url, "configuration loaded");

    let client = ApiClient::new(settings.api).context("failed to build API client")?;

    match (command, &args[1..]) {
        (Some("health"), []) => {
            let health = client.health_check().await?;
            print_json(&serde_json::to_value(health)?)
        }
        (Some("auth-status"), []) => {
            let status = client.auth_status().await;
            print_json(&serde_json::to_value(status)?)
        }
        (Some("get"), [path, params @ ..]) => {
            let mut request = ApiRequest::get(path.as_str());
            for param in params {
                let (key, value) = param
                    .split_once('=')
                    .ok_or_else(|| anyhow!("expected key=value, got '{param}'"))?;
                request = request.param(key, value);
            }
            let body: Value = client.request(request).await?;
            print_json(&body)
        }
        (Some("download"), [path, destination]) => {
            let bytes = client.download_to(path, destination).await?;
            println!("Saved {bytes} bytes to {destination}");
            Ok(())
        }
        (Some(unknown @ ("health" | "auth-status" | "get" | "download")), _) => {
            print_help();
            bail!("invalid arguments for '{unknown}'")
        }
        (Some(unknown), _) => {
            eprintln!("Unknown command: {unknown}");
            eprintln!();
            print_help();
            bail!("unknown command")
        }
        (None, _) => Ok(()),
    }
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_help() {
    println!("Campus API client");
    println!();
    println!("USAGE:");
    println!("    campus <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("    health                     Check that the API server is reachable");
    println!("    auth-status                Show whether the current session is signed in");
    println!("    get <path> [key=value...]  GET an endpoint and print the JSON payload");
    println!("    download <path> <file>     Save an endpoint's raw body to a file");
    println!("    help                       Show this help message");
    println!();
    println!("CONFIGURATION:");
    println!("    campus.toml / campus.json, overridden by CAMPUS_API_URL and friends");
}
