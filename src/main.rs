//! `route-pricer`: price a list of delivery routes for every catalog package.
//!
//! ## Environment Variables
//!
//! - `LOG_FORMAT=json`: structured JSON output
//! - `RUST_LOG=info`: log level filter

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_route_pricer::config::{self, ConfigOverrides, PricerConfig};
use tokio_route_pricer::repository::{RouteFile, RouteParams};
use tokio_route_pricer::{init_tracing, PricerError, PricingRun};

/// Price courier delivery routes.
#[derive(Debug, Parser)]
#[command(name = "route-pricer", version, about)]
struct Cli {
    /// Routes: CSV with a `city_from,city_to` header, or TOML with
    /// `[[routes]]` entries and optional `[params]`.
    #[arg(long, value_name = "FILE")]
    routes: PathBuf,

    /// CSV with `mode,cargo_type_descr,tariff_description`; replaces the
    /// route file's `[params]`.
    #[arg(long, value_name = "FILE")]
    params: Option<PathBuf>,

    /// File holding the bearer token for the price endpoint.
    #[arg(long, value_name = "FILE", alias = "token-mode")]
    token_file: PathBuf,

    /// Run configuration; built-in defaults are used when absent.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the worker pool size.
    #[arg(long, value_name = "N")]
    workers: Option<usize>,
}

fn read_token(path: &Path) -> Result<String, PricerError> {
    let token = std::fs::read_to_string(path).map_err(|e| PricerError::io(path, e))?;
    let token = token.trim_end().to_string();
    if token.is_empty() {
        return Err(PricerError::Input(format!(
            "{}: token file is empty",
            path.display()
        )));
    }
    Ok(token)
}

fn load_config(cli: &Cli) -> Result<PricerConfig, PricerError> {
    let overrides = ConfigOverrides {
        worker_limit: cli.workers,
    };
    Ok(config::load(cli.config.as_deref(), &overrides)?)
}

fn load_routes(cli: &Cli) -> Result<RouteFile, PricerError> {
    let mut routes = RouteFile::load(&cli.routes)?;
    if let Some(path) = &cli.params {
        routes.params = RouteParams::load_csv(path)?;
    }
    Ok(routes)
}

async fn run(cli: Cli) -> Result<(), PricerError> {
    let config = load_config(&cli)?;
    let token = read_token(&cli.token_file)?;
    let routes = load_routes(&cli)?;

    let summary = PricingRun::from_config(config, &token)?
        .execute(&routes)
        .await?;
    println!("{summary}");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = init_tracing();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "pricing run failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
