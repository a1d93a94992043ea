mod config;
mod error;
mod routes;

use clap::Parser;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

use config::{CliArgs, VerificationConfig};
use error::AppError;
use routes::{system::SystemResolver, verify::RouteVerifier};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let level = match args.level() {
        Ok(level) => level,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };
    init_logging(level, args.json);

    match run(&args) {
        Ok(true) => {
            println!("All routes are as expected.");
            ExitCode::SUCCESS
        }
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            tracing::error!("{}", e);
            match e.downcast_ref::<AppError>() {
                Some(app_error) => {
                    tracing::error!("{}", app_error.user_message());
                    if app_error.is_config_error() {
                        ExitCode::from(2)
                    } else {
                        ExitCode::FAILURE
                    }
                }
                None => ExitCode::FAILURE,
            }
        }
    }
}

/// Log to stdout, as text or JSON; RUST_LOG still wins when set
fn init_logging(level: Level, json: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stdout);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Returns Ok(false) when any route mismatched
fn run(args: &CliArgs) -> anyhow::Result<bool> {
    let hostname = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string());
    tracing::info!("Route monitor starting on {}", hostname);

    let config = VerificationConfig::load(&args.config_path())?;
    let verifier = RouteVerifier::new(SystemResolver::new());
    let report = verifier.run(&config)?;

    tracing::info!(
        routes = report.routes_checked,
        addresses = report.addresses_checked,
        mismatches = report.mismatches.len(),
        "verification finished"
    );

    if report.is_success() {
        return Ok(true);
    }

    for mismatch in &report.mismatches {
        tracing::error!("{}", mismatch);
    }
    tracing::error!("There are mismatch in routes");
    Ok(false)
}
