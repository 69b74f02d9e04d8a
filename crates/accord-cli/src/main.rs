#![allow(clippy::nursery)]
#![allow(clippy::pedantic)]

use anyhow::Context;
use clap::Parser;

use accord_db::error::EngineError;

mod bootstrap;
mod cli;
mod commands;
mod context;
mod output;

/// Exit status for a request the engine rejected.
const EXIT_REJECTED: i32 = 2;

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();
    let format = cli.format;
    if let Err(error) = run(cli).await {
        std::process::exit(report(&error, format));
    }
}

async fn run(cli: cli::Cli) -> anyhow::Result<()> {
    init_tracing(cli.quiet, cli.verbose)?;

    let flags = cli.global_flags();
    let config = bootstrap::load_config(&flags)?;

    let ctx = context::AppContext::init(config)
        .await
        .context("failed to initialize accord application context")?;

    commands::dispatch::dispatch(cli.command, &ctx, &flags).await
}

/// Print `error` and return the process exit status.
///
/// Engine rejections are part of the response contract and go to stdout as an
/// error body; anything else is an operator problem and goes to stderr.
fn report(error: &anyhow::Error, format: cli::OutputFormat) -> i32 {
    if let Some(rejected) = error.downcast_ref::<EngineError>() {
        if let Ok(rendered) = output::render(&rejected.to_response(), format) {
            println!("{rendered}");
            return EXIT_REJECTED;
        }
    }
    eprintln!("accord error: {error:#}");
    1
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("ACCORD_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_errors_exit_with_rejected_status() {
        let error = anyhow::Error::from(EngineError::SelfReference {
            actor_id: "a".into(),
        });
        assert_eq!(report(&error, cli::OutputFormat::Raw), EXIT_REJECTED);
    }

    #[test]
    fn engine_errors_survive_context() {
        let error = anyhow::Error::from(EngineError::NotFound {
            relationship_id: "rel-00000000".into(),
        })
        .context("ending relationship");
        assert_eq!(report(&error, cli::OutputFormat::Json), EXIT_REJECTED);
    }

    #[test]
    fn other_errors_exit_with_one() {
        let error = anyhow::anyhow!("disk on fire");
        assert_eq!(report(&error, cli::OutputFormat::Json), 1);
    }
}
