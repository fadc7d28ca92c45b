//! prompt-chain CLI: triage one customer-support query through the five-stage chain.
//!
//! Usage:
//!   prompt-chain "My debit card was stolen yesterday, can you block it?"
//!   prompt-chain            # prompts for the query on stdin
//!
//! Reads `.env`, then `PROMPT_CHAIN_CONFIG` / `config/prompt_chain.toml` and `PROMPT_CHAIN__*`
//! env vars. `OPENROUTER_API_KEY` supplies the credential. Logs go to stderr (`RUST_LOG`).

use prompt_chain_core::{ChainConfig, ChainRun, CustomerQuery, OpenRouterGateway, Orchestrator};
use std::io::{self, BufRead, Write};
use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("prompt chain failed: {}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), BoxError> {
    let query = CustomerQuery::new(read_query()?)?;

    let config = ChainConfig::load()?;
    info!(model = %config.model, "prompt-chain {}", prompt_chain_core::version());
    let gateway = OpenRouterGateway::new(&config)?;
    let orchestrator = Orchestrator::new(Arc::new(gateway));

    let run = orchestrator
        .run_until(&query, cancel_signal(config.run_timeout()))
        .await?;
    print_run(&run)?;
    Ok(())
}

/// Positional arguments joined with spaces, or one line from stdin when there are none.
fn read_query() -> io::Result<String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return Ok(args.join(" "));
    }
    print!("Describe your issue: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}

/// Resolves on Ctrl-C or when the optional run budget elapses.
async fn cancel_signal(budget: Option<Duration>) {
    let interrupted = interrupt(tokio::signal::ctrl_c());
    match budget {
        Some(limit) => {
            tokio::select! {
                _ = interrupted => {}
                _ = tokio::time::sleep(limit) => {
                    info!("run budget of {}s exhausted", limit.as_secs());
                }
            }
        }
        None => interrupted.await,
    }
}

/// Resolves when `signal` fires. A failed handler registration never resolves.
async fn interrupt(signal: impl Future<Output = io::Result<()>>) {
    match signal.await {
        Ok(()) => info!("interrupted; cancelling run"),
        Err(e) => {
            warn!("cannot listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await
        }
    }
}

fn print_run(run: &ChainRun) -> Result<(), BoxError> {
    let result = &run.result;
    let outputs = [
        result.intent().to_string(),
        serde_json::to_string_pretty(result.candidates())?,
        result.chosen().to_string(),
        serde_json::to_string_pretty(result.details())?,
        result.reply().to_string(),
    ];
    let mut out = io::stdout().lock();
    for (i, text) in outputs.iter().enumerate() {
        writeln!(out, "--- Step {} Output ---", i + 1)?;
        writeln!(out, "{}", text)?;
        writeln!(out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn interrupt_resolves_when_the_signal_fires() {
        let fired = async { Ok::<(), io::Error>(()) };
        let fired = tokio::time::timeout(Duration::from_millis(50), interrupt(fired)).await;
        assert!(fired.is_ok());
    }

    #[tokio::test]
    async fn failed_signal_registration_never_cancels() {
        let failed = async { Err::<(), _>(io::Error::other("no signal driver")) };
        let fired = tokio::time::timeout(Duration::from_millis(50), interrupt(failed)).await;
        assert!(fired.is_err());
    }

    #[tokio::test]
    async fn budget_still_applies_without_ctrl_c() {
        let budget = tokio::time::timeout(
            Duration::from_secs(1),
            cancel_signal(Some(Duration::from_millis(10))),
        )
        .await;
        assert!(budget.is_ok());
    }
}
