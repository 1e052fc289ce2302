//! Stack reference CLI.
//!
//! Reads another stack's outputs through the engine and prints them as JSON.
//! Configuration comes from the environment (and a `.env` file, if present);
//! see `strata_core::ProgramConfig` for the variables.
//!
//! # Usage
//!
//! ```bash
//! stackref <stack> [output...]
//! ```
//!
//! # Example
//!
//! ```bash
//! STRATA_PROJECT=web STRATA_STACK=prod stackref infra/prod url count
//! ```

#![allow(
    clippy::print_stdout,
    clippy::print_stderr,
    reason = "command line entry point reports to the terminal"
)]

use std::sync::Arc;

use strata_core::{ConfigError, ProgramConfig, ProgramInfo};
use strata_output::{Context, ContextError, ExportError, StackOutputs};
use strata_resource::{
    HttpEngine, ResourceClient, ResourceOptions, SharedResolveError, StackReference,
};

/// Errors that end the program.
#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Resolve(#[from] SharedResolveError),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("failed to render outputs: {0}")]
    Render(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() {
    let loaded = ProgramConfig::load_dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((stack, keys)) = args.split_first() else {
        eprintln!("Usage: stackref <stack> [output...]");
        eprintln!("Example: stackref infra/prod url count");
        std::process::exit(2);
    };

    let config = match ProgramConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(2);
        }
    };
    config.tracing().init();

    let info = ProgramInfo::default();
    tracing::info!(
        version = info.version,
        debug = info.debug,
        dotenv = ?loaded,
        project = %config.project,
        stack = %config.stack,
        dry_run = config.dry_run,
        "starting {info}"
    );

    match run(&config, stack, keys).await {
        Ok(outputs) => println!("{outputs}"),
        Err(err) => {
            eprintln!("Error: {err}");
            std::process::exit(1);
        }
    }
}

/// Reads `stack` and renders the requested outputs, or all of them when
/// `keys` is empty.
async fn run(config: &ProgramConfig, stack: &str, keys: &[String]) -> Result<String, CliError> {
    let ctx = config.create_context();
    cancel_on_interrupt(&ctx);

    let mut engine = HttpEngine::new(config.engine_endpoint.as_str());
    if let Some(token) = &config.engine_token {
        engine = engine.with_token(token.as_str());
    }
    let client = ResourceClient::new(Arc::new(engine));

    let reference = StackReference::new(&ctx, &client, stack, None, ResourceOptions::new()).await?;

    if keys.is_empty() {
        ctx.export("outputs", reference.outputs())?;
    } else {
        for key in keys {
            ctx.export(key.as_str(), &reference.get_output(key.as_str()))?;
        }
    }

    let outputs: StackOutputs = ctx.collect_exports().await?;
    if !outputs.is_complete() {
        tracing::warn!("some outputs are not known yet");
    }
    Ok(serde_json::to_string_pretty(&outputs)?)
}

/// Cancels the program when the process receives Ctrl-C.
fn cancel_on_interrupt(ctx: &Context) {
    let token = ctx.cancellation_token().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            token.cancel();
        }
    });
}
