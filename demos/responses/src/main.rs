//! Azure OpenAI Responses API demo.
//!
//! Sends a single prompt, then a two-message conversation, and logs the
//! answers with their token usage.
//!
//! ```text
//! export AZURE_OPENAI_ENDPOINT=https://my-resource.openai.azure.com/
//! export AZURE_OPENAI_API_KEY=...
//! cargo run -p responses-demo
//! cargo run -p responses-demo -- --auth entra
//! ```

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use aoai::prelude::*;
use aoai::settings::{DEFAULT_MAX_OUTPUT_TOKENS, DEFAULT_MODEL, DEFAULT_RETRIES, MODEL_ENV};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Call the Azure OpenAI Responses API.
#[derive(Debug, Parser)]
#[command(name = "responses-demo", version, about)]
struct Cli {
    /// Authentication mode: `api-key` or `entra`
    #[arg(long, env = "AZURE_OPENAI_AUTH", default_value = "api-key")]
    auth: AuthMode,

    /// Model deployment name
    #[arg(long, env = MODEL_ENV, default_value = DEFAULT_MODEL)]
    model: String,

    /// Upper bound on generated tokens per response
    #[arg(long, default_value_t = DEFAULT_MAX_OUTPUT_TOKENS)]
    max_output_tokens: u32,

    /// Retries on transient failures
    #[arg(long, default_value_t = DEFAULT_RETRIES)]
    retries: u32,

    /// Per-call timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Send bearer tokens over plaintext http (local proxies only)
    #[arg(long)]
    allow_insecure_http: bool,

    /// Prompt of the single-input example
    #[arg(long, default_value = "Explain quantum computing in simple terms")]
    prompt: String,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

fn settings(cli: &Cli) -> anyhow::Result<Settings> {
    let model = cli.model.clone();
    let settings = Settings::from_lookup(cli.auth, |name| {
        if name == MODEL_ENV {
            Some(model.clone())
        } else {
            std::env::var(name).ok()
        }
    })
    .context("invalid configuration")?;

    let mut builder = settings
        .into_builder()
        .max_output_tokens(cli.max_output_tokens)
        .retries(cli.retries)
        .allow_insecure_http(cli.allow_insecure_http);
    if let Some(secs) = cli.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build())
}

fn log_response(response: &ResponseObject) {
    let usage = response.usage.unwrap_or_default();
    info!("Response: {}", response.output_text());
    info!("Status: {}", response.status);
    info!(
        "Reasoning tokens: {}",
        usage.output_tokens_details.reasoning_tokens
    );
    info!("Output tokens: {}", usage.output_tokens);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = settings(&cli)?;
    info!(
        "Azure OpenAI {} - {} authentication",
        settings.model(),
        settings.auth().mode()
    );

    let client = AzureOpenAi::connect(&settings);

    info!("Example 1: Simple text input");
    let request = CreateResponse::new(settings.model(), cli.prompt.as_str())
        .max_output_tokens(settings.max_output_tokens());
    let response = client
        .create(&request)
        .await
        .context("failed to create response")?;
    log_response(&response);

    info!("Example 2: Conversation format");
    let request = CreateResponse::new(
        settings.model(),
        vec![
            InputMessage::system("You are an Azure cloud architect."),
            InputMessage::user("Design a scalable web application architecture."),
        ],
    )
    .max_output_tokens(settings.max_output_tokens());
    let response = client
        .create(&request)
        .await
        .context("failed to create response")?;
    log_response(&response);

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn flags_parse() {
        let cli = Cli::try_parse_from([
            "responses-demo",
            "--auth",
            "entra",
            "--model",
            "gpt-4.1",
            "--timeout",
            "30",
            "--allow-insecure-http",
        ])
        .expect("valid flags");

        assert_eq!(cli.auth, AuthMode::Entra);
        assert_eq!(cli.model, "gpt-4.1");
        assert_eq!(cli.timeout, Some(30));
        assert!(cli.allow_insecure_http);
    }
}
