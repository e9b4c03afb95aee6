use std::io;
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use super::{AccessToken, TokenCredential, TokenFuture, single_scope};
use crate::{Error, Result};

const CLI_TIMEOUT: Duration = Duration::from_secs(10);

/// Lifetime assumed when the CLI does not report one.
const FALLBACK_LIFETIME: Duration = Duration::from_secs(5 * 60);

/// Authentication with the account signed in to the Azure CLI.
///
/// Runs `az account get-access-token`; requires a prior `az login`.
#[derive(Debug, Clone)]
pub struct AzureCliCredential {
    program: String,
    timeout: Duration,
}

impl AzureCliCredential {
    /// Use the `az` program found on `PATH`.
    #[must_use]
    pub fn new() -> Self {
        let program = if cfg!(windows) { "az.cmd" } else { "az" };
        Self {
            program: program.to_string(),
            timeout: CLI_TIMEOUT,
        }
    }

    /// Run another program instead of `az`.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Give up on the CLI after `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn run(&self, scope: &str) -> Result<Vec<u8>> {
        let output = Command::new(&self.program)
            .args(["account", "get-access-token", "--output", "json", "--scope", scope])
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| Error::auth(format!("{} timed out", self.program)))?
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    Error::auth(format!("Azure CLI not installed ('{}' not found)", self.program))
                }
                _ => Error::auth(format!("failed to run {}: {e}", self.program)),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::auth(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(output.stdout)
    }
}

impl Default for AzureCliCredential {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CliToken {
    access_token: String,
    // `expiresOn` is local time text; the unix field is unambiguous
    #[serde(default, rename = "expires_on")]
    expires_on: Option<u64>,
}

/// Parse the JSON printed by `az account get-access-token`.
fn parse_cli_token(stdout: &[u8]) -> Result<AccessToken> {
    let token: CliToken = serde_json::from_slice(stdout)
        .map_err(|e| Error::auth(format!("unexpected Azure CLI output: {e}")))?;

    Ok(match token.expires_on {
        Some(expires_on) => AccessToken::expiring_at_unix(token.access_token, expires_on),
        None => AccessToken::expiring_in(token.access_token, FALLBACK_LIFETIME),
    })
}

impl TokenCredential for AzureCliCredential {
    fn get_token<'a>(&'a self, scopes: &'a [&'a str]) -> TokenFuture<'a> {
        Box::pin(async move {
            let scope = single_scope(self.name(), scopes)?;
            debug!(program = %self.program, "requesting token from Azure CLI");
            parse_cli_token(&self.run(scope).await?)
        })
    }

    fn name(&self) -> &'static str {
        "AzureCliCredential"
    }
}
