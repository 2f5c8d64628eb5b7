//! CLI command implementations
//!
//! Thin presentation layer over the gateway: reads configuration, runs one
//! submission and composes the reply the way it is posted back to chat.

use anyhow::{bail, Context, Result};
use evalgate_sandbox::{
    normalize, EvalGateway, EvalOutcome, GatewayConfig, GatewayError, StatusKind,
    SubmissionRequest,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Flags that shape one `eval` run
pub struct EvalOptions {
    pub config: Option<PathBuf>,
    pub sandbox_url: Option<Url>,
    pub paste_url: Option<Url>,
    pub timeout_secs: Option<u64>,
    pub json: bool,
}

impl EvalOptions {
    /// Load the configuration file and apply command-line overrides on top
    fn resolve_config(&self) -> Result<GatewayConfig> {
        let mut config =
            GatewayConfig::load(self.config.as_deref()).context("Failed to load configuration")?;

        if let Some(url) = &self.sandbox_url {
            config.sandbox.url = url.clone();
        }
        if let Some(url) = &self.paste_url {
            config.paste.url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.sandbox.timeout = Some(Duration::from_secs(secs));
        }

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

/// Evaluate `text` and print the composed reply (or the outcome as JSON)
pub async fn execute_eval(text: String, options: EvalOptions) -> Result<()> {
    let config = options.resolve_config()?;
    let gateway = EvalGateway::from_config(&config).context("Failed to set up gateway")?;

    info!(sandbox = %config.sandbox.url, "Submitting message");
    let outcome = match gateway.submit(SubmissionRequest::new(text)).await {
        Ok(outcome) => outcome,
        Err(GatewayError::InputRejected) => {
            bail!("Nothing to evaluate: the message contains no code")
        }
        Err(e) => return Err(e).context("Evaluation failed"),
    };
    debug!(execution_id = %outcome.id, stages = ?outcome.stages, "Submission finished");

    if options.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", compose_message(&outcome));
    }
    Ok(())
}

/// Print the extracted code and how it was found
pub fn execute_normalize(text: &str) -> Result<()> {
    let code = match normalize(text) {
        Ok(code) => code,
        Err(GatewayError::InputRejected) => {
            bail!("Nothing to evaluate: the message contains no code")
        }
        Err(e) => return Err(e.into()),
    };

    println!("# {}", code.kind);
    println!("{}", code.code);
    Ok(())
}

/// Write the default configuration to `path` or the default location
pub fn execute_config_init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => GatewayConfig::config_path()?,
    };
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    GatewayConfig::default()
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

/// Print the configuration that `eval` would use
pub fn execute_config_show(path: Option<PathBuf>) -> Result<()> {
    let config = GatewayConfig::load(path.as_deref()).context("Failed to load configuration")?;
    let rendered = toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
    print!("{}", rendered);
    Ok(())
}

pub fn execute_config_path() -> Result<()> {
    println!("{}", GatewayConfig::config_path()?.display());
    Ok(())
}

/// Compose the reply posted for one evaluation
pub fn compose_message(outcome: &EvalOutcome) -> String {
    // Fault headlines are complete sentences ("evaluation failed")
    let joiner = match outcome.status.kind {
        StatusKind::Fault => ":",
        StatusKind::Completed { .. } | StatusKind::TimedOut => " has",
    };
    let mut message = format!(
        "{} Your eval job{} {}.\n\n```\n{}\n```",
        outcome.result.outcome().icon(),
        joiner,
        outcome.status.headline,
        outcome.rendered.display_text
    );
    if let Some(link) = &outcome.rendered.paste_link {
        message.push_str(&format!("\nFull output: {}", link));
    }
    message
}
