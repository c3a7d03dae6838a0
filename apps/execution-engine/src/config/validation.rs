//! Environment validation at startup.

use super::Config;
use super::environment::TradingMode;
use crate::domain::provider_health::ProviderRole;

/// Errors from environment validation at startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupValidationError {
    /// Missing required settings for the environment.
    #[error("Missing required settings for {environment} mode: {details}")]
    MissingCredentials {
        /// The trading environment.
        environment: String,
        /// Details about which settings are missing.
        details: String,
    },
}

/// Result of startup environment validation.
#[derive(Debug)]
pub struct StartupValidation {
    /// Warning messages (non-fatal).
    pub warnings: Vec<String>,
}

/// Validate environment configuration at startup.
///
/// LIVE mode needs a signer and a wallet. PAPER mode runs on scripted
/// providers and only warns about settings it ignores.
///
/// # Errors
///
/// Returns `StartupValidationError` if LIVE mode lacks signer settings.
pub fn validate_startup_environment(
    config: &Config,
) -> Result<StartupValidation, StartupValidationError> {
    let mut warnings = Vec::new();
    match config.environment.mode {
        TradingMode::Paper => {
            if !config.signer.endpoint.is_empty() {
                warnings.push("Signer configured but not used in PAPER mode".to_string());
            }
        }
        TradingMode::Live => {
            let mut missing = Vec::new();
            if config.signer.endpoint.is_empty() {
                missing.push("signer.endpoint");
            }
            if config.signer.public_key.is_empty() {
                missing.push("signer.public_key");
            }
            if !missing.is_empty() {
                return Err(StartupValidationError::MissingCredentials {
                    environment: TradingMode::Live.as_str().to_string(),
                    details: format!("not set: {}", missing.join(", ")),
                });
            }
            if config.signer.auth_token.is_empty() {
                warnings.push("signer.auth_token is empty; requests are unauthenticated".to_string());
            }
            let rpc_count = config
                .providers
                .iter()
                .filter(|p| p.role == ProviderRole::Rpc)
                .count();
            if rpc_count < 2 {
                warnings.push("Only one RPC provider configured; failover is unavailable".to_string());
            }
        }
    }
    Ok(StartupValidation { warnings })
}
