//! Configuration for the mailspend pipeline and its ingress adapters.
//!
//! Everything is environment-driven, matching the deployment surface:
//! the binary loads a `.env` file at startup and `AppConfig::from_env`
//! resolves each section with the documented defaults. Missing secrets
//! are warned about here but only fail the dependent operation later,
//! never process startup.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde_json::{Value, json};
use tracing::warn;

/// Main configuration for the mailspend process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Language-model service configuration.
    pub llm: LlmConfig,

    /// Spreadsheet ledger configuration.
    pub ledger: LedgerConfig,

    /// Mailbox polling configuration.
    pub imap: ImapConfig,

    /// Webhook server configuration.
    pub server: ServerConfig,
}

/// Chat-completion service configuration.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API key; absent keys are tolerated until a structuring call is made.
    pub api_key: Option<String>,

    /// Model identifier.
    pub model: String,

    /// Service base URL (an OpenAI-compatible endpoint).
    pub base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com".to_string(),
        }
    }
}

/// Spreadsheet ledger configuration.
#[derive(Debug, Clone)]
pub struct LedgerConfig {
    /// Path to the service-account credential JSON file.
    pub credentials_path: Option<PathBuf>,

    /// Spreadsheet name to open, as shown in the drive.
    pub sheet_name: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            credentials_path: None,
            sheet_name: "My expenses".to_string(),
        }
    }
}

/// Mailbox polling configuration.
#[derive(Debug, Clone)]
pub struct ImapConfig {
    /// IMAP host to connect to over TLS.
    pub host: String,

    /// IMAP port.
    pub port: u16,

    /// Mailbox account name.
    pub account: Option<String>,

    /// App-specific password for the account.
    pub password: Option<String>,

    /// Pause between poll cycles.
    pub poll_interval: Duration,
}

impl Default for ImapConfig {
    fn default() -> Self {
        Self {
            host: "imap.gmail.com".to_string(),
            port: 993,
            account: None,
            password: None,
            poll_interval: Duration::from_secs(60),
        }
    }
}

/// Webhook server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,

    /// Listen port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            ledger: LedgerConfig::default(),
            imap: ImapConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Resolve configuration from the process environment.
    ///
    /// Never fails: unset values fall back to defaults, and missing
    /// secrets are logged as warnings so the dependent operation can
    /// report the failure when it is actually exercised.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_key = env_nonempty("OPENAI_API_KEY");
        if api_key.is_none() {
            warn!("OPENAI_API_KEY environment variable not set");
        }

        Self {
            llm: LlmConfig {
                api_key,
                model: env_or("OPENAI_MODEL", &defaults.llm.model),
                base_url: env_or("OPENAI_BASE_URL", &defaults.llm.base_url),
            },
            ledger: LedgerConfig {
                credentials_path: env_nonempty("GOOGLE_APPLICATION_CREDENTIALS").map(PathBuf::from),
                sheet_name: env_or("SHEET_NAME", &defaults.ledger.sheet_name),
            },
            imap: ImapConfig {
                host: env_or("IMAP_HOST", &defaults.imap.host),
                port: env_parse("IMAP_PORT", defaults.imap.port),
                account: env_nonempty("GMAIL_EMAIL"),
                password: env_nonempty("GMAIL_APP_PASSWORD"),
                poll_interval: Duration::from_secs(env_parse(
                    "POLL_INTERVAL_SECONDS",
                    defaults.imap.poll_interval.as_secs(),
                )),
            },
            server: ServerConfig {
                host: env_or("HOST", &defaults.server.host),
                port: env_parse("PORT", defaults.server.port),
            },
        }
    }

    /// JSON view of the configuration with secrets redacted, for the
    /// `config show` command and startup diagnostics.
    pub fn redacted(&self) -> Value {
        json!({
            "llm": {
                "api_key": self.llm.api_key.as_deref().map(|_| "***"),
                "model": self.llm.model,
                "base_url": self.llm.base_url,
            },
            "ledger": {
                "credentials_path": self.ledger.credentials_path.as_ref().map(|p| p.display().to_string()),
                "sheet_name": self.ledger.sheet_name,
            },
            "imap": {
                "host": self.imap.host,
                "port": self.imap.port,
                "account": self.imap.account,
                "password": self.imap.password.as_deref().map(|_| "***"),
                "poll_interval_seconds": self.imap.poll_interval.as_secs(),
            },
            "server": {
                "host": self.server.host,
                "port": self.server.port,
            },
        })
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_nonempty(key).unwrap_or_else(|| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_nonempty(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_deployment_surface() {
        let config = AppConfig::default();

        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.ledger.sheet_name, "My expenses");
        assert_eq!(config.imap.host, "imap.gmail.com");
        assert_eq!(config.imap.port, 993);
        assert_eq!(config.imap.poll_interval, Duration::from_secs(60));
        assert_eq!(config.server.port, 5001);
    }

    #[test]
    fn redacted_view_hides_secrets() {
        let config = AppConfig {
            llm: LlmConfig {
                api_key: Some("sk-secret".to_string()),
                ..LlmConfig::default()
            },
            imap: ImapConfig {
                password: Some("app-password".to_string()),
                ..ImapConfig::default()
            },
            ..AppConfig::default()
        };

        let rendered = config.redacted().to_string();
        assert!(!rendered.contains("sk-secret"));
        assert!(!rendered.contains("app-password"));
        assert!(rendered.contains("***"));
    }
}
