//! Subcommand implementations and the shared failure type.

pub mod analyze;
pub mod bundle;
pub mod config_cmd;

use std::path::{Path, PathBuf};
use tickerlens_config::{AppConfig, ConfigError};
use tickerlens_core::error::{FaultClass, InvokeError, ProviderError};
use tickerlens_core::market::MarketSnapshot;

/// Why a command failed. Each variant maps to a process exit code.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Model provider could not be set up: {0}")]
    Provider(#[from] ProviderError),

    #[error("No data available for {symbol}: every data domain is missing from the snapshot")]
    NoData { symbol: String },

    #[error("Model invocation failed: {0}")]
    Invoke(#[from] InvokeError),

    #[error("Invalid snapshot {}: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl CliError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Class of the provider fault behind a failed invocation.
    pub fn fault_class(&self) -> Option<FaultClass> {
        match self {
            Self::Invoke(err) => Some(err.last_error().class()),
            _ => None,
        }
    }

    /// 2 configuration, 3 no data, 4 fatal model invocation, 1 anything else.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Provider(_) => 2,
            Self::NoData { .. } => 3,
            Self::Invoke(_) => 4,
            Self::Snapshot { .. } | Self::Io { .. } => 1,
        }
    }
}

/// Load config from `path` (or the default location), then apply the
/// environment and any `--context-tokens` override.
pub fn load_config(
    path: Option<&Path>,
    context_tokens: Option<usize>,
) -> Result<AppConfig, CliError> {
    let mut config = match path {
        Some(p) => {
            let mut config = AppConfig::load_from(p)?;
            config.apply_env(|key| std::env::var(key).ok())?;
            config
        }
        None => AppConfig::load()?,
    };

    if let Some(tokens) = context_tokens {
        if tokens == 0 {
            return Err(ConfigError::ValidationError("--context-tokens must be > 0".into()).into());
        }
        config.bundle.max_context_tokens = tokens;
    }
    Ok(config)
}

/// Read a snapshot of resolved fetcher output. Fails with `NoData` when no
/// domain resolved at all.
pub fn load_snapshot(path: &Path) -> Result<MarketSnapshot, CliError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("Failed to read {}", path.display()), e))?;
    let snapshot: MarketSnapshot =
        serde_json::from_str(&raw).map_err(|source| CliError::Snapshot {
            path: path.to_path_buf(),
            source,
        })?;

    let domains = snapshot.available_domains();
    if domains.is_empty() {
        return Err(CliError::NoData {
            symbol: snapshot.symbol,
        });
    }
    tracing::debug!(symbol = %snapshot.symbol, ?domains, "Snapshot loaded");
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn exit_codes() {
        assert_eq!(CliError::from(ConfigError::MissingApiKey).exit_code(), 2);
        assert_eq!(
            CliError::NoData {
                symbol: "X".into()
            }
            .exit_code(),
            3
        );
        let invoke = InvokeError::Rejected {
            attempt: 1,
            source: ProviderError::AuthenticationFailed("bad".into()),
        };
        assert_eq!(CliError::from(invoke).exit_code(), 4);
        let io = CliError::io("read", std::io::Error::other("boom"));
        assert_eq!(io.exit_code(), 1);
    }

    #[test]
    fn invoke_failures_report_their_fault_class() {
        let exhausted = CliError::from(InvokeError::RetriesExhausted {
            attempts: 3,
            source: ProviderError::RateLimited { retry_after_secs: 5 },
        });
        assert_eq!(exhausted.fault_class(), Some(FaultClass::RateLimit));

        let rejected = CliError::from(InvokeError::Rejected {
            attempt: 1,
            source: ProviderError::ModelNotFound("claude-x".into()),
        });
        assert_eq!(rejected.fault_class(), Some(FaultClass::Client));

        assert_eq!(CliError::from(ConfigError::MissingApiKey).fault_class(), None);
    }

    #[test]
    fn snapshot_without_domains_is_no_data() {
        let file = write_temp(r#"{"symbol": "ZZZZ"}"#);
        let err = load_snapshot(file.path()).unwrap_err();
        assert!(matches!(err, CliError::NoData { ref symbol } if symbol == "ZZZZ"));
    }

    #[test]
    fn snapshot_with_one_domain_loads() {
        let file = write_temp(r#"{"symbol": "SHOP.TO", "news": []}"#);
        let snapshot = load_snapshot(file.path()).unwrap();
        assert_eq!(snapshot.available_domains(), vec!["news"]);
    }

    #[test]
    fn malformed_snapshot() {
        let file = write_temp("{not json");
        let err = load_snapshot(file.path()).unwrap_err();
        assert!(matches!(err, CliError::Snapshot { .. }));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn missing_snapshot_file() {
        let err = load_snapshot(Path::new("/nonexistent/snapshot.json")).unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }

    #[test]
    fn context_tokens_override() {
        let file = write_temp("[bundle]\nmax_context_tokens = 1000\n");
        let config = load_config(Some(file.path()), Some(500)).unwrap();
        assert_eq!(config.bundle.max_context_tokens, 500);

        let err = load_config(Some(file.path()), Some(0)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
