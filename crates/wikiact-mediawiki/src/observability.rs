//! Tracing initialisation for bot processes

use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wikiact_config::LoggingConfig;

use crate::error::{BotError, BotResult};

/// Filter from `RUST_LOG` when set, otherwise from the configured level.
fn env_filter(config: &LoggingConfig) -> BotResult<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| BotError::Tracing(format!("Invalid log level '{}': {}", config.level, e))),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &LoggingConfig) -> BotResult<()> {
    let filter = env_filter(config)?;
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let result = if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };

    result.map_err(|e| BotError::Tracing(format!("Failed to set tracing subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let config = LoggingConfig {
            level: "wikiact=verbose".to_string(),
            json: false,
        };
        assert!(matches!(env_filter(&config), Err(BotError::Tracing(_))));
    }

    #[test]
    fn test_second_install_fails() {
        let config = LoggingConfig::default();
        let _ = init_tracing(&config);
        assert!(matches!(init_tracing(&config), Err(BotError::Tracing(_))));
    }
}
