//! Bot configuration: file loading, `${VAR}` resolution and validation.

pub mod env_resolver;
pub mod error;
pub mod loader;
pub mod schema;

pub use env_resolver::{EnvResolver, EnvResolverError};
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, FileFormat};
pub use schema::{BotConfig, Credentials, LoggingConfig, QueryDefaults};
