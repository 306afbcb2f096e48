pub mod config;
pub mod credentials;
pub mod error;
pub mod paths;

pub use config::{Config, DiscogsConfig, PathsConfig, RateLimitPolicy, SyncOptions, default_base_url, default_cache_file, default_user_agent};
pub use credentials::{DiscogsCredentials, TOKEN_ENV, USER_ENV};
pub use error::ConfigError;
pub use paths::{PathManager, config_file_override, data_dir_override};
