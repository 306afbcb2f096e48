use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{user_var} and {token_var} environment variables must be set.")]
    MissingCredentials {
        user_var: &'static str,
        token_var: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
