use crate::error::ConfigError;

pub const USER_ENV: &str = "DISCOGS_USER";
pub const TOKEN_ENV: &str = "DISCOGS_TOKEN";

/// Account name and personal access token, supplied through the environment
#[derive(Clone)]
pub struct DiscogsCredentials {
    pub username: String,
    token: String,
}

impl DiscogsCredentials {
    pub fn new(username: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            token: token.into(),
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; both values must be present and non-empty
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let username = lookup(USER_ENV).filter(|v| !v.trim().is_empty());
        let token = lookup(TOKEN_ENV).filter(|v| !v.trim().is_empty());

        match (username, token) {
            (Some(username), Some(token)) => Ok(Self::new(username, token)),
            _ => Err(ConfigError::MissingCredentials {
                user_var: USER_ENV,
                token_var: TOKEN_ENV,
            }),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Value for the Authorization header
    pub fn authorization(&self) -> String {
        format!("Discogs token={}", self.token)
    }

    pub fn masked_token(&self) -> String {
        let chars: Vec<char> = self.token.chars().collect();
        if chars.len() <= 4 {
            return "****".to_string();
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{}", tail)
    }
}

impl std::fmt::Debug for DiscogsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscogsCredentials")
            .field("username", &self.username)
            .field("token", &self.masked_token())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_credentials_from_lookup() {
        let creds = DiscogsCredentials::from_lookup(lookup_from(&[
            ("DISCOGS_USER", "digger"),
            ("DISCOGS_TOKEN", "abcdef123456"),
        ]))
        .unwrap();
        assert_eq!(creds.username, "digger");
        assert_eq!(creds.token(), "abcdef123456");
        assert_eq!(creds.authorization(), "Discogs token=abcdef123456");
    }

    #[test]
    fn test_credentials_missing() {
        let err = DiscogsCredentials::from_lookup(lookup_from(&[("DISCOGS_USER", "digger")])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials { .. }));
        assert_eq!(
            err.to_string(),
            "DISCOGS_USER and DISCOGS_TOKEN environment variables must be set."
        );

        let err = DiscogsCredentials::from_lookup(lookup_from(&[
            ("DISCOGS_USER", ""),
            ("DISCOGS_TOKEN", "abcdef"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredentials { .. }));
    }

    #[test]
    fn test_token_masking() {
        let creds = DiscogsCredentials::new("digger", "abcdef123456");
        assert_eq!(creds.masked_token(), "****3456");
        assert!(!format!("{:?}", creds).contains("abcdef"));

        let short = DiscogsCredentials::new("digger", "abc");
        assert_eq!(short.masked_token(), "****");
    }
}
