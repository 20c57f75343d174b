//! Process-wide configuration: consumer credentials and provider location.
//!
//! Consumer credentials are loaded once, either through
//! [`ClientConfig::builder`] or from the environment with
//! [`ClientConfig::from_env`], and shared by every client built afterwards.
//!
//! ```rust
//! use myspaceid::ClientConfig;
//!
//! let config = ClientConfig::builder()
//!     .consumer_key("my-consumer-key")
//!     .consumer_secret("my-consumer-secret")
//!     .build()
//!     .unwrap();
//! assert_eq!(config.api_root().as_str(), "http://api.myspace.com/");
//! ```

use std::env;
use std::fmt;
use std::time::Duration;

use url::Url;

use crate::{ConfigError, Secrets};

pub const DEFAULT_API_ROOT: &str = "http://api.myspace.com";

pub const CONSUMER_KEY_ENV: &str = "MYSPACE_CONSUMER_KEY";
pub const CONSUMER_SECRET_ENV: &str = "MYSPACE_CONSUMER_SECRET";
pub const API_ROOT_ENV: &str = "MYSPACE_API_ROOT";
pub const TIMEOUT_SECS_ENV: &str = "MYSPACE_TIMEOUT_SECS";

#[derive(Clone)]
pub struct ClientConfig {
    consumer_key: String,
    consumer_secret: String,
    api_root: Url,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ClientConfig {
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Reads `MYSPACE_CONSUMER_KEY` and `MYSPACE_CONSUMER_SECRET`, plus the
    /// optional `MYSPACE_API_ROOT` and `MYSPACE_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = ClientConfig::builder();
        if let Some(key) = lookup(CONSUMER_KEY_ENV) {
            builder = builder.consumer_key(key);
        }
        if let Some(secret) = lookup(CONSUMER_SECRET_ENV) {
            builder = builder.consumer_secret(secret);
        }
        if let Some(root) = lookup(API_ROOT_ENV) {
            builder = builder.api_root(root);
        }
        if let Some(secs) = lookup(TIMEOUT_SECS_ENV) {
            let secs = secs
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidValue {
                    name: TIMEOUT_SECS_ENV,
                    value: secs.clone(),
                })?;
            builder = builder.timeout(Duration::from_secs(secs));
        }
        builder.build()
    }

    pub fn consumer_key(&self) -> &str {
        &self.consumer_key
    }

    pub fn consumer_secret(&self) -> &str {
        &self.consumer_secret
    }

    pub fn api_root(&self) -> &Url {
        &self.api_root
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// Consumer-only secrets; attach a token with [`Secrets::with_token`].
    pub fn secrets(&self) -> Secrets {
        Secrets::new(self.consumer_key.clone(), self.consumer_secret.clone())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"*****")
            .field("api_root", &self.api_root.as_str())
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

const _: fn() = || {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    consumer_key: Option<String>,
    consumer_secret: Option<String>,
    api_root: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ClientConfigBuilder {
    #[must_use]
    pub fn consumer_key<S: Into<String>>(mut self, key: S) -> Self {
        self.consumer_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn consumer_secret<S: Into<String>>(mut self, secret: S) -> Self {
        self.consumer_secret = Some(secret.into());
        self
    }

    /// Scheme and host the endpoint paths are resolved against.
    #[must_use]
    pub fn api_root<S: Into<String>>(mut self, root: S) -> Self {
        self.api_root = Some(root.into());
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let consumer_key = self
            .consumer_key
            .ok_or(ConfigError::MissingRequiredField("consumer_key"))?;
        if consumer_key.trim().is_empty() {
            return Err(ConfigError::EmptyConsumerKey);
        }
        let consumer_secret = self
            .consumer_secret
            .ok_or(ConfigError::MissingRequiredField("consumer_secret"))?;
        if consumer_secret.is_empty() {
            return Err(ConfigError::EmptyConsumerSecret);
        }
        let root = self.api_root.unwrap_or_else(|| DEFAULT_API_ROOT.to_string());
        let api_root = Url::parse(&root).map_err(|_| ConfigError::InvalidApiRoot(root.clone()))?;
        if !matches!(api_root.scheme(), "http" | "https") || api_root.host_str().is_none() {
            return Err(ConfigError::InvalidApiRoot(root));
        }
        Ok(ClientConfig {
            consumer_key,
            consumer_secret,
            api_root,
            timeout: self.timeout,
            user_agent: self.user_agent,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::SecretsProvider;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn builder_requires_credentials() {
        assert_eq!(
            ClientConfig::builder().consumer_secret("s").build().unwrap_err(),
            ConfigError::MissingRequiredField("consumer_key")
        );
        assert_eq!(
            ClientConfig::builder()
                .consumer_key("  ")
                .consumer_secret("s")
                .build()
                .unwrap_err(),
            ConfigError::EmptyConsumerKey
        );
        assert_eq!(
            ClientConfig::builder()
                .consumer_key("k")
                .consumer_secret("")
                .build()
                .unwrap_err(),
            ConfigError::EmptyConsumerSecret
        );
    }

    #[test]
    fn builder_rejects_bad_api_root() {
        for root in &["api.myspace.com", "ftp://api.myspace.com", "http://"] {
            let result = ClientConfig::builder()
                .consumer_key("k")
                .consumer_secret("s")
                .api_root(*root)
                .build();
            assert!(
                matches!(result, Err(ConfigError::InvalidApiRoot(_))),
                "{} accepted",
                root
            );
        }
    }

    #[test]
    fn from_lookup_reads_all_fields() {
        let config = ClientConfig::from_lookup(lookup(&[
            (CONSUMER_KEY_ENV, "key"),
            (CONSUMER_SECRET_ENV, "secret"),
            (API_ROOT_ENV, "http://localhost:8080"),
            (TIMEOUT_SECS_ENV, "15"),
        ]))
        .unwrap();
        assert_eq!(config.consumer_key(), "key");
        assert_eq!(config.api_root().as_str(), "http://localhost:8080/");
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
        let secrets = config.secrets();
        assert_eq!(secrets.get_consumer_key_pair(), ("key", "secret"));
    }

    #[test]
    fn from_lookup_rejects_bad_timeout() {
        let err = ClientConfig::from_lookup(lookup(&[
            (CONSUMER_KEY_ENV, "key"),
            (CONSUMER_SECRET_ENV, "secret"),
            (TIMEOUT_SECS_ENV, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { name, .. } if name == TIMEOUT_SECS_ENV));
    }

    #[test]
    fn debug_masks_secret() {
        let config = ClientConfig::builder()
            .consumer_key("visible-key")
            .consumer_secret("hidden-secret")
            .build()
            .unwrap();
        let printed = format!("{:?}", config);
        assert!(printed.contains("visible-key"));
        assert!(!printed.contains("hidden-secret"));
    }
}
