use std::fmt;

use crate::Token;

/// Supplies the key pairs the signer needs.
pub trait SecretsProvider {
    fn get_consumer_key_pair(&self) -> (&str, &str);

    fn get_token_pair_option(&self) -> Option<(&str, &str)>;

    fn get_token_option_pair(&self) -> (Option<&str>, Option<&str>) {
        self.get_token_pair_option()
            .map(|s| (Some(s.0), Some(s.1)))
            .unwrap_or((None, None))
    }
}

/// A key/secret pair. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    key: String,
    secret: String,
}

impl Credentials {
    pub fn new<TKey, TSecret>(key: TKey, secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Credentials {
            key: key.into(),
            secret: secret.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key", &self.key)
            .field("secret", &"*****")
            .finish()
    }
}

/// Consumer credentials plus the optional token credentials of one end user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secrets {
    consumer: Credentials,
    token: Option<Credentials>,
}

impl Secrets {
    pub fn new<TKey, TSecret>(consumer_key: TKey, consumer_secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Secrets {
            consumer: Credentials::new(consumer_key, consumer_secret),
            token: None,
        }
    }

    pub fn token<TKey, TSecret>(self, token: TKey, token_secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Secrets {
            token: Some(Credentials::new(token, token_secret)),
            ..self
        }
    }

    /// Attach an issued token (request or access) as the token credentials.
    pub fn with_token(self, token: &Token) -> Self {
        self.token(token.key(), token.secret())
    }

    /// Drop the token credentials, keeping only the consumer pair.
    pub fn consumer_only(&self) -> Self {
        Secrets {
            consumer: self.consumer.clone(),
            token: None,
        }
    }

    pub fn consumer(&self) -> &Credentials {
        &self.consumer
    }

    pub fn token_credentials(&self) -> Option<&Credentials> {
        self.token.as_ref()
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }
}

impl SecretsProvider for Secrets {
    fn get_consumer_key_pair(&self) -> (&str, &str) {
        let consumer = self.consumer();
        (consumer.key(), consumer.secret())
    }

    fn get_token_pair_option(&self) -> Option<(&str, &str)> {
        self.token_credentials().map(|t| (t.key(), t.secret()))
    }
}

const _: fn() = || {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Secrets>();
};

#[cfg(test)]
mod tests {
    use super::*;

    static CONSUMER_KEY: &str = "<CONSUMER_KEY>";
    static CONSUMER_SECRET: &str = "<CONSUMER_SECRET>";
    static TOKEN: &str = "<ACCESS_TOKEN>";
    static TOKEN_SECRET: &str = "<TOKEN_SECRET>";

    #[test]
    fn secret_builder() {
        let secret = Secrets::new(CONSUMER_KEY, CONSUMER_SECRET);
        assert_eq!(
            secret.get_consumer_key_pair(),
            (CONSUMER_KEY, CONSUMER_SECRET)
        );
        assert_eq!(secret.get_token_option_pair(), (None, None));

        let secret_with_token = secret.token(TOKEN, TOKEN_SECRET);
        assert!(secret_with_token.has_token());
        assert_eq!(
            secret_with_token.get_token_pair_option(),
            Some((TOKEN, TOKEN_SECRET))
        );
        assert!(!secret_with_token.consumer_only().has_token());
    }

    #[test]
    fn credential_halves() {
        let secret = Secrets::new(CONSUMER_KEY, CONSUMER_SECRET);
        assert_eq!(secret.consumer().key(), CONSUMER_KEY);
        assert!(secret.token_credentials().is_none());

        let secret = secret.token(TOKEN, TOKEN_SECRET);
        let token = secret.token_credentials().unwrap();
        assert_eq!((token.key(), token.secret()), (TOKEN, TOKEN_SECRET));
        assert_eq!(secret.consumer().secret(), CONSUMER_SECRET);
    }

    #[test]
    fn debug_masks_secrets() {
        let secret = Secrets::new(CONSUMER_KEY, CONSUMER_SECRET).token(TOKEN, TOKEN_SECRET);
        let printed = format!("{:?}", secret);
        assert!(printed.contains(CONSUMER_KEY));
        assert!(!printed.contains(CONSUMER_SECRET));
        assert!(!printed.contains(TOKEN_SECRET));
    }
}
