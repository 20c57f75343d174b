use std::fmt;
use std::str::FromStr;

use crate::{TokenError, TokenResult, OAUTH_TOKEN_KEY};

const OAUTH_TOKEN_SECRET_KEY: &str = "oauth_token_secret";

/// An issued OAuth token: a request token during the handshake, an access
/// token afterwards.
///
/// The wire form is `oauth_token=<key>&oauth_token_secret=<secret>`, form
/// encoded. That string is what gets stashed in a session store.
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    key: String,
    secret: String,
}

impl Token {
    pub fn new<TKey, TSecret>(key: TKey, secret: TSecret) -> Self
    where
        TKey: Into<String>,
        TSecret: Into<String>,
    {
        Token {
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

    /// Parse a token response body or a stashed wire string.
    ///
    /// Both keys must be present; their values may be empty. Unrelated keys
    /// such as `oauth_callback_confirmed` are ignored.
    pub fn parse(text: &str) -> TokenResult<Token> {
        let mut oauth_token = None;
        let mut oauth_token_secret = None;
        for (key, value) in url::form_urlencoded::parse(text.as_bytes()) {
            match key.as_ref() {
                OAUTH_TOKEN_KEY => oauth_token = Some(value.into_owned()),
                OAUTH_TOKEN_SECRET_KEY => oauth_token_secret = Some(value.into_owned()),
                _ => {}
            }
        }
        match (oauth_token, oauth_token_secret) {
            (Some(key), Some(secret)) => Ok(Token { key, secret }),
            (None, _) => Err(TokenError::TokenKeyNotFound(
                OAUTH_TOKEN_KEY,
                text.to_string(),
            )),
            (_, None) => Err(TokenError::TokenKeyNotFound(
                OAUTH_TOKEN_SECRET_KEY,
                text.to_string(),
            )),
        }
    }

    /// Serialize to the wire form accepted by [`Token::parse`].
    pub fn to_wire(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair(OAUTH_TOKEN_KEY, &self.key)
            .append_pair(OAUTH_TOKEN_SECRET_KEY, &self.secret)
            .finish()
    }
}

impl FromStr for Token {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Token::parse(s)
    }
}

// secret stays out of logs
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("key", &self.key)
            .field("secret", &"*****")
            .finish()
    }
}

const _: fn() = || {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Token>();
};

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn parse_response_typical() {
        let resp_str_sample = "oauth_token=Z6eEdO8MOmk394WozF5oKyuAv855l4Mlqo7hhlSLik&oauth_token_secret=Kd75W4OQfb2oJTV0vzGzeXftVAwgMnEK9MumzYcM&oauth_callback_confirmed=true";
        let parsed = Token::parse(resp_str_sample).unwrap();
        assert_eq!(parsed.key(), "Z6eEdO8MOmk394WozF5oKyuAv855l4Mlqo7hhlSLik");
        assert_eq!(parsed.secret(), "Kd75W4OQfb2oJTV0vzGzeXftVAwgMnEK9MumzYcM");
    }

    #[test]
    fn parse_any_key_order() {
        let parsed: Token = "oauth_token_secret=s3cr3t&oauth_token=abc".parse().unwrap();
        assert_eq!(parsed.key(), "abc");
        assert_eq!(parsed.secret(), "s3cr3t");
    }

    #[test]
    fn parse_response_edge() {
        let resp_str_sample = "oauth_token=%3D&oauth_token_secret=&keyonly=&keyonly2&=&&";
        let parsed = Token::parse(resp_str_sample).unwrap();
        assert_eq!(parsed.key(), "=");
        assert_eq!(parsed.secret(), "");
    }

    #[test]
    fn parse_minimal() {
        let parsed = Token::parse("oauth_token&oauth_token_secret").unwrap();
        assert_eq!(parsed.key(), "");
        assert_eq!(parsed.secret(), "");
    }

    #[test]
    fn parse_token_notfound() {
        let resp_str_sample = "oauth_token_secret=";
        let parsed = Token::parse(resp_str_sample);
        if let Err(TokenError::TokenKeyNotFound(key, resp_str)) = parsed {
            assert_eq!(key, OAUTH_TOKEN_KEY);
            assert_eq!(resp_str, resp_str_sample)
        } else {
            panic!("expected TokenKeyNotFound, got {:?}", parsed)
        }
    }

    #[test]
    fn parse_token_secret_notfound() {
        let resp_str_sample = "oauth_token=";
        let parsed = Token::parse(resp_str_sample);
        if let Err(TokenError::TokenKeyNotFound(key, resp_str)) = parsed {
            assert_eq!(key, OAUTH_TOKEN_SECRET_KEY);
            assert_eq!(resp_str, resp_str_sample)
        } else {
            panic!("expected TokenKeyNotFound, got {:?}", parsed)
        }
    }

    #[test]
    fn parse_html_error_page() {
        assert!(Token::parse("<html><body>401 Unauthorized</body></html>").is_err());
    }

    #[test]
    fn wire_round_trip() {
        for wire in &[
            "oauth_token=abc&oauth_token_secret=def",
            "oauth_token=a%2Fb%3Dc&oauth_token_secret=with+space",
            "oauth_token=&oauth_token_secret=",
            "oauth_token=%E5%B0%91%E5%A5%B3&oauth_token_secret=%7Etilde",
        ] {
            assert_eq!(&Token::parse(wire).unwrap().to_wire(), wire);
        }
    }

    #[test]
    fn debug_hides_secret() {
        let token = Token::new("visible", "hidden");
        let printed = format!("{:?}", token);
        assert!(printed.contains("visible"));
        assert!(!printed.contains("hidden"));
    }
}
