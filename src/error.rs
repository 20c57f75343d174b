use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;
pub type SignResult<T> = std::result::Result<T, SignError>;
pub type TokenResult<T> = std::result::Result<T, TokenError>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid parameter value. {name} {reason}")]
    InvalidParameter { name: String, reason: String },
    #[error("this call requires an OAuth access token; attach one with Secrets::token or pass it to ApiClient::with_config")]
    MissingToken,
    #[error("OAuth sign failed : {0}")]
    Signer(#[from] SignError),
    #[error("token acquisition failed : {0}")]
    TokenExchange(#[from] TokenError),
    #[error("{0}")]
    TokenMismatch(MismatchKind),
    #[error("request failed : {0}")]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("response is not valid JSON : {source}")]
    ResponseParse {
        #[source]
        source: serde_json::Error,
        body: String,
    },
    #[error("configuration error : {0}")]
    Config(#[from] ConfigError),
    #[error("session store failed : {0}")]
    Session(String),
}

impl Error {
    pub(crate) fn invalid_parameter<N, R>(name: N, reason: R) -> Self
    where
        N: Into<String>,
        R: Into<String>,
    {
        Error::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error("consumer credentials are missing: {0} is empty")]
    MissingConsumerCredentials(&'static str),
    #[error("invalid request url {0}: {1}")]
    InvalidUrl(String, String),
    #[error("parameter {0} is reserved for the oauth protocol and cannot be sent as a request parameter.")]
    ReservedParameter(String),
    #[error("parameters could not be serialized: {0}")]
    Serialize(String),
}

#[derive(Error, Debug, Clone)]
pub enum TokenError {
    #[error("response has malformed format: not found {0} in {1}")]
    TokenKeyNotFound(&'static str, String),
    #[error("OAuth API returned status {status}: {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("response carries an empty oauth_token: {0}")]
    EmptyToken(String),
    #[error("the handshake already produced an access token")]
    HandshakeComplete,
}

/// Why an OAuth callback was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MismatchKind {
    /// Nothing was stashed before the redirect, usually an expired or foreign session.
    NoTokenInSession,
    /// The callback carried a different request token than the one stashed.
    TokensDoNotMatch,
}

impl std::fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MismatchKind::NoTokenInSession => f.write_str("No un-authed token found in session"),
            MismatchKind::TokensDoNotMatch => {
                f.write_str("Something went wrong! Tokens do not match")
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("request timed out")]
    Timeout,
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

#[cfg(feature = "blocking")]
impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_connect() {
            TransportError::Connect(err.to_string())
        } else {
            TransportError::Other(Box::new(err))
        }
    }
}

/// Non-success response from the provider.
#[derive(Error, Debug, Clone)]
#[error("{message} (HTTP {status})")]
pub struct ApiError {
    pub message: String,
    pub status: u16,
    pub body: String,
}

impl ApiError {
    /// 401 or 403: the consumer or token credentials were refused.
    pub fn is_auth_failure(&self) -> bool {
        self.status == 401 || self.status == 403
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("consumer key cannot be empty")]
    EmptyConsumerKey,
    #[error("consumer secret cannot be empty")]
    EmptyConsumerSecret,
    #[error("missing required field '{0}'")]
    MissingRequiredField(&'static str),
    #[error("invalid api root '{0}': expected an absolute http(s) url")]
    InvalidApiRoot(String),
    #[error("invalid value '{value}' for {name}")]
    InvalidValue { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_classification() {
        let err = |status| ApiError {
            message: "MySpace REST API returned an error".to_string(),
            status,
            body: String::new(),
        };
        assert!(err(401).is_auth_failure());
        assert!(err(403).is_auth_failure());
        assert!(err(404).is_client_error());
        assert!(!err(404).is_auth_failure());
        assert!(err(503).is_server_error());
        assert!(!err(503).is_client_error());
    }

    #[test]
    fn mismatch_messages_are_distinct() {
        let none = Error::TokenMismatch(MismatchKind::NoTokenInSession).to_string();
        let differ = Error::TokenMismatch(MismatchKind::TokensDoNotMatch).to_string();
        assert!(none.contains("No un-authed token"));
        assert!(differ.contains("do not match"));
    }

    #[test]
    fn missing_token_points_at_the_attach_points() {
        let message = Error::MissingToken.to_string();
        assert!(message.contains("Secrets::token"));
        assert!(message.contains("ApiClient::with_config"));
        assert!(!message.contains("constructing"));
    }

    #[test]
    fn invalid_parameter_names_the_parameter() {
        let err = Error::invalid_parameter("user_id", "cannot be negative");
        assert_eq!(
            err.to_string(),
            "invalid parameter value. user_id cannot be negative"
        );
    }
}
