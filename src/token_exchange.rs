//! The OAuth handshake: request token, user authorization, access token.
//!
//! ```rust,no_run
//! # fn run() -> myspaceid::Result<()> {
//! use myspaceid::{ClientConfig, TokenExchanger};
//!
//! let config = ClientConfig::from_env()?;
//! let mut exchanger = TokenExchanger::from_config(&config)?;
//!
//! // step 1: acquire request token & token secret
//! let request_token = exchanger.obtain_request_token()?;
//!
//! // step 2: send the user to the provider
//! let url = exchanger.build_authorization_url(&request_token, "http://localhost/callback")?;
//! println!("please access to: {}", url);
//!
//! // step 3: after the callback, trade the request token for an access token
//! let access_token = exchanger.exchange_for_access_token(&request_token)?;
//! # let _ = access_token;
//! # Ok(())
//! # }
//! ```

use subtle::ConstantTimeEq;
use url::Url;

use crate::api::ApiClient;
use crate::client::Client;
use crate::endpoints::{ACCESS_TOKEN_PATH, AUTHORIZATION_PATH, REQUEST_TOKEN_PATH};
use crate::transport::HttpTransport;
use crate::{
    ClientConfig, Error, MismatchKind, OAuthParameters, Result, Secrets, Token, TokenError,
};

/// Where a [`TokenExchanger`] is in the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Unauthenticated,
    RequestTokenObtained,
    /// Terminal.
    AccessTokenObtained,
}

#[derive(Debug)]
pub struct TokenExchanger<T> {
    client: Client<T>,
    api_root: Url,
    state: HandshakeState,
}

#[cfg(feature = "blocking")]
impl TokenExchanger<crate::transport::ReqwestTransport> {
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let transport = crate::transport::ReqwestTransport::from_config(config)?;
        Ok(TokenExchanger::with_config(config, transport))
    }
}

impl<T> TokenExchanger<T>
where
    T: HttpTransport,
{
    /// Only the consumer half of `secrets` is used.
    pub fn new(secrets: &Secrets, api_root: Url, transport: T) -> Self {
        TokenExchanger {
            client: Client::new(secrets.consumer_only(), transport),
            api_root,
            state: HandshakeState::Unauthenticated,
        }
    }

    pub fn with_config(config: &ClientConfig, transport: T) -> Self {
        TokenExchanger::new(&config.secrets(), config.api_root().clone(), transport)
    }

    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Ask the provider for a fresh, unauthorized request token.
    ///
    /// # Errors
    ///
    /// [`TokenError::HandshakeComplete`] once an access token was obtained.
    pub fn obtain_request_token(&mut self) -> Result<Token> {
        self.ensure_open()?;
        let url = self.endpoint(REQUEST_TOKEN_PATH);
        let token = self.call_oauth_api(url, None)?;
        self.state = HandshakeState::RequestTokenObtained;
        tracing::info!("request token obtained");
        Ok(token)
    }

    /// Signed url the user is redirected to for authorizing `request_token`.
    ///
    /// Nothing is sent.
    pub fn build_authorization_url(&self, request_token: &Token, callback_url: &str) -> Result<String> {
        let signed = self
            .client
            .get(self.endpoint(AUTHORIZATION_PATH))
            .oauth_parameters(OAuthParameters::new().callback(callback_url.to_string()))
            .token(request_token)
            .sign()?;
        Ok(signed.to_url())
    }

    /// Trade an authorized request token for an access token.
    pub fn exchange_for_access_token(&mut self, request_token: &Token) -> Result<Token> {
        self.ensure_open()?;
        let url = self.endpoint(ACCESS_TOKEN_PATH);
        let token = self.call_oauth_api(url, Some(request_token))?;
        self.state = HandshakeState::AccessTokenObtained;
        tracing::info!("access token obtained");
        Ok(token)
    }

    /// Turn this exchanger into an API client authorized by `access_token`.
    pub fn into_api_client(self, access_token: &Token) -> ApiClient<T> {
        let secrets = self.client.secrets().consumer_only().with_token(access_token);
        let transport = self.client.into_transport();
        ApiClient::new(secrets, self.api_root, transport)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state == HandshakeState::AccessTokenObtained {
            return Err(TokenError::HandshakeComplete.into());
        }
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_root.as_str().trim_end_matches('/'), path)
    }

    fn call_oauth_api(&self, url: String, token: Option<&Token>) -> Result<Token> {
        let mut request = self.client.get(url);
        if let Some(token) = token {
            request = request.token(token);
        }
        let response = request.send()?;
        let body = response.text();
        if response.status != 200 {
            tracing::warn!(status = response.status, "oauth endpoint returned an error");
            return Err(TokenError::UnexpectedStatus {
                status: response.status,
                body,
            }
            .into());
        }
        let token = Token::parse(&body)?;
        if token.key().is_empty() {
            return Err(TokenError::EmptyToken(body).into());
        }
        Ok(token)
    }
}

/// Check the `oauth_token` the provider sent back to the callback against
/// the request token stashed before the redirect.
///
/// `stashed` is the token's wire form. Returns the stashed token on match.
pub fn verify_callback(stashed: Option<&str>, returned: Option<&str>) -> Result<Token> {
    let stashed = stashed
        .filter(|wire| !wire.is_empty())
        .ok_or(Error::TokenMismatch(MismatchKind::NoTokenInSession))?;
    let token = Token::parse(stashed)?;
    let matched = match returned {
        Some(returned) if !returned.is_empty() && !token.key().is_empty() => {
            bool::from(token.key().as_bytes().ct_eq(returned.as_bytes()))
        }
        _ => false,
    };
    if matched {
        Ok(token)
    } else {
        tracing::warn!("callback token does not match the stashed request token");
        Err(Error::TokenMismatch(MismatchKind::TokensDoNotMatch))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::transport::{HttpRequest, HttpResponse, SandboxTransport};
    use crate::TransportError;

    type Reply = std::result::Result<HttpResponse, TransportError>;

    fn respond(request: &HttpRequest, status: u16, body: &str) -> Reply {
        Ok(HttpResponse {
            status,
            headers: Default::default(),
            body: body.as_bytes().to_vec(),
            final_url: request.url.clone(),
        })
    }

    fn root() -> Url {
        Url::parse("http://api.myspace.com").unwrap()
    }

    fn query(url: &str) -> Vec<(String, String)> {
        Url::parse(url).unwrap().query_pairs().into_owned().collect()
    }

    fn has(url: &str, key: &str, value: &str) -> bool {
        query(url).contains(&(key.to_string(), value.to_string()))
    }

    #[test]
    fn full_handshake() {
        let seen = RefCell::new(Vec::new());
        let transport = SandboxTransport::new(|request: &HttpRequest| {
            seen.borrow_mut().push(request.url.clone());
            if request.url.contains("/request_token") {
                respond(request, 200, "oauth_token=REQ&oauth_token_secret=REQSECRET")
            } else {
                respond(request, 200, "oauth_token=ACC&oauth_token_secret=ACCSECRET")
            }
        });
        let mut exchanger = TokenExchanger::new(&Secrets::new("CK", "CS"), root(), transport);
        assert_eq!(exchanger.state(), HandshakeState::Unauthenticated);

        let request_token = exchanger.obtain_request_token().unwrap();
        assert_eq!(request_token, Token::new("REQ", "REQSECRET"));
        assert_eq!(exchanger.state(), HandshakeState::RequestTokenObtained);
        assert!(!seen.borrow()[0].contains("oauth_token="));

        let access_token = exchanger.exchange_for_access_token(&request_token).unwrap();
        assert_eq!(access_token, Token::new("ACC", "ACCSECRET"));
        assert_eq!(exchanger.state(), HandshakeState::AccessTokenObtained);
        let exchange_url = seen.borrow()[1].clone();
        assert!(exchange_url.starts_with("http://api.myspace.com/access_token?"));
        assert!(has(&exchange_url, "oauth_token", "REQ"));
    }

    #[test]
    fn authorization_url_is_signed_without_sending() {
        let transport = SandboxTransport::new(|_: &HttpRequest| -> Reply {
            panic!("no request expected")
        });
        let exchanger = TokenExchanger::new(&Secrets::new("CK", "CS"), root(), transport);
        let url = exchanger
            .build_authorization_url(&Token::new("REQ", "REQSECRET"), "http://localhost/cb?x=1")
            .unwrap();
        assert!(url.starts_with("http://api.myspace.com/authorize?"));
        assert!(has(&url, "oauth_token", "REQ"));
        assert!(has(&url, "oauth_callback", "http://localhost/cb?x=1"));
        assert!(query(&url).iter().any(|(k, _)| k == "oauth_signature"));
        assert_eq!(exchanger.state(), HandshakeState::Unauthenticated);
    }

    #[test]
    fn non_200_is_an_exchange_error() {
        let transport = SandboxTransport::new(|request: &HttpRequest| respond(request, 401, "nope"));
        let mut exchanger = TokenExchanger::new(&Secrets::new("CK", "CS"), root(), transport);
        match exchanger.obtain_request_token() {
            Err(Error::TokenExchange(TokenError::UnexpectedStatus { status, body })) => {
                assert_eq!(status, 401);
                assert_eq!(body, "nope");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(exchanger.state(), HandshakeState::Unauthenticated);
    }

    #[test]
    fn unparsable_body_is_an_exchange_error() {
        let transport = SandboxTransport::new(|request: &HttpRequest| respond(request, 200, "hello"));
        let mut exchanger = TokenExchanger::new(&Secrets::new("CK", "CS"), root(), transport);
        assert!(matches!(
            exchanger.obtain_request_token(),
            Err(Error::TokenExchange(TokenError::TokenKeyNotFound(..)))
        ));
    }

    #[test]
    fn callback_verification() {
        let wire = Token::new("REQ", "REQSECRET").to_wire();

        let token = verify_callback(Some(&wire), Some("REQ")).unwrap();
        assert_eq!(token.secret(), "REQSECRET");

        assert!(matches!(
            verify_callback(None, Some("REQ")),
            Err(Error::TokenMismatch(MismatchKind::NoTokenInSession))
        ));
        assert!(matches!(
            verify_callback(Some(&wire), Some("OTHER")),
            Err(Error::TokenMismatch(MismatchKind::TokensDoNotMatch))
        ));
        assert!(matches!(
            verify_callback(Some(&wire), None),
            Err(Error::TokenMismatch(MismatchKind::TokensDoNotMatch))
        ));
        assert!(matches!(
            verify_callback(Some(&wire), Some("")),
            Err(Error::TokenMismatch(MismatchKind::TokensDoNotMatch))
        ));
    }

    #[test]
    fn blank_stashed_key_never_matches() {
        let wire = Token::new("", "S").to_wire();
        for returned in &[None, Some("")] {
            assert!(matches!(
                verify_callback(Some(&wire), *returned),
                Err(Error::TokenMismatch(MismatchKind::TokensDoNotMatch))
            ));
        }
    }

    #[test]
    fn empty_provider_token_is_an_exchange_error() {
        let transport = SandboxTransport::new(|request: &HttpRequest| {
            respond(request, 200, "oauth_token=&oauth_token_secret=")
        });
        let mut exchanger = TokenExchanger::new(&Secrets::new("CK", "CS"), root(), transport);
        match exchanger.obtain_request_token() {
            Err(Error::TokenExchange(TokenError::EmptyToken(body))) => {
                assert_eq!(body, "oauth_token=&oauth_token_secret=");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            exchanger.exchange_for_access_token(&Token::new("REQ", "S")),
            Err(Error::TokenExchange(TokenError::EmptyToken(_)))
        ));
        assert_eq!(exchanger.state(), HandshakeState::Unauthenticated);
    }

    #[test]
    fn access_token_state_is_terminal() {
        let calls = Cell::new(0);
        let transport = SandboxTransport::new(|request: &HttpRequest| {
            calls.set(calls.get() + 1);
            respond(request, 200, "oauth_token=T&oauth_token_secret=S")
        });
        let mut exchanger = TokenExchanger::new(&Secrets::new("CK", "CS"), root(), transport);
        let request_token = exchanger.obtain_request_token().unwrap();
        exchanger.exchange_for_access_token(&request_token).unwrap();
        assert_eq!(calls.get(), 2);

        assert!(matches!(
            exchanger.obtain_request_token(),
            Err(Error::TokenExchange(TokenError::HandshakeComplete))
        ));
        assert!(matches!(
            exchanger.exchange_for_access_token(&request_token),
            Err(Error::TokenExchange(TokenError::HandshakeComplete))
        ));
        assert_eq!(calls.get(), 2);
        assert_eq!(exchanger.state(), HandshakeState::AccessTokenObtained);
    }

    #[test]
    fn into_api_client_carries_access_token() {
        let transport = SandboxTransport::new(|request: &HttpRequest| respond(request, 200, "{}"));
        let exchanger = TokenExchanger::new(&Secrets::new("CK", "CS"), root(), transport);
        let api = exchanger.into_api_client(&Token::new("ACC", "ACCSECRET"));
        assert!(api.secrets().has_token());
        assert_eq!(api.api_root(), &root());
    }
}
