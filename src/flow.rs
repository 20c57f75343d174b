//! Consumer-side login flows for web applications.
//!
//! [`ThreeLeggedFlow`] is the classic redirect dance: stash a request token
//! in the session, send the user to the provider, verify and exchange on the
//! callback. [`HybridFlow`] piggybacks the authorization on an OpenID login:
//! the OpenID request carries an OAuth extension and the positive assertion
//! hands back an already authorized request token.
//!
//! The web framework, the session backend and the OpenID library stay
//! outside this crate; they plug in through [`SessionStore`],
//! [`AuthorizationRequest`] and [`AuthorizationResponse`].

use std::error::Error as StdError;

use url::Url;

use crate::api::ApiClient;
use crate::token_exchange::{verify_callback, TokenExchanger};
use crate::transport::HttpTransport;
use crate::{ClientConfig, Error, Result, Token};

/// Session key holding the request token between redirect and callback.
pub const UNAUTHED_TOKEN_KEY: &str = "unauthed_token";
/// Session key holding the access token once the flow completed.
pub const ACCESS_TOKEN_KEY: &str = "access_token";

/// Namespace of the OpenID OAuth extension.
pub const OPENID_OAUTH_NAMESPACE: &str = "http://specs.openid.net/extensions/oauth/1.0";

const FINISH_PATH: &str = "/finish";

/// Per-user key/value storage that survives between HTTP requests.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String);

    fn remove(&mut self, key: &str);

    /// Persist pending changes.
    fn save(&mut self) -> std::result::Result<(), Box<dyn StdError + Send + Sync>>;

    /// Drop everything stored for this user.
    fn invalidate(&mut self);
}

fn save<S: SessionStore + ?Sized>(session: &mut S) -> Result<()> {
    session.save().map_err(|e| Error::Session(e.to_string()))
}

fn stored_token<S: SessionStore + ?Sized>(session: &S, key: &str) -> Result<Option<Token>> {
    match session.get(key) {
        Some(wire) if !wire.is_empty() => Ok(Some(Token::parse(&wire)?)),
        _ => Ok(None),
    }
}

/// Redirect-based authorization for a web consumer.
///
/// One value can serve every request of the application; per-user state
/// lives in the [`SessionStore`] passed to each step.
#[derive(Debug, Clone)]
pub struct ThreeLeggedFlow<T> {
    config: ClientConfig,
    transport: T,
}

impl<T> ThreeLeggedFlow<T>
where
    T: HttpTransport,
{
    pub fn new(config: ClientConfig, transport: T) -> Self {
        ThreeLeggedFlow { config, transport }
    }

    /// Obtain a request token, stash it in `session` and return the url the
    /// user must be redirected to.
    pub fn start<S>(&self, session: &mut S, callback_url: &str) -> Result<String>
    where
        S: SessionStore + ?Sized,
    {
        let mut exchanger = TokenExchanger::with_config(&self.config, &self.transport);
        let request_token = exchanger.obtain_request_token()?;
        let redirect = exchanger.build_authorization_url(&request_token, callback_url)?;
        session.set(UNAUTHED_TOKEN_KEY, request_token.to_wire());
        save(session)?;
        Ok(redirect)
    }

    /// Handle the provider's callback.
    ///
    /// `returned_token` is the `oauth_token` query parameter of the callback
    /// request. On success the access token is stored in `session` and
    /// returned.
    ///
    /// The stashed request token is removed whatever the outcome, so a
    /// callback can only be handled once.
    pub fn complete<S>(&self, session: &mut S, returned_token: Option<&str>) -> Result<Token>
    where
        S: SessionStore + ?Sized,
    {
        let stashed = session.get(UNAUTHED_TOKEN_KEY);
        session.remove(UNAUTHED_TOKEN_KEY);
        match self.exchange_stashed(stashed.as_deref(), returned_token) {
            Ok(access_token) => {
                session.set(ACCESS_TOKEN_KEY, access_token.to_wire());
                save(session)?;
                Ok(access_token)
            }
            Err(e) => {
                if let Err(save_error) = save(session) {
                    tracing::warn!(error = %save_error, "failed to persist session after rejected callback");
                }
                Err(e)
            }
        }
    }

    fn exchange_stashed(&self, stashed: Option<&str>, returned_token: Option<&str>) -> Result<Token> {
        let request_token = verify_callback(stashed, returned_token)?;
        let mut exchanger = TokenExchanger::with_config(&self.config, &self.transport);
        exchanger.exchange_for_access_token(&request_token)
    }

    pub fn access_token<S>(&self, session: &S) -> Result<Option<Token>>
    where
        S: SessionStore + ?Sized,
    {
        stored_token(session, ACCESS_TOKEN_KEY)
    }

    /// API client for the user of `session`.
    ///
    /// # Errors
    ///
    /// [`Error::MissingToken`] if the flow has not completed for this session.
    pub fn api_client<S>(&self, session: &S) -> Result<ApiClient<&T>>
    where
        S: SessionStore + ?Sized,
    {
        let token = self.access_token(session)?.ok_or(Error::MissingToken)?;
        Ok(ApiClient::with_config(&self.config, Some(&token), &self.transport))
    }

    pub fn logout<S>(&self, session: &mut S)
    where
        S: SessionStore + ?Sized,
    {
        session.invalidate();
    }
}

/// Arguments of the OpenID OAuth extension attached to an authorization
/// request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthAuthorizeTokenRequest {
    consumer: String,
    scope: Option<String>,
}

impl OAuthAuthorizeTokenRequest {
    pub fn new<C: Into<String>>(consumer: C, scope: Option<String>) -> Self {
        OAuthAuthorizeTokenRequest {
            consumer: consumer.into(),
            scope,
        }
    }

    pub fn namespace(&self) -> &'static str {
        OPENID_OAUTH_NAMESPACE
    }

    pub fn consumer(&self) -> &str {
        &self.consumer
    }

    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Extension arguments, without the namespace prefix.
    pub fn extension_args(&self) -> Vec<(&'static str, String)> {
        let mut args = vec![("consumer", self.consumer.clone())];
        if let Some(ref scope) = self.scope {
            args.push(("scope", scope.clone()));
        }
        args
    }
}

/// An OpenID authentication request produced by an external OpenID library.
pub trait AuthorizationRequest {
    fn add_extension(&mut self, extension: &OAuthAuthorizeTokenRequest);

    /// Url of the provider the user agent is redirected to.
    fn redirect_url(&self, realm: &str, return_to: &str) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Success,
    Cancel,
    Failure,
}

/// The provider's answer, as verified by the external OpenID library.
pub trait AuthorizationResponse {
    fn status(&self) -> AuthStatus;

    /// Key of the request token the user authorized along with the login.
    fn authorized_request_token(&self) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HybridOutcome {
    /// Access token obtained for the authorized request token.
    Authorized(Token),
    /// Login succeeded but no OAuth authorization came with it.
    NoToken,
    Cancelled,
    Failed,
}

/// OpenID login with OAuth authorization piggybacked on it.
#[derive(Debug, Clone)]
pub struct HybridFlow<T> {
    config: ClientConfig,
    transport: T,
}

impl<T> HybridFlow<T>
where
    T: HttpTransport,
{
    pub fn new(config: ClientConfig, transport: T) -> Self {
        HybridFlow { config, transport }
    }

    /// Attach the OAuth extension to `request` and compute the provider
    /// redirect.
    ///
    /// The return-to url is `request_uri` with its path replaced by
    /// `/finish`; the realm is its scheme, host and port.
    pub fn begin<R>(&self, request: &mut R, request_uri: &str) -> Result<String>
    where
        R: AuthorizationRequest + ?Sized,
    {
        let (realm, return_to) = realm_and_return_to(request_uri)?;
        request.add_extension(&OAuthAuthorizeTokenRequest::new(
            self.config.consumer_key(),
            None,
        ));
        let redirect = request.redirect_url(&realm, &return_to);
        tracing::debug!(realm = %realm, return_to = %return_to, "openid redirect prepared");
        Ok(redirect)
    }

    /// Handle the provider's answer. The session is invalidated whatever
    /// the outcome.
    pub fn finish<R, S>(&self, response: &R, session: &mut S) -> Result<HybridOutcome>
    where
        R: AuthorizationResponse + ?Sized,
        S: SessionStore + ?Sized,
    {
        let outcome = self.outcome(response);
        session.invalidate();
        outcome
    }

    fn outcome<R>(&self, response: &R) -> Result<HybridOutcome>
    where
        R: AuthorizationResponse + ?Sized,
    {
        match response.status() {
            AuthStatus::Success => match response.authorized_request_token() {
                Some(key) if !key.is_empty() => {
                    // the provider never reveals the secret of a piggybacked token
                    let request_token = Token::new(key, "");
                    let mut exchanger = TokenExchanger::with_config(&self.config, &self.transport);
                    let access_token = exchanger.exchange_for_access_token(&request_token)?;
                    Ok(HybridOutcome::Authorized(access_token))
                }
                _ => Ok(HybridOutcome::NoToken),
            },
            AuthStatus::Cancel => Ok(HybridOutcome::Cancelled),
            AuthStatus::Failure => {
                tracing::error!("openid login failed");
                Ok(HybridOutcome::Failed)
            }
        }
    }
}

fn realm_and_return_to(request_uri: &str) -> Result<(String, String)> {
    let mut url = Url::parse(request_uri)
        .map_err(|e| Error::invalid_parameter("request_uri", e.to_string()))?;
    if url.host_str().is_none() {
        return Err(Error::invalid_parameter("request_uri", "has no host"));
    }
    let realm = url.origin().ascii_serialization();
    url.set_path(FINISH_PATH);
    url.set_query(None);
    url.set_fragment(None);
    Ok((realm, url.to_string()))
}
