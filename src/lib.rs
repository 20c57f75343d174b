/*!
myspaceid: OAuth 1.0a signed access to the MySpaceID REST API.

# Overview

This library signs requests with HMAC-SHA1 the way the MySpace provider
expects them, drives the token handshake (request token, user authorization,
access token) and wraps the REST operations (profile, friends, albums,
photos, status, mood, notifications) behind a validating client.

HTTP goes through the [`HttpTransport`] trait. The default `blocking` feature
provides [`ReqwestTransport`]; runtimes that hand out their own fetch
primitive can wrap it in a [`SandboxTransport`].

# How to use

## Basic usecase 1 - acquiring OAuth token & secret

```rust,no_run
# fn run() -> myspaceid::Result<()> {
use std::io;
use myspaceid::{ClientConfig, TokenExchanger};

// prepare authorization info
let config = ClientConfig::builder()
    .consumer_key("[CONSUMER_KEY]")
    .consumer_secret("[CONSUMER_SECRET]")
    .build()?;

let mut exchanger = TokenExchanger::from_config(&config)?;

// step 1: acquire request token & token secret
let request_token = exchanger.obtain_request_token()?;

// step 2: let the user authorize it
let url = exchanger.build_authorization_url(&request_token, "http://localhost:8080/callback")?;
println!("please access to: {}", url);
let mut user_input = String::new();
io::stdin().read_line(&mut user_input).ok();

// step 3: acquire access token
let access_token = exchanger.exchange_for_access_token(&request_token)?;
println!("your token is: {}", access_token.key());
# Ok(())
# }
```

## Basic usecase 2 - updating the status

```rust,no_run
# fn run() -> myspaceid::Result<()> {
use myspaceid::{ApiClient, ClientConfig, Token};

let config = ClientConfig::from_env()?;
let access_token = Token::new("[ACCESS_TOKEN]", "[TOKEN_SECRET]");
let api = ApiClient::from_config(&config, Some(&access_token))?;

let user_id = api.get_userid()?;
api.set_status(&user_id, "Hello, MySpace!")?;
# Ok(())
# }
```

## Signing without sending

```rust
use myspaceid::{OAuthParameters, Secrets, Signer};
use http::Method;

let secrets = Secrets::new("CK", "CS").token("TK", "TS");
let params = OAuthParameters::new().nonce("abc123").timestamp(1234567890u64);
let signed = Signer::new(&secrets, params)
    .sign(&Method::GET, "http://api.example.com/v1/users/42/profile.json", &[] as &[(&str, &str)])
    .unwrap();
assert_eq!(signed.signature(), "5/yZ6eGA/+3bTcDPMMMzd5LFwDQ=");
```
*/
mod api;
mod client;
mod config;
pub mod endpoints;
mod error;
pub mod flow;
mod request;
mod secrets;
mod signer;
mod token;
mod token_exchange;
pub mod transport;
mod validation;

// exposed to external program
pub use api::{ActivityQuery, ApiClient, ApiResponse, Notification, NotificationButton};
pub use client::Client;
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_API_ROOT};
pub use endpoints::Operation;
pub use error::{
    ApiError, ConfigError, Error, MismatchKind, Result, SignError, SignResult, TokenError,
    TokenResult, TransportError,
};
pub use request::RequestBuilder;
pub use secrets::{Credentials, Secrets, SecretsProvider};
pub use signer::{percent_encode, OAuthParameters, SignedRequest, Signer, METHOD_OVERRIDE_HEADER};
pub use token::Token;
pub use token_exchange::{verify_callback, HandshakeState, TokenExchanger};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, SandboxTransport};
#[cfg(feature = "blocking")]
pub use transport::ReqwestTransport;
pub use validation::validate;

// exposed constant variables
/// Represents `oauth_callback`.
pub const OAUTH_CALLBACK_KEY: &str = "oauth_callback";
/// Represents `oauth_nonce`.
pub const OAUTH_NONCE_KEY: &str = "oauth_nonce";
/// Represents `oauth_timestamp`.
pub const OAUTH_TIMESTAMP_KEY: &str = "oauth_timestamp";
/// Represents `oauth_token`.
pub const OAUTH_TOKEN_KEY: &str = "oauth_token";
/// Represents `oauth_verifier`.
pub const OAUTH_VERIFIER_KEY: &str = "oauth_verifier";
/// Represents `oauth_version`.
pub const OAUTH_VERSION_KEY: &str = "oauth_version";

// crate-private constant variables
pub(crate) const OAUTH_KEY_PREFIX: &str = "oauth_";
pub(crate) const OAUTH_SIGNATURE_METHOD_KEY: &str = "oauth_signature_method";
pub(crate) const OAUTH_SIGNATURE_KEY: &str = "oauth_signature";
pub(crate) const OAUTH_CONSUMER_KEY: &str = "oauth_consumer_key";
