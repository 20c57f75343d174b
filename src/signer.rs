use std::borrow::Cow;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::prelude::*;
use hmac::{Hmac, Mac};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;
use url::Url;

use crate::transport::HttpRequest;
use crate::{
    SecretsProvider, SignError, SignResult, OAUTH_CALLBACK_KEY, OAUTH_CONSUMER_KEY,
    OAUTH_KEY_PREFIX, OAUTH_NONCE_KEY, OAUTH_SIGNATURE_KEY, OAUTH_SIGNATURE_METHOD_KEY,
    OAUTH_TIMESTAMP_KEY, OAUTH_TOKEN_KEY, OAUTH_VERIFIER_KEY, OAUTH_VERSION_KEY,
};

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const OAUTH_VERSION: &str = "1.0";
const NONCE_LENGTH: usize = 32;
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Header that tunnels a PUT through a POST.
pub const METHOD_OVERRIDE_HEADER: &str = "x-http-method-override";

/// RFC 3986 unreserved characters stay as they are, everything else is escaped.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode a key or value the way OAuth 1.0a requires.
pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, OAUTH_ENCODE_SET).to_string()
}

#[derive(Debug, Clone)]
pub struct Signer<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    secrets: &'a TSecretsProvider,
    parameters: OAuthParameters<'a>,
}

impl<'a, TSecretsProvider> Signer<'a, TSecretsProvider>
where
    TSecretsProvider: SecretsProvider,
{
    pub fn new(secrets: &'a TSecretsProvider, parameters: OAuthParameters<'a>) -> Self {
        Signer {
            secrets,
            parameters,
        }
    }

    /// Sign a request to `url`.
    ///
    /// Query pairs already present in `url` are lifted into the signed
    /// parameter set, followed by `extra`. The resulting [`SignedRequest`]
    /// decides where each parameter travels.
    pub fn sign<K, V>(self, method: &Method, url: &str, extra: &[(K, V)]) -> SignResult<SignedRequest>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let (consumer_key, consumer_secret) = self.secrets.get_consumer_key_pair();
        if consumer_key.is_empty() {
            return Err(SignError::MissingConsumerCredentials("consumer key"));
        }
        if consumer_secret.is_empty() {
            return Err(SignError::MissingConsumerCredentials("consumer secret"));
        }
        let (token, token_secret) = self.secrets.get_token_option_pair();

        let parsed = Url::parse(url).map_err(|e| SignError::InvalidUrl(url.into(), e.to_string()))?;
        let base_url = normalize_url(&parsed)
            .ok_or_else(|| SignError::InvalidUrl(url.into(), "expected an http(s) url with a host".into()))?;

        let mut extra_params: Vec<(String, String)> = parsed.query_pairs().into_owned().collect();
        extra_params.extend(
            extra
                .iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.as_ref().to_string())),
        );
        if let Some((key, _)) = extra_params
            .iter()
            .find(|(k, _)| k.starts_with(OAUTH_KEY_PREFIX))
        {
            return Err(SignError::ReservedParameter(key.clone()));
        }

        let mut oauth_params = self.parameters.build_params(consumer_key, token);
        let base_string = base_string(
            method.as_str(),
            &base_url,
            oauth_params.iter().chain(extra_params.iter()),
        );
        let signing_key = format!(
            "{}&{}",
            percent_encode(consumer_secret),
            percent_encode(token_secret.unwrap_or_default())
        );
        let signature = hmac_sha1_base64(&signing_key, &base_string);
        oauth_params.push((OAUTH_SIGNATURE_KEY.to_string(), signature.clone()));

        tracing::debug!(method = %method, url = %base_url, "signed oauth request");

        Ok(SignedRequest {
            method: method.clone(),
            base_url,
            oauth_params,
            extra_params,
            signature,
            base_string,
        })
    }
}

/// Scheme and host lower-cased, default port dropped, query and fragment removed.
fn normalize_url(url: &Url) -> Option<String> {
    match url.scheme() {
        "http" | "https" => {}
        _ => return None,
    }
    let host = url.host_str()?.to_ascii_lowercase();
    // port() is None when the port is the scheme's default
    let port = url.port().map(|p| format!(":{}", p)).unwrap_or_default();
    Some(format!("{}://{}{}{}", url.scheme(), host, port, url.path()))
}

fn base_string<'p, I>(method: &str, base_url: &str, params: I) -> String
where
    I: Iterator<Item = &'p (String, String)>,
{
    let mut encoded: Vec<(String, String)> = params
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();
    let normalized = join_pairs(encoded.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        percent_encode(base_url),
        percent_encode(&normalized)
    )
}

#[allow(clippy::missing_panics_doc)] // HMAC accepts any key size
fn hmac_sha1_base64(key: &str, message: &str) -> String {
    let mut mac = HmacSha1::new_from_slice(key.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message.as_bytes());
    BASE64_STANDARD.encode(mac.finalize().into_bytes())
}

fn join_pairs<'p, I>(pairs: I) -> String
where
    I: Iterator<Item = (&'p str, &'p str)>,
{
    pairs
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

fn encode_pairs(pairs: &[(String, String)]) -> String {
    join_pairs(
        pairs
            .iter()
            .map(|(k, v)| (percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str())),
    )
}

fn generate_nonce() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(NONCE_LENGTH)
        .map(char::from)
        .collect()
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// A request whose signature has been computed but which has not been sent.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    method: Method,
    base_url: String,
    oauth_params: Vec<(String, String)>,
    extra_params: Vec<(String, String)>,
    signature: String,
    base_string: String,
}

impl SignedRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The normalized url the signature was computed over.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `oauth_*` protocol parameters, `oauth_signature` included.
    pub fn oauth_params(&self) -> &[(String, String)] {
        &self.oauth_params
    }

    /// Request-specific parameters.
    pub fn extra_params(&self) -> &[(String, String)] {
        &self.extra_params
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn base_string(&self) -> &str {
        &self.base_string
    }

    /// Fully-qualified url carrying every parameter in the query string.
    pub fn to_url(&self) -> String {
        let all: Vec<(String, String)> = self
            .oauth_params
            .iter()
            .chain(self.extra_params.iter())
            .cloned()
            .collect();
        format!("{}?{}", self.base_url, encode_pairs(&all))
    }

    /// Url carrying only the OAuth protocol parameters.
    pub fn oauth_url(&self) -> String {
        format!("{}?{}", self.base_url, encode_pairs(&self.oauth_params))
    }

    /// `key=value&...` encoding of the request-specific parameters.
    pub fn body(&self) -> String {
        encode_pairs(&self.extra_params)
    }

    /// Lay the request out for the wire.
    ///
    /// GET carries everything in the url. POST and PUT keep the OAuth
    /// parameters in the url and the payload in the body; the provider
    /// rejects OAuth parameters mixed into a form body, so this split must
    /// stay. PUT goes out as POST with the method override header.
    pub fn into_http_request(self) -> HttpRequest {
        let mut headers = HeaderMap::new();
        if self.method == Method::POST || self.method == Method::PUT {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
            if self.method == Method::PUT {
                headers.insert(
                    HeaderName::from_static(METHOD_OVERRIDE_HEADER),
                    HeaderValue::from_static("PUT"),
                );
            }
            HttpRequest {
                method: Method::POST,
                url: self.oauth_url(),
                body: Some(self.body()),
                headers,
            }
        } else {
            HttpRequest {
                url: self.to_url(),
                method: self.method,
                body: None,
                headers,
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct OAuthParameters<'a> {
    callback: Option<Cow<'a, str>>,
    nonce: Option<Cow<'a, str>>,
    timestamp: Option<u64>,
    verifier: Option<Cow<'a, str>>,
    version: bool,
}

impl Default for OAuthParameters<'static> {
    fn default() -> Self {
        OAuthParameters {
            callback: None,
            nonce: None,
            timestamp: None,
            verifier: None,
            version: true,
        }
    }
}

impl<'a> OAuthParameters<'a> {
    pub fn new() -> Self {
        OAuthParameters {
            callback: None,
            nonce: None,
            timestamp: None,
            verifier: None,
            version: true,
        }
    }

    pub fn callback<T>(self, callback: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            callback: Some(callback.into()),
            ..self
        }
    }

    /// set the oauth_nonce value
    ///
    /// A fresh random nonce is generated for every signature unless this is set.
    pub fn nonce<T>(self, nonce: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            nonce: Some(nonce.into()),
            ..self
        }
    }

    /// set the oauth_timestamp value
    pub fn timestamp<T>(self, timestamp: T) -> Self
    where
        T: Into<u64>,
    {
        OAuthParameters {
            timestamp: Some(timestamp.into()),
            ..self
        }
    }

    /// set the oauth_verifier value
    pub fn verifier<T>(self, verifier: T) -> Self
    where
        T: Into<Cow<'a, str>>,
    {
        OAuthParameters {
            verifier: Some(verifier.into()),
            ..self
        }
    }

    /// set the oauth_version value (boolean)
    ///
    /// # Note
    /// Defaults to `true`, which sends `oauth_version=1.0`.
    /// With `false`, oauth_version is left out of the request.
    pub fn version<T>(self, version: T) -> Self
    where
        T: Into<bool>,
    {
        OAuthParameters {
            version: version.into(),
            ..self
        }
    }

    fn build_params(&self, consumer_key: &str, token: Option<&str>) -> Vec<(String, String)> {
        // NOTE: items are added by alphabetical order
        let mut params = Vec::with_capacity(9);
        if let Some(ref callback) = self.callback {
            params.push((OAUTH_CALLBACK_KEY.to_string(), callback.to_string()));
        }
        params.push((OAUTH_CONSUMER_KEY.to_string(), consumer_key.to_string()));
        let nonce = match self.nonce {
            Some(ref nonce) => nonce.to_string(),
            None => generate_nonce(),
        };
        params.push((OAUTH_NONCE_KEY.to_string(), nonce));
        params.push((
            OAUTH_SIGNATURE_METHOD_KEY.to_string(),
            SIGNATURE_METHOD.to_string(),
        ));
        let timestamp = self.timestamp.unwrap_or_else(current_timestamp);
        params.push((OAUTH_TIMESTAMP_KEY.to_string(), timestamp.to_string()));
        if let Some(token) = token {
            params.push((OAUTH_TOKEN_KEY.to_string(), token.to_string()));
        }
        if let Some(ref verifier) = self.verifier {
            params.push((OAUTH_VERIFIER_KEY.to_string(), verifier.to_string()));
        }
        if self.version {
            params.push((OAUTH_VERSION_KEY.to_string(), OAUTH_VERSION.to_string()));
        }
        params
    }
}
