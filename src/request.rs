use http::Method;
use serde::Serialize;

use crate::client::Client;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::{OAuthParameters, Result, Secrets, SignError, SignedRequest, Signer, Token};

/// One request under construction: parameters, OAuth overrides and,
/// optionally, per-request token credentials.
pub struct RequestBuilder<'c, T> {
    client: &'c Client<T>,
    method: Method,
    url: String,
    params: Vec<(String, String)>,
    oauth: OAuthParameters<'static>,
    secrets: Option<Secrets>,
    error: Option<SignError>,
}

impl<'c, T> RequestBuilder<'c, T>
where
    T: HttpTransport,
{
    pub(crate) fn new(client: &'c Client<T>, method: Method, url: String) -> Self {
        RequestBuilder {
            client,
            method,
            url,
            params: Vec::new(),
            oauth: OAuthParameters::new(),
            secrets: None,
            error: None,
        }
    }

    /// Add request parameters.
    ///
    /// Anything `serde_urlencoded` can serialize works: slices of pairs,
    /// maps, structs. Parameters land in the query for GET and in the body
    /// for POST/PUT. Fields serialized as `None` are skipped.
    pub fn parameters<P: Serialize + ?Sized>(mut self, params: &P) -> Self {
        match serde_urlencoded::to_string(params) {
            Ok(encoded) => {
                self.params
                    .extend(url::form_urlencoded::parse(encoded.as_bytes()).into_owned());
            }
            Err(e) => {
                self.error.get_or_insert(SignError::Serialize(e.to_string()));
            }
        }
        self
    }

    /// Add a single request parameter.
    pub fn parameter<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Override OAuth protocol values (nonce, timestamp, callback, verifier).
    pub fn oauth_parameters(mut self, oauth: OAuthParameters<'static>) -> Self {
        self.oauth = oauth;
        self
    }

    /// Sign with `token` instead of the client's own token credentials.
    pub fn token(mut self, token: &Token) -> Self {
        self.secrets = Some(self.client.secrets().consumer_only().with_token(token));
        self
    }

    /// Compute the signature without sending anything.
    pub fn sign(self) -> Result<SignedRequest> {
        if let Some(err) = self.error {
            return Err(err.into());
        }
        let client = self.client;
        let secrets = match self.secrets {
            Some(ref secrets) => secrets,
            None => client.secrets(),
        };
        let signed = Signer::new(secrets, self.oauth).sign(&self.method, &self.url, &self.params)?;
        Ok(signed)
    }

    /// Sign and lay the request out for the wire.
    pub fn build(self) -> Result<HttpRequest> {
        Ok(self.sign()?.into_http_request())
    }

    /// Sign the request and send it through the client's transport.
    ///
    /// # Errors
    ///
    /// Fails on signing problems and transport-level failures. Any HTTP
    /// status, including 4xx and 5xx, is returned as a response.
    pub fn send(self) -> Result<HttpResponse> {
        let client = self.client;
        let request = self.build()?;
        let response = client.transport().fetch(&request)?;
        tracing::debug!(
            method = %request.method,
            status = response.status,
            "oauth request sent"
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use serde::Serialize;

    use super::*;
    use crate::transport::SandboxTransport;
    use crate::{Error, TransportError};

    fn fixed() -> OAuthParameters<'static> {
        OAuthParameters::new().nonce("abc123").timestamp(1_234_567_890u64)
    }

    #[derive(Serialize)]
    struct Paging {
        page: Option<u32>,
        page_size: Option<u32>,
    }

    #[test]
    fn capture_post_body() {
        let client = Client::new(
            Secrets::new("CK", "CS"),
            SandboxTransport::new(|_: &HttpRequest| Err(TransportError::Timeout)),
        );
        let request = client
            .post("https://photos.example.net/initiate")
            .parameters(&[("少女", "終末旅行")])
            .build()
            .unwrap();
        assert_eq!(
            request.body.unwrap(),
            "%E5%B0%91%E5%A5%B3=%E7%B5%82%E6%9C%AB%E6%97%85%E8%A1%8C"
        );
    }

    #[test]
    fn serialized_none_is_omitted() {
        let client = Client::new(
            Secrets::new("CK", "CS").token("TK", "TS"),
            SandboxTransport::new(|_: &HttpRequest| Err(TransportError::Timeout)),
        );
        let signed = client
            .get("http://api.example.com/v1/users/42/photos.json")
            .parameters(&Paging {
                page: Some(2),
                page_size: None,
            })
            .sign()
            .unwrap();
        assert_eq!(
            signed.extra_params(),
            &[("page".to_string(), "2".to_string())][..]
        );
    }

    #[test]
    fn token_override_signs_with_given_token() {
        let client = Client::new(
            Secrets::new("CK", "CS").token("TK", "TS"),
            SandboxTransport::new(|_: &HttpRequest| Err(TransportError::Timeout)),
        );
        let signed = client
            .get("http://api.example.com/v1/users/42/profile.json")
            .oauth_parameters(fixed())
            .token(&Token::new("TK", "TS"))
            .sign()
            .unwrap();
        assert_eq!(signed.signature(), "5/yZ6eGA/+3bTcDPMMMzd5LFwDQ=");

        let other = client
            .get("http://api.example.com/v1/users/42/profile.json")
            .oauth_parameters(fixed())
            .token(&Token::new("REQ", "REQSECRET"))
            .sign()
            .unwrap();
        assert!(other
            .oauth_params()
            .contains(&("oauth_token".to_string(), "REQ".to_string())));
        assert_ne!(other.signature(), signed.signature());
    }

    #[test]
    fn send_hands_request_to_transport() {
        let seen = RefCell::new(Vec::new());
        let transport = SandboxTransport::new(|request: &HttpRequest| {
            seen.borrow_mut().push(request.clone());
            Ok(HttpResponse {
                status: 404,
                headers: Default::default(),
                body: Vec::new(),
                final_url: request.url.clone(),
            })
        });
        let client = Client::new(Secrets::new("CK", "CS"), transport);
        let response = client.get("http://api.example.com/v1/user.json").send().unwrap();
        assert_eq!(response.status, 404);
        assert_eq!(seen.borrow().len(), 1);
        assert!(seen.borrow()[0].url.contains("oauth_signature="));
    }

    #[test]
    fn transport_error_surfaces() {
        let client = Client::new(
            Secrets::new("CK", "CS"),
            SandboxTransport::new(|_: &HttpRequest| {
                Err(TransportError::Connect("connection refused".into()))
            }),
        );
        let err = client.get("http://api.example.com/v1/user.json").send().unwrap_err();
        assert!(matches!(err, Error::Transport(TransportError::Connect(_))));
    }
}
