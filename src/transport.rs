//! Pluggable HTTP fetching.
//!
//! HTTP-level failures (4xx, 5xx) come back as ordinary [`HttpResponse`]s so
//! callers can inspect the status; only transport-level failures surface as
//! [`TransportError`].

use std::sync::Arc;

use http::{HeaderMap, Method};

use crate::TransportError;

/// A request ready for the wire.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub body: Option<String>,
    pub headers: HeaderMap,
}

/// What came back from the provider, whatever the status.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub final_url: String,
}

impl HttpResponse {
    /// Body decoded as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub trait HttpTransport {
    fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T> HttpTransport for &T
where
    T: HttpTransport + ?Sized,
{
    fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).fetch(request)
    }
}

impl<T> HttpTransport for Box<T>
where
    T: HttpTransport + ?Sized,
{
    fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).fetch(request)
    }
}

impl<T> HttpTransport for Arc<T>
where
    T: HttpTransport + ?Sized,
{
    fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).fetch(request)
    }
}

/// Transport for runtimes that forbid opening sockets directly and hand out
/// their own fetch primitive instead.
pub struct SandboxTransport<F> {
    fetch: F,
}

impl<F> SandboxTransport<F>
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError>,
{
    pub fn new(fetch: F) -> Self {
        SandboxTransport { fetch }
    }
}

impl<F> HttpTransport for SandboxTransport<F>
where
    F: Fn(&HttpRequest) -> Result<HttpResponse, TransportError>,
{
    fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = (self.fetch)(request)?;
        tracing::debug!(status = response.status, "sandbox fetch completed");
        Ok(response)
    }
}

impl<F> std::fmt::Debug for SandboxTransport<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SandboxTransport").finish()
    }
}

#[cfg(feature = "blocking")]
pub use self::blocking::ReqwestTransport;

#[cfg(feature = "blocking")]
mod blocking {
    use reqwest::blocking::Client as ReqwestClient;

    use super::{HttpRequest, HttpResponse, HttpTransport};
    use crate::{ClientConfig, TransportError};

    /// General-purpose transport backed by `reqwest`'s blocking client.
    #[derive(Debug, Clone)]
    pub struct ReqwestTransport {
        inner: ReqwestClient,
    }

    impl ReqwestTransport {
        /// Constructs a new `ReqwestTransport`.
        ///
        /// This method calls reqwest::blocking::Client::new() internally.
        pub fn new() -> Self {
            ReqwestTransport {
                inner: ReqwestClient::new(),
            }
        }

        /// Constructs a new `ReqwestTransport` with specifying inner `reqwest::blocking::Client`.
        pub fn new_with_client(client: ReqwestClient) -> Self {
            ReqwestTransport { inner: client }
        }

        /// Applies the timeout and user agent of `config`.
        pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
            let mut builder = ReqwestClient::builder();
            if let Some(timeout) = config.timeout() {
                builder = builder.timeout(timeout);
            }
            if let Some(user_agent) = config.user_agent() {
                builder = builder.user_agent(user_agent);
            }
            Ok(ReqwestTransport {
                inner: builder.build()?,
            })
        }
    }

    impl Default for ReqwestTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl From<ReqwestClient> for ReqwestTransport {
        fn from(client: ReqwestClient) -> Self {
            ReqwestTransport::new_with_client(client)
        }
    }

    impl HttpTransport for ReqwestTransport {
        fn fetch(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            let mut builder = self
                .inner
                .request(request.method.clone(), request.url.as_str())
                .headers(request.headers.clone());
            if let Some(ref body) = request.body {
                builder = builder.body(body.clone());
            }
            let response = builder.send()?;
            let status = response.status().as_u16();
            let headers = response.headers().clone();
            let final_url = response.url().to_string();
            let body = response.bytes()?.to_vec();
            tracing::debug!(status, url = %final_url, "http fetch completed");
            Ok(HttpResponse {
                status,
                headers,
                body,
                final_url,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_status(status: u16) -> impl Fn(&HttpRequest) -> Result<HttpResponse, TransportError> {
        move |request: &HttpRequest| {
            Ok(HttpResponse {
                status,
                headers: HeaderMap::new(),
                body: b"{\"error\":\"nope\"}".to_vec(),
                final_url: request.url.clone(),
            })
        }
    }

    fn request() -> HttpRequest {
        HttpRequest {
            method: Method::GET,
            url: "http://api.example.com/v1/user.json".into(),
            body: None,
            headers: HeaderMap::new(),
        }
    }

    #[test]
    fn http_errors_are_ordinary_responses() {
        let transport = SandboxTransport::new(echo_status(500));
        let response = transport.fetch(&request()).unwrap();
        assert_eq!(response.status, 500);
        assert_eq!(response.text(), "{\"error\":\"nope\"}");
        assert_eq!(response.final_url, "http://api.example.com/v1/user.json");
    }

    #[test]
    fn transport_failures_propagate() {
        let transport = SandboxTransport::new(|_: &HttpRequest| Err(TransportError::Timeout));
        assert!(matches!(
            transport.fetch(&request()),
            Err(TransportError::Timeout)
        ));
    }

    #[test]
    fn smart_pointers_delegate() {
        let shared: Arc<dyn HttpTransport> = Arc::new(SandboxTransport::new(echo_status(204)));
        assert_eq!(shared.fetch(&request()).unwrap().status, 204);
        let boxed: Box<dyn HttpTransport> = Box::new(SandboxTransport::new(echo_status(200)));
        assert_eq!((&boxed).fetch(&request()).unwrap().status, 200);
    }
}
