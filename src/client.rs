use http::Method;

use crate::request::RequestBuilder;
use crate::transport::HttpTransport;
use crate::Secrets;

/// Signs requests with a fixed set of secrets and sends them through a
/// transport.
///
/// [`ApiClient`](crate::ApiClient) and [`TokenExchanger`](crate::TokenExchanger)
/// are both built on top of this.
#[derive(Debug, Clone)]
pub struct Client<T> {
    transport: T,
    secrets: Secrets,
}

impl<T> Client<T>
where
    T: HttpTransport,
{
    pub fn new(secrets: Secrets, transport: T) -> Self {
        Client { transport, secrets }
    }

    pub fn secrets(&self) -> &Secrets {
        &self.secrets
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Convenience method to make a `GET` request to a URL.
    pub fn get<U: Into<String>>(&self, url: U) -> RequestBuilder<'_, T> {
        self.request(Method::GET, url)
    }

    /// Convenience method to make a `POST` request to a URL.
    ///
    /// Only the OAuth parameters travel in the url; the rest go in the body.
    pub fn post<U: Into<String>>(&self, url: U) -> RequestBuilder<'_, T> {
        self.request(Method::POST, url)
    }

    /// Convenience method to make a `PUT` request to a URL.
    ///
    /// Sent as `POST` with `X-HTTP-Method-Override: PUT`.
    pub fn put<U: Into<String>>(&self, url: U) -> RequestBuilder<'_, T> {
        self.request(Method::PUT, url)
    }

    /// Start building a request with the `Method` and url.
    pub fn request<U: Into<String>>(&self, method: Method, url: U) -> RequestBuilder<'_, T> {
        RequestBuilder::new(self, method, url.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{HttpRequest, HttpResponse, SandboxTransport};
    use crate::TransportError;

    fn ok(request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        Ok(HttpResponse {
            status: 200,
            headers: Default::default(),
            body: request.body.clone().unwrap_or_default().into_bytes(),
            final_url: request.url.clone(),
        })
    }

    #[test]
    fn verbs_map_to_methods() {
        let client = Client::new(Secrets::new("CK", "CS"), SandboxTransport::new(ok));
        let url = "http://api.example.com/x";
        assert_eq!(client.get(url).sign().unwrap().method(), &Method::GET);
        assert_eq!(client.post(url).sign().unwrap().method(), &Method::POST);
        assert_eq!(client.put(url).sign().unwrap().method(), &Method::PUT);
    }
}
