//! Incoming request type and the capabilities middleware reads from it.

use std::borrow::Cow;
use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri};

// ── Capabilities ──────────────────────────────────────────────────────────────

/// Anything that arrived over a connection.
///
/// A plain connection only knows who is on the other end. Requests that also
/// carry HTTP fields expose them through [`http`](RequestSource::http); the
/// default says "not HTTP".
pub trait RequestSource {
    /// Address or host name of the peer, if known.
    fn remote_host(&self) -> Option<Cow<'_, str>>;

    fn http(&self) -> Option<&dyn HttpRequestSource> {
        None
    }
}

/// The HTTP-specific fields of a request.
pub trait HttpRequestSource {
    fn method(&self) -> &str;

    /// Path component of the request target, without the query string.
    fn request_uri(&self) -> &str;

    /// `scheme://authority/path` as the client addressed it. `None` when the
    /// request carries neither an absolute URI nor a `Host` header.
    fn request_url(&self) -> Option<String>;

    fn query_string(&self) -> Option<&str>;

    /// Case-insensitive header lookup.
    fn header(&self, name: &str) -> Option<&str>;
}

// ── Request ───────────────────────────────────────────────────────────────────

/// An incoming HTTP request.
///
/// The body is fully buffered before the request reaches the router. Outside
/// the server, build one from an [`http::Request`]:
///
/// ```rust
/// use bytes::Bytes;
/// use reqctx::Request;
///
/// let req = Request::from(
///     http::Request::get("/users/42?expand=1")
///         .header("host", "localhost")
///         .body(Bytes::new())
///         .unwrap(),
/// )
/// .with_remote_addr("192.0.2.7:51000".parse().unwrap());
///
/// assert_eq!(req.path(), "/users/42");
/// assert_eq!(req.query(), Some("expand=1"));
/// ```
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    /// Attaches the peer address. The server does this for every connection.
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn uri(&self) -> &Uri { &self.uri }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn query(&self) -> Option<&str> { self.uri.query() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }
    pub fn remote_addr(&self) -> Option<SocketAddr> { self.remote_addr }

    /// Case-insensitive header lookup. Values that are not valid UTF-8 read as
    /// absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(req: http::Request<Bytes>) -> Self {
        let (parts, body) = req.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            body,
            remote_addr: None,
            params: HashMap::new(),
        }
    }
}

impl RequestSource for Request {
    fn remote_host(&self) -> Option<Cow<'_, str>> {
        self.remote_addr.map(|addr| Cow::Owned(addr.ip().to_string()))
    }

    fn http(&self) -> Option<&dyn HttpRequestSource> {
        Some(self)
    }
}

impl HttpRequestSource for Request {
    fn method(&self) -> &str {
        self.method.as_str()
    }

    fn request_uri(&self) -> &str {
        self.uri.path()
    }

    fn request_url(&self) -> Option<String> {
        let path = self.uri.path();
        // HTTP/2 and absolute-form HTTP/1.1 targets carry their own authority.
        if let Some(authority) = self.uri.authority() {
            let scheme = self.uri.scheme_str().unwrap_or("http");
            return Some(format!("{scheme}://{authority}{path}"));
        }
        // TLS ends at the proxy, so the hop we see is plain http.
        let host = self.header("host")?;
        Some(format!("http://{host}{path}"))
    }

    fn query_string(&self) -> Option<&str> {
        self.uri.query()
    }

    fn header(&self, name: &str) -> Option<&str> {
        Request::header(self, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str, headers: &[(&str, &str)]) -> Request {
        let mut builder = http::Request::get(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        Request::from(builder.body(Bytes::new()).unwrap())
    }

    #[test]
    fn request_url_from_host_header() {
        let req = request("/foobar?baz=qux", &[("host", "localhost")]);
        assert_eq!(req.request_url().as_deref(), Some("http://localhost/foobar"));
    }

    #[test]
    fn request_url_keeps_host_port() {
        let req = request("/a", &[("host", "localhost:8080")]);
        assert_eq!(req.request_url().as_deref(), Some("http://localhost:8080/a"));
    }

    #[test]
    fn request_url_from_absolute_uri() {
        let req = request("https://api.example.com/v1/items?page=2", &[]);
        assert_eq!(req.request_url().as_deref(), Some("https://api.example.com/v1/items"));
        assert_eq!(req.request_uri(), "/v1/items");
        assert_eq!(req.query_string(), Some("page=2"));
    }

    #[test]
    fn request_url_absent_without_host() {
        let req = request("/foobar", &[]);
        assert_eq!(req.request_url(), None);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = request("/", &[("User-Agent", "sample-ua")]);
        assert_eq!(HttpRequestSource::header(&req, "user-agent"), Some("sample-ua"));
        assert_eq!(req.header("USER-AGENT"), Some("sample-ua"));
        assert_eq!(req.header("x-forwarded-for"), None);
    }

    #[test]
    fn remote_host_is_the_peer_ip() {
        let req = request("/", &[]);
        assert_eq!(req.remote_host(), None);

        let req = req.with_remote_addr("192.0.2.0:40000".parse().unwrap());
        assert_eq!(req.remote_host().as_deref(), Some("192.0.2.0"));
        assert!(req.http().is_some());
    }
}
