use crate::{
    CacheControl, Error, Headers, HeadersBuilder, Method, RequestBody, Result,
};
use std::fmt::{self, Debug, Formatter};
use std::sync::{Arc, OnceLock};
use waymark_url::HttpUrl;

/// An immutable, shareable http request.
///
/// ```
/// # use waymark_http::{Request, Method};
/// let request = Request::builder()
///     .url_str("https://example.com/a").unwrap()
///     .header("Accept", "text/plain").unwrap()
///     .build().unwrap();
/// assert_eq!(request.method(), Method::Get);
/// assert_eq!(request.url().host(), "example.com");
/// ```
#[derive(Clone)]
pub struct Request {
    url: HttpUrl,
    method: Method,
    headers: Headers,
    body: Option<Arc<dyn RequestBody>>,
    cache_url_override: Option<HttpUrl>,
    cache_control: Arc<OnceLock<CacheControl>>,
}

impl Debug for Request {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body", &self.body.is_some())
            .finish()
    }
}

impl Request {
    /// Construct a builder with nothing set.
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// The target url.
    pub fn url(&self) -> &HttpUrl {
        &self.url
    }

    /// The request method.
    pub fn method(&self) -> Method {
        self.method
    }

    /// The request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The last header value for `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get_str(name)
    }

    /// The request body, if any.
    pub fn body(&self) -> Option<&Arc<dyn RequestBody>> {
        self.body.as_ref()
    }

    /// The url to cache this request under instead of [`url`][Self::url],
    /// if one was set.
    pub fn cache_url_override(&self) -> Option<&HttpUrl> {
        self.cache_url_override.as_ref()
    }

    /// The cache directives carried by this request's headers, parsed on
    /// first use.
    pub fn cache_control(&self) -> &CacheControl {
        self.cache_control
            .get_or_init(|| CacheControl::parse(&self.headers))
    }

    /// A builder initialized with this request's fields.
    pub fn new_builder(&self) -> RequestBuilder {
        RequestBuilder {
            url: Some(self.url.clone()),
            method: self.method,
            headers: self.headers.new_builder(),
            body: self.body.clone(),
            cache_url_override: self.cache_url_override.clone(),
        }
    }
}

/// Mutable scratch space for assembling a [`Request`].
#[derive(Debug, Default)]
#[must_use]
pub struct RequestBuilder {
    url: Option<HttpUrl>,
    method: Method,
    headers: HeadersBuilder,
    body: Option<Arc<dyn RequestBody>>,
    cache_url_override: Option<HttpUrl>,
}

impl RequestBuilder {
    /// Set the target url.
    pub fn url(mut self, url: HttpUrl) -> Self {
        self.url = Some(url);
        self
    }

    /// Parse and set the target url. `ws` and `wss` schemes normalize to
    /// `http` and `https`.
    pub fn url_str(self, url: &str) -> Result<Self> {
        let rewritten = rewrite_websocket_scheme(url);
        Ok(self.url(HttpUrl::parse(&rewritten)?))
    }

    /// Set the method without touching the body.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Set the body without touching the method. `None` clears it.
    pub fn body(mut self, body: Option<Arc<dyn RequestBody>>) -> Self {
        self.body = body;
        self
    }

    /// GET, with no body.
    pub fn get(self) -> Self {
        self.method(Method::Get).body(None)
    }

    /// HEAD, with no body.
    pub fn head(self) -> Self {
        self.method(Method::Head).body(None)
    }

    /// POST with `body`.
    pub fn post(self, body: Arc<dyn RequestBody>) -> Self {
        self.method(Method::Post).body(Some(body))
    }

    /// PUT with `body`.
    pub fn put(self, body: Arc<dyn RequestBody>) -> Self {
        self.method(Method::Put).body(Some(body))
    }

    /// PATCH with `body`.
    pub fn patch(self, body: Arc<dyn RequestBody>) -> Self {
        self.method(Method::Patch).body(Some(body))
    }

    /// DELETE, with an optional body.
    pub fn delete(self, body: Option<Arc<dyn RequestBody>>) -> Self {
        self.method(Method::Delete).body(body)
    }

    /// Replace every header with this name.
    pub fn header(mut self, name: &str, value: impl Into<crate::HeaderValue>) -> Result<Self> {
        self.headers = self.headers.set(name.to_string(), value)?;
        Ok(self)
    }

    /// Append a header, keeping any existing values.
    pub fn add_header(mut self, name: &str, value: impl Into<crate::HeaderValue>) -> Result<Self> {
        self.headers = self.headers.add(name.to_string(), value)?;
        Ok(self)
    }

    /// Remove every header with this name.
    pub fn remove_header(mut self, name: &str) -> Self {
        self.headers = self.headers.remove_all(name);
        self
    }

    /// Replace the whole header block.
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers.new_builder();
        self
    }

    /// Cache this request under `url` instead of its own.
    pub fn cache_url_override(mut self, url: Option<HttpUrl>) -> Self {
        self.cache_url_override = url;
        self
    }

    /// Validate and produce the request.
    pub fn build(self) -> Result<Request> {
        let url = self.url.ok_or(Error::IncompleteRequest("a url"))?;
        if self.method.requires_request_body() && self.body.is_none() {
            return Err(Error::BodyPolicyViolation(self.method, "must have"));
        }
        if self.method.forbids_request_body() && self.body.is_some() {
            return Err(Error::BodyPolicyViolation(self.method, "cannot have"));
        }
        Ok(Request {
            url,
            method: self.method,
            headers: self.headers.build(),
            body: self.body,
            cache_url_override: self.cache_url_override,
            cache_control: Arc::new(OnceLock::new()),
        })
    }
}

fn rewrite_websocket_scheme(url: &str) -> String {
    let trimmed = url.trim_start();
    if trimmed.len() >= 3 && trimmed[..3].eq_ignore_ascii_case("ws:") {
        format!("http:{}", &trimmed[3..])
    } else if trimmed.len() >= 4 && trimmed[..4].eq_ignore_ascii_case("wss:") {
        format!("https:{}", &trimmed[4..])
    } else {
        url.to_string()
    }
}
