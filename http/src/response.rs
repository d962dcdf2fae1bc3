use crate::{
    CacheControl, Error, Headers, HeadersBuilder, Method, Protocol, Request, ResponseBody, Result,
};
use std::fmt::{self, Debug, Formatter};
use std::sync::OnceLock;

/// A received http response.
///
/// A response owns its streaming [`body`][Response::body_mut]; closing the
/// response closes the body, as does dropping it. The linked
/// `network_response`, `cache_response`, and `prior_response` values carry
/// unreadable placeholder bodies and no links of their own, so the chain is
/// always a finite list.
pub struct Response {
    request: Request,
    protocol: Protocol,
    code: u16,
    message: String,
    headers: Headers,
    body: ResponseBody,
    network_response: Option<Box<Response>>,
    cache_response: Option<Box<Response>>,
    prior_response: Option<Box<Response>>,
    sent_request_at_millis: i64,
    received_response_at_millis: i64,
    cache_control: OnceLock<CacheControl>,
}

impl Debug for Response {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("protocol", &self.protocol)
            .field("code", &self.code)
            .field("message", &self.message)
            .field("url", &self.request.url())
            .field("headers", &self.headers)
            .finish()
    }
}

impl Response {
    /// Construct a builder with nothing set.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder::default()
    }

    /// The request that produced this response. After redirects this is
    /// the final request, not the one the caller issued.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The protocol the response arrived over.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// The status code.
    pub fn code(&self) -> u16 {
        self.code
    }

    /// The status message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The response headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The last header value for `name`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get_str(name)
    }

    /// The response body.
    pub fn body(&self) -> &ResponseBody {
        &self.body
    }

    /// The response body, for reading.
    pub fn body_mut(&mut self) -> &mut ResponseBody {
        &mut self.body
    }

    /// Consume the response, keeping only its body.
    pub fn into_body(self) -> ResponseBody {
        self.body
    }

    /// True for codes in 200..=299.
    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.code)
    }

    /// True for the redirect codes 300, 301, 302, 303, 307 and 308.
    pub fn is_redirect(&self) -> bool {
        matches!(self.code, 300 | 301 | 302 | 303 | 307 | 308)
    }

    /// The raw response as received from the network, if this response
    /// came through a cache.
    pub fn network_response(&self) -> Option<&Response> {
        self.network_response.as_deref()
    }

    /// The stored response a cache answered with, if any.
    pub fn cache_response(&self) -> Option<&Response> {
        self.cache_response.as_deref()
    }

    /// The response that triggered the request producing this one, body
    /// stripped. Follows redirects backwards.
    pub fn prior_response(&self) -> Option<&Response> {
        self.prior_response.as_deref()
    }

    /// When the request producing this response left, in epoch millis.
    pub fn sent_request_at_millis(&self) -> i64 {
        self.sent_request_at_millis
    }

    /// When this response's headers were received, in epoch millis.
    pub fn received_response_at_millis(&self) -> i64 {
        self.received_response_at_millis
    }

    /// The cache directives carried by this response's headers, parsed on
    /// first use.
    pub fn cache_control(&self) -> &CacheControl {
        self.cache_control
            .get_or_init(|| CacheControl::parse(&self.headers))
    }

    /// Whether this response's status and headers promise a body with
    /// bytes in it.
    pub fn promises_body(&self) -> bool {
        if self.request.method() == Method::Head {
            return false;
        }
        let code = self.code;
        if !(100..200).contains(&code) && code != 204 && code != 304 {
            return true;
        }
        let has_content_length = self
            .headers
            .get_str("Content-Length")
            .and_then(|value| value.parse::<i64>().ok())
            .is_some_and(|length| length != -1);
        has_content_length || self.headers.eq_ignore_ascii_case("Transfer-Encoding", "chunked")
    }

    /// Close the response body. Idempotent.
    pub fn close(&mut self) {
        self.body.close();
    }

    /// This response with its body replaced by an unreadable placeholder
    /// (preserving content type and length) and its links removed, the
    /// shape linked responses must have. The original body is closed.
    pub fn strip_body(mut self, kind: &'static str) -> Response {
        let placeholder = ResponseBody::unreadable(
            kind,
            self.body.content_type().cloned(),
            self.body.content_length(),
        );
        self.body.close();
        Response {
            body: placeholder,
            network_response: None,
            cache_response: None,
            prior_response: None,
            ..self
        }
    }

    /// A builder carrying this response's metadata and body.
    pub fn into_builder(self) -> ResponseBuilder {
        ResponseBuilder {
            request: Some(self.request),
            protocol: self.protocol,
            code: Some(self.code),
            message: self.message,
            headers: self.headers.new_builder(),
            body: Some(self.body),
            network_response: self.network_response,
            cache_response: self.cache_response,
            prior_response: self.prior_response,
            sent_request_at_millis: self.sent_request_at_millis,
            received_response_at_millis: self.received_response_at_millis,
        }
    }
}

/// Mutable scratch space for assembling a [`Response`].
#[derive(Debug, Default)]
#[must_use]
pub struct ResponseBuilder {
    request: Option<Request>,
    protocol: Protocol,
    code: Option<u16>,
    message: String,
    headers: HeadersBuilder,
    body: Option<ResponseBody>,
    network_response: Option<Box<Response>>,
    cache_response: Option<Box<Response>>,
    prior_response: Option<Box<Response>>,
    sent_request_at_millis: i64,
    received_response_at_millis: i64,
}

impl ResponseBuilder {
    /// Set the request this response answers.
    pub fn request(mut self, request: Request) -> Self {
        self.request = Some(request);
        self
    }

    /// Set the protocol.
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    /// Set the status code.
    pub fn code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    /// Set the status message.
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Replace every header with this name.
    pub fn header(mut self, name: &str, value: impl Into<crate::HeaderValue>) -> Result<Self> {
        self.headers = self.headers.set(name.to_string(), value)?;
        Ok(self)
    }

    /// Append a header, keeping existing values.
    pub fn add_header(mut self, name: &str, value: impl Into<crate::HeaderValue>) -> Result<Self> {
        self.headers = self.headers.add(name.to_string(), value)?;
        Ok(self)
    }

    /// Replace the whole header block.
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers.new_builder();
        self
    }

    /// Set the body.
    pub fn body(mut self, body: ResponseBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Link the raw network response. Its body and links are stripped to
    /// keep the chain finite.
    pub fn network_response(mut self, response: Response) -> Self {
        self.network_response = Some(Box::new(response.strip_body("network")));
        self
    }

    /// Link the cache response this was served from, stripped like
    /// [`network_response`][Self::network_response].
    pub fn cache_response(mut self, response: Response) -> Self {
        self.cache_response = Some(Box::new(response.strip_body("cache")));
        self
    }

    /// Link the response that preceded this one, stripped like
    /// [`network_response`][Self::network_response] except that its own
    /// prior chain is preserved.
    pub fn prior_response(mut self, response: Option<Response>) -> Self {
        self.prior_response = response.map(|mut response| {
            // strip_body clears every link; the prior chain survives
            let prior_chain = response.prior_response.take();
            let mut stripped = response.strip_body("prior");
            stripped.prior_response = prior_chain;
            Box::new(stripped)
        });
        self
    }

    /// Set when the request left.
    pub fn sent_request_at_millis(mut self, millis: i64) -> Self {
        self.sent_request_at_millis = millis;
        self
    }

    /// Set when the response headers arrived.
    pub fn received_response_at_millis(mut self, millis: i64) -> Self {
        self.received_response_at_millis = millis;
        self
    }

    /// Validate and produce the response.
    pub fn build(self) -> Result<Response> {
        let request = self
            .request
            .ok_or(Error::IncompleteResponse("a request"))?;
        let code = self.code.ok_or(Error::IncompleteResponse("a code"))?;
        Ok(Response {
            request,
            protocol: self.protocol,
            code,
            message: self.message,
            headers: self.headers.build(),
            body: self.body.unwrap_or_default(),
            network_response: self.network_response,
            cache_response: self.cache_response,
            prior_response: self.prior_response,
            sent_request_at_millis: self.sent_request_at_millis,
            received_response_at_millis: self.received_response_at_millis,
            cache_control: OnceLock::new(),
        })
    }
}
