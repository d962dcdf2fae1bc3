use crate::{Chain, Interceptor, Result};
use async_trait::async_trait;
use std::sync::Arc;
use waymark_http::{Clock, Cookie, CookieJar, Response};
use waymark_url::HttpUrl;

const USER_AGENT: &str = concat!("waymark/", env!("CARGO_PKG_VERSION"));

/// The innermost library interceptor: turns an application request into a
/// well-formed network request, and routes response cookies into the jar.
///
/// On the way in it sets `Content-Type`/`Content-Length` from the body,
/// `Host` from the url, the cookie header from the jar, and a default
/// `User-Agent`. It deliberately does not set `Accept-Encoding`; response
/// decompression is the transport's concern. On the way out, `Set-Cookie`
/// headers are parsed against the network request's url and offered to the
/// jar.
pub struct BridgeInterceptor {
    cookie_jar: Arc<dyn CookieJar>,
    clock: Arc<dyn Clock>,
}

impl BridgeInterceptor {
    pub(crate) fn new(cookie_jar: Arc<dyn CookieJar>, clock: Arc<dyn Clock>) -> Self {
        Self { cookie_jar, clock }
    }
}

impl std::fmt::Debug for BridgeInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeInterceptor").finish()
    }
}

#[async_trait]
impl Interceptor for BridgeInterceptor {
    async fn intercept(&self, chain: Chain<'_>) -> Result<Response> {
        let request = chain.request().clone();
        let mut builder = request.new_builder();

        if let Some(body) = request.body() {
            if let Some(content_type) = body.content_type() {
                builder = builder.header("Content-Type", content_type.to_string())?;
            }
            let content_length = body.content_length();
            if content_length >= 0 {
                builder = builder.header("Content-Length", content_length.to_string())?;
            } else {
                builder = builder.remove_header("Content-Length");
            }
        }

        if request.header("Host").is_none() {
            builder = builder.header("Host", host_header(request.url()))?;
        }

        let cookies = self.cookie_jar.load_for_request(request.url());
        if !cookies.is_empty() {
            builder = builder.header("Cookie", cookie_header(&cookies))?;
        }

        if request.header("User-Agent").is_none() {
            builder = builder.header("User-Agent", USER_AGENT)?;
        }

        let network_request = builder.build()?;
        let network_url = network_request.url().clone();
        let response = chain.proceed(network_request).await?;

        let received = Cookie::parse_all(
            self.clock.now_millis(),
            &network_url,
            response.headers(),
        );
        if !received.is_empty() {
            log::trace!("saving {} cookies for {}", received.len(), network_url.redact());
            self.cookie_jar.save_from_response(&network_url, received);
        }

        // hand the caller back its own request, so follow-ups rebuild from
        // the application-level headers rather than this hop's
        Ok(response.into_builder().request(request).build()?)
    }
}

/// The `Host` header form of a url: the host, bracketed if IPv6, with the
/// port appended only when it is not the scheme default.
fn host_header(url: &HttpUrl) -> String {
    let host = if url.host().contains(':') {
        format!("[{}]", url.host())
    } else {
        url.host().to_string()
    };
    if url.port() == HttpUrl::default_port(url.scheme()) {
        host
    } else {
        format!("{host}:{}", url.port())
    }
}

fn cookie_header(cookies: &[Cookie]) -> String {
    cookies
        .iter()
        .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn host_header_forms() {
        let plain = HttpUrl::parse("http://example.com/").unwrap();
        assert_eq!(host_header(&plain), "example.com");

        let with_port = HttpUrl::parse("http://example.com:8080/").unwrap();
        assert_eq!(host_header(&with_port), "example.com:8080");

        let ipv6 = HttpUrl::parse("http://[::1]:8443/").unwrap();
        assert_eq!(host_header(&ipv6), "[::1]:8443");

        let default_https = HttpUrl::parse("https://example.com:443/").unwrap();
        assert_eq!(host_header(&default_https), "example.com");
    }
}
