#![forbid(unsafe_code)]
#![deny(
    clippy::dbg_macro,
    missing_copy_implementations,
    rustdoc::missing_crate_level_docs,
    nonstandard_style,
    unused_qualifications
)]

/*!
# the waymark http client core

An embeddable http/1.x client: an ordered [`Interceptor`] chain in front
of an abstract [`Transport`], with redirect following, cookie jar
integration, request gzipping, and timeout-bounded execution.

The chain for one call is
`[user interceptors…, FollowUpInterceptor, BridgeInterceptor]` with the
transport as the innermost terminal. Everything the wire needs — sockets,
TLS, connection reuse — lives behind [`Transport`].

```no_run
# use waymark_client::{HttpClient, Transport, RequestOptions, Result};
# use waymark_http::{Request, Response};
# use std::time::Duration;
# fn example(transport: impl Transport) -> Result<()> {
let client = HttpClient::builder()
    .transport(transport)
    .execute_timeout(Duration::from_secs(30))
    .build()?;

futures_lite::future::block_on(async {
    let request = Request::builder().url_str("https://example.com/")?.build()?;
    let mut response = client.execute(request).await?;
    let body = response.body_mut().read_string().await?;
    # drop(body);
    Ok(())
})
# }
```
*/

mod bridge;
mod error;
mod follow_up;
mod gzip;
mod interceptor;
mod options;
mod transport;

pub use bridge::BridgeInterceptor;
pub use error::{Error, Result};
pub use follow_up::{FollowUpInterceptor, MAX_FOLLOW_UPS};
pub use gzip::{gzip, GzipRequestBody};
pub use interceptor::{Chain, Interceptor};
pub use options::RequestOptions;
pub use transport::Transport;

use async_io::Timer;
use futures_lite::future;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;
use waymark_http::{Clock, CookieJar, NoCookies, Request, Response, SystemClock};

/// An http client: a frozen interceptor chain, a redirect policy, a
/// timeout, and a transport.
///
/// Clients are cheap to clone and freely shareable. [`new_builder`]
/// [HttpClient::new_builder] derives a builder carrying this client's
/// configuration; the derived builder never mutates already-built clients.
#[derive(Clone)]
pub struct HttpClient {
    user_interceptors: Vec<Arc<dyn Interceptor>>,
    chain: Arc<[Arc<dyn Interceptor>]>,
    cookie_jar: Arc<dyn CookieJar>,
    clock: Arc<dyn Clock>,
    options: RequestOptions,
    execute_timeout: Option<Duration>,
    transport: Arc<dyn Transport>,
}

impl Debug for HttpClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("interceptors", &self.chain.len())
            .field("options", &self.options)
            .field("execute_timeout", &self.execute_timeout)
            .finish()
    }
}

impl HttpClient {
    /// Construct a builder with nothing but defaults.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Execute `request` with this client's options and timeout.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        self.execute_with(request, self.options, self.execute_timeout)
            .await
    }

    /// Execute `request` with explicit options and timeout.
    ///
    /// The call runs on the global executor and is bounded by `timeout`
    /// through response *headers* (including every redirect); body reads
    /// made afterwards are the caller's to bound. On timeout the task is
    /// cancelled, cancellation reaches the transport and any in-flight
    /// body read, and the call fails with [`Error::Timeout`].
    pub async fn execute_with(
        &self,
        request: Request,
        options: RequestOptions,
        timeout: Option<Duration>,
    ) -> Result<Response> {
        let chain = self.chain.clone();
        let transport = self.transport.clone();
        let task = async_global_executor::spawn(async move {
            Chain::new(&chain, &*transport, &options, request)
                .run()
                .await
        });

        match timeout {
            Some(duration) => {
                future::or(task, async {
                    Timer::after(duration).await;
                    Err(Error::Timeout(duration))
                })
                .await
            }
            None => task.await,
        }
    }

    /// A builder carrying this client's interceptors, cookie jar, options,
    /// timeout, and transport.
    pub fn new_builder(&self) -> HttpClientBuilder {
        HttpClientBuilder {
            interceptors: self.user_interceptors.clone(),
            cookie_jar: self.cookie_jar.clone(),
            clock: self.clock.clone(),
            options: self.options,
            execute_timeout: self.execute_timeout,
            transport: Some(self.transport.clone()),
        }
    }
}

/// Mutable scratch space for assembling an [`HttpClient`].
#[must_use]
pub struct HttpClientBuilder {
    interceptors: Vec<Arc<dyn Interceptor>>,
    cookie_jar: Arc<dyn CookieJar>,
    clock: Arc<dyn Clock>,
    options: RequestOptions,
    execute_timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
}

impl Debug for HttpClientBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClientBuilder")
            .field("interceptors", &self.interceptors.len())
            .field("options", &self.options)
            .field("execute_timeout", &self.execute_timeout)
            .field("transport", &self.transport.is_some())
            .finish()
    }
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            interceptors: Vec::new(),
            cookie_jar: Arc::new(NoCookies),
            clock: Arc::new(SystemClock),
            options: RequestOptions::default(),
            execute_timeout: None,
            transport: None,
        }
    }
}

impl HttpClientBuilder {
    /// Append a user interceptor. User interceptors run outermost, in the
    /// order added, before the library's redirect and bridge interceptors.
    pub fn add_interceptor(mut self, interceptor: impl Interceptor) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Use `cookie_jar` for the bridge's cookie handling. Defaults to
    /// [`NoCookies`].
    pub fn cookie_jar(mut self, cookie_jar: impl CookieJar) -> Self {
        self.cookie_jar = Arc::new(cookie_jar);
        self
    }

    /// Use `clock` when interpreting cookie expirations. Defaults to the
    /// system clock.
    pub fn clock(mut self, clock: impl Clock) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Whether to follow redirects at all. Defaults to true.
    pub fn follow_redirects(mut self, follow_redirects: bool) -> Self {
        self.options.follow_redirects = follow_redirects;
        self
    }

    /// Whether to follow redirects that cross between http and https.
    /// Defaults to true.
    pub fn follow_ssl_redirects(mut self, follow_ssl_redirects: bool) -> Self {
        self.options.follow_ssl_redirects = follow_ssl_redirects;
        self
    }

    /// Bound each execute call, headers through redirects, by `timeout`.
    pub fn execute_timeout(mut self, timeout: Duration) -> Self {
        self.execute_timeout = Some(timeout);
        self
    }

    /// Use `transport` for the wire. Required.
    pub fn transport(mut self, transport: impl Transport) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Freeze into a client. The interceptor list is snapshotted: mutating
    /// this builder afterwards never affects the built client.
    pub fn build(self) -> Result<HttpClient> {
        let transport = self.transport.ok_or(Error::MissingTransport)?;
        let mut chain = self.interceptors.clone();
        chain.push(Arc::new(FollowUpInterceptor));
        chain.push(Arc::new(BridgeInterceptor::new(
            self.cookie_jar.clone(),
            self.clock.clone(),
        )));
        Ok(HttpClient {
            user_interceptors: self.interceptors,
            chain: chain.into(),
            cookie_jar: self.cookie_jar,
            clock: self.clock,
            options: self.options,
            execute_timeout: self.execute_timeout,
            transport,
        })
    }
}
