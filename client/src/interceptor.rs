use crate::{RequestOptions, Result, Transport};
use async_trait::async_trait;
use std::sync::Arc;
use waymark_http::{Request, Response};

/// Observes and rewrites one call.
///
/// An interceptor receives a [`Chain`] positioned at itself: it may rewrite
/// the request before handing it to [`Chain::proceed`], call `proceed` any
/// number of times (zero short-circuits the rest of the chain, including
/// the transport), rewrite the response on the way back out, or fail the
/// call by returning an error.
#[async_trait]
pub trait Interceptor: Send + Sync + 'static {
    /// Handle one call.
    async fn intercept(&self, chain: Chain<'_>) -> Result<Response>;
}

/// One position in the interceptor chain.
pub struct Chain<'a> {
    interceptors: &'a [Arc<dyn Interceptor>],
    index: usize,
    transport: &'a dyn Transport,
    options: &'a RequestOptions,
    request: Request,
}

impl std::fmt::Debug for Chain<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("index", &self.index)
            .field("remaining", &(self.interceptors.len() - self.index))
            .field("request", &self.request)
            .finish()
    }
}

impl<'a> Chain<'a> {
    pub(crate) fn new(
        interceptors: &'a [Arc<dyn Interceptor>],
        transport: &'a dyn Transport,
        options: &'a RequestOptions,
        request: Request,
    ) -> Self {
        Self {
            interceptors,
            index: 0,
            transport,
            options,
            request,
        }
    }

    /// The request as it stands at this position in the chain.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// The redirect policy for this call.
    pub fn options(&self) -> &RequestOptions {
        self.options
    }

    /// Hand `request` to the next interceptor, or to the transport when
    /// this is the innermost position.
    pub async fn proceed(&self, request: Request) -> Result<Response> {
        match self.interceptors.get(self.index) {
            Some(interceptor) => {
                log::trace!("proceeding into interceptor {}", self.index);
                let next = Chain {
                    interceptors: self.interceptors,
                    index: self.index + 1,
                    transport: self.transport,
                    options: self.options,
                    request,
                };
                interceptor.intercept(next).await
            }
            None => {
                log::trace!("dispatching to transport");
                self.transport.dispatch(request, self.options).await
            }
        }
    }

    /// Run the whole chain for `request`.
    pub(crate) async fn run(self) -> Result<Response> {
        let request = self.request.clone();
        self.proceed(request).await
    }
}
