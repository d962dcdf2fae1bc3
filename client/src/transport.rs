use crate::{RequestOptions, Result};
use async_trait::async_trait;
use std::sync::Arc;
use waymark_http::{Request, Response};

/// The seam between this crate and the wire.
///
/// A transport performs exactly one exchange: it writes `request` and
/// produces the response, streaming body included. It must not follow
/// redirects or manage cookies (the interceptor chain owns both), and it
/// must abandon the exchange when the future driving it is dropped.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Perform one request/response exchange.
    async fn dispatch(&self, request: Request, options: &RequestOptions) -> Result<Response>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn dispatch(&self, request: Request, options: &RequestOptions) -> Result<Response> {
        self.as_ref().dispatch(request, options).await
    }
}
