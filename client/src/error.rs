use std::time::Duration;
use thiserror::Error;

/// Concrete errors surfaced by [`HttpClient::execute`][crate::HttpClient::execute].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// [`waymark_url::UrlError`]
    #[error(transparent)]
    Url(#[from] waymark_url::UrlError),

    /// [`waymark_http::Error`]
    #[error(transparent)]
    Http(#[from] waymark_http::Error),

    /// [`std::io::Error`] raised by the transport.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The call outlived the execute timeout and was cancelled.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// A redirect chain exceeded the follow-up cap.
    #[error("Too many follow-up requests: {0}")]
    TooManyFollowUps(u32),

    /// [`gzip`][crate::gzip] was applied to a request with no body.
    #[error("cannot gzip a request without a body")]
    GzipWithoutBody,

    /// [`gzip`][crate::gzip] was applied twice.
    #[error("request body is already gzipped")]
    AlreadyGzipped,

    /// The client was built without a transport.
    #[error("cannot build a client without a transport")]
    MissingTransport,
}

/// This crate's result type.
pub type Result<T> = std::result::Result<T, Error>;
