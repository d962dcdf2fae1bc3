use thiserror::Error;

/// Concrete errors produced when parsing or building an
/// [`HttpUrl`][crate::HttpUrl].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UrlError {
    /// The input did not carry an `http` or `https` scheme and no base url
    /// supplied one.
    #[error("invalid URL scheme: expected 'http' or 'https' in {0:?}")]
    InvalidScheme(String),

    /// A well-formed scheme other than `http`/`https`. Resolution against a
    /// base url reports this by returning `None`.
    #[error("unsupported URL scheme: {0:?}")]
    UnsupportedScheme(String),

    /// The host portion did not canonicalize.
    #[error("invalid URL host: {0:?}")]
    InvalidHost(String),

    /// The port was not a decimal integer in 1..=65535.
    #[error("invalid URL port: {0:?}")]
    InvalidPort(String),

    /// [`build`][crate::HttpUrlBuilder::build] was called without a scheme.
    #[error("cannot build a url without a scheme")]
    MissingScheme,

    /// [`build`][crate::HttpUrlBuilder::build] was called without a host.
    #[error("cannot build a url without a host")]
    MissingHost,
}

/// This crate's result type.
pub type Result<T> = std::result::Result<T, UrlError>;
