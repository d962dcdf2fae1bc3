use crate::HeaderName;
use thiserror::Error;

/// Concrete errors that occur while assembling or consuming http messages.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// [`std::io::Error`]
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// [`waymark_url::UrlError`]
    #[error(transparent)]
    Url(#[from] waymark_url::UrlError),

    /// A header name containing characters outside 0x21..=0x7e, or no
    /// characters at all.
    #[error("invalid or unparseable header name: {0:?}")]
    InvalidHeaderName(String),

    /// A header value containing characters other than horizontal tab and
    /// printable ascii.
    #[error("invalid header value for header name: {0}")]
    InvalidHeaderValue(HeaderName),

    /// A header line with no colon.
    #[error("unexpected header line: {0:?}")]
    UnexpectedHeaderLine(String),

    /// Content-type text that does not parse as `type/subtype`
    /// with optional parameters.
    #[error("malformed media type: {0:?}")]
    MalformedMediaType(String),

    /// A method spelling this client does not recognize.
    #[error("unsupported method {0}")]
    UnrecognizedMethod(String),

    /// A protocol wire label this client does not recognize.
    #[error("unexpected protocol: {0}")]
    UnexpectedProtocol(String),

    /// A request method that requires a body was given none, or one that
    /// forbids a body was given one.
    #[error("method {0} {1} a request body")]
    BodyPolicyViolation(crate::Method, &'static str),

    /// Building a request without a url or with an empty method.
    #[error("cannot build a request without {0}")]
    IncompleteRequest(&'static str),

    /// Building a response without its required parts.
    #[error("cannot build a response without {0}")]
    IncompleteResponse(&'static str),

    /// A cookie builder field that fails validation: untrimmed or missing
    /// name/value, a bad domain, or a path without a leading slash.
    #[error("invalid cookie {0}")]
    InvalidCookieField(&'static str),

    /// A one-shot request body was opened a second time.
    #[error("cannot read a one-shot body more than once")]
    BodyAlreadyRead,

    /// An attempt to read the body of a network, cache, or prior response.
    #[error("cannot read the body of a {0} response")]
    UnreadableResponseBody(&'static str),

    /// The streamed body did not match the declared content length.
    #[error("expected {expected} bytes but received {received}")]
    ContentLengthMismatch {
        /// Bytes promised by the content length.
        expected: u64,
        /// Bytes actually produced.
        received: u64,
    },
}

/// This crate's result type.
pub type Result<T> = std::result::Result<T, Error>;
