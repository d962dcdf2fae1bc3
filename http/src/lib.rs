#![forbid(unsafe_code)]
#![deny(
    clippy::dbg_macro,
    missing_copy_implementations,
    rustdoc::missing_crate_level_docs,
    nonstandard_style,
    unused_qualifications
)]

/*!
# http message model for the waymark client

The request/response vocabulary the waymark client speaks: an ordered
[`Headers`] map, [`Method`] and [`Protocol`] enums, the [`CacheControl`]
and [`MediaType`] header grammars, [`Cookie`]s and their [`CookieJar`],
the tolerant [http date codec][crate::http_date], and immutable
[`Request`]/[`Response`] messages over streaming bodies.

Bodies are async: a [`RequestBody`] opens a boxed
[`AsyncRead`](futures_lite::AsyncRead) and a [`ResponseBody`] reads one,
with one-shot semantics and idempotent close on both sides.
*/

pub mod http_date;

mod body;
mod cache_control;
mod cookie;
mod error;
mod headers;
mod media_type;
mod method;
mod protocol;
mod request;
mod response;

pub use body::{AsyncSource, FileBody, FileSystem, RequestBody, ResponseBody, StaticBody};
pub use cache_control::{CacheControl, CacheControlBuilder};
pub use cookie::{
    Clock, Cookie, CookieBuilder, CookieJar, MemoryCookieJar, NoCookies, SystemClock, MAX_DATE,
};
pub use error::{Error, Result};
pub use headers::{HeaderName, HeaderValue, Headers, HeadersBuilder};
pub use media_type::MediaType;
pub use method::Method;
pub use protocol::Protocol;
pub use request::{Request, RequestBuilder};
pub use response::{Response, ResponseBuilder};
