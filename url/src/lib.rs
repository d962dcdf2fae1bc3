#![forbid(unsafe_code)]
#![deny(
    clippy::dbg_macro,
    missing_copy_implementations,
    rustdoc::missing_crate_level_docs,
    missing_debug_implementations,
    nonstandard_style,
    unused_qualifications
)]

/*!
# http urls for the waymark client

This crate models the subset of the url universe an http client cares
about: `http` and `https` urls with a mandatory host, a decoded component
model, and a canonical string form. Parsing is lenient the way web content
requires (backslashes as slashes, whitespace tolerance, percent-encoding
repair), while the canonical output is strict.

```
use waymark_url::HttpUrl;

let url: HttpUrl = "https://example.com/a/b?q=1".parse().unwrap();
assert_eq!(url.host(), "example.com");
assert_eq!(url.port(), 443);
assert_eq!(url.query_parameter("q"), Some("1"));
```

Hostnames pass through IDNA processing ([`idna`]), IP literals
canonicalize ([`host`]), and registrable-domain questions are answered by
the [`PublicSuffixDatabase`].
*/

pub mod encoding;
pub mod host;
pub mod idna;
pub mod punycode;

mod error;
mod http_url;
mod public_suffix;

pub use error::{Result, UrlError};
pub use http_url::{HttpUrl, HttpUrlBuilder};
pub use public_suffix::PublicSuffixDatabase;
