/// Per-call redirect policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// Follow 3xx redirects at all. Defaults to true.
    pub follow_redirects: bool,
    /// Follow redirects that cross between http and https. Defaults to
    /// true; only consulted when `follow_redirects` is set.
    pub follow_ssl_redirects: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            follow_redirects: true,
            follow_ssl_redirects: true,
        }
    }
}
