use crate::Headers;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

/// The parsed form of `Cache-Control` (rfc 7234 §5.2), readable from any
/// number of header lines and writable back out.
///
/// Numeric directives hold `-1` when unset. When a single `Cache-Control`
/// line was parsed and no `Pragma` fallback interfered, [`Display`] emits
/// that original text verbatim; otherwise it recomposes from the fields.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub struct CacheControl {
    no_cache: bool,
    no_store: bool,
    max_age_seconds: i32,
    s_max_age_seconds: i32,
    private: bool,
    public: bool,
    must_revalidate: bool,
    max_stale_seconds: i32,
    min_fresh_seconds: i32,
    only_if_cached: bool,
    no_transform: bool,
    immutable: bool,
    header_value: Option<String>,
}

const UNSET: CacheControl = CacheControl {
    no_cache: false,
    no_store: false,
    max_age_seconds: -1,
    s_max_age_seconds: -1,
    private: false,
    public: false,
    must_revalidate: false,
    max_stale_seconds: -1,
    min_fresh_seconds: -1,
    only_if_cached: false,
    no_transform: false,
    immutable: false,
    header_value: None,
};

impl CacheControl {
    /// A request directive set that bypasses the cache entirely.
    pub const FORCE_NETWORK: CacheControl = CacheControl {
        no_cache: true,
        no_store: false,
        max_age_seconds: -1,
        s_max_age_seconds: -1,
        private: false,
        public: false,
        must_revalidate: false,
        max_stale_seconds: -1,
        min_fresh_seconds: -1,
        only_if_cached: false,
        no_transform: false,
        immutable: false,
        header_value: None,
    };

    /// A request directive set that only accepts the cache, however stale.
    pub const FORCE_CACHE: CacheControl = CacheControl {
        no_cache: false,
        no_store: false,
        max_age_seconds: -1,
        s_max_age_seconds: -1,
        private: false,
        public: false,
        must_revalidate: false,
        max_stale_seconds: i32::MAX,
        min_fresh_seconds: -1,
        only_if_cached: true,
        no_transform: false,
        immutable: false,
        header_value: None,
    };

    /// Construct a builder for request-side directives.
    pub fn builder() -> CacheControlBuilder {
        CacheControlBuilder(UNSET)
    }

    /// Read every `Cache-Control` line, plus `Pragma` for its legacy
    /// `no-cache`.
    pub fn parse(headers: &Headers) -> CacheControl {
        let mut parsed = UNSET;
        let mut can_use_header_value = true;

        for (name, value) in headers.iter() {
            if name.eq_ignore_ascii_case("Cache-Control") {
                if parsed.header_value.is_none() && can_use_header_value {
                    parsed.header_value = Some(value.as_str().to_string());
                } else {
                    can_use_header_value = false;
                }
            } else if name.eq_ignore_ascii_case("Pragma") {
                can_use_header_value = false;
            } else {
                continue;
            }

            for (directive, parameter) in directives(value.as_str()) {
                match () {
                    () if directive.eq_ignore_ascii_case("no-cache") => parsed.no_cache = true,
                    () if directive.eq_ignore_ascii_case("no-store") => parsed.no_store = true,
                    () if directive.eq_ignore_ascii_case("max-age") => {
                        parsed.max_age_seconds = to_non_negative_int(parameter.as_deref(), -1);
                    }
                    () if directive.eq_ignore_ascii_case("s-maxage") => {
                        parsed.s_max_age_seconds = to_non_negative_int(parameter.as_deref(), -1);
                    }
                    () if directive.eq_ignore_ascii_case("private") => parsed.private = true,
                    () if directive.eq_ignore_ascii_case("public") => parsed.public = true,
                    () if directive.eq_ignore_ascii_case("must-revalidate") => {
                        parsed.must_revalidate = true;
                    }
                    () if directive.eq_ignore_ascii_case("max-stale") => {
                        parsed.max_stale_seconds =
                            to_non_negative_int(parameter.as_deref(), i32::MAX);
                    }
                    () if directive.eq_ignore_ascii_case("min-fresh") => {
                        parsed.min_fresh_seconds = to_non_negative_int(parameter.as_deref(), -1);
                    }
                    () if directive.eq_ignore_ascii_case("only-if-cached") => {
                        parsed.only_if_cached = true;
                    }
                    () if directive.eq_ignore_ascii_case("no-transform") => {
                        parsed.no_transform = true;
                    }
                    () if directive.eq_ignore_ascii_case("immutable") => parsed.immutable = true,
                    () => {}
                }
            }
        }

        if !can_use_header_value {
            parsed.header_value = None;
        }
        parsed
    }

    /// `no-cache`: a stored response must be revalidated before use.
    pub fn no_cache(&self) -> bool {
        self.no_cache
    }

    /// `no-store`: the response may not be cached at all.
    pub fn no_store(&self) -> bool {
        self.no_store
    }

    /// `max-age` in seconds, or `-1`.
    pub fn max_age_seconds(&self) -> i32 {
        self.max_age_seconds
    }

    /// `s-maxage` in seconds, or `-1`.
    pub fn s_max_age_seconds(&self) -> i32 {
        self.s_max_age_seconds
    }

    /// `private`.
    pub fn is_private(&self) -> bool {
        self.private
    }

    /// `public`.
    pub fn is_public(&self) -> bool {
        self.public
    }

    /// `must-revalidate`.
    pub fn must_revalidate(&self) -> bool {
        self.must_revalidate
    }

    /// `max-stale` in seconds; a bare `max-stale` reads as `i32::MAX`, and
    /// absence as `-1`.
    pub fn max_stale_seconds(&self) -> i32 {
        self.max_stale_seconds
    }

    /// `min-fresh` in seconds, or `-1`.
    pub fn min_fresh_seconds(&self) -> i32 {
        self.min_fresh_seconds
    }

    /// `only-if-cached`.
    pub fn only_if_cached(&self) -> bool {
        self.only_if_cached
    }

    /// `no-transform`.
    pub fn no_transform(&self) -> bool {
        self.no_transform
    }

    /// `immutable`.
    pub fn immutable(&self) -> bool {
        self.immutable
    }
}

impl Display for CacheControl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(header_value) = &self.header_value {
            return f.write_str(header_value);
        }

        let mut directives: Vec<String> = Vec::new();
        if self.no_cache {
            directives.push("no-cache".into());
        }
        if self.no_store {
            directives.push("no-store".into());
        }
        if self.max_age_seconds != -1 {
            directives.push(format!("max-age={}", self.max_age_seconds));
        }
        if self.s_max_age_seconds != -1 {
            directives.push(format!("s-maxage={}", self.s_max_age_seconds));
        }
        if self.private {
            directives.push("private".into());
        }
        if self.public {
            directives.push("public".into());
        }
        if self.must_revalidate {
            directives.push("must-revalidate".into());
        }
        if self.max_stale_seconds != -1 {
            directives.push(format!("max-stale={}", self.max_stale_seconds));
        }
        if self.min_fresh_seconds != -1 {
            directives.push(format!("min-fresh={}", self.min_fresh_seconds));
        }
        if self.only_if_cached {
            directives.push("only-if-cached".into());
        }
        if self.no_transform {
            directives.push("no-transform".into());
        }
        if self.immutable {
            directives.push("immutable".into());
        }
        f.write_str(&directives.join(", "))
    }
}

/// Assembles request-side cache directives.
#[derive(Debug, Clone)]
#[must_use]
pub struct CacheControlBuilder(CacheControl);

impl CacheControlBuilder {
    /// Require revalidation of any stored response.
    pub fn no_cache(mut self) -> Self {
        self.0.no_cache = true;
        self
    }

    /// Forbid storing the response.
    pub fn no_store(mut self) -> Self {
        self.0.no_store = true;
        self
    }

    /// Cap the age of an acceptable stored response. Sub-second precision
    /// truncates.
    pub fn max_age(mut self, max_age: Duration) -> Self {
        self.0.max_age_seconds = clamp_seconds(max_age);
        self
    }

    /// Accept a stored response past its freshness lifetime by up to this
    /// much.
    pub fn max_stale(mut self, max_stale: Duration) -> Self {
        self.0.max_stale_seconds = clamp_seconds(max_stale);
        self
    }

    /// Require the stored response to stay fresh for at least this long.
    pub fn min_fresh(mut self, min_fresh: Duration) -> Self {
        self.0.min_fresh_seconds = clamp_seconds(min_fresh);
        self
    }

    /// Only accept a stored response; never touch the network.
    pub fn only_if_cached(mut self) -> Self {
        self.0.only_if_cached = true;
        self
    }

    /// Forbid intermediaries from transforming the payload.
    pub fn no_transform(mut self) -> Self {
        self.0.no_transform = true;
        self
    }

    /// Mark the resource immutable for its freshness lifetime.
    pub fn immutable(mut self) -> Self {
        self.0.immutable = true;
        self
    }

    /// Freeze into a [`CacheControl`].
    pub fn build(self) -> CacheControl {
        self.0
    }
}

fn clamp_seconds(duration: Duration) -> i32 {
    duration.as_secs().try_into().unwrap_or(i32::MAX)
}

fn to_non_negative_int(parameter: Option<&str>, default: i32) -> i32 {
    let Some(value) = parameter.and_then(|p| p.parse::<i64>().ok()) else {
        return default;
    };
    if value > i64::from(i32::MAX) {
        i32::MAX
    } else if value < 0 {
        0
    } else {
        value as i32
    }
}

/// Iterate `directive[=parameter]` pairs off one header line. Parameters
/// may be bare tokens or quoted strings.
fn directives(value: &str) -> impl Iterator<Item = (String, Option<String>)> + '_ {
    let mut pos = 0;
    std::iter::from_fn(move || {
        let bytes = value.as_bytes();
        while pos < bytes.len() && matches!(bytes[pos], b' ' | b'\t' | b',' | b';') {
            pos += 1;
        }
        if pos >= bytes.len() {
            return None;
        }

        let token_start = pos;
        while pos < bytes.len() && !matches!(bytes[pos], b'=' | b',' | b';') {
            pos += 1;
        }
        let directive = value[token_start..pos].trim().to_string();

        let parameter = if pos < bytes.len() && bytes[pos] == b'=' {
            pos += 1;
            while pos < bytes.len() && matches!(bytes[pos], b' ' | b'\t') {
                pos += 1;
            }
            if pos < bytes.len() && bytes[pos] == b'"' {
                pos += 1;
                let parameter_start = pos;
                while pos < bytes.len() && bytes[pos] != b'"' {
                    pos += 1;
                }
                let parameter = value[parameter_start..pos].to_string();
                pos = (pos + 1).min(bytes.len());
                Some(parameter)
            } else {
                let parameter_start = pos;
                while pos < bytes.len() && !matches!(bytes[pos], b',' | b';') {
                    pos += 1;
                }
                Some(value[parameter_start..pos].trim().to_string())
            }
        } else {
            None
        };

        if directive.is_empty() {
            // stray separator noise; nothing more to report on this pass
            return if parameter.is_some() {
                Some((directive, parameter))
            } else {
                None
            };
        }
        Some((directive, parameter))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        Headers::from_iter(pairs.iter().map(|(n, v)| (n.to_string(), v.to_string())))
    }

    #[test]
    fn parses_flags_and_numbers() {
        let cc = CacheControl::parse(&headers(&[("Cache-Control", "max-age=120, public")]));
        assert_eq!(cc.max_age_seconds(), 120);
        assert!(cc.is_public());
        assert!(!cc.no_cache());
        assert_eq!(cc.s_max_age_seconds(), -1);
        assert_eq!(cc.max_stale_seconds(), -1);
        assert_eq!(cc.min_fresh_seconds(), -1);
    }

    #[test]
    fn pragma_no_cache() {
        let cc = CacheControl::parse(&headers(&[("Pragma", "no-cache")]));
        assert!(cc.no_cache());
        assert_eq!(cc.to_string(), "no-cache");
    }

    #[test]
    fn quoted_and_bare_parameters() {
        let cc = CacheControl::parse(&headers(&[("Cache-Control", "max-age=\"60\", private")]));
        assert_eq!(cc.max_age_seconds(), 60);
        assert!(cc.is_private());
    }

    #[test]
    fn saturation() {
        let cc = CacheControl::parse(&headers(&[("Cache-Control", "max-age=99999999999")]));
        assert_eq!(cc.max_age_seconds(), i32::MAX);

        let negative = CacheControl::parse(&headers(&[("Cache-Control", "max-age=-5")]));
        assert_eq!(negative.max_age_seconds(), 0);

        let bare_stale = CacheControl::parse(&headers(&[("Cache-Control", "max-stale")]));
        assert_eq!(bare_stale.max_stale_seconds(), i32::MAX);

        let junk = CacheControl::parse(&headers(&[("Cache-Control", "max-age=abc")]));
        assert_eq!(junk.max_age_seconds(), -1);
    }

    #[test]
    fn unknown_directives_are_ignored() {
        let cc = CacheControl::parse(&headers(&[(
            "Cache-Control",
            "pre-check=0, post-check=0, no-store",
        )]));
        assert!(cc.no_store());
    }

    #[test]
    fn single_header_round_trips_verbatim() {
        let original = "MAX-AGE=60, Public";
        let cc = CacheControl::parse(&headers(&[("Cache-Control", original)]));
        assert_eq!(cc.to_string(), original);
        assert_eq!(cc.max_age_seconds(), 60);
        assert!(cc.is_public());
    }

    #[test]
    fn multiple_headers_recompose() {
        let cc = CacheControl::parse(&headers(&[
            ("Cache-Control", "no-cache"),
            ("Cache-Control", "max-age=30"),
        ]));
        assert!(cc.no_cache());
        assert_eq!(cc.max_age_seconds(), 30);
        assert_eq!(cc.to_string(), "no-cache, max-age=30");
    }

    #[test]
    fn pragma_defeats_verbatim_round_trip() {
        let cc = CacheControl::parse(&headers(&[
            ("Cache-Control", "max-age=30"),
            ("Pragma", "no-cache"),
        ]));
        assert!(cc.no_cache());
        assert_eq!(cc.to_string(), "no-cache, max-age=30");
    }

    #[test]
    fn builder_and_constants() {
        let cc = CacheControl::builder()
            .no_cache()
            .max_age(Duration::from_millis(90_500))
            .build();
        assert!(cc.no_cache());
        assert_eq!(cc.max_age_seconds(), 90);

        assert!(CacheControl::FORCE_NETWORK.no_cache());
        assert_eq!(CacheControl::FORCE_NETWORK.to_string(), "no-cache");
        assert!(CacheControl::FORCE_CACHE.only_if_cached());
        assert_eq!(CacheControl::FORCE_CACHE.max_stale_seconds(), i32::MAX);
    }

    #[test]
    fn empty_headers_produce_the_unset_value() {
        let cc = CacheControl::parse(&Headers::new());
        assert_eq!(cc.to_string(), "");
        assert_eq!(cc.max_age_seconds(), -1);
    }
}
