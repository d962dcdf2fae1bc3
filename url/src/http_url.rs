use crate::encoding::{
    canonicalize, percent_decode, Encoding, FRAGMENT_EXTRAS, PASSWORD_EXTRAS, PATH_SEGMENT_EXTRAS,
    QUERY_COMPONENT_EXTRAS, QUERY_EXTRAS, USERNAME_EXTRAS,
};
use crate::host::{can_parse_as_ip_address, canonicalize_host};
use crate::public_suffix::PublicSuffixDatabase;
use crate::{Result, UrlError};
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// A uniform resource locator with a scheme of either `http` or `https`.
///
/// The component accessors return decoded values; `encoded_`* accessors
/// return the exact bytes of the canonical string form. The canonical form
/// is itself always a valid parser input, and two urls are equal exactly
/// when their canonical forms are equal.
#[derive(Clone)]
pub struct HttpUrl {
    scheme: String,
    username: String,
    password: String,
    host: String,
    port: u16,
    path_segments: Vec<String>,
    query_names_and_values: Option<Vec<(String, Option<String>)>>,
    fragment: Option<String>,
    url: String,
}

impl HttpUrl {
    /// Parse an absolute http or https url. Leading and trailing ASCII
    /// whitespace and control characters are tolerated, as are backslashes
    /// standing in for slashes.
    pub fn parse(input: &str) -> Result<HttpUrl> {
        HttpUrlBuilder::parse_with_base(None, input)?.build()
    }

    /// A fresh builder with nothing set.
    pub fn builder() -> HttpUrlBuilder {
        HttpUrlBuilder::default()
    }

    /// 80 for `http`, 443 for `https`.
    pub fn default_port(scheme: &str) -> u16 {
        if scheme == "https" {
            443
        } else {
            80
        }
    }

    /// Either `"http"` or `"https"`.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// True for `https` urls.
    pub fn is_https(&self) -> bool {
        self.scheme == "https"
    }

    /// The decoded username, or the empty string.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The decoded password, or the empty string.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// The canonical host: a lower-cased registrable name, a dotted-quad
    /// IPv4 address, or an IPv6 address without brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The explicit port, or the scheme default.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The decoded path segments. A trailing slash shows up as a trailing
    /// empty segment.
    pub fn path_segments(&self) -> &[String] {
        &self.path_segments
    }

    /// The number of path segments.
    pub fn path_size(&self) -> usize {
        self.path_segments.len()
    }

    /// The decoded fragment, if any.
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// The encoded username exactly as it appears in the canonical form.
    pub fn encoded_username(&self) -> &str {
        if self.username.is_empty() {
            return "";
        }
        let start = self.scheme.len() + 3;
        let end = delimiter_offset(&self.url, start, self.url.len(), ":@");
        &self.url[start..end]
    }

    /// The encoded password exactly as it appears in the canonical form.
    pub fn encoded_password(&self) -> &str {
        if self.password.is_empty() {
            return "";
        }
        let start = self.url[self.scheme.len() + 3..]
            .find(':')
            .map(|i| self.scheme.len() + 3 + i + 1)
            .expect("canonical form of a url with a password contains a colon");
        let end = self.url.find('@').expect("userinfo ends with @");
        &self.url[start..end]
    }

    /// The encoded path, always beginning with `/`.
    pub fn encoded_path(&self) -> &str {
        let start = path_start(&self.url, self.scheme.len());
        let end = delimiter_offset(&self.url, start, self.url.len(), "?#");
        &self.url[start..end]
    }

    /// The encoded path split into segments.
    pub fn encoded_path_segments(&self) -> Vec<&str> {
        self.encoded_path()[1..].split('/').collect()
    }

    /// The encoded query, without the leading `?`. `None` when the url has
    /// no query at all; the empty string for a bare `?`.
    pub fn encoded_query(&self) -> Option<&str> {
        self.query_names_and_values.as_ref()?;
        let start = self.url.find('?').expect("url with a query contains ?") + 1;
        let end = delimiter_offset(&self.url, start, self.url.len(), "#");
        Some(&self.url[start..end])
    }

    /// The encoded fragment, without the leading `#`.
    pub fn encoded_fragment(&self) -> Option<&str> {
        self.fragment.as_ref()?;
        let start = self.url.find('#').expect("url with a fragment contains #") + 1;
        Some(&self.url[start..])
    }

    /// The decoded query reassembled with `&` and `=`, or `None`.
    pub fn query(&self) -> Option<String> {
        let pairs = self.query_names_and_values.as_ref()?;
        let mut out = String::new();
        for (i, (name, value)) in pairs.iter().enumerate() {
            if i > 0 {
                out.push('&');
            }
            out.push_str(name);
            if let Some(value) = value {
                out.push('=');
                out.push_str(value);
            }
        }
        Some(out)
    }

    /// The number of query parameters.
    pub fn query_size(&self) -> usize {
        self.query_names_and_values
            .as_ref()
            .map_or(0, Vec::len)
    }

    /// The first value of the named query parameter, decoded. A parameter
    /// present without `=` yields `None` here; use
    /// [`query_parameter_values`][Self::query_parameter_values] to
    /// distinguish it from absence.
    pub fn query_parameter(&self, name: &str) -> Option<&str> {
        self.query_names_and_values
            .as_ref()?
            .iter()
            .find(|(n, _)| n == name)
            .and_then(|(_, v)| v.as_deref())
    }

    /// All values of the named query parameter, in order. Bare names
    /// contribute a `None`.
    pub fn query_parameter_values(&self, name: &str) -> Vec<Option<&str>> {
        self.query_names_and_values
            .as_ref()
            .map(|pairs| {
                pairs
                    .iter()
                    .filter(|(n, _)| n == name)
                    .map(|(_, v)| v.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The distinct query parameter names, in first-appearance order.
    pub fn query_parameter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        if let Some(pairs) = &self.query_names_and_values {
            for (name, _) in pairs {
                if !names.iter().any(|n| *n == name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Resolve `link` against this url, returning `None` when the link is
    /// malformed or carries a scheme other than http or https.
    pub fn resolve(&self, link: &str) -> Option<HttpUrl> {
        HttpUrlBuilder::parse_with_base(Some(self), link)
            .ok()?
            .build()
            .ok()
    }

    /// A builder initialized with this url's components.
    pub fn new_builder(&self) -> HttpUrlBuilder {
        let mut builder = HttpUrlBuilder::default();
        builder.scheme = Some(self.scheme.clone());
        builder.encoded_username = self.encoded_username().to_string();
        builder.encoded_password = self.encoded_password().to_string();
        builder.host = Some(self.host.clone());
        builder.port = if self.port == Self::default_port(&self.scheme) {
            None
        } else {
            Some(self.port)
        };
        builder.encoded_path_segments = self
            .encoded_path_segments()
            .into_iter()
            .map(str::to_string)
            .collect();
        builder.encoded_query_names_and_values =
            self.encoded_query().map(query_to_pairs);
        builder.encoded_fragment = self.encoded_fragment().map(str::to_string);
        builder
    }

    /// This url with userinfo removed and the path, query, and fragment
    /// replaced by `/...`, for logging.
    pub fn redact(&self) -> String {
        let mut out = format!("{}://", self.scheme);
        if self.host.contains(':') {
            out.push('[');
            out.push_str(&self.host);
            out.push(']');
        } else {
            out.push_str(&self.host);
        }
        if self.port != Self::default_port(&self.scheme) {
            out.push_str(&format!(":{}", self.port));
        }
        out.push_str("/...");
        out
    }

    /// The domain one level below this host's public suffix, or `None` for
    /// IP hosts, hosts that are themselves public suffixes, and hosts with
    /// no label above the suffix. Consults the installed
    /// [`PublicSuffixDatabase`].
    pub fn top_private_domain(&self) -> Option<String> {
        if can_parse_as_ip_address(&self.host) {
            return None;
        }
        PublicSuffixDatabase::global()?.effective_tld_plus_one(&self.host)
    }
}

impl Display for HttpUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl Debug for HttpUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("HttpUrl").field(&self.url).finish()
    }
}

impl PartialEq for HttpUrl {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for HttpUrl {}

impl Hash for HttpUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url.hash(state);
    }
}

impl FromStr for HttpUrl {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for HttpUrl {
    type Error = UrlError;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

/// Mutable scratch space for assembling an [`HttpUrl`].
#[derive(Debug, Clone)]
#[must_use]
pub struct HttpUrlBuilder {
    scheme: Option<String>,
    encoded_username: String,
    encoded_password: String,
    host: Option<String>,
    port: Option<u16>,
    encoded_path_segments: Vec<String>,
    encoded_query_names_and_values: Option<Vec<(String, Option<String>)>>,
    encoded_fragment: Option<String>,
}

impl Default for HttpUrlBuilder {
    fn default() -> Self {
        Self {
            scheme: None,
            encoded_username: String::new(),
            encoded_password: String::new(),
            host: None,
            port: None,
            encoded_path_segments: vec![String::new()],
            encoded_query_names_and_values: None,
            encoded_fragment: None,
        }
    }
}

impl HttpUrlBuilder {
    /// Set the scheme, which must be `http` or `https` in any case.
    pub fn scheme(mut self, scheme: &str) -> Result<Self> {
        if scheme.eq_ignore_ascii_case("http") {
            self.scheme = Some("http".to_string());
        } else if scheme.eq_ignore_ascii_case("https") {
            self.scheme = Some("https".to_string());
        } else {
            return Err(UrlError::UnsupportedScheme(scheme.to_string()));
        }
        Ok(self)
    }

    /// Set the username from decoded text.
    pub fn username(mut self, username: &str) -> Self {
        self.encoded_username = canonicalize(username, USERNAME_EXTRAS, Encoding::DECODED_INPUT);
        self
    }

    /// Set the username from already-encoded text.
    pub fn encoded_username(mut self, username: &str) -> Self {
        self.encoded_username = canonicalize(username, USERNAME_EXTRAS, Encoding::ALREADY_ENCODED);
        self
    }

    /// Set the password from decoded text.
    pub fn password(mut self, password: &str) -> Self {
        self.encoded_password = canonicalize(password, PASSWORD_EXTRAS, Encoding::DECODED_INPUT);
        self
    }

    /// Set the password from already-encoded text.
    pub fn encoded_password(mut self, password: &str) -> Self {
        self.encoded_password = canonicalize(password, PASSWORD_EXTRAS, Encoding::ALREADY_ENCODED);
        self
    }

    /// Set the host. Accepts registrable names (including IDN), IPv4
    /// literals, and IPv6 literals with or without brackets.
    pub fn host(mut self, host: &str) -> Result<Self> {
        let canonical = canonicalize_host(&percent_decode(host, false))
            .ok_or_else(|| UrlError::InvalidHost(host.to_string()))?;
        self.host = Some(canonical);
        Ok(self)
    }

    /// Set an explicit port. Zero is not a valid port.
    pub fn port(mut self, port: u16) -> Result<Self> {
        if port == 0 {
            return Err(UrlError::InvalidPort(port.to_string()));
        }
        self.port = Some(port);
        Ok(self)
    }

    /// Append one path segment from decoded text. `.` and `..` segments
    /// apply their usual meaning.
    pub fn add_path_segment(mut self, segment: &str) -> Self {
        self.push_segment(segment, false, false);
        self
    }

    /// Append one path segment from already-encoded text.
    pub fn add_encoded_path_segment(mut self, segment: &str) -> Self {
        self.push_segment(segment, false, true);
        self
    }

    /// Replace the segment at `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of range.
    pub fn set_path_segment(mut self, index: usize, segment: &str) -> Self {
        let canonical = canonicalize(segment, PATH_SEGMENT_EXTRAS, Encoding::DECODED_INPUT);
        assert!(
            !is_dot(&canonical) && !is_dot_dot(&canonical),
            "unexpected path segment: {segment}"
        );
        self.encoded_path_segments[index] = canonical;
        self
    }

    /// Remove the segment at `index`.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of range.
    pub fn remove_path_segment(mut self, index: usize) -> Self {
        self.encoded_path_segments.remove(index);
        if self.encoded_path_segments.is_empty() {
            self.encoded_path_segments.push(String::new());
        }
        self
    }

    /// Replace the whole path. `path` must begin with `/`.
    pub fn encoded_path(mut self, path: &str) -> Self {
        assert!(path.starts_with('/'), "unexpected encoded path: {path}");
        self.resolve_path(path, 0, path.len());
        self
    }

    /// Replace the query from decoded text, or clear it with `None`.
    pub fn query(mut self, query: Option<&str>) -> Self {
        self.encoded_query_names_and_values = query
            .map(|q| query_to_pairs(&canonicalize(q, QUERY_EXTRAS, Encoding::QUERY_DECODED)));
        self
    }

    /// Replace the query from already-encoded text, or clear it.
    pub fn encoded_query(mut self, query: Option<&str>) -> Self {
        self.encoded_query_names_and_values = query
            .map(|q| query_to_pairs(&canonicalize(q, QUERY_EXTRAS, Encoding::QUERY_REENCODE)));
        self
    }

    /// Append a query parameter from decoded text. A `None` value appends a
    /// bare name with no `=`.
    pub fn add_query_parameter(mut self, name: &str, value: Option<&str>) -> Self {
        self.encoded_query_names_and_values
            .get_or_insert_with(Vec::new)
            .push((
                canonicalize(name, QUERY_COMPONENT_EXTRAS, Encoding::QUERY_DECODED),
                value.map(|v| canonicalize(v, QUERY_COMPONENT_EXTRAS, Encoding::QUERY_DECODED)),
            ));
        self
    }

    /// Append a query parameter from already-encoded text.
    pub fn add_encoded_query_parameter(mut self, name: &str, value: Option<&str>) -> Self {
        self.encoded_query_names_and_values
            .get_or_insert_with(Vec::new)
            .push((
                canonicalize(name, QUERY_COMPONENT_EXTRAS, Encoding::QUERY_REENCODE),
                value.map(|v| canonicalize(v, QUERY_COMPONENT_EXTRAS, Encoding::QUERY_REENCODE)),
            ));
        self
    }

    /// Remove all query parameters with the given decoded name.
    pub fn remove_all_query_parameters(mut self, name: &str) -> Self {
        let canonical = canonicalize(name, QUERY_COMPONENT_EXTRAS, Encoding::QUERY_DECODED);
        self.remove_all_canonical(&canonical);
        self
    }

    /// Remove all query parameters with the given already-encoded name.
    pub fn remove_all_encoded_query_parameters(mut self, name: &str) -> Self {
        let canonical = canonicalize(name, QUERY_COMPONENT_EXTRAS, Encoding::QUERY_REENCODE);
        self.remove_all_canonical(&canonical);
        self
    }

    /// Remove then append: at most one parameter with this name survives.
    pub fn set_query_parameter(self, name: &str, value: Option<&str>) -> Self {
        self.remove_all_query_parameters(name)
            .add_query_parameter(name, value)
    }

    /// Set the fragment from decoded text, or clear it.
    pub fn fragment(mut self, fragment: Option<&str>) -> Self {
        self.encoded_fragment =
            fragment.map(|f| canonicalize(f, FRAGMENT_EXTRAS, Encoding::DECODED_INPUT));
        self
    }

    /// Set the fragment from already-encoded text, or clear it.
    pub fn encoded_fragment(mut self, fragment: Option<&str>) -> Self {
        self.encoded_fragment =
            fragment.map(|f| canonicalize(f, FRAGMENT_EXTRAS, Encoding::ALREADY_ENCODED));
        self
    }

    /// Assemble the url. Fails when the scheme or host is missing.
    pub fn build(&self) -> Result<HttpUrl> {
        let scheme = self.scheme.clone().ok_or(UrlError::MissingScheme)?;
        let host = self.host.clone().ok_or(UrlError::MissingHost)?;
        let port = self
            .port
            .unwrap_or_else(|| HttpUrl::default_port(&scheme));

        let url = self.assemble(&scheme, &host, port);
        Ok(HttpUrl {
            username: percent_decode(&self.encoded_username, false),
            password: percent_decode(&self.encoded_password, false),
            path_segments: self
                .encoded_path_segments
                .iter()
                .map(|s| percent_decode(s, false))
                .collect(),
            query_names_and_values: self.encoded_query_names_and_values.as_ref().map(|pairs| {
                pairs
                    .iter()
                    .map(|(name, value)| {
                        (
                            percent_decode(name, true),
                            value.as_ref().map(|v| percent_decode(v, true)),
                        )
                    })
                    .collect()
            }),
            fragment: self
                .encoded_fragment
                .as_ref()
                .map(|f| percent_decode(f, false)),
            scheme,
            host,
            port,
            url,
        })
    }

    fn assemble(&self, scheme: &str, host: &str, port: u16) -> String {
        let mut out = format!("{scheme}://");
        if !self.encoded_username.is_empty() || !self.encoded_password.is_empty() {
            out.push_str(&self.encoded_username);
            if !self.encoded_password.is_empty() {
                out.push(':');
                out.push_str(&self.encoded_password);
            }
            out.push('@');
        }
        if host.contains(':') {
            out.push('[');
            out.push_str(host);
            out.push(']');
        } else {
            out.push_str(host);
        }
        if port != HttpUrl::default_port(scheme) {
            out.push_str(&format!(":{port}"));
        }
        for segment in &self.encoded_path_segments {
            out.push('/');
            out.push_str(segment);
        }
        if let Some(pairs) = &self.encoded_query_names_and_values {
            out.push('?');
            out.push_str(&pairs_to_query(pairs));
        }
        if let Some(fragment) = &self.encoded_fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }

    fn remove_all_canonical(&mut self, canonical_name: &str) {
        if let Some(pairs) = &mut self.encoded_query_names_and_values {
            pairs.retain(|(name, _)| name != canonical_name);
            if pairs.is_empty() {
                self.encoded_query_names_and_values = None;
            }
        }
    }

    /// Parse `input`, optionally against a base url whose components fill
    /// in whatever the input omits.
    pub(crate) fn parse_with_base(base: Option<&HttpUrl>, input: &str) -> Result<HttpUrlBuilder> {
        let mut builder = HttpUrlBuilder::default();
        let mut pos = skip_leading_ascii_whitespace(input, 0, input.len());
        let limit = skip_trailing_ascii_whitespace(input, pos, input.len());

        // scheme
        match scheme_delimiter_offset(input, pos, limit) {
            Some(colon) => {
                let scheme_text = &input[pos..colon];
                if scheme_text.eq_ignore_ascii_case("https") {
                    builder.scheme = Some("https".to_string());
                } else if scheme_text.eq_ignore_ascii_case("http") {
                    builder.scheme = Some("http".to_string());
                } else {
                    return Err(UrlError::UnsupportedScheme(scheme_text.to_string()));
                }
                pos = colon + 1;
            }
            None => match base {
                Some(base) => builder.scheme = Some(base.scheme().to_string()),
                None => return Err(UrlError::InvalidScheme(input[pos..limit].to_string())),
            },
        }

        // authority
        let slashes = count_slashes(input, pos, limit);
        let has_authority = slashes >= 2
            || base.is_none()
            || base.map(HttpUrl::scheme) != builder.scheme.as_deref();

        if has_authority {
            pos += slashes;
            let mut has_password = false;
            loop {
                let component_end = delimiter_offset(input, pos, limit, "@/\\?#");
                let delimiter = input[..limit].as_bytes().get(component_end).copied();
                if delimiter == Some(b'@') {
                    // userinfo; a second @ percent-encodes into the value
                    if !has_password {
                        let colon = delimiter_offset(input, pos, component_end, ":");
                        let canonical = canonicalize(
                            &input[pos..colon],
                            USERNAME_EXTRAS,
                            Encoding::ALREADY_ENCODED,
                        );
                        builder.encoded_username = if builder.encoded_username.is_empty() {
                            canonical
                        } else {
                            format!("{}%40{canonical}", builder.encoded_username)
                        };
                        if colon != component_end {
                            has_password = true;
                            builder.encoded_password = canonicalize(
                                &input[colon + 1..component_end],
                                PASSWORD_EXTRAS,
                                Encoding::ALREADY_ENCODED,
                            );
                        }
                    } else {
                        let canonical = canonicalize(
                            &input[pos..component_end],
                            PASSWORD_EXTRAS,
                            Encoding::ALREADY_ENCODED,
                        );
                        builder.encoded_password =
                            format!("{}%40{canonical}", builder.encoded_password);
                    }
                    pos = component_end + 1;
                } else {
                    let port_colon = port_colon_offset(input, pos, component_end);
                    let host_text = &input[pos..port_colon];
                    let host = canonicalize_host(&percent_decode(host_text, false))
                        .ok_or_else(|| UrlError::InvalidHost(host_text.to_string()))?;
                    builder.host = Some(host);
                    if port_colon + 1 < component_end {
                        let port_text = &input[port_colon + 1..component_end];
                        let port = parse_port(port_text)
                            .ok_or_else(|| UrlError::InvalidPort(port_text.to_string()))?;
                        builder.port = Some(port);
                    }
                    pos = component_end;
                    break;
                }
            }
        } else {
            let base = base.expect("relative references require a base");
            builder.encoded_username = base.encoded_username().to_string();
            builder.encoded_password = base.encoded_password().to_string();
            builder.host = Some(base.host().to_string());
            builder.port = if base.port() == HttpUrl::default_port(base.scheme()) {
                None
            } else {
                Some(base.port())
            };
            builder.encoded_path_segments = base
                .encoded_path_segments()
                .into_iter()
                .map(str::to_string)
                .collect();
            if pos == limit || input.as_bytes()[pos] == b'#' {
                builder.encoded_query_names_and_values =
                    base.encoded_query().map(query_to_pairs);
            }
        }

        // path
        let path_end = delimiter_offset(input, pos, limit, "?#");
        builder.resolve_path(input, pos, path_end);
        pos = path_end;

        // query
        if pos < limit && input.as_bytes()[pos] == b'?' {
            let query_end = delimiter_offset(input, pos, limit, "#");
            let canonical = canonicalize(
                &input[pos + 1..query_end],
                QUERY_EXTRAS,
                Encoding::QUERY_REENCODE,
            );
            builder.encoded_query_names_and_values = Some(query_to_pairs(&canonical));
            pos = query_end;
        }

        // fragment
        if pos < limit && input.as_bytes()[pos] == b'#' {
            builder.encoded_fragment = Some(canonicalize(
                &input[pos + 1..limit],
                FRAGMENT_EXTRAS,
                Encoding::ALREADY_ENCODED,
            ));
        }

        Ok(builder)
    }

    /// Apply `input[pos..limit]` to the current path: an absolute path
    /// replaces it, a relative path replaces the last segment, and dot
    /// segments resolve per RFC 3986 §5.2.
    fn resolve_path(&mut self, input: &str, mut pos: usize, limit: usize) {
        if pos == limit {
            return;
        }
        let first = input.as_bytes()[pos];
        if first == b'/' || first == b'\\' {
            self.encoded_path_segments.clear();
            self.encoded_path_segments.push(String::new());
            pos += 1;
        } else {
            let last = self.encoded_path_segments.len() - 1;
            self.encoded_path_segments[last] = String::new();
        }

        let mut i = pos;
        while i < limit {
            let segment_end = delimiter_offset(input, i, limit, "/\\");
            let has_trailing_slash = segment_end < limit;
            self.push_segment(&input[i..segment_end], has_trailing_slash, true);
            i = segment_end;
            if has_trailing_slash {
                i += 1;
            }
        }
    }

    fn push_segment(&mut self, segment: &str, add_trailing_slash: bool, already_encoded: bool) {
        let encoding = if already_encoded {
            Encoding::ALREADY_ENCODED
        } else {
            Encoding::DECODED_INPUT
        };
        let segment = canonicalize(segment, PATH_SEGMENT_EXTRAS, encoding);
        if is_dot(&segment) {
            return;
        }
        if is_dot_dot(&segment) {
            self.pop_segment();
            return;
        }

        let last = self.encoded_path_segments.len() - 1;
        if self.encoded_path_segments[last].is_empty() {
            self.encoded_path_segments[last] = segment;
        } else {
            self.encoded_path_segments.push(segment);
        }
        if add_trailing_slash {
            self.encoded_path_segments.push(String::new());
        }
    }

    /// Remove a directory from the path, leaving it slash-terminated.
    fn pop_segment(&mut self) {
        let removed = self
            .encoded_path_segments
            .pop()
            .expect("path segment list is never empty");
        if removed.is_empty() && !self.encoded_path_segments.is_empty() {
            let last = self.encoded_path_segments.len() - 1;
            self.encoded_path_segments[last] = String::new();
        } else {
            self.encoded_path_segments.push(String::new());
        }
    }
}

fn is_dot(segment: &str) -> bool {
    segment == "." || segment.eq_ignore_ascii_case("%2e")
}

fn is_dot_dot(segment: &str) -> bool {
    segment == ".."
        || segment.eq_ignore_ascii_case("%2e.")
        || segment.eq_ignore_ascii_case(".%2e")
        || segment.eq_ignore_ascii_case("%2e%2e")
}

/// The first index in `input[start..limit]` holding any byte of
/// `delimiters`, or `limit`. Delimiters are ASCII, so byte scanning is
/// utf-8 safe.
fn delimiter_offset(input: &str, start: usize, limit: usize, delimiters: &str) -> usize {
    let haystack = &input.as_bytes()[start..limit];
    let found = match delimiters.as_bytes() {
        [a] => memchr::memchr(*a, haystack),
        [a, b] => memchr::memchr2(*a, *b, haystack),
        [a, b, c] => memchr::memchr3(*a, *b, *c, haystack),
        set => haystack.iter().position(|byte| set.contains(byte)),
    };
    found.map_or(limit, |index| start + index)
}

/// The index of the `/` that begins the path. The authority cannot contain
/// a literal slash, so this is the first one past `://`.
fn path_start(url: &str, scheme_len: usize) -> usize {
    let start = scheme_len + 3;
    delimiter_offset(url, start, url.len(), "/")
}

fn skip_leading_ascii_whitespace(input: &str, pos: usize, limit: usize) -> usize {
    let bytes = input.as_bytes();
    let mut i = pos;
    while i < limit && bytes[i] <= b' ' {
        i += 1;
    }
    i
}

fn skip_trailing_ascii_whitespace(input: &str, pos: usize, limit: usize) -> usize {
    let bytes = input.as_bytes();
    let mut i = limit;
    while i > pos && bytes[i - 1] <= b' ' {
        i -= 1;
    }
    i
}

/// The index of the scheme-terminating colon, if `input[pos..limit]` begins
/// with a well-formed scheme.
fn scheme_delimiter_offset(input: &str, pos: usize, limit: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    if limit.saturating_sub(pos) < 2 {
        return None;
    }
    if !bytes[pos].is_ascii_alphabetic() {
        return None;
    }
    for i in pos + 1..limit {
        match bytes[i] {
            b':' => return Some(i),
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'+' | b'-' | b'.' => continue,
            _ => return None,
        }
    }
    None
}

fn count_slashes(input: &str, pos: usize, limit: usize) -> usize {
    let bytes = input.as_bytes();
    let mut i = pos;
    while i < limit && (bytes[i] == b'/' || bytes[i] == b'\\') {
        i += 1;
    }
    i - pos
}

/// The index of the colon introducing the port, skipping over a bracketed
/// IPv6 literal.
fn port_colon_offset(input: &str, pos: usize, limit: usize) -> usize {
    let bytes = input.as_bytes();
    let mut i = pos;
    while i < limit {
        match bytes[i] {
            b'[' => {
                i += 1;
                while i < limit && bytes[i] != b']' {
                    i += 1;
                }
            }
            b':' => return i,
            _ => {}
        }
        i += 1;
    }
    limit
}

fn parse_port(text: &str) -> Option<u16> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match text.parse::<u32>() {
        Ok(port) if (1..=65535).contains(&port) => Some(port as u16),
        _ => None,
    }
}

/// Split an encoded query into alternating name/value pairs. The empty
/// string produces the empty list, so a bare `?` survives round trips.
fn query_to_pairs(encoded_query: &str) -> Vec<(String, Option<String>)> {
    if encoded_query.is_empty() {
        return Vec::new();
    }
    encoded_query
        .split('&')
        .map(|component| match component.split_once('=') {
            Some((name, value)) => (name.to_string(), Some(value.to_string())),
            None => (component.to_string(), None),
        })
        .collect()
}

fn pairs_to_query(pairs: &[(String, Option<String>)]) -> String {
    let mut out = String::new();
    for (i, (name, value)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.push_str(name);
        if let Some(value) = value {
            out.push('=');
            out.push_str(value);
        }
    }
    out
}
