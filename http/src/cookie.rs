use crate::http_date::{
    days_from_civil, days_in_month, expand_two_digit_year, format_http_date,
};
use crate::{Error, Headers, Result};
use std::fmt::{self, Display, Formatter};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use waymark_url::host::{can_parse_as_ip_address, canonicalize_host};
use waymark_url::{encoding::percent_decode, HttpUrl, PublicSuffixDatabase};

/// The last expressible cookie expiry: 9999-12-31T23:59:59.999Z.
pub const MAX_DATE: i64 = 253_402_300_799_999;

/// An rfc 6265 cookie.
///
/// Obtained by [parsing][Cookie::parse] a `Set-Cookie` value against the
/// url that sent it, or assembled with [`CookieBuilder`]. Equality compares
/// every field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    expires_at: i64,
    domain: String,
    path: String,
    secure: bool,
    http_only: bool,
    persistent: bool,
    host_only: bool,
    same_site: Option<String>,
}

impl Cookie {
    /// Construct a builder with nothing set.
    pub fn builder() -> CookieBuilder {
        CookieBuilder::default()
    }

    /// Parse one `Set-Cookie` value received from `url` at
    /// `current_time_millis`. Malformed cookies, domain mismatches, and
    /// public-suffix domains all yield `None`.
    pub fn parse(current_time_millis: i64, url: &HttpUrl, set_cookie: &str) -> Option<Cookie> {
        let limit = set_cookie.len();
        let pair_end = set_cookie.find(';').unwrap_or(limit);
        let equals = set_cookie[..pair_end].find('=')?;

        let name = set_cookie[..equals].trim();
        if name.is_empty() || contains_control_or_non_ascii(name) {
            return None;
        }
        let value = set_cookie[equals + 1..pair_end].trim();
        if contains_control_or_non_ascii(value) {
            return None;
        }

        let mut expires_at = MAX_DATE;
        let mut delta_seconds: i64 = -1;
        let mut domain: Option<String> = None;
        let mut path: Option<String> = None;
        let mut secure = false;
        let mut http_only = false;
        let mut host_only = true;
        let mut persistent = false;
        let mut same_site: Option<String> = None;

        for attribute in set_cookie[(pair_end + 1).min(limit)..].split(';') {
            let (attribute_name, attribute_value) = match attribute.split_once('=') {
                Some((n, v)) => (n.trim(), v.trim()),
                None => (attribute.trim(), ""),
            };
            // last write wins for repeated attributes
            if attribute_name.eq_ignore_ascii_case("expires") {
                if let Some(parsed) = parse_expires(attribute_value) {
                    expires_at = parsed;
                    persistent = true;
                }
            } else if attribute_name.eq_ignore_ascii_case("max-age") {
                if let Some(parsed) = parse_max_age(attribute_value) {
                    delta_seconds = parsed;
                    persistent = true;
                }
            } else if attribute_name.eq_ignore_ascii_case("domain") {
                match parse_domain(attribute_value) {
                    Some(parsed) => {
                        domain = Some(parsed);
                        host_only = false;
                    }
                    None => return None,
                }
            } else if attribute_name.eq_ignore_ascii_case("path") {
                path = Some(attribute_value.to_string());
            } else if attribute_name.eq_ignore_ascii_case("secure") {
                secure = true;
            } else if attribute_name.eq_ignore_ascii_case("httponly") {
                http_only = true;
            } else if attribute_name.eq_ignore_ascii_case("samesite") {
                same_site = Some(attribute_value.to_string());
            }
        }

        // max-age wins over expires no matter the attribute order
        if delta_seconds == i64::MIN {
            expires_at = i64::MIN;
        } else if delta_seconds != -1 {
            let delta_millis = delta_seconds
                .checked_mul(1000)
                .unwrap_or(i64::MAX);
            expires_at = current_time_millis
                .checked_add(delta_millis)
                .unwrap_or(i64::MAX)
                .min(MAX_DATE);
        }

        let url_host = url.host();
        let domain = match domain {
            None => url_host.to_string(),
            Some(domain) => {
                if !domain_match(url_host, &domain) {
                    return None;
                }
                domain
            }
        };

        // a cookie may not claim a whole public suffix
        if url_host.len() != domain.len() {
            if let Some(database) = PublicSuffixDatabase::global() {
                if database.effective_tld_plus_one(&domain).is_none() {
                    return None;
                }
            }
        }

        let path = match path {
            Some(path) if path.starts_with('/') => path,
            _ => default_path(url),
        };

        Some(Cookie {
            name: name.to_string(),
            value: value.to_string(),
            expires_at,
            domain,
            path,
            secure,
            http_only,
            persistent,
            host_only,
            same_site,
        })
    }

    /// Every cookie set by `headers` received from `url`.
    pub fn parse_all(
        current_time_millis: i64,
        url: &HttpUrl,
        headers: &Headers,
    ) -> Vec<Cookie> {
        headers
            .values("Set-Cookie")
            .into_iter()
            .filter_map(|value| Cookie::parse(current_time_millis, url, value))
            .collect()
    }

    /// The cookie's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The cookie's value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Expiry instant in epoch milliseconds, clamped to
    /// [`MAX_DATE`]. Non-persistent cookies report [`MAX_DATE`].
    pub fn expires_at(&self) -> i64 {
        self.expires_at
    }

    /// The domain this cookie is scoped to.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The path this cookie is scoped to, always beginning with `/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Only send over https.
    pub fn secure(&self) -> bool {
        self.secure
    }

    /// Hidden from script access; advisory for a client library.
    pub fn http_only(&self) -> bool {
        self.http_only
    }

    /// Whether an expiry was explicitly set.
    pub fn persistent(&self) -> bool {
        self.persistent
    }

    /// Whether this cookie matches only its exact host rather than the
    /// domain and its subdomains.
    pub fn host_only(&self) -> bool {
        self.host_only
    }

    /// The `SameSite` attribute value, if one was set.
    pub fn same_site(&self) -> Option<&str> {
        self.same_site.as_deref()
    }

    /// Whether this cookie has expired as of `now_millis`.
    pub fn expired(&self, now_millis: i64) -> bool {
        self.expires_at <= now_millis
    }

    /// Whether this cookie should be sent on a request to `url`.
    pub fn matches(&self, url: &HttpUrl) -> bool {
        let domain_ok = if self.host_only {
            url.host() == self.domain
        } else {
            domain_match(url.host(), &self.domain)
        };
        domain_ok && path_match(url, &self.path) && (!self.secure || url.is_https())
    }
}

impl Display for Cookie {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.value)?;
        if self.persistent {
            if self.expires_at == i64::MIN {
                f.write_str("; max-age=0")?;
            } else {
                write!(f, "; expires={}", format_http_date(self.expires_at))?;
            }
        }
        if !self.host_only {
            write!(f, "; domain={}", self.domain)?;
        }
        write!(f, "; path={}", self.path)?;
        if self.secure {
            f.write_str("; secure")?;
        }
        if self.http_only {
            f.write_str("; httponly")?;
        }
        if let Some(same_site) = &self.same_site {
            write!(f, "; samesite={same_site}")?;
        }
        Ok(())
    }
}

/// Suffix-style matching for non-host-only cookies: the domain itself and
/// any subdomain, never an IP host.
fn domain_match(url_host: &str, domain: &str) -> bool {
    if url_host == domain {
        return true;
    }
    url_host.ends_with(domain)
        && url_host.as_bytes()[url_host.len() - domain.len() - 1] == b'.'
        && !can_parse_as_ip_address(url_host)
}

fn path_match(url: &HttpUrl, path: &str) -> bool {
    let url_path = url.encoded_path();
    if url_path == path {
        return true;
    }
    if let Some(rest) = url_path.strip_prefix(path) {
        return path.ends_with('/') || rest.starts_with('/');
    }
    false
}

/// The default path per rfc 6265 §5.1.4: the request path up to its last
/// slash, or `/`.
fn default_path(url: &HttpUrl) -> String {
    let encoded_path = url.encoded_path();
    let last_slash = encoded_path.rfind('/').unwrap_or(0);
    if last_slash == 0 {
        "/".to_string()
    } else {
        encoded_path[..last_slash].to_string()
    }
}

fn contains_control_or_non_ascii(text: &str) -> bool {
    text.bytes().any(|b| b < 0x20 || b == 0x7f || b >= 0x80)
}

fn parse_domain(attribute_value: &str) -> Option<String> {
    if attribute_value.is_empty() || attribute_value.ends_with('.') {
        return None;
    }
    let domain = attribute_value.strip_prefix('.').unwrap_or(attribute_value);
    canonicalize_host(&percent_decode(domain, false))
}

/// A max-age is a decimal count of seconds. Overflow saturates; zero and
/// negative values force immediate expiry.
fn parse_max_age(attribute_value: &str) -> Option<i64> {
    let digits = attribute_value.strip_prefix('-').unwrap_or(attribute_value);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match attribute_value.parse::<i64>() {
        Ok(parsed) if parsed <= 0 => Some(i64::MIN),
        Ok(parsed) => Some(parsed),
        // an out-of-range numeric still counts, at the saturated extreme
        Err(_) if attribute_value.starts_with('-') => Some(i64::MIN),
        Err(_) => Some(i64::MAX),
    }
}

/// The rfc 6265 §5.1.1 permissive expires grammar: scan date tokens in any
/// order, first match per field wins.
fn parse_expires(attribute_value: &str) -> Option<i64> {
    let mut time: Option<(u32, u32, u32)> = None;
    let mut day: Option<u32> = None;
    let mut month: Option<u32> = None;
    let mut year: Option<i64> = None;

    for token in attribute_value.split(is_cookie_date_delimiter) {
        if token.is_empty() {
            continue;
        }
        if time.is_none() {
            if let Some(parsed) = parse_clock(token) {
                time = Some(parsed);
                continue;
            }
        }
        if day.is_none() {
            if let Some(parsed) = parse_number(token, 2) {
                day = Some(parsed as u32);
                continue;
            }
        }
        if month.is_none() {
            if let Some(parsed) = crate::http_date::month_by_name(token) {
                month = Some(parsed);
                continue;
            }
        }
        if year.is_none() {
            if let Some(parsed) = parse_number(token, 4) {
                year = Some(parsed);
                continue;
            }
        }
    }

    let (hour, minute, second) = time?;
    let day = day?;
    let month = month?;
    let year = expand_two_digit_year(year?);
    if year < 1601 || !(1..=31).contains(&day) || day > days_in_month(year, month) {
        return None;
    }
    if hour > 23 || minute > 59 || second > 59 {
        return None;
    }

    let days = days_from_civil(year, month, day);
    let seconds =
        days * 86_400 + i64::from(hour) * 3600 + i64::from(minute) * 60 + i64::from(second);
    Some((seconds * 1000).min(MAX_DATE))
}

/// rfc 6265 date tokens break on every non-alphanumeric octet except `:`.
fn is_cookie_date_delimiter(c: char) -> bool {
    matches!(c, '\t' | ' '..='/' | ';'..='@' | '['..='`' | '{'..='~')
}

fn parse_clock(token: &str) -> Option<(u32, u32, u32)> {
    let mut parts = token.split(':');
    let hour = parse_number(parts.next()?, 2)? as u32;
    let minute = parse_number(parts.next()?, 2)? as u32;
    let second = parse_number(parts.next()?, 2)? as u32;
    if parts.next().is_some() {
        return None;
    }
    Some((hour, minute, second))
}

fn parse_number(token: &str, max_digits: usize) -> Option<i64> {
    if token.is_empty()
        || token.len() > max_digits
        || !token.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    token.parse().ok()
}

/// Assembles a [`Cookie`] directly, validating at
/// [`build`][CookieBuilder::build].
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct CookieBuilder {
    name: Option<String>,
    value: Option<String>,
    expires_at: Option<i64>,
    domain: Option<(String, bool)>,
    path: Option<String>,
    secure: bool,
    http_only: bool,
    same_site: Option<String>,
}

impl CookieBuilder {
    /// Set the cookie name. Must be non-empty and already trimmed.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Set the cookie value. Must be already trimmed.
    pub fn value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    /// Set the expiry instant and mark the cookie persistent. Values at or
    /// below zero expire immediately; values above [`MAX_DATE`] clamp.
    pub fn expires_at(mut self, expires_at: i64) -> Self {
        let clamped = if expires_at <= 0 {
            i64::MIN
        } else {
            expires_at.min(MAX_DATE)
        };
        self.expires_at = Some(clamped);
        self
    }

    /// Scope to `domain` and its subdomains.
    pub fn domain(mut self, domain: &str) -> Self {
        self.domain = Some((domain.to_string(), false));
        self
    }

    /// Scope to exactly `domain`.
    pub fn host_only_domain(mut self, domain: &str) -> Self {
        self.domain = Some((domain.to_string(), true));
        self
    }

    /// Scope to `path`, which must begin with `/`.
    pub fn path(mut self, path: &str) -> Self {
        self.path = Some(path.to_string());
        self
    }

    /// Only send this cookie over https.
    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    /// Mark this cookie inaccessible to script.
    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    /// Set the `SameSite` attribute. Must be already trimmed.
    pub fn same_site(mut self, same_site: &str) -> Self {
        self.same_site = Some(same_site.to_string());
        self
    }

    /// Validate and produce the cookie.
    pub fn build(self) -> Result<Cookie> {
        let name = self
            .name
            .ok_or(Error::InvalidCookieField("name"))?;
        if name.is_empty() || name != name.trim() {
            return Err(Error::InvalidCookieField("name"));
        }
        let value = self.value.ok_or(Error::InvalidCookieField("value"))?;
        if value != value.trim() {
            return Err(Error::InvalidCookieField("value"));
        }
        if let Some(same_site) = &self.same_site {
            if same_site.is_empty() || same_site.as_str() != same_site.trim() {
                return Err(Error::InvalidCookieField("sameSite"));
            }
        }
        let (domain, host_only) = self
            .domain
            .ok_or(Error::InvalidCookieField("domain"))?;
        let domain =
            canonicalize_host(&domain).ok_or(Error::InvalidCookieField("domain"))?;
        let path = match self.path {
            Some(path) if path.starts_with('/') => path,
            Some(_) => return Err(Error::InvalidCookieField("path")),
            None => "/".to_string(),
        };

        Ok(Cookie {
            name,
            value,
            expires_at: self.expires_at.unwrap_or(MAX_DATE),
            domain,
            path,
            secure: self.secure,
            http_only: self.http_only,
            persistent: self.expires_at.is_some(),
            host_only,
            same_site: self.same_site,
        })
    }
}

/// A store of cookies, consulted before a request goes out and updated
/// when a response comes back.
///
/// Within one call the two operations are invoked serially; a jar shared
/// across clients decides its own interior locking.
pub trait CookieJar: Send + Sync + 'static {
    /// Cookies to attach to a request for `url`. Ordering is the jar's
    /// choice.
    fn load_for_request(&self, url: &HttpUrl) -> Vec<Cookie>;

    /// Offer cookies set by a response from `url`. The jar keeps whichever
    /// it wants.
    fn save_from_response(&self, url: &HttpUrl, cookies: Vec<Cookie>);
}

/// A jar that never saves or sends anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCookies;

impl CookieJar for NoCookies {
    fn load_for_request(&self, _url: &HttpUrl) -> Vec<Cookie> {
        Vec::new()
    }

    fn save_from_response(&self, _url: &HttpUrl, _cookies: Vec<Cookie>) {}
}

/// Wall-clock time, abstracted so cookie expiry is testable.
pub trait Clock: Send + Sync + 'static {
    /// Milliseconds since the unix epoch.
    fn now_millis(&self) -> i64;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// An in-memory jar: accepts everything, evicts on expiry, and sends
/// longest-path matches first.
pub struct MemoryCookieJar {
    store: Mutex<Vec<Cookie>>,
    clock: Box<dyn Clock>,
}

impl fmt::Debug for MemoryCookieJar {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCookieJar")
            .field("store", &self.store)
            .finish()
    }
}

impl Default for MemoryCookieJar {
    fn default() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl MemoryCookieJar {
    /// An empty jar on the system clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty jar on the provided clock.
    pub fn with_clock(clock: impl Clock) -> Self {
        Self {
            store: Mutex::new(Vec::new()),
            clock: Box::new(clock),
        }
    }
}

impl CookieJar for MemoryCookieJar {
    fn load_for_request(&self, url: &HttpUrl) -> Vec<Cookie> {
        let now = self.clock.now_millis();
        let mut store = self.store.lock().expect("cookie jar lock");
        store.retain(|cookie| !cookie.expired(now));
        let mut matches: Vec<Cookie> = store
            .iter()
            .filter(|cookie| cookie.matches(url))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.path().len().cmp(&a.path().len()));
        log::trace!("loaded {} of {} cookies for {}", matches.len(), store.len(), url.redact());
        matches
    }

    fn save_from_response(&self, url: &HttpUrl, cookies: Vec<Cookie>) {
        let mut store = self.store.lock().expect("cookie jar lock");
        log::trace!("saving {} cookies from {}", cookies.len(), url.redact());
        for cookie in cookies {
            store.retain(|existing| {
                existing.name() != cookie.name()
                    || existing.domain() != cookie.domain()
                    || existing.path() != cookie.path()
            });
            store.push(cookie);
        }
    }
}
