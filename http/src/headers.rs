mod header_name;
mod header_value;

pub use header_name::HeaderName;
pub use header_value::HeaderValue;

use crate::{Error, Result};
use std::fmt::{self, Debug, Display, Formatter};

const SENSITIVE_HEADERS: [&str; 4] = [
    "Authorization",
    "Cookie",
    "Proxy-Authorization",
    "Set-Cookie",
];

/// An ordered sequence of `name: value` pairs.
///
/// Insertion order is preserved and names may repeat. Lookups compare names
/// case-insensitively; equality of two `Headers` compares spelling and
/// order strictly. [`Display`] and [`Debug`] redact the values of
/// credential-bearing headers.
///
/// ```
/// # use waymark_http::Headers;
/// let headers = Headers::from_iter([("Accept", "text/plain"), ("accept", "text/html")]);
/// assert_eq!(headers.get_str("ACCEPT"), Some("text/html"));
/// assert_eq!(headers.values("accept"), ["text/plain", "text/html"]);
/// ```
#[derive(Clone, PartialEq, Eq, Default)]
#[must_use]
pub struct Headers {
    entries: Vec<(HeaderName, HeaderValue)>,
}

impl Headers {
    /// Construct an empty header sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a builder with nothing added.
    pub fn builder() -> HeadersBuilder {
        HeadersBuilder::default()
    }

    /// How many entries this sequence holds. Repeated names count every
    /// occurrence.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Are there zero entries?
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The *last* value whose name matches case-insensitively, which is the
    /// value a later `set` would have left in place.
    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// [`get`][Self::get] as a `&str`.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).map(HeaderValue::as_str)
    }

    /// Every value whose name matches case-insensitively, in insertion
    /// order.
    pub fn values(&self, name: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
            .collect()
    }

    /// Predicate form of [`get`][Self::get].
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Convenience comparison of a value, ignoring ascii case. False when
    /// the header is absent.
    pub fn eq_ignore_ascii_case(&self, name: &str, needle: &str) -> bool {
        self.get_str(name)
            .is_some_and(|v| v.eq_ignore_ascii_case(needle))
    }

    /// The name at `index`, by insertion order.
    pub fn name_at(&self, index: usize) -> Option<&HeaderName> {
        self.entries.get(index).map(|(n, _)| n)
    }

    /// The value at `index`, by insertion order.
    pub fn value_at(&self, index: usize) -> Option<&HeaderValue> {
        self.entries.get(index).map(|(_, v)| v)
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&HeaderName, &HeaderValue)> {
        self.entries.iter().map(|(n, v)| (n, v))
    }

    /// The distinct names in first-appearance order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (name, _) in &self.entries {
            if !names.iter().any(|n| name.eq_ignore_ascii_case(n)) {
                names.push(name.as_str());
            }
        }
        names
    }

    /// A builder preloaded with these entries.
    pub fn new_builder(&self) -> HeadersBuilder {
        HeadersBuilder {
            entries: self.entries.clone(),
        }
    }

    /// Chainable append of one validated header.
    pub fn with_header(
        self,
        name: impl Into<HeaderName>,
        value: impl Into<HeaderValue>,
    ) -> Result<Self> {
        Ok(self.into_builder().add(name, value)?.build())
    }

    /// Chainable replacement of every header with this name.
    pub fn with_set_header(
        self,
        name: impl Into<HeaderName>,
        value: impl Into<HeaderValue>,
    ) -> Result<Self> {
        Ok(self.into_builder().set(name, value)?.build())
    }

    /// Chainable removal of every header with this name.
    pub fn without_header(self, name: &str) -> Self {
        self.into_builder().remove_all(name).build()
    }

    fn into_builder(self) -> HeadersBuilder {
        HeadersBuilder {
            entries: self.entries,
        }
    }
}

fn is_sensitive(name: &HeaderName) -> bool {
    SENSITIVE_HEADERS
        .iter()
        .any(|sensitive| name.eq_ignore_ascii_case(sensitive))
}

impl Display for Headers {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.entries {
            if is_sensitive(name) {
                f.write_fmt(format_args!("{name}: ██\r\n"))?;
            } else {
                f.write_fmt(format_args!("{name}: {value}\r\n"))?;
            }
        }
        Ok(())
    }
}

impl Debug for Headers {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, value) in &self.entries {
            if is_sensitive(name) {
                map.entry(name, &"██");
            } else {
                map.entry(name, value);
            }
        }
        map.finish()
    }
}

impl<HN, HV> FromIterator<(HN, HV)> for Headers
where
    HN: Into<HeaderName>,
    HV: Into<HeaderValue>,
{
    fn from_iter<T: IntoIterator<Item = (HN, HV)>>(iter: T) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a HeaderName, &'a HeaderValue);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (HeaderName, HeaderValue)>,
        fn(&'a (HeaderName, HeaderValue)) -> (&'a HeaderName, &'a HeaderValue),
    >;

    fn into_iter(self) -> Self::IntoIter {
        fn entry_refs(entry: &(HeaderName, HeaderValue)) -> (&HeaderName, &HeaderValue) {
            (&entry.0, &entry.1)
        }
        let entry_refs: fn(&'a (HeaderName, HeaderValue)) -> (&'a HeaderName, &'a HeaderValue) =
            entry_refs;
        self.entries.iter().map(entry_refs)
    }
}

/// Mutable scratch space for building [`Headers`].
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct HeadersBuilder {
    entries: Vec<(HeaderName, HeaderValue)>,
}

impl HeadersBuilder {
    /// Append a validated header.
    pub fn add(self, name: impl Into<HeaderName>, value: impl Into<HeaderValue>) -> Result<Self> {
        let name = name.into();
        let value = value.into();
        if !name.is_valid() {
            return Err(Error::InvalidHeaderName(name.as_str().to_string()));
        }
        if !value.is_valid() {
            return Err(Error::InvalidHeaderValue(name));
        }
        Ok(self.push(name, value))
    }

    /// Append a header whose value may contain non-ascii text. The value
    /// must still be free of line breaks and NUL.
    pub fn add_unsafe_non_ascii(
        self,
        name: impl Into<HeaderName>,
        value: impl Into<HeaderValue>,
    ) -> Result<Self> {
        let name = name.into();
        let value = value.into();
        if !name.is_valid() {
            return Err(Error::InvalidHeaderName(name.as_str().to_string()));
        }
        if !value.is_safe() {
            return Err(Error::InvalidHeaderValue(name));
        }
        Ok(self.push(name, value))
    }

    /// Append a `name: value` line, splitting on the first colon. Both
    /// sides are trimmed and validated.
    pub fn add_line(self, line: &str) -> Result<Self> {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| Error::UnexpectedHeaderLine(line.to_string()))?;
        self.add(name.trim().to_string(), value.trim().to_string())
    }

    /// Append a line without validation, for headers received from legacy
    /// peers: the name may be empty, and a leading colon attaches the line
    /// to the empty name.
    pub fn add_lenient_line(self, line: &str) -> Self {
        match line[1.min(line.len())..].find(':') {
            Some(index) => {
                let (name, value) = line.split_at(index + 1);
                self.push(
                    name.to_string().into(),
                    value[1..].trim().to_string().into(),
                )
            }
            None => match line.strip_prefix(':') {
                Some(value) => self.push("".into(), value.trim().to_string().into()),
                None => self.push("".into(), line.trim().to_string().into()),
            },
        }
    }

    /// Remove every entry matching `name` case-insensitively, then append
    /// the replacement.
    pub fn set(self, name: impl Into<HeaderName>, value: impl Into<HeaderValue>) -> Result<Self> {
        let name = name.into();
        self.remove_all(name.as_str()).add(name, value)
    }

    /// Remove every entry matching `name` case-insensitively.
    pub fn remove_all(mut self, name: &str) -> Self {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self
    }

    /// The last value for `name` added so far.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Freeze into [`Headers`].
    pub fn build(self) -> Headers {
        Headers {
            entries: self.entries,
        }
    }

    fn push(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.entries.push((name, value));
        self
    }
}
