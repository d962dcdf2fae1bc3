use crate::Error;
use smartcow::SmartCow;
use std::fmt::{self, Debug, Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// The name of an http header.
///
/// Names keep the exact spelling they were created with; lookups elsewhere
/// compare case-insensitively but equality of two `HeaderName`s is strict.
#[derive(Clone, PartialEq, Eq)]
pub struct HeaderName(pub(crate) SmartCow<'static>);

impl Hash for HeaderName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.as_bytes().hash(state);
    }
}

impl HeaderName {
    /// Determine if this header name contains only the characters http
    /// permits: at least one byte, each in `!`..=`~`.
    pub fn is_valid(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| (0x21..=0x7e).contains(&b))
    }

    /// This name's exact spelling.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison, the equivalence http lookups use.
    pub fn eq_ignore_ascii_case(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl FromStr for HeaderName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = HeaderName(SmartCow::Owned(s.into()));
        if name.is_valid() {
            Ok(name)
        } else {
            Err(Error::InvalidHeaderName(s.to_string()))
        }
    }
}

impl From<&'static str> for HeaderName {
    fn from(s: &'static str) -> Self {
        Self(SmartCow::Borrowed(s))
    }
}

impl From<String> for HeaderName {
    fn from(s: String) -> Self {
        Self(SmartCow::Owned(s.into()))
    }
}

impl AsRef<str> for HeaderName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for HeaderName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Debug for HeaderName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&*self.0, f)
    }
}

impl PartialEq<&str> for HeaderName {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl PartialEq<str> for HeaderName {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}
