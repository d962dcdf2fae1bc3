use smartcow::SmartCow;
use smartstring::SmartString;
use std::fmt::{self, Debug, Display, Formatter, Write};

/// A `HeaderValue` represents the right hand side of a single
/// `name: value` pair.
#[derive(Clone, PartialEq, Eq)]
pub struct HeaderValue(pub(crate) SmartCow<'static>);

impl std::hash::Hash for HeaderValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.as_bytes().hash(state);
    }
}

impl HeaderValue {
    /// Determine if this value contains only horizontal tab and printable
    /// ascii.
    pub fn is_valid(&self) -> bool {
        self.0
            .bytes()
            .all(|b| b == b'\t' || (0x20..=0x7e).contains(&b))
    }

    /// Determine if this value contains no line breaks or NUL, the bar for
    /// values added through the unsafe non-ascii door.
    pub fn is_safe(&self) -> bool {
        memchr::memchr3(b'\r', b'\n', 0, self.0.as_bytes()).is_none()
    }

    /// This value as a `&str`.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for HeaderValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Debug for HeaderValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&*self.0, f)
    }
}

impl From<&'static str> for HeaderValue {
    fn from(s: &'static str) -> Self {
        Self(SmartCow::Borrowed(s))
    }
}

impl From<String> for HeaderValue {
    fn from(s: String) -> Self {
        Self(SmartCow::Owned(s.into()))
    }
}

impl From<std::borrow::Cow<'static, str>> for HeaderValue {
    fn from(c: std::borrow::Cow<'static, str>) -> Self {
        Self(SmartCow::from(c))
    }
}

macro_rules! delegate_from_to_format {
    ($($t:ty),*) => {
        $(
        impl From<$t> for HeaderValue {
            fn from(value: $t) -> Self {
                format_args!("{value}").into()
            }
        }
        )*
    };
}

delegate_from_to_format!(usize, u64, u16, u32, i32, i64);

impl From<fmt::Arguments<'_>> for HeaderValue {
    fn from(value: fmt::Arguments<'_>) -> Self {
        let mut s = SmartString::new();
        s.write_fmt(value).expect("infallible");
        Self(SmartCow::Owned(s))
    }
}

impl AsRef<str> for HeaderValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for HeaderValue {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl PartialEq<str> for HeaderValue {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<String> for HeaderValue {
    fn eq(&self, other: &String) -> bool {
        &*self.0 == other.as_str()
    }
}
