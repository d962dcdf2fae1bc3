use crate::{Error, Result};
use encoding_rs::Encoding;
use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

/// A parsed `Content-Type` value: `type/subtype` plus parameters.
///
/// The original spelling is preserved and is what [`Display`] and equality
/// use, so a parsed value round-trips into a header unchanged.
///
/// ```
/// # use waymark_http::MediaType;
/// let media_type: MediaType = "text/plain; charset=utf-8".parse().unwrap();
/// assert_eq!(media_type.essence_type(), "text");
/// assert_eq!(media_type.subtype(), "plain");
/// assert_eq!(media_type.parameter("CHARSET"), Some("utf-8"));
/// ```
#[derive(Clone)]
pub struct MediaType {
    text: String,
    essence_type: String,
    subtype: String,
    parameters: Vec<(String, String)>,
}

impl MediaType {
    /// The top-level type, lower-cased: `text` in `text/plain`.
    pub fn essence_type(&self) -> &str {
        &self.essence_type
    }

    /// The subtype, lower-cased: `plain` in `text/plain`.
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// The first parameter with this case-insensitive name. Quoted values
    /// are returned unquoted.
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// The character encoding named by the `charset` parameter, if there is
    /// one and it is recognized.
    pub fn charset(&self) -> Option<&'static Encoding> {
        Encoding::for_label(self.parameter("charset")?.as_bytes())
    }

    /// The original text.
    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Debug for MediaType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        Debug::fmt(&self.text, f)
    }
}

impl PartialEq for MediaType {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for MediaType {}

fn is_token_char(c: char) -> bool {
    matches!(
        c,
        'a'..='z'
        | 'A'..='Z'
        | '0'..='9'
        | '!' | '#' | '$' | '%' | '&' | '\'' | '*' | '+' | '-' | '.' | '^' | '_' | '`' | '|' | '~'
    )
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn token(&mut self) -> Option<&'a str> {
        let start = self.pos;
        while self
            .input[self.pos..]
            .chars()
            .next()
            .is_some_and(is_token_char)
        {
            self.pos += 1;
        }
        (self.pos > start).then(|| &self.input[start..self.pos])
    }

    fn quoted_string(&mut self) -> Option<String> {
        self.literal('"')?;
        let mut out = String::new();
        let mut chars = self.input[self.pos..].char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += i + 1;
                    return Some(out);
                }
                '\\' => {
                    let (_, escaped) = chars.next()?;
                    out.push(escaped);
                }
                other => out.push(other),
            }
        }
        None
    }

    fn literal(&mut self, c: char) -> Option<()> {
        if self.input[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            Some(())
        } else {
            None
        }
    }

    fn skip_ows(&mut self) {
        while self.input[self.pos..].starts_with([' ', '\t']) {
            self.pos += 1;
        }
    }

    fn at_end(&self) -> bool {
        self.pos == self.input.len()
    }
}

impl FromStr for MediaType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::MalformedMediaType(s.to_string());
        let mut parser = Parser {
            input: s.trim(),
            pos: 0,
        };

        let essence_type = parser.token().ok_or_else(malformed)?.to_ascii_lowercase();
        parser.literal('/').ok_or_else(malformed)?;
        let subtype = parser.token().ok_or_else(malformed)?.to_ascii_lowercase();

        let mut parameters = Vec::new();
        loop {
            parser.skip_ows();
            if parser.at_end() {
                break;
            }
            parser.literal(';').ok_or_else(malformed)?;
            parser.skip_ows();
            if parser.at_end() {
                // trailing semicolon, seen in the wild
                break;
            }
            let name = parser.token().ok_or_else(malformed)?.to_ascii_lowercase();
            parser.literal('=').ok_or_else(malformed)?;
            let value = if parser.input[parser.pos..].starts_with('"') {
                parser.quoted_string().ok_or_else(malformed)?
            } else {
                parser.token().ok_or_else(malformed)?.to_string()
            };
            parameters.push((name, value));
        }

        Ok(MediaType {
            text: s.to_string(),
            essence_type,
            subtype,
            parameters,
        })
    }
}
