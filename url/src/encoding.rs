//! Percent-encoding canonicalization and decoding.
//!
//! A component is canonicalized against an *allowed extras* set: code points
//! in the RFC 3986 unreserved set or in the extras pass through, `%HH`
//! triples pass through when the input is already encoded, and everything
//! else is emitted as uppercase `%HH` escapes of its UTF-8 octets.

/// Characters beyond the unreserved set that may appear literally in a
/// username.
pub const USERNAME_EXTRAS: &str = "!$&'()*+,;=";

/// Password set. The username set plus `:`, which only delimits once.
pub const PASSWORD_EXTRAS: &str = "!$&'()*+,;=:";

/// Path segment set: sub-delims plus `:` and `@`.
pub const PATH_SEGMENT_EXTRAS: &str = "!$&'()*+,;=:@";

/// Query set. Deliberately lenient: the web tolerates raw brackets, braces,
/// carets and quotes in query strings, so canonicalization keeps them.
pub const QUERY_EXTRAS: &str = "!$&'()*+,;=:@/?[]{}|^`\"<>";

/// Set used when encoding an individual query name or value. `&`, `=` and
/// `+` are structural inside a query component and always escape.
pub const QUERY_COMPONENT_EXTRAS: &str = "!$'()*,;:@/?[]{}|^`\"<>";

/// Fragment set, as lenient as the query set.
pub const FRAGMENT_EXTRAS: &str = "!$&'()*+,;=:@/?[]{}|^`\"<>";

/// Characters that the uri-strict variants of each set re-encode even when
/// the lenient set would let them through.
const STRICT_ENCODED: &str = "\"<>`{}|^";

/// Options for [`canonicalize`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoding {
    /// `%HH` triples in the input are well-formed escapes and pass through.
    /// When set, ASCII whitespace (`\t`, `\n`, `\x0c`, `\r`) is dropped.
    pub already_encoded: bool,
    /// `+` represents a space (query components only).
    pub plus_is_space: bool,
    /// Non-ASCII code points pass through unencoded.
    pub unicode_allowed: bool,
    /// Re-encode the characters in the uri-strict set regardless of extras.
    pub strict: bool,
}

impl Encoding {
    pub(crate) const ALREADY_ENCODED: Encoding = Encoding {
        already_encoded: true,
        plus_is_space: false,
        unicode_allowed: false,
        strict: false,
    };

    pub(crate) const QUERY_REENCODE: Encoding = Encoding {
        already_encoded: true,
        plus_is_space: true,
        unicode_allowed: false,
        strict: false,
    };

    pub(crate) const DECODED_INPUT: Encoding = Encoding {
        already_encoded: false,
        plus_is_space: false,
        unicode_allowed: false,
        strict: false,
    };

    pub(crate) const QUERY_DECODED: Encoding = Encoding {
        already_encoded: false,
        plus_is_space: true,
        unicode_allowed: false,
        strict: false,
    };
}

fn is_unreserved(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | '~')
}

fn is_hex(c: char) -> bool {
    c.is_ascii_hexdigit()
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

fn passes_through(c: char, extras: &str, encoding: Encoding) -> bool {
    if encoding.strict && STRICT_ENCODED.contains(c) {
        return false;
    }
    if c == '%' {
        return false;
    }
    if c == '+' && encoding.plus_is_space {
        return false;
    }
    if !c.is_ascii() {
        return encoding.unicode_allowed;
    }
    is_unreserved(c) || extras.contains(c)
}

fn percent_encode_to(out: &mut String, c: char) {
    let mut utf8 = [0u8; 4];
    for byte in c.encode_utf8(&mut utf8).as_bytes() {
        out.push('%');
        out.push(char::from(b"0123456789ABCDEF"[usize::from(byte >> 4)]));
        out.push(char::from(b"0123456789ABCDEF"[usize::from(byte & 0xf)]));
    }
}

/// Canonicalize `input` against an allowed-extras set.
///
/// Returns the input unchanged (no allocation beyond the output string) when
/// every character already passes through.
pub fn canonicalize(input: &str, extras: &str, encoding: Encoding) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices();
    while let Some((index, c)) = chars.next() {
        if c == '%' && encoding.already_encoded {
            let rest = &input[index + 1..];
            let mut tail = rest.chars();
            if let (Some(hi), Some(lo)) = (tail.next(), tail.next()) {
                if is_hex(hi) && is_hex(lo) {
                    out.push('%');
                    out.push(hi);
                    out.push(lo);
                    chars.next();
                    chars.next();
                    continue;
                }
            }
            percent_encode_to(&mut out, '%');
            continue;
        }

        if encoding.already_encoded && matches!(c, '\t' | '\n' | '\x0c' | '\r') {
            continue;
        }

        if c == '+' && encoding.plus_is_space && encoding.already_encoded {
            // a literal plus read back out of a query keeps its meaning
            out.push('+');
            continue;
        }

        if passes_through(c, extras, encoding) {
            out.push(c);
        } else {
            percent_encode_to(&mut out, c);
        }
    }
    out
}

/// Percent-decode `input`. Invalid escapes stay literal; byte sequences that
/// are not UTF-8 decode to U+FFFD.
pub fn percent_decode(input: &str, plus_is_space: bool) -> String {
    if !input.contains(['%', '+']) {
        return input.to_string();
    }

    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                match (
                    bytes.get(i + 1).copied().and_then(hex_value),
                    bytes.get(i + 2).copied().and_then(hex_value),
                ) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 3;
                    }
                    _ => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' if plus_is_space => {
                out.push(b' ');
                i += 1;
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }

    match String::from_utf8(out) {
        Ok(s) => s,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }
}
