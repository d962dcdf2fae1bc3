//! IDNA2008 / UTS#46 hostname processing.
//!
//! [`to_ascii`] maps, normalizes and validates each label, producing
//! lower-cased A-labels; [`to_unicode`] is the lenient inverse. Context
//! rules beyond the ZWNJ/ZWJ distinction are not applied at this layer.

use crate::punycode;
use unicode_bidi::{bidi_class, BidiClass};
use unicode_normalization::{char::canonical_combining_class, UnicodeNormalization};

const MAX_LABEL_LENGTH: usize = 63;
const MAX_DOMAIN_LENGTH: usize = 253;

const ZWNJ: char = '\u{200c}';
const ZWJ: char = '\u{200d}';

/// Convert a domain to its ASCII (A-label) form, or `None` if any label is
/// invalid. A single trailing dot is preserved.
pub fn to_ascii(domain: &str) -> Option<String> {
    let mapped = map_separators(domain);
    let (core, trailing_dot) = match mapped.strip_suffix('.') {
        Some(core) => (core, true),
        None => (mapped.as_str(), false),
    };
    if core.is_empty() {
        return None;
    }

    let mut out = String::with_capacity(core.len());
    for (i, label) in core.split('.').enumerate() {
        if i > 0 {
            out.push('.');
        }
        out.push_str(&ascii_label(label)?);
    }

    if out.len() > MAX_DOMAIN_LENGTH {
        return None;
    }
    if trailing_dot {
        out.push('.');
    }
    Some(out)
}

/// Convert a domain to its unicode (U-label) form. A-labels that fail to
/// decode are kept as-is; this function never fails.
pub fn to_unicode(domain: &str) -> String {
    let mut out = String::with_capacity(domain.len());
    for (i, label) in domain.split('.').enumerate() {
        if i > 0 {
            out.push('.');
        }
        match punycode::a_label_payload(label).and_then(punycode::decode_label) {
            Some(unicode) => out.push_str(&unicode),
            None => out.push_str(label),
        }
    }
    out
}

/// The ideographic and fullwidth dots map to `.` before labels split.
fn map_separators(domain: &str) -> String {
    if domain.contains(['\u{3002}', '\u{ff0e}', '\u{ff61}']) {
        domain
            .chars()
            .map(|c| match c {
                '\u{3002}' | '\u{ff0e}' | '\u{ff61}' => '.',
                other => other,
            })
            .collect()
    } else {
        domain.to_string()
    }
}

fn ascii_label(label: &str) -> Option<String> {
    if let Some(payload) = punycode::a_label_payload(label) {
        // existing A-label: decode and re-encode must round-trip
        let decoded = punycode::decode_label(payload)?;
        let reencoded = punycode::encode_label(&decoded)?;
        if !reencoded.eq_ignore_ascii_case(payload) {
            return None;
        }
        validate_mapped(&decoded)?;
        let lower = label.to_ascii_lowercase();
        if lower.len() > MAX_LABEL_LENGTH {
            return None;
        }
        return Some(lower);
    }

    let mapped: String = {
        let mut mapped = String::with_capacity(label.len());
        for c in label.chars() {
            if is_ignored(c) {
                continue;
            }
            if c.is_ascii() {
                mapped.push(c.to_ascii_lowercase());
            } else {
                mapped.extend(c.to_lowercase());
            }
        }
        mapped.nfc().collect()
    };

    validate_mapped(&mapped)?;

    let encoded = if mapped.is_ascii() {
        validate_ldh(&mapped)?;
        mapped
    } else {
        format!("xn--{}", punycode::encode_label(&mapped)?)
    };

    if encoded.is_empty() || encoded.len() > MAX_LABEL_LENGTH {
        return None;
    }
    Some(encoded)
}

/// Code points UTS#46 maps to nothing.
fn is_ignored(c: char) -> bool {
    matches!(
        c,
        '\u{00ad}' | '\u{034f}' | '\u{180b}'..='\u{180d}' | '\u{fe00}'..='\u{fe0f}' | '\u{feff}'
    )
}

fn validate_mapped(label: &str) -> Option<()> {
    let mut chars = label.chars();
    if let Some(first) = chars.next() {
        if canonical_combining_class(first) != 0 {
            return None;
        }
    }
    for c in label.chars() {
        if c == ZWNJ {
            return None;
        }
        if c == ZWJ {
            continue;
        }
        if c.is_control() || (!c.is_ascii() && c.is_whitespace()) {
            return None;
        }
        if c.is_ascii() && !is_ldh_char(c.to_ascii_lowercase()) && c != '.' {
            return None;
        }
    }
    if label.chars().any(is_rtl) && !passes_bidi_rule(label) {
        return None;
    }
    Some(())
}

fn is_ldh_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '-' | '_')
}

fn validate_ldh(label: &str) -> Option<()> {
    if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
        return None;
    }
    if label.starts_with('-') || label.ends_with('-') {
        return None;
    }
    // a non-A-label may not claim the `??--` reserved slot
    if label.len() >= 4 && &label[2..4] == "--" {
        return None;
    }
    if !label.chars().all(is_ldh_char) {
        return None;
    }
    Some(())
}

fn is_rtl(c: char) -> bool {
    matches!(
        bidi_class(c),
        BidiClass::R | BidiClass::AL | BidiClass::AN
    )
}

/// RFC 5893 bidi rule, applied to labels containing RTL code points.
fn passes_bidi_rule(label: &str) -> bool {
    use BidiClass::{AL, AN, BN, CS, EN, ES, ET, NSM, ON, L, R};

    let mut chars = label.chars();
    let first = match chars.next() {
        Some(c) => bidi_class(c),
        None => return true,
    };

    let rtl = match first {
        R | AL => true,
        L => false,
        _ => return false,
    };

    let mut last_non_nsm = first;
    let mut seen_en = first == EN;
    let mut seen_an = false;
    for c in label.chars().skip(1) {
        let class = bidi_class(c);
        let allowed = if rtl {
            matches!(class, R | AL | AN | EN | ES | CS | ET | ON | BN | NSM)
        } else {
            matches!(class, L | EN | ES | CS | ET | ON | BN | NSM)
        };
        if !allowed {
            return false;
        }
        if class != NSM {
            last_non_nsm = class;
        }
        seen_en |= class == EN;
        seen_an |= class == AN;
    }

    if rtl {
        if seen_en && seen_an {
            return false;
        }
        matches!(last_non_nsm, R | AL | AN | EN)
    } else {
        matches!(last_non_nsm, L | EN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn ascii_domains_lowercase() {
        assert_eq!(to_ascii("Example.COM").unwrap(), "example.com");
        assert_eq!(to_ascii("tRaIlInG.dot.").unwrap(), "trailing.dot.");
    }

    #[test]
    fn unicode_becomes_a_labels() {
        assert_eq!(to_ascii("bücher.de").unwrap(), "xn--bcher-kva.de");
        assert_eq!(to_ascii("BÜCHER.DE").unwrap(), "xn--bcher-kva.de");
    }

    #[test]
    fn existing_a_labels_validate_by_round_trip() {
        assert_eq!(to_ascii("XN--BCHER-KVA.de").unwrap(), "xn--bcher-kva.de");
        // not decodable back to the same payload
        assert!(to_ascii("xn--a.example").is_none());
    }

    #[test]
    fn to_unicode_never_fails() {
        assert_eq!(to_unicode("xn--bcher-kva.de"), "bücher.de");
        assert_eq!(to_unicode("xn--.de"), "xn--.de");
        assert_eq!(to_unicode("plain.example"), "plain.example");
    }

    #[test]
    fn round_trip_property() {
        for ascii in ["example.com", "xn--bcher-kva.de", "a-b.c-d.ef"] {
            let through = to_ascii(&to_unicode(ascii)).unwrap();
            assert!(through.eq_ignore_ascii_case(ascii), "{ascii} -> {through}");
        }
    }

    #[test]
    fn label_shape_rules() {
        assert!(to_ascii("-leading.example").is_none());
        assert!(to_ascii("trailing-.example").is_none());
        assert!(to_ascii("ab--cd.example").is_none());
        assert!(to_ascii("a..b").is_none());
        assert!(to_ascii("").is_none());
        assert!(to_ascii(&"a".repeat(64)).is_none());
        assert!(to_ascii(&format!("{}.{}", "a".repeat(63), "b")).is_some());
    }

    #[test]
    fn domain_length_cap_excludes_trailing_dot() {
        let label = "a".repeat(63);
        let domain = format!("{label}.{label}.{label}.{}", "a".repeat(61));
        assert_eq!(domain.len(), 253);
        assert!(to_ascii(&domain).is_some());
        assert!(to_ascii(&format!("{domain}.")).is_some());
        let too_long = format!("{label}.{label}.{label}.{}", "a".repeat(62));
        assert!(to_ascii(&too_long).is_none());
    }

    #[test]
    fn zwnj_rejected_zwj_tolerated() {
        assert!(to_ascii("a\u{200c}b.example").is_none());
        assert!(to_ascii("क\u{200d}ष.example").is_some());
    }

    #[test]
    fn leading_combining_mark_rejected() {
        assert!(to_ascii("\u{0301}abc.example").is_none());
    }

    #[test]
    fn ideographic_dots_separate_labels() {
        assert_eq!(to_ascii("example。com").unwrap(), "example.com");
        assert_eq!(to_ascii("example．com").unwrap(), "example.com");
    }

    #[test]
    fn bidi_labels() {
        // pure hebrew label is fine
        assert!(to_ascii("עברית.example").is_some());
        // mixing arabic-indic and european digits in an rtl label is not
        assert!(to_ascii("א1٢.example").is_none());
    }
}
