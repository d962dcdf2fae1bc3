//! RFC 3492 punycode, as used by IDNA A-labels.
//!
//! `encode`/`decode` operate on dot-joined domains; the label-level
//! functions work on a single label without the `xn--` prefix.

const BASE: u32 = 36;
const TMIN: u32 = 1;
const TMAX: u32 = 26;
const SKEW: u32 = 38;
const DAMP: u32 = 700;
const INITIAL_BIAS: u32 = 72;
const INITIAL_N: u32 = 128;

const PREFIX: &str = "xn--";

/// Encode a domain of dot-separated labels. Labels that are already ASCII
/// are kept verbatim; the rest become `xn--` A-labels. Returns `None` if a
/// label cannot be represented.
pub fn encode(domain: &str) -> Option<String> {
    let mut out = String::with_capacity(domain.len());
    for (i, label) in domain.split('.').enumerate() {
        if i > 0 {
            out.push('.');
        }
        if label.is_ascii() {
            out.push_str(label);
        } else {
            out.push_str(PREFIX);
            out.push_str(&encode_label(label)?);
        }
    }
    Some(out)
}

/// Decode a domain of dot-separated labels, turning `xn--` A-labels back
/// into unicode. Returns `None` if any A-label is malformed.
pub fn decode(domain: &str) -> Option<String> {
    let mut out = String::with_capacity(domain.len());
    for (i, label) in domain.split('.').enumerate() {
        if i > 0 {
            out.push('.');
        }
        match a_label_payload(label) {
            Some(payload) => out.push_str(&decode_label(payload)?),
            None => out.push_str(label),
        }
    }
    Some(out)
}

/// If `label` is an A-label, the part after the `xn--` prefix.
pub(crate) fn a_label_payload(label: &str) -> Option<&str> {
    if label.len() >= PREFIX.len() && label[..PREFIX.len()].eq_ignore_ascii_case(PREFIX) {
        Some(&label[PREFIX.len()..])
    } else {
        None
    }
}

fn adapt(delta: u32, num_points: u32, first_time: bool) -> u32 {
    let mut delta = if first_time { delta / DAMP } else { delta / 2 };
    delta += delta / num_points;
    let mut k = 0;
    while delta > ((BASE - TMIN) * TMAX) / 2 {
        delta /= BASE - TMIN;
        k += BASE;
    }
    k + (((BASE - TMIN + 1) * delta) / (delta + SKEW))
}

fn encode_digit(d: u32) -> char {
    match d {
        0..=25 => char::from(b'a' + d as u8),
        26..=35 => char::from(b'0' + (d - 26) as u8),
        _ => unreachable!("digit out of range"),
    }
}

fn decode_digit(c: char) -> Option<u32> {
    match c {
        'a'..='z' => Some(c as u32 - 'a' as u32),
        'A'..='Z' => Some(c as u32 - 'A' as u32),
        '0'..='9' => Some(c as u32 - '0' as u32 + 26),
        _ => None,
    }
}

/// Encode one unicode label to its punycode form, without the `xn--`
/// prefix. Returns `None` on overflow.
pub(crate) fn encode_label(label: &str) -> Option<String> {
    let input: Vec<char> = label.chars().collect();
    let mut out = String::new();

    let basic: Vec<char> = input.iter().copied().filter(char::is_ascii).collect();
    let mut handled = basic.len() as u32;
    for c in &basic {
        out.push(*c);
    }
    if !basic.is_empty() {
        out.push('-');
    }

    let mut n = INITIAL_N;
    let mut delta = 0u32;
    let mut bias = INITIAL_BIAS;
    let first_handled = handled;

    while (handled as usize) < input.len() {
        let m = input
            .iter()
            .map(|&c| c as u32)
            .filter(|&c| c >= n)
            .min()
            .expect("at least one unhandled code point");
        delta = delta.checked_add((m - n).checked_mul(handled + 1)?)?;
        n = m;

        for &c in &input {
            let c = c as u32;
            if c < n {
                delta = delta.checked_add(1)?;
            }
            if c == n {
                let mut q = delta;
                let mut k = BASE;
                loop {
                    let t = if k <= bias {
                        TMIN
                    } else if k >= bias + TMAX {
                        TMAX
                    } else {
                        k - bias
                    };
                    if q < t {
                        break;
                    }
                    out.push(encode_digit(t + (q - t) % (BASE - t)));
                    q = (q - t) / (BASE - t);
                    k += BASE;
                }
                out.push(encode_digit(q));
                bias = adapt(delta, handled + 1, handled == first_handled);
                delta = 0;
                handled += 1;
            }
        }
        delta = delta.checked_add(1)?;
        n = n.checked_add(1)?;
    }

    Some(out)
}

/// Decode one punycode label (the part after `xn--`). Returns `None` on
/// malformed input or overflow.
pub(crate) fn decode_label(payload: &str) -> Option<String> {
    let (mut output, extended) = match payload.rfind('-') {
        Some(pos) => {
            let (basic, rest) = payload.split_at(pos);
            if !basic.is_ascii() {
                return None;
            }
            (basic.chars().collect::<Vec<char>>(), &rest[1..])
        }
        None => (Vec::new(), payload),
    };

    let mut n = INITIAL_N;
    let mut i = 0u32;
    let mut bias = INITIAL_BIAS;
    let mut chars = extended.chars().peekable();

    while chars.peek().is_some() {
        let old_i = i;
        let mut weight = 1u32;
        let mut k = BASE;
        loop {
            let digit = decode_digit(chars.next()?)?;
            i = i.checked_add(digit.checked_mul(weight)?)?;
            let t = if k <= bias {
                TMIN
            } else if k >= bias + TMAX {
                TMAX
            } else {
                k - bias
            };
            if digit < t {
                break;
            }
            weight = weight.checked_mul(BASE - t)?;
            k += BASE;
        }
        let len = output.len() as u32 + 1;
        bias = adapt(i - old_i, len, old_i == 0);
        n = n.checked_add(i / len)?;
        i %= len;
        let c = char::from_u32(n)?;
        if c.is_ascii() {
            return None;
        }
        output.insert(i as usize, c);
        i += 1;
    }

    if output.is_empty() {
        return None;
    }
    Some(output.into_iter().collect())
}
