//! Character reference handling for the fragment parser and the serializer.
//!
//! Decoding covers a deliberately small set: the five XML entities, `&nbsp;`,
//! and semicolon-terminated numeric references. Anything else passes through
//! unchanged, so `&` in text survives a parse/serialize round trip as `&amp;`.

const NAMED: &[(&str, char)] = &[
    ("amp;", '&'),
    ("lt;", '<'),
    ("gt;", '>'),
    ("quot;", '"'),
    ("apos;", '\''),
    ("nbsp;", '\u{00A0}'),
];

// 0x10FFFF has 6 hex / 7 decimal digits.
const MAX_HEX_DIGITS: usize = 6;
const MAX_DEC_DIGITS: usize = 7;

pub(crate) fn decode_entities(s: &str) -> String {
    if memchr::memchr(b'&', s.as_bytes()).is_none() {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        match decode_one(tail) {
            Some((ch, consumed)) => {
                out.push(ch);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Decodes the reference that follows a `&`. Returns the character and the
/// number of bytes consumed after the ampersand.
fn decode_one(tail: &str) -> Option<(char, usize)> {
    if let Some(numeric) = tail.strip_prefix('#') {
        let (digits, radix, prefix) = match numeric.strip_prefix(['x', 'X']) {
            Some(hex) => (hex, 16, 2),
            None => (numeric, 10, 1),
        };
        let max = if radix == 16 {
            MAX_HEX_DIGITS
        } else {
            MAX_DEC_DIGITS
        };
        let end = digits.find(';')?;
        if end == 0 || end > max {
            return None;
        }
        let value = u32::from_str_radix(&digits[..end], radix).ok()?;
        let ch = char::from_u32(value)?;
        return Some((ch, prefix + end + 1));
    }
    NAMED
        .iter()
        .find(|(name, _)| tail.starts_with(name))
        .map(|(name, ch)| (*ch, name.len()))
}

pub(crate) fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

pub(crate) fn escape_attribute(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_entities_handles_named_and_numeric() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;p&gt;"), "<p>");
        assert_eq!(decode_entities("&#215;&#xD7;"), "××");
        assert_eq!(decode_entities("x&nbsp;y"), "x\u{00A0}y");
    }

    #[test]
    fn decode_entities_passes_through_malformed() {
        assert_eq!(decode_entities("&amp"), "&amp");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
        assert_eq!(decode_entities("&#xD800;"), "&#xD800;");
        assert_eq!(decode_entities("&#99999999;"), "&#99999999;");
        assert_eq!(decode_entities("fish & chips"), "fish & chips");
    }

    #[test]
    fn escape_round_trips_through_decode() {
        let mut out = String::new();
        escape_text("a < b & c", &mut out);
        assert_eq!(out, "a &lt; b &amp; c");
        assert_eq!(decode_entities(&out), "a < b & c");

        let mut attr = String::new();
        escape_attribute("say \"hi\"", &mut attr);
        assert_eq!(attr, "say &quot;hi&quot;");
    }
}
