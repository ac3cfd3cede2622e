//! Fragment tokenizer for markup assigned through `set_inner_html`.
//!
//! This is a forgiving scanner, not the HTML5 state machine:
//! - tag names are ASCII `[A-Za-z][A-Za-z0-9:_.-]*`, lowercased;
//! - attribute names are any run of non-space bytes other than `= > / " '`,
//!   lowercased; the first occurrence of a duplicated name wins;
//! - doctypes and processing instructions are skipped;
//! - a `<` that does not open a tag is literal text;
//! - `script`/`style` bodies are raw text up to the matching close tag.
use crate::entities::decode_entities;
use crate::types::{Attribute, Token, is_rawtext_element, is_void_element};
use memchr::memchr;

const COMMENT_START: &str = "<!--";
const COMMENT_END: &str = "-->";

fn is_tag_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')
}

fn is_attribute_name_byte(b: u8) -> bool {
    !b.is_ascii_whitespace() && !matches!(b, b'=' | b'>' | b'/' | b'"' | b'\'')
}

fn scan_while(bytes: &[u8], mut k: usize, pred: impl Fn(u8) -> bool) -> usize {
    while k < bytes.len() && pred(bytes[k]) {
        k += 1;
    }
    k
}

/// Index just past the next `needle` at or after `from`, or the input length.
fn skip_past(bytes: &[u8], from: usize, needle: u8) -> usize {
    match memchr(needle, &bytes[from.min(bytes.len())..]) {
        Some(rel) => from + rel + 1,
        None => bytes.len(),
    }
}

fn push_text(out: &mut Vec<Token>, raw: &str) {
    if raw.is_empty() {
        return;
    }
    let decoded = decode_entities(raw);
    if let Some(Token::Text(prev)) = out.last_mut() {
        prev.push_str(&decoded);
    } else {
        out.push(Token::Text(decoded));
    }
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let bytes = input.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;
    // Slices are only cut at ASCII bytes, so every endpoint is a char boundary.
    while i < bytes.len() {
        if bytes[i] != b'<' {
            let end = memchr(b'<', &bytes[i..]).map_or(bytes.len(), |rel| i + rel);
            push_text(&mut out, &input[i..end]);
            i = end;
            continue;
        }

        let rest = &input[i..];
        if let Some(body) = rest.strip_prefix(COMMENT_START) {
            match body.find(COMMENT_END) {
                Some(end) => {
                    out.push(Token::Comment(body[..end].to_string()));
                    i += COMMENT_START.len() + end + COMMENT_END.len();
                }
                None => {
                    out.push(Token::Comment(body.to_string()));
                    break;
                }
            }
            continue;
        }

        match bytes.get(i + 1) {
            Some(b'!') | Some(b'?') => {
                i = skip_past(bytes, i, b'>');
            }
            Some(b'/') => {
                let name_end = scan_while(bytes, i + 2, is_tag_name_byte);
                let name = input[i + 2..name_end].to_ascii_lowercase();
                i = skip_past(bytes, name_end, b'>');
                if !name.is_empty() {
                    out.push(Token::EndTag(name));
                }
            }
            Some(b) if b.is_ascii_alphabetic() => {
                let name_end = scan_while(bytes, i + 1, is_tag_name_byte);
                let name = input[i + 1..name_end].to_ascii_lowercase();
                let (attributes, self_closing, next) = scan_attributes(input, name_end);
                let self_closing = self_closing || is_void_element(&name);
                i = next;
                let rawtext = is_rawtext_element(&name) && !self_closing;
                out.push(Token::StartTag {
                    name: name.clone(),
                    attributes,
                    self_closing,
                });
                if rawtext {
                    let (text_end, resume) = find_rawtext_end(input, i, &name);
                    if text_end > i {
                        out.push(Token::Text(input[i..text_end].to_string()));
                    }
                    out.push(Token::EndTag(name));
                    i = resume;
                }
            }
            _ => {
                push_text(&mut out, "<");
                i += 1;
            }
        }
    }
    out
}

/// Scans attributes after a tag name. Returns the attributes, whether the tag
/// was written self-closing, and the index after the closing `>`.
fn scan_attributes(input: &str, start: usize) -> (Vec<Attribute>, bool, usize) {
    let bytes = input.as_bytes();
    let len = bytes.len();
    let mut attributes: Vec<Attribute> = Vec::new();
    let mut k = start;
    loop {
        k = scan_while(bytes, k, |b| b.is_ascii_whitespace());
        if k >= len {
            return (attributes, false, len);
        }
        match bytes[k] {
            b'>' => return (attributes, false, k + 1),
            b'/' if bytes.get(k + 1) == Some(&b'>') => return (attributes, true, k + 2),
            b'/' => {
                k += 1;
                continue;
            }
            _ => {}
        }

        let name_start = k;
        k = scan_while(bytes, k, is_attribute_name_byte);
        if k == name_start {
            k += 1;
            continue;
        }
        let name = input[name_start..k].to_ascii_lowercase();

        let after_name = scan_while(bytes, k, |b| b.is_ascii_whitespace());
        let mut value = String::new();
        if after_name < len && bytes[after_name] == b'=' {
            k = scan_while(bytes, after_name + 1, |b| b.is_ascii_whitespace());
            if k < len && (bytes[k] == b'"' || bytes[k] == b'\'') {
                let quote = bytes[k];
                let value_start = k + 1;
                let value_end = memchr(quote, &bytes[value_start..]).map_or(len, |rel| value_start + rel);
                value = decode_entities(&input[value_start..value_end]);
                k = (value_end + 1).min(len);
            } else {
                let value_start = k;
                k = scan_while(bytes, k, |b| !b.is_ascii_whitespace() && b != b'>');
                value = decode_entities(&input[value_start..k]);
            }
        }

        if !attributes.iter().any(|(existing, _)| *existing == name) {
            attributes.push((name, value));
        }
    }
}

/// Finds `</name` (ASCII case-insensitive) followed by optional whitespace and
/// `>`. Returns where the raw text ends and where scanning resumes.
fn find_rawtext_end(input: &str, from: usize, name: &str) -> (usize, usize) {
    let bytes = input.as_bytes();
    let needle = name.as_bytes();
    let mut i = from;
    while let Some(rel) = memchr(b'<', &bytes[i..]) {
        let lt = i + rel;
        let name_start = lt + 2;
        let name_end = name_start + needle.len();
        if bytes.get(lt + 1) == Some(&b'/')
            && bytes.len() >= name_end
            && bytes[name_start..name_end].eq_ignore_ascii_case(needle)
        {
            let k = scan_while(bytes, name_end, |b| b.is_ascii_whitespace());
            if k < bytes.len() && bytes[k] == b'>' {
                return (lt, k + 1);
            }
        }
        i = lt + 1;
    }
    (bytes.len(), bytes.len())
}
