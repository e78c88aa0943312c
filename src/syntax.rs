//! Low-level lexical machinery shared by every header parser: byte
//! classification, tokens, quoted strings, comments, and the escaping
//! writers.
//!
//! All consume functions take a prefix of the input and return the lexeme
//! together with the remainder. None of them can fail: malformed input
//! degrades to an empty or truncated lexeme, never to an error.

use std::borrow::Cow;
use std::io::{self, Write};

/// How a byte may appear in a header field value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Class {
    /// Valid in a token (RFC 7230 `tchar`).
    TokenOk,
    /// Not a token byte, but safe inside a quoted string.
    QuotedSafe,
    /// Representable in a quoted string, but known to confuse naive
    /// recipients (`,`, `;`, `"`).
    QuotedOk,
    /// Control bytes and non-ASCII.
    Unsafe,
}

const fn class_of(b: u8) -> Class {
    if b < 0x20 || b >= 0x7f {
        Class::Unsafe
    } else if b.is_ascii_alphanumeric() {
        Class::TokenOk
    } else {
        match b {
            b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^'
            | b'_' | b'`' | b'|' | b'~' => Class::TokenOk,
            b',' | b';' | b'"' => Class::QuotedOk,
            _ => Class::QuotedSafe,
        }
    }
}

static CLASSES: [Class; 256] = {
    let mut table = [Class::Unsafe; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = class_of(i as u8);
        i += 1;
    }
    table
};

/// RFC 5987 `attr-char`: the bytes that survive ext-value encoding
/// without a `%XX` escape.
static ATTR_CHARS: [bool; 256] = {
    let mut table = [false; 256];
    let mut i = 0;
    while i < 256 {
        let b = i as u8;
        table[i] = b.is_ascii_alphanumeric()
            || matches!(
                b,
                b'!' | b'#' | b'$' | b'&' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
            );
        i += 1;
    }
    table
};

pub(crate) fn is_attr_char(b: u8) -> bool {
    ATTR_CHARS[b as usize]
}

/// Classifies `s` as a whole: is it a valid token, is every byte safe in
/// a quoted string, is every byte at least representable in one.
///
/// The empty string is not a token but is trivially quotable.
pub(crate) fn classify(s: &str) -> (bool, bool, bool) {
    let mut token_ok = !s.is_empty();
    let mut quoted_safe = true;
    let mut quoted_ok = true;
    for &b in s.as_bytes() {
        match CLASSES[b as usize] {
            Class::TokenOk => {}
            Class::QuotedSafe => token_ok = false,
            Class::QuotedOk => {
                token_ok = false;
                quoted_safe = false;
            }
            Class::Unsafe => {
                token_ok = false;
                quoted_safe = false;
                quoted_ok = false;
            }
        }
    }
    (token_ok, quoted_safe, quoted_ok)
}

pub(crate) fn is_token(s: &str) -> bool {
    classify(s).0
}

/// First byte of `v`, or 0 when empty.
pub(crate) fn peek(v: &str) -> u8 {
    v.as_bytes().first().copied().unwrap_or(0)
}

pub(crate) fn skip_ws(v: &str) -> &str {
    v.trim_start_matches(|c| c == ' ' || c == '\t')
}

/// Advances past one character. Used to get unstuck on bytes no grammar
/// rule claims.
pub(crate) fn skip_one(v: &str) -> &str {
    let mut chars = v.chars();
    chars.next();
    chars.as_str()
}

/// Consumes bytes up to the next whitespace or delimiter. The item is
/// empty when `v` starts with a delimiter.
pub(crate) fn consume_item(v: &str) -> (&str, &str) {
    let end = v
        .as_bytes()
        .iter()
        .position(|&b| matches!(b, b' ' | b'\t' | b',' | b';' | b'='))
        .unwrap_or(v.len());
    v.split_at(end)
}

/// Consumes a `open`...`close` delimited section, honoring nested pairs
/// and `\X` escapes. When no backslash occurs before the closer the body
/// is borrowed from `v`. An unterminated section yields everything up to
/// the end of input.
pub(crate) fn consume_delimited(v: &str, open: u8, close: u8) -> (Cow<'_, str>, &str) {
    if peek(v) != open {
        return (Cow::Borrowed(""), v);
    }
    let body = &v[1..];
    let bytes = body.as_bytes();
    let mut depth = 0usize;
    let mut escaped = false;
    let mut i = 0;
    while let Some(at) = memchr::memchr3(b'\\', close, open, &bytes[i..]) {
        let at = i + at;
        match bytes[at] {
            b'\\' => {
                escaped = true;
                i = at + 2;
            }
            b if b == close => {
                if depth == 0 {
                    let lexeme = &body[..at];
                    let rest = &body[at + 1..];
                    return if escaped {
                        (Cow::Owned(unescape(lexeme)), rest)
                    } else {
                        (Cow::Borrowed(lexeme), rest)
                    };
                }
                depth -= 1;
                i = at + 1;
            }
            _ => {
                // `open`; only reachable when open != close
                depth += 1;
                i = at + 1;
            }
        }
        if i > bytes.len() {
            break;
        }
    }
    if escaped {
        (Cow::Owned(unescape(body)), "")
    } else {
        (Cow::Borrowed(body), "")
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(at) = rest.find('\\') {
        out.push_str(&rest[..at]);
        rest = &rest[at + 1..];
        if let Some(c) = rest.chars().next() {
            out.push(c);
            rest = &rest[c.len_utf8()..];
        }
    }
    out.push_str(rest);
    out
}

pub(crate) fn consume_quoted(v: &str) -> (Cow<'_, str>, &str) {
    consume_delimited(v, b'"', b'"')
}

pub(crate) fn consume_comment(v: &str) -> (Cow<'_, str>, &str) {
    consume_delimited(v, b'(', b')')
}

pub(crate) fn consume_item_or_quoted(v: &str) -> (Cow<'_, str>, &str) {
    if peek(v) == b'"' {
        consume_quoted(v)
    } else {
        let (item, rest) = consume_item(v);
        (Cow::Borrowed(item), rest)
    }
}

/// Writes `s` delimited by `open`/`close`, escaping the delimiters and
/// the backslash itself.
pub(crate) fn write_delimited<W: Write>(w: &mut W, s: &str, open: u8, close: u8) -> io::Result<()> {
    w.write_all(&[open])?;
    let mut rest = s.as_bytes();
    while let Some(at) = rest
        .iter()
        .position(|&b| b == open || b == close || b == b'\\')
    {
        w.write_all(&rest[..at])?;
        w.write_all(&[b'\\', rest[at]])?;
        rest = &rest[at + 1..];
    }
    w.write_all(rest)?;
    w.write_all(&[close])
}

/// Emits `s` bare when it is a valid token, quoted otherwise.
pub(crate) fn write_token_or_quoted<W: Write>(w: &mut W, s: &str) -> io::Result<()> {
    if is_token(s) {
        w.write_all(s.as_bytes())
    } else {
        write_delimited(w, s, b'"', b'"')
    }
}
