//! RFC 8187 extended values (`charset'lang'pct-encoded`) and the
//! three-way attribute writer built on top of them.

use std::io::{self, Write};

use thiserror::Error;

use crate::syntax::{classify, is_attr_char, write_delimited};

/// Why an extended value could not be decoded. Callers never surface
/// this; it only selects the fallback representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub(crate) enum ExtValueError {
    #[error("missing apostrophe")]
    MissingApostrophe,
    #[error("unsupported charset")]
    UnsupportedCharset,
    #[error("bad percent encoding")]
    BadPercent,
}

/// Decodes `charset'lang'pct-encoded` into `(text, lang)`. Only the
/// UTF-8 charset is supported; the decoded bytes themselves are not
/// validated, so stray escapes decode to replacement characters rather
/// than failing.
pub(crate) fn decode_ext_value(s: &str) -> Result<(String, String), ExtValueError> {
    let (charset, rest) = s.split_once('\'').ok_or(ExtValueError::MissingApostrophe)?;
    let (lang, encoded) = rest.split_once('\'').ok_or(ExtValueError::MissingApostrophe)?;
    if !charset.eq_ignore_ascii_case("utf-8") {
        return Err(ExtValueError::UnsupportedCharset);
    }
    let bytes = pct_decode(encoded)?;
    Ok((
        String::from_utf8_lossy(&bytes).into_owned(),
        lang.to_owned(),
    ))
}

fn pct_decode(s: &str) -> Result<Vec<u8>, ExtValueError> {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hi = bytes.get(i + 1).and_then(|&b| hex_val(b));
            let lo = bytes.get(i + 2).and_then(|&b| hex_val(b));
            match (hi, lo) {
                (Some(hi), Some(lo)) => {
                    out.push(hi << 4 | lo);
                    i += 3;
                }
                _ => return Err(ExtValueError::BadPercent),
            }
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    Ok(out)
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Encodes `text` (with an optional language tag) as an extended value.
pub(crate) fn write_ext_value<W: Write>(w: &mut W, text: &str, lang: &str) -> io::Result<()> {
    const HEX: &[u8; 16] = b"0123456789ABCDEF";
    write!(w, "UTF-8'{lang}'")?;
    for &b in text.as_bytes() {
        if is_attr_char(b) {
            w.write_all(&[b])?;
        } else {
            w.write_all(&[b'%', HEX[(b >> 4) as usize], HEX[(b & 0xf) as usize]])?;
        }
    }
    Ok(())
}

/// Writes `; name=value` in whichever form the value's bytes permit:
/// bare token, quoted string, or extended value. Values a naive
/// recipient could still read from a quoted string get that form too,
/// after the extended one. `title` is always quoted, never bare.
pub(crate) fn write_variform<W: Write>(w: &mut W, name: &str, value: &str) -> io::Result<()> {
    let (token_ok, quoted_safe, quoted_ok) = classify(value);
    if token_ok && name != "title" {
        return write!(w, "; {name}={value}");
    }
    if token_ok || quoted_safe {
        write!(w, "; {name}=")?;
        return write_delimited(w, value, b'"', b'"');
    }
    write!(w, "; {name}*=")?;
    write_ext_value(w, value, "")?;
    if quoted_ok {
        write!(w, "; {name}=")?;
        write_delimited(w, value, b'"', b'"')?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_euro_rates() {
        let (text, lang) = decode_ext_value("utf-8''%e2%82%ac%20rates").unwrap();
        assert_eq!(text, "\u{20ac} rates");
        assert_eq!(lang, "");
    }

    #[test]
    fn decodes_with_language() {
        let (text, lang) = decode_ext_value("UTF-8'en'%C2%A3%20and%20%E2%82%AC%20rates").unwrap();
        assert_eq!(text, "\u{a3} and \u{20ac} rates");
        assert_eq!(lang, "en");
    }

    #[test]
    fn rejects_other_charsets() {
        assert_eq!(
            decode_ext_value("iso-8859-1'en'%A3%20rates"),
            Err(ExtValueError::UnsupportedCharset)
        );
    }

    #[test]
    fn rejects_malformed() {
        assert_eq!(
            decode_ext_value("no-apostrophes"),
            Err(ExtValueError::MissingApostrophe)
        );
        assert_eq!(decode_ext_value("UTF-8'"), Err(ExtValueError::MissingApostrophe));
        assert_eq!(decode_ext_value("UTF-8''%zz"), Err(ExtValueError::BadPercent));
        assert_eq!(decode_ext_value("UTF-8''%e2%8"), Err(ExtValueError::BadPercent));
    }

    #[test]
    fn encode_decode_roundtrip() {
        for (text, lang) in [
            ("R\u{e9}sum\u{e9}.docx", ""),
            ("\u{20ac} rates", "en"),
            ("plain", ""),
            ("percent % sign", ""),
            ("", ""),
        ] {
            let mut buf = Vec::new();
            write_ext_value(&mut buf, text, lang).unwrap();
            let encoded = String::from_utf8(buf).unwrap();
            assert_eq!(decode_ext_value(&encoded).unwrap(), (text.to_owned(), lang.to_owned()));
        }
    }

    #[test]
    fn variform_picks_form() {
        let render = |name: &str, value: &str| {
            let mut buf = Vec::new();
            write_variform(&mut buf, name, value).unwrap();
            String::from_utf8(buf).unwrap()
        };
        assert_eq!(render("name", "token"), "; name=token");
        assert_eq!(render("title", "token"), r#"; title="token""#);
        assert_eq!(render("name", "two words"), r#"; name="two words""#);
        assert_eq!(
            render("filename", "R\u{e9}sum\u{e9}.docx"),
            "; filename*=UTF-8''R%C3%A9sum%C3%A9.docx"
        );
        // Representable in a quoted string, so both forms are offered.
        assert_eq!(render("name", "a,b"), r#"; name*=UTF-8''a%2Cb; name="a,b""#);
    }
}
