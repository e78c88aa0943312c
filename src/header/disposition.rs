use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::extvalue::{decode_ext_value, write_variform};
use crate::header::util::consume_param;
use crate::header::ResponseHeader;
use crate::syntax::{consume_item, peek, skip_ws};

header! {
    /// `Content-Disposition` header, [RFC6266]
    pub struct ContentDisposition(Disposition);
    (ResponseHeader);
    NAME = "Content-Disposition";
    SENSITIVE = false;
    parse(s, _base) {
        let first = s.first()?;
        Some(parse_disposition(&String::from_utf8_lossy(first)).into())
    }
    serialize(self, w) {
        write_disposition(w, &self.0)
    }
}

/// A parsed disposition: the type, the effective filename, and any
/// other parameters.
///
/// `filename*` in the RFC 8187 form, when it decodes, overrides a plain
/// `filename`; the same starred-overrides-plain rule applies to every
/// other parameter pair. A starred parameter that fails to decode is
/// dropped in favor of its plain sibling, or entirely when there is
/// none.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Disposition {
    /// Lowercased, typically `inline` or `attachment`.
    pub dtype: String,
    /// Empty when no usable filename was given.
    pub filename: String,
    /// Parameters other than the filename, starred forms decoded.
    pub params: BTreeMap<String, String>,
}

impl Disposition {
    pub fn attachment(filename: &str) -> Disposition {
        Disposition {
            dtype: "attachment".to_owned(),
            filename: filename.to_owned(),
            params: BTreeMap::new(),
        }
    }
}

fn parse_disposition(v: &str) -> Disposition {
    let v = skip_ws(v);
    let (item, mut v) = consume_item(v);
    let dtype = item.to_ascii_lowercase();

    let mut plain: BTreeMap<String, String> = BTreeMap::new();
    let mut starred: BTreeMap<String, String> = BTreeMap::new();
    loop {
        v = skip_ws(v);
        if peek(v) != b';' {
            break;
        }
        v = skip_ws(&v[1..]);
        if matches!(peek(v), 0 | b';' | b',') {
            continue;
        }
        let (name, value, rest) = consume_param(v);
        v = rest;
        if name.is_empty() {
            continue;
        }
        if let Some(stripped) = name.strip_suffix('*') {
            if !starred.contains_key(stripped) {
                if let Ok((text, _)) = decode_ext_value(&value) {
                    starred.insert(stripped.to_owned(), text);
                }
            }
        } else {
            plain.entry(name).or_insert(value);
        }
    }

    let mut params = plain;
    for (name, value) in starred {
        params.insert(name, value);
    }
    let filename = params.remove("filename").unwrap_or_default();
    Disposition {
        dtype,
        filename,
        params,
    }
}

fn write_disposition<W: Write>(w: &mut W, d: &Disposition) -> io::Result<()> {
    w.write_all(d.dtype.as_bytes())?;
    if !d.filename.is_empty() {
        write_variform(w, "filename", &d.filename)?;
    }
    for (name, value) in &d.params {
        let name = name.strip_suffix('*').unwrap_or(name);
        if name == "filename" {
            continue;
        }
        write_variform(w, name, value)?;
    }
    Ok(())
}
