use std::collections::BTreeMap;
use std::io::{self, Write};

use url::Url;

use crate::extvalue::{decode_ext_value, write_variform};
use crate::header::util::{consume_param, decode_values, write_param, Elems};
use crate::header::{RequestHeader, ResponseHeader};
use crate::syntax::{peek, skip_ws, write_delimited, write_token_or_quoted};

header! {
    /// `Link` header, [RFC8288]
    ///
    /// An element whose `rel` names several relation types is exploded
    /// into one [`LinkElem`] per relation, so every element in the
    /// parsed list has exactly one relation type.
    pub struct Link(Vec<LinkElem>);
    (RequestHeader ResponseHeader);
    NAME = "Link";
    SENSITIVE = false;
    parse(s, base) {
        parse_link(s, base).map(Into::into)
    }
    serialize(self, w) {
        write_link(w, &self.0)
    }
}

/// One web link. Target and anchor are resolved against the base URL
/// given at parse time.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LinkElem {
    pub target: Url,
    /// Exactly one relation type, lowercased.
    pub rel: String,
    pub anchor: Option<Url>,
    pub media: String,
    pub title: String,
    /// The `type` parameter, lowercased.
    pub media_type: String,
    /// Lowercased.
    pub hreflang: Vec<String>,
    /// Extension parameters. Starred names are decoded at parse time
    /// and stored under their plain name.
    pub ext: BTreeMap<String, String>,
}

impl LinkElem {
    pub fn new(target: Url, rel: &str) -> LinkElem {
        LinkElem {
            target,
            rel: rel.to_ascii_lowercase(),
            anchor: None,
            media: String::new(),
            title: String::new(),
            media_type: String::new(),
            hreflang: Vec::new(),
            ext: BTreeMap::new(),
        }
    }
}

const STANDARD: [&str; 6] = ["rel", "anchor", "media", "title", "type", "hreflang"];

fn parse_link(s: &[Vec<u8>], base: &Url) -> Option<Vec<LinkElem>> {
    if s.is_empty() {
        return None;
    }
    let values = decode_values(s);
    let mut elems = Elems::new(&values);
    let mut out = Vec::new();
    while let Some(v) = elems.next_elem() {
        let rest = parse_link_elem(v, base, &mut out);
        elems.finish(rest);
    }
    Some(out)
}

/// Parses one element into zero or more links. Elements are dropped
/// whole when the target is missing or does not resolve, when the
/// anchor does not resolve, or when no relation type is given.
fn parse_link_elem<'a>(v: &'a str, base: &Url, out: &mut Vec<LinkElem>) -> &'a str {
    if peek(v) != b'<' {
        return v;
    }
    let Some(end) = v.find('>') else {
        return "";
    };
    let raw_target = &v[1..end];
    let mut v = &v[end + 1..];

    let mut rel: Option<String> = None;
    let mut anchor: Option<String> = None;
    let mut media: Option<String> = None;
    let mut title: Option<String> = None;
    // Outer layer: a `title*` was seen; inner: it decoded.
    let mut title_star: Option<Option<String>> = None;
    let mut media_type: Option<String> = None;
    let mut hreflang: Vec<String> = Vec::new();
    let mut ext: BTreeMap<String, String> = BTreeMap::new();
    let mut ext_star: BTreeMap<String, String> = BTreeMap::new();

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
        match name.as_str() {
            "rel" => {
                rel.get_or_insert(value);
            }
            "anchor" => {
                anchor.get_or_insert(value);
            }
            "media" => {
                media.get_or_insert(value);
            }
            "title" => {
                title.get_or_insert(value);
            }
            "title*" => {
                if title_star.is_none() {
                    title_star = Some(decode_ext_value(&value).ok().map(|(text, _)| text));
                }
            }
            "type" => {
                media_type.get_or_insert(value.to_ascii_lowercase());
            }
            "hreflang" => hreflang.push(value.to_ascii_lowercase()),
            // rev is obsolete and dropped on the floor.
            "rev" => {}
            "" => {}
            _ => {
                if let Some(stripped) = name.strip_suffix('*') {
                    if !ext_star.contains_key(stripped) {
                        if let Ok((text, _)) = decode_ext_value(&value) {
                            ext_star.insert(stripped.to_owned(), text);
                        }
                    }
                } else {
                    ext.entry(name).or_insert(value);
                }
            }
        }
    }

    let Ok(target) = base.join(raw_target) else {
        return v;
    };
    let anchor = match anchor {
        Some(raw) => match base.join(&raw) {
            Ok(url) => Some(url),
            Err(_) => return v,
        },
        None => None,
    };
    for (name, value) in ext_star {
        ext.insert(name, value);
    }
    let title = title_star.flatten().or(title).unwrap_or_default();
    let rel = rel.unwrap_or_default().to_ascii_lowercase();
    for one_rel in rel.split_whitespace() {
        out.push(LinkElem {
            target: target.clone(),
            rel: one_rel.to_owned(),
            anchor: anchor.clone(),
            media: media.clone().unwrap_or_default(),
            title: title.clone(),
            media_type: media_type.clone().unwrap_or_default(),
            hreflang: hreflang.clone(),
            ext: ext.clone(),
        });
    }
    v
}

fn write_link<W: Write>(w: &mut W, elems: &[LinkElem]) -> io::Result<()> {
    for (i, elem) in elems.iter().enumerate() {
        if i != 0 {
            w.write_all(b", ")?;
        }
        write!(w, "<{}>", elem.target)?;
        w.write_all(b"; rel=")?;
        write_token_or_quoted(w, &elem.rel)?;
        if let Some(anchor) = &elem.anchor {
            w.write_all(b"; anchor=")?;
            write_delimited(w, anchor.as_str(), b'"', b'"')?;
        }
        if !elem.media.is_empty() {
            write_param(w, "media", &elem.media)?;
        }
        if !elem.title.is_empty() {
            write_variform(w, "title", &elem.title)?;
        }
        if !elem.media_type.is_empty() {
            write_param(w, "type", &elem.media_type)?;
        }
        for lang in &elem.hreflang {
            write_param(w, "hreflang", lang)?;
        }
        for (name, value) in &elem.ext {
            let name = name.strip_suffix('*').unwrap_or(name);
            if STANDARD.contains(&name) {
                continue;
            }
            write_variform(w, name, value)?;
        }
    }
    Ok(())
}
