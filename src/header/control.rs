use std::collections::BTreeMap;
use std::io::{self, Write};
use std::time::SystemTime;

use httpdate::{fmt_http_date, parse_http_date};

use crate::header::util::{
    canonical_name, consume_agent, consume_param, decode_values, write_list, Elems,
};
use crate::header::{RequestHeader, ResponseHeader};
use crate::syntax::{consume_quoted, peek, skip_ws, write_delimited, write_token_or_quoted};

header! {
    /// `Vary` header, [RFC7231 Section 7.1.4]
    ///
    /// Field names are folded to their canonical form; `*` passes
    /// through unchanged.
    pub struct Vary(Vec<String>);
    (ResponseHeader);
    NAME = "Vary";
    SENSITIVE = false;
    parse(s, _base) {
        parse_vary(s).map(Into::into)
    }
    serialize(self, w) {
        write_list(w, &self.0)
    }
}

header! {
    /// `Cache-Control` header, [RFC7234 Section 5.2]
    pub struct CacheControl(CacheDirectives);
    (RequestHeader ResponseHeader);
    NAME = "Cache-Control";
    SENSITIVE = false;
    parse(s, _base) {
        parse_directives(s).map(Into::into)
    }
    serialize(self, w) {
        write_directives(w, &self.0)
    }
}

header! {
    /// `Warning` header, [RFC7234 Section 5.5]
    pub struct Warning(Vec<WarningElem>);
    (ResponseHeader);
    NAME = "Warning";
    SENSITIVE = false;
    parse(s, _base) {
        parse_warnings(s).map(Into::into)
    }
    serialize(self, w) {
        write_warnings(w, &self.0)
    }
}

/// Cache response directives, including the RFC 5861 and RFC 8246
/// extensions. Unknown directives land in `ext`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheDirectives {
    pub no_store: bool,
    pub no_transform: bool,
    pub only_if_cached: bool,
    pub must_revalidate: bool,
    pub public: bool,
    pub proxy_revalidate: bool,
    pub immutable: bool,
    /// The argumentless form of `no-cache`.
    pub no_cache: bool,
    /// The argumentless form of `private`.
    pub private: bool,
    /// Header names from `no-cache="..."`, canonicalized.
    pub no_cache_headers: Vec<String>,
    /// Header names from `private="..."`, canonicalized.
    pub private_headers: Vec<String>,
    /// `None` when absent; zero is a meaningful value.
    pub max_age: Option<u64>,
    /// `None` when absent; zero is a meaningful value.
    pub s_maxage: Option<u64>,
    pub max_stale: MaxStale,
    /// Zero when absent.
    pub min_fresh: u64,
    /// Zero when absent.
    pub stale_while_revalidate: u64,
    /// Zero when absent.
    pub stale_if_error: u64,
    pub ext: BTreeMap<String, String>,
}

/// The `max-stale` directive: absent, the argumentless "any staleness"
/// form, or a bound in seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MaxStale {
    #[default]
    Absent,
    Forever,
    Seconds(u64),
}

/// One element of the `Warning` header.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WarningElem {
    pub code: u16,
    /// The warn-agent. An empty agent serializes as `-`.
    pub agent: String,
    pub text: String,
    /// Kept only when the trailing warn-date parses.
    pub date: Option<SystemTime>,
}

fn parse_vary(s: &[Vec<u8>]) -> Option<Vec<String>> {
    if s.is_empty() {
        return None;
    }
    let values = decode_values(s);
    let mut elems = Elems::new(&values);
    let mut names = Vec::new();
    while let Some(v) = elems.next_elem() {
        let (item, rest) = crate::syntax::consume_item(v);
        if !item.is_empty() {
            names.push(canonical_name(item));
        }
        elems.finish(rest);
    }
    Some(names)
}

fn parse_directives(s: &[Vec<u8>]) -> Option<CacheDirectives> {
    if s.is_empty() {
        return None;
    }
    let values = decode_values(s);
    let mut elems = Elems::new(&values);
    let mut d = CacheDirectives::default();
    while let Some(v) = elems.next_elem() {
        let (name, value, rest) = consume_param(v);
        match name.as_str() {
            "no-store" => d.no_store = true,
            "no-transform" => d.no_transform = true,
            "only-if-cached" => d.only_if_cached = true,
            "must-revalidate" => d.must_revalidate = true,
            "public" => d.public = true,
            "proxy-revalidate" => d.proxy_revalidate = true,
            "immutable" => d.immutable = true,
            "no-cache" => {
                if value.is_empty() {
                    d.no_cache = true;
                } else {
                    d.no_cache_headers.extend(header_names(&value));
                }
            }
            "private" => {
                if value.is_empty() {
                    d.private = true;
                } else {
                    d.private_headers.extend(header_names(&value));
                }
            }
            "max-age" => d.max_age = value.parse().ok().or(d.max_age),
            "s-maxage" => d.s_maxage = value.parse().ok().or(d.s_maxage),
            "max-stale" => {
                d.max_stale = match value.parse() {
                    Ok(n) => MaxStale::Seconds(n),
                    Err(_) => MaxStale::Forever,
                }
            }
            "min-fresh" => d.min_fresh = value.parse().unwrap_or(0),
            "stale-while-revalidate" => d.stale_while_revalidate = value.parse().unwrap_or(0),
            "stale-if-error" => d.stale_if_error = value.parse().unwrap_or(0),
            "" => {}
            _ => {
                d.ext.insert(name, value);
            }
        }
        elems.finish(rest);
    }
    Some(d)
}

fn header_names(list: &str) -> Vec<String> {
    list.split(|c| c == ',' || c == ' ' || c == '\t')
        .filter(|name| !name.is_empty())
        .map(canonical_name)
        .collect()
}

fn write_directives<W: Write>(w: &mut W, d: &CacheDirectives) -> io::Result<()> {
    let mut first = true;
    let mut put = |w: &mut W, text: &str| -> io::Result<()> {
        if !std::mem::take(&mut first) {
            w.write_all(b", ")?;
        }
        w.write_all(text.as_bytes())
    };

    for (on, name) in [
        (d.no_store, "no-store"),
        (d.no_transform, "no-transform"),
        (d.only_if_cached, "only-if-cached"),
        (d.must_revalidate, "must-revalidate"),
        (d.public, "public"),
        (d.proxy_revalidate, "proxy-revalidate"),
        (d.immutable, "immutable"),
    ] {
        if on {
            put(w, name)?;
        }
    }
    if !d.private_headers.is_empty() {
        put(w, &format!("private=\"{}\"", d.private_headers.join(",")))?;
    } else if d.private {
        put(w, "private")?;
    }
    if !d.no_cache_headers.is_empty() {
        put(w, &format!("no-cache=\"{}\"", d.no_cache_headers.join(",")))?;
    } else if d.no_cache {
        put(w, "no-cache")?;
    }
    if let Some(age) = d.max_age {
        put(w, &format!("max-age={age}"))?;
    }
    if let Some(age) = d.s_maxage {
        put(w, &format!("s-maxage={age}"))?;
    }
    match d.max_stale {
        MaxStale::Absent => {}
        MaxStale::Forever => put(w, "max-stale")?,
        MaxStale::Seconds(n) => put(w, &format!("max-stale={n}"))?,
    }
    for (n, name) in [
        (d.min_fresh, "min-fresh"),
        (d.stale_while_revalidate, "stale-while-revalidate"),
        (d.stale_if_error, "stale-if-error"),
    ] {
        if n > 0 {
            put(w, &format!("{name}={n}"))?;
        }
    }
    for (name, value) in &d.ext {
        put(w, name)?;
        if !value.is_empty() {
            w.write_all(b"=")?;
            write_token_or_quoted(w, value)?;
        }
    }
    Ok(())
}

fn parse_warnings(s: &[Vec<u8>]) -> Option<Vec<WarningElem>> {
    if s.is_empty() {
        return None;
    }
    let values = decode_values(s);
    let mut elems = Elems::new(&values);
    let mut warnings = Vec::new();
    while let Some(v) = elems.next_elem() {
        let (item, rest) = crate::syntax::consume_item(v);
        let code = item.parse().unwrap_or(0);
        let v = skip_ws(rest);
        let (agent, rest) = consume_agent(v);
        let mut v = skip_ws(rest);
        let mut text = String::new();
        if peek(v) == b'"' {
            let (quoted, rest) = consume_quoted(v);
            text = quoted.into_owned();
            v = rest;
        }
        let mut date = None;
        let after = skip_ws(v);
        if peek(after) == b'"' {
            let (quoted, rest) = consume_quoted(after);
            if let Ok(instant) = parse_http_date(&quoted) {
                date = Some(instant);
            }
            v = rest;
        }
        warnings.push(WarningElem {
            code,
            agent,
            text,
            date,
        });
        elems.finish(v);
    }
    Some(warnings)
}

fn write_warnings<W: Write>(w: &mut W, warnings: &[WarningElem]) -> io::Result<()> {
    for (i, warning) in warnings.iter().enumerate() {
        if i != 0 {
            w.write_all(b", ")?;
        }
        let agent = if warning.agent.is_empty() {
            "-"
        } else {
            &warning.agent
        };
        write!(w, "{} {agent} ", warning.code)?;
        write_delimited(w, &warning.text, b'"', b'"')?;
        if let Some(date) = warning.date {
            write!(w, " \"{}\"", fmt_http_date(date))?;
        }
    }
    Ok(())
}
