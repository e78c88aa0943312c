//! Shared plumbing for the header codecs: element iteration across
//! field instances, the parameter layer, and list serialization.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::io::{self, Write};

use crate::syntax::{
    consume_item, consume_item_or_quoted, consume_quoted, peek, skip_one, skip_ws,
    write_token_or_quoted,
};

/// Decodes the raw field instances for lexing. Invalid UTF-8 is
/// replaced with U+FFFD REPLACEMENT CHARACTER.
pub(crate) fn decode_values(values: &[Vec<u8>]) -> Vec<Cow<'_, str>> {
    values.iter().map(|v| String::from_utf8_lossy(v)).collect()
}

/// Cursor over the non-empty comma-separated elements of a field,
/// across all its instances.
///
/// [`Elems::next_elem`] yields the text from the start of the next
/// element to the end of its instance; the caller consumes a prefix and
/// returns the rest through [`Elems::finish`]. Elements never span
/// instances, but the list they form does.
pub(crate) struct Elems<'a> {
    cur: &'a str,
    rest: std::slice::Iter<'a, Cow<'a, str>>,
}

impl<'a> Elems<'a> {
    pub(crate) fn new(values: &'a [Cow<'a, str>]) -> Elems<'a> {
        Elems {
            cur: "",
            rest: values.iter(),
        }
    }

    pub(crate) fn next_elem(&mut self) -> Option<&'a str> {
        loop {
            self.cur = self
                .cur
                .trim_start_matches(|c| c == ' ' || c == '\t' || c == ',');
            if !self.cur.is_empty() {
                return Some(self.cur);
            }
            self.cur = self.rest.next()?.as_ref();
        }
    }

    /// Hands the unconsumed remainder of the current element back.
    /// Anything before the next top-level comma did not match the
    /// element grammar and is discarded, skipping quoted strings as
    /// units, so iteration always makes progress.
    pub(crate) fn finish(&mut self, rest: &'a str) {
        self.cur = skip_junk(rest);
    }
}

fn skip_junk(mut v: &str) -> &str {
    loop {
        match peek(v) {
            0 | b',' => return v,
            b'"' => v = consume_quoted(v).1,
            _ => v = skip_one(v),
        }
    }
}

/// Consumes a received-by / warn-agent identifier: a plain item, or a
/// bracketed IPv6 literal followed by an optional `:port` tail.
pub(crate) fn consume_agent(v: &str) -> (String, &str) {
    if peek(v) == b'[' {
        let bound = v
            .as_bytes()
            .iter()
            .position(|&b| matches!(b, b' ' | b'\t' | b','))
            .unwrap_or(v.len());
        if let Some(at) = v[..bound].find(']') {
            let (tail, rest) = consume_item(&v[at + 1..]);
            let mut agent = String::with_capacity(at + 1 + tail.len());
            agent.push_str(&v[..=at]);
            agent.push_str(tail);
            return (agent, rest);
        }
    }
    let (item, rest) = consume_item(v);
    (item.to_owned(), rest)
}

/// Consumes one `name` or `name=value` parameter. The name is
/// lowercased; a missing value comes back empty.
pub(crate) fn consume_param(v: &str) -> (String, String, &str) {
    let (item, rest) = consume_item(v);
    let name = item.to_ascii_lowercase();
    let mut v = skip_ws(rest);
    let mut value = String::new();
    if peek(v) == b'=' {
        v = skip_ws(&v[1..]);
        let (val, rest) = consume_item_or_quoted(v);
        value = val.into_owned();
        v = rest;
    }
    (name, value, v)
}

/// Consumes a `;`-led parameter list. Empty parameters (`;;`) are
/// tolerated and skipped.
pub(crate) fn consume_params(v: &str) -> (BTreeMap<String, String>, &str) {
    let mut params = BTreeMap::new();
    let mut v = v;
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
        params.insert(name, value);
    }
    (params, v)
}

/// Writes `; name` or `; name=value`, quoting the value when it is not
/// a token.
pub(crate) fn write_param<W: Write>(w: &mut W, name: &str, value: &str) -> io::Result<()> {
    write!(w, "; {name}")?;
    if value.is_empty() {
        return Ok(());
    }
    w.write_all(b"=")?;
    write_token_or_quoted(w, value)
}

/// Folds a header name to its canonical Camel-Case-With-Dashes form.
pub(crate) fn canonical_name(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c == '-' {
            at_word_start = true;
            out.push('-');
        } else if at_word_start {
            out.extend(c.to_uppercase());
            at_word_start = false;
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

pub(crate) fn write_list<W, T>(w: &mut W, values: &[T]) -> io::Result<()>
where
    W: Write,
    T: Display,
{
    for (i, v) in values.iter().enumerate() {
        if i != 0 {
            w.write_all(b", ")?;
        }
        write!(w, "{v}")?;
    }
    Ok(())
}
