use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::header::util::{consume_param, consume_params, decode_values, write_param, Elems};
use crate::header::{RequestHeader, ResponseHeader};
use crate::syntax::write_token_or_quoted;

header! {
    /// `Prefer` header, [RFC7240]
    ///
    /// Keyed by the lowercased preference name. Only the first
    /// occurrence of a name counts; repetitions are discarded.
    pub struct Prefer(BTreeMap<String, Pref>);
    (RequestHeader);
    NAME = "Prefer";
    SENSITIVE = false;
    parse(s, _base) {
        parse_prefer(s).map(Into::into)
    }
    serialize(self, w) {
        write_prefer(w, &self.0)
    }
}

header! {
    /// `Preference-Applied` header, [RFC7240 Section 3]
    ///
    /// Same first-occurrence-wins rule as `Prefer`, without parameters.
    pub struct PreferenceApplied(BTreeMap<String, String>);
    (ResponseHeader);
    NAME = "Preference-Applied";
    SENSITIVE = false;
    parse(s, _base) {
        parse_applied(s).map(Into::into)
    }
    serialize(self, w) {
        write_applied(w, &self.0)
    }
}

/// The value and parameters of one preference.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pref {
    pub value: String,
    pub params: BTreeMap<String, String>,
}

impl Pref {
    pub fn new(value: &str) -> Pref {
        Pref {
            value: value.to_owned(),
            params: BTreeMap::new(),
        }
    }
}

/// Preferences whose values are defined case-insensitive; they are
/// folded to lowercase on both parse and serialize.
fn fold_value(name: &str, value: &mut String) {
    if name == "handling" || name == "return" {
        value.make_ascii_lowercase();
    }
}

fn parse_prefer(s: &[Vec<u8>]) -> Option<BTreeMap<String, Pref>> {
    if s.is_empty() {
        return None;
    }
    let values = decode_values(s);
    let mut elems = Elems::new(&values);
    let mut prefs = BTreeMap::new();
    while let Some(v) = elems.next_elem() {
        let (name, mut value, rest) = consume_param(v);
        let (params, rest) = consume_params(rest);
        if !name.is_empty() && !prefs.contains_key(&name) {
            fold_value(&name, &mut value);
            prefs.insert(name, Pref { value, params });
        }
        elems.finish(rest);
    }
    Some(prefs)
}

fn parse_applied(s: &[Vec<u8>]) -> Option<BTreeMap<String, String>> {
    if s.is_empty() {
        return None;
    }
    let values = decode_values(s);
    let mut elems = Elems::new(&values);
    let mut prefs = BTreeMap::new();
    while let Some(v) = elems.next_elem() {
        let (name, mut value, rest) = consume_param(v);
        if !name.is_empty() && !prefs.contains_key(&name) {
            fold_value(&name, &mut value);
            prefs.insert(name, value);
        }
        elems.finish(rest);
    }
    Some(prefs)
}

fn write_prefer<W: Write>(w: &mut W, prefs: &BTreeMap<String, Pref>) -> io::Result<()> {
    for (i, (name, pref)) in prefs.iter().enumerate() {
        if i != 0 {
            w.write_all(b", ")?;
        }
        w.write_all(name.as_bytes())?;
        let mut value = pref.value.clone();
        fold_value(name, &mut value);
        if !value.is_empty() {
            w.write_all(b"=")?;
            write_token_or_quoted(w, &value)?;
        }
        for (param, param_value) in &pref.params {
            write_param(w, param, param_value)?;
        }
    }
    Ok(())
}

fn write_applied<W: Write>(w: &mut W, prefs: &BTreeMap<String, String>) -> io::Result<()> {
    for (i, (name, value)) in prefs.iter().enumerate() {
        if i != 0 {
            w.write_all(b", ")?;
        }
        w.write_all(name.as_bytes())?;
        let mut value = value.clone();
        fold_value(name, &mut value);
        if !value.is_empty() {
            w.write_all(b"=")?;
            write_token_or_quoted(w, &value)?;
        }
    }
    Ok(())
}
