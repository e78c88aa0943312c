use std::collections::BTreeMap;
use std::io::{self, Write};

use crate::header::util::{consume_param, decode_values};
use crate::header::{RequestHeader, ResponseHeader};
use crate::syntax::{consume_item, peek, skip_one, skip_ws, write_delimited, write_token_or_quoted};

header! {
    /// `WWW-Authenticate` header, [RFC7235 Section 4.1]
    pub struct WwwAuthenticate(Vec<Auth>);
    (ResponseHeader);
    NAME = "WWW-Authenticate";
    SENSITIVE = false;
    parse(s, _base) {
        parse_challenge_list(s).map(Into::into)
    }
    serialize(self, w) {
        write_challenges(w, &self.0)
    }
}

header! {
    /// `Proxy-Authenticate` header, [RFC7235 Section 4.3]
    pub struct ProxyAuthenticate(Vec<Auth>);
    (ResponseHeader);
    NAME = "Proxy-Authenticate";
    SENSITIVE = false;
    parse(s, _base) {
        parse_challenge_list(s).map(Into::into)
    }
    serialize(self, w) {
        write_challenges(w, &self.0)
    }
}

header! {
    /// `Authorization` header, [RFC7235 Section 4.2]
    pub struct Authorization(Auth);
    (RequestHeader);
    NAME = "Authorization";
    SENSITIVE = true;
    parse(s, _base) {
        parse_credentials(s).map(Into::into)
    }
    serialize(self, w) {
        write_auth(w, &self.0, true)
    }
}

header! {
    /// `Proxy-Authorization` header, [RFC7235 Section 4.4]
    pub struct ProxyAuthorization(Auth);
    (RequestHeader);
    NAME = "Proxy-Authorization";
    SENSITIVE = true;
    parse(s, _base) {
        parse_credentials(s).map(Into::into)
    }
    serialize(self, w) {
        write_auth(w, &self.0, true)
    }
}

/// One authentication challenge or credentials value.
///
/// A well-formed value carries either a `token68` blob or parameters,
/// never both. The scheme is stored lowercased; all-lowercase schemes
/// are re-spelled from the registry on output, any other casing is
/// emitted exactly as supplied.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Auth {
    pub scheme: String,
    pub token: Option<String>,
    pub realm: Option<String>,
    pub params: BTreeMap<String, String>,
}

impl Auth {
    pub fn new(scheme: &str) -> Auth {
        Auth {
            scheme: scheme.to_ascii_lowercase(),
            ..Auth::default()
        }
    }
}

/// Canonical spellings from the IANA HTTP Authentication Scheme
/// Registry.
const SCHEMES: [(&str, &str); 10] = [
    ("basic", "Basic"),
    ("bearer", "Bearer"),
    ("digest", "Digest"),
    ("hoba", "HOBA"),
    ("mutual", "Mutual"),
    ("negotiate", "Negotiate"),
    ("oauth", "OAuth"),
    ("scram-sha-1", "SCRAM-SHA-1"),
    ("scram-sha-256", "SCRAM-SHA-256"),
    ("vapid", "vapid"),
];

/// Digest parameters that are always sent quoted (RFC 7616). `qop` is
/// quoted in challenges only.
const ALWAYS_QUOTED: [&str; 7] = [
    "cnonce", "domain", "nonce", "opaque", "response", "uri", "username",
];

fn parse_challenge_list(s: &[Vec<u8>]) -> Option<Vec<Auth>> {
    if s.is_empty() {
        return None;
    }
    let values = decode_values(s);
    let joined = values.join(",");
    let mut v = joined.as_str();
    let mut out = Vec::new();
    loop {
        v = v.trim_start_matches(|c| c == ' ' || c == '\t' || c == ',');
        if v.is_empty() {
            break;
        }
        let (auth, rest) = parse_auth(v, true);
        if let Some(auth) = auth {
            out.push(auth);
        }
        v = rest;
    }
    Some(out)
}

fn parse_credentials(s: &[Vec<u8>]) -> Option<Auth> {
    let first = s.first()?;
    let text = String::from_utf8_lossy(first);
    let (auth, _) = parse_auth(skip_ws(&text), false);
    Some(auth.unwrap_or_default())
}

/// Consumes one scheme plus whatever follows it. In challenge mode a
/// comma is ambiguous: it separates parameters of the current challenge
/// when the bytes after it look like `name =`, and challenges
/// otherwise. In credentials mode commas always separate parameters.
fn parse_auth(v: &str, challenge: bool) -> (Option<Auth>, &str) {
    let (scheme, rest) = consume_item(v);
    if scheme.is_empty() {
        return (None, skip_one(v));
    }
    let mut auth = Auth::new(scheme);
    let mut v = rest;
    let mut have_params = false;
    loop {
        v = skip_ws(v);
        if v.is_empty() {
            break;
        }
        if peek(v) == b',' {
            if challenge {
                let after = v.trim_start_matches(|c| c == ' ' || c == '\t' || c == ',');
                let (item, lookahead) = consume_item(after);
                if item.is_empty() || peek(skip_ws(lookahead)) != b'=' {
                    return (Some(auth), after);
                }
                v = after;
            } else {
                v = skip_one(v);
                continue;
            }
        }
        if !have_params && auth.token.is_none() {
            if let Some((token, rest)) = try_token68(v) {
                auth.token = Some(token);
                return (Some(auth), rest);
            }
        }
        let before = v.len();
        let (name, value, rest) = consume_param(v);
        v = rest;
        if name.is_empty() && value.is_empty() && v.len() == before {
            v = skip_one(v);
            continue;
        }
        if name == "realm" {
            auth.realm = Some(value);
        } else if !name.is_empty() {
            auth.params.insert(name, value);
        }
        have_params = true;
    }
    (Some(auth), v)
}

/// Recognizes a `token68` blob: base64-ish bytes, optional `=` padding,
/// and nothing but whitespace before the next comma or the end.
fn try_token68(v: &str) -> Option<(String, &str)> {
    let (item, rest) = consume_item(v);
    if item.is_empty() || !item.bytes().all(is_token68_byte) {
        return None;
    }
    let unpadded = rest.trim_start_matches('=');
    let padding = rest.len() - unpadded.len();
    let after = skip_ws(unpadded);
    if !matches!(peek(after), 0 | b',') {
        return None;
    }
    let mut token = String::with_capacity(item.len() + padding);
    token.push_str(item);
    token.push_str(&rest[..padding]);
    Some((token, after))
}

fn is_token68_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'~' | b'+' | b'/' | b'-')
}

fn canonical_scheme(scheme: &str) -> &str {
    if scheme.bytes().any(|b| b.is_ascii_uppercase()) {
        return scheme;
    }
    SCHEMES
        .iter()
        .find(|(lower, _)| *lower == scheme)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(scheme)
}

fn write_auth<W: Write>(w: &mut W, auth: &Auth, credentials: bool) -> io::Result<()> {
    w.write_all(canonical_scheme(&auth.scheme).as_bytes())?;
    if let Some(token) = &auth.token {
        return write!(w, " {token}");
    }
    let mut first = true;
    let mut sep = |w: &mut W| -> io::Result<()> {
        if std::mem::take(&mut first) {
            w.write_all(b" ")
        } else {
            w.write_all(b", ")
        }
    };
    if let Some(realm) = &auth.realm {
        sep(w)?;
        w.write_all(b"realm=")?;
        write_delimited(w, realm, b'"', b'"')?;
    }
    for (name, value) in &auth.params {
        sep(w)?;
        write!(w, "{name}=")?;
        if ALWAYS_QUOTED.contains(&name.as_str()) || (name == "qop" && !credentials) {
            write_delimited(w, value, b'"', b'"')?;
        } else if name == "qop" {
            w.write_all(value.as_bytes())?;
        } else {
            write_token_or_quoted(w, value)?;
        }
    }
    Ok(())
}

fn write_challenges<W: Write>(w: &mut W, challenges: &[Auth]) -> io::Result<()> {
    for (i, auth) in challenges.iter().enumerate() {
        if i != 0 {
            w.write_all(b", ")?;
        }
        write_auth(w, auth, false)?;
    }
    Ok(())
}
