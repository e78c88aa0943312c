use std::collections::BTreeMap;
use std::io::{self, Write};
use std::net::IpAddr;

use crate::header::util::{consume_agent, consume_param, decode_values, Elems};
use crate::header::{RequestHeader, ResponseHeader};
use crate::syntax::{
    consume_comment, consume_item, peek, skip_ws, write_delimited, write_token_or_quoted,
};

header! {
    /// `Via` header, [RFC7230 Section 5.7.1]
    pub struct Via(Vec<ViaElem>);
    (RequestHeader ResponseHeader);
    NAME = "Via";
    SENSITIVE = false;
    parse(s, _base) {
        parse_via(s).map(Into::into)
    }
    serialize(self, w) {
        write_via(w, &self.0)
    }
}

header! {
    /// `Forwarded` header, [RFC7239]
    pub struct Forwarded(Vec<ForwardedElem>);
    (RequestHeader);
    NAME = "Forwarded";
    SENSITIVE = false;
    parse(s, _base) {
        parse_forwarded(s).map(Into::into)
    }
    serialize(self, w) {
        write_forwarded(w, &self.0)
    }
}

/// One intermediary from the `Via` header.
///
/// `received_by` is captured as one item (or a bracketed IPv6 literal
/// with its port tail). A bare registered name containing `,`, `;` or
/// `=` is truncated at the first such byte; this matches long-standing
/// behavior and is left as is.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViaElem {
    /// Always carries the protocol name: a bare `1.1` on the wire is
    /// stored as `HTTP/1.1`. The `HTTP/` prefix is dropped again when
    /// serializing.
    pub received_proto: String,
    pub received_by: String,
    pub comment: String,
}

/// One element of the `Forwarded` header. Unknown parameters are kept
/// in `ext`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ForwardedElem {
    pub forwarded_for: Node,
    pub by: Node,
    pub host: Option<String>,
    /// Lowercased.
    pub proto: Option<String>,
    pub ext: BTreeMap<String, String>,
}

/// An RFC 7239 node identifier: an IP with an optional port, either of
/// which may instead be an obfuscated `_`-prefixed label. The literal
/// `unknown` produces an empty node.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub ip: Option<IpAddr>,
    pub port: Option<u16>,
    pub obfuscated_node: Option<String>,
    pub obfuscated_port: Option<String>,
}

impl Node {
    pub fn is_empty(&self) -> bool {
        self.ip.is_none()
            && self.port.is_none()
            && self.obfuscated_node.is_none()
            && self.obfuscated_port.is_none()
    }
}

fn parse_via(s: &[Vec<u8>]) -> Option<Vec<ViaElem>> {
    if s.is_empty() {
        return None;
    }
    let values = decode_values(s);
    let mut elems = Elems::new(&values);
    let mut out = Vec::new();
    while let Some(v) = elems.next_elem() {
        let (proto, rest) = consume_item(v);
        let received_proto = if proto.contains('/') {
            proto.to_owned()
        } else {
            format!("HTTP/{proto}")
        };
        let v = skip_ws(rest);
        let (received_by, rest) = consume_agent(v);
        let mut v = skip_ws(rest);
        let mut comment = String::new();
        if peek(v) == b'(' {
            let (lexeme, rest) = consume_comment(v);
            comment = lexeme.into_owned();
            v = rest;
        }
        out.push(ViaElem {
            received_proto,
            received_by,
            comment,
        });
        elems.finish(v);
    }
    Some(out)
}

fn write_via<W: Write>(w: &mut W, elems: &[ViaElem]) -> io::Result<()> {
    for (i, elem) in elems.iter().enumerate() {
        if i != 0 {
            w.write_all(b", ")?;
        }
        let proto = elem
            .received_proto
            .strip_prefix("HTTP/")
            .unwrap_or(&elem.received_proto);
        write!(w, "{proto} {}", elem.received_by)?;
        if !elem.comment.is_empty() {
            w.write_all(b" ")?;
            write_delimited(w, &elem.comment, b'(', b')')?;
        }
    }
    Ok(())
}

fn parse_forwarded(s: &[Vec<u8>]) -> Option<Vec<ForwardedElem>> {
    if s.is_empty() {
        return None;
    }
    let values = decode_values(s);
    let mut elems = Elems::new(&values);
    let mut out = Vec::new();
    while let Some(v) = elems.next_elem() {
        let mut elem = ForwardedElem::default();
        let mut v = v;
        loop {
            let (name, value, rest) = consume_param(v);
            v = rest;
            match name.as_str() {
                "for" => elem.forwarded_for = parse_node(&value),
                "by" => elem.by = parse_node(&value),
                "host" => elem.host = Some(value),
                "proto" => elem.proto = Some(value.to_ascii_lowercase()),
                "" => {}
                _ => {
                    elem.ext.insert(name, value);
                }
            }
            v = skip_ws(v);
            if peek(v) != b';' {
                break;
            }
            v = skip_ws(&v[1..]);
            if matches!(peek(v), 0 | b',') {
                break;
            }
        }
        out.push(elem);
        elems.finish(v);
    }
    Some(out)
}

/// Splits a node identifier on the last `:` that is not part of a
/// bracketed IPv6 literal, then sorts each half into its plain or
/// obfuscated field.
fn parse_node(s: &str) -> Node {
    let mut node = Node::default();
    let colon = s.rfind(':');
    let bracket = s.rfind(']');
    let (host, port) = match colon {
        Some(at) if bracket.map_or(true, |b| b < at) => (&s[..at], &s[at + 1..]),
        _ => (s, ""),
    };
    let host = host.strip_prefix('[').unwrap_or(host);
    let host = host.strip_suffix(']').unwrap_or(host);
    if !host.is_empty() {
        match host.parse() {
            Ok(ip) => node.ip = Some(ip),
            Err(_) => {
                if !host.eq_ignore_ascii_case("unknown") {
                    node.obfuscated_node = Some(host.to_owned());
                }
            }
        }
    }
    if !port.is_empty() {
        match port.parse::<u16>() {
            Ok(n) if n != 0 => node.port = Some(n),
            _ => node.obfuscated_port = Some(port.to_owned()),
        }
    }
    node
}

fn node_value(node: &Node) -> Option<String> {
    let mut out = match (node.ip, &node.obfuscated_node) {
        (Some(IpAddr::V6(ip)), _) => format!("[{ip}]"),
        (Some(ip), _) => ip.to_string(),
        (None, Some(label)) => label.clone(),
        (None, None) => String::new(),
    };
    let port = node
        .port
        .map(|p| p.to_string())
        .or_else(|| node.obfuscated_port.clone());
    if out.is_empty() && port.is_none() {
        return None;
    }
    if out.is_empty() {
        out.push_str("unknown");
    }
    if let Some(port) = port {
        out.push(':');
        out.push_str(&port);
    }
    Some(out)
}

fn write_forwarded<W: Write>(w: &mut W, elems: &[ForwardedElem]) -> io::Result<()> {
    for (i, elem) in elems.iter().enumerate() {
        if i != 0 {
            w.write_all(b", ")?;
        }
        let mut first = true;
        let mut sep = |w: &mut W| -> io::Result<()> {
            if !std::mem::take(&mut first) {
                w.write_all(b";")?;
            }
            Ok(())
        };
        if let Some(value) = node_value(&elem.forwarded_for) {
            sep(w)?;
            w.write_all(b"for=")?;
            write_token_or_quoted(w, &value)?;
        }
        if let Some(value) = node_value(&elem.by) {
            sep(w)?;
            w.write_all(b"by=")?;
            write_token_or_quoted(w, &value)?;
        }
        if let Some(host) = &elem.host {
            sep(w)?;
            w.write_all(b"host=")?;
            write_token_or_quoted(w, host)?;
        }
        if let Some(proto) = &elem.proto {
            sep(w)?;
            w.write_all(b"proto=")?;
            write_token_or_quoted(w, proto)?;
        }
        for (name, value) in &elem.ext {
            sep(w)?;
            write!(w, "{name}=")?;
            write_token_or_quoted(w, value)?;
        }
        if first {
            w.write_all(b"for=unknown")?;
        }
    }
    Ok(())
}
