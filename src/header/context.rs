use std::io::{self, Write};

use crate::header::util::{decode_values, write_list, Elems};
use crate::header::{RequestHeader, ResponseHeader};
use crate::syntax::{consume_comment, consume_item, peek, skip_one, skip_ws, write_delimited};
use crate::Method;

/// One product identifier from `User-Agent` or `Server`, [RFC7231
/// Section 5.5.3]: `name[/version]` plus any parenthesized comment that
/// followed it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Product {
    pub name: String,
    pub version: String,
    pub comment: String,
}

impl Product {
    pub fn new(name: &str, version: &str) -> Product {
        Product {
            name: name.to_owned(),
            version: version.to_owned(),
            comment: String::new(),
        }
    }
}

header! {
    /// `User-Agent` header, [RFC7231 Section 5.5.3]
    ///
    /// The value is decoded as UTF-8. Invalid bytes are replaced with
    /// U+FFFD REPLACEMENT CHARACTER.
    pub struct UserAgent(Vec<Product>);
    (RequestHeader);
    NAME = "User-Agent";
    SENSITIVE = false;
    parse(s, _base) {
        let first = s.first()?;
        Some(parse_products(&String::from_utf8_lossy(first)).into())
    }
    serialize(self, w) {
        write_products(w, &self.0)
    }
}

header! {
    /// `Server` header, [RFC7231 Section 7.4.2]
    ///
    /// The value is decoded as UTF-8. Invalid bytes are replaced with
    /// U+FFFD REPLACEMENT CHARACTER.
    pub struct Server(Vec<Product>);
    (ResponseHeader);
    NAME = "Server";
    SENSITIVE = false;
    parse(s, _base) {
        let first = s.first()?;
        Some(parse_products(&String::from_utf8_lossy(first)).into())
    }
    serialize(self, w) {
        write_products(w, &self.0)
    }
}

header! {
    /// `Allow` header, [RFC7231 Section 7.4.1]
    ///
    /// A present but empty header parses to an empty list, which is
    /// distinct from the header being absent.
    pub struct Allow(Vec<Method>);
    (ResponseHeader);
    NAME = "Allow";
    SENSITIVE = false;
    parse(s, _base) {
        parse_allow(s).map(Into::into)
    }
    serialize(self, w) {
        write_list(w, &self.0)
    }
}

fn parse_products(v: &str) -> Vec<Product> {
    let mut products: Vec<Product> = Vec::new();
    let mut v = v;
    loop {
        v = skip_ws(v);
        match peek(v) {
            0 => break,
            b'(' => {
                let (comment, rest) = consume_comment(v);
                v = rest;
                match products.last_mut() {
                    Some(product) => {
                        if product.comment.is_empty() {
                            product.comment = comment.into_owned();
                        } else {
                            product.comment.push_str("; ");
                            product.comment.push_str(&comment);
                        }
                    }
                    None => products.push(Product {
                        comment: comment.into_owned(),
                        ..Product::default()
                    }),
                }
            }
            _ => {
                let (item, rest) = consume_item(v);
                if item.is_empty() {
                    v = skip_one(rest);
                    continue;
                }
                v = rest;
                let (name, version) = match item.find('/') {
                    Some(at) => (&item[..at], &item[at + 1..]),
                    None => (item, ""),
                };
                products.push(Product::new(name, version));
            }
        }
    }
    products
}

fn write_products<W: Write>(w: &mut W, products: &[Product]) -> io::Result<()> {
    let mut first = true;
    for product in products {
        if !first {
            w.write_all(b" ")?;
        }
        first = false;
        w.write_all(product.name.as_bytes())?;
        if !product.version.is_empty() {
            write!(w, "/{}", product.version)?;
        }
        if !product.comment.is_empty() {
            if !product.name.is_empty() {
                w.write_all(b" ")?;
            }
            write_delimited(w, &product.comment, b'(', b')')?;
        }
    }
    Ok(())
}

fn parse_allow(s: &[Vec<u8>]) -> Option<Vec<Method>> {
    if s.is_empty() {
        return None;
    }
    let values = decode_values(s);
    let mut elems = Elems::new(&values);
    let mut methods = Vec::new();
    while let Some(v) = elems.next_elem() {
        let (item, rest) = consume_item(v);
        if let Ok(method) = item.parse() {
            methods.push(method);
        }
        elems.finish(rest);
    }
    Some(methods)
}
