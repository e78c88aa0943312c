//! Typed models for HTTP header fields and their codecs.
//!
//! Every supported header is a type implementing [`Header`]: a parser
//! from the raw field instances found in a message, and a serializer
//! back to bytes. Parsers are permissive and total; they extract what
//! they can from malformed input and never fail on any byte sequence.
//! Serializers quote, escape, and percent-encode wherever the grammar
//! allows, preferring the representation the widest set of recipients
//! can read back.
//!
//! The header fields are sorted into groups, one module per group:
//!
//! ## Conditional requests
//!
//! * [`IfMatch`], [`IfNoneMatch`]: entity-tag preconditions
//! * [`set_etag`]: emit an [`EntityTag`](item::EntityTag)
//!
//! ## Message context
//!
//! * [`UserAgent`]: client software, as a product list
//! * [`Server`]: server software, same grammar
//! * [`Allow`]: methods allowed on the resource
//!
//! ## Control data
//!
//! * [`Vary`]: request fields that select the representation
//! * [`CacheControl`]: RFC 7234 directives, with the RFC 5861/8246
//!   extensions
//! * [`Warning`]: stale/transformation warnings
//!
//! ## Message routing
//!
//! * [`Via`]: intermediaries the message passed through
//! * [`Forwarded`]: RFC 7239 proxy disclosure, with obfuscated
//!   identifiers
//!
//! ## Authentication
//!
//! * [`WwwAuthenticate`], [`ProxyAuthenticate`]: challenge lists
//! * [`Authorization`], [`ProxyAuthorization`]: credentials
//!
//! ## Everything else
//!
//! * [`Prefer`], [`PreferenceApplied`]: RFC 7240 preferences
//! * [`Link`]: RFC 8288 web links
//! * [`ContentDisposition`]: RFC 6266, with RFC 8187 filenames

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::io::{self, Write};

use url::Url;

#[cfg(feature = "auth")]
pub use self::auth::{Auth, Authorization, ProxyAuthenticate, ProxyAuthorization, WwwAuthenticate};
#[cfg(feature = "conditional")]
pub use self::conditional::{set_etag, IfMatch, IfNoneMatch};
#[cfg(feature = "context")]
pub use self::context::{Allow, Product, Server, UserAgent};
#[cfg(feature = "control")]
pub use self::control::{CacheControl, CacheDirectives, MaxStale, Vary, Warning, WarningElem};
#[cfg(feature = "disposition")]
pub use self::disposition::{ContentDisposition, Disposition};
#[cfg(feature = "link")]
pub use self::link::{Link, LinkElem};
#[cfg(feature = "prefer")]
pub use self::prefer::{Pref, Prefer, PreferenceApplied};
#[cfg(feature = "routing")]
pub use self::routing::{Forwarded, ForwardedElem, Node, Via, ViaElem};

macro_rules! header {
    (
        $(#[$a:meta])*
        pub struct $header:ident($inner:ty);
        ($($usage:ty)*);
        NAME = $name:expr;
        SENSITIVE = $sensitive:expr;
        parse($s:ident, $base:ident) $parse:block
        serialize($self_:ident, $w:ident) $serialize:block
    ) => {
        $(#[$a])*
        #[derive(Clone, Debug, PartialEq)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $header(pub $inner);

        impl ::std::convert::From<$inner> for $header {
            fn from(t: $inner) -> $header {
                $header(t)
            }
        }

        impl ::std::convert::From<$header> for $inner {
            fn from(header: $header) -> $inner {
                header.0
            }
        }

        impl ::std::ops::Deref for $header {
            type Target = $inner;

            fn deref(&self) -> &$inner {
                &self.0
            }
        }

        $(
            impl $usage for $header {}
        )*

        impl crate::header::Header for $header {
            const NAME: &'static str = $name;
            const SENSITIVE: bool = $sensitive;

            fn parse($s: &[Vec<u8>], $base: &::url::Url) -> Option<Self>
            $parse

            fn serialize<W: ::std::io::Write>(&$self_, $w: &mut W) -> ::std::io::Result<()>
            $serialize
        }
    }
}

#[cfg(feature = "auth")]
mod auth;
#[cfg(feature = "conditional")]
mod conditional;
#[cfg(feature = "context")]
mod context;
#[cfg(feature = "control")]
mod control;
#[cfg(feature = "disposition")]
mod disposition;
pub mod item;
#[cfg(feature = "link")]
mod link;
#[cfg(feature = "prefer")]
mod prefer;
#[cfg(feature = "routing")]
mod routing;
pub(crate) mod util;

/// A HTTP header field.
///
/// This trait is used for deserialization and serialization and to
/// enforce some common traits on header fields.
pub trait Header: Clone + Debug + Sized {
    /// The name of the header field.
    ///
    /// Although names are case-insensitive in HTTP/1.x and specified to
    /// be always lowercased in HTTP/2 they are given here in their most
    /// common form: Camel-Case-With-Dashes, e.g. `WWW-Authenticate`.
    const NAME: &'static str;

    /// Marks a header field as possibly sensitive.
    ///
    /// HTTP/2 enables compression of header fields using a static and a
    /// dynamic table. Header fields carrying credentials should be
    /// excluded from compression to avoid leaking information.
    const SENSITIVE: bool;

    /// Parses a header field from its raw instances, in the order they
    /// appeared in the message.
    ///
    /// Returns `None` only when `values` is empty, i.e. the field was
    /// absent. Anything else produces a best-effort value: parsers
    /// tolerate malformed input and silently drop what they cannot
    /// recognize.
    ///
    /// The base URL is the effective request URL; `Link` resolves its
    /// targets and anchors against it, everything else ignores it.
    fn parse(values: &[Vec<u8>], base: &Url) -> Option<Self>;

    /// Serializes the field value, combined form, onto one line.
    fn serialize<W: Write>(&self, w: &mut W) -> io::Result<()>;
}

/// Marker trait for request headers.
///
/// With this trait users of this library can statically assure that a
/// header is used correctly.
pub trait RequestHeader: Header {}

/// Marker trait for response headers.
///
/// With this trait users of this library can statically assure that a
/// header is used correctly.
pub trait ResponseHeader: Header {}

/// The host's multi-valued header container, as seen from this crate: a
/// case-insensitive field name mapped to the ordered raw instances of
/// that field.
pub trait FieldContainer {
    /// All raw instances of `name`, in message order. Empty when the
    /// field is absent.
    fn get_all(&self, name: &str) -> &[Vec<u8>];
    /// Replaces every instance of `name` with the single given value.
    fn set_raw(&mut self, name: &'static str, value: Vec<u8>);
    /// Appends one more instance of `name`.
    fn append_raw(&mut self, name: &'static str, value: Vec<u8>);
}

/// A minimal [`FieldContainer`] for tests and examples.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Fields(BTreeMap<String, Vec<Vec<u8>>>);

impl Fields {
    pub fn new() -> Fields {
        Fields::default()
    }

    /// Inserts one raw instance, keeping any already present.
    pub fn insert(&mut self, name: &str, value: impl Into<Vec<u8>>) {
        self.0
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value.into());
    }
}

impl FieldContainer for Fields {
    fn get_all(&self, name: &str) -> &[Vec<u8>] {
        self.0
            .get(&name.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn set_raw(&mut self, name: &'static str, value: Vec<u8>) {
        self.0.insert(name.to_ascii_lowercase(), vec![value]);
    }

    fn append_raw(&mut self, name: &'static str, value: Vec<u8>) {
        self.0
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(value);
    }
}

/// Parses `H` out of a container. `None` when the field is absent.
pub fn parse_from<H: Header, C: FieldContainer>(container: &C) -> Option<H> {
    parse_from_with_base(container, &dummy_base())
}

/// Like [`parse_from`], resolving relative URLs against `base`.
pub fn parse_from_with_base<H: Header, C: FieldContainer>(container: &C, base: &Url) -> Option<H> {
    H::parse(container.get_all(H::NAME), base)
}

/// Serializes `header` and replaces all instances of the field.
pub fn set_in<H: Header, C: FieldContainer>(container: &mut C, header: &H) {
    container.set_raw(H::NAME, to_bytes(header));
}

/// Serializes `header` as one additional field instance.
pub fn append_to<H: Header, C: FieldContainer>(container: &mut C, header: &H) {
    container.append_raw(H::NAME, to_bytes(header));
}

fn to_bytes<H: Header>(header: &H) -> Vec<u8> {
    let mut buf = Vec::new();
    // Writing to a Vec cannot fail.
    let _ = header.serialize(&mut buf);
    buf
}

pub(crate) fn dummy_base() -> Url {
    // Infallible: the literal is a valid absolute URL.
    Url::parse("thismessage:/").unwrap_or_else(|_| unreachable!())
}
