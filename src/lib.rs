//! Parse and serialize the values of standard HTTP header fields.
//!
//! This crate covers the header fields whose grammars are genuinely
//! hard: quoted strings with backslash escapes, nesting comments,
//! comma-separated lists spread across several field instances,
//! parameter lists, RFC 8187 percent-encoded international values,
//! RFC 7235 authentication challenges, RFC 7239 `Forwarded` node
//! identifiers, RFC 8288 `Link` elements, entity tags, and friends.
//!
//! Two properties hold throughout:
//!
//! * **Parsers are total.** Any sequence of bytes produces a value in
//!   time linear in its length. Malformed input never raises an error;
//!   the parsers extract what they can and drop the rest, the way
//!   browsers and proxies do.
//! * **Serializers maximize interop.** Values are quoted, escaped, or
//!   percent-encoded automatically, choosing the representation the
//!   widest range of recipients can read, and case is canonicalized
//!   where the standards treat it as insignificant.
//!
//! Each supported field is a type implementing [`Header`]; the
//! [`FieldContainer`] trait connects the codecs to whatever header map
//! the surrounding HTTP machinery uses.
//!
//! ```
//! use httpfield::header::{parse_from, set_in, CacheControl, Fields};
//!
//! let mut fields = Fields::new();
//! fields.insert("cache-control", "private=\"Set-Cookie\", max-age=900");
//!
//! let cc: CacheControl = parse_from(&fields).unwrap();
//! assert_eq!(cc.max_age, Some(900));
//! assert_eq!(cc.private_headers, ["Set-Cookie"]);
//!
//! set_in(&mut fields, &cc);
//! ```

pub mod header;

mod extvalue;
mod method;
mod syntax;

pub use header::item::EntityTag;
pub use header::{FieldContainer, Fields, Header, RequestHeader, ResponseHeader};
pub use method::Method;
