use std::fmt::{self, Display};
use std::str::FromStr;

use self::Method::*;
use crate::syntax::is_token;

/// The method indicates the action to be performed on the target
/// resource. Unknown method tokens are preserved in [`Method::Unregistered`].
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Method {
    /// CONNECT, [RFC7231, Section 4.3.6]
    Connect,
    /// DELETE, [RFC7231, Section 4.3.5]
    Delete,
    /// GET, [RFC7231, Section 4.3.1]
    Get,
    /// HEAD, [RFC7231, Section 4.3.2]
    Head,
    /// OPTIONS, [RFC7231, Section 4.3.7]
    Options,
    /// PATCH, [RFC5789, Section 2]
    Patch,
    /// POST, [RFC7231, Section 4.3.3]
    Post,
    /// PRI, [RFC7540, Section 3.5]
    Pri,
    /// PUT, [RFC7231, Section 4.3.4]
    Put,
    /// SEARCH, [RFC5323, Section 2]
    Search,
    /// TRACE, [RFC7231, Section 4.3.8]
    Trace,
    /// Any other unknown method.
    ///
    /// All characters allowed in a token may be used.
    Unregistered(String),
}

static MAPPING: [(Method, &str, bool, bool); 11] = [
    (Connect, "CONNECT", false, false),
    (Delete, "DELETE", false, true),
    (Get, "GET", true, true),
    (Head, "HEAD", true, true),
    (Options, "OPTIONS", true, true),
    (Patch, "PATCH", false, false),
    (Post, "POST", false, false),
    (Pri, "PRI", true, true),
    (Put, "PUT", false, true),
    (Search, "SEARCH", true, true),
    (Trace, "TRACE", true, true),
];

impl Method {
    fn entry(&self) -> Option<&'static (Method, &'static str, bool, bool)> {
        MAPPING.iter().find(|(method, _, _, _)| method == self)
    }

    /// Safe methods are essentially read-only.
    pub fn is_safe(&self) -> bool {
        self.entry().is_some_and(|&(_, _, safe, _)| safe)
    }

    /// Idempotent methods may be called multiple times on the same
    /// resource but do not change it after the first call.
    pub fn is_idempotent(&self) -> bool {
        self.entry().is_some_and(|&(_, _, _, idem)| idem)
    }
}

impl Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Unregistered(s) => f.write_str(s),
            _ => f.write_str(self.entry().map(|&(_, name, _, _)| name).unwrap_or("")),
        }
    }
}

impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> Result<Method, ()> {
        if let Some((method, _, _, _)) = MAPPING.iter().find(|(_, name, _, _)| s == *name) {
            return Ok(method.clone());
        }
        if is_token(s) {
            Ok(Unregistered(s.to_owned()))
        } else {
            Err(())
        }
    }
}
