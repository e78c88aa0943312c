use crate::header::item::{tags_match, tags_match_weak, EntityTag};
use crate::header::util::{decode_values, write_list, Elems};
use crate::header::{FieldContainer, RequestHeader};
use crate::syntax::peek;

header! {
    /// `If-Match` header, [RFC7232 Section 3.1]
    pub struct IfMatch(Vec<EntityTag>);
    (RequestHeader);
    NAME = "If-Match";
    SENSITIVE = false;
    parse(s, _base) {
        parse_tags(s).map(Into::into)
    }
    serialize(self, w) {
        write_list(w, &self.0)
    }
}

header! {
    /// `If-None-Match` header, [RFC7232 Section 3.2]
    pub struct IfNoneMatch(Vec<EntityTag>);
    (RequestHeader);
    NAME = "If-None-Match";
    SENSITIVE = false;
    parse(s, _base) {
        parse_tags(s).map(Into::into)
    }
    serialize(self, w) {
        write_list(w, &self.0)
    }
}

impl IfMatch {
    /// Strong match: weak tags on either side never match.
    pub fn matches(&self, tag: &EntityTag) -> bool {
        tags_match(&self.0, tag)
    }

    /// Weak match: only the opaque contents are compared.
    pub fn matches_weak(&self, tag: &EntityTag) -> bool {
        tags_match_weak(&self.0, tag)
    }
}

impl IfNoneMatch {
    /// Strong match: weak tags on either side never match.
    pub fn matches(&self, tag: &EntityTag) -> bool {
        tags_match(&self.0, tag)
    }

    /// Weak match: only the opaque contents are compared.
    pub fn matches_weak(&self, tag: &EntityTag) -> bool {
        tags_match_weak(&self.0, tag)
    }
}

/// Sets the `ETag` header, [RFC7232 Section 2.3]. The header is only
/// ever emitted, never interpreted, so there is no parsing counterpart.
pub fn set_etag<C: FieldContainer>(container: &mut C, tag: &EntityTag) {
    container.set_raw("ETag", tag.to_string().into_bytes());
}

fn parse_tags(s: &[Vec<u8>]) -> Option<Vec<EntityTag>> {
    if s.is_empty() {
        return None;
    }
    let values = decode_values(s);
    let mut elems = Elems::new(&values);
    let mut tags = Vec::new();
    while let Some(v) = elems.next_elem() {
        if peek(v) == b'*' {
            tags.push(EntityTag::wildcard());
            elems.finish(&v[1..]);
        } else {
            let (tag, rest) = EntityTag::capture(v);
            tags.push(tag);
            elems.finish(rest);
        }
    }
    Some(tags)
}
