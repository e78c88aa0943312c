#![no_main]

use httpfield::header::{
    Allow, Authorization, CacheControl, ContentDisposition, Forwarded, IfMatch, IfNoneMatch, Link,
    Prefer, PreferenceApplied, ProxyAuthenticate, ProxyAuthorization, Server, UserAgent, Vary, Via,
    Warning, WwwAuthenticate,
};
use httpfield::Header;
use libfuzzer_sys::fuzz_target;
use url::Url;

// Every parser must accept arbitrary bytes, and every serializer must
// accept whatever its parser produced.
fn check<H: Header>(values: &[Vec<u8>], base: &Url) {
    if let Some(parsed) = H::parse(values, base) {
        let mut buf = Vec::new();
        parsed
            .serialize(&mut buf)
            .expect("serializing to a Vec cannot fail");
        H::parse(&[buf], base);
    }
}

fn check_all(values: &[Vec<u8>], base: &Url) {
    check::<Allow>(values, base);
    check::<Vary>(values, base);
    check::<IfMatch>(values, base);
    check::<IfNoneMatch>(values, base);
    check::<UserAgent>(values, base);
    check::<Server>(values, base);
    check::<Via>(values, base);
    check::<Warning>(values, base);
    check::<CacheControl>(values, base);
    check::<Forwarded>(values, base);
    check::<WwwAuthenticate>(values, base);
    check::<ProxyAuthenticate>(values, base);
    check::<Authorization>(values, base);
    check::<ProxyAuthorization>(values, base);
    check::<Prefer>(values, base);
    check::<PreferenceApplied>(values, base);
    check::<Link>(values, base);
    check::<ContentDisposition>(values, base);
}

fuzz_target!(|data: &[u8]| {
    let base = Url::parse("http://fuzz.invalid/").unwrap();
    check_all(&[data.to_vec()], &base);

    // The same bytes split across two field instances.
    let mid = data.len() / 2;
    check_all(&[data[..mid].to_vec(), data[mid..].to_vec()], &base);
});
