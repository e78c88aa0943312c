//! Set/parse round-trip laws over randomly generated canonical models,
//! plus a deterministic nasty-input sweep asserting that every parser
//! accepts arbitrary junk and that serializers re-emit whatever the
//! parsers produced.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

use fastrand::Rng;
use pretty_assertions::assert_eq;
use url::Url;

use httpfield::header::{
    Allow, Auth, Authorization, CacheControl, CacheDirectives, ContentDisposition, Disposition,
    Forwarded, ForwardedElem, IfMatch, IfNoneMatch, Link, LinkElem, MaxStale, Node, Pref, Prefer,
    PreferenceApplied, Product, Server, UserAgent, Vary, Via, ViaElem, Warning, WarningElem,
    WwwAuthenticate,
};
use httpfield::{EntityTag, Header, Method};

const ROUNDS: usize = 200;

fn base() -> Url {
    Url::parse("http://example.com/dir/").unwrap()
}

fn roundtrip<H: Header + PartialEq>(header: &H) {
    let mut buf = Vec::new();
    header.serialize(&mut buf).unwrap();
    let reparsed = H::parse(&[buf.clone()], &base())
        .unwrap_or_else(|| panic!("{} came back absent", H::NAME));
    assert_eq!(
        reparsed,
        *header,
        "{}: {}",
        H::NAME,
        String::from_utf8_lossy(&buf)
    );
}

const TOKEN_BYTES: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!#$%&'*+-.^_`|~";
const TEXT_CHARS: &[char] = &[
    'a', 'b', 'z', 'A', 'Z', '0', '9', ' ', '!', '"', '\\', '(', ')', ',', ';', '=', '<', '>',
    '/', ':', '@', '[', ']', '{', '}', '\u{e9}', '\u{20ac}', '\u{4e16}',
];

fn token(rng: &mut Rng) -> String {
    let len = rng.usize(1..8);
    (0..len)
        .map(|_| TOKEN_BYTES[rng.usize(0..TOKEN_BYTES.len())] as char)
        .collect()
}

fn lower_token(rng: &mut Rng) -> String {
    let len = rng.usize(1..8);
    (0..len).map(|_| rng.lowercase()).collect()
}

/// Arbitrary printable text, including bytes that need quoting,
/// escaping, or percent-encoding.
fn text(rng: &mut Rng) -> String {
    let len = rng.usize(1..12);
    (0..len)
        .map(|_| TEXT_CHARS[rng.usize(0..TEXT_CHARS.len())])
        .collect()
}

fn hostname(rng: &mut Rng) -> String {
    format!("{}.example.com", lower_token(rng))
}

#[test]
fn allow_roundtrips() {
    let mut rng = Rng::with_seed(1);
    for _ in 0..ROUNDS {
        let methods: Vec<Method> = (0..rng.usize(0..5))
            .map(|_| match rng.usize(0..4) {
                0 => Method::Get,
                1 => Method::Head,
                2 => Method::Delete,
                // Whatever the token reads back as is the canonical model.
                _ => token(&mut rng).to_ascii_uppercase().parse().unwrap(),
            })
            .collect();
        roundtrip(&Allow(methods));
    }
}

#[test]
fn vary_roundtrips() {
    let mut rng = Rng::with_seed(2);
    for _ in 0..ROUNDS {
        let names: Vec<String> = (0..rng.usize(0..4))
            .map(|_| {
                const POOL: [&str; 5] =
                    ["Accept", "Accept-Encoding", "User-Agent", "Cookie", "X-Custom"];
                if rng.u8(..) < 16 {
                    "*".to_owned()
                } else {
                    POOL[rng.usize(0..POOL.len())].to_owned()
                }
            })
            .collect();
        roundtrip(&Vary(names));
    }
}

#[test]
fn entity_tag_lists_roundtrip() {
    let mut rng = Rng::with_seed(3);
    for _ in 0..ROUNDS {
        let tags: Vec<EntityTag> = (0..rng.usize(0..4))
            .map(|_| {
                if rng.u8(..) < 16 {
                    EntityTag::wildcard()
                } else {
                    EntityTag::new(&token(&mut rng), rng.bool())
                }
            })
            .collect();
        roundtrip(&IfMatch(tags.clone()));
        roundtrip(&IfNoneMatch(tags));
    }
}

#[test]
fn product_lists_roundtrip() {
    let mut rng = Rng::with_seed(4);
    for _ in 0..ROUNDS {
        let products: Vec<Product> = (0..rng.usize(1..4))
            .map(|_| Product {
                name: token(&mut rng),
                version: if rng.bool() {
                    token(&mut rng)
                } else {
                    String::new()
                },
                comment: if rng.bool() { text(&mut rng) } else { String::new() },
            })
            .collect();
        roundtrip(&UserAgent(products.clone()));
        roundtrip(&Server(products));
    }
}

#[test]
fn via_roundtrips() {
    let mut rng = Rng::with_seed(5);
    for _ in 0..ROUNDS {
        let elems: Vec<ViaElem> = (0..rng.usize(1..4))
            .map(|_| ViaElem {
                received_proto: ["HTTP/1.1", "HTTP/1.0", "HTTP/2", "SIP/2.0"][rng.usize(0..4)]
                    .to_owned(),
                received_by: match rng.usize(0..3) {
                    0 => hostname(&mut rng),
                    1 => format!("{}:{}", hostname(&mut rng), rng.u16(1..)),
                    _ => format!("[2001:db8::{:x}]:{}", rng.u16(1..), rng.u16(1..)),
                },
                comment: if rng.bool() { text(&mut rng) } else { String::new() },
            })
            .collect();
        roundtrip(&Via(elems));
    }
}

#[test]
fn warning_roundtrips() {
    let mut rng = Rng::with_seed(6);
    for _ in 0..ROUNDS {
        let elems: Vec<WarningElem> = (0..rng.usize(1..3))
            .map(|_| WarningElem {
                code: rng.u16(100..300),
                agent: if rng.bool() { "-".to_owned() } else { hostname(&mut rng) },
                text: text(&mut rng),
                date: if rng.bool() {
                    Some(SystemTime::UNIX_EPOCH + Duration::from_secs(rng.u64(0..4_000_000_000)))
                } else {
                    None
                },
            })
            .collect();
        roundtrip(&Warning(elems));
    }
}

fn arbitrary_directives(rng: &mut Rng) -> CacheDirectives {
    let mut d = CacheDirectives {
        no_store: rng.bool(),
        no_transform: rng.bool(),
        only_if_cached: rng.bool(),
        must_revalidate: rng.bool(),
        public: rng.bool(),
        proxy_revalidate: rng.bool(),
        immutable: rng.bool(),
        max_age: if rng.bool() { Some(rng.u64(0..100_000)) } else { None },
        s_maxage: if rng.bool() { Some(rng.u64(0..100_000)) } else { None },
        max_stale: match rng.usize(0..3) {
            0 => MaxStale::Absent,
            1 => MaxStale::Forever,
            _ => MaxStale::Seconds(rng.u64(1..1000)),
        },
        min_fresh: if rng.bool() { rng.u64(1..1000) } else { 0 },
        stale_while_revalidate: if rng.bool() { rng.u64(1..1000) } else { 0 },
        stale_if_error: if rng.bool() { rng.u64(1..1000) } else { 0 },
        ..CacheDirectives::default()
    };
    // The list and flag forms of private/no-cache are mutually
    // exclusive on the wire.
    match rng.usize(0..3) {
        0 => d.private = true,
        1 => d.private_headers = vec!["Set-Cookie".to_owned(), "X-Custom".to_owned()],
        _ => {}
    }
    match rng.usize(0..3) {
        0 => d.no_cache = true,
        1 => d.no_cache_headers = vec!["Authorization".to_owned()],
        _ => {}
    }
    for _ in 0..rng.usize(0..3) {
        let name = lower_token(rng);
        if !is_known_directive(&name) {
            let value = if rng.bool() { lower_token(rng) } else { String::new() };
            d.ext.insert(name, value);
        }
    }
    d
}

fn is_known_directive(name: &str) -> bool {
    matches!(
        name,
        "no-store"
            | "no-transform"
            | "only-if-cached"
            | "must-revalidate"
            | "public"
            | "proxy-revalidate"
            | "immutable"
            | "no-cache"
            | "private"
            | "max-age"
            | "s-maxage"
            | "max-stale"
            | "min-fresh"
            | "stale-while-revalidate"
            | "stale-if-error"
    )
}

#[test]
fn cache_control_roundtrips() {
    let mut rng = Rng::with_seed(7);
    for _ in 0..ROUNDS {
        roundtrip(&CacheControl(arbitrary_directives(&mut rng)));
    }
}

fn arbitrary_node(rng: &mut Rng) -> Node {
    let mut node = Node::default();
    match rng.usize(0..4) {
        0 => {}
        1 => node.ip = Some(std::net::IpAddr::V4(rng.u32(..).into())),
        2 => {
            node.ip = Some(std::net::IpAddr::V6(
                std::net::Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, rng.u16(..)),
            ))
        }
        _ => node.obfuscated_node = Some(format!("_{}", lower_token(rng))),
    }
    match rng.usize(0..3) {
        0 => {}
        1 => node.port = Some(rng.u16(1..)),
        _ => node.obfuscated_port = Some(format!("_{}", lower_token(rng))),
    }
    node
}

#[test]
fn forwarded_roundtrips() {
    let mut rng = Rng::with_seed(8);
    for _ in 0..ROUNDS {
        let elems: Vec<ForwardedElem> = (0..rng.usize(1..4))
            .map(|_| {
                let mut elem = ForwardedElem {
                    forwarded_for: arbitrary_node(&mut rng),
                    by: arbitrary_node(&mut rng),
                    host: if rng.bool() { Some(hostname(&mut rng)) } else { None },
                    proto: if rng.bool() { Some("https".to_owned()) } else { None },
                    ext: BTreeMap::new(),
                };
                for _ in 0..rng.usize(0..2) {
                    let name = lower_token(&mut rng);
                    if !matches!(name.as_str(), "for" | "by" | "host" | "proto") {
                        elem.ext.insert(name, text(&mut rng));
                    }
                }
                elem
            })
            .collect();
        roundtrip(&Forwarded(elems));
    }
}

fn arbitrary_auth(rng: &mut Rng) -> Auth {
    let mut auth = Auth::new(
        ["basic", "bearer", "digest", "negotiate", "newauth"][rng.usize(0..5)],
    );
    if rng.bool() {
        let body: String = (0..rng.usize(4..12)).map(|_| rng.alphanumeric()).collect();
        auth.token = Some(format!("{}{}", body, "=".repeat(rng.usize(0..3))));
    } else {
        auth.realm = Some(text(rng));
        for _ in 0..rng.usize(0..3) {
            let name = lower_token(rng);
            // qop has context-dependent quoting, so its value would need
            // to stay a token; skip it rather than special-case it here.
            if name != "realm" && name != "qop" {
                auth.params.insert(name, text(rng));
            }
        }
    }
    auth
}

#[test]
fn authorization_roundtrips() {
    let mut rng = Rng::with_seed(9);
    for _ in 0..ROUNDS {
        roundtrip(&Authorization(arbitrary_auth(&mut rng)));
    }
}

#[test]
fn challenge_lists_roundtrip() {
    let mut rng = Rng::with_seed(10);
    for _ in 0..ROUNDS {
        let challenges: Vec<Auth> = (0..rng.usize(1..4)).map(|_| arbitrary_auth(&mut rng)).collect();
        roundtrip(&WwwAuthenticate(challenges));
    }
}

#[test]
fn prefer_roundtrips() {
    let mut rng = Rng::with_seed(11);
    for _ in 0..ROUNDS {
        let mut prefs = BTreeMap::new();
        for _ in 0..rng.usize(1..4) {
            let name = lower_token(&mut rng);
            let mut pref = Pref::new(&lower_token(&mut rng));
            if rng.bool() {
                pref.value.clear();
            }
            for _ in 0..rng.usize(0..2) {
                let value = text(&mut rng);
                pref.params.insert(lower_token(&mut rng), value);
            }
            prefs.insert(name, pref);
        }
        roundtrip(&Prefer(prefs));
    }
}

#[test]
fn preference_applied_roundtrips() {
    let mut rng = Rng::with_seed(12);
    for _ in 0..ROUNDS {
        let mut prefs = BTreeMap::new();
        for _ in 0..rng.usize(1..4) {
            prefs.insert(lower_token(&mut rng), lower_token(&mut rng));
        }
        roundtrip(&PreferenceApplied(prefs));
    }
}

#[test]
fn link_roundtrips() {
    let mut rng = Rng::with_seed(13);
    for _ in 0..ROUNDS {
        let elems: Vec<LinkElem> = (0..rng.usize(1..3))
            .map(|_| {
                let target = base().join(&lower_token(&mut rng)).unwrap();
                let mut elem = LinkElem::new(target, &lower_token(&mut rng));
                if rng.bool() {
                    elem.anchor = Some(base().join("#frag").unwrap());
                }
                if rng.bool() {
                    elem.title = text(&mut rng);
                }
                if rng.bool() {
                    elem.media_type = "text/html".to_owned();
                }
                if rng.bool() {
                    elem.media = lower_token(&mut rng);
                }
                for _ in 0..rng.usize(0..3) {
                    elem.hreflang.push(lower_token(&mut rng));
                }
                for _ in 0..rng.usize(0..2) {
                    let name = lower_token(&mut rng);
                    if !matches!(
                        name.as_str(),
                        "rel" | "anchor" | "media" | "title" | "type" | "hreflang" | "rev"
                    ) {
                        elem.ext.insert(name, text(&mut rng));
                    }
                }
                elem
            })
            .collect();
        roundtrip(&Link(elems));
    }
}

#[test]
fn content_disposition_roundtrips() {
    let mut rng = Rng::with_seed(14);
    for _ in 0..ROUNDS {
        let mut d = Disposition {
            dtype: ["attachment", "inline"][rng.usize(0..2)].to_owned(),
            filename: if rng.bool() { text(&mut rng) } else { String::new() },
            params: BTreeMap::new(),
        };
        for _ in 0..rng.usize(0..3) {
            let name = lower_token(&mut rng);
            if name != "filename" {
                let value = text(&mut rng);
                d.params.insert(name, value);
            }
        }
        roundtrip(&ContentDisposition(d));
    }
}

/// Parsers accept anything; serializers accept whatever the parsers
/// produced. A deterministic stand-in for the fuzz targets.
#[test]
fn nasty_inputs_never_fail() {
    let nasty: &[&str] = &[
        "",
        ",",
        ",,,;;;===",
        "\"",
        "\"unterminated",
        "\\\"\\",
        "(((((",
        ")",
        "a\u{0}b\u{1f}c",
        "=?|{}[]<>",
        "W/",
        "W/\"",
        "<>;;;",
        "<relative>; rel",
        "Basic =====",
        "Digest a==b, c",
        "100 ",
        "for=;by=;host=;proto=",
        "max-age=, max-age=99999999999999999999999",
        "title*=UTF-8''%zz%",
        "\u{feff}\u{202e}mixed\u{4e16}\u{e9}",
        "a".repeat(512).leak(),
    ];
    let mut instances: Vec<Vec<u8>> = nasty.iter().map(|s| s.as_bytes().to_vec()).collect();
    instances.push(vec![0xff, 0xfe, 0x80, b'"', b'\\', 0xc3]);

    fn sweep<H: Header>(instances: &[Vec<u8>]) {
        for value in instances {
            let doubled = [value.clone(), b"second, instance".to_vec()];
            for pair in [std::slice::from_ref(value), &doubled[..]] {
                if let Some(parsed) = H::parse(pair, &Url::parse("http://x/").unwrap()) {
                    let mut buf = Vec::new();
                    parsed.serialize(&mut buf).unwrap();
                    // And whatever came out parses again.
                    H::parse(&[buf], &Url::parse("http://x/").unwrap());
                }
            }
        }
    }

    sweep::<Allow>(&instances);
    sweep::<Vary>(&instances);
    sweep::<IfMatch>(&instances);
    sweep::<IfNoneMatch>(&instances);
    sweep::<UserAgent>(&instances);
    sweep::<Server>(&instances);
    sweep::<Via>(&instances);
    sweep::<Warning>(&instances);
    sweep::<CacheControl>(&instances);
    sweep::<Forwarded>(&instances);
    sweep::<WwwAuthenticate>(&instances);
    sweep::<Authorization>(&instances);
    sweep::<Prefer>(&instances);
    sweep::<PreferenceApplied>(&instances);
    sweep::<Link>(&instances);
    sweep::<ContentDisposition>(&instances);
}
