use pretty_assertions::assert_eq;
use waymark_http::{Cookie, CookieJar, Headers, MemoryCookieJar, MAX_DATE};
use waymark_url::{HttpUrl, PublicSuffixDatabase};

fn install_psl() {
    PublicSuffixDatabase::install(PublicSuffixDatabase::from_bytes(
        &b"*.ck\nco.uk\ncom\nuk\n"[..],
        &b"www.ck\n"[..],
    ));
}

fn url(input: &str) -> HttpUrl {
    HttpUrl::parse(input).unwrap()
}

#[test]
fn max_age_wins_over_expires() {
    install_psl();
    let base = url("https://example.com/");
    let cookie = Cookie::parse(
        0,
        &base,
        "a=b; Max-Age=1; Expires=Thu, 01 Jan 1970 00:00:02 GMT",
    )
    .unwrap();
    assert_eq!(cookie.expires_at(), 1000);
    assert!(cookie.persistent());

    // order does not matter
    let reversed = Cookie::parse(
        0,
        &base,
        "a=b; Expires=Thu, 01 Jan 1970 00:00:02 GMT; Max-Age=1",
    )
    .unwrap();
    assert_eq!(reversed.expires_at(), 1000);
}

#[test]
fn max_age_zero_expires_immediately() {
    install_psl();
    let cookie = Cookie::parse(0, &url("https://example.com/"), "a=b; Max-Age=0").unwrap();
    assert_eq!(cookie.expires_at(), i64::MIN);
    assert!(cookie.persistent());
    assert!(cookie.expired(0));
}

#[test]
fn max_age_saturates() {
    install_psl();
    let base = url("https://example.com/");
    let overflow = Cookie::parse(0, &base, "a=b; Max-Age=999999999999999999999999").unwrap();
    assert_eq!(overflow.expires_at(), MAX_DATE);

    let negative = Cookie::parse(0, &base, "a=b; Max-Age=-1").unwrap();
    assert_eq!(negative.expires_at(), i64::MIN);

    let junk = Cookie::parse(0, &base, "a=b; Max-Age=soon").unwrap();
    // unparseable max-age is ignored entirely
    assert_eq!(junk.expires_at(), MAX_DATE);
    assert!(!junk.persistent());
}

#[test]
fn expires_shapes() {
    install_psl();
    let base = url("https://example.com/");
    let expected = Cookie::parse(0, &base, "a=b; Expires=Sun, 06 Nov 1994 08:49:37 GMT")
        .unwrap()
        .expires_at();
    assert_eq!(expected, 784_111_777_000);

    for variant in [
        "a=b; Expires=Sunday, 06-Nov-94 08:49:37 GMT",
        "a=b; Expires=Sun Nov 6 08:49:37 1994",
        "a=b; expires=06 Nov 1994 08:49:37",
    ] {
        let cookie = Cookie::parse(0, &base, variant).unwrap();
        assert_eq!(cookie.expires_at(), expected, "{variant}");
        assert!(cookie.persistent());
    }

    // pre-1601 years reject the attribute, not the cookie
    let ancient = Cookie::parse(0, &base, "a=b; Expires=Sun, 06 Nov 1600 08:49:37 GMT").unwrap();
    assert_eq!(ancient.expires_at(), MAX_DATE);
}

#[test]
fn name_and_value_syntax() {
    install_psl();
    let base = url("https://example.com/");
    assert!(Cookie::parse(0, &base, "=b").is_none());
    assert!(Cookie::parse(0, &base, "a").is_none());
    assert!(Cookie::parse(0, &base, "a\u{1}=b").is_none());
    assert!(Cookie::parse(0, &base, "a=\u{e9}").is_none());

    let spaced = Cookie::parse(0, &base, "  a  =  b c  ").unwrap();
    assert_eq!(spaced.name(), "a");
    assert_eq!(spaced.value(), "b c");

    let empty_value = Cookie::parse(0, &base, "a=").unwrap();
    assert_eq!(empty_value.value(), "");
}

#[test]
fn absent_domain_is_host_only() {
    install_psl();
    let cookie = Cookie::parse(0, &url("https://sub.example.com/"), "a=b").unwrap();
    assert!(cookie.host_only());
    assert_eq!(cookie.domain(), "sub.example.com");
    assert!(cookie.matches(&url("https://sub.example.com/")));
    assert!(!cookie.matches(&url("https://other.example.com/")));
    assert!(!cookie.matches(&url("https://example.com/")));
}

#[test]
fn domain_attribute_matches_subdomains() {
    install_psl();
    let cookie = Cookie::parse(
        0,
        &url("https://sub.example.com/"),
        "a=b; Domain=example.com",
    )
    .unwrap();
    assert!(!cookie.host_only());
    assert_eq!(cookie.domain(), "example.com");
    assert!(cookie.matches(&url("https://example.com/")));
    assert!(cookie.matches(&url("https://deep.sub.example.com/")));
    assert!(!cookie.matches(&url("https://notexample.com/")));

    // leading dot is ignored, case folds
    let dotted = Cookie::parse(
        0,
        &url("https://sub.example.com/"),
        "a=b; Domain=.EXAMPLE.com",
    )
    .unwrap();
    assert_eq!(dotted.domain(), "example.com");
}

#[test]
fn domain_mismatches_reject_the_cookie() {
    install_psl();
    let base = url("https://example.com/");
    assert!(Cookie::parse(0, &base, "a=b; Domain=other.com").is_none());
    assert!(Cookie::parse(0, &base, "a=b; Domain=sub.example.com").is_none());
    assert!(Cookie::parse(0, &base, "a=b; Domain=example.com.").is_none());
}

#[test]
fn public_suffix_domains_reject_the_cookie() {
    install_psl();
    assert!(Cookie::parse(0, &url("https://example.com/"), "a=b; Domain=com").is_none());
    assert!(Cookie::parse(
        0,
        &url("https://foo.example.co.uk/"),
        "a=b; Domain=co.uk"
    )
    .is_none());
    // the registrable domain itself is fine
    assert!(Cookie::parse(
        0,
        &url("https://foo.example.co.uk/"),
        "a=b; Domain=example.co.uk"
    )
    .is_some());
}

#[test]
fn ip_hosts_never_domain_match() {
    install_psl();
    let cookie = Cookie::parse(0, &url("http://127.0.0.1/"), "a=b").unwrap();
    assert!(cookie.matches(&url("http://127.0.0.1/")));

    // a domain attribute equal to the IP matches only exactly
    let with_domain = Cookie::parse(0, &url("http://127.0.0.1/"), "a=b; Domain=127.0.0.1").unwrap();
    assert!(!with_domain.host_only());
    assert!(with_domain.matches(&url("http://127.0.0.1/")));
    assert!(!with_domain.matches(&url("http://127.0.0.2/")));
}

#[test]
fn default_path_derivation() {
    install_psl();
    let cookie = Cookie::parse(0, &url("https://example.com/a/b/c"), "k=v").unwrap();
    assert_eq!(cookie.path(), "/a/b");

    let root = Cookie::parse(0, &url("https://example.com/"), "k=v").unwrap();
    assert_eq!(root.path(), "/");

    let relative = Cookie::parse(0, &url("https://example.com/a"), "k=v; Path=nonslash").unwrap();
    assert_eq!(relative.path(), "/");

    let explicit = Cookie::parse(0, &url("https://example.com/a"), "k=v; Path=/b/c").unwrap();
    assert_eq!(explicit.path(), "/b/c");
}

#[test]
fn path_matching() {
    install_psl();
    let cookie = Cookie::parse(0, &url("https://example.com/"), "k=v; Path=/a").unwrap();
    assert!(cookie.matches(&url("https://example.com/a")));
    assert!(cookie.matches(&url("https://example.com/a/b")));
    assert!(!cookie.matches(&url("https://example.com/ab")));
    assert!(!cookie.matches(&url("https://example.com/")));

    let slashed = Cookie::parse(0, &url("https://example.com/"), "k=v; Path=/a/").unwrap();
    assert!(slashed.matches(&url("https://example.com/a/b")));
    assert!(!slashed.matches(&url("https://example.com/a")));
}

#[test]
fn secure_cookies_require_https() {
    install_psl();
    let cookie = Cookie::parse(0, &url("https://example.com/"), "k=v; Secure").unwrap();
    assert!(cookie.secure());
    assert!(cookie.matches(&url("https://example.com/")));
    assert!(!cookie.matches(&url("http://example.com/")));
}

#[test]
fn attribute_last_write_wins() {
    install_psl();
    let cookie = Cookie::parse(
        0,
        &url("https://example.com/"),
        "k=v; Path=/first; Path=/second; SameSite=Lax; SameSite=Strict",
    )
    .unwrap();
    assert_eq!(cookie.path(), "/second");
    assert_eq!(cookie.same_site(), Some("Strict"));
}

#[test]
fn serialization() {
    install_psl();
    let base = url("https://example.com/");
    let simple = Cookie::parse(0, &base, "k=v").unwrap();
    assert_eq!(simple.to_string(), "k=v; path=/");

    let expired = Cookie::parse(0, &base, "k=v; Max-Age=0").unwrap();
    assert_eq!(expired.to_string(), "k=v; max-age=0; path=/");

    let full = Cookie::parse(
        0,
        &base,
        "k=v; Expires=Thu, 01 Jan 1970 00:00:02 GMT; Domain=example.com; Path=/p; Secure; HttpOnly; SameSite=Lax",
    )
    .unwrap();
    assert_eq!(
        full.to_string(),
        "k=v; expires=Thu, 01 Jan 1970 00:00:02 GMT; domain=example.com; path=/p; secure; httponly; samesite=Lax"
    );
}

#[test]
fn parse_all_reads_every_set_cookie_header() {
    install_psl();
    let headers = Headers::from_iter([
        ("Set-Cookie", "a=1"),
        ("set-cookie", "b=2; Max-Age=5"),
        ("Set-Cookie", "=broken"),
    ]);
    let cookies = Cookie::parse_all(0, &url("https://example.com/"), &headers);
    assert_eq!(cookies.len(), 2);
    assert_eq!(cookies[0].name(), "a");
    assert_eq!(cookies[1].name(), "b");
    assert_eq!(cookies[1].expires_at(), 5000);
}

#[test]
fn builder_validation() {
    assert!(Cookie::builder()
        .name("a")
        .value("b")
        .host_only_domain("example.com")
        .build()
        .is_ok());
    assert!(Cookie::builder()
        .name(" a ")
        .value("b")
        .host_only_domain("example.com")
        .build()
        .is_err());
    assert!(Cookie::builder()
        .name("a")
        .value("b")
        .host_only_domain("example.com")
        .path("relative")
        .build()
        .is_err());
    assert!(Cookie::builder()
        .name("a")
        .value("b")
        .build()
        .is_err());

    let expiring = Cookie::builder()
        .name("a")
        .value("b")
        .host_only_domain("example.com")
        .expires_at(-5)
        .build()
        .unwrap();
    assert_eq!(expiring.expires_at(), i64::MIN);
    assert!(expiring.persistent());

    let clamped = Cookie::builder()
        .name("a")
        .value("b")
        .host_only_domain("example.com")
        .expires_at(MAX_DATE + 1)
        .build()
        .unwrap();
    assert_eq!(clamped.expires_at(), MAX_DATE);
}

#[test]
fn memory_jar_matches_and_expires() {
    install_psl();
    let base = url("https://example.com/a/b");
    let jar = MemoryCookieJar::with_clock(FixedClock(1_000));

    let cookies = vec![
        Cookie::parse(0, &base, "session=1").unwrap(),
        Cookie::parse(0, &base, "deep=2; Path=/a/b").unwrap(),
        Cookie::parse(0, &base, "gone=3; Max-Age=0").unwrap(),
        Cookie::parse(0, &base, "other=4; Path=/z").unwrap(),
    ];
    jar.save_from_response(&base, cookies);

    let sent = jar.load_for_request(&url("https://example.com/a/b/c"));
    let names: Vec<&str> = sent.iter().map(Cookie::name).collect();
    // longest path first, expired and non-matching cookies withheld
    assert_eq!(names, ["deep", "session"]);

    // replacement by (name, domain, path)
    jar.save_from_response(&base, vec![Cookie::parse(0, &base, "session=updated").unwrap()]);
    let sent = jar.load_for_request(&url("https://example.com/a/b/c"));
    let session = sent.iter().find(|c| c.name() == "session").unwrap();
    assert_eq!(session.value(), "updated");
    assert_eq!(sent.len(), 2);
}

struct FixedClock(i64);

impl waymark_http::Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}
