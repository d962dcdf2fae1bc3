use async_trait::async_trait;
use futures_lite::future::block_on;
use pretty_assertions::assert_eq;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use waymark_client::{
    gzip, Chain, Error, HttpClient, Interceptor, RequestOptions, Result, Transport,
};
use waymark_http::{
    Clock, MemoryCookieJar, Request, Response, ResponseBody, StaticBody,
};

/// One scripted exchange: status, headers, body.
type Script = (u16, Vec<(&'static str, String)>, &'static str);

#[derive(Default)]
struct FakeTransport {
    script: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<Request>>,
}

impl FakeTransport {
    fn scripted(script: impl IntoIterator<Item = Script>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn dispatch(&self, request: Request, _options: &RequestOptions) -> Result<Response> {
        self.requests.lock().unwrap().push(request.clone());
        let (code, headers, body) = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("transport script exhausted");
        let mut builder = Response::builder()
            .request(request)
            .code(code)
            .body(ResponseBody::from_bytes(None, body.as_bytes()));
        for (name, value) in headers {
            builder = builder.add_header(name, value).map_err(Error::Http)?;
        }
        Ok(builder.build().map_err(Error::Http)?)
    }
}

fn client(transport: &Arc<FakeTransport>) -> HttpClient {
    HttpClient::builder()
        .transport(transport.clone())
        .build()
        .unwrap()
}

fn get(url: &str) -> Request {
    Request::builder().url_str(url).unwrap().build().unwrap()
}

fn redirect(code: u16, location: &str) -> Script {
    (code, vec![("Location", location.to_string())], "")
}

fn ok() -> Script {
    (200, Vec::new(), "done")
}

#[test]
fn redirects_chain_into_prior_responses() {
    let transport = FakeTransport::scripted([
        redirect(302, "/b"),
        redirect(302, "/c"),
        ok(),
    ]);
    let response = block_on(client(&transport).execute(get("http://example.com/a"))).unwrap();

    assert_eq!(response.code(), 200);
    assert_eq!(response.request().url().encoded_path(), "/c");

    let prior = response.prior_response().unwrap();
    assert_eq!(prior.code(), 302);
    let prior_prior = prior.prior_response().unwrap();
    assert_eq!(prior_prior.code(), 302);
    assert!(prior_prior.prior_response().is_none());

    // prior bodies are unreadable placeholders
    assert_eq!(
        transport
            .requests()
            .iter()
            .map(|request| request.url().encoded_path().to_string())
            .collect::<Vec<_>>(),
        ["/a", "/b", "/c"]
    );
}

#[test]
fn redirects_can_be_disabled() {
    let transport = FakeTransport::scripted([redirect(302, "/b")]);
    let client = HttpClient::builder()
        .transport(transport.clone())
        .follow_redirects(false)
        .build()
        .unwrap();
    let response = block_on(client.execute(get("http://example.com/a"))).unwrap();
    assert_eq!(response.code(), 302);
    assert_eq!(transport.requests().len(), 1);
}

#[test]
fn cross_scheme_redirects_respect_the_ssl_flag() {
    let transport = FakeTransport::scripted([redirect(302, "https://example.com/secure")]);
    let pinned = HttpClient::builder()
        .transport(transport.clone())
        .follow_ssl_redirects(false)
        .build()
        .unwrap();
    let response = block_on(pinned.execute(get("http://example.com/a"))).unwrap();
    assert_eq!(response.code(), 302);

    let transport = FakeTransport::scripted([redirect(302, "https://example.com/secure"), ok()]);
    let response = block_on(client(&transport).execute(get("http://example.com/a"))).unwrap();
    assert_eq!(response.code(), 200);
    assert_eq!(transport.requests()[1].url().scheme(), "https");
}

#[test]
fn too_many_follow_ups_fails_with_twenty_one() {
    let transport = FakeTransport::scripted((0..21).map(|_| redirect(302, "/loop")));
    let error = block_on(client(&transport).execute(get("http://example.com/"))).unwrap_err();
    assert_eq!(error.to_string(), "Too many follow-up requests: 21");
}

#[test]
fn authorization_is_scrubbed_across_origins() {
    // same origin: kept
    let transport = FakeTransport::scripted([redirect(302, "/next"), ok()]);
    let request = Request::builder()
        .url_str("http://example.com/a")
        .unwrap()
        .header("Authorization", "Bearer token")
        .unwrap()
        .build()
        .unwrap();
    block_on(client(&transport).execute(request)).unwrap();
    assert_eq!(
        transport.requests()[1].header("Authorization"),
        Some("Bearer token")
    );

    // different host: stripped
    let transport = FakeTransport::scripted([redirect(302, "http://other.example/"), ok()]);
    let request = Request::builder()
        .url_str("http://example.com/a")
        .unwrap()
        .header("Authorization", "Bearer token")
        .unwrap()
        .build()
        .unwrap();
    block_on(client(&transport).execute(request)).unwrap();
    assert_eq!(transport.requests()[1].header("Authorization"), None);

    // same host, different port: stripped
    let transport = FakeTransport::scripted([redirect(302, "http://example.com:8080/a"), ok()]);
    let request = Request::builder()
        .url_str("http://example.com/a")
        .unwrap()
        .header("Authorization", "Bearer token")
        .unwrap()
        .build()
        .unwrap();
    block_on(client(&transport).execute(request)).unwrap();
    assert_eq!(transport.requests()[1].header("Authorization"), None);
}

#[test]
fn post_becomes_get_on_303_but_not_on_307() {
    let transport = FakeTransport::scripted([redirect(303, "/see-other"), ok()]);
    let request = Request::builder()
        .url_str("http://example.com/submit")
        .unwrap()
        .post(Arc::new(StaticBody::from("payload")))
        .build()
        .unwrap();
    block_on(client(&transport).execute(request)).unwrap();
    let followed = &transport.requests()[1];
    assert_eq!(followed.method(), waymark_http::Method::Get);
    assert!(followed.body().is_none());
    assert_eq!(followed.header("Content-Type"), None);
    assert_eq!(followed.header("Content-Length"), None);

    let transport = FakeTransport::scripted([redirect(307, "/temporary"), ok()]);
    let request = Request::builder()
        .url_str("http://example.com/submit")
        .unwrap()
        .post(Arc::new(StaticBody::from("payload")))
        .build()
        .unwrap();
    block_on(client(&transport).execute(request)).unwrap();
    let followed = &transport.requests()[1];
    assert_eq!(followed.method(), waymark_http::Method::Post);
    assert!(followed.body().is_some());
}

#[test]
fn propfind_keeps_its_body_across_any_redirect() {
    let transport = FakeTransport::scripted([redirect(302, "/moved"), ok()]);
    let request = Request::builder()
        .url_str("http://example.com/dav")
        .unwrap()
        .method(waymark_http::Method::Propfind)
        .body(Some(Arc::new(StaticBody::from("<propfind/>"))))
        .build()
        .unwrap();
    block_on(client(&transport).execute(request)).unwrap();
    let followed = &transport.requests()[1];
    assert_eq!(followed.method(), waymark_http::Method::Propfind);
    assert!(followed.body().is_some());
}

#[test]
fn redirect_without_location_stands() {
    let transport = FakeTransport::scripted([(302, Vec::new(), "gone")]);
    let response = block_on(client(&transport).execute(get("http://example.com/"))).unwrap();
    assert_eq!(response.code(), 302);
    assert_eq!(transport.requests().len(), 1);
}

#[test]
fn one_shot_bodies_refuse_redirects() {
    let transport = FakeTransport::scripted([redirect(307, "/again")]);
    let request = Request::builder()
        .url_str("http://example.com/submit")
        .unwrap()
        .post(Arc::new(StaticBody::from("once").one_shot()))
        .build()
        .unwrap();
    let response = block_on(client(&transport).execute(request)).unwrap();
    assert_eq!(response.code(), 307);
    assert_eq!(transport.requests().len(), 1);
}

#[test]
fn bridge_normalizes_the_network_request() {
    let transport = FakeTransport::scripted([ok()]);
    let request = Request::builder()
        .url_str("http://example.com:8080/upload")
        .unwrap()
        .post(Arc::new(
            StaticBody::from("body").with_media_type("text/plain".parse().unwrap()),
        ))
        .build()
        .unwrap();
    block_on(client(&transport).execute(request)).unwrap();

    let sent = &transport.requests()[0];
    assert_eq!(sent.header("Host"), Some("example.com:8080"));
    assert_eq!(sent.header("Content-Type"), Some("text/plain"));
    assert_eq!(sent.header("Content-Length"), Some("4"));
    assert_eq!(
        sent.header("User-Agent"),
        Some(concat!("waymark/", env!("CARGO_PKG_VERSION")))
    );
    assert_eq!(sent.header("Accept-Encoding"), None);
}

#[test]
fn bridge_respects_explicit_host_and_user_agent() {
    let transport = FakeTransport::scripted([ok()]);
    let request = Request::builder()
        .url_str("http://example.com/")
        .unwrap()
        .header("Host", "override.example")
        .unwrap()
        .header("User-Agent", "custom/1.0")
        .unwrap()
        .build()
        .unwrap();
    block_on(client(&transport).execute(request)).unwrap();

    let sent = &transport.requests()[0];
    assert_eq!(sent.header("Host"), Some("override.example"));
    assert_eq!(sent.header("User-Agent"), Some("custom/1.0"));
}

struct FixedClock(i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

#[test]
fn cookies_round_trip_through_the_jar() {
    let transport = FakeTransport::scripted([
        (
            200,
            vec![("Set-Cookie", "session=abc; Path=/".to_string())],
            "",
        ),
        ok(),
    ]);
    let client = HttpClient::builder()
        .transport(transport.clone())
        .cookie_jar(MemoryCookieJar::with_clock(FixedClock(0)))
        .clock(FixedClock(0))
        .build()
        .unwrap();

    block_on(client.execute(get("http://example.com/login"))).unwrap();
    assert_eq!(transport.requests()[0].header("Cookie"), None);

    block_on(client.execute(get("http://example.com/account"))).unwrap();
    assert_eq!(transport.requests()[1].header("Cookie"), Some("session=abc"));
}

struct Tag(&'static str, Arc<Mutex<Vec<String>>>);

#[async_trait]
impl Interceptor for Tag {
    async fn intercept(&self, chain: Chain<'_>) -> Result<Response> {
        self.1.lock().unwrap().push(format!("{}:before", self.0));
        let response = chain.proceed(chain.request().clone()).await;
        self.1.lock().unwrap().push(format!("{}:after", self.0));
        response
    }
}

#[test]
fn user_interceptors_run_outermost_in_order() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let transport = FakeTransport::scripted([ok()]);
    let client = HttpClient::builder()
        .transport(transport.clone())
        .add_interceptor(Tag("first", events.clone()))
        .add_interceptor(Tag("second", events.clone()))
        .build()
        .unwrap();
    block_on(client.execute(get("http://example.com/"))).unwrap();
    assert_eq!(
        *events.lock().unwrap(),
        [
            "first:before",
            "second:before",
            "second:after",
            "first:after"
        ]
    );
}

struct ShortCircuit;

#[async_trait]
impl Interceptor for ShortCircuit {
    async fn intercept(&self, chain: Chain<'_>) -> Result<Response> {
        Ok(Response::builder()
            .request(chain.request().clone())
            .code(503)
            .message("synthesized")
            .body(ResponseBody::from_bytes(None, &b"not today"[..]))
            .build()
            .map_err(Error::Http)?)
    }
}

#[test]
fn interceptors_may_short_circuit_the_transport() {
    let transport = FakeTransport::scripted([ok()]);
    let client = HttpClient::builder()
        .transport(transport.clone())
        .add_interceptor(ShortCircuit)
        .build()
        .unwrap();
    let mut response = block_on(client.execute(get("http://example.com/"))).unwrap();
    assert_eq!(response.code(), 503);
    assert_eq!(
        block_on(response.body_mut().read_string()).unwrap(),
        "not today"
    );
    assert!(transport.requests().is_empty());
}

struct SlowTransport;

#[async_trait]
impl Transport for SlowTransport {
    async fn dispatch(&self, request: Request, _options: &RequestOptions) -> Result<Response> {
        async_io::Timer::after(Duration::from_secs(5)).await;
        Ok(Response::builder()
            .request(request)
            .code(200)
            .build()
            .map_err(Error::Http)?)
    }
}

#[test]
fn timeouts_cancel_the_call() {
    let client = HttpClient::builder()
        .transport(SlowTransport)
        .execute_timeout(Duration::from_millis(50))
        .build()
        .unwrap();
    let error = block_on(client.execute(get("http://example.com/"))).unwrap_err();
    assert!(matches!(error, Error::Timeout(_)));

    // a fast exchange is unaffected by the same timeout
    let transport = FakeTransport::scripted([ok()]);
    let client = HttpClient::builder()
        .transport(transport.clone())
        .execute_timeout(Duration::from_millis(500))
        .build()
        .unwrap();
    assert_eq!(
        block_on(client.execute(get("http://example.com/"))).unwrap().code(),
        200
    );
}

#[test]
fn new_builder_snapshots_configuration() {
    let transport = FakeTransport::scripted([redirect(302, "/b")]);
    let client = HttpClient::builder()
        .transport(transport.clone())
        .follow_redirects(false)
        .build()
        .unwrap();

    // deriving and mutating a new builder leaves the original alone
    let _other = client.new_builder().follow_redirects(true).build().unwrap();
    let response = block_on(client.execute(get("http://example.com/a"))).unwrap();
    assert_eq!(response.code(), 302);
}

#[test]
fn gzipped_requests_flow_through_the_chain() {
    let transport = FakeTransport::scripted([ok()]);
    let request = gzip(
        Request::builder()
            .url_str("http://example.com/upload")
            .unwrap()
            .post(Arc::new(StaticBody::from("squeeze me")))
            .build()
            .unwrap(),
    )
    .unwrap();
    block_on(client(&transport).execute(request)).unwrap();

    let sent = &transport.requests()[0];
    assert_eq!(sent.header("Content-Encoding"), Some("gzip"));
    // compressed length is unknown, so the bridge removes content-length
    assert_eq!(sent.header("Content-Length"), None);
}
