//! The per-request view over a raw environment

use crate::collection::{KeyCase, ParamMap};
use crate::config::RequestConfig;
use crate::cookie::{Cookie, CookieJar};
use crate::environment::{keys, Environment};
use crate::error::{RequestError, Result};
use crate::items::Items;
use crate::lazy::{Lazy, Serialized};
use crate::params::{self, QUERY_DELIMITERS};
use crate::principal::Principal;
use crate::upgrade::UpgradeState;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

/// Server variable holding the peer address
pub const REMOTE_ADDR: &str = "REMOTE_ADDR";
/// Server variable holding the peer port
pub const REMOTE_PORT: &str = "REMOTE_PORT";
/// Server variable holding the local address
pub const LOCAL_ADDR: &str = "LOCAL_ADDR";
/// Server variable holding the local port
pub const LOCAL_PORT: &str = "LOCAL_PORT";
/// Server variable holding the protocol and version
pub const SERVER_PROTOCOL: &str = "SERVER_PROTOCOL";
/// Server variable holding the HTTP method
pub const REQUEST_METHOD: &str = "REQUEST_METHOD";

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Structured, lazily-built view of one request.
///
/// Every derived value (URL, query parameters, headers, server variables,
/// cookies, form) is built from the [`Environment`] the first time it is
/// asked for and cached for the life of the view. The view is `Send + Sync`;
/// concurrent first readers all observe the same cached value.
///
/// # Example
///
/// ```rust
/// use hostview_core::{Environment, ServerRequest};
///
/// let env = Environment::builder()
///     .scheme("https")
///     .host("example.com")
///     .path_base("/app")
///     .path("/search")
///     .query_string("q=rust+lang&page=2")
///     .header("Cookie", ["theme=dark; lang=en"])
///     .build();
///
/// let request = ServerRequest::new(env);
/// assert_eq!(
///     request.url().unwrap().as_str(),
///     "https://example.com/app/search?q=rust+lang&page=2"
/// );
/// assert_eq!(request.query_params().get("q"), Some("rust lang"));
/// assert_eq!(request.cookie("THEME").map(|c| c.value.as_str()), Some("dark"));
/// assert!(request.items().is_empty());
/// ```
pub struct ServerRequest {
    env: Arc<Environment>,
    config: RequestConfig,
    url: Lazy<Url>,
    query: Lazy<ParamMap>,
    headers: Lazy<ParamMap>,
    server_variables: Lazy<ParamMap>,
    cookies: Lazy<CookieJar>,
    form: Lazy<ParamMap, Serialized>,
    items: Items,
    upgrade: UpgradeState,
}

impl ServerRequest {
    /// Create a view with the default [`RequestConfig`]
    pub fn new(env: impl Into<Arc<Environment>>) -> Self {
        Self::with_config(env, RequestConfig::default())
    }

    /// Create a view with explicit settings
    pub fn with_config(env: impl Into<Arc<Environment>>, config: RequestConfig) -> Self {
        Self {
            env: env.into(),
            config,
            url: Lazy::new(),
            query: Lazy::new(),
            headers: Lazy::new(),
            server_variables: Lazy::new(),
            cookies: Lazy::new(),
            form: Lazy::new(),
            items: Items::new(),
            upgrade: UpgradeState::new(),
        }
    }

    /// The raw environment this view reads from
    pub fn environment(&self) -> &Arc<Environment> {
        &self.env
    }

    /// Settings this view was created with
    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    /// HTTP method, empty if the host did not supply one
    pub fn method(&self) -> String {
        self.env.string_or_empty(keys::REQUEST_METHOD)
    }

    /// Request scheme, `http` if the host did not supply one
    pub fn scheme(&self) -> String {
        self.env
            .get_string(keys::REQUEST_SCHEME)
            .filter(|s| !s.is_empty())
            .map_or_else(|| "http".to_owned(), |s| s.as_str().to_owned())
    }

    /// Path base followed by path
    pub fn local_path(&self) -> String {
        let base = self.env.string_or_empty(keys::REQUEST_PATH_BASE);
        let path = self.env.string_or_empty(keys::REQUEST_PATH);
        base + &path
    }

    /// Raw query string, without `?`
    pub fn query_string(&self) -> String {
        self.env.string_or_empty(keys::REQUEST_QUERY_STRING)
    }

    /// Absolute request URL.
    ///
    /// Built from scheme, host, port, path base plus path, and the raw query
    /// string. An empty query string adds no `?`.
    pub fn url(&self) -> Result<&Url> {
        self.url.get_or_try_init(|| self.build_url())
    }

    /// Decoded query parameters in source order. Keys are case-sensitive.
    pub fn query_params(&self) -> &ParamMap {
        self.query.get_or_init(|| {
            let map = parse_params(&self.query_string());
            crate::log_debug!(count = map.len(), "query parameters parsed");
            map
        })
    }

    /// Deserialize the raw query string into `T`
    pub fn query_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_urlencoded::from_str(&self.query_string())
            .map_err(|e| RequestError::malformed(format!("query string: {e}")))
    }

    /// Request headers, one value per raw list element. Name lookup ignores
    /// case.
    pub fn headers(&self) -> &ParamMap {
        self.headers.get_or_init(|| {
            let raw = self.env.headers();
            let mut map = ParamMap::new(KeyCase::Insensitive);
            for (name, values) in raw.iter() {
                let Some(values) = values else { continue };
                for value in values {
                    map.append(name, value.as_str());
                }
            }
            crate::log_debug!(count = map.len(), "request headers flattened");
            map
        })
    }

    /// First value of header `name`
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers().get(name)
    }

    /// Connection facts exposed CGI-style: `REMOTE_ADDR` plus whichever of
    /// `REMOTE_PORT`, `LOCAL_ADDR`, `LOCAL_PORT`, `SERVER_PROTOCOL` and
    /// `REQUEST_METHOD` the host supplied.
    pub fn server_variables(&self) -> &ParamMap {
        self.server_variables.get_or_init(|| {
            let mut map = ParamMap::new(KeyCase::Insensitive);
            let facts = [
                (REMOTE_ADDR, keys::SERVER_REMOTE_ADDRESS),
                (REMOTE_PORT, keys::SERVER_REMOTE_PORT),
                (LOCAL_ADDR, keys::SERVER_LOCAL_ADDRESS),
                (LOCAL_PORT, keys::SERVER_LOCAL_PORT),
                (SERVER_PROTOCOL, keys::REQUEST_PROTOCOL),
                (REQUEST_METHOD, keys::REQUEST_METHOD),
            ];
            for (variable, key) in facts {
                if let Some(value) = self.env.get_string(key).filter(|v| !v.is_empty()) {
                    map.insert(variable, value.as_str());
                }
            }
            map
        })
    }

    /// Request cookies from the first `Cookie` header value
    pub fn cookies(&self) -> &CookieJar {
        self.cookies.get_or_init(|| {
            let jar = self
                .env
                .headers()
                .first_value("Cookie")
                .map(CookieJar::parse)
                .unwrap_or_default();
            crate::log_debug!(count = jar.len(), "cookies parsed");
            jar
        })
    }

    /// Cookie named `name`, ignoring case
    pub fn cookie(&self, name: &str) -> Option<&Cookie> {
        self.cookies().get(name)
    }

    /// Decoded urlencoded form fields.
    ///
    /// The body is read at most once, even when many tasks ask at the same
    /// time. It is only read when `Content-Type` is
    /// `application/x-www-form-urlencoded`, or when the header is missing and
    /// [`RequestConfig::require_form_content_type`] is off; otherwise the form
    /// is empty. A failed read is returned as [`RequestError::BodyRead`] and
    /// nothing is cached, so a later call tries again.
    pub async fn form(&self) -> Result<&ParamMap> {
        self.form.get_or_try_init(|| self.read_form()).await
    }

    /// Current principal. Not cached; reflects the environment at call time.
    pub fn principal(&self) -> Option<Arc<dyn Principal>> {
        self.env.principal()
    }

    /// Request-scoped bag for passing data between components
    pub fn items(&self) -> &Items {
        &self.items
    }

    /// Upgrade state shared with the upgrade bridge
    pub fn upgrade_state(&self) -> &UpgradeState {
        &self.upgrade
    }

    fn build_url(&self) -> Result<Url> {
        let scheme = self.scheme();
        let headers = self.env.headers();
        let host_header = headers.first_value("Host").map(split_host_port);

        let host = match self.env.get_string(keys::REQUEST_HOST).filter(|h| !h.is_empty()) {
            Some(host) => host.as_str().to_owned(),
            None => host_header
                .map(|(h, _)| h.to_owned())
                .filter(|h| !h.is_empty())
                .unwrap_or_else(|| "localhost".to_owned()),
        };
        let port = self.request_port().or_else(|| host_header.and_then(|(_, p)| p));

        let mut authority = bracket_ipv6(&host);
        if let Some(port) = port {
            authority = format!("{authority}:{port}");
        }

        // `set_path` escapes `?` and `#`, so the path never leaks into the
        // query or fragment
        let mut url = Url::parse(&format!("{scheme}://{authority}/"))?;
        url.set_path(&self.local_path());
        let query = self.query_string();
        if !query.is_empty() {
            url.set_query(Some(&query));
        }
        crate::log_debug!(url = %url, "request url composed");
        Ok(url)
    }

    fn request_port(&self) -> Option<u16> {
        if let Some(port) = self.env.get::<u16>(keys::REQUEST_PORT) {
            return Some(*port);
        }
        self.env
            .get_string(keys::REQUEST_PORT)
            .and_then(|p| p.trim().parse().ok())
    }

    async fn read_form(&self) -> Result<ParamMap> {
        if !self.has_form_content_type() {
            crate::log_debug!("no urlencoded content type, form left empty");
            return Ok(ParamMap::new(KeyCase::Sensitive));
        }
        let Some(body) = self.env.body() else {
            return Ok(ParamMap::new(KeyCase::Sensitive));
        };

        let bytes = body
            .read_to_end(self.config.max_form_size)
            .await
            .map_err(|e| {
                crate::log_warn!(error = %e, "form body read failed");
                RequestError::from(e)
            })?;

        let map = parse_params(&String::from_utf8_lossy(&bytes));
        crate::log_debug!(bytes = bytes.len(), fields = map.len(), "form parsed");
        Ok(map)
    }

    fn has_form_content_type(&self) -> bool {
        match self.env.headers().first_value("Content-Type") {
            Some(value) => value
                .split(';')
                .next()
                .is_some_and(|media| media.trim().eq_ignore_ascii_case(FORM_URLENCODED)),
            None => !self.config.require_form_content_type,
        }
    }
}

impl std::fmt::Debug for ServerRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerRequest")
            .field("method", &self.method())
            .field("path", &self.local_path())
            .field("upgrade", &self.upgrade.phase())
            .finish()
    }
}

fn parse_params(input: &str) -> ParamMap {
    ParamMap::from_pairs(KeyCase::Sensitive, params::parse(input, QUERY_DELIMITERS))
}

/// Split a `Host` header into host and port. `[::1]:8080` keeps its
/// brackets off. A port that is not a number stays part of the host so that
/// URL composition rejects it.
fn split_host_port(value: &str) -> (&str, Option<u16>) {
    let value = value.trim();
    if let Some(rest) = value.strip_prefix('[') {
        return match rest.split_once(']') {
            Some((host, "")) => (host, None),
            Some((host, tail)) => match tail.strip_prefix(':').map(str::parse) {
                Some(Ok(port)) => (host, Some(port)),
                _ => (value, None),
            },
            None => (value, None),
        };
    }
    match value.rsplit_once(':') {
        Some((host, "")) if !host.contains(':') => (host, None),
        Some((host, port)) if !host.contains(':') => match port.parse() {
            Ok(port) => (host, Some(port)),
            Err(_) => {
                crate::log_debug!(host = value, "unparsable port in Host header");
                (value, None)
            }
        },
        _ => (value, None),
    }
}

fn bracket_ipv6(host: &str) -> String {
    if host.parse::<std::net::Ipv6Addr>().is_ok() {
        format!("[{host}]")
    } else {
        host.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::RawHeaders;
    use crate::error::BodyError;
    use crate::principal::GenericPrincipal;
    use crate::test_utils::{CountingBody, FailingBody};
    use crate::BufferedBody;
    use proptest::prelude::*;
    use serde::Deserialize;
    use std::time::Duration;

    fn request(env: Environment) -> ServerRequest {
        ServerRequest::new(env)
    }

    /// Route debug and warn events to the test harness output
    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    }

    mod composed_url {
        use super::*;

        #[test]
        fn empty_query_has_no_question_mark() {
            let req = request(Environment::builder().host("example.com").path("/chat").build());
            let url = req.url().unwrap();
            assert_eq!(url.as_str(), "http://example.com/chat");
            assert_eq!(url.query(), None);
        }

        #[test]
        fn query_is_attached_verbatim() {
            let req = request(
                Environment::builder()
                    .host("example.com")
                    .path("/")
                    .query_string("x=1&y=2")
                    .build(),
            );
            assert_eq!(req.url().unwrap().query(), Some("x=1&y=2"));
        }

        #[test]
        fn path_base_precedes_path_and_port_is_kept() {
            let req = request(
                Environment::builder()
                    .scheme("https")
                    .host("example.com")
                    .port(8443)
                    .path_base("/app")
                    .path("/hub")
                    .build(),
            );
            assert_eq!(req.url().unwrap().as_str(), "https://example.com:8443/app/hub");
        }

        #[test]
        fn default_port_is_elided() {
            let req = request(Environment::builder().host("example.com").port(80).build());
            assert_eq!(req.url().unwrap().as_str(), "http://example.com/");
        }

        #[test]
        fn host_header_is_the_fallback() {
            let req = request(
                Environment::builder()
                    .header("Host", ["api.local:9000"])
                    .path("/v1")
                    .build(),
            );
            assert_eq!(req.url().unwrap().as_str(), "http://api.local:9000/v1");

            let req = request(Environment::builder().header("host", ["[::1]:8080"]).build());
            assert_eq!(req.url().unwrap().as_str(), "http://[::1]:8080/");

            let req = request(Environment::new());
            assert_eq!(req.url().unwrap().as_str(), "http://localhost/");
        }

        #[test]
        fn ipv6_host_is_bracketed() {
            let req = request(Environment::builder().host("::1").port(5000).build());
            assert_eq!(req.url().unwrap().host_str(), Some("[::1]"));
        }

        #[test]
        fn unusable_host_is_an_error() {
            let req = request(Environment::builder().host("bad host").build());
            assert!(matches!(req.url(), Err(RequestError::InvalidUrl(_))));
        }

        #[test]
        fn split_host_port_cases() {
            assert_eq!(split_host_port("example.com"), ("example.com", None));
            assert_eq!(split_host_port("example.com:81"), ("example.com", Some(81)));
            assert_eq!(split_host_port("[fe80::1]"), ("fe80::1", None));
            assert_eq!(split_host_port("[fe80::1]:81"), ("fe80::1", Some(81)));
            assert_eq!(split_host_port("example.com:"), ("example.com", None));
            assert_eq!(split_host_port("example.com:abc"), ("example.com:abc", None));
            assert_eq!(split_host_port("[fe80::1]:x"), ("[fe80::1]:x", None));
        }

        #[test]
        fn bad_host_header_port_is_an_error() {
            let req = request(Environment::builder().header("Host", ["example.com:abc"]).build());
            assert!(matches!(req.url(), Err(RequestError::InvalidUrl(_))));
        }

        #[test]
        fn question_mark_in_path_stays_in_path() {
            let req = request(Environment::builder().host("example.com").path("/a?b").build());
            let url = req.url().unwrap();
            assert_eq!(url.as_str(), "http://example.com/a%3Fb");
            assert_eq!(url.path(), "/a%3Fb");
            assert_eq!(url.query(), None);
        }

        #[test]
        fn hash_in_path_is_not_a_fragment() {
            let req = request(
                Environment::builder()
                    .host("example.com")
                    .path_base("/x#y")
                    .path("/a#b")
                    .query_string("x=1")
                    .build(),
            );
            let url = req.url().unwrap();
            assert_eq!(url.path(), "/x%23y/a%23b");
            assert_eq!(url.query(), Some("x=1"));
            assert_eq!(url.fragment(), None);
        }

        #[test]
        fn relative_path_gets_a_leading_slash() {
            let req = request(Environment::builder().host("example.com").path("rooms").build());
            assert_eq!(req.url().unwrap().path(), "/rooms");
        }
    }

    mod query {
        use super::*;

        #[test]
        fn pairs_keep_order_and_duplicates() {
            let req = request(Environment::builder().query_string("b=2&a=1&b=3&flag").build());
            let params = req.query_params();
            assert_eq!(params.keys().collect::<Vec<_>>(), ["b", "a", "flag"]);
            assert_eq!(params.get_all("b"), ["2", "3"]);
            assert_eq!(params.get("flag"), Some(""));
            assert_eq!(params.get("B"), None);
        }

        #[test]
        fn cached_reference_is_stable() {
            let req = request(Environment::builder().query_string("a=1").build());
            let first = req.query_params() as *const ParamMap;
            req.environment()
                .insert(keys::REQUEST_QUERY_STRING, "a=2".to_string());
            assert_eq!(first, req.query_params() as *const ParamMap);
            assert_eq!(req.query_params().get("a"), Some("1"));
        }

        #[test]
        fn typed_query() {
            #[derive(Debug, Deserialize, PartialEq)]
            struct Search {
                q: String,
                page: u32,
            }

            let req = request(Environment::builder().query_string("q=rust&page=2").build());
            assert_eq!(
                req.query_as::<Search>().unwrap(),
                Search { q: "rust".into(), page: 2 }
            );

            let req = request(Environment::builder().query_string("q=rust&page=two").build());
            assert!(matches!(
                req.query_as::<Search>(),
                Err(RequestError::MalformedInput(_))
            ));
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn concurrent_first_access_sees_one_map(q in "[a-z=&;%+0-9]{0,40}") {
                let req = request(Environment::builder().query_string(q.clone()).build());
                let (a, b) = std::thread::scope(|s| {
                    let a = s.spawn(|| req.query_params() as *const ParamMap as usize);
                    let b = s.spawn(|| req.query_params() as *const ParamMap as usize);
                    (a.join().unwrap(), b.join().unwrap())
                });
                prop_assert_eq!(a, b);
                prop_assert_eq!(req.query_params(), &parse_params(&q));
            }
        }
    }

    mod headers {
        use super::*;

        #[test]
        fn null_lists_are_skipped_and_order_kept() {
            let req = request(
                Environment::builder()
                    .header("X-Foo", ["a", "b"])
                    .null_header("X-Bar")
                    .build(),
            );
            let headers = req.headers();
            assert_eq!(headers.get_all("x-foo"), ["a", "b"]);
            assert!(!headers.contains_key("X-Bar"));
            assert_eq!(headers.len(), 1);
            assert_eq!(req.header("X-FOO"), Some("a"));
        }

        #[test]
        fn same_name_in_different_case_merges() {
            let mut raw = RawHeaders::new();
            raw.insert("Accept", Some(vec!["text/html".into()]));
            raw.insert("accept", Some(vec!["application/json".into()]));
            let req = request(Environment::builder().headers(raw).build());
            assert_eq!(req.headers().get_all("ACCEPT"), ["text/html", "application/json"]);
            assert_eq!(req.headers().keys().collect::<Vec<_>>(), ["Accept"]);
        }
    }

    mod cookies {
        use super::*;

        #[test]
        fn first_occurrence_wins_ignoring_case() {
            let req = request(Environment::builder().header("Cookie", ["a=1; A=2; b=3"]).build());
            let jar = req.cookies();
            assert_eq!(jar.len(), 2);
            assert_eq!(req.cookie("a"), Some(&Cookie::new("a", "1")));
            assert_eq!(req.cookie("A"), Some(&Cookie::new("a", "1")));
            assert_eq!(req.cookie("b"), Some(&Cookie::new("b", "3")));
        }

        #[test]
        fn only_first_cookie_header_value_is_read() {
            let req = request(
                Environment::builder()
                    .header("Cookie", ["a=1", "b=2"])
                    .build(),
            );
            assert!(req.cookie("a").is_some());
            assert!(req.cookie("b").is_none());
        }

        #[test]
        fn missing_header_is_empty_jar() {
            assert!(request(Environment::new()).cookies().is_empty());
        }
    }

    mod server_variables {
        use super::*;

        #[test]
        fn remote_address_and_extras() {
            let req = request(
                Environment::builder()
                    .remote_address("10.0.0.7")
                    .remote_port("51000")
                    .protocol("HTTP/1.1")
                    .method("POST")
                    .build(),
            );
            let vars = req.server_variables();
            assert_eq!(vars.get(REMOTE_ADDR), Some("10.0.0.7"));
            assert_eq!(vars.get(REMOTE_PORT), Some("51000"));
            assert_eq!(vars.get(SERVER_PROTOCOL), Some("HTTP/1.1"));
            assert_eq!(vars.get(REQUEST_METHOD), Some("POST"));
            assert!(!vars.contains_key(LOCAL_ADDR));
        }

        #[test]
        fn empty_remote_address_is_omitted() {
            let req = request(Environment::builder().remote_address("").build());
            assert!(req.server_variables().is_empty());
        }
    }

    mod form {
        use super::*;

        fn form_env(body: impl crate::BodyReader + 'static) -> Environment {
            Environment::builder()
                .method("POST")
                .header("Content-Type", ["application/x-www-form-urlencoded; charset=utf-8"])
                .body(body)
                .build()
        }

        #[tokio::test]
        async fn parses_body_like_a_query() {
            let req = request(form_env(BufferedBody::new("name=Ada+Lovelace&lang=en&lang=fr")));
            let form = req.form().await.unwrap();
            assert_eq!(form.get("name"), Some("Ada Lovelace"));
            assert_eq!(form.get_all("lang"), ["en", "fr"]);
        }

        #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
        async fn concurrent_access_reads_body_once() {
            let body =
                Arc::new(CountingBody::new("a=1&b=2").with_delay(Duration::from_millis(50)));
            let req = Arc::new(request(form_env(Arc::clone(&body))));

            let mut tasks = tokio::task::JoinSet::new();
            for _ in 0..16 {
                let req = Arc::clone(&req);
                tasks.spawn(async move { req.form().await.map(|f| f.get("b").map(str::to_owned)) });
            }
            while let Some(result) = tasks.join_next().await {
                assert_eq!(result.unwrap().unwrap().as_deref(), Some("2"));
            }
            assert_eq!(body.reads(), 1);
        }

        #[tokio::test]
        async fn failed_read_is_not_cached() {
            init_tracing();
            let req = request(form_env(FailingBody::times(1, "a=1")));

            let err = req.form().await.unwrap_err();
            assert!(matches!(err, RequestError::BodyRead(BodyError::Read(_))));

            assert_eq!(req.form().await.unwrap().get("a"), Some("1"));
        }

        #[tokio::test]
        async fn persistent_failure_is_reported_on_every_access() {
            init_tracing();
            let req = request(form_env(FailingBody::always()));

            for _ in 0..3 {
                assert!(matches!(
                    req.form().await,
                    Err(RequestError::BodyRead(BodyError::Read(_)))
                ));
            }
        }

        #[tokio::test]
        async fn oversized_body_is_rejected() {
            let env = form_env(BufferedBody::new(vec![b'a'; 64]));
            let req = ServerRequest::with_config(env, RequestConfig::new().max_form_size(16));
            assert!(matches!(
                req.form().await,
                Err(RequestError::BodyRead(BodyError::TooLarge { limit: 16 }))
            ));
        }

        #[tokio::test]
        async fn other_content_types_leave_body_unread() {
            let body = Arc::new(CountingBody::new("{\"a\":1}"));
            let env = Environment::builder()
                .header("Content-Type", ["application/json"])
                .body(Arc::clone(&body))
                .build();
            let req = request(env);
            assert!(req.form().await.unwrap().is_empty());
            assert_eq!(body.reads(), 0);
        }

        #[tokio::test]
        async fn missing_content_type_follows_config() {
            let lenient = request(Environment::builder().body(BufferedBody::new("a=1")).build());
            assert_eq!(lenient.form().await.unwrap().get("a"), Some("1"));

            let strict = ServerRequest::with_config(
                Environment::builder().body(BufferedBody::new("a=1")).build(),
                RequestConfig::new().require_form_content_type(true),
            );
            assert!(strict.form().await.unwrap().is_empty());
        }

        #[tokio::test]
        async fn no_body_is_empty_form() {
            let req = request(Environment::new());
            assert!(req.form().await.unwrap().is_empty());
        }
    }

    #[test]
    fn items_start_empty_and_are_independent() {
        let req = request(
            Environment::builder()
                .host("example.com")
                .query_string("a=1")
                .header("Cookie", ["c=1"])
                .build(),
        );
        assert!(req.items().is_empty());

        let before = (
            req.url().unwrap().clone(),
            req.query_params().clone(),
            req.cookies().clone(),
        );
        req.items().insert("a", 99u32);
        req.items().insert("url", "elsewhere".to_string());
        assert!(req.items().remove("a"));

        assert_eq!(req.url().unwrap(), &before.0);
        assert_eq!(req.query_params(), &before.1);
        assert_eq!(req.cookies(), &before.2);
        assert_eq!(req.items().keys(), ["url"]);
    }

    #[test]
    fn principal_is_read_through() {
        let req = request(Environment::new());
        assert!(req.principal().is_none());

        req.environment()
            .set_principal(Arc::new(GenericPrincipal::new("ada").role("admin")));
        let user = req.principal().unwrap();
        assert_eq!(user.name(), Some("ada"));
        assert!(user.is_in_role("admin"));
    }

    #[test]
    fn direct_reads() {
        let req = request(
            Environment::builder()
                .method("PUT")
                .path_base("/api")
                .path("/items")
                .query_string("x=1")
                .build(),
        );
        assert_eq!(req.method(), "PUT");
        assert_eq!(req.scheme(), "http");
        assert_eq!(req.local_path(), "/api/items");
        assert_eq!(req.query_string(), "x=1");
    }

    #[test]
    fn request_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ServerRequest>();
    }
}
