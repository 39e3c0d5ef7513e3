//! The host-supplied raw environment
//!
//! Hosts describe each request as a bag of loosely-typed facts under
//! well-known string keys (see [`keys`]). [`ServerRequest`](crate::ServerRequest)
//! reads those facts and builds structured views from them on demand.
//!
//! # Example
//!
//! ```rust
//! use hostview_core::{keys, Environment};
//!
//! let env = Environment::builder()
//!     .scheme("https")
//!     .host("example.com")
//!     .path("/chat")
//!     .query_string("room=1")
//!     .header("Cookie", ["session=abc"])
//!     .remote_address("10.0.0.7")
//!     .build();
//!
//! assert_eq!(env.get_string(keys::REQUEST_PATH).as_deref().map(String::as_str), Some("/chat"));
//! assert!(env.contains_key(keys::REQUEST_HEADERS));
//! ```

use crate::body::BodyReader;
use crate::items::AnyMap;
use crate::principal::Principal;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Well-known environment keys
pub mod keys {
    /// `String`: request scheme (`http`, `https`)
    pub const REQUEST_SCHEME: &str = "request.Scheme";
    /// `String`: HTTP method
    pub const REQUEST_METHOD: &str = "request.Method";
    /// `String`: protocol and version, e.g. `HTTP/1.1`
    pub const REQUEST_PROTOCOL: &str = "request.Protocol";
    /// `String`: host name without port
    pub const REQUEST_HOST: &str = "request.Host";
    /// `u16`: port the request was addressed to
    pub const REQUEST_PORT: &str = "request.Port";
    /// `String`: path the application is mounted at
    pub const REQUEST_PATH_BASE: &str = "request.PathBase";
    /// `String`: path below the mount point
    pub const REQUEST_PATH: &str = "request.Path";
    /// `String`: raw query string, without the leading `?`
    pub const REQUEST_QUERY_STRING: &str = "request.QueryString";
    /// [`RawHeaders`](super::RawHeaders): request headers
    pub const REQUEST_HEADERS: &str = "request.Headers";
    /// `Arc<dyn BodyReader>`: request body
    pub const REQUEST_BODY: &str = "request.Body";
    /// `String`: peer address
    pub const SERVER_REMOTE_ADDRESS: &str = "server.RemoteIpAddress";
    /// `String`: peer port
    pub const SERVER_REMOTE_PORT: &str = "server.RemotePort";
    /// `String`: local address the connection arrived on
    pub const SERVER_LOCAL_ADDRESS: &str = "server.LocalIpAddress";
    /// `String`: local port the connection arrived on
    pub const SERVER_LOCAL_PORT: &str = "server.LocalPort";
    /// `Arc<dyn Principal>`: authenticated identity
    pub const SERVER_USER: &str = "server.User";
    /// Upgrade capability installed by hosts that support WebSockets
    pub const WEBSOCKET_ACCEPT: &str = "websocket.Accept";
}

/// Request headers as the host delivers them.
///
/// Each entry is a name with an optional value list. A `None` list means the
/// host knows the name but has no values for it; views skip such entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawHeaders {
    entries: Vec<(String, Option<Vec<String>>)>,
}

impl RawHeaders {
    /// Create an empty header set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value list for `name`, replacing an entry with the exact same
    /// spelling
    pub fn insert(&mut self, name: impl Into<String>, values: Option<Vec<String>>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = values,
            None => self.entries.push((name, values)),
        }
    }

    /// Append one value to `name`, creating the entry if needed
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, Some(values))) => values.push(value.into()),
            Some((_, slot)) => *slot = Some(vec![value.into()]),
            None => self.entries.push((name, Some(vec![value.into()]))),
        }
    }

    /// First value of the first non-empty list whose name matches, ignoring
    /// ASCII case
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .filter(|(n, _)| n.eq_ignore_ascii_case(name))
            .find_map(|(_, values)| values.as_ref()?.first())
            .map(String::as_str)
    }

    /// Entries in host order, including null lists
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&[String]>)> {
        self.entries
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_deref()))
    }

    /// Number of entries, including null lists
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N, V> FromIterator<(N, V)> for RawHeaders
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

/// String-keyed bag of request facts, owned by the host.
///
/// Values are stored type-erased and read back by type. The host may replace
/// a value while the request is in flight (authentication middleware swapping
/// the principal, for example); readers get whichever value is current.
#[derive(Default)]
pub struct Environment {
    values: AnyMap,
}

impl Environment {
    /// Create an empty environment
    pub fn new() -> Self {
        Self::default()
    }

    /// Start building an environment
    pub fn builder() -> EnvironmentBuilder {
        EnvironmentBuilder::default()
    }

    /// Store `value` under `key`. Returns true if a previous value was replaced.
    pub fn insert<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) -> bool {
        self.values.insert(key, value)
    }

    /// Fetch the value under `key` if it has type `T`
    pub fn get<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.values.get(key)
    }

    /// Remove `key`. Returns true if it was present.
    pub fn remove(&self, key: &str) -> bool {
        self.values.remove(key)
    }

    /// Whether `key` is present, whatever its type
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Keys currently present, sorted
    pub fn keys(&self) -> Vec<String> {
        self.values.keys()
    }

    /// Fetch a `String` value
    pub fn get_string(&self, key: &str) -> Option<Arc<String>> {
        self.get::<String>(key)
    }

    /// Fetch a `String` value, or `""` when absent
    pub(crate) fn string_or_empty(&self, key: &str) -> String {
        self.get_string(key)
            .map(|s| s.as_str().to_owned())
            .unwrap_or_default()
    }

    /// Request headers, empty when the host supplied none
    pub fn headers(&self) -> Arc<RawHeaders> {
        self.get::<RawHeaders>(keys::REQUEST_HEADERS)
            .unwrap_or_default()
    }

    /// The request body reader, if the host supplied one
    pub fn body(&self) -> Option<Arc<dyn BodyReader>> {
        self.get::<Arc<dyn BodyReader>>(keys::REQUEST_BODY)
            .map(|reader| Arc::clone(&*reader))
    }

    /// The current principal, if any
    pub fn principal(&self) -> Option<Arc<dyn Principal>> {
        self.get::<Arc<dyn Principal>>(keys::SERVER_USER)
            .map(|principal| Arc::clone(&*principal))
    }

    /// Replace the current principal
    pub fn set_principal(&self, principal: Arc<dyn Principal>) {
        self.insert(keys::SERVER_USER, principal);
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("keys", &self.values)
            .finish()
    }
}

/// Fluent builder for an [`Environment`]
#[derive(Debug, Default)]
pub struct EnvironmentBuilder {
    env: Environment,
    headers: RawHeaders,
}

impl EnvironmentBuilder {
    /// Request scheme
    pub fn scheme(self, scheme: impl Into<String>) -> Self {
        self.string(keys::REQUEST_SCHEME, scheme)
    }

    /// HTTP method
    pub fn method(self, method: impl Into<String>) -> Self {
        self.string(keys::REQUEST_METHOD, method)
    }

    /// Protocol and version
    pub fn protocol(self, protocol: impl Into<String>) -> Self {
        self.string(keys::REQUEST_PROTOCOL, protocol)
    }

    /// Host name
    pub fn host(self, host: impl Into<String>) -> Self {
        self.string(keys::REQUEST_HOST, host)
    }

    /// Port
    pub fn port(self, port: u16) -> Self {
        self.env.insert(keys::REQUEST_PORT, port);
        self
    }

    /// Application mount point
    pub fn path_base(self, path_base: impl Into<String>) -> Self {
        self.string(keys::REQUEST_PATH_BASE, path_base)
    }

    /// Path below the mount point
    pub fn path(self, path: impl Into<String>) -> Self {
        self.string(keys::REQUEST_PATH, path)
    }

    /// Raw query string, without `?`
    pub fn query_string(self, query: impl Into<String>) -> Self {
        self.string(keys::REQUEST_QUERY_STRING, query)
    }

    /// Header with its value list
    pub fn header<V: Into<String>>(
        mut self,
        name: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.headers.insert(name, Some(values));
        self
    }

    /// Header the host knows by name but has no value list for
    pub fn null_header(mut self, name: impl Into<String>) -> Self {
        self.headers.insert(name, None);
        self
    }

    /// Replace all headers
    pub fn headers(mut self, headers: RawHeaders) -> Self {
        self.headers = headers;
        self
    }

    /// Request body
    pub fn body(self, body: impl BodyReader + 'static) -> Self {
        let reader: Arc<dyn BodyReader> = Arc::new(body);
        self.env.insert(keys::REQUEST_BODY, reader);
        self
    }

    /// Peer address
    pub fn remote_address(self, addr: impl Into<String>) -> Self {
        self.string(keys::SERVER_REMOTE_ADDRESS, addr)
    }

    /// Peer port
    pub fn remote_port(self, port: impl Into<String>) -> Self {
        self.string(keys::SERVER_REMOTE_PORT, port)
    }

    /// Local address
    pub fn local_address(self, addr: impl Into<String>) -> Self {
        self.string(keys::SERVER_LOCAL_ADDRESS, addr)
    }

    /// Local port
    pub fn local_port(self, port: impl Into<String>) -> Self {
        self.string(keys::SERVER_LOCAL_PORT, port)
    }

    /// Authenticated principal
    pub fn principal(self, principal: impl Principal + 'static) -> Self {
        self.env.set_principal(Arc::new(principal));
        self
    }

    /// Any other value
    pub fn value<T: Any + Send + Sync>(self, key: impl Into<String>, value: T) -> Self {
        self.env.insert(key, value);
        self
    }

    /// Finish the environment
    pub fn build(self) -> Environment {
        if !self.headers.is_empty() {
            self.env.insert(keys::REQUEST_HEADERS, self.headers);
        }
        self.env
    }

    fn string(self, key: &str, value: impl Into<String>) -> Self {
        self.env.insert(key, value.into());
        self
    }
}
