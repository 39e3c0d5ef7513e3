//! # hostview-core
//!
//! Lazily-built, thread-safe request views over a host-supplied environment.
//!
//! A host describes each inbound request as an [`Environment`]: a string-keyed
//! bag of loosely-typed facts (scheme, path, raw query string, header lists,
//! a body reader...). [`ServerRequest`] wraps that bag and exposes structured
//! views of it: URL, query parameters, headers, cookies, server variables and
//! the urlencoded form. Each view is computed on first access, at most once,
//! even when many tasks ask at the same time.
//!
//! Most applications should depend on the `hostview` facade crate, which
//! also re-exports the WebSocket upgrade bridge.
//!
//! ## Quick Start
//!
//! ```rust
//! use hostview_core::{Environment, ServerRequest};
//!
//! let env = Environment::builder()
//!     .method("GET")
//!     .host("example.com")
//!     .path("/rooms")
//!     .query_string("sort=name&sort=size")
//!     .header("Cookie", ["sid=abc123"])
//!     .build();
//!
//! let request = ServerRequest::new(env);
//! assert_eq!(request.query_params().get_all("sort"), ["name", "size"]);
//! assert_eq!(request.cookie("sid").map(|c| c.value.as_str()), Some("abc123"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `tracing` | Debug and warning events through `tracing` (default) |
//! | `test-utils` | Counting and failing body readers for tests |

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod body;
mod collection;
mod config;
mod cookie;
mod environment;
mod error;
mod http_host;
mod items;
pub mod lazy;
mod log_macros;
pub mod params;
mod principal;
mod request;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
mod upgrade;

pub use body::{BodyReader, BufferedBody, HttpBody};
pub use collection::{KeyCase, ParamMap};
pub use config::{
    RequestConfig, DEFAULT_FORM_LIMIT, ENV_MAX_FORM_SIZE, ENV_REQUIRE_FORM_CONTENT_TYPE,
};
pub use cookie::{Cookie, CookieJar};
pub use environment::{keys, Environment, EnvironmentBuilder, RawHeaders};
pub use error::{BodyError, BoxError, ConfigError, RequestError, Result};
pub use items::Items;
pub use lazy::Lazy;
pub use principal::{GenericPrincipal, Principal};
pub use request::{
    ServerRequest, LOCAL_ADDR, LOCAL_PORT, REMOTE_ADDR, REMOTE_PORT, REQUEST_METHOD,
    SERVER_PROTOCOL,
};
pub use upgrade::{UpgradePhase, UpgradeState};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        BodyReader, BufferedBody, Cookie, CookieJar, Environment, GenericPrincipal, Items,
        KeyCase, ParamMap, Principal, RequestConfig, RequestError, ServerRequest, UpgradePhase,
    };
}
