//! # hostview
//!
//! Structured, lazily-built HTTP request views over whatever a host hands you.
//!
//! Hosts describe a request as a loosely-typed [`Environment`]. Wrapping it in
//! a [`ServerRequest`] gives you the URL, query parameters, headers, cookies,
//! server variables and urlencoded form, each parsed on first use and
//! computed at most once no matter how many tasks ask concurrently. With the
//! `ws` feature the same request can be upgraded to a WebSocket through the
//! host's accept primitive, or fail cleanly when the host has none.
//!
//! ## Quick Start
//!
//! ```rust
//! use hostview::prelude::*;
//!
//! let env = Environment::builder()
//!     .scheme("https")
//!     .host("example.com")
//!     .path("/search")
//!     .query_string("q=rust+lang&page=2")
//!     .header("Accept", ["text/html", "application/json"])
//!     .build();
//!
//! let request = ServerRequest::new(env);
//! assert_eq!(request.query_params().get("q"), Some("rust lang"));
//! assert_eq!(request.headers().get_all("accept").len(), 2);
//! assert_eq!(
//!     request.url().map(|u| u.as_str().to_owned()).ok().as_deref(),
//!     Some("https://example.com/search?q=rust+lang&page=2")
//! );
//! ```
//!
//! ## Optional Features
//!
//! - `ws` - WebSocket upgrade bridge (default)
//! - `tracing` - debug/warn/error events through `tracing` (default)
//! - `test-utils` - counting and failing body readers, in-memory upgrade host
//! - `full` - all of the above except `test-utils`
//!
//! ```toml
//! [dependencies]
//! hostview = { version = "0.1", default-features = false, features = ["ws"] }
//! ```

// Re-export core functionality
pub use hostview_core::*;

/// WebSocket upgrade bridge
#[cfg(feature = "ws")]
pub mod ws {
    pub use hostview_ws::*;
}

#[cfg(feature = "ws")]
pub use hostview_ws::{
    AcceptOptions, AcceptWebSocket, Capability, Message, UpgradeTask, WebSocket, WebSocketError,
};

/// Prelude module - import everything you need with `use hostview::prelude::*`
pub mod prelude {
    pub use hostview_core::prelude::*;

    #[cfg(feature = "ws")]
    pub use hostview_ws::prelude::*;

    pub use serde::{Deserialize, Serialize};
}
