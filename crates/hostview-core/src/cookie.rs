//! Request cookies

use crate::params::{self, COOKIE_DELIMITERS};
use std::collections::HashMap;

/// A single request cookie
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name, as spelled by the client
    pub name: String,
    /// Decoded cookie value
    pub value: String,
}

impl Cookie {
    /// Create a cookie
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Cookies sent with a request, keyed case-insensitively.
///
/// When a name appears more than once, the first occurrence wins and later
/// ones are discarded.
///
/// ```rust
/// use hostview_core::CookieJar;
///
/// let jar = CookieJar::parse("a=1; A=2; b=3");
/// assert_eq!(jar.len(), 2);
/// assert_eq!(jar.value("A"), Some("1"));
/// assert_eq!(jar.value("b"), Some("3"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    cookies: Vec<Cookie>,
    index: HashMap<String, usize>,
}

impl CookieJar {
    /// Create an empty jar
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `Cookie` header value. Both `;` and `,` separate cookies.
    pub fn parse(header: &str) -> Self {
        let mut jar = Self::new();
        for (name, value) in params::parse(header, COOKIE_DELIMITERS) {
            jar.add(Cookie { name, value });
        }
        jar
    }

    /// Add `cookie` unless a cookie with the same name is already present.
    ///
    /// Returns whether the cookie was kept.
    pub fn add(&mut self, cookie: Cookie) -> bool {
        let folded = cookie.name.to_ascii_lowercase();
        if self.index.contains_key(&folded) {
            return false;
        }
        self.index.insert(folded, self.cookies.len());
        self.cookies.push(cookie);
        true
    }

    /// Look up a cookie by name, ignoring ASCII case
    pub fn get(&self, name: &str) -> Option<&Cookie> {
        self.index
            .get(&name.to_ascii_lowercase())
            .map(|&slot| &self.cookies[slot])
    }

    /// Value of the named cookie
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|c| c.value.as_str())
    }

    /// Whether the named cookie is present
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&name.to_ascii_lowercase())
    }

    /// Cookies in the order they were sent
    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.iter()
    }

    /// Number of distinct cookies
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// True when the request carried no cookies
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}
