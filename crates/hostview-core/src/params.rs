//! Key/value parameter parsing
//!
//! Query strings, form bodies and `Cookie` headers share one shape:
//! `key=value` pairs joined by a delimiter. [`parse`] turns such a string into
//! a lazy sequence of decoded pairs in source order. It never fails. Bad
//! percent escapes and non UTF-8 bytes degrade to the literal input.
//!
//! # Example
//!
//! ```rust
//! use hostview_core::params::{parse, QUERY_DELIMITERS};
//!
//! let pairs: Vec<_> = parse("q=rust+lang&page=2&flag", QUERY_DELIMITERS).collect();
//! assert_eq!(pairs, vec![
//!     ("q".to_string(), "rust lang".to_string()),
//!     ("page".to_string(), "2".to_string()),
//!     ("flag".to_string(), String::new()),
//! ]);
//! ```

use percent_encoding::percent_decode_str;
use std::borrow::Cow;
use std::str::Split;

/// Pair delimiters for query strings and urlencoded form bodies
pub const QUERY_DELIMITERS: &[char] = &['&', ';'];

/// Pair delimiters for the `Cookie` request header
pub const COOKIE_DELIMITERS: &[char] = &[',', ';'];

/// Parse `input` into decoded `(key, value)` pairs.
///
/// Segments that are empty or whitespace-only are skipped. A segment without
/// `=` becomes a key with an empty value. Decoded keys are trimmed; values
/// are not.
/// Duplicates are yielded as-is; deduplication belongs to the caller.
pub fn parse<'a>(input: &'a str, delimiters: &'a [char]) -> Params<'a> {
    Params {
        segments: input.split(delimiters),
    }
}

/// Iterator returned by [`parse`]
#[derive(Debug, Clone)]
pub struct Params<'a> {
    segments: Split<'a, &'a [char]>,
}

impl Iterator for Params<'_> {
    type Item = (String, String);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let segment = self.segments.next()?;
            if segment.trim().is_empty() {
                continue;
            }

            let (key, value) = segment.split_once('=').unwrap_or((segment, ""));
            return Some((decode(key).trim().to_owned(), decode(value).into_owned()));
        }
    }
}

/// URL-decode one component: `+` becomes a space, then `%XX` escapes are
/// resolved.
///
/// Escapes that are not two hex digits stay literal. If the decoded bytes are
/// not valid UTF-8 the input is returned unchanged.
pub fn decode(raw: &str) -> Cow<'_, str> {
    if !raw.contains(|c: char| c == '+' || c == '%') {
        return Cow::Borrowed(raw);
    }

    let spaced = raw.replace('+', " ");
    let decoded = match percent_decode_str(&spaced).decode_utf8() {
        Ok(text) => text.into_owned(),
        Err(_) => {
            crate::log_debug!(input = raw, "undecodable percent escape kept literal");
            return Cow::Borrowed(raw);
        }
    };
    Cow::Owned(decoded)
}
