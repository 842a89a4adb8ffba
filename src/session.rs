//! Caller session credentials
//!
//! The remote tool server authenticates every call with the caller's
//! platform session. This module defines [`SessionToken`] and the resolver
//! that finds one on an inbound request.
//!
//! Precedence, first non-blank match wins:
//!
//! 1. an explicit token supplied by the immediate caller (e.g. a body field)
//! 2. header `windsessionid`
//! 3. header `wind.sessionid`
//! 4. header `X-Session-Id`
//! 5. cookie `windsessionid`
//! 6. cookie `wind.sessionid`
//!
//! Cookie values are URL-decoded. An absent token is not an error here; the
//! client reports it as a precondition failure.

use std::fmt;

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use percent_encoding::percent_decode_str;

/// Header names searched, in order.
pub const SESSION_HEADER_PRECEDENCE: &[&str] = &["windsessionid", "wind.sessionid", "x-session-id"];

/// Cookie names searched, in order, after all headers.
pub const SESSION_COOKIE_PRECEDENCE: &[&str] = &["windsessionid", "wind.sessionid"];

/// An opaque caller session identifier.
///
/// `Debug` output is redacted so tokens never end up in logs.
///
/// # Examples
///
/// ```
/// use toolreg::session::SessionToken;
///
/// let token = SessionToken::new("abc123").unwrap();
/// assert_eq!(token.as_str(), "abc123");
/// assert!(!format!("{token:?}").contains("abc123"));
/// assert!(SessionToken::new("  ").is_none());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap a token, trimming whitespace. Blank input yields `None`.
    pub fn new(value: impl AsRef<str>) -> Option<Self> {
        let trimmed = value.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// The raw token value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

/// Resolve the caller's session token from an inbound request.
///
/// # Arguments
///
/// * `explicit` - Token passed directly by the caller, highest precedence.
/// * `headers` - The inbound request headers, including `Cookie`.
///
/// # Examples
///
/// ```
/// use axum::http::HeaderMap;
/// use toolreg::session::resolve_session;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("cookie", "theme=dark; windsessionid=s%3A42".parse().unwrap());
/// let token = resolve_session(None, &headers).unwrap();
/// assert_eq!(token.as_str(), "s:42");
/// ```
pub fn resolve_session(explicit: Option<&str>, headers: &HeaderMap) -> Option<SessionToken> {
    if let Some(token) = explicit.and_then(SessionToken::new) {
        return Some(token);
    }

    for name in SESSION_HEADER_PRECEDENCE {
        let value = headers.get(*name).and_then(|v| v.to_str().ok());
        if let Some(token) = value.and_then(SessionToken::new) {
            return Some(token);
        }
    }

    for name in SESSION_COOKIE_PRECEDENCE {
        if let Some(token) = find_cookie(headers, name).and_then(SessionToken::new) {
            return Some(token);
        }
    }

    None
}

/// Find a cookie by name across every `Cookie` header and URL-decode it.
fn find_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| url_decode(value.trim().trim_matches('"')))
}

/// URL-decode a whole cookie value (`%XX` and `+` as space).
///
/// The value is decoded as one string, so `=` and `&` inside it survive.
fn url_decode(value: &str) -> String {
    percent_decode_str(&value.replace('+', " "))
        .decode_utf8_lossy()
        .into_owned()
}
