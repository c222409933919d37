//! Cookie jar captured from the identity provider.
//!
//! The provider hands back its session cookies on the
//! session-establishment response; we keep them as a plain name→value
//! map. The session ID itself is not stored separately anywhere — it is
//! always derived from the `sid` cookie.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Name of the provider cookie carrying the session ID.
pub const SESSION_COOKIE: &str = "sid";

/// Session cookies as a name→value map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieJar {
    cookies: BTreeMap<String, String>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a jar from `Set-Cookie` header values. Only the leading
    /// `name=value` pair of each header is kept; attributes (`Path`,
    /// `Secure`, ...) are dropped. Unparseable headers are skipped.
    pub fn from_set_cookie<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        let mut jar = Self::new();
        for value in values {
            let pair = value.split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=') {
                let name = name.trim();
                if !name.is_empty() {
                    jar.insert(name, value.trim());
                }
            }
        }
        jar
    }

    pub fn insert(&mut self, name: &str, value: &str) {
        self.cookies.insert(name.to_string(), value.to_string());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Value of the `sid` cookie, if present.
    pub fn session_id(&self) -> Option<&str> {
        self.get(SESSION_COOKIE)
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Format the jar for a `Cookie` request header: `name=value` pairs
    /// joined with `;`, no trailing separator. Empty jar → empty string.
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// A jar reduced to just the `sid` cookie, for user-context calls
    /// scoped to one session. Empty if there is no `sid`.
    pub fn session_only(&self) -> Self {
        let mut jar = Self::new();
        if let Some(sid) = self.session_id() {
            jar.insert(SESSION_COOKIE, sid);
        }
        jar
    }
}

impl FromIterator<(String, String)> for CookieJar {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            cookies: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jar(pairs: &[(&str, &str)]) -> CookieJar {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_jar_formats_to_empty_string() {
        assert_eq!(CookieJar::new().header_value(), "");
    }

    #[test]
    fn header_value_has_one_part_per_cookie() {
        let jar = jar(&[("first", "first"), ("second", "second")]);
        let header = jar.header_value();
        let parts: Vec<&str> = header.split(';').collect();

        assert_eq!(parts.len(), 2);
        assert!(parts.contains(&"first=first"));
        assert!(parts.contains(&"second=second"));
    }

    #[test]
    fn header_value_has_no_trailing_separator() {
        let jar = jar(&[("sid", "abc")]);
        assert_eq!(jar.header_value(), "sid=abc");
    }

    #[test]
    fn every_part_is_name_equals_value() {
        let jar = jar(&[("a", "1"), ("b", "2"), ("c", "3")]);
        for part in jar.header_value().split(';') {
            let (name, value) = part.split_once('=').expect("part must be name=value");
            assert_eq!(jar.get(name), Some(value));
        }
    }

    #[test]
    fn session_id_reads_sid_cookie() {
        let jar = jar(&[("sid", "session-123"), ("other", "x")]);
        assert_eq!(jar.session_id(), Some("session-123"));
        assert_eq!(CookieJar::new().session_id(), None);
    }

    #[test]
    fn session_only_keeps_just_sid() {
        let jar = jar(&[("sid", "session-123"), ("JSESSIONID", "y"), ("DT", "z")]);
        let only = jar.session_only();
        assert_eq!(only.len(), 1);
        assert_eq!(only.header_value(), "sid=session-123");
    }

    #[test]
    fn from_set_cookie_keeps_leading_pair_only() {
        let jar = CookieJar::from_set_cookie([
            "sid=abc123; Path=/; Secure; HttpOnly",
            "DT=device-token; Expires=Wed, 21 Oct 2026 07:28:00 GMT",
            "malformed-no-equals",
        ]);

        assert_eq!(jar.len(), 2);
        assert_eq!(jar.get("sid"), Some("abc123"));
        assert_eq!(jar.get("DT"), Some("device-token"));
    }

    #[test]
    fn serde_round_trip() {
        let jar = jar(&[("sid", "abc"), ("DT", "def")]);
        let encoded = serde_json::to_string(&jar).unwrap();
        let decoded: CookieJar = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, jar);
    }
}
