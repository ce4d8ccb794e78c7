//! Version tokens and schema digests.
//!
//! A version token is an opaque string that changes iff a table is
//! considered stale. Two sources feed it:
//!
//! - **Introspection tokens** come from the catalog (the last-write
//!   transaction id of the table's `pg_class` row) and detect schema drift.
//! - **Write tokens** are minted on every successful mutation (millisecond
//!   timestamps) and invalidate the data plane, because every data-plane
//!   URL embeds the token that was current when it was written.

use sha2::{Digest, Sha256};
use std::fmt;

/// Opaque per-table version token.
///
/// Tokens are compared only for equality; their internal shape (catalog
/// xid or decimal timestamp) is an implementation detail.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(String);

impl VersionToken {
    /// Wrap a raw token string.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw token string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for VersionToken {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Mint a fresh write-time token.
///
/// Tokens are millisecond timestamps rendered as decimal strings and
/// strictly increase per table: when the clock has not advanced past the
/// previous token (two mutations inside one millisecond, or clock skew),
/// the new token is the previous one plus one.
#[must_use]
pub fn mint_write_token(previous: Option<&VersionToken>) -> VersionToken {
    let now_ms = chrono::Utc::now().timestamp_millis();
    let floor = previous
        .and_then(|t| t.as_str().parse::<i64>().ok())
        .map_or(i64::MIN, |prev| prev + 1);
    VersionToken(now_ms.max(floor).to_string())
}

/// Digest the whole schema's per-table tokens into one global version.
///
/// The digest is a SHA-256 over `table:token` lines sorted by table name,
/// so it is insensitive to iteration order and sensitive to any single
/// table's token changing.
#[must_use]
pub fn schema_digest<'a, I>(tokens: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a VersionToken)>,
{
    let mut lines: Vec<String> = tokens
        .into_iter()
        .map(|(table, token)| format!("{table}:{token}"))
        .collect();
    lines.sort();

    let mut hasher = Sha256::new();
    for line in &lines {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_is_strictly_increasing() {
        let mut prev = mint_write_token(None);
        for _ in 0..100 {
            let next = mint_write_token(Some(&prev));
            let a: i64 = prev.as_str().parse().expect("decimal token");
            let b: i64 = next.as_str().parse().expect("decimal token");
            assert!(b > a, "token must strictly increase: {a} -> {b}");
            prev = next;
        }
    }

    #[test]
    fn test_mint_ignores_non_decimal_previous() {
        let prev = VersionToken::new("xid:12345");
        let next = mint_write_token(Some(&prev));
        assert!(next.as_str().parse::<i64>().is_ok());
    }

    #[test]
    fn test_digest_order_insensitive() {
        let t1 = VersionToken::new("100");
        let t2 = VersionToken::new("200");
        let a = schema_digest(vec![("users", &t1), ("posts", &t2)]);
        let b = schema_digest(vec![("posts", &t2), ("users", &t1)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_digest_changes_with_any_token() {
        let t1 = VersionToken::new("100");
        let t2 = VersionToken::new("200");
        let t2b = VersionToken::new("201");
        let a = schema_digest(vec![("users", &t1), ("posts", &t2)]);
        let b = schema_digest(vec![("users", &t1), ("posts", &t2b)]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_digest_is_hex_sha256() {
        let t = VersionToken::new("1");
        let digest = schema_digest(vec![("users", &t)]);
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
