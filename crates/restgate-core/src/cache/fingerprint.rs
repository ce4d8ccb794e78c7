//! Query fingerprints and data-plane cache URLs.
//!
//! A fingerprint is a deterministic canonical serialization of a parsed
//! query. Filters and projection fields are sorted before rendering, so
//! the fingerprint is permutation-invariant over both; sort directives
//! keep their order because ordering is semantic there.

use crate::params::{plain_value, ParsedQuery, SortDirection};
use crate::version::VersionToken;

/// Fingerprint of the empty query.
pub const EMPTY_FINGERPRINT: &str = "list";

/// Canonical fingerprint of a parsed query.
///
/// Format: `f[field:op:value,…];s[[-]field,…];l<limit>;o<offset>;c[field,…]`
/// with absent fragments omitted; the empty query is the literal `list`.
#[must_use]
pub fn query_fingerprint(query: &ParsedQuery) -> String {
    let mut fragments: Vec<String> = Vec::new();

    if !query.filters.is_empty() {
        // Sort the rendered entries, not just the fields, so two filters
        // on the same field still fingerprint order-independently.
        let mut rendered: Vec<String> = query
            .filters
            .iter()
            .map(|f| format!("{}:{}:{}", f.field, f.op.suffix(), plain_value(&f.value)))
            .collect();
        rendered.sort();
        fragments.push(format!("f[{}]", rendered.join(",")));
    }

    if !query.sort.is_empty() {
        let rendered: Vec<String> = query
            .sort
            .iter()
            .map(|s| match s.direction {
                SortDirection::Asc => s.field.clone(),
                SortDirection::Desc => format!("-{}", s.field),
            })
            .collect();
        fragments.push(format!("s[{}]", rendered.join(",")));
    }

    if let Some(limit) = query.limit {
        fragments.push(format!("l{limit}"));
    }
    if let Some(offset) = query.offset {
        fragments.push(format!("o{offset}"));
    }

    if let Some(select) = &query.select {
        let mut fields = select.clone();
        fields.sort();
        fragments.push(format!("c[{}]", fields.join(",")));
    }

    if fragments.is_empty() {
        EMPTY_FINGERPRINT.to_string()
    } else {
        fragments.join(";")
    }
}

/// Build the data-plane cache URL for a query.
///
/// The URL embeds the version token current at write time, so bumping the
/// token makes every prior entry unreachable. The host is never dialed;
/// it only namespaces the keys.
#[must_use]
pub fn cache_url(host: &str, version: &VersionToken, table: &str, fingerprint: &str) -> String {
    format!(
        "https://{host}/{}/{}/{}",
        urlencoding::encode(version.as_str()),
        urlencoding::encode(table),
        urlencoding::encode(fingerprint)
    )
}
