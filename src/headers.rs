//! Header maps and case-insensitive key lookup.

use std::collections::BTreeMap;

/// Response header map. Ordered so the wire output is deterministic.
pub type Headers = BTreeMap<String, String>;

/// Looks up `key` in any string-keyed map, ignoring ASCII case.
///
/// Proxy events arrive with whatever header casing the platform chose
/// (`content-type`, `Content-Type`, `CONTENT-TYPE`), so every header read
/// in this crate goes through here.
///
/// ```rust
/// use std::collections::HashMap;
/// use proxy_router::lookup_key;
///
/// let map = HashMap::from([("content-type".to_owned(), "text/html".to_owned())]);
/// assert_eq!(lookup_key(&map, "Content-Type").map(String::as_str), Some("text/html"));
/// assert_eq!(lookup_key(&map, "Accept"), None);
/// ```
pub fn lookup_key<'a, K, V, M>(map: M, key: &str) -> Option<&'a V>
where
    M: IntoIterator<Item = (&'a K, &'a V)>,
    K: AsRef<str> + 'a,
    V: 'a,
{
    map.into_iter()
        .find(|(k, _)| k.as_ref().eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

/// Inserts `name: value`, replacing any existing entry whose name differs
/// only in case.
pub(crate) fn set_header(headers: &mut Headers, name: &str, value: impl Into<String>) {
    headers.retain(|k, _| !k.eq_ignore_ascii_case(name) || k == name);
    headers.insert(name.to_owned(), value.into());
}
