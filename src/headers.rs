//! Case-preserving header map.
//!
//! Header names are kept exactly as the caller supplied them. Inserting a
//! name replaces an entry with the identical name only; names that differ in
//! case live side by side, and readers that care (content-type inference,
//! multipart handling) compare case-insensitively.

/// An insertion-ordered map of header names to string values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a header, replacing any entry with the exact same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Returns the value stored under the exact name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the last value whose name matches ignoring ASCII case.
    ///
    /// The last match is the one that ends up on the wire, since later
    /// entries overwrite earlier ones when the request is sent.
    pub fn get_ignore_case(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Removes every entry whose name matches ignoring ASCII case.
    pub fn remove_ignore_case(&mut self, name: &str) {
        self.entries.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
    }

    /// Merges `other` into `self`; entries from `other` win.
    pub fn merge(&mut self, other: &Headers) {
        for (name, value) in &other.entries {
            self.insert(name.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<'de> serde::Deserialize<'de> for Headers {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let map = <serde_json::Map<String, serde_json::Value> as serde::Deserialize>::deserialize(
            deserializer,
        )?;
        Ok(map
            .into_iter()
            .map(|(name, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (name, value)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_right_biased() {
        let mut defaults = Headers::from([("a", "1"), ("b", "2")]);
        defaults.merge(&Headers::from([("b", "3"), ("c", "4")]));

        assert_eq!(defaults.get("a"), Some("1"));
        assert_eq!(defaults.get("b"), Some("3"));
        assert_eq!(defaults.get("c"), Some("4"));
        assert_eq!(defaults.len(), 3);
    }

    #[test]
    fn keys_keep_their_case() {
        let mut headers = Headers::from([("Content-Type", "application/json")]);
        headers.insert("content-type", "text/plain");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("Content-Type"), Some("application/json"));
        assert_eq!(headers.get_ignore_case("CONTENT-TYPE"), Some("text/plain"));
    }

    #[test]
    fn remove_ignores_case() {
        let mut headers = Headers::from([
            ("Content-Type", "application/json"),
            ("content-type", "text/plain"),
            ("Accept", "*/*"),
        ]);
        headers.remove_ignore_case("CONTENT-type");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("Accept"), Some("*/*"));
    }

    #[test]
    fn deserializes_from_json_object() {
        let headers: Headers =
            serde_json::from_str(r#"{"X-Trace": "abc", "X-Count": 3}"#).unwrap();
        assert_eq!(headers.get("X-Trace"), Some("abc"));
        assert_eq!(headers.get("X-Count"), Some("3"));
    }
}
