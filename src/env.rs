use std::collections::HashMap;

/// Immutable snapshot of environment variables: key → value.
///
/// Built once per bind, either from the live process environment or from
/// explicit data, and shared read-only across the whole walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: HashMap<String, String>,
}

impl Environment {
    /// Snapshot the current process environment.
    ///
    /// Entries whose key or value is not valid UTF-8 are skipped.
    pub fn from_process() -> Self {
        let vars = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Self { vars }
    }

    /// Build a snapshot from key/value pairs.
    ///
    /// Takes an iterator so tests can pass synthetic data instead of `std::env::vars()`.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let vars = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self { vars }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.vars.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.vars.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl From<HashMap<String, String>> for Environment {
    fn from(vars: HashMap<String, String>) -> Self {
        Self { vars }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// Convert `KEY=VALUE` lines (the shape of a process environment listing)
/// into a map usable as an [`Environment`].
///
/// Splits on the first `=`, so values may contain `=`. Lines without `=`
/// map to an empty value. Later duplicates win.
pub fn to_map<S: AsRef<str>>(lines: impl IntoIterator<Item = S>) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for line in lines {
        let line = line.as_ref();
        let (key, value) = line.split_once('=').unwrap_or((line, ""));
        out.insert(key.to_string(), value.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_map_splits_on_first_equals() {
        let map = to_map(["DSN=postgres://u:p@h/db?sslmode=disable"]);
        assert_eq!(map["DSN"], "postgres://u:p@h/db?sslmode=disable");
    }

    #[test]
    fn to_map_line_without_equals() {
        let map = to_map(["FLAG"]);
        assert_eq!(map["FLAG"], "");
    }

    #[test]
    fn to_map_later_duplicate_wins() {
        let map = to_map(["PORT=1", "PORT=2"]);
        assert_eq!(map["PORT"], "2");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn from_pairs_lookup() {
        let env = Environment::from_pairs([("HOST", "0.0.0.0"), ("EMPTY", "")]);
        assert_eq!(env.get("HOST"), Some("0.0.0.0"));
        assert_eq!(env.get("EMPTY"), Some(""));
        assert!(env.contains_key("EMPTY"));
        assert_eq!(env.get("MISSING"), None);
        assert_eq!(env.len(), 2);
    }

    #[test]
    fn from_process_is_populated() {
        // cargo runs tests with CARGO_* variables set.
        let env = Environment::from_process();
        assert!(!env.is_empty());
    }

    #[test]
    fn collect_from_iterator() {
        let env: Environment = vec![("A", "1")].into_iter().collect();
        assert_eq!(env.keys().collect::<Vec<_>>(), vec!["A"]);
    }
}
