//! Search-related utilities
//!
//! Fragment based fuzzy matching, used by the help command to suggest
//! commands and categories. Matching is case-insensitive and does no other
//! normalization.

/// How plain strings are cut into fragments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Splitter<'a> {
    /// Split on runs of whitespace
    #[default]
    Whitespace,
    /// Split on an exact separator
    Separator(&'a str),
}

impl Splitter<'_> {
    fn split(&self, text: &str) -> Vec<String> {
        match self {
            Splitter::Separator(sep) if !sep.is_empty() => {
                text.split(sep).map(str::to_lowercase).collect()
            }
            _ => text.split_whitespace().map(str::to_lowercase).collect(),
        }
    }
}

/// Something a query can be matched against: one string, or a list of
/// fragments that is already split.
pub trait Fragments {
    /// The whole text when this is a single string
    fn as_text(&self) -> Option<&str>;

    /// Lowercased fragments. Lists are not re-split.
    fn fragments(&self, splitter: Splitter<'_>) -> Vec<String>;
}

impl Fragments for str {
    fn as_text(&self) -> Option<&str> {
        Some(self)
    }

    fn fragments(&self, splitter: Splitter<'_>) -> Vec<String> {
        splitter.split(self)
    }
}

impl Fragments for String {
    fn as_text(&self) -> Option<&str> {
        Some(self.as_str())
    }

    fn fragments(&self, splitter: Splitter<'_>) -> Vec<String> {
        splitter.split(self)
    }
}

impl<S: AsRef<str>> Fragments for [S] {
    fn as_text(&self) -> Option<&str> {
        None
    }

    fn fragments(&self, _splitter: Splitter<'_>) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_lowercase()).collect()
    }
}

impl<S: AsRef<str>> Fragments for Vec<S> {
    fn as_text(&self) -> Option<&str> {
        None
    }

    fn fragments(&self, splitter: Splitter<'_>) -> Vec<String> {
        self.as_slice().fragments(splitter)
    }
}

impl<T: Fragments + ?Sized> Fragments for &T {
    fn as_text(&self) -> Option<&str> {
        (**self).as_text()
    }

    fn fragments(&self, splitter: Splitter<'_>) -> Vec<String> {
        (**self).fragments(splitter)
    }
}

/// Check whether `query` matches `text`, splitting strings on whitespace.
///
/// Every query fragment must be contained in at least one text fragment.
/// Fragments do not need to be in order and several query fragments may hit
/// the same text fragment. A query without fragments matches anything.
///
/// ```
/// use cogbot::utils::searchers::is_match;
///
/// assert!(is_match("ell wor", "Hello World"));
/// assert!(!is_match("xyz", "Hello World"));
/// ```
pub fn is_match<Q, T>(query: &Q, text: &T) -> bool
where
    Q: Fragments + ?Sized,
    T: Fragments + ?Sized,
{
    is_match_with(query, text, Splitter::Whitespace)
}

/// [`is_match`] with an explicit splitter
pub fn is_match_with<Q, T>(query: &Q, text: &T, splitter: Splitter<'_>) -> bool
where
    Q: Fragments + ?Sized,
    T: Fragments + ?Sized,
{
    if let (Some(query), Some(text)) = (query.as_text(), text.as_text()) {
        if text.to_lowercase().contains(&query.to_lowercase()) {
            return true;
        }
    }

    let words = text.fragments(splitter);
    query
        .fragments(splitter)
        .iter()
        .all(|fragment| words.iter().any(|word| word.contains(fragment.as_str())))
}

/// A candidate is related to the query when either one matches the other,
/// so "rel" finds "reload" and "ell" is found from "Hello World". A candidate
/// without fragments only counts when the query itself matches it.
fn is_related<Q, C>(query: &Q, candidate: &C) -> bool
where
    Q: Fragments + ?Sized,
    C: Fragments + ?Sized,
{
    if is_match(query, candidate) {
        return true;
    }
    !candidate.fragments(Splitter::Whitespace).is_empty() && is_match(candidate, query)
}

/// Filter `candidates` down to the ones related to `query`.
///
/// Input order is kept and duplicates are dropped (first one wins).
///
/// ```
/// use cogbot::utils::searchers::get_matches;
///
/// let found = get_matches("Hello World", ["ell", "wor", "foo", "ell"]);
/// assert_eq!(found, vec!["ell", "wor"]);
/// ```
pub fn get_matches<Q, C, I>(query: &Q, candidates: I) -> Vec<C>
where
    Q: Fragments + ?Sized,
    C: Fragments + PartialEq,
    I: IntoIterator<Item = C>,
{
    let mut matches: Vec<C> = Vec::new();
    for candidate in candidates {
        if is_related(query, &candidate) && !matches.contains(&candidate) {
            matches.push(candidate);
        }
    }
    matches
}

/// Like [`get_matches`], but compares `key(candidate)`, which may be a
/// single string or a list of fragments.
pub fn get_matches_by_key<Q, C, K, F, I>(query: &Q, candidates: I, key: F) -> Vec<C>
where
    Q: Fragments + ?Sized,
    C: PartialEq,
    K: Fragments,
    F: Fn(&C) -> K,
    I: IntoIterator<Item = C>,
{
    let mut matches: Vec<C> = Vec::new();
    for candidate in candidates {
        if is_related(query, &key(&candidate)) && !matches.contains(&candidate) {
            matches.push(candidate);
        }
    }
    matches
}

/// One `(key, value)` entry per mapping key related to `query`.
///
/// Only keys are compared, values are carried along untouched. Entries come
/// out in the mapping's iteration order.
pub fn get_identifiable_matches<Q, K, V, I>(query: &Q, mapping: I) -> Vec<(K, V)>
where
    Q: Fragments + ?Sized,
    K: Fragments,
    I: IntoIterator<Item = (K, V)>,
{
    mapping
        .into_iter()
        .filter(|(key, _)| is_related(query, key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_identical_strings_match() {
        assert!(is_match("abc", "abc"));
        assert!(is_match("Reload", "reload"));
    }

    #[test]
    fn test_empty_query_matches_everything() {
        assert!(is_match("", "Hello World"));
        assert!(is_match("", ""));
        let empty: Vec<String> = Vec::new();
        assert!(is_match(&empty, "anything"));
    }

    #[test]
    fn test_fragments_in_any_order() {
        assert!(is_match("ell wor", "Hello World"));
        assert!(is_match("wor ell", "Hello World"));
        assert!(is_match("l l", "Hello"));
        assert!(!is_match("xyz", "Hello World"));
        assert!(!is_match("hello there", "Hello World"));
    }

    #[test]
    fn test_fast_path_crosses_fragment_boundaries() {
        // "o w" only exists across the space
        assert!(is_match("o W", "Hello World"));
    }

    #[test]
    fn test_lists_are_not_resplit() {
        let text = vec!["hello world", "foo"];
        assert!(is_match(&["o w"][..], &text));
        assert!(!is_match(&["o w"][..], "hello world foo"));
    }

    #[test]
    fn test_empty_text_fragments_never_contain_anything() {
        let text: Vec<&str> = Vec::new();
        assert!(!is_match(&["a"][..], &text));
    }

    #[test]
    fn test_custom_separator() {
        assert!(is_match_with("dev,rel", "developer,reload", Splitter::Separator(",")));
        assert!(!is_match_with("dev,xyz", "developer,reload", Splitter::Separator(",")));
    }

    #[test]
    fn test_get_matches_keeps_order() {
        let found = get_matches("Hello World", ["ell", "wor", "foo"]);
        assert_eq!(found, vec!["ell", "wor"]);
    }

    #[test]
    fn test_empty_candidates_are_not_matched() {
        let found = get_matches("xyz", ["", "foo", "   "]);
        assert!(found.is_empty());

        let found = get_matches("foo", ["", "foo"]);
        assert_eq!(found, vec!["foo"]);

        let empty: Vec<&str> = Vec::new();
        let found = get_identifiable_matches("dev", [(empty, 1), (vec!["developer"], 2)]);
        assert_eq!(found, vec![(vec!["developer"], 2)]);
    }

    #[test]
    fn test_get_matches_drops_duplicates() {
        let found = get_matches("rel", ["reload", "reload", "release", "sync"]);
        assert_eq!(found, vec!["reload", "release"]);
    }

    #[test]
    fn test_get_matches_by_key_with_fragment_lists() {
        #[derive(Debug, PartialEq)]
        struct Cmd(&'static str, Vec<&'static str>);

        let cmds = vec![
            Cmd("exec", vec!["eval", "run"]),
            Cmd("sync", vec![]),
            Cmd("reload", vec!["r", "re"]),
        ];
        let found = get_matches_by_key("eva", &cmds, |c: &&Cmd| {
            let mut names = vec![c.0];
            names.extend(c.1.iter().copied());
            names
        });
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "exec");
    }

    #[test]
    fn test_identifiable_matches_compare_keys_only() {
        let mut map = BTreeMap::new();
        map.insert("developer", "sync and reload");
        map.insert("statistics", "developer stats");

        let found = get_identifiable_matches("dev", map.iter().map(|(k, v)| (*k, *v)));
        assert_eq!(found, vec![("developer", "sync and reload")]);
    }
}
