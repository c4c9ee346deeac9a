//! City name comparison.
//!
//! The city listing and the weather service disagree on spelling: the
//! listing says `"new york"`, weatherstack answers `"New York City"`. Names
//! are compared loosely, as case-insensitive word sets where one side must
//! contain every word of the other.
//!
//! A leading `new` is glued to the following word (`"new york"` becomes the
//! single token `new#york`) so that a city called "New X" is never equal to
//! a bare "X". The containment rule is still loose enough to make
//! `"york"` and `"york harbor"` the same city; callers that need an exact
//! match should compare [`city_key`]s instead.

use std::collections::HashSet;
use std::hash::Hash;

fn tokens(name: &str) -> Vec<String> {
    let lower = name.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();

    match words.as_slice() {
        ["new", next, rest @ ..] => std::iter::once(format!("new#{}", next))
            .chain(rest.iter().map(|w| w.to_string()))
            .collect(),
        _ => words.iter().map(|w| w.to_string()).collect(),
    }
}

/// Whether two city names refer to the same city.
///
/// Symmetric. Two blank names are the same; a blank name never matches a
/// non-blank one.
pub fn same_city(a: &str, b: &str) -> bool {
    let left = tokens(a);
    let right = tokens(b);

    if left.is_empty() || right.is_empty() {
        return left.is_empty() && right.is_empty();
    }

    let contains_all = |outer: &[String], inner: &[String]| inner.iter().all(|t| outer.contains(t));
    contains_all(&left[..], &right[..]) || contains_all(&right[..], &left[..])
}

/// Whether `list` holds a name that is the [`same_city`] as `name`.
pub fn contains_city<S: AsRef<str>>(list: &[S], name: &str) -> bool {
    list.iter().any(|entry| same_city(entry.as_ref(), name))
}

/// Canonical storage key: lower case, whitespace collapsed to single spaces.
pub fn city_key(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop later items whose key was already seen, keeping first occurrences
/// in their original order.
pub fn uniq_by<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item)))
        .collect()
}
