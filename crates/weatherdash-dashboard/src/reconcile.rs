//! City reconciliation.
//!
//! Merges the remote candidate page with the locally stored favorites and
//! the removed/restored lists into the list of cities the board shows:
//!
//! 1. Ask the listing for `page_size` of the most populous cities, excluding
//!    the excluded snapshot and the favorites (both are shown, or hidden,
//!    through other means).
//! 2. Drop candidates that are removed, restored or favorite.
//! 3. Show surviving candidates, then restored cities, then favorites that
//!    are neither removed nor restored.
//!
//! Membership tests go through [`same_city`](weatherdash_weather::same_city),
//! so spelling variants of one city never appear twice.

use weatherdash_weather::{city_key, contains_city, uniq_by, City, CityQuery};

use crate::display::DisplayRow;

/// Local state reconciliation reads from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitySelection {
    pub favorites: Vec<String>,
    pub removed: Vec<String>,
    pub restored: Vec<String>,
    pub excluded: Vec<String>,
}

/// The candidate page request: most populous first, without excluded and
/// favorite cities.
pub fn candidate_query(page_size: usize, selection: &CitySelection) -> CityQuery {
    let exclude: Vec<String> = selection
        .excluded
        .iter()
        .chain(selection.favorites.iter())
        .cloned()
        .collect();

    CityQuery::popular(page_size, uniq_by(exclude, |city: &String| city_key(city)))
}

/// Final city sequence for the board.
///
/// The result is duplicate-free and depends only on its inputs; a short or
/// empty candidate page is fine and is not padded.
pub fn reconcile(candidates: &[City], selection: &CitySelection) -> Vec<String> {
    let CitySelection {
        favorites,
        removed,
        restored,
        ..
    } = selection;

    let surviving = candidates
        .iter()
        .map(|city| city.id.as_str())
        .filter(|id| !contains_city(removed, id))
        .filter(|id| !contains_city(restored, id))
        .filter(|id| !contains_city(favorites, id));

    let visible_favorites = favorites
        .iter()
        .map(String::as_str)
        .filter(|id| !contains_city(removed, id))
        .filter(|id| !contains_city(restored, id));

    let mut sequence: Vec<String> = Vec::new();
    for id in surviving.chain(restored.iter().map(String::as_str)).chain(visible_favorites) {
        if !contains_city(&sequence, id) {
            sequence.push(id.to_string());
        }
    }
    sequence
}

/// Favorites first, then by display name ignoring case. Stable, so rows
/// that compare equal keep their incoming order.
///
/// Names compare by lower-cased code points, not by locale collation, so
/// accented initials ("Łódź") sort after plain ASCII ones.
pub fn sort_rows(rows: &mut [DisplayRow]) {
    rows.sort_by(|a, b| {
        b.is_favorite
            .cmp(&a.is_favorite)
            .then_with(|| a.display_name.to_lowercase().cmp(&b.display_name.to_lowercase()))
    });
}
