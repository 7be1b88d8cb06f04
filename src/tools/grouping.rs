use crate::client::{sort_by_price, NormalizedItem};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Offers sharing an ISBN, cheapest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsbnGroup {
    /// `None` for the group of items without an identifiable ISBN
    pub isbn: Option<String>,
    pub items: Vec<NormalizedItem>,
}

/// Partition items by ISBN.
///
/// Groups come out in ascending ISBN order, each sorted by price, followed by
/// exactly one `isbn: None` group holding every item without an ISBN. That
/// last group is present even when it is empty.
#[must_use]
pub fn group_by_isbn(items: Vec<NormalizedItem>) -> Vec<IsbnGroup> {
    let mut by_isbn: BTreeMap<String, Vec<NormalizedItem>> = BTreeMap::new();
    let mut without_isbn = Vec::new();

    for item in items {
        match item.isbn.as_deref().filter(|isbn| !isbn.is_empty()) {
            Some(isbn) => by_isbn.entry(isbn.to_string()).or_default().push(item),
            None => without_isbn.push(item),
        }
    }

    let mut groups: Vec<IsbnGroup> = by_isbn
        .into_iter()
        .map(|(isbn, mut items)| {
            sort_by_price(&mut items);
            IsbnGroup {
                isbn: Some(isbn),
                items,
            }
        })
        .collect();

    sort_by_price(&mut without_isbn);
    groups.push(IsbnGroup {
        isbn: None,
        items: without_isbn,
    });

    groups
}
