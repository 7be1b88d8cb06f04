use book_price_search::client::sort_by_price;
use book_price_search::{group_by_isbn, ItemSource, NormalizedItem};
use proptest::prelude::*;

fn item_strategy() -> impl Strategy<Value = NormalizedItem> {
    (
        "[a-zA-Z ]{1,20}",
        0.0f64..10_000.0,
        prop::option::of(prop::sample::select(vec![
            "9780132350884",
            "9780201633610",
            "9788328302341",
            "",
        ])),
        prop::bool::ANY,
    )
        .prop_map(|(name, price, isbn, marketplace)| NormalizedItem {
            name,
            link: None,
            price,
            currency: Some("PLN".to_string()),
            isbn: isbn.map(str::to_string),
            source: if marketplace {
                ItemSource::AuctionMarketplace
            } else {
                ItemSource::BookCatalog
            },
        })
}

mod grouping_props {
    use super::*;

    proptest! {
        #[test]
        fn test_grouping_preserves_every_item(items in prop::collection::vec(item_strategy(), 0..50)) {
            let total = items.len();
            let groups = group_by_isbn(items);
            let grouped: usize = groups.iter().map(|g| g.items.len()).sum();
            prop_assert_eq!(grouped, total);
        }

        #[test]
        fn test_no_isbn_group_is_last_and_unique(items in prop::collection::vec(item_strategy(), 0..50)) {
            let groups = group_by_isbn(items);
            let last = groups.last().unwrap();
            prop_assert!(last.isbn.is_none());
            prop_assert_eq!(groups.iter().filter(|g| g.isbn.is_none()).count(), 1);
        }

        #[test]
        fn test_groups_are_homogeneous_and_sorted(items in prop::collection::vec(item_strategy(), 0..50)) {
            let groups = group_by_isbn(items);

            let keys: Vec<&String> = groups.iter().filter_map(|g| g.isbn.as_ref()).collect();
            prop_assert!(keys.windows(2).all(|w| w[0] < w[1]), "ISBN keys must be strictly ascending");

            for group in &groups {
                prop_assert!(group.items.windows(2).all(|w| w[0].price <= w[1].price));
                for item in &group.items {
                    match &group.isbn {
                        Some(isbn) => prop_assert_eq!(item.isbn.as_ref(), Some(isbn)),
                        None => prop_assert!(item.isbn.as_deref().map_or(true, str::is_empty)),
                    }
                }
            }
        }
    }
}

mod sorting_props {
    use super::*;

    proptest! {
        #[test]
        fn test_sort_is_stable_for_equal_prices(names in prop::collection::vec("[a-z]{1,8}", 1..20)) {
            let mut items: Vec<NormalizedItem> = names
                .iter()
                .map(|name| NormalizedItem {
                    name: name.clone(),
                    link: None,
                    price: 10.0,
                    currency: None,
                    isbn: None,
                    source: ItemSource::BookCatalog,
                })
                .collect();

            sort_by_price(&mut items);
            let sorted: Vec<&String> = items.iter().map(|i| &i.name).collect();
            let original: Vec<&String> = names.iter().collect();
            prop_assert_eq!(sorted, original);
        }

        #[test]
        fn test_sort_orders_by_price(prices in prop::collection::vec(0.0f64..1_000.0, 0..50)) {
            let mut items: Vec<NormalizedItem> = prices
                .iter()
                .map(|p| NormalizedItem {
                    name: "x".to_string(),
                    link: None,
                    price: *p,
                    currency: None,
                    isbn: None,
                    source: ItemSource::AuctionMarketplace,
                })
                .collect();

            sort_by_price(&mut items);
            prop_assert!(items.windows(2).all(|w| w[0].price <= w[1].price));
        }
    }
}
