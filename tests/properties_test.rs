use doxsearch_mcp::search::{MalformedPolicy, SearchIndex, decode_key, is_normalized, normalize};
use doxsearch_mcp::{Entry, IndexRecord};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn record(name: &str) -> IndexRecord {
    IndexRecord::new(
        normalize(name),
        vec![Entry::new(name, format!("../{}.html", normalize(name)), "sky")],
    )
}

/// Distinct symbol names whose normalized keys are also distinct and non-empty.
fn symbol_names() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[A-Za-z][A-Za-z0-9_<> ]{0,10}", 0..40).prop_map(|names| {
        let mut seen = BTreeSet::new();
        names
            .into_iter()
            .filter(|name| seen.insert(normalize(name)))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_results_are_exactly_the_prefixed_records(
        names in symbol_names(),
        query in "[A-Za-z_ ]{0,4}",
    ) {
        let index = SearchIndex::build(names.iter().map(|n| record(n))).unwrap();
        let prefix = normalize(&query);
        let results = index.prefix_search(&query);

        prop_assert!(results.iter().all(|r| r.search_key.starts_with(&prefix)));
        let expected = index.iter().filter(|r| r.search_key.starts_with(&prefix)).count();
        prop_assert_eq!(results.len(), expected);
    }

    #[test]
    fn prop_results_are_strictly_sorted(names in symbol_names(), query in "[a-z]{0,2}") {
        let index = SearchIndex::build(names.iter().map(|n| record(n))).unwrap();
        let results = index.prefix_search(&query);
        prop_assert!(results.windows(2).all(|w| w[0].search_key < w[1].search_key));
    }

    #[test]
    fn prop_longer_query_narrows_results(names in symbol_names(), query in "[a-z]{1,3}", extra in "[a-z]") {
        let index = SearchIndex::build(names.iter().map(|n| record(n))).unwrap();
        let broad = index.prefix_search(&query);
        let narrow = index.prefix_search(&format!("{query}{extra}"));
        prop_assert!(narrow.iter().all(|r| broad.contains(r)));
    }

    #[test]
    fn prop_blank_query_returns_whole_index(names in symbol_names(), blank in "[ \t]{0,3}") {
        let index = SearchIndex::build(names.iter().map(|n| record(n))).unwrap();
        prop_assert_eq!(index.prefix_search(&blank), index.records());
        prop_assert_eq!(index.len(), names.len());
    }

    #[test]
    fn prop_build_ignores_input_order(names in symbol_names()) {
        let forward = SearchIndex::build(names.iter().map(|n| record(n))).unwrap();
        let backward = SearchIndex::build(names.iter().rev().map(|n| record(n))).unwrap();
        prop_assert_eq!(forward, backward);
    }

    #[test]
    fn prop_case_and_padding_do_not_matter(names in symbol_names(), query in "[a-z]{0,3}") {
        let index = SearchIndex::build(names.iter().map(|n| record(n))).unwrap();
        let padded = format!("  {}\t", query.to_uppercase());
        prop_assert_eq!(index.prefix_search(&query), index.prefix_search(&padded));
    }

    #[test]
    fn prop_skip_accounts_for_every_record(names in prop::collection::vec("[a-c]{0,2}", 0..30)) {
        let records = names.iter().map(|name| {
            let key = normalize(name);
            let entries = if name.len() == 1 { vec![] } else { vec![Entry::new(name, "../x.html", "")] };
            IndexRecord::new(key, entries)
        });
        let outcome = SearchIndex::build_with_policy(records, MalformedPolicy::Skip).unwrap();
        prop_assert_eq!(outcome.index.len() + outcome.skipped.len(), names.len());
        prop_assert!(outcome.skipped.windows(2).all(|w| w[0].position() < w[1].position()));
    }

    #[test]
    fn prop_normalized_keys_decode_to_folded_input(name in "[ -~]{0,16}") {
        let key = normalize(&name);
        prop_assert!(is_normalized(&key));
        prop_assert_eq!(decode_key(&key), name.trim().to_lowercase());
    }
}
