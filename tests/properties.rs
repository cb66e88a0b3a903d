//! Property tests for the sort and search operations of both stores.

use dualstore::{ChainStore, Record, SequenceStore};
use proptest::prelude::*;

const TYPES: [&str; 7] = ["card", "CARD", "Card", "ach", "wire", "UPI", "deposit"];

fn record_strategy() -> impl Strategy<Value = (usize, String)> {
    (0..TYPES.len(), "[A-Za-z]{0,3}")
}

fn build(rows: &[(usize, String)]) -> Vec<Record> {
    rows.iter()
        .enumerate()
        .map(|(i, (ty, location))| Record {
            transaction_id: format!("T{}", i),
            transaction_type: TYPES[*ty].to_string(),
            location: location.clone(),
            ..Default::default()
        })
        .collect()
}

fn sequence_of(records: &[Record]) -> SequenceStore {
    let mut store = SequenceStore::new(records.len());
    for r in records {
        store.append(r.clone()).unwrap();
    }
    store
}

fn sorted_ids<'a>(records: impl IntoIterator<Item = &'a Record>) -> Vec<String> {
    let mut ids: Vec<String> = records
        .into_iter()
        .map(|r| r.transaction_id.clone())
        .collect();
    ids.sort();
    ids
}

fn expected_matches(records: &[Record], query: &str) -> Vec<String> {
    sorted_ids(
        records
            .iter()
            .filter(|r| r.transaction_type.eq_ignore_ascii_case(query)),
    )
}

proptest! {
    #[test]
    fn property_sequence_sort_orders_and_permutes(rows in prop::collection::vec(record_strategy(), 0..200)) {
        let records = build(&rows);
        let mut store = sequence_of(&records);
        store.sort_by_location();

        let locations: Vec<&str> = store.iter().map(|r| r.location.as_str()).collect();
        prop_assert!(locations.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(sorted_ids(store.iter()), sorted_ids(&records));
    }

    #[test]
    fn property_chain_sort_orders_and_permutes(rows in prop::collection::vec(record_strategy(), 0..200)) {
        let records = build(&rows);
        let mut chain: ChainStore = records.iter().cloned().collect();
        chain.sort_by_location();

        let locations: Vec<&str> = chain.iter().map(|r| r.location.as_str()).collect();
        prop_assert!(locations.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(sorted_ids(chain.iter()), sorted_ids(&records));
    }

    #[test]
    fn property_chain_sort_is_stable(rows in prop::collection::vec(record_strategy(), 0..200)) {
        let records = build(&rows);
        let mut chain: ChainStore = records.iter().cloned().collect();
        chain.sort_by_location();

        let mut expected = records.clone();
        expected.sort_by(|a, b| a.location.cmp(&b.location));
        let got: Vec<&str> = chain.iter().map(|r| r.transaction_id.as_str()).collect();
        let want: Vec<&str> = expected.iter().map(|r| r.transaction_id.as_str()).collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn property_searches_return_exact_sets(
        rows in prop::collection::vec(record_strategy(), 0..200),
        query in prop_oneof![
            (0..TYPES.len()).prop_map(|i| TYPES[i].to_string()),
            "[a-z]{1,4}",
        ],
    ) {
        let records = build(&rows);
        let expected = expected_matches(&records, &query);

        let mut store = sequence_of(&records);
        store.sort_by_type();
        prop_assert_eq!(sorted_ids(store.binary_search_by_type(&query)), expected.clone());

        let mut chain: ChainStore = records.iter().cloned().collect();
        chain.sort_by_type();
        prop_assert_eq!(sorted_ids(chain.jump_search_by_type(&query)), expected);
    }

    #[test]
    fn property_scan_visits_every_record(
        rows in prop::collection::vec(record_strategy(), 0..200),
        ty in 0..TYPES.len(),
    ) {
        let records = build(&rows);
        let query = TYPES[ty];
        let matching = expected_matches(&records, query).len();

        let store = sequence_of(&records);
        let outcome = store.benchmark_scan(query);
        prop_assert_eq!(outcome.visited, records.len());
        prop_assert_eq!(outcome.matched, matching);

        let chain: ChainStore = records.iter().cloned().collect();
        let outcome = chain.benchmark_scan(query);
        prop_assert_eq!(outcome.visited, records.len());
        prop_assert_eq!(outcome.matched, matching);
    }
}
