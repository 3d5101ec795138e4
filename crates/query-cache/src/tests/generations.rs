//! One fetch per key; results of superseded fetches never overwrite newer ones.

use std::sync::Arc;

use super::*;
use crate::cache::SettleOutcome;
use crate::AnyData;

#[tokio::test]
async fn late_result_of_superseded_fetch_is_dropped() {
    let cache = cache();
    let source = ManualSource::<Vec<String>>::new();

    let mut sub = cache.subscribe(messages("c1"), source.fetcher());
    assert_eq!(sub.initial().generation, 1);

    assert!(sub.refetch());
    assert_eq!(source.calls(), 2);

    // Generation 2 completes first.
    source.resolve_newest(Ok(texts(&["fresh"])));
    let settled = sub.settled().await;
    assert_eq!(settled.data(), Some(&texts(&["fresh"])));
    assert_eq!(settled.generation, 2);

    // Generation 1 was aborted; its answer has nowhere to go.
    settle_tasks().await;
    assert!(!source.resolve_oldest(Ok(texts(&["old"]))));

    let current = sub.current();
    assert_eq!(current.data(), Some(&texts(&["fresh"])));
    assert_eq!(current.generation, 2);
    assert!(sub.try_changed().is_none());
}

#[tokio::test]
async fn settle_compares_generations() {
    let cache = cache();
    let source = ManualSource::<String>::new();

    let _sub = cache.subscribe(messages("c1"), source.fetcher());
    cache.refetch(&messages("c1"));

    let value = |s: &str| Arc::new(s.to_string()) as AnyData;
    assert_eq!(
        cache.settle_for_test(&messages("c1"), 1, Ok(value("old"))),
        SettleOutcome::Discarded
    );
    assert_eq!(
        cache.settle_for_test(&messages("c1"), 2, Ok(value("new"))),
        SettleOutcome::Applied
    );
    assert_eq!(
        cache.settle_for_test(&messages("c9"), 1, Ok(value("none"))),
        SettleOutcome::Missing
    );

    let snapshot = cache.snapshot::<String>(&messages("c1")).unwrap();
    assert_eq!(snapshot.data().map(String::as_str), Some("new"));
}

#[tokio::test]
async fn each_fetch_gets_a_higher_generation() {
    let cache = cache();
    let source = ManualSource::<String>::new();

    let sub = cache.subscribe(messages("c1"), source.fetcher());
    assert_eq!(sub.initial().generation, 1);

    cache.refetch(&messages("c1"));
    assert_eq!(sub.current().generation, 2);

    cache.invalidate_key(&messages("c1"));
    assert_eq!(sub.current().generation, 3);
    assert_eq!(source.calls(), 3);
}

#[tokio::test]
async fn superseded_result_produces_no_transition() {
    let cache = cache();
    let source = ManualSource::<String>::new();

    let mut sub = cache.subscribe(messages("c1"), source.fetcher());
    sub.refetch();
    settle_tasks().await;
    assert!(!source.resolve_oldest(Ok("first".to_string())));
    assert!(source.resolve_oldest(Ok("second".to_string())));

    let loading = sub.changed().await.unwrap();
    let success = sub.changed().await.unwrap();
    settle_tasks().await;

    assert!(loading.is_loading());
    assert_eq!(loading.generation, 2);
    assert!(success.is_success());
    assert_eq!(success.generation, 2);
    assert_eq!(success.data().map(String::as_str), Some("second"));
    assert!(sub.try_changed().is_none());
}

#[tokio::test]
async fn new_fetch_aborts_the_one_in_flight() {
    let cache = cache();
    let source = ManualSource::<String>::new();

    let mut sub = cache.subscribe(messages("c1"), source.fetcher());
    assert!(cache.is_fetching(&messages("c1")));

    assert_eq!(cache.invalidate_key(&messages("c1")), 1);
    assert_eq!(source.calls(), 2);
    settle_tasks().await;

    // Only the generation 2 fetch is still listening.
    assert!(!source.resolve_oldest(Ok("gen1".to_string())));
    assert!(source.resolve_oldest(Ok("gen2".to_string())));

    let settled = sub.settled().await;
    assert_eq!(settled.generation, 2);
    assert_eq!(settled.data().map(String::as_str), Some("gen2"));
    assert!(!cache.is_fetching(&messages("c1")));
}
