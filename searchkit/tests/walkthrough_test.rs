//! End-to-end walkthrough over the 1000-account sample dataset.
//!
//! Every test builds requests through the public API, runs them through the
//! in-memory executor and inspects the parsed response, the same way a caller
//! would against a live cluster.

use futures::StreamExt;
use searchkit::aggs::{Aggregation, BucketKind, MetricKind};
use searchkit::executor::ExecuteOptions;
use searchkit::query::{bool_query, match_all, match_phrase, match_query, range, term, BoolQuery, RangeBounds};
use searchkit::request::SortOrder;
use searchkit::{sample, Error, ExecutorError, InMemoryExecutor, SearchRequest, SearchResponse};
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

const ACCOUNTS: usize = 1000;

fn bank() -> InMemoryExecutor {
    sample::executor(ACCOUNTS)
}

fn base() -> SearchRequest {
    SearchRequest::new(sample::SAMPLE_INDEX)
}

fn ids(resp: &SearchResponse) -> Vec<String> {
    resp.hits().map(|h| h.id().to_string()).collect()
}

fn account_numbers(resp: &SearchResponse) -> Vec<i64> {
    resp.hits()
        .map(|h| h.get_i64("account_number").unwrap())
        .collect()
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_match_all_defaults_to_ten_hits() {
    let resp = base().with_query(match_all()).execute(&bank()).await.unwrap();
    assert_eq!(resp.len(), 10);
    assert_eq!(resp.total(), Some(ACCOUNTS as u64));
}

#[tokio::test]
async fn test_empty_bool_matches_like_match_all() {
    let exec = bank();
    let all = base()
        .with_query(match_all())
        .with_pagination(0, ACCOUNTS as i64)
        .unwrap();
    let empty_bool = base()
        .with_query(bool_query(vec![], vec![]))
        .with_pagination(0, ACCOUNTS as i64)
        .unwrap();

    let a = all.execute(&exec).await.unwrap();
    let b = empty_bool.execute(&exec).await.unwrap();
    assert_eq!(ids(&a), ids(&b));
    assert_eq!(a.total(), b.total());
}

#[tokio::test]
async fn test_match_single_account() {
    let resp = base()
        .with_query(match_query("account_number", 20).unwrap())
        .execute(&bank())
        .await
        .unwrap();
    assert_eq!(resp.total(), Some(1));
    assert_eq!(ids(&resp), vec!["20"]);
}

#[tokio::test]
async fn test_match_is_any_word() {
    let resp = base()
        .with_query(match_query("address", "mill lane").unwrap())
        .with_pagination(0, ACCOUNTS as i64)
        .unwrap()
        .execute(&bank())
        .await
        .unwrap();

    assert!(!resp.is_empty());
    for hit in &resp {
        let address = hit.get_str("address").unwrap().to_lowercase();
        assert!(
            address.contains("mill") || address.contains("lane"),
            "unexpected hit {}",
            address
        );
    }
}

#[tokio::test]
async fn test_match_phrase_requires_adjacent_words() {
    let exec = bank();
    let phrase = base()
        .with_query(match_phrase("address", "mill lane").unwrap())
        .with_pagination(0, ACCOUNTS as i64)
        .unwrap()
        .execute(&exec)
        .await
        .unwrap();
    for hit in &phrase {
        assert!(hit.get_str("address").unwrap().contains("Mill Lane"));
    }

    let words = base()
        .with_query(match_query("address", "mill lane").unwrap())
        .count(&exec)
        .await
        .unwrap();
    assert!(phrase.total().unwrap() <= words);
}

#[tokio::test]
async fn test_range_filter_bounds_hits() {
    let query = bool_query(
        vec![match_all()],
        vec![range("balance", RangeBounds::new().gte(20000).lte(30000)).unwrap()],
    );
    let resp = base()
        .with_query(query)
        .with_pagination(0, ACCOUNTS as i64)
        .unwrap()
        .execute(&bank())
        .await
        .unwrap();

    let expected = sample::accounts(ACCOUNTS)
        .iter()
        .filter(|d| {
            let b = d.source["balance"].as_i64().unwrap();
            (20000..=30000).contains(&b)
        })
        .count();
    assert_eq!(resp.len(), expected);
    for hit in &resp {
        let balance = hit.get_i64("balance").unwrap();
        assert!((20000..=30000).contains(&balance));
    }
}

#[tokio::test]
async fn test_must_not_excludes_state() {
    let query: searchkit::Query = BoolQuery::new()
        .must(match_query("age", 40).unwrap())
        .must_not(term("state.keyword", "ID").unwrap())
        .into();
    let resp = base()
        .with_query(query)
        .with_pagination(0, ACCOUNTS as i64)
        .unwrap()
        .execute(&bank())
        .await
        .unwrap();

    for hit in &resp {
        assert_eq!(hit.get_i64("age"), Some(40));
        assert_ne!(hit.get_str("state"), Some("ID"));
    }
}

// ---------------------------------------------------------------------------
// Sorting, pagination, projection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_sorted_first_page_is_increasing_from_zero() {
    let resp = base()
        .with_query(match_all())
        .with_sort([("account_number", SortOrder::Asc)])
        .execute(&bank())
        .await
        .unwrap();

    assert_eq!(account_numbers(&resp), (0..10).collect::<Vec<i64>>());
}

#[tokio::test]
async fn test_consecutive_windows_are_disjoint_and_contiguous() {
    let exec = bank();
    let sorted = base()
        .with_query(match_all())
        .with_sort([("account_number", SortOrder::Asc)]);

    let first = sorted.with_pagination(0, 10).unwrap().execute(&exec).await.unwrap();
    let second = sorted.with_pagination(10, 10).unwrap().execute(&exec).await.unwrap();

    assert_eq!(account_numbers(&first), (0..10).collect::<Vec<i64>>());
    assert_eq!(account_numbers(&second), (10..20).collect::<Vec<i64>>());

    let a: HashSet<String> = ids(&first).into_iter().collect();
    let b: HashSet<String> = ids(&second).into_iter().collect();
    assert!(a.is_disjoint(&b));
}

#[tokio::test]
async fn test_descending_sort_with_tiebreak() {
    let resp = base()
        .with_sort([("age", SortOrder::Desc), ("account_number", SortOrder::Asc)])
        .with_pagination(0, 50)
        .unwrap()
        .execute(&bank())
        .await
        .unwrap();

    let rows: Vec<(i64, i64)> = resp
        .hits()
        .map(|h| (h.get_i64("age").unwrap(), h.get_i64("account_number").unwrap()))
        .collect();
    for pair in rows.windows(2) {
        let ((age_a, num_a), (age_b, num_b)) = (pair[0], pair[1]);
        assert!(age_a > age_b || (age_a == age_b && num_a < num_b));
    }
}

#[tokio::test]
async fn test_projection_returns_exactly_requested_fields() {
    let resp = base()
        .with_query(match_all())
        .with_source_fields(["account_number", "balance"])
        .execute(&bank())
        .await
        .unwrap();

    for hit in &resp {
        let keys: HashSet<&str> = hit.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, HashSet::from(["account_number", "balance"]));
    }
}

#[tokio::test]
async fn test_empty_projection_returns_no_fields() {
    let resp = base()
        .with_source_fields(Vec::<String>::new())
        .execute(&bank())
        .await
        .unwrap();
    assert_eq!(resp.len(), 10);
    assert!(resp.hits().all(|h| h.fields().is_empty()));
}

// ---------------------------------------------------------------------------
// Aggregations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_group_by_state() {
    let resp = base()
        .with_pagination(0, 0)
        .unwrap()
        .bucket("group_by_state", BucketKind::Terms, "state.keyword")
        .unwrap()
        .execute(&bank())
        .await
        .unwrap();

    assert!(resp.is_empty());
    let buckets = resp.buckets_of("group_by_state").unwrap();
    assert_eq!(buckets.len(), 10);
    for pair in buckets.windows(2) {
        assert!(pair[0].doc_count() >= pair[1].doc_count());
    }
    assert!(buckets.iter().all(|b| b.key_as_str().is_some()));
}

#[tokio::test]
async fn test_unknown_aggregation_name_is_not_found() {
    let resp = base()
        .bucket("group_by_state", BucketKind::Terms, "state.keyword")
        .unwrap()
        .execute(&bank())
        .await
        .unwrap();
    assert!(matches!(resp.buckets_of("nonexistent"), Err(Error::NotFound(_))));
}

#[tokio::test]
async fn test_group_by_state_ordered_by_average_balance() {
    let mut by_state = Aggregation::terms("state.keyword")
        .with_order("average_balance", SortOrder::Desc);
    by_state
        .metric("average_balance", MetricKind::Avg, "balance")
        .unwrap();

    let resp = base()
        .with_pagination(0, 0)
        .unwrap()
        .with_aggregation("group_by_state", by_state)
        .unwrap()
        .execute(&bank())
        .await
        .unwrap();

    let averages: Vec<f64> = resp
        .buckets_of("group_by_state")
        .unwrap()
        .iter()
        .map(|b| b.metric("average_balance").unwrap())
        .collect();
    assert_eq!(averages.len(), 10);
    for pair in averages.windows(2) {
        assert!(pair[0] >= pair[1]);
    }
}

#[tokio::test]
async fn test_age_ranges_split_by_gender() {
    let mut ages = Aggregation::histogram("age", 10.0);
    ages.bucket("group_by_gender", BucketKind::Terms, "gender.keyword")
        .unwrap()
        .metric("average_balance", MetricKind::Avg, "balance")
        .unwrap();

    let resp = base()
        .with_pagination(0, 0)
        .unwrap()
        .with_aggregation("group_by_age", ages)
        .unwrap()
        .execute(&bank())
        .await
        .unwrap();

    let buckets = resp.buckets_of("group_by_age").unwrap();
    let keys: Vec<f64> = buckets.iter().filter_map(|b| b.key_as_f64()).collect();
    assert_eq!(keys, vec![20.0, 30.0, 40.0]);
    assert_eq!(
        buckets.iter().map(|b| b.doc_count()).sum::<u64>(),
        ACCOUNTS as u64
    );

    for bucket in buckets {
        let genders = bucket.buckets_of("group_by_gender").unwrap();
        assert_eq!(
            genders.iter().map(|g| g.doc_count()).sum::<u64>(),
            bucket.doc_count()
        );
        assert!(genders.iter().all(|g| g.metric("average_balance").is_some()));
    }
}

#[tokio::test]
async fn test_top_level_metrics() {
    let resp = base()
        .with_pagination(0, 0)
        .unwrap()
        .metric("min_age", MetricKind::Min, "age")
        .unwrap()
        .metric("max_age", MetricKind::Max, "age")
        .unwrap()
        .metric("accounts", MetricKind::ValueCount, "account_number")
        .unwrap()
        .execute(&bank())
        .await
        .unwrap();

    assert_eq!(resp.metric_value("min_age").unwrap(), Some(20.0));
    assert_eq!(resp.metric_value("max_age").unwrap(), Some(40.0));
    assert_eq!(resp.metric_value("accounts").unwrap(), Some(ACCOUNTS as f64));
}

// ---------------------------------------------------------------------------
// Count, scan, options, errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_count_match_all() {
    let count = base().with_query(match_all()).count(&bank()).await.unwrap();
    assert_eq!(count, ACCOUNTS as u64);
}

#[tokio::test]
async fn test_count_ignores_window_and_aggregations() {
    let exec = bank();
    let req = base()
        .with_query(range("age", RangeBounds::new().gte(30)).unwrap())
        .with_pagination(990, 5)
        .unwrap()
        .bucket("group_by_state", BucketKind::Terms, "state.keyword")
        .unwrap();

    let expected = sample::accounts(ACCOUNTS)
        .iter()
        .filter(|d| d.source["age"].as_i64().unwrap() >= 30)
        .count() as u64;
    assert_eq!(req.count(&exec).await.unwrap(), expected);
}

#[tokio::test]
async fn test_scan_walks_every_page() {
    let exec = bank();
    let req = base().with_sort([("account_number", SortOrder::Asc)]);

    let hits: Vec<_> = req.scan(&exec, 128).collect().await;
    assert_eq!(hits.len(), ACCOUNTS);

    let numbers: Vec<i64> = hits
        .into_iter()
        .map(|h| h.unwrap().get_i64("account_number").unwrap())
        .collect();
    assert_eq!(numbers, (0..ACCOUNTS as i64).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_ignore_cache_returns_same_results() {
    let exec = bank();
    let req = base().with_sort([("account_number", SortOrder::Asc)]);
    let cached = req.execute(&exec).await.unwrap();
    let uncached = req
        .execute_with(&exec, &ExecuteOptions::ignore_cache())
        .await
        .unwrap();
    assert_eq!(ids(&cached), ids(&uncached));
}

#[tokio::test]
async fn test_requests_are_reusable() {
    let exec = bank();
    let req = base().with_query(match_query("account_number", 7).unwrap());
    let first = req.execute(&exec).await.unwrap();
    let second = req.execute(&exec).await.unwrap();
    assert_eq!(ids(&first), ids(&second));
}

#[tokio::test]
async fn test_unknown_index_propagates_engine_error() {
    let err = SearchRequest::new("no-such-index")
        .execute(&bank())
        .await
        .unwrap_err();
    assert!(err.is_executor_failure());
    assert!(matches!(
        err,
        Error::Executor(ExecutorError::Engine { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_duplicate_aggregation_name_is_local_error() {
    let result = base()
        .bucket("group_by_state", BucketKind::Terms, "state.keyword")
        .unwrap()
        .metric("group_by_state", MetricKind::Avg, "balance");
    assert!(matches!(result, Err(Error::DuplicateName(_))));
}

#[tokio::test]
async fn test_histogram_over_wide_span_fails_with_engine_error() {
    let exec = InMemoryExecutor::from_bulk_ndjson(
        "nums",
        "{\"index\":{}}\n{\"n\":0}\n{\"index\":{}}\n{\"n\":1e300}\n",
    )
    .unwrap();
    let err = SearchRequest::new("nums")
        .with_aggregation("spread", Aggregation::histogram("n", 1.0))
        .unwrap()
        .execute(&exec)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Executor(ExecutorError::Engine { status: 400, .. })
    ));
}
