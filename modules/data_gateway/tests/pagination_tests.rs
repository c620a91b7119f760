//! Integration tests for the pagination engine

use data_gateway::contract::{
    BulkCreateOptions, ListQuery, OrderBy, PageQuery, Projection, RequestContext,
};
use serde_json::{json, Value};

mod common;
use common::TestHarness;

/// Seed `n` tasks with zero-padded ids so lexicographic order matches
/// numeric order.
async fn seed_tasks(harness: &TestHarness, n: usize) {
    let rows: Vec<Value> = (1..=n)
        .map(|i| json!({"id": format!("t-{i:02}"), "title": format!("task {i}")}))
        .collect();
    let result = harness
        .gateway
        .create_bulk(
            "Task",
            rows,
            BulkCreateOptions::default(),
            &RequestContext::for_user("u1"),
        )
        .await
        .expect("seeding tasks should succeed");
    assert_eq!(result.count, n as u64);
}

#[tokio::test]
async fn test_paginated_window_and_meta() {
    let harness = TestHarness::new();
    seed_tasks(&harness, 25).await;

    let page = harness
        .gateway
        .find_many_paginated(
            "Task",
            PageQuery {
                page: Some(3),
                limit: Some(10),
                order_by: Some(OrderBy::asc("id")),
                ..Default::default()
            },
        )
        .await
        .expect("pagination should succeed");

    // skip = (3-1) * 10 = 20, leaving the last five records
    assert_eq!(page.data.len(), 5);
    assert_eq!(page.data[0]["id"], "t-21");
    assert_eq!(page.data[4]["id"], "t-25");

    assert_eq!(page.meta.total, 25);
    assert_eq!(page.meta.page, 3);
    assert_eq!(page.meta.limit, 10);
    assert_eq!(page.meta.total_pages, 3);
    assert!(!page.meta.has_next_page);
    assert!(page.meta.has_prev_page);
}

#[tokio::test]
async fn test_paginated_defaults_to_first_page_of_ten() {
    let harness = TestHarness::new();
    seed_tasks(&harness, 25).await;

    let page = harness
        .gateway
        .find_many_paginated(
            "Task",
            PageQuery {
                order_by: Some(OrderBy::asc("id")),
                ..Default::default()
            },
        )
        .await
        .expect("pagination should succeed");

    assert_eq!(page.data.len(), 10);
    assert_eq!(page.data[0]["id"], "t-01");
    assert_eq!(page.meta.page, 1);
    assert_eq!(page.meta.limit, 10);
    assert!(page.meta.has_next_page);
    assert!(!page.meta.has_prev_page);
}

#[tokio::test]
async fn test_with_meta_derives_page_from_skip_take() {
    let harness = TestHarness::new();
    seed_tasks(&harness, 25).await;

    let page = harness
        .gateway
        .find_many_with_meta(
            "Task",
            ListQuery {
                skip: Some(20),
                take: Some(10),
                order_by: Some(OrderBy::asc("id")),
                ..Default::default()
            },
        )
        .await
        .expect("listing should succeed");

    // page is derived as floor(skip/take) + 1 for display only
    assert_eq!(page.data.len(), 5);
    assert_eq!(page.meta.page, 3);
    assert_eq!(page.meta.total, 25);
    assert!(!page.meta.has_next_page);
}

#[tokio::test]
async fn test_paginated_filter_drives_both_queries() {
    let harness = TestHarness::new();
    harness.seed_user("u1").await;
    harness.seed_user("u2").await;
    for i in 1..=4 {
        harness
            .seed_task(&format!("a-{i}"), "u1", &format!("mine {i}"))
            .await;
    }
    for i in 1..=3 {
        harness
            .seed_task(&format!("b-{i}"), "u2", &format!("theirs {i}"))
            .await;
    }

    let page = harness
        .gateway
        .find_many_paginated(
            "Task",
            PageQuery {
                page: Some(1),
                limit: Some(10),
                filter: Some(json!({"user_id": "u2"})),
                ..Default::default()
            },
        )
        .await
        .expect("pagination should succeed");

    assert_eq!(page.data.len(), 3);
    assert_eq!(page.meta.total, 3);
    assert_eq!(page.meta.total_pages, 1);
}

#[tokio::test]
async fn test_order_by_descending() {
    let harness = TestHarness::new();
    seed_tasks(&harness, 5).await;

    let rows = harness
        .gateway
        .find_many(
            "Task",
            ListQuery {
                order_by: Some(OrderBy::desc("id")),
                take: Some(2),
                ..Default::default()
            },
        )
        .await
        .expect("listing should succeed");

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id"], "t-05");
    assert_eq!(rows[1]["id"], "t-04");
}

#[tokio::test]
async fn test_find_many_never_touches_the_cache() {
    let harness = TestHarness::new();
    seed_tasks(&harness, 3).await;

    harness
        .gateway
        .find_many("Task", ListQuery::default())
        .await
        .expect("listing should succeed");
    harness
        .gateway
        .find_many("Task", ListQuery::default())
        .await
        .expect("listing should succeed");

    assert_eq!(harness.storage.op_count("Task", "find_many"), 2);
    assert_eq!(harness.storage.op_count("Task", "find_one"), 0);
}

#[tokio::test]
async fn test_list_projection_applies_to_page_data() {
    let harness = TestHarness::new();
    seed_tasks(&harness, 3).await;

    let page = harness
        .gateway
        .find_many_paginated(
            "Task",
            PageQuery {
                order_by: Some(OrderBy::asc("id")),
                projection: Projection::select(["id"]),
                ..Default::default()
            },
        )
        .await
        .expect("pagination should succeed");

    assert_eq!(page.data[0], json!({"id": "t-01"}));
}
