//! Pagination, failure isolation and completion of full crawl runs

use crate::common::*;
use beldre::crawler::{crawl_tag, FailureKind};
use beldre::storage::Storage;
use beldre::CrawlError;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_count_150_fetches_first_page_only() {
    let mock_server = MockServer::start().await;
    let workspace = Workspace::new();

    let first: Vec<String> = (1..=3)
        .map(|i| post_xml(i, &image_url(&mock_server, &format!("{}.png", i)), "foo bar"))
        .collect();

    // 150 / 100 = 1 page, so no pid is ever requested
    mount_first_page(&mock_server, listing_xml(150, 0, &first), 1).await;
    mount_page(&mock_server, 1, listing_xml(150, 100, &[]), 0).await;
    for i in 1..=3 {
        mount_image(&mock_server, &format!("{}.png", i), format!("image {}", i).as_bytes()).await;
    }

    let config = create_test_config(&mock_server, &workspace.image_dir, &workspace.db_path);
    let storage = workspace.storage();

    let report = crawl_tag(&config, storage.clone(), "foo")
        .await
        .expect("Crawl failed");

    assert_eq!(report.total_count, 150);
    assert_eq!(report.pages_planned, 1);
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.posts_ingested, 3);
    assert_eq!(report.posts_failed, 0);
    assert!(report.failures.is_empty());

    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_posts().unwrap(), 3);
    assert_eq!(storage.count_crawl_infos().unwrap(), 3);
    assert_eq!(storage.count_tags().unwrap(), 2);
    assert_eq!(workspace.stored_files().len(), 3);
}

#[tokio::test]
async fn test_trailing_partial_page_is_not_fetched() {
    let mock_server = MockServer::start().await;
    let workspace = Workspace::new();

    mount_first_page(
        &mock_server,
        listing_xml(250, 0, &[post_xml(1, &image_url(&mock_server, "1.jpg"), "a")]),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        1,
        listing_xml(250, 100, &[post_xml(2, &image_url(&mock_server, "2.jpg"), "b")]),
        1,
    )
    .await;
    // 250 / 100 = 2 pages: indices 0 and 1 only
    mount_page(&mock_server, 2, listing_xml(250, 200, &[]), 0).await;
    mount_image(&mock_server, "1.jpg", b"one").await;
    mount_image(&mock_server, "2.jpg", b"two").await;

    let config = create_test_config(&mock_server, &workspace.image_dir, &workspace.db_path);
    let report = crawl_tag(&config, workspace.storage(), "foo")
        .await
        .expect("Crawl failed");

    assert_eq!(report.pages_planned, 2);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.posts_ingested, 2);
}

#[tokio::test]
async fn test_first_page_failure_aborts_run() {
    let mock_server = MockServer::start().await;
    let workspace = Workspace::new();

    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>rate limited</body></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, &workspace.image_dir, &workspace.db_path);
    let storage = workspace.storage();
    let result = crawl_tag(&config, storage.clone(), "foo").await;

    assert!(matches!(result, Err(CrawlError::MalformedResponse { .. })));
    assert_eq!(storage.lock().unwrap().count_crawl_infos().unwrap(), 0);
}

#[tokio::test]
async fn test_failed_page_is_dropped_and_run_completes() {
    let mock_server = MockServer::start().await;
    let workspace = Workspace::new();

    mount_first_page(
        &mock_server,
        listing_xml(300, 0, &[post_xml(1, &image_url(&mock_server, "1.png"), "a")]),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path(LISTING_PATH))
        .and(query_param("pid", "1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        2,
        listing_xml(300, 200, &[post_xml(3, &image_url(&mock_server, "3.png"), "c")]),
        1,
    )
    .await;
    mount_image(&mock_server, "1.png", b"one").await;
    mount_image(&mock_server, "3.png", b"three").await;

    let config = create_test_config(&mock_server, &workspace.image_dir, &workspace.db_path);
    let report = crawl_tag(&config, workspace.storage(), "foo")
        .await
        .expect("A dropped page must not fail the run");

    assert_eq!(report.pages_planned, 3);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.pages_failed, 1);
    assert_eq!(report.posts_ingested, 2);

    let failures: Vec<_> = report.failures_of(FailureKind::Listing).collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].target.contains("pid=1"));
}

#[tokio::test]
async fn test_failed_download_is_reported_not_raised() {
    let mock_server = MockServer::start().await;
    let workspace = Workspace::new();

    mount_first_page(
        &mock_server,
        listing_xml(
            2,
            0,
            &[
                post_xml(1, &image_url(&mock_server, "ok.png"), "a"),
                post_xml(2, &image_url(&mock_server, "broken.png"), "b"),
            ],
        ),
        1,
    )
    .await;
    mount_image(&mock_server, "ok.png", b"fine").await;
    Mock::given(method("GET"))
        .and(path("/img/broken.png"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, &workspace.image_dir, &workspace.db_path);
    let storage = workspace.storage();
    let report = crawl_tag(&config, storage.clone(), "foo")
        .await
        .expect("Crawl failed");

    assert_eq!(report.posts_ingested, 1);
    assert_eq!(report.posts_failed, 1);
    assert_eq!(report.failures_of(FailureKind::Download).count(), 1);

    let storage = storage.lock().unwrap();
    assert!(!storage
        .has_crawl_info(&image_url(&mock_server, "broken.png"))
        .unwrap());
    assert_eq!(storage.count_posts().unwrap(), 1);
}

#[tokio::test]
async fn test_run_waits_for_delayed_ingest() {
    let mock_server = MockServer::start().await;
    let workspace = Workspace::new();

    mount_first_page(
        &mock_server,
        listing_xml(1, 0, &[post_xml(1, &image_url(&mock_server, "slow.png"), "a")]),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/img/slow.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"slow".to_vec())
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server, &workspace.image_dir, &workspace.db_path);
    let storage = workspace.storage();
    let report = crawl_tag(&config, storage.clone(), "foo")
        .await
        .expect("Crawl failed");

    // The run only returns after the delayed task has written its rows
    assert_eq!(report.posts_ingested, 1);
    let storage = storage.lock().unwrap();
    assert!(storage
        .get_post_by_hash(&sha256_hex(b"slow"))
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_runs_with_small_pools_still_ingest_everything() {
    let mock_server = MockServer::start().await;
    let workspace = Workspace::new();

    let posts: Vec<String> = (1..=12)
        .map(|i| post_xml(i, &image_url(&mock_server, &format!("{}.png", i)), "many"))
        .collect();
    mount_first_page(&mock_server, listing_xml(12, 0, &posts), 1).await;
    for i in 1..=12 {
        mount_image(&mock_server, &format!("{}.png", i), format!("img {}", i).as_bytes()).await;
    }

    let mut config = create_test_config(&mock_server, &workspace.image_dir, &workspace.db_path);
    config.crawler.listing_concurrency = 1;
    config.crawler.ingest_concurrency = 2;

    let storage = workspace.storage();
    let report = crawl_tag(&config, storage.clone(), "many")
        .await
        .expect("Crawl failed");

    assert_eq!(report.posts_ingested, 12);
    assert_eq!(storage.lock().unwrap().count_posts().unwrap(), 12);
}
