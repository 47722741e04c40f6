//! Deduplication and content addressing across crawl runs

use crate::common::*;
use beldre::crawler::Coordinator;
use beldre::storage::{Storage, CRAWLER_ACCOUNT};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_post_hash_matches_downloaded_bytes() {
    let mock_server = MockServer::start().await;
    let workspace = Workspace::new();
    let body = b"\x89PNG\r\n\x1a\nfake image payload".to_vec();

    mount_first_page(
        &mock_server,
        listing_xml(1, 0, &[post_xml(7, &image_url(&mock_server, "a.png"), "red blue")]),
        1,
    )
    .await;
    mount_image(&mock_server, "a.png", &body).await;

    let config = create_test_config(&mock_server, &workspace.image_dir, &workspace.db_path);
    let storage = workspace.storage();
    Coordinator::new(&config, storage.clone())
        .unwrap()
        .run("red")
        .await
        .expect("Crawl failed");

    let hash = sha256_hex(&body);
    assert_eq!(workspace.stored_files(), vec![format!("{}.png", hash)]);
    assert_eq!(
        std::fs::read(workspace.image_dir.join(format!("{}.png", hash))).unwrap(),
        body
    );

    let storage = storage.lock().unwrap();
    let post = storage.get_post_by_hash(&hash).unwrap().expect("post row");
    assert_eq!(post.source, None);
    assert_eq!(
        storage.get_post_tags(post.id).unwrap(),
        vec!["blue".to_string(), "red".to_string()]
    );
}

#[tokio::test]
async fn test_recrawl_skips_seen_urls() {
    let mock_server = MockServer::start().await;
    let workspace = Workspace::new();

    let posts = vec![
        post_xml(1, &image_url(&mock_server, "1.png"), "foo"),
        post_xml(2, &image_url(&mock_server, "2.png"), "foo"),
    ];
    mount_first_page(&mock_server, listing_xml(2, 0, &posts), 2).await;
    for name in ["1.png", "2.png"] {
        Mock::given(method("GET"))
            .and(path(format!("/img/{}", name)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(name.as_bytes().to_vec()))
            .expect(1)
            .mount(&mock_server)
            .await;
    }

    let config = create_test_config(&mock_server, &workspace.image_dir, &workspace.db_path);
    let storage = workspace.storage();
    let coordinator = Coordinator::new(&config, storage.clone()).unwrap();

    let first = coordinator.run("foo").await.expect("First crawl failed");
    assert_eq!(first.posts_ingested, 2);

    let second = coordinator.run("foo").await.expect("Second crawl failed");
    assert_eq!(second.posts_ingested, 0);
    assert_eq!(second.posts_skipped, 2);

    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_crawl_infos().unwrap(), 2);
    assert_eq!(storage.count_posts().unwrap(), 2);
}

#[tokio::test]
async fn test_identical_content_converges_to_one_post() {
    let mock_server = MockServer::start().await;
    let workspace = Workspace::new();

    let posts = vec![
        post_xml(1, &image_url(&mock_server, "original.jpg"), "cat"),
        post_xml(2, &image_url(&mock_server, "mirror.jpg"), "cat kitten"),
    ];
    mount_first_page(&mock_server, listing_xml(2, 0, &posts), 1).await;
    mount_image(&mock_server, "original.jpg", b"same bytes").await;
    mount_image(&mock_server, "mirror.jpg", b"same bytes").await;

    let config = create_test_config(&mock_server, &workspace.image_dir, &workspace.db_path);
    let storage = workspace.storage();
    let report = Coordinator::new(&config, storage.clone())
        .unwrap()
        .run("cat")
        .await
        .expect("Crawl failed");

    assert_eq!(report.posts_ingested, 2);
    assert_eq!(report.posts_converged, 1);

    let hash = sha256_hex(b"same bytes");
    assert_eq!(workspace.stored_files(), vec![format!("{}.jpg", hash)]);

    let storage = storage.lock().unwrap();
    assert_eq!(storage.count_posts().unwrap(), 1);
    assert_eq!(storage.count_crawl_infos().unwrap(), 2);

    // Tags from both listings end up on the single post
    let post = storage.get_post_by_hash(&hash).unwrap().expect("post row");
    assert_eq!(
        storage.get_post_tags(post.id).unwrap(),
        vec!["cat".to_string(), "kitten".to_string()]
    );
}

#[tokio::test]
async fn test_posts_are_owned_by_crawler_account() {
    let mock_server = MockServer::start().await;
    let workspace = Workspace::new();

    mount_first_page(
        &mock_server,
        listing_xml(1, 0, &[post_xml(1, &image_url(&mock_server, "x.gif"), "x")]),
        1,
    )
    .await;
    mount_image(&mock_server, "x.gif", b"gif").await;

    let config = create_test_config(&mock_server, &workspace.image_dir, &workspace.db_path);
    let storage = workspace.storage();
    Coordinator::new(&config, storage.clone())
        .unwrap()
        .run("x")
        .await
        .expect("Crawl failed");
    drop(storage);

    let conn = rusqlite::Connection::open(&workspace.db_path).unwrap();
    let uploader: String = conn
        .query_row(
            "SELECT u.name FROM post p JOIN user u ON u.id = p.uploader",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(uploader, CRAWLER_ACCOUNT);

    let site: String = conn
        .query_row("SELECT site FROM post_crawl_info", [], |row| row.get(0))
        .unwrap();
    assert_eq!(site, "booru.test");
}
