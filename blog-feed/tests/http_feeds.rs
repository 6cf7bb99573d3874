use blog_feed::paging::{
    CommentFeed, FeedController, FeedState, HomeFeed, LoadOutcome, PagedTable, SearchFeed,
    TagFeed, TagList,
};
use std::time::Duration;

use blog_feed::{ApiError, BlogClient, HttpTimeouts, PostCreate, flatten_comments};
use serde_json::{Value, json};
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn post_json(id: i64) -> Value {
    json!({
        "id": id,
        "title": format!("Post {id}"),
        "slug": format!("post-{id}"),
        "summary": "summary",
        "content": "<p>body</p>",
        "view_count": 3,
        "read_time_minutes": 2,
        "created_at": "2024-05-01T10:00:00",
        "updated_at": "2024-05-01T10:00:00Z",
        "tags": []
    })
}

fn posts_json(ids: std::ops::Range<i64>) -> Vec<Value> {
    ids.map(post_json).collect()
}

fn tag_json(id: i64) -> Value {
    json!({
        "id": id,
        "name": format!("Tag {id}"),
        "slug": format!("tag-{id}"),
        "created_at": "2024-05-01T10:00:00Z",
        "updated_at": "2024-05-01T10:00:00Z"
    })
}

fn comment_json(id: i64, replies: Vec<Value>) -> Value {
    json!({
        "id": id,
        "post_id": 1,
        "parent_id": null,
        "author_name": "anna",
        "author_email": "anna@example.com",
        "content": "hi",
        "like_count": 0,
        "created_at": "2024-05-01T10:00:00Z",
        "replies": replies
    })
}

async fn mount_home_page(server: &MockServer, offset: u32, ids: std::ops::Range<i64>, total: u64) {
    Mock::given(method("GET"))
        .and(path("/posts/"))
        .and(query_param("offset", offset.to_string()))
        .and(query_param("limit", "4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": posts_json(ids),
            "total": total
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn home_feed_pages_until_total_is_reached() {
    let server = MockServer::start().await;
    mount_home_page(&server, 0, 0..4, 10).await;
    mount_home_page(&server, 4, 4..8, 10).await;
    mount_home_page(&server, 8, 8..10, 10).await;

    let client = BlogClient::new(server.uri()).expect("client must build");
    let mut feed = FeedController::new(HomeFeed::new(client), 4);

    assert_eq!(feed.load_initial(()).await, LoadOutcome::Loaded(4));
    assert_eq!(feed.load_more().await, LoadOutcome::Loaded(4));
    assert_eq!(feed.load_more().await, LoadOutcome::Loaded(2));
    assert_eq!(feed.load_more().await, LoadOutcome::Skipped);

    assert_eq!(feed.state(), FeedState::Exhausted);
    assert_eq!(feed.offset(), 10);
    assert_eq!(feed.total(), Some(10));
    let ids: Vec<i64> = feed.items().iter().map(|post| post.id).collect();
    assert_eq!(ids, (0..10).collect::<Vec<_>>());
}

#[tokio::test]
async fn tag_feed_uses_skip_and_probes_for_end() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/tag/rust"))
        .and(query_param("skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts_json(0..2)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts/tag/rust"))
        .and(query_param("skip", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let client = BlogClient::new(server.uri()).expect("client must build");
    let mut feed = FeedController::new(TagFeed::new(client), 2);

    assert_eq!(feed.load_initial("rust".to_string()).await, LoadOutcome::Loaded(2));
    assert!(feed.has_more());
    assert_eq!(feed.load_more().await, LoadOutcome::Loaded(0));
    assert!(feed.is_exhausted());
    assert_eq!(feed.items().len(), 2);
}

#[tokio::test]
async fn tag_slug_with_reserved_characters_stays_one_path_segment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/tag/a%3Fskip=100"))
        .and(query_param("skip", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts_json(0..1)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/posts/tag/c%23sharp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(posts_json(0..2)))
        .expect(1)
        .mount(&server)
        .await;

    let client = BlogClient::new(server.uri()).expect("client must build");
    let mut feed = FeedController::new(TagFeed::new(client), 4);

    assert_eq!(
        feed.load_initial("a?skip=100".to_string()).await,
        LoadOutcome::Loaded(1)
    );
    assert_eq!(
        feed.load_initial("c#sharp".to_string()).await,
        LoadOutcome::Loaded(2)
    );

    let requests = server.received_requests().await.unwrap_or_default();
    let queries: Vec<Option<&str>> = requests.iter().map(|r| r.url.query()).collect();
    assert_eq!(queries, vec![Some("skip=0&limit=4"), Some("skip=0&limit=4")]);
}

#[tokio::test]
async fn unreachable_server_is_network_error_and_feed_stays_empty() {
    let timeouts = HttpTimeouts {
        connect: Duration::from_secs(2),
        request: Duration::from_secs(2),
    };
    let client =
        BlogClient::with_timeouts("http://127.0.0.1:9", &timeouts).expect("client must build");

    let err = client.featured_post().await.expect_err("must fail");
    assert!(matches!(err, ApiError::Network(_)), "got {err:?}");
    assert!(err.status().is_none());

    let mut feed = FeedController::new(HomeFeed::new(client), 4);
    assert_eq!(feed.load_initial(()).await, LoadOutcome::Failed);
    assert_eq!(feed.state(), FeedState::Idle);
    assert!(feed.items().is_empty());
    assert_eq!(feed.offset(), 0);
    assert!(!feed.is_loading());
    assert!(!feed.is_exhausted());
    let reason = feed.last_error().expect("error must be recorded");
    assert!(reason.starts_with("network error"), "got {reason}");
}

#[tokio::test]
async fn comment_feed_reads_root_comments_with_replies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/comments/post/1"))
        .and(query_param("offset", "0"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [comment_json(1, vec![comment_json(2, vec![])]), comment_json(3, vec![])],
            "total": 2
        })))
        .mount(&server)
        .await;

    let client = BlogClient::new(server.uri()).expect("client must build");
    let mut feed = FeedController::new(CommentFeed::new(client), 5);

    assert_eq!(feed.load_initial(1).await, LoadOutcome::Loaded(2));
    assert!(feed.is_exhausted());

    let flat = flatten_comments(feed.items());
    let shape: Vec<(usize, i64)> = flat.iter().map(|c| (c.depth, c.comment.id)).collect();
    assert_eq!(shape, vec![(0, 1), (1, 2), (0, 3)]);
}

#[tokio::test]
async fn search_feed_pages_over_posts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/autocomplete"))
        .and(query_param("q", "tokio"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "posts": { "items": posts_json(0..3), "total": 3 },
            "tags": [tag_json(1)]
        })))
        .mount(&server)
        .await;

    let client = BlogClient::new(server.uri()).expect("client must build");
    let mut feed = FeedController::new(SearchFeed::new(client), 4);

    assert_eq!(feed.load_initial("tokio".to_string()).await, LoadOutcome::Loaded(3));
    assert!(feed.is_exhausted());
}

#[tokio::test]
async fn blank_search_query_fails_without_request() {
    let server = MockServer::start().await;
    let client = BlogClient::new(server.uri()).expect("client must build");
    let mut feed = FeedController::new(SearchFeed::new(client), 4);

    assert_eq!(feed.load_initial("   ".to_string()).await, LoadOutcome::Failed);
    assert_eq!(feed.state(), FeedState::Idle);
    assert!(feed.last_error().is_some());

    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn server_error_leaves_feed_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "detail": "database is down" })),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_home_page(&server, 0, 0..4, 4).await;

    let client = BlogClient::new(server.uri()).expect("client must build");
    let mut feed = FeedController::new(HomeFeed::new(client), 4);

    assert_eq!(feed.load_initial(()).await, LoadOutcome::Failed);
    assert_eq!(feed.last_error(), Some("http error 500: database is down"));
    assert_eq!(feed.state(), FeedState::Idle);

    assert_eq!(feed.load_initial(()).await, LoadOutcome::Loaded(4));
    assert!(feed.last_error().is_none());
}

#[tokio::test]
async fn error_detail_is_surfaced_as_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/slug/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Post not found" })))
        .mount(&server)
        .await;

    let client = BlogClient::new(server.uri()).expect("client must build");
    let err = client
        .post_by_slug("missing")
        .await
        .expect_err("must fail");

    assert!(err.is_not_found());
    match err {
        ApiError::Http { status, message } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Post not found");
        }
        other => panic!("expected http error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/featured"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let client = BlogClient::new(server.uri()).expect("client must build");
    let err = client.featured_post().await.expect_err("must fail");

    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn login_posts_form_and_authorizes_admin_calls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .and(body_string_contains("username=admin"))
        .and(body_string_contains("password=secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt-token",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/posts"))
        .and(header("authorization", "Bearer jwt-token"))
        .respond_with(ResponseTemplate::new(201).set_body_json(post_json(42)))
        .expect(1)
        .mount(&server)
        .await;

    let mut client = BlogClient::new(server.uri()).expect("client must build");
    let token = client.login("admin", "secret").await.expect("login must succeed");
    assert_eq!(token.access_token, "jwt-token");
    assert_eq!(client.get_token(), Some("jwt-token"));

    let input = PostCreate {
        title: "Post 42".to_string(),
        summary: "summary".to_string(),
        content: "<p>body</p>".to_string(),
        slug: None,
        tag_ids: None,
        featured: None,
    };
    let created = client.create_post(&input).await.expect("create must succeed");
    assert_eq!(created.id, 42);
}

#[tokio::test]
async fn admin_tag_table_navigates_pages() {
    let server = MockServer::start().await;
    for (offset, ids) in [(0, 0..10), (10, 10..12)] {
        Mock::given(method("GET"))
            .and(path("/tags/"))
            .and(query_param("offset", offset.to_string()))
            .and(query_param("limit", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": ids.map(tag_json).collect::<Vec<_>>(),
                "total": 12
            })))
            .mount(&server)
            .await;
    }

    let client = BlogClient::new(server.uri()).expect("client must build");
    let mut table = PagedTable::new(TagList::new(client), (), 10);

    assert_eq!(table.go_to(1).await, LoadOutcome::Loaded(10));
    assert_eq!(table.pager().total_pages(), 2);
    assert_eq!(table.next().await, LoadOutcome::Loaded(2));
    assert_eq!(table.pager().current_page(), 2);
    assert_eq!(table.rows().len(), 2);
}
