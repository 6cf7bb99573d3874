use blog_feed::paging::{CommentFeed, FeedController, HomeFeed, LoadOutcome, TagFeed};
use blog_feed::{ApiError, BlogClient};

fn base_url() -> String {
    std::env::var("BLOG_API_URL").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
}

#[tokio::test]
#[ignore = "requires running blog API with seeded posts"]
async fn live_feeds_smoke_flow() {
    let client = BlogClient::new(base_url()).expect("client must build");

    let mut home = FeedController::new(HomeFeed::new(client.clone()), 4);
    let first = home.load_initial(()).await;
    assert!(matches!(first, LoadOutcome::Loaded(_)), "got {first:?}");

    while home.has_more() {
        let before = home.items().len();
        let outcome = home.load_more().await;
        assert!(matches!(outcome, LoadOutcome::Loaded(_)), "got {outcome:?}");
        assert!(home.items().len() >= before);
    }
    assert_eq!(home.offset() as usize, home.items().len());

    let Some(post) = home.items().first().cloned() else {
        return;
    };

    let fetched = client
        .post_by_slug(&post.slug)
        .await
        .expect("post_by_slug must succeed");
    assert_eq!(fetched.id, post.id);

    let mut comments = FeedController::new(CommentFeed::new(client.clone()), 5);
    let outcome = comments.load_initial(post.id).await;
    assert!(matches!(outcome, LoadOutcome::Loaded(_)), "got {outcome:?}");

    if let Some(tag) = post.tags.first() {
        let mut by_tag = FeedController::new(TagFeed::new(client.clone()), 4);
        let outcome = by_tag.load_initial(tag.slug.clone()).await;
        assert!(matches!(outcome, LoadOutcome::Loaded(n) if n > 0), "got {outcome:?}");
    }

    let missing = client.post_by_slug("definitely-not-a-real-slug-404").await;
    assert!(matches!(missing, Err(ref err @ ApiError::Http { .. }) if err.is_not_found()));
}
