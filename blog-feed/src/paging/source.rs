use std::fmt;

use async_trait::async_trait;

use crate::BlogClient;
use crate::error::{ApiError, ApiResult};
use crate::models::{Comment, Post, Tag};
use crate::paging::page::PageResult;

/// Источник страниц для ленты: один эндпоинт REST API.
///
/// `Key` определяет ресурс (slug тега, id поста, поисковый запрос); смена
/// ключа сбрасывает ленту.
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    /// Ключ ресурса, внутри которого идёт пагинация.
    type Key: Clone + PartialEq + fmt::Debug + Send + Sync + 'static;
    /// Элемент ленты.
    type Item: Send + 'static;

    /// Загружает окно `offset/limit` для ресурса `key`.
    async fn fetch_page(
        &self,
        key: &Self::Key,
        offset: u32,
        limit: u32,
    ) -> ApiResult<PageResult<Self::Item>>;
}

/// Лента всех постов главной страницы.
#[derive(Debug, Clone)]
pub struct HomeFeed {
    client: BlogClient,
}

impl HomeFeed {
    /// Создаёт ленту поверх клиента.
    pub fn new(client: BlogClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for HomeFeed {
    type Key = ();
    type Item = Post;

    async fn fetch_page(&self, _key: &(), offset: u32, limit: u32) -> ApiResult<PageResult<Post>> {
        let page = self.client.list_posts(offset, limit).await?;
        Ok(PageResult::from_window(page.items, offset, limit, Some(page.total)))
    }
}

/// Лента постов одного тега; ключ — slug тега.
#[derive(Debug, Clone)]
pub struct TagFeed {
    client: BlogClient,
}

impl TagFeed {
    /// Создаёт ленту поверх клиента.
    pub fn new(client: BlogClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for TagFeed {
    type Key = String;
    type Item = Post;

    async fn fetch_page(
        &self,
        slug: &String,
        offset: u32,
        limit: u32,
    ) -> ApiResult<PageResult<Post>> {
        let posts = self.client.posts_by_tag(slug, offset, limit).await?;
        Ok(PageResult::from_window(posts, offset, limit, None))
    }
}

/// Корневые комментарии поста; ключ — id поста.
#[derive(Debug, Clone)]
pub struct CommentFeed {
    client: BlogClient,
}

impl CommentFeed {
    /// Создаёт ленту поверх клиента.
    pub fn new(client: BlogClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for CommentFeed {
    type Key = i64;
    type Item = Comment;

    async fn fetch_page(
        &self,
        post_id: &i64,
        offset: u32,
        limit: u32,
    ) -> ApiResult<PageResult<Comment>> {
        let page = self
            .client
            .comments_by_post(*post_id, offset, limit)
            .await?;
        Ok(PageResult::from_window(page.items, offset, limit, Some(page.total)))
    }
}

/// Посты из поиска; ключ — поисковый запрос. Теги из ответа не листаются.
#[derive(Debug, Clone)]
pub struct SearchFeed {
    client: BlogClient,
}

impl SearchFeed {
    /// Создаёт ленту поверх клиента.
    pub fn new(client: BlogClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for SearchFeed {
    type Key = String;
    type Item = Post;

    async fn fetch_page(
        &self,
        query: &String,
        offset: u32,
        limit: u32,
    ) -> ApiResult<PageResult<Post>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ApiError::InvalidRequest(
                "search query must not be empty".to_string(),
            ));
        }
        let results = self.client.search(query, offset, limit).await?;
        Ok(PageResult::from_window(
            results.posts.items,
            offset,
            limit,
            Some(results.posts.total),
        ))
    }
}

/// Таблица тегов админки.
#[derive(Debug, Clone)]
pub struct TagList {
    client: BlogClient,
}

impl TagList {
    /// Создаёт источник поверх клиента.
    pub fn new(client: BlogClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for TagList {
    type Key = ();
    type Item = Tag;

    async fn fetch_page(&self, _key: &(), offset: u32, limit: u32) -> ApiResult<PageResult<Tag>> {
        let page = self.client.list_tags(offset, limit).await?;
        Ok(PageResult::from_window(page.items, offset, limit, Some(page.total)))
    }
}
