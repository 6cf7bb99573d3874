//! Клиентская библиотека для чтения и администрирования блога через REST API.
//!
//! Состоит из двух частей:
//! - `BlogClient` — тонкая обёртка над HTTP (`reqwest`): посты, теги,
//!   комментарии, поиск, вход и админские операции;
//! - [`paging`] — инкрементальная подгрузка лент (главная, тег, комментарии
//!   поста, поиск) с защитой от повторных запросов, определением конца данных
//!   и отбрасыванием устаревших ответов.
//!
//! Клиент хранит JWT-токен после `login` и автоматически прикладывает его
//! как `Authorization: Bearer ...` ко всем запросам.
#![warn(missing_docs)]

mod error;
mod http_client;
mod models;
pub mod paging;

pub use error::{ApiError, ApiResult};
pub use http_client::HttpTimeouts;
pub use models::{
    Comment, FlatComment, Page, Post, PostCreate, PostUpdate, SearchResults, Tag, TagCreate,
    TagUpdate, TokenResponse, flatten_comments,
};

use http_client::HttpClient;

#[derive(Debug, Clone)]
/// Клиент REST API блога.
pub struct BlogClient {
    http_client: HttpClient,
    token: Option<String>,
}

impl BlogClient {
    /// Создаёт клиент с таймаутами по умолчанию.
    pub fn new(base_url: impl Into<String>) -> ApiResult<Self> {
        Self::with_timeouts(base_url, &HttpTimeouts::default())
    }

    /// Создаёт клиент с заданными таймаутами транспорта.
    pub fn with_timeouts(base_url: impl Into<String>, timeouts: &HttpTimeouts) -> ApiResult<Self> {
        Ok(Self {
            http_client: HttpClient::new(base_url, timeouts)?,
            token: None,
        })
    }

    /// Базовый URL API.
    pub fn base_url(&self) -> &str {
        self.http_client.base_url()
    }

    /// Устанавливает JWT-токен вручную.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
    }

    /// Возвращает текущий JWT-токен, если он установлен.
    pub fn get_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Очищает сохранённый JWT-токен.
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Есть ли сессионный токен.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Выполняет вход и сохраняет полученный JWT-токен в клиенте.
    pub async fn login(&mut self, username: &str, password: &str) -> ApiResult<TokenResponse> {
        let response = self.http_client.login(username, password).await?;
        self.token = Some(response.access_token.clone());
        Ok(response)
    }

    /// Выход: забывает токен. На сервере сессия не хранится.
    pub fn logout(&mut self) {
        self.clear_token();
    }

    /// Закреплённый пост главной страницы.
    pub async fn featured_post(&self) -> ApiResult<Post> {
        self.http_client.featured_post(self.get_token()).await
    }

    /// Страница всех постов по `offset/limit`.
    pub async fn list_posts(&self, offset: u32, limit: u32) -> ApiResult<Page<Post>> {
        self.http_client
            .list_posts(self.get_token(), offset, limit)
            .await
    }

    /// Страница постов тега. Общего количества этот эндпоинт не сообщает.
    pub async fn posts_by_tag(&self, slug: &str, offset: u32, limit: u32) -> ApiResult<Vec<Post>> {
        self.http_client
            .posts_by_tag(self.get_token(), slug, offset, limit)
            .await
    }

    /// Пост по slug.
    pub async fn post_by_slug(&self, slug: &str) -> ApiResult<Post> {
        self.http_client.post_by_slug(self.get_token(), slug).await
    }

    /// Пост по идентификатору.
    pub async fn post_by_id(&self, id: i64) -> ApiResult<Post> {
        self.http_client.post_by_id(self.get_token(), id).await
    }

    /// Тег по slug.
    pub async fn tag_by_slug(&self, slug: &str) -> ApiResult<Tag> {
        self.http_client.tag_by_slug(self.get_token(), slug).await
    }

    /// Тег по идентификатору.
    pub async fn tag_by_id(&self, id: i64) -> ApiResult<Tag> {
        self.http_client.tag_by_id(self.get_token(), id).await
    }

    /// Страница тегов по `offset/limit`.
    pub async fn list_tags(&self, offset: u32, limit: u32) -> ApiResult<Page<Tag>> {
        self.http_client
            .list_tags(self.get_token(), offset, limit)
            .await
    }

    /// Все теги без пагинации.
    pub async fn all_tags(&self) -> ApiResult<Vec<Tag>> {
        self.http_client.all_tags(self.get_token()).await
    }

    /// Страница корневых комментариев поста.
    pub async fn comments_by_post(
        &self,
        post_id: i64,
        offset: u32,
        limit: u32,
    ) -> ApiResult<Page<Comment>> {
        self.http_client
            .comments_by_post(self.get_token(), post_id, offset, limit)
            .await
    }

    /// Всё дерево комментариев поста (для админки).
    pub async fn all_comments(&self, post_id: i64) -> ApiResult<Vec<Comment>> {
        self.http_client.all_comments(self.get_token(), post_id).await
    }

    /// Лайк комментария; возвращает комментарий с новым счётчиком.
    pub async fn like_comment(&self, id: i64) -> ApiResult<Comment> {
        self.http_client.like_comment(self.get_token(), id).await
    }

    /// Дизлайк комментария; возвращает комментарий с новым счётчиком.
    pub async fn dislike_comment(&self, id: i64) -> ApiResult<Comment> {
        self.http_client.dislike_comment(self.get_token(), id).await
    }

    /// Автодополнение поиска: страница постов и подходящие теги.
    pub async fn search(&self, query: &str, offset: u32, limit: u32) -> ApiResult<SearchResults> {
        self.http_client
            .search(self.get_token(), query, offset, limit)
            .await
    }

    /// Создаёт пост.
    ///
    /// Требует установленный JWT-токен.
    pub async fn create_post(&self, input: &PostCreate) -> ApiResult<Post> {
        let token = self.require_token()?;
        self.http_client.create_post(token, input).await
    }

    /// Частично обновляет пост.
    ///
    /// Требует установленный JWT-токен.
    pub async fn update_post(&self, id: i64, patch: &PostUpdate) -> ApiResult<Post> {
        let token = self.require_token()?;
        self.http_client.update_post(token, id, patch).await
    }

    /// Удаляет пост.
    ///
    /// Требует установленный JWT-токен.
    pub async fn delete_post(&self, id: i64) -> ApiResult<()> {
        let token = self.require_token()?;
        self.http_client.delete_post(token, id).await
    }

    /// Создаёт тег.
    ///
    /// Требует установленный JWT-токен.
    pub async fn create_tag(&self, input: &TagCreate) -> ApiResult<Tag> {
        let token = self.require_token()?;
        self.http_client.create_tag(token, input).await
    }

    /// Частично обновляет тег.
    ///
    /// Требует установленный JWT-токен.
    pub async fn update_tag(&self, id: i64, patch: &TagUpdate) -> ApiResult<Tag> {
        let token = self.require_token()?;
        self.http_client.update_tag(token, id, patch).await
    }

    /// Удаляет тег.
    ///
    /// Требует установленный JWT-токен.
    pub async fn delete_tag(&self, id: i64) -> ApiResult<()> {
        let token = self.require_token()?;
        self.http_client.delete_tag(token, id).await
    }

    /// Удаляет комментарий вместе с ответами.
    ///
    /// Требует установленный JWT-токен.
    pub async fn delete_comment(&self, id: i64) -> ApiResult<()> {
        let token = self.require_token()?;
        self.http_client.delete_comment(token, id).await
    }

    fn require_token(&self) -> ApiResult<&str> {
        self.token.as_deref().ok_or(ApiError::Unauthorized)
    }
}
