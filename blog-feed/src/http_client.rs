use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, IntoUrl, Method, RequestBuilder, Response, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::time::Duration;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    Comment, Page, Post, PostCreate, PostUpdate, SearchResults, Tag, TagCreate, TagUpdate,
    TokenResponse,
};

#[derive(Debug, Deserialize)]
struct ErrorResponseDto {
    detail: Option<serde_json::Value>,
    message: Option<String>,
}

impl ErrorResponseDto {
    fn into_message(self) -> Option<String> {
        match self.detail {
            Some(serde_json::Value::String(detail)) => Some(detail),
            Some(serde_json::Value::Null) | None => self.message,
            Some(other) => Some(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct LoginForm<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct OffsetQuery {
    offset: u32,
    limit: u32,
}

#[derive(Serialize)]
struct SkipQuery {
    skip: u32,
    limit: u32,
}

#[derive(Serialize)]
struct SearchQuery<'a> {
    q: &'a str,
    offset: u32,
    limit: u32,
}

#[derive(Debug, Clone)]
/// Таймауты HTTP-клиента.
pub struct HttpTimeouts {
    /// Таймаут установки соединения.
    pub connect: Duration,
    /// Таймаут запроса целиком.
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            request: Duration::from_secs(15),
        }
    }
}

#[derive(Debug, Clone)]
/// HTTP-клиент для REST API блога.
pub(crate) struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    /// Создаёт HTTP-клиент с базовым URL сервера.
    pub(crate) fn new(base_url: impl Into<String>, timeouts: &HttpTimeouts) -> ApiResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .default_headers(headers)
            .build()
            .map_err(|err| ApiError::InvalidRequest(format!("failed to build http client: {err}")))?;

        Ok(Self {
            base_url: base_url.into(),
            client,
        })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// URL ресурса `prefix/key`; ключ кодируется как один сегмент пути.
    fn keyed_endpoint(&self, prefix: &str, key: &str) -> ApiResult<Url> {
        let mut url = Url::parse(&self.endpoint(prefix))
            .map_err(|err| ApiError::InvalidRequest(format!("invalid base url: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidRequest("base url cannot have a path".to_string()))?
            .pop_if_empty()
            .push(key);
        Ok(url)
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        self.request_to(method, self.endpoint(path), token)
    }

    fn request_to(&self, method: Method, url: impl IntoUrl, token: Option<&str>) -> RequestBuilder {
        let request = self.client.request(method, url);
        match token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn decode_error(response: Response) -> ApiError {
        let status = response.status();
        let message = match response.json::<ErrorResponseDto>().await {
            Ok(body) => body.into_message(),
            Err(_) => None,
        };
        ApiError::from_http_status(status, message)
    }

    async fn execute(request: RequestBuilder) -> ApiResult<Response> {
        let response = request.send().await.map_err(ApiError::from_reqwest)?;
        if !response.status().is_success() {
            return Err(Self::decode_error(response).await);
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> ApiResult<T> {
        let body = response.bytes().await.map_err(ApiError::from_reqwest)?;
        serde_json::from_slice(&body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn get_json<TRes, TQuery>(
        &self,
        path: &str,
        query: Option<&TQuery>,
        token: Option<&str>,
    ) -> ApiResult<TRes>
    where
        TRes: DeserializeOwned,
        TQuery: Serialize + ?Sized,
    {
        Self::fetch_json(self.request(Method::GET, path, token), query).await
    }

    async fn fetch_json<TRes, TQuery>(
        mut request: RequestBuilder,
        query: Option<&TQuery>,
    ) -> ApiResult<TRes>
    where
        TRes: DeserializeOwned,
        TQuery: Serialize + ?Sized,
    {
        if let Some(query) = query {
            request = request.query(query);
        }
        let response = Self::execute(request).await?;
        Self::decode(response).await
    }

    /// универсальный helper для отправки запросов с json-payload
    async fn send_json<TReq, TRes>(
        &self,
        method: Method,
        path: &str,
        body: &TReq,
        token: Option<&str>,
    ) -> ApiResult<TRes>
    where
        TReq: Serialize + ?Sized,
        TRes: DeserializeOwned,
    {
        let request = self.request(method, path, token).json(body);
        let response = Self::execute(request).await?;
        Self::decode(response).await
    }

    async fn send_empty(&self, method: Method, path: &str, token: Option<&str>) -> ApiResult<()> {
        Self::execute(self.request(method, path, token)).await?;
        Ok(())
    }

    pub(crate) async fn login(&self, username: &str, password: &str) -> ApiResult<TokenResponse> {
        let form = LoginForm { username, password };
        let request = self.request(Method::POST, "/auth/token", None).form(&form);
        let response = Self::execute(request).await?;
        Self::decode(response).await
    }

    pub(crate) async fn featured_post(&self, token: Option<&str>) -> ApiResult<Post> {
        self.get_json::<_, ()>("/posts/featured", None, token).await
    }

    pub(crate) async fn list_posts(
        &self,
        token: Option<&str>,
        offset: u32,
        limit: u32,
    ) -> ApiResult<Page<Post>> {
        let query = OffsetQuery { offset, limit };
        self.get_json("/posts/", Some(&query), token).await
    }

    /// Посты тега. Этот эндпоинт принимает `skip` и отдаёт голый массив без `total`.
    pub(crate) async fn posts_by_tag(
        &self,
        token: Option<&str>,
        slug: &str,
        skip: u32,
        limit: u32,
    ) -> ApiResult<Vec<Post>> {
        let query = SkipQuery { skip, limit };
        let url = self.keyed_endpoint("/posts/tag", slug)?;
        Self::fetch_json(self.request_to(Method::GET, url, token), Some(&query)).await
    }

    pub(crate) async fn post_by_slug(&self, token: Option<&str>, slug: &str) -> ApiResult<Post> {
        let url = self.keyed_endpoint("/posts/slug", slug)?;
        Self::fetch_json::<_, ()>(self.request_to(Method::GET, url, token), None).await
    }

    pub(crate) async fn post_by_id(&self, token: Option<&str>, id: i64) -> ApiResult<Post> {
        self.get_json::<_, ()>(&format!("/posts/{id}"), None, token)
            .await
    }

    pub(crate) async fn tag_by_slug(&self, token: Option<&str>, slug: &str) -> ApiResult<Tag> {
        let url = self.keyed_endpoint("/tags/slug", slug)?;
        Self::fetch_json::<_, ()>(self.request_to(Method::GET, url, token), None).await
    }

    pub(crate) async fn tag_by_id(&self, token: Option<&str>, id: i64) -> ApiResult<Tag> {
        self.get_json::<_, ()>(&format!("/tags/{id}"), None, token)
            .await
    }

    pub(crate) async fn list_tags(
        &self,
        token: Option<&str>,
        offset: u32,
        limit: u32,
    ) -> ApiResult<Page<Tag>> {
        let query = OffsetQuery { offset, limit };
        self.get_json("/tags/", Some(&query), token).await
    }

    pub(crate) async fn all_tags(&self, token: Option<&str>) -> ApiResult<Vec<Tag>> {
        self.get_json::<_, ()>("/tags/all", None, token).await
    }

    pub(crate) async fn comments_by_post(
        &self,
        token: Option<&str>,
        post_id: i64,
        offset: u32,
        limit: u32,
    ) -> ApiResult<Page<Comment>> {
        let query = OffsetQuery { offset, limit };
        self.get_json(&format!("/comments/post/{post_id}"), Some(&query), token)
            .await
    }

    pub(crate) async fn all_comments(
        &self,
        token: Option<&str>,
        post_id: i64,
    ) -> ApiResult<Vec<Comment>> {
        self.get_json::<_, ()>(&format!("/comments/post/{post_id}/all"), None, token)
            .await
    }

    pub(crate) async fn like_comment(&self, token: Option<&str>, id: i64) -> ApiResult<Comment> {
        self.send_json(
            Method::POST,
            &format!("/comments/{id}/like"),
            &serde_json::json!({}),
            token,
        )
        .await
    }

    pub(crate) async fn dislike_comment(&self, token: Option<&str>, id: i64) -> ApiResult<Comment> {
        self.send_json(
            Method::POST,
            &format!("/comments/{id}/dislike"),
            &serde_json::json!({}),
            token,
        )
        .await
    }

    pub(crate) async fn search(
        &self,
        token: Option<&str>,
        query: &str,
        offset: u32,
        limit: u32,
    ) -> ApiResult<SearchResults> {
        let query = SearchQuery {
            q: query,
            offset,
            limit,
        };
        self.get_json("/search/autocomplete", Some(&query), token)
            .await
    }

    pub(crate) async fn create_post(&self, token: &str, input: &PostCreate) -> ApiResult<Post> {
        self.send_json(Method::POST, "/posts", input, Some(token))
            .await
    }

    pub(crate) async fn update_post(
        &self,
        token: &str,
        id: i64,
        patch: &PostUpdate,
    ) -> ApiResult<Post> {
        self.send_json(Method::PATCH, &format!("/posts/{id}"), patch, Some(token))
            .await
    }

    pub(crate) async fn delete_post(&self, token: &str, id: i64) -> ApiResult<()> {
        self.send_empty(Method::DELETE, &format!("/posts/{id}"), Some(token))
            .await
    }

    pub(crate) async fn create_tag(&self, token: &str, input: &TagCreate) -> ApiResult<Tag> {
        self.send_json(Method::POST, "/tags", input, Some(token))
            .await
    }

    pub(crate) async fn update_tag(&self, token: &str, id: i64, patch: &TagUpdate) -> ApiResult<Tag> {
        self.send_json(Method::PATCH, &format!("/tags/{id}"), patch, Some(token))
            .await
    }

    pub(crate) async fn delete_tag(&self, token: &str, id: i64) -> ApiResult<()> {
        self.send_empty(Method::DELETE, &format!("/tags/{id}"), Some(token))
            .await
    }

    pub(crate) async fn delete_comment(&self, token: &str, id: i64) -> ApiResult<()> {
        self.send_empty(Method::DELETE, &format!("/comments/{id}"), Some(token))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> HttpClient {
        HttpClient::new(base_url, &HttpTimeouts::default()).expect("client must build")
    }

    #[test]
    fn endpoint_normalizes_slashes() {
        let client = client("http://localhost:8000/");
        let full = client.endpoint("/posts/featured");
        assert_eq!(full, "http://localhost:8000/posts/featured");
    }

    #[test]
    fn endpoint_keeps_trailing_slash_of_collection_paths() {
        let client = client("http://localhost:8000");
        assert_eq!(client.endpoint("/posts/"), "http://localhost:8000/posts/");
    }

    #[test]
    fn keyed_endpoint_encodes_reserved_characters() {
        let client = client("http://localhost:8000");
        let url = client
            .keyed_endpoint("/posts/tag", "c#sharp")
            .expect("url must build");
        assert_eq!(url.as_str(), "http://localhost:8000/posts/tag/c%23sharp");

        let url = client
            .keyed_endpoint("/posts/tag", "a?skip=100")
            .expect("url must build");
        assert_eq!(url.path(), "/posts/tag/a%3Fskip=100");
        assert!(url.query().is_none());

        let url = client
            .keyed_endpoint("/tags/slug", "a/b")
            .expect("url must build");
        assert_eq!(url.path(), "/tags/slug/a%2Fb");
    }

    #[test]
    fn keyed_endpoint_keeps_base_path() {
        let client = client("http://localhost:8000/api/");
        let url = client
            .keyed_endpoint("/posts/slug", "hello")
            .expect("url must build");
        assert_eq!(url.as_str(), "http://localhost:8000/api/posts/slug/hello");
    }

    #[test]
    fn error_body_prefers_string_detail() {
        let dto: ErrorResponseDto =
            serde_json::from_str(r#"{"detail":"Post not found","message":"ignored"}"#)
                .expect("dto must parse");
        assert_eq!(dto.into_message().as_deref(), Some("Post not found"));
    }

    #[test]
    fn error_body_stringifies_structured_detail() {
        let dto: ErrorResponseDto =
            serde_json::from_str(r#"{"detail":[{"loc":["body","title"],"msg":"field required"}]}"#)
                .expect("dto must parse");
        let message = dto.into_message().expect("message must exist");
        assert!(message.contains("field required"));
    }

    #[test]
    fn error_body_falls_back_to_message() {
        let dto: ErrorResponseDto =
            serde_json::from_str(r#"{"message":"An error occurred"}"#).expect("dto must parse");
        assert_eq!(dto.into_message().as_deref(), Some("An error occurred"));
    }
}
