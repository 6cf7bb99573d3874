use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Публичная модель тега.
pub struct Tag {
    /// Идентификатор тега.
    pub id: i64,
    /// Отображаемое имя.
    pub name: String,
    /// Slug для адресации тега.
    pub slug: String,
    /// Дата и время создания тега (UTC).
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    /// Дата и время последнего обновления тега (UTC).
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Публичная модель поста.
pub struct Post {
    /// Идентификатор поста.
    pub id: i64,
    /// Заголовок поста.
    pub title: String,
    /// Slug для адресации поста.
    pub slug: String,
    /// Краткое содержание.
    pub summary: String,
    /// Содержимое поста (HTML).
    pub content: String,
    /// Количество просмотров.
    #[serde(default)]
    pub view_count: u64,
    /// Оценка времени чтения в минутах.
    #[serde(default)]
    pub read_time_minutes: u32,
    /// Пост закреплён на главной.
    #[serde(default)]
    pub featured: bool,
    /// Количество комментариев, если сервер его отдаёт.
    #[serde(default)]
    pub comment_count: Option<u64>,
    /// Дата и время создания поста (UTC).
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    /// Дата и время последнего обновления поста (UTC).
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
    /// Теги поста.
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Публичная модель комментария с вложенными ответами.
pub struct Comment {
    /// Идентификатор комментария.
    pub id: i64,
    /// Пост, к которому относится комментарий.
    pub post_id: i64,
    /// Родительский комментарий для ответов.
    #[serde(default)]
    pub parent_id: Option<i64>,
    /// Имя автора.
    pub author_name: String,
    /// Email автора.
    pub author_email: String,
    /// Текст комментария.
    pub content: String,
    /// Счётчик лайков.
    #[serde(default)]
    pub like_count: i64,
    /// Дата и время создания (UTC).
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    /// Ответы на комментарий.
    #[serde(default)]
    pub replies: Vec<Comment>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
/// Комментарий дерева с глубиной вложенности для плоского отображения.
pub struct FlatComment<'a> {
    /// Глубина в дереве ответов, корневые комментарии имеют 0.
    pub depth: usize,
    /// Сам комментарий.
    pub comment: &'a Comment,
}

/// Разворачивает дерево комментариев в плоский список в порядке обхода в глубину.
pub fn flatten_comments(comments: &[Comment]) -> Vec<FlatComment<'_>> {
    let mut flat = Vec::new();
    let mut stack: Vec<(usize, &Comment)> = comments.iter().rev().map(|c| (0, c)).collect();

    while let Some((depth, comment)) = stack.pop() {
        flat.push(FlatComment { depth, comment });
        for reply in comment.replies.iter().rev() {
            stack.push((depth + 1, reply));
        }
    }

    flat
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Страница списка в формате `{ items, total }`.
pub struct Page<T> {
    /// Элементы текущей страницы.
    pub items: Vec<T>,
    /// Общее количество элементов на сервере.
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Ответ автодополнения поиска.
pub struct SearchResults {
    /// Найденные посты (постранично).
    pub posts: Page<Post>,
    /// Найденные теги.
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
/// Ответ после успешного входа.
pub struct TokenResponse {
    /// JWT access token.
    pub access_token: String,
    /// Тип токена, обычно `bearer`.
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
/// Данные для создания поста.
pub struct PostCreate {
    /// Заголовок.
    pub title: String,
    /// Краткое содержание.
    pub summary: String,
    /// Содержимое.
    pub content: String,
    /// Slug; если не задан, сервер генерирует его из заголовка.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Идентификаторы тегов.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<i64>>,
    /// Закрепить пост на главной.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
/// Частичное обновление поста: передаются только заданные поля.
pub struct PostUpdate {
    /// Заголовок.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Краткое содержание.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Содержимое.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// Счётчик просмотров.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_count: Option<u64>,
    /// Slug.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Идентификаторы тегов.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag_ids: Option<Vec<i64>>,
    /// Закрепить пост на главной.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize)]
/// Данные для создания тега.
pub struct TagCreate {
    /// Отображаемое имя.
    pub name: String,
    /// Slug; если не задан, сервер генерирует его из имени.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
/// Частичное обновление тега.
pub struct TagUpdate {
    /// Отображаемое имя.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Slug.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

/// Сервер отдаёт время как RFC 3339 либо как naive-время без зоны (считается UTC).
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, de::Error};

    pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}
