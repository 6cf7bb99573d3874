use thiserror::Error;

#[derive(Debug, Error)]
/// Ошибки клиентской библиотеки `blog-feed`.
pub enum ApiError {
    /// Транспортная ошибка: ответа от сервера нет (соединение, DNS, таймаут).
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Сервер ответил статусом вне диапазона 2xx.
    #[error("http error {status}: {message}")]
    Http {
        /// HTTP-статус ответа.
        status: u16,
        /// Сообщение сервера или текст статуса.
        message: String,
    },

    /// Тело ответа не соответствует ожидаемой структуре.
    #[error("decode error: {0}")]
    Decode(String),

    /// Операция требует JWT-токен, а он не установлен.
    #[error("unauthorized")]
    Unauthorized,

    /// Некорректный запрос на стороне клиента.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Результат операций `blog-feed`.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub(crate) fn from_http_status(status: reqwest::StatusCode, message: Option<String>) -> Self {
        let message = message
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("http status {status}"));
        Self::Http {
            status: status.as_u16(),
            message,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::from_http_status(status, None);
        }
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        Self::Network(err)
    }

    /// HTTP-статус ответа, если ошибка пришла от сервера.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` для 404: ресурс по ключу не существует.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn from_http_status_keeps_server_message() {
        let err = ApiError::from_http_status(StatusCode::CONFLICT, Some("slug taken".to_string()));
        match err {
            ApiError::Http { status, message } => {
                assert_eq!(status, 409);
                assert_eq!(message, "slug taken");
            }
            other => panic!("expected http error, got {other:?}"),
        }
    }

    #[test]
    fn from_http_status_falls_back_to_status_line() {
        let err = ApiError::from_http_status(StatusCode::BAD_GATEWAY, Some("   ".to_string()));
        assert_eq!(err.status(), Some(502));
        assert!(err.to_string().contains("502"));
    }

    #[test]
    fn is_not_found_only_for_404() {
        let missing = ApiError::from_http_status(StatusCode::NOT_FOUND, None);
        assert!(missing.is_not_found());
        assert!(!ApiError::Unauthorized.is_not_found());
    }
}
