use axum::{response::IntoResponse, http::StatusCode};

#[derive(Debug, thiserror::Error)]
pub enum ShelfError {
    #[error("template error: {0}")]
    LiquidError(#[from] liquid::Error),
    #[error("git error: {0}")]
    GitError(#[from] git2::Error),
    #[error("not found")]
    NotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("highlighting error: {0}")]
    HighlightingError(#[from] syntect::Error),
    #[error("missing config: {0}")]
    MissingConfig(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("io error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("toml parser error: {0}")]
    TomlError(#[from] toml::de::Error),
}

impl ShelfError {
    /// Turns libgit2 lookups that failed because the object is absent into
    /// `NotFound`, keeping every other git failure as is.
    pub fn from_lookup(e: git2::Error) -> Self {
        match e.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::InvalidSpec | git2::ErrorCode::Ambiguous => {
                ShelfError::NotFound
            }
            _ => e.into(),
        }
    }
}

impl IntoResponse for ShelfError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match &self {
            ShelfError::LiquidError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "templating error".to_owned()),
            ShelfError::GitError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "git error".to_owned()),
            ShelfError::NotFound => (StatusCode::NOT_FOUND, "not found".to_owned()),
            ShelfError::BadRequest(reason) => (StatusCode::BAD_REQUEST, format!("bad request: {}", reason)),
            ShelfError::HighlightingError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "highlighting error".to_owned()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned()),
        };
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("{}", self);
        }
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ShelfError>;
