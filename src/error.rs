use thiserror::Error;

pub type Result<T> = std::result::Result<T, ItemsenseError>;

#[derive(Debug, Error)]
pub enum ItemsenseError {
    /// A configured or generated selector string failed to parse. Fatal for
    /// that one selector only; callers drop the candidate/field and continue.
    #[error("invalid selector syntax: {0}")]
    InvalidSelectorSyntax(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("fetch failed: {0}")]
    Fetch(String),

    #[error("store: {0}")]
    Store(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/* Conversions so `?` works smoothly */
impl From<reqwest::Error> for ItemsenseError {
    fn from(e: reqwest::Error) -> Self {
        ItemsenseError::Fetch(e.to_string())
    }
}
