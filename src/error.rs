//! Error type shared by the library modules

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Input could not be parsed as a `YYYY-MM-DD` date
    #[error("invalid date {input:?}, expected YYYY-MM-DD")]
    InvalidDate {
        input: String,
        /// `None` when the text is not shaped like a date at all
        #[source]
        source: Option<chrono::ParseError>,
    },

    #[error("missing status store path")]
    MissingStorePath,

    #[error("invalid table name {0:?}")]
    InvalidTableName(String),

    #[error("missing notification key (set BARK_KEY or pass --key)")]
    MissingNotifyKey,

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("notification rejected with status {0}")]
    NotifyStatus(u16),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Glob(#[from] glob::PatternError),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
