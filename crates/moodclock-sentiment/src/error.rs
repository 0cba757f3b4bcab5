use thiserror::Error;

#[derive(Debug, Error)]
pub enum SentimentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{source_name} error: {message}")]
    Source {
        source_name: &'static str,
        message: String,
    },
}

impl SentimentError {
    pub(crate) fn source_failure(source_name: &'static str, message: impl Into<String>) -> Self {
        Self::Source {
            source_name,
            message: message.into(),
        }
    }
}

/// Failure of a whole country refresh.
///
/// Source failures never reach this type; they degrade to empty input.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("failed to persist snapshot for {country}: {source}")]
    Persistence {
        country: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
