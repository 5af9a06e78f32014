/// Errors raised by the search client and surfaced through the orchestrator.
///
/// Messages never carry the API credential.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// A required credential is missing or unusable.
    #[error("{0}")]
    Configuration(String),

    /// The upstream provider answered with a non-2xx status or did not answer at all.
    #[error("{message}")]
    Upstream {
        status_code: Option<u16>,
        message: String,
    },

    /// Wrapper returned by `basic_search` around whatever went wrong underneath.
    #[error("Search failed: {0}")]
    Failed(#[source] Box<SearchError>),
}

impl SearchError {
    pub fn upstream(status_code: Option<u16>, message: impl Into<String>) -> Self {
        SearchError::Upstream {
            status_code,
            message: message.into(),
        }
    }

    pub fn failed(inner: SearchError) -> Self {
        match inner {
            // never double wrap
            SearchError::Failed(_) => inner,
            other => SearchError::Failed(Box::new(other)),
        }
    }

    /// Coarse type tag exposed to API callers.
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::Configuration(_) => "ConfigurationError",
            SearchError::Upstream { .. } => "UpstreamError",
            SearchError::Failed(_) => "SearchFailure",
        }
    }

    /// The innermost error, skipping any `Failed` wrappers.
    pub fn root(&self) -> &SearchError {
        match self {
            SearchError::Failed(inner) => inner.root(),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_upstream_uses_message() {
        let err = SearchError::upstream(Some(401), "SERP API returned 401: Invalid API key");
        assert_eq!(err.to_string(), "SERP API returned 401: Invalid API key");
        assert_eq!(err.kind(), "UpstreamError");
    }

    #[test]
    fn failed_wraps_once() {
        let err = SearchError::failed(SearchError::Configuration(
            "SERP_API_KEY is not configured".into(),
        ));
        let twice = SearchError::failed(err);
        assert_eq!(
            twice.to_string(),
            "Search failed: SERP_API_KEY is not configured"
        );
        assert_eq!(twice.kind(), "SearchFailure");
        assert_eq!(twice.root().kind(), "ConfigurationError");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchError>();
    }
}
