use thiserror::Error;

/// Main error type for the trip planner
#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{service} API error ({status}): {body}")]
    Upstream {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Rate limit exceeded after {attempts} attempts, please wait a moment and try again")]
    RateLimit { attempts: usize },

    #[error("Prompt is too long for the model even after {attempts} truncation attempts")]
    ContextLength { attempts: usize },

    #[error("No trip plan generated by the completion API")]
    EmptyCompletion,

    #[error("No search results found for {0}")]
    NoSearchResults(String),

    #[error("Invalid trip plan format received from API: {0}")]
    MalformedPlan(String),

    #[error("Invalid itinerary format received from API: {0}")]
    MalformedItinerary(String),

    #[error("HTTP transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown error occurred: {0}")]
    Unknown(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, PlannerError>;

impl PlannerError {
    /// Whether the failure is transient and the caller may try again later.
    ///
    /// These variants are only returned once the client's own retries are
    /// used up.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PlannerError::Timeout(_)
                | PlannerError::RateLimit { .. }
                | PlannerError::ContextLength { .. }
        )
    }

    /// Get the error code for structured responses
    pub fn error_code(&self) -> &'static str {
        match self {
            PlannerError::Validation(_) => "VALIDATION_ERROR",
            PlannerError::Config(_) => "CONFIG_ERROR",
            PlannerError::Upstream { .. } => "UPSTREAM_ERROR",
            PlannerError::Timeout(_) => "TIMEOUT_ERROR",
            PlannerError::RateLimit { .. } => "RATE_LIMIT_ERROR",
            PlannerError::ContextLength { .. } => "CONTEXT_LENGTH_ERROR",
            PlannerError::EmptyCompletion => "EMPTY_COMPLETION",
            PlannerError::NoSearchResults(_) => "NO_SEARCH_RESULTS",
            PlannerError::MalformedPlan(_) => "MALFORMED_PLAN",
            PlannerError::MalformedItinerary(_) => "MALFORMED_ITINERARY",
            PlannerError::Transport(_) => "TRANSPORT_ERROR",
            PlannerError::Serialization(_) => "SERIALIZATION_ERROR",
            PlannerError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }

    /// Message shown to the end user. Distinguishes which stage failed so
    /// the presentation layer can give targeted guidance.
    pub fn user_message(&self) -> String {
        match self {
            PlannerError::Upstream {
                service: "search",
                status,
                ..
            } => format!("Search failed: the search API responded with status {status}"),
            PlannerError::Upstream { status, body, .. } => {
                format!("Trip generation failed ({status}): {body}")
            }
            PlannerError::NoSearchResults(_) => {
                "No search results found for this destination".to_string()
            }
            PlannerError::Config(_) => "API keys not configured".to_string(),
            other => other.to_string(),
        }
    }

    /// Convert to a structured error payload
    pub fn to_error_payload(&self) -> serde_json::Value {
        serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.user_message(),
                "retryable": self.is_retryable()
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let error = PlannerError::RateLimit { attempts: 4 };
        assert_eq!(error.error_code(), "RATE_LIMIT_ERROR");
        assert!(error.is_retryable());
        assert!(error.to_string().contains("4 attempts"));

        let error = PlannerError::MalformedPlan("missing brace".to_string());
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_user_message_distinguishes_stage() {
        let search = PlannerError::Upstream {
            service: "search",
            status: 403,
            body: "forbidden".to_string(),
        };
        assert!(search.user_message().starts_with("Search failed"));

        let completion = PlannerError::Upstream {
            service: "completion",
            status: 500,
            body: "boom".to_string(),
        };
        assert!(completion.user_message().starts_with("Trip generation failed"));
    }

    #[test]
    fn test_unknown_error_message() {
        let error = PlannerError::Unknown("task cancelled".to_string());
        assert_eq!(error.error_code(), "UNKNOWN_ERROR");
        assert_eq!(error.user_message(), "Unknown error occurred: task cancelled");
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_error_payload() {
        let payload = PlannerError::EmptyCompletion.to_error_payload();
        assert_eq!(payload["error"]["code"], "EMPTY_COMPLETION");
        assert_eq!(payload["error"]["retryable"], false);
    }
}
