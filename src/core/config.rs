use crate::error::{PlannerError, Result};
use std::time::Duration;

pub const DEFAULT_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";
pub const DEFAULT_COMPLETION_URL: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "deepseek-r1-distill-qwen-32b";

/// Runtime configuration injected into a [`crate::TripPlanner`].
///
/// Secrets may be absent here; their presence is checked when a plan is
/// requested so that a missing key surfaces as a failed envelope instead of
/// a construction error.
#[derive(Clone, Debug)]
pub struct PlannerConfig {
    pub search_api_key: Option<String>,
    pub search_engine_id: Option<String>,
    pub completion_api_key: Option<String>,
    pub search_base_url: String,
    pub completion_base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub search_result_count: u32,
    /// Deadline for a single HTTP attempt
    pub request_timeout: Duration,
    /// Retries after the first attempt before giving up
    pub max_retries: usize,
    pub backoff_base: Duration,
    pub booking_latency: Duration,
    /// Probability in `[0, 1]` that a mock booking fails
    pub booking_failure_rate: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            search_api_key: None,
            search_engine_id: None,
            completion_api_key: None,
            search_base_url: DEFAULT_SEARCH_URL.to_string(),
            completion_base_url: DEFAULT_COMPLETION_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.7,
            max_tokens: 4500,
            search_result_count: 10,
            request_timeout: Duration::from_secs(60),
            max_retries: 3,
            backoff_base: Duration::from_millis(1000),
            booking_latency: Duration::from_millis(1500),
            booking_failure_rate: 0.05,
        }
    }
}

impl PlannerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search_credentials(
        mut self,
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
    ) -> Self {
        self.search_api_key = Some(api_key.into());
        self.search_engine_id = Some(engine_id.into());
        self
    }

    pub fn with_completion_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.completion_api_key = Some(api_key.into());
        self
    }

    pub fn with_search_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.search_base_url = base_url.into();
        self
    }

    pub fn with_completion_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.completion_base_url = base_url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_backoff_base(mut self, backoff_base: Duration) -> Self {
        self.backoff_base = backoff_base;
        self
    }

    pub fn with_booking_latency(mut self, latency: Duration) -> Self {
        self.booking_latency = latency;
        self
    }

    pub fn with_booking_failure_rate(mut self, rate: f64) -> Self {
        self.booking_failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Fails with [`PlannerError::Config`] unless all three secrets are set
    pub fn validate_credentials(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("GOOGLE_API_KEY", &self.search_api_key),
            ("GOOGLE_SEARCH_ENGINE_ID", &self.search_engine_id),
            ("GROQ_API_KEY", &self.completion_api_key),
        ]
        .iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| *name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(PlannerError::Config(format!(
                "missing credentials: {}",
                missing.join(", ")
            )))
        }
    }

    /// Upper bound on the time a single completion call can take, counting
    /// every attempt and the longest backoff between them.
    pub fn worst_case_latency(&self) -> Duration {
        let attempts = self.max_retries as u32 + 1;
        let max_backoff = self.backoff_base * 2u32.saturating_pow(self.max_retries as u32);
        (self.request_timeout + max_backoff) * attempts
    }

    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        config.search_api_key = std::env::var("GOOGLE_API_KEY").ok();
        config.search_engine_id = std::env::var("GOOGLE_SEARCH_ENGINE_ID").ok();
        config.completion_api_key = std::env::var("GROQ_API_KEY").ok();

        if let Ok(url) = std::env::var("SEARCH_BASE_URL") {
            config.search_base_url = url;
        }
        if let Ok(url) = std::env::var("COMPLETION_BASE_URL") {
            config.completion_base_url = url;
        }
        if let Ok(model) = std::env::var("TRIP_PLANNER_MODEL") {
            config.model = model;
        }
        if let Some(secs) = parse_env::<u64>("REQUEST_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = parse_env::<usize>("MAX_RETRIES")? {
            config.max_retries = retries;
        }
        if let Some(millis) = parse_env::<u64>("BACKOFF_BASE_MS")? {
            config.backoff_base = Duration::from_millis(millis);
        }

        Ok(config)
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| PlannerError::Config(format!("{name} must be a number, got `{raw}`"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_are_listed() {
        let config = PlannerConfig::new().with_completion_api_key("groq");
        let err = config.validate_credentials().unwrap_err();

        let message = err.to_string();
        assert!(message.contains("GOOGLE_API_KEY"));
        assert!(message.contains("GOOGLE_SEARCH_ENGINE_ID"));
        assert!(!message.contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_blank_credentials_count_as_missing() {
        let config = PlannerConfig::new()
            .with_search_credentials("key", "  ")
            .with_completion_api_key("groq");
        assert!(config.validate_credentials().is_err());

        let config = PlannerConfig::new()
            .with_search_credentials("key", "cx")
            .with_completion_api_key("groq");
        assert!(config.validate_credentials().is_ok());
    }

    #[test]
    fn test_worst_case_latency() {
        let config = PlannerConfig::new()
            .with_timeout(Duration::from_secs(10))
            .with_max_retries(2)
            .with_backoff_base(Duration::from_secs(1));

        // (10s + 1s * 2^2) * 3 attempts
        assert_eq!(config.worst_case_latency(), Duration::from_secs(42));
    }
}
