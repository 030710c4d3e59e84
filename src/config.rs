use std::time::Duration;

const DEFAULT_DELEGATE_TIMEOUT_MS: u64 = 500;
const DEFAULT_CACHE_TTL_SECS: u64 = 5 * 60;
const DEFAULT_SENTIMENT_SOURCES: [&str; 2] = ["social", "news"];

/// Runtime configuration for the scoring engine
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Upper bound on a single prediction delegate submission
    pub delegate_timeout: Duration,
    /// How long a computed report stays in the score cache
    pub cache_ttl: Duration,
    /// Sentiment providers averaged by the psychological model
    pub sentiment_sources: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            delegate_timeout: Duration::from_millis(DEFAULT_DELEGATE_TIMEOUT_MS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            sentiment_sources: DEFAULT_SENTIMENT_SOURCES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let delegate_timeout = std::env::var("SCORING_DELEGATE_TIMEOUT_MS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.delegate_timeout);

        let cache_ttl = std::env::var("SCORING_CACHE_TTL_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);

        let sentiment_sources = std::env::var("SCORING_SENTIMENT_SOURCES")
            .ok()
            .map(|value| parse_sources(&value))
            .filter(|sources| sources.len() >= 2)
            .unwrap_or(defaults.sentiment_sources);

        Self {
            delegate_timeout,
            cache_ttl,
            sentiment_sources,
        }
    }

    pub fn with_delegate_timeout(mut self, timeout: Duration) -> Self {
        self.delegate_timeout = timeout;
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

fn parse_sources(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
