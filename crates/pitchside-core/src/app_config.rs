use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub llm_api_key: Option<String>,
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_backoff_base_ms: u64,
    pub processing_interval_secs: u64,
    pub inter_fixture_delay_ms: u64,
    pub article_length: String,
    pub max_articles_per_fixture: usize,
    /// `None` disables markdown export.
    pub articles_dir: Option<PathBuf>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
    pub image_bucket: String,
    pub google_api_key: Option<String>,
    pub image_model: String,
}

impl AppConfig {
    /// Returns the names of optional integrations that are not configured,
    /// paired with what they are needed for.
    #[must_use]
    pub fn missing_integrations(&self) -> Vec<(&'static str, &'static str)> {
        let mut missing = Vec::new();
        if self.llm_api_key.is_none() {
            missing.push(("OPENAI_API_KEY", "required for article generation"));
        }
        if self.supabase_url.is_none() {
            missing.push(("SUPABASE_URL", "required for image storage"));
        }
        if self.supabase_key.is_none() {
            missing.push(("SUPABASE_KEY", "required for image storage"));
        }
        if self.google_api_key.is_none() {
            missing.push(("GOOGLE_API_KEY", "required for image generation"));
        }
        missing
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "llm_api_key",
                &self.llm_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("llm_base_url", &self.llm_base_url)
            .field("llm_model", &self.llm_model)
            .field("llm_temperature", &self.llm_temperature)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("processing_interval_secs", &self.processing_interval_secs)
            .field("inter_fixture_delay_ms", &self.inter_fixture_delay_ms)
            .field("article_length", &self.article_length)
            .field("max_articles_per_fixture", &self.max_articles_per_fixture)
            .field("articles_dir", &self.articles_dir)
            .field("supabase_url", &self.supabase_url)
            .field(
                "supabase_key",
                &self.supabase_key.as_ref().map(|_| "[redacted]"),
            )
            .field("image_bucket", &self.image_bucket)
            .field(
                "google_api_key",
                &self.google_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field("image_model", &self.image_model)
            .finish()
    }
}
