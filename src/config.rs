use crate::engine::catalog::{self, ConceptCatalog};
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;

#[derive(Clone, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub llm_url: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    pub llm_temperature: f32,
    pub llm_timeout_secs: u64,
    pub database_url: String,

    // Conversation memory settings
    pub memory_max_entries: usize,
    pub memory_max_users: usize,
    pub topic_cache_size: usize,

    // Learning defaults
    pub default_difficulty: u8,
    pub seed_sample_content: bool,
    pub concepts: ConceptCatalog,
}

const CONCEPTS_FILE: &str = "concepts.toml";

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        Self::build()
    }

    fn build() -> anyhow::Result<Self> {
        let default_difficulty: u8 = env::var("DEFAULT_DIFFICULTY")
            .unwrap_or_else(|_| "50".to_string())
            .parse()
            .unwrap_or(50);

        Ok(Config {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid port number"))?,
            llm_url: env::var("LLM_URL").unwrap_or_else(|_| "http://127.0.0.1:1234/v1".to_string()),
            llm_model: env::var("LLM_MODEL").unwrap_or_else(|_| "local-model".to_string()),
            llm_api_key: env::var("LLM_API_KEY").ok(),
            llm_temperature: env::var("LLM_TEMPERATURE")
                .unwrap_or_else(|_| "0.7".to_string())
                .parse()
                .unwrap_or(0.7),
            llm_timeout_secs: env::var("LLM_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()
                .unwrap_or(120),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "microlearn.db".to_string()),
            memory_max_entries: env::var("MEMORY_MAX_ENTRIES")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .unwrap_or(20),
            memory_max_users: env::var("MEMORY_MAX_USERS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap_or(1000),
            topic_cache_size: env::var("TOPIC_CACHE_SIZE")
                .unwrap_or_else(|_| "64".to_string())
                .parse()
                .unwrap_or(64),
            default_difficulty: default_difficulty.min(100),
            seed_sample_content: env::var("SEED_SAMPLE_CONTENT")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            concepts: Self::load_concept_catalog()?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Concept catalog: `concepts.toml`, then `CONCEPT_CATALOG` JSON, then the built-in table.
    pub fn load_concept_catalog() -> anyhow::Result<ConceptCatalog> {
        if let Ok(content) = fs::read_to_string(CONCEPTS_FILE) {
            match toml::from_str::<ConceptCatalog>(&content) {
                Ok(catalog) => return Ok(catalog),
                Err(e) => tracing::warn!("Ignoring malformed {}: {}", CONCEPTS_FILE, e),
            }
        }

        if let Some(catalog) = env::var("CONCEPT_CATALOG")
            .ok()
            .and_then(|raw| Self::parse_catalog_json(&raw))
        {
            return Ok(catalog);
        }

        Ok(catalog::builtin())
    }

    fn parse_catalog_json(raw: &str) -> Option<ConceptCatalog> {
        match serde_json::from_str(raw) {
            Ok(catalog) => Some(catalog),
            Err(e) => {
                tracing::warn!("Ignoring malformed CONCEPT_CATALOG: {}", e);
                None
            }
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("llm_url", &self.llm_url)
            .field("llm_model", &self.llm_model)
            .field(
                "llm_api_key",
                &self.llm_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("llm_temperature", &self.llm_temperature)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("database_url", &self.database_url)
            .field("memory_max_entries", &self.memory_max_entries)
            .field("memory_max_users", &self.memory_max_users)
            .field("topic_cache_size", &self.topic_cache_size)
            .field("default_difficulty", &self.default_difficulty)
            .field("seed_sample_content", &self.seed_sample_content)
            .field("concept_topics", &self.concepts.topics().len())
            .finish()
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        llm_url: "test".to_string(),
        llm_model: "test".to_string(),
        llm_api_key: None,
        llm_temperature: 0.7,
        llm_timeout_secs: 5,
        database_url: ":memory:".to_string(),
        memory_max_entries: 20,
        memory_max_users: 100,
        topic_cache_size: 8,
        default_difficulty: 50,
        seed_sample_content: true,
        concepts: catalog::builtin(),
    }
}
