use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Service-wide configuration, loaded once at startup from an optional
/// `config` file layered under process environment variables.
///
/// Every field mirrors an environment variable named in the external
/// interfaces section: graph driver connection details, LLM/NER endpoints,
/// confidence thresholds, and the extraction concurrency cap.
#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    #[serde(default = "default_neo4j_database")]
    pub neo4j_database: String,
    #[serde(default = "default_neo4j_max_connection_lifetime")]
    pub neo4j_max_connection_lifetime: u64,
    #[serde(default = "default_neo4j_max_connection_pool_size")]
    pub neo4j_max_connection_pool_size: usize,
    #[serde(default = "default_neo4j_connection_timeout")]
    pub neo4j_connection_timeout: u64,

    pub llm_base_url: String,
    #[serde(default = "default_llm_timeout")]
    pub llm_timeout: u64,
    #[serde(default = "default_llm_max_tokens")]
    pub llm_max_tokens: u32,
    #[serde(default = "default_llm_temperature")]
    pub llm_temperature: f32,
    #[serde(default = "default_llm_retry_interval")]
    pub llm_retry_interval: u64,

    #[serde(default)]
    pub ner_base_url: Option<String>,
    #[serde(default = "default_entity_min_confidence")]
    pub entity_min_confidence: f32,
    #[serde(default = "default_relation_min_confidence")]
    pub relation_min_confidence: f32,

    #[serde(default = "default_max_concurrent_extractions")]
    pub max_concurrent_extractions: usize,
    #[serde(default = "default_use_ner_entities")]
    pub use_ner_entities: bool,

    #[serde(default = "default_api_host")]
    pub api_host: String,
    #[serde(default = "default_api_port")]
    pub api_port: u16,
    #[serde(default = "default_ingest_max_body_bytes")]
    pub ingest_max_body_bytes: usize,
}

fn default_neo4j_database() -> String {
    "neo4j".to_string()
}

fn default_neo4j_max_connection_lifetime() -> u64 {
    3600
}

fn default_neo4j_max_connection_pool_size() -> usize {
    50
}

fn default_neo4j_connection_timeout() -> u64 {
    30
}

fn default_llm_timeout() -> u64 {
    3600
}

fn default_llm_max_tokens() -> u32 {
    65536
}

fn default_llm_temperature() -> f32 {
    0.6
}

fn default_llm_retry_interval() -> u64 {
    30
}

fn default_entity_min_confidence() -> f32 {
    0.4
}

fn default_relation_min_confidence() -> f32 {
    0.45
}

fn default_max_concurrent_extractions() -> usize {
    4
}

fn default_use_ner_entities() -> bool {
    false
}

fn default_api_host() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8088
}

fn default_ingest_max_body_bytes() -> usize {
    5 * 1024 * 1024
}

pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::default())
        .build()?;

    config.try_deserialize()
}
