//! Configuration management for Abunda.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Built-in defaults
//! - Config file (`.abunda/config.yaml` in the workspace, or `ABUNDA_CONFIG`)
//! - Environment variables
//! - Command-line flags
//!
//! The settings sections (`vectorStore`, `embedding`, `generation`,
//! `chunking`, `retrieval`, `history`) are consumed by the knowledge engine
//! and its adapters.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Default persona given to the generation provider as its system instruction.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are Abunda AI, the enterprise knowledge \
operating system. Your mission is to help employees by answering questions based on the \
information provided to you. You are professional, precise and helpful. When the provided \
information does not contain the answer, say so plainly instead of guessing.";

/// Known vector store backends.
pub const VECTOR_STORE_PROVIDERS: [&str; 3] = ["qdrant", "sqlite", "memory"];

/// Known embedding backends.
pub const EMBEDDING_PROVIDERS: [&str; 2] = ["ollama", "trigram"];

/// Known generation backends.
pub const GENERATION_PROVIDERS: [&str; 2] = ["ollama", "echo"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the workspace root (contains .abunda/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Vector store connection settings
    pub vector_store: VectorStoreSettings,

    /// Embedding provider settings
    pub embedding: EmbeddingSettings,

    /// Generation provider settings
    pub generation: GenerationSettings,

    /// Document chunking settings
    pub chunking: ChunkingSettings,

    /// Retrieval settings
    pub retrieval: RetrievalSettings,

    /// Conversation history settings
    pub history: HistorySettings,
}

/// Vector store settings (`vectorStore` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VectorStoreSettings {
    /// Backend: "qdrant", "sqlite" or "memory"
    pub provider: String,

    /// Endpoint URL (qdrant)
    pub endpoint: String,

    /// Name of the knowledge collection
    pub collection_name: String,

    /// Expected vector dimension; learned from the embedding provider when unset
    pub embedding_dimension: Option<usize>,

    /// Database file (sqlite); defaults to `.abunda/knowledge.sqlite`
    pub path: Option<PathBuf>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "qdrant".to_string(),
            endpoint: "http://localhost:6333".to_string(),
            collection_name: "abunda_knowledge_base".to_string(),
            embedding_dimension: None,
            path: None,
            timeout_secs: 10,
        }
    }
}

/// Embedding provider settings (`embedding` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// Backend: "ollama" or "trigram"
    pub provider: String,

    /// Endpoint URL (ollama)
    pub endpoint: String,

    /// Embedding model identifier
    pub model: String,

    /// Dimension the provider produces
    pub dimensions: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Attempts per embedding request before giving up
    pub max_retries: u32,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            model: "nomic-embed-text".to_string(),
            dimensions: 768,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

/// How conversation history reaches the generation provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Single completion call; history is rendered into the prompt
    #[default]
    Completion,
    /// Stateful chat session; history is replayed as prior messages
    Chat,
}

/// Generation provider settings (`generation` section).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationSettings {
    /// Backend: "ollama" or "echo"
    pub provider: String,

    /// Endpoint URL (ollama)
    pub endpoint: String,

    /// Model used when no preferred model is available
    pub model: String,

    /// Models to prefer, in priority order, if the provider serves them
    pub preferred_models: Vec<String>,

    /// Sampling temperature (0.0 - 2.0)
    pub temperature: f32,

    /// Nucleus sampling
    pub top_p: f32,

    /// Top-k sampling
    pub top_k: u32,

    /// Maximum tokens to generate
    pub max_output_tokens: u32,

    /// Persona and behavior given to the model
    pub system_instruction: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Completion or chat-session generation
    pub mode: GenerationMode,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            preferred_models: Vec::new(),
            temperature: 0.3,
            top_p: 0.95,
            top_k: 64,
            max_output_tokens: 8192,
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            timeout_secs: 120,
            mode: GenerationMode::Completion,
        }
    }
}

impl GenerationSettings {
    /// Pin an explicitly requested model; the preference list no longer applies.
    pub fn use_model(&mut self, model: String) {
        self.model = model;
        self.preferred_models.clear();
    }
}

/// Chunking settings (`chunking` section).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChunkingSettings {
    /// Maximum characters per fragment
    pub chunk_size: usize,

    /// Characters shared between consecutive fragments
    pub chunk_overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            chunk_overlap: 64,
        }
    }
}

/// Retrieval settings (`retrieval` section).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievalSettings {
    /// Fragments retrieved per question
    pub top_k: usize,

    /// Fragments scoring below this cosine similarity are discarded
    pub min_score: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            min_score: 0.0,
        }
    }
}

/// Conversation history settings (`history` section).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistorySettings {
    /// Most recent turns forwarded to the generation provider
    pub max_turns: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self { max_turns: 20 }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    workspace: Option<WorkspaceConfig>,
    logging: Option<LoggingConfig>,
    vector_store: Option<VectorStoreSettings>,
    embedding: Option<EmbeddingSettings>,
    generation: Option<GenerationSettings>,
    chunking: Option<ChunkingSettings>,
    retrieval: Option<RetrievalSettings>,
    history: Option<HistorySettings>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceConfig {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            vector_store: VectorStoreSettings::default(),
            embedding: EmbeddingSettings::default(),
            generation: GenerationSettings::default(),
            chunking: ChunkingSettings::default(),
            retrieval: RetrievalSettings::default(),
            history: HistorySettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// Environment variables:
    /// - `ABUNDA_WORKSPACE`: Override workspace path
    /// - `ABUNDA_CONFIG`: Path to config file
    /// - `ABUNDA_QDRANT_URL`: Vector store endpoint
    /// - `ABUNDA_COLLECTION`: Collection name
    /// - `ABUNDA_OLLAMA_URL`: Endpoint for both embedding and generation
    /// - `ABUNDA_MODEL`: Generation model
    /// - `ABUNDA_EMBEDDING_MODEL`: Embedding model
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use abunda_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Collection: {}", config.vector_store.collection_name);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(None, None)
    }

    /// Load configuration, letting explicit paths win over the environment.
    pub fn load_with(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        } else if let Ok(workspace) = std::env::var("ABUNDA_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Some(config_file) = config_file {
            config.config_file = Some(config_file);
        } else if let Ok(config_file) = std::env::var("ABUNDA_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config.config_file {
            Some(ref cf) => cf.clone(),
            None => config.abunda_dir().join("config.yaml"),
        };

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file not found: {:?}",
                config_path
            )));
        }

        config.apply_env();

        Ok(config)
    }

    /// Environment variables override YAML config.
    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("ABUNDA_QDRANT_URL") {
            self.vector_store.endpoint = url;
        }

        if let Ok(collection) = std::env::var("ABUNDA_COLLECTION") {
            self.vector_store.collection_name = collection;
        }

        if let Ok(url) = std::env::var("ABUNDA_OLLAMA_URL") {
            self.embedding.endpoint = url.clone();
            self.generation.endpoint = url;
        }

        if let Ok(model) = std::env::var("ABUNDA_MODEL") {
            self.generation.use_model(model);
        }

        if let Ok(model) = std::env::var("ABUNDA_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            self.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            self.no_color = true;
        }
    }

    /// Merge YAML configuration file into this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        self.merge_yaml_str(&contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config file {:?}: {}", path, e)))
    }

    fn merge_yaml_str(&self, contents: &str) -> Result<Self, serde_yaml::Error> {
        let config_file: ConfigFile = if contents.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(contents)?
        };

        let mut result = self.clone();

        if let Some(path) = config_file.workspace.and_then(|ws| ws.path) {
            result.workspace = PathBuf::from(path);
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(vector_store) = config_file.vector_store {
            result.vector_store = vector_store;
        }
        if let Some(embedding) = config_file.embedding {
            result.embedding = embedding;
        }
        if let Some(generation) = config_file.generation {
            result.generation = generation;
        }
        if let Some(chunking) = config_file.chunking {
            result.chunking = chunking;
        }
        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }
        if let Some(history) = config_file.history {
            result.history = history;
        }

        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and
    /// the config file.
    pub fn with_overrides(
        mut self,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
        model: Option<String>,
        collection: Option<String>,
    ) -> Self {
        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        if let Some(model) = model {
            self.generation.use_model(model);
        }

        if let Some(collection) = collection {
            self.vector_store.collection_name = collection;
        }

        self
    }

    /// Get the path to the .abunda directory.
    pub fn abunda_dir(&self) -> PathBuf {
        self.workspace.join(".abunda")
    }

    /// Ensure the .abunda directory exists.
    pub fn ensure_abunda_dir(&self) -> AppResult<()> {
        let dir = self.abunda_dir();
        if !dir.exists() {
            std::fs::create_dir_all(&dir).map_err(|e| {
                AppError::Config(format!("Failed to create .abunda directory: {}", e))
            })?;
        }
        Ok(())
    }

    /// Path of the SQLite vector store file.
    pub fn sqlite_path(&self) -> PathBuf {
        self.vector_store
            .path
            .clone()
            .unwrap_or_else(|| self.abunda_dir().join("knowledge.sqlite"))
    }

    /// Validate provider names and numeric ranges.
    pub fn validate(&self) -> AppResult<()> {
        check_known("vector store", &self.vector_store.provider, &VECTOR_STORE_PROVIDERS)?;
        check_known("embedding", &self.embedding.provider, &EMBEDDING_PROVIDERS)?;
        check_known("generation", &self.generation.provider, &GENERATION_PROVIDERS)?;

        if self.vector_store.provider == "qdrant" {
            check_endpoint("vectorStore.endpoint", &self.vector_store.endpoint)?;
        }
        if self.embedding.provider == "ollama" {
            check_endpoint("embedding.endpoint", &self.embedding.endpoint)?;
        }
        if self.generation.provider == "ollama" {
            check_endpoint("generation.endpoint", &self.generation.endpoint)?;
        }

        if self.vector_store.collection_name.trim().is_empty() {
            return Err(AppError::Config(
                "vectorStore.collectionName cannot be empty".to_string(),
            ));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "embedding.dimensions must be greater than 0".to_string(),
            ));
        }

        if self.chunking.chunk_size == 0 {
            return Err(AppError::Config(
                "chunking.chunkSize must be greater than 0".to_string(),
            ));
        }

        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(AppError::Config(format!(
                "chunking.chunkOverlap ({}) must be smaller than chunking.chunkSize ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config(
                "retrieval.topK must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(AppError::Config(format!(
                "generation.temperature must be within 0.0-2.0, got {}",
                self.generation.temperature
            )));
        }

        if !(self.generation.top_p > 0.0 && self.generation.top_p <= 1.0) {
            return Err(AppError::Config(format!(
                "generation.topP must be within (0.0, 1.0], got {}",
                self.generation.top_p
            )));
        }

        Ok(())
    }
}

fn check_known(kind: &str, provider: &str, known: &[&str]) -> AppResult<()> {
    if known.contains(&provider) {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "Unknown {} provider: {}. Supported: {}",
            kind,
            provider,
            known.join(", ")
        )))
    }
}

fn check_endpoint(field: &str, endpoint: &str) -> AppResult<()> {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "{} must be an http(s) URL, got '{}'",
            field, endpoint
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.vector_store.provider, "qdrant");
        assert_eq!(config.vector_store.collection_name, "abunda_knowledge_base");
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.chunking.chunk_size, 512);
        assert!(config.generation.temperature < 0.5);
        assert_eq!(config.generation.mode, GenerationMode::Completion);
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_abunda_dir() {
        let config = AppConfig::default();
        assert!(config.abunda_dir().ends_with(".abunda"));
        assert!(config.sqlite_path().ends_with("knowledge.sqlite"));
    }

    #[test]
    fn test_merge_partial_yaml() {
        let yaml = r#"
vectorStore:
  provider: sqlite
  collectionName: handbook
chunking:
  chunkSize: 256
generation:
  model: llama3.1
  preferredModels: ["llama3.2", "llama3.1"]
  mode: chat
logging:
  level: warn
  color: false
"#;
        let merged = AppConfig::default().merge_yaml_str(yaml).unwrap();

        assert_eq!(merged.vector_store.provider, "sqlite");
        assert_eq!(merged.vector_store.collection_name, "handbook");
        // Unspecified fields keep their defaults
        assert_eq!(merged.vector_store.timeout_secs, 10);
        assert_eq!(merged.chunking.chunk_size, 256);
        assert_eq!(merged.chunking.chunk_overlap, 64);
        assert_eq!(merged.generation.model, "llama3.1");
        assert_eq!(merged.generation.preferred_models.len(), 2);
        assert_eq!(merged.generation.mode, GenerationMode::Chat);
        assert_eq!(merged.log_level, Some("warn".to_string()));
        assert!(merged.no_color);
    }

    #[test]
    fn test_load_with_config_file() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".abunda");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.yaml"),
            "retrieval:\n  topK: 5\n  minScore: 0.25\n",
        )
        .unwrap();

        let config = AppConfig::load_with(Some(temp.path().to_path_buf()), None).unwrap();
        assert_eq!(config.retrieval.top_k, 5);
        assert!((config.retrieval.min_score - 0.25).abs() < f32::EPSILON);
    }

    #[test]
    fn test_load_missing_explicit_config_file() {
        let temp = TempDir::new().unwrap();
        let result = AppConfig::load_with(
            Some(temp.path().to_path_buf()),
            Some(temp.path().join("nope.yaml")),
        );
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            None,
            true,
            false,
            Some("mistral".to_string()),
            Some("docs".to_string()),
        );

        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
        assert_eq!(config.generation.model, "mistral");
        assert_eq!(config.vector_store.collection_name, "docs");
    }

    #[test]
    fn test_explicit_model_replaces_preferences() {
        let mut config = AppConfig::default();
        config.generation.preferred_models = vec!["llama3".to_string(), "gemma".to_string()];

        let config = config.with_overrides(None, false, false, Some("mistral".to_string()), None);
        assert_eq!(config.generation.model, "mistral");
        assert!(config.generation.preferred_models.is_empty());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.vector_store.provider = "pinecone".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Unknown vector store provider"));
    }

    #[test]
    fn test_validate_overlap_not_smaller_than_size() {
        let mut config = AppConfig::default();
        config.chunking.chunk_size = 100;
        config.chunking.chunk_overlap = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_ranges() {
        let mut config = AppConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.generation.temperature = 3.5;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.vector_store.endpoint = "localhost:6333".to_string();
        assert!(config.validate().is_err());

        // Endpoints are irrelevant for local backends
        config.vector_store.provider = "memory".to_string();
        assert!(config.validate().is_ok());
    }
}
