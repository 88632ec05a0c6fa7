use crate::sources::SelectOption;
use crate::tui::components::dual_list::{split_value, SearchPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Configuration failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid value '{value}' for {key}")]
    InvalidEnv { key: String, value: String },

    #[error("Duplicate option value '{0}'")]
    DuplicateOption(String),

    #[error("Selected value '{0}' is not one of the options")]
    UnknownSelection(String),

    #[error("min_query_length must be greater than 0")]
    InvalidMinQueryLength,
}

/// Application configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Widget inputs
    pub widget: WidgetConfig,

    /// Search behavior
    pub search: SearchConfig,

    /// HTTP lookup service for field-keyed lookups
    pub lookup: Option<LookupConfig>,

    /// JSON catalog backing picklist metadata
    pub metadata_catalog: Option<PathBuf>,
}

/// Inputs of a single selection widget
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    /// Identifier carried by change notifications
    pub name: String,

    /// Label of the closed input
    pub label: String,

    /// Initial committed value in canonical form
    pub value: Option<String>,

    /// Static candidate options
    pub options: Vec<SelectOption>,

    /// Initial selection; takes precedence over `value`
    pub selected: Vec<String>,

    pub object_api_name: Option<String>,
    pub field_api_name: Option<String>,

    /// Modal header; the label is used when unset
    pub header: Option<String>,

    /// Style overrides for the modal, e.g. `border-color: yellow`
    pub modal_styles: Option<String>,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            name: "selection".to_string(),
            label: "Select".to_string(),
            value: None,
            options: Vec::new(),
            selected: Vec::new(),
            object_api_name: None,
            field_api_name: None,
            header: None,
            modal_styles: None,
        }
    }
}

impl WidgetConfig {
    /// Initial committed selection
    pub fn initial_selection(&self) -> Vec<String> {
        if !self.selected.is_empty() {
            return self.selected.clone();
        }
        self.value.as_deref().map(split_value).unwrap_or_default()
    }

    /// Whether options are used as given rather than resolved at connect
    pub fn is_static(&self) -> bool {
        self.object_api_name.is_none() && self.field_api_name.is_none()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub min_query_length: usize,
    pub remote_search: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        let policy = SearchPolicy::default();
        Self {
            debounce_ms: policy.debounce.as_millis() as u64,
            min_query_length: policy.min_query_length,
            remote_search: policy.remote_search,
        }
    }
}

impl From<&SearchConfig> for SearchPolicy {
    fn from(config: &SearchConfig) -> Self {
        Self {
            min_query_length: config.min_query_length,
            debounce: Duration::from_millis(config.debounce_ms),
            remote_search: config.remote_search,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupConfig {
    pub base_url: String,
    #[serde(default = "default_lookup_timeout")]
    pub timeout_secs: u64,
}

fn default_lookup_timeout() -> u64 {
    10
}

impl LookupConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_secs: default_lookup_timeout(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Initialize configuration from files and the environment
    pub async fn init() -> Result<Self, ConfigError> {
        debug!("Initializing configuration");

        // A missing .env file is fine
        dotenvy::dotenv().ok();

        let mut config = match Self::load_from_file().await? {
            Some(config) => config,
            None => Self::default(),
        };
        config.load_from_env()?;
        Ok(config)
    }

    /// Candidate configuration files in priority order
    pub fn config_paths() -> Vec<PathBuf> {
        // 1. ./.duallist.json
        // 2. ./duallist.json
        // 3. $CONFIG_DIR/duallist/duallist.json
        let mut paths = vec![
            PathBuf::from("./.duallist.json"),
            PathBuf::from("./duallist.json"),
        ];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("duallist").join("duallist.json"));
        }
        paths
    }

    /// Load the first configuration file found, if any
    pub async fn load_from_file() -> Result<Option<Self>, ConfigError> {
        for path in Self::config_paths() {
            if path.exists() {
                return Self::load_from_path(&path).await.map(Some);
            }
        }
        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        debug!("Loading configuration from: {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `DUALLIST_*` environment overrides
    pub fn load_from_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `var`
    pub fn apply_env_from<F>(&mut self, var: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = var("DUALLIST_NAME") {
            self.widget.name = name;
        }
        if let Some(label) = var("DUALLIST_LABEL") {
            self.widget.label = label;
        }
        if let Some(value) = var("DUALLIST_VALUE") {
            self.widget.value = Some(value);
        }
        if let Some(header) = var("DUALLIST_HEADER") {
            self.widget.header = Some(header);
        }
        if let Some(object) = var("DUALLIST_OBJECT") {
            self.widget.object_api_name = Some(object);
        }
        if let Some(field) = var("DUALLIST_FIELD") {
            self.widget.field_api_name = Some(field);
        }
        if let Some(styles) = var("DUALLIST_MODAL_STYLES") {
            self.widget.modal_styles = Some(styles);
        }

        if let Some(url) = var("DUALLIST_LOOKUP_URL") {
            self.lookup
                .get_or_insert_with(|| LookupConfig::new(url.clone()))
                .base_url = url.clone();
        }
        if let Some(timeout) = var("DUALLIST_LOOKUP_TIMEOUT_SECS") {
            let secs = parse_env("DUALLIST_LOOKUP_TIMEOUT_SECS", timeout)?;
            if let Some(lookup) = &mut self.lookup {
                lookup.timeout_secs = secs;
            }
        }

        if let Some(debounce) = var("DUALLIST_DEBOUNCE_MS") {
            self.search.debounce_ms = parse_env("DUALLIST_DEBOUNCE_MS", debounce)?;
        }
        if let Some(min) = var("DUALLIST_MIN_QUERY_LENGTH") {
            self.search.min_query_length = parse_env("DUALLIST_MIN_QUERY_LENGTH", min)?;
        }
        if let Some(remote) = var("DUALLIST_REMOTE_SEARCH") {
            self.search.remote_search = remote.to_lowercase() == "true";
        }

        if let Some(catalog) = var("DUALLIST_METADATA_CATALOG") {
            self.metadata_catalog = Some(PathBuf::from(catalog));
        }
        Ok(())
    }

    pub fn search_policy(&self) -> SearchPolicy {
        SearchPolicy::from(&self.search)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.search.min_query_length == 0 {
            return Err(ConfigError::InvalidMinQueryLength);
        }

        let mut seen = HashSet::new();
        for option in &self.widget.options {
            if !seen.insert(option.value.as_str()) {
                return Err(ConfigError::DuplicateOption(option.value.clone()));
            }
        }

        // Resolved sources may legitimately know values the static list doesn't
        if self.widget.is_static() && self.lookup.is_none() {
            for value in self.widget.initial_selection() {
                if !seen.contains(value.as_str()) {
                    return Err(ConfigError::UnknownSelection(value));
                }
            }
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value,
    })
}
