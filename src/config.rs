use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub clustering: ClusteringConfig,

    #[serde(default)]
    pub dedup: DedupTagConfig,
}

/// Where the catalog backend lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    "http://127.0.0.1:9770".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Tunables for duplicate detection and similarity grouping. The defaults
/// were observed to work on real libraries but are not claimed optimal,
/// which is why they live here instead of in the code.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClusteringConfig {
    /// Max confidence delta for two captures to count as the same frame.
    #[serde(default = "default_eps")]
    pub confidence_eps: f32,

    /// Max quality delta for two captures to count as the same frame.
    #[serde(default = "default_eps")]
    pub quality_eps: f32,

    /// Default similarity threshold for cross-identity grouping.
    #[serde(default = "default_group_threshold")]
    pub group_threshold: f32,
}

fn default_eps() -> f32 {
    0.01
}

fn default_group_threshold() -> f32 {
    0.60
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            confidence_eps: default_eps(),
            quality_eps: default_eps(),
            group_threshold: default_group_threshold(),
        }
    }
}

/// Naming scheme for duplicate-media group tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupTagConfig {
    /// Namespace prefix all group tags share.
    #[serde(default = "default_tag_prefix")]
    pub prefix: String,

    /// Hex characters of the member-set hash kept in the tag name.
    #[serde(default = "default_hash_width")]
    pub hash_width: usize,
}

fn default_tag_prefix() -> String {
    "dup-".to_string()
}

fn default_hash_width() -> usize {
    12
}

impl Default for DedupTagConfig {
    fn default() -> Self {
        Self {
            prefix: default_tag_prefix(),
            hash_width: default_hash_width(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            // Create default config
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("facecat")
            .join("config.toml")
    }
}
