//! Configuration for aivis.
//!
//! Configuration sources (highest priority first):
//! 1. `--config <path>` on the command line
//! 2. `AIVIS_CONFIG` environment variable
//! 3. `.aivis/config.yaml` in the current directory or any parent
//! 4. `~/.aivis/config.yaml`
//!
//! The resolved value is passed explicitly to the engine; nothing here is
//! cached globally.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::{Analyzer, ScanSettings};
use crate::domain::Entity;
use crate::ingest::{QueryClassifier, DEFAULT_NUM_CONSUMER};

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "AIVIS_CONFIG";

const CONFIG_DIR: &str = ".aivis";
const CONFIG_FILE: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    pub business: BusinessConfig,
    #[serde(default)]
    pub competitors: Vec<CompetitorEntry>,
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default)]
    pub queries: QueriesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessConfig {
    pub name: String,
    /// Website; its domain is matched as an alias
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// A competitor given as a bare name or with aliases
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompetitorEntry {
    Name(String),
    Detailed {
        name: String,
        #[serde(default)]
        aliases: Vec<String>,
    },
}

impl CompetitorEntry {
    pub fn name(&self) -> &str {
        match self {
            CompetitorEntry::Name(name) => name,
            CompetitorEntry::Detailed { name, .. } => name,
        }
    }

    fn to_entity(&self) -> Result<Entity> {
        let entity = match self {
            CompetitorEntry::Name(name) => Entity::new(name.as_str())?,
            CompetitorEntry::Detailed { name, aliases } => {
                Entity::new(name.as_str())?.with_aliases(aliases.iter().map(String::as_str))?
            }
        };
        Ok(entity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueriesConfig {
    /// Query ids up to this value are consumer queries
    #[serde(default = "default_num_consumer")]
    pub num_consumer: u32,
}

fn default_num_consumer() -> u32 {
    DEFAULT_NUM_CONSUMER
}

impl Default for QueriesConfig {
    fn default() -> Self {
        Self {
            num_consumer: default_num_consumer(),
        }
    }
}

/// Resolved configuration
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// Path to the config file that was loaded
    pub config_file: PathBuf,
    pub business: BusinessConfig,
    pub competitors: Vec<CompetitorEntry>,
    pub scan: ScanSettings,
    pub queries: QueriesConfig,
}

impl ResolvedConfig {
    /// Build entities from the config, validating names and aliases
    pub fn entities(&self) -> Result<(Entity, Vec<Entity>)> {
        let mut business = Entity::new(self.business.name.as_str())
            .context("Invalid business in config")?
            .with_aliases(self.business.aliases.iter().map(String::as_str))
            .context("Invalid business alias in config")?;
        if let Some(url) = &self.business.url {
            business = business.with_url(url);
        }

        let competitors = self
            .competitors
            .iter()
            .map(|c| {
                c.to_entity()
                    .with_context(|| format!("Invalid competitor in config: '{}'", c.name()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok((business, competitors))
    }

    /// Build the analysis engine
    pub fn build_analyzer(&self) -> Result<Analyzer> {
        let (business, competitors) = self.entities()?;
        Analyzer::new(business, competitors, self.scan.clone()).context("Invalid scan settings in config")
    }

    /// Query classifier for records without a query type
    pub fn query_classifier(&self) -> QueryClassifier {
        QueryClassifier::new(self.business.name.as_str(), self.queries.num_consumer)
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.is_file() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Pick the config file path from all sources
fn locate_config(
    explicit: Option<&Path>,
    env_path: Option<PathBuf>,
    cwd: Option<&Path>,
    home: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = env_path {
        return Some(path);
    }
    if let Some(found) = cwd.and_then(find_config_file) {
        return Some(found);
    }
    home.map(|h| h.join(CONFIG_DIR).join(CONFIG_FILE))
        .filter(|p| p.is_file())
}

/// Load and parse config file
pub fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve configuration from a known file
pub fn resolve_config(path: &Path) -> Result<ResolvedConfig> {
    let config = load_config_file(path)?;
    config
        .scan
        .validate()
        .with_context(|| format!("Invalid scan settings in {}", path.display()))?;

    Ok(ResolvedConfig {
        config_file: path.to_path_buf(),
        business: config.business,
        competitors: config.competitors,
        scan: config.scan,
        queries: config.queries,
    })
}

/// Load configuration from all sources
pub fn load_config(explicit: Option<&Path>) -> Result<ResolvedConfig> {
    let env_path = std::env::var_os(CONFIG_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);
    let cwd = std::env::current_dir().ok();
    let home = dirs::home_dir();

    let path = locate_config(explicit, env_path, cwd.as_deref(), home.as_deref()).with_context(|| {
        format!(
            "No config file found. Pass --config, set {}, or create {}/{}",
            CONFIG_ENV, CONFIG_DIR, CONFIG_FILE
        )
    })?;

    resolve_config(&path)
}
