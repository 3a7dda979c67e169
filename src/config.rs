//! Configuration management for dealwire using the prefer crate.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::pipeline::{ResolverConfig, REQUIRED_REAL_DEALS};
use crate::publish::SectionLabels;

/// Default aggregator root.
pub const DEFAULT_BASE_URL: &str = "https://www.latestfreestuff.co.uk";

/// Default target document, relative to the working directory.
pub const DEFAULT_DOCUMENT: &str = "index.html";

/// Backups subdirectory name under the data directory.
const BACKUPS_SUBDIR: &str = "backups";

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Aggregator root URL.
    pub base_url: String,
    /// User agent for HTTP requests (None = default browser UA,
    /// "impersonate" = random real browser UA).
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Delay between candidates in milliseconds.
    pub candidate_delay_ms: u64,
    /// Real deals needed before the document is touched.
    pub required_deals: usize,
    /// Candidates taken from a listing per run.
    pub max_candidates: usize,
    /// Claim pages followed per candidate.
    pub max_claim_hops: usize,
    /// Description cap in characters.
    pub description_limit: usize,
    /// Domains trusted in addition to the built-in allowlist.
    pub trusted_domains: Vec<String>,
    /// Target HTML document.
    pub document: PathBuf,
    /// Directory for deal records and backups.
    pub data_dir: PathBuf,
    /// `id` of the managed section.
    pub section_id: String,
    /// `id` of the element the section is inserted before.
    pub anchor_id: String,
    /// Copy the document aside before rewriting it.
    pub backup: bool,
    /// Attach glossary translations to deals.
    pub translate: bool,
    /// Section text.
    pub labels: SectionLabels,
}

impl Default for Settings {
    fn default() -> Self {
        // ~/Documents/dealwire, falling back to the home or current dir
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("dealwire");

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: None,
            request_timeout: 30,
            candidate_delay_ms: 2000,
            required_deals: REQUIRED_REAL_DEALS,
            max_candidates: 20,
            max_claim_hops: 1,
            description_limit: 300,
            trusted_domains: Vec::new(),
            document: PathBuf::from(DEFAULT_DOCUMENT),
            data_dir,
            section_id: "deals".to_string(),
            anchor_id: "benefits".to_string(),
            backup: true,
            translate: true,
            labels: SectionLabels::default(),
        }
    }
}

impl Settings {
    /// Directory document backups are written to.
    pub fn backups_dir(&self) -> PathBuf {
        self.data_dir.join(BACKUPS_SUBDIR)
    }

    /// Reject settings that would publish nothing.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.required_deals == 0 {
            anyhow::bail!("required_deals must be at least 1");
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            base_url: self.base_url.clone(),
            candidate_delay: Duration::from_millis(self.candidate_delay_ms),
            max_claim_hops: self.max_claim_hops,
            description_limit: self.description_limit,
            max_candidates: self.max_candidates,
            trusted_domains: self.trusted_domains.clone(),
        }
    }

    /// Apply `DEALWIRE_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    fn apply_env_from<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("DEALWIRE_BASE_URL") {
            tracing::debug!("Using DEALWIRE_BASE_URL from environment: {}", url);
            self.base_url = url;
        }
        if let Some(document) = get("DEALWIRE_DOCUMENT") {
            self.document = PathBuf::from(shellexpand::tilde(&document).as_ref());
        }
        match get("DEALWIRE_REQUIRED_DEALS").map(|v| v.trim().parse::<usize>()) {
            Some(Ok(n)) => self.required_deals = n,
            Some(Err(e)) => tracing::warn!("Ignoring invalid DEALWIRE_REQUIRED_DEALS: {}", e),
            None => {}
        }
        match get("DEALWIRE_DELAY_MS").map(|v| v.trim().parse::<u64>()) {
            Some(Ok(ms)) => self.candidate_delay_ms = ms,
            Some(Err(e)) => tracing::warn!("Ignoring invalid DEALWIRE_DELAY_MS: {}", e),
            None => {}
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Delay between candidates in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_deals: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_candidates: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_claim_hops: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trusted_domains: Vec<String>,
    /// Target document path (relative to the config file).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    /// Data directory path (relative to the config file).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<SectionLabels>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers dealwire config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("dealwire").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("{}", e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            // No config file found
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file {}: {}", path.display(), e))?;

        let mut config = Self::parse(&contents, path)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        match ext {
            "toml" => toml::from_str(contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e)),
            "yaml" | "yml" => serde_yaml::from_str(contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e)),
            _ => serde_json::from_str(contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e)),
        }
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref url) = self.base_url {
            settings.base_url = url.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(delay) = self.candidate_delay_ms {
            settings.candidate_delay_ms = delay;
        }
        if let Some(n) = self.required_deals {
            settings.required_deals = n;
        }
        if let Some(n) = self.max_candidates {
            settings.max_candidates = n;
        }
        if let Some(n) = self.max_claim_hops {
            settings.max_claim_hops = n;
        }
        if let Some(n) = self.description_limit {
            settings.description_limit = n;
        }
        settings
            .trusted_domains
            .extend(self.trusted_domains.iter().cloned());
        if let Some(ref document) = self.document {
            settings.document = self.resolve_path(document, base_dir);
        }
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref id) = self.section_id {
            settings.section_id = id.clone();
        }
        if let Some(ref id) = self.anchor_id {
            settings.anchor_id = id.clone();
        }
        if let Some(backup) = self.backup {
            settings.backup = backup;
        }
        if let Some(translate) = self.translate {
            settings.translate = translate;
        }
        if let Some(ref labels) = self.labels {
            settings.labels = labels.clone();
        }
    }
}

/// Load settings: defaults, then the config file, then environment.
/// `config_path` bypasses discovery. Returns (Settings, Config).
///
/// Callers that layer further overrides run [`Settings::validate`] last.
pub async fn load_settings(config_path: Option<&Path>) -> anyhow::Result<(Settings, Config)> {
    let config = match config_path {
        Some(path) => Config::load_from_path(path)
            .await
            .map_err(anyhow::Error::msg)?,
        None => Config::load().await,
    };

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);
    settings.apply_env();

    Ok((settings, config))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.required_deals, 6);
        assert_eq!(settings.candidate_delay_ms, 2000);
        assert_eq!(settings.max_claim_hops, 1);
        assert_eq!(settings.document, PathBuf::from("index.html"));
        assert!(settings.backup);
        assert!(settings.backups_dir().ends_with("dealwire/backups"));
    }

    #[test]
    fn test_parse_toml_and_resolve_paths() {
        let toml = r#"
            required_deals = 4
            candidate_delay_ms = 0
            document = "site/index.html"
            data_dir = "/var/lib/dealwire"
            trusted_domains = ["brand.example.com"]

            [labels]
            heading = "Today's deals"
        "#;
        let config = Config::parse(toml, Path::new("dealwire.toml")).unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, Path::new("/srv/site"));

        assert_eq!(settings.required_deals, 4);
        assert_eq!(settings.candidate_delay_ms, 0);
        assert_eq!(settings.document, PathBuf::from("/srv/site/site/index.html"));
        assert_eq!(settings.data_dir, PathBuf::from("/var/lib/dealwire"));
        assert_eq!(settings.trusted_domains, vec!["brand.example.com"]);
        assert_eq!(settings.labels.heading, "Today's deals");
        // Unset labels keep their defaults
        assert_eq!(settings.labels.badge, SectionLabels::default().badge);
    }

    #[test]
    fn test_parse_yaml_and_json() {
        let yaml = "base_url: https://deals.example.net\nbackup: false\n";
        let config = Config::parse(yaml, Path::new("dealwire.yaml")).unwrap();
        assert_eq!(config.base_url.as_deref(), Some("https://deals.example.net"));
        assert_eq!(config.backup, Some(false));

        let json = r#"{"translate": false, "max_candidates": 3}"#;
        let config = Config::parse(json, Path::new("dealwire.json")).unwrap();
        assert_eq!(config.translate, Some(false));
        assert_eq!(config.max_candidates, Some(3));

        assert!(Config::parse("{", Path::new("x.json")).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DEALWIRE_BASE_URL", "https://mirror.example.org"),
            ("DEALWIRE_REQUIRED_DEALS", "3"),
            ("DEALWIRE_DELAY_MS", "not-a-number"),
            ("DEALWIRE_DOCUMENT", ""),
        ]);
        let mut settings = Settings::default();
        settings.apply_env_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.base_url, "https://mirror.example.org");
        assert_eq!(settings.required_deals, 3);
        assert_eq!(settings.candidate_delay_ms, 2000);
        assert_eq!(settings.document, PathBuf::from("index.html"));
    }

    #[test]
    fn test_zero_required_deals_rejected() {
        let env: HashMap<&str, &str> = HashMap::from([("DEALWIRE_REQUIRED_DEALS", "0")]);
        let mut settings = Settings::default();
        assert!(settings.validate().is_ok());
        settings.apply_env_from(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(settings.required_deals, 0);
        assert!(settings.validate().is_err());

        let config = Config::parse("required_deals = 0", Path::new("dealwire.toml")).unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, Path::new("/srv/site"));
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_resolver_config_from_settings() {
        let mut settings = Settings::default();
        settings.candidate_delay_ms = 250;
        let rc = settings.resolver_config();
        assert_eq!(rc.candidate_delay, Duration::from_millis(250));
        assert_eq!(rc.max_candidates, 20);
    }
}
