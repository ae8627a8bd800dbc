use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use common::types::Language;
use serde::Deserialize;

pub const DEFAULT_CONFIG_PATH: &str = "autotranslate.toml";
pub const LOCALE_PLACEHOLDER: &str = "$LOCALE";
pub const NAMESPACE_PLACEHOLDER: &str = "$NAMESPACE";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default = "Language::default_table")]
    pub languages: Vec<Language>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai: OpenAiConfig::default(),
            catalog: CatalogConfig::default(),
            languages: Language::default_table(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenAiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Replaces the built-in translator prompt; `{target_name}` and `{target_code}` are substituted.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            model: default_model(),
            temperature: 0.0,
            timeout_secs: default_timeout(),
            system_prompt: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_path_pattern")]
    pub path_pattern: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_marker")]
    pub marker: String,
    #[serde(default = "default_ai_tag")]
    pub ai_tag: String,
    #[serde(default = "default_backup_suffix")]
    pub backup_suffix: String,
    #[serde(default = "default_indent")]
    pub indent: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path_pattern: default_path_pattern(),
            namespace: default_namespace(),
            marker: default_marker(),
            ai_tag: default_ai_tag(),
            backup_suffix: default_backup_suffix(),
            indent: default_indent(),
        }
    }
}

fn default_base_url() -> String { "https://api.openai.com/v1".into() }
fn default_model() -> String { "gpt-3.5-turbo".into() }
fn default_timeout() -> u64 { 60 }
fn default_path_pattern() -> String { "src/locales/$LOCALE/$NAMESPACE.json".into() }
fn default_namespace() -> String { "translation".into() }
fn default_marker() -> String { "__STRING_NOT_TRANSLATED__".into() }
fn default_ai_tag() -> String { "\u{104D9}".into() }
fn default_backup_suffix() -> String { "_untranslated".into() }
fn default_indent() -> usize { 4 }

/// Load the config from `CONFIG_PATH` or `autotranslate.toml`.
/// A missing file at the implicit location yields the built-in defaults.
pub fn load_default() -> Result<AppConfig> {
    match std::env::var("CONFIG_PATH") {
        Ok(path) => load_from_file(&path),
        Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => load_from_file(DEFAULT_CONFIG_PATH),
        Err(_) => Ok(AppConfig::default()),
    }
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).with_context(|| format!("cannot read config {path}"))?;
    parse(&content).with_context(|| format!("invalid config {path}"))
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load (explicit path first), apply environment overrides, validate.
    /// Dry runs never reach the API, so they may skip the key check.
    pub fn load_and_validate(explicit: Option<&str>, require_api_key: bool) -> Result<Self> {
        let mut cfg = match explicit {
            Some(path) => load_from_file(path)?,
            None => load_default()?,
        };
        cfg.normalize_and_validate(require_api_key)?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self, require_api_key: bool) -> Result<()> {
        self.openai.normalize_from_env(|k| std::env::var(k).ok());
        if require_api_key {
            self.openai.validate_credentials()?;
        }
        self.openai.validate()?;
        self.catalog.validate()?;
        self.validate_languages()?;
        Ok(())
    }

    /// Non-source languages, optionally restricted to the given codes.
    pub fn target_languages<'a>(&'a self, only: &'a [String]) -> impl Iterator<Item = &'a Language> + 'a {
        self.languages
            .iter()
            .filter(|l| !l.source)
            .filter(move |l| only.is_empty() || only.iter().any(|c| c.eq_ignore_ascii_case(&l.code)))
    }

    /// Requested codes that match no non-source language.
    pub fn unknown_target_codes<'a>(&self, only: &'a [String]) -> Vec<&'a str> {
        only.iter()
            .filter(|c| !self.languages.iter().any(|l| !l.source && l.code.eq_ignore_ascii_case(c.as_str())))
            .map(String::as_str)
            .collect()
    }

    fn validate_languages(&self) -> Result<()> {
        let sources = self.languages.iter().filter(|l| l.source).count();
        if sources != 1 {
            return Err(anyhow!("exactly one language must be marked source = true (found {sources})"));
        }
        let mut seen = HashSet::new();
        for lang in &self.languages {
            if lang.code.trim().is_empty() || lang.name.trim().is_empty() {
                return Err(anyhow!("languages need a non-empty name and code"));
            }
            if !seen.insert(lang.code.to_lowercase()) {
                return Err(anyhow!("duplicate language code {}", lang.code));
            }
        }
        Ok(())
    }
}

impl OpenAiConfig {
    /// Fill secrets and overrides from the environment.
    /// `OPENAI_API_KEY` always wins over the file, keys do not belong in config.
    pub fn normalize_from_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY").filter(|v| !v.trim().is_empty()) {
            self.api_key = key;
        }
        if let Some(url) = lookup("OPENAI_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(model) = lookup("OPENAI_MODEL").filter(|v| !v.trim().is_empty()) {
            self.model = model;
        }
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
    }

    pub fn validate_credentials(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(anyhow!("openai api key is empty; set OPENAI_API_KEY in the environment or .env"));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let lower = self.base_url.to_lowercase();
        if !(lower.starts_with("https://") || lower.starts_with("http://")) {
            return Err(anyhow!("openai.base_url must start with http:// or https://"));
        }
        if self.model.trim().is_empty() {
            return Err(anyhow!("openai.model is empty"));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(anyhow!("openai.temperature must be within 0.0..=2.0"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("openai.timeout_secs must be a positive number of seconds"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CatalogConfig {
    pub fn validate(&self) -> Result<()> {
        if self.marker.is_empty() {
            return Err(anyhow!("catalog.marker is empty"));
        }
        if !self.path_pattern.contains(LOCALE_PLACEHOLDER) {
            return Err(anyhow!("catalog.path_pattern must contain {LOCALE_PLACEHOLDER}"));
        }
        if self.backup_suffix.is_empty() {
            return Err(anyhow!("catalog.backup_suffix is empty; the backup would overwrite the catalog"));
        }
        Ok(())
    }

    /// Catalog path for a locale code.
    pub fn path_for(&self, code: &str) -> PathBuf {
        PathBuf::from(
            self.path_pattern
                .replace(LOCALE_PLACEHOLDER, code)
                .replace(NAMESPACE_PLACEHOLDER, &self.namespace),
        )
    }

    /// Directory holding the per-locale folders: the pattern up to `$LOCALE`.
    pub fn locales_root(&self) -> PathBuf {
        let prefix = self.path_pattern.split(LOCALE_PLACEHOLDER).next().unwrap_or_default();
        let root = prefix.trim_end_matches(['/', '\\']);
        if root.is_empty() { PathBuf::from(".") } else { PathBuf::from(root) }
    }
}
