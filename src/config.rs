//! Assistant Configuration
//!
//! Every setting is optional. Values come from the caller (serde, camelCase),
//! or from `FORMASSIST_*` environment variables with a `.env.local` fallback.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::time::Duration;

use crate::error::{AssistError, AssistResult};
use crate::providers::{ProviderDescriptor, ProviderKind};

pub const DEFAULT_API_URL: &str = "http://localhost:3001";
pub const DEFAULT_DEBOUNCE_MS: u64 = 800;
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

const ENV_FILE: &str = ".env.local";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssistConfig {
    /// Master switch; when off every operation short-circuits
    pub enabled: bool,
    /// Base URL of the custom suggestion server
    pub api_url: String,
    /// Quiet period after a blur before a suggestion is requested
    pub debounce_ms: u64,
    /// Fields never sent to any provider
    pub excluded_fields: BTreeSet<String>,
    /// Probe local model availability when a session starts
    pub auto_check_availability: bool,
    pub providers: Vec<ProviderDescriptor>,
    /// When non-empty, used verbatim instead of priorities
    pub execution_order: Vec<ProviderKind>,
    /// Autofill leaves fields that already hold a value untouched
    pub skip_non_empty: bool,
    /// Write `sample_<field>` fallbacks into the form when every provider fails
    pub write_placeholders: bool,
    /// Per-attempt timeout for every provider
    pub request_timeout_ms: u64,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: DEFAULT_API_URL.to_string(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            excluded_fields: BTreeSet::new(),
            auto_check_availability: true,
            providers: default_providers(),
            execution_order: Vec::new(),
            skip_non_empty: false,
            write_placeholders: true,
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

/// Local model first, custom server as fallback
pub fn default_providers() -> Vec<ProviderDescriptor> {
    vec![
        ProviderDescriptor::new(ProviderKind::LocalModel, 10),
        ProviderDescriptor::new(ProviderKind::CustomServer, 5),
    ]
}

impl AssistConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn is_excluded(&self, field: &str) -> bool {
        self.excluded_fields.contains(field)
    }

    /// Load from the process environment, falling back to `.env.local`
    pub fn from_env() -> AssistResult<Self> {
        let file_vars = std::env::current_dir()
            .map(|dir| read_env_file(&dir.join(ENV_FILE)))
            .unwrap_or_default();

        if !file_vars.is_empty() {
            tracing::info!(count = file_vars.len(), "Loaded settings from {}", ENV_FILE);
        }

        Self::from_lookup(|key| std::env::var(key).ok().or_else(|| file_vars.get(key).cloned()))
    }

    /// Build from any key lookup; unset keys keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AssistResult<Self> {
        let mut config = Self::default();

        if let Some(v) = lookup("FORMASSIST_ENABLED") {
            config.enabled = parse_bool("FORMASSIST_ENABLED", &v)?;
        }
        if let Some(v) = lookup("FORMASSIST_API_URL") {
            let v = v.trim();
            if !v.is_empty() {
                config.api_url = v.to_string();
            }
        }
        if let Some(v) = lookup("FORMASSIST_DEBOUNCE_MS") {
            config.debounce_ms = parse_u64("FORMASSIST_DEBOUNCE_MS", &v)?;
        }
        if let Some(v) = lookup("FORMASSIST_EXCLUDED_FIELDS") {
            config.excluded_fields = split_list(&v).collect();
        }
        if let Some(v) = lookup("FORMASSIST_AUTO_CHECK") {
            config.auto_check_availability = parse_bool("FORMASSIST_AUTO_CHECK", &v)?;
        }
        if let Some(v) = lookup("FORMASSIST_SKIP_NON_EMPTY") {
            config.skip_non_empty = parse_bool("FORMASSIST_SKIP_NON_EMPTY", &v)?;
        }
        if let Some(v) = lookup("FORMASSIST_WRITE_PLACEHOLDERS") {
            config.write_placeholders = parse_bool("FORMASSIST_WRITE_PLACEHOLDERS", &v)?;
        }
        if let Some(v) = lookup("FORMASSIST_TIMEOUT_MS") {
            config.request_timeout_ms = parse_u64("FORMASSIST_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = lookup("FORMASSIST_EXECUTION_ORDER") {
            config.execution_order = split_list(&v)
                .map(|name| {
                    ProviderKind::parse(&name).ok_or_else(|| {
                        AssistError::Config(format!("Unknown provider in execution order: {}", name))
                    })
                })
                .collect::<AssistResult<Vec<_>>>()?;
        }

        if let Some(key) = lookup("FORMASSIST_OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            let mut descriptor = ProviderDescriptor::new(ProviderKind::OpenAi, 1).with_api_key(key.trim());
            if let Some(model) = lookup("FORMASSIST_OPENAI_MODEL") {
                descriptor = descriptor.with_model(model.trim());
            }
            if let Some(url) = lookup("FORMASSIST_OPENAI_BASE_URL") {
                descriptor = descriptor.with_base_url(url.trim());
            }
            config.providers.push(descriptor);
        }

        Ok(config)
    }
}

/// Read `KEY=value` lines; missing or unreadable files yield nothing
pub fn read_env_file(path: &Path) -> HashMap<String, String> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return HashMap::new();
    };

    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(k, v)| {
            let v = v.trim().trim_matches('"');
            (k.trim().to_string(), v.to_string())
        })
        .collect()
}

fn split_list(value: &str) -> impl Iterator<Item = String> + '_ {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn parse_bool(key: &str, value: &str) -> AssistResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(AssistError::Config(format!("{} expects a boolean, got '{}'", key, other))),
    }
}

fn parse_u64(key: &str, value: &str) -> AssistResult<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| AssistError::Config(format!("{} expects an integer, got '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AssistConfig::default();
        assert!(config.enabled);
        assert_eq!(config.api_url, "http://localhost:3001");
        assert_eq!(config.debounce(), Duration::from_millis(800));
        assert!(config.excluded_fields.is_empty());
        assert!(config.auto_check_availability);
        assert!(!config.skip_non_empty);
        assert!(config.write_placeholders);
        assert_eq!(config.providers, default_providers());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: AssistConfig =
            serde_json::from_str(r#"{"debounceMs": 250, "excludedFields": ["password"]}"#).unwrap();
        assert_eq!(config.debounce_ms, 250);
        assert!(config.is_excluded("password"));
        assert!(config.enabled);
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_from_lookup() {
        let config = AssistConfig::from_lookup(lookup_from(&[
            ("FORMASSIST_ENABLED", "false"),
            ("FORMASSIST_API_URL", "http://suggest.internal"),
            ("FORMASSIST_DEBOUNCE_MS", "300"),
            ("FORMASSIST_EXCLUDED_FIELDS", "password, ssn ,"),
            ("FORMASSIST_EXECUTION_ORDER", "custom-server,local"),
            ("FORMASSIST_OPENAI_API_KEY", "sk-1"),
            ("FORMASSIST_OPENAI_MODEL", "small"),
        ]))
        .unwrap();

        assert!(!config.enabled);
        assert_eq!(config.api_url, "http://suggest.internal");
        assert_eq!(config.debounce_ms, 300);
        assert_eq!(config.excluded_fields.len(), 2);
        assert!(config.is_excluded("ssn"));
        assert_eq!(
            config.execution_order,
            vec![ProviderKind::CustomServer, ProviderKind::LocalModel]
        );
        let openai = config.providers.iter().find(|p| p.kind == ProviderKind::OpenAi).unwrap();
        assert_eq!(openai.api_key.as_deref(), Some("sk-1"));
        assert_eq!(openai.model.as_deref(), Some("small"));
    }

    #[test]
    fn test_bad_values_are_config_errors() {
        let err = AssistConfig::from_lookup(lookup_from(&[("FORMASSIST_DEBOUNCE_MS", "soon")])).unwrap_err();
        assert!(matches!(err, AssistError::Config(_)));

        let err = AssistConfig::from_lookup(lookup_from(&[("FORMASSIST_EXECUTION_ORDER", "gemini")])).unwrap_err();
        assert!(err.to_string().contains("gemini"));
    }

    #[test]
    fn test_read_env_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env.local");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "# local overrides").unwrap();
        writeln!(file, "FORMASSIST_API_URL=\"http://127.0.0.1:9000\"").unwrap();
        writeln!(file, "FORMASSIST_AUTO_CHECK = off").unwrap();

        let vars = read_env_file(&path);
        assert_eq!(vars.len(), 2);

        let config = AssistConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:9000");
        assert!(!config.auto_check_availability);
    }

    #[test]
    fn test_missing_env_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_env_file(&dir.path().join("nope")).is_empty());
    }
}
