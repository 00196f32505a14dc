use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::classify::{PolicyKind, PrefixRules};
use crate::cli::Args;
use crate::error::{Result, StreamError};
use crate::render::OutputFormat;

/// Settings from the optional TOML config file. Every key is optional;
/// command-line flags override whatever the file sets.
///
/// ```toml
/// base_url = "http://127.0.0.1:5000"
/// policy = "prefix"
/// idle_timeout_secs = 120
///
/// [prefixes]
/// narrator = "Narrator:"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub base_url: String,
    pub start_path: String,
    pub save_path: String,
    pub policy: PolicyKind,
    pub format: OutputFormat,
    pub idle_timeout_secs: Option<u64>,
    pub connect_timeout_secs: u64,
    pub log_filter: String,
    pub prefixes: PrefixRules,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            base_url: "http://127.0.0.1:5000".to_string(),
            start_path: "/start_game".to_string(),
            save_path: "/save_conversation".to_string(),
            policy: PolicyKind::Structured,
            format: OutputFormat::Terminal,
            idle_timeout_secs: None,
            connect_timeout_secs: 10,
            log_filter: "warn".to_string(),
            prefixes: PrefixRules::default(),
        }
    }
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| StreamError::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| StreamError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    /// Resolve the effective config: file (if given) under command-line flags.
    pub fn resolve(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_args(args);
        Ok(config)
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(url) = &args.url {
            self.base_url = url.clone();
        }
        if let Some(policy) = args.policy {
            self.policy = policy;
        }
        if let Some(format) = args.format {
            self.format = format;
        }
        if let Some(secs) = args.idle_timeout {
            self.idle_timeout_secs = Some(secs);
        }
        if let Some(filter) = &args.log {
            self.log_filter = filter.clone();
        }
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
