// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use mbx_app::DEFAULT_VIEWPORT_HEIGHT;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_VERSION: i64 = 1;
pub const CONFIG_PATH_ENV: &str = "MBX_CONFIG_PATH";

const APP_NAME: &str = "mbx";
const CONFIG_FILE_NAME: &str = "config.toml";
const LOG_FILE_NAME: &str = "mbx.log";
const DEFAULT_LOG_LEVEL: &str = "info";
const MAX_VIEWPORT_HEIGHT: usize = 200;
const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub default_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
    #[serde(default)]
    pub http: Http,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Profile {
    pub url: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Http {
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Ui {
    pub viewport_height: Option<usize>,
    pub check_updates: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            default_profile: None,
            profiles: BTreeMap::new(),
            http: Http::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

/// Values given on the command line (or through their env vars). They win over
/// whatever the selected profile says.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub url: Option<String>,
    pub token: Option<String>,
    pub profile: Option<String>,
}

/// Fully resolved server connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub url: String,
    pub token: String,
    pub profile: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV)
            && !path.is_empty()
        {
            return Ok(PathBuf::from(path));
        }

        let base = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} or pass --config")
        })?;
        Ok(base.join(APP_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw).with_context(|| {
            format!(
                "parse config file {} -- check the TOML syntax and compare with `mbx --print-example-config`",
                path.display()
            )
        })?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no integer `version`; add `version = {CONFIG_VERSION}` at the top",
                    path.display()
                )
            })?;
        if version != CONFIG_VERSION {
            bail!(
                "config file {} uses version {version}, but this mbx reads version {CONFIG_VERSION}; \
                 regenerate it with `mbx --print-example-config`",
                path.display()
            );
        }

        let config: Self = value.try_into().with_context(|| {
            format!(
                "decode config file {} -- check key names and value types",
                path.display()
            )
        })?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(name) = &self.default_profile
            && !self.profiles.contains_key(name)
        {
            bail!(
                "default_profile {name:?} in {} has no [profiles.{name}] table; available: {}",
                path.display(),
                self.available_profiles()
            );
        }

        for (name, profile) in &self.profiles {
            if let Some(url) = &profile.url
                && url.trim().is_empty()
            {
                bail!(
                    "[profiles.{name}] url in {} is empty; set it to the Metabase base URL",
                    path.display()
                );
            }
        }

        if let Some(timeout) = &self.http.timeout {
            parse_duration(timeout).with_context(|| {
                format!(
                    "[http] timeout in {} is invalid; use a value like \"30s\" or \"500ms\"",
                    path.display()
                )
            })?;
        }

        if let Some(height) = self.ui.viewport_height
            && !(1..=MAX_VIEWPORT_HEIGHT).contains(&height)
        {
            bail!(
                "[ui] viewport_height in {} must be between 1 and {MAX_VIEWPORT_HEIGHT}, got {height}",
                path.display()
            );
        }

        if let Some(level) = &self.log.level
            && !LOG_LEVELS.contains(&level.trim().to_ascii_lowercase().as_str())
        {
            bail!(
                "[log] level {level:?} in {} is not recognized; use one of {}",
                path.display(),
                LOG_LEVELS.join(", ")
            );
        }

        Ok(())
    }

    /// Picks the profile (flag, then `default_profile`, then the only profile
    /// when exactly one exists) and layers the overrides on top of it.
    pub fn resolve(&self, overrides: &Overrides) -> Result<Connection> {
        let profile_name = overrides
            .profile
            .clone()
            .or_else(|| self.default_profile.clone())
            .or_else(|| {
                (self.profiles.len() == 1)
                    .then(|| self.profiles.keys().next().cloned())
                    .flatten()
            });

        let profile = match &profile_name {
            Some(name) => Some(self.profiles.get(name).ok_or_else(|| {
                anyhow!(
                    "profile {name:?} not found; available: {}",
                    self.available_profiles()
                )
            })?),
            None => None,
        };

        let url = non_blank(overrides.url.as_deref())
            .or_else(|| profile.and_then(|profile| non_blank(profile.url.as_deref())));
        let token = non_blank(overrides.token.as_deref())
            .or_else(|| profile.and_then(|profile| non_blank(profile.token.as_deref())));

        match (url, token) {
            (Some(url), Some(token)) => Ok(Connection {
                url,
                token,
                profile: profile_name,
            }),
            (url, token) => bail!(
                "missing configuration: URL={}, Token={} -- pass --url/--token, set MBX_URL/MBX_TOKEN, \
                 or add them to a [profiles.<name>] table",
                presence_mark(url.is_some()),
                presence_mark(token.is_some())
            ),
        }
    }

    pub fn profile_names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    pub fn http_timeout(&self) -> Result<Option<Duration>> {
        self.http
            .timeout
            .as_deref()
            .map(parse_duration)
            .transpose()
    }

    pub fn viewport_height(&self) -> usize {
        self.ui.viewport_height.unwrap_or(DEFAULT_VIEWPORT_HEIGHT)
    }

    pub fn check_updates(&self) -> bool {
        self.ui.check_updates.unwrap_or(true)
    }

    pub fn log_level(&self) -> String {
        self.log
            .level
            .as_deref()
            .map(|level| level.trim().to_ascii_lowercase())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned())
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(file) = non_blank(self.log.file.as_deref()) {
            return Ok(PathBuf::from(file));
        }
        let base = dirs::data_local_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set [log] file in the config")
        })?;
        Ok(base.join(APP_NAME).join(LOG_FILE_NAME))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            r#"# mbx config
# Save this file as {}

version = {CONFIG_VERSION}

# Profile used when --profile is not given.
default_profile = "work"

[profiles.work]
url = "https://metabase.example.com"
# API key created under Admin settings > Authentication > API keys.
token = "mb_xxx"

[http]
# Request timeout, e.g. "30s" or "500ms". Unset waits as long as the server takes.
# timeout = "30s"

[ui]
viewport_height = {DEFAULT_VIEWPORT_HEIGHT}
check_updates = true

[log]
level = "{DEFAULT_LOG_LEVEL}"
# file = "/tmp/mbx.log"
"#,
            path.display()
        )
    }

    fn available_profiles(&self) -> String {
        if self.profiles.is_empty() {
            "(none)".to_owned()
        } else {
            self.profile_names().join(", ")
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

fn presence_mark(present: bool) -> &'static str {
    if present { "✓" } else { "✗" }
}

pub fn parse_duration(raw: &str) -> Result<Duration> {
    let trimmed = raw.trim();
    let (number, unit) = if let Some(value) = trimmed.strip_suffix("ms") {
        (value, "ms")
    } else if let Some(value) = trimmed.strip_suffix('s') {
        (value, "s")
    } else if let Some(value) = trimmed.strip_suffix('m') {
        (value, "m")
    } else {
        bail!("duration {raw:?} needs a unit suffix: ms, s, or m");
    };

    let amount: u64 = number
        .trim()
        .parse()
        .with_context(|| format!("duration {raw:?} is not a whole number"))?;
    if amount == 0 {
        bail!("duration {raw:?} must be greater than zero");
    }

    let duration = match unit {
        "ms" => Duration::from_millis(amount),
        "s" => Duration::from_secs(amount),
        _ => Duration::from_secs(amount.saturating_mul(60)),
    };
    Ok(duration)
}
