// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use roster_app::{DEFAULT_LOAD_TIMEOUT, DEFAULT_PAGE_SIZE, ListOptions, PagingMode};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};
use tracing_subscriber::EnvFilter;

const CURRENT_VERSION: i64 = 1;
const DEFAULT_LOG_FILTER: &str = "warn";

/// File layout as written by the user. Every value is optional so a partial
/// file falls back to defaults key by key.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    version: Option<i64>,
    #[serde(default)]
    storage: FileStorage,
    #[serde(default)]
    list: FileList,
    #[serde(default)]
    log: FileLog,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileStorage {
    db_path: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileList {
    mode: Option<String>,
    page_size: Option<i64>,
    load_timeout: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileLog {
    level: Option<String>,
}

/// Resolved settings. Construction validates everything, so accessors are
/// infallible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    db_path: Option<PathBuf>,
    list: ListOptions,
    log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            list: ListOptions::default(),
            log_level: DEFAULT_LOG_FILTER.to_owned(),
        }
    }
}

impl Config {
    /// `ROSTER_CONFIG_PATH`, else `<config dir>/roster/config.toml`.
    pub fn default_path() -> Result<PathBuf> {
        if let Some(explicit) = env::var_os("ROSTER_CONFIG_PATH") {
            return Ok(PathBuf::from(explicit));
        }
        let base = dirs::config_dir().ok_or_else(|| {
            anyhow!("no platform config directory; point ROSTER_CONFIG_PATH at a config file")
        })?;
        let dir = base.join(roster_db::APP_NAME);
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(dir.join("config.toml"))
    }

    /// Reads `path`; a missing file means all defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(error) => {
                return Err(error).with_context(|| format!("read {}", path.display()));
            }
        };
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }

    fn parse(text: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(text).context("invalid TOML")?;
        match file.version {
            Some(CURRENT_VERSION) => {}
            Some(other) => {
                bail!("config version {other} is not supported; this build reads version 1")
            }
            None => bail!(
                "missing `version = 1` at the top of the file \
                 (settings live under [storage], [list] and [log])"
            ),
        }

        let db_path = match file.storage.db_path {
            Some(raw) => {
                roster_db::validate_db_path(&raw)?;
                Some(PathBuf::from(raw))
            }
            None => None,
        };

        let defaults = ListOptions::default();
        let mode = match file.list.mode.as_deref() {
            Some(raw) => PagingMode::parse(raw).ok_or_else(|| {
                anyhow!("list.mode must be \"client\" or \"server\", not {raw:?}")
            })?,
            None => defaults.mode,
        };
        let page_size = match file.list.page_size {
            Some(size) => usize::try_from(size)
                .ok()
                .filter(|size| *size > 0)
                .ok_or_else(|| anyhow!("list.page_size must be at least 1, not {size}"))?,
            None => defaults.page_size,
        };
        let load_timeout = match file.list.load_timeout.as_deref() {
            Some(raw) => {
                let timeout = parse_duration(raw).context("list.load_timeout")?;
                if timeout.is_zero() {
                    bail!("list.load_timeout must be longer than zero");
                }
                timeout
            }
            None => defaults.load_timeout,
        };

        let log_level = file
            .log
            .level
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned());
        EnvFilter::try_new(&log_level)
            .with_context(|| format!("log.level {log_level:?} is not a tracing filter"))?;

        Ok(Self {
            db_path,
            list: ListOptions {
                mode,
                page_size,
                load_timeout,
            },
            log_level,
        })
    }

    /// Configured path, else `ROSTER_DB_PATH`, else the platform data dir.
    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.db_path {
            Some(path) => Ok(path.clone()),
            None => roster_db::default_db_path(),
        }
    }

    pub fn list_options(&self) -> ListOptions {
        self.list.clone()
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            r##"# roster configuration ({path})
version = 1

[storage]
# Defaults to <data dir>/roster/roster.db; ROSTER_DB_PATH also works.
# db_path = "/srv/roster/roster.db"

[list]
# "client": fetch every record once, search/sort/page in memory.
# "server": ask the store for one page per request.
mode = "{mode}"
page_size = {page_size}
# Units: ms, s or m.
load_timeout = "{timeout}s"

[log]
# Any tracing filter, e.g. "roster_app=debug". RUST_LOG takes precedence.
level = "{level}"
"##,
            path = path.display(),
            mode = PagingMode::Client.as_str(),
            page_size = DEFAULT_PAGE_SIZE,
            timeout = DEFAULT_LOAD_TIMEOUT.as_secs(),
            level = DEFAULT_LOG_FILTER,
        )
    }
}

/// `<digits><unit>` with unit `ms`, `s` or `m`.
fn parse_duration(raw: &str) -> Result<Duration> {
    let trimmed = raw.trim();
    let split = trimmed
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);
    let amount: u64 = digits
        .parse()
        .map_err(|_| anyhow!("{raw:?} does not start with a whole number"))?;
    match unit {
        "ms" => Ok(Duration::from_millis(amount)),
        "s" => Ok(Duration::from_secs(amount)),
        "m" => amount
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| anyhow!("{raw:?} is too long")),
        "" => bail!("{raw:?} needs a unit (ms, s or m)"),
        other => bail!("unknown duration unit {other:?} in {raw:?}; use ms, s or m"),
    }
}
