/*
 *  config.rs
 *
 *  LyMonS PhotoFeed - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layered configuration - defaults, YAML file, command line
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use clap::{ArgAction, Parser, ValueHint};
use dirs_next::{config_dir, home_dir};
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}, time::Duration};
use thiserror::Error;
use url::Url;

use crate::cache::DEFAULT_TTL;
use crate::display::SLIDE_DURATION;
use crate::fetch::DEFAULT_CORS_RELAY;
use crate::http::FetchPolicy;
use crate::photo::MAX_PHOTOS;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>, // e.g., "info" | "debug"
    /// where runtime setting changes are kept
    pub settings_file: Option<PathBuf>,
    pub photo_feed: Option<PhotoFeedConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PhotoFeedConfig {
    pub enable: Option<bool>,
    pub source_url: Option<String>,
    pub proxy_base: Option<String>, // same-origin backend, e.g. http://localhost:8080
    pub relay_base: Option<String>,
    pub timeout_secs: Option<u64>,
    pub retries: Option<u32>,
    pub slide_secs: Option<u64>,
    pub cache_ttl_hours: Option<u64>,
    pub max_photos: Option<usize>,
}

impl PhotoFeedConfig {
    pub fn fetch_policy(&self) -> FetchPolicy {
        let defaults = FetchPolicy::default();
        FetchPolicy {
            timeout: self.timeout_secs.map(Duration::from_secs).unwrap_or(defaults.timeout),
            retries: self.retries.unwrap_or(defaults.retries),
            retry_pause: defaults.retry_pause,
        }
    }

    pub fn slide_duration(&self) -> Duration {
        self.slide_secs.map(Duration::from_secs).unwrap_or(SLIDE_DURATION)
    }

    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl_hours
            .map(|h| Duration::from_secs(h * 60 * 60))
            .unwrap_or(DEFAULT_TTL)
    }

    pub fn max_photos(&self) -> usize {
        self.max_photos.unwrap_or(MAX_PHOTOS)
    }

    pub fn proxy_url(&self) -> Result<Option<Url>, ConfigError> {
        self.proxy_base
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_base("proxy_base", s))
            .transpose()
    }

    pub fn relay_url(&self) -> Result<Url, ConfigError> {
        parse_base("relay_base", self.relay_base.as_deref().unwrap_or(DEFAULT_CORS_RELAY))
    }
}

fn parse_base(field: &str, s: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(s.trim())
        .map_err(|e| ConfigError::Validation(format!("photo_feed.{field} '{s}': {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Validation(format!(
            "photo_feed.{field} must be http or https, got '{other}'"
        ))),
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "lymons-photofeed", version, about = "LyMonS Photo Feed slideshow")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(short = 'c', long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Enable debug log level
    #[arg(short = 'v', long, alias = "verbose", action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Photo feed directory listing or manifest URL
    #[arg(short = 'U', long, value_hint = ValueHint::Url)]
    pub url: Option<String>,
    /// Enable (true) or disable (false) the photo feed
    #[arg(short = 'e', long, action = ArgAction::Set)]
    pub enable: Option<bool>,
    /// Same-origin proxy base, requests go to <proxy>/photofeed?url=
    #[arg(long, value_hint = ValueHint::Url)]
    pub proxy: Option<String>,
    /// CORS relay base, requests go to <relay>/raw?url=
    #[arg(long, value_hint = ValueHint::Url)]
    pub relay: Option<String>,
    /// Seconds each photo stays on screen
    #[arg(long)]
    pub slide_secs: Option<u64>,
    /// Settings file for runtime changes
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub settings_file: Option<PathBuf>,
    /// fetch the photo list once, print it and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub list: bool,
    /// one pass through the slides then exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub once: bool,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: read YAML, merge CLI, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

impl Config {
    /// Explicit settings file, else ~/.config/lymons/photofeed-settings.yaml
    pub fn settings_path(&self) -> Option<PathBuf> {
        self.settings_file
            .clone()
            .or_else(|| config_dir().map(|d| d.join("lymons/photofeed-settings.yaml")))
    }
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    if let Some(home) = home_dir() {
        let p = home.join(".config/lymons/photofeed.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/lymons-photofeed.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["photofeed.yaml", "config/photofeed.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()      { dst.log_level = src.log_level; }
    if src.settings_file.is_some()  { dst.settings_file = src.settings_file; }
    match (&mut dst.photo_feed, src.photo_feed) {
        (None, Some(c)) => dst.photo_feed = Some(c),
        (Some(d), Some(s)) => merge_photo_feed(d, s),
        _ => {}
    }
}

fn merge_photo_feed(dst: &mut PhotoFeedConfig, src: PhotoFeedConfig) {
    if src.enable.is_some()          { dst.enable = src.enable; }
    if src.source_url.is_some()      { dst.source_url = src.source_url; }
    if src.proxy_base.is_some()      { dst.proxy_base = src.proxy_base; }
    if src.relay_base.is_some()      { dst.relay_base = src.relay_base; }
    if src.timeout_secs.is_some()    { dst.timeout_secs = src.timeout_secs; }
    if src.retries.is_some()         { dst.retries = src.retries; }
    if src.slide_secs.is_some()      { dst.slide_secs = src.slide_secs; }
    if src.cache_ttl_hours.is_some() { dst.cache_ttl_hours = src.cache_ttl_hours; }
    if src.max_photos.is_some()      { dst.max_photos = src.max_photos; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.debug                     { cfg.log_level = Some("debug".to_string()); }
    else if cli.log_level.is_some()  { cfg.log_level = cli.log_level.clone(); }
    if cli.settings_file.is_some()   { cfg.settings_file = cli.settings_file.clone(); }

    let any_feed = cli.url.is_some()
        || cli.enable.is_some()
        || cli.proxy.is_some()
        || cli.relay.is_some()
        || cli.slide_secs.is_some();

    if any_feed && cfg.photo_feed.is_none() {
        cfg.photo_feed = Some(PhotoFeedConfig::default());
    }
    if let Some(feed) = cfg.photo_feed.as_mut() {
        if cli.url.is_some()        { feed.source_url = cli.url.clone(); }
        if cli.enable.is_some()     { feed.enable = cli.enable; }
        if cli.proxy.is_some()      { feed.proxy_base = cli.proxy.clone(); }
        if cli.relay.is_some()      { feed.relay_base = cli.relay.clone(); }
        if cli.slide_secs.is_some() { feed.slide_secs = cli.slide_secs; }
    }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(feed) = cfg.photo_feed.as_ref() {
        if feed.timeout_secs == Some(0) {
            return Err(ConfigError::Validation("photo_feed.timeout_secs must be > 0".into()));
        }
        if feed.slide_secs == Some(0) {
            return Err(ConfigError::Validation("photo_feed.slide_secs must be > 0".into()));
        }
        if feed.cache_ttl_hours == Some(0) {
            return Err(ConfigError::Validation("photo_feed.cache_ttl_hours must be > 0".into()));
        }
        if let Some(n) = feed.max_photos {
            if n == 0 || n > MAX_PHOTOS {
                return Err(ConfigError::Validation(format!(
                    "photo_feed.max_photos must be 1..={MAX_PHOTOS}"
                )));
            }
        }
        feed.proxy_url()?;
        feed.relay_url()?;
    }
    Ok(())
}
