/*
 *  main.rs
 *
 *  LyMonS PhotoFeed - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
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

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{debug, error, info, warn};

#[cfg(unix)] // Only compile this block on Unix-like systems
use tokio::signal::unix::{signal, SignalKind};

use lymons_photofeed::config::{self, Cli};
use lymons_photofeed::display::{photo_feed_settings, SETTING_ENABLE, SETTING_URL};
use lymons_photofeed::sequencer::{LogCanvas, Sequencer};
use lymons_photofeed::settings::{self, SettingValue};
use lymons_photofeed::{
    FeedError, HttpClient, PhotoCache, PhotoFeedDisplay, PhotoFeedFetcher, SequencedDisplay,
    transport_chain,
};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Waits for SIGINT, SIGTERM or SIGHUP, logging whichever arrives first.
#[cfg(unix)]
async fn signal_handler() {
    let (mut sigint, mut sigterm, mut sighup) = match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
        signal(SignalKind::hangup()),
    ) {
        (Ok(i), Ok(t), Ok(h)) => (i, t, h),
        _ => {
            warn!("Unix signal handlers unavailable, falling back to ctrl-c");
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigint.recv() => info!("SIGINT received. Initiating graceful shutdown."),
        _ = sigterm.recv() => info!("SIGTERM received. Initiating graceful shutdown."),
        _ = sighup.recv() => info!("SIGHUP received. Initiating graceful shutdown."),
    }
}

#[cfg(not(unix))]
async fn signal_handler() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Ctrl-C received. Initiating graceful shutdown.");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli).context("loading configuration")?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        println!("{}", serde_yaml::to_string(&cfg)?);
        return Ok(());
    }

    env_logger::Builder::from_env(Env::default().default_filter_or(cfg.log_level.as_deref().unwrap_or("info")))
        .format_timestamp_secs()
        .init();

    info!("This {} worth the Squeeze", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let feed = cfg.photo_feed.clone().unwrap_or_default();
    let client = HttpClient::new(feed.fetch_policy())?;
    debug!("HTTP policy {:?}", client.policy());
    let relay = feed.relay_url()?;
    let proxy = feed.proxy_url()?;
    let fetcher = PhotoFeedFetcher::new(client, transport_chain(proxy.as_ref(), &relay));
    let route: Vec<String> = fetcher.transports().iter().map(ToString::to_string).collect();
    info!("Photo feed transports: {}", route.join(", "));

    let mut display = PhotoFeedDisplay::new(fetcher, PhotoCache::new(feed.cache_ttl()))
        .with_max_photos(feed.max_photos())
        .with_slide_duration(feed.slide_duration());

    // stored values first, then whatever the config/CLI asks for on top
    let mut registry = photo_feed_settings();
    let settings_path = cfg.settings_path();
    if let Some(path) = settings_path.as_ref().filter(|p| p.exists()) {
        match settings::read_values(path) {
            Ok(values) => registry.load(values, &mut display),
            Err(e) => warn!("Could not read settings {}: {}", path.display(), e),
        }
    }
    registry.apply_all(&mut display);

    let mut changed = false;
    if let Some(enable) = feed.enable {
        changed |= registry.set(SETTING_ENABLE, SettingValue::Bool(enable), &mut display)?;
    }
    if let Some(url) = feed.source_url.as_ref() {
        changed |= registry.set(SETTING_URL, SettingValue::Text(url.clone()), &mut display)?;
    }
    if changed {
        if let Some(path) = settings_path.as_ref() {
            match settings::write_values(path, &registry.values()) {
                Ok(()) => info!("Settings saved to {}", path.display()),
                Err(e) => warn!("Could not save settings {}: {}", path.display(), e),
            }
        }
    }

    if cli.list {
        match display.preview().await {
            Err(FeedError::NoSourceUrl) => println!("no photo feed url configured"),
            Err(e) => return Err(e.into()),
            Ok(photos) => {
                if let Some(at) = display.cache().fetched_at() {
                    println!("# {} fetched {}", display.source_url(), at.format("%Y-%m-%d %H:%M:%S"));
                }
                if photos.is_empty() {
                    println!("no photos found at {}", display.source_url());
                }
                for photo in &photos {
                    println!("{}", photo);
                }
            }
        }
        return Ok(());
    }

    if !display.is_enabled() {
        info!("Photo feed is disabled, enable it with --enable true");
        return Ok(());
    }

    let mut sequencer = Sequencer::new(display, LogCanvas::default());
    if cli.once {
        let summary = sequencer.run_pass(false).await;
        info!("Showed {} of {} photos ({:?})", summary.drawn, summary.screens, summary.status);
        return Ok(());
    }

    sequencer.run(signal_handler()).await;
    if sequencer.canvas().drawn() == 0 {
        error!("No photos were shown from '{}'", sequencer.display().source_url());
    }
    Ok(())
}
