/*
 *  display.rs
 *
 *  LyMonS PhotoFeed - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Photo feed slideshow display and the sequenced display contract
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

use log::{debug, error, info};
use std::future::Future;
use std::time::Duration;
use url::Url;

use crate::cache::PhotoCache;
use crate::error::FeedError;
use crate::fetch::PhotoSource;
use crate::photo::{MAX_PHOTOS, Photo};
use crate::settings::{Setting, SettingValue, SettingsRegistry};

/// Navigation slot the photo feed occupies in the display sequence
pub const PHOTO_FEED_NAV_ID: u8 = 12;

/// Seven seconds per photo
pub const SLIDE_DURATION: Duration = Duration::from_millis(7000);

pub const SETTING_ENABLE: &str = "photoFeedEnable";
pub const SETTING_URL: &str = "photoFeedUrl";

/// Status reported to the host sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayStatus {
    Disabled,
    Loading,
    Loaded,
    NoData,
    Failed,
}

/// Screen timing owned by the display, paced by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timing {
    pub total_screens: usize,
    /// multiplier applied to `base_delay`
    pub delay: u32,
    pub base_delay: Duration,
}

impl Timing {
    pub fn screen_duration(&self) -> Duration {
        self.base_delay * self.delay
    }
}

/// What the host needs from a display: data refresh and per-screen render
pub trait SequencedDisplay {
    type Frame;

    fn name(&self) -> &str;
    fn is_enabled(&self) -> bool;
    fn status(&self) -> DisplayStatus;
    fn timing(&self) -> &Timing;

    /// Refresh data; `refresh` bypasses any cache.
    fn fetch_data(&mut self, refresh: bool) -> impl Future<Output = ()>;

    /// Frame for screen `index`, `None` finishes the tick without drawing.
    fn render(&mut self, index: usize) -> Option<Self::Frame>;
}

/// Image slot of the `photo` template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSlot {
    pub src: String,
}

/// Template fill for one slide
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideFill {
    pub template: &'static str,
    pub photo: ImageSlot,
    pub caption: String,
}

impl SlideFill {
    pub fn for_photo(photo: &Photo) -> Self {
        Self {
            template: "photo",
            photo: ImageSlot { src: photo.url().to_string() },
            caption: photo.name().to_string(),
        }
    }
}

/// Cycles through the photos of one configured feed
pub struct PhotoFeedDisplay<S> {
    nav_id: u8,
    name: &'static str,
    enabled: bool,
    source_url: String,
    max_photos: usize,
    fetcher: S,
    cache: PhotoCache,
    photos: Vec<Photo>,
    timing: Timing,
    screen_index: usize,
    status: DisplayStatus,
}

impl<S: PhotoSource> PhotoFeedDisplay<S> {
    pub fn new(fetcher: S, cache: PhotoCache) -> Self {
        Self {
            nav_id: PHOTO_FEED_NAV_ID,
            name: "Photo Feed",
            enabled: false,
            source_url: String::new(),
            max_photos: MAX_PHOTOS,
            fetcher,
            cache,
            photos: Vec::new(),
            timing: Timing {
                total_screens: 0,
                delay: 1,
                base_delay: SLIDE_DURATION,
            },
            screen_index: 0,
            status: DisplayStatus::Disabled,
        }
    }

    /// Never more than [`MAX_PHOTOS`]
    pub fn with_max_photos(mut self, max_photos: usize) -> Self {
        self.max_photos = max_photos.clamp(1, MAX_PHOTOS);
        self
    }

    pub fn with_slide_duration(mut self, duration: Duration) -> Self {
        self.timing.base_delay = duration;
        self
    }

    pub fn nav_id(&self) -> u8 {
        self.nav_id
    }

    pub fn fetcher(&self) -> &S {
        &self.fetcher
    }

    pub fn cache(&self) -> &PhotoCache {
        &self.cache
    }

    pub fn photos(&self) -> &[Photo] {
        &self.photos
    }

    pub fn screen_index(&self) -> usize {
        self.screen_index
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled == enabled {
            return;
        }
        self.enabled = enabled;
        self.status = if enabled { DisplayStatus::Loading } else { DisplayStatus::Disabled };
        info!("{} {}", self.name, if enabled { "enabled" } else { "disabled" });
    }

    /// Returns true when the url actually changed; the cache is dropped then.
    pub fn set_source_url(&mut self, url: &str) -> bool {
        let url = url.trim();
        if self.source_url == url {
            return false;
        }
        self.source_url = url.to_string();
        self.cache.invalidate();
        info!("{} source set to '{}'", self.name, self.source_url);
        true
    }

    /// Photos for the current source, through the cache, leaving the slides
    /// alone. Works whether or not the display is enabled.
    pub async fn preview(&mut self) -> Result<Vec<Photo>, FeedError> {
        let source = self.source()?;
        let mut photos = self.cache.get(&source, false, &self.fetcher).await;
        photos.truncate(self.max_photos);
        Ok(photos)
    }

    fn source(&self) -> Result<Url, FeedError> {
        if self.source_url.is_empty() {
            return Err(FeedError::NoSourceUrl);
        }
        let url = Url::parse(&self.source_url).map_err(|source| FeedError::InvalidSourceUrl {
            url: self.source_url.clone(),
            source,
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(FeedError::UnsupportedScheme(other.to_string())),
        }
    }

    async fn resolve(&mut self, refresh: bool) -> Result<(), FeedError> {
        let source = self.source()?;
        let mut photos = self.cache.get(&source, refresh, &self.fetcher).await;

        if photos.is_empty() {
            self.clear_slides();
            self.status = DisplayStatus::NoData;
            return Ok(());
        }

        if let (Some(at), Some(age)) = (self.cache.fetched_at(), self.cache.age()) {
            debug!("{} list fetched {} ({}s ago)", self.name, at.format("%H:%M:%S"), age.as_secs());
        }

        photos.truncate(self.max_photos);
        self.timing.total_screens = photos.len();
        self.photos = photos;
        self.screen_index = 0;
        self.status = DisplayStatus::Loaded;
        info!("{} loaded {} photos", self.name, self.photos.len());
        Ok(())
    }

    fn clear_slides(&mut self) {
        self.photos.clear();
        self.timing.total_screens = 0;
        self.screen_index = 0;
    }
}

impl<S: PhotoSource> SequencedDisplay for PhotoFeedDisplay<S> {
    type Frame = SlideFill;

    fn name(&self) -> &str {
        self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn status(&self) -> DisplayStatus {
        self.status
    }

    fn timing(&self) -> &Timing {
        &self.timing
    }

    async fn fetch_data(&mut self, refresh: bool) {
        if !self.enabled {
            debug!("{} disabled, skipping data refresh", self.name);
            return;
        }
        if self.source_url.is_empty() {
            self.clear_slides();
            self.status = DisplayStatus::NoData;
            return;
        }

        self.status = DisplayStatus::Loading;
        if let Err(e) = self.resolve(refresh).await {
            error!("Photo feed error: {}", e);
            self.clear_slides();
            if self.enabled {
                self.status = DisplayStatus::Failed;
            }
        }
    }

    fn render(&mut self, index: usize) -> Option<SlideFill> {
        self.screen_index = index;
        let fill = self.photos.get(index).map(SlideFill::for_photo);
        if fill.is_none() {
            debug!("{} has no photo at screen {}", self.name, index);
        }
        fill
    }
}

fn change_enable<S: PhotoSource>(display: &mut PhotoFeedDisplay<S>, value: &SettingValue) {
    if let SettingValue::Bool(enabled) = value {
        display.set_enabled(*enabled);
    }
}

fn change_url<S: PhotoSource>(display: &mut PhotoFeedDisplay<S>, value: &SettingValue) {
    if let SettingValue::Text(url) = value {
        display.set_source_url(url);
    }
}

/// The two user settings of the photo feed, wired to `display`.
pub fn photo_feed_settings<S: PhotoSource>() -> SettingsRegistry<PhotoFeedDisplay<S>> {
    let mut registry = SettingsRegistry::new();
    registry.register(
        Setting::checkbox(SETTING_ENABLE, "Enable Photo Feed", false).on_change(change_enable::<S>),
    );
    registry.register(
        Setting::text(SETTING_URL, "Photo Feed URL", "")
            .placeholder("Directory listing URL")
            .visible_when(SETTING_ENABLE)
            .on_change(change_url::<S>),
    );
    registry
}
