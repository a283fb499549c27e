/*
 *  cache.rs
 *
 *  LyMonS PhotoFeed - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Single slot, time boxed photo list cache
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

use chrono::{DateTime, Local};
use log::{debug, info};
use std::time::{Duration, Instant};
use url::Url;

use crate::fetch::PhotoSource;
use crate::photo::Photo;

/// One day
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
struct CachedList {
    source: String,
    photos: Vec<Photo>,
    fetched_at: Instant,
    fetched_local: DateTime<Local>,
}

/// Holds at most one photo list, for the source it was fetched from.
#[derive(Debug, Clone)]
pub struct PhotoCache {
    ttl: Duration,
    slot: Option<CachedList>,
}

impl Default for PhotoCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl PhotoCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, slot: None }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// A list for `source` exists and is younger than the ttl
    pub fn is_fresh(&self, source: &str) -> bool {
        self.slot
            .as_ref()
            .is_some_and(|c| c.source == source && c.fetched_at.elapsed() < self.ttl)
    }

    /// Cached photos regardless of age
    pub fn peek(&self) -> Option<&[Photo]> {
        self.slot.as_ref().map(|c| c.photos.as_slice())
    }

    pub fn age(&self) -> Option<Duration> {
        self.slot.as_ref().map(|c| c.fetched_at.elapsed())
    }

    pub fn fetched_at(&self) -> Option<DateTime<Local>> {
        self.slot.as_ref().map(|c| c.fetched_local)
    }

    pub fn invalidate(&mut self) {
        if self.slot.take().is_some() {
            debug!("Photo cache invalidated");
        }
    }

    /// Cached list when fresh, else a new fetch.
    ///
    /// Only a non-empty result replaces the slot, so a failed refresh leaves
    /// the previous list in place.
    pub async fn get<S: PhotoSource>(&mut self, source: &Url, force_refresh: bool, fetcher: &S) -> Vec<Photo> {
        if !force_refresh && self.is_fresh(source.as_str()) {
            if let Some(photos) = self.peek() {
                debug!("Photo cache hit for {} ({} photos)", source, photos.len());
                return photos.to_vec();
            }
        }

        let photos = fetcher.fetch_photo_list(source).await;
        if photos.is_empty() {
            info!("Photo feed {} returned no photos, cache left untouched", source);
        } else {
            info!("Photo feed {} cached {} photos", source, photos.len());
            self.slot = Some(CachedList {
                source: source.to_string(),
                photos: photos.clone(),
                fetched_at: Instant::now(),
                fetched_local: Local::now(),
            });
        }
        photos
    }
}
