/*
 *  lib.rs
 *
 *  LyMonS PhotoFeed - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Photo feed slideshow: fetch a directory listing or manifest of photos,
 *  cache it for a day and cycle through up to ten of them.
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

pub mod cache;
pub mod config;
pub mod display;
pub mod error;
pub mod fetch;
pub mod http;
pub mod parse;
pub mod photo;
pub mod sequencer;
pub mod settings;

pub use cache::PhotoCache;
pub use display::{DisplayStatus, PhotoFeedDisplay, SequencedDisplay, SlideFill, Timing};
pub use error::FeedError;
pub use fetch::{PhotoFeedFetcher, PhotoSource, Transport, transport_chain};
pub use http::{FetchPolicy, HttpClient, TextSource};
pub use photo::{MAX_PHOTOS, Photo};
