/*
 *  error.rs
 *
 *  LyMonS PhotoFeed - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Photo feed error types
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

use thiserror::Error;

/// Failures that stop a photo list from being resolved at all.
///
/// Transport and parse problems are not errors here: they collapse to an
/// empty list and a no-data status.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("no photo feed url configured")]
    NoSourceUrl,

    #[error("invalid source url '{url}': {source}")]
    InvalidSourceUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported url scheme '{0}' (expected http or https)")]
    UnsupportedScheme(String),

    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),
}
