/*
 *  photo.rs
 *
 *  LyMonS PhotoFeed - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Photo entries and image link helpers
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

use percent_encoding::percent_decode_str;
use std::fmt;

/// Extensions we treat as displayable images (compared case-insensitively)
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Most photos shown in one rotation
pub const MAX_PHOTOS: usize = 10;

/// A single photo in the feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    name: String,
    url: String,
}

impl Photo {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Decoded file name, used as the slide caption
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute url of the image
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for Photo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.url)
    }
}

/// True when the link ends in one of the image extensions.
///
/// Only the tail of the raw link is inspected, so `a.jpg?w=200` does not match.
pub fn is_image_link(link: &str) -> bool {
    match link.rsplit_once('.') {
        Some((_, ext)) => IMAGE_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)),
        None => false,
    }
}

/// Percent-decoded final path segment of a link.
pub fn display_name(link: &str) -> String {
    let segment = link.rsplit('/').next().unwrap_or(link);
    percent_decode_str(segment).decode_utf8_lossy().into_owned()
}
