/*
 *  fetch.rs
 *
 *  LyMonS PhotoFeed - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Photo list fetcher - ordered transport strategies with fallback
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

use log::{debug, info, warn};
use std::fmt;
use std::future::Future;
use url::Url;

use crate::http::TextSource;
use crate::parse::parse_photo_list;
use crate::photo::Photo;

/// Public CORS relay used when nothing closer answers
pub const DEFAULT_CORS_RELAY: &str = "https://api.allorigins.win";

/// Path of the same-origin proxy endpoint under its base
pub const PROXY_ENDPOINT: &str = "photofeed";

/// Path of the relay endpoint under its base
pub const RELAY_ENDPOINT: &str = "raw";

/// One way of getting the source body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transport {
    /// `<base>/photofeed?url=<source>` on our own backend
    LocalProxy(Url),
    /// the source url itself
    Direct,
    /// `<base>/raw?url=<source>` on a public relay
    CorsRelay(Url),
}

impl Transport {
    /// Url to GET for `source`, `None` when the base cannot carry a path.
    pub fn request_url(&self, source: &Url) -> Option<Url> {
        match self {
            Transport::Direct => Some(source.clone()),
            Transport::LocalProxy(base) => endpoint_url(base, PROXY_ENDPOINT, source),
            Transport::CorsRelay(base) => endpoint_url(base, RELAY_ENDPOINT, source),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::LocalProxy(base) => write!(f, "local proxy {}", base),
            Transport::Direct => write!(f, "direct"),
            Transport::CorsRelay(base) => write!(f, "CORS relay {}", base),
        }
    }
}

fn endpoint_url(base: &Url, endpoint: &str, source: &Url) -> Option<Url> {
    let mut url = base.clone();
    url.path_segments_mut().ok()?.pop_if_empty().push(endpoint);
    url.query_pairs_mut().clear().append_pair("url", source.as_str());
    Some(url)
}

/// Primary transport (proxy when we have one, else direct) then the relay.
pub fn transport_chain(proxy_base: Option<&Url>, relay_base: &Url) -> Vec<Transport> {
    let primary = match proxy_base {
        Some(base) => Transport::LocalProxy(base.clone()),
        None => Transport::Direct,
    };
    vec![primary, Transport::CorsRelay(relay_base.clone())]
}

/// Source of photo lists for a given feed url.
///
/// Implementations never fail: anything that goes wrong is an empty list.
pub trait PhotoSource {
    fn fetch_photo_list(&self, source: &Url) -> impl Future<Output = Vec<Photo>>;
}

/// Walks the transports in order and parses the first body it gets
#[derive(Debug, Clone)]
pub struct PhotoFeedFetcher<T> {
    client: T,
    transports: Vec<Transport>,
}

impl<T: TextSource> PhotoFeedFetcher<T> {
    pub fn new(client: T, transports: Vec<Transport>) -> Self {
        Self { client, transports }
    }

    pub fn client(&self) -> &T {
        &self.client
    }

    pub fn transports(&self) -> &[Transport] {
        &self.transports
    }

    async fn fetch_body(&self, source: &Url) -> Option<String> {
        for transport in &self.transports {
            let Some(request) = transport.request_url(source) else {
                warn!("Photo feed: {} cannot build a request for {}", transport, source);
                continue;
            };
            debug!("Photo feed: trying {} -> {}", transport, request);
            if let Some(body) = self.client.get_text(&request).await {
                debug!("Photo feed: {} returned {} bytes", transport, body.len());
                return Some(body);
            }
            info!("Photo feed: no body via {}", transport);
        }
        None
    }
}

impl<T: TextSource> PhotoSource for PhotoFeedFetcher<T> {
    async fn fetch_photo_list(&self, source: &Url) -> Vec<Photo> {
        match self.fetch_body(source).await {
            Some(body) => parse_photo_list(&body, source),
            None => {
                warn!("Photo feed: every transport failed for {}", source);
                Vec::new()
            }
        }
    }
}
