/*
 *  parse.rs
 *
 *  LyMonS PhotoFeed - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Photo list parsing - JSON manifests first, HTML directory listings after
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

use log::debug;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::photo::{display_name, is_image_link, Photo};

/// The two manifest shapes we accept
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Manifest {
    List(Vec<Value>),
    Wrapped { photos: Vec<Value> },
}

impl Manifest {
    fn into_entries(self) -> Vec<Value> {
        match self {
            Manifest::List(entries) => entries,
            Manifest::Wrapped { photos } => photos,
        }
    }
}

/// Directory semantics for the source: relative links resolve inside it.
pub fn base_url(source: &Url) -> Url {
    let mut base = source.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

/// Turn the body fetched from `source` into photos, in source order.
///
/// Manifest entries resolve against `source` itself, since a manifest is a
/// file. Listing hrefs resolve against [`base_url`] of it.
/// A body that is valid JSON of a manifest shape is never re-read as HTML,
/// even when none of its entries are images.
pub fn parse_photo_list(body: &str, source: &Url) -> Vec<Photo> {
    if let Some(photos) = parse_manifest(body, source) {
        debug!("Parsed manifest with {} photos", photos.len());
        return photos;
    }
    let photos = parse_listing(body, &base_url(source));
    debug!("Parsed directory listing with {} photos", photos.len());
    photos
}

/// `None` when the body is not a JSON array or `{ "photos": [...] }` object.
pub fn parse_manifest(body: &str, base: &Url) -> Option<Vec<Photo>> {
    let manifest: Manifest = serde_json::from_str(body).ok()?;

    let photos = manifest
        .into_entries()
        .iter()
        .filter_map(|entry| {
            let link = entry.get("url")?.as_str()?;
            if !is_image_link(link) {
                return None;
            }
            let url = match base.join(link) {
                Ok(url) => url,
                Err(e) => {
                    debug!("Skipping manifest entry {}: {}", link, e);
                    return None;
                }
            };
            let name = entry
                .get("name")
                .and_then(Value::as_str)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| display_name(link));
            Some(Photo::new(name, url.to_string()))
        })
        .collect();

    Some(photos)
}

/// Every anchor whose raw `href` names an image, resolved against `base`.
pub fn parse_listing(body: &str, base: &Url) -> Vec<Photo> {
    let Ok(anchors) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(body);

    document
        .select(&anchors)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            if !is_image_link(href) {
                return None;
            }
            let url = base.join(href).ok()?;
            Some(Photo::new(display_name(href), url.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_wrapped_manifest_filters_non_images() {
        let body = r#"{"photos":[{"url":"http://x/a.jpg"},{"url":"http://x/b.txt"}]}"#;
        let photos = parse_photo_list(body, &base("http://x/"));
        assert_eq!(photos, vec![Photo::new("a.jpg", "http://x/a.jpg")]);
    }

    #[test]
    fn test_array_manifest_keeps_order_and_names() {
        let body = r#"[
            {"url":"http://x/3.png","name":"Third"},
            {"url":"http://x/1.gif"},
            {"url":"http://x/readme.md","name":"skip me"},
            {"url":"http://x/2.WEBP","name":""}
        ]"#;
        let photos = parse_photo_list(body, &base("http://x/"));
        let names: Vec<&str> = photos.iter().map(Photo::name).collect();
        assert_eq!(names, vec!["Third", "1.gif", "2.WEBP"]);
        assert_eq!(photos[0].url(), "http://x/3.png");
    }

    #[test]
    fn test_manifest_relative_urls_resolve() {
        let body = r#"[{"url":"pics/a%20b.jpeg"}]"#;
        let photos = parse_photo_list(body, &base("https://host/feed/"));
        assert_eq!(photos, vec![Photo::new("a b.jpeg", "https://host/feed/pics/a%20b.jpeg")]);
    }

    #[test]
    fn test_manifest_file_relative_entries_are_siblings() {
        let source = base("http://x/feed/photos.json");
        let photos = parse_photo_list(r#"[{"url":"a.jpg"},{"url":"../b.png"}]"#, &source);
        let urls: Vec<&str> = photos.iter().map(Photo::url).collect();
        assert_eq!(urls, vec!["http://x/feed/a.jpg", "http://x/b.png"]);
    }

    #[test]
    fn test_listing_treats_source_as_directory() {
        let body = r#"<a href="pic1.png">x</a>"#;
        let photos = parse_photo_list(body, &base("http://x/dir"));
        assert_eq!(photos, vec![Photo::new("pic1.png", "http://x/dir/pic1.png")]);
    }

    #[test]
    fn test_manifest_skips_malformed_entries() {
        let body = r#"[42, {"name":"no url"}, {"url":7}, {"url":"http://x/ok.jpg"}]"#;
        let photos = parse_photo_list(body, &base("http://x/"));
        assert_eq!(photos.len(), 1);
        assert_eq!(photos[0].name(), "ok.jpg");
    }

    #[test]
    fn test_manifest_without_images_is_empty_not_html() {
        let body = r#"{"photos":[{"url":"http://x/a.txt"}]}"#;
        assert_eq!(parse_manifest(body, &base("http://x/")), Some(Vec::new()));
        assert!(parse_photo_list(body, &base("http://x/")).is_empty());
    }

    #[test]
    fn test_wrong_json_shape_is_not_a_manifest() {
        assert!(parse_manifest(r#"{"items":[]}"#, &base("http://x/")).is_none());
        assert!(parse_manifest(r#"{"photos":"nope"}"#, &base("http://x/")).is_none());
        assert!(parse_manifest("12", &base("http://x/")).is_none());
        assert!(parse_manifest("[{\"url\":", &base("http://x/")).is_none());
    }

    #[test]
    fn test_listing_resolves_relative_hrefs() {
        let body = r#"<a href="pic1.png">x</a><a href="doc.pdf">y</a>"#;
        let photos = parse_photo_list(body, &base("http://x/dir/"));
        assert_eq!(photos, vec![Photo::new("pic1.png", "http://x/dir/pic1.png")]);
    }

    #[test]
    fn test_listing_document_order_and_exclusions() {
        let body = r#"<html><body>
            <a href="../">Parent Directory</a>
            <a>no href</a>
            <a href="/abs/b.JPG">b</a>
            <a href="sub/c%20d.gif">c</a>
            <a href="https://cdn.example/e.webp">e</a>
            <a href="f.jpg?size=large">f</a>
        </body></html>"#;
        let photos = parse_listing(body, &base("http://x/dir/"));
        let urls: Vec<&str> = photos.iter().map(Photo::url).collect();
        assert_eq!(
            urls,
            vec![
                "http://x/abs/b.JPG",
                "http://x/dir/sub/c%20d.gif",
                "https://cdn.example/e.webp",
            ]
        );
        assert_eq!(photos[1].name(), "c d.gif");
    }

    #[test]
    fn test_listing_unescapes_entities_in_href() {
        let body = r#"<a href="a&amp;b.png">amp</a>"#;
        let photos = parse_listing(body, &base("http://x/"));
        assert_eq!(photos, vec![Photo::new("a&b.png", "http://x/a&b.png")]);
    }

    #[test]
    fn test_garbage_body_is_empty() {
        assert!(parse_photo_list("not json, not html links", &base("http://x/")).is_empty());
    }

    #[test]
    fn test_base_url_appends_slash() {
        assert_eq!(base_url(&base("http://x/dir")).as_str(), "http://x/dir/");
        assert_eq!(base_url(&base("http://x/dir/")).as_str(), "http://x/dir/");
        assert_eq!(base_url(&base("http://x")).as_str(), "http://x/");
        assert_eq!(base_url(&base("http://x/list?page=1")).as_str(), "http://x/list/?page=1");
    }
}
