/*
 *  http.rs
 *
 *  LyMonS PhotoFeed - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Safe text fetch - bounded timeout, single retry, never errors outward
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

use flate2::read::GzDecoder;
use log::{debug, warn};
use reqwest::{Client, Response, header};
use std::future::Future;
use std::io::Read;
use std::time::Duration;
use url::Url;

use crate::error::FeedError;

/// Anything that can GET a url and hand back its body as text.
///
/// `None` covers every failure: network, status, timeout, empty body.
pub trait TextSource {
    fn get_text(&self, url: &Url) -> impl Future<Output = Option<String>>;
}

/// Timeout and retry policy applied to every request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchPolicy {
    pub timeout: Duration,
    /// extra attempts after the first one
    pub retries: u32,
    pub retry_pause: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            retries: 1,
            retry_pause: Duration::from_secs(1),
        }
    }
}

/// reqwest backed [`TextSource`]
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    policy: FetchPolicy,
}

impl HttpClient {
    pub fn new(policy: FetchPolicy) -> Result<Self, FeedError> {
        const VERSION: &str = concat!("LyMonS ", env!("CARGO_PKG_NAME"), " v", env!("CARGO_PKG_VERSION"));

        let mut headers = header::HeaderMap::new();
        headers.insert("User-Agent", header::HeaderValue::from_static(VERSION));
        headers.insert(
            "Accept",
            header::HeaderValue::from_static("application/json, text/html;q=0.9, */*;q=0.5"),
        );
        headers.insert("Accept-Encoding", header::HeaderValue::from_static("gzip"));
        headers.insert("Connection", header::HeaderValue::from_static("close"));

        let client = Client::builder()
            .connect_timeout(policy.timeout.min(Duration::from_secs(5)))
            .default_headers(headers)
            .timeout(policy.timeout)
            .build()?;

        Ok(Self { client, policy })
    }

    pub fn policy(&self) -> &FetchPolicy {
        &self.policy
    }

    async fn send_with_retries(&self, url: &Url) -> Result<String, reqwest::Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = match self.client.get(url.clone()).send().await {
                Ok(response) => match response.error_for_status() {
                    Ok(response) => read_body(response).await,
                    Err(e) => Err(e),
                },
                Err(e) => Err(e),
            };
            match result {
                Ok(body) => return Ok(body),
                Err(e) => {
                    if attempt > self.policy.retries {
                        return Err(e);
                    }
                    debug!("GET {} attempt {} failed: {}, retrying", url, attempt, e);
                    tokio::time::sleep(self.policy.retry_pause).await;
                }
            }
        }
    }
}

impl TextSource for HttpClient {
    async fn get_text(&self, url: &Url) -> Option<String> {
        match self.send_with_retries(url).await {
            Ok(body) if !body.trim().is_empty() => Some(body),
            Ok(_) => {
                debug!("GET {} returned an empty body", url);
                None
            }
            Err(e) => {
                warn!("GET {} failed: {}", url, e);
                None
            }
        }
    }
}

/// Gzipped bodies are unpacked by hand; anything else is decoded with the
/// charset named in `Content-Type`, utf-8 when there is none.
async fn read_body(response: Response) -> Result<String, reqwest::Error> {
    let gzipped = response
        .headers()
        .get(header::CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("gzip"));

    if gzipped {
        let raw = response.bytes().await?;
        Ok(decode_body(&raw))
    } else {
        response.text().await
    }
}

/// Gzip when the bytes inflate cleanly, else lossy utf-8.
pub(crate) fn decode_body(raw: &[u8]) -> String {
    let mut decoder = GzDecoder::new(raw);
    let mut decoded = String::new();
    match decoder.read_to_string(&mut decoded) {
        Ok(_) => decoded,
        Err(_) => String::from_utf8_lossy(raw).into_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    #[test]
    fn test_decode_plain_body() {
        assert_eq!(decode_body(b"<a href=\"x.jpg\">"), "<a href=\"x.jpg\">");
    }

    #[test]
    fn test_decode_gzip_body() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"[{"url":"http://x/a.jpg"}]"#).unwrap();
        let packed = encoder.finish().unwrap();
        assert_eq!(decode_body(&packed), r#"[{"url":"http://x/a.jpg"}]"#);
    }

    #[test]
    fn test_default_policy() {
        let policy = FetchPolicy::default();
        assert_eq!(policy.timeout, Duration::from_secs(10));
        assert_eq!(policy.retries, 1);
    }

    fn quick_client() -> HttpClient {
        HttpClient::new(FetchPolicy {
            timeout: Duration::from_secs(2),
            retries: 0,
            retry_pause: Duration::from_millis(10),
        })
        .unwrap()
    }

    /// Answers a single request on loopback with `head` headers and `body`
    async fn serve_once(head: &'static str, body: Vec<u8>) -> Url {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let mut reply = format!(
                "HTTP/1.1 200 OK\r\n{head}Content-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            )
            .into_bytes();
            reply.extend_from_slice(&body);
            socket.write_all(&reply).await.unwrap();
            let _ = socket.shutdown().await;
        });
        Url::parse(&format!("http://{addr}/photos/")).unwrap()
    }

    #[tokio::test]
    async fn test_latin1_listing_uses_declared_charset() {
        let url = serve_once(
            "Content-Type: text/html; charset=iso-8859-1\r\n",
            b"<a href=\"caf\xe9.jpg\">caf\xe9</a>".to_vec(),
        )
        .await;
        let body = quick_client().get_text(&url).await.unwrap();
        assert_eq!(body, "<a href=\"caf\u{e9}.jpg\">caf\u{e9}</a>");
    }

    #[tokio::test]
    async fn test_gzip_encoded_response_is_unpacked() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(br#"[{"url":"a.jpg"}]"#).unwrap();
        let url = serve_once(
            "Content-Type: application/json\r\nContent-Encoding: gzip\r\n",
            encoder.finish().unwrap(),
        )
        .await;
        assert_eq!(quick_client().get_text(&url).await.as_deref(), Some(r#"[{"url":"a.jpg"}]"#));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_none() {
        // bind then drop, so the port refuses connections
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{addr}/photos/")).unwrap();
        assert!(quick_client().get_text(&url).await.is_none());
    }
}
