// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

/// Connect and per-read timeout for every feed and episode request
///
/// There is no cap on the whole transfer, so a slow but steady episode
/// download runs to completion.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A streaming response body
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// HTTP response with status, content length, and body stream
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Content-Length header value, if present
    pub content_length: Option<u64>,
    /// Response body as a stream of bytes
    pub body: ByteStream,
}

/// HTTP client abstraction for testability
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Fetch the entire response body as bytes, failing on error statuses
    async fn get_bytes(&self, url: &str) -> Result<Bytes, reqwest::Error>;

    /// Get a streaming response for large downloads
    async fn get_stream(&self, url: &str) -> Result<HttpResponse, reqwest::Error>;
}

/// Default HTTP client implementation using reqwest
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Create a new ReqwestClient with the default timeouts
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Create a client that gives up when connecting or a single read stalls
    /// for longer than `timeout`
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_bytes(&self, url: &str) -> Result<Bytes, reqwest::Error> {
        self.client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await
    }

    async fn get_stream(&self, url: &str) -> Result<HttpResponse, reqwest::Error> {
        use futures::StreamExt;

        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let content_length = response.content_length();

        let body: ByteStream = Box::pin(response.bytes_stream().map(|result| result));

        Ok(HttpResponse {
            status,
            content_length,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Serve one response that sends `chunks` single bytes, pausing before each
    fn trickle_server(chunks: usize, pause: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = [0u8; 4096];
            let _ = stream.read(&mut request);

            let _ = write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Length: {chunks}\r\nConnection: close\r\n\r\n"
            );
            let _ = stream.flush();
            for _ in 0..chunks {
                std::thread::sleep(pause);
                if stream.write_all(b"x").and_then(|_| stream.flush()).is_err() {
                    return;
                }
            }
        });

        format!("http://{addr}/episode.mp3")
    }

    async fn drain(response: HttpResponse) -> (usize, Option<reqwest::Error>) {
        let mut body = response.body;
        let mut received = 0;
        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => received += bytes.len(),
                Err(e) => return (received, Some(e)),
            }
        }
        (received, None)
    }

    #[test]
    fn reqwest_client_can_be_created() {
        assert!(ReqwestClient::new().is_ok());
    }

    #[tokio::test]
    async fn slow_steady_body_outlasting_timeout_completes() {
        let url = trickle_server(8, Duration::from_millis(200));
        let client = ReqwestClient::with_timeout(Duration::from_millis(600)).unwrap();

        let response = client.get_stream(&url).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.content_length, Some(8));

        let (received, error) = drain(response).await;
        assert!(error.is_none(), "unexpected error: {error:?}");
        assert_eq!(received, 8);
    }

    #[tokio::test]
    async fn stalled_body_times_out() {
        let url = trickle_server(1, Duration::from_secs(3));
        let client = ReqwestClient::with_timeout(Duration::from_millis(300)).unwrap();

        let response = client.get_stream(&url).await.unwrap();
        let (received, error) = drain(response).await;

        assert_eq!(received, 0);
        assert!(error.is_some_and(|e| e.is_timeout()));
    }
}
