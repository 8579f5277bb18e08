//! Delivery of scan results to the HTTP collector

use anyhow::{Context, Result};
use lanscan_core::Device;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Characters of a response body included in logs
const BODY_PREVIEW_CHARS: usize = 200;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Could not reach collector at {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Collector rejected devices: status {status}, response: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Posts each cycle's device list as one JSON array
pub struct Reporter {
    client: reqwest::Client,
    url: String,
}

impl Reporter {
    /// Create a reporter for the given collector endpoint
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send devices to the collector; any 2xx status is success
    pub async fn send(&self, devices: &[Device]) -> Result<(), ReportError> {
        info!(count = devices.len(), url = %self.url, "Sending devices to collector");

        let response = self
            .client
            .post(&self.url)
            .json(devices)
            .send()
            .await
            .map_err(|source| ReportError::Transport {
                url: self.url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let preview: String = body.chars().take(BODY_PREVIEW_CHARS).collect();

        if !status.is_success() {
            return Err(ReportError::Status {
                status,
                body: preview,
            });
        }

        debug!(status = %status, response = %preview, "Collector accepted devices");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanscan_core::{normalize, RawDevice};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Accept one HTTP request, answer with `status`, and return the request body
    async fn serve_once(status: u16) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/devices", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];

            let header_end = loop {
                let n = socket.read(&mut buf).await.unwrap();
                assert!(n > 0, "connection closed before headers");
                request.extend_from_slice(&buf[..n]);
                if let Some(pos) = find(&request, b"\r\n\r\n") {
                    break pos + 4;
                }
            };

            let headers = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
            let content_length: usize = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .map(|v| v.trim().parse().unwrap())
                .unwrap_or(0);

            while request.len() < header_end + content_length {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
            }

            let response = format!(
                "HTTP/1.1 {} Test\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok",
                status
            );
            socket.write_all(response.as_bytes()).await.unwrap();

            String::from_utf8_lossy(&request[header_end..]).into_owned()
        });

        (url, handle)
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn devices() -> Vec<Device> {
        let raw = vec![
            RawDevice::new("192.168.1.1", "AA:BB:CC:DD:EE:FF", "router"),
            RawDevice::unnamed("192.168.1.7", "11:22:33:44:55:66"),
        ];
        normalize(&raw, chrono::Local::now())
    }

    #[tokio::test]
    async fn test_posts_json_array() {
        let (url, server) = serve_once(200).await;
        let reporter = Reporter::new(&url, Duration::from_secs(5)).unwrap();

        reporter.send(&devices()).await.unwrap();

        let body: serde_json::Value = serde_json::from_str(&server.await.unwrap()).unwrap();
        let array = body.as_array().unwrap();
        assert_eq!(array.len(), 2);
        assert_eq!(array[0]["ip"], "192.168.1.1");
        assert_eq!(array[0]["mac"], "aa:bb:cc:dd:ee:ff");
        assert_eq!(array[0]["hostname"], "router");
        assert_eq!(array[1]["hostname"], "Unknown");
        assert!(array[1]["last_seen"].is_string());
    }

    #[tokio::test]
    async fn test_created_is_success() {
        let (url, server) = serve_once(201).await;
        let reporter = Reporter::new(&url, Duration::from_secs(5)).unwrap();
        assert!(reporter.send(&devices()).await.is_ok());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_server_error_status() {
        let (url, server) = serve_once(500).await;
        let reporter = Reporter::new(&url, Duration::from_secs(5)).unwrap();

        let result = reporter.send(&devices()).await;
        server.await.unwrap();
        match result {
            Err(ReportError::Status { status, body }) => {
                assert_eq!(status.as_u16(), 500);
                assert_eq!(body, "ok");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_collector() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/api/devices", listener.local_addr().unwrap());
        drop(listener);

        let reporter = Reporter::new(&url, Duration::from_secs(5)).unwrap();
        let result = reporter.send(&devices()).await;
        assert!(matches!(result, Err(ReportError::Transport { .. })));
    }
}
