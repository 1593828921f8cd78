//! HTTP transport against the scantally API server.

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::protocol::{
    ErrorBody, HealthResponse, OutgoingScan, RecentScan, ScanBatch, SkuTotal, SyncResponse,
};
use crate::util::{compact_text, is_http_url, normalize_text_option};

use super::error::{SyncError, SyncResult};
use super::transport::SyncTransport;

/// reqwest-backed client for the scan API.
#[derive(Debug, Clone)]
pub struct HttpSyncTransport {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSyncTransport {
    /// Build a client for `base_url` with a per-request `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> SyncResult<Self> {
        let base_url = normalize_base_url(base_url.into())?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| SyncError::Transport(error.to_string()))?;
        Ok(Self { base_url, client })
    }

    /// Server root without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Most recent persisted scans, newest first.
    pub async fn fetch_recent(&self, limit: usize) -> SyncResult<Vec<RecentScan>> {
        let request = self
            .client
            .get(self.endpoint("/api/scans"))
            .query(&[("limit", limit)]);
        send_json(request).await
    }

    /// Server-side per-SKU totals.
    pub async fn fetch_summary(&self) -> SyncResult<Vec<SkuTotal>> {
        send_json(self.client.get(self.endpoint("/api/scans/summary"))).await
    }

    /// Liveness check.
    pub async fn health(&self) -> SyncResult<HealthResponse> {
        send_json(self.client.get(self.endpoint("/health"))).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

impl SyncTransport for HttpSyncTransport {
    async fn push(&self, scans: &[OutgoingScan]) -> SyncResult<SyncResponse> {
        let request = self
            .client
            .post(self.endpoint("/api/scan"))
            .json(&ScanBatch { scans });
        send_json(request).await
    }
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> SyncResult<T> {
    let response = request
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await
        .map_err(|error| SyncError::Transport(error.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(status_error(status, &body));
    }

    let body = response
        .text()
        .await
        .map_err(|error| SyncError::Transport(error.to_string()))?;
    serde_json::from_str(&body).map_err(|error| {
        SyncError::Protocol(format!("{error}: {}", compact_text(&body)))
    })
}

fn status_error(status: StatusCode, body: &str) -> SyncError {
    let message = parse_api_error(status, body);
    if status.is_client_error() {
        SyncError::Validation(message)
    } else {
        SyncError::Server {
            status: status.as_u16(),
            detail: message,
        }
    }
}

fn parse_api_error(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ErrorBody>(body) {
        return match payload.detail {
            Some(detail) => format!("{}: {}", payload.error, detail.trim()),
            None => payload.error,
        };
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        trimmed
    }
}

fn normalize_base_url(raw: String) -> SyncResult<String> {
    let base_url = normalize_text_option(Some(raw))
        .ok_or_else(|| SyncError::Validation("server URL must not be empty".to_string()))?;
    if is_http_url(&base_url) {
        Ok(base_url.trim_end_matches('/').to_string())
    } else {
        Err(SyncError::Validation(
            "server URL must include http:// or https://".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LocalId;
    use pretty_assertions::assert_eq;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answer exactly one request with `status` and a JSON `body`.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buffer = vec![0_u8; 8192];
            let mut received = Vec::new();
            loop {
                let read = socket.read(&mut buffer).await.unwrap();
                received.extend_from_slice(&buffer[..read]);
                if read == 0 || request_complete(&received) {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });

        format!("http://{address}")
    }

    fn request_complete(received: &[u8]) -> bool {
        let text = String::from_utf8_lossy(received);
        let Some(header_end) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..header_end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        received.len() >= header_end + 4 + content_length
    }

    fn batch() -> Vec<OutgoingScan> {
        vec![OutgoingScan {
            id: LocalId::new(1),
            sku: "ABC123".to_string(),
            count: 1,
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
        }]
    }

    #[test]
    fn new_rejects_invalid_urls() {
        assert!(HttpSyncTransport::new("", Duration::from_secs(1)).is_err());
        assert!(HttpSyncTransport::new("example.com", Duration::from_secs(1)).is_err());
    }

    #[test]
    fn new_trims_trailing_slash() {
        let transport = HttpSyncTransport::new(" http://localhost:5000/ ", Duration::from_secs(1))
            .unwrap();
        assert_eq!(transport.base_url(), "http://localhost:5000");
    }

    #[test]
    fn parse_api_error_prefers_structured_body() {
        let body = r#"{"error":"server_error","detail":"disk I/O error"}"#;
        assert_eq!(
            parse_api_error(StatusCode::INTERNAL_SERVER_ERROR, body),
            "server_error: disk I/O error"
        );
        assert_eq!(
            parse_api_error(StatusCode::BAD_REQUEST, r#"{"error":"bad payload"}"#),
            "bad payload"
        );
        assert_eq!(parse_api_error(StatusCode::BAD_GATEWAY, "  "), "HTTP 502");
    }

    #[test]
    fn status_error_splits_client_and_server_failures() {
        assert!(matches!(
            status_error(StatusCode::BAD_REQUEST, ""),
            SyncError::Validation(_)
        ));
        assert!(matches!(
            status_error(StatusCode::SERVICE_UNAVAILABLE, ""),
            SyncError::Server { status: 503, .. }
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_push_to_closed_port_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let transport =
            HttpSyncTransport::new(format!("http://{address}"), Duration::from_secs(2)).unwrap();
        let error = transport.push(&batch()).await.unwrap_err();
        assert!(error.is_transport(), "unexpected error: {error:?}");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_push_reads_acknowledged_ids() {
        let base_url = serve_once("200 OK", r#"{"synced_ids":[1]}"#).await;
        let transport = HttpSyncTransport::new(base_url, Duration::from_secs(5)).unwrap();

        let response = transport.push(&batch()).await.unwrap();
        assert_eq!(
            response.acknowledged_local_ids().into_iter().collect::<Vec<_>>(),
            vec![LocalId::new(1)]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_push_maps_server_failure() {
        let base_url = serve_once(
            "500 Internal Server Error",
            r#"{"error":"server_error","detail":"database is locked"}"#,
        )
        .await;
        let transport = HttpSyncTransport::new(base_url, Duration::from_secs(5)).unwrap();

        let error = transport.push(&batch()).await.unwrap_err();
        match error {
            SyncError::Server { status, detail } => {
                assert_eq!(status, 500);
                assert!(detail.contains("database is locked"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unexpected_body_is_a_protocol_error() {
        let base_url = serve_once("200 OK", r#"{"ok":true}"#).await;
        let transport = HttpSyncTransport::new(base_url, Duration::from_secs(5)).unwrap();

        let error = transport.push(&batch()).await.unwrap_err();
        assert!(matches!(error, SyncError::Protocol(_)));
    }
}
