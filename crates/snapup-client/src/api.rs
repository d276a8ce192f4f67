//! Thin wrapper over the appliance HTTP API.
//!
//! Endpoints, all under `http://<address>:<port>/api/v1`:
//! - `POST /connect` (form `token`) → 200 with `{"token": ...}`
//! - `GET /status` (query `token`) → 200 approved, 204 waiting, 401 expired
//! - `POST /upload` (multipart `token` + `file`) → 200 accepted
//! - `POST /disconnect` (form `token`) → ignored

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use snapup_core::protocol::{self, status};
use snapup_core::{SnapError, SnapResult};
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

use crate::payload::Payload;

const USER_AGENT: &str = concat!("snapup/", env!("CARGO_PKG_VERSION"));

/// Outcome of one `GET /status` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalStatus {
    Approved,
    AwaitingApproval,
    Unauthorized,
    /// Any other code; treated as transient.
    Other(u16),
}

impl ApprovalStatus {
    pub fn from_code(code: u16) -> Self {
        match code {
            status::APPROVED => Self::Approved,
            status::AWAITING_APPROVAL => Self::AwaitingApproval,
            status::UNAUTHORIZED => Self::Unauthorized,
            other => Self::Other(other),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConnectResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Build the shared HTTP client used for every appliance request.
pub fn http_client() -> SnapResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| SnapError::Http(e.to_string()))
}

/// API handle bound to one appliance address.
#[derive(Debug, Clone)]
pub struct ApplianceApi {
    http: reqwest::Client,
    address: String,
    base: String,
    request_timeout: Duration,
}

impl ApplianceApi {
    pub fn new(
        http: reqwest::Client,
        address: impl Into<String>,
        port: u16,
        request_timeout: Duration,
    ) -> Self {
        let address = address.into();
        let base = protocol::api_base(&address, port);
        Self {
            http,
            address,
            base,
            request_timeout,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// Ask for a session token, presenting `token` (possibly empty).
    ///
    /// A 403 for a non-empty token means the appliance forgot it; the
    /// request is repeated once without a token to get a fresh one.
    pub async fn connect(&self, token: &str) -> SnapResult<String> {
        let url = self.url("/connect");
        let mut candidate = token;

        loop {
            debug!(url = %url, with_token = !candidate.is_empty(), "connect");
            let resp = self
                .http
                .post(&url)
                .form(&[("token", candidate)])
                .timeout(self.request_timeout)
                .send()
                .await
                .map_err(|e| SnapError::ConnectFailed(e.to_string()))?;

            let code = resp.status();
            if code == StatusCode::FORBIDDEN && !candidate.is_empty() {
                debug!("cached token rejected, reconnecting without it");
                candidate = "";
                continue;
            }
            if code != StatusCode::OK {
                return Err(SnapError::ConnectFailed(format!(
                    "error code {} from {url}",
                    code.as_u16()
                )));
            }

            let body = resp
                .text()
                .await
                .map_err(|e| SnapError::ConnectFailed(e.to_string()))?;
            let parsed: ConnectResponse = serde_json::from_str(&body).map_err(|e| {
                SnapError::ConnectFailed(format!("malformed connect response: {e}"))
            })?;

            return match parsed.token.filter(|t| !t.is_empty()) {
                Some(token) => Ok(token),
                None => Err(SnapError::ConnectFailed(
                    "appliance returned no token".into(),
                )),
            };
        }
    }

    /// Query the session status for `token`.
    pub async fn status(&self, token: &str) -> Result<ApprovalStatus, reqwest::Error> {
        let nocache = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
            .to_string();

        let resp = self
            .http
            .get(self.url("/status"))
            .query(&[("token", token), ("_", nocache.as_str())])
            .timeout(self.request_timeout)
            .send()
            .await?;

        Ok(ApprovalStatus::from_code(resp.status().as_u16()))
    }

    /// Stream `payload` to the appliance under `token`.
    pub async fn upload(&self, token: &str, payload: &Payload, timeout: Duration) -> SnapResult<()> {
        let file = tokio::fs::File::open(&payload.path).await?;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));
        let part = Part::stream_with_length(body, payload.size)
            .file_name(payload.file_name.clone())
            .mime_str("application/octet-stream")
            .map_err(|e| SnapError::Http(e.to_string()))?;
        let form = Form::new().text("token", token.to_string()).part("file", part);

        let resp = self
            .http
            .post(self.url("/upload"))
            .multipart(form)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| SnapError::SubmissionFailed(e.to_string()))?;

        let code = resp.status();
        if code == StatusCode::OK {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(SnapError::SubmissionRejected {
            status: code.as_u16(),
            body,
        })
    }

    /// End the session. Failures are logged and swallowed.
    pub async fn disconnect(&self, token: &str) {
        let result = self
            .http
            .post(self.url("/disconnect"))
            .form(&[("token", token)])
            .timeout(self.request_timeout)
            .send()
            .await;

        match result {
            Ok(resp) => debug!(status = resp.status().as_u16(), "disconnected"),
            Err(e) => warn!(error = %e, "disconnect failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn api_for(server: &mockito::ServerGuard) -> ApplianceApi {
        ApplianceApi::new(
            http_client().unwrap(),
            "127.0.0.1",
            server.socket_address().port(),
            Duration::from_secs(2),
        )
    }

    #[test]
    fn status_codes_map_to_approval() {
        assert_eq!(ApprovalStatus::from_code(200), ApprovalStatus::Approved);
        assert_eq!(ApprovalStatus::from_code(204), ApprovalStatus::AwaitingApproval);
        assert_eq!(ApprovalStatus::from_code(401), ApprovalStatus::Unauthorized);
        assert_eq!(ApprovalStatus::from_code(503), ApprovalStatus::Other(503));
    }

    #[tokio::test]
    async fn connect_returns_issued_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/connect")
            .match_body(Matcher::UrlEncoded("token".into(), "old".into()))
            .with_status(200)
            .with_body(r#"{"token":"fresh","headType":1}"#)
            .create_async()
            .await;

        let token = api_for(&server).connect("old").await.unwrap();
        assert_eq!(token, "fresh");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn connect_without_token_field_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/connect")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let err = api_for(&server).connect("").await.unwrap_err();
        assert!(matches!(err, SnapError::ConnectFailed(_)));
    }

    #[tokio::test]
    async fn connect_error_status_fails() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/connect")
            .with_status(500)
            .create_async()
            .await;

        let err = api_for(&server).connect("").await.unwrap_err();
        assert!(err.to_string().contains("error code 500"));
    }

    #[tokio::test]
    async fn stale_token_is_replaced() {
        let mut server = mockito::Server::new_async().await;
        let stale = server
            .mock("POST", "/api/v1/connect")
            .match_body(Matcher::UrlEncoded("token".into(), "stale".into()))
            .with_status(403)
            .create_async()
            .await;
        let fresh = server
            .mock("POST", "/api/v1/connect")
            .match_body(Matcher::UrlEncoded("token".into(), "".into()))
            .with_status(200)
            .with_body(r#"{"token":"new-one"}"#)
            .create_async()
            .await;

        let token = api_for(&server).connect("stale").await.unwrap();
        assert_eq!(token, "new-one");
        stale.assert_async().await;
        fresh.assert_async().await;
    }

    #[tokio::test]
    async fn connect_to_unreachable_appliance_fails() {
        let api = ApplianceApi::new(
            http_client().unwrap(),
            "127.0.0.1",
            1,
            Duration::from_millis(500),
        );
        let err = api.connect("").await.unwrap_err();
        assert!(matches!(err, SnapError::ConnectFailed(_)));
    }

    #[tokio::test]
    async fn status_sends_token_query() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/status")
            .match_query(Matcher::UrlEncoded("token".into(), "abc".into()))
            .with_status(204)
            .create_async()
            .await;

        let status = api_for(&server).status("abc").await.unwrap();
        assert_eq!(status, ApprovalStatus::AwaitingApproval);
    }

    #[tokio::test]
    async fn upload_rejection_carries_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.gcode");
        std::fs::write(&path, b"G28\n").unwrap();
        let payload = Payload::open(&path).await.unwrap();

        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/v1/upload")
            .with_status(400)
            .with_body("machine busy")
            .create_async()
            .await;

        let err = api_for(&server)
            .upload("tok", &payload, Duration::from_secs(5))
            .await
            .unwrap_err();
        match err {
            SnapError::SubmissionRejected { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "machine busy");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn upload_streams_file_and_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.gcode");
        std::fs::write(&path, b"G1 X42 Y7\n").unwrap();
        let payload = Payload::open(&path).await.unwrap();

        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/upload")
            .match_body(Matcher::AllOf(vec![
                Matcher::Regex("G1 X42 Y7".into()),
                Matcher::Regex("tok-77".into()),
                Matcher::Regex(r#"filename="part.gcode""#.into()),
            ]))
            .with_status(200)
            .create_async()
            .await;

        api_for(&server)
            .upload("tok-77", &payload, Duration::from_secs(5))
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn disconnect_swallows_errors() {
        let api = ApplianceApi::new(
            http_client().unwrap(),
            "127.0.0.1",
            1,
            Duration::from_millis(200),
        );
        api.disconnect("tok").await;
    }
}
