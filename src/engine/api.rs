//! HTTP client for the scanner service.

use super::ScanBackend;
use crate::error::ScanError;
use crate::model::{error_field, ScanConfig, ScanMethod, ScanResult, ScanStats};
use anyhow::{Context, Result};
use reqwest::{StatusCode, Url};

#[derive(Debug, Clone)]
pub struct ScanApiClient {
    http: reqwest::Client,
    base_url: String,
    method: ScanMethod,
}

impl ScanApiClient {
    pub fn new(cfg: &ScanConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(cfg.request_timeout)
            .user_agent(cfg.user_agent.clone())
            .build()
            .context("build HTTP client")?;
        Ok(Self {
            http,
            base_url: cfg.base_url.clone(),
            method: cfg.method,
        })
    }

    /// Join path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ScanError> {
        let invalid = || ScanError::Transport(format!("Invalid base URL: {}", self.base_url));
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_scan(&self, address: &str) -> Result<reqwest::Response, ScanError> {
        let req = match self.method {
            ScanMethod::Post => self
                .http
                .post(self.endpoint(&["api", "scan"])?)
                .json(&serde_json::json!({ "mint_address": address })),
            ScanMethod::Get => self.http.get(self.endpoint(&["api", "scan", address])?),
        };
        Ok(req.send().await?)
    }
}

/// Read the body as JSON regardless of status.
async fn read_payload(resp: reqwest::Response) -> Result<(StatusCode, serde_json::Value), ScanError> {
    let status = resp.status();
    let body = resp.bytes().await?;
    let value = serde_json::from_slice(&body).map_err(|_| {
        ScanError::InvalidResponse(format!(
            "Scanner returned a non-JSON response (HTTP {})",
            status.as_u16()
        ))
    })?;
    Ok((status, value))
}

impl ScanBackend for ScanApiClient {
    async fn scan(&self, address: &str) -> Result<ScanResult, ScanError> {
        let resp = self.send_scan(address).await?;
        let (status, payload) = read_payload(resp).await?;

        if !status.is_success() {
            log::debug!("scan request failed with HTTP {status}");
            return Err(ScanError::Server(
                error_field(&payload).unwrap_or_else(|| "Scan failed".into()),
            ));
        }
        // A 200 can still carry an error.
        if let Some(msg) = error_field(&payload) {
            return Err(ScanError::Server(msg));
        }
        Ok(ScanResult::new(payload))
    }

    async fn fetch_stats(&self) -> Result<ScanStats, ScanError> {
        let resp = self.http.get(self.endpoint(&["api", "stats"])?).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ScanError::Server(format!(
                "Stats request failed (HTTP {})",
                status.as_u16()
            )));
        }
        let (_, payload) = read_payload(resp).await?;
        serde_json::from_value(payload)
            .map_err(|e| ScanError::InvalidResponse(format!("Malformed stats payload: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::StatusCode as AxumStatus,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};

    const MINT: &str = "So11111111111111111111111111111111111111112";

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn client(base_url: String, method: ScanMethod) -> ScanApiClient {
        ScanApiClient::new(&ScanConfig {
            base_url,
            method,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn posts_mint_address_and_returns_payload() {
        let app = Router::new().route(
            "/api/scan",
            post(|Json(body): Json<Value>| async move {
                Json(json!({
                    "success": true,
                    "mint_address": body["mint_address"],
                    "risk_assessment": {"overall_score": 71, "risk_level": "SAFE"}
                }))
            }),
        );
        let c = client(serve(app).await, ScanMethod::Post);
        let r = c.scan(MINT).await.unwrap();
        assert_eq!(r.mint_address(), Some(MINT));
        assert_eq!(r.risk_level(), Some("SAFE"));
    }

    #[tokio::test]
    async fn get_method_puts_address_in_path() {
        let app = Router::new().route(
            "/api/scan/{mint}",
            get(|Path(mint): Path<String>| async move {
                Json(json!({"mint_address": mint, "risk_assessment": {}}))
            }),
        );
        let c = client(serve(app).await, ScanMethod::Get);
        let r = c.scan(MINT).await.unwrap();
        assert_eq!(r.mint_address(), Some(MINT));
    }

    #[tokio::test]
    async fn error_field_under_ok_status_is_an_error() {
        let app = Router::new().route(
            "/api/scan",
            post(|| async {
                Json(json!({
                    "error": "Could not fetch token data. Token may not exist.",
                    "mint_address": MINT
                }))
            }),
        );
        let c = client(serve(app).await, ScanMethod::Post);
        let err = c.scan(MINT).await.unwrap_err();
        assert_eq!(
            err,
            ScanError::Server("Could not fetch token data. Token may not exist.".into())
        );
    }

    #[tokio::test]
    async fn error_status_uses_error_field_or_fallback() {
        let app = Router::new()
            .route(
                "/api/scan",
                post(|| async {
                    (
                        AxumStatus::BAD_REQUEST,
                        Json(json!({"error": "Mint address is required"})),
                    )
                }),
            )
            .route(
                "/api/scan/{mint}",
                get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, Json(json!({}))) }),
            );
        let base = serve(app).await;

        let err = client(base.clone(), ScanMethod::Post)
            .scan(MINT)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Mint address is required");

        let err = client(base, ScanMethod::Get).scan(MINT).await.unwrap_err();
        assert_eq!(err.to_string(), "Scan failed");
    }

    #[tokio::test]
    async fn non_json_body_is_invalid_response() {
        let app = Router::new().route(
            "/api/scan",
            post(|| async { (AxumStatus::BAD_GATEWAY, "<html>bad gateway</html>") }),
        );
        let c = client(serve(app).await, ScanMethod::Post);
        let err = c.scan(MINT).await.unwrap_err();
        assert!(matches!(err, ScanError::InvalidResponse(ref m) if m.contains("502")));
    }

    #[tokio::test]
    async fn unreachable_service_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let c = client(format!("http://{addr}"), ScanMethod::Post);
        let err = c.scan(MINT).await.unwrap_err();
        assert!(matches!(err, ScanError::Transport(_)));
    }

    #[tokio::test]
    async fn fetches_stats() {
        let app = Router::new().route(
            "/api/stats",
            get(|| async { Json(json!({"total_scans": 1234, "ml_enabled": false})) }),
        );
        let c = client(serve(app).await, ScanMethod::Post);
        let stats = c.fetch_stats().await.unwrap();
        assert_eq!(stats.total_scans, 1234);
        assert_eq!(stats.ml_enabled, Some(false));
    }

    #[tokio::test]
    async fn stats_status_is_checked_before_body() {
        let app = Router::new().route(
            "/api/stats",
            get(|| async { AxumStatus::INTERNAL_SERVER_ERROR }),
        );
        let c = client(serve(app).await, ScanMethod::Post);
        let err = c.fetch_stats().await.unwrap_err();
        assert_eq!(
            err,
            ScanError::Server("Stats request failed (HTTP 500)".into())
        );
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let c = client("http://scanner.local/proxy/".into(), ScanMethod::Get);
        let url = c.endpoint(&["api", "scan", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "http://scanner.local/proxy/api/scan/a%2Fb");
    }
}
