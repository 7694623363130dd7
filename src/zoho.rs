use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::error::{Result, RumError};
use crate::pipeline::RumSource;
use crate::types::{Config, Monitor, ZohoCredentials};

const TOKEN_TIMEOUT: Duration = Duration::from_secs(15);
const FETCH_TIMEOUT: Duration = Duration::from_secs(20);
/// Upper bound on how much of an error body ends up in logs and notices.
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

/// Site24x7 RUM API access through a Zoho OAuth refresh token.
pub struct ZohoClient {
    http: reqwest::Client,
    token_url: String,
    api_base: String,
    period: String,
    credentials: ZohoCredentials,
}

impl ZohoClient {
    pub fn new(
        token_url: impl Into<String>,
        api_base: impl Into<String>,
        period: impl Into<String>,
        credentials: ZohoCredentials,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: token_url.into(),
            api_base: api_base.into(),
            period: period.into(),
            credentials,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.zoho_token_url.clone(),
            cfg.rum_api_base.clone(),
            cfg.rum_period.clone(),
            cfg.zoho_credentials.clone(),
        )
    }

    pub fn rum_url(&self, monitor_id: &str) -> String {
        format!(
            "{}/rum/web/view/{}/wt/list/avgRT/{}",
            self.api_base.trim_end_matches('/'),
            monitor_id,
            self.period
        )
    }

    /// Exchange the refresh token for a short-lived access token.
    pub async fn refresh_access_token(&self) -> Result<String> {
        let params = [
            ("refresh_token", self.credentials.refresh_token.as_str()),
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let res = self
            .http
            .post(&self.token_url)
            .form(&params)
            .timeout(TOKEN_TIMEOUT)
            .send()
            .await
            .map_err(|e| RumError::Token(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            error!("Zoho token endpoint failed: {} - {}", status, truncate(&body));
            return Err(RumError::Token(format!("HTTP {}", status)));
        }

        let token: TokenResponse = res
            .json()
            .await
            .map_err(|e| RumError::Token(format!("unreadable token response: {}", e)))?;
        match token {
            TokenResponse { access_token: Some(t), .. } if !t.is_empty() => Ok(t),
            TokenResponse { error: Some(e), .. } => Err(RumError::Token(e)),
            _ => Err(RumError::Token("response carried no access_token".to_string())),
        }
    }

    /// Fetch the average-response-time listing for one monitor. Not retried.
    pub async fn fetch_rum_data(&self, monitor_id: &str, token: &str) -> Result<Value> {
        let url = self.rum_url(monitor_id);
        debug!("GET {}", url);
        let res = self
            .http
            .get(&url)
            .header(AUTHORIZATION, format!("Zoho-oauthtoken {}", token))
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| RumError::fetch(monitor_id, e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| RumError::fetch(monitor_id, e))?;
        if !status.is_success() {
            return Err(RumError::fetch(
                monitor_id,
                format!("HTTP {}: {}", status, truncate(&body)),
            ));
        }
        serde_json::from_str(&body).map_err(|source| RumError::Decode {
            monitor_id: monitor_id.to_string(),
            source,
        })
    }
}

#[async_trait]
impl RumSource for ZohoClient {
    async fn fetch(&self, monitor: &Monitor, token: &str) -> Result<Value> {
        self.fetch_rum_data(&monitor.id, token).await
    }
}

fn truncate(body: &str) -> String {
    if body.chars().count() <= ERROR_BODY_LIMIT {
        body.to_string()
    } else {
        let head: String = body.chars().take(ERROR_BODY_LIMIT).collect();
        format!("{}…", head)
    }
}
