use super::models::OAuthToken;
use crate::config::Config;
use crate::error::{auth_error, google_calendar_error, AppResult};
use chrono::Utc;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Owns the OAuth token of one session
pub struct TokenManager {
    config: Arc<Config>,
    client: Client,
    token: Option<OAuthToken>,
}

impl TokenManager {
    pub fn new(config: Arc<Config>, client: Client) -> Self {
        Self {
            config,
            client,
            token: None,
        }
    }

    /// Authorization URL the browser is sent to for sign in
    pub fn authorization_url(config: &Config, state: &str) -> AppResult<String> {
        let mut url = Url::parse(&config.google_auth_url)
            .map_err(|e| auth_error(&format!("Failed to parse auth URL: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &config.google_client_id)
            .append_pair("redirect_uri", &config.google_redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("access_type", "offline")
            .append_pair("scope", &config.google_scope)
            .append_pair("state", state);

        Ok(url.to_string())
    }

    /// Exchange an authorization code for tokens
    pub async fn exchange_code(&mut self, code: &str) -> AppResult<()> {
        let params = [
            ("client_id", self.config.google_client_id.clone()),
            ("client_secret", self.config.google_client_secret.clone()),
            ("code", code.to_string()),
            ("redirect_uri", self.config.google_redirect_uri.clone()),
            ("grant_type", "authorization_code".to_string()),
        ];

        let response = self.post_token(&params, "exchange authorization code").await?;
        self.token = Some(OAuthToken::from_response(&response, None, Utc::now())?);

        info!("Obtained Google access token");
        Ok(())
    }

    /// Current access token, refreshed once if it has expired
    pub async fn access_token(&mut self) -> AppResult<String> {
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| google_calendar_error("Not signed in"))?;

        if !token.is_expired(Utc::now()) {
            return Ok(token.access_token.clone());
        }

        let refresh_token = token
            .refresh_token
            .clone()
            .ok_or_else(|| auth_error("Access token expired and no refresh token is available"))?;

        debug!("Access token expired, refreshing");
        let params = [
            ("client_id", self.config.google_client_id.clone()),
            ("client_secret", self.config.google_client_secret.clone()),
            ("refresh_token", refresh_token.clone()),
            ("grant_type", "refresh_token".to_string()),
        ];

        let response = self.post_token(&params, "refresh token").await?;
        let token = OAuthToken::from_response(&response, Some(refresh_token), Utc::now())?;
        let access_token = token.access_token.clone();
        self.token = Some(token);

        Ok(access_token)
    }

    /// Forget the token
    pub fn clear(&mut self) {
        self.token = None;
    }

    async fn post_token(&self, params: &[(&str, String)], action: &str) -> AppResult<Value> {
        let response = self
            .client
            .post(&self.config.google_token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to {}: {}", action, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(auth_error(&format!(
                "Failed to {}: HTTP {} - {}",
                action, status, error_body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| google_calendar_error(&format!("Failed to parse token response: {}", e)))
    }
}
