use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::config::NewsSettings;
use crate::error::AppError;

/// Fetches the public news feed and hands the document through untouched.
pub struct NewsClient {
    client: Client,
    url: String,
    auth_token: Option<String>,
}

impl NewsClient {
    pub fn new(settings: &NewsSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| AppError::ExternalApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: settings.url.clone(),
            auth_token: settings.auth_token.clone(),
        })
    }

    pub async fn latest(&self) -> Result<Value, AppError> {
        let mut request = self.client.get(&self.url).query(&[("public", "true")]);
        if let Some(token) = &self.auth_token {
            request = request.query(&[("auth_token", token.as_str())]);
        }

        debug!(url = %self.url, "Requesting news feed");
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(AppError::ExternalApiError(format!(
                "News feed returned status: {}",
                response.status()
            )));
        }

        Ok(response.json::<Value>().await?)
    }
}
