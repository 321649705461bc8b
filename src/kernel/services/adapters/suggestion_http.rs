//! Completion endpoint client.

use async_trait::async_trait;
use reqwest::{Client, Response};
use std::time::Duration;
use url::Url;

use crate::kernel::services::ports::{
    SuggestionError, SuggestionProvider, SuggestionRequest, SuggestionResponse, SuggestionSettings,
};

pub struct HttpSuggestionProvider {
    client: Client,
    endpoint: Url,
}

impl HttpSuggestionProvider {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, SuggestionError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SuggestionError::Network(e.to_string()))?;
        Ok(Self { client, endpoint })
    }

    pub fn from_settings(settings: &SuggestionSettings) -> Result<Self, SuggestionError> {
        let endpoint = Url::parse(&settings.endpoint).map_err(|e| {
            SuggestionError::Network(format!("invalid endpoint {}: {e}", settings.endpoint))
        })?;
        Self::new(endpoint, settings.request_timeout())
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn read_response(response: Response) -> Result<Option<String>, SuggestionError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SuggestionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| SuggestionError::Network(e.to_string()))?;
        let parsed: SuggestionResponse =
            serde_json::from_str(&body).map_err(|e| SuggestionError::Decode(e.to_string()))?;
        Ok(parsed.suggestion)
    }
}

#[async_trait]
impl SuggestionProvider for HttpSuggestionProvider {
    async fn suggest(&self, request: &SuggestionRequest) -> Result<Option<String>, SuggestionError> {
        tracing::debug!(
            url = %self.endpoint,
            file = %request.file_name,
            line = request.cursor_line,
            column = request.cursor_column,
            "requesting code suggestion"
        );
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| SuggestionError::Network(e.to_string()))?;
        Self::read_response(response).await
    }
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/adapters/suggestion_http.rs"]
mod tests;
