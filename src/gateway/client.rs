use crate::config::ApiConfig;
use crate::errors::GatewayError;
use crate::gateway::types::{ApiResponse, RequestOptions};
use crate::models::ErrorBody;
use crate::session_store::SessionStore;
use crate::traits::Navigator;
use chrono::Utc;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// Prefix every endpoint is appended to
pub const API_BASE_PATH: &str = "/api/v1";

/// Wraps every outbound API call.
///
/// Before sending, the persisted session is re-read; an expired session is
/// cleared and the call fails with [`GatewayError::ExpiredToken`] without
/// touching the network. A 401 carrying `{"error":"invalid_token"}` clears
/// the session and fails with [`GatewayError::InvalidToken`]. Both paths
/// redirect through the injected [`Navigator`].
pub struct ApiGateway {
    client: Client,
    base_url: String,
    store: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl ApiGateway {
    pub fn new(
        config: &ApiConfig,
        store: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, GatewayError> {
        let mut builder =
            Client::builder().user_agent(format!("eatlog/{}", env!("CARGO_PKG_VERSION")));
        if let Some(timeout_sec) = config.timeout_sec {
            builder = builder.timeout(Duration::from_secs(timeout_sec));
        }

        let client = builder.build().map_err(|e| GatewayError::Configuration {
            reason: format!("Failed to create HTTP client: {}", e),
        })?;

        Ok(ApiGateway {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            store,
            navigator,
        })
    }

    /// Full URL for `endpoint`; the endpoint is appended verbatim
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}{}{}", self.base_url, API_BASE_PATH, endpoint)
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub async fn get(&self, endpoint: &str) -> Result<ApiResponse, GatewayError> {
        self.request(endpoint, RequestOptions::get()).await
    }

    pub async fn request(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> Result<ApiResponse, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.extend(options.headers);

        if let Some(session) = self.store.load_persisted() {
            if session.is_expired_at(Utc::now()) {
                tracing::warn!("Session for {} expired, request not sent", session.identity);
                self.end_session();
                return Err(GatewayError::ExpiredToken);
            }

            let mut bearer = HeaderValue::from_str(&session.bearer_value()).map_err(|_| {
                GatewayError::InvalidHeader {
                    reason: "session token is not a valid header value".to_string(),
                }
            })?;
            bearer.set_sensitive(true);
            headers.insert(AUTHORIZATION, bearer);
        }

        let url = self.endpoint_url(endpoint);
        tracing::debug!("{} {}", options.method, url);

        let mut request_builder = self
            .client
            .request(options.method, url.as_str())
            .headers(headers);
        if let Some(body) = options.body {
            request_builder = request_builder.body(body);
        }

        let response = ApiResponse::read(request_builder.send().await?).await?;
        tracing::debug!("{} -> {}", url, response.status());

        if response.status() == StatusCode::UNAUTHORIZED {
            match response.json::<ErrorBody>() {
                Ok(body) if body.is_invalid_token() => {
                    tracing::warn!("Server rejected the session token");
                    self.end_session();
                    return Err(GatewayError::InvalidToken);
                }
                Ok(body) => tracing::debug!("401 with error '{}' passed to caller", body.error),
                Err(e) => tracing::debug!("401 without a JSON error body: {}", e),
            }
        }

        Ok(response)
    }

    /// Clears the session and redirects to the login entry point
    fn end_session(&self) {
        if let Err(e) = self.store.logout() {
            tracing::error!("Failed to clear session: {}", e);
        }
        self.navigator.navigate_to_login();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_storage::MemoryStorage;

    struct NoopNavigator;

    impl Navigator for NoopNavigator {
        fn navigate_to_login(&self) {}
    }

    fn gateway(base_url: &str) -> ApiGateway {
        let config = ApiConfig {
            base_url: base_url.to_string(),
            timeout_sec: Some(5),
        };
        let store = Arc::new(SessionStore::new(Arc::new(MemoryStorage::new())));
        ApiGateway::new(&config, store, Arc::new(NoopNavigator)).unwrap()
    }

    #[test]
    fn test_endpoint_url_appends_verbatim() {
        let gateway = gateway("http://localhost:4000");
        assert_eq!(
            gateway.endpoint_url("/items"),
            "http://localhost:4000/api/v1/items"
        );
        assert_eq!(
            gateway.endpoint_url("/items?page=2"),
            "http://localhost:4000/api/v1/items?page=2"
        );
    }

    #[test]
    fn test_endpoint_url_trims_trailing_slash() {
        let gateway = gateway("https://eatlog.example.com/");
        assert_eq!(
            gateway.endpoint_url("/me"),
            "https://eatlog.example.com/api/v1/me"
        );
    }
}
