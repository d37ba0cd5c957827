//! HTTP client for the user API

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder};
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};
use crate::types::{ApiResponse, UserFixture};

/// Client for the user endpoints
///
/// Every HTTP status comes back as an [`ApiResponse`]; only transport
/// failures (DNS, connect, timeout) are errors.
pub struct ApiClient {
    client: reqwest::Client,
    config: ApiConfig,
}

impl ApiClient {
    /// Create a new client with bearer auth, JSON content type and the configured timeout
    pub fn new(config: ApiConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", config.api_key))
            .map_err(|e| ApiError::InvalidConfig(format!("api_key is not a valid header: {}", e)))?;
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// `POST /users`
    pub async fn create_user(&self, fixture: &UserFixture) -> ApiResult<ApiResponse> {
        let request = self.request(Method::POST, "users").json(fixture);
        self.send(request).await
    }

    /// `GET /users?page={page}`
    pub async fn list_users(&self, page: u32) -> ApiResult<ApiResponse> {
        let request = self
            .request(Method::GET, "users")
            .query(&[("page", page)]);
        self.send(request).await
    }

    /// `PUT /users/{id}`
    pub async fn update_user(&self, id: u64, fixture: &UserFixture) -> ApiResult<ApiResponse> {
        let request = self
            .request(Method::PUT, &format!("users/{}", id))
            .json(fixture);
        self.send(request).await
    }

    /// `DELETE /users/{id}`
    pub async fn delete_user(&self, id: u64) -> ApiResult<ApiResponse> {
        let request = self.request(Method::DELETE, &format!("users/{}", id));
        self.send(request).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.config.url(path);
        debug!("{} {}", method, url);
        self.client.request(method, url)
    }

    async fn send(&self, request: RequestBuilder) -> ApiResult<ApiResponse> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let raw_body = response.text().await?;
        debug!("-> {} ({} bytes)", status, raw_body.len());
        Ok(ApiResponse::new(status, raw_body))
    }
}
