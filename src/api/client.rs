//! Remote mark API
//!
//! [`MarkApi`] is the boundary the mutation pipeline talks to. [`HttpMarkApi`]
//! implements it over HTTP against the mark service in `routes`.

use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::annotations::{Mark, MarkFields, MarkId, MarkType};
use crate::cfi::Cfi;
use crate::config::ReaderConfig;

use super::error::ApiError;
use super::types::{ApiResponse, DestroyMarkParams, ErrorBody, MarkQuery, UpdateCurrentParams, UpdateMarkParams};

/// Remote mark persistence
#[async_trait]
pub trait MarkApi: Send + Sync {
    /// Persist a new mark, returning its identifier
    async fn create(&self, book_id: &str, fields: &MarkFields) -> Result<MarkId, ApiError>;

    async fn update(&self, id: &MarkId, book_id: &str, fields: &MarkFields) -> Result<(), ApiError>;

    async fn delete(&self, id: &MarkId, book_id: &str) -> Result<(), ApiError>;

    /// List a book's marks, optionally of one kind
    async fn list(&self, book_id: &str, mark_type: Option<MarkType>) -> Result<Vec<Mark>, ApiError>;

    /// Last read position, empty when none was saved
    async fn current(&self, book_id: &str) -> Result<String, ApiError>;

    async fn save_position(&self, book_id: &str, cfi: &Cfi) -> Result<(), ApiError>;
}

/// HTTP client for the mark service
#[derive(Clone)]
pub struct HttpMarkApi {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpMarkApi {
    pub fn new(config: &ReaderConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let base_url = Url::parse(&config.api_base_url)
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", config.api_base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(config.api_base_url.clone()));
        }

        Ok(Self {
            client,
            base_url,
            token: config.api_token.clone(),
        })
    }

    /// Append percent-encoded path segments to the base URL
    fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = self.authorized(request).send().await?;
        let response = check_status(response).await?;
        let body: ApiResponse<T> = response.json().await?;
        Ok(body.data)
    }
}

/// Map non-success responses onto [`ApiError`]
async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status.canonical_reason().unwrap_or("request failed").to_string(),
    };

    Err(match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthenticated,
        StatusCode::NOT_FOUND => ApiError::NotFound(message),
        _ => ApiError::Remote {
            status: status.as_u16(),
            message,
        },
    })
}

#[async_trait]
impl MarkApi for HttpMarkApi {
    async fn create(&self, book_id: &str, fields: &MarkFields) -> Result<MarkId, ApiError> {
        let mut body = fields.clone();
        body.book_id = book_id.to_string();
        tracing::debug!("Creating mark at {} for book {}", body.epubcfi, book_id);

        self.send(self.client.post(self.url(&["api", "mark", "create"])?).json(&body))
            .await
    }

    async fn update(&self, id: &MarkId, book_id: &str, fields: &MarkFields) -> Result<(), ApiError> {
        let mut fields = fields.clone();
        fields.book_id = book_id.to_string();
        let body = UpdateMarkParams {
            id: id.clone(),
            fields,
        };

        let _: MarkId = self
            .send(self.client.post(self.url(&["api", "mark", "update"])?).json(&body))
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &MarkId, book_id: &str) -> Result<(), ApiError> {
        let body = DestroyMarkParams {
            id: id.clone(),
            book_id: book_id.to_string(),
        };

        let _: MarkId = self
            .send(self.client.post(self.url(&["api", "mark", "destroy"])?).json(&body))
            .await?;
        Ok(())
    }

    async fn list(&self, book_id: &str, mark_type: Option<MarkType>) -> Result<Vec<Mark>, ApiError> {
        let query = MarkQuery {
            book_id: Some(book_id.to_string()),
            mark_type,
        };

        self.send(self.client.get(self.url(&["api", "mark"])?).query(&query))
            .await
    }

    async fn current(&self, book_id: &str) -> Result<String, ApiError> {
        self.send(self.client.get(self.url(&["api", "book", book_id])?))
            .await
    }

    async fn save_position(&self, book_id: &str, cfi: &Cfi) -> Result<(), ApiError> {
        let body = UpdateCurrentParams {
            current: cfi.to_string(),
        };

        let _: String = self
            .send(
                self.client
                    .post(self.url(&["api", "book", book_id, "update"])?)
                    .json(&body),
            )
            .await?;
        Ok(())
    }
}
