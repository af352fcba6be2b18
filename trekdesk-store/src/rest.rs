use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};
use trekdesk_core::{BatchRepository, BookingRepository, RepoResult, UserRepository};
use trekdesk_shared::{
    AdminCancelRequest, Batch, BatchUpdate, Booking, ManualBookingRequest, Masked, NewUser, User,
};
use uuid::Uuid;

use crate::app_config::BackendConfig;

#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status {
        status: u16,
        body: String,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

/// Client for the booking backend's REST endpoints
#[derive(Clone)]
pub struct RestBackend {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl RestBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, RestError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("{} {}", method, url);
        let builder = self.client.request(method, url);
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(request: RequestBuilder) -> Result<reqwest::Response, RestError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!("Backend call failed with {}: {}", status, body);
        Err(RestError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn fetch<T: DeserializeOwned>(request: RequestBuilder) -> RepoResult<T> {
        let response = Self::send(request).await?;
        Ok(response.json::<T>().await.map_err(RestError::from)?)
    }

    /// 404 maps to `None`
    async fn fetch_optional<T: DeserializeOwned>(request: RequestBuilder) -> RepoResult<Option<T>> {
        match Self::send(request).await {
            Ok(response) => Ok(Some(response.json::<T>().await.map_err(RestError::from)?)),
            Err(RestError::Status { status, .. }) if status == StatusCode::NOT_FOUND.as_u16() => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }
}

#[async_trait]
impl BatchRepository for RestBackend {
    async fn get_batch(&self, trek_id: Uuid, batch_id: Uuid) -> RepoResult<Option<Batch>> {
        Self::fetch_optional(self.request(Method::GET, &format!("treks/{trek_id}/batches/{batch_id}"))).await
    }

    async fn update_batch(&self, trek_id: Uuid, batch_id: Uuid, update: &BatchUpdate) -> RepoResult<Batch> {
        Self::fetch(
            self.request(Method::PUT, &format!("treks/{trek_id}/batches/{batch_id}"))
                .json(update),
        )
        .await
    }
}

#[async_trait]
impl BookingRepository for RestBackend {
    async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>> {
        Self::fetch_optional(self.request(Method::GET, &format!("bookings/{id}"))).await
    }

    async fn create_manual_booking(&self, request: &ManualBookingRequest) -> RepoResult<Booking> {
        Self::fetch(self.request(Method::POST, "admin/bookings").json(request)).await
    }

    async fn admin_cancel_booking(&self, request: &AdminCancelRequest) -> RepoResult<()> {
        Self::send(self.request(Method::POST, "admin/bookings/cancel").json(request)).await?;
        Ok(())
    }
}

#[async_trait]
impl UserRepository for RestBackend {
    async fn find_by_phone(&self, phone: &str) -> RepoResult<Option<User>> {
        debug!("Looking up user by phone {}", Masked(phone));
        Self::fetch_optional(self.request(Method::GET, &format!("users/by-phone/{phone}"))).await
    }

    async fn create_user(&self, user: &NewUser) -> RepoResult<User> {
        Self::fetch(self.request(Method::POST, "users").json(user)).await
    }
}
