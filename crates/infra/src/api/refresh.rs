//! Silent session refresh over the refresh-token cookie

use async_trait::async_trait;
use campus_domain::constants::NO_REFRESH_TOKEN_CODE;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use tracing::{debug, info};

use super::auth::SessionRefresh;
use crate::http::HttpClient;

#[derive(Debug, Default, Deserialize)]
struct RefreshErrorBody {
    #[serde(default)]
    code: Option<String>,
}

/// Calls the refresh endpoint with the shared cookie jar
///
/// Must share the [`HttpClient`] (and therefore the cookie store) with the
/// API client so the renewed session cookie is used by the replay.
#[derive(Debug, Clone)]
pub struct SessionRefresher {
    http: HttpClient,
    url: String,
}

impl SessionRefresher {
    /// `url` is the absolute refresh endpoint
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SessionRefresh for SessionRefresher {
    async fn refresh(&self) -> bool {
        let request =
            self.http.request(Method::POST, &self.url).header(CONTENT_TYPE, "application/json");

        let response = match self.http.send(request).await {
            Ok(response) => response,
            Err(err) => {
                debug!(error = %err, "session refresh unreachable");
                return false;
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!("session refreshed");
            return true;
        }

        if status == StatusCode::UNAUTHORIZED {
            let body: RefreshErrorBody = response.json().await.unwrap_or_default();
            if body.code.as_deref() == Some(NO_REFRESH_TOKEN_CODE) {
                debug!("no refresh token present");
            } else {
                info!("Session expired or invalid - user needs to re-login");
            }
            return false;
        }

        debug!(%status, "session refresh rejected");
        false
    }
}
