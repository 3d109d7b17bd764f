use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, header};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::scenario::{Scenario, ScenarioParams};
use crate::store::{Result, ScenarioStore, StorageKind, StoreError};
use crate::validation::validate_params;

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Client for the scenario API of a running server
///
/// Holds the session token obtained at login and sends it as the `session`
/// cookie on every call.
pub struct RemoteScenarioStore {
    client: Client,
    base_url: String,
    token: String,
}

impl RemoteScenarioStore {
    /// Log in and return a store bound to the new session
    ///
    /// # Errors
    /// * `StoreError::Unauthorized` when the server rejects the credentials
    /// * `StoreError::Http` when the server cannot be reached
    pub async fn login(
        base_url: &str,
        username: &str,
        password: &str,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let response = client
            .post(format!("{}/api/login", base_url))
            .json(&LoginRequest { username, password })
            .send()
            .await?;
        let response = check(response).await?;
        let LoginResponse { token } = response.json().await?;

        tracing::info!(server = %base_url, user = username, "logged in to scenario server");
        Ok(RemoteScenarioStore {
            client,
            base_url,
            token,
        })
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(header::COOKIE, format!("session={}", self.token))
    }
}

/// URL of a single scenario; the id is percent-encoded so it stays one path
/// segment
fn scenario_url(base_url: &str, id: &str) -> String {
    format!("{}/api/scenarios/{}", base_url, urlencoding::encode(id))
}

/// Map non-success responses onto store errors
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(StoreError::Unauthorized);
    }
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
    };
    if status == StatusCode::NOT_FOUND {
        return Err(StoreError::NotFound(message));
    }
    Err(StoreError::Remote {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl ScenarioStore for RemoteScenarioStore {
    fn kind(&self) -> StorageKind {
        StorageKind::Remote
    }

    async fn save(&self, params: ScenarioParams) -> Result<Scenario> {
        validate_params(&params)?;
        let request = self
            .client
            .post(format!("{}/api/scenarios", self.base_url))
            .json(&params);
        let response = check(self.authed(request).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn list(&self) -> Result<Vec<Scenario>> {
        let request = self.client.get(format!("{}/api/scenarios", self.base_url));
        let response = check(self.authed(request).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        // dot segments would be collapsed by URL normalization
        if id.is_empty() || id == "." || id == ".." {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let request = self.client.delete(scenario_url(&self.base_url, id));
        check(self.authed(request).send().await?).await?;
        Ok(())
    }
}
