//! Authenticated JSON-over-HTTP transport with bounded retry.
//!
//! Every request carries the bearer token, JSON content headers and a fixed
//! user agent. Transport failures and 5xx responses are retried on a fixed
//! backoff schedule; 4xx responses are terminal. A cancellation token bound
//! to the client aborts both in-flight attempts and inter-retry waits.

use std::sync::Arc;

use agentic_core::mask_api_key;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, ClientBuilder, Method};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::error::{ApiError, ClientError, Result};

/// Fixed client identifier sent as the user agent.
pub const USER_AGENT: &str = concat!("agentic-sync/", env!("CARGO_PKG_VERSION"));

/// Health endpoint used by [`PlatformClient::ping`].
pub const HEALTH_PATH: &str = "/api/health";

/// A successful (2xx) response with its body read.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,

    /// Raw body text
    pub body: String,
}

impl ApiResponse {
    /// Decode the body; an empty body decodes as JSON `null`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        let text = if self.body.trim().is_empty() {
            "null"
        } else {
            self.body.as_str()
        };
        Ok(serde_json::from_str(text)?)
    }

    fn require_status(self, accepted: &[u16]) -> Result<Self> {
        if accepted.contains(&self.status) {
            Ok(self)
        } else {
            Err(ApiError::from_body(self.status, &self.body).into())
        }
    }
}

/// Platform HTTP client.
///
/// Cheap to clone; clones share the connection pool and configuration.
#[derive(Clone)]
pub struct PlatformClient {
    http: Client,
    config: Arc<ClientConfig>,
    cancel: CancellationToken,
}

impl std::fmt::Debug for PlatformClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformClient")
            .field("base_url", &self.config.base_url)
            .field("api_key", &mask_api_key(&self.config.api_key))
            .finish()
    }
}

impl PlatformClient {
    /// Build a client, rejecting malformed configuration up front.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let http = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;

        debug!(
            "Created platform client for {} with key {}",
            config.base_url,
            mask_api_key(&config.api_key)
        );

        Ok(Self {
            http,
            config: Arc::new(config),
            cancel: CancellationToken::new(),
        })
    }

    /// A handle whose requests abort when `token` is cancelled.
    pub fn with_cancellation(&self, token: CancellationToken) -> Self {
        Self {
            http: self.http.clone(),
            config: Arc::clone(&self.config),
            cancel: token,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Platform base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    /// Send a request, retrying transport failures and 5xx responses.
    ///
    /// Returns the response for any 2xx status. A 4xx status comes back
    /// immediately as [`ClientError::Api`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        // Serialized once so every attempt re-sends the same bytes.
        let payload = body.map(serde_json::to_vec).transpose()?;
        let url = self.url(path);
        let attempts = self.config.max_retries + 1;
        let mut last_error = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                let delay = self.config.delay_for(attempt - 1);
                debug!("Retrying {} {} in {:?} (attempt {}/{})", method, path, delay, attempt + 1, attempts);
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return Err(ClientError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            match self.send_once(&method, &url, payload.as_deref()).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_transient() => {
                    warn!("{} {} failed (attempt {}/{}): {}", method, path, attempt + 1, attempts, err);
                    last_error = Some(err);
                }
                Err(err) => return Err(err),
            }
        }

        match last_error {
            Some(last) => Err(ClientError::RetriesExhausted {
                attempts,
                last: Box::new(last),
            }),
            None => Err(ClientError::Config("retry loop made no attempts".to_string())),
        }
    }

    async fn send_once(&self, method: &Method, url: &str, payload: Option<&[u8]>) -> Result<ApiResponse> {
        if self.cancel.is_cancelled() {
            return Err(ClientError::Cancelled);
        }

        let mut builder = self
            .http
            .request(method.clone(), url)
            .bearer_auth(&self.config.api_key)
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json");
        if let Some(bytes) = payload {
            builder = builder.body(bytes.to_vec());
        }

        let exchange = async {
            let response = builder.send().await?;
            let status = response.status().as_u16();
            let body = response.text().await?;
            Ok::<_, ClientError>((status, body))
        };

        let (status, body) = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(ClientError::Cancelled),
            result = exchange => result?,
        };

        debug!("{} {} -> {}", method, url, status);

        if (200..300).contains(&status) {
            Ok(ApiResponse { status, body })
        } else {
            Err(ApiError::from_body(status, &body).into())
        }
    }

    /// GET and decode a 200 response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request(Method::GET, path, None)
            .await?
            .require_status(&[200])?
            .json()
    }

    /// POST `body` and decode a 200 or 201 response.
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.request(Method::POST, path, Some(&body))
            .await?
            .require_status(&[200, 201])?
            .json()
    }

    /// PATCH `body` and decode a 200 response.
    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let body = serde_json::to_value(body)?;
        self.request(Method::PATCH, path, Some(&body))
            .await?
            .require_status(&[200])?
            .json()
    }

    /// DELETE, accepting 200 or 204.
    pub async fn delete(&self, path: &str) -> Result<()> {
        self.request(Method::DELETE, path, None)
            .await?
            .require_status(&[200, 204])?;
        Ok(())
    }

    /// Single-attempt health check; anything but 200 is a failure.
    pub async fn ping(&self) -> Result<()> {
        self.send_once(&Method::GET, &self.url(HEALTH_PATH), None)
            .await?
            .require_status(&[200])?;
        Ok(())
    }

    /// GET without retries; for best-effort lookups that must not stall.
    pub async fn get_once<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_once(&Method::GET, &self.url(path), None)
            .await?
            .require_status(&[200])?
            .json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::{Duration, Instant};
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const KEY: &str = "ap_user_testkey123";

    fn client_for(server: &MockServer) -> PlatformClient {
        let config = ClientConfig::new(KEY)
            .with_base_url(server.uri())
            .with_backoff(vec![
                Duration::from_millis(10),
                Duration::from_millis(20),
                Duration::from_millis(40),
            ]);
        PlatformClient::new(config).unwrap()
    }

    async fn request_count(server: &MockServer) -> usize {
        server.received_requests().await.unwrap().len()
    }

    #[test]
    fn test_new_rejects_malformed_key() {
        let err = PlatformClient::new(ClientConfig::new("bogus")).unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn test_sends_auth_and_json_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/things"))
            .and(header("authorization", format!("Bearer {KEY}").as_str()))
            .and(header("content-type", "application/json"))
            .and(header("accept", "application/json"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let value: Value = client_for(&server).get("/api/v1/things").await.unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_retries_server_errors_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2])))
            .mount(&server)
            .await;

        let value: Vec<u32> = client_for(&server).get("/flaky").await.unwrap();
        assert_eq!(value, vec![1, 2]);
        assert_eq!(request_count(&server).await, 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .mount(&server)
            .await;

        let err = client_for(&server).get::<Value>("/down").await.unwrap_err();
        match err {
            ClientError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 4);
                assert_eq!(last.status(), Some(503));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            request_count(&server).await,
            1 + crate::config::DEFAULT_MAX_RETRIES as usize
        );
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_json(json!({"error": {"message": "bad status", "code": "invalid_status"}})),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .patch::<_, Value>("/api/v1/tasks/t1", &json!({"status": "processing"}))
            .await
            .unwrap_err();
        match err {
            ClientError::Api(api) => {
                assert_eq!(api.status, 422);
                assert_eq!(api.message, "bad status");
                assert_eq!(api.code.as_deref(), Some("invalid_status"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(request_count(&server).await, 1);
    }

    #[tokio::test]
    async fn test_body_resent_on_every_attempt() {
        let server = MockServer::start().await;
        let payload = json!({"status": "pending"});
        Mock::given(method("PATCH"))
            .and(body_json(&payload))
            .respond_with(ResponseTemplate::new(502))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(body_json(&payload))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let _: Value = client_for(&server).patch("/api/v1/tasks/t9", &payload).await.unwrap();
        assert_eq!(request_count(&server).await, 2);
    }

    #[tokio::test]
    async fn test_cancel_during_backoff_returns_promptly() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let config = ClientConfig::new(KEY)
            .with_base_url(server.uri())
            .with_backoff(vec![Duration::from_secs(5)]);
        let token = CancellationToken::new();
        let client = PlatformClient::new(config).unwrap().with_cancellation(token.clone());

        let canceller = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            token.cancel();
        });

        let started = Instant::now();
        let err = client.get::<Value>("/slow").await.unwrap_err();
        canceller.await.unwrap();

        assert!(matches!(err, ClientError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(request_count(&server).await, 1);
    }

    #[tokio::test]
    async fn test_post_and_delete_status_sets() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "n1"})))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let created: Value = client.post("/api/v1/notes", &json!({"text": "hi"})).await.unwrap();
        assert_eq!(created["id"], "n1");
        client.delete("/api/v1/notes/n1").await.unwrap();

        // 204 is not an accepted status for GET
        let err = client.get::<Value>("/api/v1/notes").await.unwrap_err();
        assert_eq!(err.status(), Some(204));
    }

    #[tokio::test]
    async fn test_ping_is_single_attempt() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(HEALTH_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        assert!(client_for(&server).ping().await.is_err());
        assert_eq!(request_count(&server).await, 1);
    }

    #[tokio::test]
    async fn test_connection_refused_is_retried() {
        // Reserve a free port, then release it so connections are refused.
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let config = ClientConfig::new(KEY)
            .with_base_url(format!("http://{addr}"))
            .with_max_retries(1)
            .with_backoff(vec![Duration::from_millis(5)]);
        let err = PlatformClient::new(config)
            .unwrap()
            .get::<Value>("/anything")
            .await
            .unwrap_err();

        match err {
            ClientError::RetriesExhausted { attempts, last } => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, ClientError::Transport(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
