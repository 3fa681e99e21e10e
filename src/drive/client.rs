//! Google Drive API Client
//!
//! Provides authenticated read access to Drive folders and file content
//! using a pre-provisioned offline refresh token.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::errors::DriveError;
use super::types::{DriveFile, FileList, ListQuery, PAGE_SIZE};
use super::FileStore;

/// Default Drive v3 API base URL
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Default OAuth2 token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Access tokens are renewed this long before they actually expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Offline OAuth credential used to mint access tokens
#[derive(Clone)]
pub struct DriveCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for DriveCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveCredentials")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

/// Access token plus the instant it stops being usable
#[derive(Clone)]
struct AccessToken {
    token: String,
    expires_at: Instant,
}

/// Response from the OAuth2 token endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Drive API client for making authenticated requests
#[derive(Clone)]
pub struct DriveClient {
    /// HTTP client for making requests (carries the per-call timeout)
    http_client: Client,
    /// Drive API base URL
    api_base: String,
    /// OAuth2 token endpoint
    token_url: String,
    /// Stored credentials for token exchange
    credentials: DriveCredentials,
    /// Current access token (refreshable on expiry or 401)
    token: Arc<RwLock<Option<AccessToken>>>,
    /// Held while exchanging the refresh token
    refresh_lock: Arc<Mutex<()>>,
}

impl DriveClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `credentials` - Offline OAuth credential
    /// * `api_base` - Drive API base URL
    /// * `token_url` - OAuth2 token endpoint
    /// * `timeout` - Deadline applied to every upstream call
    pub fn new(
        credentials: DriveCredentials,
        api_base: &str,
        token_url: &str,
        timeout: Duration,
    ) -> Result<Self, DriveError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DriveError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token_url: token_url.to_string(),
            credentials,
            token: Arc::new(RwLock::new(None)),
            refresh_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Cached access token, if it has not expired
    fn cached_token(&self) -> Result<Option<String>, DriveError> {
        let guard = self
            .token
            .read()
            .map_err(|_| DriveError::TokenExchange("token lock poisoned".to_string()))?;

        Ok(guard
            .as_ref()
            .filter(|t| t.expires_at > Instant::now())
            .map(|t| t.token.clone()))
    }

    /// Get a usable access token, exchanging the refresh token if needed
    ///
    /// Concurrent callers that find the token expired share one exchange.
    async fn access_token(&self) -> Result<String, DriveError> {
        if let Some(token) = self.cached_token()? {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;
        match self.cached_token()? {
            Some(token) => Ok(token),
            None => self.exchange_refresh_token().await,
        }
    }

    /// Replace a token Drive rejected, unless another caller already did
    async fn reauthorize(&self, rejected: &str) -> Result<String, DriveError> {
        let _guard = self.refresh_lock.lock().await;
        match self.cached_token()? {
            Some(token) if token != rejected => Ok(token),
            _ => self.exchange_refresh_token().await,
        }
    }

    /// Exchange the offline refresh token for a fresh access token
    ///
    /// Callers hold `refresh_lock`.
    async fn exchange_refresh_token(&self) -> Result<String, DriveError> {
        debug!("Refreshing Drive access token...");

        let body = format!(
            "client_id={}&client_secret={}&refresh_token={}&grant_type=refresh_token",
            urlencoding::encode(&self.credentials.client_id),
            urlencoding::encode(&self.credentials.client_secret),
            urlencoding::encode(&self.credentials.refresh_token),
        );

        let response = self
            .http_client
            .post(&self.token_url)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::TokenExchange(format!("{}: {}", status, body)));
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);

        let mut guard = self
            .token
            .write()
            .map_err(|_| DriveError::TokenExchange("token lock poisoned".to_string()))?;
        *guard = Some(AccessToken {
            token: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        info!(expires_in = token.expires_in, "Drive access token refreshed");
        Ok(token.access_token)
    }

    /// Send an authorized request, re-authorizing once if the token was rejected
    async fn send_authorized<F>(&self, build: F) -> Result<Response, DriveError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let token = self.access_token().await?;
        let response = build(&self.http_client).bearer_auth(&token).send().await?;

        let response = if response.status() == StatusCode::UNAUTHORIZED {
            warn!("Drive rejected access token, refreshing...");
            let token = self.reauthorize(&token).await?;
            build(&self.http_client).bearer_auth(&token).send().await?
        } else {
            response
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(DriveError::from_status(status, &body));
        }

        Ok(response)
    }

    /// List files matching a child query (single page, no pagination)
    pub async fn list_files(&self, query: &ListQuery) -> Result<Vec<DriveFile>, DriveError> {
        let url = format!("{}/files", self.api_base);
        let q = query.to_q();
        let page_size = PAGE_SIZE.to_string();

        debug!(q = %q, order = query.order.as_param(), "Listing files from Drive");

        let response = self
            .send_authorized(|http| {
                http.get(&url).query(&[
                    ("q", q.as_str()),
                    ("fields", query.fields),
                    ("orderBy", query.order.as_param()),
                    ("pageSize", page_size.as_str()),
                ])
            })
            .await?;

        let mut list: FileList = response.json().await?;
        list.files.retain(|f| query.matches_mime(&f.mime_type));

        debug!(parent = %query.parent_id, count = list.files.len(), "Listed files from Drive");
        Ok(list.files)
    }

    /// Download file content from Drive
    pub async fn download_file(&self, file_id: &str) -> Result<Vec<u8>, DriveError> {
        let url = format!("{}/files/{}", self.api_base, urlencoding::encode(file_id));

        debug!(file_id = file_id, "Downloading file from Drive");

        let response = self
            .send_authorized(|http| http.get(&url).query(&[("alt", "media")]))
            .await?;

        let bytes = response.bytes().await?;

        debug!(file_id = file_id, size = bytes.len(), "Downloaded file from Drive");
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl FileStore for DriveClient {
    async fn list_files(&self, query: &ListQuery) -> Result<Vec<DriveFile>, DriveError> {
        DriveClient::list_files(self, query).await
    }

    async fn fetch_content(&self, file_id: &str) -> Result<Vec<u8>, DriveError> {
        self.download_file(file_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::types::{DOCX_MIME, FOLDER_MIME};
    use axum::extract::{Path, Query, State};
    use axum::http::{header, HeaderMap};
    use axum::response::{IntoResponse, Response as HttpResponse};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    /// Local stand-in for the token endpoint and the Drive files API
    struct FakeDrive {
        expires_in: u64,
        /// Listing requests left to answer with 401
        rejections: AtomicUsize,
        token_bodies: StdMutex<Vec<String>>,
        listing_queries: StdMutex<Vec<HashMap<String, String>>>,
        download_queries: StdMutex<Vec<HashMap<String, String>>>,
    }

    impl FakeDrive {
        fn new(expires_in: u64) -> Arc<Self> {
            Arc::new(Self {
                expires_in,
                rejections: AtomicUsize::new(0),
                token_bodies: StdMutex::new(Vec::new()),
                listing_queries: StdMutex::new(Vec::new()),
                download_queries: StdMutex::new(Vec::new()),
            })
        }

        fn token_exchanges(&self) -> usize {
            self.token_bodies.lock().unwrap().len()
        }

        fn current_token(&self) -> String {
            format!("tok-{}", self.token_exchanges())
        }

        fn authorized(&self, headers: &HeaderMap) -> bool {
            let expected = format!("Bearer {}", self.current_token());
            let rejected = self
                .rejections
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            !rejected && headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) == Some(expected.as_str())
        }
    }

    async fn issue_token(State(drive): State<Arc<FakeDrive>>, body: String) -> Json<serde_json::Value> {
        tokio::time::sleep(Duration::from_millis(20)).await;
        drive.token_bodies.lock().unwrap().push(body);
        Json(json!({ "access_token": drive.current_token(), "expires_in": drive.expires_in }))
    }

    fn entry(id: &str, name: &str, mime: &str) -> serde_json::Value {
        json!({
            "id": id,
            "name": name,
            "mimeType": mime,
            "createdTime": "2024-02-01T10:00:00Z",
            "modifiedTime": "2024-02-01T10:00:00Z"
        })
    }

    async fn list_files(
        State(drive): State<Arc<FakeDrive>>,
        headers: HeaderMap,
        Query(params): Query<HashMap<String, String>>,
    ) -> HttpResponse {
        if !drive.authorized(&headers) {
            return (StatusCode::UNAUTHORIZED, "invalid credentials").into_response();
        }
        drive.listing_queries.lock().unwrap().push(params);
        Json(json!({
            "files": [
                entry("img", "photo.jpg", "image/jpeg"),
                entry("dir", "Nested", FOLDER_MIME),
                entry("doc", "Notes.docx", DOCX_MIME),
            ]
        }))
        .into_response()
    }

    async fn download(
        State(drive): State<Arc<FakeDrive>>,
        Path(file_id): Path<String>,
        Query(params): Query<HashMap<String, String>>,
    ) -> HttpResponse {
        drive.download_queries.lock().unwrap().push(params);
        match file_id.as_str() {
            "missing" => (StatusCode::NOT_FOUND, "File not found").into_response(),
            "flaky" => (StatusCode::BAD_GATEWAY, "upstream hiccup").into_response(),
            id => format!("bytes of {}", id).into_response(),
        }
    }

    async fn serve(drive: Arc<FakeDrive>) -> DriveClient {
        let app = Router::new()
            .route("/token", post(issue_token))
            .route("/files", get(list_files))
            .route("/files/:file_id", get(download))
            .with_state(drive);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        DriveClient::new(
            credentials(),
            &format!("http://{}", addr),
            &format!("http://{}/token", addr),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_token_exchanged_once_across_listings() {
        let drive = FakeDrive::new(3600);
        let client = serve(drive.clone()).await;

        client.list_files(&ListQuery::images("p")).await.unwrap();
        client.list_files(&ListQuery::images("p")).await.unwrap();

        assert_eq!(drive.token_exchanges(), 1);
        let body = drive.token_bodies.lock().unwrap()[0].clone();
        assert!(body.contains("grant_type=refresh_token"));
        assert!(body.contains("client_id=client"));
        assert!(body.contains("client_secret=secret"));
        assert!(body.contains("refresh_token=refresh"));
    }

    #[tokio::test]
    async fn test_token_inside_expiry_margin_is_renewed() {
        // 30s lifetime is within the renewal margin, so it is never reused
        let drive = FakeDrive::new(30);
        let client = serve(drive.clone()).await;

        client.list_files(&ListQuery::images("p")).await.unwrap();
        client.list_files(&ListQuery::images("p")).await.unwrap();

        assert_eq!(drive.token_exchanges(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_calls_share_token_exchange() {
        let drive = FakeDrive::new(3600);
        let client = serve(drive.clone()).await;
        let query = ListQuery::images("p");

        let (a, b, c) = tokio::join!(
            client.list_files(&query),
            client.list_files(&query),
            client.download_file("x")
        );
        assert!(a.is_ok() && b.is_ok() && c.is_ok());
        assert_eq!(drive.token_exchanges(), 1);
    }

    #[tokio::test]
    async fn test_rejected_token_refreshed_once() {
        let drive = FakeDrive::new(3600);
        drive.rejections.store(1, Ordering::SeqCst);
        let client = serve(drive.clone()).await;

        let files = client.list_files(&ListQuery::images("p")).await.unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(drive.token_exchanges(), 2);
    }

    #[tokio::test]
    async fn test_repeated_rejection_is_auth_error() {
        let drive = FakeDrive::new(3600);
        drive.rejections.store(10, Ordering::SeqCst);
        let client = serve(drive.clone()).await;

        let err = client.list_files(&ListQuery::images("p")).await.unwrap_err();

        assert!(matches!(err, DriveError::AuthExpired));
        assert_eq!(drive.token_exchanges(), 2);
    }

    #[tokio::test]
    async fn test_listing_sends_query_and_filters_mime() {
        let drive = FakeDrive::new(3600);
        let client = serve(drive.clone()).await;

        let files = client.list_files(&ListQuery::images("album-1")).await.unwrap();
        let ids: Vec<&str> = files.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["img"]);

        let docs = client.list_files(&ListQuery::documents("news")).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "Notes.docx");

        let queries = drive.listing_queries.lock().unwrap();
        let q = &queries[0];
        assert_eq!(
            q["q"],
            "'album-1' in parents and mimeType contains 'image/' and trashed = false"
        );
        assert_eq!(q["fields"], crate::drive::types::IMAGE_FIELDS);
        assert_eq!(q["orderBy"], "createdTime desc");
        assert_eq!(q["pageSize"], "1000");
    }

    #[tokio::test]
    async fn test_download_requests_media() {
        let drive = FakeDrive::new(3600);
        let client = serve(drive.clone()).await;

        let bytes = client.download_file("abc").await.unwrap();

        assert_eq!(bytes, b"bytes of abc".to_vec());
        assert_eq!(drive.download_queries.lock().unwrap()[0]["alt"], "media");
    }

    #[tokio::test]
    async fn test_download_status_mapping() {
        let drive = FakeDrive::new(3600);
        let client = serve(drive).await;

        let missing = client.download_file("missing").await.unwrap_err();
        assert!(matches!(missing, DriveError::NotFound(ref body) if body == "File not found"));

        let flaky = client.download_file("flaky").await.unwrap_err();
        assert!(matches!(flaky, DriveError::Server(502, _)));
    }

    fn credentials() -> DriveCredentials {
        DriveCredentials {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh".to_string(),
        }
    }

    #[test]
    fn test_token_response_default_expiry() {
        let token: TokenResponse = serde_json::from_str(r#"{"access_token":"ya29.x"}"#).unwrap();
        assert_eq!(token.access_token, "ya29.x");
        assert_eq!(token.expires_in, 3600);
    }

    #[test]
    fn test_api_base_trailing_slash_trimmed() {
        let client = DriveClient::new(
            credentials(),
            "https://example.test/drive/v3/",
            DEFAULT_TOKEN_URL,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(client.api_base, "https://example.test/drive/v3");
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let rendered = format!("{:?}", credentials());
        assert!(rendered.contains("client"));
        assert!(!rendered.contains("secret"));
        assert!(!rendered.contains("refresh"));
    }
}
