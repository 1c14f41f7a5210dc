//! Firestore REST API client.
//!
//! - Cached service-account tokens, refreshed on `ACCESS_TOKEN_EXPIRED`
//! - Pooled HTTP client with connect and request timeouts
//! - Exponential backoff with jitter for 429/5xx/network errors
//! - A tracing span and latency metrics per request

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, Method, Response, StatusCode};
use tracing::{debug, info_span, Instrument};

use crate::error::{FirestoreError, FirestoreResult};
use crate::metrics::{record_query_documents, record_request};
use crate::retry::{with_retry, RetryConfig};
use crate::store::{DocumentStore, Query};
use crate::token_cache::{TokenCache, TokenSource};
use crate::types::{Document, Fields, RunQueryRequest, RunQueryResponse, StructuredQuery};

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    /// Usually "(default)"
    pub database_id: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub retry: RetryConfig,
    /// `host:port` of a local emulator; disables service-account auth
    pub emulator_host: Option<String>,
}

impl FirestoreConfig {
    pub fn from_env() -> FirestoreResult<Self> {
        let project_id = std::env::var("GCP_PROJECT_ID")
            .or_else(|_| std::env::var("FIREBASE_PROJECT_ID"))
            .map_err(|_| {
                FirestoreError::auth_error("GCP_PROJECT_ID or FIREBASE_PROJECT_ID must be set")
            })?;

        if project_id.trim().is_empty() {
            return Err(FirestoreError::auth_error(
                "GCP_PROJECT_ID or FIREBASE_PROJECT_ID cannot be empty",
            ));
        }

        let secs = |key: &str, default: u64| -> Duration {
            Duration::from_secs(
                std::env::var(key)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(default),
            )
        };

        Ok(Self {
            project_id,
            database_id: std::env::var("FIRESTORE_DATABASE_ID")
                .unwrap_or_else(|_| "(default)".to_string()),
            timeout: secs("FIRESTORE_TIMEOUT_SECS", 30),
            connect_timeout: secs("FIRESTORE_CONNECT_TIMEOUT_SECS", 5),
            retry: RetryConfig::from_env(),
            emulator_host: std::env::var("FIRESTORE_EMULATOR_HOST")
                .ok()
                .filter(|h| !h.is_empty()),
        })
    }

    fn base_url(&self) -> String {
        match &self.emulator_host {
            Some(host) => format!(
                "http://{}/v1/projects/{}/databases/{}/documents",
                host, self.project_id, self.database_id
            ),
            None => format!(
                "https://firestore.googleapis.com/v1/projects/{}/databases/{}/documents",
                self.project_id, self.database_id
            ),
        }
    }
}

// =============================================================================
// Client
// =============================================================================

#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    config: FirestoreConfig,
    base_url: String,
    token_cache: Arc<TokenCache>,
}

impl FirestoreClient {
    pub async fn new(config: FirestoreConfig) -> FirestoreResult<Self> {
        let source = match config.emulator_host {
            Some(_) => TokenSource::Static("owner".to_string()),
            None => TokenSource::Provider(Self::create_auth_provider()?),
        };
        let base_url = config.base_url();
        Self::with_base_url(config, base_url, source)
    }

    /// Build against an explicit documents root, e.g. a mock server.
    pub fn with_base_url(
        config: FirestoreConfig,
        base_url: impl Into<String>,
        source: TokenSource,
    ) -> FirestoreResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("c4m-firestore/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FirestoreError::Network)?;

        Ok(Self {
            http,
            config,
            base_url: base_url.into(),
            token_cache: Arc::new(TokenCache::new(source)),
        })
    }

    pub async fn from_env() -> FirestoreResult<Self> {
        Self::new(FirestoreConfig::from_env()?).await
    }

    fn create_auth_provider() -> FirestoreResult<Arc<dyn TokenProvider>> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            FirestoreError::auth_error(format!("Failed to load service account: {}", e))
        })?;

        match service_account {
            Some(sa) => Ok(Arc::new(sa)),
            None => Err(FirestoreError::auth_error(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file.",
            )),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.config.project_id
    }

    fn document_path(&self, collection: &str, doc_id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            collection,
            urlencoding::encode(doc_id)
        )
    }

    fn is_access_token_expired(body: &str) -> bool {
        body.contains("ACCESS_TOKEN_EXPIRED") || body.contains("\"UNAUTHENTICATED\"")
    }

    // =========================================================================
    // CRUD Operations
    // =========================================================================

    pub async fn get_document(&self, collection: &str, doc_id: &str) -> FirestoreResult<Option<Document>> {
        let url = self.document_path(collection, doc_id);
        let (this, url) = (self, url.as_str());

        self.execute("get_document", collection, Some(doc_id), move || async move {
            let response = this.send(Method::GET, url, None).await?;
            match response.status() {
                StatusCode::OK => Ok(Some(response.json().await?)),
                StatusCode::NOT_FOUND => Ok(None),
                status => Err(Self::error_from_response(status, url, response).await),
            }
        })
        .await
    }

    pub async fn create_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: Fields,
    ) -> FirestoreResult<Document> {
        let url = format!(
            "{}/{}?documentId={}",
            self.base_url,
            collection,
            urlencoding::encode(doc_id)
        );
        let body = serde_json::to_value(Document::new(fields))?;
        let (this, url, body) = (self, url.as_str(), &body);

        self.execute("create_document", collection, Some(doc_id), move || async move {
            let response = this.send(Method::POST, url, Some(body)).await?;
            match response.status() {
                StatusCode::OK | StatusCode::CREATED => Ok(response.json().await?),
                StatusCode::CONFLICT => Err(FirestoreError::AlreadyExists(format!(
                    "{}/{}",
                    collection, doc_id
                ))),
                status => Err(Self::error_from_response(status, url, response).await),
            }
        })
        .await
    }

    /// Patch an existing document.
    ///
    /// The `currentDocument.exists` precondition keeps a PATCH from creating
    /// a missing document.
    pub async fn update_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: Fields,
        update_mask: Option<Vec<String>>,
    ) -> FirestoreResult<Document> {
        let mut params: Vec<String> = update_mask
            .unwrap_or_default()
            .iter()
            .map(|f| format!("updateMask.fieldPaths={}", urlencoding::encode(f)))
            .collect();
        params.push("currentDocument.exists=true".to_string());
        let url = format!("{}?{}", self.document_path(collection, doc_id), params.join("&"));

        let body = serde_json::to_value(Document::new(fields))?;
        let (this, url, body) = (self, url.as_str(), &body);

        self.execute("update_document", collection, Some(doc_id), move || async move {
            let response = this.send(Method::PATCH, url, Some(body)).await?;
            match response.status() {
                StatusCode::OK => Ok(response.json().await?),
                StatusCode::NOT_FOUND => Err(FirestoreError::not_found(format!(
                    "{}/{}",
                    collection, doc_id
                ))),
                status => Err(Self::error_from_response(status, url, response).await),
            }
        })
        .await
    }

    /// Delete a document. A missing document counts as deleted.
    pub async fn delete_document(&self, collection: &str, doc_id: &str) -> FirestoreResult<()> {
        let url = self.document_path(collection, doc_id);
        let (this, url) = (self, url.as_str());

        self.execute("delete_document", collection, Some(doc_id), move || async move {
            let response = this.send(Method::DELETE, url, None).await?;
            match response.status() {
                StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
                StatusCode::NOT_FOUND => {
                    debug!(collection, doc_id, "Document already deleted");
                    Ok(())
                }
                status => Err(Self::error_from_response(status, url, response).await),
            }
        })
        .await
    }

    // =========================================================================
    // Query Operations
    // =========================================================================

    /// Run a structured query against top-level collections.
    pub async fn run_query(&self, query: StructuredQuery) -> FirestoreResult<Vec<Document>> {
        let collection = query
            .from
            .first()
            .map(|c| c.collection_id.clone())
            .unwrap_or_default();
        let url = format!("{}:runQuery", self.base_url);
        let body = serde_json::to_value(RunQueryRequest {
            structured_query: query,
        })?;
        let (this, url, body) = (self, url.as_str(), &body);

        let docs = self
            .execute("run_query", &collection, None, move || async move {
                let response = this.send(Method::POST, url, Some(body)).await?;
                match response.status() {
                    StatusCode::OK => {
                        let text = response.text().await.unwrap_or_default();
                        let rows: Vec<RunQueryResponse> = serde_json::from_str(&text).map_err(|e| {
                            FirestoreError::request_failed(format!(
                                "Failed to parse runQuery response: {} (body prefix: {})",
                                e,
                                text.chars().take(200).collect::<String>()
                            ))
                        })?;
                        Ok(rows.into_iter().filter_map(|r| r.document).collect::<Vec<_>>())
                    }
                    status => Err(Self::error_from_response(status, url, response).await),
                }
            })
            .await?;

        record_query_documents(&collection, docs.len());
        Ok(docs)
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Send one authorized request, refreshing the token once on expiry.
    async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> FirestoreResult<Response> {
        let build = |token: &str| {
            let req = self.http.request(method.clone(), url).bearer_auth(token);
            match body {
                Some(b) => req.json(b),
                None => req,
            }
        };

        let token = self.token_cache.get_token().await?;
        let response = build(&token).send().await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        if !Self::is_access_token_expired(&text) {
            return Err(FirestoreError::from_http_status(
                401,
                format!("{} failed: {}", url, text),
            ));
        }

        self.token_cache.invalidate().await;
        let token = self.token_cache.get_token().await?;
        Ok(build(&token).send().await?)
    }

    /// Run a request with retry, a tracing span and metrics.
    async fn execute<T, F, Fut>(
        &self,
        operation: &str,
        collection: &str,
        doc_id: Option<&str>,
        op: F,
    ) -> FirestoreResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = FirestoreResult<T>>,
    {
        let span = match doc_id {
            Some(id) => info_span!("firestore_request", operation = %operation, collection = %collection, doc_id = %id),
            None => info_span!("firestore_request", operation = %operation, collection = %collection),
        };

        let start = Instant::now();
        let result = with_retry(&self.config.retry, operation, op)
            .instrument(span)
            .await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn error_from_response(status: StatusCode, url: &str, response: Response) -> FirestoreError {
        let retry_after_ms = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(|secs| secs * 1000);
        let body = response.text().await.unwrap_or_default();

        match (status, retry_after_ms) {
            (StatusCode::TOO_MANY_REQUESTS, Some(ms)) => FirestoreError::RateLimited(ms),
            _ => FirestoreError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body)),
        }
    }
}

// =============================================================================
// DocumentStore
// =============================================================================

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn get(&self, collection: &str, id: &str) -> FirestoreResult<Option<Document>> {
        self.get_document(collection, id).await
    }

    async fn create(&self, collection: &str, id: &str, fields: Fields) -> FirestoreResult<Document> {
        self.create_document(collection, id, fields).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
        mask: Option<Vec<String>>,
    ) -> FirestoreResult<Document> {
        self.update_document(collection, id, fields, mask).await
    }

    async fn delete(&self, collection: &str, id: &str) -> FirestoreResult<()> {
        self.delete_document(collection, id).await
    }

    async fn query(&self, collection: &str, query: Query) -> FirestoreResult<Vec<Document>> {
        self.run_query(query.to_structured(collection)).await
    }
}

// =============================================================================
// Tests
// =============================================================================
