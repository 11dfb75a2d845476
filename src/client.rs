// Vacancy API client: single-attempt, timeout-bounded fetches with a per-key
// TTL response cache in front of the backend

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{CacheConfig, CacheStats, ResponseCache};
use crate::config::ClientConfig;
use crate::error::{ApiError, ClientError};
use crate::request::{self, RequestOptions};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportError};

const ERROR_BODY_PREVIEW_CHARS: usize = 200;

#[derive(Debug, Default)]
struct ClientCounters {
    requests_sent: AtomicUsize,
    requests_succeeded: AtomicUsize,
    requests_failed: AtomicUsize,
    requests_timeout: AtomicUsize,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
    total_response_time_us: AtomicU64,
    timed_responses: AtomicUsize,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClientStats {
    pub requests_sent: usize,
    pub requests_succeeded: usize,
    pub requests_failed: usize,
    pub requests_timeout: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub cached_entries: usize,
    pub average_response_time_ms: f64,
}

// Decides whether a freshly received payload is usable. A payload it rejects
// is returned as that error and never reaches the cache.
pub type PayloadCheck = dyn Fn(&Value) -> Result<(), ApiError> + Send + Sync;

// What callers (and `VacancyService`) need from a client. Implemented by
// `VacancyApiClient`; tests can substitute their own.
#[async_trait]
pub trait VacancyApi: Send + Sync + 'static {
    async fn fetch(&self, path: &str, options: RequestOptions) -> Result<Value, ApiError> {
        let accept_all = |_: &Value| -> Result<(), ApiError> { Ok(()) };
        self.fetch_validated(path, options, &accept_all).await
    }

    // Like `fetch`, but `check` runs on network payloads before they are cached.
    // Cache hits were checked when stored and are returned as-is.
    async fn fetch_validated(
        &self,
        path: &str,
        options: RequestOptions,
        check: &PayloadCheck,
    ) -> Result<Value, ApiError>;

    fn cache_key(&self, path: &str, options: &RequestOptions) -> Result<String, ApiError>;

    fn get_cache_stats(&self, key: &str) -> CacheStats;

    fn invalidate(&self, key: &str) -> bool;

    fn clear_cache(&self) -> usize;

    fn stats(&self) -> ClientStats;
}

pub struct VacancyApiClient<T: HttpTransport = ReqwestTransport> {
    config: ClientConfig,
    transport: T,
    cache: ResponseCache,
    counters: ClientCounters,
}

impl VacancyApiClient<ReqwestTransport> {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .user_agent(concat!("vacancy-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Self::with_transport(config, ReqwestTransport::with_client(http))
    }
}

impl<T: HttpTransport> VacancyApiClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ClientError> {
        config.validate()?;

        let cache = ResponseCache::new(CacheConfig {
            default_ttl: config.cache_ttl,
            max_entries: config.max_cache_entries,
        });

        info!(
            base_url = %config.base_url,
            timeout_ms = config.timeout.as_millis() as u64,
            cache_ttl_ms = config.cache_ttl.as_millis() as u64,
            "vacancy API client initialized"
        );

        Ok(Self {
            config,
            transport,
            cache,
            counters: ClientCounters::default(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn cache_stats_at(&self, key: &str, now: Instant) -> CacheStats {
        self.cache.stats_at(key, now)
    }

    pub async fn fetch_json<R: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<R, ApiError> {
        let fits_shape = |payload: &Value| -> Result<(), ApiError> {
            R::deserialize(payload)?;
            Ok(())
        };
        let payload = self.fetch_payload(path, options, &fits_shape).await?;
        Ok(serde_json::from_value(payload)?)
    }

    async fn fetch_payload(
        &self,
        path: &str,
        options: RequestOptions,
        check: &PayloadCheck,
    ) -> Result<Value, ApiError> {
        let prepared = request::prepare(&self.config.base_url, path, &options)?;
        let key = prepared.cache_key;

        if !options.refresh {
            if let Some(payload) = self.cache.get(&key) {
                self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "cache hit");
                return Ok(payload);
            }
        }
        self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);

        let timeout = options.timeout.unwrap_or(self.config.timeout);
        let http_request = HttpRequest {
            method: options.method,
            url: prepared.url,
            headers: options.headers,
        };

        debug!(
            method = %http_request.method,
            url = %http_request.url,
            timeout_ms = timeout.as_millis() as u64,
            "sending request"
        );

        let response = self.send(http_request, timeout).await?;

        if !response.is_success() {
            self.counters.requests_failed.fetch_add(1, Ordering::Relaxed);
            let message = error_message(&response);
            warn!(key = %key, status = response.status, %message, "request failed");
            return Err(ApiError::RequestFailed {
                status: Some(response.status),
                message,
            });
        }

        let payload: Value = match serde_json::from_slice(&response.body) {
            Ok(payload) => payload,
            Err(e) => {
                self.counters.requests_failed.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %e, "response body is not valid JSON");
                return Err(ApiError::ParseError(e.to_string()));
            }
        };

        if let Err(e) = check(&payload) {
            self.counters.requests_failed.fetch_add(1, Ordering::Relaxed);
            warn!(key = %key, error = %e, "response payload rejected, not cached");
            return Err(e);
        }

        self.cache.store(&key, payload.clone());
        self.counters
            .requests_succeeded
            .fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, "response cached");

        Ok(payload)
    }

    // One attempt, bounded by `timeout`. Dropping the transport future on
    // expiry aborts the in-flight request.
    async fn send(&self, request: HttpRequest, timeout: Duration) -> Result<HttpResponse, ApiError> {
        let timeout_ms = timeout.as_millis() as u64;
        self.counters.requests_sent.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();

        let outcome = tokio::time::timeout(timeout, self.transport.send(request)).await;

        match outcome {
            Ok(Ok(response)) => {
                self.record_response_time(started.elapsed());
                Ok(response)
            }
            Ok(Err(TransportError::Network(message))) => {
                self.counters.requests_failed.fetch_add(1, Ordering::Relaxed);
                warn!(%message, "network error");
                Err(ApiError::RequestFailed {
                    status: None,
                    message,
                })
            }
            Ok(Err(TransportError::Timeout)) | Err(_) => {
                self.counters
                    .requests_timeout
                    .fetch_add(1, Ordering::Relaxed);
                warn!(timeout_ms, "request timed out");
                Err(ApiError::Timeout(timeout_ms))
            }
        }
    }

    fn record_response_time(&self, elapsed: Duration) {
        self.counters
            .total_response_time_us
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        self.counters.timed_responses.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl<T: HttpTransport> VacancyApi for VacancyApiClient<T> {
    async fn fetch_validated(
        &self,
        path: &str,
        options: RequestOptions,
        check: &PayloadCheck,
    ) -> Result<Value, ApiError> {
        self.fetch_payload(path, options, check).await
    }

    fn cache_key(&self, path: &str, options: &RequestOptions) -> Result<String, ApiError> {
        Ok(request::prepare(&self.config.base_url, path, options)?.cache_key)
    }

    fn get_cache_stats(&self, key: &str) -> CacheStats {
        self.cache.stats(key)
    }

    fn invalidate(&self, key: &str) -> bool {
        self.cache.remove(key)
    }

    fn clear_cache(&self) -> usize {
        let removed = self.cache.clear();
        info!(removed, "response cache cleared");
        removed
    }

    fn stats(&self) -> ClientStats {
        let timed = self.counters.timed_responses.load(Ordering::Relaxed);
        let total_us = self.counters.total_response_time_us.load(Ordering::Relaxed);
        let average_response_time_ms = if timed == 0 {
            0.0
        } else {
            total_us as f64 / timed as f64 / 1000.0
        };

        ClientStats {
            requests_sent: self.counters.requests_sent.load(Ordering::Relaxed),
            requests_succeeded: self.counters.requests_succeeded.load(Ordering::Relaxed),
            requests_failed: self.counters.requests_failed.load(Ordering::Relaxed),
            requests_timeout: self.counters.requests_timeout.load(Ordering::Relaxed),
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.counters.cache_misses.load(Ordering::Relaxed),
            cached_entries: self.cache.len(),
            average_response_time_ms,
        }
    }
}

// Prefer the backend's own `error` field; fall back to a prefix of the body
fn error_message(response: &HttpResponse) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(&response.body) {
        if let Some(Value::String(error)) = map.get("error") {
            return error.clone();
        }
    }

    let text = String::from_utf8_lossy(&response.body);
    if text.trim().is_empty() {
        return format!("HTTP {}", response.status);
    }
    text.chars().take(ERROR_BODY_PREVIEW_CHARS).collect()
}
