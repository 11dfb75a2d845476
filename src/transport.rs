// HTTP boundary of the client. `VacancyApiClient` talks to the backend only
// through `HttpTransport`, so tests can swap in the mock server below.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Method, Url};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),
}

#[async_trait]
pub trait HttpTransport: Send + Sync + 'static {
    // Perform exactly one request. Non-2xx statuses are returned as responses,
    // not errors.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Network(err.to_string())
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .header(reqwest::header::ACCEPT, "application/json");

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;

        Ok(HttpResponse { status, body })
    }
}

// Scriptable in-process backend for tests
#[cfg(test)]
pub mod mock_server {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Debug, Clone)]
    pub struct MockRoute {
        pub status: u16,
        pub body: String,
    }

    #[derive(Default)]
    pub struct MockServer {
        routes: Mutex<HashMap<String, MockRoute>>,
        requests: Mutex<Vec<HttpRequest>>,
        request_count: AtomicUsize,
        fail_next_requests: AtomicUsize,
        network_down: std::sync::atomic::AtomicBool,
        delay_ms: AtomicUsize,
    }

    impl MockServer {
        pub fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        // Routes are matched on URL path only; the query string is ignored
        pub fn route(&self, path: &str, status: u16, body: impl Into<String>) {
            self.routes.lock().insert(
                path.to_string(),
                MockRoute {
                    status,
                    body: body.into(),
                },
            );
        }

        pub fn route_json(&self, path: &str, body: serde_json::Value) {
            self.route(path, 200, body.to_string());
        }

        pub fn set_delay(&self, delay_ms: usize) {
            self.delay_ms.store(delay_ms, Ordering::SeqCst);
        }

        // The next `count` requests answer 500 regardless of route
        pub fn fail_next_requests(&self, count: usize) {
            self.fail_next_requests.store(count, Ordering::SeqCst);
        }

        pub fn set_network_down(&self, down: bool) {
            self.network_down.store(down, Ordering::SeqCst);
        }

        pub fn request_count(&self) -> usize {
            self.request_count.load(Ordering::SeqCst)
        }

        pub fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().clone()
        }
    }

    // Lets tests keep an `Arc<MockServer>` handle while the client owns a clone
    #[async_trait]
    impl HttpTransport for Arc<MockServer> {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.request_count.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().push(request.clone());

            let delay = self.delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay as u64)).await;
            }

            if self.network_down.load(Ordering::SeqCst) {
                return Err(TransportError::Network("connection refused".to_string()));
            }

            let fail_count = self.fail_next_requests.load(Ordering::SeqCst);
            if fail_count > 0 {
                self.fail_next_requests
                    .store(fail_count - 1, Ordering::SeqCst);
                return Ok(HttpResponse {
                    status: 500,
                    body: Bytes::from_static(b"Internal Server Error"),
                });
            }

            let route = self.routes.lock().get(request.url.path()).cloned();
            Ok(match route {
                Some(route) => HttpResponse {
                    status: route.status,
                    body: Bytes::from(route.body),
                },
                None => HttpResponse {
                    status: 404,
                    body: Bytes::from_static(br#"{"success":false,"error":"Endpoint not found"}"#),
                },
            })
        }
    }
}
