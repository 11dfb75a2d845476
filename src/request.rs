// Request options, URL building and cache key derivation

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::{Method, Url};

use crate::error::ApiError;

// Options for a single fetch. Query parameters live in a BTreeMap so that
// equivalent queries always serialize in the same order.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub query: BTreeMap<String, String>,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    // Overrides the client's default timeout for this call only
    pub timeout: Option<Duration>,
    // Skip the cache lookup; a successful response still replaces the entry
    pub refresh: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            query: BTreeMap::new(),
            method: Method::GET,
            headers: Vec::new(),
            timeout: None,
            refresh: false,
        }
    }
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.insert(key.into(), value.to_string());
        self
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }
}

// The fully resolved URL of a request plus the key its response is cached under
#[derive(Debug, Clone)]
pub struct PreparedRequest {
    pub url: Url,
    pub cache_key: String,
}

pub fn prepare(
    base_url: &str,
    path: &str,
    options: &RequestOptions,
) -> Result<PreparedRequest, ApiError> {
    let path = normalize_path(path);
    let joined = format!("{}{}", base_url.trim_end_matches('/'), path);
    let mut url =
        Url::parse(&joined).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", joined, e)))?;

    // Inline query parameters in `path` are merged with the explicit ones,
    // explicit values winning on conflicts
    let mut query: BTreeMap<String, String> = url.query_pairs().into_owned().collect();
    query.extend(
        options
            .query
            .iter()
            .map(|(k, v)| (k.clone(), v.clone())),
    );

    url.set_query(None);
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query.iter());
    }

    let bare_path = path.split('?').next().unwrap_or(path.as_str());
    let mut cache_key = match url.query() {
        Some(encoded) => format!("{}?{}", bare_path, encoded),
        None => bare_path.to_string(),
    };
    if options.method != Method::GET {
        cache_key = format!("{} {}", options.method, cache_key);
    }

    Ok(PreparedRequest { url, cache_key })
}

fn normalize_path(path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}
