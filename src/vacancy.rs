// Typed access to the vacancy backend endpoints, built on `VacancyApi`

use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::cache::{CacheConfig, CacheStats, ResponseCache};
use crate::client::{ClientStats, VacancyApi, VacancyApiClient};
use crate::config::ClientConfig;
use crate::error::{ApiError, ClientError};
use crate::models::{Envelope, HealthStatus, Hotel, VacancySearchResult, WeekendSearchResult};
use crate::request::RequestOptions;

pub const HEALTH_PATH: &str = "/health";
pub const HOTELS_PATH: &str = "/vagas/hoteis";
pub const SCRAPE_PATH: &str = "/vagas/hoteis/scrape";
pub const SEARCH_PATH: &str = "/vagas/search";
pub const WEEKEND_SEARCH_PATH: &str = "/vagas/search/weekends";

// Hotel id meaning "search every hotel"
pub const ALL_HOTELS: &str = "-1";

pub const MIN_WEEKENDS: u32 = 1;
pub const MAX_WEEKENDS: u32 = 12;
pub const DEFAULT_WEEKENDS: u32 = 8;

const HOTEL_LIST_KEY: &str = "hotel_list";
const MISSING_ERROR_MESSAGE: &str = "API returned error without message";

pub fn format_date_iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date_iso(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|e| ApiError::InvalidInput(format!("invalid date '{}': {}", raw, e)))
}

pub fn is_valid_weekend_count(count: u32) -> bool {
    (MIN_WEEKENDS..=MAX_WEEKENDS).contains(&count)
}

pub fn validate_weekend_count(count: u32) -> Result<(), ApiError> {
    if is_valid_weekend_count(count) {
        Ok(())
    } else {
        Err(ApiError::InvalidInput(format!(
            "Weekend count must be between {} and {}",
            MIN_WEEKENDS, MAX_WEEKENDS
        )))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceCacheStats {
    pub hotel_list: CacheStats,
    // Hotels in the cached list, 0 when nothing is cached
    pub hotel_count: usize,
    pub responses: ClientStats,
}

pub struct VacancyService<A: VacancyApi = VacancyApiClient> {
    api: A,
    default_timeout: Duration,
    search_timeout: Duration,
    weekend_search_timeout: Duration,
    hotel_cache: ResponseCache,
}

impl VacancyService<VacancyApiClient> {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let api = VacancyApiClient::new(config.clone())?;
        Ok(Self::with_api(api, &config))
    }
}

impl<A: VacancyApi> VacancyService<A> {
    pub fn with_api(api: A, config: &ClientConfig) -> Self {
        Self {
            api,
            default_timeout: config.timeout,
            search_timeout: config.timeouts.search,
            weekend_search_timeout: config.timeouts.weekend_search,
            hotel_cache: ResponseCache::new(CacheConfig {
                default_ttl: config.hotel_list_ttl,
                max_entries: 1,
            }),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub async fn check_health(&self) -> Result<HealthStatus, ApiError> {
        let options = RequestOptions::new().timeout(self.default_timeout);
        let health: HealthStatus = self.fetch_accepted(HEALTH_PATH, options).await?;

        info!(status = %health.status, version = ?health.version, "API health checked");
        Ok(health)
    }

    // Hotel list, served from its own long-lived cache unless `force_refresh`
    pub async fn get_hotels(&self, force_refresh: bool) -> Result<Vec<Hotel>, ApiError> {
        self.get_hotels_at(force_refresh, Instant::now()).await
    }

    pub async fn get_hotels_at(
        &self,
        force_refresh: bool,
        now: Instant,
    ) -> Result<Vec<Hotel>, ApiError> {
        if !force_refresh {
            if let Some(cached) = self.hotel_cache.get_at(HOTEL_LIST_KEY, now) {
                let hotels: Vec<Hotel> = serde_json::from_value(cached)?;
                info!(count = hotels.len(), "using cached hotel list");
                return Ok(hotels);
            }
        }

        // The hotel-list cache owns this path's freshness, so a miss here
        // always goes to the backend
        let options = RequestOptions::new()
            .timeout(self.default_timeout)
            .refresh(true);
        let envelope: Envelope<Vec<Hotel>> = self.fetch_accepted(HOTELS_PATH, options).await?;

        let ttl = self.hotel_cache.config().default_ttl;
        self.hotel_cache.store_at(
            HOTEL_LIST_KEY,
            serde_json::to_value(&envelope.data)?,
            ttl,
            now,
        );

        info!(count = envelope.data.len(), "retrieved hotel list from API");
        Ok(envelope.data)
    }

    pub async fn refresh_hotels(&self) -> Result<Vec<Hotel>, ApiError> {
        info!("forcing hotel list refresh");
        self.get_hotels(true).await
    }

    // Live scrape of the booking site's hotel dropdown, including "Todas"
    pub async fn scrape_hotels(&self) -> Result<Vec<Hotel>, ApiError> {
        let options = RequestOptions::new().timeout(self.search_timeout);
        let envelope: Envelope<Vec<Hotel>> = self.fetch_accepted(SCRAPE_PATH, options).await?;

        info!(count = envelope.data.len(), "scraped hotel options");
        Ok(envelope.data)
    }

    pub async fn search_vacancies(
        &self,
        checkin: NaiveDate,
        checkout: NaiveDate,
        hotel: Option<&str>,
    ) -> Result<VacancySearchResult, ApiError> {
        if checkout <= checkin {
            return Err(ApiError::InvalidInput(format!(
                "checkout ({}) must be after checkin ({})",
                checkout, checkin
            )));
        }

        let hotel = hotel.unwrap_or(ALL_HOTELS);
        let options = RequestOptions::new()
            .query("hotel", hotel)
            .query("checkin", format_date_iso(checkin))
            .query("checkout", format_date_iso(checkout))
            .timeout(self.search_timeout);

        let envelope: Envelope<VacancySearchResult> =
            self.fetch_accepted(SEARCH_PATH, options).await?;

        info!(
            %checkin,
            %checkout,
            hotel,
            method = envelope.method.as_deref().unwrap_or("N/A"),
            hotel_filter = envelope.hotel_filter.as_deref().unwrap_or(hotel),
            has_availability = envelope.data.has_availability,
            status = envelope.data.status().unwrap_or("N/A"),
            "vacancy search completed"
        );
        Ok(envelope.data)
    }

    pub async fn search_weekend_vacancies(
        &self,
        count: u32,
    ) -> Result<WeekendSearchResult, ApiError> {
        validate_weekend_count(count)?;

        let options = RequestOptions::new()
            .query("count", count)
            .timeout(self.weekend_search_timeout);

        info!(count, "searching weekends, this may take several minutes");
        let envelope: Envelope<WeekendSearchResult> =
            self.fetch_accepted(WEEKEND_SEARCH_PATH, options).await?;

        info!(
            weekends_searched = envelope.data.weekends_searched(),
            weekends_with_vacancies = envelope.data.weekends_with_vacancies(),
            "weekend search completed"
        );
        Ok(envelope.data)
    }

    pub fn clear_cache(&self) {
        let responses = self.api.clear_cache();
        self.hotel_cache.clear();
        info!(responses, "all caches cleared");
    }

    pub fn cache_stats(&self) -> ServiceCacheStats {
        let hotel_count = self
            .hotel_cache
            .entry(HOTEL_LIST_KEY)
            .and_then(|entry| entry.payload.as_array().map(Vec::len))
            .unwrap_or(0);

        ServiceCacheStats {
            hotel_list: self.hotel_cache.stats(HOTEL_LIST_KEY),
            hotel_count,
            responses: self.api.stats(),
        }
    }

    // Fetches `path` and decodes it as `R`. Payloads that fail either step are
    // never cached, and an existing entry for the key stays as it was.
    async fn fetch_accepted<R: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<R, ApiError> {
        let check = |payload: &Value| accept_payload::<R>(payload);
        let payload = self.api.fetch_validated(path, options, &check).await?;
        Ok(serde_json::from_value(payload)?)
    }
}

// A `success: false` body is a failure even with a 2xx status
fn accept_payload<R: DeserializeOwned>(payload: &Value) -> Result<(), ApiError> {
    if payload.get("success").and_then(Value::as_bool) == Some(false) {
        let message = payload
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or(MISSING_ERROR_MESSAGE)
            .to_string();
        return Err(ApiError::Rejected(message));
    }

    R::deserialize(payload)?;
    Ok(())
}
