// Client library for the hotel vacancy search API

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod request;
pub mod transport;
pub mod vacancy;

// Re-export key types for convenience
pub use cache::{CacheConfig, CacheEntry, CacheStats, ResponseCache};
pub use client::{ClientStats, PayloadCheck, VacancyApi, VacancyApiClient};
pub use config::{ClientConfig, Environment, TimeoutConfig};
pub use error::{ApiError, ClientError};
pub use models::{HealthStatus, Hotel, HotelKind, VacancySearchResult, WeekendSearchResult};
pub use request::RequestOptions;
pub use transport::{HttpTransport, ReqwestTransport};
pub use vacancy::{ServiceCacheStats, VacancyService};
