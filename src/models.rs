// Payload types returned by the vacancy backend

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// `{ success, method, data, ... }` wrapper used by the /vagas endpoints.
// `success: false` is handled before this is deserialized.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub hotel_filter: Option<String>,
    pub data: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HotelKind {
    // The "Todas" pseudo-hotel meaning every hotel
    All,
    #[default]
    Hotel,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    #[serde(alias = "hotelId")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: HotelKind,
}

impl Hotel {
    pub fn is_all_hotels(&self) -> bool {
        self.kind == HotelKind::All
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    #[serde(default)]
    pub has_availability: bool,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub vacancies: Vec<String>,
    #[serde(default)]
    pub hotel_groups: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VacancySearchResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub has_availability: bool,
    #[serde(default)]
    pub result: Option<SearchOutcome>,
}

impl VacancySearchResult {
    pub fn status(&self) -> Option<&str> {
        self.result.as_ref().and_then(|r| r.status.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekendResult {
    #[serde(default)]
    pub weekend_number: Option<u32>,
    #[serde(default)]
    pub dates: Option<String>,
    #[serde(default, alias = "checkin")]
    pub friday: Option<String>,
    #[serde(default, alias = "checkout")]
    pub sunday: Option<String>,
    #[serde(flatten)]
    pub search: VacancySearchResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchDetails {
    pub total_weekends_searched: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilitySummary {
    pub weekends_with_vacancies: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekendSearchResult {
    #[serde(default, alias = "weekends")]
    pub weekend_results: Vec<WeekendResult>,
    #[serde(default)]
    pub search_details: Option<SearchDetails>,
    #[serde(default)]
    pub availability: Option<AvailabilitySummary>,
}

impl WeekendSearchResult {
    pub fn weekends_searched(&self) -> u32 {
        self.search_details
            .map(|d| d.total_weekends_searched)
            .unwrap_or(self.weekend_results.len() as u32)
    }

    // Backend summary when present, otherwise counted from the results
    pub fn weekends_with_vacancies(&self) -> u32 {
        self.availability
            .map(|a| a.weekends_with_vacancies)
            .unwrap_or_else(|| {
                self.weekend_results
                    .iter()
                    .filter(|w| w.search.has_availability)
                    .count() as u32
            })
    }
}
