pub mod types;

use async_trait::async_trait;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;

use crate::dates::DateRange;
use crate::error::ApiError;
use crate::models::{EntityKind, ScheduleEntry};

pub use types::{LessonRecord, SearchRecord};

const API_DATE_FORMAT: &str = "%Y-%m-%d";

#[async_trait]
pub trait ScheduleApi: Send + Sync {
    async fn search(&self, term: &str, kind: EntityKind) -> Result<Vec<SearchRecord>, ApiError>;

    /// Без диапазона сервис берёт период по умолчанию
    async fn schedule(
        &self,
        id: i64,
        kind: EntityKind,
        range: Option<DateRange>,
    ) -> Result<Vec<ScheduleEntry>, ApiError>;
}

#[derive(Clone)]
pub struct RaspClient {
    client: ClientWithMiddleware,
    base_url: String,
}

impl RaspClient {
    /// `base_url` должен заканчиваться на `/`
    pub fn new(base_url: impl Into<String>, retries: u32) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(retries);
        let client = ClientBuilder::new(Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Self { client, base_url: base_url.into() }
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        url: String,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status(status));
        }

        let text = response.text().await?;
        decode_list(&text)
    }
}

/// Разбор JSON-списка: допускает BOM и `null`
pub fn decode_list<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, ApiError> {
    let text = text.trim_start_matches('\u{feff}');
    let items: Option<Vec<T>> = serde_json::from_str(text)?;
    Ok(items.unwrap_or_default())
}

#[async_trait]
impl ScheduleApi for RaspClient {
    async fn search(&self, term: &str, kind: EntityKind) -> Result<Vec<SearchRecord>, ApiError> {
        let url = format!("{}api/search", self.base_url);
        let records = self
            .get_list(url, &[("term", term.to_string()), ("type", kind.api_type().to_string())])
            .await?;
        log::debug!("🔎 search {:?} ({}) -> {} hits", term, kind.api_type(), records.len());
        Ok(records)
    }

    async fn schedule(
        &self,
        id: i64,
        kind: EntityKind,
        range: Option<DateRange>,
    ) -> Result<Vec<ScheduleEntry>, ApiError> {
        let url = format!("{}api/schedule/{}/{}", self.base_url, kind.api_type(), id);
        let query = match range {
            Some(range) => vec![
                ("start", range.start.format(API_DATE_FORMAT).to_string()),
                ("finish", range.end.format(API_DATE_FORMAT).to_string()),
            ],
            None => Vec::new(),
        };
        let lessons: Vec<LessonRecord> = self.get_list(url, &query).await?;
        log::debug!("📅 schedule {}/{} -> {} lessons", kind.api_type(), id, lessons.len());
        Ok(lessons.into_iter().map(ScheduleEntry::from).collect())
    }
}
