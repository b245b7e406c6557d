//! hh.ru implementation of [`ListingClient`].
//!
//! ## Pagination
//! List endpoints answer with `{items, page, pages, per_page}`. The first
//! request is sent as-is; while `page < pages - 1` the same query is repeated
//! with `page = page + 1` and the items are concatenated.

use crate::client::{ListingClient, MAX_PER_PAGE, SearchParams};
use crate::collection::VacancyCollection;
use crate::error::{ListingError, Result};
use crate::types::{Negotiation, Resume, Vacancy, VacancyId, null_as_default};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_API_URL: &str = "https://api.hh.ru";
pub const DEFAULT_USER_AGENT: &str = "jobsift/0.1";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One page of a list endpoint.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct ItemPage<T> {
    #[serde(default = "Vec::new", deserialize_with = "null_as_default")]
    items: Vec<T>,
    #[serde(default)]
    page: u32,
    #[serde(default)]
    pages: u32,
}

impl<T> ItemPage<T> {
    fn next_page(&self) -> Option<u32> {
        (self.page + 1 < self.pages).then_some(self.page + 1)
    }
}

pub struct HeadhunterClient {
    http: Client,
    base_url: String,
    token: String,
    user_agent: String,
}

impl HeadhunterClient {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: DEFAULT_API_URL.to_string(),
            token: token.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        let user_agent = user_agent.into();
        if !user_agent.trim().is_empty() {
            self.user_agent = user_agent;
        }
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.url(path);
        debug!(url = %url, "listing request");

        let response = self
            .authorized(self.http.get(&url))
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if status != StatusCode::OK {
            return Err(ListingError::BadStatus {
                status: status.as_u16(),
                url,
            });
        }

        serde_json::from_str(&body).map_err(|source| ListingError::Decode { url, source })
    }

    /// Fetch every page of a list endpoint.
    async fn get_items<T: DeserializeOwned>(
        &self,
        path: &str,
        query: Vec<(&str, String)>,
    ) -> Result<Vec<T>> {
        let mut page: ItemPage<T> = self.get_json(path, &query).await?;
        debug!(path, pages = page.pages, "listing response");

        let mut items = std::mem::take(&mut page.items);
        while let Some(next) = page.next_page() {
            debug!(path, page = next + 1, pages = page.pages, "fetching next page");

            let mut paged = query.clone();
            paged.retain(|(k, _)| *k != "page");
            paged.push(("page", next.to_string()));

            page = self.get_json(path, &paged).await?;
            items.append(&mut page.items);
        }

        Ok(items)
    }
}

#[async_trait]
impl ListingClient for HeadhunterClient {
    async fn search(&self, params: &SearchParams) -> Result<VacancyCollection> {
        let vacancies: Vec<Vacancy> = self.get_items("/vacancies", params.to_query()).await?;
        info!(found = vacancies.len(), "search completed");
        Ok(VacancyCollection::from(vacancies))
    }

    async fn vacancy(&self, id: &str) -> Result<Vacancy> {
        if id.is_empty() {
            return Err(ListingError::MissingArgument("vacancy id"));
        }
        self.get_json(&format!("/vacancies/{id}"), &[]).await
    }

    async fn negotiated_vacancy_ids(&self) -> Result<Vec<VacancyId>> {
        let query = vec![
            ("status", "non_archived".to_string()),
            ("per_page", MAX_PER_PAGE.to_string()),
        ];
        let negotiations: Vec<Negotiation> = self.get_items("/negotiations", query).await?;

        Ok(negotiations
            .into_iter()
            .filter_map(|n| n.vacancy.map(|v| v.id))
            .filter(|id| !id.is_empty())
            .collect())
    }

    async fn resume_raw(&self, id: &str) -> Result<serde_json::Value> {
        if id.is_empty() {
            return Err(ListingError::MissingArgument("resume id"));
        }
        self.get_json(&format!("/resumes/{id}"), &[]).await
    }

    async fn my_resumes(&self) -> Result<Vec<Resume>> {
        self.get_items("/resumes/mine", Vec::new()).await
    }

    async fn apply(&self, resume_id: &str, vacancy_id: &str, message: &str) -> Result<()> {
        if resume_id.is_empty() {
            return Err(ListingError::MissingArgument("resume id"));
        }
        if vacancy_id.is_empty() {
            return Err(ListingError::MissingArgument("vacancy id"));
        }

        let url = self.url("/negotiations");
        let form = reqwest::multipart::Form::new()
            .text("resume_id", resume_id.to_string())
            .text("vacancy_id", vacancy_id.to_string())
            .text("message", message.to_string());

        let response = self
            .authorized(self.http.post(&url))
            .multipart(form)
            .send()
            .await?;

        if response.status() != StatusCode::CREATED {
            return Err(ListingError::BadStatus {
                status: response.status().as_u16(),
                url,
            });
        }

        info!(vacancy_id, "application submitted");
        Ok(())
    }
}
