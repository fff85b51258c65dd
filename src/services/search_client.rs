use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::{
    core::config::PlannerConfig,
    error::{PlannerError, Result},
    types::SearchResult,
};

const QUERY_KEYWORDS: &str = "travel guide tourism attractions accommodation";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    title: Option<String>,
    snippet: Option<String>,
    link: Option<String>,
}

impl From<SearchItem> for SearchResult {
    fn from(item: SearchItem) -> Self {
        Self {
            title: item.title.unwrap_or_else(|| "No title available".to_string()),
            snippet: item
                .snippet
                .unwrap_or_else(|| "No snippet available".to_string()),
            link: item.link.unwrap_or_else(|| "#".to_string()),
        }
    }
}

/// Google Custom Search client
#[derive(Clone, Debug)]
pub struct SearchClient {
    http: Client,
    api_key: String,
    engine_id: String,
    base_url: String,
    result_count: u32,
    timeout: Duration,
}

impl SearchClient {
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            http: Client::new(),
            api_key: config.search_api_key.clone().unwrap_or_default(),
            engine_id: config.search_engine_id.clone().unwrap_or_default(),
            base_url: config.search_base_url.clone(),
            result_count: config.search_result_count,
            timeout: config.request_timeout,
        }
    }

    /// Search for background facts about `destination`.
    ///
    /// An empty vector means the provider answered but found nothing; an
    /// error means the call itself failed.
    pub async fn search(&self, destination: &str) -> Result<Vec<SearchResult>> {
        let query = build_query(destination);
        debug!(target: "trip_planner::search", %query, "searching");

        let response = timeout(self.timeout, self.fetch(&query))
            .await
            .map_err(|_| {
                PlannerError::Timeout(format!(
                    "search API did not answer within {}s",
                    self.timeout.as_secs_f64()
                ))
            })??;

        let results: Vec<SearchResult> = response.items.into_iter().map(Into::into).collect();
        info!(
            target: "trip_planner::search",
            destination,
            count = results.len(),
            "search completed"
        );
        Ok(results)
    }

    async fn fetch(&self, query: &str) -> Result<SearchResponse> {
        let response = self
            .http
            .get(&self.base_url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("num", self.result_count.to_string().as_str()),
            ])
            .send()
            .await
            .map_err(|err| PlannerError::Transport(format!("search request failed: {err}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| PlannerError::Transport(format!("failed to read search body: {err}")))?;

        if !status.is_success() {
            return Err(PlannerError::Upstream {
                service: "search",
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

pub fn build_query(destination: &str) -> String {
    format!("{} {}", destination.trim(), QUERY_KEYWORDS)
}
