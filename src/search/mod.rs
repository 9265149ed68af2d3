//! External job-search provider client.
//!
//! Thin Tavily-compatible web search used by the hybrid job search: the
//! database is queried first (instant, free), then the web (seconds,
//! costs credits), with fresh results written back for future queries.
//! Provider failures degrade to database-only results; they never fail
//! the tool call.

use std::time::Duration;

use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::history::{JobFilter, JobListing};

/// Client for the web search provider.
pub struct JobSearchClient {
    client: Client,
    config: SearchConfig,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: String,
    max_results: usize,
    search_depth: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    title: String,
    url: String,
    #[serde(default)]
    content: String,
}

impl JobSearchClient {
    pub fn new(config: SearchConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, config }
    }

    /// Whether an API key is configured.
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Search the web for job listings matching the filter.
    pub async fn search(&self, filter: &JobFilter) -> Result<Vec<JobListing>, SearchError> {
        let Some(api_key) = self.config.api_key.as_ref() else {
            return Err(SearchError::NotConfigured);
        };

        let query = build_query(filter);
        let limit = if filter.limit > 0 {
            filter.limit as usize
        } else {
            10
        };

        let request = SearchRequest {
            api_key: api_key.expose_secret(),
            query: query.clone(),
            max_results: limit.min(20),
            search_depth: "basic",
        };

        tracing::debug!(%query, "searching web for job listings");

        let response = self
            .client
            .post(format!(
                "{}/search",
                self.config.base_url.trim_end_matches('/')
            ))
            .json(&request)
            .send()
            .await
            .map_err(|e| SearchError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Request(format!("HTTP {status}: {body}")));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        Ok(parsed
            .results
            .into_iter()
            .map(|r| result_to_listing(r, filter))
            .collect())
    }
}

/// Compose the search query from the structured filters.
fn build_query(filter: &JobFilter) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(engagement) = &filter.engagement_type {
        parts.push(engagement.clone());
    } else {
        parts.push("fractional".to_string());
    }
    if let Some(role) = &filter.role_type {
        parts.push(role.to_uppercase());
    } else {
        parts.push("executive".to_string());
    }
    parts.push("jobs".to_string());
    if let Some(location) = &filter.location {
        parts.push(location.clone());
    }
    if let Some(remote) = &filter.remote_preference {
        parts.push(remote.clone());
    }
    if let Some(industries) = &filter.industries {
        parts.extend(industries.iter().cloned());
    }

    parts.join(" ")
}

/// Map a raw web result onto a listing, carrying the filter's structure
/// so future database queries can match it.
fn result_to_listing(result: SearchResult, filter: &JobFilter) -> JobListing {
    JobListing {
        id: Uuid::new_v4(),
        title: result.title,
        company: None,
        role_type: filter.role_type.clone(),
        engagement_type: filter.engagement_type.clone(),
        location: filter.location.clone(),
        remote: filter.remote_preference.clone(),
        day_rate_min: None,
        day_rate_max: None,
        industries: filter.industries.clone().unwrap_or_default(),
        url: Some(result.url),
        source: "web".to_string(),
        posted_at: None,
    }
    .with_snippet(result.content)
}

impl JobListing {
    /// Fold the search snippet into the company field when it names one.
    fn with_snippet(mut self, snippet: String) -> Self {
        if self.company.is_none() && !snippet.is_empty() {
            // Snippets are unstructured; keep only a short lead.
            let lead: String = snippet.chars().take(120).collect();
            self.company = Some(lead);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_includes_filters() {
        let filter = JobFilter {
            role_type: Some("cto".to_string()),
            engagement_type: Some("fractional".to_string()),
            location: Some("London".to_string()),
            ..Default::default()
        };
        let query = build_query(&filter);
        assert_eq!(query, "fractional CTO jobs London");
    }

    #[test]
    fn test_query_defaults_without_filters() {
        let query = build_query(&JobFilter::default());
        assert_eq!(query, "fractional executive jobs");
    }

    #[tokio::test]
    async fn test_unconfigured_client_reports_not_configured() {
        let client = JobSearchClient::new(SearchConfig::default());
        assert!(!client.is_configured());
        assert!(matches!(
            client.search(&JobFilter::default()).await,
            Err(SearchError::NotConfigured)
        ));
    }

    #[test]
    fn test_result_carries_filter_structure() {
        let filter = JobFilter {
            role_type: Some("cfo".to_string()),
            industries: Some(vec!["finance".to_string()]),
            ..Default::default()
        };
        let listing = result_to_listing(
            SearchResult {
                title: "Fractional CFO — fintech scale-up".to_string(),
                url: "https://example.com/job/1".to_string(),
                content: String::new(),
            },
            &filter,
        );
        assert_eq!(listing.role_type.as_deref(), Some("cfo"));
        assert_eq!(listing.industries, vec!["finance"]);
        assert_eq!(listing.source, "web");
    }
}
