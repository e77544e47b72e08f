//! HTTP client for the CIViC GraphQL API.
//!
//! CIViC exposes evidence records through a Relay-style GraphQL endpoint.
//! The client pushes name/type filters down into the query, paginates with
//! cursors, and retries transient failures with exponential backoff.

use crate::error::{CivicError, CivicResult};
use crate::evidence::{EvidenceFilter, EvidenceItem, Source};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Default CIViC GraphQL endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://civicdb.org/api/graphql";

/// Configuration for the CIViC client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// GraphQL endpoint URL.
    pub endpoint: Url,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry configuration.
    pub retry: RetryConfig,
    /// Records requested per page.
    pub page_size: usize,
    /// Upper bound on pages fetched for a single search.
    pub max_pages: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is valid"),
            timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            page_size: 50,
            max_pages: 4,
        }
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries.
    pub max_retries: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(10),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Create a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    /// Calculate backoff duration for a given attempt.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        let backoff_ms =
            self.initial_backoff.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        let backoff = Duration::from_millis(backoff_ms as u64);
        std::cmp::min(backoff, self.max_backoff)
    }
}

/// Client for the CIViC clinical evidence API.
#[derive(Debug, Clone)]
pub struct CivicClient {
    client: Client,
    config: ClientConfig,
}

const EVIDENCE_QUERY: &str = r#"
query EvidenceItems(
  $diseaseName: String,
  $therapyName: String,
  $molecularProfileName: String,
  $phenotypeName: String,
  $evidenceType: EvidenceType,
  $evidenceDirection: EvidenceDirection,
  $first: Int,
  $after: String
) {
  evidenceItems(
    diseaseName: $diseaseName,
    therapyName: $therapyName,
    molecularProfileName: $molecularProfileName,
    phenotypeName: $phenotypeName,
    evidenceType: $evidenceType,
    evidenceDirection: $evidenceDirection,
    first: $first,
    after: $after
  ) {
    pageInfo {
      hasNextPage
      endCursor
    }
    nodes {
      id
      evidenceType
      evidenceDirection
      evidenceRating
      description
      disease {
        name
      }
      phenotypes {
        name
      }
      molecularProfile {
        name
      }
      therapies {
        name
      }
    }
  }
}
"#;

const SOURCES_QUERY: &str = r#"
query EvidenceSources($ids: [Int!]) {
  evidenceItems(ids: $ids) {
    nodes {
      id
      source {
        citation
        sourceUrl
      }
    }
  }
}
"#;

impl CivicClient {
    /// Create a client with the default endpoint and retry policy.
    pub fn new() -> CivicResult<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a client with the given configuration.
    pub fn with_config(config: ClientConfig) -> CivicResult<Self> {
        let client = Client::builder()
            .user_agent(concat!("nexonco-mcp/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client, config })
    }

    /// The configured GraphQL endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.config.endpoint
    }

    /// Search evidence records matching the filter. Paginates through the
    /// upstream cursor up to the configured page budget; the `strong_only`
    /// rating cutoff is applied locally after the fetch.
    pub async fn search_evidence(&self, filter: &EvidenceFilter) -> CivicResult<Vec<EvidenceItem>> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        for page in 0..self.config.max_pages {
            let variables = json!({
                "diseaseName": filter.disease_name,
                "therapyName": filter.therapy_name,
                "molecularProfileName": filter.molecular_profile_name,
                "phenotypeName": filter.phenotype_name,
                "evidenceType": filter.evidence_type,
                "evidenceDirection": filter.evidence_direction,
                "first": self.config.page_size,
                "after": cursor,
            });

            let data: EvidenceData = self.execute(EVIDENCE_QUERY, variables).await?;
            let connection = data.evidence_items;

            debug!(
                page = page,
                fetched = connection.nodes.len(),
                "fetched evidence page"
            );

            items.extend(connection.nodes.into_iter().map(EvidenceItem::from));

            if !connection.page_info.has_next_page {
                break;
            }
            cursor = connection.page_info.end_cursor;
        }

        filter.retain_strong(&mut items);
        Ok(items)
    }

    /// Look up literature sources for the given evidence item ids.
    pub async fn get_sources(&self, ids: &[i64]) -> CivicResult<Vec<Source>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let data: EvidenceData = self
            .execute(SOURCES_QUERY, json!({ "ids": ids }))
            .await?;

        Ok(data
            .evidence_items
            .nodes
            .into_iter()
            .filter_map(|node| node.source)
            .collect())
    }

    /// Execute a GraphQL document with retries, returning the `data` payload.
    async fn execute<T: for<'de> Deserialize<'de>>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> CivicResult<T> {
        let body = json!({ "query": query, "variables": variables });
        let retry = &self.config.retry;
        let mut attempts = 0;

        loop {
            let result = self
                .client
                .post(self.config.endpoint.clone())
                .json(&body)
                .send()
                .await;

            let error = match result {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let envelope: GraphqlResponse<T> = response.json().await?;
                        if let Some(errors) = envelope.errors {
                            let message = errors
                                .into_iter()
                                .map(|e| e.message)
                                .collect::<Vec<_>>()
                                .join("; ");
                            return Err(CivicError::Graphql(message));
                        }
                        return envelope
                            .data
                            .ok_or_else(|| CivicError::Graphql("response had no data".into()));
                    }
                    let text = response.text().await.unwrap_or_default();
                    CivicError::from_response(status.as_u16(), &text)
                }
                Err(e) if e.is_timeout() => CivicError::Timeout,
                Err(e) => CivicError::Http(e),
            };

            if attempts < retry.max_retries && error.is_retryable() {
                let backoff = retry.backoff_for_attempt(attempts);
                warn!(
                    attempt = attempts + 1,
                    backoff_ms = backoff.as_millis(),
                    error = %error,
                    "CIViC request failed, retrying"
                );
                tokio::time::sleep(backoff).await;
                attempts += 1;
                continue;
            }

            return Err(error);
        }
    }
}

// Wire types for the GraphQL response shape.

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct EvidenceData {
    #[serde(rename = "evidenceItems")]
    evidence_items: EvidenceConnection,
}

#[derive(Debug, Deserialize)]
struct EvidenceConnection {
    #[serde(rename = "pageInfo", default)]
    page_info: PageInfo,
    nodes: Vec<EvidenceNode>,
}

#[derive(Debug, Default, Deserialize)]
struct PageInfo {
    #[serde(rename = "hasNextPage", default)]
    has_next_page: bool,
    #[serde(rename = "endCursor")]
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EvidenceNode {
    id: i64,
    #[serde(rename = "evidenceType")]
    evidence_type: Option<crate::evidence::EvidenceType>,
    #[serde(rename = "evidenceDirection")]
    evidence_direction: Option<crate::evidence::EvidenceDirection>,
    #[serde(rename = "evidenceRating")]
    evidence_rating: Option<u8>,
    description: Option<String>,
    disease: Option<NamedEntity>,
    #[serde(default)]
    phenotypes: Vec<NamedEntity>,
    #[serde(rename = "molecularProfile")]
    molecular_profile: Option<NamedEntity>,
    #[serde(default)]
    therapies: Vec<NamedEntity>,
    source: Option<Source>,
}

#[derive(Debug, Deserialize)]
struct NamedEntity {
    name: String,
}

impl From<EvidenceNode> for EvidenceItem {
    fn from(node: EvidenceNode) -> Self {
        // Molecular profile names read "GENE variant...", e.g. "EGFR L858R".
        // Split into the gene symbol and the variant remainder.
        let (gene_name, variant_name) = match node.molecular_profile {
            Some(profile) => match profile.name.split_once(' ') {
                Some((gene, variant)) => (Some(gene.to_string()), Some(variant.to_string())),
                None => (Some(profile.name), None),
            },
            None => (None, None),
        };

        let therapy_names = if node.therapies.is_empty() {
            None
        } else {
            Some(
                node.therapies
                    .into_iter()
                    .map(|t| t.name)
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        };

        Self {
            id: node.id,
            evidence_type: node.evidence_type,
            evidence_direction: node.evidence_direction,
            evidence_rating: node.evidence_rating,
            description: node.description,
            disease_name: node.disease.map(|d| d.name),
            phenotype_name: node.phenotypes.into_iter().next().map(|p| p.name),
            gene_name,
            variant_name,
            therapy_names,
        }
    }
}
