// 📡 Fetchers - Where mapping tables come from
// Backend HTTP endpoint or a local JSON file

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::MappingFetchError;
use crate::mapping::{BackendResponse, MappingTable};

/// Backend route serving the classification table
pub const TYPE_MAPPINGS_PATH: &str = "/api/1/history/events/type_mappings";

/// Source of fresh mapping tables
///
/// Must either produce a fully populated table or fail with a readable message.
#[async_trait]
pub trait MappingFetcher: Send + Sync {
    async fn fetch_mapping_table(&self) -> Result<MappingTable, MappingFetchError>;
}

// ============================================================================
// FILE FETCHER
// ============================================================================

/// Reads a table from a JSON file (bare table or backend envelope)
#[derive(Debug, Clone)]
pub struct FileMappingFetcher {
    path: PathBuf,
}

impl FileMappingFetcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileMappingFetcher { path: path.into() }
    }
}

#[async_trait]
impl MappingFetcher for FileMappingFetcher {
    async fn fetch_mapping_table(&self) -> Result<MappingTable, MappingFetchError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| MappingFetchError::Io {
                path: self.path.clone(),
                source,
            })?;

        MappingTable::from_json(&content)
    }
}

// ============================================================================
// HTTP FETCHER
// ============================================================================

/// Fetches the table from the backend REST API
///
/// Timeouts live on the agent; the refresher itself never times out.
#[derive(Clone)]
pub struct HttpMappingFetcher {
    url: String,
    agent: ureq::Agent,
}

impl HttpMappingFetcher {
    pub fn new(backend_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .build();

        HttpMappingFetcher {
            url: format!("{}{}", backend_url.trim_end_matches('/'), TYPE_MAPPINGS_PATH),
            agent,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn fetch_blocking(agent: &ureq::Agent, url: &str) -> Result<MappingTable, MappingFetchError> {
        let response = match agent.get(url).call() {
            Ok(response) => response,
            // Backend errors still carry the envelope with a message
            Err(ureq::Error::Status(status, response)) => {
                let message = response
                    .into_json::<BackendResponse<serde_json::Value>>()
                    .map(|body| body.message)
                    .ok()
                    .filter(|message| !message.is_empty())
                    .unwrap_or_else(|| format!("status {}", status));
                return Err(MappingFetchError::Http {
                    url: url.to_string(),
                    message,
                });
            }
            Err(err) => {
                return Err(MappingFetchError::Http {
                    url: url.to_string(),
                    message: err.to_string(),
                });
            }
        };

        let body: BackendResponse<MappingTable> = response
            .into_json()
            .map_err(|err| MappingFetchError::Decode(err.to_string()))?;

        body.into_result()
    }
}

impl std::fmt::Debug for HttpMappingFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMappingFetcher").field("url", &self.url).finish()
    }
}

#[async_trait]
impl MappingFetcher for HttpMappingFetcher {
    async fn fetch_mapping_table(&self) -> Result<MappingTable, MappingFetchError> {
        let agent = self.agent.clone();
        let url = self.url.clone();

        tokio::task::spawn_blocking(move || Self::fetch_blocking(&agent, &url)).await?
    }
}

// ============================================================================
// TESTS
// ============================================================================
