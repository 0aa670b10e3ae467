//! External ban lookup service
//!
//! Queries a third-party ban registry over HTTP. A positive answer means
//! the user is known to the registry and should be banned locally as well.
//! A non-200 response is an error, never a "not banned".

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::utils::errors::{BanLookupError, Result};

const DEFAULT_BASE_URL: &str = "https://api.cas.chat";
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Ban registry response shape
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BanLookupResponse {
    pub ok: bool,
    pub description: Option<String>,
    pub result: Option<BanLookupResult>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BanLookupResult {
    #[serde(default)]
    pub offenses: u32,
    #[serde(default)]
    pub messages: Vec<String>,
    pub time_added: Option<String>,
}

/// Outcome of one lookup
#[derive(Debug, Clone)]
pub struct BanVerdict {
    pub is_banned: bool,
    pub offenses: u32,
    pub time_added: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BanLookupService {
    client: Client,
    base_url: String,
}

impl BanLookupService {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the service at a different registry, used by tests.
    pub fn with_base_url(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Check one user against the registry.
    pub async fn check_user(&self, user_id: i64) -> Result<BanVerdict> {
        let url = format!("{}/check?user_id={}", self.base_url, user_id);
        debug!(user_id, url = %url, "Checking user against ban registry");

        let response = self
            .client
            .get(&url)
            .timeout(LOOKUP_TIMEOUT)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    BanLookupError::Timeout
                } else if err.is_connect() {
                    BanLookupError::ServiceUnavailable
                } else {
                    BanLookupError::RequestFailed(err.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(BanLookupError::UnexpectedStatus(status.as_u16()).into());
        }

        let body: BanLookupResponse = response
            .json()
            .await
            .map_err(|err| BanLookupError::InvalidResponse(err.to_string()))?;

        let verdict = BanVerdict {
            is_banned: body.ok,
            offenses: body.result.as_ref().map(|r| r.offenses).unwrap_or_default(),
            time_added: body.result.as_ref().and_then(|r| r.time_added.clone()),
        };

        if verdict.is_banned {
            warn!(user_id, offenses = verdict.offenses, "User is flagged by the ban registry");
        } else {
            debug!(user_id, "User is clean according to the ban registry");
        }

        Ok(verdict)
    }
}
