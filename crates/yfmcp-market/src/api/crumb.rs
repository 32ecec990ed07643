//! Yahoo cookie and crumb session
//!
//! Yahoo's JSON endpoints require a session cookie plus a matching `crumb`
//! query parameter. The cookie comes from visiting `fc.yahoo.com`; the crumb
//! from `/v1/test/getcrumb` on either query host.

use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::YahooEndpoints;
use crate::error::{MarketError, Result};

const REFERER: &str = "https://finance.yahoo.com/";
const MAX_CRUMB_LEN: usize = 100;

#[derive(Debug, Clone)]
struct Crumb {
    value: String,
    fetched_at: Instant,
}

/// Cached crumb with expiry and single-flight refresh
#[derive(Debug)]
pub struct CrumbSession {
    current: RwLock<Option<Crumb>>,
    refresh: Mutex<()>,
    ttl: Duration,
}

impl CrumbSession {
    pub fn new(ttl: Duration) -> Self {
        Self {
            current: RwLock::new(None),
            refresh: Mutex::new(()),
            ttl,
        }
    }

    async fn cached(&self) -> Option<String> {
        let current = self.current.read().await;
        current
            .as_ref()
            .filter(|c| c.fetched_at.elapsed() < self.ttl)
            .map(|c| c.value.clone())
    }

    /// Current crumb, negotiating a new session when absent or expired
    pub async fn crumb(&self, http: &reqwest::Client, endpoints: &YahooEndpoints) -> Result<String> {
        if let Some(crumb) = self.cached().await {
            return Ok(crumb);
        }

        let _guard = self.refresh.lock().await;
        // Another task may have refreshed while we waited
        if let Some(crumb) = self.cached().await {
            return Ok(crumb);
        }

        let value = fetch_crumb(http, endpoints).await?;
        info!("Obtained Yahoo session crumb");
        *self.current.write().await = Some(Crumb {
            value: value.clone(),
            fetched_at: Instant::now(),
        });
        Ok(value)
    }

    /// Drop the current crumb so the next request renegotiates
    pub async fn invalidate(&self) {
        debug!("Invalidating Yahoo session crumb");
        *self.current.write().await = None;
    }

    pub async fn is_valid(&self) -> bool {
        self.cached().await.is_some()
    }
}

/// Whether a getcrumb response body looks like a crumb
pub(crate) fn is_valid_crumb(body: &str) -> bool {
    !body.is_empty()
        && body.len() < MAX_CRUMB_LEN
        && !body.contains(char::is_whitespace)
        && !body.contains('<')
}

async fn fetch_crumb(http: &reqwest::Client, endpoints: &YahooEndpoints) -> Result<String> {
    http.get(&endpoints.cookie)
        .header(reqwest::header::REFERER, REFERER)
        .send()
        .await
        .map_err(|e| MarketError::Auth(format!("failed to fetch Yahoo cookie: {e}")))?;

    for host in [&endpoints.query1, &endpoints.query2] {
        let url = format!("{host}/v1/test/getcrumb");
        let response = match http
            .get(&url)
            .header(reqwest::header::REFERER, REFERER)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Crumb request to {} failed: {}", url, e);
                continue;
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let body = body.trim();

        if status.as_u16() == 429 || body.to_lowercase().contains("too many requests") {
            return Err(MarketError::RateLimited {
                provider: "Yahoo Finance".to_string(),
            });
        }

        if status.is_success() && is_valid_crumb(body) {
            return Ok(body.to_string());
        }

        warn!("Crumb endpoint {} returned {} with an unusable body", url, status);
    }

    Err(MarketError::Auth(
        "failed to fetch Yahoo crumb from all endpoints".to_string(),
    ))
}
