//! Reachability probe for the documentation site

use std::time::Duration;
use tracing::{info, warn};

use crate::error::E2eResult;

/// Outcome of probing a docs page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SiteStatus {
    /// Page answered successfully and landed on the expected URL
    Loaded { final_url: String },
    /// Page answered but not where or how we expected
    Unexpected { status: u16, final_url: String },
    /// No answer within the timeout
    Unreachable { reason: String },
}

impl SiteStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, SiteStatus::Loaded { .. })
    }
}

/// Probes a docs page before the browser is pointed at it
pub struct SiteProbe {
    client: reqwest::Client,
    config: SiteConfig,
}

impl SiteProbe {
    pub fn new(config: SiteConfig) -> E2eResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn page_url(&self) -> &str {
        &self.config.page_url
    }

    /// GET the page; loaded means a 2xx whose final URL contains the marker
    pub async fn probe(&self) -> SiteStatus {
        match self.client.get(&self.config.page_url).send().await {
            Ok(resp) => {
                let status = resp.status();
                let final_url = resp.url().to_string();
                if status.is_success() && final_url.contains(&self.config.url_marker) {
                    info!("Docs page loaded: {}", final_url);
                    SiteStatus::Loaded { final_url }
                } else {
                    warn!("Docs page returned {} at {}", status, final_url);
                    SiteStatus::Unexpected {
                        status: status.as_u16(),
                        final_url,
                    }
                }
            }
            Err(e) => {
                warn!("Docs page unreachable: {}", e);
                SiteStatus::Unreachable {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Configuration for the docs-site probe
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Page the workflow fills its form on
    pub page_url: String,

    /// Substring the final URL must contain
    pub url_marker: String,

    pub timeout: Duration,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            page_url: "https://mui.com/material-ui/react-text-field/".to_string(),
            url_marker: "material-ui".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_site() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = SiteProbe::new(SiteConfig {
            page_url: format!("http://127.0.0.1:{}/material-ui/", port),
            timeout: Duration::from_secs(2),
            ..Default::default()
        })
        .unwrap();

        assert!(matches!(probe.probe().await, SiteStatus::Unreachable { .. }));
    }
}
