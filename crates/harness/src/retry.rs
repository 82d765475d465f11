//! Bounded readiness polling against the server's base URL

use std::time::Duration;

use reqwest::StatusCode;
use tokio::time::sleep;
use tracing::{debug, info};

/// How often and how long to probe the server before giving up.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay between consecutive probes
    pub interval: Duration,

    /// Probes to attempt before declaring a boot timeout
    pub max_attempts: u32,

    /// Per-probe HTTP timeout
    pub probe_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_attempts: 60,
            probe_timeout: Duration::from_millis(1500),
        }
    }
}

impl RetryPolicy {
    /// HTTP client with this policy's probe timeout applied.
    pub fn probe_client(&self) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder().timeout(self.probe_timeout).build()
    }
}

/// Default readiness predicate: the server answered at all, even with a
/// client error such as 404.
pub fn server_answered(status: StatusCode) -> bool {
    status.as_u16() < 500
}

/// Outcome of a polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Ready { attempts: u32 },
    TimedOut { attempts: u32 },
}

/// Probe `url` once per `policy.interval` until `is_ready` accepts a response
/// status or the attempt budget runs out. Connection failures count as "not
/// yet ready" and are retried silently.
pub async fn wait_until_ready<F>(
    client: &reqwest::Client,
    url: &str,
    policy: &RetryPolicy,
    is_ready: F,
) -> Readiness
where
    F: Fn(StatusCode) -> bool,
{
    for attempt in 1..=policy.max_attempts {
        match client.get(url).send().await {
            Ok(resp) if is_ready(resp.status()) => {
                debug!("probe {} returned {}", attempt, resp.status());
                return Readiness::Ready { attempts: attempt };
            }
            Ok(resp) => {
                debug!("probe {} returned {}, not ready", attempt, resp.status());
            }
            Err(e) => {
                if attempt == 1 {
                    info!("waiting for server at {}...", url);
                }
                if !e.is_connect() {
                    debug!("probe {} failed: {}", attempt, e);
                }
            }
        }

        if attempt < policy.max_attempts {
            sleep(policy.interval).await;
        }
    }

    Readiness::TimedOut {
        attempts: policy.max_attempts,
    }
}
